use serde::{Deserialize, Serialize};

use crate::error::ItemListError;

pub type ItemId = u64;

/// One editable bill row. Quantity and price stay raw text until a total or an
/// invoice is computed, so half-typed values like `""` or `"2."` are fine here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    pub quantity: String,
    pub price: String,
}

impl Item {
    fn empty(id: ItemId) -> Self {
        Self {
            id,
            name: String::new(),
            quantity: String::new(),
            price: String::new(),
        }
    }

    /// Name, quantity and price are all filled in (whitespace does not count).
    pub fn is_complete(&self) -> bool {
        !self.name.trim().is_empty() && !self.quantity.trim().is_empty() && !self.price.trim().is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ItemField {
    Name,
    Quantity,
    Price,
}

/// Ordered item rows with a floor of one entry. Ids come from a counter and
/// are never handed out twice.
#[derive(Debug, Clone)]
pub struct ItemList {
    items: Vec<Item>,
    next_id: ItemId,
}

impl Default for ItemList {
    fn default() -> Self {
        Self::new()
    }
}

impl ItemList {
    pub fn new() -> Self {
        Self {
            items: vec![Item::empty(1)],
            next_id: 2,
        }
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: ItemId) -> Option<&Item> {
        self.items.iter().find(|it| it.id == id)
    }

    pub fn add_item(&mut self) -> ItemId {
        let id = self.next_id;
        self.next_id += 1;
        self.items.push(Item::empty(id));
        id
    }

    /// Returns `false` when no item has `id`.
    pub fn update_item(&mut self, id: ItemId, field: ItemField, value: impl Into<String>) -> bool {
        let Some(item) = self.items.iter_mut().find(|it| it.id == id) else {
            return false;
        };
        let value = value.into();
        match field {
            ItemField::Name => item.name = value,
            ItemField::Quantity => item.quantity = value,
            ItemField::Price => item.price = value,
        }
        true
    }

    pub fn remove_item(&mut self, id: ItemId) -> Result<Item, ItemListError> {
        if self.items.len() <= 1 {
            return Err(ItemListError::LastItem);
        }
        let idx = self
            .items
            .iter()
            .position(|it| it.id == id)
            .ok_or(ItemListError::NotFound(id))?;
        Ok(self.items.remove(idx))
    }
}
