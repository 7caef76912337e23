use std::path::PathBuf;

use thiserror::Error;

use crate::item::ItemId;

/// Refusals from the item list. The display strings are shown to the user as-is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ItemListError {
    #[error("You must have at least one item.")]
    LastItem,

    #[error("No item with id {0}.")]
    NotFound(ItemId),
}

/// Reasons an invoice cannot be built from the current form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please enter customer name.")]
    MissingCustomerName,

    #[error("Please add at least one valid item to the bill.")]
    NoValidItems,
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("PDF rendering failed: {0}")]
    Render(String),

    #[error("Failed to write PDF: {0}")]
    Write(String),

    #[error("Sharing failed: {0}")]
    Share(String),
}

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("failed to read business profile {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid business profile: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("An invoice is already being generated.")]
    InFlight,

    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error(transparent)]
    Export(#[from] ExportError),
}
