use std::fmt;

use rand::Rng;
use time::macros::format_description;
use time::{Date, OffsetDateTime};

use crate::error::ValidationError;
use crate::item::Item;
use crate::total::{line_amount, parse_price};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceNumber(String);

impl InvoiceNumber {
    pub fn random() -> Self {
        Self::from_code(rand::thread_rng().gen_range(0..10_000))
    }

    /// `INV-` followed by the code zero-padded to four digits.
    pub fn from_code(code: u16) -> Self {
        Self(format!("INV-{:04}", code % 10_000))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InvoiceNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LineItem {
    pub serial_number: usize,
    pub name: String,
    /// As typed, trimmed.
    pub quantity: String,
    pub unit_price: f64,
    pub line_total: f64,
}

/// A bill as printed. Built fresh for every export and dropped afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Invoice {
    pub customer_name: String,
    pub issued_on: Date,
    pub invoice_number: InvoiceNumber,
    pub line_items: Vec<LineItem>,
    pub grand_total: f64,
}

impl Invoice {
    pub fn date_label(&self) -> String {
        format_long_date(self.issued_on)
    }
}

/// "October 19, 2026"
pub fn format_long_date(date: Date) -> String {
    let fmt = format_description!("[month repr:long] [day padding:none], [year]");
    date.format(&fmt).unwrap_or_else(|_| date.to_string())
}

pub fn today_local() -> Date {
    OffsetDateTime::now_local()
        .unwrap_or_else(|_| OffsetDateTime::now_utc())
        .date()
}

/// Builds an invoice dated today with a random invoice number.
pub fn build_invoice(customer_name: &str, items: &[Item]) -> Result<Invoice, ValidationError> {
    build_invoice_with(customer_name, items, today_local(), InvoiceNumber::random())
}

/// Only complete rows (name, quantity and price all filled in) are printed.
/// A complete row whose numbers do not parse still prints, with a zero total.
pub fn build_invoice_with(
    customer_name: &str,
    items: &[Item],
    issued_on: Date,
    invoice_number: InvoiceNumber,
) -> Result<Invoice, ValidationError> {
    let customer_name = customer_name.trim();
    if customer_name.is_empty() {
        return Err(ValidationError::MissingCustomerName);
    }

    let line_items: Vec<LineItem> = items
        .iter()
        .filter(|it| it.is_complete())
        .enumerate()
        .map(|(idx, it)| LineItem {
            serial_number: idx + 1,
            name: it.name.trim().to_string(),
            quantity: it.quantity.trim().to_string(),
            unit_price: parse_price(&it.price).filter(|p| p.is_finite()).unwrap_or(0.0),
            line_total: line_amount(it),
        })
        .collect();

    if line_items.is_empty() {
        return Err(ValidationError::NoValidItems);
    }

    let grand_total = line_items.iter().map(|li| li.line_total).sum();

    Ok(Invoice {
        customer_name: customer_name.to_string(),
        issued_on,
        invoice_number,
        line_items,
        grand_total,
    })
}
