//! Billable line shared by invoices, proformas and repair-order parts.

use super::{
    require_amount, require_non_empty, require_quantity, validate_rate, ValidationError,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One priced line of a billing document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub description: String,
    pub quantity: Decimal,
    pub unit_price_ht: Decimal,
    /// Percentage taken off `quantity × unit_price_ht`.
    #[serde(default)]
    pub discount_percent: Decimal,
    pub vat_rate: Decimal,
}

impl LineItem {
    /// Creates an undiscounted line.
    pub fn new(
        description: impl Into<String>,
        quantity: Decimal,
        unit_price_ht: Decimal,
        vat_rate: Decimal,
    ) -> Self {
        Self {
            description: description.into(),
            quantity,
            unit_price_ht,
            discount_percent: Decimal::ZERO,
            vat_rate,
        }
    }

    pub fn with_discount(mut self, discount_percent: Decimal) -> Self {
        self.discount_percent = discount_percent;
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_non_empty("lines.description", &self.description)?;
        if self.quantity <= Decimal::ZERO {
            return Err(ValidationError::new(
                "lines.quantity",
                "must be greater than zero",
            ));
        }
        require_quantity("lines.quantity", self.quantity)?;
        require_amount("lines.unit_price_ht", self.unit_price_ht)?;
        validate_rate("lines.discount_percent", self.discount_percent)?;
        validate_rate("lines.vat_rate", self.vat_rate)
    }
}

/// Validates a non-empty set of lines.
pub(crate) fn validate_lines(lines: &[LineItem]) -> Result<(), ValidationError> {
    if lines.is_empty() {
        return Err(ValidationError::new("lines", "at least one line is required"));
    }
    lines.iter().try_for_each(LineItem::validate)
}
