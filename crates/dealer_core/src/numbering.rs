//! Sequential numbering of billing and workshop documents.
//!
//! # Invariants
//! - Sequences are per user, per document kind, per calendar year.
//! - Sequences start at 1 and never reuse a value, even after deletes.
//! - Numbers render as `{prefix}-{year}-{seq:04}`; wider sequences keep
//!   all their digits.
//!
//! Counters are plain documents of the `counters` collection, so numbering
//! inherits the store's single-shot semantics: two concurrent writers for
//! the same user may observe the same value.

use crate::model::account::BillingSettings;
use crate::model::UserId;
use crate::store::{DocumentStore, StoreResult};
use log::debug;
use serde_json::json;

const COUNTERS_COLLECTION: &str = "counters";

/// Kind of numbered document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Invoice,
    Proforma,
    Deposit,
    Order,
}

impl DocumentKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Invoice => "invoice",
            Self::Proforma => "proforma",
            Self::Deposit => "deposit",
            Self::Order => "order",
        }
    }

    /// Prefix configured for this kind.
    pub fn prefix(self, settings: &BillingSettings) -> &str {
        match self {
            Self::Invoice => &settings.invoice_prefix,
            Self::Proforma => &settings.proforma_prefix,
            Self::Deposit => &settings.deposit_prefix,
            Self::Order => &settings.order_prefix,
        }
    }
}

/// Renders a document number.
pub fn format_number(prefix: &str, year: i32, sequence: u64) -> String {
    format!("{prefix}-{year}-{sequence:04}")
}

/// Reserves and renders the next number for `kind` in `year`.
pub fn next_number<S: DocumentStore>(
    store: &S,
    user: &UserId,
    kind: DocumentKind,
    year: i32,
    prefix: &str,
) -> StoreResult<String> {
    let key = format!("{}-{year}", kind.as_str());
    let current = store
        .get(user, COUNTERS_COLLECTION, &key)?
        .and_then(|body| body.get("next").and_then(|next| next.as_u64()))
        .unwrap_or(1)
        .max(1);

    store.set(
        user,
        COUNTERS_COLLECTION,
        &key,
        &json!({ "kind": kind.as_str(), "year": year, "next": current + 1 }),
    )?;

    debug!(
        "event=number_issued module=numbering status=ok kind={} year={year} sequence={current}",
        kind.as_str()
    );
    Ok(format_number(prefix, year, current))
}

#[cfg(test)]
mod tests {
    use super::format_number;

    #[test]
    fn pads_to_four_digits_without_truncating() {
        assert_eq!(format_number("FA", 2026, 7), "FA-2026-0007");
        assert_eq!(format_number("OR", 2026, 12345), "OR-2026-12345");
    }
}
