//! Dealership domain records.
//!
//! # Responsibility
//! - Define the flat, validated records stored one per document.
//! - Keep per-record validation next to the record it guards.
//!
//! # Invariants
//! - Every stored record is identified by a stable `DocId`.
//! - Cross-record references (`client_id`, `vehicle_id`, ...) are
//!   informative only; the store does not enforce them.

use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub mod account;
pub mod client;
pub mod deposit;
pub mod invoice;
pub mod line_item;
pub mod order;
pub mod proforma;
pub mod vehicle;
pub mod warranty;
pub mod worker;

/// Stable identifier of one stored record.
pub type DocId = Uuid;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex"));
static USER_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]{1,128}$").expect("valid user id regex"));

/// Record validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Offending field, in serialized naming.
    pub field: &'static str,
    pub reason: String,
}

impl ValidationError {
    pub fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid `{}`: {}", self.field, self.reason)
    }
}

impl Error for ValidationError {}

/// A record stored as one document of a named collection.
pub trait Document: Serialize + DeserializeOwned {
    /// Collection name inside the owning user's namespace.
    const COLLECTION: &'static str;

    fn id(&self) -> DocId;

    /// Checks record-local invariants.
    fn validate(&self) -> Result<(), ValidationError>;
}

/// Owner of a document namespace.
///
/// Every read and write is scoped to exactly one user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(String);

impl UserId {
    /// Parses an opaque account identifier (`[A-Za-z0-9_-]{1,128}`).
    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        let trimmed = value.trim();
        if !USER_ID_RE.is_match(trimmed) {
            return Err(ValidationError::new(
                "user_id",
                format!("`{trimmed}` must be 1-128 chars of [A-Za-z0-9_-]"),
            ));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for UserId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for UserId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<UserId> for String {
    fn from(value: UserId) -> Self {
        value.0
    }
}

/// Postal address shared by clients and the account profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub street: String,
    pub postal_code: String,
    pub city: String,
    #[serde(default = "default_country")]
    pub country: String,
}

fn default_country() -> String {
    "FR".to_string()
}

pub(crate) fn require_non_empty(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new(field, "must not be empty"));
    }
    Ok(())
}

pub(crate) fn validate_optional_email(
    field: &'static str,
    value: Option<&str>,
) -> Result<(), ValidationError> {
    match value {
        Some(email) if !EMAIL_RE.is_match(email.trim()) => Err(ValidationError::new(
            field,
            format!("`{email}` is not an email address"),
        )),
        _ => Ok(()),
    }
}

/// Largest money amount a record may carry (one trillion).
pub fn max_amount() -> Decimal {
    Decimal::new(1_000_000_000_000, 0)
}

/// Largest quantity or number of labor hours on one line.
pub fn max_quantity() -> Decimal {
    Decimal::new(1_000_000, 0)
}

/// Accepts amounts in `0..=max_amount()`.
///
/// The bound keeps every price computation inside `Decimal` range.
pub fn require_amount(field: &'static str, value: Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(ValidationError::new(field, "must not be negative"));
    }
    if value > max_amount() {
        return Err(ValidationError::new(
            field,
            format!("must not exceed {}", max_amount()),
        ));
    }
    Ok(())
}

pub(crate) fn require_quantity(field: &'static str, value: Decimal) -> Result<(), ValidationError> {
    if value > max_quantity() {
        return Err(ValidationError::new(
            field,
            format!("must not exceed {}", max_quantity()),
        ));
    }
    Ok(())
}

/// Accepts percentages in `0..=100`.
pub fn validate_rate(field: &'static str, value: Decimal) -> Result<(), ValidationError> {
    if value < Decimal::ZERO || value > Decimal::ONE_HUNDRED {
        return Err(ValidationError::new(field, "must be between 0 and 100"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{max_amount, require_amount, validate_optional_email, UserId};
    use rust_decimal::Decimal;

    #[test]
    fn user_id_rejects_path_like_values() {
        assert!(UserId::parse("dealer_42").is_ok());
        assert!(UserId::parse("  padded-id ").is_ok());
        assert!(UserId::parse("").is_err());
        assert!(UserId::parse("users/other").is_err());
    }

    #[test]
    fn user_id_serializes_as_plain_string() {
        let id = UserId::parse("abc").unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"abc\"");
        let err = serde_json::from_str::<UserId>("\"a b\"");
        assert!(err.is_err());
    }

    #[test]
    fn email_check_accepts_absent_and_rejects_garbage() {
        assert!(validate_optional_email("email", None).is_ok());
        assert!(validate_optional_email("email", Some("a@b.fr")).is_ok());
        assert!(validate_optional_email("email", Some("nope")).is_err());
    }

    #[test]
    fn amounts_are_bounded_on_both_sides() {
        assert!(require_amount("price", Decimal::ZERO).is_ok());
        assert!(require_amount("price", max_amount()).is_ok());
        assert_eq!(
            require_amount("price", Decimal::NEGATIVE_ONE).unwrap_err().reason,
            "must not be negative"
        );
        assert!(require_amount("price", max_amount() + Decimal::ONE).is_err());
    }
}
