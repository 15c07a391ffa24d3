//! Deposit invoice (acompte) issued ahead of the final invoice.
//!
//! # Invariants
//! - `amount_ttc` is strictly positive and bounded by `max_amount`.
//! - `amount_ht`/`vat` are derived from `amount_ttc` and `vat_rate`.
//! - An applied deposit references the invoice it was deducted from.

use super::{require_amount, validate_rate, DocId, Document, ValidationError};
use crate::pricing::ht_from_ttc;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepositStatus {
    Pending,
    Applied,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deposit {
    pub id: DocId,
    pub number: String,
    pub client_id: Option<DocId>,
    pub vehicle_id: Option<DocId>,
    pub issue_date: NaiveDate,
    pub amount_ttc: Decimal,
    pub vat_rate: Decimal,
    pub amount_ht: Decimal,
    pub vat: Decimal,
    pub status: DepositStatus,
    pub invoice_id: Option<DocId>,
    #[serde(default)]
    pub notes: String,
}

impl Deposit {
    /// Creates a pending deposit, splitting `amount_ttc` into HT and VAT.
    pub fn new(
        issue_date: NaiveDate,
        amount_ttc: Decimal,
        vat_rate: Decimal,
    ) -> Result<Self, ValidationError> {
        require_amount("amount_ttc", amount_ttc)?;
        validate_rate("vat_rate", vat_rate)?;
        let amount_ht = ht_from_ttc(amount_ttc, vat_rate);
        Ok(Self {
            id: Uuid::new_v4(),
            number: String::new(),
            client_id: None,
            vehicle_id: None,
            issue_date,
            amount_ttc,
            vat_rate,
            amount_ht,
            vat: amount_ttc - amount_ht,
            status: DepositStatus::Pending,
            invoice_id: None,
            notes: String::new(),
        })
    }
}

impl Document for Deposit {
    const COLLECTION: &'static str = "deposits";

    fn id(&self) -> DocId {
        self.id
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if self.amount_ttc <= Decimal::ZERO {
            return Err(ValidationError::new(
                "amount_ttc",
                "must be greater than zero",
            ));
        }
        require_amount("amount_ttc", self.amount_ttc)?;
        validate_rate("vat_rate", self.vat_rate)?;
        if self.amount_ht + self.vat != self.amount_ttc {
            return Err(ValidationError::new(
                "amount_ht",
                "HT and VAT must add up to the TTC amount",
            ));
        }
        if self.status == DepositStatus::Applied && self.invoice_id.is_none() {
            return Err(ValidationError::new(
                "invoice_id",
                "an applied deposit references its invoice",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::Deposit;
    use crate::model::Document;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    #[test]
    fn new_deposit_splits_ttc_into_ht_and_vat() {
        let date = NaiveDate::from_ymd_opt(2026, 5, 2).unwrap();
        let deposit = Deposit::new(date, Decimal::new(1_000, 0), Decimal::new(20, 0)).unwrap();
        assert_eq!(deposit.amount_ht, Decimal::new(83_333, 2));
        assert_eq!(deposit.vat, Decimal::new(16_667, 2));
        assert!(deposit.validate().is_ok());

        let zero = Deposit::new(date, Decimal::ZERO, Decimal::new(20, 0)).unwrap();
        assert_eq!(zero.validate().unwrap_err().field, "amount_ttc");
    }

    #[test]
    fn out_of_range_rate_is_rejected_before_splitting() {
        let date = NaiveDate::from_ymd_opt(2026, 5, 2).unwrap();
        let err = Deposit::new(date, Decimal::new(500, 0), Decimal::new(-100, 0)).unwrap_err();
        assert_eq!(err.field, "vat_rate");
        let err = Deposit::new(date, Decimal::MAX, Decimal::new(20, 0)).unwrap_err();
        assert_eq!(err.field, "amount_ttc");
    }
}
