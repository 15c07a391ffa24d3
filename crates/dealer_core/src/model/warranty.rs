//! Vehicle warranty (garantie) sold with or after a vehicle sale.
//!
//! # Invariants
//! - `duration_months` is between 1 and 120.
//! - The warranty covers `start_date` up to, but excluding, `end_date()`.

use super::{require_amount, require_non_empty, DocId, Document, ValidationError};
use chrono::{Months, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const MAX_DURATION_MONTHS: u32 = 120;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Coverage {
    /// Engine, gearbox and transmission.
    Powertrain,
    /// Powertrain plus electrical and electronic components.
    Extended,
    /// Every mechanical and electrical part except wear items.
    Full,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warranty {
    pub id: DocId,
    pub vehicle_id: DocId,
    pub client_id: Option<DocId>,
    pub start_date: NaiveDate,
    pub duration_months: u32,
    /// Coverage stops at this odometer reading when set.
    pub max_mileage_km: Option<u32>,
    pub coverage: Coverage,
    pub price_ttc: Decimal,
    /// Insurer or in-house.
    pub provider: String,
    #[serde(default)]
    pub notes: String,
}

impl Warranty {
    pub fn new(
        vehicle_id: DocId,
        start_date: NaiveDate,
        duration_months: u32,
        coverage: Coverage,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            vehicle_id,
            client_id: None,
            start_date,
            duration_months,
            max_mileage_km: None,
            coverage,
            price_ttc: Decimal::ZERO,
            provider: "in-house".to_string(),
            notes: String::new(),
        }
    }

    /// First day no longer covered.
    ///
    /// Month arithmetic clamps to the last day of shorter months.
    pub fn end_date(&self) -> NaiveDate {
        self.start_date
            .checked_add_months(Months::new(self.duration_months))
            .unwrap_or(NaiveDate::MAX)
    }

    pub fn is_active_on(&self, date: NaiveDate) -> bool {
        date >= self.start_date && date < self.end_date()
    }

    /// Days left on `date`, zero once expired.
    pub fn days_remaining(&self, date: NaiveDate) -> i64 {
        (self.end_date() - date).num_days().max(0)
    }
}

impl Document for Warranty {
    const COLLECTION: &'static str = "warranties";

    fn id(&self) -> DocId {
        self.id
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if !(1..=MAX_DURATION_MONTHS).contains(&self.duration_months) {
            return Err(ValidationError::new(
                "duration_months",
                format!("must be between 1 and {MAX_DURATION_MONTHS}"),
            ));
        }
        require_non_empty("provider", &self.provider)?;
        require_amount("price_ttc", self.price_ttc)
    }
}

#[cfg(test)]
mod tests {
    use super::{Coverage, Warranty};
    use crate::model::Document;
    use chrono::NaiveDate;
    use uuid::Uuid;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn end_date_clamps_to_month_end() {
        let warranty = Warranty::new(Uuid::new_v4(), date(2026, 1, 31), 1, Coverage::Full);
        assert_eq!(warranty.end_date(), date(2026, 2, 28));
    }

    #[test]
    fn active_window_is_half_open() {
        let warranty = Warranty::new(Uuid::new_v4(), date(2026, 1, 15), 12, Coverage::Powertrain);
        assert!(!warranty.is_active_on(date(2026, 1, 14)));
        assert!(warranty.is_active_on(date(2026, 1, 15)));
        assert!(warranty.is_active_on(date(2027, 1, 14)));
        assert!(!warranty.is_active_on(date(2027, 1, 15)));
        assert_eq!(warranty.days_remaining(date(2027, 1, 5)), 10);
        assert_eq!(warranty.days_remaining(date(2028, 1, 1)), 0);
    }

    #[test]
    fn duration_is_bounded() {
        let mut warranty = Warranty::new(Uuid::new_v4(), date(2026, 1, 1), 0, Coverage::Extended);
        assert_eq!(warranty.validate().unwrap_err().field, "duration_months");
        warranty.duration_months = 121;
        assert!(warranty.validate().is_err());
        warranty.duration_months = 24;
        assert!(warranty.validate().is_ok());
    }
}
