//! Proforma (non-binding quote issued before a sale).

use super::invoice::validate_due_date;
use super::line_item::{validate_lines, LineItem};
use super::{DocId, Document, ValidationError};
use crate::pricing::Totals;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProformaStatus {
    Pending,
    Accepted,
    Rejected,
    Converted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proforma {
    pub id: DocId,
    pub number: String,
    pub client_id: Option<DocId>,
    pub vehicle_id: Option<DocId>,
    pub issue_date: NaiveDate,
    pub valid_until: Option<NaiveDate>,
    pub lines: Vec<LineItem>,
    #[serde(default)]
    pub totals: Totals,
    pub status: ProformaStatus,
    /// Set once the proforma is converted.
    pub invoice_id: Option<DocId>,
    #[serde(default)]
    pub notes: String,
}

impl Proforma {
    pub fn draft(issue_date: NaiveDate, lines: Vec<LineItem>) -> Result<Self, ValidationError> {
        let totals = Totals::from_lines(&lines)?;
        Ok(Self {
            id: Uuid::new_v4(),
            number: String::new(),
            client_id: None,
            vehicle_id: None,
            issue_date,
            valid_until: None,
            lines,
            totals,
            status: ProformaStatus::Pending,
            invoice_id: None,
            notes: String::new(),
        })
    }

    pub fn is_expired_on(&self, today: NaiveDate) -> bool {
        self.valid_until.is_some_and(|limit| today > limit)
    }
}

impl Document for Proforma {
    const COLLECTION: &'static str = "proformas";

    fn id(&self) -> DocId {
        self.id
    }

    fn validate(&self) -> Result<(), ValidationError> {
        validate_lines(&self.lines)?;
        validate_due_date("valid_until", self.issue_date, self.valid_until)?;
        if self.status == ProformaStatus::Converted && self.invoice_id.is_none() {
            return Err(ValidationError::new(
                "invoice_id",
                "a converted proforma references its invoice",
            ));
        }
        Ok(())
    }
}
