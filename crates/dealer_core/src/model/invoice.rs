//! Final sale/repair invoice.
//!
//! # Invariants
//! - `totals` always equals `Totals::from_lines(&lines)` once persisted.
//! - `due_date`, when set, is not earlier than `issue_date`.
//! - A paid invoice records its payment date and method.

use super::line_item::{validate_lines, LineItem};
use super::{DocId, Document, ValidationError};
use crate::pricing::Totals;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    Draft,
    Issued,
    Paid,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Card,
    BankTransfer,
    Cheque,
    Financing,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: DocId,
    /// Assigned by numbering on creation, e.g. `FA-2026-0001`.
    pub number: String,
    pub client_id: Option<DocId>,
    pub vehicle_id: Option<DocId>,
    /// Repair order this invoice bills, if any.
    pub order_id: Option<DocId>,
    /// Proforma this invoice was converted from, if any.
    pub proforma_id: Option<DocId>,
    pub issue_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub lines: Vec<LineItem>,
    #[serde(default)]
    pub totals: Totals,
    /// Margin-scheme VAT embedded in a zero-rated vehicle line.
    #[serde(default)]
    pub margin_vat: Decimal,
    pub status: InvoiceStatus,
    /// Deposits deducted from the balance.
    #[serde(default)]
    pub deposit_ids: Vec<DocId>,
    pub payment_method: Option<PaymentMethod>,
    pub paid_on: Option<NaiveDate>,
    #[serde(default)]
    pub notes: String,
}

impl Invoice {
    /// Creates a draft with computed totals and an unassigned number.
    pub fn draft(issue_date: NaiveDate, lines: Vec<LineItem>) -> Result<Self, ValidationError> {
        let totals = Totals::from_lines(&lines)?;
        Ok(Self {
            id: Uuid::new_v4(),
            number: String::new(),
            client_id: None,
            vehicle_id: None,
            order_id: None,
            proforma_id: None,
            issue_date,
            due_date: None,
            lines,
            totals,
            margin_vat: Decimal::ZERO,
            status: InvoiceStatus::Draft,
            deposit_ids: Vec::new(),
            payment_method: None,
            paid_on: None,
            notes: String::new(),
        })
    }

    /// Whether the invoice still counts towards receivables.
    pub fn is_outstanding(&self) -> bool {
        self.status == InvoiceStatus::Issued
    }
}

impl Document for Invoice {
    const COLLECTION: &'static str = "invoices";

    fn id(&self) -> DocId {
        self.id
    }

    fn validate(&self) -> Result<(), ValidationError> {
        validate_lines(&self.lines)?;
        validate_due_date("due_date", self.issue_date, self.due_date)?;
        if self.status == InvoiceStatus::Paid
            && (self.paid_on.is_none() || self.payment_method.is_none())
        {
            return Err(ValidationError::new(
                "paid_on",
                "a paid invoice records payment date and method",
            ));
        }
        Ok(())
    }
}

pub(crate) fn validate_due_date(
    field: &'static str,
    issue_date: NaiveDate,
    due_date: Option<NaiveDate>,
) -> Result<(), ValidationError> {
    match due_date {
        Some(due) if due < issue_date => Err(ValidationError::new(
            field,
            format!("{due} is before issue date {issue_date}"),
        )),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::{Invoice, InvoiceStatus};
    use crate::model::line_item::LineItem;
    use crate::model::Document;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, day).unwrap()
    }

    fn one_line() -> Vec<LineItem> {
        vec![LineItem::new(
            "Service",
            Decimal::ONE,
            Decimal::new(100, 0),
            Decimal::new(20, 0),
        )]
    }

    #[test]
    fn draft_computes_totals() {
        let invoice = Invoice::draft(date(1), one_line()).unwrap();
        assert_eq!(invoice.totals.total_ttc, Decimal::new(120, 0));
        assert_eq!(invoice.status, InvoiceStatus::Draft);
        assert!(invoice.validate().is_ok());
    }

    #[test]
    fn due_date_before_issue_date_is_rejected() {
        let mut invoice = Invoice::draft(date(10), one_line()).unwrap();
        invoice.due_date = Some(date(9));
        assert_eq!(invoice.validate().unwrap_err().field, "due_date");
    }

    #[test]
    fn draft_rejects_lines_beyond_decimal_range() {
        let line = LineItem::new(
            "Fleet",
            Decimal::new(1_000_000_000_000_000, 0),
            Decimal::new(1_000_000_000_000_000, 0),
            Decimal::new(20, 0),
        );
        assert_eq!(Invoice::draft(date(1), vec![line]).unwrap_err().field, "lines");
    }

    #[test]
    fn paid_invoice_needs_payment_details() {
        let mut invoice = Invoice::draft(date(1), one_line()).unwrap();
        invoice.status = InvoiceStatus::Paid;
        assert_eq!(invoice.validate().unwrap_err().field, "paid_on");
    }
}
