//! Workshop repair order.
//!
//! Labor tasks and parts are billed together when the order is invoiced.

use super::line_item::LineItem;
use super::{
    require_amount, require_non_empty, require_quantity, validate_rate, DocId, Document,
    ValidationError,
};
use crate::pricing::Totals;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Open,
    InProgress,
    Completed,
    Invoiced,
}

/// Labor performed on the vehicle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepairTask {
    pub description: String,
    pub worker_id: Option<DocId>,
    pub hours: Decimal,
    pub hourly_rate_ht: Decimal,
    #[serde(default)]
    pub done: bool,
}

impl RepairTask {
    pub fn new(description: impl Into<String>, hours: Decimal, hourly_rate_ht: Decimal) -> Self {
        Self {
            description: description.into(),
            worker_id: None,
            hours,
            hourly_rate_ht,
            done: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: DocId,
    pub number: String,
    pub client_id: Option<DocId>,
    pub vehicle_id: Option<DocId>,
    pub opened_on: NaiveDate,
    pub closed_on: Option<NaiveDate>,
    pub mileage_km: Option<u32>,
    /// Customer-reported problem.
    pub complaint: String,
    #[serde(default)]
    pub tasks: Vec<RepairTask>,
    #[serde(default)]
    pub parts: Vec<LineItem>,
    /// Rate applied to labor lines.
    pub labor_vat_rate: Decimal,
    pub status: OrderStatus,
    pub invoice_id: Option<DocId>,
}

impl Order {
    pub fn open(opened_on: NaiveDate, complaint: impl Into<String>, labor_vat_rate: Decimal) -> Self {
        Self {
            id: Uuid::new_v4(),
            number: String::new(),
            client_id: None,
            vehicle_id: None,
            opened_on,
            closed_on: None,
            mileage_km: None,
            complaint: complaint.into(),
            tasks: Vec::new(),
            parts: Vec::new(),
            labor_vat_rate,
            status: OrderStatus::Open,
            invoice_id: None,
        }
    }

    /// Labor tasks followed by parts, as billable lines.
    ///
    /// Zero-hour tasks (free inspections) cost nothing and are left out.
    pub fn billable_lines(&self) -> Vec<LineItem> {
        self.tasks
            .iter()
            .filter(|task| !task.hours.is_zero())
            .map(|task| {
                LineItem::new(
                    format!("Labor: {}", task.description),
                    task.hours,
                    task.hourly_rate_ht,
                    self.labor_vat_rate,
                )
            })
            .chain(self.parts.iter().cloned())
            .collect()
    }

    pub fn totals(&self) -> Result<Totals, ValidationError> {
        Totals::from_lines(&self.billable_lines())
    }

    pub fn labor_hours(&self) -> Decimal {
        self.tasks.iter().map(|task| task.hours).sum()
    }

    /// Whether the workshop still has to act on the order.
    pub fn is_open(&self) -> bool {
        matches!(self.status, OrderStatus::Open | OrderStatus::InProgress)
    }
}

impl Document for Order {
    const COLLECTION: &'static str = "orders";

    fn id(&self) -> DocId {
        self.id
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require_non_empty("complaint", &self.complaint)?;
        validate_rate("labor_vat_rate", self.labor_vat_rate)?;
        for task in &self.tasks {
            require_non_empty("tasks.description", &task.description)?;
            if task.hours < Decimal::ZERO {
                return Err(ValidationError::new("tasks.hours", "must not be negative"));
            }
            require_quantity("tasks.hours", task.hours)?;
            require_amount("tasks.hourly_rate_ht", task.hourly_rate_ht)?;
        }
        self.parts.iter().try_for_each(LineItem::validate)?;
        if let Some(closed) = self.closed_on {
            if closed < self.opened_on {
                return Err(ValidationError::new(
                    "closed_on",
                    format!("{closed} is before opening date {}", self.opened_on),
                ));
            }
        }
        if self.status == OrderStatus::Invoiced && self.invoice_id.is_none() {
            return Err(ValidationError::new(
                "invoice_id",
                "an invoiced order references its invoice",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{Order, RepairTask};
    use crate::model::line_item::LineItem;
    use crate::model::Document;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    #[test]
    fn totals_combine_labor_and_parts() {
        let opened = NaiveDate::from_ymd_opt(2026, 4, 1).unwrap();
        let mut order = Order::open(opened, "Brake noise", Decimal::new(20, 0));
        order.tasks.push(RepairTask::new(
            "Replace pads",
            Decimal::new(15, 1),
            Decimal::new(60, 0),
        ));
        order.parts.push(LineItem::new(
            "Brake pads",
            Decimal::ONE,
            Decimal::new(45, 0),
            Decimal::new(20, 0),
        ));

        let totals = order.totals().unwrap();
        assert_eq!(totals.total_ht, Decimal::new(135, 0));
        assert_eq!(totals.total_ttc, Decimal::new(162, 0));
        assert_eq!(order.labor_hours(), Decimal::new(15, 1));
        assert!(order.validate().is_ok());
    }

    #[test]
    fn zero_hour_task_is_valid_but_not_billed() {
        let opened = NaiveDate::from_ymd_opt(2026, 4, 1).unwrap();
        let mut order = Order::open(opened, "Pre-purchase check", Decimal::new(20, 0));
        order
            .tasks
            .push(RepairTask::new("Inspection", Decimal::ZERO, Decimal::new(60, 0)));
        assert!(order.validate().is_ok());
        assert!(order.billable_lines().is_empty());

        order.tasks[0].hours = Decimal::NEGATIVE_ONE;
        assert_eq!(order.validate().unwrap_err().field, "tasks.hours");
    }

    #[test]
    fn blank_complaint_is_rejected() {
        let opened = NaiveDate::from_ymd_opt(2026, 4, 1).unwrap();
        let order = Order::open(opened, " ", Decimal::new(20, 0));
        assert_eq!(order.validate().unwrap_err().field, "complaint");
    }
}
