//! Back-office dashboard figures.
//!
//! Aggregates are computed on read from the full collections; nothing is
//! cached or stored.

use super::ServiceResult;
use super::warranty_service::WarrantyService;
use crate::model::invoice::{Invoice, InvoiceStatus};
use crate::model::order::Order;
use crate::model::vehicle::{Vehicle, VehicleStatus};
use crate::model::UserId;
use crate::repo::document_repo::DocumentRepository;
use crate::store::DocumentStore;
use chrono::{Datelike, NaiveDate};
use log::debug;
use rust_decimal::Decimal;
use serde::Serialize;

/// Default look-ahead for expiring warranties.
pub const DEFAULT_WARRANTY_WINDOW_DAYS: u32 = 30;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DashboardSummary {
    pub vehicles_in_stock: usize,
    pub vehicles_reserved: usize,
    pub vehicles_sold: usize,
    /// Purchase price HT of unsold vehicles.
    pub stock_value_ht: Decimal,
    /// TTC of invoices paid in the current month.
    pub revenue_month_ttc: Decimal,
    /// TTC of invoices paid in the current year.
    pub revenue_year_ttc: Decimal,
    /// TTC of issued, unpaid invoices.
    pub outstanding_ttc: Decimal,
    pub open_orders: usize,
    pub expiring_warranties: usize,
}

pub struct DashboardService<S> {
    vehicles: DocumentRepository<S, Vehicle>,
    invoices: DocumentRepository<S, Invoice>,
    orders: DocumentRepository<S, Order>,
    warranties: WarrantyService<S>,
    warranty_window_days: u32,
}

impl<S: DocumentStore + Clone> DashboardService<S> {
    pub fn new(store: S, user: UserId) -> Self {
        Self {
            vehicles: DocumentRepository::new(store.clone(), user.clone()),
            invoices: DocumentRepository::new(store.clone(), user.clone()),
            orders: DocumentRepository::new(store.clone(), user.clone()),
            warranties: WarrantyService::new(store, user),
            warranty_window_days: DEFAULT_WARRANTY_WINDOW_DAYS,
        }
    }

    pub fn with_warranty_window(mut self, days: u32) -> Self {
        self.warranty_window_days = days;
        self
    }

    pub fn summary(&self, today: NaiveDate) -> ServiceResult<DashboardSummary> {
        let mut summary = DashboardSummary::default();

        for vehicle in self.vehicles.list()? {
            match vehicle.status {
                VehicleStatus::InStock => summary.vehicles_in_stock += 1,
                VehicleStatus::Reserved => summary.vehicles_reserved += 1,
                VehicleStatus::Sold => summary.vehicles_sold += 1,
            }
            if vehicle.status != VehicleStatus::Sold {
                summary.stock_value_ht += vehicle.purchase_price_ht;
            }
        }

        for invoice in self.invoices.list()? {
            if invoice.is_outstanding() {
                summary.outstanding_ttc += invoice.totals.total_ttc;
                continue;
            }
            if let (InvoiceStatus::Paid, Some(paid_on)) = (invoice.status, invoice.paid_on) {
                if paid_on.year() == today.year() {
                    summary.revenue_year_ttc += invoice.totals.total_ttc;
                    if paid_on.month() == today.month() {
                        summary.revenue_month_ttc += invoice.totals.total_ttc;
                    }
                }
            }
        }

        summary.open_orders = self
            .orders
            .list()?
            .iter()
            .filter(|order| order.is_open())
            .count();
        summary.expiring_warranties = self
            .warranties
            .expiring_within(self.warranty_window_days, today)?
            .len();

        debug!(
            "event=dashboard_summary module=dashboard status=ok vehicles={} open_orders={}",
            summary.vehicles_in_stock + summary.vehicles_reserved + summary.vehicles_sold,
            summary.open_orders
        );
        Ok(summary)
    }
}
