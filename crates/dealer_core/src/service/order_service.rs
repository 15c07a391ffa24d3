//! Workshop repair-order use-cases.
//!
//! # Invariants
//! - Lifecycle: `open -> in_progress -> completed -> invoiced`.
//! - Labor and parts can be added until the order is completed.
//! - An order is invoiced at most once.

use super::account_service::load_profile;
use super::invoice_service::{BillingDraft, InvoiceService};
use super::{ServiceError, ServiceResult};
use crate::model::client::Client;
use crate::model::invoice::Invoice;
use crate::model::line_item::LineItem;
use crate::model::order::{Order, OrderStatus, RepairTask};
use crate::model::vehicle::Vehicle;
use crate::model::worker::Worker;
use crate::model::{DocId, Document, UserId};
use crate::numbering::{next_number, DocumentKind};
use crate::pricing::Totals;
use crate::repo::document_repo::DocumentRepository;
use crate::store::DocumentStore;
use chrono::{Datelike, NaiveDate};
use log::info;
use rust_decimal::Decimal;

const OPEN_STATUSES: &[OrderStatus] = &[OrderStatus::Open, OrderStatus::InProgress];

/// Caller input for opening a repair order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderDraft {
    pub client_id: Option<DocId>,
    pub vehicle_id: Option<DocId>,
    pub opened_on: NaiveDate,
    pub mileage_km: Option<u32>,
    pub complaint: String,
}

pub struct OrderService<S> {
    store: S,
    user: UserId,
    orders: DocumentRepository<S, Order>,
    workers: DocumentRepository<S, Worker>,
    clients: DocumentRepository<S, Client>,
    vehicles: DocumentRepository<S, Vehicle>,
    invoicing: InvoiceService<S>,
}

impl<S: DocumentStore + Clone> OrderService<S> {
    pub fn new(store: S, user: UserId) -> Self {
        Self {
            orders: DocumentRepository::new(store.clone(), user.clone()),
            workers: DocumentRepository::new(store.clone(), user.clone()),
            clients: DocumentRepository::new(store.clone(), user.clone()),
            vehicles: DocumentRepository::new(store.clone(), user.clone()),
            invoicing: InvoiceService::new(store.clone(), user.clone()),
            store,
            user,
        }
    }

    /// Numbers and stores a new open order.
    pub fn open(&self, draft: &OrderDraft) -> ServiceResult<Order> {
        let profile = load_profile(&self.store, &self.user)?;
        if let Some(client_id) = draft.client_id {
            self.clients.require(client_id)?;
        }
        if let Some(vehicle_id) = draft.vehicle_id {
            self.vehicles.require(vehicle_id)?;
        }

        let mut order = Order::open(
            draft.opened_on,
            draft.complaint.clone(),
            profile.billing.default_vat_rate,
        );
        order.client_id = draft.client_id;
        order.vehicle_id = draft.vehicle_id;
        order.mileage_km = draft.mileage_km;
        order.validate()?;

        order.number = next_number(
            &self.store,
            &self.user,
            DocumentKind::Order,
            draft.opened_on.year(),
            DocumentKind::Order.prefix(&profile.billing),
        )?;
        self.orders.create(&order)?;
        info!("event=order_opened module=order status=ok order_id={}", order.id);
        Ok(order)
    }

    pub fn get(&self, id: DocId) -> ServiceResult<Option<Order>> {
        Ok(self.orders.get(id)?)
    }

    /// Orders, most recently opened first.
    pub fn list(&self) -> ServiceResult<Vec<Order>> {
        let mut orders = self.orders.list()?;
        orders.sort_by(|a, b| (b.opened_on, &b.number).cmp(&(a.opened_on, &a.number)));
        Ok(orders)
    }

    /// Orders the workshop still has to act on.
    pub fn list_open(&self) -> ServiceResult<Vec<Order>> {
        Ok(self.list()?.into_iter().filter(Order::is_open).collect())
    }

    /// Adds a labor task.
    ///
    /// Without an explicit rate the assigned worker's rate applies, then the
    /// account's workshop rate.
    pub fn add_task(
        &self,
        id: DocId,
        description: impl Into<String>,
        hours: Decimal,
        worker_id: Option<DocId>,
        hourly_rate_ht: Option<Decimal>,
    ) -> ServiceResult<Order> {
        let worker = worker_id
            .map(|worker_id| self.workers.require(worker_id))
            .transpose()?;
        if let Some(worker) = worker.as_ref().filter(|worker| !worker.active) {
            return Err(ServiceError::invalid_state(format!(
                "worker {} is inactive",
                worker.id
            )));
        }

        let rate = match (hourly_rate_ht, worker.as_ref()) {
            (Some(rate), _) => rate,
            (None, Some(worker)) => worker.hourly_rate_ht,
            (None, None) => load_profile(&self.store, &self.user)?.billing.labor_rate_ht,
        };

        let mut task = RepairTask::new(description, hours, rate);
        task.worker_id = worker_id;
        self.edit(id, |order| order.tasks.push(task))
    }

    pub fn add_part(&self, id: DocId, part: LineItem) -> ServiceResult<Order> {
        part.validate()?;
        self.edit(id, |order| order.parts.push(part))
    }

    pub fn start(&self, id: DocId) -> ServiceResult<Order> {
        self.transition(id, &[OrderStatus::Open], |order| {
            order.status = OrderStatus::InProgress;
        })
    }

    pub fn complete(&self, id: DocId, closed_on: NaiveDate) -> ServiceResult<Order> {
        self.transition(id, OPEN_STATUSES, |order| {
            order.status = OrderStatus::Completed;
            order.closed_on = Some(closed_on);
            for task in &mut order.tasks {
                task.done = true;
            }
        })
    }

    pub fn totals(&self, id: DocId) -> ServiceResult<Totals> {
        Ok(self.require(id)?.totals()?)
    }

    /// Bills a completed order's labor and parts on a new invoice.
    pub fn invoice_order(&self, id: DocId, issue_date: NaiveDate) -> ServiceResult<Invoice> {
        let mut order = self.require(id)?;
        if order.status != OrderStatus::Completed {
            return Err(ServiceError::invalid_state(format!(
                "order {} is {:?}; only completed orders can be invoiced",
                order.number, order.status
            )));
        }

        let mut draft = BillingDraft::new(issue_date, order.billable_lines());
        draft.client_id = order.client_id;
        draft.vehicle_id = order.vehicle_id;
        draft.notes = format!("Repair order {}", order.number);

        let order_id = order.id;
        let invoice = self
            .invoicing
            .create_linked_invoice(&draft, |invoice| invoice.order_id = Some(order_id))?;

        order.status = OrderStatus::Invoiced;
        order.invoice_id = Some(invoice.id);
        self.orders.update(&order)?;
        info!(
            "event=order_invoiced module=order status=ok order_id={id} invoice_id={}",
            invoice.id
        );
        Ok(invoice)
    }

    /// Deletes an order that has not been invoiced.
    pub fn delete(&self, id: DocId) -> ServiceResult<()> {
        let order = self.require(id)?;
        if order.status == OrderStatus::Invoiced {
            return Err(ServiceError::invalid_state(format!(
                "order {} is invoiced",
                order.number
            )));
        }
        Ok(self.orders.delete(id)?)
    }

    fn require(&self, id: DocId) -> ServiceResult<Order> {
        Ok(self.orders.require(id)?)
    }

    fn edit(&self, id: DocId, apply: impl FnOnce(&mut Order)) -> ServiceResult<Order> {
        self.transition(id, OPEN_STATUSES, apply)
    }

    fn transition(
        &self,
        id: DocId,
        allowed_from: &[OrderStatus],
        apply: impl FnOnce(&mut Order),
    ) -> ServiceResult<Order> {
        let mut order = self.require(id)?;
        if !allowed_from.contains(&order.status) {
            return Err(ServiceError::invalid_state(format!(
                "order {} is {:?}",
                order.number, order.status
            )));
        }
        apply(&mut order);
        self.orders.update(&order)?;
        Ok(order)
    }
}
