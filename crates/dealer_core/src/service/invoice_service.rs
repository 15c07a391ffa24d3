//! Invoicing use-cases: invoices, proformas and deposits.
//!
//! # Responsibility
//! - Number new documents and compute their totals.
//! - Move documents through their status lifecycles.
//! - Deduct deposits from final invoices.
//!
//! # Invariants
//! - Invoice: `draft -> issued -> paid`; `draft|issued -> cancelled`.
//! - Proforma: `pending -> accepted|rejected`; `pending|accepted -> converted`,
//!   at most once.
//! - Deposit: `pending -> applied`, to exactly one invoice of the same client.
//! - Only draft invoices can be deleted.

use super::account_service::load_profile;
use super::vehicle_service::ensure_sellable_to;
use super::{ServiceError, ServiceResult};
use crate::model::account::UserProfile;
use crate::model::client::Client;
use crate::model::deposit::{Deposit, DepositStatus};
use crate::model::invoice::{Invoice, InvoiceStatus, PaymentMethod};
use crate::model::line_item::LineItem;
use crate::model::proforma::{Proforma, ProformaStatus};
use crate::model::vehicle::{VatRegime, Vehicle, VehicleStatus};
use crate::model::{DocId, Document, UserId};
use crate::numbering::{next_number, DocumentKind};
use crate::pricing::balance_due;
use crate::repo::document_repo::DocumentRepository;
use crate::store::DocumentStore;
use chrono::{Datelike, Days, NaiveDate};
use log::info;
use rust_decimal::Decimal;

/// Caller input shared by invoices and proformas.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BillingDraft {
    pub client_id: Option<DocId>,
    pub vehicle_id: Option<DocId>,
    pub issue_date: NaiveDate,
    /// Payment due date for invoices, validity limit for proformas.
    ///
    /// Defaults to `issue_date + payment_terms_days` when absent.
    pub due_date: Option<NaiveDate>,
    pub lines: Vec<LineItem>,
    pub notes: String,
}

impl BillingDraft {
    pub fn new(issue_date: NaiveDate, lines: Vec<LineItem>) -> Self {
        Self {
            client_id: None,
            vehicle_id: None,
            issue_date,
            due_date: None,
            lines,
            notes: String::new(),
        }
    }
}

/// Caller input for a deposit invoice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepositDraft {
    pub client_id: Option<DocId>,
    pub vehicle_id: Option<DocId>,
    pub issue_date: NaiveDate,
    pub amount_ttc: Decimal,
    /// Defaults to the account's VAT rate.
    pub vat_rate: Option<Decimal>,
}

/// Invoicing service.
pub struct InvoiceService<S> {
    store: S,
    user: UserId,
    invoices: DocumentRepository<S, Invoice>,
    proformas: DocumentRepository<S, Proforma>,
    deposits: DocumentRepository<S, Deposit>,
    clients: DocumentRepository<S, Client>,
    vehicles: DocumentRepository<S, Vehicle>,
}

impl<S: DocumentStore + Clone> InvoiceService<S> {
    pub fn new(store: S, user: UserId) -> Self {
        Self {
            invoices: DocumentRepository::new(store.clone(), user.clone()),
            proformas: DocumentRepository::new(store.clone(), user.clone()),
            deposits: DocumentRepository::new(store.clone(), user.clone()),
            clients: DocumentRepository::new(store.clone(), user.clone()),
            vehicles: DocumentRepository::new(store.clone(), user.clone()),
            store,
            user,
        }
    }

    /// Numbers and stores a new draft invoice.
    pub fn create_invoice(&self, draft: &BillingDraft) -> ServiceResult<Invoice> {
        self.create_linked_invoice(draft, |_| {})
    }

    /// Invoices a stock vehicle to a client and marks the vehicle sold.
    ///
    /// Margin-scheme vehicles are billed on one zero-rated line at the TTC
    /// price; the VAT embedded in the margin is kept in `margin_vat`.
    pub fn invoice_vehicle_sale(
        &self,
        vehicle_id: DocId,
        client_id: DocId,
        issue_date: NaiveDate,
        extra_lines: Vec<LineItem>,
    ) -> ServiceResult<Invoice> {
        let mut vehicle = self.vehicles.require(vehicle_id)?;
        ensure_sellable_to(&vehicle, client_id)?;

        let vehicle_line = match vehicle.vat_regime {
            VatRegime::Normal => LineItem::new(
                vehicle.label(),
                Decimal::ONE,
                vehicle.sale_price_ht(),
                vehicle.vat_rate,
            ),
            VatRegime::Margin => LineItem::new(
                format!("{} (VAT on margin)", vehicle.label()),
                Decimal::ONE,
                vehicle.sale_price_ttc,
                Decimal::ZERO,
            ),
        };

        let mut lines = vec![vehicle_line];
        lines.extend(extra_lines);
        let mut draft = BillingDraft::new(issue_date, lines);
        draft.client_id = Some(client_id);
        draft.vehicle_id = Some(vehicle_id);

        let margin_vat = vehicle.margin_vat();
        let invoice = self.create_linked_invoice(&draft, |invoice| invoice.margin_vat = margin_vat)?;

        vehicle.status = VehicleStatus::Sold;
        vehicle.client_id = Some(client_id);
        vehicle.sold_on = Some(issue_date);
        self.vehicles.update(&vehicle)?;
        info!(
            "event=vehicle_invoiced module=invoice status=ok vehicle_id={vehicle_id} invoice_id={}",
            invoice.id
        );
        Ok(invoice)
    }

    pub fn get(&self, id: DocId) -> ServiceResult<Option<Invoice>> {
        Ok(self.invoices.get(id)?)
    }

    pub fn require(&self, id: DocId) -> ServiceResult<Invoice> {
        Ok(self.invoices.require(id)?)
    }

    /// Invoices, newest issue date first.
    pub fn list(&self) -> ServiceResult<Vec<Invoice>> {
        let mut invoices = self.invoices.list()?;
        sort_newest_first(&mut invoices, |invoice| (invoice.issue_date, invoice.number.clone()));
        Ok(invoices)
    }

    pub fn list_for_client(&self, client_id: DocId) -> ServiceResult<Vec<Invoice>> {
        let mut invoices = self.invoices.find_by("client_id", client_id.to_string())?;
        sort_newest_first(&mut invoices, |invoice| (invoice.issue_date, invoice.number.clone()));
        Ok(invoices)
    }

    /// Deletes a draft. Issued invoices must be cancelled instead.
    pub fn delete(&self, id: DocId) -> ServiceResult<()> {
        let invoice = self.invoices.require(id)?;
        if invoice.status != InvoiceStatus::Draft {
            return Err(ServiceError::invalid_state(format!(
                "invoice {} is {:?}; only drafts can be deleted",
                invoice.number, invoice.status
            )));
        }
        Ok(self.invoices.delete(id)?)
    }

    pub fn issue(&self, id: DocId) -> ServiceResult<Invoice> {
        self.transition(id, &[InvoiceStatus::Draft], |invoice| {
            invoice.status = InvoiceStatus::Issued;
        })
    }

    pub fn mark_paid(
        &self,
        id: DocId,
        method: PaymentMethod,
        paid_on: NaiveDate,
    ) -> ServiceResult<Invoice> {
        let invoice = self.transition(id, &[InvoiceStatus::Issued], |invoice| {
            invoice.status = InvoiceStatus::Paid;
            invoice.payment_method = Some(method);
            invoice.paid_on = Some(paid_on);
        })?;
        info!(
            "event=invoice_paid module=invoice status=ok invoice_id={id} method={method:?}"
        );
        Ok(invoice)
    }

    pub fn cancel(&self, id: DocId) -> ServiceResult<Invoice> {
        self.transition(
            id,
            &[InvoiceStatus::Draft, InvoiceStatus::Issued],
            |invoice| invoice.status = InvoiceStatus::Cancelled,
        )
    }

    /// Deducts a pending deposit from an unpaid invoice.
    pub fn apply_deposit(&self, invoice_id: DocId, deposit_id: DocId) -> ServiceResult<Invoice> {
        let mut invoice = self.invoices.require(invoice_id)?;
        if !matches!(invoice.status, InvoiceStatus::Draft | InvoiceStatus::Issued) {
            return Err(ServiceError::invalid_state(format!(
                "invoice {} is {:?}; deposits apply to unpaid invoices only",
                invoice.number, invoice.status
            )));
        }

        let mut deposit = self.deposits.require(deposit_id)?;
        if deposit.status != DepositStatus::Pending {
            return Err(ServiceError::invalid_state(format!(
                "deposit {} is already applied",
                deposit.number
            )));
        }
        if invoice.client_id != deposit.client_id {
            return Err(ServiceError::invalid_state(format!(
                "deposit {} was not taken from this invoice's client",
                deposit.number
            )));
        }

        // Deposit is written first: it must never stay pending while listed
        // on an invoice.
        deposit.status = DepositStatus::Applied;
        deposit.invoice_id = Some(invoice_id);
        self.deposits.update(&deposit)?;
        invoice.deposit_ids.push(deposit_id);
        self.invoices.update(&invoice)?;
        info!(
            "event=deposit_applied module=invoice status=ok invoice_id={invoice_id} deposit_id={deposit_id}"
        );
        Ok(invoice)
    }

    /// TTC amount still owed after applied deposits.
    pub fn balance_due(&self, id: DocId) -> ServiceResult<Decimal> {
        let invoice = self.invoices.require(id)?;
        if invoice.status == InvoiceStatus::Paid || invoice.status == InvoiceStatus::Cancelled {
            return Ok(Decimal::ZERO);
        }
        let deposits = invoice
            .deposit_ids
            .iter()
            .map(|deposit_id| {
                self.deposits
                    .require(*deposit_id)
                    .map(|deposit| deposit.amount_ttc)
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(balance_due(invoice.totals.total_ttc, deposits))
    }

    /// Numbers and stores a pending proforma.
    pub fn create_proforma(&self, draft: &BillingDraft) -> ServiceResult<Proforma> {
        let profile = self.profile()?;
        self.check_references(draft.client_id, draft.vehicle_id)?;

        let mut proforma = Proforma::draft(draft.issue_date, draft.lines.clone())?;
        proforma.client_id = draft.client_id;
        proforma.vehicle_id = draft.vehicle_id;
        proforma.valid_until = Some(due_date_or_default(draft, &profile));
        proforma.notes = draft.notes.clone();
        proforma.validate()?;

        proforma.number = self.next_number(DocumentKind::Proforma, draft.issue_date, &profile)?;
        self.proformas.create(&proforma)?;
        info!(
            "event=proforma_created module=invoice status=ok proforma_id={}",
            proforma.id
        );
        Ok(proforma)
    }

    pub fn get_proforma(&self, id: DocId) -> ServiceResult<Option<Proforma>> {
        Ok(self.proformas.get(id)?)
    }

    pub fn list_proformas(&self) -> ServiceResult<Vec<Proforma>> {
        let mut proformas = self.proformas.list()?;
        sort_newest_first(&mut proformas, |proforma| {
            (proforma.issue_date, proforma.number.clone())
        });
        Ok(proformas)
    }

    pub fn accept_proforma(&self, id: DocId) -> ServiceResult<Proforma> {
        self.proforma_transition(id, ProformaStatus::Accepted)
    }

    pub fn reject_proforma(&self, id: DocId) -> ServiceResult<Proforma> {
        self.proforma_transition(id, ProformaStatus::Rejected)
    }

    /// Turns a pending or accepted proforma into a draft invoice.
    pub fn convert_proforma(&self, id: DocId, issue_date: NaiveDate) -> ServiceResult<Invoice> {
        let mut proforma = self.proformas.require(id)?;
        if !matches!(
            proforma.status,
            ProformaStatus::Pending | ProformaStatus::Accepted
        ) {
            return Err(ServiceError::invalid_state(format!(
                "proforma {} is {:?} and cannot be converted",
                proforma.number, proforma.status
            )));
        }

        let mut draft = BillingDraft::new(issue_date, proforma.lines.clone());
        draft.client_id = proforma.client_id;
        draft.vehicle_id = proforma.vehicle_id;
        draft.notes = proforma.notes.clone();

        let proforma_id = proforma.id;
        let invoice =
            self.create_linked_invoice(&draft, |invoice| invoice.proforma_id = Some(proforma_id))?;

        proforma.status = ProformaStatus::Converted;
        proforma.invoice_id = Some(invoice.id);
        self.proformas.update(&proforma)?;
        info!(
            "event=proforma_converted module=invoice status=ok proforma_id={id} invoice_id={}",
            invoice.id
        );
        Ok(invoice)
    }

    /// Numbers and stores a pending deposit invoice.
    pub fn create_deposit(&self, draft: &DepositDraft) -> ServiceResult<Deposit> {
        let profile = self.profile()?;
        self.check_references(draft.client_id, draft.vehicle_id)?;

        let rate = draft.vat_rate.unwrap_or(profile.billing.default_vat_rate);
        let mut deposit = Deposit::new(draft.issue_date, draft.amount_ttc, rate)?;
        deposit.client_id = draft.client_id;
        deposit.vehicle_id = draft.vehicle_id;
        deposit.validate()?;

        deposit.number = self.next_number(DocumentKind::Deposit, draft.issue_date, &profile)?;
        self.deposits.create(&deposit)?;
        info!(
            "event=deposit_created module=invoice status=ok deposit_id={}",
            deposit.id
        );
        Ok(deposit)
    }

    pub fn get_deposit(&self, id: DocId) -> ServiceResult<Option<Deposit>> {
        Ok(self.deposits.get(id)?)
    }

    pub fn list_deposits(&self) -> ServiceResult<Vec<Deposit>> {
        let mut deposits = self.deposits.list()?;
        sort_newest_first(&mut deposits, |deposit| {
            (deposit.issue_date, deposit.number.clone())
        });
        Ok(deposits)
    }

    /// Builds, numbers and stores a draft invoice.
    ///
    /// `link` sets back-references before validation. Numbering happens last
    /// so a rejected draft burns no number.
    pub(crate) fn create_linked_invoice(
        &self,
        draft: &BillingDraft,
        link: impl FnOnce(&mut Invoice),
    ) -> ServiceResult<Invoice> {
        let profile = self.profile()?;
        self.check_references(draft.client_id, draft.vehicle_id)?;

        let mut invoice = Invoice::draft(draft.issue_date, draft.lines.clone())?;
        invoice.client_id = draft.client_id;
        invoice.vehicle_id = draft.vehicle_id;
        invoice.due_date = Some(due_date_or_default(draft, &profile));
        invoice.notes = draft.notes.clone();
        link(&mut invoice);
        invoice.validate()?;

        invoice.number = self.next_number(DocumentKind::Invoice, invoice.issue_date, &profile)?;
        self.invoices.create(&invoice)?;
        info!(
            "event=invoice_created module=invoice status=ok invoice_id={} lines={}",
            invoice.id,
            invoice.lines.len()
        );
        Ok(invoice)
    }

    fn transition(
        &self,
        id: DocId,
        allowed_from: &[InvoiceStatus],
        apply: impl FnOnce(&mut Invoice),
    ) -> ServiceResult<Invoice> {
        let mut invoice = self.invoices.require(id)?;
        if !allowed_from.contains(&invoice.status) {
            return Err(ServiceError::invalid_state(format!(
                "invoice {} is {:?}",
                invoice.number, invoice.status
            )));
        }
        apply(&mut invoice);
        self.invoices.update(&invoice)?;
        Ok(invoice)
    }

    fn proforma_transition(&self, id: DocId, target: ProformaStatus) -> ServiceResult<Proforma> {
        let mut proforma = self.proformas.require(id)?;
        if proforma.status != ProformaStatus::Pending {
            return Err(ServiceError::invalid_state(format!(
                "proforma {} is {:?}",
                proforma.number, proforma.status
            )));
        }
        proforma.status = target;
        self.proformas.update(&proforma)?;
        Ok(proforma)
    }

    fn check_references(
        &self,
        client_id: Option<DocId>,
        vehicle_id: Option<DocId>,
    ) -> ServiceResult<()> {
        if let Some(client_id) = client_id {
            self.clients.require(client_id)?;
        }
        if let Some(vehicle_id) = vehicle_id {
            self.vehicles.require(vehicle_id)?;
        }
        Ok(())
    }

    fn profile(&self) -> ServiceResult<UserProfile> {
        load_profile(&self.store, &self.user)
    }

    fn next_number(
        &self,
        kind: DocumentKind,
        issue_date: NaiveDate,
        profile: &UserProfile,
    ) -> ServiceResult<String> {
        Ok(next_number(
            &self.store,
            &self.user,
            kind,
            issue_date.year(),
            kind.prefix(&profile.billing),
        )?)
    }
}

fn due_date_or_default(draft: &BillingDraft, profile: &UserProfile) -> NaiveDate {
    draft.due_date.unwrap_or_else(|| {
        draft
            .issue_date
            .checked_add_days(Days::new(u64::from(profile.billing.payment_terms_days)))
            .unwrap_or(draft.issue_date)
    })
}

fn sort_newest_first<T, K: Ord>(records: &mut [T], key: impl Fn(&T) -> K) {
    records.sort_by(|a, b| key(b).cmp(&key(a)));
}

