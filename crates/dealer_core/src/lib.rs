//! Core domain logic for the dealership back office.
//! This crate is the single source of truth for stock, billing and workshop
//! invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod numbering;
pub mod pricing;
pub mod repo;
pub mod service;
pub mod store;

pub use config::{default_config_path, load_config, write_config, ConfigError, DealerConfig};
pub use db::{open_db, open_db_in_memory, DbError};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::account::{BillingSettings, Plan, UserProfile};
pub use model::client::{Client, ClientKind};
pub use model::deposit::{Deposit, DepositStatus};
pub use model::invoice::{Invoice, InvoiceStatus, PaymentMethod};
pub use model::line_item::LineItem;
pub use model::order::{Order, OrderStatus, RepairTask};
pub use model::proforma::{Proforma, ProformaStatus};
pub use model::vehicle::{FuelType, Gearbox, VatRegime, Vehicle, VehicleStatus};
pub use model::warranty::{Coverage, Warranty};
pub use model::worker::Worker;
pub use model::{Address, DocId, Document, UserId, ValidationError};
pub use pricing::Totals;
pub use repo::document_repo::{DocumentRepository, RepoError, RepoResult};
pub use service::account_service::AccountService;
pub use service::client_service::ClientService;
pub use service::dashboard_service::{DashboardService, DashboardSummary};
pub use service::invoice_service::{BillingDraft, DepositDraft, InvoiceService};
pub use service::order_service::{OrderDraft, OrderService};
pub use service::vehicle_service::VehicleService;
pub use service::warranty_service::WarrantyService;
pub use service::worker_service::WorkerService;
pub use service::{ServiceError, ServiceResult};
pub use store::{DocumentStore, SqliteDocumentStore, StoreError};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
