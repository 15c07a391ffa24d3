//! Use-case services over typed repositories.
//!
//! # Responsibility
//! - Map back-office actions (sell a vehicle, convert a proforma, invoice a
//!   repair order) onto repository calls.
//! - Keep callers decoupled from storage details.
//!
//! # Invariants
//! - Services never bypass repository validation.
//! - Status changes only follow the lifecycles documented on each service.

use crate::model::{DocId, ValidationError};
use crate::repo::document_repo::RepoError;
use crate::store::StoreError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod account_service;
pub mod client_service;
pub mod dashboard_service;
pub mod invoice_service;
pub mod order_service;
pub mod vehicle_service;
pub mod warranty_service;
pub mod worker_service;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Service error for back-office use-cases.
#[derive(Debug)]
pub enum ServiceError {
    /// Input or resulting record failed validation.
    Validation(ValidationError),
    /// Target record does not exist.
    NotFound {
        collection: &'static str,
        id: DocId,
    },
    /// Action is not allowed in the record's current status.
    InvalidState(String),
    /// Account plan does not allow the action.
    PlanLimit(String),
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl ServiceError {
    pub(crate) fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState(message.into())
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound { collection, id } => write!(f, "{collection} not found: {id}"),
            Self::InvalidState(message) => write!(f, "invalid state: {message}"),
            Self::PlanLimit(message) => write!(f, "plan limit reached: {message}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound { collection, id } => Self::NotFound { collection, id },
            RepoError::Validation(err) => Self::Validation(err),
            other => Self::Repo(other),
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(value: StoreError) -> Self {
        Self::Repo(RepoError::Store(value))
    }
}

impl From<ValidationError> for ServiceError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}
