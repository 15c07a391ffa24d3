//! Generic record repository keyed by user.
//!
//! # Responsibility
//! - Provide CRUD over one collection for one user namespace.
//! - Keep serde mapping of records out of services.
//!
//! # Invariants
//! - `create` refuses to overwrite an existing document.
//! - `update`/`delete` report `NotFound` instead of silently succeeding.

use crate::model::{DocId, Document, UserId, ValidationError};
use crate::store::{DocumentStore, FieldFilter, StoreError};
use serde_json::{Map, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::marker::PhantomData;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for record persistence and queries.
#[derive(Debug)]
pub enum RepoError {
    Validation(ValidationError),
    Store(StoreError),
    NotFound {
        collection: &'static str,
        id: DocId,
    },
    /// A document with this ID already exists.
    Conflict {
        collection: &'static str,
        id: DocId,
    },
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Store(err) => write!(f, "{err}"),
            Self::NotFound { collection, id } => write!(f, "{collection} not found: {id}"),
            Self::Conflict { collection, id } => write!(f, "{collection} already exists: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Store(err) => Some(err),
            Self::NotFound { .. } | Self::Conflict { .. } | Self::InvalidData(_) => None,
        }
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<StoreError> for RepoError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

/// Typed access to the `T::COLLECTION` documents of one user.
pub struct DocumentRepository<S, T> {
    store: S,
    user: UserId,
    _record: PhantomData<fn() -> T>,
}

impl<S: DocumentStore, T: Document> DocumentRepository<S, T> {
    pub fn new(store: S, user: UserId) -> Self {
        Self {
            store,
            user,
            _record: PhantomData,
        }
    }

    pub fn user(&self) -> &UserId {
        &self.user
    }

    /// Persists a new record and returns its ID.
    pub fn create(&self, record: &T) -> RepoResult<DocId> {
        record.validate()?;
        let id = record.id();
        let key = id.to_string();
        if self.store.get(&self.user, T::COLLECTION, &key)?.is_some() {
            return Err(RepoError::Conflict {
                collection: T::COLLECTION,
                id,
            });
        }
        self.store
            .set(&self.user, T::COLLECTION, &key, &to_body(record)?)?;
        Ok(id)
    }

    pub fn get(&self, id: DocId) -> RepoResult<Option<T>> {
        self.store
            .get(&self.user, T::COLLECTION, &id.to_string())?
            .map(from_body::<T>)
            .transpose()
    }

    /// Like `get`, but a missing record is an error.
    pub fn require(&self, id: DocId) -> RepoResult<T> {
        self.get(id)?.ok_or(RepoError::NotFound {
            collection: T::COLLECTION,
            id,
        })
    }

    /// Replaces an existing record.
    pub fn update(&self, record: &T) -> RepoResult<()> {
        record.validate()?;
        let id = record.id();
        let key = id.to_string();
        if self.store.get(&self.user, T::COLLECTION, &key)?.is_none() {
            return Err(RepoError::NotFound {
                collection: T::COLLECTION,
                id,
            });
        }
        self.store
            .set(&self.user, T::COLLECTION, &key, &to_body(record)?)?;
        Ok(())
    }

    /// Merges top-level fields into a stored record and returns the result.
    ///
    /// The merged record must still validate; otherwise nothing is written.
    pub fn patch(&self, id: DocId, fields: Map<String, Value>) -> RepoResult<T> {
        let mut merged = self.require(id)?;
        let mut body = to_body(&merged)?;
        if let Value::Object(target) = &mut body {
            for (key, value) in fields {
                if key == "id" {
                    continue;
                }
                target.insert(key, value);
            }
        }
        merged = from_body(body)?;
        self.update(&merged)?;
        Ok(merged)
    }

    pub fn delete(&self, id: DocId) -> RepoResult<()> {
        if !self
            .store
            .delete(&self.user, T::COLLECTION, &id.to_string())?
        {
            return Err(RepoError::NotFound {
                collection: T::COLLECTION,
                id,
            });
        }
        Ok(())
    }

    /// All records, most recently updated first.
    pub fn list(&self) -> RepoResult<Vec<T>> {
        self.query(None)
    }

    /// Records whose top-level `field` equals `value`.
    pub fn find_by(&self, field: &str, value: impl Into<Value>) -> RepoResult<Vec<T>> {
        self.query(Some(&FieldFilter::eq(field, value)))
    }

    pub fn count(&self) -> RepoResult<u64> {
        Ok(self.store.count(&self.user, T::COLLECTION)?)
    }

    fn query(&self, filter: Option<&FieldFilter>) -> RepoResult<Vec<T>> {
        self.store
            .query(&self.user, T::COLLECTION, filter)?
            .into_iter()
            .map(|document| from_body(document.body))
            .collect()
    }
}

fn to_body<T: Document>(record: &T) -> RepoResult<Value> {
    serde_json::to_value(record).map_err(|err| {
        RepoError::InvalidData(format!("cannot encode {} record: {err}", T::COLLECTION))
    })
}

fn from_body<T: Document>(body: Value) -> RepoResult<T> {
    let record: T = serde_json::from_value(body).map_err(|err| {
        RepoError::InvalidData(format!("cannot decode {} record: {err}", T::COLLECTION))
    })?;
    record.validate()?;
    Ok(record)
}
