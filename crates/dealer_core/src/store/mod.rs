//! Document store port and its SQLite adapter.
//!
//! # Responsibility
//! - Define the get/set/update/delete/query contract every repository
//!   is written against.
//! - Keep JSON-in-SQLite details behind that contract.
//!
//! # Invariants
//! - Every operation is scoped to one `(user, collection)` namespace.
//! - `update` only merges top-level fields and never creates documents.
//! - Query results are ordered by `updated_at DESC, doc_id ASC`.

use crate::db::DbError;
use crate::model::UserId;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};

static KEY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]{1,128}$").expect("valid store key regex"));

mod sqlite;

pub use sqlite::SqliteDocumentStore;

pub type StoreResult<T> = Result<T, StoreError>;

/// Document store failure.
#[derive(Debug)]
pub enum StoreError {
    Db(DbError),
    /// Stored body is not valid JSON or not an object.
    Encoding(serde_json::Error),
    /// Patch targeted a document that does not exist.
    Missing {
        collection: String,
        doc_id: String,
    },
    /// Caller supplied a malformed collection, id or field path.
    InvalidKey(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Encoding(err) => write!(f, "document encoding error: {err}"),
            Self::Missing { collection, doc_id } => {
                write!(f, "document not found: {collection}/{doc_id}")
            }
            Self::InvalidKey(message) => write!(f, "invalid document key: {message}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Encoding(err) => Some(err),
            Self::Missing { .. } | Self::InvalidKey(_) => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(value: serde_json::Error) -> Self {
        Self::Encoding(value)
    }
}

/// Equality filter on one top-level document field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldFilter {
    pub field: String,
    pub value: Value,
}

impl FieldFilter {
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }
}

/// One stored document with its key.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub doc_id: String,
    pub body: Value,
    /// Epoch milliseconds of the last write.
    pub updated_at: i64,
}

/// Key-value document collaborator.
///
/// Mirrors a managed document database: collections of JSON objects under
/// a per-user namespace, addressed by string IDs.
pub trait DocumentStore {
    fn get(&self, user: &UserId, collection: &str, doc_id: &str) -> StoreResult<Option<Value>>;

    /// Creates or fully replaces a document.
    fn set(&self, user: &UserId, collection: &str, doc_id: &str, body: &Value)
        -> StoreResult<()>;

    /// Shallow-merges `patch` into an existing document.
    ///
    /// Fails with `StoreError::Missing` when the document does not exist.
    fn update(
        &self,
        user: &UserId,
        collection: &str,
        doc_id: &str,
        patch: &Map<String, Value>,
    ) -> StoreResult<Value>;

    /// Removes a document; returns whether one existed.
    fn delete(&self, user: &UserId, collection: &str, doc_id: &str) -> StoreResult<bool>;

    fn query(
        &self,
        user: &UserId,
        collection: &str,
        filter: Option<&FieldFilter>,
    ) -> StoreResult<Vec<StoredDocument>>;

    fn count(&self, user: &UserId, collection: &str) -> StoreResult<u64>;
}

impl<S: DocumentStore + ?Sized> DocumentStore for &S {
    fn get(&self, user: &UserId, collection: &str, doc_id: &str) -> StoreResult<Option<Value>> {
        (**self).get(user, collection, doc_id)
    }

    fn set(
        &self,
        user: &UserId,
        collection: &str,
        doc_id: &str,
        body: &Value,
    ) -> StoreResult<()> {
        (**self).set(user, collection, doc_id, body)
    }

    fn update(
        &self,
        user: &UserId,
        collection: &str,
        doc_id: &str,
        patch: &Map<String, Value>,
    ) -> StoreResult<Value> {
        (**self).update(user, collection, doc_id, patch)
    }

    fn delete(&self, user: &UserId, collection: &str, doc_id: &str) -> StoreResult<bool> {
        (**self).delete(user, collection, doc_id)
    }

    fn query(
        &self,
        user: &UserId,
        collection: &str,
        filter: Option<&FieldFilter>,
    ) -> StoreResult<Vec<StoredDocument>> {
        (**self).query(user, collection, filter)
    }

    fn count(&self, user: &UserId, collection: &str) -> StoreResult<u64> {
        (**self).count(user, collection)
    }
}

/// Collection names and field paths are plain identifiers.
pub(crate) fn validate_key(kind: &str, value: &str) -> StoreResult<()> {
    if KEY_RE.is_match(value) {
        Ok(())
    } else {
        Err(StoreError::InvalidKey(format!("{kind} `{value}`")))
    }
}
