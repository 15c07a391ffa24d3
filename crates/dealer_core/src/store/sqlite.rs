//! SQLite-backed document store.
//!
//! Bodies live as JSON text in the `documents` table; filters use
//! `json_extract` on top-level fields.
//!
//! `updated_at` is a millisecond stamp that strictly increases within one
//! user's collection, so recency ordering holds for writes landing in the
//! same millisecond.

use super::{validate_key, DocumentStore, FieldFilter, StoreError, StoreResult, StoredDocument};
use crate::model::UserId;
use chrono::Utc;
use log::debug;
use rusqlite::types::Value as SqlValue;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use serde_json::{Map, Value};

const DOCUMENT_SELECT_SQL: &str = "SELECT doc_id, body, updated_at FROM documents";

/// Document store over a migrated SQLite connection.
pub struct SqliteDocumentStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteDocumentStore<'conn> {
    /// Wraps a connection returned by `open_db`/`open_db_in_memory`.
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl DocumentStore for SqliteDocumentStore<'_> {
    fn get(&self, user: &UserId, collection: &str, doc_id: &str) -> StoreResult<Option<Value>> {
        validate_address(collection, doc_id)?;
        let body = self
            .conn
            .query_row(
                "SELECT body FROM documents
                 WHERE user_id = ?1 AND collection = ?2 AND doc_id = ?3;",
                params![user.as_str(), collection, doc_id],
                |row| row.get::<_, String>(0),
            )
            .optional()?;

        body.map(|text| parse_body(&text)).transpose()
    }

    fn set(
        &self,
        user: &UserId,
        collection: &str,
        doc_id: &str,
        body: &Value,
    ) -> StoreResult<()> {
        validate_address(collection, doc_id)?;
        let text = encode_body(body)?;
        let tx = self.conn.unchecked_transaction()?;
        let stamp = next_stamp(&tx, user, collection)?;
        tx.execute(
            "INSERT INTO documents (user_id, collection, doc_id, body, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?5)
             ON CONFLICT (user_id, collection, doc_id) DO UPDATE SET
                body = excluded.body,
                updated_at = excluded.updated_at;",
            params![user.as_str(), collection, doc_id, text, stamp],
        )?;
        tx.commit()?;
        debug!("event=doc_set module=store status=ok collection={collection} doc_id={doc_id}");
        Ok(())
    }

    fn update(
        &self,
        user: &UserId,
        collection: &str,
        doc_id: &str,
        patch: &Map<String, Value>,
    ) -> StoreResult<Value> {
        validate_address(collection, doc_id)?;
        let tx = self.conn.unchecked_transaction()?;

        let current = tx
            .query_row(
                "SELECT body FROM documents
                 WHERE user_id = ?1 AND collection = ?2 AND doc_id = ?3;",
                params![user.as_str(), collection, doc_id],
                |row| row.get::<_, String>(0),
            )
            .optional()?
            .ok_or_else(|| StoreError::Missing {
                collection: collection.to_string(),
                doc_id: doc_id.to_string(),
            })?;

        let mut merged = parse_body(&current)?;
        if let Value::Object(fields) = &mut merged {
            for (key, value) in patch {
                fields.insert(key.clone(), value.clone());
            }
        }

        let stamp = next_stamp(&tx, user, collection)?;
        tx.execute(
            "UPDATE documents
             SET body = ?4, updated_at = ?5
             WHERE user_id = ?1 AND collection = ?2 AND doc_id = ?3;",
            params![user.as_str(), collection, doc_id, encode_body(&merged)?, stamp],
        )?;
        tx.commit()?;

        debug!(
            "event=doc_update module=store status=ok collection={collection} doc_id={doc_id} fields={}",
            patch.len()
        );
        Ok(merged)
    }

    fn delete(&self, user: &UserId, collection: &str, doc_id: &str) -> StoreResult<bool> {
        validate_address(collection, doc_id)?;
        let changed = self.conn.execute(
            "DELETE FROM documents
             WHERE user_id = ?1 AND collection = ?2 AND doc_id = ?3;",
            params![user.as_str(), collection, doc_id],
        )?;
        debug!(
            "event=doc_delete module=store status=ok collection={collection} doc_id={doc_id} removed={}",
            changed > 0
        );
        Ok(changed > 0)
    }

    fn query(
        &self,
        user: &UserId,
        collection: &str,
        filter: Option<&FieldFilter>,
    ) -> StoreResult<Vec<StoredDocument>> {
        validate_key("collection", collection)?;
        let mut sql = format!("{DOCUMENT_SELECT_SQL} WHERE user_id = ? AND collection = ?");
        let mut bind_values = vec![
            SqlValue::Text(user.as_str().to_string()),
            SqlValue::Text(collection.to_string()),
        ];

        if let Some(filter) = filter {
            validate_key("field", &filter.field)?;
            let path = format!("json_extract(body, '$.{}')", filter.field);
            match filter_value(&filter.value)? {
                Some(value) => {
                    sql.push_str(&format!(" AND {path} = ?"));
                    bind_values.push(value);
                }
                None => sql.push_str(&format!(" AND {path} IS NULL")),
            }
        }

        sql.push_str(" ORDER BY updated_at DESC, doc_id ASC");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut documents = Vec::new();
        while let Some(row) = rows.next()? {
            documents.push(parse_document_row(row)?);
        }
        Ok(documents)
    }

    fn count(&self, user: &UserId, collection: &str) -> StoreResult<u64> {
        validate_key("collection", collection)?;
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM documents WHERE user_id = ?1 AND collection = ?2;",
            params![user.as_str(), collection],
            |row| row.get(0),
        )?;
        Ok(u64::try_from(count).unwrap_or(0))
    }
}

fn validate_address(collection: &str, doc_id: &str) -> StoreResult<()> {
    validate_key("collection", collection)?;
    validate_key("doc_id", doc_id)
}

/// Wall-clock milliseconds, pushed past the newest write in the collection.
fn next_stamp(conn: &Connection, user: &UserId, collection: &str) -> StoreResult<i64> {
    let newest: Option<i64> = conn.query_row(
        "SELECT MAX(updated_at) FROM documents WHERE user_id = ?1 AND collection = ?2;",
        params![user.as_str(), collection],
        |row| row.get(0),
    )?;
    let now = Utc::now().timestamp_millis();
    Ok(newest.map_or(now, |newest| now.max(newest.saturating_add(1))))
}

fn parse_document_row(row: &Row<'_>) -> StoreResult<StoredDocument> {
    let body: String = row.get("body")?;
    Ok(StoredDocument {
        doc_id: row.get("doc_id")?,
        body: parse_body(&body)?,
        updated_at: row.get("updated_at")?,
    })
}

fn parse_body(text: &str) -> StoreResult<Value> {
    let value: Value = serde_json::from_str(text)?;
    ensure_object(&value)?;
    Ok(value)
}

fn encode_body(body: &Value) -> StoreResult<String> {
    ensure_object(body)?;
    Ok(serde_json::to_string(body)?)
}

fn ensure_object(value: &Value) -> StoreResult<()> {
    if value.is_object() {
        Ok(())
    } else {
        Err(StoreError::InvalidKey(
            "document body must be a JSON object".to_string(),
        ))
    }
}

/// Maps a JSON scalar onto the SQL value `json_extract` yields for it.
///
/// `None` means "match null or missing".
fn filter_value(value: &Value) -> StoreResult<Option<SqlValue>> {
    let mapped = match value {
        Value::Null => None,
        Value::Bool(flag) => Some(SqlValue::Integer(i64::from(*flag))),
        Value::String(text) => Some(SqlValue::Text(text.clone())),
        Value::Number(number) => match (number.as_i64(), number.as_f64()) {
            (Some(int), _) => Some(SqlValue::Integer(int)),
            (None, Some(float)) => Some(SqlValue::Real(float)),
            (None, None) => {
                return Err(StoreError::InvalidKey(format!(
                    "unsupported numeric filter `{number}`"
                )))
            }
        },
        Value::Array(_) | Value::Object(_) => {
            return Err(StoreError::InvalidKey(
                "filter value must be a JSON scalar".to_string(),
            ))
        }
    };
    Ok(mapped)
}
