//! Typed repositories over the document store.
//!
//! # Responsibility
//! - Map records to/from JSON documents in their collection.
//! - Surface semantic errors (`NotFound`, `Validation`) in addition to store
//!   transport errors.
//!
//! # Invariants
//! - Writes call `Document::validate()` before touching the store.
//! - Reads reject invalid persisted state instead of masking it.

pub mod document_repo;
