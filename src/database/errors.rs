//! Object store error types

use thiserror::Error;

use crate::models::{RecordId, RecordType};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DatabaseError {
    #[error("A write transaction is already open")]
    NestedWrite,

    #[error("{record_type:?} '{id}' not found")]
    NotFound { record_type: RecordType, id: RecordId },

    #[error("{record_type:?} '{id}' already exists")]
    DuplicateId { record_type: RecordType, id: RecordId },

    #[error("{record_type:?} '{id}' is finalised and cannot be changed")]
    RecordLocked { record_type: RecordType, id: RecordId },

    #[error("Write transaction aborted: {0}")]
    Aborted(String),
}
