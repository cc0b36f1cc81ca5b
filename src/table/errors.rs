//! Table page error types

use thiserror::Error;

use crate::database::DatabaseError;

#[derive(Error, Debug)]
pub enum TableError {
    #[error("Table page is missing required collaborator '{0}'")]
    MissingCollaborator(&'static str),

    #[error("Table page has no columns")]
    NoColumns,

    #[error("Unknown column '{0}'")]
    UnknownColumn(String),

    #[error("Failed to refresh table data: {0}")]
    Refresh(#[from] DatabaseError),

    #[error(transparent)]
    Hook(#[from] anyhow::Error),
}
