// Query errors
// A query either succeeds or says which record it could not find

use crate::storage::Id;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum QueryError {
    /// The requested id has no matching record
    #[error("{entity} not found")]
    NotFound { entity: &'static str, id: Id },

    /// A foreign key points at a record that does not exist
    #[error("{entity} {id} not found")]
    BadJoin { entity: &'static str, id: Id },

    /// The path does not name any query
    #[error("Route not found")]
    UnknownRoute(String),
}

/// The `{message}` body every non-success response carries
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorBody {
    pub message: String,
}

impl ErrorBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<&QueryError> for ErrorBody {
    fn from(err: &QueryError) -> Self {
        Self::new(err.to_string())
    }
}
