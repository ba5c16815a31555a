use thiserror::Error;

use crate::resource::Kind;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("managed resource is not a {expected} custom resource (got {actual})")]
    NotThisKind { expected: Kind, actual: Kind },

    #[error("invalid record {name}: {reason}")]
    InvalidRecord { name: String, reason: String },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
