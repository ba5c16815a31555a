use std::fmt;

use rox_central::RemoteError;
use rox_core::{CoreError, Kind};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProvisionerError {
    #[error("cannot get ProviderConfig {name}")]
    ConfigNotFound { name: String },

    #[error("cannot get credentials: {0}")]
    CredentialResolutionFailed(String),

    #[error("cannot create Central client: {0}")]
    ConnectionFailed(#[source] RemoteError),

    #[error("cannot close Central client: {0}")]
    DisconnectFailed(#[source] RemoteError),

    #[error("cannot observe {kind}: {reason}")]
    ObserveFailed { kind: Kind, reason: String },

    #[error("cannot create {kind}: {reason}")]
    CreateFailed { kind: Kind, reason: String },

    #[error("cannot update {kind}: {reason}")]
    UpdateFailed { kind: Kind, reason: String },

    #[error("cannot delete {kind}: {reason}")]
    DeleteFailed { kind: Kind, reason: String },

    #[error("managed resource is not a {expected} custom resource (got {actual})")]
    NotThisKind { expected: Kind, actual: Kind },

    #[error("{operation} cancelled")]
    Cancelled { operation: &'static str },

    #[error("{operation} exceeded the pass deadline")]
    DeadlineExceeded { operation: &'static str },

    #[error("invalid enum table: {0}")]
    InvalidEnumTable(String),

    #[error(transparent)]
    Core(CoreError),
}

impl From<CoreError> for ProvisionerError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::NotThisKind { expected, actual } => Self::NotThisKind { expected, actual },
            other => Self::Core(other),
        }
    }
}

impl ProvisionerError {
    /// Prepend resource identity to the error message.
    pub fn with_resource(self, name: &str) -> Self {
        match self {
            Self::ObserveFailed { kind, reason } => Self::ObserveFailed {
                kind,
                reason: format!("{name}: {reason}"),
            },
            Self::CreateFailed { kind, reason } => Self::CreateFailed {
                kind,
                reason: format!("{name}: {reason}"),
            },
            Self::UpdateFailed { kind, reason } => Self::UpdateFailed {
                kind,
                reason: format!("{name}: {reason}"),
            },
            Self::DeleteFailed { kind, reason } => Self::DeleteFailed {
                kind,
                reason: format!("{name}: {reason}"),
            },
            other => other,
        }
    }

    /// Whether re-running the pass later can help.
    ///
    /// A record of the wrong kind or a broken enum table is a programming
    /// error; everything else may clear up on a later pass.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            Self::NotThisKind { .. } | Self::InvalidEnumTable(_) | Self::Core(_)
        )
    }
}

/// The external-client operation a remote failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Observe,
    Create,
    Update,
    Delete,
}

impl Operation {
    pub fn failed(self, kind: Kind, reason: impl Into<String>) -> ProvisionerError {
        let reason = reason.into();
        match self {
            Self::Observe => ProvisionerError::ObserveFailed { kind, reason },
            Self::Create => ProvisionerError::CreateFailed { kind, reason },
            Self::Update => ProvisionerError::UpdateFailed { kind, reason },
            Self::Delete => ProvisionerError::DeleteFailed { kind, reason },
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Observe => write!(f, "observe"),
            Self::Create => write!(f, "create"),
            Self::Update => write!(f, "update"),
            Self::Delete => write!(f, "delete"),
        }
    }
}
