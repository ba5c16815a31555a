use std::fmt;

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

/// Readiness of the remote resource as last seen by a pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReadyCondition {
    /// The remote resource exists and was observed.
    Available,
    /// A create was issued and not yet confirmed by an observe.
    Creating,
    /// A delete was issued.
    Deleting,
    #[default]
    Unavailable,
}

impl ReadyCondition {
    /// Create or delete issued but not yet confirmed.
    pub fn is_transitioning(self) -> bool {
        matches!(self, Self::Creating | Self::Deleting)
    }
}

impl fmt::Display for ReadyCondition {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Available => write!(f, "Available"),
            Self::Creating => write!(f, "Creating"),
            Self::Deleting => write!(f, "Deleting"),
            Self::Unavailable => write!(f, "Unavailable"),
        }
    }
}

/// Whether the last pass managed to run to completion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", content = "message")]
pub enum SyncedCondition {
    #[default]
    Unknown,
    ReconcileSuccess,
    ReconcileError(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conditions {
    #[serde(default)]
    pub ready: ReadyCondition,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ready_transition_time: Option<Timestamp>,
    #[serde(default)]
    pub synced: SyncedCondition,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synced_transition_time: Option<Timestamp>,
}

impl Conditions {
    /// Set the ready condition, stamping the transition time only on change.
    pub fn set_ready(&mut self, ready: ReadyCondition) {
        if self.ready != ready || self.ready_transition_time.is_none() {
            self.ready = ready;
            self.ready_transition_time = Some(Timestamp::now());
        }
    }

    pub fn set_synced(&mut self, synced: SyncedCondition) {
        if self.synced != synced || self.synced_transition_time.is_none() {
            self.synced = synced;
            self.synced_transition_time = Some(Timestamp::now());
        }
    }

    pub fn reconcile_success(&mut self) {
        self.set_synced(SyncedCondition::ReconcileSuccess);
    }

    pub fn reconcile_error(&mut self, message: impl Into<String>) {
        self.set_synced(SyncedCondition::ReconcileError(message.into()));
    }
}
