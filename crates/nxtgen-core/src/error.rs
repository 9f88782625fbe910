use thiserror::Error;

use crate::types::TargetKind;

#[derive(Debug, Error)]
pub enum NxtgenError {
    #[error("{kind} not found: {id}")]
    TargetNotFound { kind: TargetKind, id: String },

    #[error("{kind} already exists: {id}")]
    TargetExists { kind: TargetKind, id: String },

    #[error("invalid target kind: {0}")]
    InvalidKind(String),

    #[error("invalid status: {0}")]
    InvalidStatus(String),

    #[error("invalid severity: {0}")]
    InvalidSeverity(String),

    #[error("invalid transition from {from} to {to}: {reason}")]
    InvalidTransition {
        from: String,
        to: String,
        reason: String,
    },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("{0} already in progress")]
    Busy(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl NxtgenError {
    pub fn not_found(kind: TargetKind, id: impl Into<String>) -> Self {
        Self::TargetNotFound {
            kind,
            id: id.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, NxtgenError>;
