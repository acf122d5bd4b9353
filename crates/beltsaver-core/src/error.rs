use thiserror::Error;

use crate::tier::{Feature, Tier};

/// Errors raised at the edges of the core: parsing answers, gating features,
/// reading settings.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("unrecognized {field} value: {value:?}")]
    UnrecognizedInput { field: &'static str, value: String },

    #[error("diagnosis incomplete: {missing} not answered")]
    Incomplete { missing: &'static str },

    #[error("{feature} is not available on the {tier} tier")]
    FeatureLocked { feature: Feature, tier: Tier },

    #[error("settings I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("settings JSON invalid: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors from a [`DiagnosisStore`](crate::store::DiagnosisStore).
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("diagnosis not found: {id}")]
    NotFound { id: String },

    #[error("diagnosis {id} belongs to another user")]
    NotOwner { id: String },

    #[error("invalid diagnosis id: {0}")]
    InvalidId(String),

    #[error("store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("store serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}
