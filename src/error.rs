//! @dose
//! purpose: Error type shared by the snapshot loader, signature extraction, reconciliation
//!     and the token tree builder.
//!
//! when-editing:
//!     - !SourceUnavailable and MalformedComment are never returned up the stack; they are
//!       built, logged with tracing::warn!, and the caller degrades
//!     - IdentityCollision and UnbalancedStructure abort the run
//!
//! invariants:
//!     - Every variant that names a declaration carries its identity id
//!
//! gotchas:
//!     - Commands wrap these in anyhow with context; library code returns them directly

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiStubError {
    #[error("source unavailable for {id}: {reason}")]
    SourceUnavailable { id: String, reason: String },

    #[error("malformed docstring on {id}: {detail}")]
    MalformedComment { id: String, detail: String },

    #[error("identity collision: `{id}` is assigned to more than one declaration")]
    IdentityCollision { id: String },

    #[error("unbalanced structure while rendering {id}: {detail}")]
    UnbalancedStructure { id: String, detail: String },

    #[error("failed to read input: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid package snapshot: {0}")]
    Snapshot(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),
}

impl ApiStubError {
    /// Whether the run may continue after this error.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            ApiStubError::SourceUnavailable { .. } | ApiStubError::MalformedComment { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, ApiStubError>;
