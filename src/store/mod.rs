pub mod digest;
pub mod file;

use async_trait::async_trait;
use thiserror::Error;

pub use digest::{Digest, UnknownDigest};
pub use file::FileStore;

#[derive(Debug, Error)]
pub enum StoreError {
    /// Rejected before any I/O; nothing was written.
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),

    #[error("storage failure: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage failure: malformed secrets file: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    /// True for failures of the persisted mapping itself (I/O or encoding).
    pub fn is_storage_failure(&self) -> bool {
        matches!(self, StoreError::Io(_) | StoreError::Serialization(_))
    }
}

/// Single-use secret storage.
///
/// Every stored value is handed out at most once: `consume` removes the
/// entry in the same critical section that reads it, and reports success
/// only after the removal is durable. Implementations: `FileStore` (JSON
/// file, full rewrite per operation).
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Store `plain_text` and return its content-derived id.
    /// Saving the same text twice yields the same id and a single entry.
    async fn save(&self, plain_text: &str) -> Result<String, StoreError>;

    /// Remove and return the secret stored under `id`.
    /// `Ok(None)` when no such secret exists.
    async fn consume(&self, id: &str) -> Result<Option<String>, StoreError>;
}
