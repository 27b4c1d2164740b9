//! Submission storage.

pub mod memory;

pub use memory::MemoryStore;

use crate::models::Submission;
use async_trait::async_trait;

/// Whether an upsert inserted a new record or replaced an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created,
    Updated,
}

impl UpsertOutcome {
    pub fn is_update(self) -> bool {
        self == UpsertOutcome::Updated
    }
}

/// Storage errors.
///
/// `MemoryStore` never fails; persistent backends report connection and
/// write failures as `Unavailable`, which the API turns into a 500.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Keyed storage for submissions (key = student id).
///
/// `upsert` must be atomic per key: two concurrent upserts for the same id
/// produce exactly one `Created` and the record ends up as one of the two
/// writes, never a mix.
#[async_trait]
pub trait SubmissionStore: Send + Sync {
    /// Get the submission stored for a student id.
    async fn get(&self, id: &str) -> Result<Option<Submission>, StoreError>;

    /// Insert or wholesale-replace the submission for its id (last write wins).
    async fn upsert(&self, submission: Submission) -> Result<UpsertOutcome, StoreError>;

    /// Number of distinct ids stored.
    async fn count(&self) -> Result<usize, StoreError>;
}
