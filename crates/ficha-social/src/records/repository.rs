use super::domain::{IntakeRecord, NewIntakeRecord, RecordId, RecordStatus};

/// Listing constraints pushed down to storage. Soft-deleted rows never match.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecordFilter {
    pub status: Option<RecordStatus>,
}

impl RecordFilter {
    pub fn live() -> Self {
        Self::default()
    }

    pub fn with_status(status: Option<RecordStatus>) -> Self {
        Self { status }
    }

    pub fn matches(&self, record: &IntakeRecord) -> bool {
        !record.is_deleted() && self.status.map_or(true, |status| record.status == status)
    }
}

/// One window of a filtered listing plus the filtered row count.
#[derive(Debug, Clone, Default)]
pub struct RecordSlice {
    pub records: Vec<IntakeRecord>,
    pub total: u64,
}

/// Storage abstraction so the service can be exercised without a database.
pub trait RecordRepository: Send + Sync {
    /// Persists a new record under an identifier chosen by the store.
    fn insert(&self, record: NewIntakeRecord) -> Result<IntakeRecord, RepositoryError>;
    /// Replaces the stored row only while its revision still equals `expected_revision`;
    /// otherwise fails with [`RepositoryError::Stale`] and leaves the row untouched.
    fn update(&self, record: IntakeRecord, expected_revision: u64) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &RecordId) -> Result<Option<IntakeRecord>, RepositoryError>;
    /// Records matching `filter` ordered by id, skipping `offset` and returning at most
    /// `limit`.
    fn list(
        &self,
        filter: &RecordFilter,
        offset: usize,
        limit: usize,
    ) -> Result<RecordSlice, RepositoryError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("record was modified by a concurrent write")]
    Stale,
    /// Driver-reported failure carrying the backend's own error code.
    #[error("storage rejected the operation ({code}): {detail}")]
    Rejected { code: String, detail: String },
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

impl RepositoryError {
    /// Identifier understood by [`crate::classification::classify_persistence`].
    pub fn code(&self) -> &str {
        match self {
            RepositoryError::Conflict => "unique_violation",
            RepositoryError::NotFound => "not_found",
            RepositoryError::Stale => "write_conflict",
            RepositoryError::Rejected { code, .. } => code,
            RepositoryError::Unavailable(_) => "connection_unavailable",
        }
    }
}
