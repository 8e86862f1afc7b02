use std::sync::Arc;

use axum::response::{IntoResponse, Response};
use chrono::Utc;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use super::completeness::CompletenessEvaluator;
use super::domain::{IntakeForm, IntakeRecord, NewIntakeRecord, RecordId, RecordStatus};
use super::repository::{RecordFilter, RecordRepository, RepositoryError};
use super::status::{diagnose, next_status, StatusAnomaly};
use crate::classification::{classify, classify_persistence, ErrorClassification, ErrorEnvelope};
use crate::pagination::{Page, PaginationError, PaginationQuery, PaginationSettings};

const AUDIT_BATCH: usize = 100;
const MAX_WRITE_ATTEMPTS: u32 = 3;

/// Knobs the service is constructed with at process start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordPolicy {
    pub local_nationality: String,
    pub pagination: PaginationSettings,
    /// Linked interviews a complete record is expected to have; zero disables the check.
    pub minimum_interviews: u32,
}

impl Default for RecordPolicy {
    fn default() -> Self {
        Self {
            local_nationality: "chilena".to_string(),
            pagination: PaginationSettings::default(),
            minimum_interviews: 0,
        }
    }
}

/// Service composing the completeness evaluator, status resolver, and repository.
pub struct IntakeRecordService<R> {
    repository: Arc<R>,
    evaluator: CompletenessEvaluator,
    policy: RecordPolicy,
}

impl<R> IntakeRecordService<R>
where
    R: RecordRepository + 'static,
{
    pub fn new(repository: Arc<R>, policy: RecordPolicy) -> Self {
        let evaluator = CompletenessEvaluator::new(policy.local_nationality.clone());
        Self {
            repository,
            evaluator,
            policy,
        }
    }

    /// Score and persist a new intake form. The repository assigns the identifier.
    pub fn create(&self, form: IntakeForm) -> Result<IntakeRecord, RecordServiceError> {
        let score = self.evaluator.evaluate(&form);
        let draft = NewIntakeRecord {
            form,
            completion_percentage: score,
            status: next_status(score, RecordStatus::Incomplete),
            created_at: Utc::now(),
        };

        let stored = self.repository.insert(draft)?;
        info!(
            record_id = %stored.id,
            completion = stored.completion_percentage,
            status = stored.status.label(),
            "intake record created"
        );
        Ok(stored)
    }

    /// Merge a partial JSON edit over the stored form, then rescore and persist. The score
    /// is always computed on the merged form so the status never lags the data.
    pub fn update(&self, id: &RecordId, patch: Value) -> Result<IntakeRecord, RecordServiceError> {
        if !patch.is_object() {
            return Err(RecordServiceError::InvalidPayload(
                "record edits must be a JSON object".to_string(),
            ));
        }

        let mut previous = RecordStatus::Incomplete;
        let record = self.modify(id, |record| {
            let mut merged = serde_json::to_value(&record.form)
                .map_err(|err| RecordServiceError::InvalidPayload(err.to_string()))?;
            merge_patch(&mut merged, patch.clone());
            let form: IntakeForm = serde_json::from_value(merged)
                .map_err(|err| RecordServiceError::InvalidPayload(err.to_string()))?;

            let score = self.evaluator.evaluate(&form);
            previous = record.status;
            record.form = form;
            record.completion_percentage = score;
            record.status = next_status(score, previous);
            Ok(())
        })?;

        info!(
            record_id = %record.id,
            completion = record.completion_percentage,
            previous = previous.label(),
            status = record.status.label(),
            "intake record updated"
        );
        Ok(record)
    }

    pub fn get(&self, id: &RecordId) -> Result<IntakeRecord, RecordServiceError> {
        self.live(id)
    }

    pub fn list(
        &self,
        query: PaginationQuery,
        status: Option<RecordStatus>,
    ) -> Result<Page<IntakeRecord>, RecordServiceError> {
        let request = query.resolve(self.policy.pagination)?;
        let slice = self.repository.list(
            &RecordFilter::with_status(status),
            request.offset(),
            request.limit as usize,
        )?;
        Ok(Page::new(slice.records, slice.total, request))
    }

    /// Case-worker escalation. Later edits keep the status.
    pub fn mark_dysfunctional(&self, id: &RecordId) -> Result<IntakeRecord, RecordServiceError> {
        let record = self.modify(id, |record| {
            record.status = RecordStatus::Dysfunctional;
            Ok(())
        })?;
        info!(record_id = %record.id, "intake record escalated as dysfunctional");
        Ok(record)
    }

    pub fn link_interview(&self, id: &RecordId) -> Result<IntakeRecord, RecordServiceError> {
        self.modify(id, |record| {
            record.linked_interviews = record.linked_interviews.saturating_add(1);
            Ok(())
        })
    }

    /// Soft delete; the row stays in storage but disappears from reads.
    pub fn delete(&self, id: &RecordId) -> Result<(), RecordServiceError> {
        self.modify(id, |record| {
            record.deleted_at = Some(record.updated_at);
            Ok(())
        })?;
        info!(record_id = %id, "intake record deleted");
        Ok(())
    }

    /// Scan every live record for status inconsistencies. Findings are reported, never
    /// corrected.
    pub fn audit(&self) -> Result<Vec<StatusAnomaly>, RecordServiceError> {
        let filter = RecordFilter::live();
        let mut anomalies = Vec::new();
        let mut offset = 0;

        loop {
            let slice = self.repository.list(&filter, offset, AUDIT_BATCH)?;
            let fetched = slice.records.len();
            for record in &slice.records {
                for anomaly in diagnose(record, self.policy.minimum_interviews) {
                    warn!(
                        record_id = %anomaly.record_id,
                        completion = anomaly.completion_percentage,
                        status = anomaly.status.label(),
                        "{}",
                        anomaly.description
                    );
                    anomalies.push(anomaly);
                }
            }

            offset += fetched;
            if fetched == 0 || offset as u64 >= slice.total {
                break;
            }
        }

        Ok(anomalies)
    }

    /// Read-modify-write against the stored revision. A write that lost the race is
    /// replayed on a fresh read, so `apply` always sees the latest committed record.
    fn modify<F>(&self, id: &RecordId, mut apply: F) -> Result<IntakeRecord, RecordServiceError>
    where
        F: FnMut(&mut IntakeRecord) -> Result<(), RecordServiceError>,
    {
        let mut attempt = 1;
        loop {
            let mut record = self.live(id)?;
            let expected = record.revision;
            record.updated_at = Utc::now();
            apply(&mut record)?;
            record.revision = expected + 1;

            match self.repository.update(record.clone(), expected) {
                Ok(()) => return Ok(record),
                Err(RepositoryError::Stale) if attempt < MAX_WRITE_ATTEMPTS => {
                    debug!(record_id = %id, attempt, "record changed during edit, retrying");
                    attempt += 1;
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    fn live(&self, id: &RecordId) -> Result<IntakeRecord, RecordServiceError> {
        self.repository
            .fetch(id)?
            .filter(|record| !record.is_deleted())
            .ok_or(RecordServiceError::Repository(RepositoryError::NotFound))
    }
}

/// Objects merge key by key; anything else, `null` included, replaces the stored value.
fn merge_patch(target: &mut Value, patch: Value) {
    match (target, patch) {
        (Value::Object(stored), Value::Object(incoming)) => {
            for (key, value) in incoming {
                let nested = value.is_object() && stored.get(&key).is_some_and(Value::is_object);
                match stored.get_mut(&key) {
                    Some(existing) if nested => merge_patch(existing, value),
                    _ => {
                        stored.insert(key, value);
                    }
                }
            }
        }
        (target, patch) => *target = patch,
    }
}

/// Error raised by the record service.
#[derive(Debug, thiserror::Error)]
pub enum RecordServiceError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Pagination(#[from] PaginationError),
    #[error("invalid record payload: {0}")]
    InvalidPayload(String),
}

impl RecordServiceError {
    pub fn classification(&self) -> ErrorClassification {
        match self {
            RecordServiceError::Repository(err) => classify_persistence(err.code()),
            RecordServiceError::Pagination(_) | RecordServiceError::InvalidPayload(_) => {
                classify("validation_error")
            }
        }
    }

    pub fn envelope(&self) -> ErrorEnvelope {
        let classification = self.classification();
        let detail = match self {
            RecordServiceError::Repository(_) => None,
            other => Some(other.to_string()),
        };
        ErrorEnvelope::new(classification, detail)
    }
}

impl IntoResponse for RecordServiceError {
    fn into_response(self) -> Response {
        let envelope = self.envelope();
        if envelope.error.status_code >= 500 {
            error!(error = %self, "record request failed");
        }
        envelope.into_response()
    }
}
