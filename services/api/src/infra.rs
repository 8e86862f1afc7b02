use ficha_social::records::{
    IntakeRecord, NewIntakeRecord, RecordFilter, RecordId, RecordRepository, RecordSlice,
    RepositoryError,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::BTreeMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Process-local storage keyed by record id, so listings come back in id order.
#[derive(Default, Clone)]
pub(crate) struct InMemoryRecordRepository {
    records: Arc<Mutex<BTreeMap<RecordId, IntakeRecord>>>,
}

impl InMemoryRecordRepository {
    fn guard(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, BTreeMap<RecordId, IntakeRecord>>, RepositoryError> {
        self.records
            .lock()
            .map_err(|_| RepositoryError::Unavailable("record store lock poisoned".to_string()))
    }
}

impl RecordRepository for InMemoryRecordRepository {
    fn insert(&self, record: NewIntakeRecord) -> Result<IntakeRecord, RepositoryError> {
        let mut guard = self.guard()?;
        // Rows are only soft-deleted, so the count never shrinks.
        let id = RecordId::sequential(guard.len() as u64 + 1);
        if guard.contains_key(&id) {
            return Err(RepositoryError::Conflict);
        }
        let stored = record.into_record(id);
        guard.insert(stored.id.clone(), stored.clone());
        Ok(stored)
    }

    fn update(&self, record: IntakeRecord, expected_revision: u64) -> Result<(), RepositoryError> {
        let mut guard = self.guard()?;
        match guard.get_mut(&record.id) {
            Some(existing) if existing.revision != expected_revision => Err(RepositoryError::Stale),
            Some(existing) => {
                *existing = record;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    fn fetch(&self, id: &RecordId) -> Result<Option<IntakeRecord>, RepositoryError> {
        let guard = self.guard()?;
        Ok(guard.get(id).cloned())
    }

    fn list(
        &self,
        filter: &RecordFilter,
        offset: usize,
        limit: usize,
    ) -> Result<RecordSlice, RepositoryError> {
        let guard = self.guard()?;
        let mut total = 0u64;
        let mut records = Vec::with_capacity(limit);
        for record in guard.values().filter(|record| filter.matches(record)) {
            if total as usize >= offset && records.len() < limit {
                records.push(record.clone());
            }
            total += 1;
        }
        Ok(RecordSlice { records, total })
    }
}
