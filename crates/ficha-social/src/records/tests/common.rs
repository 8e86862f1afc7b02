use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{NaiveDate, Utc};
use serde_json::Value;

use crate::records::domain::{
    EconomicInfo, ExpenseBreakdown, Guardian, HealthInfo, HouseholdComposition, HousingInfo,
    IncomeBreakdown, IntakeForm, IntakeRecord, NewIntakeRecord, RecordId, RecordStatus,
    SignedDeclaration,
};
use crate::records::repository::{RecordFilter, RecordRepository, RecordSlice, RepositoryError};
use crate::records::{CompletenessEvaluator, IntakeRecordService, RecordPolicy};

pub(super) const LOCAL: &str = "chilena";

pub(super) fn evaluator() -> CompletenessEvaluator {
    CompletenessEvaluator::new(LOCAL)
}

pub(super) fn policy() -> RecordPolicy {
    RecordPolicy {
        local_nationality: LOCAL.to_string(),
        ..RecordPolicy::default()
    }
}

pub(super) fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

pub(super) fn guardian(first_name: &str, age: u8, occupation: &str) -> Guardian {
    Guardian {
        first_name: Some(first_name.to_string()),
        paternal_surname: Some("Soto".to_string()),
        maternal_surname: Some("Muñoz".to_string()),
        age: Some(age),
        occupation: Some(occupation.to_string()),
        employer: None,
        phone: Some("+56 9 8765 4321".to_string()),
    }
}

/// Form with every tracked field filled in for a local student.
pub(super) fn full_form() -> IntakeForm {
    IntakeForm {
        first_name: Some("Camila".to_string()),
        paternal_surname: Some("Soto".to_string()),
        maternal_surname: Some("Rojas".to_string()),
        rut: Some("21.345.678-9".to_string()),
        foreign_id: None,
        nationality: Some(LOCAL.to_string()),
        birth_date: Some(date(2012, 4, 17)),
        address: Some("Pasaje Los Aromos 1234".to_string()),
        commune: Some("La Pintana".to_string()),
        phone: Some("+56 2 2345 6789".to_string()),
        email: None,
        school_grade: Some("6° Básico".to_string()),
        enrollment_date: Some(date(2024, 3, 1)),
        household_composition: Some(HouseholdComposition {
            guardian_a: Some(guardian("Rosa", 41, "Manipuladora de alimentos")),
            guardian_b: Some(guardian("Luis", 44, "Conductor")),
            members: Some(5),
        }),
        housing_info: Some(HousingInfo {
            tenure: Some("arrendada".to_string()),
            dwelling_type: Some("casa".to_string()),
            rooms: Some(3),
            has_basic_services: Some(true),
        }),
        health_info: Some(HealthInfo {
            insurance_type: Some("FONASA".to_string()),
            blood_type: Some("O+".to_string()),
            chronic_conditions: None,
            disability: None,
        }),
        economic_info: Some(EconomicInfo {
            income: Some(IncomeBreakdown {
                guardian_a: Some(450_000.0),
                spouse: Some(520_000.0),
                other: None,
            }),
            expenses: Some(ExpenseBreakdown {
                housing: Some(280_000.0),
                ..ExpenseBreakdown::default()
            }),
        }),
        signed_declaration: Some(SignedDeclaration {
            accepted: Some(true),
            signer_name: Some("Rosa Soto Muñoz".to_string()),
            signature: Some("signatures/rec-000001.png".to_string()),
            signed_on: Some(date(2024, 3, 4)),
        }),
        observations: None,
    }
}

/// Full form minus the signature, one tracked point short of complete.
pub(super) fn unsigned_form() -> IntakeForm {
    let mut form = full_form();
    if let Some(declaration) = form.signed_declaration.as_mut() {
        declaration.signature = None;
    }
    form
}

pub(super) fn stored_record(id: &str, completion: u8, status: RecordStatus) -> IntakeRecord {
    let now = Utc::now();
    IntakeRecord {
        id: RecordId(id.to_string()),
        form: IntakeForm::default(),
        completion_percentage: completion,
        status,
        linked_interviews: 0,
        revision: 0,
        created_at: now,
        updated_at: now,
        deleted_at: None,
    }
}

pub(super) fn build_service() -> (IntakeRecordService<MemoryRepository>, Arc<MemoryRepository>) {
    let repository = Arc::new(MemoryRepository::default());
    let service = IntakeRecordService::new(repository.clone(), policy());
    (service, repository)
}

#[derive(Default, Clone)]
pub(super) struct MemoryRepository {
    pub(super) records: Arc<Mutex<BTreeMap<RecordId, IntakeRecord>>>,
}

impl MemoryRepository {
    /// Stores a row exactly as given, bypassing id assignment.
    pub(super) fn seed(&self, record: IntakeRecord) {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        guard.insert(record.id.clone(), record);
    }
}

impl RecordRepository for MemoryRepository {
    fn insert(&self, record: NewIntakeRecord) -> Result<IntakeRecord, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        let mut number = guard.len() as u64 + 1;
        while guard.contains_key(&RecordId::sequential(number)) {
            number += 1;
        }
        let stored = record.into_record(RecordId::sequential(number));
        guard.insert(stored.id.clone(), stored.clone());
        Ok(stored)
    }

    fn update(&self, record: IntakeRecord, expected_revision: u64) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
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
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn list(
        &self,
        filter: &RecordFilter,
        offset: usize,
        limit: usize,
    ) -> Result<RecordSlice, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        let matching: Vec<&IntakeRecord> =
            guard.values().filter(|record| filter.matches(record)).collect();
        Ok(RecordSlice {
            total: matching.len() as u64,
            records: matching
                .into_iter()
                .skip(offset)
                .take(limit)
                .cloned()
                .collect(),
        })
    }
}

pub(super) struct ConflictRepository;

impl RecordRepository for ConflictRepository {
    fn insert(&self, _record: NewIntakeRecord) -> Result<IntakeRecord, RepositoryError> {
        Err(RepositoryError::Conflict)
    }

    fn update(&self, _record: IntakeRecord, _expected: u64) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("read only".to_string()))
    }

    fn fetch(&self, _id: &RecordId) -> Result<Option<IntakeRecord>, RepositoryError> {
        Ok(None)
    }

    fn list(
        &self,
        _filter: &RecordFilter,
        _offset: usize,
        _limit: usize,
    ) -> Result<RecordSlice, RepositoryError> {
        Ok(RecordSlice::default())
    }
}

pub(super) struct UnavailableRepository;

impl RecordRepository for UnavailableRepository {
    fn insert(&self, _record: NewIntakeRecord) -> Result<IntakeRecord, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update(&self, _record: IntakeRecord, _expected: u64) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: &RecordId) -> Result<Option<IntakeRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn list(
        &self,
        _filter: &RecordFilter,
        _offset: usize,
        _limit: usize,
    ) -> Result<RecordSlice, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

/// Storage that reports a vendor-specific foreign key failure on every write.
pub(super) struct ForeignKeyRepository;

impl RecordRepository for ForeignKeyRepository {
    fn insert(&self, _record: NewIntakeRecord) -> Result<IntakeRecord, RepositoryError> {
        Err(RepositoryError::Rejected {
            code: "P2003".to_string(),
            detail: "school_id references a missing school".to_string(),
        })
    }

    fn update(&self, _record: IntakeRecord, _expected: u64) -> Result<(), RepositoryError> {
        Ok(())
    }

    fn fetch(&self, _id: &RecordId) -> Result<Option<IntakeRecord>, RepositoryError> {
        Ok(None)
    }

    fn list(
        &self,
        _filter: &RecordFilter,
        _offset: usize,
        _limit: usize,
    ) -> Result<RecordSlice, RepositoryError> {
        Ok(RecordSlice::default())
    }
}

/// Commits a case-worker escalation right after handing out the next snapshot, so the
/// caller's write is based on a revision that is already outdated.
#[derive(Default)]
pub(super) struct EscalatingRepository {
    pub(super) inner: MemoryRepository,
    armed: AtomicBool,
}

impl EscalatingRepository {
    pub(super) fn arm(&self) {
        self.armed.store(true, Ordering::SeqCst);
    }
}

impl RecordRepository for EscalatingRepository {
    fn insert(&self, record: NewIntakeRecord) -> Result<IntakeRecord, RepositoryError> {
        self.inner.insert(record)
    }

    fn update(&self, record: IntakeRecord, expected_revision: u64) -> Result<(), RepositoryError> {
        self.inner.update(record, expected_revision)
    }

    fn fetch(&self, id: &RecordId) -> Result<Option<IntakeRecord>, RepositoryError> {
        let snapshot = self.inner.fetch(id)?;
        if let Some(current) = snapshot.clone() {
            if self.armed.swap(false, Ordering::SeqCst) {
                let mut escalated = current.clone();
                escalated.status = RecordStatus::Dysfunctional;
                escalated.revision = current.revision + 1;
                self.inner.update(escalated, current.revision)?;
            }
        }
        Ok(snapshot)
    }

    fn list(
        &self,
        filter: &RecordFilter,
        offset: usize,
        limit: usize,
    ) -> Result<RecordSlice, RepositoryError> {
        self.inner.list(filter, offset, limit)
    }
}

/// Every write loses the race against some other writer.
pub(super) struct ContendedRepository;

impl RecordRepository for ContendedRepository {
    fn insert(&self, _record: NewIntakeRecord) -> Result<IntakeRecord, RepositoryError> {
        Err(RepositoryError::Conflict)
    }

    fn update(&self, _record: IntakeRecord, _expected: u64) -> Result<(), RepositoryError> {
        Err(RepositoryError::Stale)
    }

    fn fetch(&self, id: &RecordId) -> Result<Option<IntakeRecord>, RepositoryError> {
        Ok(Some(stored_record(&id.0, 50, RecordStatus::Incomplete)))
    }

    fn list(
        &self,
        _filter: &RecordFilter,
        _offset: usize,
        _limit: usize,
    ) -> Result<RecordSlice, RepositoryError> {
        Ok(RecordSlice::default())
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
