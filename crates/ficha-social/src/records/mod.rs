//! Social intake records ("fichas sociales"): completeness scoring, derived status, the
//! service that keeps both current on every edit, and the HTTP router in front of it.

pub mod completeness;
pub mod domain;
pub mod repository;
pub mod router;
pub mod service;
pub mod status;

#[cfg(test)]
mod tests;

pub use completeness::{CompletenessEvaluator, CompletenessReport, TRACKED_FIELDS};
pub use domain::{
    EconomicInfo, ExpenseBreakdown, Guardian, HealthInfo, HouseholdComposition, HousingInfo,
    IncomeBreakdown, IntakeForm, IntakeRecord, NewIntakeRecord, RecordId, RecordStatus,
    SignedDeclaration,
};
pub use repository::{RecordFilter, RecordRepository, RecordSlice, RepositoryError};
pub use router::{record_router, ApiResponse, ListParams};
pub use service::{IntakeRecordService, RecordPolicy, RecordServiceError};
pub use status::{diagnose, next_status, resolve_status, AnomalyKind, DerivedStatus, StatusAnomaly};
