use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for persisted intake records.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub String);

impl RecordId {
    /// Zero-padded form used by storage backends that number records in insertion order.
    pub fn sequential(number: u64) -> Self {
        Self(format!("rec-{number:06}"))
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle label of a record. `Dysfunctional` is only ever assigned by a case worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordStatus {
    #[serde(rename = "incompleta")]
    Incomplete,
    #[serde(rename = "completa")]
    Complete,
    #[serde(rename = "disfuncional")]
    Dysfunctional,
}

impl RecordStatus {
    pub const fn label(self) -> &'static str {
        match self {
            RecordStatus::Incomplete => "incompleta",
            RecordStatus::Complete => "completa",
            RecordStatus::Dysfunctional => "disfuncional",
        }
    }
}

/// Editable content of the social intake form ("ficha social"). Every field may be absent
/// while the form is being filled in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct IntakeForm {
    pub first_name: Option<String>,
    pub paternal_surname: Option<String>,
    pub maternal_surname: Option<String>,
    /// Domestic national identifier, checked for local nationals.
    pub rut: Option<String>,
    /// Passport or foreign identity document, checked for everyone else.
    pub foreign_id: Option<String>,
    pub nationality: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub address: Option<String>,
    pub commune: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub school_grade: Option<String>,
    pub enrollment_date: Option<NaiveDate>,
    pub household_composition: Option<HouseholdComposition>,
    pub housing_info: Option<HousingInfo>,
    pub health_info: Option<HealthInfo>,
    pub economic_info: Option<EconomicInfo>,
    pub signed_declaration: Option<SignedDeclaration>,
    pub observations: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HouseholdComposition {
    pub guardian_a: Option<Guardian>,
    pub guardian_b: Option<Guardian>,
    pub members: Option<u8>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Guardian {
    pub first_name: Option<String>,
    pub paternal_surname: Option<String>,
    pub maternal_surname: Option<String>,
    pub age: Option<u8>,
    pub occupation: Option<String>,
    pub employer: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HousingInfo {
    /// Owned, rented, lent, shared, and so on.
    pub tenure: Option<String>,
    pub dwelling_type: Option<String>,
    pub rooms: Option<u8>,
    pub has_basic_services: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HealthInfo {
    pub insurance_type: Option<String>,
    pub blood_type: Option<String>,
    pub chronic_conditions: Option<String>,
    pub disability: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EconomicInfo {
    pub income: Option<IncomeBreakdown>,
    pub expenses: Option<ExpenseBreakdown>,
}

/// Monthly household income by earner.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct IncomeBreakdown {
    pub guardian_a: Option<f64>,
    pub spouse: Option<f64>,
    pub other: Option<f64>,
}

impl IncomeBreakdown {
    pub fn has_positive_income(&self) -> bool {
        [self.guardian_a, self.spouse, self.other]
            .into_iter()
            .flatten()
            .any(|amount| amount > 0.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExpenseBreakdown {
    pub housing: Option<f64>,
    pub utilities: Option<f64>,
    pub food: Option<f64>,
    pub education: Option<f64>,
    pub health: Option<f64>,
    pub transport: Option<f64>,
    pub other: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SignedDeclaration {
    pub accepted: Option<bool>,
    pub signer_name: Option<String>,
    /// Storage reference of the captured signature image.
    pub signature: Option<String>,
    pub signed_on: Option<NaiveDate>,
}

/// Persisted record: the form plus derived and bookkeeping fields the client cannot set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntakeRecord {
    pub id: RecordId,
    #[serde(flatten)]
    pub form: IntakeForm,
    pub completion_percentage: u8,
    pub status: RecordStatus,
    pub linked_interviews: u32,
    /// Bumped on every successful write; storage refuses updates based on an older value.
    #[serde(default)]
    pub revision: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl IntakeRecord {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// Scored form awaiting its identifier from storage.
#[derive(Debug, Clone, PartialEq)]
pub struct NewIntakeRecord {
    pub form: IntakeForm,
    pub completion_percentage: u8,
    pub status: RecordStatus,
    pub created_at: DateTime<Utc>,
}

impl NewIntakeRecord {
    pub fn into_record(self, id: RecordId) -> IntakeRecord {
        IntakeRecord {
            id,
            form: self.form,
            completion_percentage: self.completion_percentage,
            status: self.status,
            linked_interviews: 0,
            revision: 0,
            created_at: self.created_at,
            updated_at: self.created_at,
            deleted_at: None,
        }
    }
}
