//! Completeness scoring for intake forms.
//!
//! A fixed set of [`TRACKED_FIELDS`] points is distributed over the form. Each point is
//! awarded independently by a presence rule, so a partially filled form degrades to a lower
//! score instead of failing. Missing nested groups simply award nothing for their points.

use serde::Serialize;

use super::domain::{Guardian, IntakeForm};

/// Denominator of the completeness percentage.
pub const TRACKED_FIELDS: u32 = 32;

const INCOME_BLOCK_POINTS: u32 = 3;

/// Score plus the tracked field paths that did not earn their points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletenessReport {
    pub score: u8,
    pub awarded: u32,
    pub tracked: u32,
    pub missing: Vec<String>,
}

/// Stateless evaluator; the only knob is which nationality counts as local for the
/// national-identifier rule.
#[derive(Debug, Clone)]
pub struct CompletenessEvaluator {
    local_nationality: String,
}

impl CompletenessEvaluator {
    pub fn new(local_nationality: impl Into<String>) -> Self {
        Self {
            local_nationality: local_nationality.into(),
        }
    }

    pub fn evaluate(&self, form: &IntakeForm) -> u8 {
        self.report(form).score
    }

    pub fn report(&self, form: &IntakeForm) -> CompletenessReport {
        let mut tally = Tally::default();

        tally.text("firstName", form.first_name.as_deref());
        tally.text("paternalSurname", form.paternal_surname.as_deref());
        tally.text("maternalSurname", form.maternal_surname.as_deref());
        if self.is_local(form.nationality.as_deref()) {
            tally.text("rut", form.rut.as_deref());
        } else {
            tally.text("foreignId", form.foreign_id.as_deref());
        }
        tally.value("birthDate", form.birth_date.is_some());
        tally.text("nationality", form.nationality.as_deref());
        tally.text("address", form.address.as_deref());
        tally.text("commune", form.commune.as_deref());
        tally.text("phone", form.phone.as_deref());
        tally.text("schoolGrade", form.school_grade.as_deref());
        tally.value("enrollmentDate", form.enrollment_date.is_some());
        tally.text(
            "housingInfo.tenure",
            form.housing_info
                .as_ref()
                .and_then(|housing| housing.tenure.as_deref()),
        );

        let household = form.household_composition.as_ref();
        tally.guardian(
            "householdComposition.guardianA",
            household.and_then(|household| household.guardian_a.as_ref()),
        );
        tally.guardian(
            "householdComposition.guardianB",
            household.and_then(|household| household.guardian_b.as_ref()),
        );

        let has_income = form
            .economic_info
            .as_ref()
            .and_then(|economic| economic.income.as_ref())
            .is_some_and(|income| income.has_positive_income());
        tally.block("economicInfo.income", INCOME_BLOCK_POINTS, has_income);

        let health = form.health_info.as_ref();
        tally.text(
            "healthInfo.insuranceType",
            health.and_then(|health| health.insurance_type.as_deref()),
        );
        tally.text(
            "healthInfo.bloodType",
            health.and_then(|health| health.blood_type.as_deref()),
        );

        let declaration = form.signed_declaration.as_ref();
        tally.value(
            "signedDeclaration.accepted",
            declaration.and_then(|declaration| declaration.accepted) == Some(true),
        );
        tally.text(
            "signedDeclaration.signerName",
            declaration.and_then(|declaration| declaration.signer_name.as_deref()),
        );
        tally.text(
            "signedDeclaration.signature",
            declaration.and_then(|declaration| declaration.signature.as_deref()),
        );

        tally.finish()
    }

    fn is_local(&self, nationality: Option<&str>) -> bool {
        nationality.is_some_and(|value| {
            value
                .trim()
                .eq_ignore_ascii_case(self.local_nationality.trim())
        })
    }
}

#[derive(Default)]
struct Tally {
    awarded: u32,
    counted: u32,
    missing: Vec<String>,
}

impl Tally {
    fn block(&mut self, field: &str, points: u32, present: bool) {
        self.counted += points;
        if present {
            self.awarded += points;
        } else {
            self.missing.push(field.to_string());
        }
    }

    fn value(&mut self, field: &str, present: bool) {
        self.block(field, 1, present);
    }

    fn text(&mut self, field: &str, value: Option<&str>) {
        self.value(field, value.is_some_and(|text| !text.is_empty()));
    }

    fn guardian(&mut self, prefix: &str, guardian: Option<&Guardian>) {
        let text_fields: [(&str, Option<&str>); 3] = [
            (
                "firstName",
                guardian.and_then(|guardian| guardian.first_name.as_deref()),
            ),
            (
                "paternalSurname",
                guardian.and_then(|guardian| guardian.paternal_surname.as_deref()),
            ),
            (
                "maternalSurname",
                guardian.and_then(|guardian| guardian.maternal_surname.as_deref()),
            ),
        ];
        for (field, value) in text_fields {
            self.text(&format!("{prefix}.{field}"), value);
        }

        self.value(
            &format!("{prefix}.age"),
            guardian.and_then(|guardian| guardian.age).is_some(),
        );
        self.text(
            &format!("{prefix}.occupation"),
            guardian.and_then(|guardian| guardian.occupation.as_deref()),
        );
        self.text(
            &format!("{prefix}.phone"),
            guardian.and_then(|guardian| guardian.phone.as_deref()),
        );
    }

    fn finish(self) -> CompletenessReport {
        debug_assert_eq!(self.counted, TRACKED_FIELDS);
        CompletenessReport {
            score: percentage(self.awarded),
            awarded: self.awarded,
            tracked: TRACKED_FIELDS,
            missing: self.missing,
        }
    }
}

/// Round-half-up of `awarded / TRACKED_FIELDS * 100`, in integer arithmetic.
fn percentage(awarded: u32) -> u8 {
    let awarded = awarded.min(TRACKED_FIELDS);
    ((awarded * 100 + TRACKED_FIELDS / 2) / TRACKED_FIELDS) as u8
}
