use serde::Serialize;

use super::domain::{IntakeRecord, RecordId, RecordStatus};

/// Status the score alone can justify.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DerivedStatus {
    Incomplete,
    Complete,
}

impl From<DerivedStatus> for RecordStatus {
    fn from(value: DerivedStatus) -> Self {
        match value {
            DerivedStatus::Incomplete => RecordStatus::Incomplete,
            DerivedStatus::Complete => RecordStatus::Complete,
        }
    }
}

/// Maps a completeness score to a status. The previous status does not influence the
/// result; see [`next_status`] for the write-path rule that keeps escalations.
pub fn resolve_status(score: u8, _previous: RecordStatus) -> DerivedStatus {
    if score == 100 {
        DerivedStatus::Complete
    } else {
        DerivedStatus::Incomplete
    }
}

/// Status to persist after an edit. An escalated record stays dysfunctional whatever its
/// score.
pub fn next_status(score: u8, previous: RecordStatus) -> RecordStatus {
    match previous {
        RecordStatus::Dysfunctional => RecordStatus::Dysfunctional,
        _ => resolve_status(score, previous).into(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyKind {
    FullScoreMarkedIncomplete,
    CompleteBelowFullScore,
    CompleteWithoutInterviews,
}

impl AnomalyKind {
    pub const fn label(self) -> &'static str {
        match self {
            AnomalyKind::FullScoreMarkedIncomplete => "100% complete but marked incomplete",
            AnomalyKind::CompleteBelowFullScore => "marked complete below 100%",
            AnomalyKind::CompleteWithoutInterviews => "marked complete without linked interviews",
        }
    }
}

/// Inconsistency between a stored status and its signals, surfaced for manual review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusAnomaly {
    pub record_id: RecordId,
    pub kind: AnomalyKind,
    pub description: &'static str,
    pub completion_percentage: u8,
    pub status: RecordStatus,
    pub linked_interviews: u32,
}

/// Read-time consistency check. Never mutates the record. A `minimum_interviews` of zero
/// disables the interview rule.
pub fn diagnose(record: &IntakeRecord, minimum_interviews: u32) -> Vec<StatusAnomaly> {
    let mut kinds = Vec::new();

    match record.status {
        RecordStatus::Incomplete if record.completion_percentage == 100 => {
            kinds.push(AnomalyKind::FullScoreMarkedIncomplete);
        }
        RecordStatus::Complete => {
            if record.completion_percentage < 100 {
                kinds.push(AnomalyKind::CompleteBelowFullScore);
            }
            if record.linked_interviews < minimum_interviews {
                kinds.push(AnomalyKind::CompleteWithoutInterviews);
            }
        }
        _ => {}
    }

    kinds
        .into_iter()
        .map(|kind| StatusAnomaly {
            record_id: record.id.clone(),
            kind,
            description: kind.label(),
            completion_percentage: record.completion_percentage,
            status: record.status,
            linked_interviews: record.linked_interviews,
        })
        .collect()
}
