//! Report value objects. Computed on demand; never persisted.

use crate::domain::time::{hhmm, variance};
use crate::domain::{Agenda, AgendaId, DomainError};
use chrono::TimeDelta;
use serde::{Deserialize, Serialize};

/// Placeholder for free-text meeting notes until notes are captured.
pub const MEMO_PLACEHOLDER: &str = "Meeting minutes.";

/// One completed agenda in a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgendaReportLine {
    pub agenda_id: AgendaId,
    pub title: String,
    #[serde(with = "hhmm")]
    pub estimated_duration: TimeDelta,
    #[serde(with = "hhmm")]
    pub actual_duration: TimeDelta,
    /// `estimated - actual`.
    #[serde(with = "hhmm")]
    pub diff: TimeDelta,
}

impl AgendaReportLine {
    pub fn from_agenda(agenda: &Agenda) -> Result<Self, DomainError> {
        let actual = agenda.actual_duration.ok_or_else(|| {
            DomainError::Internal(format!(
                "completed agenda {} has no actual duration",
                agenda.id
            ))
        })?;
        Ok(Self {
            agenda_id: agenda.id,
            title: agenda.title.clone(),
            estimated_duration: agenda.estimated_duration,
            actual_duration: actual,
            diff: variance(agenda.estimated_duration, actual),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeetingReport {
    /// `total_estimated - total_actual`; positive means the meeting ran under time.
    #[serde(with = "hhmm")]
    pub total_diff: TimeDelta,
    pub agendas: Vec<AgendaReportLine>,
    pub memos: String,
}
