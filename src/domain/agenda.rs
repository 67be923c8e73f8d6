//! Agenda: a timed unit within a meeting.
//!
//! Only `AgendaType::Agenda` entries that reached `AgendaStatus::Completed`
//! feed into meeting reports; breaks and unfinished items are skipped.

use crate::domain::time::{ensure_whole_seconds, hhmm};
use crate::domain::{AgendaId, DomainError, MeetingId};
use chrono::TimeDelta;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgendaType {
    Agenda,
    Break,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgendaStatus {
    Pending,
    InProgress,
    Paused,
    Completed,
    Canceled,
}

impl AgendaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Agenda => "agenda",
            Self::Break => "break",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "agenda" => Some(Self::Agenda),
            "break" => Some(Self::Break),
            _ => None,
        }
    }
}

impl AgendaStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Paused => "paused",
            Self::Completed => "completed",
            Self::Canceled => "canceled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "in_progress" => Some(Self::InProgress),
            "paused" => Some(Self::Paused),
            "completed" => Some(Self::Completed),
            "canceled" => Some(Self::Canceled),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Canceled)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agenda {
    pub id: AgendaId,
    pub meeting_id: MeetingId,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: AgendaType,
    pub status: AgendaStatus,
    #[serde(with = "hhmm")]
    pub estimated_duration: TimeDelta,
    /// Set on completion.
    #[serde(with = "hhmm::option")]
    pub actual_duration: Option<TimeDelta>,
}

/// Input for `AgendaService::add_agenda`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgendaCreateRequest {
    pub title: String,
    #[serde(rename = "type")]
    pub kind: AgendaType,
    #[serde(with = "hhmm")]
    pub estimated_duration: TimeDelta,
}

impl AgendaCreateRequest {
    pub fn into_agenda(self, id: AgendaId, meeting_id: MeetingId) -> Result<Agenda, DomainError> {
        ensure_whole_seconds("agenda estimated duration", self.estimated_duration)?;
        Ok(Agenda {
            id,
            meeting_id,
            title: self.title,
            kind: self.kind,
            status: AgendaStatus::Pending,
            estimated_duration: self.estimated_duration,
            actual_duration: None,
        })
    }
}

impl Agenda {
    /// Eligible for a meeting report.
    pub fn is_reportable(&self) -> bool {
        self.kind == AgendaType::Agenda && self.status == AgendaStatus::Completed
    }

    pub fn start(&mut self) -> Result<(), DomainError> {
        match self.status {
            AgendaStatus::Pending | AgendaStatus::Paused => {
                self.status = AgendaStatus::InProgress;
                Ok(())
            }
            _ => Err(self.rejected("start")),
        }
    }

    pub fn pause(&mut self) -> Result<(), DomainError> {
        match self.status {
            AgendaStatus::InProgress => {
                self.status = AgendaStatus::Paused;
                Ok(())
            }
            _ => Err(self.rejected("pause")),
        }
    }

    pub fn complete(&mut self, actual: TimeDelta) -> Result<(), DomainError> {
        match self.status {
            AgendaStatus::InProgress | AgendaStatus::Paused => {
                if actual < TimeDelta::zero() {
                    return Err(DomainError::InvalidState(format!(
                        "agenda {} actual duration cannot be negative",
                        self.id
                    )));
                }
                ensure_whole_seconds("agenda actual duration", actual)?;
                self.status = AgendaStatus::Completed;
                self.actual_duration = Some(actual);
                Ok(())
            }
            _ => Err(self.rejected("complete")),
        }
    }

    pub fn cancel(&mut self) -> Result<(), DomainError> {
        if self.status.is_terminal() {
            return Err(self.rejected("cancel"));
        }
        self.status = AgendaStatus::Canceled;
        Ok(())
    }

    fn rejected(&self, action: &str) -> DomainError {
        DomainError::InvalidState(format!(
            "cannot {action} agenda {} in status {}",
            self.id,
            self.status.as_str()
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agenda(kind: AgendaType) -> Agenda {
        AgendaCreateRequest {
            title: "Roadmap".into(),
            kind,
            estimated_duration: TimeDelta::minutes(20),
        }
        .into_agenda(AgendaId(1), MeetingId(7))
        .unwrap()
    }

    #[test]
    fn completes_through_in_progress() {
        let mut a = agenda(AgendaType::Agenda);
        assert!(!a.is_reportable());
        a.start().unwrap();
        a.pause().unwrap();
        a.start().unwrap();
        a.complete(TimeDelta::minutes(25)).unwrap();
        assert_eq!(a.status, AgendaStatus::Completed);
        assert_eq!(a.actual_duration, Some(TimeDelta::minutes(25)));
        assert!(a.is_reportable());
    }

    #[test]
    fn pending_agenda_cannot_complete() {
        let mut a = agenda(AgendaType::Agenda);
        let err = a.complete(TimeDelta::minutes(1)).unwrap_err();
        assert!(matches!(err, DomainError::InvalidState(_)));
        assert_eq!(a.status, AgendaStatus::Pending);
        assert_eq!(a.actual_duration, None);
    }

    #[test]
    fn sub_second_durations_are_rejected() {
        let err = AgendaCreateRequest {
            title: "Standup".into(),
            kind: AgendaType::Agenda,
            estimated_duration: TimeDelta::milliseconds(1500),
        }
        .into_agenda(AgendaId(2), MeetingId(7))
        .unwrap_err();
        assert!(matches!(err, DomainError::InvalidState(_)));

        let mut a = agenda(AgendaType::Agenda);
        a.start().unwrap();
        assert!(a.complete(TimeDelta::milliseconds(250)).is_err());
        assert_eq!(a.status, AgendaStatus::InProgress);
        assert_eq!(a.actual_duration, None);
    }

    #[test]
    fn completed_breaks_are_not_reportable() {
        let mut a = agenda(AgendaType::Break);
        a.start().unwrap();
        a.complete(TimeDelta::minutes(10)).unwrap();
        assert!(!a.is_reportable());
    }

    #[test]
    fn terminal_states_reject_cancel() {
        let mut a = agenda(AgendaType::Agenda);
        a.cancel().unwrap();
        assert!(a.cancel().is_err());
        assert!(a.start().is_err());
    }

    #[test]
    fn status_strings_round_trip() {
        for status in [
            AgendaStatus::Pending,
            AgendaStatus::InProgress,
            AgendaStatus::Paused,
            AgendaStatus::Completed,
            AgendaStatus::Canceled,
        ] {
            assert_eq!(AgendaStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(AgendaType::parse("break"), Some(AgendaType::Break));
        assert_eq!(AgendaType::parse("lunch"), None);
    }
}
