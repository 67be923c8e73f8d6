//! Meeting aggregate: participants, host policy and report composition.
//!
//! # Invariants
//! - A member appears at most once in `participants`.
//! - `host_member_id` is `Some` and names a current participant whenever
//!   participants exist; it is `None` only for an empty meeting.
//! - Participant records are owned by value. Persisting the meeting persists
//!   them in the same unit.

use crate::domain::report::{AgendaReportLine, MEMO_PLACEHOLDER, MeetingReport};
use crate::domain::time::{ensure_whole_seconds, hhmm, total_variance};
use crate::domain::{Agenda, DomainError, MeetingId, MemberId, Participant, ParticipantId};
use chrono::{NaiveDateTime, TimeDelta};
use serde::{Deserialize, Serialize};

/// Picks the next host out of the remaining participants.
///
/// Implementations must return one of `candidates`; `candidates` is never empty.
pub trait HostSelector: Send + Sync {
    fn select(&self, candidates: &[MemberId]) -> Option<MemberId>;
}

/// Descriptive part of a meeting, as supplied by the creator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeetingCreateRequest {
    pub title: String,
    pub start_time: Option<NaiveDateTime>,
    pub location: Option<String>,
    #[serde(default, with = "hhmm::option")]
    pub total_estimated_duration: Option<TimeDelta>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meeting {
    pub id: MeetingId,
    pub title: String,
    pub start_time: Option<NaiveDateTime>,
    pub location: Option<String>,
    #[serde(with = "hhmm::option")]
    pub total_estimated_duration: Option<TimeDelta>,
    #[serde(with = "hhmm::option")]
    total_actual_duration: Option<TimeDelta>,
    host_member_id: Option<MemberId>,
    participants: Vec<Participant>,
}

impl MeetingCreateRequest {
    /// Build the meeting with `host` as host and first participant.
    pub fn into_meeting(
        self,
        id: MeetingId,
        host_participant_id: ParticipantId,
        host: MemberId,
    ) -> Result<Meeting, DomainError> {
        if let Some(estimated) = self.total_estimated_duration {
            ensure_whole_seconds("meeting estimated duration", estimated)?;
        }
        Ok(Meeting {
            id,
            title: self.title,
            start_time: self.start_time,
            location: self.location,
            total_estimated_duration: self.total_estimated_duration,
            total_actual_duration: None,
            host_member_id: Some(host),
            participants: vec![Participant::new(host_participant_id, id, host)],
        })
    }
}

impl Meeting {
    /// Rehydrate from storage. Rejects records that break the membership invariants.
    pub fn restore(
        id: MeetingId,
        details: MeetingCreateRequest,
        total_actual_duration: Option<TimeDelta>,
        host_member_id: Option<MemberId>,
        participants: Vec<Participant>,
    ) -> Result<Self, DomainError> {
        let meeting = Self {
            id,
            title: details.title,
            start_time: details.start_time,
            location: details.location,
            total_estimated_duration: details.total_estimated_duration,
            total_actual_duration,
            host_member_id,
            participants,
        };
        meeting.check_invariants()?;
        Ok(meeting)
    }

    pub fn host_member_id(&self) -> Option<MemberId> {
        self.host_member_id
    }

    pub fn is_host(&self, member_id: MemberId) -> bool {
        self.host_member_id == Some(member_id)
    }

    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    pub fn is_participant(&self, member_id: MemberId) -> bool {
        self.participants.iter().any(|p| p.member_id == member_id)
    }

    pub fn total_actual_duration(&self) -> Option<TimeDelta> {
        self.total_actual_duration
    }

    pub fn is_finished(&self) -> bool {
        self.total_actual_duration.is_some()
    }

    /// Join `member_id`. The first member to join an empty meeting becomes host.
    pub fn add_participant(
        &mut self,
        participant_id: ParticipantId,
        member_id: MemberId,
    ) -> Result<&Participant, DomainError> {
        if self.is_participant(member_id) {
            return Err(DomainError::DuplicateResource(format!(
                "member {member_id} already participates in meeting {}",
                self.id
            )));
        }
        if self.host_member_id.is_none() {
            self.host_member_id = Some(member_id);
        }
        let index = self.participants.len();
        self.participants
            .push(Participant::new(participant_id, self.id, member_id));
        Ok(&self.participants[index])
    }

    /// Leave the meeting. When the host leaves, a new host is drawn from the
    /// remaining participants; the last one out leaves the meeting hostless.
    pub fn remove_participant(
        &mut self,
        member_id: MemberId,
        selector: &dyn HostSelector,
    ) -> Result<Participant, DomainError> {
        let index = self
            .participants
            .iter()
            .position(|p| p.member_id == member_id)
            .ok_or_else(|| DomainError::not_found("Participant", member_id))?;

        let next_host = if self.is_host(member_id) {
            let remaining: Vec<MemberId> = self
                .participants
                .iter()
                .map(|p| p.member_id)
                .filter(|&m| m != member_id)
                .collect();
            if remaining.is_empty() {
                None
            } else {
                Some(pick_host(selector, &remaining)?)
            }
        } else {
            self.host_member_id
        };

        self.host_member_id = next_host;
        Ok(self.participants.remove(index))
    }

    /// Record how long the meeting actually took.
    pub fn finish(&mut self, total_actual: TimeDelta) -> Result<(), DomainError> {
        if self.is_finished() {
            return Err(DomainError::InvalidState(format!(
                "meeting {} is already finished",
                self.id
            )));
        }
        if total_actual < TimeDelta::zero() {
            return Err(DomainError::InvalidState(
                "actual duration cannot be negative".into(),
            ));
        }
        ensure_whole_seconds("meeting actual duration", total_actual)?;
        self.total_actual_duration = Some(total_actual);
        Ok(())
    }

    /// Variance report over this meeting's completed agenda items.
    ///
    /// Pure: same meeting and agendas always give the same report.
    pub fn report(&self, agendas: &[Agenda]) -> Result<MeetingReport, DomainError> {
        let agendas = agendas
            .iter()
            .filter(|a| a.meeting_id == self.id && a.is_reportable())
            .map(AgendaReportLine::from_agenda)
            .collect::<Result<Vec<_>, _>>()?;
        let total_diff =
            total_variance(self.total_estimated_duration, self.total_actual_duration)?;
        Ok(MeetingReport {
            total_diff,
            agendas,
            memos: MEMO_PLACEHOLDER.to_string(),
        })
    }

    fn check_invariants(&self) -> Result<(), DomainError> {
        let mut seen: Vec<MemberId> = Vec::with_capacity(self.participants.len());
        for p in &self.participants {
            if p.meeting_id != self.id || seen.contains(&p.member_id) {
                return Err(DomainError::Internal(format!(
                    "meeting {} has an inconsistent participant record {}",
                    self.id, p.id
                )));
            }
            seen.push(p.member_id);
        }
        let host_ok = match self.host_member_id {
            Some(host) => seen.contains(&host),
            None => seen.is_empty(),
        };
        if !host_ok {
            return Err(DomainError::Internal(format!(
                "meeting {} host is not a participant",
                self.id
            )));
        }
        Ok(())
    }
}

fn pick_host(
    selector: &dyn HostSelector,
    candidates: &[MemberId],
) -> Result<MemberId, DomainError> {
    match selector.select(candidates) {
        Some(host) if candidates.contains(&host) => Ok(host),
        Some(host) => Err(DomainError::Internal(format!(
            "host selector returned non-candidate member {host}"
        ))),
        None => Err(DomainError::Internal(
            "host selector returned no member".into(),
        )),
    }
}
