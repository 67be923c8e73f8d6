//! Agenda use cases. Agenda mutations are serialized per owning meeting; share
//! the meeting service's lock registry via `with_locks` to order them against
//! membership changes too.

use crate::domain::{Agenda, AgendaCreateRequest, AgendaId, DomainError, MeetingId};
use crate::ports::{AgendaRepository, MeetingRepository};
use crate::usecases::locks::AggregateLocks;
use chrono::TimeDelta;
use std::sync::Arc;
use tracing::info;

pub struct AgendaService {
    agendas: Arc<dyn AgendaRepository>,
    meetings: Arc<dyn MeetingRepository>,
    locks: Arc<AggregateLocks<MeetingId>>,
}

impl AgendaService {
    pub fn new(agendas: Arc<dyn AgendaRepository>, meetings: Arc<dyn MeetingRepository>) -> Self {
        Self {
            agendas,
            meetings,
            locks: Arc::new(AggregateLocks::new()),
        }
    }

    /// Use an existing per-meeting lock registry instead of a private one.
    pub fn with_locks(mut self, locks: Arc<AggregateLocks<MeetingId>>) -> Self {
        self.locks = locks;
        self
    }

    pub async fn add_agenda(
        &self,
        meeting_id: MeetingId,
        request: AgendaCreateRequest,
    ) -> Result<Agenda, DomainError> {
        let _guard = self.locks.lock(meeting_id).await;
        if self.meetings.find_by_id(meeting_id).await?.is_none() {
            return Err(DomainError::not_found("Meeting", meeting_id));
        }
        let id = self.agendas.next_id().await?;
        let agenda = self.agendas.save(&request.into_agenda(id, meeting_id)?).await?;
        info!(
            meeting_id = %meeting_id,
            agenda_id = %id,
            kind = agenda.kind.as_str(),
            "agenda added"
        );
        Ok(agenda)
    }

    pub async fn find_by_id(&self, id: AgendaId) -> Result<Agenda, DomainError> {
        self.agendas
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Agenda", id))
    }

    pub async fn find_by_meeting_id(
        &self,
        meeting_id: MeetingId,
    ) -> Result<Vec<Agenda>, DomainError> {
        self.agendas.find_by_meeting_id(meeting_id).await
    }

    pub async fn start_agenda(&self, id: AgendaId) -> Result<Agenda, DomainError> {
        self.transition(id, |a| a.start()).await
    }

    pub async fn pause_agenda(&self, id: AgendaId) -> Result<Agenda, DomainError> {
        self.transition(id, |a| a.pause()).await
    }

    pub async fn complete_agenda(
        &self,
        id: AgendaId,
        actual: TimeDelta,
    ) -> Result<Agenda, DomainError> {
        self.transition(id, |a| a.complete(actual)).await
    }

    pub async fn cancel_agenda(&self, id: AgendaId) -> Result<Agenda, DomainError> {
        self.transition(id, |a| a.cancel()).await
    }

    async fn transition<F>(&self, id: AgendaId, apply: F) -> Result<Agenda, DomainError>
    where
        F: FnOnce(&mut Agenda) -> Result<(), DomainError>,
    {
        let meeting_id = self.find_by_id(id).await?.meeting_id;
        let _guard = self.locks.lock(meeting_id).await;
        // Reload under the lock; the unlocked read only located the meeting.
        let mut agenda = self.find_by_id(id).await?;
        apply(&mut agenda)?;
        let agenda = self.agendas.save(&agenda).await?;
        info!(agenda_id = %id, status = agenda.status.as_str(), "agenda updated");
        Ok(agenda)
    }
}
