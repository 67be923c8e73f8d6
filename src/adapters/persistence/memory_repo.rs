//! In-process store implementing every repository port.
//!
//! All tables sit behind one `RwLock`, so a meeting save that rewrites the
//! meeting and its participant records is a single write with no torn state.
//! Used by tests and by `storage = "memory"` runs.

use crate::domain::{
    Agenda, AgendaId, DomainError, Meeting, MeetingId, Member, MemberId, Participant,
    ParticipantId, Timer, TimerId,
};
use crate::ports::{
    AgendaRepository, MeetingRepository, MemberRepository, ParticipantRepository, TimerRepository,
};
use std::collections::BTreeMap;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct StoreData {
    timers: BTreeMap<TimerId, Timer>,
    meetings: BTreeMap<MeetingId, Meeting>,
    participants: BTreeMap<ParticipantId, Participant>,
    agendas: BTreeMap<AgendaId, Agenda>,
    members: BTreeMap<MemberId, Member>,
    last_timer_id: i64,
    last_meeting_id: i64,
    last_participant_id: i64,
    last_agenda_id: i64,
}

/// In-memory storage. Cheap to construct; share via `Arc`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: RwLock<StoreData>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn bump(counter: &mut i64) -> i64 {
    *counter += 1;
    *counter
}

#[async_trait::async_trait]
impl TimerRepository for MemoryStore {
    async fn next_id(&self) -> Result<TimerId, DomainError> {
        let mut data = self.data.write().await;
        Ok(TimerId(bump(&mut data.last_timer_id)))
    }

    async fn find_by_id(&self, id: TimerId) -> Result<Option<Timer>, DomainError> {
        Ok(self.data.read().await.timers.get(&id).cloned())
    }

    async fn find_all(&self) -> Result<Vec<Timer>, DomainError> {
        let data = self.data.read().await;
        Ok(data
            .timers
            .values()
            .filter(|t| !t.is_deleted())
            .cloned()
            .collect())
    }

    async fn save(&self, timer: &Timer) -> Result<Timer, DomainError> {
        let mut data = self.data.write().await;
        data.last_timer_id = data.last_timer_id.max(timer.id.0);
        data.timers.insert(timer.id, timer.clone());
        Ok(timer.clone())
    }
}

#[async_trait::async_trait]
impl MeetingRepository for MemoryStore {
    async fn next_id(&self) -> Result<MeetingId, DomainError> {
        let mut data = self.data.write().await;
        Ok(MeetingId(bump(&mut data.last_meeting_id)))
    }

    async fn next_participant_id(&self) -> Result<ParticipantId, DomainError> {
        let mut data = self.data.write().await;
        Ok(ParticipantId(bump(&mut data.last_participant_id)))
    }

    async fn find_by_id(&self, id: MeetingId) -> Result<Option<Meeting>, DomainError> {
        Ok(self.data.read().await.meetings.get(&id).cloned())
    }

    async fn find_all(&self) -> Result<Vec<Meeting>, DomainError> {
        Ok(self.data.read().await.meetings.values().cloned().collect())
    }

    async fn save(&self, meeting: &Meeting) -> Result<Meeting, DomainError> {
        let mut data = self.data.write().await;
        data.participants.retain(|_, p| p.meeting_id != meeting.id);
        for p in meeting.participants() {
            data.last_participant_id = data.last_participant_id.max(p.id.0);
            data.participants.insert(p.id, p.clone());
        }
        data.last_meeting_id = data.last_meeting_id.max(meeting.id.0);
        data.meetings.insert(meeting.id, meeting.clone());
        Ok(meeting.clone())
    }
}

#[async_trait::async_trait]
impl ParticipantRepository for MemoryStore {
    async fn find_by_meeting_id(&self, id: MeetingId) -> Result<Vec<Participant>, DomainError> {
        let data = self.data.read().await;
        Ok(data
            .participants
            .values()
            .filter(|p| p.meeting_id == id)
            .cloned()
            .collect())
    }

    async fn find_by_member_id(&self, id: MemberId) -> Result<Vec<Participant>, DomainError> {
        let data = self.data.read().await;
        Ok(data
            .participants
            .values()
            .filter(|p| p.member_id == id)
            .cloned()
            .collect())
    }
}

#[async_trait::async_trait]
impl AgendaRepository for MemoryStore {
    async fn next_id(&self) -> Result<AgendaId, DomainError> {
        let mut data = self.data.write().await;
        Ok(AgendaId(bump(&mut data.last_agenda_id)))
    }

    async fn find_by_id(&self, id: AgendaId) -> Result<Option<Agenda>, DomainError> {
        Ok(self.data.read().await.agendas.get(&id).cloned())
    }

    async fn find_all(&self) -> Result<Vec<Agenda>, DomainError> {
        Ok(self.data.read().await.agendas.values().cloned().collect())
    }

    async fn save(&self, agenda: &Agenda) -> Result<Agenda, DomainError> {
        let mut data = self.data.write().await;
        data.last_agenda_id = data.last_agenda_id.max(agenda.id.0);
        data.agendas.insert(agenda.id, agenda.clone());
        Ok(agenda.clone())
    }

    async fn find_by_meeting_id(&self, id: MeetingId) -> Result<Vec<Agenda>, DomainError> {
        let data = self.data.read().await;
        Ok(data
            .agendas
            .values()
            .filter(|a| a.meeting_id == id)
            .cloned()
            .collect())
    }
}

#[async_trait::async_trait]
impl MemberRepository for MemoryStore {
    async fn find_by_id(&self, id: MemberId) -> Result<Option<Member>, DomainError> {
        Ok(self.data.read().await.members.get(&id).cloned())
    }

    async fn find_by_oauth_id(&self, oauth_id: i64) -> Result<Option<Member>, DomainError> {
        let data = self.data.read().await;
        Ok(data
            .members
            .values()
            .find(|m| m.oauth_id == Some(oauth_id))
            .cloned())
    }

    async fn save(&self, member: &Member) -> Result<Member, DomainError> {
        self.data
            .write()
            .await
            .members
            .insert(member.id, member.clone());
        Ok(member.clone())
    }
}
