//! Outbound ports. Application calls into persistence.
//!
//! Implemented by adapters. `save` is an upsert keyed by the entity id.

use crate::domain::{
    Agenda, AgendaId, DomainError, Meeting, MeetingId, Member, MemberId, Participant,
    ParticipantId, Timer, TimerId,
};

pub use crate::domain::HostSelector;

/// Timer storage. Deleted timers stay stored as tombstones.
#[async_trait::async_trait]
pub trait TimerRepository: Send + Sync {
    /// Reserve a fresh id for a new timer.
    async fn next_id(&self) -> Result<TimerId, DomainError>;

    /// Fetch a timer, tombstoned or not.
    async fn find_by_id(&self, id: TimerId) -> Result<Option<Timer>, DomainError>;

    /// All timers that are not deleted, ordered by id.
    async fn find_all(&self) -> Result<Vec<Timer>, DomainError>;

    async fn save(&self, timer: &Timer) -> Result<Timer, DomainError>;
}

/// Meeting storage. A meeting and its participant records are one unit.
#[async_trait::async_trait]
pub trait MeetingRepository: Send + Sync {
    async fn next_id(&self) -> Result<MeetingId, DomainError>;

    async fn next_participant_id(&self) -> Result<ParticipantId, DomainError>;

    async fn find_by_id(&self, id: MeetingId) -> Result<Option<Meeting>, DomainError>;

    async fn find_all(&self) -> Result<Vec<Meeting>, DomainError>;

    /// Persist the meeting row and replace its participant records atomically.
    /// Either both sides are written or neither is.
    async fn save(&self, meeting: &Meeting) -> Result<Meeting, DomainError>;
}

/// Read-side queries over participant records.
#[async_trait::async_trait]
pub trait ParticipantRepository: Send + Sync {
    async fn find_by_meeting_id(&self, id: MeetingId) -> Result<Vec<Participant>, DomainError>;

    /// A member's participations across meetings.
    async fn find_by_member_id(&self, id: MemberId) -> Result<Vec<Participant>, DomainError>;
}

#[async_trait::async_trait]
pub trait AgendaRepository: Send + Sync {
    async fn next_id(&self) -> Result<AgendaId, DomainError>;

    async fn find_by_id(&self, id: AgendaId) -> Result<Option<Agenda>, DomainError>;

    async fn find_all(&self) -> Result<Vec<Agenda>, DomainError>;

    async fn save(&self, agenda: &Agenda) -> Result<Agenda, DomainError>;

    /// Agendas of one meeting, ordered by id.
    async fn find_by_meeting_id(&self, id: MeetingId) -> Result<Vec<Agenda>, DomainError>;
}

#[async_trait::async_trait]
pub trait MemberRepository: Send + Sync {
    async fn find_by_id(&self, id: MemberId) -> Result<Option<Member>, DomainError>;

    async fn find_by_oauth_id(&self, oauth_id: i64) -> Result<Option<Member>, DomainError>;

    async fn save(&self, member: &Member) -> Result<Member, DomainError>;
}
