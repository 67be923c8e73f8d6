//! Core domain layer. No external I/O dependencies.
//!
//! Entities, state machines and report arithmetic live here. Dependencies flow inward.

pub mod agenda;
pub mod errors;
pub mod ids;
pub mod meeting;
pub mod member;
pub mod participant;
pub mod report;
pub mod time;
pub mod timer;

pub use agenda::{Agenda, AgendaCreateRequest, AgendaStatus, AgendaType};
pub use errors::DomainError;
pub use ids::{AgendaId, MeetingId, MemberId, ParticipantId, TimerId};
pub use meeting::{HostSelector, Meeting, MeetingCreateRequest};
pub use member::Member;
pub use participant::Participant;
pub use report::{AgendaReportLine, MeetingReport};
pub use timer::{Timer, TimerCreateRequest, TimerState};
