//! Port traits. API boundaries for the hexagon.
//!
//! - Inbound: Called by the boundary layer into the application
//! - Outbound: Called by application into infrastructure

pub mod inbound;
pub mod outbound;

pub use inbound::IdentityPort;
pub use outbound::{
    AgendaRepository, HostSelector, MeetingRepository, MemberRepository, ParticipantRepository,
    TimerRepository,
};
