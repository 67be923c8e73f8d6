//! Application use cases. Orchestrate domain logic via ports.

pub mod agenda_service;
pub mod locks;
pub mod meeting_service;
pub mod timer_service;

pub use agenda_service::AgendaService;
pub use locks::AggregateLocks;
pub use meeting_service::MeetingService;
pub use timer_service::TimerService;
