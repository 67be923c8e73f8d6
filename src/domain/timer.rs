//! Timer state machine.
//!
//! `Created | Stopped --start--> Running --stop--> Stopped`, and any live
//! state `--delete--> Deleted`. A deleted timer is a tombstone: it is kept for
//! history and accepts no further transitions. Every transition validates
//! first and mutates second, so a failed call leaves the timer untouched.

use crate::domain::time::{ensure_whole_seconds, hhmm};
use crate::domain::{DomainError, TimerId};
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle of a timer. Soft delete is a state, not a flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum TimerState {
    Created,
    Running,
    Stopped,
    Deleted { at: DateTime<Utc> },
}

impl TimerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Running => "running",
            Self::Stopped => "stopped",
            Self::Deleted { .. } => "deleted",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timer {
    pub id: TimerId,
    /// Target elapsed time.
    #[serde(with = "hhmm")]
    duration: TimeDelta,
    #[serde(flatten)]
    state: TimerState,
}

/// Input for the timer factory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerCreateRequest {
    #[serde(with = "hhmm")]
    pub duration: TimeDelta,
}

impl TimerCreateRequest {
    pub fn new(duration: TimeDelta) -> Self {
        Self { duration }
    }

    /// Build a fresh, not-yet-running timer.
    pub fn into_timer(self, id: TimerId) -> Result<Timer, DomainError> {
        ensure_positive(self.duration)?;
        Ok(Timer {
            id,
            duration: self.duration,
            state: TimerState::Created,
        })
    }
}

impl Timer {
    /// Rehydrate from storage. Adapters only.
    pub fn restore(id: TimerId, duration: TimeDelta, state: TimerState) -> Self {
        Self {
            id,
            duration,
            state,
        }
    }

    pub fn duration(&self) -> TimeDelta {
        self.duration
    }

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == TimerState::Running
    }

    pub fn is_deleted(&self) -> bool {
        matches!(self.state, TimerState::Deleted { .. })
    }

    pub fn deleted_at(&self) -> Option<DateTime<Utc>> {
        match self.state {
            TimerState::Deleted { at } => Some(at),
            _ => None,
        }
    }

    pub fn start(&mut self) -> Result<(), DomainError> {
        match self.state {
            TimerState::Created | TimerState::Stopped => {
                self.state = TimerState::Running;
                Ok(())
            }
            TimerState::Running => Err(self.rejected("start", "already running")),
            TimerState::Deleted { .. } => Err(self.rejected("start", "deleted")),
        }
    }

    pub fn stop(&mut self) -> Result<(), DomainError> {
        match self.state {
            TimerState::Running => {
                self.state = TimerState::Stopped;
                Ok(())
            }
            _ => Err(self.rejected("stop", "not running")),
        }
    }

    /// Running timers keep their target; stop first.
    pub fn change_duration(&mut self, duration: TimeDelta) -> Result<(), DomainError> {
        match self.state {
            TimerState::Created | TimerState::Stopped => {
                ensure_positive(duration)?;
                self.duration = duration;
                Ok(())
            }
            TimerState::Running => Err(self.rejected("change duration of", "running")),
            TimerState::Deleted { .. } => Err(self.rejected("change duration of", "deleted")),
        }
    }

    /// Soft delete at `at`.
    pub fn delete(&mut self, at: DateTime<Utc>) -> Result<(), DomainError> {
        if self.is_deleted() {
            return Err(self.rejected("delete", "already deleted"));
        }
        self.state = TimerState::Deleted { at };
        Ok(())
    }

    fn rejected(&self, action: &str, reason: &str) -> DomainError {
        DomainError::InvalidState(format!("cannot {action} timer {}: {reason}", self.id))
    }
}

fn ensure_positive(duration: TimeDelta) -> Result<(), DomainError> {
    if duration <= TimeDelta::zero() {
        return Err(DomainError::InvalidState(
            "timer duration must be positive".into(),
        ));
    }
    ensure_whole_seconds("timer duration", duration)
}
