//! Timer use cases: create, look up, and drive the timer state machine.
//!
//! - Each mutation runs under the timer's aggregate lock
//! - Transitions are validated by the domain before anything is saved
//! - Missing ids surface as `DomainError::NotFound`

use crate::domain::{DomainError, Timer, TimerCreateRequest, TimerId};
use crate::ports::TimerRepository;
use crate::usecases::locks::AggregateLocks;
use chrono::{TimeDelta, Utc};
use std::sync::Arc;
use tracing::{debug, info};

pub struct TimerService {
    timers: Arc<dyn TimerRepository>,
    locks: AggregateLocks<TimerId>,
}

impl TimerService {
    pub fn new(timers: Arc<dyn TimerRepository>) -> Self {
        Self {
            timers,
            locks: AggregateLocks::new(),
        }
    }

    pub async fn create_timer(&self, request: TimerCreateRequest) -> Result<Timer, DomainError> {
        let id = self.timers.next_id().await?;
        let timer = request.into_timer(id)?;
        let timer = self.timers.save(&timer).await?;
        info!(
            timer_id = %timer.id,
            duration_secs = timer.duration().num_seconds(),
            "timer created"
        );
        Ok(timer)
    }

    pub async fn find_by_id(&self, id: TimerId) -> Result<Timer, DomainError> {
        self.timers
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Timer", id))
    }

    pub async fn find_all(&self) -> Result<Vec<Timer>, DomainError> {
        self.timers.find_all().await
    }

    pub async fn start_timer(&self, id: TimerId) -> Result<Timer, DomainError> {
        self.transition(id, "started", |t| t.start()).await
    }

    pub async fn stop_timer(&self, id: TimerId) -> Result<Timer, DomainError> {
        self.transition(id, "stopped", |t| t.stop()).await
    }

    pub async fn change_duration(
        &self,
        id: TimerId,
        duration: TimeDelta,
    ) -> Result<Timer, DomainError> {
        self.transition(id, "duration changed", |t| t.change_duration(duration))
            .await
    }

    /// Soft delete. The record stays with a tombstone.
    pub async fn delete_timer(&self, id: TimerId) -> Result<Timer, DomainError> {
        self.transition(id, "deleted", |t| t.delete(Utc::now())).await
    }

    async fn transition<F>(&self, id: TimerId, what: &str, apply: F) -> Result<Timer, DomainError>
    where
        F: FnOnce(&mut Timer) -> Result<(), DomainError>,
    {
        let _guard = self.locks.lock(id).await;
        let mut timer = self.find_by_id(id).await?;
        if let Err(e) = apply(&mut timer) {
            debug!(
                timer_id = %id,
                state = timer.state().as_str(),
                error = %e,
                "timer transition rejected"
            );
            return Err(e);
        }
        let timer = self.timers.save(&timer).await?;
        info!(timer_id = %id, state = timer.state().as_str(), "timer {}", what);
        Ok(timer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::persistence::memory_repo::MemoryStore;

    fn service() -> TimerService {
        TimerService::new(Arc::new(MemoryStore::new()))
    }

    async fn thirty_minutes(svc: &TimerService) -> Timer {
        svc.create_timer(TimerCreateRequest::new(TimeDelta::minutes(30)))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn start_stop_change_duration_scenario() {
        let svc = service();
        let t = thirty_minutes(&svc).await;
        assert!(!t.is_running());

        assert!(svc.start_timer(t.id).await.unwrap().is_running());
        assert!(!svc.stop_timer(t.id).await.unwrap().is_running());
        let t = svc
            .change_duration(t.id, TimeDelta::minutes(45))
            .await
            .unwrap();
        assert_eq!(t.duration(), TimeDelta::minutes(45));
        assert_eq!(svc.find_by_id(t.id).await.unwrap(), t);
    }

    #[tokio::test]
    async fn failed_transition_is_not_persisted() {
        let svc = service();
        let t = thirty_minutes(&svc).await;
        svc.start_timer(t.id).await.unwrap();

        let err = svc
            .change_duration(t.id, TimeDelta::minutes(5))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidState(_)));
        let stored = svc.find_by_id(t.id).await.unwrap();
        assert!(stored.is_running());
        assert_eq!(stored.duration(), TimeDelta::minutes(30));
    }

    #[tokio::test]
    async fn missing_timer_is_not_found() {
        let svc = service();
        let err = svc.start_timer(TimerId(404)).await.unwrap_err();
        assert!(matches!(
            err,
            DomainError::NotFound {
                resource: "Timer",
                id: 404
            }
        ));
    }

    #[tokio::test]
    async fn delete_keeps_tombstone_and_hides_from_listing() {
        let svc = service();
        let keep = thirty_minutes(&svc).await;
        let gone = thirty_minutes(&svc).await;

        let deleted = svc.delete_timer(gone.id).await.unwrap();
        assert!(deleted.deleted_at().is_some());
        assert!(svc.find_by_id(gone.id).await.unwrap().is_deleted());
        assert!(matches!(
            svc.delete_timer(gone.id).await,
            Err(DomainError::InvalidState(_))
        ));

        let all = svc.find_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, keep.id);
    }

    #[tokio::test]
    async fn concurrent_starts_only_one_wins() {
        let svc = Arc::new(service());
        let id = thirty_minutes(&svc).await.id;
        let a = tokio::spawn({
            let svc = Arc::clone(&svc);
            async move { svc.start_timer(id).await }
        });
        let b = tokio::spawn({
            let svc = Arc::clone(&svc);
            async move { svc.start_timer(id).await }
        });
        let results = [a.await.unwrap(), b.await.unwrap()];
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    }

    #[tokio::test]
    async fn sub_second_timer_is_rejected() {
        let svc = service();
        let err = svc
            .create_timer(TimerCreateRequest::new(TimeDelta::milliseconds(500)))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidState(_)));
        assert!(svc.find_all().await.unwrap().is_empty());
    }
}
