//! Meeting use cases: creation, membership, host hand-over and variance reports.
//!
//! - Membership changes run under the meeting's aggregate lock
//! - Meeting and participant records are persisted in one repository call
//! - Reports are computed from stored data and never written back

use crate::domain::{
    DomainError, Meeting, MeetingCreateRequest, MeetingId, MeetingReport, Member, MemberId,
    Participant,
};
use crate::ports::{AgendaRepository, HostSelector, MeetingRepository, ParticipantRepository};
use crate::usecases::locks::AggregateLocks;
use chrono::TimeDelta;
use std::sync::Arc;
use tracing::{error, info};

pub struct MeetingService {
    meetings: Arc<dyn MeetingRepository>,
    participants: Arc<dyn ParticipantRepository>,
    agendas: Arc<dyn AgendaRepository>,
    host_selector: Arc<dyn HostSelector>,
    locks: Arc<AggregateLocks<MeetingId>>,
}

impl MeetingService {
    pub fn new(
        meetings: Arc<dyn MeetingRepository>,
        participants: Arc<dyn ParticipantRepository>,
        agendas: Arc<dyn AgendaRepository>,
        host_selector: Arc<dyn HostSelector>,
    ) -> Self {
        Self {
            meetings,
            participants,
            agendas,
            host_selector,
            locks: Arc::new(AggregateLocks::new()),
        }
    }

    /// Per-meeting lock registry, for services that mutate data owned by a meeting.
    pub fn locks(&self) -> Arc<AggregateLocks<MeetingId>> {
        Arc::clone(&self.locks)
    }

    /// The initiating member becomes host and first participant in the same save.
    pub async fn create_meeting(
        &self,
        request: MeetingCreateRequest,
        member: &Member,
    ) -> Result<Meeting, DomainError> {
        let id = self.meetings.next_id().await?;
        let participant_id = self.meetings.next_participant_id().await?;
        let meeting = request.into_meeting(id, participant_id, member.id)?;
        let meeting = self.meetings.save(&meeting).await?;
        info!(meeting_id = %id, host = %member.id, title = %meeting.title, "meeting created");
        Ok(meeting)
    }

    pub async fn find_by_id(&self, id: MeetingId) -> Result<Meeting, DomainError> {
        self.meetings
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Meeting", id))
    }

    pub async fn find_all(&self) -> Result<Vec<Meeting>, DomainError> {
        self.meetings.find_all().await
    }

    /// Fails with `DuplicateResource` when the member already participates.
    pub async fn add_participant(
        &self,
        meeting_id: MeetingId,
        member: &Member,
    ) -> Result<Meeting, DomainError> {
        let _guard = self.locks.lock(meeting_id).await;
        let mut meeting = self.find_by_id(meeting_id).await?;
        if meeting.is_participant(member.id) {
            info!(meeting_id = %meeting_id, member_id = %member.id, "member already participating");
            return Err(DomainError::DuplicateResource(format!(
                "member {} already participates in meeting {meeting_id}",
                member.id
            )));
        }
        let participant_id = self.meetings.next_participant_id().await?;
        meeting.add_participant(participant_id, member.id)?;
        let meeting = self.meetings.save(&meeting).await?;
        info!(
            meeting_id = %meeting_id,
            member_id = %member.id,
            participants = meeting.participants().len(),
            "participant added"
        );
        Ok(meeting)
    }

    /// Removing the host hands the role to a random remaining participant.
    pub async fn remove_participant(
        &self,
        meeting_id: MeetingId,
        member: &Member,
    ) -> Result<Meeting, DomainError> {
        let _guard = self.locks.lock(meeting_id).await;
        let mut meeting = self.find_by_id(meeting_id).await?;
        let was_host = meeting.is_host(member.id);
        meeting.remove_participant(member.id, self.host_selector.as_ref())?;
        let meeting = self.meetings.save(&meeting).await?;
        if was_host {
            match meeting.host_member_id() {
                Some(host) => info!(meeting_id = %meeting_id, new_host = %host, "host reassigned"),
                None => {
                    info!(meeting_id = %meeting_id, "last participant left, meeting is hostless")
                }
            }
        }
        info!(meeting_id = %meeting_id, member_id = %member.id, "participant removed");
        Ok(meeting)
    }

    /// Record the actual total once the meeting is over.
    pub async fn finish_meeting(
        &self,
        meeting_id: MeetingId,
        total_actual: TimeDelta,
    ) -> Result<Meeting, DomainError> {
        let _guard = self.locks.lock(meeting_id).await;
        let mut meeting = self.find_by_id(meeting_id).await?;
        meeting.finish(total_actual)?;
        let meeting = self.meetings.save(&meeting).await?;
        info!(
            meeting_id = %meeting_id,
            actual_secs = total_actual.num_seconds(),
            "meeting finished"
        );
        Ok(meeting)
    }

    /// Meetings a member takes part in, derived from participant records.
    pub async fn participations(
        &self,
        member_id: MemberId,
    ) -> Result<Vec<Participant>, DomainError> {
        self.participants.find_by_member_id(member_id).await
    }

    /// Estimated-vs-actual report. Read-only; safe to recompute.
    pub async fn create_report(&self, meeting_id: MeetingId) -> Result<MeetingReport, DomainError> {
        let meeting = self.find_by_id(meeting_id).await?;
        let agendas = self.agendas.find_by_meeting_id(meeting_id).await?;
        meeting.report(&agendas).inspect_err(|e| {
            if let DomainError::Internal(_) = e {
                error!(
                    meeting_id = %meeting_id,
                    error = %e,
                    "meeting report precondition violated"
                );
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::persistence::memory_repo::MemoryStore;
    use crate::domain::{AgendaCreateRequest, AgendaType};
    use crate::ports::AgendaRepository;

    struct FirstSelector;

    impl HostSelector for FirstSelector {
        fn select(&self, candidates: &[MemberId]) -> Option<MemberId> {
            candidates.first().copied()
        }
    }

    fn service(store: &Arc<MemoryStore>) -> MeetingService {
        MeetingService::new(
            store.clone(),
            store.clone(),
            store.clone(),
            Arc::new(FirstSelector),
        )
    }

    fn member(id: i64) -> Member {
        Member::new(MemberId(id), format!("member-{id}"))
    }

    fn request(estimated: Option<TimeDelta>) -> MeetingCreateRequest {
        MeetingCreateRequest {
            title: "Weekly sync".into(),
            start_time: None,
            location: None,
            total_estimated_duration: estimated,
        }
    }

    fn member_ids(meeting: &Meeting) -> Vec<MemberId> {
        meeting.participants().iter().map(|p| p.member_id).collect()
    }

    #[tokio::test]
    async fn join_then_duplicate_join_scenario() {
        let store = Arc::new(MemoryStore::new());
        let svc = service(&store);
        let (a, b) = (member(1), member(2));

        let m = svc.create_meeting(request(None), &a).await.unwrap();
        assert_eq!(m.host_member_id(), Some(a.id));
        assert_eq!(member_ids(&m), vec![a.id]);

        let m = svc.add_participant(m.id, &b).await.unwrap();
        assert_eq!(member_ids(&m), vec![a.id, b.id]);

        let err = svc.add_participant(m.id, &b).await.unwrap_err();
        assert!(matches!(err, DomainError::DuplicateResource(_)));
        let stored = svc.find_by_id(m.id).await.unwrap();
        assert_eq!(member_ids(&stored), vec![a.id, b.id]);
    }

    #[tokio::test]
    async fn participations_reflect_the_same_records_as_the_meeting() {
        let store = Arc::new(MemoryStore::new());
        let svc = service(&store);
        let (a, b) = (member(1), member(2));

        let m1 = svc.create_meeting(request(None), &a).await.unwrap();
        let m2 = svc.create_meeting(request(None), &a).await.unwrap();
        let m1 = svc.add_participant(m1.id, &b).await.unwrap();

        let of_b = svc.participations(b.id).await.unwrap();
        assert_eq!(of_b.len(), 1);
        assert_eq!(&of_b[0], m1.participants().last().unwrap());

        let of_a: Vec<MeetingId> = svc
            .participations(a.id)
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.meeting_id)
            .collect();
        assert_eq!(of_a, vec![m1.id, m2.id]);
    }

    #[tokio::test]
    async fn concurrent_duplicate_joins_only_one_succeeds() {
        let store = Arc::new(MemoryStore::new());
        let svc = Arc::new(service(&store));
        let m = svc.create_meeting(request(None), &member(1)).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..4 {
            let svc = Arc::clone(&svc);
            let id = m.id;
            handles.push(tokio::spawn(async move {
                svc.add_participant(id, &member(2)).await
            }));
        }
        let mut ok = 0;
        for h in handles {
            match h.await.unwrap() {
                Ok(_) => ok += 1,
                Err(e) => assert!(matches!(e, DomainError::DuplicateResource(_))),
            }
        }
        assert_eq!(ok, 1);
        assert_eq!(svc.find_by_id(m.id).await.unwrap().participants().len(), 2);
    }

    #[tokio::test]
    async fn host_leaving_reassigns_and_last_leaving_empties() {
        let store = Arc::new(MemoryStore::new());
        let svc = service(&store);
        let (a, b) = (member(1), member(2));
        let m = svc.create_meeting(request(None), &a).await.unwrap();
        svc.add_participant(m.id, &b).await.unwrap();

        let m = svc.remove_participant(m.id, &a).await.unwrap();
        assert_eq!(m.host_member_id(), Some(b.id));
        assert!(svc.participations(a.id).await.unwrap().is_empty());

        let m = svc.remove_participant(m.id, &b).await.unwrap();
        assert_eq!(m.host_member_id(), None);
        assert!(m.participants().is_empty());
    }

    #[tokio::test]
    async fn unknown_meeting_is_not_found() {
        let store = Arc::new(MemoryStore::new());
        let svc = service(&store);
        for err in [
            svc.add_participant(MeetingId(77), &member(1)).await.unwrap_err(),
            svc.remove_participant(MeetingId(77), &member(1)).await.unwrap_err(),
            svc.create_report(MeetingId(77)).await.unwrap_err(),
        ] {
            assert!(matches!(err, DomainError::NotFound { resource: "Meeting", id: 77 }));
        }
    }

    #[tokio::test]
    async fn report_scenario_two_hours_vs_ninety_minutes() {
        let store = Arc::new(MemoryStore::new());
        let svc = service(&store);
        let m = svc
            .create_meeting(request(Some(TimeDelta::hours(2))), &member(1))
            .await
            .unwrap();

        // Unfinished meeting: totals incomplete.
        assert!(matches!(
            svc.create_report(m.id).await,
            Err(DomainError::Internal(_))
        ));

        svc.finish_meeting(m.id, TimeDelta::minutes(90)).await.unwrap();

        let id = AgendaRepository::next_id(store.as_ref()).await.unwrap();
        let mut done = AgendaCreateRequest {
            title: "Demo".into(),
            kind: AgendaType::Agenda,
            estimated_duration: TimeDelta::minutes(40),
        }
        .into_agenda(id, m.id)
        .unwrap();
        done.start().unwrap();
        done.complete(TimeDelta::minutes(35)).unwrap();
        AgendaRepository::save(store.as_ref(), &done).await.unwrap();

        let report = svc.create_report(m.id).await.unwrap();
        assert_eq!(report.total_diff, TimeDelta::minutes(30));
        assert_eq!(report.agendas.len(), 1);
        assert_eq!(report.agendas[0].diff, TimeDelta::minutes(5));
        assert_eq!(svc.create_report(m.id).await.unwrap(), report);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["total_diff"], "00:30");
    }

    #[tokio::test]
    async fn report_with_no_completed_agenda_items() {
        let store = Arc::new(MemoryStore::new());
        let svc = service(&store);
        let m = svc
            .create_meeting(request(Some(TimeDelta::minutes(60))), &member(1))
            .await
            .unwrap();
        svc.finish_meeting(m.id, TimeDelta::minutes(75)).await.unwrap();
        let report = svc.create_report(m.id).await.unwrap();
        assert!(report.agendas.is_empty());
        assert_eq!(report.total_diff, TimeDelta::minutes(-15));
    }
}
