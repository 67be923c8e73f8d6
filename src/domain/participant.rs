//! Participant: join record between one meeting and one member.
//!
//! The meeting owns these by value. A member's participations are a query
//! over participant records, not a back-pointer.

use crate::domain::{MeetingId, MemberId, ParticipantId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    pub meeting_id: MeetingId,
    pub member_id: MemberId,
}

impl Participant {
    pub fn new(id: ParticipantId, meeting_id: MeetingId, member_id: MemberId) -> Self {
        Self {
            id,
            meeting_id,
            member_id,
        }
    }
}
