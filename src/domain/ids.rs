//! Typed identifiers. Each aggregate gets its own id type so a meeting id can
//! never be passed where a timer id is expected.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> i64 {
                id.0
            }
        }
    };
}

entity_id!(
    /// Timer aggregate id.
    TimerId
);
entity_id!(
    /// Meeting aggregate id.
    MeetingId
);
entity_id!(
    /// External member identity.
    MemberId
);
entity_id!(ParticipantId);
entity_id!(AgendaId);
