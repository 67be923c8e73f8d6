//! Member: external identity. Referenced by id from meetings and participants, never owned.

use crate::domain::MemberId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub id: MemberId,
    pub nickname: String,
    /// Subject id issued by the OAuth provider.
    pub oauth_id: Option<i64>,
}

impl Member {
    pub fn new(id: MemberId, nickname: impl Into<String>) -> Self {
        Self {
            id,
            nickname: nickname.into(),
            oauth_id: None,
        }
    }

    pub fn with_oauth_id(mut self, oauth_id: i64) -> Self {
        self.oauth_id = Some(oauth_id);
        self
    }
}
