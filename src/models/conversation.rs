use serde::{Deserialize, Serialize};

pub const CONVERSATIONS: &str = "conversations";
pub const MESSAGES: &str = "messages";

/// Summary of the newest message, shown in conversation lists
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LastMessage {
    pub content: String,
    pub sender_id: Option<String>,
    pub timestamp: Option<String>,
}

/// Membership view of a conversation document; other fields are ignored
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Conversation {
    #[serde(default)]
    pub participants: Vec<String>,
}

impl Conversation {
    pub fn has_participant(&self, uid: &str) -> bool {
        self.participants.iter().any(|p| p == uid)
    }
}
