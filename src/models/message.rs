use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::conversation::LastMessage;

/// Longest `lastMessage.content` excerpt, in characters
pub const SUMMARY_MAX_CHARS: usize = 100;
pub const NEW_MESSAGE_PLACEHOLDER: &str = "Nouveau message";
pub const PREVIOUS_MESSAGE_PLACEHOLDER: &str = "Message précédent";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    User,
    Establishment,
    Mission,
    Notification,
}

impl MessageType {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "user" => Some(MessageType::User),
            "establishment" => Some(MessageType::Establishment),
            "mission" => Some(MessageType::Mission),
            "notification" => Some(MessageType::Notification),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::User => "user",
            MessageType::Establishment => "establishment",
            MessageType::Mission => "mission",
            MessageType::Notification => "notification",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentType {
    Image,
    Document,
    Pdf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    #[serde(rename = "type")]
    pub kind: AttachmentType,
    pub url: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

/// Body of `POST /send_message`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    pub conversation_id: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub content: Option<String>,
    pub attachments: Option<Vec<Attachment>>,
}

/// Stored under `conversations/{conversationId}/messages/{id}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageDocument {
    pub id: String,
    pub sender_id: String,
    pub conversation_id: String,
    #[serde(rename = "type")]
    pub kind: MessageType,
    pub content: String,
    pub read_by: Vec<String>,
    #[serde(with = "super::timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachments: Option<Vec<Attachment>>,
}

/// First `SUMMARY_MAX_CHARS` characters of `content`
pub fn excerpt(content: &str) -> String {
    content.chars().take(SUMMARY_MAX_CHARS).collect()
}

impl MessageDocument {
    /// Conversation summary written right after this message is sent
    pub fn summary(&self) -> LastMessage {
        let content = match self.kind {
            MessageType::User => excerpt(&self.content),
            _ => NEW_MESSAGE_PLACEHOLDER.to_string(),
        };
        LastMessage {
            content,
            sender_id: Some(self.sender_id.clone()),
            timestamp: Some(super::format_timestamp(self.created_at)),
        }
    }
}
