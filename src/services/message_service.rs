use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{debug, info};

use super::{missing, ServiceError, ServiceResult};
use crate::models::conversation::{Conversation, LastMessage, CONVERSATIONS, MESSAGES};
use crate::models::message::{excerpt, MessageDocument, MessageType, SendMessageRequest, PREVIOUS_MESSAGE_PLACEHOLDER};
use crate::models::{format_timestamp, to_document};
use crate::store::{CollectionPath, Direction, Document, DocumentData, DocumentPath, DocumentStore, Query};

/// Messaging inside conversations the caller participates in
pub struct MessageService {
    store: Arc<dyn DocumentStore>,
}

impl MessageService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Stores a new message and refreshes the conversation summary.
    ///
    /// The message write and the summary update are two separate document
    /// writes; a failure in between leaves the message without a summary.
    pub async fn send(&self, caller: &str, payload: &Value, now: DateTime<Utc>) -> ServiceResult<MessageDocument> {
        let request: SendMessageRequest = serde_json::from_value(payload.clone())
            .map_err(|e| ServiceError::InvalidInput(format!("invalid message body: {}", e)))?;

        let absent = missing(&[
            ("conversationId", request.conversation_id.as_deref()),
            ("type", request.kind.as_deref()),
            ("content", request.content.as_deref()),
        ]);
        if !absent.is_empty() {
            return Err(ServiceError::MissingFields(absent));
        }

        let raw_kind = request.kind.as_deref().unwrap_or_default();
        let kind = MessageType::parse(raw_kind)
            .ok_or_else(|| ServiceError::InvalidInput(format!("unknown message type '{}'", raw_kind)))?;
        let conversation_id = request.conversation_id.unwrap_or_default();

        let conversation_path = self.participant_conversation(caller, &conversation_id).await?;
        let messages = conversation_path.subcollection(MESSAGES)?;
        let id = self.store.new_id();

        let message = MessageDocument {
            id: id.clone(),
            sender_id: caller.to_string(),
            conversation_id: conversation_id.clone(),
            kind,
            content: request.content.unwrap_or_default(),
            read_by: vec![caller.to_string()],
            created_at: now,
            attachments: request.attachments,
        };

        self.store.set(&messages.doc(&id)?, to_document(&message)?).await?;

        let mut summary = DocumentData::new();
        summary.insert("lastMessage".into(), serde_json::to_value(message.summary())?);
        summary.insert("lastActivity".into(), Value::String(format_timestamp(now)));
        self.store.update(&conversation_path, summary).await?;

        info!("Message {} sent to conversation {} by {}", id, conversation_id, caller);
        Ok(message)
    }

    /// Deletes the caller's own message and recomputes the conversation summary
    /// from the newest remaining message
    pub async fn delete(&self, caller: &str, conversation_id: &str, message_id: &str) -> ServiceResult<()> {
        let conversation_path = self.participant_conversation(caller, conversation_id).await?;
        let messages = conversation_path.subcollection(MESSAGES)?;
        let message_path = messages.doc(message_id)?;

        let message = self
            .store
            .get(&message_path)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Message not found".into()))?;

        if message.get_str("senderId") != Some(caller) {
            return Err(ServiceError::Forbidden("Only the sender can delete this message".into()));
        }

        self.store.delete(&message_path).await?;

        let newest = Query::new().order_by("createdAt", Direction::Desc).limit(1);
        let remaining = self.store.query(&messages, &newest).await?;
        let last_message = match remaining.first() {
            Some(doc) => serde_json::to_value(replacement_summary(doc))?,
            None => Value::Null,
        };

        let mut summary = DocumentData::new();
        summary.insert("lastMessage".into(), last_message);
        self.store.update(&conversation_path, summary).await?;

        info!("Message {} deleted from conversation {} by {}", message_id, conversation_id, caller);
        Ok(())
    }

    /// Resolves the conversation and checks that `caller` belongs to it
    async fn participant_conversation(&self, caller: &str, conversation_id: &str) -> ServiceResult<DocumentPath> {
        let path = CollectionPath::root(CONVERSATIONS)?
            .doc(conversation_id)
            .map_err(|_| ServiceError::InvalidInput(format!("invalid conversationId '{}'", conversation_id)))?;

        let doc = self
            .store
            .get(&path)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Conversation not found".into()))?;

        let conversation: Conversation = serde_json::from_value(Value::Object(doc.data))?;
        if !conversation.has_participant(caller) {
            debug!("{} is not a participant of {}", caller, conversation_id);
            return Err(ServiceError::Forbidden("Not a participant of this conversation".into()));
        }
        Ok(path)
    }
}

/// Summary describing a message that is already in the store
fn replacement_summary(doc: &Document) -> LastMessage {
    let content = match doc.get_str("type") {
        Some("user") => excerpt(doc.get_str("content").unwrap_or_default()),
        _ => PREVIOUS_MESSAGE_PLACEHOLDER.to_string(),
    };
    LastMessage {
        content,
        sender_id: doc.get_str("senderId").map(str::to_string),
        timestamp: doc.get_str("createdAt").map(str::to_string),
    }
}
