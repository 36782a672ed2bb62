use chrono::{ DateTime, Utc };
use serde::{ Serialize, Deserialize };

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MessageKind {
    User,
    Assistant,
    Error,
}

/// One entry of a conversation. Fields are private so a message cannot be
/// changed after the session has recorded it.
#[derive(Clone, Debug, PartialEq)]
pub struct Message {
    id: u64,
    kind: MessageKind,
    content: String,
    model: Option<String>,
    timestamp: DateTime<Utc>,
}

impl Message {
    pub fn user(id: u64, content: impl Into<String>) -> Self {
        Self::build(id, MessageKind::User, content.into(), None)
    }

    pub fn assistant(id: u64, content: impl Into<String>, model: Option<String>) -> Self {
        Self::build(id, MessageKind::Assistant, content.into(), model)
    }

    pub fn error(id: u64, content: impl Into<String>) -> Self {
        Self::build(id, MessageKind::Error, content.into(), None)
    }

    fn build(id: u64, kind: MessageKind, content: String, model: Option<String>) -> Self {
        Self {
            id,
            kind,
            content,
            model,
            timestamp: Utc::now(),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn kind(&self) -> MessageKind {
        self.kind
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct GenerateRequest {
    pub prompt: String,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct GenerateResponse {
    pub response: String,
    #[serde(default)]
    pub model_used: Option<String>,
}
