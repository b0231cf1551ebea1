//! Conversations and their chat messages.
//!
//! Conversations are owner-scoped: every lookup carries the [`UserId`] of the
//! session so one reader can never observe another reader's history.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::book::Book;
use super::user::UserId;

/// Title applied when a conversation is created without one.
pub const DEFAULT_CONVERSATION_TITLE: &str = "New conversation";
/// Most recent conversations returned by a listing.
pub const CONVERSATION_LIST_LIMIT: i64 = 20;

/// Identical messages saved within this window are treated as one.
pub fn message_dedup_window() -> Duration {
    Duration::seconds(2)
}

/// Conversation identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct ConversationId(Uuid);

impl ConversationId {
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl From<Uuid> for ConversationId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ConversationId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Stored conversation header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversation {
    pub id: ConversationId,
    pub user_id: UserId,
    pub title: String,
    pub preview: String,
    pub message_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    /// Build a fresh conversation, optionally seeded with its first message.
    pub fn start(
        user_id: UserId,
        title: Option<&str>,
        first_message: Option<&str>,
        now: DateTime<Utc>,
    ) -> Self {
        let title = title
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .unwrap_or(DEFAULT_CONVERSATION_TITLE);
        let first_message = first_message.filter(|value| !value.trim().is_empty());
        Self {
            id: ConversationId::random(),
            user_id,
            title: title.to_owned(),
            preview: first_message.unwrap_or_default().to_owned(),
            message_count: i32::from(first_message.is_some()),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update applied to a conversation header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversationChanges {
    pub title: Option<String>,
    pub message_count: Option<i32>,
    pub preview: Option<String>,
}

/// Author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

impl MessageRole {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

impl FromStr for MessageRole {
    type Err = MessageValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "assistant" => Ok(Self::Assistant),
            other => Err(MessageValidationError::InvalidRole {
                value: other.to_owned(),
            }),
        }
    }
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reasons a message payload is rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageValidationError {
    MissingRole,
    InvalidRole { value: String },
    EmptyMessage,
}

impl fmt::Display for MessageValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingRole => write!(f, "role is required"),
            Self::InvalidRole { value } => {
                write!(f, "role must be user or assistant (got {value})")
            }
            Self::EmptyMessage => write!(f, "message needs content or books"),
        }
    }
}

impl std::error::Error for MessageValidationError {}

/// Stored chat message.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub id: Uuid,
    pub conversation_id: ConversationId,
    pub role: MessageRole,
    pub content: String,
    pub books: Vec<Book>,
    pub created_at: DateTime<Utc>,
}

/// Validated message ready to be stored.
#[derive(Debug, Clone, PartialEq)]
pub struct NewMessage {
    role: MessageRole,
    content: String,
    books: Vec<Book>,
}

impl NewMessage {
    /// Validate a message payload. Content may be empty when books are attached.
    ///
    /// # Examples
    /// ```
    /// use bookchat::domain::NewMessage;
    ///
    /// assert!(NewMessage::try_new(Some("user"), "hello", Vec::new()).is_ok());
    /// assert!(NewMessage::try_new(Some("assistant"), "  ", Vec::new()).is_err());
    /// assert!(NewMessage::try_new(None, "hello", Vec::new()).is_err());
    /// ```
    pub fn try_new(
        role: Option<&str>,
        content: &str,
        books: Vec<Book>,
    ) -> Result<Self, MessageValidationError> {
        let role: MessageRole = role
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or(MessageValidationError::MissingRole)?
            .parse()?;
        if content.trim().is_empty() && books.is_empty() {
            return Err(MessageValidationError::EmptyMessage);
        }
        Ok(Self {
            role,
            content: content.to_owned(),
            books,
        })
    }

    /// Construct from already-trusted parts, as the chat orchestration does.
    pub fn from_parts(role: MessageRole, content: impl Into<String>, books: Vec<Book>) -> Self {
        Self {
            role,
            content: content.into(),
            books,
        }
    }

    pub fn role(&self) -> MessageRole {
        self.role
    }

    pub fn content(&self) -> &str {
        self.content.as_str()
    }

    pub fn books(&self) -> &[Book] {
        &self.books
    }

    /// Materialise the stored record.
    pub fn into_message(self, conversation_id: ConversationId, now: DateTime<Utc>) -> Message {
        Message {
            id: Uuid::new_v4(),
            conversation_id,
            role: self.role,
            content: self.content,
            books: self.books,
            created_at: now,
        }
    }
}

/// Outcome of a deduplicating save.
#[derive(Debug, Clone, PartialEq)]
pub enum SavedMessage {
    Created(Message),
    Duplicate(Message),
}

impl SavedMessage {
    pub fn message(&self) -> &Message {
        match self {
            Self::Created(message) | Self::Duplicate(message) => message,
        }
    }

    pub fn into_message(self) -> Message {
        match self {
            Self::Created(message) | Self::Duplicate(message) => message,
        }
    }

    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::Duplicate(_))
    }
}

/// Ids of messages that repeat an earlier message of the same conversation.
///
/// Two messages are duplicates when role and content match and they were
/// created within the same wall-clock second. The earliest message of each
/// group is kept. `messages` may be in any order.
pub fn duplicate_message_ids(messages: &[Message]) -> Vec<Uuid> {
    let mut ordered: Vec<&Message> = messages.iter().collect();
    ordered.sort_by_key(|message| (message.created_at, message.id));
    let mut seen = HashSet::new();
    ordered
        .into_iter()
        .filter(|message| {
            let key = (
                message.role,
                message.content.as_str(),
                message.created_at.timestamp(),
            );
            !seen.insert(key)
        })
        .map(|message| message.id)
        .collect()
}
