// Community domain models - messages and the outcome of a send attempt.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default number of messages kept in the community history.
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

/// A message in the shared community chat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommunityMessage {
    pub id: String,
    pub author: String,
    /// Emoji or initials shown next to the author
    pub avatar: String,
    pub text: String,
    /// Fixed flag for messages posted by the moderation team
    pub is_moderator: bool,
    /// Backend account id, when the author is signed in
    pub user_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl CommunityMessage {
    /// New message from a regular member, stamped now with a random id.
    pub fn new(author: impl Into<String>, avatar: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: new_message_id(),
            author: author.into(),
            avatar: avatar.into(),
            text: text.into(),
            is_moderator: false,
            user_id: None,
            created_at: Utc::now(),
        }
    }

    /// Welcome message pinned by the moderation team on an empty community.
    pub fn moderator_welcome() -> Self {
        Self {
            is_moderator: true,
            ..Self::new(
                "Lumi Moderator",
                "🛡️",
                "Welcome to the LUME community. Here we look after each other. \
                 Share your art, your voice or your words.",
            )
        }
    }
}

fn new_message_id() -> String {
    format!("{:016x}", rand::random::<u64>())
}

/// What happened to a send attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum SendOutcome {
    /// Message was clean and has been stored
    Posted(CommunityMessage),
    /// Offensive content: message dropped, strike recorded
    Warned { remaining_strikes: u32 },
    /// Offensive content that used the last strike: message dropped, ban issued
    BanIssued { minutes_remaining: i64 },
    /// Sender is already banned: content was never looked at
    Banned { minutes_remaining: i64 },
}

impl SendOutcome {
    pub fn is_posted(&self) -> bool {
        matches!(self, SendOutcome::Posted(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_messages_get_distinct_ids() {
        let a = CommunityMessage::new("You", "👤", "hello");
        let b = CommunityMessage::new("You", "👤", "hello");

        assert_eq!(a.id.len(), 16);
        assert_ne!(a.id, b.id);
        assert!(!a.is_moderator);
    }

    #[test]
    fn test_welcome_is_flagged_as_moderator() {
        let welcome = CommunityMessage::moderator_welcome();
        assert!(welcome.is_moderator);
        assert_eq!(welcome.author, "Lumi Moderator");
    }
}
