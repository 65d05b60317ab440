// Community service - the message-send flow in front of the shared chat.
//
// Every send attempt goes through the moderation gate first:
// 1. Banned? Stop before looking at the content.
// 2. Sanitize the text.
// 3. Offensive? Record a strike, drop the message.
// 4. Clean? Store it and trim the history.

use super::community_models::{CommunityMessage, SendOutcome, DEFAULT_HISTORY_LIMIT};
use crate::core::moderation::{
    BanStatus, Clock, ModerationError, ModerationGate, ModerationStore, ProfanityMatcher,
};
use async_trait::async_trait;
use thiserror::Error;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum CommunityError {
    #[error("Message is empty")]
    EmptyMessage,

    #[error("Moderation error: {0}")]
    Moderation(#[from] ModerationError),

    #[error("Storage error: {0}")]
    Storage(String),
}

// ============================================================================
// STORAGE TRAIT (PORT)
// ============================================================================

/// Where accepted messages end up (database, realtime backend, ...).
#[async_trait]
pub trait CommunityStore: Send + Sync {
    async fn post_message(&self, message: &CommunityMessage) -> Result<(), CommunityError>;

    /// The newest `limit` messages, oldest first.
    async fn recent_messages(&self, limit: usize) -> Result<Vec<CommunityMessage>, CommunityError>;

    async fn message_count(&self) -> Result<usize, CommunityError>;

    /// Drop everything but the newest `keep` messages. Returns how many were removed.
    async fn prune(&self, keep: usize) -> Result<u64, CommunityError>;
}

// ============================================================================
// CORE SERVICE
// ============================================================================

/// Community chat front door for the local member.
pub struct CommunityService<S, MS, M, C>
where
    S: CommunityStore,
    MS: ModerationStore,
    M: ProfanityMatcher,
    C: Clock,
{
    store: S,
    gate: ModerationGate<MS, M, C>,
    history_limit: usize,
}

impl<S, MS, M, C> CommunityService<S, MS, M, C>
where
    S: CommunityStore,
    MS: ModerationStore,
    M: ProfanityMatcher,
    C: Clock,
{
    pub fn new(store: S, gate: ModerationGate<MS, M, C>) -> Self {
        Self {
            store,
            gate,
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }

    /// Keep at most `limit` messages after each post (minimum 1).
    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit.max(1);
        self
    }

    pub fn gate(&self) -> &ModerationGate<MS, M, C> {
        &self.gate
    }

    /// Current ban status, used to restore the screen after a restart.
    pub fn ban_status(&self) -> BanStatus {
        self.gate.check_ban_status()
    }

    /// Try to post `text` as `author`.
    pub async fn send_message(
        &self,
        author: &str,
        text: &str,
    ) -> Result<SendOutcome, CommunityError> {
        if text.trim().is_empty() {
            return Err(CommunityError::EmptyMessage);
        }

        let status = self.gate.check_ban_status();
        if status.banned {
            tracing::debug!("Send blocked, {} minutes of ban left", status.minutes_remaining);
            return Ok(SendOutcome::Banned {
                minutes_remaining: status.minutes_remaining,
            });
        }

        let result = self.gate.sanitize(text);
        if result.violation_detected {
            let violation = self.gate.register_violation()?;
            if violation.banned {
                return Ok(SendOutcome::BanIssued {
                    minutes_remaining: self.gate.config().ban_minutes(),
                });
            }
            return Ok(SendOutcome::Warned {
                remaining_strikes: violation.remaining_strikes,
            });
        }

        let message = CommunityMessage::new(author, "👤", result.sanitized_text);
        self.store.post_message(&message).await?;

        let removed = self.store.prune(self.history_limit).await?;
        if removed > 0 {
            tracing::debug!("Pruned {} old community messages", removed);
        }

        tracing::info!("Community message {} posted by {}", message.id, author);
        Ok(SendOutcome::Posted(message))
    }

    /// The newest `limit` messages, oldest first.
    pub async fn history(&self, limit: usize) -> Result<Vec<CommunityMessage>, CommunityError> {
        self.store.recent_messages(limit).await
    }

    /// Pin the moderator welcome on an empty community. Returns true if it was inserted.
    pub async fn ensure_seeded(&self) -> Result<bool, CommunityError> {
        if self.store.message_count().await? > 0 {
            return Ok(false);
        }

        self.store
            .post_message(&CommunityMessage::moderator_welcome())
            .await?;
        Ok(true)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::moderation::{Blocklist, ModerationConfig, SystemClock};
    use crate::infra::community::InMemoryCommunityStore;
    use crate::infra::moderation::InMemoryModerationStore;

    type TestService =
        CommunityService<InMemoryCommunityStore, InMemoryModerationStore, Blocklist, SystemClock>;

    fn service() -> TestService {
        let gate = ModerationGate::new(
            InMemoryModerationStore::new(),
            Blocklist::default(),
            ModerationConfig::default(),
        );
        CommunityService::new(InMemoryCommunityStore::new(), gate)
    }

    #[tokio::test]
    async fn test_clean_message_is_posted() {
        let service = service();

        let outcome = service.send_message("You", "bom dia, pessoal").await.unwrap();

        match outcome {
            SendOutcome::Posted(message) => {
                assert_eq!(message.text, "bom dia, pessoal");
                assert_eq!(message.author, "You");
            }
            other => panic!("expected Posted, got {:?}", other),
        }
        assert_eq!(service.history(10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_offensive_message_is_dropped_with_warning() {
        let service = service();

        let outcome = service.send_message("You", "que porra é essa").await.unwrap();

        assert_eq!(outcome, SendOutcome::Warned { remaining_strikes: 2 });
        assert!(service.history(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_third_strike_bans_and_blocks_clean_content() {
        let service = service();

        service.send_message("You", "merda").await.unwrap();
        service.send_message("You", "bosta").await.unwrap();
        let outcome = service.send_message("You", "idiota").await.unwrap();
        assert_eq!(outcome, SendOutcome::BanIssued { minutes_remaining: 1440 });

        // Clean content bounces off the ban without touching the store
        let outcome = service.send_message("You", "obrigado").await.unwrap();
        assert_eq!(outcome, SendOutcome::Banned { minutes_remaining: 1440 });
        assert!(service.history(10).await.unwrap().is_empty());
        assert!(service.ban_status().banned);
    }

    #[tokio::test]
    async fn test_empty_message_is_rejected() {
        let service = service();

        let result = service.send_message("You", "   ").await;
        assert!(matches!(result, Err(CommunityError::EmptyMessage)));
    }

    #[tokio::test]
    async fn test_history_is_trimmed_after_post() {
        let service = service().with_history_limit(3);

        for i in 0..5 {
            let outcome = service
                .send_message("You", &format!("message {}", i))
                .await
                .unwrap();
            assert!(outcome.is_posted());
        }

        let history = service.history(10).await.unwrap();
        let texts: Vec<&str> = history.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["message 2", "message 3", "message 4"]);
    }

    #[tokio::test]
    async fn test_seed_only_once() {
        let service = service();

        assert!(service.ensure_seeded().await.unwrap());
        assert!(!service.ensure_seeded().await.unwrap());

        let history = service.history(10).await.unwrap();
        assert_eq!(history.len(), 1);
        assert!(history[0].is_moderator);
    }
}
