// Moderation gate - core business logic for community content moderation.
//
// This service handles:
// - Sanitizing outgoing messages against the blocklist
// - Counting strikes for the local actor
// - Issuing a time-boxed ban once the strike threshold is reached
// - Lifting the ban lazily, the next time someone asks
//
// NO storage or UI dependencies here - just pure domain logic.

use super::moderation_models::{
    BanStatus, ModerationConfig, ModerationState, SanitizeResult, ViolationOutcome,
    BAN_EXPIRES_AT_KEY, VIOLATION_COUNT_KEY,
};
use super::profanity_matcher::{self, ProfanityMatcher};
use chrono::{DateTime, Utc};
use thiserror::Error;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum ModerationError {
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Malformed stored value for {key}: {value:?}")]
    MalformedStoredValue { key: String, value: String },

    #[error("Ban expiry out of range: {0}")]
    BanOutOfRange(String),
}

// ============================================================================
// PORTS
// ============================================================================

/// Synchronous key-value persistence for the moderation record.
///
/// The record is scoped to one local actor, so there is no user id in the
/// signature and no concurrent writer to worry about. A multi-user backend
/// would need a per-identity store with an atomic read-modify-write.
pub trait ModerationStore: Send + Sync {
    /// Read a value. `Ok(None)` when the key was never set.
    fn get(&self, key: &str) -> Result<Option<String>, ModerationError>;

    fn set(&self, key: &str, value: &str) -> Result<(), ModerationError>;

    /// Delete a key. Deleting a missing key is not an error.
    fn remove(&self, key: &str) -> Result<(), ModerationError>;
}

/// Wall clock, injectable so tests can move time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// The real clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

// ============================================================================
// CORE SERVICE
// ============================================================================

/// Gate every community submission passes through.
///
/// Call order for a send attempt:
/// 1. [`check_ban_status`](Self::check_ban_status) - abort if banned
/// 2. [`sanitize`](Self::sanitize)
/// 3. on a violation, [`register_violation`](Self::register_violation) and drop the message
pub struct ModerationGate<S, M, C = SystemClock>
where
    S: ModerationStore,
    M: ProfanityMatcher,
    C: Clock,
{
    store: S,
    matcher: M,
    config: ModerationConfig,
    clock: C,
}

impl<S, M> ModerationGate<S, M, SystemClock>
where
    S: ModerationStore,
    M: ProfanityMatcher,
{
    /// Create a gate driven by the system clock.
    pub fn new(store: S, matcher: M, config: ModerationConfig) -> Self {
        Self::with_clock(store, matcher, config, SystemClock)
    }
}

impl<S, M, C> ModerationGate<S, M, C>
where
    S: ModerationStore,
    M: ProfanityMatcher,
    C: Clock,
{
    pub fn with_clock(store: S, matcher: M, config: ModerationConfig, clock: C) -> Self {
        Self {
            store,
            matcher,
            config,
            clock,
        }
    }

    pub fn config(&self) -> &ModerationConfig {
        &self.config
    }

    /// Mask offending tokens. Pure - reads and writes no state.
    pub fn sanitize(&self, text: &str) -> SanitizeResult {
        profanity_matcher::sanitize(&self.matcher, text)
    }

    /// Record one strike. Issues a ban when the threshold is reached.
    ///
    /// Only fails when the ban itself could not be persisted, so the caller
    /// can warn that moderation state may not survive a restart.
    pub fn register_violation(&self) -> Result<ViolationOutcome, ModerationError> {
        let new_count = self.read_violation_count().saturating_add(1);

        if let Err(e) = self.store.set(VIOLATION_COUNT_KEY, &new_count.to_string()) {
            tracing::warn!("Failed to persist violation count {}: {}", new_count, e);
        }

        if new_count >= self.config.max_violations {
            let now = self.clock.now();
            let expires_at = now
                .checked_add_signed(self.config.ban_duration)
                .ok_or_else(|| {
                    ModerationError::BanOutOfRange(format!(
                        "{} + {} minutes",
                        now.to_rfc3339(),
                        self.config.ban_minutes()
                    ))
                })?;
            self.store.set(
                BAN_EXPIRES_AT_KEY,
                &expires_at.timestamp_millis().to_string(),
            )?;

            tracing::info!(
                "Ban issued after {} violations, expires at {}",
                new_count,
                expires_at.to_rfc3339()
            );
            return Ok(ViolationOutcome::banned());
        }

        let remaining = self.config.max_violations - new_count;
        tracing::warn!(
            "Violation {}/{} registered, {} strike(s) remaining",
            new_count,
            self.config.max_violations,
            remaining
        );
        Ok(ViolationOutcome::warned(remaining))
    }

    /// Is submission currently blocked?
    ///
    /// An expired ban is cleared here, together with the strike count, so
    /// expiry is a full amnesty and nobody needs a cleanup pass.
    pub fn check_ban_status(&self) -> BanStatus {
        let Some(expires_at) = self.read_ban_expiry() else {
            return BanStatus::clear();
        };

        let now = self.clock.now();
        if expires_at <= now {
            self.lift_ban();
            return BanStatus::clear();
        }

        BanStatus::active(minutes_remaining(expires_at, now))
    }

    /// Where the local actor sits in the Clear -> Warned -> Banned cycle.
    /// Runs the lazy-expiry check first.
    pub fn state(&self) -> ModerationState {
        if self.check_ban_status().banned {
            if let Some(expires_at) = self.read_ban_expiry() {
                return ModerationState::Banned { expires_at };
            }
        }

        // Without a ban the count stays below the threshold, even if the ban
        // write failed or its expiry was unreadable
        let ceiling = self.config.max_violations.saturating_sub(1);
        match self.read_violation_count().min(ceiling) {
            0 => ModerationState::Clear,
            strikes => ModerationState::Warned { strikes },
        }
    }

    fn lift_ban(&self) {
        tracing::debug!("Ban expired, clearing moderation record");

        if let Err(e) = self.store.remove(BAN_EXPIRES_AT_KEY) {
            tracing::warn!("Failed to clear expired ban: {}", e);
        }
        if let Err(e) = self.store.set(VIOLATION_COUNT_KEY, "0") {
            tracing::warn!("Failed to reset violation count: {}", e);
        }
    }

    /// Strike count, degrading to 0 on unreadable or corrupted storage.
    fn read_violation_count(&self) -> u32 {
        let raw = match self.store.get(VIOLATION_COUNT_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return 0,
            Err(e) => {
                tracing::warn!("Failed to read violation count, assuming 0: {}", e);
                return 0;
            }
        };

        parse_stored(VIOLATION_COUNT_KEY, &raw).unwrap_or_else(|e| {
            tracing::warn!("{}, assuming 0", e);
            0
        })
    }

    /// Ban expiry, degrading to "not banned" on unreadable or corrupted storage.
    fn read_ban_expiry(&self) -> Option<DateTime<Utc>> {
        let raw = match self.store.get(BAN_EXPIRES_AT_KEY) {
            Ok(raw) => raw?,
            Err(e) => {
                tracing::warn!("Failed to read ban expiry, assuming not banned: {}", e);
                return None;
            }
        };

        let parsed = parse_stored::<i64>(BAN_EXPIRES_AT_KEY, &raw).and_then(|millis| {
            DateTime::from_timestamp_millis(millis).ok_or_else(|| {
                ModerationError::MalformedStoredValue {
                    key: BAN_EXPIRES_AT_KEY.to_string(),
                    value: raw.clone(),
                }
            })
        });

        match parsed {
            Ok(expires_at) => Some(expires_at),
            Err(e) => {
                tracing::warn!("{}, assuming not banned", e);
                None
            }
        }
    }
}

fn parse_stored<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T, ModerationError> {
    raw.trim()
        .parse::<T>()
        .map_err(|_| ModerationError::MalformedStoredValue {
            key: key.to_string(),
            value: raw.to_string(),
        })
}

/// Whole minutes until `expires_at`, rounded up so an active ban never reads 0.
fn minutes_remaining(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    const MILLIS_PER_MINUTE: i64 = 60_000;
    let millis = (expires_at - now).num_milliseconds();
    (millis + MILLIS_PER_MINUTE - 1) / MILLIS_PER_MINUTE
}

// ============================================================================
// TESTS
// ============================================================================
