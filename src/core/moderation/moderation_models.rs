// Moderation domain models - data structures for the community moderation gate.
//
// These are pure domain types with no storage or UI dependencies.
// The front end decides how to present warnings and bans.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Store key holding the cumulative strike count as a decimal string.
pub const VIOLATION_COUNT_KEY: &str = "violationCount";

/// Store key holding the ban expiry as epoch milliseconds. Absent when not banned.
pub const BAN_EXPIRES_AT_KEY: &str = "banExpiresAt";

/// Strikes allowed before a ban is issued.
pub const MAX_VIOLATIONS: u32 = 3;

/// How long a ban lasts, in hours.
pub const BAN_DURATION_HOURS: i64 = 24;

/// Configuration for the progressive-ban state machine.
#[derive(Debug, Clone, PartialEq)]
pub struct ModerationConfig {
    /// Number of violations that triggers a ban
    pub max_violations: u32,
    /// How long a ban lasts once issued
    pub ban_duration: Duration,
}

impl Default for ModerationConfig {
    fn default() -> Self {
        Self {
            max_violations: MAX_VIOLATIONS, // 3 strikes...
            ban_duration: Duration::hours(BAN_DURATION_HOURS), // ...and out for a day
        }
    }
}

impl ModerationConfig {
    /// Ban length in whole minutes (what the UI shows right after a ban).
    pub fn ban_minutes(&self) -> i64 {
        self.ban_duration.num_minutes()
    }
}

/// Result of running text through the sanitizer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SanitizeResult {
    /// Tokens re-joined with single spaces, offending ones masked
    pub sanitized_text: String,
    /// Whether at least one token matched the blocklist
    pub violation_detected: bool,
}

/// Result of registering one strike.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViolationOutcome {
    pub banned: bool,
    /// Strikes left before a ban. Always 0 when `banned` is true.
    pub remaining_strikes: u32,
}

impl ViolationOutcome {
    pub fn banned() -> Self {
        Self {
            banned: true,
            remaining_strikes: 0,
        }
    }

    pub fn warned(remaining_strikes: u32) -> Self {
        Self {
            banned: false,
            remaining_strikes,
        }
    }
}

/// Result of the ban gate query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BanStatus {
    pub banned: bool,
    /// Minutes until the ban lifts, rounded up. 0 when not banned.
    pub minutes_remaining: i64,
}

impl BanStatus {
    pub fn clear() -> Self {
        Self {
            banned: false,
            minutes_remaining: 0,
        }
    }

    pub fn active(minutes_remaining: i64) -> Self {
        Self {
            banned: true,
            minutes_remaining,
        }
    }
}

/// Composed view of the moderation state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModerationState {
    /// No strikes, no ban
    Clear,
    /// Some strikes recorded, still below the ban threshold
    Warned { strikes: u32 },
    /// Submission is blocked until `expires_at`
    Banned { expires_at: DateTime<Utc> },
}

impl std::fmt::Display for ModerationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModerationState::Clear => write!(f, "Clear"),
            ModerationState::Warned { strikes } => write!(f, "Warned ({} strikes)", strikes),
            ModerationState::Banned { expires_at } => {
                write!(f, "Banned until {}", expires_at.to_rfc3339())
            }
        }
    }
}
