// Runtime configuration, read from environment variables (optionally via .env).

use crate::core::community::DEFAULT_HISTORY_LIMIT;
use crate::core::moderation::{Blocklist, ModerationConfig, BAN_DURATION_HOURS, MAX_VIOLATIONS};
use anyhow::{bail, Context};
use std::path::PathBuf;

/// Longest ban the configuration accepts: one year.
const MAX_BAN_HOURS: u64 = 24 * 365;

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Directory holding moderation.json and community.db
    pub data_dir: PathBuf,
    /// Keep everything in memory (nothing written to disk)
    pub ephemeral: bool,
    pub moderation: ModerationConfig,
    pub history_limit: usize,
    /// Replaces the built-in blocklist when set
    pub blocklist_file: Option<PathBuf>,
    /// Author name for locally sent messages
    pub display_name: String,
}

impl AppConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through any key lookup.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let max_violations = parse_positive(&lookup, "LUME_MAX_VIOLATIONS", MAX_VIOLATIONS as u64)?;
        let ban_hours = parse_positive(&lookup, "LUME_BAN_HOURS", BAN_DURATION_HOURS as u64)?;
        if ban_hours > MAX_BAN_HOURS {
            bail!(
                "LUME_BAN_HOURS must be at most {}, got {}",
                MAX_BAN_HOURS,
                ban_hours
            );
        }
        let ban_duration = chrono::Duration::try_hours(ban_hours as i64)
            .context("LUME_BAN_HOURS is out of range")?;
        let history_limit =
            parse_positive(&lookup, "LUME_HISTORY_LIMIT", DEFAULT_HISTORY_LIMIT as u64)?;

        let ephemeral = match lookup("LUME_EPHEMERAL") {
            Some(v) => v
                .trim()
                .parse::<bool>()
                .with_context(|| format!("LUME_EPHEMERAL must be true or false, got {:?}", v))?,
            None => false,
        };

        Ok(Self {
            data_dir: lookup("LUME_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("data")),
            ephemeral,
            moderation: ModerationConfig {
                max_violations: u32::try_from(max_violations)
                    .context("LUME_MAX_VIOLATIONS is too large")?,
                ban_duration,
            },
            history_limit: history_limit as usize,
            blocklist_file: lookup("LUME_BLOCKLIST_FILE").map(PathBuf::from),
            display_name: lookup("LUME_DISPLAY_NAME").unwrap_or_else(|| "You".to_string()),
        })
    }

    pub fn moderation_record_path(&self) -> PathBuf {
        self.data_dir.join("moderation.json")
    }

    pub fn community_db_path(&self) -> PathBuf {
        self.data_dir.join("community.db")
    }

    /// The configured blocklist, loaded once at startup.
    pub fn load_blocklist(&self) -> anyhow::Result<Blocklist> {
        let Some(path) = &self.blocklist_file else {
            return Ok(Blocklist::default());
        };

        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read blocklist file {}", path.display()))?;
        let blocklist = Blocklist::parse(&text);
        if blocklist.is_empty() {
            bail!("Blocklist file {} has no roots", path.display());
        }
        Ok(blocklist)
    }
}

fn parse_positive<F>(lookup: &F, key: &str, default: u64) -> anyhow::Result<u64>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(key) else {
        return Ok(default);
    };

    let value = raw
        .trim()
        .parse::<u64>()
        .with_context(|| format!("{} must be a positive integer, got {:?}", key, raw))?;
    if value == 0 {
        bail!("{} must be at least 1", key);
    }
    Ok(value)
}
