// This is the entry point of the LUME community chat front end.
//
// This file's job is to:
// 1. Load configuration
// 2. Initialize stores and services (dependency injection)
// 3. Run the send loop over stdin
//
// Commands: plain text is sent, `/status` shows the ban state,
// `/history` reprints recent messages, `/quit` exits.

use anyhow::Context;
use lume_community::config::AppConfig;
use lume_community::core::community::{
    CommunityError, CommunityMessage, CommunityService, CommunityStore, SendOutcome,
};
use lume_community::core::moderation::{
    BanStatus, Clock, ModerationGate, ModerationState, ModerationStore, ProfanityMatcher,
};
use lume_community::infra::community::{InMemoryCommunityStore, SqliteCommunityStore};
use lume_community::infra::moderation::{InMemoryModerationStore, JsonModerationStore};
use tokio::io::{AsyncBufReadExt, BufReader};

/// How many messages `/history` shows.
const HISTORY_PAGE: usize = 20;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging on stderr so it stays out of the chat on stdout
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    // Load environment variables from .env file (if it exists)
    dotenv::dotenv().ok();

    let config = AppConfig::from_env().context("Invalid LUME_* configuration")?;
    let blocklist = config.load_blocklist()?;
    tracing::info!("Loaded blocklist with {} roots", blocklist.len());

    // ========================================================================
    // DEPENDENCY INJECTION
    // ========================================================================
    // This is the "composition root" where we wire everything together.

    if config.ephemeral {
        tracing::info!("Ephemeral mode: nothing is written to disk");
        let gate = ModerationGate::new(
            InMemoryModerationStore::new(),
            blocklist,
            config.moderation.clone(),
        );
        let service = CommunityService::new(InMemoryCommunityStore::new(), gate)
            .with_history_limit(config.history_limit);
        return run_session(&service, &config.display_name).await;
    }

    // Keep runtime data in a dedicated folder so the working directory stays tidy.
    std::fs::create_dir_all(&config.data_dir).with_context(|| {
        format!(
            "Failed to create data directory {}",
            config.data_dir.display()
        )
    })?;

    let record = JsonModerationStore::new(config.moderation_record_path());
    tracing::info!("Moderation record at {}", record.path().display());

    let community_store =
        SqliteCommunityStore::connect(&config.community_db_path().to_string_lossy())
            .await
            .context("Failed to open community database")?;

    let gate = ModerationGate::new(record, blocklist, config.moderation.clone());
    let service =
        CommunityService::new(community_store, gate).with_history_limit(config.history_limit);

    run_session(&service, &config.display_name).await
}

/// Read lines from stdin and push them through the send flow until EOF or `/quit`.
async fn run_session<S, MS, M, C>(
    service: &CommunityService<S, MS, M, C>,
    author: &str,
) -> anyhow::Result<()>
where
    S: CommunityStore,
    MS: ModerationStore,
    M: ProfanityMatcher,
    C: Clock,
{
    service.ensure_seeded().await?;
    print_history(&service.history(HISTORY_PAGE).await?);

    // Restore the paused screen if a ban survived the restart
    let status = service.ban_status();
    if status.banned {
        print_status(status);
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match line.trim() {
            "" => continue,
            "/quit" => break,
            "/status" => {
                print_status(service.ban_status());
                if let ModerationState::Warned { strikes } = service.gate().state() {
                    println!(
                        "{} of {} strikes used.",
                        strikes,
                        service.gate().config().max_violations
                    );
                }
            }
            "/history" => print_history(&service.history(HISTORY_PAGE).await?),
            text => match service.send_message(author, text).await {
                Ok(outcome) => print_outcome(&outcome),
                Err(CommunityError::Moderation(e)) => {
                    tracing::error!("Failed to persist ban: {}", e);
                    println!("⚠️ Moderation state could not be saved and may reset on restart.");
                }
                Err(e) => return Err(e.into()),
            },
        }
    }

    Ok(())
}

fn print_history(messages: &[CommunityMessage]) {
    for message in messages {
        let badge = if message.is_moderator { " [mod]" } else { "" };
        println!(
            "{} {}{} ({}): {}",
            message.avatar,
            message.author,
            badge,
            message.created_at.format("%H:%M"),
            message.text
        );
    }
}

fn print_status(status: BanStatus) {
    if status.banned {
        println!(
            "⏸️ Chat paused. Access suspended for {}.",
            format_remaining(status.minutes_remaining)
        );
    } else {
        println!("✅ You can post in the community.");
    }
}

fn print_outcome(outcome: &SendOutcome) {
    match outcome {
        SendOutcome::Posted(message) => println!("👤 {}: {}", message.author, message.text),
        SendOutcome::Warned { remaining_strikes } => println!(
            "⚠️ Offensive language detected. Message not sent. {} warning{} left before a pause.",
            remaining_strikes,
            if *remaining_strikes == 1 { "" } else { "s" }
        ),
        SendOutcome::BanIssued { minutes_remaining } | SendOutcome::Banned { minutes_remaining } => {
            print_status(BanStatus::active(*minutes_remaining))
        }
    }
}

/// "~24h" for long bans, "15 min" for the last hour.
fn format_remaining(minutes: i64) -> String {
    if minutes >= 60 {
        format!("~{}h", (minutes + 59) / 60)
    } else {
        format!("{} min", minutes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_remaining() {
        assert_eq!(format_remaining(1440), "~24h");
        assert_eq!(format_remaining(61), "~2h");
        assert_eq!(format_remaining(60), "~1h");
        assert_eq!(format_remaining(1), "1 min");
    }
}
