// SQLite-backed community store for the shared message history.
//
// Tables:
// - community_messages: Posted messages, newest kept up to the history limit

use crate::core::community::{CommunityError, CommunityMessage, CommunityStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Pool, Row, Sqlite};
use std::path::Path;

pub struct SqliteCommunityStore {
    pool: Pool<Sqlite>,
}

impl SqliteCommunityStore {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    /// Open (creating if needed) the database file and run migrations.
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        // Ensure the file exists if it's a file path
        let path_str = database_url.trim_start_matches("sqlite://");
        if !database_url.contains(":memory:") && !Path::new(path_str).exists() {
            if let Some(parent) = Path::new(path_str).parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::File::create(path_str)?;
        }

        let conn_str = if database_url.starts_with("sqlite:") {
            database_url.to_string()
        } else {
            format!("sqlite://{}", database_url)
        };

        let pool = SqlitePoolOptions::new().connect(&conn_str).await?;

        let store = Self::new(pool);
        store.migrate().await?;
        Ok(store)
    }

    /// Run database migrations to create required tables.
    pub async fn migrate(&self) -> Result<(), CommunityError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS community_messages (
                id TEXT PRIMARY KEY,
                author TEXT NOT NULL,
                avatar TEXT NOT NULL,
                text TEXT NOT NULL,
                is_moderator BOOLEAN NOT NULL DEFAULT 0,
                user_id TEXT,
                created_at INTEGER NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_community_messages_created
                ON community_messages(created_at);
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| CommunityError::Storage(e.to_string()))?;

        Ok(())
    }
}

#[async_trait]
impl CommunityStore for SqliteCommunityStore {
    async fn post_message(&self, message: &CommunityMessage) -> Result<(), CommunityError> {
        sqlx::query(
            r#"
            INSERT INTO community_messages (id, author, avatar, text, is_moderator, user_id, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&message.id)
        .bind(&message.author)
        .bind(&message.avatar)
        .bind(&message.text)
        .bind(message.is_moderator)
        .bind(&message.user_id)
        .bind(message.created_at.timestamp_millis())
        .execute(&self.pool)
        .await
        .map_err(|e| CommunityError::Storage(e.to_string()))?;
        Ok(())
    }

    async fn recent_messages(&self, limit: usize) -> Result<Vec<CommunityMessage>, CommunityError> {
        let rows = sqlx::query(
            r#"
            SELECT id, author, avatar, text, is_moderator, user_id, created_at
            FROM community_messages
            ORDER BY created_at DESC, rowid DESC
            LIMIT ?
            "#,
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| CommunityError::Storage(e.to_string()))?;

        let mut messages = Vec::with_capacity(rows.len());
        for row in rows {
            let created_at_ms: i64 = row.get("created_at");
            let created_at =
                DateTime::<Utc>::from_timestamp_millis(created_at_ms).unwrap_or_else(Utc::now);

            messages.push(CommunityMessage {
                id: row.get("id"),
                author: row.get("author"),
                avatar: row.get("avatar"),
                text: row.get("text"),
                is_moderator: row.get("is_moderator"),
                user_id: row.get("user_id"),
                created_at,
            });
        }

        // Newest first from the query; callers want reading order
        messages.reverse();
        Ok(messages)
    }

    async fn message_count(&self) -> Result<usize, CommunityError> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM community_messages")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| CommunityError::Storage(e.to_string()))?;

        let count: i64 = row.get("count");
        Ok(count as usize)
    }

    async fn prune(&self, keep: usize) -> Result<u64, CommunityError> {
        let result = sqlx::query(
            r#"
            DELETE FROM community_messages
            WHERE rowid NOT IN (
                SELECT rowid FROM community_messages
                ORDER BY created_at DESC, rowid DESC
                LIMIT ?
            )
            "#,
        )
        .bind(keep as i64)
        .execute(&self.pool)
        .await
        .map_err(|e| CommunityError::Storage(e.to_string()))?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    async fn memory_store() -> SqliteCommunityStore {
        // One connection: every new :memory: connection is a fresh database
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        let store = SqliteCommunityStore::new(pool);
        store.migrate().await.unwrap();
        store
    }

    fn message_at(text: &str, offset_secs: i64) -> CommunityMessage {
        CommunityMessage {
            created_at: Utc::now() + Duration::seconds(offset_secs),
            ..CommunityMessage::new("Viajante", "🌿", text)
        }
    }

    #[tokio::test]
    async fn test_post_and_read_back() {
        let store = memory_store().await;

        let mut welcome = CommunityMessage::moderator_welcome();
        welcome.user_id = Some("mod-1".to_string());
        store.post_message(&welcome).await.unwrap();
        store.post_message(&message_at("oi", 1)).await.unwrap();

        let messages = store.recent_messages(10).await.unwrap();
        assert_eq!(messages.len(), 2);
        assert!(messages[0].is_moderator);
        assert_eq!(messages[0].user_id.as_deref(), Some("mod-1"));
        assert_eq!(messages[0].id, welcome.id);
        assert_eq!(
            messages[0].created_at.timestamp_millis(),
            welcome.created_at.timestamp_millis()
        );
        assert_eq!(messages[1].text, "oi");
        assert_eq!(store.message_count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_recent_messages_limit_keeps_newest() {
        let store = memory_store().await;
        for i in 0..4 {
            store
                .post_message(&message_at(&format!("m{}", i), i))
                .await
                .unwrap();
        }

        let texts: Vec<String> = store
            .recent_messages(2)
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.text)
            .collect();
        assert_eq!(texts, vec!["m2".to_string(), "m3".to_string()]);
    }

    #[tokio::test]
    async fn test_prune_keeps_newest() {
        let store = memory_store().await;
        for i in 0..5 {
            store
                .post_message(&message_at(&format!("m{}", i), i))
                .await
                .unwrap();
        }

        assert_eq!(store.prune(3).await.unwrap(), 2);
        assert_eq!(store.prune(3).await.unwrap(), 0);

        let texts: Vec<String> = store
            .recent_messages(10)
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.text)
            .collect();
        assert_eq!(texts, vec!["m2", "m3", "m4"]);
    }

    #[tokio::test]
    async fn test_connect_creates_database_file() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("nested").join("community.db");

        let store = SqliteCommunityStore::connect(db_path.to_str().unwrap())
            .await
            .unwrap();
        store.post_message(&message_at("persisted", 0)).await.unwrap();

        assert!(db_path.exists());
        assert_eq!(store.message_count().await.unwrap(), 1);
    }
}
