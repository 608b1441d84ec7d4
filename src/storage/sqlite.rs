//! SQLite storage implementation
//!
//! Persistent storage for logins, events, and users using sqlx.

use super::*;
use crate::YellowsError;
use sqlx::{Row, SqlitePool, sqlite::SqliteRow};
use std::path::Path;

/// SQLite storage backend
pub struct SqliteStorage {
    pool: SqlitePool,
}

impl SqliteStorage {
    /// Create a new SQLite storage
    ///
    /// # Arguments
    /// * `dsn` - Database path (e.g., ".yellows/yellows.db" or ":memory:" for in-memory)
    pub async fn new(dsn: &str) -> Result<Self> {
        // Prepend sqlite: prefix if not present and add create-if-missing option
        let connection_string = if dsn.starts_with("sqlite:") {
            if dsn.contains('?') {
                dsn.to_string()
            } else {
                format!("{}?mode=rwc", dsn)
            }
        } else {
            format!("sqlite:{}?mode=rwc", dsn)
        };

        let file_path = dsn.strip_prefix("sqlite:").unwrap_or(dsn);

        // Reject path traversal in configured database paths
        if file_path.contains("..") {
            return Err(YellowsError::config(
                "Database path cannot contain '..' (path traversal not allowed)",
            ));
        }

        if file_path != ":memory:"
            && let Some(parent) = Path::new(file_path).parent()
        {
            tokio::fs::create_dir_all(parent).await?;
        }

        let pool = SqlitePool::connect(&connection_string)
            .await
            .map_err(|e| YellowsError::storage(format!("Failed to connect to SQLite: {}", e)))?;

        sqlx::query("PRAGMA journal_mode = WAL")
            .execute(&pool)
            .await?;
        sqlx::query("PRAGMA synchronous = NORMAL")
            .execute(&pool)
            .await?;
        sqlx::query("PRAGMA busy_timeout = 5000")
            .execute(&pool)
            .await?;

        sqlx::migrate!("./migrations/sqlite")
            .run(&pool)
            .await
            .map_err(|e| YellowsError::storage(format!("Failed to run migrations: {}", e)))?;

        Ok(Self { pool })
    }

    fn parse_login(row: &SqliteRow) -> Result<LoginRecord> {
        Ok(LoginRecord {
            login_id: row.try_get("login_id")?,
            scope: serde_json::from_str(&row.try_get::<String, _>("scope")?)?,
            last_login: DateTime::from_timestamp(row.try_get("last_login")?, 0)
                .unwrap_or_else(Utc::now),
        })
    }

    fn parse_event(row: &SqliteRow) -> Result<Event> {
        Ok(Event {
            short_name: row.try_get("short_name")?,
            long_name: row.try_get("long_name")?,
            starts_at: DateTime::from_timestamp(row.try_get("starts_at")?, 0)
                .unwrap_or_else(Utc::now),
            ends_at: DateTime::from_timestamp(row.try_get("ends_at")?, 0).unwrap_or_else(Utc::now),
            venue_id: row.try_get("venue_id")?,
            attendee_count: row.try_get("attendee_count")?,
            yellow_count: row.try_get("yellow_count")?,
        })
    }

    fn parse_user(row: &SqliteRow) -> Result<User> {
        Ok(User {
            nick_name: row.try_get("nick_name")?,
            full_name: row.try_get("full_name")?,
            event_count: row.try_get("event_count")?,
            achievement_score: row.try_get("achievement_score")?,
        })
    }
}

#[async_trait]
impl Storage for SqliteStorage {
    async fn put_login(&self, login: &LoginRecord) -> Result<()> {
        sqlx::query(
            "INSERT INTO logins (login_id, scope, last_login)
             VALUES (?, ?, ?)
             ON CONFLICT(login_id) DO UPDATE SET
                scope = excluded.scope,
                last_login = excluded.last_login",
        )
        .bind(&login.login_id)
        .bind(serde_json::to_string(&login.scope)?)
        .bind(login.last_login.timestamp())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_login(&self, login_id: &str) -> Result<Option<LoginRecord>> {
        let row = sqlx::query("SELECT login_id, scope, last_login FROM logins WHERE login_id = ?")
            .bind(login_id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| Self::parse_login(&r)).transpose()
    }

    async fn delete_login(&self, login_id: &str) -> Result<()> {
        sqlx::query("DELETE FROM logins WHERE login_id = ?")
            .bind(login_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn update_last_login(&self, login_id: &str, at: DateTime<Utc>) -> Result<()> {
        // Plain UPDATE is the conditional write: zero rows means the
        // record was deleted out from under us.
        let result = sqlx::query("UPDATE logins SET last_login = ? WHERE login_id = ?")
            .bind(at.timestamp())
            .bind(login_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound {
                entity: "login",
                id: login_id.to_string(),
            }
            .into());
        }
        Ok(())
    }

    async fn create_event(&self, event: &Event) -> Result<()> {
        let result = sqlx::query(
            "INSERT INTO events (short_name, long_name, starts_at, ends_at, venue_id, attendee_count, yellow_count)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&event.short_name)
        .bind(&event.long_name)
        .bind(event.starts_at.timestamp())
        .bind(event.ends_at.timestamp())
        .bind(&event.venue_id)
        .bind(event.attendee_count)
        .bind(event.yellow_count)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(StorageError::AlreadyExists {
                    entity: "event",
                    id: event.short_name.clone(),
                }
                .into())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn get_event(&self, short_name: &str) -> Result<Option<Event>> {
        let row = sqlx::query(
            "SELECT short_name, long_name, starts_at, ends_at, venue_id, attendee_count, yellow_count
             FROM events WHERE short_name = ?",
        )
        .bind(short_name)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| Self::parse_event(&r)).transpose()
    }

    async fn list_events(&self, limit: usize, start_after: Option<LastKey>) -> Result<Page<Event>> {
        // Fetch one extra row to learn whether another page exists
        let fetch = (limit + 1) as i64;
        let rows = match start_after {
            Some(key) => {
                let (starts_at, short_name) = parse_event_key(&key)?;
                sqlx::query(
                    "SELECT short_name, long_name, starts_at, ends_at, venue_id, attendee_count, yellow_count
                     FROM events
                     WHERE (starts_at, short_name) > (?, ?)
                     ORDER BY starts_at, short_name
                     LIMIT ?",
                )
                .bind(starts_at)
                .bind(short_name)
                .bind(fetch)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query(
                    "SELECT short_name, long_name, starts_at, ends_at, venue_id, attendee_count, yellow_count
                     FROM events
                     ORDER BY starts_at, short_name
                     LIMIT ?",
                )
                .bind(fetch)
                .fetch_all(&self.pool)
                .await?
            }
        };

        let mut events = rows
            .iter()
            .map(Self::parse_event)
            .collect::<Result<Vec<_>>>()?;
        let more = events.len() > limit;
        events.truncate(limit);
        let last_key = if more {
            events.last().map(event_last_key)
        } else {
            None
        };
        Ok(Page {
            items: events,
            last_key,
        })
    }

    async fn put_user(&self, user: &User) -> Result<()> {
        sqlx::query(
            "INSERT INTO users (nick_name, full_name, event_count, achievement_score, sort_key)
             VALUES (?, ?, ?, ?, ?)
             ON CONFLICT(nick_name) DO UPDATE SET
                full_name = excluded.full_name,
                event_count = excluded.event_count,
                achievement_score = excluded.achievement_score,
                sort_key = excluded.sort_key",
        )
        .bind(&user.nick_name)
        .bind(&user.full_name)
        .bind(user.event_count)
        .bind(user.achievement_score)
        .bind(format!("{:032x}", user.leaderboard_sort_key()))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_user(&self, nick_name: &str) -> Result<Option<User>> {
        let row = sqlx::query(
            "SELECT nick_name, full_name, event_count, achievement_score
             FROM users WHERE nick_name = ?",
        )
        .bind(nick_name)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| Self::parse_user(&r)).transpose()
    }

    async fn list_users(&self, limit: usize, start_after: Option<LastKey>) -> Result<Page<User>> {
        let fetch = (limit + 1) as i64;
        let rows = match start_after {
            Some(key) => {
                let sort_key = parse_user_key(&key)?;
                sqlx::query(
                    "SELECT nick_name, full_name, event_count, achievement_score
                     FROM users
                     WHERE sort_key < ?
                     ORDER BY sort_key DESC
                     LIMIT ?",
                )
                .bind(sort_key)
                .bind(fetch)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query(
                    "SELECT nick_name, full_name, event_count, achievement_score
                     FROM users
                     ORDER BY sort_key DESC
                     LIMIT ?",
                )
                .bind(fetch)
                .fetch_all(&self.pool)
                .await?
            }
        };

        let mut users = rows
            .iter()
            .map(Self::parse_user)
            .collect::<Result<Vec<_>>>()?;
        let more = users.len() > limit;
        users.truncate(limit);
        let last_key = if more { users.last().map(user_last_key) } else { None };
        Ok(Page {
            items: users,
            last_key,
        })
    }
}
