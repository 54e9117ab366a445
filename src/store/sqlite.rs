//! SQLite-based storage implementation

use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use super::{
    FeedEntry, Joke, JokeId, LoginState, Provider, Session, SessionId, SessionStore, StoreResult,
    User, UserId, UserStore, DEFAULT_SESSION_TTL_DAYS,
};
use crate::error::AppError;

/// Current schema version
const SCHEMA_VERSION: i32 = 1;

/// SQLite-based store implementing both UserStore and SessionStore
pub struct SqliteStore {
    conn: Mutex<Connection>,
    session_ttl: chrono::Duration,
}

impl SqliteStore {
    /// Open or create a SQLite database at the given path
    pub fn open(path: &str) -> Result<Self, AppError> {
        let conn = Connection::open(path).map_err(|e| AppError::Internal(e.to_string()))?;

        // Enable foreign keys
        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .map_err(|e| AppError::Internal(e.to_string()))?;

        // Run migrations
        Self::migrate(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
            session_ttl: chrono::Duration::days(DEFAULT_SESSION_TTL_DAYS),
        })
    }

    /// Override the session lifetime
    pub fn with_session_ttl(mut self, ttl: chrono::Duration) -> Self {
        self.session_ttl = ttl;
        self
    }

    /// Run database migrations
    fn migrate(conn: &Connection) -> Result<(), AppError> {
        // Check current schema version
        let current_version = Self::get_schema_version(conn)?;

        if current_version < SCHEMA_VERSION {
            tracing::info!(
                current = current_version,
                target = SCHEMA_VERSION,
                "Running database migrations"
            );

            if current_version < 1 {
                Self::migrate_v1(conn)?;
            }

            // Update schema version
            conn.execute(
                "INSERT OR REPLACE INTO schema_version (version) VALUES (?1)",
                params![SCHEMA_VERSION],
            )
            .map_err(|e| AppError::Internal(e.to_string()))?;

            tracing::info!("Database migrations complete");
        }

        Ok(())
    }

    /// Get current schema version (0 if no schema exists)
    fn get_schema_version(conn: &Connection) -> Result<i32, AppError> {
        // Check if schema_version table exists
        let table_exists: bool = conn
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
                [],
                |row| row.get(0),
            )
            .map_err(|e| AppError::Internal(e.to_string()))?;

        if !table_exists {
            return Ok(0);
        }

        conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| {
            row.get::<_, Option<i32>>(0).map(|v| v.unwrap_or(0))
        })
        .map_err(|e| AppError::Internal(e.to_string()))
    }

    /// Migration to version 1: initial schema
    fn migrate_v1(conn: &Connection) -> Result<(), AppError> {
        conn.execute_batch(
            r#"
            -- Schema version tracking
            CREATE TABLE IF NOT EXISTS schema_version (
                version INTEGER PRIMARY KEY
            );

            -- Users: local accounts carry email + password_hash, federated
            -- accounts carry the provider subject id. UNIQUE columns permit
            -- any number of NULLs.
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                email TEXT UNIQUE,
                password_hash TEXT,
                google_id TEXT UNIQUE,
                facebook_id TEXT UNIQUE,
                created_at TEXT NOT NULL
            );

            -- Jokes (many per user)
            CREATE TABLE IF NOT EXISTS jokes (
                id TEXT PRIMARY KEY,
                user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                text TEXT NOT NULL,
                liked INTEGER NOT NULL DEFAULT 0,
                flagged INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_jokes_user_id ON jokes(user_id);

            -- Sessions
            CREATE TABLE IF NOT EXISTS sessions (
                id TEXT PRIMARY KEY,
                user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                created_at TEXT NOT NULL
            );

            -- Pending OAuth logins
            CREATE TABLE IF NOT EXISTS login_states (
                token TEXT PRIMARY KEY,
                pkce_verifier TEXT NOT NULL,
                provider TEXT NOT NULL,
                created_at TEXT NOT NULL
            );
            "#,
        )
        .map_err(|e| AppError::Internal(e.to_string()))?;

        Ok(())
    }
}

fn parse_timestamp(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

fn row_to_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    let id: i64 = row.get(0)?;
    let email: Option<String> = row.get(1)?;
    let password_hash: Option<String> = row.get(2)?;
    let google_id: Option<String> = row.get(3)?;
    let facebook_id: Option<String> = row.get(4)?;
    let created_at: String = row.get(5)?;
    Ok(User {
        id: UserId(id as u64),
        email,
        password_hash,
        google_id,
        facebook_id,
        created_at: parse_timestamp(&created_at),
    })
}

fn row_to_joke(row: &rusqlite::Row<'_>) -> rusqlite::Result<Joke> {
    let id: String = row.get(0)?;
    let text: String = row.get(1)?;
    let liked: i32 = row.get(2)?;
    let flagged: i32 = row.get(3)?;
    let created_at: String = row.get(4)?;
    Ok(Joke {
        id: JokeId(id),
        text,
        liked: liked != 0,
        flagged: flagged != 0,
        created_at: parse_timestamp(&created_at),
    })
}

const USER_COLUMNS: &str = "id, email, password_hash, google_id, facebook_id, created_at";
const JOKE_COLUMNS: &str = "id, text, liked, flagged, created_at";

impl UserStore for SqliteStore {
    fn create_local_user(&self, email: &str, password_hash: &str) -> StoreResult<User> {
        let normalized = email.to_lowercase();
        let conn = self.conn.lock().unwrap();
        let now = Utc::now();

        conn.execute(
            "INSERT INTO users (email, password_hash, created_at) VALUES (?1, ?2, ?3)",
            params![normalized, password_hash, now.to_rfc3339()],
        )
        .map_err(|e| {
            if let rusqlite::Error::SqliteFailure(ref err, _) = e {
                if err.code == rusqlite::ErrorCode::ConstraintViolation {
                    return AppError::DuplicateEmail;
                }
            }
            AppError::Internal(e.to_string())
        })?;

        let id = conn.last_insert_rowid() as u64;
        Ok(User {
            id: UserId(id),
            email: Some(normalized),
            password_hash: Some(password_hash.to_string()),
            google_id: None,
            facebook_id: None,
            created_at: now,
        })
    }

    fn get_user(&self, user_id: UserId) -> StoreResult<Option<User>> {
        let conn = self.conn.lock().unwrap();

        conn.query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
            params![user_id.0 as i64],
            row_to_user,
        )
        .optional()
        .map_err(|e| AppError::Internal(e.to_string()))
    }

    fn get_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let normalized = email.to_lowercase();
        let conn = self.conn.lock().unwrap();

        conn.query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1"),
            params![normalized],
            row_to_user,
        )
        .optional()
        .map_err(|e| AppError::Internal(e.to_string()))
    }

    fn find_or_create_federated(&self, provider: Provider, subject: &str) -> StoreResult<User> {
        let conn = self.conn.lock().unwrap();
        let now = Utc::now().to_rfc3339();

        // The UNIQUE column makes the insert race-safe even across
        // processes; IGNORE keeps the existing row when another login got
        // there first, and the select reads whichever row won.
        let (insert_sql, select_sql) = match provider {
            Provider::Google => (
                "INSERT OR IGNORE INTO users (google_id, created_at) VALUES (?1, ?2)",
                "SELECT id, email, password_hash, google_id, facebook_id, created_at \
                 FROM users WHERE google_id = ?1",
            ),
            Provider::Facebook => (
                "INSERT OR IGNORE INTO users (facebook_id, created_at) VALUES (?1, ?2)",
                "SELECT id, email, password_hash, google_id, facebook_id, created_at \
                 FROM users WHERE facebook_id = ?1",
            ),
        };

        conn.execute(insert_sql, params![subject, now])
            .map_err(|e| AppError::Internal(e.to_string()))?;

        conn.query_row(select_sql, params![subject], row_to_user)
            .map_err(|e| AppError::Internal(e.to_string()))
    }

    fn list_feed(&self) -> StoreResult<Vec<FeedEntry>> {
        let conn = self.conn.lock().unwrap();

        let mut stmt = conn
            .prepare(
                "SELECT u.id, u.email, u.password_hash, u.google_id, u.facebook_id, u.created_at,
                        j.id, j.text, j.liked, j.flagged, j.created_at
                 FROM users u JOIN jokes j ON j.user_id = u.id
                 ORDER BY u.id, j.rowid",
            )
            .map_err(|e| AppError::Internal(e.to_string()))?;

        let rows = stmt
            .query_map([], |row| {
                let user = row_to_user(row)?;
                let joke_id: String = row.get(6)?;
                let text: String = row.get(7)?;
                let liked: i32 = row.get(8)?;
                let flagged: i32 = row.get(9)?;
                let created_at: String = row.get(10)?;
                let joke = Joke {
                    id: JokeId(joke_id),
                    text,
                    liked: liked != 0,
                    flagged: flagged != 0,
                    created_at: parse_timestamp(&created_at),
                };
                Ok((user, joke))
            })
            .map_err(|e| AppError::Internal(e.to_string()))?;

        // Rows arrive grouped by user, so collapse adjacent runs
        let mut feed: Vec<FeedEntry> = Vec::new();
        for row in rows {
            let (user, joke) = row.map_err(|e| AppError::Internal(e.to_string()))?;
            match feed.last_mut() {
                Some(entry) if entry.user.id == user.id => entry.jokes.push(joke),
                _ => feed.push(FeedEntry {
                    user,
                    jokes: vec![joke],
                }),
            }
        }

        Ok(feed)
    }

    fn add_joke(&self, user_id: UserId, text: &str) -> StoreResult<Joke> {
        let conn = self.conn.lock().unwrap();
        let joke = Joke {
            id: JokeId(Uuid::new_v4().to_string()),
            text: text.to_string(),
            liked: false,
            flagged: false,
            created_at: Utc::now(),
        };

        conn.execute(
            "INSERT INTO jokes (id, user_id, text, liked, flagged, created_at)
             VALUES (?1, ?2, ?3, 0, 0, ?4)",
            params![
                joke.id.0,
                user_id.0 as i64,
                joke.text,
                joke.created_at.to_rfc3339(),
            ],
        )
        .map_err(|e| AppError::Internal(e.to_string()))?;

        Ok(joke)
    }

    fn list_jokes(&self, user_id: UserId) -> StoreResult<Vec<Joke>> {
        let conn = self.conn.lock().unwrap();

        let mut stmt = conn
            .prepare(&format!(
                "SELECT {JOKE_COLUMNS} FROM jokes WHERE user_id = ?1 ORDER BY rowid"
            ))
            .map_err(|e| AppError::Internal(e.to_string()))?;

        let jokes = stmt
            .query_map(params![user_id.0 as i64], row_to_joke)
            .map_err(|e| AppError::Internal(e.to_string()))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| AppError::Internal(e.to_string()))?;

        Ok(jokes)
    }

    fn get_joke(&self, user_id: UserId, joke_id: &JokeId) -> StoreResult<Option<Joke>> {
        let conn = self.conn.lock().unwrap();

        conn.query_row(
            &format!("SELECT {JOKE_COLUMNS} FROM jokes WHERE id = ?1 AND user_id = ?2"),
            params![joke_id.0, user_id.0 as i64],
            row_to_joke,
        )
        .optional()
        .map_err(|e| AppError::Internal(e.to_string()))
    }

    fn update_joke_text(&self, user_id: UserId, joke_id: &JokeId, text: &str) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();

        // Scoping the update by owner makes a forged id from another user
        // look the same as a missing one
        let rows_affected = conn
            .execute(
                "UPDATE jokes SET text = ?1 WHERE id = ?2 AND user_id = ?3",
                params![text, joke_id.0, user_id.0 as i64],
            )
            .map_err(|e| AppError::Internal(e.to_string()))?;

        if rows_affected == 0 {
            return Err(AppError::JokeNotFound);
        }

        Ok(())
    }

    fn delete_joke(&self, user_id: UserId, joke_id: &JokeId) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();

        conn.execute(
            "DELETE FROM jokes WHERE id = ?1 AND user_id = ?2",
            params![joke_id.0, user_id.0 as i64],
        )
        .map_err(|e| AppError::Internal(e.to_string()))?;

        Ok(())
    }

    fn toggle_liked(&self, joke_id: &JokeId) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();

        conn.execute(
            "UPDATE jokes SET liked = NOT liked WHERE id = ?1",
            params![joke_id.0],
        )
        .map_err(|e| AppError::Internal(e.to_string()))?;

        Ok(())
    }

    fn toggle_flagged(&self, joke_id: &JokeId) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();

        conn.execute(
            "UPDATE jokes SET flagged = NOT flagged WHERE id = ?1",
            params![joke_id.0],
        )
        .map_err(|e| AppError::Internal(e.to_string()))?;

        Ok(())
    }

    fn create_login_state(&self, state: LoginState) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();

        conn.execute(
            "INSERT INTO login_states (token, pkce_verifier, provider, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                state.token,
                state.pkce_verifier,
                state.provider.as_str(),
                state.created_at.to_rfc3339(),
            ],
        )
        .map_err(|e| AppError::Internal(e.to_string()))?;

        Ok(())
    }

    fn take_login_state(&self, token: &str) -> StoreResult<Option<LoginState>> {
        let conn = self.conn.lock().unwrap();

        // DELETE .. RETURNING redeems the token in a single statement
        conn.query_row(
            "DELETE FROM login_states WHERE token = ?1
             RETURNING token, pkce_verifier, provider, created_at",
            params![token],
            |row| {
                let token: String = row.get(0)?;
                let pkce_verifier: String = row.get(1)?;
                let provider: String = row.get(2)?;
                let created_at: String = row.get(3)?;
                Ok(LoginState {
                    token,
                    pkce_verifier,
                    provider: Provider::from_str(&provider).unwrap_or(Provider::Google),
                    created_at: parse_timestamp(&created_at),
                })
            },
        )
        .optional()
        .map_err(|e| AppError::Internal(e.to_string()))
    }

    fn cleanup_expired_login_states(&self, max_age_minutes: i64) -> StoreResult<u64> {
        let conn = self.conn.lock().unwrap();
        let cutoff = (Utc::now() - chrono::Duration::minutes(max_age_minutes)).to_rfc3339();

        let rows_deleted = conn
            .execute(
                "DELETE FROM login_states WHERE created_at < ?1",
                params![cutoff],
            )
            .map_err(|e| AppError::Internal(e.to_string()))?;

        Ok(rows_deleted as u64)
    }
}

impl SessionStore for SqliteStore {
    fn create(&self, user_id: UserId) -> StoreResult<Session> {
        let conn = self.conn.lock().unwrap();
        let session = Session {
            id: SessionId(Uuid::new_v4().to_string()),
            user_id,
            created_at: Utc::now(),
        };

        conn.execute(
            "INSERT INTO sessions (id, user_id, created_at) VALUES (?1, ?2, ?3)",
            params![
                session.id.0,
                session.user_id.0 as i64,
                session.created_at.to_rfc3339(),
            ],
        )
        .map_err(|e| AppError::Internal(e.to_string()))?;

        Ok(session)
    }

    fn get(&self, session_id: &SessionId) -> StoreResult<Option<Session>> {
        let conn = self.conn.lock().unwrap();

        let session = conn
            .query_row(
                "SELECT id, user_id, created_at FROM sessions WHERE id = ?1",
                params![session_id.0],
                |row| {
                    let id: String = row.get(0)?;
                    let user_id: i64 = row.get(1)?;
                    let created_at: String = row.get(2)?;
                    Ok(Session {
                        id: SessionId(id),
                        user_id: UserId(user_id as u64),
                        created_at: parse_timestamp(&created_at),
                    })
                },
            )
            .optional()
            .map_err(|e| AppError::Internal(e.to_string()))?;

        if let Some(session) = &session {
            if Utc::now() - session.created_at > self.session_ttl {
                // Expired sessions are dropped on read
                conn.execute("DELETE FROM sessions WHERE id = ?1", params![session_id.0])
                    .map_err(|e| AppError::Internal(e.to_string()))?;
                return Ok(None);
            }
        }

        Ok(session)
    }

    fn delete(&self, session_id: &SessionId) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();

        conn.execute("DELETE FROM sessions WHERE id = ?1", params![session_id.0])
            .map_err(|e| AppError::Internal(e.to_string()))?;

        Ok(())
    }
}

// Implement traits for Arc<SqliteStore> so the same store can be used for both UserStore and SessionStore
impl UserStore for std::sync::Arc<SqliteStore> {
    fn create_local_user(&self, email: &str, password_hash: &str) -> StoreResult<User> {
        (**self).create_local_user(email, password_hash)
    }

    fn get_user(&self, user_id: UserId) -> StoreResult<Option<User>> {
        (**self).get_user(user_id)
    }

    fn get_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        (**self).get_user_by_email(email)
    }

    fn find_or_create_federated(&self, provider: Provider, subject: &str) -> StoreResult<User> {
        (**self).find_or_create_federated(provider, subject)
    }

    fn list_feed(&self) -> StoreResult<Vec<FeedEntry>> {
        (**self).list_feed()
    }

    fn add_joke(&self, user_id: UserId, text: &str) -> StoreResult<Joke> {
        (**self).add_joke(user_id, text)
    }

    fn list_jokes(&self, user_id: UserId) -> StoreResult<Vec<Joke>> {
        (**self).list_jokes(user_id)
    }

    fn get_joke(&self, user_id: UserId, joke_id: &JokeId) -> StoreResult<Option<Joke>> {
        (**self).get_joke(user_id, joke_id)
    }

    fn update_joke_text(&self, user_id: UserId, joke_id: &JokeId, text: &str) -> StoreResult<()> {
        (**self).update_joke_text(user_id, joke_id, text)
    }

    fn delete_joke(&self, user_id: UserId, joke_id: &JokeId) -> StoreResult<()> {
        (**self).delete_joke(user_id, joke_id)
    }

    fn toggle_liked(&self, joke_id: &JokeId) -> StoreResult<()> {
        (**self).toggle_liked(joke_id)
    }

    fn toggle_flagged(&self, joke_id: &JokeId) -> StoreResult<()> {
        (**self).toggle_flagged(joke_id)
    }

    fn create_login_state(&self, state: LoginState) -> StoreResult<()> {
        (**self).create_login_state(state)
    }

    fn take_login_state(&self, token: &str) -> StoreResult<Option<LoginState>> {
        (**self).take_login_state(token)
    }

    fn cleanup_expired_login_states(&self, max_age_minutes: i64) -> StoreResult<u64> {
        (**self).cleanup_expired_login_states(max_age_minutes)
    }
}

impl SessionStore for std::sync::Arc<SqliteStore> {
    fn create(&self, user_id: UserId) -> StoreResult<Session> {
        (**self).create(user_id)
    }

    fn get(&self, session_id: &SessionId) -> StoreResult<Option<Session>> {
        (**self).get(session_id)
    }

    fn delete(&self, session_id: &SessionId) -> StoreResult<()> {
        (**self).delete(session_id)
    }
}
