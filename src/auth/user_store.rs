//! User Storage
//! Mission: Store and verify user accounts with SQLite

use crate::auth::models::User;
use crate::error::{Error, Result};
use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::info;
use uuid::Uuid;

/// User storage with SQLite backend
pub struct UserStore {
    db_path: String,
}

impl UserStore {
    /// Create a new user store and initialize database
    pub fn new(db_path: &str) -> Result<Self> {
        let store = Self {
            db_path: db_path.to_string(),
        };
        store.init_db()?;
        Ok(store)
    }

    /// Initialize database schema
    fn init_db(&self) -> Result<()> {
        let conn = Connection::open(&self.db_path)?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                username TEXT NOT NULL,
                email TEXT UNIQUE NOT NULL,
                password_hash TEXT NOT NULL,
                created_at TEXT NOT NULL
            )",
            [],
        )?;

        Ok(())
    }

    /// Create a new account. Fails with `Conflict` when the email is taken.
    pub fn create_user(&self, username: &str, email: &str, password: &str) -> Result<User> {
        let conn = Connection::open(&self.db_path)?;

        let existing: Option<String> = conn
            .query_row(
                "SELECT id FROM users WHERE email = ?1",
                params![email],
                |row| row.get(0),
            )
            .optional()?;

        if existing.is_some() {
            return Err(Error::Conflict("Email already in use.".to_string()));
        }

        let password_hash = hash(password, DEFAULT_COST)
            .map_err(|e| Error::Internal(anyhow::anyhow!("Failed to hash password: {e}")))?;

        let user = User {
            id: Uuid::new_v4(),
            username: username.to_string(),
            email: email.to_string(),
            password_hash,
            created_at: Utc::now().to_rfc3339(),
        };

        conn.execute(
            "INSERT INTO users (id, username, email, password_hash, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                user.id.to_string(),
                user.username,
                user.email,
                user.password_hash,
                user.created_at,
            ],
        )?;

        info!("👤 Account created: {}", user.username);
        Ok(user)
    }

    /// Get user by email
    pub fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let conn = Connection::open(&self.db_path)?;

        let user = conn
            .query_row(
                "SELECT id, username, email, password_hash, created_at
                 FROM users WHERE email = ?1",
                params![email],
                |row| {
                    let id_str: String = row.get(0)?;
                    Ok(User {
                        id: Uuid::parse_str(&id_str).unwrap_or_else(|_| Uuid::nil()),
                        username: row.get(1)?,
                        email: row.get(2)?,
                        password_hash: row.get(3)?,
                        created_at: row.get(4)?,
                    })
                },
            )
            .optional()?;

        Ok(user)
    }

    /// Get user by id
    pub fn get_user_by_id(&self, id: &str) -> Result<Option<User>> {
        let conn = Connection::open(&self.db_path)?;

        let user = conn
            .query_row(
                "SELECT id, username, email, password_hash, created_at
                 FROM users WHERE id = ?1",
                params![id],
                |row| {
                    let id_str: String = row.get(0)?;
                    Ok(User {
                        id: Uuid::parse_str(&id_str).unwrap_or_else(|_| Uuid::nil()),
                        username: row.get(1)?,
                        email: row.get(2)?,
                        password_hash: row.get(3)?,
                        created_at: row.get(4)?,
                    })
                },
            )
            .optional()?;

        Ok(user)
    }

    /// Verify credentials, returning the user on success
    pub fn verify_password(&self, email: &str, password: &str) -> Result<Option<User>> {
        let Some(user) = self.get_user_by_email(email)? else {
            return Ok(None);
        };

        let valid = verify(password, &user.password_hash)
            .map_err(|e| Error::Internal(anyhow::anyhow!("Failed to verify password: {e}")))?;

        Ok(valid.then_some(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_store() -> (UserStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("users.db");
        let store = UserStore::new(path.to_str().unwrap()).unwrap();
        (store, dir)
    }

    #[test]
    fn create_and_fetch_user() {
        let (store, _dir) = test_store();
        let created = store
            .create_user("alice", "alice@example.com", "hunter22")
            .unwrap();

        let fetched = store
            .get_user_by_email("alice@example.com")
            .unwrap()
            .unwrap();
        assert_eq!(fetched.id, created.id);
        assert_eq!(fetched.username, "alice");
    }

    #[test]
    fn duplicate_email_is_conflict() {
        let (store, _dir) = test_store();
        store
            .create_user("alice", "alice@example.com", "hunter22")
            .unwrap();

        let err = store
            .create_user("alice2", "alice@example.com", "other-pass")
            .unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
    }

    #[test]
    fn verify_password_accepts_correct_and_rejects_wrong() {
        let (store, _dir) = test_store();
        store
            .create_user("alice", "alice@example.com", "hunter22")
            .unwrap();

        assert!(store
            .verify_password("alice@example.com", "hunter22")
            .unwrap()
            .is_some());
        assert!(store
            .verify_password("alice@example.com", "wrong")
            .unwrap()
            .is_none());
        assert!(store
            .verify_password("nobody@example.com", "hunter22")
            .unwrap()
            .is_none());
    }
}
