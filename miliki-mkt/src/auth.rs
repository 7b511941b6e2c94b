//! Session authentication
//!
//! Sign-up/sign-in/sign-out plus a current-user lookup keyed by a bearer
//! token. Passwords are stored as salted SHA-256 hashes; sessions expire
//! after the configured timeout and an expired token reads as signed-out.

use crate::error::{Error, Result};
use chrono::{DateTime, Duration, Utc};
use miliki_common::db::settings::get_setting;
use miliki_common::db::{Session, User};
use sha2::{Digest, Sha256};
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

const DEFAULT_SESSION_TIMEOUT_SECONDS: i64 = 31_536_000; // 1 year

/// Hash a password with the given salt (hex-encoded SHA-256)
fn hash_password(password: &str, salt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

fn generate_salt() -> String {
    use rand::Rng;
    let bytes: [u8; 16] = rand::thread_rng().gen();
    hex::encode(bytes)
}

/// Register a new user
pub async fn sign_up(db: &SqlitePool, email: &str, password: &str) -> Result<User> {
    if email.is_empty() || !email.contains('@') {
        return Err(Error::BadRequest("A valid email address is required".to_string()));
    }
    if password.len() < 6 {
        return Err(Error::BadRequest(
            "Password must be at least 6 characters".to_string(),
        ));
    }

    let guid = Uuid::new_v4().to_string();
    let salt = generate_salt();
    let password_hash = hash_password(password, &salt);
    let created_at = Utc::now();

    let result = sqlx::query(
        r#"
        INSERT INTO users (guid, email, password_hash, password_salt, created_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(&guid)
    .bind(email)
    .bind(&password_hash)
    .bind(&salt)
    .bind(created_at)
    .execute(db)
    .await;

    if let Err(e) = result {
        return Err(match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                Error::BadRequest("Email is already registered".to_string())
            }
            other => Error::Database(other),
        });
    }

    info!("Registered user {}", email);

    Ok(User {
        guid,
        email: email.to_string(),
        password_hash,
        password_salt: salt,
        display_name: None,
        created_at,
    })
}

/// Sign in with email and password, returning a new session
pub async fn sign_in(db: &SqlitePool, email: &str, password: &str) -> Result<Session> {
    let row: Option<(String, String, String)> =
        sqlx::query_as("SELECT guid, password_hash, password_salt FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(db)
            .await?;

    let (user_id, stored_hash, salt) = match row {
        Some(row) => row,
        None => return Err(Error::BadRequest("Invalid email or password".to_string())),
    };

    if hash_password(password, &salt) != stored_hash {
        return Err(Error::BadRequest("Invalid email or password".to_string()));
    }

    let timeout_seconds = get_setting::<i64>(db, "session_timeout_seconds")
        .await?
        .unwrap_or(DEFAULT_SESSION_TIMEOUT_SECONDS);

    let token = Uuid::new_v4().to_string();
    let created_at = Utc::now();
    let expires_at = created_at + Duration::seconds(timeout_seconds);

    sqlx::query(
        "INSERT INTO sessions (token, user_id, created_at, expires_at) VALUES (?, ?, ?, ?)",
    )
    .bind(&token)
    .bind(&user_id)
    .bind(created_at)
    .bind(expires_at)
    .execute(db)
    .await?;

    debug!("Opened session for user {}", user_id);

    Ok(Session {
        token,
        user_id,
        created_at,
        expires_at,
    })
}

/// Terminate a session. Unknown tokens are a no-op.
pub async fn sign_out(db: &SqlitePool, token: &str) -> Result<()> {
    sqlx::query("DELETE FROM sessions WHERE token = ?")
        .bind(token)
        .execute(db)
        .await?;
    Ok(())
}

/// Resolve the signed-in user for a token.
///
/// Returns None for unknown or expired tokens ("signed out" is not an
/// error); expired sessions are removed on sight.
pub async fn current_user(db: &SqlitePool, token: &str) -> Result<Option<User>> {
    let row: Option<(String, String, String, Option<String>, DateTime<Utc>, DateTime<Utc>)> =
        sqlx::query_as(
            r#"
            SELECT u.guid, u.email, u.password_hash, u.display_name, u.created_at, s.expires_at
            FROM sessions s
            JOIN users u ON u.guid = s.user_id
            WHERE s.token = ?
            "#,
        )
        .bind(token)
        .fetch_optional(db)
        .await?;

    let (guid, email, password_hash, display_name, created_at, expires_at) = match row {
        Some(row) => row,
        None => return Ok(None),
    };

    if expires_at < Utc::now() {
        sign_out(db, token).await?;
        return Ok(None);
    }

    Ok(Some(User {
        guid,
        email,
        password_hash,
        password_salt: String::new(),
        display_name,
        created_at,
    }))
}

/// Resolve the signed-in user or fail with AuthRequired.
pub async fn require_user(db: &SqlitePool, token: Option<&str>) -> Result<User> {
    let token = token.ok_or(Error::AuthRequired)?;
    current_user(db, token).await?.ok_or(Error::AuthRequired)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn setup_test_db() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .connect("sqlite::memory:")
            .await
            .unwrap();
        miliki_common::db::init::create_schema(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn sign_up_then_sign_in() {
        let db = setup_test_db().await;

        let user = sign_up(&db, "artist@example.com", "secret1").await.unwrap();
        let session = sign_in(&db, "artist@example.com", "secret1").await.unwrap();
        assert_eq!(session.user_id, user.guid);

        let me = current_user(&db, &session.token).await.unwrap().unwrap();
        assert_eq!(me.email, "artist@example.com");
    }

    #[tokio::test]
    async fn wrong_password_is_rejected() {
        let db = setup_test_db().await;

        sign_up(&db, "artist@example.com", "secret1").await.unwrap();
        let err = sign_in(&db, "artist@example.com", "wrong").await.unwrap_err();
        assert!(matches!(err, Error::BadRequest(_)));
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let db = setup_test_db().await;

        sign_up(&db, "artist@example.com", "secret1").await.unwrap();
        let err = sign_up(&db, "artist@example.com", "secret2").await.unwrap_err();
        assert!(matches!(err, Error::BadRequest(_)));
    }

    #[tokio::test]
    async fn pool_failure_is_not_reported_as_duplicate_email() {
        let db = setup_test_db().await;
        db.close().await;

        let err = sign_up(&db, "artist@example.com", "secret1").await.unwrap_err();
        assert!(matches!(err, Error::Database(_)));
    }

    #[tokio::test]
    async fn sign_out_invalidates_token() {
        let db = setup_test_db().await;

        sign_up(&db, "artist@example.com", "secret1").await.unwrap();
        let session = sign_in(&db, "artist@example.com", "secret1").await.unwrap();

        sign_out(&db, &session.token).await.unwrap();
        let me = current_user(&db, &session.token).await.unwrap();
        assert!(me.is_none());
    }

    #[tokio::test]
    async fn expired_session_reads_as_signed_out() {
        let db = setup_test_db().await;

        sign_up(&db, "artist@example.com", "secret1").await.unwrap();

        // Insert a session already past its expiry
        let expired_at = Utc::now() - Duration::seconds(10);
        let user_id: String = sqlx::query_scalar("SELECT guid FROM users LIMIT 1")
            .fetch_one(&db)
            .await
            .unwrap();
        sqlx::query(
            "INSERT INTO sessions (token, user_id, created_at, expires_at) VALUES ('stale', ?, ?, ?)",
        )
        .bind(&user_id)
        .bind(expired_at)
        .bind(expired_at)
        .execute(&db)
        .await
        .unwrap();

        let me = current_user(&db, "stale").await.unwrap();
        assert!(me.is_none());
    }

    #[tokio::test]
    async fn require_user_without_token_is_auth_required() {
        let db = setup_test_db().await;
        let err = require_user(&db, None).await.unwrap_err();
        assert!(matches!(err, Error::AuthRequired));
    }
}
