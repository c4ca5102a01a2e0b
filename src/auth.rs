//! Session identity and credential handling
//!
//! Passwords are stored as Argon2 hashes, never plaintext. The signed-in
//! identity lives in the browser session and is the only thing route
//! handlers and the WebSocket handshake consult.

use argon2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use crate::store::{StoreError, UserStore};
use crate::types::{User, UserId};

/// Session key the signed-in identity is stored under
pub const SESSION_USER_KEY: &str = "user";

/// Identity bound to a browser session after login or signup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionUser {
    pub id: UserId,
    pub username: String,
}

impl From<&User> for SessionUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            username: user.username.clone(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Covers both unknown-username and wrong-password; the login form
    /// reveals neither.
    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Username already exists")]
    UsernameTaken,

    #[error("Please fill out all fields")]
    MissingFields,

    #[error("password hashing failed")]
    Hash,

    #[error(transparent)]
    Storage(#[from] StoreError),
}

pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::Hash)
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    PasswordHash::new(hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

/// Create an account. Rejects empty fields and taken usernames; stores only
/// the password hash.
pub async fn signup(users: &dyn UserStore, username: &str, password: &str) -> Result<User, AuthError> {
    let username = username.trim();
    if username.is_empty() || password.is_empty() {
        return Err(AuthError::MissingFields);
    }

    if users.find_by_username(username).await?.is_some() {
        return Err(AuthError::UsernameTaken);
    }

    let user = User::new(username, hash_password(password)?);
    users.insert_user(user.clone()).await?;

    tracing::info!("created user {} ({})", user.username, user.id);
    Ok(user)
}

/// Verify credentials against the stored hash.
pub async fn login(users: &dyn UserStore, username: &str, password: &str) -> Result<User, AuthError> {
    let user = users
        .find_by_username(username.trim())
        .await?
        .ok_or(AuthError::InvalidCredentials)?;

    if !verify_password(password, &user.password_hash) {
        return Err(AuthError::InvalidCredentials);
    }

    Ok(user)
}

/// Read the signed-in identity from the session, if any.
pub async fn current_user(session: &Session) -> Option<SessionUser> {
    session
        .get::<SessionUser>(SESSION_USER_KEY)
        .await
        .ok()
        .flatten()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryUserStore;

    #[test]
    fn test_hash_roundtrip() {
        let hash = hash_password("hunter2").unwrap();

        assert_ne!(hash, "hunter2");
        assert!(verify_password("hunter2", &hash));
        assert!(!verify_password("hunter3", &hash));
    }

    #[test]
    fn test_verify_garbage_hash_is_false() {
        assert!(!verify_password("hunter2", "not-a-hash"));
    }

    #[tokio::test]
    async fn test_signup_then_login() {
        let users = MemoryUserStore::new();

        let created = signup(&users, "alice", "hunter2").await.unwrap();
        assert_ne!(created.password_hash, "hunter2");

        let logged_in = login(&users, "alice", "hunter2").await.unwrap();
        assert_eq!(logged_in.id, created.id);
    }

    #[tokio::test]
    async fn test_signup_rejects_duplicate_username() {
        let users = MemoryUserStore::new();
        signup(&users, "alice", "hunter2").await.unwrap();

        let result = signup(&users, "alice", "other").await;
        assert!(matches!(result, Err(AuthError::UsernameTaken)));
    }

    #[tokio::test]
    async fn test_signup_rejects_empty_fields() {
        let users = MemoryUserStore::new();

        assert!(matches!(
            signup(&users, "  ", "hunter2").await,
            Err(AuthError::MissingFields)
        ));
        assert!(matches!(
            signup(&users, "alice", "").await,
            Err(AuthError::MissingFields)
        ));
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let users = MemoryUserStore::new();
        signup(&users, "alice", "hunter2").await.unwrap();

        let wrong_password = login(&users, "alice", "wrong").await.unwrap_err();
        let unknown_user = login(&users, "bob", "hunter2").await.unwrap_err();

        assert_eq!(wrong_password.to_string(), unknown_user.to_string());
    }
}
