//! Local username/password credentials.

use crate::database::models::{NewUser, User};
use crate::database::Store;
use crate::error::AppError;

pub const INVALID_CREDENTIALS: &str = "Password or username is incorrect";

#[derive(Debug, Clone)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Hashes on the blocking pool; bcrypt is deliberately slow.
pub async fn hash_password(password: String, cost: u32) -> Result<String, AppError> {
    let hashed = tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| AppError::internal(format!("password hashing task failed: {e}")))??;
    Ok(hashed)
}

pub async fn verify_password(password: String, hash: String) -> Result<bool, AppError> {
    let valid = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| AppError::internal(format!("password verification task failed: {e}")))??;
    Ok(valid)
}

impl Registration {
    /// First missing field, worded for the signup page.
    pub fn missing_field(&self) -> Option<&'static str> {
        if self.username.trim().is_empty() {
            Some("No username was given")
        } else if self.email.trim().is_empty() {
            Some("No email was given")
        } else if self.password.is_empty() {
            Some("No password was given")
        } else {
            None
        }
    }
}

/// Creates the user with a hashed password. Duplicate usernames surface as
/// [`crate::database::StoreError::UsernameTaken`].
pub async fn register(store: &dyn Store, registration: Registration, cost: u32) -> Result<User, AppError> {
    let password_hash = hash_password(registration.password, cost).await?;
    let user = store
        .create_user(NewUser {
            username: registration.username.trim().to_string(),
            email: registration.email.trim().to_string(),
            password_hash,
        })
        .await?;

    tracing::info!("Registered user {} ({})", user.username, user.id);
    Ok(user)
}

/// `Ok(None)` when the username is unknown or the password does not match.
pub async fn authenticate(store: &dyn Store, username: &str, password: String) -> Result<Option<User>, AppError> {
    let Some(user) = store.find_user_by_username(username.trim()).await? else {
        return Ok(None);
    };

    if verify_password(password, user.password_hash.clone()).await? {
        Ok(Some(user))
    } else {
        Ok(None)
    }
}
