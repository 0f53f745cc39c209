//! User service
//!
//! Sign-in works without passwords:
//! 1. `request_code` finds or creates the account for an email and mails a
//!    one-time confirmation code.
//! 2. `exchange_code` trades a valid code for a session token.
//!
//! The rest is profile and account management.

use crate::config::AuthConfig;
use crate::db::repositories::{SessionRepository, UserRepository};
use crate::models::{CreateUserInput, Session, UpdateUserInput, User, BIO_MAX_CHARS};
use crate::services::confirmation::{generate_code, hash_code, verify_code};
use crate::services::email::CodeSender;
use crate::services::rate_limiter::AuthRateLimiter;
use anyhow::Context;
use chrono::{Duration, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;

pub const USERNAME_MAX_CHARS: usize = 30;
pub const NAME_MAX_CHARS: usize = 150;
pub const EMAIL_MAX_CHARS: usize = 254;

/// `me` is taken by the `/users/me` route
const RESERVED_USERNAMES: &[&str] = &["me"];

static USERNAME_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[\w.@+-]+$").unwrap_or_else(|e| panic!("invalid username pattern: {}", e))
});

#[derive(Debug, thiserror::Error)]
pub enum UserServiceError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("User already exists: {0}")]
    UserExists(String),

    #[error("User not found: {0}")]
    NotFound(String),

    /// Wrong, expired or already used confirmation code
    #[error("Invalid confirmation code")]
    InvalidCode,

    #[error("Too many attempts, try again later")]
    RateLimited,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

pub struct UserService {
    user_repo: Arc<dyn UserRepository>,
    session_repo: Arc<dyn SessionRepository>,
    sender: Arc<dyn CodeSender>,
    rate_limiter: AuthRateLimiter,
    session_ttl: Duration,
    code_ttl: Duration,
}

impl UserService {
    pub fn new(
        user_repo: Arc<dyn UserRepository>,
        session_repo: Arc<dyn SessionRepository>,
        sender: Arc<dyn CodeSender>,
        rate_limiter: AuthRateLimiter,
    ) -> Self {
        Self::with_auth_config(user_repo, session_repo, sender, rate_limiter, &AuthConfig::default())
    }

    pub fn with_auth_config(
        user_repo: Arc<dyn UserRepository>,
        session_repo: Arc<dyn SessionRepository>,
        sender: Arc<dyn CodeSender>,
        rate_limiter: AuthRateLimiter,
        config: &AuthConfig,
    ) -> Self {
        Self {
            user_repo,
            session_repo,
            sender,
            rate_limiter,
            session_ttl: Duration::days(config.session_expiration_days),
            code_ttl: Duration::minutes(config.code_ttl_minutes),
        }
    }

    // ========================================================================
    // Email-code sign-in
    // ========================================================================

    /// Get or create the account for `email` and send it a fresh code.
    ///
    /// Any previously issued code stops working.
    pub async fn request_code(&self, email: &str, username: &str) -> Result<User, UserServiceError> {
        let email = email.trim();
        let username = username.trim();
        validate_email(email)?;
        validate_username(username)?;

        if self.rate_limiter.is_code_request_limited(email).await {
            tracing::warn!("Confirmation code requests rate limited for {}", email);
            return Err(UserServiceError::RateLimited);
        }
        self.rate_limiter.record_code_request(email).await;

        let mut user = match self
            .user_repo
            .get_by_email(email)
            .await
            .context("Failed to look up user by email")?
        {
            Some(user) if user.username == username => user,
            Some(_) => {
                return Err(UserServiceError::UserExists(format!(
                    "Email '{}' is registered with a different username",
                    email
                )))
            }
            None => {
                self.ensure_username_free(username).await?;
                let created = self
                    .user_repo
                    .create(&User::new(username.to_string(), email.to_string()))
                    .await
                    .context("Failed to create user")?;
                tracing::info!("Created user {} ({})", created.username, created.id);
                created
            }
        };

        let code = generate_code();
        user.confirmation_code_hash = Some(hash_code(&code)?);
        user.confirmation_code_expires_at = Some(Utc::now() + self.code_ttl);
        let user = self
            .user_repo
            .update(&user)
            .await
            .context("Failed to store confirmation code")?;

        self.sender
            .send_confirmation_code(&user.email, &code)
            .await
            .context("Failed to send confirmation code")?;

        Ok(user)
    }

    /// Exchange a confirmation code for a session. The code is single use.
    pub async fn exchange_code(&self, email: &str, code: &str) -> Result<Session, UserServiceError> {
        let email = email.trim();
        let code = code.trim();
        if code.is_empty() {
            return Err(UserServiceError::ValidationError(
                "Confirmation code cannot be empty".to_string(),
            ));
        }

        if self.rate_limiter.is_exchange_limited(email).await {
            tracing::warn!("Confirmation code exchange rate limited for {}", email);
            return Err(UserServiceError::RateLimited);
        }

        let mut user = self
            .user_repo
            .get_by_email(email)
            .await
            .context("Failed to look up user by email")?
            .ok_or_else(|| UserServiceError::NotFound(email.to_string()))?;

        let valid = match (&user.confirmation_code_hash, user.has_pending_code()) {
            (Some(hash), true) => verify_code(code, hash)?,
            _ => false,
        };
        if !valid {
            self.rate_limiter.record_failed_exchange(email).await;
            return Err(UserServiceError::InvalidCode);
        }

        user.confirmation_code_hash = None;
        user.confirmation_code_expires_at = None;
        self.user_repo
            .update(&user)
            .await
            .context("Failed to consume confirmation code")?;
        self.rate_limiter.clear_failed_exchanges(email).await;

        let session = self
            .session_repo
            .create(&Session::issue(user.id, self.session_ttl))
            .await
            .context("Failed to create session")?;
        tracing::info!("User {} signed in", user.username);
        Ok(session)
    }

    /// The user behind a session token, if the session is still valid.
    ///
    /// Expired sessions are deleted when encountered.
    pub async fn validate_session(&self, token: &str) -> Result<Option<User>, UserServiceError> {
        let session = match self
            .session_repo
            .get_by_id(token)
            .await
            .context("Failed to get session")?
        {
            Some(session) => session,
            None => return Ok(None),
        };

        if session.is_expired() {
            if let Err(e) = self.session_repo.delete(token).await {
                tracing::warn!("Failed to delete expired session: {:#}", e);
            }
            return Ok(None);
        }

        let user = self
            .user_repo
            .get_by_id(session.user_id)
            .await
            .context("Failed to get session user")?;
        Ok(user)
    }

    pub async fn logout(&self, token: &str) -> Result<(), UserServiceError> {
        self.session_repo
            .delete(token)
            .await
            .context("Failed to delete session")?;
        Ok(())
    }

    pub async fn cleanup_expired_sessions(&self) -> Result<u64, UserServiceError> {
        let removed = self
            .session_repo
            .delete_expired()
            .await
            .context("Failed to delete expired sessions")?;
        Ok(removed)
    }

    // ========================================================================
    // Account management
    // ========================================================================

    pub async fn list(&self) -> Result<Vec<User>, UserServiceError> {
        Ok(self.user_repo.list().await.context("Failed to list users")?)
    }

    pub async fn get_by_username(&self, username: &str) -> Result<User, UserServiceError> {
        self.user_repo
            .get_by_username(username)
            .await
            .context("Failed to get user by username")?
            .ok_or_else(|| UserServiceError::NotFound(username.to_string()))
    }

    /// Create an account directly, without the email flow.
    pub async fn create(&self, input: CreateUserInput) -> Result<User, UserServiceError> {
        let username = input.username.trim().to_string();
        let email = input.email.trim().to_string();
        validate_username(&username)?;
        validate_email(&email)?;
        validate_profile(Some(&input.first_name), Some(&input.last_name), Some(&input.bio))?;

        self.ensure_username_free(&username).await?;
        self.ensure_email_free(&email).await?;

        let mut user = User::new(username, email);
        user.first_name = input.first_name;
        user.last_name = input.last_name;
        user.bio = input.bio;
        user.role = input.role.unwrap_or_default();

        let created = self.user_repo.create(&user).await.context("Failed to create user")?;
        Ok(created)
    }

    /// Apply a partial update to the account named `username`.
    pub async fn update(&self, username: &str, input: UpdateUserInput) -> Result<User, UserServiceError> {
        let user = self.get_by_username(username).await?;
        self.apply_update(user, input).await
    }

    /// Update the caller's own profile. Only administrators may change
    /// their role this way.
    pub async fn update_me(&self, current: &User, input: UpdateUserInput) -> Result<User, UserServiceError> {
        if let Some(role) = input.role {
            if role != current.role && !current.is_admin() {
                return Err(UserServiceError::Forbidden(
                    "You cannot change your own role".to_string(),
                ));
            }
        }

        let user = self
            .user_repo
            .get_by_id(current.id)
            .await
            .context("Failed to get user")?
            .ok_or_else(|| UserServiceError::NotFound(current.username.clone()))?;
        self.apply_update(user, input).await
    }

    pub async fn delete(&self, username: &str) -> Result<(), UserServiceError> {
        let user = self.get_by_username(username).await?;
        self.user_repo.delete(user.id).await.context("Failed to delete user")?;
        tracing::info!("Deleted user {}", user.username);
        Ok(())
    }

    // ========================================================================
    // Private helper methods
    // ========================================================================

    async fn apply_update(&self, mut user: User, input: UpdateUserInput) -> Result<User, UserServiceError> {
        validate_profile(
            input.first_name.as_deref(),
            input.last_name.as_deref(),
            input.bio.as_deref(),
        )?;

        if let Some(username) = input.username {
            let username = username.trim().to_string();
            if username != user.username {
                validate_username(&username)?;
                self.ensure_username_free(&username).await?;
                user.username = username;
            }
        }
        if let Some(email) = input.email {
            let email = email.trim().to_string();
            if email != user.email {
                validate_email(&email)?;
                self.ensure_email_free(&email).await?;
                user.email = email;
            }
        }
        if let Some(first_name) = input.first_name {
            user.first_name = first_name;
        }
        if let Some(last_name) = input.last_name {
            user.last_name = last_name;
        }
        if let Some(bio) = input.bio {
            user.bio = bio;
        }
        if let Some(role) = input.role {
            user.role = role;
        }

        let updated = self.user_repo.update(&user).await.context("Failed to update user")?;
        Ok(updated)
    }

    async fn ensure_username_free(&self, username: &str) -> Result<(), UserServiceError> {
        if self
            .user_repo
            .get_by_username(username)
            .await
            .context("Failed to check username")?
            .is_some()
        {
            return Err(UserServiceError::UserExists(format!(
                "Username '{}' is already taken",
                username
            )));
        }
        Ok(())
    }

    async fn ensure_email_free(&self, email: &str) -> Result<(), UserServiceError> {
        if self
            .user_repo
            .get_by_email(email)
            .await
            .context("Failed to check email")?
            .is_some()
        {
            return Err(UserServiceError::UserExists(format!(
                "Email '{}' is already registered",
                email
            )));
        }
        Ok(())
    }
}

fn validate_email(email: &str) -> Result<(), UserServiceError> {
    if email.is_empty() {
        return Err(UserServiceError::ValidationError("Email cannot be empty".to_string()));
    }
    if email.chars().count() > EMAIL_MAX_CHARS {
        return Err(UserServiceError::ValidationError("Email is too long".to_string()));
    }
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() && !domain.contains('@') => {
            Ok(())
        }
        _ => Err(UserServiceError::ValidationError("Invalid email format".to_string())),
    }
}

fn validate_username(username: &str) -> Result<(), UserServiceError> {
    if username.is_empty() {
        return Err(UserServiceError::ValidationError(
            "Username cannot be empty".to_string(),
        ));
    }
    if username.chars().count() > USERNAME_MAX_CHARS {
        return Err(UserServiceError::ValidationError(format!(
            "Username cannot exceed {} characters",
            USERNAME_MAX_CHARS
        )));
    }
    if !USERNAME_PATTERN.is_match(username) {
        return Err(UserServiceError::ValidationError(
            "Username may only contain letters, digits and @/./+/-/_".to_string(),
        ));
    }
    if RESERVED_USERNAMES.contains(&username.to_lowercase().as_str()) {
        return Err(UserServiceError::ValidationError(format!(
            "Username '{}' is reserved",
            username
        )));
    }
    Ok(())
}

fn validate_profile(
    first_name: Option<&str>,
    last_name: Option<&str>,
    bio: Option<&str>,
) -> Result<(), UserServiceError> {
    for (field, value) in [("first_name", first_name), ("last_name", last_name)] {
        if value.is_some_and(|v| v.chars().count() > NAME_MAX_CHARS) {
            return Err(UserServiceError::ValidationError(format!(
                "{} cannot exceed {} characters",
                field, NAME_MAX_CHARS
            )));
        }
    }
    if bio.is_some_and(|b| b.chars().count() > BIO_MAX_CHARS) {
        return Err(UserServiceError::ValidationError(format!(
            "Bio cannot exceed {} characters",
            BIO_MAX_CHARS
        )));
    }
    Ok(())
}
