//! User model
//!
//! Accounts are identified by email; the username is a unique public handle
//! used in URLs. There is no password: users sign in with a one-time
//! confirmation code sent to their email.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Maximum length of a user's bio, in characters
pub const BIO_MAX_CHARS: usize = 500;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub bio: String,
    pub role: UserRole,
    pub is_superuser: bool,
    pub is_staff: bool,
    /// argon2 hash of the outstanding confirmation code, if any
    #[serde(skip)]
    pub confirmation_code_hash: Option<String>,
    #[serde(skip)]
    pub confirmation_code_expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// A fresh account with the default role and no profile details.
    pub fn new(username: String, email: String) -> Self {
        let now = Utc::now();
        Self {
            id: 0, // Will be set by the database
            username,
            email,
            first_name: String::new(),
            last_name: String::new(),
            bio: String::new(),
            role: UserRole::default(),
            is_superuser: false,
            is_staff: false,
            confirmation_code_hash: None,
            confirmation_code_expires_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Administrative rights come from the role or from either account flag.
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin || self.is_superuser || self.is_staff
    }

    pub fn is_moderator(&self) -> bool {
        self.role == UserRole::Moderator
    }

    /// "first last", trimmed
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    /// Whether an unexpired confirmation code is outstanding
    pub fn has_pending_code(&self) -> bool {
        match (&self.confirmation_code_hash, self.confirmation_code_expires_at) {
            (Some(_), Some(expires_at)) => expires_at > Utc::now(),
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[default]
    User,
    Moderator,
    Admin,
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserRole::User => write!(f, "user"),
            UserRole::Moderator => write!(f, "moderator"),
            UserRole::Admin => write!(f, "admin"),
        }
    }
}

impl FromStr for UserRole {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(UserRole::User),
            "moderator" => Ok(UserRole::Moderator),
            "admin" => Ok(UserRole::Admin),
            _ => Err(anyhow::anyhow!("Invalid user role: {}", s)),
        }
    }
}

/// Input for creating a user directly (administrators only)
#[derive(Debug, Clone, Default)]
pub struct CreateUserInput {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub bio: String,
    pub role: Option<UserRole>,
}

/// Partial profile update; `None` leaves a field unchanged
#[derive(Debug, Clone, Default)]
pub struct UpdateUserInput {
    pub username: Option<String>,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub bio: Option<String>,
    pub role: Option<UserRole>,
}
