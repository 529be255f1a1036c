//! User domain model.
//!
//! # Responsibility
//! - Define portal accounts and their closed role set.
//! - Normalize and validate user-entered identity fields.
//!
//! # Invariants
//! - `email` is stored trimmed and lowercased; uniqueness is checked on that form.
//! - `name` is stored trimmed and upper-cased.
//! - `Role::Admin` is never selectable at registration.

use crate::model::credential::CredentialHash;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-z0-9._%+\-]+@[a-z0-9\-]+(\.[a-z0-9\-]+)*\.[a-z]{2,}$")
        .expect("valid email regex")
});

const NAME_MAX_CHARS: usize = 100;

/// Stable user identifier.
pub type UserId = Uuid;

/// Closed set of portal roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Student,
    Faculty,
    External,
    Admin,
}

impl Role {
    /// Stable string id used in storage and at the boundary.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Student => "STUDENT",
            Self::Faculty => "FACULTY",
            Self::External => "EXTERNAL",
            Self::Admin => "ADMIN",
        }
    }

    /// Parses one role from its stable string id.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "STUDENT" => Some(Self::Student),
            "FACULTY" => Some(Self::Faculty),
            "EXTERNAL" => Some(Self::External),
            "ADMIN" => Some(Self::Admin),
            _ => None,
        }
    }

    /// Whether this role may be chosen by an anonymous registrant.
    pub fn is_self_registrable(self) -> bool {
        !matches!(self, Self::Admin)
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Portal account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    #[serde(skip)]
    pub credential: CredentialHash,
    pub role: Role,
    /// Login is refused until an admin approves the account.
    pub approved: bool,
}

impl User {
    /// Creates a user with a generated id from already-normalized fields.
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        credential: CredentialHash,
        role: Role,
        approved: bool,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            email: email.into(),
            credential,
            role,
            approved,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Validates stored-form invariants.
    pub fn validate(&self) -> Result<(), UserValidationError> {
        validate_name(&self.name)?;
        if !EMAIL_RE.is_match(&self.email) {
            return Err(UserValidationError::InvalidEmail);
        }
        Ok(())
    }
}

/// Validation errors for user identity fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserValidationError {
    BlankName,
    NameTooLong { max_chars: usize },
    InvalidEmail,
}

impl Display for UserValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankName => write!(f, "name must not be blank"),
            Self::NameTooLong { max_chars } => {
                write!(f, "name must be at most {max_chars} characters")
            }
            Self::InvalidEmail => write!(f, "email address is not well-formed"),
        }
    }
}

impl Error for UserValidationError {}

/// Normalizes a display name: trim and upper-case.
pub fn normalize_name(name: &str) -> Result<String, UserValidationError> {
    let normalized = name.trim().to_uppercase();
    validate_name(&normalized)?;
    Ok(normalized)
}

/// Normalizes an email: trim and lowercase, then check its shape.
pub fn normalize_email(email: &str) -> Result<String, UserValidationError> {
    let normalized = email.trim().to_lowercase();
    if !EMAIL_RE.is_match(&normalized) {
        return Err(UserValidationError::InvalidEmail);
    }
    Ok(normalized)
}

fn validate_name(name: &str) -> Result<(), UserValidationError> {
    if name.trim().is_empty() {
        return Err(UserValidationError::BlankName);
    }
    if name.chars().count() > NAME_MAX_CHARS {
        return Err(UserValidationError::NameTooLong {
            max_chars: NAME_MAX_CHARS,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{normalize_email, normalize_name, Role, UserValidationError};

    #[test]
    fn role_parse_accepts_stable_ids_case_insensitively() {
        assert_eq!(Role::parse("STUDENT"), Some(Role::Student));
        assert_eq!(Role::parse(" faculty "), Some(Role::Faculty));
        assert_eq!(Role::parse("External"), Some(Role::External));
        assert_eq!(Role::parse("ADMIN"), Some(Role::Admin));
        assert_eq!(Role::parse("guest"), None);
    }

    #[test]
    fn only_admin_is_not_self_registrable() {
        assert!(Role::Student.is_self_registrable());
        assert!(Role::Faculty.is_self_registrable());
        assert!(Role::External.is_self_registrable());
        assert!(!Role::Admin.is_self_registrable());
    }

    #[test]
    fn names_are_trimmed_and_upper_cased() {
        assert_eq!(normalize_name("  ada lovelace ").unwrap(), "ADA LOVELACE");
        assert_eq!(normalize_name("   "), Err(UserValidationError::BlankName));
    }

    #[test]
    fn emails_are_lowercased_and_shape_checked() {
        assert_eq!(
            normalize_email(" Ada@Example.COM ").unwrap(),
            "ada@example.com"
        );
        assert_eq!(
            normalize_email("not-an-email"),
            Err(UserValidationError::InvalidEmail)
        );
        assert_eq!(
            normalize_email("a@b"),
            Err(UserValidationError::InvalidEmail)
        );
    }
}
