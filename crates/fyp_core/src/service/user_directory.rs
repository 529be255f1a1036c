//! User directory use-case service.
//!
//! # Responsibility
//! - Register, authenticate, approve, edit and delete portal accounts.
//! - Seed the single bootstrap admin on initialization.
//!
//! # Invariants
//! - Exactly one admin exists after `bootstrap_admin`; it never seeds twice.
//! - Admin role is never selectable at registration.
//! - Credentials are compared only in hashed form.
//! - Mutations by an actor re-check the access policy against the loaded target.

use crate::access::{authorize, Action, DenyReason, Resource};
use crate::model::credential::CredentialHash;
use crate::model::user::{normalize_email, normalize_name, Role, User, UserId, UserValidationError};
use crate::repo::user_repo::{UserListQuery, UserRepository};
use crate::repo::{RepoError, RepoResult};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Registration input; `credential` is already hashed at the boundary.
#[derive(Debug, Clone)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub credential: CredentialHash,
    pub role: Role,
}

/// Admin edit input. `credential = None` keeps the current credential.
#[derive(Debug, Clone)]
pub struct UserUpdate {
    pub name: String,
    pub email: String,
    pub credential: Option<CredentialHash>,
}

/// Identity of the admin seeded when none exists.
#[derive(Debug, Clone)]
pub struct BootstrapAdmin {
    pub name: String,
    pub email: String,
    pub credential: CredentialHash,
}

/// Why a login attempt failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailure {
    InvalidCredentials,
    NotApproved,
}

impl Display for AuthFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidCredentials => write!(f, "invalid email or credential"),
            Self::NotApproved => write!(f, "account is not approved yet"),
        }
    }
}

/// Errors from user directory operations.
#[derive(Debug)]
pub enum UserDirectoryError {
    InvalidInput(UserValidationError),
    /// Role cannot be chosen at registration.
    RoleNotSelectable(Role),
    DuplicateEmail(String),
    Authentication(AuthFailure),
    Unauthorized(DenyReason),
    NotFound(UserId),
    Repo(RepoError),
}

impl Display for UserDirectoryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidInput(err) => write!(f, "{err}"),
            Self::RoleNotSelectable(role) => {
                write!(f, "role {role} cannot be selected at registration")
            }
            Self::DuplicateEmail(email) => write!(f, "email already registered: {email}"),
            Self::Authentication(failure) => write!(f, "authentication failed: {failure}"),
            Self::Unauthorized(reason) => write!(f, "unauthorized: {reason}"),
            Self::NotFound(id) => write!(f, "user not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for UserDirectoryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidInput(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for UserDirectoryError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::DuplicateEmail(email) => Self::DuplicateEmail(email),
            RepoError::UserNotFound(id) => Self::NotFound(id),
            RepoError::Validation(err) => Self::InvalidInput(err),
            other => Self::Repo(other),
        }
    }
}

impl From<UserValidationError> for UserDirectoryError {
    fn from(value: UserValidationError) -> Self {
        Self::InvalidInput(value)
    }
}

impl From<DenyReason> for UserDirectoryError {
    fn from(value: DenyReason) -> Self {
        Self::Unauthorized(value)
    }
}

/// User directory facade over repository implementations.
pub struct UserDirectory<R: UserRepository> {
    repo: R,
    require_approval: bool,
}

impl<R: UserRepository> UserDirectory<R> {
    /// Creates a directory. With `require_approval`, new accounts cannot log
    /// in until an admin approves them.
    pub fn new(repo: R, require_approval: bool) -> Self {
        Self {
            repo,
            require_approval,
        }
    }

    /// Seeds the bootstrap admin when no admin exists.
    ///
    /// Returns the created admin, or `None` when an admin was already present.
    pub fn bootstrap_admin(
        &self,
        admin: &BootstrapAdmin,
    ) -> Result<Option<User>, UserDirectoryError> {
        let user = User::new(
            normalize_name(&admin.name)?,
            normalize_email(&admin.email)?,
            admin.credential.clone(),
            Role::Admin,
            true,
        );
        if !self.repo.create_admin_if_absent(&user)? {
            info!("event=admin_bootstrap module=users status=skipped reason=admin_exists");
            return Ok(None);
        }
        warn!(
            "event=admin_bootstrap module=users status=ok user_id={} note=default_identity_in_use",
            user.id
        );
        Ok(Some(user))
    }

    /// Registers a new non-admin account.
    pub fn register(&self, registration: Registration) -> Result<User, UserDirectoryError> {
        if !registration.role.is_self_registrable() {
            return Err(UserDirectoryError::RoleNotSelectable(registration.role));
        }
        let user = User::new(
            normalize_name(&registration.name)?,
            normalize_email(&registration.email)?,
            registration.credential,
            registration.role,
            !self.require_approval,
        );
        self.repo.create_user(&user)?;
        info!(
            "event=user_register module=users status=ok user_id={} role={} approved={}",
            user.id, user.role, user.approved
        );
        Ok(user)
    }

    /// Resolves an account from login credentials.
    ///
    /// # Errors
    /// - `Authentication(InvalidCredentials)` for unknown email or wrong credential.
    /// - `Authentication(NotApproved)` for correct credentials on an unapproved account.
    pub fn find_by_credentials(
        &self,
        email: &str,
        credential: &CredentialHash,
    ) -> Result<User, UserDirectoryError> {
        let invalid = UserDirectoryError::Authentication(AuthFailure::InvalidCredentials);
        let Ok(email) = normalize_email(email) else {
            return Err(invalid);
        };
        let Some(user) = self.repo.find_by_email(&email)? else {
            return Err(invalid);
        };
        if &user.credential != credential {
            return Err(invalid);
        }
        if !user.approved {
            return Err(UserDirectoryError::Authentication(AuthFailure::NotApproved));
        }
        Ok(user)
    }

    /// Gets one user by id.
    pub fn get(&self, id: UserId) -> RepoResult<Option<User>> {
        self.repo.get_user(id)
    }

    /// Gets one user by id or fails with `NotFound`.
    pub fn require(&self, id: UserId) -> Result<User, UserDirectoryError> {
        self.repo
            .get_user(id)?
            .ok_or(UserDirectoryError::NotFound(id))
    }

    /// Replaces name, email and optionally the credential of a user.
    pub fn update(
        &self,
        actor: &User,
        id: UserId,
        update: UserUpdate,
    ) -> Result<User, UserDirectoryError> {
        let mut user = self.require(id)?;
        authorize(Some(actor), Action::EditUser, Resource::User(&user)).into_result()?;

        user.name = normalize_name(&update.name)?;
        user.email = normalize_email(&update.email)?;
        if let Some(credential) = update.credential {
            user.credential = credential;
        }
        self.repo.update_user(&user)?;
        info!(
            "event=user_update module=users status=ok user_id={} actor_id={}",
            user.id, actor.id
        );
        Ok(user)
    }

    /// Deletes a user together with their projects and tasks.
    pub fn delete(&self, actor: &User, id: UserId) -> Result<(), UserDirectoryError> {
        let user = self.require(id)?;
        authorize(Some(actor), Action::DeleteUser, Resource::User(&user)).into_result()?;

        self.repo.delete_user(id)?;
        info!(
            "event=user_delete module=users status=ok user_id={} role={} actor_id={}",
            id, user.role, actor.id
        );
        Ok(())
    }

    /// Marks a registered account approved. Approving twice is a no-op.
    pub fn approve(&self, actor: &User, id: UserId) -> Result<User, UserDirectoryError> {
        let mut user = self.require(id)?;
        authorize(Some(actor), Action::ApproveUser, Resource::User(&user)).into_result()?;

        if !user.approved {
            user.approved = true;
            self.repo.update_user(&user)?;
            info!(
                "event=user_approve module=users status=ok user_id={} actor_id={}",
                user.id, actor.id
            );
        }
        Ok(user)
    }

    /// Lists users holding `role`, ordered by name.
    pub fn list_by_role(&self, role: Role) -> RepoResult<Vec<User>> {
        self.repo.list_users(&UserListQuery {
            role: Some(role),
            approved: None,
        })
    }

    /// Lists accounts waiting for admin approval.
    pub fn list_pending_approval(&self) -> RepoResult<Vec<User>> {
        self.repo.list_users(&UserListQuery {
            role: None,
            approved: Some(false),
        })
    }

    /// Number of admin accounts currently stored.
    pub fn admin_count(&self) -> RepoResult<u32> {
        self.repo.count_admins()
    }
}
