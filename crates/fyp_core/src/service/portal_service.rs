//! Portal request orchestration.
//!
//! # Responsibility
//! - Map each external portal action to: resolve actor and target, authorize,
//!   run the domain operation, translate errors to `PortalError`.
//!
//! # Invariants
//! - The access policy is consulted before any mutation or sensitive read.
//! - The acting user is re-loaded on every call; a deleted account's session
//!   is treated as anonymous.
//! - Non-admins attempting admin-only actions are denied even when the
//!   target does not exist, so lookups never reveal which ids are taken.

use crate::access::{authorize, Action, DenyReason, Resource};
use crate::evaluator::TitleRejection;
use crate::model::credential::CredentialHash;
use crate::model::project::{LifecycleError, Outcome, Project, ProjectDetails, ProjectId};
use crate::model::task::Task;
use crate::model::user::{Role, User, UserId};
use crate::repo::project_repo::{ProjectRepository, SqliteProjectRepository};
use crate::repo::task_repo::{SqliteTaskRepository, TaskRepository};
use crate::repo::user_repo::{SqliteUserRepository, UserRepository};
use crate::repo::{RepoError, RepoResult};
use crate::service::context::{RequestContext, Session};
use crate::service::project_service::{ProjectService, ProjectServiceError};
use crate::service::user_directory::{
    AuthFailure, BootstrapAdmin, Registration, UserDirectory, UserDirectoryError, UserUpdate,
};
use log::{info, warn};
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Boundary-facing error contract of the portal.
#[derive(Debug)]
pub enum PortalError {
    /// Title rejected by the evaluator.
    Validation {
        rejection: TitleRejection,
        score: u32,
    },
    Authentication(AuthFailure),
    Unauthorized(DenyReason),
    DuplicateEmail(String),
    UserNotFound(UserId),
    ProjectNotFound(ProjectId),
    InvalidTransition(LifecycleError),
    InvalidInput(String),
    Storage(RepoError),
}

impl PortalError {
    /// Stable machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "validation_error",
            Self::Authentication(_) => "authentication_error",
            Self::Unauthorized(_) => "unauthorized",
            Self::DuplicateEmail(_) => "duplicate_email",
            Self::UserNotFound(_) | Self::ProjectNotFound(_) => "not_found",
            Self::InvalidTransition(_) => "invalid_transition",
            Self::InvalidInput(_) => "invalid_input",
            Self::Storage(_) => "storage_error",
        }
    }
}

impl Display for PortalError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation { rejection, score } => {
                write!(f, "{rejection} (score {score})")
            }
            Self::Authentication(failure) => write!(f, "authentication failed: {failure}"),
            Self::Unauthorized(reason) => write!(f, "unauthorized: {reason}"),
            Self::DuplicateEmail(email) => write!(f, "email already registered: {email}"),
            Self::UserNotFound(id) => write!(f, "user not found: {id}"),
            Self::ProjectNotFound(id) => write!(f, "project not found: {id}"),
            Self::InvalidTransition(err) => write!(f, "invalid transition: {err}"),
            Self::InvalidInput(message) => write!(f, "invalid input: {message}"),
            Self::Storage(err) => write!(f, "storage failure: {err}"),
        }
    }
}

impl Error for PortalError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidTransition(err) => Some(err),
            Self::Storage(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for PortalError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::DuplicateEmail(email) => Self::DuplicateEmail(email),
            RepoError::UserNotFound(id) => Self::UserNotFound(id),
            RepoError::ProjectNotFound(id) => Self::ProjectNotFound(id),
            RepoError::Validation(err) => Self::InvalidInput(err.to_string()),
            other => Self::Storage(other),
        }
    }
}

impl From<UserDirectoryError> for PortalError {
    fn from(value: UserDirectoryError) -> Self {
        match value {
            UserDirectoryError::InvalidInput(err) => Self::InvalidInput(err.to_string()),
            UserDirectoryError::RoleNotSelectable(role) => Self::InvalidInput(format!(
                "role {role} cannot be selected at registration"
            )),
            UserDirectoryError::DuplicateEmail(email) => Self::DuplicateEmail(email),
            UserDirectoryError::Authentication(failure) => Self::Authentication(failure),
            UserDirectoryError::Unauthorized(reason) => Self::Unauthorized(reason),
            UserDirectoryError::NotFound(id) => Self::UserNotFound(id),
            UserDirectoryError::Repo(err) => err.into(),
        }
    }
}

impl From<ProjectServiceError> for PortalError {
    fn from(value: ProjectServiceError) -> Self {
        match value {
            ProjectServiceError::Validation { rejection, score } => {
                Self::Validation { rejection, score }
            }
            ProjectServiceError::Lifecycle(LifecycleError::NotOwner { .. }) => {
                Self::Unauthorized(DenyReason::NotOwner)
            }
            ProjectServiceError::Lifecycle(err) => Self::InvalidTransition(err),
            ProjectServiceError::Unauthorized(reason) => Self::Unauthorized(reason),
            ProjectServiceError::NotFound(id) => Self::ProjectNotFound(id),
            ProjectServiceError::BlankTaskDescription => {
                Self::InvalidInput("task description must not be blank".to_string())
            }
            ProjectServiceError::Repo(err) => err.into(),
            ProjectServiceError::InconsistentState(details) => {
                Self::Storage(RepoError::InvalidData(details.to_string()))
            }
        }
    }
}

pub type PortalResult<T> = Result<T, PortalError>;

/// Portal facade wiring the directory and lifecycle services together.
pub struct PortalService<U: UserRepository, P: ProjectRepository, T: TaskRepository> {
    users: UserDirectory<U>,
    projects: ProjectService<P, T>,
}

/// Portal backed by SQLite repositories borrowing one connection.
pub type SqlitePortal<'conn> = PortalService<
    SqliteUserRepository<'conn>,
    SqliteProjectRepository<'conn>,
    SqliteTaskRepository<'conn>,
>;

/// Builds a SQLite-backed portal over a migrated connection.
pub fn open_sqlite_portal(
    conn: &Connection,
    require_user_approval: bool,
) -> RepoResult<SqlitePortal<'_>> {
    Ok(PortalService::new(
        UserDirectory::new(SqliteUserRepository::try_new(conn)?, require_user_approval),
        ProjectService::new(
            SqliteProjectRepository::try_new(conn)?,
            SqliteTaskRepository::try_new(conn)?,
        ),
    ))
}

impl<U: UserRepository, P: ProjectRepository, T: TaskRepository> PortalService<U, P, T> {
    pub fn new(users: UserDirectory<U>, projects: ProjectService<P, T>) -> Self {
        Self { users, projects }
    }

    /// System initialization: seeds the bootstrap admin when none exists.
    pub fn initialize(&self, admin: &BootstrapAdmin) -> PortalResult<Option<User>> {
        Ok(self.users.bootstrap_admin(admin)?)
    }

    pub fn register(
        &self,
        ctx: &RequestContext,
        registration: Registration,
    ) -> PortalResult<User> {
        let actor = self.resolve_actor(ctx)?;
        self.guard(actor.as_ref(), Action::Register, Resource::None)?;
        Ok(self.users.register(registration)?)
    }

    /// Authenticates and returns a session for the caller to hold.
    pub fn login(&self, email: &str, credential: &CredentialHash) -> PortalResult<Session> {
        match self.users.find_by_credentials(email, credential) {
            Ok(user) => {
                info!(
                    "event=login module=portal status=ok user_id={} role={}",
                    user.id, user.role
                );
                Ok(Session::for_user(&user))
            }
            Err(err) => {
                let err = PortalError::from(err);
                warn!(
                    "event=login module=portal status=error error_code={}",
                    err.code()
                );
                Err(err)
            }
        }
    }

    /// Clears the caller's session.
    pub fn logout(&self, ctx: &mut RequestContext) -> PortalResult<()> {
        let actor = self.resolve_actor(ctx)?;
        self.guard(actor.as_ref(), Action::Logout, Resource::None)?;
        ctx.clear();
        Ok(())
    }

    pub fn submit_title(&self, ctx: &RequestContext, title: &str) -> PortalResult<Project> {
        let actor = self.require_actor(ctx, Action::SubmitTitle)?;
        self.guard(Some(&actor), Action::SubmitTitle, Resource::None)?;
        Ok(self.projects.submit(&actor, title)?)
    }

    pub fn record_details(
        &self,
        ctx: &RequestContext,
        project_id: ProjectId,
        details: ProjectDetails,
    ) -> PortalResult<Project> {
        let actor = self.require_actor(ctx, Action::RecordDetails)?;
        self.load_project_for(&actor, Action::RecordDetails, project_id)?;
        Ok(self.projects.record_details(&actor, project_id, details)?)
    }

    pub fn decide(
        &self,
        ctx: &RequestContext,
        project_id: ProjectId,
        outcome: Outcome,
    ) -> PortalResult<Project> {
        let actor = self.require_actor(ctx, Action::Decide)?;
        self.load_project_for(&actor, Action::Decide, project_id)?;
        Ok(self.projects.decide(&actor, project_id, outcome)?)
    }

    pub fn edit_user(
        &self,
        ctx: &RequestContext,
        user_id: UserId,
        update: UserUpdate,
    ) -> PortalResult<User> {
        let actor = self.require_actor(ctx, Action::EditUser)?;
        self.load_user_for(&actor, Action::EditUser, user_id)?;
        Ok(self.users.update(&actor, user_id, update)?)
    }

    pub fn delete_user(&self, ctx: &RequestContext, user_id: UserId) -> PortalResult<()> {
        let actor = self.require_actor(ctx, Action::DeleteUser)?;
        self.load_user_for(&actor, Action::DeleteUser, user_id)?;
        Ok(self.users.delete(&actor, user_id)?)
    }

    pub fn approve_user(&self, ctx: &RequestContext, user_id: UserId) -> PortalResult<User> {
        let actor = self.require_actor(ctx, Action::ApproveUser)?;
        self.load_user_for(&actor, Action::ApproveUser, user_id)?;
        Ok(self.users.approve(&actor, user_id)?)
    }

    /// Users holding `role`, ordered by name.
    pub fn list_users_by_role(&self, ctx: &RequestContext, role: Role) -> PortalResult<Vec<User>> {
        let actor = self.require_actor(ctx, Action::ListUsersByRole)?;
        self.guard(Some(&actor), Action::ListUsersByRole, Resource::None)?;
        Ok(self.users.list_by_role(role)?)
    }

    /// Accounts waiting for approval, ordered by name.
    pub fn list_pending_users(&self, ctx: &RequestContext) -> PortalResult<Vec<User>> {
        let actor = self.require_actor(ctx, Action::ListPendingUsers)?;
        self.guard(Some(&actor), Action::ListPendingUsers, Resource::None)?;
        Ok(self.users.list_pending_approval()?)
    }

    /// Pending projects, oldest first.
    pub fn list_pending_projects(&self, ctx: &RequestContext) -> PortalResult<Vec<Project>> {
        let actor = self.require_actor(ctx, Action::ListPendingProjects)?;
        self.guard(Some(&actor), Action::ListPendingProjects, Resource::None)?;
        Ok(self.projects.list_pending()?)
    }

    /// Accepted projects by score descending, at most ten.
    pub fn list_top_accepted(&self, ctx: &RequestContext) -> PortalResult<Vec<Project>> {
        let actor = self.require_actor(ctx, Action::ListTopAccepted)?;
        self.guard(Some(&actor), Action::ListTopAccepted, Resource::None)?;
        Ok(self.projects.list_top_accepted()?)
    }

    /// The caller's own projects, newest first.
    pub fn list_my_projects(&self, ctx: &RequestContext) -> PortalResult<Vec<Project>> {
        let actor = self.require_actor(ctx, Action::ListOwnProjects)?;
        self.guard(Some(&actor), Action::ListOwnProjects, Resource::None)?;
        Ok(self.projects.list_for_student(actor.id)?)
    }

    pub fn view_project(&self, ctx: &RequestContext, project_id: ProjectId) -> PortalResult<Project> {
        let actor = self.require_actor(ctx, Action::ViewProject)?;
        self.load_project_for(&actor, Action::ViewProject, project_id)
    }

    pub fn assign_task(
        &self,
        ctx: &RequestContext,
        project_id: ProjectId,
        description: &str,
    ) -> PortalResult<Task> {
        let actor = self.require_actor(ctx, Action::AssignTask)?;
        self.load_project_for(&actor, Action::AssignTask, project_id)?;
        Ok(self.projects.assign_task(&actor, project_id, description)?)
    }

    pub fn list_tasks(&self, ctx: &RequestContext, project_id: ProjectId) -> PortalResult<Vec<Task>> {
        let actor = self.require_actor(ctx, Action::ViewTasks)?;
        self.load_project_for(&actor, Action::ViewTasks, project_id)?;
        Ok(self.projects.list_tasks(&actor, project_id)?)
    }

    fn resolve_actor(&self, ctx: &RequestContext) -> PortalResult<Option<User>> {
        match ctx.session() {
            Some(session) => Ok(self.users.get(session.user_id)?),
            None => Ok(None),
        }
    }

    fn require_actor(&self, ctx: &RequestContext, action: Action) -> PortalResult<User> {
        match self.resolve_actor(ctx)? {
            Some(actor) => Ok(actor),
            None => {
                self.guard(None, action, Resource::None)?;
                Err(PortalError::Unauthorized(DenyReason::Unauthenticated))
            }
        }
    }

    fn guard(&self, actor: Option<&User>, action: Action, target: Resource<'_>) -> PortalResult<()> {
        authorize(actor, action, target).into_result().map_err(|reason| {
            warn!(
                "event=access_denied module=portal status=denied action={} role={} reason={:?}",
                action,
                actor.map_or("anonymous", |user| user.role.as_str()),
                reason
            );
            PortalError::Unauthorized(reason)
        })
    }

    fn load_project_for(
        &self,
        actor: &User,
        action: Action,
        project_id: ProjectId,
    ) -> PortalResult<Project> {
        match self.projects.get(project_id)? {
            Some(project) => {
                self.guard(Some(actor), action, Resource::Project(&project))?;
                Ok(project)
            }
            None => {
                self.guard_missing_target(actor, action)?;
                Err(PortalError::ProjectNotFound(project_id))
            }
        }
    }

    fn load_user_for(&self, actor: &User, action: Action, user_id: UserId) -> PortalResult<User> {
        match self.users.get(user_id)? {
            Some(user) => {
                self.guard(Some(actor), action, Resource::User(&user))?;
                Ok(user)
            }
            None => {
                self.guard_missing_target(actor, action)?;
                Err(PortalError::UserNotFound(user_id))
            }
        }
    }

    fn guard_missing_target(&self, actor: &User, action: Action) -> PortalResult<()> {
        if action.is_admin_only() && !actor.is_admin() {
            return self.guard(Some(actor), action, Resource::None);
        }
        Ok(())
    }
}
