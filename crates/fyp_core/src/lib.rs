//! Core domain logic for the final-year-project portal.
//! This crate is the single source of truth for portal rules: title
//! screening, role access, project lifecycle and the user directory.

pub mod access;
pub mod config;
pub mod db;
pub mod evaluator;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use access::{authorize, Action, Decision, DenyReason, Resource};
pub use config::{BootstrapAdminConfig, ConfigError, PortalConfig};
pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use evaluator::{evaluate_title, TitleEvaluation, TitleRejection};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::credential::CredentialHash;
pub use model::project::{
    LifecycleError, LifecycleStep, Outcome, Project, ProjectDetails, ProjectId, ProjectStatus,
};
pub use model::task::{Task, TaskId};
pub use model::user::{Role, User, UserId, UserValidationError};
pub use repo::project_repo::{
    ProjectListQuery, ProjectOrder, ProjectRepository, SqliteProjectRepository,
};
pub use repo::task_repo::{SqliteTaskRepository, TaskRepository};
pub use repo::user_repo::{SqliteUserRepository, UserListQuery, UserRepository};
pub use repo::{RepoError, RepoResult};
pub use service::context::{RequestContext, Session};
pub use service::portal_service::{
    open_sqlite_portal, PortalError, PortalResult, PortalService, SqlitePortal,
};
pub use service::project_service::{ProjectService, ProjectServiceError, TOP_ACCEPTED_LIMIT};
pub use service::user_directory::{
    AuthFailure, BootstrapAdmin, Registration, UserDirectory, UserDirectoryError, UserUpdate,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
