//! Role- and ownership-based access policy.
//!
//! # Responsibility
//! - Decide whether an actor may perform an action on an already-loaded target.
//!
//! # Invariants
//! - Pure function: no repository access, no side effects.
//! - Anything not explicitly allowed is denied.
//! - Anonymous actors may only register or log in.

use crate::model::project::{Project, ProjectStatus};
use crate::model::user::{Role, User};
use serde::Serialize;
use std::fmt::{Display, Formatter};

/// Portal action subject to authorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Register,
    Login,
    Logout,
    SubmitTitle,
    RecordDetails,
    Decide,
    EditUser,
    DeleteUser,
    ApproveUser,
    ListUsersByRole,
    ListPendingUsers,
    ListPendingProjects,
    ListTopAccepted,
    ListOwnProjects,
    ViewProject,
    AssignTask,
    ViewTasks,
}

impl Action {
    /// Every action, for exhaustive policy checks.
    pub const ALL: [Action; 17] = [
        Action::Register,
        Action::Login,
        Action::Logout,
        Action::SubmitTitle,
        Action::RecordDetails,
        Action::Decide,
        Action::EditUser,
        Action::DeleteUser,
        Action::ApproveUser,
        Action::ListUsersByRole,
        Action::ListPendingUsers,
        Action::ListPendingProjects,
        Action::ListTopAccepted,
        Action::ListOwnProjects,
        Action::ViewProject,
        Action::AssignTask,
        Action::ViewTasks,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Register => "register",
            Self::Login => "login",
            Self::Logout => "logout",
            Self::SubmitTitle => "submit_title",
            Self::RecordDetails => "record_details",
            Self::Decide => "decide",
            Self::EditUser => "edit_user",
            Self::DeleteUser => "delete_user",
            Self::ApproveUser => "approve_user",
            Self::ListUsersByRole => "list_users_by_role",
            Self::ListPendingUsers => "list_pending_users",
            Self::ListPendingProjects => "list_pending_projects",
            Self::ListTopAccepted => "list_top_accepted",
            Self::ListOwnProjects => "list_own_projects",
            Self::ViewProject => "view_project",
            Self::AssignTask => "assign_task",
            Self::ViewTasks => "view_tasks",
        }
    }

    /// Actions reserved for the admin role.
    pub fn is_admin_only(self) -> bool {
        matches!(
            self,
            Self::Decide
                | Self::EditUser
                | Self::DeleteUser
                | Self::ApproveUser
                | Self::ListUsersByRole
                | Self::ListPendingUsers
                | Self::ListPendingProjects
        )
    }
}

impl Display for Action {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Target the action is applied to.
#[derive(Debug, Clone, Copy)]
pub enum Resource<'a> {
    /// Collection-level or creation actions.
    None,
    Project(&'a Project),
    User(&'a User),
}

/// Why access was denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenyReason {
    Unauthenticated,
    UnauthorizedRole,
    NotOwner,
    ProjectNotAccepted,
    AdminProtected,
}

impl DenyReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unauthenticated => "authentication required",
            Self::UnauthorizedRole => "unauthorized role",
            Self::NotOwner => "not the project owner",
            Self::ProjectNotAccepted => "project is not accepted",
            Self::AdminProtected => "the admin account cannot be removed",
        }
    }
}

impl Display for DenyReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Authorization verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(DenyReason),
}

impl Decision {
    pub fn is_allowed(self) -> bool {
        matches!(self, Self::Allow)
    }

    /// Converts to `Result` for `?` propagation.
    pub fn into_result(self) -> Result<(), DenyReason> {
        match self {
            Self::Allow => Ok(()),
            Self::Deny(reason) => Err(reason),
        }
    }
}

/// Authorizes `action` on `target` for an optional authenticated `actor`.
pub fn authorize(actor: Option<&User>, action: Action, target: Resource<'_>) -> Decision {
    if matches!(action, Action::Register | Action::Login) {
        return Decision::Allow;
    }
    let Some(actor) = actor else {
        return Decision::Deny(DenyReason::Unauthenticated);
    };
    if action == Action::Logout {
        return Decision::Allow;
    }

    match actor.role {
        Role::Admin => authorize_admin(action, target),
        _ if action.is_admin_only() => Decision::Deny(DenyReason::UnauthorizedRole),
        Role::Student => authorize_student(actor, action, target),
        Role::Faculty => authorize_reviewer(action, target, true),
        Role::External => authorize_reviewer(action, target, false),
    }
}

fn authorize_admin(action: Action, target: Resource<'_>) -> Decision {
    match (action, target) {
        (Action::DeleteUser, Resource::User(user)) if user.is_admin() => {
            Decision::Deny(DenyReason::AdminProtected)
        }
        (Action::AssignTask, Resource::Project(project)) => require_accepted(project),
        (
            Action::Decide
            | Action::EditUser
            | Action::DeleteUser
            | Action::ApproveUser
            | Action::ListUsersByRole
            | Action::ListPendingUsers
            | Action::ListPendingProjects
            | Action::ListTopAccepted
            | Action::ViewProject
            | Action::ViewTasks,
            _,
        ) => Decision::Allow,
        _ => Decision::Deny(DenyReason::UnauthorizedRole),
    }
}

fn authorize_student(actor: &User, action: Action, target: Resource<'_>) -> Decision {
    match (action, target) {
        (Action::SubmitTitle | Action::ListOwnProjects, Resource::None) => Decision::Allow,
        (Action::RecordDetails, Resource::Project(project)) => {
            if !project.is_owned_by(actor.id) {
                return Decision::Deny(DenyReason::NotOwner);
            }
            require_accepted(project)
        }
        (Action::ViewProject | Action::ViewTasks, Resource::Project(project)) => {
            if project.is_owned_by(actor.id) {
                Decision::Allow
            } else {
                Decision::Deny(DenyReason::NotOwner)
            }
        }
        _ => Decision::Deny(DenyReason::UnauthorizedRole),
    }
}

fn authorize_reviewer(action: Action, target: Resource<'_>, may_assign: bool) -> Decision {
    match (action, target) {
        (Action::ListTopAccepted, Resource::None) => Decision::Allow,
        (Action::ViewProject, Resource::Project(project)) => require_accepted(project),
        (Action::AssignTask | Action::ViewTasks, Resource::Project(project)) if may_assign => {
            require_accepted(project)
        }
        _ => Decision::Deny(DenyReason::UnauthorizedRole),
    }
}

fn require_accepted(project: &Project) -> Decision {
    if project.status == ProjectStatus::Accepted {
        Decision::Allow
    } else {
        Decision::Deny(DenyReason::ProjectNotAccepted)
    }
}

#[cfg(test)]
mod tests {
    use super::{authorize, Action, Decision, DenyReason, Resource};
    use crate::model::credential::CredentialHash;
    use crate::model::project::Project;
    use crate::model::user::{Role, User};

    fn user(role: Role) -> User {
        User::new(
            "TEST",
            "test@example.com",
            CredentialHash::derive("pw"),
            role,
            true,
        )
    }

    #[test]
    fn anonymous_may_only_register_or_login() {
        for action in Action::ALL {
            let decision = authorize(None, action, Resource::None);
            if matches!(action, Action::Register | Action::Login) {
                assert_eq!(decision, Decision::Allow, "{action}");
            } else {
                assert_eq!(
                    decision,
                    Decision::Deny(DenyReason::Unauthenticated),
                    "{action}"
                );
            }
        }
    }

    #[test]
    fn non_admin_gets_unauthorized_role_for_admin_actions() {
        let target = user(Role::Student);
        for role in [Role::Student, Role::Faculty, Role::External] {
            let actor = user(role);
            for action in Action::ALL.into_iter().filter(|a| a.is_admin_only()) {
                assert_eq!(
                    authorize(Some(&actor), action, Resource::User(&target)),
                    Decision::Deny(DenyReason::UnauthorizedRole),
                    "{role} {action}"
                );
            }
        }
    }

    #[test]
    fn admin_cannot_delete_admin_account() {
        let admin = user(Role::Admin);
        assert_eq!(
            authorize(Some(&admin), Action::DeleteUser, Resource::User(&admin)),
            Decision::Deny(DenyReason::AdminProtected)
        );
    }

    #[test]
    fn admin_cannot_submit_titles_or_record_details() {
        let admin = user(Role::Admin);
        let project = Project::submitted(admin.id, "Online Library System", 3);
        assert!(!authorize(Some(&admin), Action::SubmitTitle, Resource::None).is_allowed());
        assert!(
            !authorize(Some(&admin), Action::RecordDetails, Resource::Project(&project))
                .is_allowed()
        );
    }
}
