//! Project lifecycle use-case service.
//!
//! # Responsibility
//! - Gate title submission through the evaluator.
//! - Apply admin decisions and owner detail writes through the lifecycle rules.
//! - Assign and list tasks on accepted projects.
//!
//! # Invariants
//! - A project is persisted only after its title is accepted.
//! - `decide` succeeds at most once per project, even under concurrent callers.
//! - Failed operations leave the stored project untouched.

use crate::access::{authorize, Action, DenyReason, Resource};
use crate::evaluator::{evaluate_title, TitleRejection};
use crate::model::project::{
    LifecycleError, LifecycleStep, Outcome, Project, ProjectDetails, ProjectId, ProjectStatus,
};
use crate::model::task::Task;
use crate::model::user::{User, UserId};
use crate::repo::project_repo::{ProjectListQuery, ProjectOrder, ProjectRepository};
use crate::repo::task_repo::TaskRepository;
use crate::repo::{RepoError, RepoResult};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Upper bound of the top-accepted leaderboard.
pub const TOP_ACCEPTED_LIMIT: u32 = 10;

/// Errors from project lifecycle operations.
#[derive(Debug)]
pub enum ProjectServiceError {
    /// Title rejected by the evaluator.
    Validation {
        rejection: TitleRejection,
        score: u32,
    },
    Lifecycle(LifecycleError),
    Unauthorized(DenyReason),
    NotFound(ProjectId),
    /// Task description is blank after trim.
    BlankTaskDescription,
    Repo(RepoError),
    /// Guarded write missed although the loaded state allowed it.
    InconsistentState(&'static str),
}

impl Display for ProjectServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation { rejection, score } => write!(f, "{rejection} (score {score})"),
            Self::Lifecycle(err) => write!(f, "{err}"),
            Self::Unauthorized(reason) => write!(f, "unauthorized: {reason}"),
            Self::NotFound(id) => write!(f, "project not found: {id}"),
            Self::BlankTaskDescription => write!(f, "task description must not be blank"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => write!(f, "inconsistent project state: {details}"),
        }
    }
}

impl Error for ProjectServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Lifecycle(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ProjectServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::ProjectNotFound(id) => Self::NotFound(id),
            other => Self::Repo(other),
        }
    }
}

impl From<LifecycleError> for ProjectServiceError {
    fn from(value: LifecycleError) -> Self {
        Self::Lifecycle(value)
    }
}

impl From<DenyReason> for ProjectServiceError {
    fn from(value: DenyReason) -> Self {
        Self::Unauthorized(value)
    }
}

/// Project lifecycle facade over project and task repositories.
pub struct ProjectService<P: ProjectRepository, T: TaskRepository> {
    projects: P,
    tasks: T,
}

impl<P: ProjectRepository, T: TaskRepository> ProjectService<P, T> {
    /// Creates a service using the provided repository implementations.
    pub fn new(projects: P, tasks: T) -> Self {
        Self { projects, tasks }
    }

    /// Screens `title` and creates a pending project owned by `student`.
    pub fn submit(&self, student: &User, title: &str) -> Result<Project, ProjectServiceError> {
        authorize(Some(student), Action::SubmitTitle, Resource::None).into_result()?;

        let evaluation = evaluate_title(title);
        if let Some(rejection) = evaluation.rejection {
            info!(
                "event=project_submit module=projects status=rejected student_id={} score={}",
                student.id, evaluation.score
            );
            return Err(ProjectServiceError::Validation {
                rejection,
                score: evaluation.score,
            });
        }

        let project = Project::submitted(student.id, title.trim(), evaluation.score);
        self.projects.create_project(&project)?;
        info!(
            "event=project_submit module=projects status=ok project_id={} student_id={} score={}",
            project.id, student.id, project.score
        );
        Ok(project)
    }

    /// Accepts or rejects a pending project.
    ///
    /// # Errors
    /// - `Lifecycle(InvalidTransition)` when the project was already decided,
    ///   including when a concurrent caller decided it first.
    pub fn decide(
        &self,
        admin: &User,
        project_id: ProjectId,
        outcome: Outcome,
    ) -> Result<Project, ProjectServiceError> {
        let mut project = self.require(project_id)?;
        authorize(Some(admin), Action::Decide, Resource::Project(&project)).into_result()?;

        let target = project.decide(outcome)?;
        if !self
            .projects
            .transition_status(project_id, ProjectStatus::Pending, target)?
        {
            let current = self.require(project_id)?;
            warn!(
                "event=project_decide module=projects status=conflict project_id={} current={}",
                project_id, current.status
            );
            return Err(LifecycleError::InvalidTransition {
                project_id,
                from: current.status,
                attempted: LifecycleStep::Decide(outcome),
            }
            .into());
        }

        info!(
            "event=project_decide module=projects status=ok project_id={} outcome={} admin_id={}",
            project_id, target, admin.id
        );
        Ok(project)
    }

    /// Replaces the detail fields of an accepted project owned by `student`.
    pub fn record_details(
        &self,
        student: &User,
        project_id: ProjectId,
        details: ProjectDetails,
    ) -> Result<Project, ProjectServiceError> {
        let mut project = self.require(project_id)?;
        authorize(Some(student), Action::RecordDetails, Resource::Project(&project))
            .into_result()?;

        project.record_details(student.id, details)?;
        if !self
            .projects
            .replace_details(project_id, student.id, &project.details)?
        {
            let current = self.require(project_id)?;
            current.check_details_writable(student.id)?;
            return Err(ProjectServiceError::InconsistentState(
                "detail write guard missed on a writable project",
            ));
        }

        info!(
            "event=project_details module=projects status=ok project_id={} student_id={}",
            project_id, student.id
        );
        Ok(project)
    }

    /// Assigns a task to an accepted project.
    pub fn assign_task(
        &self,
        actor: &User,
        project_id: ProjectId,
        description: &str,
    ) -> Result<Task, ProjectServiceError> {
        let project = self.require(project_id)?;
        authorize(Some(actor), Action::AssignTask, Resource::Project(&project)).into_result()?;

        let task = Task::new(project_id, description, actor.id)
            .ok_or(ProjectServiceError::BlankTaskDescription)?;
        self.tasks.create_task(&task)?;
        info!(
            "event=task_assign module=projects status=ok task_id={} project_id={} actor_id={} role={}",
            task.id, project_id, actor.id, actor.role
        );
        Ok(task)
    }

    /// Lists tasks of a project the actor may view.
    pub fn list_tasks(
        &self,
        actor: &User,
        project_id: ProjectId,
    ) -> Result<Vec<Task>, ProjectServiceError> {
        let project = self.require(project_id)?;
        authorize(Some(actor), Action::ViewTasks, Resource::Project(&project)).into_result()?;
        Ok(self.tasks.list_tasks(project_id)?)
    }

    /// Gets one project by id.
    pub fn get(&self, project_id: ProjectId) -> RepoResult<Option<Project>> {
        self.projects.get_project(project_id)
    }

    /// Gets one project by id or fails with `NotFound`.
    pub fn require(&self, project_id: ProjectId) -> Result<Project, ProjectServiceError> {
        self.projects
            .get_project(project_id)?
            .ok_or(ProjectServiceError::NotFound(project_id))
    }

    /// Pending projects in submission order.
    pub fn list_pending(&self) -> RepoResult<Vec<Project>> {
        self.projects.list_projects(&ProjectListQuery {
            status: Some(ProjectStatus::Pending),
            ..ProjectListQuery::default()
        })
    }

    /// Highest scoring accepted projects, at most `TOP_ACCEPTED_LIMIT`.
    pub fn list_top_accepted(&self) -> RepoResult<Vec<Project>> {
        self.projects.list_projects(&ProjectListQuery {
            status: Some(ProjectStatus::Accepted),
            order: ProjectOrder::ScoreDesc,
            limit: Some(TOP_ACCEPTED_LIMIT),
            ..ProjectListQuery::default()
        })
    }

    /// Projects owned by one student, newest first.
    pub fn list_for_student(&self, student_id: UserId) -> RepoResult<Vec<Project>> {
        self.projects.list_projects(&ProjectListQuery {
            student_id: Some(student_id),
            order: ProjectOrder::Newest,
            ..ProjectListQuery::default()
        })
    }
}
