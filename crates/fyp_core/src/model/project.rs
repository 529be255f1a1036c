//! Project domain model and lifecycle state machine.
//!
//! # Responsibility
//! - Define the project record and its status set.
//! - Own the only legal status transitions and the detail-write rule.
//!
//! # Invariants
//! - Status starts `Pending` and leaves it exactly once.
//! - `Accepted` and `Rejected` never transition again.
//! - Detail fields change only while `Accepted` and only for the owner.
//! - Detail writes are a full replace of all three fields.

use crate::model::user::UserId;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable project identifier.
pub type ProjectId = Uuid;

/// Project approval status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProjectStatus {
    Pending,
    Accepted,
    Rejected,
}

impl ProjectStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Accepted => "ACCEPTED",
            Self::Rejected => "REJECTED",
        }
    }
}

impl Display for ProjectStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Admin decision on a pending project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Outcome {
    Accept,
    Reject,
}

impl Outcome {
    /// Status a pending project lands in for this outcome.
    pub fn target_status(self) -> ProjectStatus {
        match self {
            Self::Accept => ProjectStatus::Accepted,
            Self::Reject => ProjectStatus::Rejected,
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "ACCEPT" => Some(Self::Accept),
            "REJECT" => Some(Self::Reject),
            _ => None,
        }
    }
}

/// Student-entered implementation details for an accepted project.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectDetails {
    pub frontend: Option<String>,
    pub backend: Option<String>,
    pub documentation: Option<String>,
}

impl ProjectDetails {
    /// Builds details, mapping blank inputs to `None`.
    pub fn new(
        frontend: Option<String>,
        backend: Option<String>,
        documentation: Option<String>,
    ) -> Self {
        Self {
            frontend: non_blank(frontend),
            backend: non_blank(backend),
            documentation: non_blank(documentation),
        }
    }
}

/// Final-year project record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Project {
    pub id: ProjectId,
    pub title: String,
    /// Keyword score computed by the title evaluator at submission.
    pub score: u32,
    pub status: ProjectStatus,
    pub student_id: UserId,
    #[serde(flatten)]
    pub details: ProjectDetails,
}

impl Project {
    /// Creates a freshly submitted project in `Pending` with no details.
    pub fn submitted(student_id: UserId, title: impl Into<String>, score: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            score,
            status: ProjectStatus::Pending,
            student_id,
            details: ProjectDetails::default(),
        }
    }

    pub fn is_owned_by(&self, user_id: UserId) -> bool {
        self.student_id == user_id
    }

    /// Applies an admin decision.
    ///
    /// # Errors
    /// - `InvalidTransition` when the project is no longer `Pending`; the
    ///   status is left unchanged.
    pub fn decide(&mut self, outcome: Outcome) -> Result<ProjectStatus, LifecycleError> {
        if self.status != ProjectStatus::Pending {
            return Err(LifecycleError::InvalidTransition {
                project_id: self.id,
                from: self.status,
                attempted: LifecycleStep::Decide(outcome),
            });
        }
        self.status = outcome.target_status();
        Ok(self.status)
    }

    /// Replaces all detail fields.
    ///
    /// # Errors
    /// - `NotOwner` when `requester` is not the owning student.
    /// - `InvalidTransition` when the project is not `Accepted`.
    pub fn record_details(
        &mut self,
        requester: UserId,
        details: ProjectDetails,
    ) -> Result<(), LifecycleError> {
        self.check_details_writable(requester)?;
        self.details = details;
        Ok(())
    }

    /// Checks the detail-write rule without mutating.
    pub fn check_details_writable(&self, requester: UserId) -> Result<(), LifecycleError> {
        if !self.is_owned_by(requester) {
            return Err(LifecycleError::NotOwner {
                project_id: self.id,
                requester,
            });
        }
        if self.status != ProjectStatus::Accepted {
            return Err(LifecycleError::InvalidTransition {
                project_id: self.id,
                from: self.status,
                attempted: LifecycleStep::RecordDetails,
            });
        }
        Ok(())
    }
}

/// Lifecycle step attempted on a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleStep {
    Decide(Outcome),
    RecordDetails,
}

impl Display for LifecycleStep {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Decide(Outcome::Accept) => write!(f, "accept"),
            Self::Decide(Outcome::Reject) => write!(f, "reject"),
            Self::RecordDetails => write!(f, "record details"),
        }
    }
}

/// Lifecycle rule violations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleError {
    InvalidTransition {
        project_id: ProjectId,
        from: ProjectStatus,
        attempted: LifecycleStep,
    },
    NotOwner {
        project_id: ProjectId,
        requester: UserId,
    },
}

impl Display for LifecycleError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidTransition {
                project_id,
                from,
                attempted,
            } => write!(
                f,
                "cannot {attempted} project {project_id} in status {from}"
            ),
            Self::NotOwner {
                project_id,
                requester,
            } => write!(f, "user {requester} does not own project {project_id}"),
        }
    }
}

impl Error for LifecycleError {}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

#[cfg(test)]
mod tests {
    use super::{LifecycleError, Outcome, Project, ProjectDetails, ProjectStatus};
    use uuid::Uuid;

    #[test]
    fn submitted_project_starts_pending_without_details() {
        let project = Project::submitted(Uuid::new_v4(), "Online Library System", 3);
        assert_eq!(project.status, ProjectStatus::Pending);
        assert_eq!(project.details, ProjectDetails::default());
    }

    #[test]
    fn decide_moves_pending_once() {
        let mut project = Project::submitted(Uuid::new_v4(), "Student Portal App", 3);
        assert_eq!(
            project.decide(Outcome::Reject).unwrap(),
            ProjectStatus::Rejected
        );

        let err = project.decide(Outcome::Accept).unwrap_err();
        assert!(matches!(
            err,
            LifecycleError::InvalidTransition {
                from: ProjectStatus::Rejected,
                ..
            }
        ));
        assert_eq!(project.status, ProjectStatus::Rejected);
    }

    #[test]
    fn record_details_requires_owner_and_accepted() {
        let owner = Uuid::new_v4();
        let mut project = Project::submitted(owner, "College Attendance System", 3);
        let details = ProjectDetails::new(Some("Flutter".into()), Some("Rust".into()), None);

        let pending_err = project.record_details(owner, details.clone()).unwrap_err();
        assert!(matches!(
            pending_err,
            LifecycleError::InvalidTransition { .. }
        ));

        project.decide(Outcome::Accept).unwrap();
        let stranger_err = project
            .record_details(Uuid::new_v4(), details.clone())
            .unwrap_err();
        assert!(matches!(stranger_err, LifecycleError::NotOwner { .. }));
        assert_eq!(project.details, ProjectDetails::default());

        project.record_details(owner, details.clone()).unwrap();
        assert_eq!(project.details, details);
    }

    #[test]
    fn record_details_replaces_instead_of_merging() {
        let owner = Uuid::new_v4();
        let mut project = Project::submitted(owner, "College Attendance System", 3);
        project.decide(Outcome::Accept).unwrap();

        project
            .record_details(
                owner,
                ProjectDetails::new(Some("React".into()), Some("Axum".into()), Some("v1".into())),
            )
            .unwrap();
        project
            .record_details(owner, ProjectDetails::new(None, Some("Actix".into()), None))
            .unwrap();

        assert_eq!(project.details.frontend, None);
        assert_eq!(project.details.backend.as_deref(), Some("Actix"));
        assert_eq!(project.details.documentation, None);
    }

    #[test]
    fn blank_detail_inputs_become_none() {
        let details = ProjectDetails::new(Some("  ".into()), Some(" Rust ".into()), Some(String::new()));
        assert_eq!(details.frontend, None);
        assert_eq!(details.backend.as_deref(), Some("Rust"));
        assert_eq!(details.documentation, None);
    }
}
