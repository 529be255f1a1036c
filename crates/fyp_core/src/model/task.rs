//! Task assigned against an accepted project.

use crate::model::project::ProjectId;
use crate::model::user::UserId;
use serde::Serialize;
use uuid::Uuid;

/// Stable task identifier.
pub type TaskId = Uuid;

/// Work item assigned to a project by faculty or an admin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Task {
    pub id: TaskId,
    pub project_id: ProjectId,
    pub description: String,
    /// `None` once the assigning account has been deleted.
    pub assigned_by: Option<UserId>,
}

impl Task {
    /// Creates a task with a generated id; `description` is trimmed.
    ///
    /// Returns `None` when the description is blank.
    pub fn new(project_id: ProjectId, description: &str, assigned_by: UserId) -> Option<Self> {
        let description = description.trim();
        if description.is_empty() {
            return None;
        }
        Some(Self {
            id: Uuid::new_v4(),
            project_id,
            description: description.to_string(),
            assigned_by: Some(assigned_by),
        })
    }
}
