//! Task repository contract and SQLite implementation.

use crate::model::project::ProjectId;
use crate::model::task::{Task, TaskId};
use crate::repo::{ensure_connection_ready, parse_uuid, RepoResult};
use rusqlite::{params, Connection, Row};

const TASK_COLUMNS: &[&str] = &[
    "id",
    "project_id",
    "description",
    "assigned_by",
    "created_seq",
];

/// Repository interface for task persistence.
pub trait TaskRepository {
    fn create_task(&self, task: &Task) -> RepoResult<TaskId>;
    /// Lists tasks of one project in assignment order.
    fn list_tasks(&self, project_id: ProjectId) -> RepoResult<Vec<Task>>;
}

/// SQLite-backed task repository.
pub struct SqliteTaskRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTaskRepository<'conn> {
    /// Creates repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &[("tasks", TASK_COLUMNS)])?;
        Ok(Self { conn })
    }
}

impl TaskRepository for SqliteTaskRepository<'_> {
    fn create_task(&self, task: &Task) -> RepoResult<TaskId> {
        self.conn.execute(
            "INSERT INTO tasks (
                id,
                project_id,
                description,
                assigned_by,
                created_seq
            ) VALUES (
                ?1, ?2, ?3, ?4,
                (SELECT COALESCE(MAX(created_seq), 0) + 1 FROM tasks)
            );",
            params![
                task.id.to_string(),
                task.project_id.to_string(),
                task.description.as_str(),
                task.assigned_by.map(|id| id.to_string()),
            ],
        )?;
        Ok(task.id)
    }

    fn list_tasks(&self, project_id: ProjectId) -> RepoResult<Vec<Task>> {
        let mut stmt = self.conn.prepare(
            "SELECT
                id,
                project_id,
                description,
                assigned_by
             FROM tasks
             WHERE project_id = ?1
             ORDER BY created_seq ASC;",
        )?;
        let mut rows = stmt.query([project_id.to_string()])?;
        let mut tasks = Vec::new();
        while let Some(row) = rows.next()? {
            tasks.push(parse_task_row(row)?);
        }
        Ok(tasks)
    }
}

fn parse_task_row(row: &Row<'_>) -> RepoResult<Task> {
    let id_text: String = row.get("id")?;
    let project_text: String = row.get("project_id")?;
    let assigned_by = match row.get::<_, Option<String>>("assigned_by")? {
        Some(value) => Some(parse_uuid(&value, "tasks.assigned_by")?),
        None => None,
    };

    Ok(Task {
        id: parse_uuid(&id_text, "tasks.id")?,
        project_id: parse_uuid(&project_text, "tasks.project_id")?,
        description: row.get("description")?,
        assigned_by,
    })
}
