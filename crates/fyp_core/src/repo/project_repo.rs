//! Project repository contract and SQLite implementation.
//!
//! # Invariants
//! - Status transitions are guarded by the expected current status in the
//!   `WHERE` clause, so concurrent deciders cannot both win.
//! - Detail writes are guarded by `status = 'ACCEPTED'` and owner id, and
//!   replace all three columns in one statement.
//! - Creation order is tracked by a monotonic `created_seq` for stable listing.

use crate::model::project::{Project, ProjectDetails, ProjectId, ProjectStatus};
use crate::model::user::UserId;
use crate::repo::{ensure_connection_ready, parse_uuid, RepoError, RepoResult};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};

const PROJECT_SELECT_SQL: &str = "SELECT
    id,
    title,
    score,
    status,
    student_id,
    frontend,
    backend,
    documentation
FROM projects";

const PROJECT_COLUMNS: &[&str] = &[
    "id",
    "title",
    "score",
    "status",
    "student_id",
    "frontend",
    "backend",
    "documentation",
    "created_seq",
];

/// Sort order for project listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ProjectOrder {
    /// Submission order, oldest first.
    #[default]
    Oldest,
    /// Submission order, newest first.
    Newest,
    /// Highest score first, ties broken by submission order.
    ScoreDesc,
}

/// Query options for listing projects.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectListQuery {
    pub status: Option<ProjectStatus>,
    pub student_id: Option<UserId>,
    pub order: ProjectOrder,
    pub limit: Option<u32>,
}

/// Repository interface for project persistence.
pub trait ProjectRepository {
    fn create_project(&self, project: &Project) -> RepoResult<ProjectId>;
    fn get_project(&self, id: ProjectId) -> RepoResult<Option<Project>>;
    /// Moves `id` from `from` to `to`. Returns `false` when the row is not in `from`.
    fn transition_status(
        &self,
        id: ProjectId,
        from: ProjectStatus,
        to: ProjectStatus,
    ) -> RepoResult<bool>;
    /// Replaces details when `id` is accepted and owned by `owner`.
    /// Returns `false` when the guard does not match.
    fn replace_details(
        &self,
        id: ProjectId,
        owner: UserId,
        details: &ProjectDetails,
    ) -> RepoResult<bool>;
    fn list_projects(&self, query: &ProjectListQuery) -> RepoResult<Vec<Project>>;
}

/// SQLite-backed project repository.
pub struct SqliteProjectRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteProjectRepository<'conn> {
    /// Creates repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &[("projects", PROJECT_COLUMNS)])?;
        Ok(Self { conn })
    }
}

impl ProjectRepository for SqliteProjectRepository<'_> {
    fn create_project(&self, project: &Project) -> RepoResult<ProjectId> {
        self.conn.execute(
            "INSERT INTO projects (
                id,
                title,
                score,
                status,
                student_id,
                frontend,
                backend,
                documentation,
                created_seq
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8,
                (SELECT COALESCE(MAX(created_seq), 0) + 1 FROM projects)
            );",
            params![
                project.id.to_string(),
                project.title.as_str(),
                project.score,
                project.status.as_str(),
                project.student_id.to_string(),
                project.details.frontend.as_deref(),
                project.details.backend.as_deref(),
                project.details.documentation.as_deref(),
            ],
        )?;
        Ok(project.id)
    }

    fn get_project(&self, id: ProjectId) -> RepoResult<Option<Project>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{PROJECT_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_project_row(row)?)),
            None => Ok(None),
        }
    }

    fn transition_status(
        &self,
        id: ProjectId,
        from: ProjectStatus,
        to: ProjectStatus,
    ) -> RepoResult<bool> {
        let changed = self.conn.execute(
            "UPDATE projects
             SET
                status = ?3,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1
               AND status = ?2;",
            params![id.to_string(), from.as_str(), to.as_str()],
        )?;
        Ok(changed == 1)
    }

    fn replace_details(
        &self,
        id: ProjectId,
        owner: UserId,
        details: &ProjectDetails,
    ) -> RepoResult<bool> {
        let changed = self.conn.execute(
            "UPDATE projects
             SET
                frontend = ?3,
                backend = ?4,
                documentation = ?5,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1
               AND student_id = ?2
               AND status = 'ACCEPTED';",
            params![
                id.to_string(),
                owner.to_string(),
                details.frontend.as_deref(),
                details.backend.as_deref(),
                details.documentation.as_deref(),
            ],
        )?;
        Ok(changed == 1)
    }

    fn list_projects(&self, query: &ProjectListQuery) -> RepoResult<Vec<Project>> {
        let mut sql = format!("{PROJECT_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(status) = query.status {
            sql.push_str(" AND status = ?");
            bind_values.push(Value::Text(status.as_str().to_string()));
        }
        if let Some(student_id) = query.student_id {
            sql.push_str(" AND student_id = ?");
            bind_values.push(Value::Text(student_id.to_string()));
        }

        sql.push_str(match query.order {
            ProjectOrder::Oldest => " ORDER BY created_seq ASC",
            ProjectOrder::Newest => " ORDER BY created_seq DESC",
            ProjectOrder::ScoreDesc => " ORDER BY score DESC, created_seq ASC",
        });

        if let Some(limit) = query.limit {
            sql.push_str(" LIMIT ?");
            bind_values.push(Value::Integer(i64::from(limit)));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut projects = Vec::new();
        while let Some(row) = rows.next()? {
            projects.push(parse_project_row(row)?);
        }
        Ok(projects)
    }
}

fn parse_project_row(row: &Row<'_>) -> RepoResult<Project> {
    let id_text: String = row.get("id")?;
    let student_text: String = row.get("student_id")?;

    let status_text: String = row.get("status")?;
    let status = parse_status(&status_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid status `{status_text}` in projects.status"))
    })?;

    let score: i64 = row.get("score")?;
    let score = u32::try_from(score).map_err(|_| {
        RepoError::InvalidData(format!("invalid score `{score}` in projects.score"))
    })?;

    Ok(Project {
        id: parse_uuid(&id_text, "projects.id")?,
        title: row.get("title")?,
        score,
        status,
        student_id: parse_uuid(&student_text, "projects.student_id")?,
        details: ProjectDetails {
            frontend: row.get("frontend")?,
            backend: row.get("backend")?,
            documentation: row.get("documentation")?,
        },
    })
}

fn parse_status(value: &str) -> Option<ProjectStatus> {
    match value {
        "PENDING" => Some(ProjectStatus::Pending),
        "ACCEPTED" => Some(ProjectStatus::Accepted),
        "REJECTED" => Some(ProjectStatus::Rejected),
        _ => None,
    }
}
