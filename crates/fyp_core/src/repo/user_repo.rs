//! User repository contract and SQLite implementation.
//!
//! # Invariants
//! - Write paths call `User::validate()` before SQL mutations.
//! - Email uniqueness is checked inside an `IMMEDIATE` transaction and
//!   backed by the `users.email` unique index.
//! - At most one admin is ever seeded by `create_admin_if_absent`.

use crate::model::credential::CredentialHash;
use crate::model::user::{Role, User, UserId};
use crate::repo::{
    bool_to_int, ensure_connection_ready, int_to_bool, is_unique_violation, parse_uuid,
    RepoError, RepoResult,
};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row, Transaction, TransactionBehavior};

const USER_SELECT_SQL: &str = "SELECT
    id,
    name,
    email,
    credential,
    role,
    approved
FROM users";

const USER_COLUMNS: &[&str] = &["id", "name", "email", "credential", "role", "approved"];

/// Filter options for listing users.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UserListQuery {
    pub role: Option<Role>,
    pub approved: Option<bool>,
}

/// Repository interface for user persistence.
pub trait UserRepository {
    /// Inserts a user; fails with `DuplicateEmail` when the email is taken.
    fn create_user(&self, user: &User) -> RepoResult<UserId>;
    /// Inserts `admin` only when no admin row exists. Returns whether it was inserted.
    fn create_admin_if_absent(&self, admin: &User) -> RepoResult<bool>;
    /// Replaces name, email, credential and approval of an existing user.
    fn update_user(&self, user: &User) -> RepoResult<()>;
    fn get_user(&self, id: UserId) -> RepoResult<Option<User>>;
    /// Looks up by normalized email.
    fn find_by_email(&self, email: &str) -> RepoResult<Option<User>>;
    /// Lists users ordered by `name ASC, id ASC`.
    fn list_users(&self, query: &UserListQuery) -> RepoResult<Vec<User>>;
    /// Hard-deletes a user; owned projects and their tasks cascade.
    fn delete_user(&self, id: UserId) -> RepoResult<()>;
    fn count_admins(&self) -> RepoResult<u32>;
}

/// SQLite-backed user repository.
pub struct SqliteUserRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteUserRepository<'conn> {
    /// Creates repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &[("users", USER_COLUMNS)])?;
        Ok(Self { conn })
    }
}

impl UserRepository for SqliteUserRepository<'_> {
    fn create_user(&self, user: &User) -> RepoResult<UserId> {
        user.validate()?;

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        if email_taken(&tx, &user.email, None)? {
            return Err(RepoError::DuplicateEmail(user.email.clone()));
        }
        insert_user(&tx, user)?;
        tx.commit()?;
        Ok(user.id)
    }

    fn create_admin_if_absent(&self, admin: &User) -> RepoResult<bool> {
        if admin.role != Role::Admin {
            return Err(RepoError::InvalidData(
                "bootstrap account must carry the ADMIN role".to_string(),
            ));
        }
        admin.validate()?;

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let admins: u32 = tx.query_row(
            "SELECT COUNT(*) FROM users WHERE role = 'ADMIN';",
            [],
            |row| row.get(0),
        )?;
        if admins > 0 {
            return Ok(false);
        }
        if email_taken(&tx, &admin.email, None)? {
            return Err(RepoError::DuplicateEmail(admin.email.clone()));
        }
        insert_user(&tx, admin)?;
        tx.commit()?;
        Ok(true)
    }

    fn update_user(&self, user: &User) -> RepoResult<()> {
        user.validate()?;

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        if email_taken(&tx, &user.email, Some(user.id))? {
            return Err(RepoError::DuplicateEmail(user.email.clone()));
        }
        let changed = tx.execute(
            "UPDATE users
             SET
                name = ?2,
                email = ?3,
                credential = ?4,
                approved = ?5,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            params![
                user.id.to_string(),
                user.name.as_str(),
                user.email.as_str(),
                user.credential.as_str(),
                bool_to_int(user.approved),
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::UserNotFound(user.id));
        }
        tx.commit()?;
        Ok(())
    }

    fn get_user(&self, id: UserId) -> RepoResult<Option<User>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{USER_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_user_row(row)?)),
            None => Ok(None),
        }
    }

    fn find_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{USER_SELECT_SQL} WHERE email = ?1;"))?;
        let mut rows = stmt.query([email])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_user_row(row)?)),
            None => Ok(None),
        }
    }

    fn list_users(&self, query: &UserListQuery) -> RepoResult<Vec<User>> {
        let mut sql = format!("{USER_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(role) = query.role {
            sql.push_str(" AND role = ?");
            bind_values.push(Value::Text(role.as_str().to_string()));
        }
        if let Some(approved) = query.approved {
            sql.push_str(" AND approved = ?");
            bind_values.push(Value::Integer(bool_to_int(approved)));
        }
        sql.push_str(" ORDER BY name ASC, id ASC");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut users = Vec::new();
        while let Some(row) = rows.next()? {
            users.push(parse_user_row(row)?);
        }
        Ok(users)
    }

    fn delete_user(&self, id: UserId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM users WHERE id = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::UserNotFound(id));
        }
        Ok(())
    }

    fn count_admins(&self) -> RepoResult<u32> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM users WHERE role = 'ADMIN';",
            [],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}

fn insert_user(tx: &Transaction<'_>, user: &User) -> RepoResult<()> {
    let inserted = tx.execute(
        "INSERT INTO users (
            id,
            name,
            email,
            credential,
            role,
            approved
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
        params![
            user.id.to_string(),
            user.name.as_str(),
            user.email.as_str(),
            user.credential.as_str(),
            user.role.as_str(),
            bool_to_int(user.approved),
        ],
    );
    match inserted {
        Ok(_) => Ok(()),
        Err(err) if is_unique_violation(&err) => Err(RepoError::DuplicateEmail(user.email.clone())),
        Err(err) => Err(err.into()),
    }
}

fn email_taken(tx: &Transaction<'_>, email: &str, except: Option<UserId>) -> RepoResult<bool> {
    let taken: i64 = tx.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM users
            WHERE email = ?1
              AND (?2 IS NULL OR id <> ?2)
        );",
        params![email, except.map(|id| id.to_string())],
        |row| row.get(0),
    )?;
    Ok(taken == 1)
}

fn parse_user_row(row: &Row<'_>) -> RepoResult<User> {
    let id_text: String = row.get("id")?;
    let id = parse_uuid(&id_text, "users.id")?;

    let role_text: String = row.get("role")?;
    let role = Role::parse(&role_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid role `{role_text}` in users.role"))
    })?;

    let credential_text: String = row.get("credential")?;
    let credential = CredentialHash::from_stored(&credential_text).ok_or_else(|| {
        RepoError::InvalidData(format!("malformed credential hash for user {id}"))
    })?;

    let user = User {
        id,
        name: row.get("name")?,
        email: row.get("email")?,
        credential,
        role,
        approved: int_to_bool(row.get("approved")?, "users.approved")?,
    };
    user.validate()?;
    Ok(user)
}
