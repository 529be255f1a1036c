//! `fyp` command-line boundary over the portal service.
//!
//! # Responsibility
//! - Load configuration, open the portal database and seed the admin.
//! - Authenticate once per invocation from `--email`/`--password`.
//! - Print results as JSON on stdout and failures on stderr.

use clap::{Args, Parser, Subcommand, ValueEnum};
use fyp_core::{
    evaluate_title, init_logging, open_db, open_sqlite_portal, ConfigError, CredentialHash,
    DbError, Outcome, PortalConfig, PortalError, ProjectDetails, Registration, RepoError,
    RequestContext, Role, SqlitePortal, UserUpdate,
};
use log::info;
use serde::Serialize;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::process::ExitCode;
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(name = "fyp", version, about = "Final-year project portal CLI")]
struct Cli {
    #[arg(long, global = true, help = "Path to a TOML config file")]
    config: Option<PathBuf>,
    #[arg(long, global = true, help = "Override the configured database path")]
    db: Option<PathBuf>,
    #[command(flatten)]
    login: LoginArgs,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug)]
struct LoginArgs {
    #[arg(long, global = true, help = "Email of the acting account")]
    email: Option<String>,
    #[arg(long, global = true, help = "Password of the acting account")]
    password: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create the schema and seed the bootstrap admin.
    Init,
    /// Score a title without submitting it.
    Evaluate { title: String },
    Register {
        #[arg(long)]
        name: String,
        #[arg(long = "new-email")]
        new_email: String,
        #[arg(long = "new-password")]
        new_password: String,
        #[arg(long, value_enum)]
        role: RoleArg,
    },
    ApproveUser { user_id: Uuid },
    EditUser {
        user_id: Uuid,
        #[arg(long)]
        name: String,
        #[arg(long = "new-email")]
        new_email: String,
        #[arg(long = "new-password")]
        new_password: Option<String>,
    },
    DeleteUser { user_id: Uuid },
    ListUsers {
        #[arg(long, value_enum)]
        role: RoleArg,
    },
    ListPendingUsers,
    SubmitTitle { title: String },
    Decide {
        project_id: Uuid,
        #[arg(value_enum)]
        outcome: OutcomeArg,
    },
    RecordDetails {
        project_id: Uuid,
        #[arg(long)]
        frontend: Option<String>,
        #[arg(long)]
        backend: Option<String>,
        #[arg(long)]
        documentation: Option<String>,
    },
    AssignTask { project_id: Uuid, description: String },
    Tasks { project_id: Uuid },
    ListPending,
    ListTop,
    MyProjects,
    ViewProject { project_id: Uuid },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum RoleArg {
    Student,
    Faculty,
    External,
    Admin,
}

impl From<RoleArg> for Role {
    fn from(value: RoleArg) -> Self {
        match value {
            RoleArg::Student => Role::Student,
            RoleArg::Faculty => Role::Faculty,
            RoleArg::External => Role::External,
            RoleArg::Admin => Role::Admin,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutcomeArg {
    Accept,
    Reject,
}

impl From<OutcomeArg> for Outcome {
    fn from(value: OutcomeArg) -> Self {
        match value {
            OutcomeArg::Accept => Outcome::Accept,
            OutcomeArg::Reject => Outcome::Reject,
        }
    }
}

#[derive(Debug)]
enum CliError {
    Config(ConfigError),
    Logging(String),
    Db(DbError),
    Repo(RepoError),
    Portal(PortalError),
    Output(serde_json::Error),
}

impl CliError {
    fn code(&self) -> &'static str {
        match self {
            Self::Config(_) => "config_error",
            Self::Logging(_) => "logging_error",
            Self::Db(_) | Self::Repo(_) => "storage_error",
            Self::Portal(err) => err.code(),
            Self::Output(_) => "output_error",
        }
    }
}

impl Display for CliError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(err) => write!(f, "{err}"),
            Self::Logging(message) => write!(f, "failed to initialize logging: {message}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::Portal(err) => write!(f, "{err}"),
            Self::Output(err) => write!(f, "failed to render output: {err}"),
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<DbError> for CliError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<RepoError> for CliError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<PortalError> for CliError {
    fn from(value: PortalError) -> Self {
        Self::Portal(value)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(value: serde_json::Error) -> Self {
        Self::Output(value)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error[{}]: {err}", err.code());
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let mut config = match &cli.config {
        Some(path) => PortalConfig::load(path)?,
        None => PortalConfig::default(),
    };
    if let Some(db) = cli.db {
        config.database_path = db;
    }
    if let Some(log_dir) = &config.log_dir {
        init_logging(&config.log_level, log_dir).map_err(CliError::Logging)?;
    }

    // `evaluate` is pure and must not touch the database.
    if let Commands::Evaluate { title } = &cli.command {
        return print_json(&evaluate_title(title));
    }

    let conn = open_db(&config.database_path)?;
    let portal = open_sqlite_portal(&conn, config.require_user_approval)?;
    let seeded = portal.initialize(&config.bootstrap_admin.to_bootstrap())?;
    info!(
        "event=cli_start module=cli status=ok command={} seeded_admin={}",
        command_name(&cli.command),
        seeded.is_some()
    );

    if let Commands::Init = cli.command {
        return print_json(&serde_json::json!({
            "database": config.database_path,
            "seeded_admin": seeded.map(|admin| admin.id),
        }));
    }

    let ctx = authenticate(&portal, &cli.login)?;
    dispatch(&portal, &ctx, cli.command)
}

fn authenticate(portal: &SqlitePortal<'_>, login: &LoginArgs) -> Result<RequestContext, CliError> {
    match (&login.email, &login.password) {
        (Some(email), Some(password)) => {
            let session = portal.login(email, &CredentialHash::derive(password))?;
            Ok(RequestContext::authenticated(session))
        }
        _ => Ok(RequestContext::anonymous()),
    }
}

fn dispatch(
    portal: &SqlitePortal<'_>,
    ctx: &RequestContext,
    command: Commands,
) -> Result<(), CliError> {
    match command {
        Commands::Init | Commands::Evaluate { .. } => Ok(()),
        Commands::Register {
            name,
            new_email,
            new_password,
            role,
        } => print_json(&portal.register(
            ctx,
            Registration {
                name,
                email: new_email,
                credential: CredentialHash::derive(&new_password),
                role: role.into(),
            },
        )?),
        Commands::ApproveUser { user_id } => print_json(&portal.approve_user(ctx, user_id)?),
        Commands::EditUser {
            user_id,
            name,
            new_email,
            new_password,
        } => print_json(&portal.edit_user(
            ctx,
            user_id,
            UserUpdate {
                name,
                email: new_email,
                credential: new_password.as_deref().map(CredentialHash::derive),
            },
        )?),
        Commands::DeleteUser { user_id } => {
            portal.delete_user(ctx, user_id)?;
            print_json(&serde_json::json!({ "deleted": user_id }))
        }
        Commands::ListUsers { role } => print_json(&portal.list_users_by_role(ctx, role.into())?),
        Commands::ListPendingUsers => print_json(&portal.list_pending_users(ctx)?),
        Commands::SubmitTitle { title } => print_json(&portal.submit_title(ctx, &title)?),
        Commands::Decide {
            project_id,
            outcome,
        } => print_json(&portal.decide(ctx, project_id, outcome.into())?),
        Commands::RecordDetails {
            project_id,
            frontend,
            backend,
            documentation,
        } => print_json(&portal.record_details(
            ctx,
            project_id,
            ProjectDetails::new(frontend, backend, documentation),
        )?),
        Commands::AssignTask {
            project_id,
            description,
        } => print_json(&portal.assign_task(ctx, project_id, &description)?),
        Commands::Tasks { project_id } => print_json(&portal.list_tasks(ctx, project_id)?),
        Commands::ListPending => print_json(&portal.list_pending_projects(ctx)?),
        Commands::ListTop => print_json(&portal.list_top_accepted(ctx)?),
        Commands::MyProjects => print_json(&portal.list_my_projects(ctx)?),
        Commands::ViewProject { project_id } => print_json(&portal.view_project(ctx, project_id)?),
    }
}

fn command_name(command: &Commands) -> &'static str {
    match command {
        Commands::Init => "init",
        Commands::Evaluate { .. } => "evaluate",
        Commands::Register { .. } => "register",
        Commands::ApproveUser { .. } => "approve-user",
        Commands::EditUser { .. } => "edit-user",
        Commands::DeleteUser { .. } => "delete-user",
        Commands::ListUsers { .. } => "list-users",
        Commands::ListPendingUsers => "list-pending-users",
        Commands::SubmitTitle { .. } => "submit-title",
        Commands::Decide { .. } => "decide",
        Commands::RecordDetails { .. } => "record-details",
        Commands::AssignTask { .. } => "assign-task",
        Commands::Tasks { .. } => "tasks",
        Commands::ListPending => "list-pending",
        Commands::ListTop => "list-top",
        Commands::MyProjects => "my-projects",
        Commands::ViewProject { .. } => "view-project",
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{Cli, Commands};
    use clap::{CommandFactory, Parser};

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_login_flags_follow_subcommand() {
        let cli = Cli::try_parse_from([
            "fyp",
            "submit-title",
            "Online Library Management System",
            "--email",
            "alice@college.edu",
            "--password",
            "secret",
        ])
        .unwrap();
        assert_eq!(cli.login.email.as_deref(), Some("alice@college.edu"));
        assert!(matches!(cli.command, Commands::SubmitTitle { .. }));
    }

    #[test]
    fn decide_requires_known_outcome() {
        let project_id = "67e55044-10b1-426f-9247-bb680e5fe0c8";
        assert!(Cli::try_parse_from(["fyp", "decide", project_id, "maybe"]).is_err());
        assert!(Cli::try_parse_from(["fyp", "decide", project_id, "accept"]).is_ok());
    }
}
