//! Portal runtime configuration.
//!
//! # Responsibility
//! - Load TOML configuration with a default for every field.
//! - Reject values that would fail later at runtime (relative log dir,
//!   malformed bootstrap identity).

use crate::logging::{default_log_level, normalize_level};
use crate::model::credential::CredentialHash;
use crate::model::user::{normalize_email, normalize_name};
use crate::service::user_directory::BootstrapAdmin;
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

const DEFAULT_DATABASE_PATH: &str = "fyp_portal.sqlite3";
const DEFAULT_ADMIN_NAME: &str = "ADMIN";
const DEFAULT_ADMIN_EMAIL: &str = "admin@pms.com";
const DEFAULT_ADMIN_CREDENTIAL: &str = "admin";

/// Top-level portal configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PortalConfig {
    pub database_path: PathBuf,
    pub log_level: String,
    /// Absolute directory for rolling logs; `None` disables file logging.
    pub log_dir: Option<PathBuf>,
    /// New registrations must be approved by an admin before login.
    pub require_user_approval: bool,
    pub bootstrap_admin: BootstrapAdminConfig,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from(DEFAULT_DATABASE_PATH),
            log_level: default_log_level().to_string(),
            log_dir: None,
            require_user_approval: true,
            bootstrap_admin: BootstrapAdminConfig::default(),
        }
    }
}

/// Identity seeded when the database has no admin.
///
/// The defaults are well known; deployments should override them.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BootstrapAdminConfig {
    pub name: String,
    pub email: String,
    pub credential: String,
}

impl Default for BootstrapAdminConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_ADMIN_NAME.to_string(),
            email: DEFAULT_ADMIN_EMAIL.to_string(),
            credential: DEFAULT_ADMIN_CREDENTIAL.to_string(),
        }
    }
}

impl std::fmt::Debug for BootstrapAdminConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BootstrapAdminConfig")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("credential", &"<redacted>")
            .finish()
    }
}

impl BootstrapAdminConfig {
    /// Hashes the configured credential into a directory bootstrap request.
    pub fn to_bootstrap(&self) -> BootstrapAdmin {
        BootstrapAdmin {
            name: self.name.clone(),
            email: self.email.clone(),
            credential: CredentialHash::derive(&self.credential),
        }
    }
}

/// Configuration load/validation errors.
#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: std::io::Error },
    Parse(toml::de::Error),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "failed to parse config: {err}"),
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

impl PortalConfig {
    /// Reads and validates a TOML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Parses and validates TOML config text.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database_path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid(
                "database_path must not be empty".to_string(),
            ));
        }
        normalize_level(&self.log_level).map_err(ConfigError::Invalid)?;
        if let Some(log_dir) = &self.log_dir {
            if !log_dir.is_absolute() {
                return Err(ConfigError::Invalid(format!(
                    "log_dir must be an absolute path, got `{}`",
                    log_dir.display()
                )));
            }
        }
        let admin = &self.bootstrap_admin;
        normalize_name(&admin.name)
            .map_err(|err| ConfigError::Invalid(format!("bootstrap_admin.name: {err}")))?;
        normalize_email(&admin.email)
            .map_err(|err| ConfigError::Invalid(format!("bootstrap_admin.email: {err}")))?;
        if admin.credential.is_empty() {
            return Err(ConfigError::Invalid(
                "bootstrap_admin.credential must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, PortalConfig};
    use std::path::PathBuf;

    #[test]
    fn empty_config_uses_defaults() {
        let config = PortalConfig::from_toml_str("").unwrap();
        assert_eq!(config, PortalConfig::default());
        assert!(config.require_user_approval);
        assert_eq!(config.bootstrap_admin.email, "admin@pms.com");
    }

    #[test]
    fn partial_config_overrides_selected_fields() {
        let config = PortalConfig::from_toml_str(
            r#"
            database_path = "/var/lib/fyp/portal.sqlite3"
            require_user_approval = false

            [bootstrap_admin]
            email = "registrar@college.edu"
            "#,
        )
        .unwrap();
        assert_eq!(
            config.database_path,
            PathBuf::from("/var/lib/fyp/portal.sqlite3")
        );
        assert!(!config.require_user_approval);
        assert_eq!(config.bootstrap_admin.email, "registrar@college.edu");
        assert_eq!(config.bootstrap_admin.name, "ADMIN");
    }

    #[test]
    fn relative_log_dir_is_rejected() {
        let err = PortalConfig::from_toml_str(r#"log_dir = "logs""#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(message) if message.contains("absolute")));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = PortalConfig::from_toml_str("colour = \"blue\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn debug_output_redacts_admin_credential() {
        let rendered = format!("{:?}", PortalConfig::default());
        assert!(!rendered.contains("credential: \"admin\""));
        assert!(rendered.contains("<redacted>"));
    }
}
