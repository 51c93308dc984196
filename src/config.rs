//! Configuration for the back-office engine
//!
//! Two layers:
//! - [`Args`] - CLI arguments and environment variables (clap)
//! - [`AdminConfig`] - TOML file with serde defaults; a missing file means
//!   defaults

use std::path::{Path, PathBuf};

use chrono::format::{Item, StrftimeItems};
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use crate::error::AdminError;
use crate::permissions::Role;
use crate::renderer::FormMode;

/// Back-office CLI - inspect and exercise the resource engine
#[derive(Parser, Debug, Clone)]
#[command(name = "backoffice")]
#[command(about = "Declarative back-office resource engine")]
pub struct Args {
    /// Path to the TOML config file
    #[arg(short, long, env = "BACKOFFICE_CONFIG")]
    pub config: Option<PathBuf>,

    /// JSON seed data for the in-memory backend (overrides config)
    #[arg(long, env = "BACKOFFICE_SEED")]
    pub seed: Option<PathBuf>,

    /// Acting user
    #[arg(long, env = "BACKOFFICE_USER", default_value = "cli")]
    pub user: String,

    /// Active organization of the acting user
    #[arg(long, env = "BACKOFFICE_ORG")]
    pub organization: Option<String>,

    /// Role of the acting user in the active organization
    #[arg(long, env = "BACKOFFICE_ROLE", default_value = "owner")]
    pub role: String,

    /// Treat the acting user as a platform administrator
    #[arg(long, env = "BACKOFFICE_PLATFORM_ADMIN", default_value = "false")]
    pub platform_admin: bool,

    /// List page size override
    #[arg(long, env = "BACKOFFICE_PAGE_SIZE")]
    pub page_size: Option<usize>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Emit logs as JSON
    #[arg(long, env = "LOG_JSON", default_value = "false")]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// List configured resources and groups
    Resources,

    /// Print the rendered form widgets of a resource as JSON
    Describe {
        resource: String,

        #[arg(long, value_enum, default_value = "create")]
        mode: ModeArg,
    },

    /// Render a resource's list screen against the seed data
    List {
        resource: String,

        #[arg(long, default_value = "1")]
        page: usize,

        /// Raw navigation query, e.g. "tab=invitees&organizationId=7"
        #[arg(long)]
        query: Option<String>,
    },

    /// Bulk import invitees from a JSON array of rows
    Import {
        rows: PathBuf,

        #[arg(long)]
        org: String,

        /// Batch size override
        #[arg(long)]
        batch_size: Option<usize>,
    },
}

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeArg {
    Create,
    Edit,
}

impl From<ModeArg> for FormMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Create => FormMode::Create,
            ModeArg::Edit => FormMode::Edit,
        }
    }
}

impl Args {
    /// Reject impossible argument combinations
    pub fn validate(&self) -> Result<(), String> {
        if let Err(e) = Role::parse(&self.role) {
            return Err(e.to_string());
        }
        if self.page_size == Some(0) {
            return Err("page size must be greater than zero".to_string());
        }
        match &self.command {
            Command::Import { batch_size: Some(0), .. } => {
                Err("batch size must be greater than zero".to_string())
            }
            Command::Import { org, .. } if org.trim().is_empty() => {
                Err("--org must not be empty".to_string())
            }
            Command::List { page: 0, .. } => Err("page numbers start at 1".to_string()),
            _ => Ok(()),
        }
    }

    /// Load the config file (or defaults) and apply CLI overrides
    pub fn admin_config(&self) -> Result<AdminConfig, AdminError> {
        let mut config = match &self.config {
            Some(path) => AdminConfig::load(path)?,
            None => AdminConfig::default(),
        };
        if let Some(size) = self.page_size {
            config.list.page_size = size;
        }
        if let Some(seed) = &self.seed {
            config.seed_path = Some(seed.clone());
        }
        if let Command::Import {
            batch_size: Some(size),
            ..
        } = &self.command
        {
            config.import.batch_size = *size;
        }
        config.validate()?;
        Ok(config)
    }
}

// ============================================================================
// File configuration
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminConfig {
    #[serde(default)]
    pub list: ListSettings,

    #[serde(default)]
    pub relations: RelationSettings,

    #[serde(default)]
    pub import: ImportSettings,

    /// JSON seed data for the in-memory backend
    #[serde(default)]
    pub seed_path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListSettings {
    /// Rows per page when a resource doesn't set its own
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// chrono format string for date-time cells
    #[serde(default = "default_datetime_format")]
    pub datetime_format: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationSettings {
    /// Maximum rows fetched per relation select
    #[serde(default = "default_option_limit")]
    pub option_limit: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportSettings {
    /// Rows upserted per batch
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Field rows are matched on
    #[serde(default = "default_natural_key")]
    pub natural_key: String,
}

fn default_page_size() -> usize {
    25
}

fn default_datetime_format() -> String {
    "%Y-%m-%d %H:%M".to_string()
}

fn default_option_limit() -> usize {
    500
}

fn default_batch_size() -> usize {
    100
}

fn default_natural_key() -> String {
    "email".to_string()
}

impl Default for ListSettings {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            datetime_format: default_datetime_format(),
        }
    }
}

impl Default for RelationSettings {
    fn default() -> Self {
        Self {
            option_limit: default_option_limit(),
        }
    }
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            natural_key: default_natural_key(),
        }
    }
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            list: ListSettings::default(),
            relations: RelationSettings::default(),
            import: ImportSettings::default(),
            seed_path: None,
        }
    }
}

impl AdminConfig {
    /// Load config from file; a missing file yields defaults
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, AdminError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Save config to file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), AdminError> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), AdminError> {
        if self.list.page_size == 0 {
            return Err(AdminError::Config("list.page_size must be greater than zero".into()));
        }
        if !is_valid_datetime_format(&self.list.datetime_format) {
            return Err(AdminError::Config(format!(
                "list.datetime_format '{}' is not a valid strftime format",
                self.list.datetime_format
            )));
        }
        if self.relations.option_limit == 0 {
            return Err(AdminError::Config(
                "relations.option_limit must be greater than zero".into(),
            ));
        }
        if self.import.batch_size == 0 {
            return Err(AdminError::Config("import.batch_size must be greater than zero".into()));
        }
        if self.import.natural_key.trim().is_empty() {
            return Err(AdminError::Config("import.natural_key must not be empty".into()));
        }
        Ok(())
    }
}

fn is_valid_datetime_format(format: &str) -> bool {
    !StrftimeItems::new(format).any(|item| matches!(item, Item::Error))
}
