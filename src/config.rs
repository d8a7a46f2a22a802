use crate::models::UserAccount;
use anyhow::{Context, Result};
use std::env;
use std::path::{Path, PathBuf};

const DEFAULT_MODEL: &str = "gemini-2.0-flash";

#[derive(Debug, Clone)]
pub struct Config {
    pub students_url: String,
    pub schedules_url: String,
    pub users: Vec<UserAccount>,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub log_file: PathBuf,
    pub export_dir: PathBuf,
}

/// Path overrides that take precedence over the environment.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub users_file: Option<PathBuf>,
    pub log_file: Option<PathBuf>,
    pub export_dir: Option<PathBuf>,
}

fn required(name: &str) -> Result<String> {
    let value = env::var(name)
        .with_context(|| format!("{} not found. Please set it in .env file or environment", name))?;
    if value.trim().is_empty() {
        anyhow::bail!("{} is empty", name);
    }
    Ok(value.trim().to_string())
}

fn optional(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl Config {
    pub fn load(overrides: Overrides) -> Result<Self> {
        // Load .env file if it exists
        dotenv::dotenv().ok();

        let students_url = required("ROSTER_STUDENTS_URL")?;
        let schedules_url = required("ROSTER_SCHEDULES_URL")?;

        let users_file = overrides
            .users_file
            .or_else(|| optional("ROSTER_USERS_FILE").map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from("users.yaml"));
        let users = load_users(&users_file)?;

        let log_file = overrides
            .log_file
            .or_else(|| optional("ROSTER_LOG_FILE").map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from("roster.log"));

        let export_dir = overrides
            .export_dir
            .or_else(|| optional("ROSTER_EXPORT_DIR").map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from("."));

        Ok(Config {
            students_url,
            schedules_url,
            users,
            gemini_api_key: optional("GEMINI_API_KEY"),
            gemini_model: optional("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            log_file,
            export_dir,
        })
    }
}

pub fn load_users(path: &Path) -> Result<Vec<UserAccount>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read users file {}", path.display()))?;
    parse_users(&content).with_context(|| format!("Invalid users file {}", path.display()))
}

/// Parse a YAML list of `{username, password, name}` accounts.
pub fn parse_users(yaml: &str) -> Result<Vec<UserAccount>> {
    let users: Vec<UserAccount> =
        serde_yaml::from_str(yaml).context("Failed to parse users YAML")?;

    if users.is_empty() {
        anyhow::bail!("No user accounts configured");
    }
    if let Some(user) = users.iter().find(|u| u.username.trim().is_empty()) {
        anyhow::bail!("User account {:?} has an empty username", user.name);
    }

    Ok(users)
}
