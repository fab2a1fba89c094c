use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::client::Session;

pub const DEFAULT_SERVER_URL: &str = "http://localhost:3000";

/// Persisted CLI state: which server to talk to and the session for it
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_url: Option<String>,
    #[serde(default)]
    pub session: Session,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl EnvironmentConfig {
    pub fn server_url(&self) -> &str {
        self.server_url.as_deref().unwrap_or(DEFAULT_SERVER_URL)
    }
}

/// Reads and writes `env.json` in the CLI config directory
#[derive(Debug, Clone)]
pub struct ConfigStore {
    dir: PathBuf,
}

impl ConfigStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `$SHELF_CLI_CONFIG_DIR`, else `~/.config/shelf/cli`
    pub fn from_env() -> anyhow::Result<Self> {
        let dir = if let Ok(custom_dir) = std::env::var("SHELF_CLI_CONFIG_DIR") {
            PathBuf::from(custom_dir)
        } else {
            let home = std::env::var("HOME").map_err(|_| anyhow::anyhow!("HOME environment variable not set"))?;
            PathBuf::from(home).join(".config").join("shelf").join("cli")
        };
        Ok(Self::new(dir))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn env_file(&self) -> PathBuf {
        self.dir.join("env.json")
    }

    pub fn load(&self) -> anyhow::Result<EnvironmentConfig> {
        let env_file = self.env_file();
        if !env_file.exists() {
            return Ok(EnvironmentConfig::default());
        }

        let content = fs::read_to_string(&env_file).with_context(|| format!("failed to read {}", env_file.display()))?;
        let config = serde_json::from_str(&content).with_context(|| format!("failed to parse {}", env_file.display()))?;
        Ok(config)
    }

    pub fn save(&self, config: &mut EnvironmentConfig) -> anyhow::Result<()> {
        fs::create_dir_all(&self.dir).with_context(|| format!("failed to create {}", self.dir.display()))?;

        config.updated_at = Some(Utc::now());
        let env_file = self.env_file();
        fs::write(&env_file, serde_json::to_string_pretty(config)?)
            .with_context(|| format!("failed to write {}", env_file.display()))?;

        // Holds a bearer token
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&env_file, fs::Permissions::from_mode(0o600))?;
        }
        Ok(())
    }
}
