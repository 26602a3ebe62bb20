//! Infrastructure implementation of the `ConfigStore` port.

use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::application::ports::ConfigStore;
use crate::domain::config::{AgentConfig, validate_config};

/// Environment variable overriding the config file location.
pub const CONFIG_ENV: &str = "JOB_AGENT_CONFIG";

const DEFAULT_CONFIG_PATH: &str = "/etc/job-agent/config.yaml";

/// Production implementation of `ConfigStore` that uses a YAML file on disk.
pub struct YamlConfigStore {
    explicit: Option<PathBuf>,
    default_path: PathBuf,
}

impl YamlConfigStore {
    /// An explicit path wins over `JOB_AGENT_CONFIG` and the default location.
    #[must_use]
    pub fn new(explicit: Option<PathBuf>) -> Self {
        Self {
            explicit: explicit.or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from)),
            default_path: PathBuf::from(DEFAULT_CONFIG_PATH),
        }
    }
}

impl ConfigStore for YamlConfigStore {
    fn load(&self) -> Result<AgentConfig> {
        let path = self.path();
        if !path.exists() {
            // Only the default location may be absent; a named file must exist.
            if self.explicit.is_some() {
                anyhow::bail!("config file {} does not exist", path.display());
            }
            return Ok(AgentConfig::default());
        }
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("cannot read {}", path.display()))?;
        let config: AgentConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("cannot parse {}", path.display()))?;
        validate_config(&config).with_context(|| format!("invalid config {}", path.display()))?;
        Ok(config)
    }

    fn path(&self) -> PathBuf {
        self.explicit
            .clone()
            .unwrap_or_else(|| self.default_path.clone())
    }
}
