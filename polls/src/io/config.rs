//! Poll configuration stored in `polls.toml`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::service::{InvalidResponsePolicy, ServicePolicy};

/// Poll configuration (TOML).
///
/// Every field is optional in the file; missing fields take the defaults
/// below.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PollsConfig {
    /// Snapshot file holding every poll and response.
    pub data_path: PathBuf,

    /// Seed file applied (non-destructively) at startup.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed_path: Option<PathBuf>,

    /// Base of share links, e.g. `https://polls.example`.
    pub base_url: String,

    /// What to do with responses that match no option.
    pub invalid_responses: InvalidResponsePolicy,

    /// Reject responses to polls whose `active` flag is false.
    pub enforce_active: bool,

    pub server: ServerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
    /// Interval between SSE keep-alive comments.
    pub keep_alive_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 3000,
            keep_alive_secs: 15,
        }
    }
}

impl Default for PollsConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("polls_data.json"),
            seed_path: None,
            base_url: "http://localhost:3000".to_string(),
            invalid_responses: InvalidResponsePolicy::default(),
            enforce_active: true,
            server: ServerConfig::default(),
        }
    }
}

impl PollsConfig {
    pub fn validate(&self) -> Result<()> {
        if self.data_path.as_os_str().is_empty() {
            return Err(anyhow!("data_path must be non-empty"));
        }
        if self.base_url.trim().is_empty() {
            return Err(anyhow!("base_url must be non-empty"));
        }
        if self.server.bind.trim().is_empty() {
            return Err(anyhow!("server.bind must be non-empty"));
        }
        if self.server.port == 0 {
            return Err(anyhow!("server.port must be > 0"));
        }
        if self.server.keep_alive_secs == 0 {
            return Err(anyhow!("server.keep_alive_secs must be > 0"));
        }
        Ok(())
    }

    pub fn policy(&self) -> ServicePolicy {
        ServicePolicy {
            invalid_responses: self.invalid_responses,
            enforce_active: self.enforce_active,
        }
    }

    /// Resolve relative paths against the directory holding the config file.
    pub fn resolve_paths(mut self, config_dir: &Path) -> Self {
        if self.data_path.is_relative() {
            self.data_path = config_dir.join(&self.data_path);
        }
        if let Some(seed) = self.seed_path.take() {
            self.seed_path = Some(if seed.is_relative() {
                config_dir.join(seed)
            } else {
                seed
            });
        }
        self
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `PollsConfig::default()`.
pub fn load_config(path: &Path) -> Result<PollsConfig> {
    if !path.exists() {
        let cfg = PollsConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: PollsConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &PollsConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    write_atomic(path, &buf)
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
    }
    let tmp_path = path.with_extension("toml.tmp");
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp config {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace config {}", path.display()))?;
    Ok(())
}
