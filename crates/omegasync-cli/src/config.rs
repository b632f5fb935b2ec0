use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use omegasync_client::DEFAULT_URL;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
pub struct ProfileConfig {
    pub url: Option<String>,
    pub username: Option<String>,
    pub jobs: Option<usize>,
}

impl ProfileConfig {
    /// Applies `config set <key> <value>`.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "url" => self.url = Some(value.to_string()),
            "username" => self.username = Some(value.to_string()),
            "jobs" => {
                let jobs: usize = value
                    .parse()
                    .with_context(|| format!("jobs must be a positive integer, got {value:?}"))?;
                anyhow::ensure!(jobs > 0, "jobs must be a positive integer, got {value:?}");
                self.jobs = Some(jobs);
            }
            other => anyhow::bail!("Unknown config key: {other}. Valid keys: url, username, jobs"),
        }
        Ok(())
    }
}

pub type ConfigFile = HashMap<String, ProfileConfig>;

pub fn config_dir() -> Result<PathBuf> {
    let dir = dirs::home_dir()
        .context("Cannot determine home directory")?
        .join(".omegasync");
    fs::create_dir_all(&dir)?;
    Ok(dir)
}

fn config_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("config.toml"))
}

fn read_file(path: &Path) -> Result<ConfigFile> {
    if !path.exists() {
        return Ok(ConfigFile::new());
    }
    let content = fs::read_to_string(path)?;
    toml::from_str(&content).with_context(|| format!("Invalid config file {}", path.display()))
}

fn write_file(path: &Path, all: &ConfigFile) -> Result<()> {
    let content = toml::to_string_pretty(all)?;
    fs::write(path, content)?;
    Ok(())
}

pub fn load_profile(profile: &str) -> Result<ProfileConfig> {
    let mut all = read_file(&config_path()?)?;
    Ok(all.remove(profile).unwrap_or_default())
}

pub fn save_profile(profile: &str, config: &ProfileConfig) -> Result<()> {
    let path = config_path()?;
    let mut all = read_file(&path)?;
    all.insert(profile.to_string(), config.clone());
    write_file(&path, &all)
}

/// `--url`/`OMEGAUP_URL`, then the profile, then stored credentials, then
/// the public instance.
pub fn resolve_url(cli_url: Option<&str>, profile: &str) -> Result<String> {
    if let Some(url) = cli_url {
        return Ok(url.to_string());
    }
    if let Some(url) = load_profile(profile)?.url {
        return Ok(url);
    }
    if let Ok(Some(creds)) = crate::auth::load_credentials(profile) {
        return Ok(creds.url().to_string());
    }
    Ok(DEFAULT_URL.to_string())
}
