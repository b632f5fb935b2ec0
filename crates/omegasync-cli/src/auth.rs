use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use omegasync_client::Credentials;
use serde::{Deserialize, Serialize};

/// Credentials saved by `omegasync login`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum StoredCredentials {
    #[serde(rename = "password")]
    Password {
        url: String,
        username: String,
        password: String,
    },
    #[serde(rename = "token")]
    Token {
        url: String,
        api_token: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        username: Option<String>,
    },
}

impl StoredCredentials {
    pub fn url(&self) -> &str {
        match self {
            Self::Password { url, .. } | Self::Token { url, .. } => url,
        }
    }

    pub fn from_credentials(url: &str, credentials: Credentials) -> Self {
        let url = url.to_string();
        match credentials {
            Credentials::Password { username, password } => Self::Password {
                url,
                username,
                password,
            },
            Credentials::Token {
                api_token,
                username,
            } => Self::Token {
                url,
                api_token,
                username,
            },
        }
    }

    pub fn to_credentials(&self) -> Credentials {
        match self {
            Self::Password {
                username, password, ..
            } => Credentials::Password {
                username: username.clone(),
                password: password.clone(),
            },
            Self::Token {
                api_token,
                username,
                ..
            } => Credentials::Token {
                api_token: api_token.clone(),
                username: username.clone(),
            },
        }
    }
}

fn creds_path(profile: &str) -> Result<PathBuf> {
    Ok(crate::config::config_dir()?.join(format!("credentials.{profile}.json")))
}

pub fn load_credentials(profile: &str) -> Result<Option<StoredCredentials>> {
    let path = creds_path(profile)?;
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&path)?;
    let creds = serde_json::from_str(&content)
        .with_context(|| format!("Invalid credentials file {}", path.display()))?;
    Ok(Some(creds))
}

pub fn save_credentials(profile: &str, creds: &StoredCredentials) -> Result<()> {
    let path = creds_path(profile)?;
    let content = serde_json::to_string_pretty(creds)?;
    fs::write(path, content)?;
    Ok(())
}

pub fn remove_credentials(profile: &str) -> Result<bool> {
    let path = creds_path(profile)?;
    if path.exists() {
        fs::remove_file(path)?;
        Ok(true)
    } else {
        Ok(false)
    }
}

/// Credentials given on the command line or in the environment.
pub struct CliCredentials<'a> {
    pub username: Option<&'a str>,
    pub password: Option<&'a str>,
    pub api_token: Option<&'a str>,
}

/// Picks the credentials for a run.
///
/// An API token wins over a password; explicit flags win over stored
/// credentials. `default_username` comes from the profile config.
pub fn resolve(
    cli: &CliCredentials<'_>,
    default_username: Option<&str>,
    stored: Option<&StoredCredentials>,
) -> Result<Credentials> {
    let username = cli.username.or(default_username).map(str::to_string);
    if let Some(api_token) = cli.api_token {
        return Ok(Credentials::Token {
            api_token: api_token.to_string(),
            username,
        });
    }
    if let Some(password) = cli.password {
        let username = username.context("--password needs --username (or OMEGAUPUSER)")?;
        return Ok(Credentials::Password {
            username,
            password: password.to_string(),
        });
    }
    match stored {
        Some(creds) => Ok(creds.to_credentials()),
        None => anyhow::bail!(
            "No credentials. Pass --api-token or --username/--password, or run: omegasync login"
        ),
    }
}
