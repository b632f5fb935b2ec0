use std::time::Duration;

use omegasync_core::{Attachment, Ident, Result, SyncError};
use serde_json::Value;

pub const DEFAULT_URL: &str = "https://omegaup.com";
pub const DEFAULT_METADATA_TIMEOUT: Duration = Duration::from_secs(60);
pub const DEFAULT_UPLOAD_TIMEOUT: Duration = Duration::from_secs(600);

const REDACTED_KEYS: &[&str] = &["password", "auth_token", "ouat"];

/// Connection settings for [`OmegaUpClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    /// Applies to every call except archive uploads.
    pub metadata_timeout: Duration,
    pub upload_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_URL.to_string(),
            metadata_timeout: DEFAULT_METADATA_TIMEOUT,
            upload_timeout: DEFAULT_UPLOAD_TIMEOUT,
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            ..Self::default()
        }
    }
}

/// How the client proves its identity.
#[derive(Clone)]
pub enum Credentials {
    /// Exchanged for a session token once, at connect time.
    Password { username: String, password: String },
    /// Long-lived API token sent as a header. The username is optional and
    /// otherwise resolved from the current session.
    Token {
        api_token: String,
        username: Option<String>,
    },
}

#[derive(Clone)]
enum AuthHeader {
    Session { auth_token: String },
    Token { api_token: String },
}

/// A failed platform call, before it is classified for a caller.
#[derive(Debug, Clone)]
pub(crate) struct ApiFailure {
    pub endpoint: String,
    pub code: Option<u16>,
    pub name: Option<String>,
    pub message: String,
}

impl ApiFailure {
    pub fn is_not_found(&self) -> bool {
        self.code == Some(404) || self.name.as_deref().is_some_and(|n| n.ends_with("NotFound"))
    }

    pub fn into_error(self) -> SyncError {
        match self.code {
            Some(401) => SyncError::auth(format!("{}: {}", self.endpoint, self.message)),
            code => SyncError::remote(self.endpoint, code, self.message),
        }
    }
}

pub(crate) enum Outcome {
    Ok(Value),
    Failed(ApiFailure),
}

/// Authenticated omegaUp API client.
///
/// Cheap to clone; clones share the connection pool and session, which is
/// never modified after [`OmegaUpClient::connect`].
#[derive(Clone)]
pub struct OmegaUpClient {
    http: reqwest::Client,
    config: ClientConfig,
    auth: AuthHeader,
    username: Option<String>,
}

impl std::fmt::Debug for OmegaUpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Credentials are deliberately omitted.
        f.debug_struct("OmegaUpClient")
            .field("config", &self.config)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

impl OmegaUpClient {
    /// Authenticates against the platform.
    ///
    /// # Errors
    ///
    /// `SyncError::Auth` if the credentials are rejected.
    pub async fn connect(config: ClientConfig, credentials: Credentials) -> Result<Self> {
        let base_url = config.base_url.trim_end_matches('/').to_string();
        url::Url::parse(&base_url)
            .map_err(|e| SyncError::transport(format!("Invalid URL {base_url:?}: {e}")))?;
        let config = ClientConfig { base_url, ..config };
        let http = reqwest::Client::new();

        match credentials {
            Credentials::Token {
                api_token,
                username,
            } => Ok(Self {
                http,
                config,
                auth: AuthHeader::Token { api_token },
                username,
            }),
            Credentials::Password { username, password } => {
                let auth_token = login(&http, &config, &username, &password).await?;
                tracing::debug!(%username, "Logged in");
                Ok(Self {
                    http,
                    config,
                    auth: AuthHeader::Session { auth_token },
                    username: Some(username),
                })
            }
        }
    }

    /// The identity the client acts as.
    ///
    /// Falls back to the current session when only an API token was given.
    ///
    /// # Errors
    ///
    /// `SyncError::Auth` when the session carries no username.
    pub async fn actor(&self) -> Result<Ident> {
        if let Some(username) = &self.username {
            return Ok(Ident::new(username.as_str()));
        }
        let session = self.query("/api/session/currentsession/", Vec::new()).await?;
        let session = &session["session"];
        session["identity"]["username"]
            .as_str()
            .or_else(|| session["username"].as_str())
            .filter(|username| !username.trim().is_empty())
            .map(Ident::new)
            .ok_or_else(|| SyncError::auth("current session has no identity"))
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Calls `endpoint` and fails on any non-ok status.
    pub async fn query(&self, endpoint: &str, params: Vec<(String, String)>) -> Result<Value> {
        match self.call(endpoint, params, None).await? {
            Outcome::Ok(value) => Ok(value),
            Outcome::Failed(failure) => Err(failure.into_error()),
        }
    }

    /// Calls `endpoint` and hands back non-ok statuses for the caller to
    /// classify.
    pub(crate) async fn call(
        &self,
        endpoint: &str,
        mut params: Vec<(String, String)>,
        contents: Option<&Attachment>,
    ) -> Result<Outcome> {
        let url = format!("{}{}", self.config.base_url, endpoint);
        tracing::debug!(endpoint, params = ?redact(&params), "Calling endpoint");

        let mut req = self.http.post(&url);
        match &self.auth {
            AuthHeader::Session { auth_token } => {
                params.push(("ouat".to_string(), auth_token.clone()));
            }
            AuthHeader::Token { api_token } => {
                req = req.header("Authorization", format!("token {api_token}"));
            }
        }

        let req = match contents {
            Some(attachment) => {
                let form = multipart_form(params, attachment).await?;
                req.timeout(self.config.upload_timeout).multipart(form)
            }
            None => req.timeout(self.config.metadata_timeout).form(&params),
        };

        let resp = req
            .send()
            .await
            .map_err(|e| SyncError::transport(format!("{endpoint}: {e}")))?;
        handle_response(endpoint, resp).await
    }
}

async fn login(
    http: &reqwest::Client,
    config: &ClientConfig,
    username: &str,
    password: &str,
) -> Result<String> {
    let endpoint = "/api/user/login/";
    let resp = http
        .post(format!("{}{}", config.base_url, endpoint))
        .timeout(config.metadata_timeout)
        .form(&[("usernameOrEmail", username), ("password", password)])
        .send()
        .await
        .map_err(|e| SyncError::transport(format!("{endpoint}: {e}")))?;

    match handle_response(endpoint, resp).await? {
        Outcome::Ok(value) => value["auth_token"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| SyncError::auth("login response carried no auth_token")),
        Outcome::Failed(failure) => Err(SyncError::auth(failure.message)),
    }
}

async fn multipart_form(
    params: Vec<(String, String)>,
    attachment: &Attachment,
) -> Result<reqwest::multipart::Form> {
    let bytes = tokio::fs::read(&attachment.path).await.map_err(|e| {
        SyncError::invalid_resource(format!("Cannot read {}: {e}", attachment.path.display()))
    })?;
    let file_name = attachment
        .path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "contents.zip".to_string());
    let part = reqwest::multipart::Part::bytes(bytes)
        .file_name(file_name)
        .mime_str("application/zip")
        .map_err(|e| SyncError::transport(e.to_string()))?;

    let mut form = reqwest::multipart::Form::new();
    for (key, value) in params {
        form = form.text(key, value);
    }
    Ok(form.part(attachment.field.clone(), part))
}

async fn handle_response(endpoint: &str, resp: reqwest::Response) -> Result<Outcome> {
    let http_status = resp.status();
    let body = resp
        .text()
        .await
        .map_err(|e| SyncError::transport(format!("{endpoint}: {e}")))?;

    let json: Value = serde_json::from_str(&body).map_err(|_| {
        SyncError::transport(format!("{endpoint}: undecodable response (HTTP {http_status}): {body}"))
    })?;
    tracing::debug!(endpoint, response = ?redact_value(&json), "Response");

    if json["status"].as_str() == Some("ok") {
        return Ok(Outcome::Ok(json));
    }

    let code = json["errorcode"]
        .as_u64()
        .and_then(|c| u16::try_from(c).ok())
        .or_else(|| (!http_status.is_success()).then_some(http_status.as_u16()));
    let message = json["error"]
        .as_str()
        .map(str::to_string)
        .unwrap_or_else(|| format!("HTTP {http_status}: {body}"));
    Ok(Outcome::Failed(ApiFailure {
        endpoint: endpoint.to_string(),
        code,
        name: json["errorname"].as_str().map(str::to_string),
        message,
    }))
}

fn redact(params: &[(String, String)]) -> Vec<(&str, &str)> {
    params
        .iter()
        .map(|(k, v)| {
            if REDACTED_KEYS.contains(&k.as_str()) {
                (k.as_str(), "[REDACTED]")
            } else {
                (k.as_str(), v.as_str())
            }
        })
        .collect()
}

fn redact_value(value: &Value) -> Value {
    let mut value = value.clone();
    if let Some(obj) = value.as_object_mut() {
        for key in REDACTED_KEYS {
            if let Some(v) = obj.get_mut(*key) {
                *v = Value::String("[REDACTED]".to_string());
            }
        }
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redact_hides_secrets() {
        let params = vec![
            ("usernameOrEmail".to_string(), "carol".to_string()),
            ("password".to_string(), "hunter2".to_string()),
        ];
        assert_eq!(
            redact(&params),
            vec![("usernameOrEmail", "carol"), ("password", "[REDACTED]")]
        );

        let value = serde_json::json!({"status": "ok", "auth_token": "secret"});
        assert_eq!(redact_value(&value)["auth_token"], "[REDACTED]");
    }

    #[test]
    fn test_failure_classification() {
        let failure = ApiFailure {
            endpoint: "/api/problem/details/".to_string(),
            code: None,
            name: Some("problemNotFound".to_string()),
            message: "Problem not found".to_string(),
        };
        assert!(failure.is_not_found());
        assert!(matches!(failure.into_error(), SyncError::Remote { .. }));

        let unauthorized = ApiFailure {
            endpoint: "/api/problem/update/".to_string(),
            code: Some(401),
            name: None,
            message: "User not logged in".to_string(),
        };
        assert!(matches!(unauthorized.into_error(), SyncError::Auth { .. }));
    }
}
