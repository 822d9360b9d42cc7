mod flow;
mod gate;
mod secrets;

pub use flow::{exchange_code, generate_auth_url, generate_pkce, start_auth_flow};
pub use gate::AuthGate;
pub use secrets::ClientSecrets;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tracing::{debug, info};

/// Default OAuth callback port
pub const OAUTH_CALLBACK_PORT: u16 = 8080;

/// Scope granting full read/write access to the account's YouTube data
pub const YOUTUBE_SCOPE: &str = "https://www.googleapis.com/auth/youtube.force-ssl";

pub const AUTH_ENDPOINT: &str = "https://accounts.google.com/o/oauth2/v2/auth";
pub const TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";

/// Seconds before the real expiry at which a token is treated as expired
const EXPIRY_MARGIN_SECS: u64 = 60;

#[derive(Debug, Error)]
pub enum OAuthError {
    #[error("failed to read '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to write '{path}': {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse '{path}': {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("client secrets file '{0}' has no 'installed' or 'web' section")]
    InvalidSecrets(PathBuf),
    #[error("missing client secrets file '{0}'")]
    MissingSecrets(PathBuf),
    #[error("token endpoint returned {status}: {body}")]
    TokenEndpoint { status: u16, body: String },
    #[error("request to token endpoint failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("no OAuth token loaded")]
    NoToken,
    #[error("token has no refresh token")]
    NoRefreshToken,
    #[error("authorization was denied: {0}")]
    Denied(String),
    #[error("authorization timed out after {0} seconds")]
    Timeout(u64),
    #[error("failed to start callback server: {0}")]
    Callback(std::io::Error),
}

pub(crate) fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

/// OAuth 2.0 token information
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OAuthToken {
    /// Access token for API requests
    pub access_token: String,
    /// Refresh token for getting new access tokens
    pub refresh_token: String,
    /// Token type (usually "Bearer")
    pub token_type: String,
    /// Expiry time as Unix timestamp (seconds since epoch)
    pub expires_at: u64,
}

impl OAuthToken {
    /// Check if the token is expired or will expire within a minute
    pub fn is_expired(&self) -> bool {
        now_secs() + EXPIRY_MARGIN_SECS >= self.expires_at
    }

    pub fn load_from_file(path: &Path) -> Result<Self, OAuthError> {
        let content = std::fs::read_to_string(path).map_err(|source| OAuthError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| OAuthError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Save token to file, readable by the owner only on Unix-like systems
    pub fn save_to_file(&self, path: &Path) -> Result<(), OAuthError> {
        let write_err = |source| OAuthError::Write {
            path: path.to_path_buf(),
            source,
        };
        let content = serde_json::to_string_pretty(self).map_err(|source| OAuthError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
        std::fs::write(path, content).map_err(write_err)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
                .map_err(write_err)?;
        }

        debug!(path = %path.display(), "saved OAuth token");
        Ok(())
    }
}

/// Token endpoint response for both the code exchange and refresh grants
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub expires_in: u64,
    #[serde(default)]
    pub token_type: Option<String>,
}

impl TokenResponse {
    /// Build a token, keeping `previous_refresh` when the endpoint omits one
    pub(crate) fn into_token(self, previous_refresh: Option<&str>) -> Option<OAuthToken> {
        let refresh_token = self
            .refresh_token
            .or_else(|| previous_refresh.map(str::to_string))?;
        Some(OAuthToken {
            access_token: self.access_token,
            refresh_token,
            token_type: self.token_type.unwrap_or_else(|| "Bearer".to_string()),
            expires_at: now_secs() + self.expires_in,
        })
    }
}

pub(crate) async fn post_token_form(
    http: &reqwest::Client,
    endpoint: &str,
    params: &[(&str, &str)],
) -> Result<TokenResponse, OAuthError> {
    let response = http.post(endpoint).form(params).send().await?;
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(OAuthError::TokenEndpoint {
            status: status.as_u16(),
            body,
        });
    }
    Ok(response.json().await?)
}

/// OAuth configuration
#[derive(Debug, Clone)]
pub struct OAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    /// Redirect URI for OAuth callback
    pub redirect_uri: String,
    pub scope: String,
    pub token_endpoint: String,
}

impl OAuthConfig {
    /// Create new OAuth configuration with YouTube defaults
    pub fn new(client_id: String, client_secret: String) -> Self {
        Self {
            client_id,
            client_secret,
            redirect_uri: format!("http://localhost:{}/oauth2callback", OAUTH_CALLBACK_PORT),
            scope: YOUTUBE_SCOPE.to_string(),
            token_endpoint: TOKEN_ENDPOINT.to_string(),
        }
    }

    pub fn from_secrets(secrets: &ClientSecrets) -> Self {
        Self::new(secrets.client_id.clone(), secrets.client_secret.clone())
    }

    pub fn with_token_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.token_endpoint = endpoint.into();
        self
    }
}

/// Holds the current token and refreshes it on demand.
///
/// When a token path is set, every refresh rewrites the token file so the
/// next run starts from the newest access token.
pub struct OAuthManager {
    config: Option<OAuthConfig>,
    token: Option<OAuthToken>,
    token_path: Option<PathBuf>,
    http: reqwest::Client,
}

impl OAuthManager {
    pub fn new(config: OAuthConfig) -> Self {
        Self {
            config: Some(config),
            token: None,
            token_path: None,
            http: reqwest::Client::new(),
        }
    }

    /// A manager for a token that cannot be refreshed (no client secrets)
    pub fn without_refresh(token: OAuthToken) -> Self {
        Self {
            config: None,
            token: Some(token),
            token_path: None,
            http: reqwest::Client::new(),
        }
    }

    pub fn with_token(mut self, token: OAuthToken) -> Self {
        self.token = Some(token);
        self
    }

    pub fn persist_to(mut self, path: impl Into<PathBuf>) -> Self {
        self.token_path = Some(path.into());
        self
    }

    pub fn load_token(&mut self, path: &Path) -> Result<(), OAuthError> {
        self.token = Some(OAuthToken::load_from_file(path)?);
        Ok(())
    }

    pub fn token(&self) -> Option<&OAuthToken> {
        self.token.as_ref()
    }

    pub fn can_refresh(&self) -> bool {
        self.config.is_some()
    }

    /// Get valid access token, refreshing if necessary
    pub async fn access_token(&mut self) -> Result<String, OAuthError> {
        let expired = self.token.as_ref().ok_or(OAuthError::NoToken)?.is_expired();
        if expired && self.can_refresh() {
            info!("access token expired, refreshing");
            self.refresh().await?;
        }
        self.token
            .as_ref()
            .map(|t| t.access_token.clone())
            .ok_or(OAuthError::NoToken)
    }

    /// Exchange the refresh token for a new access token
    pub async fn refresh(&mut self) -> Result<(), OAuthError> {
        let config = self.config.as_ref().ok_or(OAuthError::NoRefreshToken)?;
        let current = self.token.as_ref().ok_or(OAuthError::NoToken)?;
        if current.refresh_token.is_empty() {
            return Err(OAuthError::NoRefreshToken);
        }

        let params = [
            ("client_id", config.client_id.as_str()),
            ("client_secret", config.client_secret.as_str()),
            ("refresh_token", current.refresh_token.as_str()),
            ("grant_type", "refresh_token"),
        ];
        let response = post_token_form(&self.http, &config.token_endpoint, &params).await?;
        let refreshed = response
            .into_token(Some(&current.refresh_token))
            .ok_or(OAuthError::NoRefreshToken)?;
        self.token = Some(refreshed);
        info!("OAuth token refreshed");

        self.save_token()
    }

    /// Write the current token to the configured path, if any
    pub fn save_token(&self) -> Result<(), OAuthError> {
        match (&self.token, &self.token_path) {
            (Some(token), Some(path)) => token.save_to_file(path),
            (None, _) => Err(OAuthError::NoToken),
            (Some(_), None) => Ok(()),
        }
    }
}
