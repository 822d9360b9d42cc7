use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::{
    ClientSecrets, OAuthConfig, OAuthError, OAuthManager, OAuthToken, TOKEN_ENDPOINT,
    start_auth_flow,
};

/// Obtains a usable credential before any API work starts.
///
/// Order of preference: the saved token as-is, the saved token refreshed,
/// then the interactive browser flow. Whatever is obtained is written back
/// to the token path.
#[derive(Debug, Clone)]
pub struct AuthGate {
    credentials_path: PathBuf,
    token_path: PathBuf,
    token_endpoint: String,
    interactive: bool,
}

impl AuthGate {
    pub fn new(credentials_path: impl Into<PathBuf>, token_path: impl Into<PathBuf>) -> Self {
        Self {
            credentials_path: credentials_path.into(),
            token_path: token_path.into(),
            token_endpoint: TOKEN_ENDPOINT.to_string(),
            interactive: true,
        }
    }

    pub fn token_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.token_endpoint = endpoint.into();
        self
    }

    /// Disable the browser flow; `authorize` then fails instead of prompting
    pub fn non_interactive(mut self) -> Self {
        self.interactive = false;
        self
    }

    pub fn token_path(&self) -> &Path {
        &self.token_path
    }

    fn load_config(&self) -> Result<OAuthConfig, OAuthError> {
        let secrets = ClientSecrets::load(&self.credentials_path)?;
        Ok(OAuthConfig::from_secrets(&secrets).with_token_endpoint(self.token_endpoint.clone()))
    }

    pub async fn authorize(&self) -> Result<OAuthManager, OAuthError> {
        let saved = if self.token_path.exists() {
            match OAuthToken::load_from_file(&self.token_path) {
                Ok(token) => Some(token),
                Err(err) => {
                    warn!(error = %err, "ignoring unreadable token file");
                    None
                }
            }
        } else {
            None
        };

        let config = match self.load_config() {
            Ok(config) => Some(config),
            Err(OAuthError::MissingSecrets(_)) => None,
            Err(err) => return Err(err),
        };

        if let Some(token) = saved {
            match config.clone() {
                Some(config) => {
                    let mut manager = OAuthManager::new(config)
                        .with_token(token.clone())
                        .persist_to(&self.token_path);
                    if !token.is_expired() {
                        info!(path = %self.token_path.display(), "using saved OAuth token");
                        return Ok(manager);
                    }
                    match manager.refresh().await {
                        Ok(()) => return Ok(manager),
                        Err(err) => warn!(error = %err, "token refresh failed"),
                    }
                }
                None if !token.is_expired() => {
                    info!("using saved OAuth token without client secrets; it cannot be refreshed");
                    return Ok(OAuthManager::without_refresh(token));
                }
                None => warn!("saved token expired and no client secrets are available"),
            }
        }

        let config = config.ok_or_else(|| OAuthError::MissingSecrets(self.credentials_path.clone()))?;
        if !self.interactive {
            return Err(OAuthError::NoToken);
        }
        let token = start_auth_flow(&config).await?;
        token.save_to_file(&self.token_path)?;
        info!(path = %self.token_path.display(), "saved new OAuth token");
        Ok(OAuthManager::new(config)
            .with_token(token)
            .persist_to(&self.token_path))
    }
}
