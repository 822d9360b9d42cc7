use serde::Deserialize;
use std::path::Path;

use crate::OAuthError;

/// Client ID and secret from a Google Cloud "OAuth client" download
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSecrets {
    pub client_id: String,
    pub client_secret: String,
}

#[derive(Deserialize)]
struct SecretsFile {
    installed: Option<SecretsSection>,
    web: Option<SecretsSection>,
}

#[derive(Deserialize)]
struct SecretsSection {
    client_id: String,
    client_secret: String,
}

impl ClientSecrets {
    /// Load a `credentials.json` file (desktop `installed` or `web` client)
    pub fn load(path: &Path) -> Result<Self, OAuthError> {
        if !path.exists() {
            return Err(OAuthError::MissingSecrets(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path).map_err(|source| OAuthError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content, path)
    }

    fn parse(content: &str, path: &Path) -> Result<Self, OAuthError> {
        let file: SecretsFile =
            serde_json::from_str(content).map_err(|source| OAuthError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        let section = file
            .installed
            .or(file.web)
            .ok_or_else(|| OAuthError::InvalidSecrets(path.to_path_buf()))?;
        Ok(Self {
            client_id: section.client_id,
            client_secret: section.client_secret,
        })
    }
}
