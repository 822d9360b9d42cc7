use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use yt_batch::{CsvAuditLog, Executor, ExecutorSettings, JsonDirStore, RunPlan};
use yt_data_client::{Credential, YouTubeClient};
use yt_oauth::AuthGate;

pub const DEFAULT_CREDENTIALS: &str = "credentials.json";
pub const DEFAULT_TOKEN: &str = "token.json";

/// Everything one run needs, whichever shell collected it
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub credentials: PathBuf,
    pub token: PathBuf,
    pub state_dir: PathBuf,
    pub log_file: PathBuf,
    pub settings: ExecutorSettings,
    pub plan: RunPlan,
}

impl RunConfig {
    /// Obtain a usable token and build the API client; failure ends the run
    pub async fn connect(&self) -> Result<Arc<YouTubeClient>> {
        let manager = AuthGate::new(&self.credentials, &self.token)
            .authorize()
            .await
            .context("authentication failed")?;
        let client = YouTubeClient::from_env(Credential::from(manager))
            .context("failed to build YouTube client")?;
        info!(api = client.base_url(), "authenticated");
        Ok(Arc::new(client))
    }

    pub fn executor(&self, client: Arc<YouTubeClient>) -> Executor {
        Executor::new(
            client,
            Arc::new(JsonDirStore::new(&self.state_dir)),
            Arc::new(CsvAuditLog::new(&self.log_file)),
            self.settings,
        )
    }
}
