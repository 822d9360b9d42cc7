mod batch;
mod config;
mod interactive;
mod prompts;
mod report;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use console::style;
use yt_batch::{DEFAULT_AUDIT_LOG, DEFAULT_STATE_DIR, JsonDirStore, ProgressStore};

use config::{DEFAULT_CREDENTIALS, DEFAULT_TOKEN};

/// Batch like, subscribe and comment automation for your own YouTube account
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Directory holding the processed-item files
    #[arg(long, global = true, default_value = DEFAULT_STATE_DIR)]
    state_dir: PathBuf,

    /// CSV file every attempted action is appended to
    #[arg(long, global = true, default_value = DEFAULT_AUDIT_LOG)]
    log_file: PathBuf,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run without prompts, showing live progress; Ctrl-C stops after the current item
    Run(RunArgs),
    /// Forget which items were already processed
    Reset,
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// File of video URLs or IDs to like
    #[arg(long)]
    pub likes: Option<PathBuf>,

    /// File of channel URLs, handles, IDs or names to subscribe to
    #[arg(long)]
    pub channels: Option<PathBuf>,

    /// File of comments, one per line
    #[arg(long, requires = "target_video")]
    pub comments: Option<PathBuf>,

    /// Video URL or ID that receives every comment
    #[arg(long)]
    pub target_video: Option<String>,

    /// OAuth client secrets downloaded from the Google Cloud console
    #[arg(long, default_value = DEFAULT_CREDENTIALS)]
    pub credentials: PathBuf,

    /// Where the OAuth token is cached
    #[arg(long, default_value = DEFAULT_TOKEN)]
    pub token: PathBuf,

    /// Base delay in seconds between actions
    #[arg(long, default_value_t = 4.0)]
    pub delay: f64,

    /// Random +/- jitter in seconds added to the delay
    #[arg(long, default_value_t = 2.0)]
    pub jitter: f64,

    /// Retries for quota, rate-limit and server errors
    #[arg(long, default_value_t = 6)]
    pub max_retries: u32,

    /// Upper bound on comments read from the comments file
    #[arg(long, default_value_t = yt_batch::DEFAULT_MAX_COMMENTS)]
    pub max_comments: usize,
}

/// Resolves on Ctrl-C, or SIGTERM on Unix, naming the signal
pub(crate) async fn shutdown_signal() -> Result<&'static str> {
    #[cfg(unix)]
    {
        let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .context("failed to install SIGTERM handler")?;
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                result.context("failed to listen for Ctrl-C")?;
                Ok("SIGINT")
            }
            _ = sigterm.recv() => Ok("SIGTERM"),
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c()
            .await
            .context("failed to listen for Ctrl-C")?;
        Ok("SIGINT")
    }
}

fn reset(state_dir: PathBuf) -> Result<()> {
    let store = JsonDirStore::new(state_dir);
    let removed = store
        .clear()
        .with_context(|| format!("failed to clear '{}'", store.dir().display()))?;
    println!(
        "{} removed {} progress file(s) from {}",
        style("Reset:").green().bold(),
        removed,
        store.dir().display()
    );
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new(
                    "yt_automation=info,yt_batch=info,yt_oauth=info,yt_data_client=info",
                )
            }),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        None => interactive::run(cli.state_dir, cli.log_file).await,
        Some(Commands::Run(args)) => batch::run(args, cli.state_dir, cli.log_file).await,
        Some(Commands::Reset) => reset(cli.state_dir),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn run_flags_parse_with_defaults() {
        let cli = Cli::parse_from([
            "yt-automation",
            "--state-dir",
            "state",
            "run",
            "--likes",
            "Likes.txt",
            "--delay",
            "0.5",
        ]);
        assert_eq!(cli.state_dir, PathBuf::from("state"));
        assert_eq!(cli.log_file, PathBuf::from(DEFAULT_AUDIT_LOG));
        match cli.command {
            Some(Commands::Run(args)) => {
                assert_eq!(args.likes, Some(PathBuf::from("Likes.txt")));
                assert_eq!(args.delay, 0.5);
                assert_eq!(args.jitter, 2.0);
                assert_eq!(args.max_retries, 6);
                assert_eq!(args.credentials, PathBuf::from(DEFAULT_CREDENTIALS));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn comments_require_a_target_video() {
        let result = Cli::try_parse_from(["yt-automation", "run", "--comments", "Comments.txt"]);
        assert!(result.is_err());
    }

    #[test]
    fn reset_removes_progress_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonDirStore::new(dir.path());
        store
            .save(yt_batch::ActionKind::Like, &["abc".to_string()].into_iter().collect())
            .unwrap();
        reset(dir.path().to_path_buf()).unwrap();
        assert!(store.load(yt_batch::ActionKind::Like).is_empty());
    }
}
