use std::path::PathBuf;

use anyhow::{Result, bail};
use console::style;
use tracing::{error, warn};
use yt_batch::{
    ActionKind, CommentPlan, ExecutorSettings, PacingConfig, RunPlan, execute_plan_until,
    parse_action_list,
};

use crate::config::{DEFAULT_CREDENTIALS, DEFAULT_TOKEN, RunConfig};
use crate::prompts::{prompt_input, prompt_optional};
use crate::report::print_report;
use crate::shutdown_signal;

const ACTION_MENU: &str = "Choose your action:\n  \
    like       auto-like videos\n  \
    comment    post comments on one video\n  \
    subscribe  subscribe to channels\n  \
    all        every action\n\
    Enter one or more, comma-separated";

fn print_banner() {
    println!("{}", style("YouTube Automation").cyan().bold());
    println!("{}", style("IMPORTANT: use responsibly").yellow().bold());
    println!(
        "{}",
        style(
            "Only operate on accounts you control. Unauthorized or abusive automation can violate YouTube's policies."
        )
        .magenta()
    );
    println!();
}

/// Turn the delay and jitter answers into pacing, or `None` if either is not a number
fn parse_pacing(delay: &str, jitter: &str) -> Option<PacingConfig> {
    let delay = delay.trim().parse::<f64>().ok()?;
    let jitter = jitter.trim().parse::<f64>().ok()?;
    PacingConfig::from_secs(delay, jitter)
}

fn ask_path(action: ActionKind, message: &str) -> Result<Option<PathBuf>> {
    let answer = prompt_optional(message)?;
    if answer.is_none() {
        warn!(action = %action, "no input file given, skipping");
    }
    Ok(answer.map(PathBuf::from))
}

fn collect_config(actions: &[ActionKind], state_dir: PathBuf, log_file: PathBuf) -> Result<RunConfig> {
    let credentials = prompt_input("Path to credentials.json", Some(DEFAULT_CREDENTIALS))?;
    let token = prompt_input("Path to token.json (created if missing)", Some(DEFAULT_TOKEN))?;

    let mut plan = RunPlan::default();
    if actions.contains(&ActionKind::Like) {
        plan.likes = ask_path(ActionKind::Like, "Path to Likes.txt (video IDs or URLs)")?;
    }
    if actions.contains(&ActionKind::Comment) {
        if let Some(file) = ask_path(ActionKind::Comment, "Path to Comments.txt (one comment per line)")? {
            let target_video = prompt_input("Target video URL or ID to post comments to", None)?;
            plan.comments = Some(CommentPlan { file, target_video });
        }
    }
    if actions.contains(&ActionKind::Subscribe) {
        plan.channels = ask_path(
            ActionKind::Subscribe,
            "Path to Channels.txt (channel IDs, URLs, handles or names)",
        )?;
    }

    let defaults = PacingConfig::default();
    let delay = prompt_input(
        "Base delay in seconds between actions",
        Some(&defaults.delay.as_secs_f64().to_string()),
    )?;
    let jitter = prompt_input(
        "Jitter in seconds (+/-)",
        Some(&defaults.jitter.as_secs_f64().to_string()),
    )?;
    let pacing = parse_pacing(&delay, &jitter).unwrap_or_else(|| {
        println!("{}", style("Invalid delay/jitter values, using defaults.").yellow());
        defaults
    });

    Ok(RunConfig {
        credentials: credentials.into(),
        token: token.into(),
        state_dir,
        log_file,
        settings: ExecutorSettings {
            pacing,
            ..Default::default()
        },
        plan,
    })
}

pub async fn run(state_dir: PathBuf, log_file: PathBuf) -> Result<()> {
    print_banner();

    let actions = parse_action_list(&prompt_input(ACTION_MENU, Some("like"))?);
    if actions.is_empty() {
        println!("{}", style("No valid actions chosen. Exiting.").red());
        return Ok(());
    }

    let config = collect_config(&actions, state_dir, log_file)?;
    if config.plan.is_empty() {
        println!("{}", style("No input files given. Exiting.").red());
        return Ok(());
    }

    let client = config.connect().await?;
    let names: Vec<&str> = config.plan.actions().iter().map(ActionKind::as_str).collect();
    println!(
        "{}",
        style(format!("Authenticated. Running actions: {}", names.join(", "))).cyan()
    );

    let mut executor = config.executor(client.clone());
    let interrupted = async {
        match shutdown_signal().await {
            Ok(name) => println!(
                "\n{}",
                style(format!("Interrupted by {name}. Saving state...")).yellow()
            ),
            Err(err) => {
                error!(error = %err, "signal handling unavailable");
                std::future::pending::<()>().await;
            }
        }
    };
    let outcome = execute_plan_until(&mut executor, client.as_ref(), &config.plan, interrupted).await;

    if let Some(report) = &outcome {
        print_report(report);
        if let Some(reason) = &report.credential_failure {
            bail!("run ended because the credentials failed: {reason}");
        }
    }
    println!(
        "\n{} {}",
        style("All done. Log file:").green(),
        config.log_file.display()
    );
    println!("Processed state saved in: {}", config.state_dir.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn pacing_answers_are_parsed() {
        assert_eq!(
            parse_pacing("1.5", " 0.5 "),
            Some(PacingConfig {
                delay: Duration::from_millis(1500),
                jitter: Duration::from_millis(500),
            })
        );
    }

    #[test]
    fn bad_pacing_answers_fall_back() {
        assert_eq!(parse_pacing("fast", "2"), None);
        assert_eq!(parse_pacing("4", "-2"), None);
    }
}
