//! Flag-driven shell: the pipeline runs on a worker task while the
//! foreground draws progress and turns Ctrl-C into a cooperative stop.
//! A second Ctrl-C abandons the item in flight and saves progress.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use console::style;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use tokio::sync::{Notify, mpsc};
use tracing::{info, warn};
use yt_batch::{
    ActionKind, BatchEvent, CommentPlan, ExecutorSettings, PacingConfig, RetryPolicy, RunPlan,
    RunStats, StopFlag, execute_plan_until,
};

use crate::config::RunConfig;
use crate::report::print_report;
use crate::{RunArgs, shutdown_signal};

fn build_config(args: RunArgs, state_dir: PathBuf, log_file: PathBuf) -> Result<RunConfig> {
    let Some(pacing) = PacingConfig::from_secs(args.delay, args.jitter) else {
        bail!("--delay and --jitter must be non-negative numbers");
    };
    let plan = RunPlan {
        likes: args.likes,
        channels: args.channels,
        comments: args
            .comments
            .zip(args.target_video)
            .map(|(file, target_video)| CommentPlan { file, target_video }),
        max_comments: args.max_comments,
    };
    if plan.is_empty() {
        bail!("nothing to do: pass --likes, --channels or --comments");
    }
    Ok(RunConfig {
        credentials: args.credentials,
        token: args.token,
        state_dir,
        log_file,
        settings: ExecutorSettings {
            pacing,
            retry: RetryPolicy {
                max_retries: args.max_retries,
                ..Default::default()
            },
        },
        plan,
    })
}

pub async fn run(args: RunArgs, state_dir: PathBuf, log_file: PathBuf) -> Result<()> {
    let config = build_config(args, state_dir, log_file)?;
    let client = config.connect().await?;

    let (tx, mut rx) = mpsc::unbounded_channel::<BatchEvent>();
    let stop = StopFlag::new();
    let mut executor = config
        .executor(client.clone())
        .with_stop_flag(stop.clone())
        .with_progress(Arc::new(move |event| {
            let _ = tx.send(event);
        }));
    let plan = config.plan.clone();
    let abort = Arc::new(Notify::new());
    let worker_abort = abort.clone();

    let worker = tokio::spawn(async move {
        execute_plan_until(&mut executor, client.as_ref(), &plan, worker_abort.notified()).await
    });

    let mut view = ProgressView::new(false);
    let mut interrupts = Interrupts::default();
    let mut listening = true;
    loop {
        tokio::select! {
            event = rx.recv() => match event {
                Some(event) => view.handle(event),
                None => break,
            },
            signal = shutdown_signal(), if listening => match signal {
                Ok(name) => match interrupts.record() {
                    Interrupt::Stop => {
                        info!(signal = name, "stop requested");
                        view.note(&format!(
                            "{} finishing the current item, then stopping (again to abort)...",
                            style("Stop requested:").yellow().bold()
                        ));
                        stop.request_stop();
                    }
                    Interrupt::Abort => {
                        warn!(signal = name, "aborting the item in flight");
                        view.note(&format!("{} saving progress...", style("Aborting:").red().bold()));
                        abort.notify_one();
                        listening = false;
                    }
                },
                Err(err) => {
                    warn!(error = %err, "signal handling unavailable");
                    listening = false;
                }
            },
        }
    }

    let outcome = worker.await.context("batch worker failed")?;
    if let Some(report) = &outcome {
        print_report(report);
    }
    println!(
        "\nLog file: {}\nProcessed state saved in: {}",
        config.log_file.display(),
        config.state_dir.display()
    );
    match outcome {
        Some(report) if report.is_fatal() => {
            bail!(
                "run ended because the credentials failed: {}",
                report.credential_failure.unwrap_or_default()
            );
        }
        Some(report) if report.stopped => {
            println!("{}", style("Automation stopped by user").yellow());
        }
        Some(_) => {}
        None => println!("{}", style("Automation aborted by user").yellow()),
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Interrupt {
    /// Finish the current item, then end the run
    Stop,
    /// Abandon the item in flight
    Abort,
}

#[derive(Debug, Default)]
struct Interrupts {
    received: usize,
}

impl Interrupts {
    fn record(&mut self) -> Interrupt {
        self.received += 1;
        if self.received == 1 {
            Interrupt::Stop
        } else {
            Interrupt::Abort
        }
    }
}

/// One progress bar per action plus running totals
struct ProgressView {
    hidden: bool,
    bar: Option<ProgressBar>,
    stats: RunStats,
}

impl ProgressView {
    fn new(hidden: bool) -> Self {
        Self {
            hidden,
            bar: None,
            stats: RunStats::default(),
        }
    }

    fn draw_target(&self) -> ProgressDrawTarget {
        if self.hidden {
            ProgressDrawTarget::hidden()
        } else {
            ProgressDrawTarget::stderr()
        }
    }

    fn bar_style() -> ProgressStyle {
        ProgressStyle::with_template("  {prefix:>10.cyan.bold} [{bar:30}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> ")
    }

    fn stats_line(&self) -> String {
        format!(
            "  Likes: {} | Comments: {} | Subscriptions: {} | Errors: {}",
            self.stats.likes, self.stats.comments, self.stats.subscriptions, self.stats.errors
        )
    }

    fn note(&self, line: &str) {
        match &self.bar {
            Some(bar) => bar.println(line),
            None if !self.hidden => eprintln!("{line}"),
            None => {}
        }
    }

    fn advance(&self) {
        if let Some(bar) = &self.bar {
            bar.inc(1);
        }
    }

    fn handle(&mut self, event: BatchEvent) {
        match event {
            BatchEvent::Started { action, total } => {
                let bar = ProgressBar::with_draw_target(Some(total as u64), self.draw_target());
                bar.set_style(Self::bar_style());
                bar.set_prefix(action.to_string());
                self.bar = Some(bar);
            }
            BatchEvent::Attempting { target, .. } => {
                if let Some(bar) = &self.bar {
                    bar.set_message(target);
                }
            }
            BatchEvent::Skipped { .. } => self.advance(),
            BatchEvent::Succeeded { action, .. } => {
                match action {
                    ActionKind::Like => self.stats.likes += 1,
                    ActionKind::Comment => self.stats.comments += 1,
                    ActionKind::Subscribe => self.stats.subscriptions += 1,
                }
                self.advance();
            }
            BatchEvent::Failed {
                action,
                target,
                reason,
            } => {
                self.stats.errors += 1;
                self.note(&format!(
                    "  {} {} {}: {}",
                    style("failed").red(),
                    action,
                    target,
                    reason
                ));
                self.advance();
            }
            BatchEvent::Finished { summary, .. } => {
                self.note(&self.stats_line());
                if let Some(bar) = self.bar.take() {
                    bar.finish_with_message(format!(
                        "{} ok, {} failed, {} skipped",
                        summary.succeeded, summary.failed, summary.skipped
                    ));
                }
            }
        }
    }
}
