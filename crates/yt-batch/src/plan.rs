//! A whole run: which actions to perform and where their inputs live.

use std::future::Future;
use std::path::PathBuf;

use tracing::{error, info, warn};

use crate::action::ActionKind;
use crate::error::BatchError;
use crate::executor::{BatchSummary, Executor, RunStats};
use crate::ids::extract_video_id;
use crate::resolver::{ChannelDirectory, DEFAULT_MAX_COMMENTS, read_channel_ids, read_comments, read_video_ids};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentPlan {
    pub file: PathBuf,
    /// URL or ID of the video every comment is posted to
    pub target_video: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunPlan {
    pub likes: Option<PathBuf>,
    pub channels: Option<PathBuf>,
    pub comments: Option<CommentPlan>,
    pub max_comments: usize,
}

impl Default for RunPlan {
    fn default() -> Self {
        Self {
            likes: None,
            channels: None,
            comments: None,
            max_comments: DEFAULT_MAX_COMMENTS,
        }
    }
}

impl RunPlan {
    /// Actions in the order they run
    pub fn actions(&self) -> Vec<ActionKind> {
        let mut actions = Vec::new();
        if self.likes.is_some() {
            actions.push(ActionKind::Like);
        }
        if self.channels.is_some() {
            actions.push(ActionKind::Subscribe);
        }
        if self.comments.is_some() {
            actions.push(ActionKind::Comment);
        }
        actions
    }

    pub fn is_empty(&self) -> bool {
        self.actions().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    Completed(BatchSummary),
    /// The action could not start, e.g. its input file is missing
    Aborted(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub outcomes: Vec<(ActionKind, ActionOutcome)>,
    pub stats: RunStats,
    pub stopped: bool,
    /// Why the run ended early because the credentials stopped working
    pub credential_failure: Option<String>,
}

impl RunReport {
    fn push(&mut self, kind: ActionKind, result: Result<BatchSummary, BatchError>) {
        let outcome = match result {
            Ok(summary) => {
                self.stats.absorb(kind, &summary);
                self.stopped |= summary.stopped;
                ActionOutcome::Completed(summary)
            }
            Err(err) => {
                error!(action = %kind, error = %err, "action aborted");
                self.stats.errors += 1;
                ActionOutcome::Aborted(err.to_string())
            }
        };
        self.outcomes.push((kind, outcome));
    }

    pub fn is_fatal(&self) -> bool {
        self.credential_failure.is_some()
    }
}

/// Run likes, then subscriptions, then comments.
///
/// A failure to prepare one action is reported and the next action still
/// runs. A stop request ends the run after the current batch; a credential
/// failure ends it at once and is recorded in the report.
pub async fn execute_plan(
    executor: &mut Executor,
    directory: &dyn ChannelDirectory,
    plan: &RunPlan,
) -> RunReport {
    let mut report = RunReport::default();
    info!(actions = ?plan.actions(), "running actions");

    if let Some(path) = &plan.likes {
        let result = match read_video_ids(path) {
            Ok(ids) => Ok(executor.like_videos(&ids).await),
            Err(err) => Err(err),
        };
        report.push(ActionKind::Like, result);
    }

    if let Some(path) = &plan.channels {
        if should_halt(executor, &mut report) {
            return report;
        }
        let result = match read_channel_ids(path, directory).await {
            Ok(ids) => Ok(executor.subscribe_channels(&ids).await),
            Err(err) => Err(err),
        };
        report.push(ActionKind::Subscribe, result);
    }

    if let Some(comments) = &plan.comments {
        if should_halt(executor, &mut report) {
            return report;
        }
        let result = match prepare_comments(comments, plan.max_comments) {
            Ok((video_id, texts)) => {
                info!(video_id = %video_id, "posting comments");
                Ok(executor.post_comments(&video_id, &texts).await)
            }
            Err(err) => Err(err),
        };
        report.push(ActionKind::Comment, result);
    }

    record_credential_failure(executor, &mut report);
    report
}

/// Run the plan until `interrupt` resolves, then save every progress partition.
///
/// Returns `None` when the interrupt won; the call in flight is abandoned.
pub async fn execute_plan_until<F>(
    executor: &mut Executor,
    directory: &dyn ChannelDirectory,
    plan: &RunPlan,
    interrupt: F,
) -> Option<RunReport>
where
    F: Future<Output = ()>,
{
    let report = tokio::select! {
        report = execute_plan(&mut *executor, directory, plan) => Some(report),
        _ = interrupt => {
            warn!("run interrupted");
            None
        }
    };
    executor.flush();
    report
}

fn prepare_comments(plan: &CommentPlan, max: usize) -> Result<(String, Vec<String>), BatchError> {
    let texts = read_comments(&plan.file, max)?;
    let video_id = extract_video_id(&plan.target_video)
        .ok_or_else(|| BatchError::InvalidTarget(plan.target_video.clone()))?;
    Ok((video_id, texts))
}

fn record_credential_failure(executor: &Executor, report: &mut RunReport) -> bool {
    let Some(reason) = executor.credential_failure() else {
        return false;
    };
    if report.credential_failure.is_none() {
        error!(error = reason, "credentials failed, skipping remaining actions");
        report.credential_failure = Some(reason.to_string());
    }
    true
}

fn should_halt(executor: &Executor, report: &mut RunReport) -> bool {
    if record_credential_failure(executor, report) {
        return true;
    }
    if report.stopped || executor.stop_flag().is_stop_requested() {
        warn!("stop requested, skipping remaining actions");
        return true;
    }
    false
}
