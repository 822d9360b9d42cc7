//! The sequential batch loop shared by every front-end.
//!
//! One item at a time: skip it if its key is already processed, otherwise
//! call the remote through the backoff wrapper, persist the key on success,
//! append an audit row either way, then pause before the next attempt.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Notify;
use tracing::{error, info, warn};
use yt_data_client::ApiError;

use crate::action::{ActionKind, comment_key};
use crate::audit::{AuditRecord, AuditSink, AuditStatus};
use crate::backoff::{RetryPolicy, with_backoff};
use crate::pacing::PacingConfig;
use crate::remote::YouTubeActions;
use crate::store::ProgressStore;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ExecutorSettings {
    pub pacing: PacingConfig,
    pub retry: RetryPolicy,
}

/// Cooperative cancellation shared between a worker and its controller.
///
/// Checked between items only; a call already in flight is allowed to finish.
#[derive(Debug, Clone, Default)]
pub struct StopFlag {
    requested: Arc<AtomicBool>,
    notify: Arc<Notify>,
}

impl StopFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_stop(&self) {
        self.requested.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    pub fn is_stop_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }

    /// Resolves once a stop has been requested
    pub async fn stopped(&self) {
        loop {
            let notified = self.notify.notified();
            if self.is_stop_requested() {
                return;
            }
            notified.await;
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
    pub stopped: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchEvent {
    Started {
        action: ActionKind,
        total: usize,
    },
    Skipped {
        action: ActionKind,
        target: String,
    },
    Attempting {
        action: ActionKind,
        target: String,
        index: usize,
    },
    Succeeded {
        action: ActionKind,
        target: String,
        note: String,
    },
    Failed {
        action: ActionKind,
        target: String,
        reason: String,
    },
    Finished {
        action: ActionKind,
        summary: BatchSummary,
    },
}

pub type ProgressCallback = Arc<dyn Fn(BatchEvent) + Send + Sync + 'static>;

/// Success counts across a whole run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub likes: usize,
    pub comments: usize,
    pub subscriptions: usize,
    pub errors: usize,
}

impl RunStats {
    pub fn absorb(&mut self, action: ActionKind, summary: &BatchSummary) {
        match action {
            ActionKind::Like => self.likes += summary.succeeded,
            ActionKind::Comment => self.comments += summary.succeeded,
            ActionKind::Subscribe => self.subscriptions += summary.succeeded,
        }
        self.errors += summary.failed;
    }

    pub fn total_success(&self) -> usize {
        self.likes + self.comments + self.subscriptions
    }
}

struct WorkItem<'a> {
    key: String,
    target: &'a str,
    text: Option<&'a str>,
}

pub struct Executor {
    remote: Arc<dyn YouTubeActions>,
    store: Arc<dyn ProgressStore>,
    audit: Arc<dyn AuditSink>,
    settings: ExecutorSettings,
    processed: HashMap<ActionKind, HashSet<String>>,
    stop: StopFlag,
    progress: Option<ProgressCallback>,
    credential_failure: Option<String>,
}

impl Executor {
    /// Loads every progress partition up front
    pub fn new(
        remote: Arc<dyn YouTubeActions>,
        store: Arc<dyn ProgressStore>,
        audit: Arc<dyn AuditSink>,
        settings: ExecutorSettings,
    ) -> Self {
        let processed = ActionKind::ALL
            .into_iter()
            .map(|kind| (kind, store.load(kind)))
            .collect();
        Self {
            remote,
            store,
            audit,
            settings,
            processed,
            stop: StopFlag::new(),
            progress: None,
            credential_failure: None,
        }
    }

    pub fn with_stop_flag(mut self, stop: StopFlag) -> Self {
        self.stop = stop;
        self
    }

    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.progress = Some(callback);
        self
    }

    pub fn stop_flag(&self) -> &StopFlag {
        &self.stop
    }

    /// Set once the credentials fail; no further item is attempted afterwards
    pub fn credential_failure(&self) -> Option<&str> {
        self.credential_failure.as_deref()
    }

    pub fn processed(&self, kind: ActionKind) -> Option<&HashSet<String>> {
        self.processed.get(&kind)
    }

    pub async fn like_videos(&mut self, video_ids: &[String]) -> BatchSummary {
        let items = video_ids
            .iter()
            .map(|id| WorkItem {
                key: id.clone(),
                target: id,
                text: None,
            })
            .collect();
        self.run(ActionKind::Like, items).await
    }

    pub async fn subscribe_channels(&mut self, channel_ids: &[String]) -> BatchSummary {
        let items = channel_ids
            .iter()
            .map(|id| WorkItem {
                key: id.clone(),
                target: id,
                text: None,
            })
            .collect();
        self.run(ActionKind::Subscribe, items).await
    }

    /// Post every comment to `video_id`. Keys combine the video and the text
    /// fingerprint, so the same comment may still go to another video.
    pub async fn post_comments(&mut self, video_id: &str, comments: &[String]) -> BatchSummary {
        let items = comments
            .iter()
            .map(|text| WorkItem {
                key: comment_key(video_id, text),
                target: video_id,
                text: Some(text),
            })
            .collect();
        self.run(ActionKind::Comment, items).await
    }

    /// Write every partition back to the store
    pub fn flush(&self) {
        for (kind, keys) in &self.processed {
            if let Err(err) = self.store.save(*kind, keys) {
                error!(kind = %kind, error = %err, "failed to save progress");
            }
        }
    }

    fn emit(&self, event: BatchEvent) {
        if let Some(callback) = &self.progress {
            callback(event);
        }
    }

    async fn run(&mut self, kind: ActionKind, items: Vec<WorkItem<'_>>) -> BatchSummary {
        let total = items.len();
        let mut summary = BatchSummary {
            total,
            ..Default::default()
        };
        self.emit(BatchEvent::Started { action: kind, total });
        info!(action = %kind, total, "starting batch");

        let mut attempted_any = false;
        for (idx, item) in items.into_iter().enumerate() {
            let position = idx + 1;
            if self.stop.is_stop_requested() {
                warn!(action = %kind, position, total, "stop requested, ending batch");
                summary.stopped = true;
                break;
            }
            if self.credential_failure.is_some() {
                break;
            }

            let already = self
                .processed
                .get(&kind)
                .is_some_and(|keys| keys.contains(&item.key));
            if already {
                info!(action = %kind, position, total, id = item.target, "skipping already-processed item");
                summary.skipped += 1;
                self.emit(BatchEvent::Skipped {
                    action: kind,
                    target: item.target.to_string(),
                });
                continue;
            }

            if attempted_any {
                self.pause().await;
                if self.stop.is_stop_requested() {
                    warn!(action = %kind, position, total, "stop requested, ending batch");
                    summary.stopped = true;
                    break;
                }
            }
            attempted_any = true;

            info!(action = %kind, position, total, id = item.target, "processing");
            self.emit(BatchEvent::Attempting {
                action: kind,
                target: item.target.to_string(),
                index: position,
            });

            match self.perform(kind, item.target, item.text).await {
                Ok(note) => {
                    self.mark_processed(kind, item.key);
                    self.write_audit(AuditRecord::now(kind, item.target, AuditStatus::Success, note.clone()));
                    info!(action = %kind, id = item.target, "done");
                    summary.succeeded += 1;
                    self.emit(BatchEvent::Succeeded {
                        action: kind,
                        target: item.target.to_string(),
                        note,
                    });
                }
                Err(err) => {
                    let reason = failure_note(&err);
                    error!(action = %kind, id = item.target, error = %err, "action failed");
                    self.write_audit(AuditRecord::now(kind, item.target, AuditStatus::Failed, reason.clone()));
                    summary.failed += 1;
                    self.emit(BatchEvent::Failed {
                        action: kind,
                        target: item.target.to_string(),
                        reason,
                    });
                    if err.is_credential_failure() {
                        error!(action = %kind, position, total, "credentials rejected, ending run");
                        self.credential_failure = Some(err.to_string());
                        break;
                    }
                }
            }
        }

        info!(
            action = %kind,
            succeeded = summary.succeeded,
            failed = summary.failed,
            skipped = summary.skipped,
            stopped = summary.stopped,
            "batch finished"
        );
        self.emit(BatchEvent::Finished {
            action: kind,
            summary,
        });
        summary
    }

    /// Remote call for one item; the returned string is the audit note
    async fn perform(&self, kind: ActionKind, target: &str, text: Option<&str>) -> Result<String, ApiError> {
        let remote = self.remote.as_ref();
        let policy = &self.settings.retry;
        match kind {
            ActionKind::Like => {
                with_backoff(policy, kind.as_str(), move || async move {
                    remote.like(target).await.map(|()| String::new())
                })
                .await
            }
            ActionKind::Subscribe => {
                with_backoff(policy, kind.as_str(), move || remote.subscribe(target)).await
            }
            ActionKind::Comment => {
                let text = text.unwrap_or_default();
                with_backoff(policy, kind.as_str(), move || remote.comment(target, text)).await
            }
        }
    }

    fn mark_processed(&mut self, kind: ActionKind, key: String) {
        let keys = self.processed.entry(kind).or_default();
        keys.insert(key);
        if let Err(err) = self.store.save(kind, keys) {
            error!(kind = %kind, error = %err, "failed to save progress");
        }
    }

    fn write_audit(&self, record: AuditRecord) {
        if let Err(err) = self.audit.record(&record) {
            error!(action = %record.action, id = %record.target_id, error = %err, "failed to write audit record");
        }
    }

    async fn pause(&self) {
        let pause = self.settings.pacing.next_pause();
        if pause.is_zero() {
            return;
        }
        tokio::select! {
            _ = tokio::time::sleep(pause) => {}
            _ = self.stop.stopped() => {}
        }
    }
}

fn failure_note(err: &ApiError) -> String {
    match err.status() {
        Some(status) => format!("HTTP {status}"),
        None => err.to_string(),
    }
}
