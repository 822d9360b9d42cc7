//! Idempotent batch processing of YouTube likes, subscriptions and comments.
//!
//! Input files are resolved into canonical IDs, each ID is handed to the
//! remote exactly once across runs (tracked by a [`ProgressStore`]), and every
//! attempt is appended to an [`AuditSink`].

pub mod action;
pub mod audit;
pub mod backoff;
pub mod error;
pub mod executor;
pub mod ids;
pub mod pacing;
pub mod plan;
pub mod remote;
pub mod resolver;
pub mod store;

pub use action::{ActionKind, comment_key, content_fingerprint, parse_action_list};
pub use audit::{AuditRecord, AuditSink, AuditStatus, CsvAuditLog, DEFAULT_AUDIT_LOG, MemoryAudit};
pub use backoff::{RetryPolicy, with_backoff};
pub use error::BatchError;
pub use executor::{
    BatchEvent, BatchSummary, Executor, ExecutorSettings, ProgressCallback, RunStats, StopFlag,
};
pub use pacing::PacingConfig;
pub use plan::{ActionOutcome, CommentPlan, RunPlan, RunReport, execute_plan, execute_plan_until};
pub use remote::YouTubeActions;
pub use resolver::{ChannelDirectory, DEFAULT_MAX_COMMENTS};
pub use store::{DEFAULT_STATE_DIR, JsonDirStore, MemoryStore, ProgressStore};
