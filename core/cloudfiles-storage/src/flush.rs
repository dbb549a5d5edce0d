//! Upload retry and flush reporting.
//!
//! Each style gets a bounded number of upload attempts. A transient failure
//! reconnects the store before the next attempt so no socket or token from
//! the failed exchange is reused. When attempts run out the style is
//! recorded as failed and the flush moves on.

use cloudfiles_client::{Container, ObjectStore, PutOptions, RemoteError};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

/// A style that could not be persisted.
#[derive(Debug)]
pub struct FailedWrite {
    pub style: String,
    /// Remote path the upload targeted.
    pub path: String,
    /// Local file that was queued.
    pub local_path: PathBuf,
    pub attempts: u32,
    /// Error from the last attempt.
    pub error: RemoteError,
}

/// Outcome of a write flush.
#[derive(Debug, Default)]
pub struct FlushReport {
    /// Styles persisted, in flush order.
    pub persisted: Vec<String>,
    pub failed: Vec<FailedWrite>,
    /// Reconnects performed between attempts.
    pub reconnects: u32,
}

impl FlushReport {
    /// True when every queued style was persisted.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn failed_styles(&self) -> Vec<&str> {
        self.failed.iter().map(|f| f.style.as_str()).collect()
    }
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

/// One queued upload.
pub(crate) struct WriteJob<'a> {
    pub style: &'a str,
    pub path: &'a str,
    pub local_path: &'a Path,
    pub options: &'a PutOptions,
}

/// Uploads one style, retrying transient failures, and records the outcome.
pub(crate) async fn write_with_retry(
    store: &dyn ObjectStore,
    container: &Container,
    job: WriteJob<'_>,
    policy: RetryPolicy,
    report: &mut FlushReport,
) {
    let mut attempt = 1;
    loop {
        match store
            .put_file(container, job.path, job.local_path, job.options)
            .await
        {
            Ok(()) => {
                debug!("persisted {} to {} (attempt {attempt})", job.style, job.path);
                report.persisted.push(job.style.to_string());
                return;
            }
            Err(e) if e.is_transient() && attempt < policy.max_attempts => {
                warn!(
                    "upload of {} failed (attempt {attempt}/{}): {e}; reconnecting",
                    job.path, policy.max_attempts
                );
                report.reconnects += 1;
                if let Err(reconnect_err) = store.connect().await {
                    warn!("reconnect failed: {reconnect_err}");
                }
                if !policy.delay.is_zero() {
                    tokio::time::sleep(policy.delay).await;
                }
                attempt += 1;
            }
            Err(e) => {
                warn!(
                    "giving up on {} ({}) after {attempt} attempt(s): {e}",
                    job.style, job.path
                );
                report.failed.push(FailedWrite {
                    style: job.style.to_string(),
                    path: job.path.to_string(),
                    local_path: job.local_path.to_path_buf(),
                    attempts: attempt,
                    error: e,
                });
                return;
            }
        }
    }
}
