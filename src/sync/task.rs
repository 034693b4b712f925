use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::client::{RemoteClient, SyncError};
use super::merge::MergeReport;
use crate::store::QuoteStore;

/// Store shared between the command side and the sync task.
pub type SharedStore = Arc<Mutex<QuoteStore>>;

/// Outcome of one sync cycle, as seen by whoever drains the channel.
#[derive(Debug, Clone)]
pub enum SyncEvent {
    Completed {
        report: MergeReport,
        at: DateTime<Utc>,
    },
    Failed {
        error: String,
        at: DateTime<Utc>,
    },
}

impl SyncEvent {
    /// One-line notification text for the event.
    pub fn summary(&self) -> String {
        match self {
            SyncEvent::Completed { report, at } if report.has_conflicts() => format!(
                "[{}] Synced: {} conflict(s) resolved with server data, {} new",
                at.format("%H:%M:%S"),
                report.conflicts,
                report.added
            ),
            SyncEvent::Completed { report, at } => format!(
                "[{}] Synced: {} new, no conflicts",
                at.format("%H:%M:%S"),
                report.added
            ),
            SyncEvent::Failed { error, at } => {
                format!("[{}] Sync failed: {}", at.format("%H:%M:%S"), error)
            }
        }
    }
}

/// Fetch the remote collection, merge it into the store and persist.
///
/// The store lock is not held while the request is in flight, so commands
/// stay responsive during a slow fetch.
pub async fn sync_once(store: &SharedStore, client: &RemoteClient) -> Result<MergeReport, SyncError> {
    let remote = client.fetch_quotes().await?;

    let mut guard = store.lock().await;
    let report = guard.apply_remote(&remote).await?;

    tracing::info!(
        conflicts = report.conflicts,
        added = report.added,
        linked = report.linked,
        unchanged = report.unchanged,
        total = guard.len(),
        "Sync cycle complete"
    );
    Ok(report)
}

/// Handle to a running sync task. Dropping it stops the task.
pub struct SyncHandle {
    handle: JoinHandle<()>,
}

impl SyncHandle {
    /// Stop the task. An in-flight request is abandoned.
    pub fn cancel(&self) {
        self.handle.abort();
        tracing::debug!("Sync task cancelled");
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for SyncHandle {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Repeating fetch + merge on a fixed period.
pub struct SyncTask;

impl SyncTask {
    /// Spawn the task. The first cycle runs immediately, then every `period`.
    ///
    /// Failures are reported and the next tick simply tries again; there is
    /// no backoff. The task ends on its own once `events` has no receiver.
    pub fn spawn(
        store: SharedStore,
        client: RemoteClient,
        period: Duration,
        events: mpsc::Sender<SyncEvent>,
    ) -> SyncHandle {
        tracing::info!(
            endpoint = %client.endpoint(),
            period_secs = period.as_secs_f64(),
            "Starting periodic sync"
        );

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            // A slow cycle delays the next one rather than bunching ticks up.
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;

                let event = match sync_once(&store, &client).await {
                    Ok(report) => SyncEvent::Completed {
                        report,
                        at: Utc::now(),
                    },
                    Err(e) => {
                        tracing::warn!(error = %e, "Sync cycle failed, will retry next tick");
                        SyncEvent::Failed {
                            error: e.to_string(),
                            at: Utc::now(),
                        }
                    }
                };

                if events.send(event).await.is_err() {
                    tracing::debug!("Sync event receiver dropped, stopping sync task");
                    break;
                }
            }
        });

        SyncHandle { handle }
    }
}
