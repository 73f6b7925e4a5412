//! Async delivery of new snapshots to a graph view

use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use wikiscope_core::{GraphSnapshot, RenderSurface};

use crate::error::ViewError;
use crate::queue::QueuePolicy;
use crate::view::GraphView;

/// Producer side of a snapshot feed. Cheap to clone.
#[derive(Debug, Clone)]
pub struct FeedHandle {
    tx: mpsc::UnboundedSender<GraphSnapshot>,
}

impl FeedHandle {
    /// Announce a new snapshot. Fails once the feed has stopped.
    pub fn publish(&self, snapshot: GraphSnapshot) -> Result<(), ViewError> {
        self.tx.send(snapshot).map_err(|_| ViewError::FeedClosed)
    }
}

/// Counters reported when a feed finishes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FeedStats {
    /// Snapshots taken off the channel.
    pub received: u64,
    /// Cycles that changed at least one store.
    pub applied: u64,
    /// Cycles that found nothing to change.
    pub unchanged: u64,
    /// Cycles dropped after an engine error.
    pub failed: u64,
    /// Snapshots dropped by the supersede policy.
    pub superseded: u64,
}

/// Consumer side of a snapshot feed.
#[derive(Debug)]
pub struct SnapshotFeed {
    rx: mpsc::UnboundedReceiver<GraphSnapshot>,
}

/// Create a connected feed handle and consumer.
pub fn channel() -> (FeedHandle, SnapshotFeed) {
    let (tx, rx) = mpsc::unbounded_channel();
    (FeedHandle { tx }, SnapshotFeed { rx })
}

impl SnapshotFeed {
    /// Reconcile snapshots into `view` as they arrive.
    ///
    /// Each message is reconciled to completion before the next is read.
    /// Under [`QueuePolicy::Supersede`] everything already waiting on the
    /// channel is drained first so only the latest snapshot is diffed.
    /// Runs until every [`FeedHandle`] is dropped or the view is unmounted.
    pub async fn run<S: RenderSurface>(mut self, view: &mut GraphView<S>) -> FeedStats {
        let mut stats = FeedStats::default();
        let supersede = view.policy() == QueuePolicy::Supersede;
        let superseded_before = view.superseded();

        'feed: while let Some(snapshot) = self.rx.recv().await {
            stats.received += 1;
            if !submit(view, snapshot) {
                break;
            }

            if supersede {
                while let Ok(next) = self.rx.try_recv() {
                    stats.received += 1;
                    if !submit(view, next) {
                        break 'feed;
                    }
                }
            }

            if !drain(view, &mut stats) {
                break;
            }
        }

        stats.superseded = view.superseded() - superseded_before;
        info!(
            received = stats.received,
            applied = stats.applied,
            unchanged = stats.unchanged,
            failed = stats.failed,
            superseded = stats.superseded,
            "Snapshot feed finished"
        );
        stats
    }
}

fn submit<S: RenderSurface>(view: &mut GraphView<S>, snapshot: GraphSnapshot) -> bool {
    match view.submit(snapshot) {
        Ok(sequence) => {
            debug!(sequence, "Snapshot queued");
            true
        }
        Err(e) => {
            warn!(error = %e, "Snapshot feed stopping");
            false
        }
    }
}

/// Process the view's queue until it is empty, counting failed cycles and
/// carrying on past them. Returns false if the view can no longer reconcile.
fn drain<S: RenderSurface>(view: &mut GraphView<S>, stats: &mut FeedStats) -> bool {
    loop {
        match view.process_next() {
            Ok(Some(change)) if change.is_empty() => stats.unchanged += 1,
            Ok(Some(_)) => stats.applied += 1,
            Ok(None) => return true,
            Err(ViewError::Engine(e)) => {
                stats.failed += 1;
                debug!(error = %e, pending = view.pending(), "Continuing after failed cycle");
            }
            Err(e) => {
                warn!(error = %e, "Cannot reconcile pending snapshots");
                return false;
            }
        }
    }
}
