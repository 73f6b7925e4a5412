//! Pending snapshot queue with strict or supersede ordering

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use wikiscope_core::GraphSnapshot;

/// How snapshots that arrive faster than they are reconciled are handled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueuePolicy {
    /// Every snapshot is reconciled, in production order.
    #[default]
    Strict,
    /// Only the latest pending snapshot is kept.
    Supersede,
}

/// A snapshot waiting to be reconciled.
#[derive(Debug, Clone)]
pub struct PendingSnapshot {
    /// Production order, starting at 1.
    pub sequence: u64,
    pub produced_at: DateTime<Utc>,
    pub snapshot: GraphSnapshot,
}

#[derive(Debug, Default)]
pub struct SnapshotQueue {
    policy: QueuePolicy,
    next_sequence: u64,
    pending: VecDeque<PendingSnapshot>,
    superseded: u64,
}

impl SnapshotQueue {
    pub fn new(policy: QueuePolicy) -> Self {
        SnapshotQueue {
            policy,
            ..Default::default()
        }
    }

    /// Enqueue a snapshot and return its production sequence number.
    pub fn push(&mut self, snapshot: GraphSnapshot) -> u64 {
        self.next_sequence += 1;
        if self.policy == QueuePolicy::Supersede && !self.pending.is_empty() {
            let dropped = self.pending.len() as u64;
            self.pending.clear();
            self.superseded += dropped;
            debug!(dropped, sequence = self.next_sequence, "Superseded pending snapshots");
        }
        self.pending.push_back(PendingSnapshot {
            sequence: self.next_sequence,
            produced_at: Utc::now(),
            snapshot,
        });
        self.next_sequence
    }

    /// Oldest pending snapshot.
    pub fn pop(&mut self) -> Option<PendingSnapshot> {
        self.pending.pop_front()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }

    pub fn policy(&self) -> QueuePolicy {
        self.policy
    }

    /// Number of snapshots dropped by the supersede policy so far.
    pub fn superseded(&self) -> u64 {
        self.superseded
    }
}
