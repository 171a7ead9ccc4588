//! Retained snapshot buffer
//!
//! Snapshots are ordered oldest first. The retention policy bounds how many
//! are kept; pushing past the bound evicts from the front.

use super::Snapshot;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// How many snapshots the buffer keeps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RetentionPolicy {
    /// Only the most recent snapshot
    #[default]
    SingleSlot,
    /// The `capacity` most recent snapshots
    Fifo { capacity: usize },
}

impl RetentionPolicy {
    /// Maximum number of retained snapshots (never below 1)
    #[inline]
    pub fn capacity(&self) -> usize {
        match self {
            RetentionPolicy::SingleSlot => 1,
            RetentionPolicy::Fifo { capacity } => (*capacity).max(1),
        }
    }
}

/// Bounded, oldest-first snapshot storage
#[derive(Debug, Clone)]
pub struct SnapshotBuffer {
    policy: RetentionPolicy,
    snapshots: VecDeque<Snapshot>,
}

impl SnapshotBuffer {
    pub fn new(policy: RetentionPolicy) -> Self {
        Self {
            policy,
            snapshots: VecDeque::with_capacity(policy.capacity().min(1024)),
        }
    }

    /// Append, evicting the oldest entries past capacity
    pub fn push(&mut self, snapshot: Snapshot) {
        self.snapshots.push_back(snapshot);
        self.evict();
    }

    /// Replace contents, keeping the newest entries that fit
    pub fn replace(&mut self, snapshots: Vec<Snapshot>) {
        self.snapshots = snapshots.into();
        self.evict();
    }

    fn evict(&mut self) {
        let capacity = self.policy.capacity();
        while self.snapshots.len() > capacity {
            self.snapshots.pop_front();
        }
    }

    #[inline]
    pub fn latest(&self) -> Option<&Snapshot> {
        self.snapshots.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Snapshot> {
        self.snapshots.iter()
    }

    /// Owned copy, oldest first
    pub fn to_vec(&self) -> Vec<Snapshot> {
        self.snapshots.iter().cloned().collect()
    }

    pub fn clear(&mut self) {
        self.snapshots.clear();
    }

    pub fn policy(&self) -> RetentionPolicy {
        self.policy
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}
