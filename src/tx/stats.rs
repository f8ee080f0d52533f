//! Transaction statistics

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters updated by a transaction
#[derive(Debug, Default)]
pub struct TxStats {
  nodes_created: AtomicU64,
  properties_created: AtomicU64,
  relationships_created: AtomicU64,
  edges_deleted: AtomicU64,
  edges_loaded: AtomicU64,
  index_inserts: AtomicU64,
  index_removals: AtomicU64,
  index_removals_skipped: AtomicU64,
  key_conflicts: AtomicU64,
  flushes: AtomicU64,
}

/// Point-in-time copy of [`TxStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TxStatsSnapshot {
  pub nodes_created: u64,
  pub properties_created: u64,
  pub relationships_created: u64,
  pub edges_deleted: u64,
  pub edges_loaded: u64,
  pub index_inserts: u64,
  pub index_removals: u64,
  /// Removals skipped because another live property kept the entry valid
  pub index_removals_skipped: u64,
  pub key_conflicts: u64,
  pub flushes: u64,
}

macro_rules! counter {
  ($name:ident, $field:ident) => {
    pub(crate) fn $name(&self) {
      self.$field.fetch_add(1, Ordering::Relaxed);
    }
  };
}

impl TxStats {
  counter!(node_created, nodes_created);
  counter!(property_created, properties_created);
  counter!(relationship_created, relationships_created);
  counter!(edge_deleted, edges_deleted);
  counter!(edge_loaded, edges_loaded);
  counter!(index_inserted, index_inserts);
  counter!(index_removed, index_removals);
  counter!(index_removal_skipped, index_removals_skipped);
  counter!(key_conflict, key_conflicts);
  counter!(flushed, flushes);

  pub fn snapshot(&self) -> TxStatsSnapshot {
    TxStatsSnapshot {
      nodes_created: self.nodes_created.load(Ordering::Relaxed),
      properties_created: self.properties_created.load(Ordering::Relaxed),
      relationships_created: self.relationships_created.load(Ordering::Relaxed),
      edges_deleted: self.edges_deleted.load(Ordering::Relaxed),
      edges_loaded: self.edges_loaded.load(Ordering::Relaxed),
      index_inserts: self.index_inserts.load(Ordering::Relaxed),
      index_removals: self.index_removals.load(Ordering::Relaxed),
      index_removals_skipped: self.index_removals_skipped.load(Ordering::Relaxed),
      key_conflicts: self.key_conflicts.load(Ordering::Relaxed),
      flushes: self.flushes.load(Ordering::Relaxed),
    }
  }
}
