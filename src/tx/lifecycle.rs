//! Transaction lifecycle
//!
//! Commit, abort and flush take the state write lock, so they exclude each
//! other and every in-flight operation on the same transaction.

use tracing::debug;

use crate::error::{Result, TxError};
use crate::graph::{Node, Relationship};
use crate::storage::ChangeSet;
use crate::types::TxId;

use super::{GraphTx, TxConfig, TxStatsSnapshot};

impl GraphTx {
  // ========================================================================
  // Access checks
  // ========================================================================

  /// Fails on a closed or read-only transaction
  pub fn verify_write_access(&self) -> Result<()> {
    if self.is_closed() {
      return Err(TxError::TransactionClosed);
    }
    if self.config.read_only {
      return Err(TxError::ReadOnly);
    }
    Ok(())
  }

  pub fn is_open(&self) -> bool {
    self.state.read_recursive().is_some()
  }

  pub fn is_closed(&self) -> bool {
    !self.is_open()
  }

  /// True if this writable, tracking transaction created at least one node
  pub fn has_modifications(&self) -> bool {
    self
      .state()
      .map(|state| {
        state
          .new_nodes
          .as_ref()
          .is_some_and(|nodes| !nodes.lock().is_empty())
      })
      .unwrap_or(false)
  }

  // ========================================================================
  // Commit / Abort / Flush
  // ========================================================================

  /// Persist pending changes, then release the overlay
  ///
  /// If storage rejects the changes the transaction stays open.
  pub fn commit(&self) -> Result<()> {
    let mut guard = self.state.write();
    let state = guard.as_ref().ok_or(TxError::TransactionClosed)?;

    let changes = {
      let pending = state.pending.lock();
      if !pending.is_empty() {
        self.ctx.storage.persist(&pending)?;
      }
      pending.len()
    };

    *guard = None;
    debug!(txid = self.txid, changes, "committed transaction");
    Ok(())
  }

  /// Discard pending changes and release the overlay
  pub fn abort(&self) -> Result<()> {
    let state = self.state.write().take().ok_or(TxError::TransactionClosed)?;
    let discarded = state.pending.lock().len();
    debug!(txid = self.txid, discarded, "aborted transaction");
    Ok(())
  }

  /// Persist pending changes and keep the transaction open
  pub fn flush(&self) -> Result<()> {
    let guard = self.state.write();
    let state = guard.as_ref().ok_or(TxError::TransactionClosed)?;

    let mut pending = state.pending.lock();
    if pending.is_empty() {
      return Ok(());
    }
    self.ctx.storage.persist(&pending)?;
    let flushed = std::mem::take(&mut *pending);

    self.stats.flushed();
    debug!(txid = self.txid, changes = flushed.len(), "flushed transaction");
    Ok(())
  }

  /// Flush during a long-running load
  pub fn rolling_commit(&self) -> Result<()> {
    self.flush()
  }

  /// Release the overlay without persisting; false if already closed
  pub(crate) fn teardown(&self) -> bool {
    self.state.write().take().is_some()
  }

  // ========================================================================
  // Enumeration
  // ========================================================================

  /// Nodes created in this transaction, in creation order
  ///
  /// Read-only transactions have none; transactions without node tracking
  /// cannot enumerate.
  pub fn get_all_nodes(&self) -> Result<Vec<Node>> {
    let state = self.state()?;
    if self.config.read_only {
      return Ok(Vec::new());
    }
    match &state.new_nodes {
      Some(nodes) => Ok(nodes.lock().iter().cloned().collect()),
      None => Err(TxError::Unsupported(
        "new node tracking is disabled for this transaction".to_string(),
      )),
    }
  }

  /// Live relationships starting at a node created in this transaction
  pub fn get_all_relationships(&self) -> Result<Vec<Relationship>> {
    Ok(
      self
        .get_all_nodes()?
        .iter()
        .flat_map(|node| {
          node
            .relationships()
            .into_iter()
            .filter(move |r| r.start_id() == node.id())
        })
        .collect(),
    )
  }

  /// Changes not yet handed to storage
  pub fn pending_changes(&self) -> Result<ChangeSet> {
    Ok(self.state()?.pending.lock().clone())
  }

  // ========================================================================
  // Accessors
  // ========================================================================

  pub fn config(&self) -> &TxConfig {
    &self.config
  }

  pub fn is_read_only(&self) -> bool {
    self.config.read_only
  }

  pub fn txid(&self) -> TxId {
    self.txid
  }

  pub fn stats(&self) -> TxStatsSnapshot {
    self.stats.snapshot()
  }
}

#[cfg(test)]
mod tests {
  use std::sync::Arc;

  use crate::error::TxError;
  use crate::storage::MemoryStorage;
  use crate::tx::{begin_read_tx, begin_tx, GraphTx, TxConfig, TxContext};

  #[test]
  fn test_commit_persists_and_closes() {
    let storage = Arc::new(MemoryStorage::new());
    let ctx = TxContext::new(storage.clone());
    let tx = begin_tx(&ctx).unwrap();
    let n = tx.create_node().unwrap();
    tx.create_property_by_name("name", &n, "ada").unwrap();

    tx.commit().unwrap();
    assert!(tx.is_closed());
    assert!(!tx.has_modifications());
    assert!(storage.contains_node(n.id()));
    assert_eq!(storage.property_count(n.id()), 1);
    assert!(matches!(tx.commit(), Err(TxError::TransactionClosed)));
  }

  #[test]
  fn test_abort_discards() {
    let storage = Arc::new(MemoryStorage::new());
    let tx = begin_tx(&TxContext::new(storage.clone())).unwrap();
    let n = tx.create_node().unwrap();
    tx.abort().unwrap();
    assert!(!storage.contains_node(n.id()));
    assert_eq!(storage.persist_count(), 0);
    assert!(matches!(tx.create_node(), Err(TxError::TransactionClosed)));
    assert!(matches!(tx.abort(), Err(TxError::TransactionClosed)));
  }

  #[test]
  fn test_flush_keeps_transaction_open() {
    let storage = Arc::new(MemoryStorage::new());
    let tx = begin_tx(&TxContext::new(storage.clone())).unwrap();
    let n = tx.create_node().unwrap();

    tx.rolling_commit().unwrap();
    assert!(tx.is_open());
    assert!(storage.contains_node(n.id()));
    assert!(tx.pending_changes().unwrap().is_empty());
    assert_eq!(tx.get_all_nodes().unwrap(), vec![n]);
    assert_eq!(tx.stats().flushes, 1);

    // nothing pending
    tx.flush().unwrap();
    assert_eq!(storage.persist_count(), 1);
  }

  #[test]
  fn test_enumeration_policy() {
    let ctx = TxContext::new(Arc::new(MemoryStorage::new()));
    let read = begin_read_tx(&ctx).unwrap();
    assert!(read.get_all_nodes().unwrap().is_empty());
    assert!(!read.has_modifications());

    let untracked = GraphTx::open(ctx.clone(), TxConfig::new().track_new_nodes(false)).unwrap();
    untracked.create_node().unwrap();
    assert!(!untracked.has_modifications());
    assert!(matches!(
      untracked.get_all_nodes(),
      Err(TxError::Unsupported(_))
    ));
  }

  #[test]
  fn test_all_relationships() {
    let tx = begin_tx(&TxContext::new(Arc::new(MemoryStorage::new()))).unwrap();
    let a = tx.create_node().unwrap();
    let b = tx.create_node().unwrap();
    let r = tx.create_relationship_by_name("knows", &a, &b).unwrap();
    assert_eq!(tx.get_all_relationships().unwrap(), vec![r]);
  }
}
