//! Edge lifecycle hooks
//!
//! Called when an edge is created, deleted or materialized from storage. The
//! hooks keep the index overlay and the pending change set in step with the
//! live edge set.

use tracing::{debug, error, warn};

use crate::error::{Result, TxError};
use crate::graph::{Edge, Property};

use super::overlay::{IndexRemoval, KeyInsert};
use super::{GraphTx, TxState};

fn indexable_property(edge: &Edge) -> Option<&Property> {
  edge.as_property().filter(|p| p.is_indexable())
}

impl GraphTx {
  // ========================================================================
  // Public hooks
  // ========================================================================

  /// A new edge was created in this transaction
  pub fn added_edge(&self, edge: &Edge) -> Result<()> {
    let state = self.state()?;
    self.added_edge_in(&state, edge)
  }

  /// An edge was deleted in this transaction
  ///
  /// Overlay corruption detected here aborts the transaction.
  pub fn deleted_edge(&self, edge: &Edge) -> Result<()> {
    let result = {
      let state = self.state()?;
      self.deleted_edge_in(&state, edge)
    };
    self.escalate(result)
  }

  /// An edge was materialized from storage
  pub fn loaded_edge(&self, edge: &Edge) -> Result<()> {
    let state = self.state()?;
    self.loaded_edge_in(&state, edge).map(|_| ())
  }

  // ========================================================================
  // Hook bodies (caller holds the state guard)
  // ========================================================================

  pub(crate) fn added_edge_in(&self, state: &TxState, edge: &Edge) -> Result<()> {
    self.verify_write_access()?;
    if !edge.is_new() {
      return Err(TxError::InvalidEdgeState(format!(
        "edge {} was not created in this transaction",
        edge.id()
      )));
    }

    if let Some(property) = indexable_property(edge) {
      self.index_property(state, property)?;
    }

    state.pending.lock().added_edges.push(edge.clone());
    Ok(())
  }

  pub(crate) fn deleted_edge_in(&self, state: &TxState, edge: &Edge) -> Result<()> {
    self.verify_write_access()?;
    if !edge.is_removed() {
      return Err(TxError::InvalidEdgeState(format!(
        "edge {} has not been removed",
        edge.id()
      )));
    }

    if let Some(property) = indexable_property(edge) {
      self.unindex_property(state, property)?;
    }

    let mut pending = state.pending.lock();
    match pending.added_edges.iter().position(|e| e.id() == edge.id()) {
      // Never reached storage
      Some(pos) => {
        pending.added_edges.remove(pos);
      }
      None => pending.deleted_edges.push(edge.clone()),
    }
    self.stats.edge_deleted();
    Ok(())
  }

  /// Returns true when the edge inserted a new overlay entry
  pub(crate) fn loaded_edge_in(&self, state: &TxState, edge: &Edge) -> Result<bool> {
    if !edge.is_loaded() {
      return Err(TxError::InvalidEdgeState(format!(
        "edge {} was not loaded from storage",
        edge.id()
      )));
    }

    let inserted = match indexable_property(edge) {
      Some(property) => self.index_property(state, property)?,
      None => false,
    };
    self.stats.edge_loaded();
    Ok(inserted)
  }

  // ========================================================================
  // Overlay maintenance
  // ========================================================================

  fn index_property(&self, state: &TxState, property: &Property) -> Result<bool> {
    let ptype = property.property_type();
    let start = property.start().ok_or_else(|| {
      TxError::InvalidEdgeState(format!("start node of property {} is gone", property.id()))
    })?;

    if ptype.is_keyed() && !self.config.verify_key_uniqueness {
      match state
        .overlay
        .add_key_unchecked(ptype, property.attribute(), &start)
      {
        KeyInsert::Inserted => {
          self.stats.index_inserted();
          return Ok(true);
        }
        KeyInsert::AlreadyOwned => {}
        KeyInsert::Shadowed(owner) => {
          self.stats.key_conflict();
          warn!(
            txid = self.txid,
            etype = %ptype,
            attribute = %property.attribute(),
            owner = owner.id(),
            node = start.id(),
            "key already owned by another node; uniqueness verification is disabled"
          );
        }
      }
      return Ok(false);
    }

    match state.overlay.add_to_index(ptype, property.attribute(), &start) {
      Ok(inserted) => {
        self.stats.index_inserted();
        Ok(inserted)
      }
      Err(err) => {
        if matches!(err, TxError::DuplicateKey { .. }) {
          self.stats.key_conflict();
        }
        Err(err)
      }
    }
  }

  fn unindex_property(&self, state: &TxState, property: &Property) -> Result<()> {
    let ptype = property.property_type();

    // A shadowed key never made it into the overlay
    if ptype.is_keyed() && !self.config.verify_key_uniqueness {
      if let Some(owner) = state.overlay.get_key(ptype, property.attribute()) {
        if owner.id() != property.start_id() {
          self.stats.index_removal_skipped();
          return Ok(());
        }
      }
    }

    match state.overlay.remove_from_index(property)? {
      IndexRemoval::Removed => self.stats.index_removed(),
      IndexRemoval::Retained => self.stats.index_removal_skipped(),
    }
    debug!(
      txid = self.txid,
      etype = %ptype,
      node = property.start_id(),
      "retracted property from index"
    );
    Ok(())
  }

  /// Tear the transaction down on a fatal error; no state guard may be held
  pub(crate) fn escalate<T>(&self, result: Result<T>) -> Result<T> {
    if let Err(err) = &result {
      if err.is_fatal() {
        error!(txid = self.txid, error = %err, "aborting transaction");
        self.teardown();
      }
    }
    result
  }
}
