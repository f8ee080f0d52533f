//! Graph transactions
//!
//! A [`GraphTx`] mediates every mutation and lookup of nodes, properties and
//! relationships for one transaction. It owns an index overlay that keeps key
//! uniqueness and attribute lookups correct before anything reaches storage.
//!
//! The transaction API is split by concern:
//! - `create`: nodes, properties, relationships, edge types, deletion
//! - `resolve`: edge type lookup and auto-creation by name
//! - `lookup`: key and attribute index queries
//! - `hooks`: added / deleted / loaded edge callbacks driving the overlay
//! - `lifecycle`: commit, abort, flush and enumeration

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use indexmap::IndexSet;
use parking_lot::{MappedRwLockReadGuard, Mutex, RwLock, RwLockReadGuard};
use tracing::debug;

use crate::constants::{INITIAL_TX_ID, NEW_NODES_CAPACITY};
use crate::error::{Result, TxError};
use crate::graph::{EdgeFactory, Node, NodeFactory, StandardEdgeFactory, StandardNodeFactory};
use crate::schema::{EdgeTypeManager, StandardEdgeTypeManager};
use crate::storage::{ChangeSet, TxStorage};
use crate::types::{NodeId, TxId};

mod config;
mod create;
mod guard;
mod hooks;
mod lifecycle;
mod lookup;
mod overlay;
mod resolve;
mod stats;

pub use config::TxConfig;
pub use guard::{KeyGuard, KeyLockMode, UniquenessGuard};
pub use overlay::{IndexOverlay, IndexRemoval, KeyInsert};
pub use stats::{TxStats, TxStatsSnapshot};

// ============================================================================
// Context
// ============================================================================

/// Collaborators shared by every transaction opened on the same graph
#[derive(Clone)]
pub struct TxContext {
  pub node_factory: Arc<dyn NodeFactory>,
  pub edge_factory: Arc<dyn EdgeFactory>,
  pub edge_types: Arc<dyn EdgeTypeManager>,
  pub storage: Arc<dyn TxStorage>,
  next_tx_id: Arc<AtomicU64>,
}

impl TxContext {
  /// Context with the standard factories and edge type manager
  ///
  /// Id allocation continues after the ids `storage` already holds.
  pub fn new(storage: Arc<dyn TxStorage>) -> Self {
    let next = storage.next_ids();
    Self {
      node_factory: Arc::new(StandardNodeFactory::starting_at(next.node)),
      edge_factory: Arc::new(StandardEdgeFactory::starting_at(next.edge)),
      edge_types: Arc::new(StandardEdgeTypeManager::starting_at(next.etype)),
      storage,
      next_tx_id: Arc::new(AtomicU64::new(INITIAL_TX_ID)),
    }
  }

  pub fn with_node_factory(mut self, factory: Arc<dyn NodeFactory>) -> Self {
    self.node_factory = factory;
    self
  }

  pub fn with_edge_factory(mut self, factory: Arc<dyn EdgeFactory>) -> Self {
    self.edge_factory = factory;
    self
  }

  pub fn with_edge_type_manager(mut self, manager: Arc<dyn EdgeTypeManager>) -> Self {
    self.edge_types = manager;
    self
  }

  fn alloc_tx_id(&self) -> TxId {
    self.next_tx_id.fetch_add(1, Ordering::SeqCst)
  }
}

impl fmt::Debug for TxContext {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("TxContext")
      .field("next_tx_id", &self.next_tx_id.load(Ordering::Relaxed))
      .finish_non_exhaustive()
  }
}

// ============================================================================
// Transaction State
// ============================================================================

/// Everything released when the transaction closes
pub(crate) struct TxState {
  pub(crate) overlay: IndexOverlay,
  /// Nodes created through the creation API, in creation order
  pub(crate) new_nodes: Option<Mutex<IndexSet<Node>>>,
  /// One handle per node id seen by this transaction
  pub(crate) local_nodes: DashMap<NodeId, Node>,
  /// Changes not yet handed to storage
  pub(crate) pending: Mutex<ChangeSet>,
}

impl TxState {
  fn new(config: &TxConfig) -> Self {
    let track = config.track_new_nodes && !config.read_only;
    Self {
      overlay: IndexOverlay::new(),
      new_nodes: track.then(|| Mutex::new(IndexSet::with_capacity(NEW_NODES_CAPACITY))),
      local_nodes: DashMap::new(),
      pending: Mutex::new(ChangeSet::default()),
    }
  }
}

// ============================================================================
// Transaction
// ============================================================================

/// One graph transaction
pub struct GraphTx {
  txid: TxId,
  config: TxConfig,
  ctx: TxContext,
  /// `None` once committed or aborted
  state: RwLock<Option<TxState>>,
  key_guard: UniquenessGuard,
  stats: TxStats,
}

impl GraphTx {
  /// Open a transaction and register the edge types storage already knows
  pub fn open(ctx: TxContext, config: TxConfig) -> Result<Self> {
    let tx = Self {
      txid: ctx.alloc_tx_id(),
      key_guard: UniquenessGuard::new(config.key_lock),
      state: RwLock::new(Some(TxState::new(&config))),
      stats: TxStats::default(),
      config,
      ctx,
    };

    for et in tx.ctx.storage.edge_types()? {
      tx.loaded_edge_type(&et)?;
    }

    debug!(
      txid = tx.txid,
      read_only = tx.config.read_only,
      key_lock = ?tx.config.key_lock,
      "opened transaction"
    );
    Ok(tx)
  }

  /// Borrow the open state; fails once the transaction is closed
  pub(crate) fn state(&self) -> Result<MappedRwLockReadGuard<'_, TxState>> {
    RwLockReadGuard::try_map(self.state.read_recursive(), |state| state.as_ref())
      .map_err(|_| TxError::TransactionClosed)
  }
}

impl fmt::Debug for GraphTx {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("GraphTx")
      .field("txid", &self.txid)
      .field("config", &self.config)
      .field("open", &self.is_open())
      .finish()
  }
}

/// Begin a writable transaction with the default configuration
pub fn begin_tx(ctx: &TxContext) -> Result<GraphTx> {
  GraphTx::open(ctx.clone(), TxConfig::default())
}

/// Begin a read-only transaction
pub fn begin_read_tx(ctx: &TxContext) -> Result<GraphTx> {
  GraphTx::open(ctx.clone(), TxConfig::default().read_only(true))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::storage::MemoryStorage;

  #[test]
  fn test_transaction_ids_are_unique() {
    let ctx = TxContext::new(Arc::new(MemoryStorage::new()));
    let a = begin_tx(&ctx).unwrap();
    let b = begin_read_tx(&ctx).unwrap();
    assert_ne!(a.txid(), b.txid());
    assert!(b.is_read_only());
  }

  #[test]
  fn test_read_only_has_no_registry() {
    let ctx = TxContext::new(Arc::new(MemoryStorage::new()));
    let tx = begin_read_tx(&ctx).unwrap();
    assert!(tx.state().unwrap().new_nodes.is_none());
  }

  #[test]
  fn test_graph_tx_is_send_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<GraphTx>();
  }
}
