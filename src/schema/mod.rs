//! Edge types: definitions, builder, manager and auto-creation policy

use std::sync::atomic::{AtomicU32, Ordering};

use crate::constants::INITIAL_ETYPE_ID;
use crate::tx::GraphTx;
use crate::types::ETypeId;

mod auto;
mod builder;
mod edge_type;

pub use auto::{AutoEdgeTypeMaker, DefaultAutoEdgeTypes, IndexedAutoEdgeTypes};
pub use builder::EdgeTypeBuilder;
pub use edge_type::{
  EdgeCategory, EdgeType, EdgeTypeDef, IndexType, PropertyType, RelationshipType,
};

// ============================================================================
// Edge Type Manager
// ============================================================================

/// Source of edge type builders and edge type ids
pub trait EdgeTypeManager: Send + Sync {
  /// Allocate a new edge type ID
  fn alloc_etype_id(&self) -> ETypeId;

  /// Open a builder scoped to `tx`
  fn open_builder<'a>(&'a self, tx: &'a GraphTx) -> EdgeTypeBuilder<'a>;
}

/// Edge type manager backed by an atomic id counter
#[derive(Debug)]
pub struct StandardEdgeTypeManager {
  next_etype_id: AtomicU32,
}

impl StandardEdgeTypeManager {
  pub fn new() -> Self {
    Self::starting_at(INITIAL_ETYPE_ID)
  }

  /// Continue allocation after ids already used by persisted types
  pub fn starting_at(next: ETypeId) -> Self {
    Self {
      next_etype_id: AtomicU32::new(next),
    }
  }
}

impl Default for StandardEdgeTypeManager {
  fn default() -> Self {
    Self::new()
  }
}

impl EdgeTypeManager for StandardEdgeTypeManager {
  fn alloc_etype_id(&self) -> ETypeId {
    self.next_etype_id.fetch_add(1, Ordering::SeqCst)
  }

  fn open_builder<'a>(&'a self, tx: &'a GraphTx) -> EdgeTypeBuilder<'a> {
    EdgeTypeBuilder::new(tx, self)
  }
}
