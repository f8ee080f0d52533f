//! Constants for the transaction core

use crate::types::{ETypeId, EdgeId, NodeId, TxId};

// ============================================================================
// Initial IDs (start from 1, 0 is reserved/null)
// ============================================================================

pub const INITIAL_NODE_ID: NodeId = 1;
pub const INITIAL_EDGE_ID: EdgeId = 1;
pub const INITIAL_ETYPE_ID: ETypeId = 1;
pub const INITIAL_TX_ID: TxId = 1;

// ============================================================================
// Index overlay sizing
// ============================================================================

/// Initial number of per-type sub-indexes
pub const TYPE_INDEX_CAPACITY: usize = 20;

/// Initial capacity of a keyed sub-index
pub const KEY_INDEX_CAPACITY: usize = 10;

/// Initial number of distinct values in an attribute sub-index
pub const ATTRIBUTE_INDEX_CAPACITY: usize = 10;

/// Initial capacity of the new-node registry
pub const NEW_NODES_CAPACITY: usize = 10;

// ============================================================================
// Reserved names
// ============================================================================

/// Name of the system property that keys edge type definitions by name
pub const SYSTEM_EDGE_TYPE_NAME: &str = "_edge_type_name";

/// Prefix reserved for system edge types
pub const SYSTEM_NAME_PREFIX: char = '_';
