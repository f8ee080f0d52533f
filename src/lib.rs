//! KiteTx - transaction core for an embedded graph database
//!
//! A transaction mediates every mutation and lookup of graph entities: nodes,
//! property edges (node -> attribute value) and relationship edges
//! (node -> node).
//!
//! # Architecture
//!
//! Each transaction keeps an **index overlay** above the storage layer:
//!
//! - **Key index**: keyed property types, at most one node per value
//! - **Attribute index**: indexed property types, many nodes per value
//! - **Type name index**: edge type resolution by name
//!
//! Newly created and lazily loaded properties are indexed in the overlay so
//! that uniqueness checks and attribute lookups are correct before anything
//! is committed. Attribute lookups merge a storage scan with the overlay.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use kitetx::{begin_tx, MemoryStorage, TxContext};
//!
//! let ctx = TxContext::new(Arc::new(MemoryStorage::new()));
//! let tx = begin_tx(&ctx).unwrap();
//!
//! let email = tx
//!   .create_edge_type()
//!   .unwrap()
//!   .name("email")
//!   .keyed()
//!   .make_property_type()
//!   .unwrap();
//!
//! let alice = tx.create_node().unwrap();
//! tx.create_property(&email, &alice, "alice@example.com").unwrap();
//!
//! let bob = tx.create_node().unwrap();
//! assert!(tx.create_property(&email, &bob, "alice@example.com").is_err());
//!
//! assert_eq!(tx.get_node_by_key(&email, "alice@example.com").unwrap(), Some(alice));
//! tx.commit().unwrap();
//! ```

#![deny(clippy::all)]

pub mod constants;
pub mod error;
pub mod graph;
pub mod schema;
pub mod storage;
pub mod tx;
pub mod types;

// Re-export commonly used items
pub use error::{Result, TxError};
pub use graph::{Edge, Node, Property, Relationship};
pub use schema::{EdgeType, PropertyType, RelationshipType};
pub use storage::{ChangeSet, MemoryStorage, NextIds, TxStorage};
pub use tx::{begin_read_tx, begin_tx, GraphTx, KeyLockMode, TxConfig, TxContext};
pub use types::{AttrValue, Interval};
