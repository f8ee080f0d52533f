//! Graph entities: nodes, property and relationship edges, and the factories
//! that create them

mod edge;
mod factory;
mod node;

pub use edge::{Edge, EntityState, Property, Relationship};
pub use factory::{EdgeFactory, NodeFactory, StandardEdgeFactory, StandardNodeFactory};
pub use node::{Node, WeakNode};
