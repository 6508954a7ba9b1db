#![forbid(unsafe_code)]

//! Nested directed graph model used by `orca`.
//!
//! A [`Graph`] owns a containment tree (every node except the root has exactly one parent)
//! and an independent set of directed edges between arbitrary nodes. Node and edge payloads
//! are generic labels, so the layout crate can attach its own data without this crate
//! knowing about layout options.

pub mod error;
pub mod graph;

pub use error::{GraphError, Result};
pub use graph::{EdgeId, Graph, GraphId, NodeId, alg};
