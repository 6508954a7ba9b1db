//! Handle types.
//!
//! Handles carry the identity of the graph instance that issued them, so a handle from one
//! graph is never mistaken for a node of another graph with the same index.

use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static GRAPH_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct GraphId(u64);

impl GraphId {
    pub(in crate::graph) fn next() -> Self {
        Self(GRAPH_ID_COUNTER.fetch_add(1, Ordering::Relaxed) + 1)
    }
}

impl fmt::Display for GraphId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "g{}", self.0)
    }
}

/// A node handle. `index` is the creation order of the node within its graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct NodeId {
    graph: GraphId,
    index: u32,
}

impl NodeId {
    pub(in crate::graph) fn new(graph: GraphId, index: usize) -> Self {
        Self {
            graph,
            index: index as u32,
        }
    }

    pub fn graph(self) -> GraphId {
        self.graph
    }

    pub fn index(self) -> usize {
        self.index as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}@{}", self.index, self.graph)
    }
}

/// An edge handle. `index` is the creation order of the edge within its graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct EdgeId {
    graph: GraphId,
    index: u32,
}

impl EdgeId {
    pub(in crate::graph) fn new(graph: GraphId, index: usize) -> Self {
        Self {
            graph,
            index: index as u32,
        }
    }

    pub fn graph(self) -> GraphId {
        self.graph
    }

    pub fn index(self) -> usize {
        self.index as usize
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e{}@{}", self.index, self.graph)
    }
}
