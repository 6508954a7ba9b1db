//! Graph container APIs used by `orca`.
//!
//! Nodes live in an arena indexed by creation order. The containment tree is stored as
//! parent/children links on the node entries, and the connectivity graph as per-node
//! incoming/outgoing edge lists. Both preserve insertion order, which downstream
//! algorithms rely on for deterministic output.

mod entries;
mod ids;

pub mod alg;

use crate::error::{GraphError, Result};
use entries::{EdgeEntry, NodeEntry};

pub use ids::{EdgeId, GraphId, NodeId};

/// A nested directed graph.
///
/// Cloning a graph keeps its [`GraphId`], so handles issued by the original remain valid on
/// the clone (useful for laying out a copy and comparing results).
#[derive(Debug, Clone)]
pub struct Graph<N, E> {
    id: GraphId,
    nodes: Vec<NodeEntry<N>>,
    edges: Vec<EdgeEntry<E>>,
}

impl<N, E> Default for Graph<N, E>
where
    N: Default,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<N, E> Graph<N, E>
where
    N: Default,
{
    /// Creates a graph holding only a root node with a default label.
    pub fn new() -> Self {
        Self::with_root(N::default())
    }

    /// Appends a child with a default label to `parent`.
    pub fn create_node(&mut self, parent: NodeId) -> Result<NodeId> {
        self.create_node_with_label(parent, N::default())
    }
}

impl<N, E> Graph<N, E>
where
    E: Default,
{
    pub fn create_edge(&mut self, source: NodeId, target: NodeId) -> Result<EdgeId> {
        self.create_edge_with_label(source, target, E::default())
    }
}

impl<N, E> Graph<N, E> {
    pub fn with_root(label: N) -> Self {
        Self {
            id: GraphId::next(),
            nodes: vec![NodeEntry::new(label, None)],
            edges: Vec::new(),
        }
    }

    pub fn id(&self) -> GraphId {
        self.id
    }

    pub fn root(&self) -> NodeId {
        NodeId::new(self.id, 0)
    }

    fn node_ix(&self, id: NodeId) -> Option<usize> {
        if id.graph() != self.id || id.index() >= self.nodes.len() {
            return None;
        }
        Some(id.index())
    }

    fn edge_ix(&self, id: EdgeId) -> Option<usize> {
        if id.graph() != self.id || id.index() >= self.edges.len() {
            return None;
        }
        Some(id.index())
    }

    fn node_id(&self, ix: usize) -> NodeId {
        NodeId::new(self.id, ix)
    }

    fn edge_id(&self, ix: usize) -> EdgeId {
        EdgeId::new(self.id, ix)
    }

    fn require_node(&self, id: NodeId) -> Result<usize> {
        self.node_ix(id).ok_or(GraphError::UnknownNode { node: id })
    }

    pub fn create_node_with_label(&mut self, parent: NodeId, label: N) -> Result<NodeId> {
        let Some(parent_ix) = self.node_ix(parent) else {
            return Err(GraphError::InvalidParent { parent });
        };
        let ix = self.nodes.len();
        self.nodes.push(NodeEntry::new(label, Some(parent_ix)));
        self.nodes[parent_ix].children.push(ix);
        Ok(self.node_id(ix))
    }

    pub fn create_edge_with_label(
        &mut self,
        source: NodeId,
        target: NodeId,
        label: E,
    ) -> Result<EdgeId> {
        let source_ix = self.require_node(source)?;
        let target_ix = self.require_node(target)?;
        let ix = self.edges.len();
        self.edges.push(EdgeEntry {
            source: source_ix,
            target: target_ix,
            label,
        });
        self.nodes[source_ix].out_edges.push(ix);
        self.nodes[target_ix].in_edges.push(ix);
        Ok(self.edge_id(ix))
    }

    pub fn contains_node(&self, id: NodeId) -> bool {
        self.node_ix(id).is_some()
    }

    pub fn contains_edge(&self, id: EdgeId) -> bool {
        self.edge_ix(id).is_some()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn node(&self, id: NodeId) -> Option<&N> {
        self.node_ix(id).map(|ix| &self.nodes[ix].label)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut N> {
        self.node_ix(id).map(move |ix| &mut self.nodes[ix].label)
    }

    pub fn edge(&self, id: EdgeId) -> Option<&E> {
        self.edge_ix(id).map(|ix| &self.edges[ix].label)
    }

    pub fn edge_mut(&mut self, id: EdgeId) -> Option<&mut E> {
        self.edge_ix(id).map(move |ix| &mut self.edges[ix].label)
    }

    /// Returns `(source, target)` of an edge.
    pub fn endpoints(&self, id: EdgeId) -> Option<(NodeId, NodeId)> {
        let ix = self.edge_ix(id)?;
        let e = &self.edges[ix];
        Some((self.node_id(e.source), self.node_id(e.target)))
    }

    /// All nodes in creation order (the root first).
    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len()).map(|ix| self.node_id(ix))
    }

    /// All edges in creation order.
    pub fn edges(&self) -> impl Iterator<Item = EdgeId> + '_ {
        (0..self.edges.len()).map(|ix| self.edge_id(ix))
    }

    pub fn for_each_node_mut<F>(&mut self, mut f: F)
    where
        F: FnMut(NodeId, &mut N),
    {
        let id = self.id;
        for (ix, n) in self.nodes.iter_mut().enumerate() {
            f(NodeId::new(id, ix), &mut n.label);
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        let ix = self.node_ix(id)?;
        self.nodes[ix].parent.map(|p| self.node_id(p))
    }

    /// Children of `id` in insertion order. Unknown nodes have no children.
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        let Some(ix) = self.node_ix(id) else {
            return Vec::new();
        };
        self.nodes[ix]
            .children
            .iter()
            .map(|&c| self.node_id(c))
            .collect()
    }

    pub fn child_count(&self, id: NodeId) -> usize {
        self.node_ix(id)
            .map(|ix| self.nodes[ix].children.len())
            .unwrap_or(0)
    }

    pub fn has_children(&self, id: NodeId) -> bool {
        self.child_count(id) > 0
    }

    pub fn out_edges(&self, id: NodeId) -> Vec<EdgeId> {
        let Some(ix) = self.node_ix(id) else {
            return Vec::new();
        };
        self.nodes[ix]
            .out_edges
            .iter()
            .map(|&e| self.edge_id(e))
            .collect()
    }

    pub fn in_edges(&self, id: NodeId) -> Vec<EdgeId> {
        let Some(ix) = self.node_ix(id) else {
            return Vec::new();
        };
        self.nodes[ix]
            .in_edges
            .iter()
            .map(|&e| self.edge_id(e))
            .collect()
    }

    /// Targets of outgoing edges, one entry per edge (parallel edges repeat).
    pub fn successors(&self, id: NodeId) -> Vec<NodeId> {
        let Some(ix) = self.node_ix(id) else {
            return Vec::new();
        };
        self.nodes[ix]
            .out_edges
            .iter()
            .map(|&e| self.node_id(self.edges[e].target))
            .collect()
    }

    /// Sources of incoming edges, one entry per edge (parallel edges repeat).
    pub fn predecessors(&self, id: NodeId) -> Vec<NodeId> {
        let Some(ix) = self.node_ix(id) else {
            return Vec::new();
        };
        self.nodes[ix]
            .in_edges
            .iter()
            .map(|&e| self.node_id(self.edges[e].source))
            .collect()
    }

    /// Number of containment links between `id` and the root (the root has depth 0).
    pub fn depth(&self, id: NodeId) -> Option<usize> {
        let mut ix = self.node_ix(id)?;
        let mut depth = 0;
        while let Some(p) = self.nodes[ix].parent {
            ix = p;
            depth += 1;
        }
        Some(depth)
    }

    /// Whether `ancestor` is a strict ancestor of `node` in the containment tree.
    pub fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let (Some(a), Some(mut ix)) = (self.node_ix(ancestor), self.node_ix(node)) else {
            return false;
        };
        while let Some(p) = self.nodes[ix].parent {
            if p == a {
                return true;
            }
            ix = p;
        }
        false
    }
}
