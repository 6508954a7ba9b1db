//! Flat working graph for one container level.

use crate::model::{LayoutGraph, Point, Size};
use crate::options::{CycleBreakingStrategy, Direction, NodeConfig, OrderingStrategy};
use orca_graph::{NodeId, alg};
use rustc_hash::FxHashMap;

/// Edge weights are capped here on import; non-positive or non-finite weights become 1.
pub(crate) const MAX_EDGE_WEIGHT: f64 = 1e9;

#[derive(Debug, Clone)]
pub(crate) struct LNode {
    /// `None` for dummy nodes inserted by normalization.
    pub origin: Option<NodeId>,
    /// Node index for real nodes; index of the split edge for dummies.
    pub model_order: usize,
    pub size: Size,
    /// Position before this layout run.
    pub position: Point,
    pub layer: usize,
}

impl LNode {
    pub fn is_dummy(&self) -> bool {
        self.origin.is_none()
    }
}

#[derive(Debug, Clone)]
pub(crate) struct LEdge {
    pub source: usize,
    pub target: usize,
    pub weight: f64,
    pub model_order: usize,
    pub reversed: bool,
}

impl LEdge {
    /// Source after cycle breaking.
    pub fn tail(&self) -> usize {
        if self.reversed { self.target } else { self.source }
    }

    /// Target after cycle breaking.
    pub fn head(&self) -> usize {
        if self.reversed { self.source } else { self.target }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct LGraph {
    pub container: NodeId,
    pub nodes: Vec<LNode>,
    pub edges: Vec<LEdge>,
    /// Number of real nodes; dummies are appended after them.
    pub real_count: usize,
}

impl LGraph {
    /// Collects the direct children of `container` and the edges between them.
    ///
    /// With `include_children`, an edge between two descendants counts for this level when
    /// its endpoints fall into different child subtrees; it is projected onto those
    /// children.
    pub fn import(graph: &LayoutGraph, container: NodeId, include_children: bool) -> Self {
        let children = graph.children(container);
        let mut index: FxHashMap<NodeId, usize> = FxHashMap::default();
        let mut nodes: Vec<LNode> = Vec::with_capacity(children.len());
        for (i, &child) in children.iter().enumerate() {
            index.insert(child, i);
            let (size, position) = graph
                .node(child)
                .map(|l| (l.size(), l.position()))
                .unwrap_or_default();
            nodes.push(LNode {
                origin: Some(child),
                model_order: child.index(),
                size,
                position,
                layer: 0,
            });
        }

        let project = |n: NodeId| -> Option<usize> {
            if graph.parent(n) == Some(container) {
                return index.get(&n).copied();
            }
            if !include_children {
                return None;
            }
            let child = alg::child_towards(graph, container, n)?;
            index.get(&child).copied()
        };

        let mut edges: Vec<LEdge> = Vec::new();
        for e in graph.edges() {
            let Some((s, t)) = graph.endpoints(e) else {
                continue;
            };
            let (Some(source), Some(target)) = (project(s), project(t)) else {
                continue;
            };
            if source == target {
                continue;
            }
            let weight = graph
                .edge(e)
                .map(|l| l.weight)
                .filter(|w| w.is_finite() && *w > 0.0)
                .map_or(1.0, |w| w.min(MAX_EDGE_WEIGHT));
            edges.push(LEdge {
                source,
                target,
                weight,
                model_order: e.index(),
                reversed: false,
            });
        }

        let real_count = nodes.len();
        Self {
            container,
            nodes,
            edges,
            real_count,
        }
    }

    /// Node indices sorted by model order.
    pub fn model_ordered(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.nodes.len()).collect();
        order.sort_by_key(|&v| (self.nodes[v].is_dummy(), self.nodes[v].model_order, v));
        order
    }

    /// Outgoing edge indices per node, following cycle-breaking reversals.
    pub fn out_edges(&self) -> Vec<Vec<usize>> {
        let mut out: Vec<Vec<usize>> = vec![Vec::new(); self.nodes.len()];
        for (i, e) in self.edges.iter().enumerate() {
            out[e.tail()].push(i);
        }
        out
    }
}

#[cfg(test)]
impl LGraph {
    /// `n` real 10 x 10 nodes in layer 0 plus unit-weight edges, both in model order.
    pub(crate) fn fixture(n: usize, edges: &[(usize, usize)]) -> Self {
        let mut g = LayoutGraph::new();
        let container = g.root();
        let nodes = (0..n)
            .map(|i| LNode {
                origin: g.create_node(container).ok(),
                model_order: i,
                size: Size::new(10.0, 10.0),
                position: Point::default(),
                layer: 0,
            })
            .collect();
        let edges = edges
            .iter()
            .enumerate()
            .map(|(i, &(source, target))| LEdge {
                source,
                target,
                weight: 1.0,
                model_order: i,
                reversed: false,
            })
            .collect();
        Self {
            container,
            nodes,
            edges,
            real_count: n,
        }
    }
}

/// Effective settings for one level.
///
/// Ordering-related settings come from the scope root so every level of an
/// `INCLUDE_CHILDREN` scope follows the same strategies; spacing and padding are per
/// container.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct LevelSettings {
    pub direction: Direction,
    pub cycle_breaking: CycleBreakingStrategy,
    pub ordering: OrderingStrategy,
    pub thoroughness: u32,
    pub padding: f64,
    pub spacing_node_node: f64,
    pub spacing_between_layers: f64,
}

impl LevelSettings {
    pub fn new(scope_root: &NodeConfig, own: &NodeConfig) -> Self {
        Self {
            direction: scope_root.direction.resolved(),
            cycle_breaking: scope_root.cycle_breaking,
            ordering: scope_root.ordering,
            thoroughness: scope_root.thoroughness,
            padding: own.padding,
            spacing_node_node: own.spacing_node_node,
            spacing_between_layers: own.spacing_between_layers,
        }
    }
}
