use crate::error::Result;
use crate::options::{OptionValue, Property, PropertyMap};
use orca_graph::{Graph, NodeId, alg};
use serde::Serialize;

pub type LayoutGraph = Graph<NodeLabel, EdgeLabel>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Bounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn translate(&self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy, self.width, self.height)
    }

    /// Whether the interiors of both boxes intersect. Touching edges and zero-size boxes
    /// never overlap.
    pub fn overlaps(&self, other: &Bounds) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
            && self.width > 0.0
            && self.height > 0.0
            && other.width > 0.0
            && other.height > 0.0
    }
}

/// Per-node data: intrinsic size set by the caller, position written by the layout, and
/// the node's layout options.
///
/// `x`/`y` are relative to the parent's top-left corner (the parent's padding is part of
/// the child coordinates). Containers get their `width`/`height` overwritten with the size
/// that fits their children.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeLabel {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub properties: PropertyMap,
}

impl NodeLabel {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            ..Default::default()
        }
    }

    pub fn bounds(&self) -> Bounds {
        Bounds::new(self.x, self.y, self.width, self.height)
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn set<T: OptionValue>(&mut self, key: &Property<T>, value: T) -> Result<()> {
        self.properties.set(key, value)
    }

    pub fn get<T: OptionValue>(&self, key: &Property<T>) -> T {
        self.properties.get(key)
    }

    pub fn has<T: OptionValue>(&self, key: &Property<T>) -> bool {
        self.properties.has(key)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EdgeLabel {
    pub weight: f64,
}

impl Default for EdgeLabel {
    fn default() -> Self {
        Self { weight: 1.0 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayoutEntry {
    pub node: NodeId,
    pub parent: Option<NodeId>,
    pub bounds: Bounds,
}

/// Snapshot of the positions and sizes written by one layout call.
///
/// Entries cover the laid-out subtree and are sorted by node index. The root's `parent` is
/// always `None`, even when the root is nested inside a larger graph.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayoutResult {
    root: NodeId,
    nodes: Vec<LayoutEntry>,
}

impl LayoutResult {
    pub(crate) fn capture(graph: &LayoutGraph, root: NodeId) -> Self {
        let mut nodes: Vec<LayoutEntry> = alg::preorder(graph, root)
            .into_iter()
            .filter_map(|node| {
                let label = graph.node(node)?;
                let parent = if node == root {
                    None
                } else {
                    graph.parent(node)
                };
                Some(LayoutEntry {
                    node,
                    parent,
                    bounds: label.bounds(),
                })
            })
            .collect();
        nodes.sort_by_key(|e| e.node);
        Self { root, nodes }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn entries(&self) -> &[LayoutEntry] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn entry(&self, node: NodeId) -> Option<&LayoutEntry> {
        let ix = self.nodes.binary_search_by_key(&node, |e| e.node).ok()?;
        Some(&self.nodes[ix])
    }

    /// Bounds of `node` relative to its parent.
    pub fn get(&self, node: NodeId) -> Option<Bounds> {
        self.entry(node).map(|e| e.bounds)
    }

    /// Bounds of `node` in the coordinate space of the layout root (the root itself sits at
    /// the origin).
    pub fn absolute(&self, node: NodeId) -> Option<Bounds> {
        let entry = self.entry(node)?;
        if node == self.root {
            return Some(Bounds::new(0.0, 0.0, entry.bounds.width, entry.bounds.height));
        }
        let mut bounds = entry.bounds;
        let mut parent = entry.parent;
        while let Some(p) = parent {
            if p == self.root {
                break;
            }
            let pe = self.entry(p)?;
            bounds = bounds.translate(pe.bounds.x, pe.bounds.y);
            parent = pe.parent;
        }
        Some(bounds)
    }
}
