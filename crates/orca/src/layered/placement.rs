//! Coordinate assignment for one level.
//!
//! Works in abstract coordinates: `a` runs along the layer axis (layer after layer), `b`
//! across it (node after node within a layer). The layout direction maps them to x/y at
//! the end.

use super::lgraph::{LGraph, LevelSettings};
use crate::error::AlgorithmError;
use crate::model::{Bounds, LayoutGraph, Size};
use crate::options::Direction;

const MAX_BALANCE_PASSES: usize = 10;
const BALANCE_EPSILON: f64 = 0.1;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Placement {
    /// Bounds relative to the container, padding included. `None` for dummies.
    pub bounds: Vec<Option<Bounds>>,
    /// Container size, padding included.
    pub size: Size,
}

pub(crate) fn place(lg: &LGraph, layers: &[Vec<usize>], settings: &LevelSettings) -> Placement {
    let n = lg.nodes.len();
    let horizontal = settings.direction.is_horizontal();
    let ext_a = |v: usize| {
        let s = lg.nodes[v].size;
        if horizontal { s.width } else { s.height }
    };
    let ext_b = |v: usize| {
        let s = lg.nodes[v].size;
        if horizontal { s.height } else { s.width }
    };

    // Along the layer axis: each node centered in its layer's thickness.
    let mut a: Vec<f64> = vec![0.0; n];
    let mut offset = 0.0;
    for (l, layer) in layers.iter().enumerate() {
        let thickness = layer
            .iter()
            .filter(|&&v| !lg.nodes[v].is_dummy())
            .map(|&v| ext_a(v))
            .fold(0.0, f64::max);
        if l > 0 {
            offset += settings.spacing_between_layers;
        }
        for &v in layer {
            a[v] = offset + (thickness - ext_a(v)) / 2.0;
        }
        offset += thickness;
    }

    // Across: real nodes stacked in order, then pulled towards their neighbors.
    let reals: Vec<Vec<usize>> = layers
        .iter()
        .map(|layer| {
            layer
                .iter()
                .copied()
                .filter(|&v| !lg.nodes[v].is_dummy())
                .collect()
        })
        .collect();
    let mut b: Vec<f64> = vec![0.0; n];
    for layer in &reals {
        let mut cursor = 0.0;
        for &v in layer {
            b[v] = cursor;
            cursor += ext_b(v) + settings.spacing_node_node;
        }
    }

    let mut neighbors: Vec<Vec<usize>> = vec![Vec::new(); n];
    for e in &lg.edges {
        neighbors[e.source].push(e.target);
        neighbors[e.target].push(e.source);
    }
    for _ in 0..MAX_BALANCE_PASSES {
        let mut changed = false;
        for layer in &reals {
            let mut prev_end: Option<f64> = None;
            for &v in layer {
                let mut desired = b[v];
                if !neighbors[v].is_empty() {
                    let sum: f64 = neighbors[v].iter().map(|&u| b[u] + ext_b(u) / 2.0).sum();
                    desired = sum / neighbors[v].len() as f64 - ext_b(v) / 2.0;
                }
                if let Some(end) = prev_end {
                    desired = desired.max(end + settings.spacing_node_node);
                }
                if (desired - b[v]).abs() > BALANCE_EPSILON {
                    b[v] = desired;
                    changed = true;
                }
                // Order and spacing must hold even when the move was below the threshold.
                if let Some(end) = prev_end {
                    b[v] = b[v].max(end + settings.spacing_node_node);
                }
                prev_end = Some(b[v] + ext_b(v));
            }
        }
        if !changed {
            break;
        }
    }

    // Map to x/y, then shift the content to start at the padding.
    let mut raw: Vec<Option<Bounds>> = vec![None; n];
    for layer in &reals {
        for &v in layer {
            let s = lg.nodes[v].size;
            let (x, y) = match settings.direction.resolved() {
                Direction::Left => (-(a[v] + s.width), b[v]),
                Direction::Down => (b[v], a[v]),
                Direction::Up => (b[v], -(a[v] + s.height)),
                _ => (a[v], b[v]),
            };
            raw[v] = Some(Bounds::new(x, y, s.width, s.height));
        }
    }

    let boxes: Vec<&Bounds> = raw.iter().flatten().collect();
    let min_x = boxes.iter().map(|r| r.x).fold(f64::INFINITY, f64::min);
    let min_y = boxes.iter().map(|r| r.y).fold(f64::INFINITY, f64::min);
    let max_x = boxes.iter().map(|r| r.right()).fold(f64::NEG_INFINITY, f64::max);
    let max_y = boxes.iter().map(|r| r.bottom()).fold(f64::NEG_INFINITY, f64::max);
    let (content_w, content_h) = if boxes.is_empty() {
        (0.0, 0.0)
    } else {
        (max_x - min_x, max_y - min_y)
    };
    let p = settings.padding;
    let bounds = raw
        .into_iter()
        .map(|r| r.map(|r| r.translate(p - min_x, p - min_y)))
        .collect();

    Placement {
        bounds,
        size: Size::new(content_w + 2.0 * p, content_h + 2.0 * p),
    }
}

/// Fails if two sibling boxes overlap.
pub(crate) fn verify(lg: &LGraph, placement: &Placement) -> Result<(), AlgorithmError> {
    let boxes: Vec<(usize, &Bounds)> = placement
        .bounds
        .iter()
        .enumerate()
        .filter_map(|(v, b)| b.as_ref().map(|b| (v, b)))
        .collect();
    for (i, (u, bu)) in boxes.iter().enumerate() {
        for (v, bv) in &boxes[i + 1..] {
            if bu.overlaps(bv) {
                let name = |x: usize| {
                    lg.nodes[x]
                        .origin
                        .map_or_else(|| format!("dummy {x}"), |id| id.to_string())
                };
                return Err(AlgorithmError::InvariantViolation(format!(
                    "children {} and {} of {} overlap",
                    name(*u),
                    name(*v),
                    lg.container
                )));
            }
        }
    }
    Ok(())
}

/// Writes child positions and the container size into the graph.
pub(crate) fn apply(graph: &mut LayoutGraph, lg: &LGraph, placement: &Placement) {
    for (node, bounds) in lg.nodes.iter().zip(&placement.bounds) {
        let (Some(id), Some(bounds)) = (node.origin, bounds) else {
            continue;
        };
        if let Some(label) = graph.node_mut(id) {
            label.x = bounds.x;
            label.y = bounds.y;
        }
    }
    if let Some(label) = graph.node_mut(lg.container) {
        label.width = placement.size.width;
        label.height = placement.size.height;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layered::lgraph::{LEdge, LNode};
    use crate::model::Point;
    use crate::options::{CycleBreakingStrategy, OrderingStrategy};

    fn settings(direction: Direction) -> LevelSettings {
        LevelSettings {
            direction,
            cycle_breaking: CycleBreakingStrategy::Greedy,
            ordering: OrderingStrategy::None,
            thoroughness: 7,
            padding: 12.0,
            spacing_node_node: 20.0,
            spacing_between_layers: 20.0,
        }
    }

    fn chain() -> LGraph {
        LGraph {
            container: orca_graph::Graph::<(), ()>::new().root(),
            nodes: vec![
                LNode {
                    origin: None,
                    model_order: 0,
                    size: Size::new(40.0, 20.0),
                    position: Point::default(),
                    layer: 0,
                },
                LNode {
                    origin: None,
                    model_order: 1,
                    size: Size::new(30.0, 10.0),
                    position: Point::default(),
                    layer: 1,
                },
            ],
            edges: vec![LEdge {
                source: 0,
                target: 1,
                weight: 1.0,
                model_order: 0,
                reversed: false,
            }],
            real_count: 2,
        }
    }

    // `origin: None` marks dummies, so give the test nodes a real origin.
    fn with_origins(mut lg: LGraph) -> LGraph {
        let mut g = crate::model::LayoutGraph::new();
        for node in &mut lg.nodes {
            node.origin = g.create_node(g.root()).ok();
        }
        lg
    }

    #[test]
    fn right_direction_lays_layers_along_x() {
        let lg = with_origins(chain());
        let p = place(&lg, &[vec![0], vec![1]], &settings(Direction::Right));
        let b0 = p.bounds[0].unwrap();
        let b1 = p.bounds[1].unwrap();
        assert_eq!((b0.x, b0.y), (12.0, 12.0));
        assert_eq!(b1.x, 12.0 + 40.0 + 20.0);
        // Centers aligned across the layer axis.
        assert_eq!(b0.y + 10.0, b1.y + 5.0);
        assert_eq!(p.size, Size::new(40.0 + 20.0 + 30.0 + 24.0, 20.0 + 24.0));
        verify(&lg, &p).unwrap();
    }

    #[test]
    fn up_direction_mirrors_the_layer_axis() {
        let lg = with_origins(chain());
        let p = place(&lg, &[vec![0], vec![1]], &settings(Direction::Up));
        let b0 = p.bounds[0].unwrap();
        let b1 = p.bounds[1].unwrap();
        assert!(b1.bottom() <= b0.y, "second layer sits above the first");
        assert_eq!(b1.y, 12.0);
    }

    #[test]
    fn nodes_in_one_layer_keep_spacing() {
        let mut lg = with_origins(chain());
        lg.nodes[1].layer = 0;
        lg.edges.clear();
        let p = place(&lg, &[vec![1, 0]], &settings(Direction::Right));
        let b0 = p.bounds[0].unwrap();
        let b1 = p.bounds[1].unwrap();
        assert_eq!(b0.y, b1.bottom() + 20.0);
        verify(&lg, &p).unwrap();
    }
}
