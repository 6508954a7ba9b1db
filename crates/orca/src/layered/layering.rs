//! Longest-path layering and long-edge normalization.

use super::lgraph::{LGraph, LNode};
use crate::error::AlgorithmError;
use crate::model::{Point, Size};
use std::collections::VecDeque;

/// A unit-span piece of an edge between two adjacent layers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Segment {
    pub upper: usize,
    pub lower: usize,
    pub weight: f64,
    /// Index of the level edge this segment belongs to.
    pub edge: usize,
}

/// Assigns `layer` to every node and returns the number of layers.
///
/// Nodes are placed one layer below their lowest predecessor; sources are then pulled
/// down next to their successors. Every edge must end up pointing from a lower to a
/// strictly higher layer.
pub(crate) fn assign_layers(lg: &mut LGraph) -> Result<usize, AlgorithmError> {
    let n = lg.nodes.len();
    if n == 0 {
        return Ok(0);
    }
    let out = lg.out_edges();
    let mut indeg: Vec<usize> = vec![0; n];
    for e in &lg.edges {
        indeg[e.head()] += 1;
    }

    let mut layer: Vec<usize> = vec![0; n];
    let mut queue: VecDeque<usize> = lg
        .model_ordered()
        .into_iter()
        .filter(|&v| indeg[v] == 0)
        .collect();
    let mut topo: Vec<usize> = Vec::with_capacity(n);
    while let Some(v) = queue.pop_front() {
        topo.push(v);
        for &e in &out[v] {
            let w = lg.edges[e].head();
            layer[w] = layer[w].max(layer[v] + 1);
            indeg[w] -= 1;
            if indeg[w] == 0 {
                queue.push_back(w);
            }
        }
    }
    if topo.len() != n {
        return Err(AlgorithmError::InvariantViolation(format!(
            "level graph of {} still has a cycle after cycle breaking ({} of {} nodes layered)",
            lg.container,
            topo.len(),
            n
        )));
    }

    // Pull sources towards their successors so they do not stretch long edges.
    let mut has_pred = vec![false; n];
    for e in &lg.edges {
        has_pred[e.head()] = true;
    }
    for &v in topo.iter().rev() {
        if has_pred[v] || out[v].is_empty() {
            continue;
        }
        if let Some(min_succ) = out[v].iter().map(|&e| layer[lg.edges[e].head()]).min() {
            layer[v] = layer[v].max(min_succ.saturating_sub(1));
        }
    }

    for (node, l) in lg.nodes.iter_mut().zip(&layer) {
        node.layer = *l;
    }
    check_layering(lg)?;
    Ok(layer.iter().copied().max().map_or(0, |m| m + 1))
}

pub(crate) fn check_layering(lg: &LGraph) -> Result<(), AlgorithmError> {
    for e in &lg.edges {
        let (t, h) = (e.tail(), e.head());
        if lg.nodes[t].layer >= lg.nodes[h].layer {
            return Err(AlgorithmError::InvariantViolation(format!(
                "edge #{} of {} does not point to a higher layer ({} -> {})",
                e.model_order, lg.container, lg.nodes[t].layer, lg.nodes[h].layer
            )));
        }
    }
    Ok(())
}

/// Splits edges spanning several layers with zero-size dummy nodes and returns all unit
/// segments, in edge order.
pub(crate) fn normalize(lg: &mut LGraph) -> Vec<Segment> {
    let mut segments: Vec<Segment> = Vec::with_capacity(lg.edges.len());
    for ix in 0..lg.edges.len() {
        let (tail, head, weight, model_order) = {
            let e = &lg.edges[ix];
            (e.tail(), e.head(), e.weight, e.model_order)
        };
        let mut upper = tail;
        for layer in lg.nodes[tail].layer + 1..lg.nodes[head].layer {
            let dummy = lg.nodes.len();
            lg.nodes.push(LNode {
                origin: None,
                model_order,
                size: Size::default(),
                position: Point::default(),
                layer,
            });
            segments.push(Segment {
                upper,
                lower: dummy,
                weight,
                edge: ix,
            });
            upper = dummy;
        }
        segments.push(Segment {
            upper,
            lower: head,
            weight,
            edge: ix,
        });
    }
    segments
}
