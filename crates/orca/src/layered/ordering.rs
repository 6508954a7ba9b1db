//! Node ordering within layers (crossing minimization).
//!
//! Alternating downward and upward barycenter sweeps; the ordering with the fewest
//! weighted crossings seen so far wins. The model-order strategies constrain how a layer
//! may be permuted.

use super::layering::Segment;
use super::lgraph::LGraph;
use crate::options::OrderingStrategy;
use std::cmp::Ordering;
use tracing::trace;

const MAX_SWEEPS: usize = 64;

struct Adjacency {
    /// `(upper node, weight)` per node.
    up: Vec<Vec<(usize, f64)>>,
    /// `(lower node, weight)` per node.
    down: Vec<Vec<(usize, f64)>>,
    /// Model order of the originating edge, for dummies.
    edge_order: Vec<usize>,
}

impl Adjacency {
    fn new(lg: &LGraph, segments: &[Segment]) -> Self {
        let n = lg.nodes.len();
        let mut up: Vec<Vec<(usize, f64)>> = vec![Vec::new(); n];
        let mut down: Vec<Vec<(usize, f64)>> = vec![Vec::new(); n];
        for s in segments {
            down[s.upper].push((s.lower, s.weight));
            up[s.lower].push((s.upper, s.weight));
        }
        let edge_order = lg.nodes.iter().map(|n| n.model_order).collect();
        Self {
            up,
            down,
            edge_order,
        }
    }
}

/// Returns the node indices of each layer, top to bottom, in their final order.
pub(crate) fn order_layers(
    lg: &LGraph,
    segments: &[Segment],
    layer_count: usize,
    strategy: OrderingStrategy,
    thoroughness: u32,
) -> Vec<Vec<usize>> {
    let adj = Adjacency::new(lg, segments);
    let mut current = match strategy {
        OrderingStrategy::PreferNodes | OrderingStrategy::NodesAndEdges => {
            model_order_init(lg, layer_count)
        }
        OrderingStrategy::None | OrderingStrategy::PreferEdges => dfs_init(lg, &adj, layer_count),
    };
    if layer_count < 2 {
        return current;
    }

    let mut best = current.clone();
    let mut best_cc = cross_count(&current, &adj, lg.nodes.len());
    let mut stale: u32 = 0;
    for sweep in 0..MAX_SWEEPS {
        if best_cc <= 0.0 || stale >= thoroughness {
            break;
        }
        let downward = sweep % 2 == 0;
        sweep_layers(lg, &adj, &mut current, downward, strategy);
        let cc = cross_count(&current, &adj, lg.nodes.len());
        if cc < best_cc {
            best_cc = cc;
            best = current.clone();
            stale = 0;
        } else {
            stale += 1;
        }
    }
    trace!(container = %lg.container, crossings = best_cc, "ordering done");
    best
}

/// Depth-first initial order seeded by (layer, model order).
fn dfs_init(lg: &LGraph, adj: &Adjacency, layer_count: usize) -> Vec<Vec<usize>> {
    let mut layers: Vec<Vec<usize>> = vec![Vec::new(); layer_count];
    let mut visited = vec![false; lg.nodes.len()];
    let mut starts: Vec<usize> = (0..lg.nodes.len()).collect();
    starts.sort_by_key(|&v| {
        let n = &lg.nodes[v];
        (n.layer, n.is_dummy(), n.model_order, v)
    });
    for start in starts {
        if visited[start] {
            continue;
        }
        let mut stack = vec![start];
        while let Some(v) = stack.pop() {
            if visited[v] {
                continue;
            }
            visited[v] = true;
            layers[lg.nodes[v].layer].push(v);
            for &(w, _) in adj.down[v].iter().rev() {
                if !visited[w] {
                    stack.push(w);
                }
            }
        }
    }
    layers
}

/// Real nodes in model order, followed by dummies in edge order.
fn model_order_init(lg: &LGraph, layer_count: usize) -> Vec<Vec<usize>> {
    let mut layers: Vec<Vec<usize>> = vec![Vec::new(); layer_count];
    for v in lg.model_ordered() {
        layers[lg.nodes[v].layer].push(v);
    }
    layers
}

fn sweep_layers(
    lg: &LGraph,
    adj: &Adjacency,
    layers: &mut [Vec<usize>],
    downward: bool,
    strategy: OrderingStrategy,
) {
    let n = lg.nodes.len();
    let mut pos: Vec<usize> = vec![0; n];
    let range: Vec<usize> = if downward {
        (1..layers.len()).collect()
    } else {
        (0..layers.len() - 1).rev().collect()
    };
    for l in range {
        let fixed = if downward { l - 1 } else { l + 1 };
        for (i, &v) in layers[fixed].iter().enumerate() {
            pos[v] = i;
        }
        let neighbors = if downward { &adj.up } else { &adj.down };
        let entries: Vec<Entry> = layers[l]
            .iter()
            .enumerate()
            .map(|(i, &v)| Entry {
                v,
                index: i,
                barycenter: barycenter(&neighbors[v], &pos),
            })
            .collect();
        layers[l] = reorder(lg, adj, entries, strategy);
    }
}

fn barycenter(neighbors: &[(usize, f64)], pos: &[usize]) -> Option<f64> {
    let mut sum = 0.0;
    let mut weight = 0.0;
    for &(u, w) in neighbors {
        sum += w * pos[u] as f64;
        weight += w;
    }
    (weight > 0.0).then(|| sum / weight)
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    v: usize,
    index: usize,
    barycenter: Option<f64>,
}

fn reorder(
    lg: &LGraph,
    adj: &Adjacency,
    entries: Vec<Entry>,
    strategy: OrderingStrategy,
) -> Vec<usize> {
    match strategy {
        OrderingStrategy::None => sort_sortable(entries, |a, b| a.index.cmp(&b.index)),
        OrderingStrategy::PreferEdges => sort_sortable(entries, |a, b| {
            let ka = (lg.nodes[a.v].is_dummy(), lg.nodes[a.v].model_order);
            let kb = (lg.nodes[b.v].is_dummy(), lg.nodes[b.v].model_order);
            ka.cmp(&kb).then(a.index.cmp(&b.index))
        }),
        OrderingStrategy::PreferNodes => {
            let (mut reals, mut dummies): (Vec<Entry>, Vec<Entry>) =
                entries.into_iter().partition(|e| !lg.nodes[e.v].is_dummy());
            reals.sort_by_key(|e| (lg.nodes[e.v].model_order, e.index));
            dummies.sort_by(|a, b| {
                cmp_f64(key_or_index(a), key_or_index(b)).then(a.index.cmp(&b.index))
            });
            merge(reals, dummies)
        }
        OrderingStrategy::NodesAndEdges => {
            let (mut reals, mut dummies): (Vec<Entry>, Vec<Entry>) =
                entries.into_iter().partition(|e| !lg.nodes[e.v].is_dummy());
            reals.sort_by_key(|e| (lg.nodes[e.v].model_order, e.index));
            dummies.sort_by_key(|e| (adj.edge_order[e.v], e.index));
            merge(reals, dummies)
        }
    }
}

/// Sorts entries with a barycenter; entries without one keep their slot.
fn sort_sortable(entries: Vec<Entry>, tie: impl Fn(&Entry, &Entry) -> Ordering) -> Vec<usize> {
    let mut out: Vec<Option<usize>> = vec![None; entries.len()];
    let mut sortable: Vec<Entry> = Vec::new();
    for e in &entries {
        match e.barycenter {
            Some(_) => sortable.push(*e),
            None => out[e.index] = Some(e.v),
        }
    }
    sortable.sort_by(|a, b| {
        cmp_f64(a.barycenter.unwrap_or(0.0), b.barycenter.unwrap_or(0.0)).then_with(|| tie(a, b))
    });
    let mut it = sortable.into_iter();
    out.into_iter()
        .filter_map(|slot| slot.or_else(|| it.next().map(|e| e.v)))
        .collect()
}

/// Interleaves two fixed sequences by their (made monotone) barycenters. On ties the
/// entry of `first` goes first.
fn merge(first: Vec<Entry>, second: Vec<Entry>) -> Vec<usize> {
    let a = monotone_keys(&first);
    let b = monotone_keys(&second);
    let mut out = Vec::with_capacity(first.len() + second.len());
    let (mut i, mut j) = (0, 0);
    while i < first.len() || j < second.len() {
        let take_second = j < second.len() && (i == first.len() || b[j] < a[i]);
        if take_second {
            out.push(second[j].v);
            j += 1;
        } else {
            out.push(first[i].v);
            i += 1;
        }
    }
    out
}

/// Running maximum of the barycenters; entries without one take the previous key.
fn monotone_keys(entries: &[Entry]) -> Vec<f64> {
    let mut key = f64::NEG_INFINITY;
    entries
        .iter()
        .map(|e| {
            if let Some(bc) = e.barycenter {
                key = key.max(bc);
            }
            key
        })
        .collect()
}

fn key_or_index(e: &Entry) -> f64 {
    e.barycenter.unwrap_or(e.index as f64)
}

fn cmp_f64(a: f64, b: f64) -> Ordering {
    a.total_cmp(&b)
}

/// Weighted crossings between all pairs of adjacent layers (accumulator tree).
fn cross_count(layers: &[Vec<usize>], adj: &Adjacency, node_count: usize) -> f64 {
    let mut south_pos: Vec<usize> = vec![0; node_count];
    let mut cc = 0.0;
    for pair in layers.windows(2) {
        let (north, south) = (&pair[0], &pair[1]);
        if south.is_empty() {
            continue;
        }
        for (i, &v) in south.iter().enumerate() {
            south_pos[v] = i;
        }

        let mut entries: Vec<(usize, f64)> = Vec::new();
        for &v in north {
            let mut row: Vec<(usize, f64)> =
                adj.down[v].iter().map(|&(w, wt)| (south_pos[w], wt)).collect();
            row.sort_by_key(|&(p, _)| p);
            entries.extend(row);
        }

        let mut first_index = 1;
        while first_index < south.len() {
            first_index <<= 1;
        }
        let tree_size = 2 * first_index - 1;
        first_index -= 1;
        let mut tree: Vec<f64> = vec![0.0; tree_size];
        for (p, weight) in entries {
            let mut index = p + first_index;
            tree[index] += weight;
            let mut weight_sum = 0.0;
            while index > 0 {
                if index % 2 == 1 {
                    weight_sum += tree[index + 1];
                }
                index = (index - 1) >> 1;
                tree[index] += weight;
            }
            cc += weight * weight_sum;
        }
    }
    cc
}
