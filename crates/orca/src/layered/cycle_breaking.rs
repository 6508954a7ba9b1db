//! Cycle breaking: marks edges as reversed so the level graph becomes acyclic.

use super::lgraph::{LGraph, MAX_EDGE_WEIGHT};
use crate::options::{CycleBreakingStrategy, Direction};
use rustc_hash::{FxHashMap, FxHashSet};
use std::cmp::Ordering;
use std::collections::{BTreeMap, VecDeque};

/// Sets `reversed` on a feedback arc set of `lg` and returns the number of reversed edges.
pub(crate) fn break_cycles(
    lg: &mut LGraph,
    strategy: CycleBreakingStrategy,
    direction: Direction,
) -> usize {
    let reversed = match strategy {
        CycleBreakingStrategy::Greedy => greedy(lg),
        CycleBreakingStrategy::DepthFirst => depth_first(lg),
        CycleBreakingStrategy::ModelOrder => model_order(lg),
        CycleBreakingStrategy::Interactive => interactive(lg, direction),
    };
    let mut count = 0;
    for (edge, rev) in lg.edges.iter_mut().zip(reversed) {
        edge.reversed = rev;
        count += usize::from(rev);
    }
    count
}

fn model_order(lg: &LGraph) -> Vec<bool> {
    lg.edges
        .iter()
        .map(|e| lg.nodes[e.source].model_order > lg.nodes[e.target].model_order)
        .collect()
}

fn interactive(lg: &LGraph, direction: Direction) -> Vec<bool> {
    let key = |v: usize| -> f64 {
        let n = &lg.nodes[v];
        let cx = n.position.x + n.size.width / 2.0;
        let cy = n.position.y + n.size.height / 2.0;
        match direction.resolved() {
            Direction::Left => -cx,
            Direction::Down => cy,
            Direction::Up => -cy,
            _ => cx,
        }
    };
    lg.edges
        .iter()
        .map(|e| {
            let ord = key(e.source)
                .total_cmp(&key(e.target))
                .then_with(|| lg.nodes[e.source].model_order.cmp(&lg.nodes[e.target].model_order));
            ord == Ordering::Greater
        })
        .collect()
}

/// Reverses the back edges of a depth-first search started from nodes in model order.
fn depth_first(lg: &LGraph) -> Vec<bool> {
    let n = lg.nodes.len();
    let mut reversed = vec![false; lg.edges.len()];
    let mut out: Vec<Vec<usize>> = vec![Vec::new(); n];
    for (i, e) in lg.edges.iter().enumerate() {
        out[e.source].push(i);
    }

    // 0 = unvisited, 1 = on the DFS stack, 2 = finished
    let mut state: Vec<u8> = vec![0; n];
    for start in lg.model_ordered() {
        if state[start] != 0 {
            continue;
        }
        state[start] = 1;
        let mut stack: Vec<(usize, usize)> = vec![(start, 0)];
        while let Some(top) = stack.last_mut() {
            let v = top.0;
            if let Some(&e) = out[v].get(top.1) {
                top.1 += 1;
                let w = lg.edges[e].target;
                match state[w] {
                    0 => {
                        state[w] = 1;
                        stack.push((w, 0));
                    }
                    1 => reversed[e] = true,
                    _ => {}
                }
                continue;
            }
            state[v] = 2;
            stack.pop();
        }
    }
    reversed
}

/// Eades-Lin-Smyth greedy feedback arc set over the aggregated (multi-edge summed) graph.
fn greedy(lg: &LGraph) -> Vec<bool> {
    let n = lg.nodes.len();
    let mut reversed = vec![false; lg.edges.len()];
    if n <= 1 {
        return reversed;
    }

    // Aggregate parallel edges, keeping the order of first occurrence.
    let mut pair_ix: FxHashMap<(usize, usize), usize> = FxHashMap::default();
    let mut pairs: Vec<(usize, usize, i64)> = Vec::new();
    let mut in_w: Vec<i64> = vec![0; n];
    let mut out_w: Vec<i64> = vec![0; n];
    for e in &lg.edges {
        let w = e.weight.round().clamp(1.0, MAX_EDGE_WEIGHT) as i64;
        match pair_ix.get(&(e.source, e.target)) {
            Some(&ix) => pairs[ix].2 = pairs[ix].2.saturating_add(w),
            None => {
                pair_ix.insert((e.source, e.target), pairs.len());
                pairs.push((e.source, e.target, w));
            }
        }
        out_w[e.source] = out_w[e.source].saturating_add(w);
        in_w[e.target] = in_w[e.target].saturating_add(w);
    }

    let mut in_adj: Vec<Vec<(usize, i64)>> = vec![Vec::new(); n];
    let mut out_adj: Vec<Vec<(usize, i64)>> = vec![Vec::new(); n];
    for &(u, v, w) in &pairs {
        out_adj[u].push((v, w));
        in_adj[v].push((u, w));
    }

    let mut work = Buckets {
        sinks: VecDeque::new(),
        sources: VecDeque::new(),
        by_delta: BTreeMap::new(),
        slot: vec![None; n],
        alive: vec![true; n],
        in_w,
        out_w,
    };
    for v in lg.model_ordered() {
        work.assign(v);
    }

    let mut fas: FxHashSet<(usize, usize)> = FxHashSet::default();
    let mut remaining = n;
    while remaining > 0 {
        // Sinks first, then sources.
        while let Some(v) = work.sinks.pop_back() {
            work.remove(v, &in_adj, &out_adj);
            remaining -= 1;
        }
        while let Some(v) = work.sources.pop_back() {
            work.remove(v, &in_adj, &out_adj);
            remaining -= 1;
        }
        if remaining == 0 {
            break;
        }

        let Some(v) = work
            .pop_max_delta()
            .or_else(|| (0..n).find(|&v| work.alive[v]))
        else {
            break;
        };
        for &(u, _) in &in_adj[v] {
            if work.alive[u] {
                fas.insert((u, v));
            }
        }
        work.remove(v, &in_adj, &out_adj);
        remaining -= 1;
    }

    for (i, e) in lg.edges.iter().enumerate() {
        if fas.contains(&(e.source, e.target)) {
            reversed[i] = true;
        }
    }
    reversed
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Sink,
    Source,
    Delta(i64),
}

/// Nodes grouped by out-weight minus in-weight. Only deltas that occur get a bucket.
struct Buckets {
    sinks: VecDeque<usize>,
    sources: VecDeque<usize>,
    by_delta: BTreeMap<i64, VecDeque<usize>>,
    slot: Vec<Option<Slot>>,
    alive: Vec<bool>,
    in_w: Vec<i64>,
    out_w: Vec<i64>,
}

impl Buckets {
    fn bucket(&mut self, slot: Slot) -> &mut VecDeque<usize> {
        match slot {
            Slot::Sink => &mut self.sinks,
            Slot::Source => &mut self.sources,
            Slot::Delta(d) => self.by_delta.entry(d).or_default(),
        }
    }

    fn detach(&mut self, v: usize) {
        let Some(prev) = self.slot[v].take() else {
            return;
        };
        let bucket = self.bucket(prev);
        if let Some(pos) = bucket.iter().position(|&x| x == v) {
            bucket.remove(pos);
        }
        if let Slot::Delta(d) = prev {
            if self.by_delta.get(&d).is_some_and(VecDeque::is_empty) {
                self.by_delta.remove(&d);
            }
        }
    }

    fn assign(&mut self, v: usize) {
        self.detach(v);
        let slot = if self.out_w[v] == 0 {
            Slot::Sink
        } else if self.in_w[v] == 0 {
            Slot::Source
        } else {
            Slot::Delta(self.out_w[v].saturating_sub(self.in_w[v]))
        };
        self.bucket(slot).push_front(v);
        self.slot[v] = Some(slot);
    }

    fn pop_max_delta(&mut self) -> Option<usize> {
        let mut entry = self.by_delta.last_entry()?;
        let v = entry.get_mut().pop_back();
        if entry.get().is_empty() {
            entry.remove();
        }
        if let Some(v) = v {
            self.slot[v] = None;
        }
        v
    }

    fn remove(&mut self, v: usize, in_adj: &[Vec<(usize, i64)>], out_adj: &[Vec<(usize, i64)>]) {
        if !self.alive[v] {
            return;
        }
        self.alive[v] = false;
        self.detach(v);
        for &(u, w) in &in_adj[v] {
            if self.alive[u] {
                self.out_w[u] -= w;
                self.assign(u);
            }
        }
        for &(t, w) in &out_adj[v] {
            if self.alive[t] {
                self.in_w[t] -= w;
                self.assign(t);
            }
        }
    }
}
