//! Traversal helpers over the containment tree and the connectivity graph.

use super::{Graph, NodeId};

/// Containment subtree of `root` in pre-order (parents before children, siblings in
/// insertion order). Uses an explicit stack so arbitrarily deep nesting is fine.
pub fn preorder<N, E>(g: &Graph<N, E>, root: NodeId) -> Vec<NodeId> {
    let mut out: Vec<NodeId> = Vec::new();
    if !g.contains_node(root) {
        return out;
    }
    let mut stack: Vec<NodeId> = vec![root];
    while let Some(v) = stack.pop() {
        out.push(v);
        let children = g.children(v);
        stack.extend(children.into_iter().rev());
    }
    out
}

/// Containment subtree of `root` in post-order (children before parents, siblings in
/// insertion order).
pub fn postorder<N, E>(g: &Graph<N, E>, root: NodeId) -> Vec<NodeId> {
    let mut out: Vec<NodeId> = Vec::new();
    if !g.contains_node(root) {
        return out;
    }
    // (node, children already expanded)
    let mut stack: Vec<(NodeId, bool)> = vec![(root, false)];
    while let Some((v, expanded)) = stack.pop() {
        if expanded {
            out.push(v);
            continue;
        }
        stack.push((v, true));
        for c in g.children(v).into_iter().rev() {
            stack.push((c, false));
        }
    }
    out
}

/// The child of `ancestor` whose subtree contains `node`, if `ancestor` is a strict
/// ancestor of `node`.
pub fn child_towards<N, E>(g: &Graph<N, E>, ancestor: NodeId, node: NodeId) -> Option<NodeId> {
    let mut cur = node;
    loop {
        let parent = g.parent(cur)?;
        if parent == ancestor {
            return Some(cur);
        }
        cur = parent;
    }
}

/// Strongly connected components of the connectivity graph with more than one node, plus
/// single nodes with a self loop. Nodes inside a cycle are listed in creation order and
/// cycles are sorted by their first node.
pub fn find_cycles<N, E>(g: &Graph<N, E>) -> Vec<Vec<NodeId>> {
    // Tarjan, iterative: (node, next successor position).
    let n = g.node_count();
    let mut index: Vec<Option<usize>> = vec![None; n];
    let mut lowlink: Vec<usize> = vec![0; n];
    let mut on_stack: Vec<bool> = vec![false; n];
    let mut stack: Vec<usize> = Vec::new();
    let mut next_index: usize = 0;
    let mut sccs: Vec<Vec<usize>> = Vec::new();

    let ids: Vec<NodeId> = g.nodes().collect();
    let succ: Vec<Vec<usize>> = ids
        .iter()
        .map(|&v| g.successors(v).into_iter().map(|w| w.index()).collect())
        .collect();

    for start in 0..n {
        if index[start].is_some() {
            continue;
        }
        let mut work: Vec<(usize, usize)> = vec![(start, 0)];
        index[start] = Some(next_index);
        lowlink[start] = next_index;
        next_index += 1;
        stack.push(start);
        on_stack[start] = true;

        while let Some(top) = work.last_mut() {
            let v = top.0;
            if let Some(&w) = succ[v].get(top.1) {
                top.1 += 1;
                match index[w] {
                    None => {
                        index[w] = Some(next_index);
                        lowlink[w] = next_index;
                        next_index += 1;
                        stack.push(w);
                        on_stack[w] = true;
                        work.push((w, 0));
                    }
                    Some(w_idx) if on_stack[w] => {
                        lowlink[v] = lowlink[v].min(w_idx);
                    }
                    Some(_) => {}
                }
                continue;
            }

            work.pop();
            if let Some(&(parent, _)) = work.last() {
                lowlink[parent] = lowlink[parent].min(lowlink[v]);
            }
            if Some(lowlink[v]) == index[v] {
                let mut scc: Vec<usize> = Vec::new();
                while let Some(w) = stack.pop() {
                    on_stack[w] = false;
                    scc.push(w);
                    if w == v {
                        break;
                    }
                }
                sccs.push(scc);
            }
        }
    }

    let mut cycles: Vec<Vec<NodeId>> = Vec::new();
    for mut scc in sccs {
        if scc.len() == 1 && !succ[scc[0]].contains(&scc[0]) {
            continue;
        }
        scc.sort_unstable();
        cycles.push(scc.into_iter().map(|ix| ids[ix]).collect());
    }
    cycles.sort_by_key(|c| c.first().copied());
    cycles
}
