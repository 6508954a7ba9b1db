//! Internal storage entries for [`Graph`](super::Graph).

#[derive(Debug, Clone)]
pub(in crate::graph) struct NodeEntry<N> {
    pub(in crate::graph) label: N,
    pub(in crate::graph) parent: Option<usize>,
    pub(in crate::graph) children: Vec<usize>,
    pub(in crate::graph) out_edges: Vec<usize>,
    pub(in crate::graph) in_edges: Vec<usize>,
}

impl<N> NodeEntry<N> {
    pub(in crate::graph) fn new(label: N, parent: Option<usize>) -> Self {
        Self {
            label,
            parent,
            children: Vec::new(),
            out_edges: Vec::new(),
            in_edges: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub(in crate::graph) struct EdgeEntry<E> {
    pub(in crate::graph) source: usize,
    pub(in crate::graph) target: usize,
    pub(in crate::graph) label: E,
}
