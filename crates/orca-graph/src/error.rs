use crate::graph::NodeId;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    #[error("node {parent} is not part of this graph and cannot be used as a parent")]
    InvalidParent { parent: NodeId },

    #[error("node {node} is not part of this graph")]
    UnknownNode { node: NodeId },
}

pub type Result<T> = std::result::Result<T, GraphError>;
