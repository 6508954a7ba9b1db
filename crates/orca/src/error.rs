use orca_graph::{GraphError, NodeId};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error("invalid value for option `{key}`: {reason}")]
    InvalidOptionValue { key: &'static str, reason: String },

    #[error(transparent)]
    ConfigurationConflict(#[from] ConfigurationConflict),

    #[error("no layout algorithm registered for `{algorithm}` (requested by {node})")]
    UnknownAlgorithm { node: NodeId, algorithm: String },

    #[error("layout of {node} failed: {cause}")]
    LayoutFailure { node: NodeId, cause: FailureCause },

    #[error("layout canceled")]
    Canceled,
}

impl Error {
    /// Stable machine-readable name of the variant.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Graph(GraphError::InvalidParent { .. }) => "invalid_parent",
            Error::Graph(GraphError::UnknownNode { .. }) => "unknown_node",
            Error::InvalidOptionValue { .. } => "invalid_option_value",
            Error::ConfigurationConflict(_) => "configuration_conflict",
            Error::UnknownAlgorithm { .. } => "unknown_algorithm",
            Error::LayoutFailure { .. } => "layout_failure",
            Error::Canceled => "canceled",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Option combination that a layout algorithm cannot honor.
///
/// `node` is the container whose configuration is rejected; `other` is the container it
/// disagrees with, when the conflict is between two levels of one layout scope.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("configuration conflict at {node}: {message}")]
pub struct ConfigurationConflict {
    pub node: NodeId,
    pub other: Option<NodeId>,
    pub keys: Vec<&'static str>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FailureCause {
    #[error("internal invariant violated: {0}")]
    InvariantViolation(String),
    #[error("layout algorithm panicked: {0}")]
    Panicked(String),
}

/// Errors a [`LayoutProvider`](crate::LayoutProvider) may return from a layout run.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AlgorithmError {
    #[error("canceled")]
    Canceled,
    #[error("internal invariant violated: {0}")]
    InvariantViolation(String),
    /// An invariant violation attributed to the container whose level failed.
    #[error("internal invariant violated in {node}: {message}")]
    ContainerFailed { node: NodeId, message: String },
}

impl AlgorithmError {
    /// Attributes an unattributed invariant violation to `node`. Errors that already name a
    /// container keep the innermost one.
    pub fn at(self, node: NodeId) -> Self {
        match self {
            AlgorithmError::InvariantViolation(message) => {
                AlgorithmError::ContainerFailed { node, message }
            }
            other => other,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} `{value}`")]
pub struct ParseOptionError {
    pub kind: &'static str,
    pub value: String,
}
