#![forbid(unsafe_code)]

//! Hierarchical layered graph layout.
//!
//! Build a [`LayoutGraph`], set options with [`set_property`], then run the
//! [`RecursiveGraphLayoutEngine`] (or the [`layout`] shortcut). Positions and container
//! sizes are written onto the node labels and returned as a [`LayoutResult`].

pub use orca_graph as graph;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod engine;
pub mod error;
pub mod fixed;
pub mod layered;
pub mod model;
pub mod options;
pub mod progress;
pub mod registry;

pub use engine::{LayoutScope, RecursiveGraphLayoutEngine};
pub use error::{
    AlgorithmError, ConfigurationConflict, Error, FailureCause, ParseOptionError, Result,
};
pub use fixed::{FixedLayoutProvider, FixedMetaDataProvider};
pub use layered::{LayeredLayoutProvider, LayeredMetaDataProvider};
pub use model::{Bounds, EdgeLabel, LayoutEntry, LayoutGraph, LayoutResult, NodeLabel, Point, Size};
pub use options::{
    CoreOptions, CycleBreakingStrategy, Direction, HierarchyHandling, LayeredOptions, NodeConfig,
    OrderingStrategy, Property, PropertyMap, PropertyValue, get_property, set_property,
};
pub use orca_graph::{EdgeId, GraphError, NodeId};
pub use progress::{
    BasicProgressMonitor, CancelToken, NullProgressMonitor, ProgressMonitor, TaskRecord,
};
pub use registry::{AlgorithmRegistry, LayoutAlgorithmData, LayoutMetaDataProvider, LayoutProvider};

/// Lays out `graph` from its root with the global registry. The layered algorithm is
/// registered on first use.
pub fn layout(graph: &mut LayoutGraph, monitor: &mut dyn ProgressMonitor) -> Result<LayoutResult> {
    let registry = AlgorithmRegistry::global();
    registry.register_layout_meta_data_providers(&[&LayeredMetaDataProvider]);
    let root = graph.root();
    RecursiveGraphLayoutEngine::new(registry).layout(graph, root, monitor)
}
