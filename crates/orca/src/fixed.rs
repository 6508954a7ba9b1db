//! The `orca.fixed` algorithm: children keep their positions, containers are sized to fit.

use crate::engine::LayoutScope;
use crate::error::AlgorithmError;
use crate::model::LayoutGraph;
use crate::options::FIXED_ALGORITHM_ID;
use crate::progress::ProgressMonitor;
use crate::registry::{LayoutAlgorithmData, LayoutMetaDataProvider, LayoutProvider};
use std::sync::Arc;
use tracing::trace;

#[derive(Debug, Clone, Copy, Default)]
pub struct FixedLayoutProvider;

impl LayoutProvider for FixedLayoutProvider {
    fn layout(
        &self,
        graph: &mut LayoutGraph,
        scope: &LayoutScope,
        monitor: &mut dyn ProgressMonitor,
    ) -> Result<(), AlgorithmError> {
        monitor.begin("Fixed layout", scope.containers.len() as f64);
        for (container, config) in scope.configs() {
            if monitor.is_canceled() {
                monitor.done();
                return Err(AlgorithmError::Canceled);
            }
            let mut right: f64 = 0.0;
            let mut bottom: f64 = 0.0;
            for child in graph.children(container) {
                if let Some(label) = graph.node(child) {
                    right = right.max(label.x + label.width);
                    bottom = bottom.max(label.y + label.height);
                }
            }
            if let Some(label) = graph.node_mut(container) {
                label.width = right + config.padding;
                label.height = bottom + config.padding;
                trace!(%container, width = label.width, height = label.height, "fixed container size");
            }
            monitor.worked(1.0);
        }
        monitor.done();
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FixedMetaDataProvider;

impl LayoutMetaDataProvider for FixedMetaDataProvider {
    fn algorithms(&self) -> Vec<LayoutAlgorithmData> {
        vec![LayoutAlgorithmData {
            id: FIXED_ALGORITHM_ID.to_string(),
            name: "Fixed".to_string(),
            description: "Keeps the current child positions and sizes containers to fit them."
                .to_string(),
            provider: Arc::new(FixedLayoutProvider),
        }]
    }
}
