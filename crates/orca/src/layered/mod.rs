//! The `orca.layered` algorithm.
//!
//! Every container of a scope is laid out as one level, innermost first:
//! import -> cycle breaking -> layering -> normalization -> ordering -> placement.

mod cycle_breaking;
mod layering;
mod lgraph;
mod ordering;
mod placement;

use crate::engine::LayoutScope;
use crate::error::{AlgorithmError, ConfigurationConflict};
use crate::model::LayoutGraph;
use crate::options::{
    CoreOptions, CycleBreakingStrategy, LAYERED_ALGORITHM_ID, LayeredOptions, NodeConfig,
    OrderingStrategy,
};
use crate::progress::ProgressMonitor;
use crate::registry::{LayoutAlgorithmData, LayoutMetaDataProvider, LayoutProvider};
use lgraph::{LGraph, LevelSettings};
use orca_graph::NodeId;
use std::sync::Arc;
use tracing::trace;

#[derive(Debug, Clone, Copy, Default)]
pub struct LayeredLayoutProvider;

impl LayoutProvider for LayeredLayoutProvider {
    fn layout(
        &self,
        graph: &mut LayoutGraph,
        scope: &LayoutScope,
        monitor: &mut dyn ProgressMonitor,
    ) -> Result<(), AlgorithmError> {
        let Some(root_config) = scope.root_config() else {
            return Err(AlgorithmError::InvariantViolation(format!(
                "layout scope of {} has no configuration for its root",
                scope.root
            )));
        };
        monitor.begin("Layered layout", scope.containers.len() as f64);
        let mut outcome = Ok(());
        for (container, config) in scope.configs() {
            let settings = LevelSettings::new(root_config, config);
            outcome = layout_level(graph, container, &settings, scope.include_children, monitor)
                .map_err(|e| e.at(container));
            if outcome.is_err() {
                break;
            }
            monitor.worked(1.0);
        }
        monitor.done();
        outcome
    }

    fn validate(
        &self,
        graph: &LayoutGraph,
        scope: &LayoutScope,
    ) -> Result<(), ConfigurationConflict> {
        for (container, config) in scope.configs() {
            check_interactive(container, config)?;
        }
        if !scope.include_children {
            return Ok(());
        }
        let Some(root_config) = scope.root_config() else {
            return Ok(());
        };
        for (container, config) in scope.configs() {
            if container == scope.root {
                continue;
            }
            let Some(label) = graph.node(container) else {
                continue;
            };
            // Only explicitly set values can disagree; unset ones follow the scope root.
            let mut keys: Vec<&'static str> = Vec::new();
            let strategy = &LayeredOptions::CYCLE_BREAKING_STRATEGY;
            if label.has(strategy) && config.cycle_breaking != root_config.cycle_breaking {
                keys.push(strategy.id());
            }
            let ordering = &LayeredOptions::CONSIDER_MODEL_ORDER_STRATEGY;
            if label.has(ordering) && config.ordering != root_config.ordering {
                keys.push(ordering.id());
            }
            let direction = &CoreOptions::DIRECTION;
            if label.has(direction)
                && config.direction.resolved() != root_config.direction.resolved()
            {
                keys.push(direction.id());
            }
            if !keys.is_empty() {
                return Err(ConfigurationConflict {
                    node: container,
                    other: Some(scope.root),
                    message: format!(
                        "{} is laid out together with {} (INCLUDE_CHILDREN) but sets different {}",
                        container,
                        scope.root,
                        keys.join(", ")
                    ),
                    keys,
                });
            }
        }
        Ok(())
    }

    fn supports_hierarchy(&self) -> bool {
        true
    }
}

fn check_interactive(container: NodeId, config: &NodeConfig) -> Result<(), ConfigurationConflict> {
    if config.cycle_breaking == CycleBreakingStrategy::Interactive
        && config.ordering != OrderingStrategy::None
    {
        return Err(ConfigurationConflict {
            node: container,
            other: None,
            keys: vec![
                LayeredOptions::CYCLE_BREAKING_STRATEGY.id(),
                LayeredOptions::CONSIDER_MODEL_ORDER_STRATEGY.id(),
            ],
            message: format!(
                "INTERACTIVE cycle breaking follows current positions and cannot be combined with model order strategy {}",
                config.ordering
            ),
        });
    }
    Ok(())
}

fn check_canceled(monitor: &dyn ProgressMonitor) -> Result<(), AlgorithmError> {
    if monitor.is_canceled() {
        return Err(AlgorithmError::Canceled);
    }
    Ok(())
}

fn layout_level(
    graph: &mut LayoutGraph,
    container: NodeId,
    settings: &LevelSettings,
    include_children: bool,
    monitor: &mut dyn ProgressMonitor,
) -> Result<(), AlgorithmError> {
    check_canceled(monitor)?;
    let mut lg = LGraph::import(graph, container, include_children);
    if lg.nodes.is_empty() {
        return Ok(());
    }
    trace!(
        %container,
        nodes = lg.real_count,
        edges = lg.edges.len(),
        "imported level"
    );

    check_canceled(monitor)?;
    let reversed =
        cycle_breaking::break_cycles(&mut lg, settings.cycle_breaking, settings.direction);
    trace!(%container, reversed, strategy = %settings.cycle_breaking, "cycles broken");

    check_canceled(monitor)?;
    let layer_count = layering::assign_layers(&mut lg)?;
    let segments = layering::normalize(&mut lg);
    trace!(
        %container,
        layers = layer_count,
        dummies = lg.nodes.len() - lg.real_count,
        "layers assigned"
    );

    check_canceled(monitor)?;
    let order = ordering::order_layers(
        &lg,
        &segments,
        layer_count,
        settings.ordering,
        settings.thoroughness,
    );

    check_canceled(monitor)?;
    let placement = placement::place(&lg, &order, settings);
    placement::verify(&lg, &placement)?;
    placement::apply(graph, &lg, &placement);
    trace!(
        %container,
        width = placement.size.width,
        height = placement.size.height,
        "level placed"
    );
    Ok(())
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LayeredMetaDataProvider;

impl LayoutMetaDataProvider for LayeredMetaDataProvider {
    fn algorithms(&self) -> Vec<LayoutAlgorithmData> {
        vec![LayoutAlgorithmData {
            id: LAYERED_ALGORITHM_ID.to_string(),
            name: "Layered".to_string(),
            description: "Layer-based layout of directed graphs with cycle breaking, \
                          crossing minimization and hierarchy support."
                .to_string(),
            provider: Arc::new(LayeredLayoutProvider),
        }]
    }
}
