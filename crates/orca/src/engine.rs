//! Recursive layout driver.
//!
//! The containment tree below the layout root is cut into layout scopes. A scope is a
//! container plus the nested containers expanded into it through `INCLUDE_CHILDREN`; each
//! scope is handled by one provider call. Scopes run innermost first, so a container's
//! nested children already have their final size when it is laid out.

use crate::error::{AlgorithmError, Error, FailureCause, Result};
use crate::model::{LayoutGraph, LayoutResult};
use crate::options::NodeConfig;
use crate::progress::ProgressMonitor;
use crate::registry::{AlgorithmRegistry, LayoutAlgorithmData};
use orca_graph::{GraphError, NodeId, alg};
use rustc_hash::FxHashMap;
use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use tracing::{debug, warn};

/// One provider invocation.
#[derive(Debug, Clone)]
pub struct LayoutScope {
    pub root: NodeId,
    /// Resolved algorithm id.
    pub algorithm: String,
    /// Whether nested containers were expanded into this scope.
    pub include_children: bool,
    /// Containers to lay out, in post-order (the scope root last).
    pub containers: Vec<NodeId>,
    configs: Vec<NodeConfig>,
}

impl LayoutScope {
    pub fn config(&self, node: NodeId) -> Option<&NodeConfig> {
        let ix = self.containers.iter().position(|&c| c == node)?;
        self.configs.get(ix)
    }

    pub fn root_config(&self) -> Option<&NodeConfig> {
        self.config(self.root)
    }

    pub fn configs(&self) -> impl Iterator<Item = (NodeId, &NodeConfig)> + '_ {
        self.containers.iter().copied().zip(self.configs.iter())
    }
}

struct PlannedScope {
    scope: LayoutScope,
    data: LayoutAlgorithmData,
}

pub struct RecursiveGraphLayoutEngine<'r> {
    registry: &'r AlgorithmRegistry,
}

impl Default for RecursiveGraphLayoutEngine<'static> {
    fn default() -> Self {
        Self::new(AlgorithmRegistry::global())
    }
}

impl<'r> RecursiveGraphLayoutEngine<'r> {
    pub fn new(registry: &'r AlgorithmRegistry) -> Self {
        Self { registry }
    }

    /// Lays out the subtree below `root` and returns a snapshot of the written positions.
    ///
    /// Configuration errors (unknown algorithms, conflicts) are reported before any node is
    /// touched. A failing or canceled run may leave already processed scopes laid out.
    pub fn layout(
        &self,
        graph: &mut LayoutGraph,
        root: NodeId,
        monitor: &mut dyn ProgressMonitor,
    ) -> Result<LayoutResult> {
        if !graph.contains_node(root) {
            return Err(Error::Graph(GraphError::UnknownNode { node: root }));
        }
        if !graph.has_children(root) {
            debug!(%root, "layout root has no children, keeping its intrinsic size");
            return Ok(LayoutResult::capture(graph, root));
        }

        let plan = self.plan(graph, root)?;
        debug!(%root, scopes = plan.len(), "built layout scopes");

        for planned in &plan {
            planned
                .data
                .provider
                .validate(graph, &planned.scope)
                .map_err(|conflict| {
                    warn!(%conflict, "configuration rejected");
                    Error::ConfigurationConflict(conflict)
                })?;
        }

        monitor.begin("Recursive graph layout", plan.len() as f64);
        let outcome = run_scopes(graph, &plan, monitor);
        monitor.done();
        outcome?;

        Ok(LayoutResult::capture(graph, root))
    }

    fn plan(&self, graph: &LayoutGraph, root: NodeId) -> Result<Vec<PlannedScope>> {
        // Resolve configs top-down so hierarchy handling can inherit.
        let mut configs: FxHashMap<NodeId, NodeConfig> = FxHashMap::default();
        let mut scope_of: FxHashMap<NodeId, usize> = FxHashMap::default();
        let mut scopes: Vec<PlannedScope> = Vec::new();

        for node in alg::preorder(graph, root) {
            if !graph.has_children(node) {
                continue;
            }
            let Some(label) = graph.node(node) else {
                continue;
            };
            let parent = if node == root {
                None
            } else {
                graph.parent(node)
            };
            let inherited = parent.and_then(|p| configs.get(&p)).map(|c| c.hierarchy_handling);
            let config = NodeConfig::resolve(node, label, inherited);

            let data = self
                .registry
                .resolve(&config.algorithm)
                .ok_or_else(|| Error::UnknownAlgorithm {
                    node,
                    algorithm: config.algorithm.clone(),
                })?;

            let expand_into = parent.and_then(|p| {
                let parent_config = configs.get(&p)?;
                let scope_ix = *scope_of.get(&p)?;
                let scope = &scopes[scope_ix];
                let expand = parent_config.includes_children()
                    && config.includes_children()
                    && scope.data.id == data.id
                    && scope.data.provider.supports_hierarchy();
                expand.then_some(scope_ix)
            });

            match expand_into {
                Some(ix) => {
                    scope_of.insert(node, ix);
                }
                None => {
                    let include_children =
                        config.includes_children() && data.provider.supports_hierarchy();
                    scope_of.insert(node, scopes.len());
                    scopes.push(PlannedScope {
                        scope: LayoutScope {
                            root: node,
                            algorithm: data.id.clone(),
                            include_children,
                            containers: Vec::new(),
                            configs: Vec::new(),
                        },
                        data,
                    });
                }
            }
            configs.insert(node, config);
        }

        // Fill containers in post-order; nested scope roots come before enclosing ones.
        let post = alg::postorder(graph, root);
        let mut post_ix: FxHashMap<NodeId, usize> = FxHashMap::default();
        for (i, &node) in post.iter().enumerate() {
            post_ix.insert(node, i);
            let Some(&scope_ix) = scope_of.get(&node) else {
                continue;
            };
            let Some(config) = configs.remove(&node) else {
                continue;
            };
            let scope = &mut scopes[scope_ix].scope;
            scope.containers.push(node);
            scope.configs.push(config);
        }
        scopes.sort_by_key(|s| post_ix.get(&s.scope.root).copied().unwrap_or(usize::MAX));

        for s in &scopes {
            debug!(
                root = %s.scope.root,
                algorithm = %s.scope.algorithm,
                include_children = s.scope.include_children,
                containers = s.scope.containers.len(),
                "layout scope"
            );
        }
        Ok(scopes)
    }
}

fn run_scopes(
    graph: &mut LayoutGraph,
    plan: &[PlannedScope],
    monitor: &mut dyn ProgressMonitor,
) -> Result<()> {
    for planned in plan {
        let scope = &planned.scope;
        if monitor.is_canceled() {
            warn!(root = %scope.root, "layout canceled");
            return Err(Error::Canceled);
        }
        debug!(root = %scope.root, algorithm = %scope.algorithm, "running layout scope");

        let provider = planned.data.provider.as_ref();
        let mut scoped = ScopeMonitor::new(monitor);
        let outcome = catch_unwind(AssertUnwindSafe(|| provider.layout(graph, scope, &mut scoped)));
        let unclosed = scoped.close_all();
        if unclosed > 0 {
            debug!(root = %scope.root, unclosed, "closed tasks left open by the provider");
        }
        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(AlgorithmError::Canceled)) => {
                warn!(root = %scope.root, "layout canceled");
                return Err(Error::Canceled);
            }
            Ok(Err(AlgorithmError::InvariantViolation(msg))) => {
                warn!(root = %scope.root, error = %msg, "layout algorithm failed");
                return Err(Error::LayoutFailure {
                    node: scope.root,
                    cause: FailureCause::InvariantViolation(msg),
                });
            }
            Ok(Err(AlgorithmError::ContainerFailed { node, message })) => {
                warn!(root = %scope.root, %node, error = %message, "layout algorithm failed");
                return Err(Error::LayoutFailure {
                    node,
                    cause: FailureCause::InvariantViolation(message),
                });
            }
            Err(payload) => {
                let msg = panic_message(payload.as_ref());
                warn!(root = %scope.root, panic = %msg, "layout algorithm panicked");
                return Err(Error::LayoutFailure {
                    node: scope.root,
                    cause: FailureCause::Panicked(msg),
                });
            }
        }
        monitor.worked(1.0);
    }
    Ok(())
}

/// Forwards to the caller's monitor while keeping the provider's `begin`/`done` calls
/// balanced. Surplus `done` calls are dropped so they cannot close the engine's task.
struct ScopeMonitor<'m> {
    inner: &'m mut dyn ProgressMonitor,
    open: usize,
}

impl<'m> ScopeMonitor<'m> {
    fn new(inner: &'m mut dyn ProgressMonitor) -> Self {
        Self { inner, open: 0 }
    }

    /// Closes every task the provider left open and returns how many there were.
    fn close_all(&mut self) -> usize {
        let unclosed = self.open;
        for _ in 0..unclosed {
            self.inner.done();
        }
        self.open = 0;
        unclosed
    }
}

impl ProgressMonitor for ScopeMonitor<'_> {
    fn begin(&mut self, task: &str, total_work: f64) {
        self.open += 1;
        self.inner.begin(task, total_work);
    }

    fn worked(&mut self, work: f64) {
        self.inner.worked(work);
    }

    fn done(&mut self) {
        if self.open > 0 {
            self.open -= 1;
            self.inner.done();
        }
    }

    fn is_canceled(&self) -> bool {
        self.inner.is_canceled()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        return (*s).to_string();
    }
    if let Some(s) = payload.downcast_ref::<String>() {
        return s.clone();
    }
    "unknown panic payload".to_string()
}
