use orca::{
    AlgorithmError, AlgorithmRegistry, BasicProgressMonitor, CoreOptions, Error, FailureCause,
    GraphError, HierarchyHandling, LayeredMetaDataProvider, LayoutAlgorithmData, LayoutGraph,
    LayoutMetaDataProvider, LayoutProvider, LayoutScope, NodeLabel, NullProgressMonitor,
    ProgressMonitor, RecursiveGraphLayoutEngine, set_property,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use test_log::test;

#[derive(Default)]
struct Recorder {
    calls: AtomicUsize,
    scopes: Mutex<Vec<(orca::NodeId, Vec<orca::NodeId>, bool)>>,
}

/// Records every scope it is given and sizes containers to a fixed 100 x 50.
struct RecordingProvider {
    recorder: Arc<Recorder>,
    hierarchy: bool,
}

impl LayoutProvider for RecordingProvider {
    fn layout(
        &self,
        graph: &mut LayoutGraph,
        scope: &LayoutScope,
        _monitor: &mut dyn ProgressMonitor,
    ) -> Result<(), AlgorithmError> {
        self.recorder.calls.fetch_add(1, Ordering::SeqCst);
        self.recorder.scopes.lock().unwrap().push((
            scope.root,
            scope.containers.clone(),
            scope.include_children,
        ));
        for &c in &scope.containers {
            let label = graph.node_mut(c).unwrap();
            label.width = 100.0;
            label.height = 50.0;
        }
        Ok(())
    }

    fn supports_hierarchy(&self) -> bool {
        self.hierarchy
    }
}

struct TestAlgorithms {
    recorder: Arc<Recorder>,
}

impl LayoutMetaDataProvider for TestAlgorithms {
    fn algorithms(&self) -> Vec<LayoutAlgorithmData> {
        let data = |id: &str, provider: Arc<dyn LayoutProvider>| LayoutAlgorithmData {
            id: id.to_string(),
            name: id.to_string(),
            description: String::new(),
            provider,
        };
        vec![
            data(
                "test.recording",
                Arc::new(RecordingProvider {
                    recorder: self.recorder.clone(),
                    hierarchy: true,
                }),
            ),
            data(
                "test.flat",
                Arc::new(RecordingProvider {
                    recorder: self.recorder.clone(),
                    hierarchy: false,
                }),
            ),
            data("test.panicking", Arc::new(PanickingProvider)),
            data("test.failing", Arc::new(FailingProvider)),
            data("test.failing_nested", Arc::new(NestedFailingProvider)),
            data("test.overclosing", Arc::new(OverclosingProvider)),
        ]
    }
}

struct PanickingProvider;

impl LayoutProvider for PanickingProvider {
    fn layout(
        &self,
        _graph: &mut LayoutGraph,
        _scope: &LayoutScope,
        monitor: &mut dyn ProgressMonitor,
    ) -> Result<(), AlgorithmError> {
        monitor.begin("Exploding layout", 1.0);
        monitor.begin("Exploding phase", 1.0);
        panic!("provider exploded");
    }
}

struct FailingProvider;

impl LayoutProvider for FailingProvider {
    fn layout(
        &self,
        _graph: &mut LayoutGraph,
        _scope: &LayoutScope,
        _monitor: &mut dyn ProgressMonitor,
    ) -> Result<(), AlgorithmError> {
        Err(AlgorithmError::InvariantViolation("broken".to_string()))
    }
}

/// Fails on the innermost container of its scope.
struct NestedFailingProvider;

impl LayoutProvider for NestedFailingProvider {
    fn layout(
        &self,
        _graph: &mut LayoutGraph,
        scope: &LayoutScope,
        _monitor: &mut dyn ProgressMonitor,
    ) -> Result<(), AlgorithmError> {
        Err(AlgorithmError::InvariantViolation("broken".to_string()).at(scope.containers[0]))
    }

    fn supports_hierarchy(&self) -> bool {
        true
    }
}

/// Closes one more task than it begins.
struct OverclosingProvider;

impl LayoutProvider for OverclosingProvider {
    fn layout(
        &self,
        _graph: &mut LayoutGraph,
        _scope: &LayoutScope,
        monitor: &mut dyn ProgressMonitor,
    ) -> Result<(), AlgorithmError> {
        monitor.begin("Overclosing layout", 1.0);
        monitor.done();
        monitor.done();
        Ok(())
    }
}

fn registry() -> (AlgorithmRegistry, Arc<Recorder>) {
    let recorder = Arc::new(Recorder::default());
    let registry = AlgorithmRegistry::new();
    registry.register_layout_meta_data_providers(&[
        &LayeredMetaDataProvider,
        &TestAlgorithms {
            recorder: recorder.clone(),
        },
    ]);
    (registry, recorder)
}

fn set_algorithm(g: &mut LayoutGraph, node: orca::NodeId, id: &str) {
    set_property(g, node, &CoreOptions::ALGORITHM, id.to_string()).unwrap();
}

fn set_handling(g: &mut LayoutGraph, node: orca::NodeId, h: HierarchyHandling) {
    set_property(g, node, &CoreOptions::HIERARCHY_HANDLING, h).unwrap();
}

#[test]
fn childless_root_keeps_its_intrinsic_size_without_calling_a_provider() {
    let (registry, recorder) = registry();
    let mut g = LayoutGraph::with_root(NodeLabel::new(30.0, 40.0));
    let root = g.root();
    set_algorithm(&mut g, root, "test.recording");

    let result = RecursiveGraphLayoutEngine::new(&registry)
        .layout(&mut g, root, &mut NullProgressMonitor)
        .unwrap();

    assert_eq!(recorder.calls.load(Ordering::SeqCst), 0);
    assert_eq!(result.len(), 1);
    let r = result.get(root).unwrap();
    assert_eq!((r.width, r.height), (30.0, 40.0));
}

#[test]
fn separate_children_gives_each_container_its_own_scope_innermost_first() {
    let (registry, recorder) = registry();
    let mut g = LayoutGraph::new();
    let root = g.root();
    let a = g.create_node(root).unwrap();
    let a1 = g.create_node(a).unwrap();
    let _leaf = g.create_node(a1).unwrap();
    let _b = g.create_node(root).unwrap();
    for n in [root, a, a1] {
        set_algorithm(&mut g, n, "test.recording");
    }

    RecursiveGraphLayoutEngine::new(&registry)
        .layout(&mut g, root, &mut NullProgressMonitor)
        .unwrap();

    let scopes = recorder.scopes.lock().unwrap().clone();
    assert_eq!(
        scopes,
        vec![
            (a1, vec![a1], false),
            (a, vec![a], false),
            (root, vec![root], false),
        ]
    );
}

#[test]
fn include_children_expands_nested_containers_into_one_scope() {
    let (registry, recorder) = registry();
    let mut g = LayoutGraph::new();
    let root = g.root();
    let a = g.create_node(root).unwrap();
    let a1 = g.create_node(a).unwrap();
    let _leaf = g.create_node(a1).unwrap();
    let b = g.create_node(root).unwrap();
    let _b1 = g.create_node(b).unwrap();
    for n in [root, a, a1, b] {
        set_algorithm(&mut g, n, "test.recording");
    }
    set_handling(&mut g, root, HierarchyHandling::IncludeChildren);
    // a and a1 inherit; b opts out.
    set_handling(&mut g, b, HierarchyHandling::SeparateChildren);

    RecursiveGraphLayoutEngine::new(&registry)
        .layout(&mut g, root, &mut NullProgressMonitor)
        .unwrap();

    let scopes = recorder.scopes.lock().unwrap().clone();
    assert_eq!(scopes, vec![(b, vec![b], false), (root, vec![a1, a, root], true)]);
}

#[test]
fn a_different_algorithm_breaks_the_include_scope() {
    let (registry, recorder) = registry();
    let mut g = LayoutGraph::new();
    let root = g.root();
    let a = g.create_node(root).unwrap();
    let _leaf = g.create_node(a).unwrap();
    set_algorithm(&mut g, root, "test.recording");
    set_algorithm(&mut g, a, "test.flat");
    set_handling(&mut g, root, HierarchyHandling::IncludeChildren);

    RecursiveGraphLayoutEngine::new(&registry)
        .layout(&mut g, root, &mut NullProgressMonitor)
        .unwrap();

    let scopes = recorder.scopes.lock().unwrap().clone();
    assert_eq!(scopes, vec![(a, vec![a], false), (root, vec![root], true)]);
}

#[test]
fn providers_without_hierarchy_support_never_expand_children() {
    let (registry, recorder) = registry();
    let mut g = LayoutGraph::new();
    let root = g.root();
    let a = g.create_node(root).unwrap();
    let _leaf = g.create_node(a).unwrap();
    set_algorithm(&mut g, root, "test.flat");
    set_algorithm(&mut g, a, "test.flat");
    set_handling(&mut g, root, HierarchyHandling::IncludeChildren);

    RecursiveGraphLayoutEngine::new(&registry)
        .layout(&mut g, root, &mut NullProgressMonitor)
        .unwrap();

    let scopes = recorder.scopes.lock().unwrap().clone();
    assert_eq!(scopes, vec![(a, vec![a], false), (root, vec![root], false)]);
}

#[test]
fn unknown_algorithm_is_reported_before_any_layout() {
    let (registry, recorder) = registry();
    let mut g = LayoutGraph::new();
    let root = g.root();
    let a = g.create_node(root).unwrap();
    let _leaf = g.create_node(a).unwrap();
    set_algorithm(&mut g, root, "test.recording");
    set_algorithm(&mut g, a, "does.not.exist");

    let err = RecursiveGraphLayoutEngine::new(&registry)
        .layout(&mut g, root, &mut NullProgressMonitor)
        .unwrap_err();

    assert_eq!(
        err,
        Error::UnknownAlgorithm {
            node: a,
            algorithm: "does.not.exist".to_string()
        }
    );
    assert_eq!(err.kind(), "unknown_algorithm");
    assert_eq!(recorder.calls.load(Ordering::SeqCst), 0);
}

#[test]
fn algorithm_ids_resolve_by_suffix() {
    let (registry, recorder) = registry();
    let mut g = LayoutGraph::new();
    let root = g.root();
    let _a = g.create_node(root).unwrap();
    set_algorithm(&mut g, root, "recording");

    RecursiveGraphLayoutEngine::new(&registry)
        .layout(&mut g, root, &mut NullProgressMonitor)
        .unwrap();
    assert_eq!(recorder.calls.load(Ordering::SeqCst), 1);
}

#[test]
fn cancellation_before_the_pass_yields_canceled() {
    let (registry, recorder) = registry();
    let mut g = LayoutGraph::new();
    let root = g.root();
    let _a = g.create_node(root).unwrap();
    set_algorithm(&mut g, root, "test.recording");

    let mut monitor = BasicProgressMonitor::new();
    monitor.cancel_token().cancel();
    let err = RecursiveGraphLayoutEngine::new(&registry)
        .layout(&mut g, root, &mut monitor)
        .unwrap_err();

    assert_eq!(err, Error::Canceled);
    assert_eq!(recorder.calls.load(Ordering::SeqCst), 0);
    assert_eq!(monitor.open_tasks(), 0);
}

#[test]
fn canceled_monitor_stops_a_layered_layout() {
    let (registry, _) = registry();
    let mut g = LayoutGraph::new();
    let root = g.root();
    let a = g.create_node_with_label(root, NodeLabel::new(10.0, 10.0)).unwrap();
    let b = g.create_node_with_label(root, NodeLabel::new(10.0, 10.0)).unwrap();
    g.create_edge(a, b).unwrap();

    let mut monitor = BasicProgressMonitor::new();
    monitor.cancel_token().cancel();
    let err = RecursiveGraphLayoutEngine::new(&registry)
        .layout(&mut g, root, &mut monitor)
        .unwrap_err();
    assert_eq!(err, Error::Canceled);
}

#[test]
fn a_panicking_provider_becomes_a_layout_failure() {
    let (registry, _) = registry();
    let mut g = LayoutGraph::new();
    let root = g.root();
    let _a = g.create_node(root).unwrap();
    set_algorithm(&mut g, root, "test.panicking");

    let err = RecursiveGraphLayoutEngine::new(&registry)
        .layout(&mut g, root, &mut NullProgressMonitor)
        .unwrap_err();

    match err {
        Error::LayoutFailure {
            node,
            cause: FailureCause::Panicked(msg),
        } => {
            assert_eq!(node, root);
            assert!(msg.contains("provider exploded"), "{msg}");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn provider_errors_carry_the_scope_root() {
    let (registry, _) = registry();
    let mut g = LayoutGraph::new();
    let root = g.root();
    let a = g.create_node(root).unwrap();
    let _leaf = g.create_node(a).unwrap();
    set_algorithm(&mut g, a, "test.failing");

    let err = RecursiveGraphLayoutEngine::new(&registry)
        .layout(&mut g, root, &mut NullProgressMonitor)
        .unwrap_err();
    assert_eq!(
        err,
        Error::LayoutFailure {
            node: a,
            cause: FailureCause::InvariantViolation("broken".to_string()),
        }
    );
}

#[test]
fn a_panicking_provider_leaves_no_task_open() {
    let (registry, _) = registry();
    let mut g = LayoutGraph::new();
    let root = g.root();
    let _a = g.create_node(root).unwrap();
    set_algorithm(&mut g, root, "test.panicking");

    let mut monitor = BasicProgressMonitor::new();
    let err = RecursiveGraphLayoutEngine::new(&registry)
        .layout(&mut g, root, &mut monitor)
        .unwrap_err();
    assert_eq!(err.kind(), "layout_failure");

    assert_eq!(monitor.open_tasks(), 0);
    let tasks = monitor.tasks();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].name, "Recursive graph layout");
    assert_eq!(tasks[0].children.len(), 1);
    assert_eq!(tasks[0].children[0].name, "Exploding layout");
    assert_eq!(tasks[0].children[0].children[0].name, "Exploding phase");
}

#[test]
fn surplus_done_calls_do_not_close_the_engine_task() {
    let (registry, _) = registry();
    let mut g = LayoutGraph::new();
    let root = g.root();
    let a = g.create_node(root).unwrap();
    let _leaf = g.create_node(a).unwrap();
    set_algorithm(&mut g, root, "test.overclosing");
    set_algorithm(&mut g, a, "test.overclosing");

    let mut monitor = BasicProgressMonitor::new();
    RecursiveGraphLayoutEngine::new(&registry)
        .layout(&mut g, root, &mut monitor)
        .unwrap();

    assert_eq!(monitor.open_tasks(), 0);
    let tasks = monitor.tasks();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].name, "Recursive graph layout");
    assert_eq!(tasks[0].worked, 2.0);
    assert_eq!(tasks[0].children.len(), 2);
}

#[test]
fn failures_inside_an_include_scope_name_the_failing_container() {
    let (registry, _) = registry();
    let mut g = LayoutGraph::new();
    let root = g.root();
    let a = g.create_node(root).unwrap();
    let b = g.create_node(a).unwrap();
    let _leaf = g.create_node(b).unwrap();
    for n in [root, a, b] {
        set_algorithm(&mut g, n, "test.failing_nested");
        set_handling(&mut g, n, HierarchyHandling::IncludeChildren);
    }

    let err = RecursiveGraphLayoutEngine::new(&registry)
        .layout(&mut g, root, &mut NullProgressMonitor)
        .unwrap_err();
    assert_eq!(
        err,
        Error::LayoutFailure {
            node: b,
            cause: FailureCause::InvariantViolation("broken".to_string()),
        }
    );
}

#[test]
fn laying_out_a_foreign_root_fails() {
    let (registry, _) = registry();
    let mut g = LayoutGraph::new();
    let other = LayoutGraph::new();
    let err = RecursiveGraphLayoutEngine::new(&registry)
        .layout(&mut g, other.root(), &mut NullProgressMonitor)
        .unwrap_err();
    assert_eq!(
        err,
        Error::Graph(GraphError::UnknownNode { node: other.root() })
    );
}

#[test]
fn a_nested_node_can_be_the_layout_root() {
    let (registry, _) = registry();
    let mut g = LayoutGraph::new();
    let root = g.root();
    let a = g.create_node(root).unwrap();
    let a1 = g.create_node_with_label(a, NodeLabel::new(20.0, 10.0)).unwrap();
    let untouched = g.create_node_with_label(root, NodeLabel::new(5.0, 5.0)).unwrap();

    let result = RecursiveGraphLayoutEngine::new(&registry)
        .layout(&mut g, a, &mut NullProgressMonitor)
        .unwrap();

    assert_eq!(result.root(), a);
    assert_eq!(result.len(), 2);
    assert_eq!(result.entry(a).and_then(|e| e.parent), None);
    assert!(result.get(untouched).is_none());
    let ra = result.get(a).unwrap();
    assert_eq!((ra.width, ra.height), (44.0, 34.0));
    assert_eq!(result.get(a1).map(|r| (r.x, r.y)), Some((12.0, 12.0)));
}

#[test]
fn fixed_algorithm_keeps_positions_and_fits_the_container() {
    let (registry, _) = registry();
    let mut g = LayoutGraph::new();
    let root = g.root();
    set_algorithm(&mut g, root, "orca.fixed");
    set_property(&mut g, root, &CoreOptions::PADDING, 5.0).unwrap();
    let mut label = NodeLabel::new(10.0, 20.0);
    label.x = 30.0;
    label.y = 40.0;
    let a = g.create_node_with_label(root, label).unwrap();

    let result = RecursiveGraphLayoutEngine::new(&registry)
        .layout(&mut g, root, &mut NullProgressMonitor)
        .unwrap();

    let ra = result.get(a).unwrap();
    assert_eq!((ra.x, ra.y), (30.0, 40.0));
    let rr = result.get(root).unwrap();
    assert_eq!((rr.width, rr.height), (45.0, 65.0));
}

#[test]
fn identical_input_gives_identical_results() {
    let build = || {
        let mut g = LayoutGraph::new();
        let root = g.root();
        let mut nodes = Vec::new();
        for i in 0..12 {
            let n = g
                .create_node_with_label(root, NodeLabel::new(10.0 + i as f64, 15.0))
                .unwrap();
            nodes.push(n);
        }
        for i in 0..12 {
            g.create_edge(nodes[i], nodes[(i * 5 + 3) % 12]).unwrap();
            g.create_edge(nodes[(i * 7 + 1) % 12], nodes[i]).unwrap();
        }
        g
    };
    let (registry, _) = registry();
    let engine = RecursiveGraphLayoutEngine::new(&registry);

    let mut g1 = build();
    let mut g2 = build();
    let root = g1.root();
    let r1 = engine.layout(&mut g1, root, &mut NullProgressMonitor).unwrap();
    let root = g2.root();
    let r2 = engine.layout(&mut g2, root, &mut NullProgressMonitor).unwrap();
    let bounds = |r: &orca::LayoutResult| r.entries().iter().map(|e| e.bounds).collect::<Vec<_>>();
    assert_eq!(bounds(&r1), bounds(&r2));

    // Laying out the same graph again is also stable.
    let root = g1.root();
    let r3 = engine.layout(&mut g1, root, &mut NullProgressMonitor).unwrap();
    assert_eq!(r1, r3);
}

#[test]
fn convenience_layout_uses_the_global_registry() {
    let mut g = LayoutGraph::new();
    let root = g.root();
    let a = g.create_node_with_label(root, NodeLabel::new(10.0, 10.0)).unwrap();
    let b = g.create_node_with_label(root, NodeLabel::new(10.0, 10.0)).unwrap();
    g.create_edge(a, b).unwrap();

    let result = orca::layout(&mut g, &mut NullProgressMonitor).unwrap();
    let (ra, rb) = (result.get(a).unwrap(), result.get(b).unwrap());
    assert!(ra.right() < rb.x);
    assert!(AlgorithmRegistry::global().contains("orca.layered"));
}
