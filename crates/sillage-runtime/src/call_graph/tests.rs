use super::*;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};

static FIB: Traced<u64, u64> = Traced::new("fib", fib);

fn fib(cx: &Frame<'_>, n: u64) -> u64 {
    if n == 0 {
        return 0;
    }
    if n == 1 {
        return 1;
    }
    cx.call(&FIB, n - 1) + cx.call(&FIB, n - 2)
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Boom(u32);

impl fmt::Display for Boom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "boom at {}", self.0)
    }
}

static COUNTDOWN: Traced<u32, Result<u32, Boom>> = Traced::new("countdown", countdown);

fn countdown(cx: &Frame<'_>, n: u32) -> Result<u32, Boom> {
    if n == 0 {
        return Err(Boom(n));
    }
    Ok(cx.call(&COUNTDOWN, n - 1)? + 1)
}

static FORGIVING: Traced<u32, u32> = Traced::new("forgiving", forgiving);

fn forgiving(cx: &Frame<'_>, n: u32) -> u32 {
    cx.call(&COUNTDOWN, n).unwrap_or(0)
}

static PANICKY: Traced<u32, u32> = Traced::new("panicky", panicky);

fn panicky(cx: &Frame<'_>, n: u32) -> u32 {
    if n == 0 {
        panic!("panicky reached the bottom");
    }
    cx.call(&PANICKY, n - 1) + 1
}

static SHRINK: Traced<Vec<i64>, usize> = Traced::new("shrink", shrink);

fn shrink(cx: &Frame<'_>, mut items: Vec<i64>) -> usize {
    if items.pop().is_none() {
        return 0;
    }
    1 + cx.call(&SHRINK, items)
}

static COUNTING: Traced<u32, u32> = Traced::new("counting", counting);

fn counting(cx: &Frame<'_>, n: u32) -> u32 {
    cx.track([("n", n)]).expect("own activation must resolve");
    cx.track([("n", n + 10), ("seen", 1)])
        .expect("own activation must resolve");
    if n == 0 { 0 } else { cx.call(&COUNTING, n - 1) }
}

static RESETTING: Traced<(), bool> = Traced::new("resetting", resetting);

fn resetting(cx: &Frame<'_>, (): ()) -> bool {
    cx.graph().reset();
    matches!(
        cx.track([("after", 1u8)]),
        Err(TraceError::StaleFrame { .. })
    )
}

static RESET_THEN_CALL: Traced<u32, u32> = Traced::new("reset_then_call", reset_then_call);
static LEAF: Traced<u32, u32> = Traced::new("leaf", leaf);

fn reset_then_call(cx: &Frame<'_>, n: u32) -> u32 {
    cx.graph().reset();
    cx.call(&LEAF, n) + 1
}

fn leaf(cx: &Frame<'_>, n: u32) -> u32 {
    match cx.track([("n", n)]) {
        Err(TraceError::StaleFrame { .. }) => n * 2,
        _ => 0,
    }
}

static OUTER: Traced<(Vec<i64>, f64), u64> = Traced::new("outer", outer);
static INNER: Traced<(Vec<i64>, f64), u64> = Traced::new("inner", inner);

fn outer(cx: &Frame<'_>, (items, bound): (Vec<i64>, f64)) -> u64 {
    cx.call(&INNER, (items, bound))
}

fn inner(cx: &Frame<'_>, (items, bound): (Vec<i64>, f64)) -> u64 {
    match items.split_last() {
        None => 0,
        Some((last, rest)) if (*last as f64) < bound => 1 + cx.call(&INNER, (rest.to_vec(), *last as f64)),
        Some((_, rest)) => cx.call(&INNER, (rest.to_vec(), bound)),
    }
}

fn id(raw: u64) -> ActivationId {
    ActivationId::new(raw).expect("test ids are non-zero")
}

fn children_of(graph: &CallGraph, raw: u64) -> Vec<ChildEdge> {
    graph
        .activation(id(raw))
        .expect("activation should exist")
        .children
}

fn arguments_of(graph: &CallGraph) -> Vec<String> {
    graph
        .activations()
        .iter()
        .map(|activation| activation.arguments.render())
        .collect()
}

#[test]
fn fib_of_three_builds_the_textbook_tree() {
    let graph = CallGraph::new();
    assert_eq!(graph.trace(&FIB, 3), 2);

    assert_eq!(arguments_of(&graph), vec!["3", "2", "1", "0", "1"]);
    assert!(
        graph
            .activations()
            .iter()
            .all(|activation| activation.function_name == "fib")
    );

    let root = graph.activation(id(1)).expect("root should exist");
    assert!(root.is_root());
    assert_eq!(root.return_value, Some(Value::UInt(2)));

    let root_children: Vec<_> = children_of(&graph, 1).iter().map(|e| e.child).collect();
    assert_eq!(root_children, vec![id(2), id(5)]);

    let fib2_children: Vec<_> = children_of(&graph, 2).iter().map(|e| e.child).collect();
    assert_eq!(fib2_children, vec![id(3), id(4)]);
}

#[test]
fn call_and_return_orders_are_stamped_separately() {
    let graph = CallGraph::new();
    graph.trace(&FIB, 3);

    let root = children_of(&graph, 1);
    let fib2 = children_of(&graph, 2);

    assert_eq!(
        fib2,
        vec![
            ChildEdge {
                child: id(3),
                call_order: 2,
                return_order: Some(1),
            },
            ChildEdge {
                child: id(4),
                call_order: 3,
                return_order: Some(2),
            },
        ]
    );
    assert_eq!(
        root,
        vec![
            ChildEdge {
                child: id(2),
                call_order: 1,
                return_order: Some(3),
            },
            ChildEdge {
                child: id(5),
                call_order: 4,
                return_order: Some(4),
            },
        ]
    );
    assert_eq!(graph.call_counter(), 5);
    assert_eq!(graph.unwind_counter(), 5);
}

#[test]
fn every_non_root_has_exactly_one_incoming_edge() {
    let graph = CallGraph::new();
    graph.trace(&FIB, 5);

    let activations = graph.activations();
    for activation in &activations {
        let incoming = activations
            .iter()
            .flat_map(|candidate| candidate.children.iter())
            .filter(|edge| edge.child == activation.id)
            .count();
        let expected = usize::from(!activation.is_root());
        assert_eq!(incoming, expected, "activation {}", activation.id);
        if let Some(parent) = activation.parent {
            let parent = graph.activation(parent).expect("parent should exist");
            assert!(parent.children.iter().any(|edge| edge.child == activation.id));
        }
    }
    assert_eq!(graph.roots(), vec![id(1)]);
}

#[test]
fn call_orders_increase_in_call_sequence_and_return_orders_in_completion_sequence() {
    let graph = CallGraph::new();
    graph.trace(&FIB, 6);

    let mut edges: Vec<ChildEdge> = graph
        .activations()
        .into_iter()
        .flat_map(|activation| activation.children)
        .collect();

    // Activation ids are handed out in call sequence.
    edges.sort_by_key(|edge| edge.child);
    let call_orders: Vec<u64> = edges.iter().map(|edge| edge.call_order).collect();
    assert!(call_orders.windows(2).all(|pair| pair[0] < pair[1]));

    let mut return_orders: Vec<u64> = edges
        .iter()
        .map(|edge| edge.return_order.expect("every call completed"))
        .collect();
    return_orders.sort_unstable();
    return_orders.dedup();
    assert_eq!(return_orders.len(), edges.len());
}

#[test]
fn parent_edges_resolve_before_parent_returns() {
    let graph = CallGraph::new();
    graph.trace(&FIB, 4);

    let activations = graph.activations();
    for activation in activations.iter().filter(|a| a.has_returned()) {
        assert!(
            activation
                .children
                .iter()
                .all(|edge| edge.return_order.is_some()),
            "activation {} returned with pending children",
            activation.id
        );
    }
}

#[test]
fn repeated_top_level_calls_each_add_one_root() {
    let graph = CallGraph::new();
    graph.trace(&FIB, 2);
    graph.trace(&FIB, 2);
    assert_eq!(graph.roots().len(), 2);
}

#[test]
fn reset_clears_activations_and_counters() {
    let graph = CallGraph::new();
    graph.trace(&FIB, 7);
    assert!(graph.len() > 1);
    let before = graph.run();

    graph.reset();

    assert!(graph.is_empty());
    assert_eq!(graph.call_counter(), FIRST_ORDER);
    assert_eq!(graph.unwind_counter(), FIRST_ORDER);
    assert!(graph.run() > before);

    graph.trace(&FIB, 1);
    assert_eq!(graph.roots(), vec![id(1)]);
}

#[test]
fn failing_call_keeps_partial_graph_and_original_error() {
    let graph = CallGraph::new();
    let result = graph.trace(&COUNTDOWN, 2);
    assert_eq!(result, Err(Boom(0)));

    let activations = graph.activations();
    assert_eq!(activations.len(), 3);
    assert!(activations.iter().all(|activation| !activation.has_returned()));
    assert_eq!(children_of(&graph, 1)[0].return_order, None);
    assert_eq!(children_of(&graph, 2)[0].return_order, None);
    assert_eq!(graph.unwind_counter(), FIRST_ORDER);
}

#[test]
fn recovering_parent_returns_with_a_pending_child_edge() {
    let graph = CallGraph::new();
    assert_eq!(graph.trace(&FORGIVING, 1), 0);

    let root = graph.activation(id(1)).expect("root should exist");
    assert_eq!(root.return_value, Some(Value::UInt(0)));
    assert_eq!(root.children[0].return_order, None);
}

#[test]
fn panic_propagates_and_leaves_nodes_without_returns() {
    let graph = CallGraph::new();
    let outcome = catch_unwind(AssertUnwindSafe(|| graph.trace(&PANICKY, 2)));
    assert!(outcome.is_err());

    let activations = graph.activations();
    assert_eq!(activations.len(), 3);
    assert!(activations.iter().all(|activation| !activation.has_returned()));

    graph.reset();
    assert_eq!(graph.trace(&FIB, 2), 1);
}

#[test]
fn arguments_are_copied_before_the_callee_mutates_them() {
    let graph = CallGraph::new();
    assert_eq!(graph.trace(&SHRINK, vec![1, 2, 3]), 3);
    assert_eq!(arguments_of(&graph), vec!["[1, 2, 3]", "[1, 2]", "[1]", "[]"]);
}

#[test]
fn track_merges_annotations_into_own_node() {
    let graph = CallGraph::new();
    graph.trace(&COUNTING, 1);

    let root = graph.activation(id(1)).expect("root should exist");
    assert_eq!(
        root.auxiliary_data,
        vec![
            (CompactString::from("n"), Value::UInt(11)),
            (CompactString::from("seen"), Value::UInt(1)),
        ]
    );
    let child = graph.activation(id(2)).expect("child should exist");
    assert_eq!(child.auxiliary_data[0].1, Value::UInt(10));
}

#[test]
fn track_after_reset_is_an_instrumentation_error() {
    let graph = CallGraph::new();
    assert!(graph.trace(&RESETTING, ()));
    assert!(graph.is_empty(), "completion from a stale run must be ignored");
}

#[test]
fn calls_through_a_stale_frame_run_but_are_not_recorded() {
    let graph = CallGraph::new();
    assert_eq!(graph.trace(&RESET_THEN_CALL, 4), 9);
    assert!(graph.is_empty(), "no activation belongs to the new run");
    assert!(graph.roots().is_empty());
    assert_eq!(graph.call_counter(), 1);

    assert_eq!(graph.trace(&LEAF, 3), 0);
    assert_eq!(graph.roots(), vec![id(1)]);
}

#[test]
fn different_traced_functions_share_one_graph() {
    let graph = CallGraph::new();
    assert_eq!(graph.trace(&OUTER, (vec![3, 1, 2], f64::INFINITY)), 2);

    let names: Vec<_> = graph
        .activations()
        .iter()
        .map(|activation| activation.function_name)
        .collect();
    assert_eq!(names[0], "outer");
    assert!(names[1..].iter().all(|name| *name == "inner"));
    assert_eq!(arguments_of(&graph)[1], "[3, 1, 2],inf");
}

#[test]
fn snapshot_exports_nodes_and_edges() {
    let graph = CallGraph::new();
    graph.trace(&FIB, 2);

    let snapshot = graph.snapshot();
    assert_eq!(snapshot.nodes.len(), 3);
    assert_eq!(snapshot.edges.len(), 2);
    assert_eq!(snapshot.nodes[0].return_value.as_deref(), Some("1"));
    assert_eq!(snapshot.edges[0].call_order, 1);
    assert_eq!(snapshot.edges[1].return_order, Some(2));
    assert_eq!(snapshot.roots().count(), 1);
}
