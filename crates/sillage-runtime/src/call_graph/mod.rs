use compact_str::CompactString;
use parking_lot::Mutex;
use sillage_types::{
    ActivationId, Arguments, AuxRecord, Capture, CapturedArguments, EdgeRecord, GraphSnapshot,
    NodeRecord, Outcome, RunId, Value,
};
use std::collections::BTreeMap;
use tracing::{debug, trace, warn};

use crate::TraceError;

#[cfg(test)]
mod tests;

/// Call and unwind counters both start here.
const FIRST_ORDER: u64 = 1;

/// A named function whose activations are recorded.
///
/// The body receives the [`Frame`] of its own activation; recursive calls go
/// through [`Frame::call`] so the recorder knows who the caller is.
///
/// ```
/// use sillage_runtime::{CallGraph, Frame, Traced};
///
/// static FACT: Traced<u64, u64> = Traced::new("fact", fact);
///
/// fn fact(cx: &Frame<'_>, n: u64) -> u64 {
///     if n <= 1 { 1 } else { n * cx.call(&FACT, n - 1) }
/// }
///
/// let graph = CallGraph::new();
/// assert_eq!(graph.trace(&FACT, 4), 24);
/// assert_eq!(graph.len(), 4);
/// ```
pub struct Traced<A, R> {
    name: &'static str,
    body: fn(&Frame<'_>, A) -> R,
}

impl<A, R> Traced<A, R> {
    pub const fn new(name: &'static str, body: fn(&Frame<'_>, A) -> R) -> Self {
        Self { name, body }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// One direct call made by an activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChildEdge {
    pub child: ActivationId,
    pub call_order: u64,
    /// Set when the child completes; stays `None` if it failed.
    pub return_order: Option<u64>,
}

/// One invocation of a traced function.
#[derive(Debug, Clone, PartialEq)]
pub struct Activation {
    pub id: ActivationId,
    pub parent: Option<ActivationId>,
    pub function_name: &'static str,
    pub arguments: CapturedArguments,
    /// `None` while running, and forever if the call did not complete.
    pub return_value: Option<Value>,
    pub children: Vec<ChildEdge>,
    /// Annotations in first-insertion order; re-inserting a key replaces its value.
    pub auxiliary_data: Vec<(CompactString, Value)>,
}

impl Activation {
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    pub fn has_returned(&self) -> bool {
        self.return_value.is_some()
    }

    fn merge_auxiliary(&mut self, key: CompactString, value: Value) {
        match self.auxiliary_data.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = value,
            None => self.auxiliary_data.push((key, value)),
        }
    }
}

struct TraceGraph {
    run: RunId,
    activations: BTreeMap<ActivationId, Activation>,
    next_activation: u64,
    call_counter: u64,
    unwind_counter: u64,
}

impl TraceGraph {
    fn new(run: RunId) -> Self {
        Self {
            run,
            activations: BTreeMap::new(),
            next_activation: 1,
            call_counter: FIRST_ORDER,
            unwind_counter: FIRST_ORDER,
        }
    }

    fn allocate_id(&mut self) -> ActivationId {
        let raw = self.next_activation;
        self.next_activation += 1;
        ActivationId::new(raw)
            .expect("activation id invariant violated: ids are allocated from 1 upward")
    }
}

/// Where a child's edge lives in its caller's `children` list.
#[derive(Clone, Copy)]
struct EdgeSlot {
    caller: ActivationId,
    index: usize,
}

/// The trace context of one run: every activation, their edges, and the
/// call/unwind counters.
///
/// A graph is filled by one top-level [`CallGraph::trace`] and must be
/// [`reset`](CallGraph::reset) before the next one. Traced calls from
/// several threads at once are not supported.
pub struct CallGraph {
    state: Mutex<TraceGraph>,
}

impl Default for CallGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl CallGraph {
    pub fn new() -> Self {
        let run = RunId::new(1).expect("run id invariant violated: first run is 1");
        Self {
            state: Mutex::new(TraceGraph::new(run)),
        }
    }

    /// Drops every activation and restores both counters.
    ///
    /// Frames created before the reset stop resolving: their annotations
    /// fail with [`TraceError::StaleFrame`] and their completions are ignored.
    pub fn reset(&self) {
        self.begin_run();
    }

    /// Resets the graph and returns the id of the fresh run.
    pub fn begin_run(&self) -> RunId {
        let mut state = self.state.lock();
        let dropped = state.activations.len();
        let run = state
            .run
            .next()
            .expect("run id invariant violated: run counter exhausted");
        *state = TraceGraph::new(run);
        debug!(%run, dropped, "call graph reset");
        run
    }

    /// Runs `traced` as a root activation.
    pub fn trace<A, R>(&self, traced: &Traced<A, R>, args: A) -> R
    where
        A: Arguments,
        R: Outcome,
    {
        self.invoke(None, traced, args)
    }

    fn invoke<A, R>(&self, caller: Option<&Frame<'_>>, traced: &Traced<A, R>, args: A) -> R
    where
        A: Arguments,
        R: Outcome,
    {
        let arguments = args.capture_arguments();

        let (frame, edge) = {
            let mut state = self.state.lock();
            let run = state.run;

            if let Some(stale) = caller.filter(|frame| frame.run != run) {
                warn!(
                    caller = %stale.id,
                    caller_run = %stale.run,
                    %run,
                    function = traced.name,
                    "call through a frame of an earlier run is not recorded"
                );
                drop(state);
                let detached = Frame {
                    graph: self,
                    run: stale.run,
                    id: stale.id,
                    parent: stale.parent,
                    depth: stale.depth + 1,
                    function_name: traced.name,
                };
                return (traced.body)(&detached, args);
            }

            let id = state.allocate_id();
            let caller_id = caller.map(|frame| frame.id);

            state.activations.insert(
                id,
                Activation {
                    id,
                    parent: caller_id,
                    function_name: traced.name,
                    arguments,
                    return_value: None,
                    children: Vec::new(),
                    auxiliary_data: Vec::new(),
                },
            );

            let edge = caller_id.and_then(|caller_id| {
                let call_order = state.call_counter;
                let index = {
                    let caller_node = state.activations.get_mut(&caller_id)?;
                    caller_node.children.push(ChildEdge {
                        child: id,
                        call_order,
                        return_order: None,
                    });
                    caller_node.children.len() - 1
                };
                state.call_counter += 1;
                trace!(activation = %id, caller = %caller_id, call_order, function = traced.name, "call");
                Some(EdgeSlot {
                    caller: caller_id,
                    index,
                })
            });
            if edge.is_none() {
                trace!(activation = %id, function = traced.name, "root call");
            }

            let frame = Frame {
                graph: self,
                run,
                id,
                parent: caller_id,
                depth: caller.map_or(0, |frame| frame.depth + 1),
                function_name: traced.name,
            };
            (frame, edge)
        };

        let result = (traced.body)(&frame, args);

        if let Some(return_value) = result.return_value() {
            self.complete(&frame, edge, return_value);
        } else {
            trace!(activation = %frame.id, function = frame.function_name, "call did not complete");
        }
        result
    }

    fn complete(&self, frame: &Frame<'_>, edge: Option<EdgeSlot>, return_value: Value) {
        let mut state = self.state.lock();
        if state.run != frame.run {
            trace!(activation = %frame.id, frame_run = %frame.run, "completion after reset ignored");
            return;
        }

        if let Some(slot) = edge {
            let return_order = state.unwind_counter;
            let resolved = match state
                .activations
                .get_mut(&slot.caller)
                .and_then(|caller| caller.children.get_mut(slot.index))
            {
                Some(child_edge) => {
                    child_edge.return_order = Some(return_order);
                    true
                }
                None => false,
            };
            if resolved {
                state.unwind_counter += 1;
                trace!(activation = %frame.id, return_order, "unwind");
            }
        }

        if let Some(activation) = state.activations.get_mut(&frame.id) {
            activation.return_value = Some(return_value);
        }
    }

    fn annotate(
        &self,
        frame: &Frame<'_>,
        pairs: Vec<(CompactString, Value)>,
    ) -> Result<(), TraceError> {
        let mut state = self.state.lock();
        if state.run != frame.run {
            return Err(TraceError::StaleFrame {
                activation: frame.id,
                frame_run: frame.run,
                current_run: state.run,
            });
        }
        if let Some(activation) = state.activations.get_mut(&frame.id) {
            for (key, value) in pairs {
                activation.merge_auxiliary(key, value);
            }
        }
        Ok(())
    }

    pub fn run(&self) -> RunId {
        self.state.lock().run
    }

    pub fn len(&self) -> usize {
        self.state.lock().activations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().activations.is_empty()
    }

    /// The next call order to be handed out.
    pub fn call_counter(&self) -> u64 {
        self.state.lock().call_counter
    }

    /// The next return order to be handed out.
    pub fn unwind_counter(&self) -> u64 {
        self.state.lock().unwind_counter
    }

    pub fn activation(&self, id: ActivationId) -> Option<Activation> {
        self.state.lock().activations.get(&id).cloned()
    }

    /// All activations, in creation order.
    pub fn activations(&self) -> Vec<Activation> {
        self.state.lock().activations.values().cloned().collect()
    }

    pub fn roots(&self) -> Vec<ActivationId> {
        self.state
            .lock()
            .activations
            .values()
            .filter(|activation| activation.is_root())
            .map(|activation| activation.id)
            .collect()
    }

    /// Copies the graph into its exported form.
    pub fn snapshot(&self) -> GraphSnapshot {
        let state = self.state.lock();
        let mut nodes = Vec::with_capacity(state.activations.len());
        let mut edges = Vec::new();
        for activation in state.activations.values() {
            nodes.push(NodeRecord {
                id: activation.id,
                function: activation.function_name.to_owned(),
                arguments: activation.arguments.render(),
                auxiliary: activation
                    .auxiliary_data
                    .iter()
                    .map(|(key, value)| AuxRecord {
                        key: key.to_string(),
                        value: value.to_string(),
                    })
                    .collect(),
                return_value: activation.return_value.as_ref().map(Value::to_string),
            });
            edges.extend(activation.children.iter().map(|edge| EdgeRecord {
                src: activation.id,
                dst: edge.child,
                call_order: edge.call_order,
                return_order: edge.return_order,
            }));
        }
        GraphSnapshot {
            run: state.run,
            nodes,
            edges,
        }
    }
}

/// The live activation a traced body runs in.
pub struct Frame<'g> {
    graph: &'g CallGraph,
    run: RunId,
    id: ActivationId,
    parent: Option<ActivationId>,
    depth: usize,
    function_name: &'static str,
}

impl<'g> Frame<'g> {
    /// Calls `traced` as a child of this activation.
    ///
    /// If the graph was reset after this frame was created, `traced` still
    /// runs and its result is returned, but neither it nor anything it calls
    /// is recorded, and its own [`Frame::track`] calls fail with
    /// [`TraceError::StaleFrame`]. Such a detached frame reports the identity
    /// of the stale caller.
    pub fn call<A, R>(&self, traced: &Traced<A, R>, args: A) -> R
    where
        A: Arguments,
        R: Outcome,
    {
        self.graph.invoke(Some(self), traced, args)
    }

    /// Attaches annotations to this activation's node, replacing values of
    /// keys that are already present.
    ///
    /// Values are copied; later changes to the originals do not show up.
    pub fn track<K, V, I>(&self, pairs: I) -> Result<(), TraceError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<CompactString>,
        V: Capture,
    {
        let pairs = pairs
            .into_iter()
            .map(|(key, value)| (key.into(), value.capture()))
            .collect();
        self.graph.annotate(self, pairs)
    }

    pub fn id(&self) -> ActivationId {
        self.id
    }

    pub fn parent(&self) -> Option<ActivationId> {
        self.parent
    }

    pub fn run(&self) -> RunId {
        self.run
    }

    /// Number of traced callers above this activation.
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn function_name(&self) -> &'static str {
        self.function_name
    }

    pub fn graph(&self) -> &'g CallGraph {
        self.graph
    }
}
