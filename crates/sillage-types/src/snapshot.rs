use facet::Facet;

use crate::{ActivationId, RunId};

/// One user-supplied annotation on a node.
#[derive(Facet, Debug, Clone, PartialEq)]
pub struct AuxRecord {
    pub key: String,
    pub value: String,
}

/// Exported form of one activation.
#[derive(Facet, Debug, Clone, PartialEq)]
pub struct NodeRecord {
    /// Activation identity, unique within the run.
    pub id: ActivationId,

    /// Display name of the traced function.
    pub function: String,

    /// Rendered argument list, e.g. `3` or `[3, 1],inf`.
    pub arguments: String,

    /// Annotations attached by the function while it ran, in insertion order.
    pub auxiliary: Vec<AuxRecord>,

    /// Rendered return value; `None` when the call never completed.
    pub return_value: Option<String>,
}

/// Exported form of one caller -> callee edge.
#[derive(Facet, Debug, Clone, PartialEq)]
pub struct EdgeRecord {
    pub src: ActivationId,
    pub dst: ActivationId,

    /// Position of this call in the run's call sequence (1-based).
    pub call_order: u64,

    /// Position of the callee's completion in the run's unwind sequence.
    /// `None` while the callee is running, or when it failed.
    pub return_order: Option<u64>,
}

/// A point-in-time copy of a whole call graph.
#[derive(Facet, Debug, Clone, PartialEq)]
pub struct GraphSnapshot {
    pub run: RunId,
    pub nodes: Vec<NodeRecord>,
    pub edges: Vec<EdgeRecord>,
}

impl GraphSnapshot {
    /// Activations that no edge points at.
    pub fn roots(&self) -> impl Iterator<Item = &NodeRecord> + '_ {
        self.nodes
            .iter()
            .filter(|node| !self.edges.iter().any(|edge| edge.dst == node.id))
    }

    pub fn node(&self, id: ActivationId) -> Option<&NodeRecord> {
        self.nodes.iter().find(|node| node.id == id)
    }

    /// Outgoing edges of `id`, in call order.
    pub fn children(&self, id: ActivationId) -> impl Iterator<Item = &EdgeRecord> + '_ {
        self.edges.iter().filter(move |edge| edge.src == id)
    }
}
