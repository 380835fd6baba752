//! Recorders that reconstruct how a computation unfolded.
//!
//! - [`CallGraph`] records every activation of [`Traced`] functions: who
//!   called whom, in which order calls were made, in which order they
//!   completed, with which arguments, and what they returned.
//! - [`SnapshotRecorder`] records the successive states of a working table
//!   that a tabulated algorithm reports through a [`Probe`].
//!
//! Neither recorder touches the traced logic: results and errors pass through
//! unchanged, and a failure part-way leaves everything recorded so far in
//! place for inspection.

use std::error::Error;
use std::fmt;

use sillage_types::{ActivationId, RunId};

mod call_graph;
mod snapshot;

pub use call_graph::{Activation, CallGraph, ChildEdge, Frame, Traced};
pub use snapshot::{Dedup, Probe, SnapshotRecorder, SnapshotSequence, Tabulated};

/// Tracing precondition violations.
///
/// These never originate from traced code; they mean a recorder API was used
/// against a graph state it does not belong to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraceError {
    /// The frame was created before the graph was last reset.
    StaleFrame {
        activation: ActivationId,
        frame_run: RunId,
        current_run: RunId,
    },
}

impl fmt::Display for TraceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StaleFrame {
                activation,
                frame_run,
                current_run,
            } => write!(
                f,
                "activation {activation} belongs to run {frame_run}, but the call graph is on run {current_run}"
            ),
        }
    }
}

impl Error for TraceError {}
