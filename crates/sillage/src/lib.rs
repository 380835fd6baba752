//! Tracing for recursive and tabulated computations.
//!
//! Sillage records how an algorithm unfolded so it can be looked at afterwards.
//! A recursive function run under a [`CallGraph`] leaves behind one node per
//! activation, linked to its caller by an edge stamped with the order the call
//! was made in and the order it returned in. A tabulated function run under a
//! [`SnapshotRecorder`] leaves behind every distinct state of its working table.
//!
//! # Using this crate
//!
//! Declare traced functions as statics and route recursive calls through the
//! [`Frame`] each activation receives:
//!
//! ```rust
//! use sillage::{CallGraph, Frame, GraphDescription, RenderOptions, Traced};
//!
//! static FIB: Traced<u64, u64> = Traced::new("fib", fib);
//!
//! fn fib(cx: &Frame<'_>, n: u64) -> u64 {
//!     if n < 2 { n } else { cx.call(&FIB, n - 1) + cx.call(&FIB, n - 2) }
//! }
//!
//! let graph = CallGraph::new();
//! assert_eq!(graph.trace(&FIB, 3), 2);
//!
//! let description = GraphDescription::from_snapshot(&graph.snapshot(), &RenderOptions::default());
//! assert!(description.as_str().contains("fib(3)"));
//! ```
//!
//! Tabulated functions report their table through a [`Probe`]:
//!
//! ```rust
//! use sillage::{Probe, SnapshotRecorder, Tabulated};
//!
//! static FIB_ITER: Tabulated<usize, Vec<u64>, u64> = Tabulated::new("fib_iter", fib_iter);
//!
//! fn fib_iter(probe: &Probe<'_, Vec<u64>>, n: usize) -> u64 {
//!     let mut dp_table = vec![0, 1];
//!     dp_table.resize(n + 1, 0);
//!     probe.observe(&dp_table);
//!     for i in 2..=n {
//!         dp_table[i] = dp_table[i - 1] + dp_table[i - 2];
//!         probe.observe(&dp_table);
//!     }
//!     dp_table[n]
//! }
//!
//! let recorder = SnapshotRecorder::new("dp_table");
//! assert_eq!(recorder.run(&FIB_ITER, 4), 3);
//! assert_eq!(recorder.len(), 4);
//! ```
//!
//! Rendering to an image goes through [`render_call_graph`] with a
//! [`GraphRenderer`]; [`GraphvizRenderer`] runs Graphviz `dot` (override the
//! executable with `SILLAGE_DOT`).
//!
//! # Crates
//!
//! | Crate | Contents |
//! |-------|----------|
//! | `sillage-types` | Activation ids, captured values, export records |
//! | `sillage-runtime` | [`CallGraph`] and [`SnapshotRecorder`] |
//! | `sillage-render` | DOT descriptions, renderers, table text |

pub use sillage_render::{
    DOT_ENV, GraphDescription, GraphRenderer, GraphvizRenderer, ImageFormat, RenderError,
    RenderOptions, TableCell, TableText, render_call_graph,
};
pub use sillage_runtime::{
    Activation, CallGraph, ChildEdge, Dedup, Frame, Probe, SnapshotRecorder, SnapshotSequence,
    Tabulated, TraceError, Traced,
};
pub use sillage_types::{
    ActivationId, Argument, Arguments, AuxRecord, Capture, CapturedArguments, EdgeRecord,
    GraphSnapshot, InvariantError, Kw, NodeRecord, Outcome, RunId, Value,
};
