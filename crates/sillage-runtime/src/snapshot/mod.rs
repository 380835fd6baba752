use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, trace};


/// When an observation becomes a new snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Dedup {
    /// Skip an observation equal to the last stored snapshot.
    #[default]
    Structural,
    /// Store every observation.
    Never,
}

/// Read handle on a recorder's snapshots.
///
/// Clones share storage with the recorder, so a display worker can poll the
/// sequence while the producing call is still running. Stored snapshots are
/// never mutated after they are appended.
pub struct SnapshotSequence<T> {
    inner: Arc<RwLock<Vec<T>>>,
}

impl<T> Clone for SnapshotSequence<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> SnapshotSequence<T> {
    fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }
}

impl<T: Clone> SnapshotSequence<T> {
    pub fn get(&self, index: usize) -> Option<T> {
        self.inner.read().get(index).cloned()
    }

    pub fn last(&self) -> Option<T> {
        self.inner.read().last().cloned()
    }

    pub fn to_vec(&self) -> Vec<T> {
        self.inner.read().clone()
    }
}

/// A named tabulated function that reports its working table through a
/// [`Probe`].
pub struct Tabulated<A, T, R> {
    name: &'static str,
    body: fn(&Probe<'_, T>, A) -> R,
}

impl<A, T, R> Tabulated<A, T, R> {
    pub const fn new(name: &'static str, body: fn(&Probe<'_, T>, A) -> R) -> Self {
        Self { name, body }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// Records the successive states of one working table.
///
/// Every [`call`](Self::call) starts a fresh sequence. The body gets a
/// [`Probe`] and reports the table through it each time the table changes;
/// the probe only lives as long as the call, so nothing can be observed
/// once the body has returned or unwound.
///
/// ```
/// use sillage_runtime::SnapshotRecorder;
///
/// let recorder = SnapshotRecorder::<Vec<u32>>::new("dp_table");
/// let total = recorder.call(3u32, |probe, n| {
///     let mut dp_table = vec![0; n as usize];
///     probe.observe(&dp_table);
///     for i in 0..dp_table.len() {
///         dp_table[i] = i as u32 * 2;
///         probe.observe(&dp_table);
///     }
///     dp_table.iter().sum::<u32>()
/// });
/// assert_eq!(total, 6);
/// // Writing 0 into cell 0 leaves the table unchanged, so it is not stored.
/// assert_eq!(
///     recorder.snapshots(),
///     vec![vec![0, 0, 0], vec![0, 2, 0], vec![0, 2, 4]]
/// );
/// ```
pub struct SnapshotRecorder<T> {
    watched: &'static str,
    dedup: Dedup,
    sequence: SnapshotSequence<T>,
}

impl<T: Clone + PartialEq> SnapshotRecorder<T> {
    pub fn new(watched: &'static str) -> Self {
        Self {
            watched,
            dedup: Dedup::default(),
            sequence: SnapshotSequence::new(),
        }
    }

    pub fn with_dedup(mut self, dedup: Dedup) -> Self {
        self.dedup = dedup;
        self
    }

    /// Name of the table being recorded, used for display.
    pub fn watched(&self) -> &'static str {
        self.watched
    }

    pub fn dedup(&self) -> Dedup {
        self.dedup
    }

    /// Clears the sequence, then runs `body` with a probe bound to it.
    ///
    /// The body's result, including any error it returns, is handed back
    /// unchanged. A panic leaves the snapshots taken so far in place.
    pub fn call<A, R>(&self, args: A, body: impl FnOnce(&Probe<'_, T>, A) -> R) -> R {
        self.clear();
        let probe = Probe { recorder: self };
        let result = body(&probe, args);
        debug!(
            watched = self.watched,
            snapshots = self.sequence.len(),
            "tabulation finished"
        );
        result
    }

    /// Runs a [`Tabulated`] function through [`call`](Self::call).
    pub fn run<A, R>(&self, tabulated: &Tabulated<A, T, R>, args: A) -> R {
        trace!(function = tabulated.name, watched = self.watched, "tabulation");
        self.call(args, tabulated.body)
    }

    pub fn snapshots(&self) -> Vec<T> {
        self.sequence.to_vec()
    }

    /// A shared read handle that follows future calls too.
    pub fn sequence(&self) -> SnapshotSequence<T> {
        self.sequence.clone()
    }

    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    pub fn clear(&self) {
        self.sequence.inner.write().clear();
    }

    fn record(&self, value: &T) -> bool {
        let mut snapshots = self.sequence.inner.write();
        if self.dedup == Dedup::Structural && snapshots.last() == Some(value) {
            return false;
        }
        snapshots.push(value.clone());
        trace!(watched = self.watched, index = snapshots.len() - 1, "snapshot");
        true
    }
}

/// Reporting handle given to a tabulated body for the duration of one call.
pub struct Probe<'r, T> {
    recorder: &'r SnapshotRecorder<T>,
}

impl<T: Clone + PartialEq> Probe<'_, T> {
    /// Stores a copy of `value` unless the dedup rule rejects it. Returns
    /// whether a snapshot was stored.
    pub fn observe(&self, value: &T) -> bool {
        self.recorder.record(value)
    }

    pub fn watched(&self) -> &'static str {
        self.recorder.watched
    }
}
