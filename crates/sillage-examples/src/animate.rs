use sillage::{SnapshotSequence, TableText};
use std::io::{self, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::debug;

const FRAME_DELAY: Duration = Duration::from_millis(500);
const FINAL_HOLD: Duration = Duration::from_millis(1500);
const LONG_SEQUENCE: usize = 20;
/// Whole-loop budget once a sequence is longer than [`LONG_SEQUENCE`].
const LONG_LOOP: Duration = Duration::from_secs(10);
const POLL: Duration = Duration::from_millis(50);

/// How long each non-final frame stays up.
pub fn frame_delay(frames: usize) -> Duration {
    if frames > LONG_SEQUENCE {
        LONG_LOOP / frames as u32
    } else {
        FRAME_DELAY
    }
}

/// Lines of terminal output owned by the animation, redrawn in place.
#[derive(Debug, Default)]
pub struct Region {
    lines: usize,
}

impl Region {
    pub fn draw(&mut self, out: &mut impl Write, text: &str) -> io::Result<()> {
        self.erase(out)?;
        writeln!(out, "{text}")?;
        self.lines = text.lines().count().max(1);
        out.flush()
    }

    pub fn clear(&mut self, out: &mut impl Write) -> io::Result<()> {
        self.erase(out)?;
        out.flush()
    }

    fn erase(&mut self, out: &mut impl Write) -> io::Result<()> {
        if self.lines > 0 {
            // Cursor up to the first owned line, then clear to end of screen.
            write!(out, "\x1b[{}A\x1b[J", self.lines)?;
            self.lines = 0;
        }
        Ok(())
    }
}

/// A worker thread looping over a snapshot sequence.
pub struct Animation {
    stop: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

impl Animation {
    /// Starts looping over `sequence`. With `max_frames`, the worker ends on
    /// its own after that many frames and leaves the last one on screen.
    pub fn spawn<T>(sequence: SnapshotSequence<T>, title: String, max_frames: Option<u32>) -> Self
    where
        T: TableText + Clone + Send + Sync + 'static,
    {
        let stop = Arc::new(AtomicBool::new(false));
        let worker_stop = Arc::clone(&stop);
        let handle = thread::spawn(move || {
            let mut stdout = io::stdout();
            if let Err(err) = run_loop(&sequence, &title, max_frames, &worker_stop, &mut stdout) {
                debug!(%err, "animation output failed");
            }
        });
        Self { stop, handle }
    }

    /// Blocks until the worker ends on its own.
    pub fn wait(self) {
        let _ = self.handle.join();
    }

    /// Signals the worker and waits for it to erase its output.
    pub fn stop(self) {
        self.stop.store(true, Ordering::Release);
        let _ = self.handle.join();
    }
}

fn run_loop<T: TableText + Clone>(
    sequence: &SnapshotSequence<T>,
    title: &str,
    max_frames: Option<u32>,
    stop: &AtomicBool,
    out: &mut impl Write,
) -> io::Result<()> {
    if max_frames == Some(0) {
        return Ok(());
    }
    let mut region = Region::default();
    let mut index = 0;
    let mut shown = 0u32;
    while !stop.load(Ordering::Acquire) {
        let frames = sequence.len();
        if frames == 0 {
            break;
        }
        index %= frames;
        let Some(table) = sequence.get(index) else {
            break;
        };
        region.draw(
            out,
            &format!("{title} [{}/{frames}]\n{}", index + 1, table.table_text()),
        )?;

        shown += 1;
        if max_frames.is_some_and(|max| shown >= max) {
            return Ok(());
        }
        let delay = if index + 1 == frames {
            FINAL_HOLD
        } else {
            frame_delay(frames)
        };
        if sleep_unless_stopped(stop, delay) {
            break;
        }
        index += 1;
    }
    region.clear(out)
}

/// Returns whether the stop flag was raised during the sleep.
fn sleep_unless_stopped(stop: &AtomicBool, total: Duration) -> bool {
    let deadline = Instant::now() + total;
    loop {
        if stop.load(Ordering::Acquire) {
            return true;
        }
        let now = Instant::now();
        if now >= deadline {
            return false;
        }
        thread::sleep(POLL.min(deadline - now));
    }
}
