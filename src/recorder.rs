use log::{debug, trace};

use crate::clock::{elapsed_ms, ms_to_secs};
use crate::session::ZeroPoint;

/// One recorded mark: seconds since the session zero and the rotation count
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Entry {
    pub elapsed_secs: f64,
    pub index: usize,
}

impl Entry {
    pub fn new(elapsed_secs: f64, index: usize) -> Self {
        Self {
            elapsed_secs,
            index,
        }
    }
}

impl From<Entry> for (f64, usize) {
    fn from(e: Entry) -> Self {
        (e.elapsed_secs, e.index)
    }
}

/// Ordered log of marks for the current session
#[derive(Debug)]
pub struct EventRecorder {
    session: ZeroPoint,
    entries: Vec<Entry>,
}

impl EventRecorder {
    pub fn new(session: ZeroPoint) -> Self {
        Self {
            session,
            entries: Vec::new(),
        }
    }

    pub fn reset(&mut self) {
        self.entries.clear();
    }

    /// Records a mark taken at `now_ms`.
    ///
    /// Ignored while the session is idle. The first mark of a session moves the
    /// session zero to `now_ms`, so it always reads 0.0 and every later mark is
    /// measured from it rather than from the start command.
    pub fn record(&mut self, now_ms: u64) -> Option<Entry> {
        if !self.session.is_running() {
            trace!("mark at {now_ms} ms ignored, session idle");
            return None;
        }

        if self.entries.is_empty() {
            debug!("first mark, zero moved to {now_ms} ms");
            self.session.rezero(now_ms);
        }

        let entry = Entry::new(
            ms_to_secs(elapsed_ms(self.session.zero_ms(), now_ms)),
            self.entries.len(),
        );
        trace!("mark #{} at {} s", entry.index, entry.elapsed_secs);
        self.entries.push(entry);
        Some(entry)
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
