use std::cell::Cell;
use std::rc::Rc;

use log::debug;

use crate::clock::{elapsed_ms, ms_to_secs, Clock};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionStatus {
    #[default]
    Idle,
    Running,
}

#[derive(Debug, Default)]
struct SessionCell {
    status: Cell<SessionStatus>,
    zero_ms: Cell<u64>,
}

/// Handle onto the live session's status and zero point.
///
/// The controller and the recorder hold clones of the same handle, so there is
/// exactly one stored zero time. Only the recorder rewrites it, and only for
/// the first mark of a session.
#[derive(Debug, Clone, Default)]
pub struct ZeroPoint {
    cell: Rc<SessionCell>,
}

impl ZeroPoint {
    pub fn is_running(&self) -> bool {
        self.cell.status.get() == SessionStatus::Running
    }

    pub fn zero_ms(&self) -> u64 {
        self.cell.zero_ms.get()
    }

    /// Moves the session's zero to `now_ms`
    pub fn rezero(&self, now_ms: u64) {
        self.cell.zero_ms.set(now_ms);
    }
}

/// Idle/Running state machine plus the elapsed-time reference point
#[derive(Debug)]
pub struct SessionController<C: Clock> {
    clock: C,
    session: ZeroPoint,
}

impl<C: Clock> SessionController<C> {
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            session: ZeroPoint::default(),
        }
    }

    /// Capability for rewriting this session's zero time
    pub fn zero_point(&self) -> ZeroPoint {
        self.session.clone()
    }

    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    /// Arms a new session. Returns false (and changes nothing) if one is already running.
    pub fn start(&mut self) -> bool {
        if self.is_running() {
            return false;
        }
        let now = self.now_ms();
        self.session.cell.zero_ms.set(now);
        self.session.cell.status.set(SessionStatus::Running);
        debug!("session started, zero at {now} ms");
        true
    }

    /// Ends the running session. Returns false if already idle.
    pub fn stop(&mut self) -> bool {
        if !self.is_running() {
            return false;
        }
        self.session.cell.status.set(SessionStatus::Idle);
        debug!("session stopped after {:.3} s", self.elapsed());
        true
    }

    pub fn status(&self) -> SessionStatus {
        self.session.cell.status.get()
    }

    pub fn is_running(&self) -> bool {
        self.session.is_running()
    }

    pub fn zero_ms(&self) -> u64 {
        self.session.zero_ms()
    }

    /// Seconds since the zero point.
    ///
    /// Only meaningful while running; once idle the value keeps growing from a
    /// stale zero and should not be shown.
    pub fn elapsed(&self) -> f64 {
        ms_to_secs(elapsed_ms(self.zero_ms(), self.now_ms()))
    }
}
