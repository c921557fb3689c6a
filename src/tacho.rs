use crate::clock::Clock;
use crate::recorder::{Entry, EventRecorder};
use crate::session::{SessionController, SessionStatus};

/// A tachometer run: one session controller and the marks recorded against it.
///
/// The presentation layer owns one of these and forwards start, stop and mark
/// signals to it in arrival order.
#[derive(Debug)]
pub struct Tachometer<C: Clock> {
    controller: SessionController<C>,
    recorder: EventRecorder,
}

impl<C: Clock> Tachometer<C> {
    pub fn new(clock: C) -> Self {
        let controller = SessionController::new(clock);
        let recorder = EventRecorder::new(controller.zero_point());
        Self {
            controller,
            recorder,
        }
    }

    /// Begins a session and clears the previous one's entries.
    /// Returns false if a session was already running.
    pub fn start(&mut self) -> bool {
        if !self.controller.start() {
            return false;
        }
        self.recorder.reset();
        true
    }

    /// Ends the running session, keeping its entries. Returns false if idle.
    pub fn stop(&mut self) -> bool {
        self.controller.stop()
    }

    /// Records a mark at the current clock reading
    pub fn on_mark(&mut self) -> Option<Entry> {
        let now = self.controller.now_ms();
        self.record(now)
    }

    /// Records a mark at an explicit timestamp
    pub fn record(&mut self, now_ms: u64) -> Option<Entry> {
        self.recorder.record(now_ms)
    }

    pub fn is_running(&self) -> bool {
        self.controller.is_running()
    }

    pub fn status(&self) -> SessionStatus {
        self.controller.status()
    }

    /// See [`SessionController::elapsed`]; meaningless while idle.
    pub fn elapsed(&self) -> f64 {
        self.controller.elapsed()
    }

    pub fn entries(&self) -> &[Entry] {
        self.recorder.entries()
    }

    pub fn controller(&self) -> &SessionController<C> {
        &self.controller
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    #[test]
    fn start_clears_previous_entries() {
        let clock = ManualClock::new(0);
        let mut tacho = Tachometer::new(clock.clone());
        tacho.start();
        for t in [100, 200, 300] {
            tacho.record(t);
        }
        tacho.stop();
        assert_eq!(tacho.entries().len(), 3);

        assert!(tacho.start());
        assert!(tacho.entries().is_empty());
    }

    #[test]
    fn double_start_keeps_entries() {
        let mut tacho = Tachometer::new(ManualClock::new(0));
        tacho.start();
        tacho.record(50);
        assert!(!tacho.start());
        assert_eq!(tacho.entries().len(), 1);
    }

    #[test]
    fn on_mark_reads_the_clock() {
        let clock = ManualClock::new(0);
        let mut tacho = Tachometer::new(clock.clone());
        tacho.start();
        clock.set(700);
        assert_eq!(tacho.on_mark(), Some(Entry::new(0.0, 0)));
        clock.set(1_950);
        assert_eq!(tacho.on_mark(), Some(Entry::new(1.25, 1)));
    }

    #[test]
    fn elapsed_and_marks_share_the_zero() {
        let clock = ManualClock::new(0);
        let mut tacho = Tachometer::new(clock.clone());
        tacho.start();
        clock.set(3_000);
        tacho.on_mark();
        clock.set(3_600);
        let elapsed = tacho.elapsed();
        let mark = tacho.on_mark().map(|e| e.elapsed_secs);
        assert_eq!(Some(elapsed), mark);
    }

    #[test]
    fn marks_after_stop_are_ignored() {
        let clock = ManualClock::new(0);
        let mut tacho = Tachometer::new(clock.clone());
        tacho.start();
        tacho.record(10);
        tacho.stop();
        assert_eq!(tacho.record(20), None);
        assert_eq!(tacho.entries(), &[Entry::new(0.0, 0)]);
        assert_eq!(tacho.status(), SessionStatus::Idle);
    }
}
