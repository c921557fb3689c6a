use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

use crossterm::event::{self, Event as CtEvent, KeyEvent};

// Upper bound on a single blocking wait while no tick is armed
const IDLE_WAIT: Duration = Duration::from_millis(500);

/// Unified event type consumed by the app runner
#[derive(Clone, Debug)]
pub enum TachoEvent {
    Key(KeyEvent),
    Resize,
    Tick,
    /// The event source hung up; nothing more will arrive
    Closed,
}

/// Source of terminal events (keyboard, resize, etc.)
pub trait TachoEventSource: Send + 'static {
    /// Block for up to `timeout` waiting for an event.
    /// Returns Ok(event) if an event arrives before the timeout, or Err(Timeout) if it expires.
    fn recv_timeout(&self, timeout: Duration) -> Result<TachoEvent, RecvTimeoutError>;
}

/// Production event source using crossterm
pub struct CrosstermEventSource {
    rx: Receiver<TachoEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();

        std::thread::spawn(move || loop {
            match event::read() {
                Ok(CtEvent::Key(key)) => {
                    if tx.send(TachoEvent::Key(key)).is_err() {
                        break;
                    }
                }
                Ok(CtEvent::Resize(_, _)) => {
                    if tx.send(TachoEvent::Resize).is_err() {
                        break;
                    }
                }
                Ok(_) => {}
                Err(_) => break,
            }
        });

        Self { rx }
    }
}

impl Default for CrosstermEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TachoEventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<TachoEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Configurable ticker interface
pub trait Ticker: Send + Sync + 'static {
    fn interval(&self) -> Duration;
}

/// Fixed interval ticker
#[derive(Clone, Copy, Debug)]
pub struct FixedTicker {
    interval: Duration,
}

impl FixedTicker {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Ticker for FixedTicker {
    fn interval(&self) -> Duration {
        self.interval
    }
}

/// Test event source for unit tests
pub struct TestEventSource {
    rx: Receiver<TachoEvent>,
}

impl TestEventSource {
    pub fn new(rx: Receiver<TachoEvent>) -> Self {
        Self { rx }
    }
}

impl TachoEventSource for TestEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<TachoEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Cancellable periodic schedule for the elapsed-time display.
///
/// Armed when a session starts and cancelled when it stops. While cancelled
/// it never reports a due tick.
#[derive(Clone, Copy, Debug)]
pub struct TickSchedule {
    interval: Duration,
    next_due: Option<Instant>,
}

impl TickSchedule {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_due: None,
        }
    }

    pub fn arm(&mut self, now: Instant) {
        self.next_due = Some(now + self.interval);
    }

    pub fn cancel(&mut self) {
        self.next_due = None;
    }

    pub fn is_armed(&self) -> bool {
        self.next_due.is_some()
    }

    /// Time left until the next tick, or None while cancelled
    pub fn due_in(&self, now: Instant) -> Option<Duration> {
        self.next_due.map(|due| due.saturating_duration_since(now))
    }

    /// Consumes the pending tick if it is due. A deadline missed by more than
    /// one interval restarts from `now` instead of firing a burst.
    pub fn fire(&mut self, now: Instant) -> bool {
        match self.next_due {
            Some(due) if due <= now => {
                let next = due + self.interval;
                self.next_due = Some(if next <= now { now + self.interval } else { next });
                true
            }
            _ => false,
        }
    }
}

/// Runner that advances the application one event/tick at a time
pub struct Runner<E: TachoEventSource, T: Ticker> {
    event_source: E,
    ticker: T,
    schedule: TickSchedule,
}

impl<E: TachoEventSource, T: Ticker> Runner<E, T> {
    pub fn new(event_source: E, ticker: T) -> Self {
        let schedule = TickSchedule::new(ticker.interval());
        Self {
            event_source,
            ticker,
            schedule,
        }
    }

    pub fn start_ticking(&mut self) {
        self.schedule = TickSchedule::new(self.ticker.interval());
        self.schedule.arm(Instant::now());
    }

    pub fn stop_ticking(&mut self) {
        self.schedule.cancel();
    }

    pub fn is_ticking(&self) -> bool {
        self.schedule.is_armed()
    }

    /// Blocks until the next event, or until the armed tick falls due.
    /// Never yields Tick while ticking is stopped.
    pub fn step(&mut self) -> TachoEvent {
        loop {
            let now = Instant::now();
            if self.schedule.fire(now) {
                return TachoEvent::Tick;
            }
            let wait = self.schedule.due_in(now).unwrap_or(IDLE_WAIT);
            match self.event_source.recv_timeout(wait) {
                Ok(ev) => return ev,
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => return TachoEvent::Closed,
            }
        }
    }
}
