use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Time source seam so the debounce window is testable without real delays.
pub trait Clock: std::fmt::Debug + Send + Sync {
    fn now(&self) -> Instant;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Hand-driven clock for tests and demos.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<Instant>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Mutex::new(Instant::now()),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut guard = self.now.lock().expect("manual clock mutex poisoned");
        *guard += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock().expect("manual clock mutex poisoned")
    }
}

/// Trailing-edge debounce: every edit re-arms the deadline, and the pass
/// fires exactly once after the last edit of a burst. Commit-style edits
/// bypass this entirely via [`DebounceScheduler::cancel`].
#[derive(Debug)]
pub struct DebounceScheduler {
    clock: Arc<dyn Clock>,
    quiet_window: Duration,
    deadline: Option<Instant>,
}

impl DebounceScheduler {
    pub fn new(quiet_window: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            quiet_window,
            deadline: None,
        }
    }

    pub fn system(quiet_window: Duration) -> Self {
        Self::new(quiet_window, Arc::new(SystemClock))
    }

    pub fn quiet_window(&self) -> Duration {
        self.quiet_window
    }

    /// Record one raw edit; callable at unbounded rate.
    pub fn notify_edit(&mut self) {
        self.deadline = Some(self.clock.now() + self.quiet_window);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Consume the deadline if the quiet window has elapsed. Returns true
    /// at most once per burst.
    pub fn take_due(&mut self) -> bool {
        match self.deadline {
            Some(deadline) if self.clock.now() >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scheduler_with_manual_clock(window_ms: u64) -> (DebounceScheduler, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        let scheduler = DebounceScheduler::new(Duration::from_millis(window_ms), clock.clone());
        (scheduler, clock)
    }

    #[test]
    fn burst_of_edits_coalesces_into_one_pass() {
        let (mut scheduler, clock) = scheduler_with_manual_clock(200);

        for _ in 0..25 {
            scheduler.notify_edit();
            clock.advance(Duration::from_millis(10));
            assert!(!scheduler.take_due(), "window keeps re-arming mid-burst");
        }

        clock.advance(Duration::from_millis(200));
        assert!(scheduler.take_due());
        assert!(!scheduler.take_due(), "a burst yields exactly one pass");
    }

    #[test]
    fn separated_edits_each_get_their_own_pass() {
        let (mut scheduler, clock) = scheduler_with_manual_clock(200);

        scheduler.notify_edit();
        clock.advance(Duration::from_millis(250));
        assert!(scheduler.take_due());

        scheduler.notify_edit();
        clock.advance(Duration::from_millis(250));
        assert!(scheduler.take_due());
    }

    #[test]
    fn cancel_discards_the_pending_pass() {
        let (mut scheduler, clock) = scheduler_with_manual_clock(200);

        scheduler.notify_edit();
        scheduler.cancel();
        clock.advance(Duration::from_millis(500));
        assert!(!scheduler.take_due());
    }

    #[test]
    fn scheduler_state_renders_for_diagnostics() {
        let (mut scheduler, _clock) = scheduler_with_manual_clock(200);
        scheduler.notify_edit();
        let rendered = format!("{scheduler:?}");
        assert!(rendered.contains("DebounceScheduler"));
        assert!(rendered.contains("quiet_window"));
    }

    #[test]
    fn nothing_fires_without_an_edit() {
        let (mut scheduler, clock) = scheduler_with_manual_clock(200);
        clock.advance(Duration::from_secs(5));
        assert!(!scheduler.is_pending());
        assert!(!scheduler.take_due());
    }
}
