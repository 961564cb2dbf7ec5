//! Debounce state machine.
//!
//! [`LintScheduler`] decides *when* lint sources run; it owns no timers and no futures. The
//! driver feeds it edits and timer expirations with an explicit `now`, and acts on what it
//! answers. Keeping it pure makes every transition testable without a runtime.
//!
//! ```text
//!   Idle ──edit──▶ Armed ──timer (deadline reached)──▶ Running{token} ──finish──▶ Idle
//!                  │  ▲                                   │
//!                  │  └──timer (early): re-arm            └─edit: re-arm after finish
//!                  └──force──▶ Running{token}
//! ```
//!
//! The token passed to a run is the document version the run was issued against. A finished
//! run is fresh only if that version is still current.

use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

/// How far a timer may fire before its deadline and still count as due.
pub const DEADLINE_TOLERANCE: Duration = Duration::from_millis(10);

/// Scheduler phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LintPhase {
    /// Nothing to do.
    Idle,
    /// Waiting for the quiet period to elapse.
    Armed,
    /// Sources were invoked against document version `token`.
    Running {
        /// Document version the run was issued against.
        token: u64,
    },
    /// Shut down; nothing will run again.
    Closed,
}

/// Answer to a timer expiration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerOutcome {
    /// Fired early (an edit pushed the deadline); wait again until the given instant.
    Rearm(Instant),
    /// The quiet period elapsed; the scheduler is now running.
    Run,
    /// Not armed; nothing to do.
    Ignored,
}

/// Result of [`LintScheduler::finish`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunCompletion {
    /// Whether the run's token still matches the current document version.
    pub fresh: bool,
    /// Deadline of the follow-up cycle when an edit arrived mid-run.
    pub rearmed: Option<Instant>,
}

/// Pure debounce state machine.
#[derive(Debug, Clone)]
pub struct LintScheduler {
    delay: Duration,
    phase: LintPhase,
    /// When the quiet period ends.
    deadline: Option<Instant>,
    /// When the armed timer fires. Lags `deadline` after edits while armed.
    timer_at: Option<Instant>,
    /// Latest edit seen while running.
    pending_edit: Option<Instant>,
}

impl LintScheduler {
    /// A scheduler with the given quiet period, initially idle.
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            phase: LintPhase::Idle,
            deadline: None,
            timer_at: None,
            pending_edit: None,
        }
    }

    /// The quiet period.
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Change the quiet period. Applies from the next edit on.
    pub fn set_delay(&mut self, delay: Duration) {
        self.delay = delay;
    }

    /// Current phase.
    pub fn phase(&self) -> LintPhase {
        self.phase
    }

    /// When the quiet period ends, if armed.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// When the driver should next report a timer expiration, if armed.
    pub fn timer_at(&self) -> Option<Instant> {
        self.timer_at
    }

    /// Returns `true` after [`LintScheduler::close`].
    pub fn is_closed(&self) -> bool {
        self.phase == LintPhase::Closed
    }

    fn arm(&mut self, deadline: Instant) {
        self.phase = LintPhase::Armed;
        self.deadline = Some(deadline);
        self.timer_at = Some(deadline);
    }

    /// Record a qualifying edit at `now`.
    pub fn on_edit(&mut self, now: Instant) {
        match self.phase {
            LintPhase::Idle => self.arm(now + self.delay),
            // The pending timer stays where it is and re-arms when it fires.
            LintPhase::Armed => self.deadline = Some(now + self.delay),
            LintPhase::Running { .. } => self.pending_edit = Some(now),
            LintPhase::Closed => {}
        }
    }

    /// The armed timer fired at `now`. On [`TimerOutcome::Run`] the scheduler enters
    /// `Running { token }`.
    pub fn on_timer(&mut self, now: Instant, token: u64) -> TimerOutcome {
        if self.phase != LintPhase::Armed {
            return TimerOutcome::Ignored;
        }
        let Some(deadline) = self.deadline else {
            return TimerOutcome::Ignored;
        };

        if now + DEADLINE_TOLERANCE < deadline {
            self.timer_at = Some(deadline);
            debug!(remaining_ms = (deadline - now).as_millis() as u64, "lint.scheduler.rearm");
            return TimerOutcome::Rearm(deadline);
        }

        self.start(token);
        TimerOutcome::Run
    }

    /// Skip the rest of the quiet period. Only an armed scheduler can be forced.
    pub fn force(&mut self, token: u64) -> bool {
        if self.phase != LintPhase::Armed {
            return false;
        }
        self.start(token);
        true
    }

    fn start(&mut self, token: u64) {
        self.phase = LintPhase::Running { token };
        self.deadline = None;
        self.timer_at = None;
        self.pending_edit = None;
    }

    /// The running cycle finished; `current` is the document version now.
    ///
    /// Returns to idle, or re-arms for `last edit + delay` when edits arrived during the run.
    pub fn finish(&mut self, current: u64) -> RunCompletion {
        let LintPhase::Running { token } = self.phase else {
            return RunCompletion {
                fresh: false,
                rearmed: None,
            };
        };

        let rearmed = self.pending_edit.take().map(|edit| edit + self.delay);
        match rearmed {
            Some(deadline) => self.arm(deadline),
            None => self.phase = LintPhase::Idle,
        }

        RunCompletion {
            fresh: token == current,
            rearmed,
        }
    }

    /// Shut down. Pending timers are dropped and nothing runs again.
    pub fn close(&mut self) {
        self.phase = LintPhase::Closed;
        self.deadline = None;
        self.timer_at = None;
        self.pending_edit = None;
    }
}

impl Default for LintScheduler {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_LINT_DELAY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_edits_while_armed_push_deadline_not_timer() {
        let t0 = Instant::now();
        let mut scheduler = LintScheduler::new(ms(750));

        scheduler.on_edit(t0);
        scheduler.on_edit(t0 + ms(100));
        scheduler.on_edit(t0 + ms(200));

        assert_eq!(scheduler.phase(), LintPhase::Armed);
        assert_eq!(scheduler.timer_at(), Some(t0 + ms(750)));
        assert_eq!(scheduler.deadline(), Some(t0 + ms(950)));

        assert_eq!(
            scheduler.on_timer(t0 + ms(750), 0),
            TimerOutcome::Rearm(t0 + ms(950))
        );
        assert_eq!(scheduler.timer_at(), Some(t0 + ms(950)));
        assert_eq!(scheduler.on_timer(t0 + ms(950), 3), TimerOutcome::Run);
        assert_eq!(scheduler.phase(), LintPhase::Running { token: 3 });
    }

    #[test]
    fn test_timer_within_tolerance_runs() {
        let t0 = Instant::now();
        let mut scheduler = LintScheduler::new(ms(750));
        scheduler.on_edit(t0);

        assert_eq!(scheduler.on_timer(t0 + ms(745), 0), TimerOutcome::Run);
    }

    #[test]
    fn test_timer_ignored_unless_armed() {
        let t0 = Instant::now();
        let mut scheduler = LintScheduler::new(ms(750));
        assert_eq!(scheduler.on_timer(t0, 0), TimerOutcome::Ignored);

        scheduler.on_edit(t0);
        assert!(scheduler.force(0));
        assert_eq!(scheduler.on_timer(t0 + ms(750), 0), TimerOutcome::Ignored);
    }

    #[test]
    fn test_force_only_when_armed() {
        let t0 = Instant::now();
        let mut scheduler = LintScheduler::new(ms(750));
        assert!(!scheduler.force(0));

        scheduler.on_edit(t0);
        assert!(scheduler.force(0));
        assert!(!scheduler.force(0));
        assert_eq!(scheduler.deadline(), None);
    }

    #[test]
    fn test_edit_during_run_rearms_after_finish() {
        let t0 = Instant::now();
        let mut scheduler = LintScheduler::new(ms(750));
        scheduler.on_edit(t0);
        assert_eq!(scheduler.on_timer(t0 + ms(750), 0), TimerOutcome::Run);

        scheduler.on_edit(t0 + ms(800));
        assert_eq!(scheduler.phase(), LintPhase::Running { token: 0 });

        let completion = scheduler.finish(1);
        assert!(!completion.fresh);
        assert_eq!(completion.rearmed, Some(t0 + ms(1550)));
        assert_eq!(scheduler.phase(), LintPhase::Armed);
        assert_eq!(scheduler.timer_at(), Some(t0 + ms(1550)));
    }

    #[test]
    fn test_finish_without_edits_goes_idle() {
        let t0 = Instant::now();
        let mut scheduler = LintScheduler::new(ms(750));
        scheduler.on_edit(t0);
        scheduler.force(4);

        let completion = scheduler.finish(4);
        assert!(completion.fresh);
        assert_eq!(completion.rearmed, None);
        assert_eq!(scheduler.phase(), LintPhase::Idle);
    }

    #[test]
    fn test_close_is_terminal() {
        let t0 = Instant::now();
        let mut scheduler = LintScheduler::new(ms(750));
        scheduler.on_edit(t0);
        scheduler.close();

        scheduler.on_edit(t0 + ms(1));
        assert!(scheduler.is_closed());
        assert_eq!(scheduler.timer_at(), None);
        assert!(!scheduler.force(0));
        assert!(!scheduler.finish(0).fresh);
        assert!(scheduler.is_closed());
    }
}
