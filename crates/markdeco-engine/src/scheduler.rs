use std::time::Duration;
use std::time::Instant;

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(100);

/// Debounces bursts of change/selection/visibility events into one render
/// per quiescent window.
///
/// The host owns the clock: it calls [`RenderScheduler::trigger`] from its
/// event handlers and polls [`RenderScheduler::take_ready`] from its loop.
/// Any new trigger overwrites the pending deadline, which is exactly the
/// cancel-and-reschedule the debounce needs. Only the pending trigger is
/// cancellable; an already-started render pass is superseded through the
/// generation counter instead.
#[derive(Clone, Copy, Debug)]
pub struct RenderScheduler {
    delay: Duration,
    queued_at: Option<Instant>,
    enabled: bool,
}

impl Default for RenderScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE)
    }
}

impl RenderScheduler {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            queued_at: None,
            enabled: true,
        }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Returns true when the transition to disabled happened, i.e. the
    /// caller should clear existing decorations.
    pub fn set_enabled(&mut self, enabled: bool) -> bool {
        let was = self.enabled;
        self.enabled = enabled;
        if !enabled {
            self.queued_at = None;
        }
        was && !enabled
    }

    /// Schedules (or reschedules) a render `delay` after `now`. No-op while
    /// disabled.
    pub fn trigger(&mut self, now: Instant) {
        if self.enabled {
            self.queued_at = Some(now);
        }
    }

    pub fn is_pending(&self) -> bool {
        self.queued_at.is_some()
    }

    pub fn cancel(&mut self) {
        self.queued_at = None;
    }

    /// Fires at most once per quiescent window: returns true when the
    /// pending trigger has aged past the delay, consuming it.
    pub fn take_ready(&mut self, now: Instant) -> bool {
        match self.queued_at {
            Some(queued_at) if now.duration_since(queued_at) >= self.delay => {
                self.queued_at = None;
                true
            }
            _ => false,
        }
    }
}
