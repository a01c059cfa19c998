//! Restartable, cancelable second-granularity countdown.
//!
//! The countdown does not own a clock. Whoever drives it calls [`Countdown::tick`]
//! once per elapsed second; ticks while stopped are ignored. Reaching zero stops
//! the countdown and invokes the expiry callback registered *at that moment*,
//! so callers can swap the callback between arming and expiry.

use std::fmt;

/// Callback invoked when a countdown reaches zero.
pub type ExpiryCallback = Box<dyn FnMut() + Send>;

pub struct Countdown {
    default_secs: u32,
    armed_total: u32,
    remaining: u32,
    running: bool,
    on_expire: Option<ExpiryCallback>,
}

impl Countdown {
    /// Creates a stopped countdown whose default arm value is `default_secs`.
    #[must_use]
    pub fn new(default_secs: u32) -> Self {
        Self {
            default_secs,
            armed_total: default_secs,
            remaining: default_secs,
            running: false,
            on_expire: None,
        }
    }

    /// Registers the callback used for the next expiry, replacing any previous one.
    pub fn set_on_expire(&mut self, callback: impl FnMut() + Send + 'static) {
        self.on_expire = Some(Box::new(callback));
    }

    pub fn clear_on_expire(&mut self) {
        self.on_expire = None;
    }

    /// Arms the countdown at `seconds` (or the default) and starts ticking.
    ///
    /// A zero or negative value expires immediately instead of ticking.
    pub fn start(&mut self, seconds: Option<i64>) {
        self.arm(seconds);
        if self.remaining == 0 {
            self.expire();
        } else {
            self.running = true;
        }
    }

    /// Halts ticking. The remaining value is kept for display.
    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Stops, then re-arms at `seconds` (or the default) without starting.
    pub fn reset(&mut self, seconds: Option<i64>) {
        self.stop();
        self.arm(seconds);
    }

    /// Advances one second. Returns `true` if this tick expired the countdown.
    pub fn tick(&mut self) -> bool {
        if !self.running {
            return false;
        }
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.expire();
            return true;
        }
        false
    }

    #[must_use]
    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    #[must_use]
    pub fn armed_total(&self) -> u32 {
        self.armed_total
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Remaining share of the armed value, `0.0..=100.0`, for progress bars.
    #[must_use]
    pub fn percent_remaining(&self) -> f64 {
        if self.armed_total == 0 {
            return 0.0;
        }
        (f64::from(self.remaining) / f64::from(self.armed_total) * 100.0).clamp(0.0, 100.0)
    }

    fn arm(&mut self, seconds: Option<i64>) {
        let seconds = seconds.unwrap_or(i64::from(self.default_secs));
        let seconds = u32::try_from(seconds.max(0)).unwrap_or(u32::MAX);
        self.armed_total = seconds;
        self.remaining = seconds;
    }

    fn expire(&mut self) {
        self.running = false;
        self.remaining = 0;
        if let Some(callback) = self.on_expire.as_mut() {
            callback();
        }
    }
}

impl fmt::Debug for Countdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Countdown")
            .field("default_secs", &self.default_secs)
            .field("armed_total", &self.armed_total)
            .field("remaining", &self.remaining)
            .field("running", &self.running)
            .field("has_callback", &self.on_expire.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn counter() -> (Arc<AtomicU32>, impl FnMut() + Send + 'static) {
        let count = Arc::new(AtomicU32::new(0));
        let handle = Arc::clone(&count);
        (count, move || {
            handle.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn expires_exactly_once_after_armed_seconds() {
        for seconds in [1_i64, 2, 5, 10, 60] {
            let (fired, callback) = counter();
            let mut countdown = Countdown::new(10);
            countdown.set_on_expire(callback);
            countdown.start(Some(seconds));

            for _ in 0..seconds - 1 {
                assert!(!countdown.tick());
            }
            assert_eq!(fired.load(Ordering::SeqCst), 0);
            assert!(countdown.tick());
            assert_eq!(fired.load(Ordering::SeqCst), 1);

            assert!(!countdown.tick());
            assert_eq!(fired.load(Ordering::SeqCst), 1, "fired twice for {seconds}s");
            assert_eq!(countdown.remaining(), 0);
            assert!(!countdown.is_running());
        }
    }

    #[test]
    fn invokes_latest_callback_not_the_one_at_arm_time() {
        let (old, old_cb) = counter();
        let (new, new_cb) = counter();
        let mut countdown = Countdown::new(10);
        countdown.set_on_expire(old_cb);
        countdown.start(Some(3));
        countdown.tick();

        countdown.reset(Some(2));
        countdown.set_on_expire(new_cb);
        countdown.start(Some(2));
        countdown.tick();
        countdown.tick();

        assert_eq!(old.load(Ordering::SeqCst), 0);
        assert_eq!(new.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn callback_swapped_while_running_is_the_one_invoked() {
        let (old, old_cb) = counter();
        let (new, new_cb) = counter();
        let mut countdown = Countdown::new(2);
        countdown.set_on_expire(old_cb);
        countdown.start(None);
        countdown.tick();
        countdown.set_on_expire(new_cb);
        countdown.tick();

        assert_eq!(old.load(Ordering::SeqCst), 0);
        assert_eq!(new.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn zero_or_negative_arm_fires_immediately() {
        for seconds in [0_i64, -4] {
            let (fired, callback) = counter();
            let mut countdown = Countdown::new(10);
            countdown.set_on_expire(callback);
            countdown.start(Some(seconds));
            assert_eq!(fired.load(Ordering::SeqCst), 1);
            assert_eq!(countdown.remaining(), 0);
            assert!(!countdown.tick());
            assert_eq!(fired.load(Ordering::SeqCst), 1);
        }
    }

    #[test]
    fn stop_keeps_remaining_and_ignores_ticks() {
        let mut countdown = Countdown::new(10);
        countdown.start(None);
        countdown.tick();
        countdown.tick();
        countdown.stop();
        countdown.tick();
        assert_eq!(countdown.remaining(), 8);
        assert!(!countdown.is_running());
    }

    #[test]
    fn reset_rearms_without_starting() {
        let (fired, callback) = counter();
        let mut countdown = Countdown::new(10);
        countdown.set_on_expire(callback);
        countdown.start(Some(1));
        countdown.reset(Some(5));
        for _ in 0..10 {
            countdown.tick();
        }
        assert_eq!(countdown.remaining(), 5);
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn percent_is_remaining_over_armed_total() {
        let mut countdown = Countdown::new(10);
        countdown.start(Some(4));
        assert!((countdown.percent_remaining() - 100.0).abs() < f64::EPSILON);
        countdown.tick();
        assert!((countdown.percent_remaining() - 75.0).abs() < f64::EPSILON);

        countdown.reset(Some(0));
        assert!(countdown.percent_remaining().abs() < f64::EPSILON);
    }
}
