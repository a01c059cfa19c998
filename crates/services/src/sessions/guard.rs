use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

/// Claims question ordinals so each is submitted at most once.
///
/// Holds the highest ordinal dispatched so far. Clones share the same
/// counter, so a user submit and a timer expiry racing from different tasks
/// still resolve to a single winner.
#[derive(Debug, Clone, Default)]
pub struct SubmissionGuard {
    last_dispatched: Arc<AtomicU32>,
}

impl SubmissionGuard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` for exactly one caller per ordinal, and never for an
    /// ordinal at or below one already claimed.
    pub fn try_claim(&self, ordinal: u32) -> bool {
        self.last_dispatched.fetch_max(ordinal, Ordering::AcqRel) < ordinal
    }

    #[must_use]
    pub fn is_claimed(&self, ordinal: u32) -> bool {
        self.last_dispatched.load(Ordering::Acquire) >= ordinal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn each_ordinal_is_claimed_once() {
        let guard = SubmissionGuard::new();
        assert!(!guard.is_claimed(1));
        assert!(guard.try_claim(1));
        assert!(!guard.try_claim(1));
        assert!(guard.is_claimed(1));
        assert!(guard.try_claim(2));
        assert!(!guard.try_claim(1));
    }

    #[test]
    fn concurrent_claims_have_one_winner() {
        let guard = SubmissionGuard::new();
        let winners: u32 = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    let guard = guard.clone();
                    scope.spawn(move || u32::from(guard.try_claim(5)))
                })
                .collect();
            handles
                .into_iter()
                .map(|handle| handle.join().unwrap())
                .sum()
        });
        assert_eq!(winners, 1);
    }
}
