use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Duration, Utc};

use quiz_core::Clock;
use quiz_core::combo::ComboTracker;
use quiz_core::model::SessionId;

/// Keeps the combo streak of each client session.
pub trait SessionStore: Send + Sync {
    /// Current streak for `id`; unknown or expired sessions start at zero.
    fn load(&self, id: &SessionId) -> ComboTracker;

    /// Apply one graded answer to the session's streak and return the result.
    ///
    /// Load, update and store happen as one step, so concurrent answers in
    /// the same session each count once.
    fn record(&self, id: SessionId, correct: bool) -> ComboTracker;

    /// Forget the session's streak.
    fn reset(&self, id: &SessionId);
}

#[derive(Debug, Clone, Copy)]
struct SessionSlot {
    combo: ComboTracker,
    touched_at: DateTime<Utc>,
}

/// Process-local session store with idle expiry.
#[derive(Debug)]
pub struct InMemorySessionStore {
    clock: Clock,
    ttl: Duration,
    sessions: Mutex<HashMap<SessionId, SessionSlot>>,
}

impl InMemorySessionStore {
    #[must_use]
    pub fn new(clock: Clock, ttl: Duration) -> Self {
        Self {
            clock,
            ttl,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Number of sessions currently held, expired ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop sessions idle for longer than the ttl as of `now`.
    pub fn prune_idle(&self, now: DateTime<Utc>) -> usize {
        let mut sessions = self.lock();
        let before = sessions.len();
        sessions.retain(|_, slot| now - slot.touched_at <= self.ttl);
        let pruned = before - sessions.len();
        if pruned > 0 {
            tracing::debug!(pruned, remaining = sessions.len(), "pruned idle sessions");
        }
        pruned
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<SessionId, SessionSlot>> {
        // A panic while holding the lock cannot leave a slot half-written.
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SessionStore for InMemorySessionStore {
    fn load(&self, id: &SessionId) -> ComboTracker {
        let now = self.clock.now();
        self.lock()
            .get(id)
            .filter(|slot| now - slot.touched_at <= self.ttl)
            .map(|slot| slot.combo)
            .unwrap_or_default()
    }

    fn record(&self, id: SessionId, correct: bool) -> ComboTracker {
        let now = self.clock.now();
        self.prune_idle(now);

        let mut sessions = self.lock();
        let slot = sessions.entry(id).or_insert(SessionSlot {
            combo: ComboTracker::new(),
            touched_at: now,
        });
        slot.combo.record(correct);
        slot.touched_at = now;
        slot.combo
    }

    fn reset(&self, id: &SessionId) {
        self.lock().remove(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::time::{fixed_clock, fixed_now};

    fn store() -> InMemorySessionStore {
        InMemorySessionStore::new(fixed_clock(), Duration::minutes(30))
    }

    fn streak(store: &InMemorySessionStore, id: SessionId, n: u32) {
        for _ in 0..n {
            store.record(id, true);
        }
    }

    #[test]
    fn unknown_session_starts_at_zero() {
        assert_eq!(store().load(&SessionId::generate()).count(), 0);
    }

    #[test]
    fn record_extends_and_breaks_streak() {
        let store = store();
        let id = SessionId::generate();
        assert_eq!(store.record(id, true).count(), 1);
        assert_eq!(store.record(id, true).count(), 2);
        assert_eq!(store.record(id, false).count(), 0);
        assert_eq!(store.record(id, true).count(), 1);
        assert_eq!(store.load(&id).count(), 1);
    }

    #[test]
    fn concurrent_records_in_one_session_all_count() {
        let store = std::sync::Arc::new(store());
        let id = SessionId::generate();
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = std::sync::Arc::clone(&store);
                std::thread::spawn(move || {
                    for _ in 0..25 {
                        store.record(id, true);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(store.load(&id).count(), 200);
    }

    #[test]
    fn sessions_are_isolated() {
        let store = store();
        let (a, b) = (SessionId::generate(), SessionId::generate());
        streak(&store, a, 3);
        streak(&store, b, 1);
        assert_eq!(store.load(&a).count(), 3);
        assert_eq!(store.load(&b).count(), 1);

        store.reset(&a);
        assert_eq!(store.load(&a).count(), 0);
        assert_eq!(store.load(&b).count(), 1);
    }

    #[test]
    fn idle_sessions_expire() {
        let store = store();
        let id = SessionId::generate();
        streak(&store, id, 4);

        assert_eq!(store.prune_idle(fixed_now() + Duration::minutes(30)), 0);
        assert_eq!(store.prune_idle(fixed_now() + Duration::minutes(31)), 1);
        assert!(store.is_empty());
    }

    #[test]
    fn expired_session_loads_as_zero() {
        let id = SessionId::generate();
        let early = InMemorySessionStore::new(fixed_clock(), Duration::minutes(5));
        streak(&early, id, 2);

        let mut later_clock = fixed_clock();
        later_clock.advance(Duration::minutes(6));
        let later = InMemorySessionStore {
            clock: later_clock,
            ttl: early.ttl(),
            sessions: Mutex::new(early.lock().clone()),
        };
        assert_eq!(later.load(&id).count(), 0);
    }
}
