use std::time::{Duration, Instant};

pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(60);

/// Lets the cache tell an empty load apart from a useful one.
pub trait Snapshot {
    fn has_data(&self) -> bool;
}

impl<T> Snapshot for Vec<T> {
    fn has_data(&self) -> bool {
        !self.is_empty()
    }
}

/// Single-entry cache used by the edit screens. Entries older than the TTL or
/// without data are never served; there is no eviction besides [`TimedSnapshot::invalidate`].
#[derive(Debug, Clone)]
pub struct TimedSnapshot<T> {
    ttl: Duration,
    entry: Option<(Instant, T)>,
}

impl<T: Snapshot> Default for TimedSnapshot<T> {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_TTL)
    }
}

impl<T: Snapshot> TimedSnapshot<T> {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, entry: None }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn store(&mut self, value: T) {
        self.store_at(Instant::now(), value);
    }

    pub fn store_at(&mut self, fetched_at: Instant, value: T) {
        self.entry = Some((fetched_at, value));
    }

    pub fn fresh(&self) -> Option<&T> {
        self.fresh_at(Instant::now())
    }

    pub fn fresh_at(&self, now: Instant) -> Option<&T> {
        let (fetched_at, value) = self.entry.as_ref()?;
        let age = now.saturating_duration_since(*fetched_at);
        (age < self.ttl && value.has_data()).then_some(value)
    }

    /// Last stored value regardless of age.
    pub fn get(&self) -> Option<&T> {
        self.entry.as_ref().map(|(_, value)| value)
    }

    pub fn invalidate(&mut self) {
        self.entry = None;
    }
}
