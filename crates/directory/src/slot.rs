use std::time::{Duration, Instant};

/// One cached payload with its refresh timestamp.
///
/// An absent payload means "never fetched". A present payload past expiry
/// is stale: it is never served on the fresh path, but a failed refresh
/// leaves it in place (the caller sees the error, not the stale data).
#[derive(Debug)]
pub struct CacheSlot<T> {
    payload: Option<T>,
    refreshed_at: Option<Instant>,
}

impl<T> Default for CacheSlot<T> {
    fn default() -> Self {
        Self {
            payload: None,
            refreshed_at: None,
        }
    }
}

impl<T> CacheSlot<T> {
    /// Whether the slot can be served without a backend call.
    #[must_use]
    pub fn is_fresh(&self, expiry: Duration) -> bool {
        self.payload.is_some()
            && self
                .refreshed_at
                .is_some_and(|at| at.elapsed() < expiry)
    }

    /// Store a payload and stamp the refresh time, returning a reference
    /// to the stored value.
    pub fn store(&mut self, payload: T) -> &T {
        self.refreshed_at = Some(Instant::now());
        self.payload.insert(payload)
    }

    #[must_use]
    pub fn payload(&self) -> Option<&T> {
        self.payload.as_ref()
    }

    #[must_use]
    pub fn refreshed_at(&self) -> Option<Instant> {
        self.refreshed_at
    }

    /// Drop the payload and timestamp, back to "never fetched".
    pub fn clear(&mut self) {
        self.payload = None;
        self.refreshed_at = None;
    }
}

impl<T> CacheSlot<Vec<T>> {
    /// Stored slice, empty when never fetched.
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        self.payload.as_deref().unwrap_or_default()
    }
}
