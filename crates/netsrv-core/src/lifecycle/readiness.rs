//! Readiness flag
//!
//! Set once the event subscription is in place; cleared only on shutdown.
//! Shared between the caller's context and the monitor task, so all access
//! uses acquire/release ordering.

use std::sync::atomic::{AtomicBool, Ordering};

/// One-way ready flag
#[derive(Debug, Default)]
pub struct Readiness {
    ready: AtomicBool,
}

impl Readiness {
    /// Create a flag in the not-ready state
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the facade may serve requests
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    /// Mark ready; returns `true` only for the call that made the transition
    pub fn mark_ready(&self) -> bool {
        !self.ready.swap(true, Ordering::AcqRel)
    }

    /// Clear the flag during shutdown
    pub fn reset(&self) {
        self.ready.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transitions_once() {
        let readiness = Readiness::new();
        assert!(!readiness.is_ready());
        assert!(readiness.mark_ready());
        assert!(!readiness.mark_ready());
        assert!(readiness.is_ready());

        readiness.reset();
        assert!(!readiness.is_ready());
    }
}
