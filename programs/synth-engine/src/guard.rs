use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::SynthEngineError;

/// Non-reentrant lock around public entry points. Internal helpers run under the
/// caller's `Entered` token and never touch the flag.
#[derive(Debug, Default)]
pub struct ReentrancyGuard {
    entered: AtomicBool,
}

/// Held for the duration of one public operation; releases the guard on drop.
#[must_use]
#[derive(Debug)]
pub struct Entered<'a> {
    guard: &'a ReentrancyGuard,
}

impl ReentrancyGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enter(&self) -> Result<Entered<'_>, SynthEngineError> {
        self.entered
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .map_err(|_| SynthEngineError::ReentrantCall)?;
        Ok(Entered { guard: self })
    }

    pub fn is_entered(&self) -> bool {
        self.entered.load(Ordering::Acquire)
    }
}

impl Drop for Entered<'_> {
    fn drop(&mut self) {
        self.guard.entered.store(false, Ordering::Release);
    }
}
