//! Cooperative cancellation.
//!
//! Long runs check a [`CancelToken`] between Monte Carlo trials, between
//! ants and between percolation cells.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::{ReliabilityError, Result};

/// Shared cancellation flag with an optional deadline
///
/// Clones share the same flag, so a clone handed to another thread can
/// cancel the original.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Token that trips by itself once `timeout` has elapsed
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(false)),
            deadline: Instant::now().checked_add(timeout),
        }
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        if self.flag.load(Ordering::Relaxed) {
            return true;
        }
        match self.deadline {
            Some(deadline) => Instant::now() >= deadline,
            None => false,
        }
    }

    /// `Err(Cancelled)` once the token has tripped
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(ReliabilityError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Check an optional token
pub(crate) fn check(cancel: Option<&CancelToken>) -> Result<()> {
    match cancel {
        Some(token) => token.check(),
        None => Ok(()),
    }
}
