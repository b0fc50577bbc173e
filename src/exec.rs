//! Execution context: cooperative cancellation and progress reporting

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use crate::error::{Result, UngroupError};

/// Host services polled by a running operation between rows
pub trait ExecutionContext {
    /// Fail with [`UngroupError::Canceled`] if cancellation was requested
    fn check_canceled(&self) -> Result<()>;

    /// Report progress as a fraction in `[0, 1]`
    fn set_progress(&self, fraction: f64, message: &str);
}

/// Shareable handle that requests cancellation of a running operation
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    flag: Arc<AtomicBool>,
}

impl CancelHandle {
    /// Request cancellation
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    /// Check if cancellation was requested
    pub fn is_canceled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// Default execution context; logs progress and exposes a [`CancelHandle`]
#[derive(Debug, Default)]
pub struct ExecutionMonitor {
    cancel: CancelHandle,
    progress: AtomicU64,
}

impl ExecutionMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle that cancels operations running under this monitor
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Last reported progress fraction
    pub fn progress(&self) -> f64 {
        f64::from_bits(self.progress.load(Ordering::Relaxed))
    }
}

impl ExecutionContext for ExecutionMonitor {
    fn check_canceled(&self) -> Result<()> {
        if self.cancel.is_canceled() {
            Err(UngroupError::Canceled)
        } else {
            Ok(())
        }
    }

    fn set_progress(&self, fraction: f64, message: &str) {
        let fraction = fraction.clamp(0.0, 1.0);
        self.progress.store(fraction.to_bits(), Ordering::Relaxed);
        log::trace!("{:>5.1}% {}", fraction * 100.0, message);
    }
}
