//! Cooperative shutdown

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Cloneable stop flag checked between read-loop iterations.
///
/// Setting the flag stops [`crate::Session::run`] before its next read; a
/// read already blocked in the kernel is not preempted. Callers that need
/// a hard bound on shutdown latency should run the device timer so reads
/// wake on the poll timeout.
#[derive(Debug, Clone, Default)]
pub struct ShutdownFlag(Arc<AtomicBool>);

impl ShutdownFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}
