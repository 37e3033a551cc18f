/// Synchronization primitives - semaphores (GPU to GPU) and fences (GPU to CPU)

use std::any::Any;
use crate::error::Result;

/// GPU-side ordering signal between queue operations
///
/// Never observed by the CPU. Released when dropped.
pub trait Semaphore: Send + Sync {
    /// Downcast support for backends
    fn as_any(&self) -> &dyn Any;
}

/// CPU-observable GPU completion signal
///
/// Released when dropped.
pub trait Fence: Send + Sync {
    /// Block until the fence is signaled or `timeout_ns` elapses
    ///
    /// # Errors
    ///
    /// Returns `Timeout` if the fence did not signal in time.
    fn wait(&self, timeout_ns: u64) -> Result<()>;

    /// Move the fence back to the unsignaled state
    fn reset(&self) -> Result<()>;

    /// Query the fence without blocking
    fn is_signaled(&self) -> Result<bool>;

    /// Downcast support for backends
    fn as_any(&self) -> &dyn Any;
}
