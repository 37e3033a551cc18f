//! Engine configuration
//!
//! `Config` sets how many frames may be in flight, how long fence waits and
//! image acquisition may block, and which clear color the render pass uses.
//! It also names the application and toggles validation for the backend.
//! The engine and the frame subsystem constructors validate it before use.

use crate::error::{Error, Result};

/// Upper bound accepted for `Config::frames_in_flight`
pub const MAX_FRAMES_IN_FLIGHT: usize = 8;

/// Runtime configuration for the frame subsystem and the backend
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Number of frame slots whose GPU work may be outstanding at once (N)
    pub frames_in_flight: usize,

    /// Timeout for in-flight fence waits, in nanoseconds
    pub fence_timeout_ns: u64,

    /// Timeout for swapchain image acquisition, in nanoseconds
    pub acquire_timeout_ns: u64,

    /// Clear color of the render pass (RGBA)
    pub clear_color: [f32; 4],

    /// Application name reported to the graphics API
    pub application_name: String,

    /// Enable the API validation layers (only honored when the backend is
    /// built with validation support)
    pub enable_validation: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            frames_in_flight: 2,
            fence_timeout_ns: u64::MAX,
            acquire_timeout_ns: u64::MAX,
            clear_color: [0.0, 0.0, 0.0, 1.0],
            application_name: "VulkanTriangle".to_string(),
            enable_validation: cfg!(debug_assertions),
        }
    }
}

impl Config {
    /// Check that the configuration can drive a frame loop
    ///
    /// # Errors
    ///
    /// Returns `InitializationFailed` when `frames_in_flight` is zero or above
    /// `MAX_FRAMES_IN_FLIGHT`, or when the fence timeout is zero.
    pub fn validate(&self) -> Result<()> {
        if self.frames_in_flight == 0 || self.frames_in_flight > MAX_FRAMES_IN_FLIGHT {
            return Err(Error::InitializationFailed(format!(
                "frames_in_flight must be in 1..={}, got {}",
                MAX_FRAMES_IN_FLIGHT, self.frames_in_flight
            )));
        }
        if self.fence_timeout_ns == 0 {
            return Err(Error::InitializationFailed(
                "fence_timeout_ns must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
