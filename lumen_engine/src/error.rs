//! Error types for the Lumen engine
//!
//! This module defines the error types used throughout the engine. Every
//! variant belongs to one [`ErrorKind`], so a frame loop can decide between
//! aborting, fixing a caller bug, or retrying after recreating the swapchain.

use std::fmt;

/// Result type for Lumen engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Lumen engine errors
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Backend-specific error (Vulkan, etc.)
    BackendError(String),

    /// Out of GPU or host memory
    OutOfMemory,

    /// Invalid resource (buffer, pipeline, descriptor set, etc.)
    InvalidResource(String),

    /// Initialization failed (engine, device, per-frame primitives)
    InitializationFailed(String),

    /// A frame slot index outside `0..frames_in_flight`
    FrameSlotOutOfRange {
        slot: usize,
        frames_in_flight: usize,
    },

    /// A handle was used before it was created
    NotInitialized(String),

    /// An API contract was broken by the caller
    PreconditionViolation(String),

    /// A resource is not in the state the operation needs (e.g. not mapped)
    ResourceState(String),

    /// The presentation surface changed and the swapchain must be recreated
    SurfaceOutOfDate,

    /// A bounded wait expired
    Timeout(String),

    /// The logical device was lost
    DeviceLost,
}

/// Coarse classification of [`Error`] values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Unrecoverable, the frame loop must terminate
    Fatal,
    /// Programming-contract error on the caller side
    Precondition,
    /// Expected to recur during normal operation, retry after recovery
    Transient,
    /// The triggering operation is aborted, siblings are cleaned up
    ResourceState,
}

impl Error {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::BackendError(_)
            | Error::OutOfMemory
            | Error::InitializationFailed(_)
            | Error::DeviceLost => ErrorKind::Fatal,
            Error::FrameSlotOutOfRange { .. }
            | Error::NotInitialized(_)
            | Error::PreconditionViolation(_) => ErrorKind::Precondition,
            Error::SurfaceOutOfDate | Error::Timeout(_) => ErrorKind::Transient,
            Error::InvalidResource(_) | Error::ResourceState(_) => ErrorKind::ResourceState,
        }
    }

    /// Whether the caller may retry after recovery
    pub fn is_transient(&self) -> bool {
        self.kind() == ErrorKind::Transient
    }

    /// Whether the frame loop must stop
    pub fn is_fatal(&self) -> bool {
        self.kind() == ErrorKind::Fatal
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::OutOfMemory => write!(f, "Out of GPU memory"),
            Error::InvalidResource(msg) => write!(f, "Invalid resource: {}", msg),
            Error::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            Error::FrameSlotOutOfRange { slot, frames_in_flight } => write!(
                f,
                "Frame slot {} out of range (frames in flight: {})",
                slot, frames_in_flight
            ),
            Error::NotInitialized(msg) => write!(f, "Not initialized: {}", msg),
            Error::PreconditionViolation(msg) => write!(f, "Precondition violation: {}", msg),
            Error::ResourceState(msg) => write!(f, "Resource state error: {}", msg),
            Error::SurfaceOutOfDate => write!(f, "Surface out of date"),
            Error::Timeout(msg) => write!(f, "Timeout: {}", msg),
            Error::DeviceLost => write!(f, "Device lost"),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
