/*!
# Lumen Engine

Frame lifecycle and GPU resource management for a minimal real-time renderer.

This crate is platform-agnostic. It drives frames through a trait-based
graphics device seam, and backend implementations (Vulkan) provide the
concrete resources behind those traits.

## Architecture

- **GraphicsDevice**: Factory for buffers, semaphores, fences and command pools
- **ResourceAllocator**: Buffer creation, mapping and device copies
- **TransferManager**: One-shot staging copies on the graphics queue
- **BufferManager**: Vertex, index and per-frame uniform buffers
- **CommandSyncManager**: Per-slot command lists, semaphores and fences
- **FrameOrchestrator**: WAIT, ACQUIRE, RECORD, SUBMIT, PRESENT for every frame

The number of frames in flight comes from `Config` and is threaded through
every constructor that needs it.
*/

// Internal modules
mod error;
mod engine;
mod config;
pub mod log;
pub mod graphics_device;
pub mod frame;

// Main lumen namespace module
pub mod lumen {
    // Error types
    pub use crate::error::{Error, ErrorKind, Result};

    // Engine singleton
    pub use crate::engine::Engine;

    // Configuration
    pub use crate::config::{Config, MAX_FRAMES_IN_FLIGHT};

    // Logging sub-module (types only, NOT macros)
    pub mod log {
        pub use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};
        // Note: engine_* macros are exported at the crate root for backends
    }

    // Graphics device seam implemented by backends
    pub mod device {
        pub use crate::graphics_device::*;
    }

    // Frame subsystem
    pub mod frame {
        pub use crate::frame::*;
    }
}

// Re-export math and byte-casting libraries at crate root
pub use glam;
pub use bytemuck;
