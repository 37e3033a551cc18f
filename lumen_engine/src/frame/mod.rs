/// Frame module - per-frame GPU resources, synchronization and the frame loop driver

pub mod vertex;
pub mod uniform;
pub mod transfer_manager;
pub mod resource_allocator;
pub mod buffer_manager;
pub mod command_sync_manager;
pub mod frame_orchestrator;

pub use vertex::*;
pub use uniform::*;
pub use transfer_manager::*;
pub use resource_allocator::*;
pub use buffer_manager::*;
pub use command_sync_manager::*;
pub use frame_orchestrator::*;
