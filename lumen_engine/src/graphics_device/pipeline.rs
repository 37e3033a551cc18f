/// Opaque pipeline-state objects supplied by the application layer
///
/// The frame subsystem only binds these. Creating them (shader modules,
/// fixed-function state, descriptor layouts) is the backend's business.

use std::any::Any;

/// Render pass the per-frame commands are recorded in
pub trait RenderPass: Send + Sync {
    /// Downcast support for backends
    fn as_any(&self) -> &dyn Any;
}

/// Compiled graphics pipeline together with its layout
pub trait Pipeline: Send + Sync {
    /// Downcast support for backends
    fn as_any(&self) -> &dyn Any;
}

/// Descriptor set bound to one frame slot's uniform buffer
pub trait DescriptorSet: Send + Sync {
    /// Downcast support for backends
    fn as_any(&self) -> &dyn Any;
}
