//! Vulkan rendering backend
//!
//! Low-level Vulkan implementation. Every object wrapper here owns exactly
//! one Vulkan handle and releases it in `Drop`, so teardown order follows
//! from field declaration order in the owning types.

pub mod commands;
pub mod context;
pub mod device;
pub mod framebuffer;
pub mod render_pass;
pub mod renderer;
pub mod shader;
pub mod swapchain;
pub mod sync;

pub use commands::{CommandPool, CommandRecorder};
pub use context::{
    LogicalDevice, VulkanContext, VulkanError, VulkanInstance, VulkanResult, VulkanSurface,
};
pub use device::{DeviceProfile, PhysicalDeviceInfo, QueueFamilyIndices};
pub use framebuffer::Framebuffer;
pub use render_pass::RenderPass;
pub use renderer::Renderer;
pub use shader::{GraphicsPipeline, ShaderModule};
pub use swapchain::{SurfaceSupport, Swapchain};
pub use sync::{Fence, FrameSync, Semaphore};
