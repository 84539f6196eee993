//! Rendering layer
//!
//! The windowing wrapper and the Vulkan backend that negotiates and owns
//! every GPU resource needed to present a frame.

pub mod vulkan;
pub mod window;

pub use vulkan::Renderer;
pub use window::{Window, WindowError};
