//! # Tri Engine
//!
//! A minimal Vulkan presentation bootstrap. The crate covers the full
//! capability-negotiation and resource-assembly path: physical device
//! scoring and selection, queue family resolution, swapchain parameter
//! negotiation, and the ordered construction of render pass, pipeline,
//! framebuffers and command resources needed to draw a single triangle.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tri_engine::core::config::AppConfig;
//! use tri_engine::render::{Renderer, Window};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::default();
//!     let mut window = Window::new(
//!         &config.window.title,
//!         config.window.width,
//!         config.window.height,
//!     )?;
//!     let mut renderer = Renderer::new(&mut window, &config)?;
//!     while !window.should_close() {
//!         window.poll_events();
//!         renderer.draw_frame()?;
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod core;
pub mod render;

pub use render::{Renderer, Window};
