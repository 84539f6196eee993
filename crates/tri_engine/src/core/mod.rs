//! Core engine services shared by the rendering layer and applications.

pub mod config;

pub use config::{AppConfig, ConfigError, ShaderConfig, WindowConfig};
