//! Application configuration
//!
//! Configuration for the window and shader loading, with TOML file support
//! and sensible defaults so applications can run without a config file.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Configuration loading errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// Config file contents were not valid TOML
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// Configuration values failed validation
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Window creation parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowConfig {
    /// Window title
    pub title: String,
    /// Window width in screen coordinates
    pub width: u32,
    /// Window height in screen coordinates
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Vulkan".to_string(),
            width: 800,
            height: 600,
        }
    }
}

/// Shader loading parameters
///
/// Paths to the compiled SPIR-V vertex and fragment shaders consumed by the
/// pipeline assembler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShaderConfig {
    /// Path to the vertex shader SPIR-V file
    pub vertex_shader_path: String,
    /// Path to the fragment shader SPIR-V file
    pub fragment_shader_path: String,
}

impl ShaderConfig {
    /// Create a new shader configuration
    pub fn new(vertex_path: impl Into<String>, fragment_path: impl Into<String>) -> Self {
        Self {
            vertex_shader_path: vertex_path.into(),
            fragment_shader_path: fragment_path.into(),
        }
    }

    /// Create shader config with automatic path resolution
    ///
    /// Tries common output locations so applications can be run from the
    /// workspace root or a crate directory.
    pub fn with_path_resolution(base_vertex: &str, base_fragment: &str) -> Self {
        let shader_dirs = [
            "target/shaders/",
            "shaders/",
            "../shaders/",
            "./",
        ];

        let mut vertex_path = None;
        let mut fragment_path = None;

        for dir in &shader_dirs {
            let vertex_test = format!("{dir}{base_vertex}");
            let fragment_test = format!("{dir}{base_fragment}");

            if Path::new(&vertex_test).exists() && vertex_path.is_none() {
                vertex_path = Some(vertex_test);
            }
            if Path::new(&fragment_test).exists() && fragment_path.is_none() {
                fragment_path = Some(fragment_test);
            }

            if vertex_path.is_some() && fragment_path.is_some() {
                break;
            }
        }

        Self {
            vertex_shader_path: vertex_path.unwrap_or_else(|| format!("shaders/{base_vertex}")),
            fragment_shader_path: fragment_path.unwrap_or_else(|| format!("shaders/{base_fragment}")),
        }
    }

    /// Validate that both shader files exist
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !Path::new(&self.vertex_shader_path).exists() {
            return Err(ConfigError::Invalid(format!(
                "Vertex shader not found: {}",
                self.vertex_shader_path
            )));
        }
        if !Path::new(&self.fragment_shader_path).exists() {
            return Err(ConfigError::Invalid(format!(
                "Fragment shader not found: {}",
                self.fragment_shader_path
            )));
        }
        Ok(())
    }
}

impl Default for ShaderConfig {
    fn default() -> Self {
        Self::with_path_resolution("triangle.vert.spv", "triangle.frag.spv")
    }
}

/// Top-level application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Window parameters
    #[serde(default)]
    pub window: WindowConfig,
    /// Shader parameters
    #[serde(default)]
    pub shaders: ShaderConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file if it exists, otherwise use defaults
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window.width == 0 || self.window.height == 0 {
            return Err(ConfigError::Invalid(
                "Window dimensions must be nonzero".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Defaults match the fixed 800x600 "Vulkan" window
    #[test]
    fn default_window_config() {
        let config = WindowConfig::default();
        assert_eq!(config.width, 800);
        assert_eq!(config.height, 600);
        assert_eq!(config.title, "Vulkan");
    }

    /// Zero-sized windows are rejected by validation
    #[test]
    fn zero_window_dimensions_rejected() {
        let config = AppConfig {
            window: WindowConfig {
                width: 0,
                ..WindowConfig::default()
            },
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    /// Window and shader sections can be parsed from TOML
    #[test]
    fn parse_from_toml() {
        let toml_str = r#"
            [window]
            title = "Triangle"
            width = 1280
            height = 720

            [shaders]
            vertex_shader_path = "a.spv"
            fragment_shader_path = "b.spv"
        "#;
        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.window.width, 1280);
        assert_eq!(config.shaders.vertex_shader_path, "a.spv");
    }

    /// Missing sections fall back to defaults
    #[test]
    fn missing_sections_use_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config.window.width, 800);
    }
}
