//! Configuration management for the briscola-lobby service
//!
//! This module handles configuration loading from environment variables and
//! TOML files, validation, and default values.

pub mod app;

// Re-export commonly used types
pub use app::{parse_presets, validate_config, AppConfig, QueuePreset, QueueSettings, ServiceSettings};
