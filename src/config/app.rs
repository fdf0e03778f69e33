//! Main application configuration
//!
//! This module defines the configuration structures for the briscola-lobby
//! service, including environment variable and TOML file loading and
//! validation.

use crate::events::DEFAULT_EVENT_BUFFER;
use crate::queue::DEFAULT_MAX_CAPACITY;
use crate::utils::SESSION_TOKEN_LENGTH;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::env;
use std::path::Path;
use std::time::Duration;

/// Shortest session token the service accepts
pub const MIN_TOKEN_LENGTH: usize = 16;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub service: ServiceSettings,
    pub queues: QueueSettings,
}

/// Service-level settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    /// Service name for logging and metrics
    pub name: String,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Address the HTTP server binds to
    pub http_host: String,
    /// Port for the HTTP server
    pub http_port: u16,
    /// Graceful shutdown timeout in seconds
    pub shutdown_timeout_seconds: u64,
}

/// Queue registry settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueSettings {
    /// Length of generated session tokens
    pub token_length: usize,
    /// Largest capacity a queue may be created with
    pub max_capacity: usize,
    /// Start the match as soon as a join fills a queue
    pub auto_start_when_full: bool,
    /// Broadcast buffer for event subscribers
    pub event_buffer: usize,
    /// Queues created at startup
    pub presets: Vec<QueuePreset>,
}

/// A queue registered when the service starts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueuePreset {
    pub name: String,
    pub capacity: usize,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            name: "briscola-lobby".to_string(),
            log_level: "info".to_string(),
            http_host: "0.0.0.0".to_string(),
            http_port: 8080,
            shutdown_timeout_seconds: 30,
        }
    }
}

impl Default for QueueSettings {
    fn default() -> Self {
        Self {
            token_length: SESSION_TOKEN_LENGTH,
            max_capacity: DEFAULT_MAX_CAPACITY,
            auto_start_when_full: false,
            event_buffer: DEFAULT_EVENT_BUFFER,
            presets: Vec::new(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables with fallback to defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env()?;
        validate_config(&config)?;
        Ok(config)
    }

    /// Load configuration from a TOML file; missing fields take defaults
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = Self::from_toml_str(&contents)
            .with_context(|| format!("Failed to load config file {}", path.display()))?;
        Ok(config)
    }

    /// Parse and validate a TOML document
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(contents).context("Invalid TOML configuration")?;
        validate_config(&config)?;
        Ok(config)
    }

    fn apply_env(&mut self) -> Result<()> {
        // Service settings
        if let Ok(name) = env::var("SERVICE_NAME") {
            self.service.name = name;
        }
        if let Ok(log_level) = env::var("LOG_LEVEL") {
            self.service.log_level = log_level;
        }
        if let Ok(host) = env::var("HTTP_HOST") {
            self.service.http_host = host;
        }
        if let Ok(port) = env::var("HTTP_PORT") {
            self.service.http_port = port
                .parse()
                .map_err(|_| anyhow!("Invalid HTTP_PORT value: {}", port))?;
        }
        if let Ok(timeout) = env::var("SHUTDOWN_TIMEOUT_SECONDS") {
            self.service.shutdown_timeout_seconds = timeout
                .parse()
                .map_err(|_| anyhow!("Invalid SHUTDOWN_TIMEOUT_SECONDS value: {}", timeout))?;
        }

        // Queue settings
        if let Ok(length) = env::var("TOKEN_LENGTH") {
            self.queues.token_length = length
                .parse()
                .map_err(|_| anyhow!("Invalid TOKEN_LENGTH value: {}", length))?;
        }
        if let Ok(max) = env::var("MAX_QUEUE_CAPACITY") {
            self.queues.max_capacity = max
                .parse()
                .map_err(|_| anyhow!("Invalid MAX_QUEUE_CAPACITY value: {}", max))?;
        }
        if let Ok(auto_start) = env::var("AUTO_START_WHEN_FULL") {
            self.queues.auto_start_when_full = auto_start
                .parse()
                .map_err(|_| anyhow!("Invalid AUTO_START_WHEN_FULL value: {}", auto_start))?;
        }
        if let Ok(buffer) = env::var("EVENT_BUFFER") {
            self.queues.event_buffer = buffer
                .parse()
                .map_err(|_| anyhow!("Invalid EVENT_BUFFER value: {}", buffer))?;
        }
        if let Ok(presets) = env::var("QUEUE_PRESETS") {
            self.queues.presets = parse_presets(&presets)?;
        }

        Ok(())
    }

    /// Get shutdown timeout as Duration
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.service.shutdown_timeout_seconds)
    }

    /// Address string for the HTTP server
    pub fn http_addr(&self) -> String {
        format!("{}:{}", self.service.http_host, self.service.http_port)
    }
}

/// Parse `name:capacity` pairs separated by commas
pub fn parse_presets(value: &str) -> Result<Vec<QueuePreset>> {
    value
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (name, capacity) = entry
                .rsplit_once(':')
                .ok_or_else(|| anyhow!("Invalid queue preset '{}', expected name:capacity", entry))?;
            let capacity = capacity
                .trim()
                .parse()
                .map_err(|_| anyhow!("Invalid capacity in queue preset '{}'", entry))?;
            Ok(QueuePreset {
                name: name.trim().to_string(),
                capacity,
            })
        })
        .collect()
}

/// Validate configuration values
pub fn validate_config(config: &AppConfig) -> Result<()> {
    // Validate log level
    match config.service.log_level.to_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => {}
        _ => return Err(anyhow!("Invalid log level: {}", config.service.log_level)),
    }

    // Validate server settings
    if config.service.http_port == 0 {
        return Err(anyhow!("HTTP port cannot be 0"));
    }
    if config.service.shutdown_timeout_seconds == 0 {
        return Err(anyhow!("Shutdown timeout must be greater than 0"));
    }

    // Validate queue settings
    if config.queues.token_length < MIN_TOKEN_LENGTH {
        return Err(anyhow!(
            "Token length must be at least {} characters",
            MIN_TOKEN_LENGTH
        ));
    }
    if config.queues.max_capacity == 0 {
        return Err(anyhow!("Max queue capacity must be greater than 0"));
    }
    if config.queues.event_buffer == 0 {
        return Err(anyhow!("Event buffer must be greater than 0"));
    }

    let mut seen = HashSet::new();
    for preset in &config.queues.presets {
        if preset.name.trim().is_empty() {
            return Err(anyhow!("Queue preset name cannot be empty"));
        }
        if !seen.insert(preset.name.as_str()) {
            return Err(anyhow!("Duplicate queue preset: {}", preset.name));
        }
        if preset.capacity == 0 || preset.capacity > config.queues.max_capacity {
            return Err(anyhow!(
                "Queue preset {} capacity must be between 1 and {}",
                preset.name,
                config.queues.max_capacity
            ));
        }
    }

    Ok(())
}
