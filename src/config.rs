// src/config.rs
//! Configuration management backed by a JSON file

use crate::{
    error::{GpsError, Result},
    monitor::IngestSettings,
};
use serde::{Deserialize, Serialize};
use std::{
    path::{Path, PathBuf},
    time::Duration,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GpsConfig {
    pub serial_port: String,
    pub serial_baudrate: u32,
    pub read_timeout_ms: u64,
    pub reconnect_delay_secs: u64,
    pub error_delay_secs: u64,
    pub http_host: String,
    pub http_port: u16,
}

impl Default for GpsConfig {
    fn default() -> Self {
        Self {
            serial_port: "/dev/ttyS0".to_string(),
            serial_baudrate: 9600,
            read_timeout_ms: 2000,
            reconnect_delay_secs: 5,
            error_delay_secs: 1,
            http_host: "0.0.0.0".to_string(),
            http_port: 5000,
        }
    }
}

impl GpsConfig {
    /// Load configuration from the default location, falling back to
    /// defaults when no file exists yet
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::get_config_path()?)
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::get_config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)
            .map_err(|e| GpsError::Config(format!("Failed to read config file: {}", e)))?;

        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| GpsError::Config(format!("Failed to parse config file: {}", e)))?;

        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Create config directory if it doesn't exist
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| GpsError::Config(format!("Failed to create config directory: {}", e)))?;
        }

        let contents = serde_json::to_string_pretty(self)?;

        std::fs::write(path, contents)
            .map_err(|e| GpsError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Get config file path
    pub fn get_config_path() -> Result<PathBuf> {
        let home = std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .map_err(|_| GpsError::Config("HOME environment variable not set".to_string()))?;

        Ok(PathBuf::from(home)
            .join(".config")
            .join("gps-tracker")
            .join("config.json"))
    }

    /// Update serial port settings
    pub fn update_serial(&mut self, port: String, baudrate: u32) {
        self.serial_port = port;
        self.serial_baudrate = baudrate;
    }

    /// Update web server settings
    pub fn update_http(&mut self, host: String, port: u16) {
        self.http_host = host;
        self.http_port = port;
    }

    /// Timing policy for the ingestion loop
    pub fn ingest_settings(&self) -> IngestSettings {
        IngestSettings {
            read_timeout: Duration::from_millis(self.read_timeout_ms),
            reconnect_delay: Duration::from_secs(self.reconnect_delay_secs),
            error_delay: Duration::from_secs(self.error_delay_secs),
        }
    }

    pub fn http_addr(&self) -> String {
        format!("{}:{}", self.http_host, self.http_port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GpsConfig::default();
        assert_eq!(config.serial_baudrate, 9600);
        assert_eq!(config.http_addr(), "0.0.0.0:5000");

        let settings = config.ingest_settings();
        assert_eq!(settings.reconnect_delay, Duration::from_secs(5));
        assert_eq!(settings.error_delay, Duration::from_secs(1));
    }

    #[test]
    fn test_update_serial() {
        let mut config = GpsConfig::default();
        config.update_serial("/dev/ttyUSB0".to_string(), 115200);
        assert_eq!(config.serial_port, "/dev/ttyUSB0");
        assert_eq!(config.serial_baudrate, 115200);
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = GpsConfig::load_from(&dir.path().join("absent.json")).unwrap();
        assert_eq!(config, GpsConfig::default());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let mut config = GpsConfig::default();
        config.update_http("127.0.0.1".to_string(), 8080);
        config.save_to(&path).unwrap();

        assert_eq!(GpsConfig::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "serial_port": "/dev/ttyAMA0" }"#).unwrap();

        let config = GpsConfig::load_from(&path).unwrap();
        assert_eq!(config.serial_port, "/dev/ttyAMA0");
        assert_eq!(config.http_port, 5000);
    }

    #[test]
    fn test_garbage_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "not json").unwrap();

        assert!(matches!(GpsConfig::load_from(&path), Err(GpsError::Config(_))));
    }
}
