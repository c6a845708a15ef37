//! Application settings model
//!
//! This module defines the application-wide settings stored in config.toml.

use serde::{Deserialize, Serialize};

/// Application-wide settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppSettings {
    /// Endpoint used to seed the host field when creating the very first
    /// connection; ignored once the registry has entries
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_endpoint: Option<String>,
    /// Default log filter directive (overridable via `RUST_LOG`)
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

fn default_log_filter() -> String {
    "info".to_string()
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            default_endpoint: None,
            log_filter: default_log_filter(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = AppSettings::default();
        assert!(settings.default_endpoint.is_none());
        assert_eq!(settings.log_filter, "info");
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let settings: AppSettings =
            toml::from_str("default_endpoint = \"http://localhost:8086\"").unwrap();
        assert_eq!(
            settings.default_endpoint.as_deref(),
            Some("http://localhost:8086")
        );
        assert_eq!(settings.log_filter, "info");
    }
}
