// Configuration utilities for the Plex client
//
// Configuration is JSON. The Plex settings live in the "services" subtree, with
// a fallback to a top-level "plex" key for older configuration files.

use std::fs;
use std::path::Path;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::helpers::http_client;
use crate::plex::PlexClient;

/// Helper function to get service configuration with backward compatibility
///
/// This function first tries to find the service in the "services" structure,
/// then falls back to the old top-level structure.
///
/// # Example
/// ```rust
/// use serde_json::json;
/// use plexclient::config::get_service_config;
///
/// let config = json!({
///   "services": {
///     "plex": { "url": "http://localhost:32400" }
///   }
/// });
///
/// let plex = get_service_config(&config, "plex").unwrap();
/// assert_eq!(plex["url"], "http://localhost:32400");
///
/// let old_config = json!({ "plex": { "url": "http://nas:32400" } });
/// assert!(get_service_config(&old_config, "plex").is_some());
/// ```
pub fn get_service_config<'a>(
    config: &'a serde_json::Value,
    service_name: &str,
) -> Option<&'a serde_json::Value> {
    if let Some(service_config) = config.get("services").and_then(|s| s.get(service_name)) {
        debug!("Found {} configuration in services section", service_name);
        return Some(service_config);
    }

    if let Some(service_config) = config.get(service_name) {
        debug!("Found {} configuration at top level (legacy structure)", service_name);
        return Some(service_config);
    }

    debug!("No {} configuration found in either services section or top level", service_name);
    None
}

/// Connection settings for a Plex Media Server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlexConfig {
    /// Base URL of the server (e.g., "http://192.168.1.10:32400")
    pub url: String,

    /// Authentication token sent with every request
    pub token: String,

    /// HTTP timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    http_client::DEFAULT_TIMEOUT_SECS
}

impl PlexConfig {
    pub fn new(url: &str, token: &str) -> Self {
        PlexConfig {
            url: url.to_string(),
            token: token.to_string(),
            timeout_secs: default_timeout_secs(),
        }
    }

    /// Read the Plex settings from a parsed configuration document
    ///
    /// Returns None if there is no Plex section or it is incomplete.
    pub fn from_config(config: &serde_json::Value) -> Option<Self> {
        let plex_config = get_service_config(config, "plex")?;
        match serde_json::from_value::<PlexConfig>(plex_config.clone()) {
            Ok(c) => Some(c),
            Err(e) => {
                debug!("Ignoring invalid plex configuration: {}", e);
                None
            }
        }
    }

    /// Load the Plex settings from a JSON configuration file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let content = fs::read_to_string(path.as_ref())
            .map_err(|e| format!("Failed to read config file: {}", e))?;

        let config: serde_json::Value = serde_json::from_str(&content)
            .map_err(|e| format!("Failed to parse config file: {}", e))?;

        Self::from_config(&config)
            .ok_or_else(|| format!("No valid plex configuration in {}", path.as_ref().display()))
    }

    /// Create a client for these settings
    pub fn into_client(self) -> PlexClient {
        PlexClient::with_http_client(
            &self.url,
            &self.token,
            http_client::new_http_client(self.timeout_secs),
        )
    }
}
