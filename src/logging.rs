use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::Path;
use env_logger::{Builder, Target, WriteStyle};
use log::{info, LevelFilter};
use serde::{Deserialize, Serialize};

/// Logging subsystems of the Plex client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoggingSubsystem {
    /// Plex client operations and response decoding
    #[serde(rename = "client")]
    Client,
    /// HTTP transport
    #[serde(rename = "http")]
    Http,
    /// Configuration loading and parsing
    #[serde(rename = "config")]
    Config,
}

impl LoggingSubsystem {
    /// Get the module prefix for this subsystem
    pub fn module_prefix(&self) -> &'static str {
        match self {
            LoggingSubsystem::Client => "plexclient::plex",
            LoggingSubsystem::Http => "plexclient::helpers::http_client,ureq",
            LoggingSubsystem::Config => "plexclient::config",
        }
    }

    fn parse(name: &str) -> Option<LoggingSubsystem> {
        match name.to_lowercase().as_str() {
            "client" | "plex" => Some(LoggingSubsystem::Client),
            "http" => Some(LoggingSubsystem::Http),
            "config" => Some(LoggingSubsystem::Config),
            _ => None,
        }
    }
}

/// Logging configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Global log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Target for log output (stdout, stderr)
    #[serde(default = "default_target")]
    pub target: String,

    /// Whether to include timestamps
    #[serde(default = "default_timestamps")]
    pub timestamps: bool,

    /// Whether to use colored output
    #[serde(default = "default_colors")]
    pub colors: bool,

    /// Subsystem-specific log levels
    #[serde(default)]
    pub subsystems: HashMap<String, String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_target() -> String {
    "stdout".to_string()
}

fn default_timestamps() -> bool {
    true
}

fn default_colors() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: default_log_level(),
            target: default_target(),
            timestamps: default_timestamps(),
            colors: default_colors(),
            subsystems: HashMap::new(),
        }
    }
}

impl LoggingConfig {
    /// Load logging configuration from a file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let content = fs::read_to_string(path.as_ref())
            .map_err(|e| format!("Failed to read logging config file: {}", e))?;

        Self::from_json(&content)
    }

    /// Load logging configuration from JSON string
    pub fn from_json(json: &str) -> Result<Self, String> {
        serde_json::from_str(json)
            .map_err(|e| format!("Failed to parse logging config: {}", e))
    }

    /// Convert string log level to LevelFilter
    fn parse_log_level(level: &str) -> LevelFilter {
        match level.to_lowercase().as_str() {
            "off" => LevelFilter::Off,
            "error" => LevelFilter::Error,
            "warn" => LevelFilter::Warn,
            "info" => LevelFilter::Info,
            "debug" => LevelFilter::Debug,
            "trace" => LevelFilter::Trace,
            _ => {
                eprintln!("Warning: Unknown log level '{}', defaulting to 'info'", level);
                LevelFilter::Info
            }
        }
    }

    /// Module filters derived from the subsystem levels, as (module, level) pairs
    fn module_filters(&self) -> Vec<(String, LevelFilter)> {
        let mut filters = Vec::new();
        for (name, level) in &self.subsystems {
            let level = Self::parse_log_level(level);
            match LoggingSubsystem::parse(name) {
                Some(subsystem) => {
                    for prefix in subsystem.module_prefix().split(',') {
                        filters.push((prefix.trim().to_string(), level));
                    }
                }
                // Allow custom module specifications
                None => filters.push((name.clone(), level)),
            }
        }
        filters.sort();
        filters
    }

    /// Build the environment filter string for env_logger
    pub fn build_filter_string(&self) -> String {
        let mut parts = vec![self.level.to_lowercase()];
        for (module, level) in self.module_filters() {
            parts.push(format!("{}={}", module, level.as_str().to_lowercase()));
        }
        parts.join(",")
    }

    /// Initialize the logger with this configuration
    pub fn initialize_logger(&self) -> Result<(), String> {
        let mut builder = Builder::new();

        builder.filter(None, Self::parse_log_level(&self.level));
        for (module, level) in self.module_filters() {
            builder.filter(Some(module.as_str()), level);
        }

        // RUST_LOG overrides the configured levels
        builder.parse_env("RUST_LOG");

        builder.write_style(if self.colors { WriteStyle::Auto } else { WriteStyle::Never });

        match self.target.to_lowercase().as_str() {
            "stdout" => {
                builder.target(Target::Stdout);
            }
            "stderr" => {
                builder.target(Target::Stderr);
            }
            _ => return Err(format!("Unknown logging target: {}", self.target)),
        }

        let timestamps = self.timestamps;
        builder.format(move |buf, record| {
            if timestamps {
                write!(buf, "[{}] ", chrono::Local::now().format("%Y-%m-%d %H:%M:%S"))?;
            }
            writeln!(buf, "[{}] {}", record.level(), record.args())
        });

        builder.try_init()
            .map_err(|e| format!("Failed to initialize logger: {}", e))?;

        info!("Logging initialized with filter: {}", self.build_filter_string());
        Ok(())
    }
}

/// Initialize logging from a configuration file path
pub fn initialize_logging_from_file<P: AsRef<Path>>(config_path: P) -> Result<(), String> {
    LoggingConfig::from_file(config_path)?.initialize_logger()
}

/// Initialize logging with default configuration
pub fn initialize_default_logging() -> Result<(), String> {
    LoggingConfig::default().initialize_logger()
}
