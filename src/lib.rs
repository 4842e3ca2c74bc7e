/// Plex Media Server client and response decoding
pub mod plex;

/// Helper utilities for HTTP and other common tasks
pub mod helpers;

/// Configuration file handling
pub mod config;

/// Logger setup for the command line tools
pub mod logging;

// Re-export the client types for easier access
pub use plex::{LibrarySection, PlexClient, PlexError, Session, TrackInfo};
