//! Plex Media Server client
//!
//! One HTTP round trip per operation: list library sections, find the track
//! playing on a player, fetch album art.

pub mod client;
pub mod decode;
pub mod error;
pub mod types;

pub use client::PlexClient;
pub use error::{PlexError, Result};
pub use types::{LibrarySection, Session, TrackInfo};
