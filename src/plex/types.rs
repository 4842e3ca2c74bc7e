use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::plex::error::{PlexError, Result};

/// A library section as returned by the server, field name to value.
///
/// The server's schema for sections is not enforced beyond being a mapping.
pub type LibrarySection = Map<String, Value>;

/// The track currently playing on a player
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackInfo {
    /// Artist (the track's grandparent)
    pub artist: String,
    /// Album (the track's parent)
    pub album: String,
    pub title: String,
    /// Server path of the album thumbnail
    pub thumb: String,
}

/// An active playback session, independent of the response format it came from.
///
/// Fields are optional because not every session is a music track (videos carry
/// no album information), but each one was type-checked while decoding.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub player_title: Option<String>,
    pub player_product: Option<String>,
    pub user_id: Option<String>,
    pub grandparent_title: Option<String>,
    pub parent_title: Option<String>,
    pub title: Option<String>,
    pub parent_thumb: Option<String>,
}

impl Session {
    /// Check whether this session belongs to the given player (and user, if given).
    ///
    /// The player is matched by its product name or its title.
    pub fn matches(&self, client: &str, user_id: Option<&str>) -> bool {
        let player_matches = self.player_product.as_deref() == Some(client)
            || self.player_title.as_deref() == Some(client);

        match user_id {
            Some(uid) => player_matches && self.user_id.as_deref() == Some(uid),
            None => player_matches,
        }
    }

    /// Build the track info for this session.
    ///
    /// Fails on the first missing field rather than returning a partial result.
    pub fn to_track_info(&self) -> Result<TrackInfo> {
        Ok(TrackInfo {
            artist: required(&self.grandparent_title, "grandparentTitle")?,
            album: required(&self.parent_title, "parentTitle")?,
            title: required(&self.title, "title")?,
            thumb: required(&self.parent_thumb, "parentThumb")?,
        })
    }
}

fn required(field: &Option<String>, name: &str) -> Result<String> {
    field
        .clone()
        .ok_or_else(|| PlexError::decode(format!("session.{}", name), "field is missing"))
}
