use std::fmt;
use log::{debug, info};

use crate::helpers::http_client::{self, HttpClient, HttpMethod, HttpResponse, DEFAULT_TIMEOUT_SECS};
use crate::plex::decode;
use crate::plex::error::{PlexError, Result};
use crate::plex::types::{LibrarySection, Session, TrackInfo};

/// Header carrying the authentication token on every request
pub const TOKEN_HEADER: &str = "X-Plex-Token";

pub const SECTIONS_ENDPOINT: &str = "/library/sections";
pub const SESSIONS_ENDPOINT: &str = "/status/sessions";

/// Client for a Plex Media Server
///
/// The client is immutable after construction, so a single instance can be
/// shared between threads.
///
/// # Example
/// ```no_run
/// use plexclient::PlexClient;
///
/// let client = PlexClient::new("http://192.168.1.10:32400", "my-token");
/// let track = client.get_current_track("Plexamp", None)?;
/// let art = client.get_album_art(&track.thumb)?;
/// println!("{} - {} ({} bytes of art)", track.artist, track.title, art.len());
/// # Ok::<(), plexclient::PlexError>(())
/// ```
#[derive(Clone)]
pub struct PlexClient {
    base_url: String,
    token: String,
    http: Box<dyn HttpClient>,
}

impl fmt::Debug for PlexClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlexClient")
            .field("base_url", &self.base_url)
            .field("token", &"<redacted>")
            .field("http", &self.http)
            .finish()
    }
}

impl PlexClient {
    /// Create a new client using the default HTTP transport
    ///
    /// No network activity happens here.
    pub fn new(base_url: &str, token: &str) -> Self {
        let http = http_client::new_http_client(DEFAULT_TIMEOUT_SECS);
        Self::with_http_client(base_url, token, http)
    }

    /// Create a new client on top of a custom HTTP transport
    pub fn with_http_client(base_url: &str, token: &str, http: Box<dyn HttpClient>) -> Self {
        PlexClient {
            base_url: base_url.to_string(),
            token: token.to_string(),
            http,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send a request to an endpoint of the server
    ///
    /// The URL is the base URL followed by `endpoint` as given; slashes are
    /// not normalized. `payload` is only sent for POST requests.
    pub fn make_request(
        &self,
        method: HttpMethod,
        endpoint: &str,
        payload: Option<&str>,
    ) -> Result<Vec<u8>> {
        let url = format!("{}{}", self.base_url, endpoint);
        Ok(self.send(method, &url, payload)?.body)
    }

    /// Send a request to an absolute URL, with the same headers as `make_request`
    pub fn request_url(
        &self,
        method: HttpMethod,
        url: &str,
        payload: Option<&str>,
    ) -> Result<Vec<u8>> {
        Ok(self.send(method, url, payload)?.body)
    }

    fn send(&self, method: HttpMethod, url: &str, payload: Option<&str>) -> Result<HttpResponse> {
        let body = match method {
            HttpMethod::Post => payload.map(str::as_bytes),
            HttpMethod::Get => None,
        };
        let headers = [(TOKEN_HEADER, self.token.as_str())];

        let response = self.http.request(method, url, &headers, body)?;
        debug!(
            "{} {} returned {} ({} bytes)",
            method,
            url,
            response.status,
            response.body.len()
        );
        Ok(response)
    }

    /// List the library sections of the server, in server order
    pub fn list_library_sections(&self) -> Result<Vec<LibrarySection>> {
        let url = format!("{}{}", self.base_url, SECTIONS_ENDPOINT);
        let response = self.send(HttpMethod::Get, &url, None)?;
        let sections = decode::decode_sections(&response)?;
        debug!("Found {} library sections", sections.len());
        Ok(sections)
    }

    /// Get all active playback sessions
    pub fn sessions(&self) -> Result<Vec<Session>> {
        let url = format!("{}{}", self.base_url, SESSIONS_ENDPOINT);
        let response = self.send(HttpMethod::Get, &url, None)?;
        decode::decode_sessions(&response)
    }

    /// Get the track currently playing on a player
    ///
    /// # Arguments
    /// * `client` - Player product or title, e.g. "Plexamp"
    /// * `user_id` - If given, the session must also belong to this user
    pub fn get_current_track(&self, client: &str, user_id: Option<&str>) -> Result<TrackInfo> {
        let sessions = self.sessions()?;

        match sessions.iter().find(|s| s.matches(client, user_id)) {
            Some(session) => {
                let track = session.to_track_info()?;
                info!("{} is playing {} - {}", client, track.artist, track.title);
                Ok(track)
            }
            None => {
                debug!("None of {} sessions matched {}", sessions.len(), client);
                Err(PlexError::NotFound {
                    client: client.to_string(),
                })
            }
        }
    }

    /// Fetch album art, returning the response body untouched
    ///
    /// `url` is either absolute or a server path such as the `thumb` of a
    /// `TrackInfo`, which is resolved against the base URL.
    pub fn get_album_art(&self, url: &str) -> Result<Vec<u8>> {
        if url.starts_with('/') {
            self.make_request(HttpMethod::Get, url, None)
        } else {
            self.request_url(HttpMethod::Get, url, None)
        }
    }
}
