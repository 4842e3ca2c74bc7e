//! Decoders for the two response formats the server may use.
//!
//! Plex answers in XML unless asked otherwise, but JSON is just as common.
//! Both are decoded into the same typed records; anything that does not fit
//! the expected shape becomes a `PlexError::Decode`.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::helpers::http_client::HttpResponse;
use crate::plex::error::{PlexError, Result};
use crate::plex::types::{LibrarySection, Session};

const SECTIONS_PATH: &str = "MediaContainer.Directory";
const SESSIONS_PATH: &str = "MediaContainer.Metadata";
const CONTAINER: &str = "MediaContainer";

/// Metadata type (JSON) and element name (XML) of music sessions
const TRACK_TYPE: &str = "track";
const TRACK_ELEMENT: &str = "Track";

/// Encoding of a response body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseFormat {
    Json,
    Xml,
}

impl ResponseFormat {
    /// Pick the format from the content type, falling back to sniffing the body.
    pub fn detect(content_type: Option<&str>, body: &[u8]) -> Self {
        if let Some(ct) = content_type {
            let ct = ct.to_ascii_lowercase();
            if ct.contains("json") {
                return ResponseFormat::Json;
            }
            if ct.contains("xml") {
                return ResponseFormat::Xml;
            }
        }

        match body.iter().find(|b| !b.is_ascii_whitespace()) {
            Some(b'<') => ResponseFormat::Xml,
            _ => ResponseFormat::Json,
        }
    }

    pub fn of(response: &HttpResponse) -> Self {
        Self::detect(response.content_type.as_deref(), &response.body)
    }
}

/// Decodes a `/status/sessions` body into sessions
///
/// Only music track sessions are returned, in server order. Video and photo
/// sessions are skipped by every implementation.
pub trait SessionDecoder {
    fn decode(&self, body: &[u8]) -> Result<Vec<Session>>;
}

/// Decoder for the JSON variant of the sessions document
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonSessionDecoder;

/// Decoder for the XML variant of the sessions document
#[derive(Debug, Default, Clone, Copy)]
pub struct XmlSessionDecoder;

/// Get the session decoder for a format
pub fn session_decoder(format: ResponseFormat) -> &'static dyn SessionDecoder {
    match format {
        ResponseFormat::Json => &JsonSessionDecoder,
        ResponseFormat::Xml => &XmlSessionDecoder,
    }
}

/// Decode the sessions in a response, choosing the decoder by format
pub fn decode_sessions(response: &HttpResponse) -> Result<Vec<Session>> {
    session_decoder(ResponseFormat::of(response)).decode(&response.body)
}

/// Decode the library sections in a response, choosing the decoder by format
pub fn decode_sections(response: &HttpResponse) -> Result<Vec<LibrarySection>> {
    match ResponseFormat::of(response) {
        ResponseFormat::Json => decode_json_sections(&response.body),
        ResponseFormat::Xml => decode_xml_sections(&response.body),
    }
}

// ---------------------------------------------------------------------------
// JSON
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct JsonSectionsEnvelope {
    #[serde(rename = "MediaContainer")]
    container: JsonSectionsContainer,
}

#[derive(Debug, Deserialize)]
struct JsonSectionsContainer {
    #[serde(rename = "Directory", default)]
    directory: Vec<LibrarySection>,
}

#[derive(Debug, Deserialize)]
struct JsonSessionsEnvelope {
    #[serde(rename = "MediaContainer")]
    container: JsonSessionsContainer,
}

#[derive(Debug, Deserialize)]
struct JsonSessionsContainer {
    #[serde(rename = "Metadata", default)]
    metadata: Vec<JsonMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JsonMetadata {
    #[serde(rename = "type")]
    kind: Option<String>,
    grandparent_title: Option<String>,
    parent_title: Option<String>,
    title: Option<String>,
    parent_thumb: Option<String>,
    #[serde(rename = "Player")]
    player: Option<JsonPlayer>,
    #[serde(rename = "User")]
    user: Option<JsonUser>,
}

#[derive(Debug, Deserialize)]
struct JsonPlayer {
    title: Option<String>,
    product: Option<String>,
    #[serde(rename = "userID", default, deserialize_with = "id_string")]
    user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct JsonUser {
    #[serde(default, deserialize_with = "id_string")]
    id: Option<String>,
}

/// User ids show up both as strings and as numbers depending on server version
fn id_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(i64),
    }

    Ok(Option::<Id>::deserialize(deserializer)?.map(|id| match id {
        Id::Text(s) => s,
        Id::Number(n) => n.to_string(),
    }))
}

fn decode_json_sections(body: &[u8]) -> Result<Vec<LibrarySection>> {
    let envelope: JsonSectionsEnvelope =
        serde_json::from_slice(body).map_err(|e| PlexError::decode(SECTIONS_PATH, e))?;
    Ok(envelope.container.directory)
}

impl SessionDecoder for JsonSessionDecoder {
    fn decode(&self, body: &[u8]) -> Result<Vec<Session>> {
        let envelope: JsonSessionsEnvelope =
            serde_json::from_slice(body).map_err(|e| PlexError::decode(SESSIONS_PATH, e))?;

        let sessions = envelope
            .container
            .metadata
            .into_iter()
            .filter(|m| m.kind.as_deref() == Some(TRACK_TYPE))
            .map(|m| {
                let (player_title, player_product, player_user) = match m.player {
                    Some(p) => (p.title, p.product, p.user_id),
                    None => (None, None, None),
                };
                Session {
                    player_title,
                    player_product,
                    user_id: player_user.or(m.user.and_then(|u| u.id)),
                    grandparent_title: m.grandparent_title,
                    parent_title: m.parent_title,
                    title: m.title,
                    parent_thumb: m.parent_thumb,
                }
            })
            .collect();

        Ok(sessions)
    }
}

// ---------------------------------------------------------------------------
// XML
// ---------------------------------------------------------------------------

/// Minimal element tree; text content is not needed by any Plex endpoint we use
#[derive(Debug, Default)]
struct XmlElement {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<XmlElement>,
}

impl XmlElement {
    fn attr(&self, key: &str) -> Option<String> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
    }

    fn child(&self, name: &str) -> Option<&XmlElement> {
        self.children.iter().find(|c| c.name == name)
    }

    fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlElement> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }
}

fn element_from(start: &BytesStart, path: &str) -> Result<XmlElement> {
    let mut element = XmlElement {
        name: String::from_utf8_lossy(start.name().as_ref()).into_owned(),
        ..Default::default()
    };

    for attr in start.attributes() {
        let attr = attr.map_err(|e| PlexError::decode(path, e))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|e| PlexError::decode(path, e))?
            .into_owned();
        element.attributes.push((key, value));
    }

    Ok(element)
}

fn attach(
    stack: &mut Vec<XmlElement>,
    root: &mut Option<XmlElement>,
    element: XmlElement,
    path: &str,
) -> Result<()> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(element);
    } else if root.is_none() {
        *root = Some(element);
    } else {
        return Err(PlexError::decode(path, "document has more than one root element"));
    }
    Ok(())
}

/// Parse an XML document and check that its root is a `MediaContainer`
fn parse_container(body: &[u8], path: &str) -> Result<XmlElement> {
    let text = std::str::from_utf8(body).map_err(|e| PlexError::decode(path, e))?;

    let mut reader = Reader::from_str(text);
    reader.trim_text(true);

    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => stack.push(element_from(&e, path)?),
            Ok(Event::Empty(e)) => {
                let element = element_from(&e, path)?;
                attach(&mut stack, &mut root, element, path)?;
            }
            Ok(Event::End(_)) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| PlexError::decode(path, "unbalanced closing tag"))?;
                attach(&mut stack, &mut root, element, path)?;
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(PlexError::decode(
                    path,
                    format!("at position {}: {}", reader.buffer_position(), e),
                ))
            }
        }
    }

    if !stack.is_empty() {
        return Err(PlexError::decode(path, "unexpected end of document"));
    }

    match root {
        Some(element) if element.name == CONTAINER => Ok(element),
        Some(element) => Err(PlexError::decode(
            path,
            format!("expected root element {}, found {}", CONTAINER, element.name),
        )),
        None => Err(PlexError::decode(path, "document is empty")),
    }
}

fn decode_xml_sections(body: &[u8]) -> Result<Vec<LibrarySection>> {
    let container = parse_container(body, SECTIONS_PATH)?;

    let sections = container
        .children_named("Directory")
        .map(|dir| {
            dir.attributes
                .iter()
                .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                .collect::<LibrarySection>()
        })
        .collect();

    Ok(sections)
}

impl SessionDecoder for XmlSessionDecoder {
    fn decode(&self, body: &[u8]) -> Result<Vec<Session>> {
        let container = parse_container(body, "MediaContainer.Track")?;

        let sessions = container
            .children_named(TRACK_ELEMENT)
            .map(|track| {
                let player = track.child("Player");
                let player_user = player.and_then(|p| p.attr("userID"));
                let user = track.child("User").and_then(|u| u.attr("id"));
                Session {
                    player_title: player.and_then(|p| p.attr("title")),
                    player_product: player.and_then(|p| p.attr("product")),
                    user_id: player_user.or(user),
                    grandparent_title: track.attr("grandparentTitle"),
                    parent_title: track.attr("parentTitle"),
                    title: track.attr("title"),
                    parent_thumb: track.attr("parentThumb"),
                }
            })
            .collect();

        Ok(sessions)
    }
}
