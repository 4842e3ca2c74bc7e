//! Integration tests for the Plex client.
//!
//! The real ureq transport talks to a wiremock server. The client is
//! synchronous, so every call runs on a blocking task.

use std::net::TcpListener;

use plexclient::helpers::http_client::{HttpClientError, UreqHttpClient};
use plexclient::{PlexClient, PlexError, TrackInfo};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKEN: &str = "test-token";

const SESSIONS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<MediaContainer size="2">
  <Track grandparentTitle="Other Artist" parentTitle="Other Album" title="Other Song"
         parentThumb="/thumb/b">
    <Player product="Plex Web" title="Chrome" userID="1"/>
  </Track>
  <Track grandparentTitle="Artist A" parentTitle="Album A" title="Song A" parentThumb="/thumb/a">
    <Player product="X" title="Kitchen" userID="5"/>
  </Track>
</MediaContainer>"#;

async fn run_blocking<T, F>(f: F) -> T
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await.expect("blocking task panicked")
}

fn client_for(server: &MockServer) -> PlexClient {
    PlexClient::new(&server.uri(), TOKEN)
}

/// Base URL of a local port that nothing listens on
fn dead_server_uri() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind local port");
    let addr = listener.local_addr().expect("local address");
    drop(listener);
    format!("http://{}", addr)
}

// =============================================================================
// Library sections
// =============================================================================

mod library_sections {
    use super::*;

    #[tokio::test]
    async fn test_sections_in_server_order() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/library/sections"))
            .and(header("X-Plex-Token", TOKEN))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                r#"{"MediaContainer":{"size":3,"Directory":[
                    {"key":"3","title":"Shows"},
                    {"key":"1","title":"Movies"},
                    {"key":"2","title":"Music"}]}}"#,
                "application/json",
            ))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let sections = run_blocking(move || client.list_library_sections()).await.unwrap();

        let keys: Vec<_> = sections
            .iter()
            .map(|s| s["key"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(keys, vec!["3", "1", "2"]);
    }

    #[tokio::test]
    async fn test_sections_xml() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/library/sections"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                r#"<MediaContainer size="1">
                    <Directory key="1" title="Music" type="artist"/>
                </MediaContainer>"#,
                "text/xml",
            ))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let sections = run_blocking(move || client.list_library_sections()).await.unwrap();
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0]["type"], "artist");
    }

    #[tokio::test]
    async fn test_sections_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/library/sections"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(r#"{"MediaContainer":"nope"}"#, "application/json"),
            )
            .mount(&server)
            .await;

        let client = client_for(&server);
        let result = run_blocking(move || client.list_library_sections()).await;
        assert!(matches!(result, Err(PlexError::Decode { .. })));
    }

    #[tokio::test]
    async fn test_error_status_is_transport_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/library/sections"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let client = PlexClient::new(&server.uri(), "wrong-token");
        let result = run_blocking(move || client.list_library_sections()).await;
        match result {
            Err(PlexError::Transport(HttpClientError::Status { code })) => assert_eq!(code, 401),
            other => panic!("Expected status error, got {:?}", other),
        }
    }
}

// =============================================================================
// Current track
// =============================================================================

mod current_track {
    use super::*;

    async fn sessions_server(body: &str, content_type: &str) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/status/sessions"))
            .and(header("X-Plex-Token", TOKEN))
            .respond_with(ResponseTemplate::new(200).set_body_raw(body.to_string(), content_type))
            .mount(&server)
            .await;
        server
    }

    #[tokio::test]
    async fn test_matching_client_and_user() {
        let server = sessions_server(SESSIONS_XML, "text/xml;charset=utf-8").await;
        let client = client_for(&server);

        let track = run_blocking(move || client.get_current_track("X", Some("5"))).await.unwrap();
        assert_eq!(
            track,
            TrackInfo {
                artist: "Artist A".to_string(),
                album: "Album A".to_string(),
                title: "Song A".to_string(),
                thumb: "/thumb/a".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_json_sessions_by_player_title() {
        let body = r#"{"MediaContainer":{"size":1,"Metadata":[{"type":"track",
            "grandparentTitle":"Artist A","parentTitle":"Album A","title":"Song A",
            "parentThumb":"/thumb/a","Player":{"title":"Kitchen","product":"Plexamp"}}]}}"#;
        let server = sessions_server(body, "application/json").await;
        let client = client_for(&server);

        let track = run_blocking(move || client.get_current_track("Kitchen", None)).await.unwrap();
        assert_eq!(track.artist, "Artist A");
        assert_eq!(track.thumb, "/thumb/a");
    }

    #[tokio::test]
    async fn test_json_video_on_same_player_is_skipped() {
        let body = r#"{"MediaContainer":{"size":2,"Metadata":[
            {"type":"movie","title":"Some Movie","Player":{"product":"X","userID":5}},
            {"type":"track","grandparentTitle":"Artist A","parentTitle":"Album A",
             "title":"Song A","parentThumb":"/thumb/a","Player":{"product":"X","userID":5}}]}}"#;
        let server = sessions_server(body, "application/json").await;
        let client = client_for(&server);

        let track = run_blocking(move || client.get_current_track("X", Some("5"))).await.unwrap();
        assert_eq!(track.title, "Song A");
        assert_eq!(track.album, "Album A");
    }

    #[tokio::test]
    async fn test_no_matching_session() {
        let server = sessions_server(SESSIONS_XML, "text/xml").await;
        let client = client_for(&server);

        let result = run_blocking(move || client.get_current_track("Living Room", None)).await;
        match result {
            Err(PlexError::NotFound { client }) => assert_eq!(client, "Living Room"),
            other => panic!("Expected NotFound, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_wrong_user() {
        let server = sessions_server(SESSIONS_XML, "text/xml").await;
        let client = client_for(&server);

        let result = run_blocking(move || client.get_current_track("X", Some("1"))).await;
        assert!(matches!(result, Err(PlexError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_malformed_sessions() {
        let server = sessions_server(
            r#"{"MediaContainer":{"Metadata":[{"type":"track","title":1}]}}"#,
            "application/json",
        )
        .await;
        let client = client_for(&server);

        let result = run_blocking(move || client.get_current_track("X", None)).await;
        assert!(matches!(result, Err(PlexError::Decode { .. })));
    }
}

// =============================================================================
// Album art
// =============================================================================

mod album_art {
    use super::*;

    #[tokio::test]
    async fn test_bytes_are_returned_untouched() {
        let image: Vec<u8> = (0..=255u8).chain([0x89, b'P', b'N', b'G', 0, 0]).collect();

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/library/metadata/10/thumb/1"))
            .and(header("X-Plex-Token", TOKEN))
            .respond_with(ResponseTemplate::new(200).set_body_raw(image.clone(), "image/jpeg"))
            .expect(2)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let absolute = format!("{}/library/metadata/10/thumb/1", server.uri());
        let (by_path, by_url) = run_blocking(move || {
            (
                client.get_album_art("/library/metadata/10/thumb/1"),
                client.get_album_art(&absolute),
            )
        })
        .await;

        assert_eq!(by_path.unwrap(), image);
        assert_eq!(by_url.unwrap(), image);
    }

    #[tokio::test]
    async fn test_oversized_body_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/thumb/big"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(vec![0u8; 1025], "image/jpeg"))
            .mount(&server)
            .await;

        let http = UreqHttpClient::default().with_max_body_bytes(1024);
        let client = PlexClient::with_http_client(&server.uri(), TOKEN, Box::new(http));
        let result = run_blocking(move || client.get_album_art("/thumb/big")).await;
        match result {
            Err(PlexError::Transport(HttpClientError::BodyRead(msg))) => {
                assert!(msg.contains("1024"))
            }
            other => panic!("Expected BodyRead error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unreachable_server() {
        let client = PlexClient::new(&dead_server_uri(), TOKEN);
        let result = run_blocking(move || client.get_album_art("/thumb/a")).await;
        assert!(matches!(
            result,
            Err(PlexError::Transport(HttpClientError::RequestError(_)))
        ));
    }
}
