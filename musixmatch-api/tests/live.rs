//! Tests against the real API.
//!
//! Ignored by default. Run with a valid desktop token:
//!
//! ```sh
//! MUSIXMATCH_TOKEN=... cargo test -p musixmatch-api --test live -- --ignored
//! ```

use musixmatch_api::types::{SearchQuery, SubtitleFormat};
use musixmatch_api::{ApiContext, MusixmatchClient};

fn client() -> MusixmatchClient {
    let token = std::env::var("MUSIXMATCH_TOKEN").expect("MUSIXMATCH_TOKEN not set");
    MusixmatchClient::new(token, ApiContext::Desktop).unwrap()
}

#[test]
#[ignore = "hits the network"]
fn issue_token_yields_usable_client() {
    let issued = MusixmatchClient::issue_token(ApiContext::Desktop)
        .unwrap()
        .expect("token.get returned no usable token");
    assert!(!issued.user_token.is_empty());
    let second = issued.client().unwrap();
    assert_eq!(second.token().credential(), issued.user_token);
}

#[test]
#[ignore = "hits the network"]
fn search_by_query() {
    let tracks = client().search(&SearchQuery::text("Kobaryo - Bookmaker")).unwrap();
    assert!(tracks.iter().all(|t| t.track_id.is_some()));
}

#[test]
#[ignore = "hits the network"]
fn search_by_lyrics() {
    let query = SearchQuery {
        lyrics: Some("It's just a shot away".into()),
        ..SearchQuery::default()
    };
    client().search(&query).unwrap();
}

#[test]
#[ignore = "hits the network"]
fn search_nonexistent_track_is_empty() {
    let query = SearchQuery::artist_title("THIS1ARTIST3DOES3NOT7EXIST", "THIS1TRACK3DOES3NOT7EXIST");
    assert!(client().search(&query).unwrap().is_empty());
}

#[test]
#[ignore = "hits the network"]
fn search_with_empty_criteria() {
    client().search(&SearchQuery::default()).unwrap();
}

#[test]
#[ignore = "hits the network"]
fn fetch_everything_for_lost_umbrella() {
    let track = client().track_by_id(247_979_107);
    assert!(track.fetch_lyrics().unwrap().is_some());
    assert!(track.fetch_subtitles(SubtitleFormat::Mxm).unwrap().is_some());
    assert!(track.fetch_richsync().unwrap().is_some());
    assert!(track.fetch_translations("rja").unwrap().is_some());
    assert!(track.fetch_snippet().unwrap().is_some());
}
