//! Search API.
//!
//! Endpoint: `GET track.search`
//!
//! Request parameters (all optional, see [`SearchQuery`]):
//! - `q`, `q_lyrics`, `q_artist`, `q_track`, `q_album` — text filters
//! - `track_isrc`, `track_spotify_id` — external ID filters
//! - `f_has_lyrics`, `f_has_subtitle` — `1` to require lyrics / subtitles
//! - `f_lyrics_language` — lyrics language (ISO 639-1)
//! - `s_track_rating` — `asc` / `desc`
//! - `page`, `page_size` — pagination
//!
//! Response body:
//! ```json
//! {
//!   "track_list": [
//!     { "track": { "track_id": 123, "track_name": "...", "artist_name": "...", ... } }
//!   ]
//! }
//! ```
//!
//! The number of matches on the server is in `message.header.available`.

use crate::client::MusixmatchClient;
use crate::error::Result;
use crate::track::TrackHandle;
use crate::types::{SearchQuery, TrackEntry};
use tracing::debug;

impl MusixmatchClient {
    /// Search for tracks.
    ///
    /// Each result is bound to this client. No matches, or an unusable
    /// response, give an empty `Vec`.
    ///
    /// # Errors
    ///
    /// - [`MusixmatchError::Http`](crate::MusixmatchError::Http) — network failure
    /// - [`MusixmatchError::Status`](crate::MusixmatchError::Status) — non-success HTTP status
    pub fn search(&self, query: &SearchQuery) -> Result<Vec<TrackHandle>> {
        let Some(env) = self.call("track.search", &query.to_params())? else {
            return Ok(Vec::new());
        };
        let entries: Vec<TrackEntry> = env.body_list("track_list").unwrap_or_default();
        debug!(status = env.status_code(), count = entries.len(), "track.search");
        Ok(entries
            .into_iter()
            .map(|entry| self.track(entry.track))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use crate::MusixmatchClient;
    use crate::context::ApiContext;
    use crate::http::mock::{self, MockBackend};
    use crate::http::RawResponse;
    use crate::transport::RedirectPolicy;
    use crate::types::SearchQuery;
    use serde_json::json;

    fn client(backend: MockBackend) -> MusixmatchClient {
        MusixmatchClient::with_backend("t", ApiContext::Desktop, Box::new(backend), RedirectPolicy::default())
    }

    #[test]
    fn maps_criteria_and_binds_results() {
        let mut backend = MockBackend::new();
        backend
            .expect_execute()
            .withf(|req| {
                req.url.ends_with("track.search")
                    && mock::query(req, "q_artist") == Some("Kobaryo")
                    && mock::query(req, "q_track") == Some("Bookmaker")
                    && mock::query(req, "f_has_subtitle") == Some("1")
                    && mock::query(req, "q_lyrics").is_none()
            })
            .times(1)
            .returning(|_| {
                Ok(mock::envelope(200, json!({
                    "track_list": [
                        { "track": { "track_id": 1, "track_name": "Bookmaker", "artist_name": "Kobaryo" } },
                        { "track": { "track_id": 2, "commontrack_id": 20 } }
                    ]
                })))
            });

        let query = SearchQuery {
            has_subtitle: Some(true),
            ..SearchQuery::artist_title("Kobaryo", "Bookmaker")
        };
        let tracks = client(backend).search(&query).unwrap();
        assert_eq!(tracks.len(), 2);
        assert_eq!(tracks[0].track_name.as_deref(), Some("Bookmaker"));
        assert_eq!(tracks[1].commontrack_id, Some(20));
        assert_eq!(tracks[1].client().context(), ApiContext::Desktop);
    }

    #[test]
    fn malformed_result_does_not_hide_the_others() {
        let mut backend = MockBackend::new();
        backend.expect_execute().times(1).returning(|_| {
            Ok(mock::envelope(200, json!({
                "track_list": [
                    { "track": { "track_id": 1, "track_name": "Lost Umbrella" } },
                    { "track": { "track_id": 2, "track_rating": "n/a" } },
                    { "track": { "track_id": 3 } }
                ]
            })))
        });
        let tracks = client(backend).search(&SearchQuery::text("umbrella")).unwrap();
        let ids: Vec<_> = tracks.iter().map(|t| t.track_id).collect();
        assert_eq!(ids, [Some(1), Some(3)]);
    }

    #[test]
    fn no_matches_is_empty() {
        let mut backend = MockBackend::new();
        backend
            .expect_execute()
            .times(1)
            .returning(|_| Ok(mock::envelope(200, json!({ "track_list": [] }))));
        let query = SearchQuery::artist_title(
            "THIS1ARTIST3DOES3NOT7EXIST",
            "THIS1TRACK3DOES3NOT7EXIST",
        );
        assert!(client(backend).search(&query).unwrap().is_empty());
    }

    #[test]
    fn missing_list_or_envelope_is_empty() {
        let mut backend = MockBackend::new();
        backend
            .expect_execute()
            .times(1)
            .returning(|_| Ok(mock::envelope(401, json!(""))));
        assert!(client(backend).search(&SearchQuery::default()).unwrap().is_empty());

        let mut backend = MockBackend::new();
        backend
            .expect_execute()
            .times(1)
            .returning(|_| Ok(RawResponse::empty()));
        assert!(client(backend).search(&SearchQuery::text("x")).unwrap().is_empty());
    }
}
