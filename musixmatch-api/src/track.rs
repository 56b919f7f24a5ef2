//! Track-scoped APIs: lyrics, snippet, subtitles, richsync, translations,
//! lyrics submission.
//!
//! Every call is keyed by `track_id` and, when known, `commontrack_id`.
//!
//! # Endpoints
//!
//! ## `fetch_lyrics` — `GET track.lyrics.get`
//!
//! Request: `track_id=123&part=user,lyrics_verified_by`
//!
//! Response body: `{ "lyrics": { "lyrics_id": 1, "lyrics_body": "...", "lyrics_user": { "user": {...} } } }`
//!
//! ## `fetch_snippet` — `GET track.snippet.get`
//!
//! Response body: `{ "snippet": { "snippet_body": "..." } }`
//!
//! ## `fetch_subtitles` — `GET track.subtitle.get`
//!
//! Request: `track_id=123&subtitle_format=mxm`
//!
//! Response body: `{ "subtitle": { "subtitle_body": "[{\"text\":...}]" } }`
//!
//! ## `fetch_richsync` — `GET track.richsync.get`
//!
//! Response body: `{ "richsync": { "richsync_body": "[{\"ts\":...}]" } }`
//!
//! ## `fetch_translations` — `GET crowd.track.translations.get`
//!
//! Request: `track_id=123&selected_language=en&comment_format=text&part=user`
//!
//! Response body: `{ "translations_list": [ { "translation": {...} } ] }`
//!
//! ## `submit_lyrics` — `POST track.lyrics.post`
//!
//! Request: `track_id=123&q_track=...&q_artist=...`, JSON body
//! `{ "lyrics_body": "..." }`
//!
//! Success is `message.header.status_code == 200`; the body is empty.
//!
//! A track the API has no lyrics for answers with status `404` and an empty
//! body; the fetch methods report that as `Ok(None)`.

use crate::client::MusixmatchClient;
use crate::error::{MusixmatchError, Result};
use crate::transport::Params;
use crate::types::{
    Lyrics, Richsync, Snippet, Subtitle, SubtitleFormat, Track, Translation, TranslationEntry,
};
use serde::Serialize;
use std::ops::Deref;
use tracing::warn;

/// A [`Track`] bound to the client that fetched it.
///
/// Derefs to [`Track`] for field access.
#[derive(Debug, Clone)]
pub struct TrackHandle {
    client: MusixmatchClient,
    track: Track,
}

#[derive(Serialize)]
struct LyricsSubmission<'a> {
    lyrics_body: &'a str,
}

impl TrackHandle {
    pub(crate) fn new(client: MusixmatchClient, track: Track) -> Self {
        Self { client, track }
    }

    pub fn track(&self) -> &Track {
        &self.track
    }

    pub fn into_track(self) -> Track {
        self.track
    }

    pub fn client(&self) -> &MusixmatchClient {
        &self.client
    }

    fn id_params(&self) -> Result<Params> {
        if self.track.track_id.is_none() && self.track.commontrack_id.is_none() {
            return Err(MusixmatchError::MissingTrackId);
        }
        Ok(Params::new()
            .opt("track_id", self.track.track_id)
            .opt("commontrack_id", self.track.commontrack_id))
    }

    /// Get the plain lyrics, including the last editor.
    pub fn fetch_lyrics(&self) -> Result<Option<Lyrics>> {
        let params = self.id_params()?.set("part", "user,lyrics_verified_by");
        let resp = self.client.call("track.lyrics.get", &params)?;
        Ok(resp.and_then(|env| env.body_field("lyrics")))
    }

    /// Get the snippet (most characteristic line).
    pub fn fetch_snippet(&self) -> Result<Option<Snippet>> {
        let resp = self.client.call("track.snippet.get", &self.id_params()?)?;
        Ok(resp.and_then(|env| env.body_field("snippet")))
    }

    /// Get line-synced lyrics in `format`.
    ///
    /// The body is [`SyncBody::Structured`](crate::types::SyncBody::Structured)
    /// for [`SubtitleFormat::Mxm`] and text for the others.
    pub fn fetch_subtitles(&self, format: SubtitleFormat) -> Result<Option<Subtitle>> {
        let params = self.id_params()?.set("subtitle_format", format);
        let resp = self.client.call("track.subtitle.get", &params)?;
        Ok(resp.and_then(|env| env.body_field("subtitle")))
    }

    /// Get word-synced lyrics.
    pub fn fetch_richsync(&self) -> Result<Option<Richsync>> {
        let resp = self.client.call("track.richsync.get", &self.id_params()?)?;
        Ok(resp.and_then(|env| env.body_field("richsync")))
    }

    /// Get crowd translations into `language` (ISO 639-1, or Musixmatch
    /// script codes such as `rja` for romaji).
    pub fn fetch_translations(&self, language: &str) -> Result<Option<Vec<Translation>>> {
        let params = self
            .id_params()?
            .set("selected_language", language)
            .set("comment_format", "text")
            .set("part", "user");
        let resp = self.client.call("crowd.track.translations.get", &params)?;
        Ok(resp
            .and_then(|env| env.body_list::<TranslationEntry>("translations_list"))
            .map(|list| list.into_iter().map(|entry| entry.translation).collect()))
    }

    /// Submit lyrics for this track.
    ///
    /// `keypress_count` and `time_spent` (seconds) are the editor statistics
    /// the desktop app reports alongside a submission.
    ///
    /// Returns `true` iff the server answered with status code 200. A
    /// rejection is `Ok(false)`, not an error.
    pub fn submit_lyrics(
        &self,
        body: &str,
        keypress_count: Option<u32>,
        time_spent: Option<u32>,
    ) -> Result<bool> {
        let params = self
            .id_params()?
            .opt("q_track", self.track.track_name.as_deref())
            .opt("q_artist", self.track.artist_name.as_deref())
            .opt("q_album", self.track.album_name.as_deref())
            .opt("keypress_count", keypress_count)
            .opt("time_spent", time_spent);
        let resp = self.client.call_post(
            "track.lyrics.post",
            &params,
            &LyricsSubmission { lyrics_body: body },
        )?;

        let status = resp.as_ref().map(|env| env.status_code());
        if status == Some(200) {
            return Ok(true);
        }
        warn!(?status, track_id = ?self.track.track_id, "lyrics submission rejected");
        Ok(false)
    }
}

impl Deref for TrackHandle {
    type Target = Track;

    fn deref(&self) -> &Track {
        &self.track
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ApiContext;
    use crate::http::mock::{self, MockBackend};
    use crate::http::{HttpMethod, RawResponse};
    use crate::transport::RedirectPolicy;
    use crate::types::SyncBody;
    use serde_json::json;

    fn handle(backend: MockBackend, track: Track) -> TrackHandle {
        MusixmatchClient::with_backend("t", ApiContext::Desktop, Box::new(backend), RedirectPolicy::default())
            .track(track)
    }

    fn lost_umbrella() -> Track {
        Track {
            track_id: Some(247_979_107),
            commontrack_id: Some(117_496_017),
            track_name: Some("Lost Umbrella".into()),
            artist_name: Some("稲葉曇".into()),
            ..Track::default()
        }
    }

    #[test]
    fn id_less_track_fails_without_request() {
        let mut backend = MockBackend::new();
        backend.expect_execute().never();
        let track = handle(backend, Track::default());
        assert!(matches!(track.fetch_lyrics(), Err(MusixmatchError::MissingTrackId)));
        assert!(matches!(
            track.submit_lyrics("x", None, None),
            Err(MusixmatchError::MissingTrackId)
        ));
    }

    #[test]
    fn fetch_lyrics_sends_ids_and_part() {
        let mut backend = MockBackend::new();
        backend
            .expect_execute()
            .withf(|req| {
                req.url.ends_with("track.lyrics.get")
                    && mock::query(req, "track_id") == Some("247979107")
                    && mock::query(req, "commontrack_id") == Some("117496017")
                    && mock::query(req, "part") == Some("user,lyrics_verified_by")
            })
            .times(1)
            .returning(|_| {
                Ok(mock::envelope(200, json!({
                    "lyrics": { "lyrics_id": 5, "lyrics_body": "...", "lyrics_language": "ja" }
                })))
            });

        let lyrics = handle(backend, lost_umbrella()).fetch_lyrics().unwrap().unwrap();
        assert_eq!(lyrics.lyrics_id, Some(5));
        assert_eq!(lyrics.lyrics_language.as_deref(), Some("ja"));
    }

    #[test]
    fn fetch_lyrics_not_found_is_none() {
        let mut backend = MockBackend::new();
        backend
            .expect_execute()
            .times(1)
            .returning(|_| Ok(mock::envelope(404, json!([]))));
        assert!(handle(backend, Track::with_id(1)).fetch_lyrics().unwrap().is_none());
    }

    #[test]
    fn fetch_subtitles_uses_format() {
        let mut backend = MockBackend::new();
        backend
            .expect_execute()
            .withf(|req| {
                req.url.ends_with("track.subtitle.get")
                    && mock::query(req, "subtitle_format") == Some("lrc")
                    && mock::query(req, "commontrack_id").is_none()
            })
            .times(1)
            .returning(|_| {
                Ok(mock::envelope(200, json!({
                    "subtitle": { "subtitle_id": 3, "subtitle_body": "[00:01.00] hi" }
                })))
            });

        let sub = handle(backend, Track::with_id(1))
            .fetch_subtitles(SubtitleFormat::Lrc)
            .unwrap()
            .unwrap();
        assert_eq!(sub.subtitle_body, Some(SyncBody::Text("[00:01.00] hi".into())));
    }

    #[test]
    fn fetch_snippet_and_richsync() {
        let mut backend = MockBackend::new();
        backend
            .expect_execute()
            .withf(|req| req.url.ends_with("track.snippet.get"))
            .times(1)
            .returning(|_| Ok(mock::envelope(200, json!({ "snippet": { "snippet_body": "hook" } }))));
        backend
            .expect_execute()
            .withf(|req| req.url.ends_with("track.richsync.get"))
            .times(1)
            .returning(|_| {
                Ok(mock::envelope(200, json!({
                    "richsync": { "richsync_id": 8, "richsync_body": r#"[{"ts":0.5,"te":1.5,"l":[],"x":"hook"}]"# }
                })))
            });

        let track = handle(backend, Track::with_id(1));
        let snippet = track.fetch_snippet().unwrap().unwrap();
        assert_eq!(snippet.snippet_body.as_deref(), Some("hook"));
        let rich = track.fetch_richsync().unwrap().unwrap();
        let lines = rich.richsync_body.unwrap().richsync_lines().unwrap();
        assert_eq!(lines[0].text, "hook");
    }

    #[test]
    fn fetch_translations_unwraps_entries() {
        let mut backend = MockBackend::new();
        backend
            .expect_execute()
            .withf(|req| {
                req.url.ends_with("crowd.track.translations.get")
                    && mock::query(req, "selected_language") == Some("rja")
                    && mock::query(req, "comment_format") == Some("text")
            })
            .times(1)
            .returning(|_| {
                Ok(mock::envelope(200, json!({
                    "translations_list": [
                        { "translation": { "translation_id": 1, "snippet": "傘", "description": "kasa", "language": "rja" } },
                        { "translation": { "translation_id": 2, "description": "ame" } }
                    ]
                })))
            });

        let list = handle(backend, lost_umbrella())
            .fetch_translations("rja")
            .unwrap()
            .unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].description.as_deref(), Some("kasa"));
        assert_eq!(list[1].translation_id, Some(2));
    }

    #[test]
    fn fetch_translations_keeps_well_formed_entries() {
        let mut backend = MockBackend::new();
        backend.expect_execute().times(1).returning(|_| {
            Ok(mock::envelope(200, json!({
                "translations_list": [
                    { "translation": { "translation_id": "broken" } },
                    { "translation": { "translation_id": 7, "description": "ame" } }
                ]
            })))
        });

        let list = handle(backend, lost_umbrella())
            .fetch_translations("en")
            .unwrap()
            .unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].translation_id, Some(7));
    }

    #[test]
    fn submit_lyrics_true_only_on_200() {
        let mut backend = MockBackend::new();
        backend
            .expect_execute()
            .withf(|req| {
                req.method == HttpMethod::Post
                    && req.url.ends_with("track.lyrics.post")
                    && mock::query(req, "q_track") == Some("Lost Umbrella")
                    && mock::query(req, "keypress_count") == Some("120")
                    && mock::query(req, "time_spent").is_none()
                    && req.body.as_deref() == Some(r#"{"lyrics_body":"words"}"#)
            })
            .times(1)
            .returning(|_| Ok(mock::envelope(200, json!(""))));
        let track = handle(backend, lost_umbrella());
        assert!(track.submit_lyrics("words", Some(120), None).unwrap());

        let mut backend = MockBackend::new();
        backend
            .expect_execute()
            .times(1)
            .returning(|_| Ok(mock::envelope(403, json!(""))));
        assert!(!handle(backend, lost_umbrella()).submit_lyrics("words", None, None).unwrap());

        let mut backend = MockBackend::new();
        backend
            .expect_execute()
            .times(1)
            .returning(|_| Ok(RawResponse::empty()));
        assert!(!handle(backend, lost_umbrella()).submit_lyrics("words", None, None).unwrap());
    }

    #[test]
    fn handle_derefs_to_track() {
        let track = handle(MockBackend::new(), lost_umbrella());
        assert_eq!(track.track_name.as_deref(), Some("Lost Umbrella"));
        assert_eq!(track.clone().into_track(), lost_umbrella());
    }
}
