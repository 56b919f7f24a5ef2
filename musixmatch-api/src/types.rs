//! Data types for Musixmatch API responses.
//!
//! Field names are the API's own `snake_case` keys, one-to-one, so the
//! records deserialize straight from `message.body`. Every field is optional:
//! the API omits or blanks fields freely depending on context and rights.
//!
//! Flags (`instrumental`, `has_lyrics`, ...) arrive as `0`/`1` integers from
//! most methods and as JSON booleans from a few; both decode to `bool`.

use crate::context::ApiContext;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::error::{MusixmatchError, Result};
use crate::transport::Params;

fn flag<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Option<bool>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Bool(bool),
        Int(i64),
        Str(String),
    }

    Ok(match Option::<Repr>::deserialize(d)? {
        None => None,
        Some(Repr::Bool(b)) => Some(b),
        Some(Repr::Int(i)) => Some(i != 0),
        Some(Repr::Str(s)) => Some(matches!(s.as_str(), "1" | "true")),
    })
}

/// Collect every string in a (possibly nested) JSON array.
fn flatten_strings(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::String(s) => out.push(s.clone()),
        Value::Array(items) => items.iter().for_each(|v| flatten_strings(v, out)),
        _ => {}
    }
}

/// A recording.
///
/// Returned by [`MusixmatchClient::search`](crate::MusixmatchClient::search)
/// wrapped in a [`TrackHandle`](crate::TrackHandle).
///
/// API JSON path: `body.track_list[].track`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Track {
    /// Musixmatch track ID, the key for lyrics/subtitle lookups.
    pub track_id: Option<u64>,
    pub track_mbid: Option<String>,
    pub track_isrc: Option<String>,
    /// ISRCs of every track grouped under the same commontrack (nested arrays).
    pub commontrack_isrcs: Option<Value>,
    pub track_spotify_id: Option<String>,
    /// Spotify IDs of every track grouped under the same commontrack.
    pub commontrack_spotify_ids: Option<Value>,
    pub track_soundcloud_id: Option<u64>,
    pub track_xboxmusic_id: Option<String>,
    pub track_name: Option<String>,
    pub track_name_translation_list: Option<Vec<Value>>,
    /// Popularity, 1-100.
    pub track_rating: Option<u64>,
    /// Length in seconds.
    pub track_length: Option<u64>,
    /// ID shared by all duplicates of this recording across sources.
    pub commontrack_id: Option<u64>,
    #[serde(deserialize_with = "flag")]
    pub instrumental: Option<bool>,
    #[serde(deserialize_with = "flag")]
    pub explicit: Option<bool>,
    #[serde(deserialize_with = "flag")]
    pub has_lyrics: Option<bool>,
    #[serde(deserialize_with = "flag")]
    pub has_lyrics_crowd: Option<bool>,
    #[serde(deserialize_with = "flag")]
    pub has_subtitles: Option<bool>,
    #[serde(deserialize_with = "flag")]
    pub has_richsync: Option<bool>,
    #[serde(deserialize_with = "flag")]
    pub has_track_structure: Option<bool>,
    pub num_favourite: Option<u64>,
    pub lyrics_id: Option<u64>,
    pub subtitle_id: Option<u64>,
    pub album_id: Option<u64>,
    pub album_name: Option<String>,
    pub artist_id: Option<u64>,
    pub artist_mbid: Option<String>,
    pub artist_name: Option<String>,
    pub album_coverart_100x100: Option<String>,
    pub album_coverart_350x350: Option<String>,
    pub album_coverart_500x500: Option<String>,
    pub album_coverart_800x800: Option<String>,
    pub track_share_url: Option<String>,
    pub track_edit_url: Option<String>,
    pub commontrack_vanity_id: Option<String>,
    #[serde(deserialize_with = "flag")]
    pub restricted: Option<bool>,
    /// ISO 8601, e.g. `2020-01-01T00:00:00Z`.
    pub first_release_date: Option<String>,
    pub updated_time: Option<String>,
    pub primary_genres: Option<GenreList>,
    pub secondary_genres: Option<GenreList>,
}

impl Track {
    /// A track known only by its ID.
    pub fn with_id(track_id: u64) -> Self {
        Self {
            track_id: Some(track_id),
            ..Self::default()
        }
    }

    /// `"Artist - Title"`, with `?` for missing parts.
    pub fn display_name(&self) -> String {
        format!(
            "{} - {}",
            self.artist_name.as_deref().unwrap_or("?"),
            self.track_name.as_deref().unwrap_or("?"),
        )
    }

    /// Every ISRC of the commontrack, flattened.
    pub fn commontrack_isrc_list(&self) -> Vec<String> {
        let mut out = Vec::new();
        if let Some(v) = &self.commontrack_isrcs {
            flatten_strings(v, &mut out);
        }
        out
    }

    /// Every Spotify ID of the commontrack, flattened.
    pub fn commontrack_spotify_id_list(&self) -> Vec<String> {
        let mut out = Vec::new();
        if let Some(v) = &self.commontrack_spotify_ids {
            flatten_strings(v, &mut out);
        }
        out
    }

    /// Primary genres followed by secondary ones.
    pub fn genres(&self) -> impl Iterator<Item = &Genre> {
        self.primary_genres
            .iter()
            .chain(self.secondary_genres.iter())
            .flat_map(|list| list.music_genre_list.iter())
            .map(|entry| &entry.music_genre)
    }
}

/// `{ "music_genre_list": [ { "music_genre": {...} } ] }`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenreList {
    #[serde(default)]
    pub music_genre_list: Vec<GenreEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenreEntry {
    #[serde(default)]
    pub music_genre: Genre,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Genre {
    pub music_genre_id: Option<u64>,
    pub music_genre_parent_id: Option<u64>,
    pub music_genre_name: Option<String>,
    pub music_genre_name_extended: Option<String>,
    pub music_genre_vanity: Option<String>,
}

/// Plain (unsynced) lyrics of a track.
///
/// API JSON path: `body.lyrics` of `track.lyrics.get`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Lyrics {
    pub lyrics_id: Option<u64>,
    #[serde(deserialize_with = "flag")]
    pub can_edit: Option<bool>,
    #[serde(deserialize_with = "flag")]
    pub locked: Option<bool>,
    pub published_status: Option<u64>,
    pub action_requested: Option<String>,
    #[serde(deserialize_with = "flag")]
    pub verified: Option<bool>,
    #[serde(deserialize_with = "flag")]
    pub restricted: Option<bool>,
    #[serde(deserialize_with = "flag")]
    pub instrumental: Option<bool>,
    #[serde(deserialize_with = "flag")]
    pub explicit: Option<bool>,
    pub lyrics_body: Option<String>,
    pub lyrics_language: Option<String>,
    pub lyrics_language_description: Option<String>,
    pub script_tracking_url: Option<String>,
    pub pixel_tracking_url: Option<String>,
    pub html_tracking_url: Option<String>,
    pub lyrics_copyright: Option<String>,
    pub writer_list: Option<Vec<Value>>,
    pub publisher_list: Option<Vec<Value>>,
    pub backlink_url: Option<String>,
    pub updated_time: Option<String>,
    /// Last editor, present with `part=user`.
    pub lyrics_user: Option<UserEnvelope>,
}

/// `{ "user": {...} }`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserEnvelope {
    #[serde(default)]
    pub user: User,
}

/// A Musixmatch community member.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct User {
    pub uaid: Option<String>,
    #[serde(deserialize_with = "flag")]
    pub is_mine: Option<bool>,
    pub user_name: Option<String>,
    pub user_profile_photo: Option<String>,
    #[serde(deserialize_with = "flag")]
    pub has_private_profile: Option<bool>,
    pub score: Option<i64>,
    pub position: Option<i64>,
    pub weekly_score: Option<i64>,
    pub level: Option<String>,
    pub key: Option<String>,
    pub rank_level: Option<i64>,
    pub points_to_next_level: Option<i64>,
    pub ratio_to_next_level: Option<f64>,
    pub rank_name: Option<String>,
    pub next_rank_name: Option<String>,
    pub ratio_to_next_rank: Option<f64>,
    pub rank_color: Option<String>,
    pub rank_colors: Option<Value>,
    pub rank_image_url: Option<String>,
    pub next_rank_color: Option<String>,
    pub next_rank_colors: Option<Value>,
    pub next_rank_image_url: Option<String>,
    pub counters: Option<Value>,
    #[serde(deserialize_with = "flag")]
    pub moderator: Option<bool>,
    pub artist_manager: Option<i64>,
    #[serde(deserialize_with = "flag")]
    pub academy_completed: Option<bool>,
}

/// The most characteristic line of a song.
///
/// API JSON path: `body.snippet` of `track.snippet.get`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Snippet {
    pub snippet_id: Option<u64>,
    pub snippet_language: Option<String>,
    #[serde(deserialize_with = "flag")]
    pub restricted: Option<bool>,
    #[serde(deserialize_with = "flag")]
    pub instrumental: Option<bool>,
    pub snippet_body: Option<String>,
    pub script_tracking_url: Option<String>,
    pub pixel_tracking_url: Option<String>,
    pub html_tracking_url: Option<String>,
    pub updated_time: Option<String>,
}

/// Body of a subtitle or richsync.
///
/// The API ships these bodies as JSON text for the `mxm` format and as plain
/// text (LRC, DFXP, ...) otherwise. The body is classified once, when the
/// record is decoded: a JSON array or object becomes `Structured`, anything
/// else stays `Text`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SyncBody {
    Structured(Value),
    Text(String),
}

impl SyncBody {
    /// Classify `text`.
    pub fn parse(text: &str) -> Self {
        match serde_json::from_str::<Value>(text) {
            Ok(v @ (Value::Array(_) | Value::Object(_))) => Self::Structured(v),
            _ => Self::Text(text.to_owned()),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Structured(_) => None,
        }
    }

    pub fn as_structured(&self) -> Option<&Value> {
        match self {
            Self::Structured(v) => Some(v),
            Self::Text(_) => None,
        }
    }

    /// Lines of an `mxm`-format subtitle.
    pub fn subtitle_lines(&self) -> Option<Vec<SubtitleLine>> {
        Vec::<SubtitleLine>::deserialize(self.as_structured()?).ok()
    }

    /// Lines of a richsync body.
    pub fn richsync_lines(&self) -> Option<Vec<RichsyncLine>> {
        Vec::<RichsyncLine>::deserialize(self.as_structured()?).ok()
    }
}

impl<'de> Deserialize<'de> for SyncBody {
    fn deserialize<D: Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::String(s) => Self::parse(&s),
            other => Self::Structured(other),
        })
    }
}

/// One line of an `mxm` subtitle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubtitleLine {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub time: SubtitleTime,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubtitleTime {
    /// Offset in seconds.
    pub total: f64,
    pub minutes: u32,
    pub seconds: u32,
    pub hundredths: u32,
}

/// One line of a richsync body, with per-character timing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RichsyncLine {
    /// Line start, seconds.
    #[serde(rename = "ts", default)]
    pub start: f64,
    /// Line end, seconds.
    #[serde(rename = "te", default)]
    pub end: f64,
    #[serde(rename = "l", default)]
    pub parts: Vec<RichsyncPart>,
    /// Full line text.
    #[serde(rename = "x", default)]
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RichsyncPart {
    /// Characters (usually one word or a space).
    #[serde(rename = "c", default)]
    pub chars: String,
    /// Offset from the line start, seconds.
    #[serde(rename = "o", default)]
    pub offset: f64,
}

/// Line-synchronized lyrics.
///
/// API JSON path: `body.subtitle` of `track.subtitle.get`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Subtitle {
    pub subtitle_id: Option<u64>,
    #[serde(deserialize_with = "flag")]
    pub restricted: Option<bool>,
    pub published_status: Option<u64>,
    pub subtitle_body: Option<SyncBody>,
    pub subtitle_avg_count: Option<u64>,
    pub lyrics_copyright: Option<String>,
    /// Length in seconds.
    pub subtitle_length: Option<u64>,
    pub subtitle_language: Option<String>,
    pub subtitle_language_description: Option<String>,
    pub script_tracking_url: Option<String>,
    pub pixel_tracking_url: Option<String>,
    pub html_tracking_url: Option<String>,
    pub writer_list: Option<Vec<Value>>,
    pub publisher_list: Option<Vec<Value>>,
    pub updated_time: Option<String>,
}

/// Word-synchronized lyrics.
///
/// API JSON path: `body.richsync` of `track.richsync.get`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Richsync {
    pub richsync_id: Option<u64>,
    #[serde(deserialize_with = "flag")]
    pub restricted: Option<bool>,
    pub richsync_body: Option<SyncBody>,
    pub richsync_length: Option<u64>,
    pub richsync_language: Option<String>,
    pub richsync_language_description: Option<String>,
    pub lyrics_copyright: Option<String>,
    pub script_tracking_url: Option<String>,
    pub pixel_tracking_url: Option<String>,
    pub html_tracking_url: Option<String>,
    pub updated_time: Option<String>,
}

/// A crowd translation of one lyrics line.
///
/// API JSON path: `body.translations_list[].translation` of
/// `crowd.track.translations.get`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Translation {
    pub translation_id: Option<u64>,
    /// Translated text.
    pub description: Option<String>,
    /// Original line being translated.
    pub snippet: Option<String>,
    pub matched_line: Option<String>,
    pub subtitle_matched_line: Option<String>,
    pub language: Option<String>,
    pub language_from: Option<String>,
    pub selected_language: Option<String>,
    pub position: Option<i64>,
    pub published_status: Option<u64>,
    pub type_id: Option<u64>,
    pub user_id: Option<String>,
    pub app_id: Option<String>,
    pub created_date: Option<String>,
    pub confidence: Option<f64>,
    pub user: Option<User>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct TranslationEntry {
    #[serde(default)]
    pub translation: Translation,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct TrackEntry {
    #[serde(default)]
    pub track: Track,
}

/// Body format for [`TrackHandle::fetch_subtitles`](crate::TrackHandle::fetch_subtitles).
///
/// | Variant  | API value | Body                          |
/// |----------|-----------|-------------------------------|
/// | `Lrc`    | `lrc`     | `[mm:ss.xx] line` text        |
/// | `Dfxp`   | `dfxp`    | TTML/DFXP XML                 |
/// | `Stledu` | `stledu`  | Spruce STL text               |
/// | `Mxm`    | `mxm`     | JSON array of timed lines     |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubtitleFormat {
    Lrc,
    Dfxp,
    Stledu,
    #[default]
    Mxm,
}

impl SubtitleFormat {
    /// Value of the `subtitle_format` parameter.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Lrc => "lrc",
            Self::Dfxp => "dfxp",
            Self::Stledu => "stledu",
            Self::Mxm => "mxm",
        }
    }
}

impl fmt::Display for SubtitleFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubtitleFormat {
    type Err = MusixmatchError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "lrc" => Ok(Self::Lrc),
            "dfxp" => Ok(Self::Dfxp),
            "stledu" => Ok(Self::Stledu),
            "mxm" => Ok(Self::Mxm),
            _ => Err(MusixmatchError::Other(format!(
                "unknown subtitle format `{s}`"
            ))),
        }
    }
}

/// Sort direction for `s_track_rating`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

/// Criteria for [`MusixmatchClient::search`](crate::MusixmatchClient::search).
///
/// Unset fields are not sent. An all-empty query is valid and returns
/// whatever the server considers popular.
///
/// | Field              | API parameter       |
/// |--------------------|---------------------|
/// | `query`            | `q`                 |
/// | `lyrics`           | `q_lyrics`          |
/// | `artist`           | `q_artist`          |
/// | `title`            | `q_track`           |
/// | `album`            | `q_album`           |
/// | `track_isrc`       | `track_isrc`        |
/// | `track_spotify_id` | `track_spotify_id`  |
/// | `has_lyrics`       | `f_has_lyrics`      |
/// | `has_subtitle`     | `f_has_subtitle`    |
/// | `language`         | `f_lyrics_language` |
/// | `sort_by_rating`   | `s_track_rating`    |
/// | `page`             | `page`              |
/// | `page_size`        | `page_size`         |
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchQuery {
    pub query: Option<String>,
    pub lyrics: Option<String>,
    pub artist: Option<String>,
    pub title: Option<String>,
    pub album: Option<String>,
    pub track_isrc: Option<String>,
    pub track_spotify_id: Option<String>,
    pub has_lyrics: Option<bool>,
    pub has_subtitle: Option<bool>,
    /// ISO 639-1 code, e.g. `en`.
    pub language: Option<String>,
    pub sort_by_rating: Option<SortOrder>,
    /// 1-based.
    pub page: Option<u32>,
    /// Max 100.
    pub page_size: Option<u32>,
}

impl SearchQuery {
    /// Free-text search.
    pub fn text(query: impl Into<String>) -> Self {
        Self {
            query: Some(query.into()),
            ..Self::default()
        }
    }

    /// Search by artist and title.
    pub fn artist_title(artist: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            artist: Some(artist.into()),
            title: Some(title.into()),
            ..Self::default()
        }
    }

    pub(crate) fn to_params(&self) -> Params {
        Params::new()
            .opt("q", self.query.as_deref())
            .opt("q_lyrics", self.lyrics.as_deref())
            .opt("q_artist", self.artist.as_deref())
            .opt("q_track", self.title.as_deref())
            .opt("q_album", self.album.as_deref())
            .opt("track_isrc", self.track_isrc.as_deref())
            .opt("track_spotify_id", self.track_spotify_id.as_deref())
            .flag("f_has_lyrics", self.has_lyrics)
            .flag("f_has_subtitle", self.has_subtitle)
            .opt("f_lyrics_language", self.language.as_deref())
            .opt("s_track_rating", self.sort_by_rating.map(SortOrder::as_str))
            .opt("page", self.page)
            .opt("page_size", self.page_size)
    }
}

/// A freshly issued user token.
///
/// Returned by [`MusixmatchClient::issue_token`](crate::MusixmatchClient::issue_token).
/// Persist `user_token` (e.g. with [`Session`](crate::auth::Session)); it is
/// valid only for `context`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssuedToken {
    pub user_token: String,
    #[serde(default)]
    pub context: ApiContext,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_config: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Value>,
}
