//! Musixmatch lyrics API client library.
//!
//! Provides token-authenticated access to the `ws/1.1` API used by the
//! Musixmatch desktop and iOS apps: track search, lyrics, synced subtitles,
//! richsync, snippets, crowd translations and lyrics submission.
//!
//! # Authentication
//!
//! Every call carries a user token issued for one [`ApiContext`]. Issue one
//! with [`MusixmatchClient::issue_token`] and keep it; the token is persisted
//! to `~/.config/musixmatch/session.json` by [`auth::Session`].
//!
//! ```no_run
//! use musixmatch_api::{ApiContext, MusixmatchClient};
//! use musixmatch_api::types::SearchQuery;
//!
//! let issued = MusixmatchClient::issue_token(ApiContext::Desktop)
//!     .unwrap()
//!     .expect("token.get throttled");
//! issued.to_session().save().unwrap();
//!
//! let client = issued.client().unwrap();
//! for track in client.search(&SearchQuery::artist_title("稲葉曇", "Lost Umbrella")).unwrap() {
//!     if let Some(lyrics) = track.fetch_lyrics().unwrap() {
//!         println!("{}", lyrics.lyrics_body.unwrap_or_default());
//!     }
//! }
//! ```
//!
//! # API method mapping
//!
//! | Method                               | API method                     | Description           |
//! |--------------------------------------|--------------------------------|-----------------------|
//! | [`MusixmatchClient::issue_token`]    | `token.get`                    | New user token        |
//! | [`MusixmatchClient::search`]         | `track.search`                 | Search tracks         |
//! | [`MusixmatchClient::call`]           | any                            | Passthrough           |
//! | [`TrackHandle::fetch_lyrics`]        | `track.lyrics.get`             | Plain lyrics          |
//! | [`TrackHandle::fetch_snippet`]       | `track.snippet.get`            | Lyrics snippet        |
//! | [`TrackHandle::fetch_subtitles`]     | `track.subtitle.get`           | Line-synced lyrics    |
//! | [`TrackHandle::fetch_richsync`]      | `track.richsync.get`           | Word-synced lyrics    |
//! | [`TrackHandle::fetch_translations`]  | `crowd.track.translations.get` | Crowd translations    |
//! | [`TrackHandle::submit_lyrics`]       | `track.lyrics.post`            | Submit lyrics         |
//!
//! # Errors
//!
//! Transport failures are errors. A response without a usable envelope is
//! not: the fetch methods return `Ok(None)` and [`MusixmatchClient::search`]
//! returns an empty `Vec`.

pub mod auth;
pub mod client;
pub mod context;
pub mod error;
pub mod http;
mod search;
mod token;
mod track;
pub mod transport;
pub mod types;

pub use client::{ClientConfig, MusixmatchClient};
pub use context::{ApiContext, AuthToken};
pub use error::{MusixmatchError, Result};
pub use track::TrackHandle;
pub use transport::{Envelope, Params, RedirectExhausted, RedirectPolicy};
