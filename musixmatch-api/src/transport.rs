//! Request transport: query building, redirect handling, envelope decoding.
//!
//! Every API call is a GET (or POST) to `<base>/<method>` with the token in
//! the query string:
//!
//! ```text
//! GET https://apic-desktop.musixmatch.com/ws/1.1/track.search
//!     ?app_id=web-desktop-app-v1.0&usertoken=...&q_artist=...&format=json
//! ```
//!
//! # Redirects
//!
//! The API answers the first request of a session with a `301` whose only
//! purpose is to set tracking cookies. The transport captures `Set-Cookie`,
//! then repeats the call with that cookie. [`RedirectPolicy`] bounds the
//! number of repeats and decides what happens when they run out.
//!
//! # Response format
//!
//! All responses share this envelope:
//!
//! ```json
//! {
//!   "message": {
//!     "header": { "status_code": 200, "execute_time": 0.012 },
//!     "body": { ...method-specific fields... }
//!   }
//! }
//! ```
//!
//! A body that is not JSON or has no `message` is reported as `Ok(None)`.

use crate::context::AuthToken;
use crate::error::{MusixmatchError, Result};
use crate::http::{HttpBackend, HttpMethod, RawRequest, RawResponse};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt::Display;
use std::sync::{Mutex, PoisonError};
use tracing::{debug, warn};

/// Browser User-Agent sent on every request by default.
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/96.0.4664.45 Safari/537.36";

/// What to do once the redirect retries are used up without a usable answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RedirectExhausted {
    /// Substitute an empty response, which the caller sees as `Ok(None)`.
    #[default]
    Degrade,
    /// Return the failure to the caller.
    Fail,
}

/// Bounded redirect-retry behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RedirectPolicy {
    /// How many times a redirected call is repeated.
    pub max_follows: u32,
    pub on_exhausted: RedirectExhausted,
}

impl Default for RedirectPolicy {
    fn default() -> Self {
        Self {
            max_follows: 1,
            on_exhausted: RedirectExhausted::Degrade,
        }
    }
}

/// Query parameters for a method call.
///
/// Keys are unique: setting a key twice keeps the last value. A `None` value
/// is remembered, so it also removes a baseline parameter of the same name
/// when merged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params(Vec<(String, Option<String>)>);

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `key` to `value`.
    #[must_use]
    pub fn set(mut self, key: &str, value: impl Display) -> Self {
        self.insert(key, Some(value.to_string()));
        self
    }

    /// Set `key` to `value`, or mark it absent when `value` is `None`.
    #[must_use]
    pub fn opt<V: Display>(mut self, key: &str, value: Option<V>) -> Self {
        self.insert(key, value.map(|v| v.to_string()));
        self
    }

    /// Boolean filter, sent as `1`/`0`.
    #[must_use]
    pub fn flag(self, key: &str, value: Option<bool>) -> Self {
        self.opt(key, value.map(u8::from))
    }

    /// Value of `key`, if present and not absent.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .and_then(|(_, v)| v.as_deref())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn insert(&mut self, key: &str, value: Option<String>) {
        match self.0.iter_mut().find(|(k, _)| k == key) {
            Some(slot) => slot.1 = value,
            None => self.0.push((key.to_owned(), value)),
        }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Self::new();
        for (k, v) in iter {
            params.insert(&k.into(), Some(v.into()));
        }
        params
    }
}

/// Merge baseline query, caller params and the forced `format=json`.
fn merge_query(base: Vec<(String, String)>, params: &Params) -> Vec<(String, String)> {
    let mut query = base;
    for (key, value) in &params.0 {
        query.retain(|(k, _)| k != key);
        if let Some(value) = value {
            query.push((key.clone(), value.clone()));
        }
    }
    query.retain(|(k, _)| k != "format");
    query.push(("format".to_owned(), "json".to_owned()));
    query
}

/// `message.header` of a response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnvelopeHeader {
    /// Application status; `200` on success, `401` for a bad token, `404`
    /// when nothing matched.
    #[serde(default)]
    pub status_code: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execute_time: Option<f64>,
    /// Everything else the server put in the header (`hint`, `available`, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl EnvelopeHeader {
    /// The `hint` field; `"renew"` means the token must be re-issued.
    pub fn hint(&self) -> Option<&str> {
        self.extra.get("hint").and_then(Value::as_str)
    }
}

/// `message` of a response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(default)]
    pub header: EnvelopeHeader,
    /// Method-specific payload. The API sends `""` or `[]` when it has
    /// nothing to return.
    #[serde(default)]
    pub body: Value,
}

impl Envelope {
    pub fn status_code(&self) -> u32 {
        self.header.status_code
    }

    pub fn is_ok(&self) -> bool {
        self.header.status_code == 200
    }

    /// Decode `body.<name>`. Missing, `null` or mistyped members give `None`.
    pub fn body_field<T: DeserializeOwned>(&self, name: &str) -> Option<T> {
        let value = self.body.get(name).filter(|v| !v.is_null())?;
        match T::deserialize(value) {
            Ok(v) => Some(v),
            Err(e) => {
                debug!(field = name, error = %e, "unexpected shape in response body");
                None
            }
        }
    }

    /// Decode the array `body.<name>` element by element.
    ///
    /// Elements that fail to decode are skipped with a warning; the rest are
    /// kept in order. `None` if the member is missing, `null` or not an array.
    pub fn body_list<T: DeserializeOwned>(&self, name: &str) -> Option<Vec<T>> {
        let items = self.body.get(name)?.as_array()?;
        let decoded = items
            .iter()
            .enumerate()
            .filter_map(|(index, item)| match T::deserialize(item) {
                Ok(v) => Some(v),
                Err(e) => {
                    warn!(field = name, index, error = %e, "skipping malformed list element");
                    None
                }
            })
            .collect();
        Some(decoded)
    }
}

#[derive(Deserialize)]
struct Wire {
    message: Option<Envelope>,
}

fn decode_envelope(body: &str) -> Option<Envelope> {
    if body.trim().is_empty() {
        return None;
    }
    match serde_json::from_str::<Wire>(body) {
        Ok(wire) => wire.message,
        Err(e) => {
            debug!(error = %e, "response is not a JSON envelope");
            None
        }
    }
}

/// Sends requests on behalf of one [`AuthToken`], keeping the session cookie.
pub struct RequestTransport {
    backend: Box<dyn HttpBackend>,
    token: AuthToken,
    user_agent: String,
    redirect: RedirectPolicy,
    cookie: Mutex<String>,
}

impl RequestTransport {
    pub fn new(
        token: AuthToken,
        backend: Box<dyn HttpBackend>,
        user_agent: impl Into<String>,
        redirect: RedirectPolicy,
    ) -> Self {
        Self {
            backend,
            token,
            user_agent: user_agent.into(),
            redirect,
            cookie: Mutex::new(String::new()),
        }
    }

    pub fn token(&self) -> &AuthToken {
        &self.token
    }

    /// Current session cookie (empty until the first redirect).
    pub fn cookie(&self) -> String {
        self.cookie
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// GET `url` as-is, with redirect handling but no envelope decoding.
    pub fn raw_get(&self, url: &str, query: Vec<(String, String)>) -> Result<RawResponse> {
        self.send(RawRequest {
            method: HttpMethod::Get,
            url: url.to_owned(),
            query,
            headers: Vec::new(),
            body: None,
        })
    }

    /// POST `body` (JSON text) to `url`, with redirect handling.
    pub fn raw_post(
        &self,
        url: &str,
        query: Vec<(String, String)>,
        body: String,
    ) -> Result<RawResponse> {
        self.send(RawRequest {
            method: HttpMethod::Post,
            url: url.to_owned(),
            query,
            headers: Vec::new(),
            body: Some(body),
        })
    }

    /// Call `method` with GET and decode the envelope.
    pub fn get(&self, method: &str, params: &Params) -> Result<Option<Envelope>> {
        let url = self.token.method_url(method);
        let query = merge_query(url.query, params);
        debug!(method, "GET");
        let resp = self.raw_get(&url.url, query)?;
        Ok(decode_envelope(&resp.body))
    }

    /// Call `method` with POST, sending `body` as JSON, and decode the envelope.
    pub fn post<B: Serialize + ?Sized>(
        &self,
        method: &str,
        params: &Params,
        body: &B,
    ) -> Result<Option<Envelope>> {
        let url = self.token.method_url(method);
        let query = merge_query(url.query, params);
        let body = serde_json::to_string(body)?;
        debug!(method, "POST");
        let resp = self.raw_post(&url.url, query, body)?;
        Ok(decode_envelope(&resp.body))
    }

    fn send(&self, mut request: RawRequest) -> Result<RawResponse> {
        request.headers = self.headers();
        let mut resp = self.backend.execute(&request)?;
        if !resp.is_redirect() {
            return ensure_success(resp);
        }

        for attempt in 1..=self.redirect.max_follows {
            self.capture_cookie(&resp);
            warn!(status = resp.status, attempt, url = %request.url, "redirected, retrying with session cookie");
            request.headers = self.headers();
            match self.backend.execute(&request) {
                Ok(next) if next.is_redirect() => resp = next,
                Ok(next) if next.is_success() => return Ok(next),
                Ok(next) => {
                    return self.exhausted(&request, MusixmatchError::Status {
                        status: next.status,
                    });
                }
                Err(e) => return self.exhausted(&request, e),
            }
        }

        let method = request
            .url
            .rsplit('/')
            .next()
            .unwrap_or_default()
            .to_owned();
        self.exhausted(&request, MusixmatchError::RedirectLimit { method })
    }

    fn exhausted(&self, request: &RawRequest, err: MusixmatchError) -> Result<RawResponse> {
        match self.redirect.on_exhausted {
            RedirectExhausted::Degrade => {
                warn!(url = %request.url, error = %err, "retry after redirect failed, returning empty response");
                Ok(RawResponse::empty())
            }
            RedirectExhausted::Fail => Err(err),
        }
    }

    fn headers(&self) -> Vec<(String, String)> {
        let mut headers = vec![("User-Agent".to_owned(), self.user_agent.clone())];
        let cookie = self.cookie();
        if !cookie.is_empty() {
            headers.push(("Cookie".to_owned(), cookie));
        }
        headers
    }

    /// Replace the session cookie with the `name=value` pairs of every
    /// `Set-Cookie` header. Without `Set-Cookie` the old cookie stays.
    fn capture_cookie(&self, resp: &RawResponse) {
        let pairs: Vec<&str> = resp
            .headers_all("set-cookie")
            .filter_map(|v| v.split(';').next())
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect();
        if pairs.is_empty() {
            return;
        }
        let mut cookie = self.cookie.lock().unwrap_or_else(PoisonError::into_inner);
        *cookie = pairs.join("; ");
        debug!("captured session cookie");
    }
}

fn ensure_success(resp: RawResponse) -> Result<RawResponse> {
    if resp.is_success() {
        Ok(resp)
    } else {
        Err(MusixmatchError::Status {
            status: resp.status,
        })
    }
}
