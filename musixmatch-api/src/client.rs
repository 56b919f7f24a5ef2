//! Blocking client for the Musixmatch desktop/iOS API.
//!
//! A [`MusixmatchClient`] is a cheap handle around one shared
//! [`RequestTransport`]. Cloning a client shares its token and session
//! cookie. Records returned by the client ([`TrackHandle`]) hold a clone, so
//! they can issue follow-up requests on their own.
//!
//! API methods are implemented in separate modules (`search`, `token`,
//! `track`) as `impl` blocks on the types defined here.

use crate::auth::Session;
use crate::context::{ApiContext, AuthToken};
use crate::error::{MusixmatchError, Result};
use crate::http::{HttpBackend, ReqwestBackend};
use crate::track::TrackHandle;
use crate::transport::{Envelope, Params, RedirectPolicy, RequestTransport, USER_AGENT};
use crate::types::Track;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Per-client settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Bound on each HTTP request; `None` waits forever.
    pub timeout: Option<Duration>,
    pub user_agent: String,
    pub redirect: RedirectPolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Some(Duration::from_secs(30)),
            user_agent: USER_AGENT.to_owned(),
            redirect: RedirectPolicy::default(),
        }
    }
}

/// Client bound to one user token.
#[derive(Clone)]
pub struct MusixmatchClient {
    transport: Arc<RequestTransport>,
}

impl MusixmatchClient {
    /// Create a client for `token` with the default [`ClientConfig`].
    pub fn new(token: impl Into<String>, context: ApiContext) -> Result<Self> {
        Self::with_config(token, context, &ClientConfig::default())
    }

    pub fn with_config(
        token: impl Into<String>,
        context: ApiContext,
        config: &ClientConfig,
    ) -> Result<Self> {
        let backend = ReqwestBackend::new(config.timeout)?;
        let transport = RequestTransport::new(
            AuthToken::new(token, context),
            Box::new(backend),
            config.user_agent.clone(),
            config.redirect,
        );
        Ok(Self {
            transport: Arc::new(transport),
        })
    }

    /// Create a client over an arbitrary [`HttpBackend`] (useful for testing
    /// or for routing through a custom HTTP stack).
    pub fn with_backend(
        token: impl Into<String>,
        context: ApiContext,
        backend: Box<dyn HttpBackend>,
        redirect: RedirectPolicy,
    ) -> Self {
        let transport =
            RequestTransport::new(AuthToken::new(token, context), backend, USER_AGENT, redirect);
        Self {
            transport: Arc::new(transport),
        }
    }

    /// Create a client from a persisted [`Session`].
    ///
    /// Returns [`MusixmatchError::NotLoggedIn`] if the session has no token.
    pub fn from_session(session: &Session) -> Result<Self> {
        let token = session
            .user_token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or(MusixmatchError::NotLoggedIn)?;
        Self::new(token, session.context)
    }

    pub fn token(&self) -> &AuthToken {
        self.transport.token()
    }

    pub fn context(&self) -> ApiContext {
        self.token().context()
    }

    pub fn transport(&self) -> &RequestTransport {
        &self.transport
    }

    /// Call any API method with GET.
    ///
    /// For methods this crate does not model. Returns `Ok(None)` when the
    /// response has no usable envelope.
    pub fn call(&self, method: &str, params: &Params) -> Result<Option<Envelope>> {
        self.transport.get(method, params)
    }

    /// Call any API method with POST, sending `body` as JSON.
    pub fn call_post<B: Serialize + ?Sized>(
        &self,
        method: &str,
        params: &Params,
        body: &B,
    ) -> Result<Option<Envelope>> {
        self.transport.post(method, params, body)
    }

    /// Bind `track` to this client.
    pub fn track(&self, track: Track) -> TrackHandle {
        TrackHandle::new(self.clone(), track)
    }

    /// Handle for a track known only by ID.
    pub fn track_by_id(&self, track_id: u64) -> TrackHandle {
        self.track(Track::with_id(track_id))
    }
}

impl fmt::Debug for MusixmatchClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MusixmatchClient")
            .field("token", self.token())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::mock::{self, MockBackend};
    use serde_json::json;

    #[test]
    fn from_session_requires_token() {
        let err = MusixmatchClient::from_session(&Session::default()).unwrap_err();
        assert!(matches!(err, MusixmatchError::NotLoggedIn));

        let session = Session {
            user_token: Some(String::new()),
            context: ApiContext::Ios,
        };
        assert!(MusixmatchClient::from_session(&session).is_err());
    }

    #[test]
    fn call_passes_params_through() {
        let mut backend = MockBackend::new();
        backend
            .expect_execute()
            .withf(|req| {
                req.url.ends_with("/ws/1.1/chart.artists.get")
                    && mock::query(req, "country") == Some("it")
                    && mock::query(req, "usertoken") == Some("t")
            })
            .times(1)
            .returning(|_| Ok(mock::envelope(200, json!({ "artist_list": [] }))));

        let client =
            MusixmatchClient::with_backend("t", ApiContext::Ios, Box::new(backend), RedirectPolicy::default());
        let env = client
            .call("chart.artists.get", &Params::new().set("country", "it"))
            .unwrap()
            .unwrap();
        assert_eq!(env.body["artist_list"], json!([]));
    }

    #[test]
    fn clones_share_transport() {
        let client = MusixmatchClient::with_backend(
            "t",
            ApiContext::Desktop,
            Box::new(MockBackend::new()),
            RedirectPolicy::default(),
        );
        let other = client.clone();
        assert!(std::ptr::eq(client.transport(), other.transport()));
        assert_eq!(other.context(), ApiContext::Desktop);
    }

    #[test]
    fn debug_hides_token() {
        let client = MusixmatchClient::with_backend(
            "supersecret",
            ApiContext::Desktop,
            Box::new(MockBackend::new()),
            RedirectPolicy::default(),
        );
        assert!(!format!("{client:?}").contains("supersecret"));
    }
}
