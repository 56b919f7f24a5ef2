//! API contexts and user tokens.
//!
//! Musixmatch serves two deployments of the same `ws/1.1` API, one for the
//! desktop app and one for the iOS app. Each has its own host and `app_id`,
//! and a user token issued under one context is only valid for that context.
//!
//! | Context   | Base URL                                      | `app_id`               |
//! |-----------|-----------------------------------------------|------------------------|
//! | `desktop` | `https://apic-desktop.musixmatch.com/ws/1.1/` | `web-desktop-app-v1.0` |
//! | `ios`     | `https://apic.musixmatch.com/ws/1.1/`         | `mac-ios-v2.0`         |

use crate::error::{MusixmatchError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the two deployments of the Musixmatch API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiContext {
    /// The desktop application endpoint.
    #[default]
    Desktop,
    /// The iOS application endpoint.
    Ios,
}

/// A method endpoint plus the query parameters every call to it carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodUrl {
    /// Full URL, e.g. `https://apic-desktop.musixmatch.com/ws/1.1/track.search`.
    pub url: String,
    /// Baseline query parameters (`app_id`, plus `usertoken` when built
    /// through an [`AuthToken`]).
    pub query: Vec<(String, String)>,
}

impl ApiContext {
    /// Root URL of the `ws/1.1` API for this context, with trailing slash.
    pub fn base_url(self) -> &'static str {
        match self {
            Self::Desktop => "https://apic-desktop.musixmatch.com/ws/1.1/",
            Self::Ios => "https://apic.musixmatch.com/ws/1.1/",
        }
    }

    /// Client identifier sent as the `app_id` query parameter.
    pub fn app_id(self) -> &'static str {
        match self {
            Self::Desktop => "web-desktop-app-v1.0",
            Self::Ios => "mac-ios-v2.0",
        }
    }

    /// Lowercase name, as accepted by [`FromStr`].
    pub fn name(self) -> &'static str {
        match self {
            Self::Desktop => "desktop",
            Self::Ios => "ios",
        }
    }

    /// Build the URL for `method` (e.g. `track.search`).
    pub fn method_url(self, method: &str) -> MethodUrl {
        MethodUrl {
            url: format!("{}{method}", self.base_url()),
            query: vec![("app_id".to_owned(), self.app_id().to_owned())],
        }
    }
}

impl FromStr for ApiContext {
    type Err = MusixmatchError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "desktop" => Ok(Self::Desktop),
            "ios" => Ok(Self::Ios),
            _ => Err(MusixmatchError::InvalidContext(s.to_owned())),
        }
    }
}

impl fmt::Display for ApiContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A user token bound to the context it was issued for.
///
/// The credential may be empty; that is how `token.get` is called to obtain
/// a fresh one.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthToken {
    credential: String,
    context: ApiContext,
}

impl AuthToken {
    pub fn new(credential: impl Into<String>, context: ApiContext) -> Self {
        Self {
            credential: credential.into(),
            context,
        }
    }

    /// Token with an empty credential, used only for token issuance.
    pub fn anonymous(context: ApiContext) -> Self {
        Self::new(String::new(), context)
    }

    pub fn credential(&self) -> &str {
        &self.credential
    }

    pub fn context(&self) -> ApiContext {
        self.context
    }

    /// Like [`ApiContext::method_url`], with `usertoken` added to the query.
    pub fn method_url(&self, method: &str) -> MethodUrl {
        let mut url = self.context.method_url(method);
        url.query
            .push(("usertoken".to_owned(), self.credential.clone()));
        url
    }
}

// Keep the credential out of logs.
impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthToken")
            .field("credential", &"<redacted>")
            .field("context", &self.context)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query_value<'a>(url: &'a MethodUrl, key: &str) -> Option<&'a str> {
        url.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn desktop_method_url() {
        let url = ApiContext::Desktop.method_url("track.search");
        assert_eq!(
            url.url,
            "https://apic-desktop.musixmatch.com/ws/1.1/track.search"
        );
        assert_eq!(query_value(&url, "app_id"), Some("web-desktop-app-v1.0"));
        assert_eq!(url.query.len(), 1);
    }

    #[test]
    fn ios_method_url() {
        let url = ApiContext::Ios.method_url("token.get");
        assert!(url.url.starts_with("https://apic.musixmatch.com/ws/1.1/"));
        assert!(url.url.ends_with("token.get"));
        assert_eq!(query_value(&url, "app_id"), Some("mac-ios-v2.0"));
    }

    #[test]
    fn parse_context_names() {
        assert_eq!("desktop".parse::<ApiContext>().unwrap(), ApiContext::Desktop);
        assert_eq!("iOS".parse::<ApiContext>().unwrap(), ApiContext::Ios);
        let err = "android".parse::<ApiContext>().unwrap_err();
        assert!(matches!(err, MusixmatchError::InvalidContext(ref s) if s == "android"));
    }

    #[test]
    fn token_adds_usertoken() {
        let token = AuthToken::new("abc123", ApiContext::Desktop);
        let url = token.method_url("track.lyrics.get");
        assert_eq!(query_value(&url, "app_id"), Some("web-desktop-app-v1.0"));
        assert_eq!(query_value(&url, "usertoken"), Some("abc123"));
    }

    #[test]
    fn anonymous_token_sends_empty_usertoken() {
        let url = AuthToken::anonymous(ApiContext::Ios).method_url("token.get");
        assert_eq!(query_value(&url, "usertoken"), Some(""));
    }

    #[test]
    fn debug_redacts_credential() {
        let token = AuthToken::new("secret", ApiContext::Desktop);
        assert!(!format!("{token:?}").contains("secret"));
    }

    #[test]
    fn context_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&ApiContext::Ios).unwrap(), "\"ios\"");
    }
}
