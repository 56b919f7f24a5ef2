//! Raw HTTP round trips.
//!
//! [`RequestTransport`](crate::transport::RequestTransport) talks to the
//! network only through the [`HttpBackend`] trait, so redirect and envelope
//! handling can be exercised without a server. [`ReqwestBackend`] is the
//! real implementation.
//!
//! A backend performs exactly one request per call and must not follow
//! redirects itself: a `301` has to reach the transport so it can capture
//! the `Set-Cookie` header.

use crate::error::Result;
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use reqwest::redirect;
use std::time::Duration;

/// HTTP methods used by the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

/// A fully built request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRequest {
    pub method: HttpMethod,
    pub url: String,
    /// Query parameters, already filtered and merged.
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    /// JSON text sent with `Content-Type: application/json`.
    pub body: Option<String>,
}

/// A response as received, before envelope decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    /// Header names as sent by the server; repeated headers appear once per value.
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl RawResponse {
    /// The "no data" result substituted when a redirect retry fails.
    pub fn empty() -> Self {
        Self {
            status: 200,
            headers: Vec::new(),
            body: String::new(),
        }
    }

    /// First value of header `name` (case-insensitive).
    pub fn header<'a>(&'a self, name: &'a str) -> Option<&'a str> {
        self.headers_all(name).next()
    }

    /// All values of header `name` (case-insensitive).
    pub fn headers_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.headers
            .iter()
            .filter(move |(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// `2xx`.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// `301`, `302`, `303`, `307` or `308`.
    pub fn is_redirect(&self) -> bool {
        matches!(self.status, 301 | 302 | 303 | 307 | 308)
    }
}

/// One blocking HTTP round trip, redirects not followed.
pub trait HttpBackend: Send + Sync {
    fn execute(&self, request: &RawRequest) -> Result<RawResponse>;
}

/// [`HttpBackend`] over a blocking `reqwest` client.
pub struct ReqwestBackend {
    http: Client,
}

impl ReqwestBackend {
    /// Build a backend. `timeout` bounds each request; `None` disables it.
    pub fn new(timeout: Option<Duration>) -> Result<Self> {
        let http = Client::builder()
            .redirect(redirect::Policy::none())
            .timeout(timeout)
            .build()?;
        Ok(Self { http })
    }
}

impl HttpBackend for ReqwestBackend {
    fn execute(&self, request: &RawRequest) -> Result<RawResponse> {
        let mut req = match request.method {
            HttpMethod::Get => self.http.get(&request.url),
            HttpMethod::Post => self.http.post(&request.url),
        };
        req = req.query(&request.query);
        for (name, value) in &request.headers {
            req = req.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            req = req
                .header(CONTENT_TYPE, "application/json")
                .body(body.clone());
        }

        let resp = req.send()?;
        let status = resp.status().as_u16();
        let headers = resp
            .headers()
            .iter()
            .filter_map(|(k, v)| {
                v.to_str()
                    .ok()
                    .map(|v| (k.as_str().to_owned(), v.to_owned()))
            })
            .collect();
        let body = resp.text()?;

        Ok(RawResponse {
            status,
            headers,
            body,
        })
    }
}

#[cfg(test)]
pub(crate) mod mock {
    use super::{HttpBackend, RawRequest, RawResponse};
    use crate::error::Result;
    use serde_json::{Value, json};

    mockall::mock! {
        pub Backend {}

        impl HttpBackend for Backend {
            fn execute(&self, request: &RawRequest) -> Result<RawResponse>;
        }
    }

    /// `200 OK` carrying `{"message": {"header": {"status_code": code}, "body": body}}`.
    pub fn envelope(code: u32, body: Value) -> RawResponse {
        RawResponse {
            status: 200,
            headers: Vec::new(),
            body: json!({
                "message": {
                    "header": { "status_code": code, "execute_time": 0.01 },
                    "body": body,
                }
            })
            .to_string(),
        }
    }

    pub fn redirect(set_cookie: &str) -> RawResponse {
        RawResponse {
            status: 301,
            headers: vec![("set-cookie".to_owned(), set_cookie.to_owned())],
            body: String::new(),
        }
    }

    pub fn query<'a>(request: &'a RawRequest, key: &str) -> Option<&'a str> {
        request
            .query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn header<'a>(request: &'a RawRequest, name: &str) -> Option<&'a str> {
        request
            .headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: u16, headers: &[(&str, &str)]) -> RawResponse {
        RawResponse {
            status,
            headers: headers
                .iter()
                .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
                .collect(),
            body: String::new(),
        }
    }

    #[test]
    fn header_lookup_ignores_case() {
        let resp = response(301, &[("set-cookie", "a=1; Path=/"), ("Set-Cookie", "b=2")]);
        assert_eq!(resp.header("Set-Cookie"), Some("a=1; Path=/"));
        assert_eq!(resp.headers_all("SET-COOKIE").count(), 2);
        assert_eq!(resp.header("Location"), None);

        let name = String::from("set-COOKIE");
        assert_eq!(resp.header(&name), Some("a=1; Path=/"));
    }

    #[test]
    fn status_classes() {
        assert!(response(301, &[]).is_redirect());
        assert!(response(308, &[]).is_redirect());
        assert!(!response(304, &[]).is_redirect());
        assert!(response(204, &[]).is_success());
        assert!(!response(404, &[]).is_success());
    }

    #[test]
    fn empty_response_has_no_body() {
        let resp = RawResponse::empty();
        assert!(resp.is_success());
        assert!(resp.body.is_empty());
    }
}
