use std::fmt;

use reqwest::blocking::Client;
use reqwest::redirect::Policy;
use reqwest::{Method, StatusCode, Url};
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{Error, Result};

pub const TOKEN_PARAM: &str = "token";

/// An outgoing call. Every parameter travels in the query string.
#[derive(Clone, PartialEq)]
pub struct Request {
    pub method: Method,
    pub url: Url,
}

impl Request {
    pub fn new(method: Method, url: Url) -> Self {
        Self { method, url }
    }

    /// Resolve `path` against `base` and append `params` to the query.
    pub fn build(method: Method, base: &Url, path: &str, params: &[(&str, &str)]) -> Result<Self> {
        let mut url = base
            .join(path)
            .map_err(|e| Error::InvalidUrl(format!("{base}{path}: {e}")))?;
        if !params.is_empty() {
            url.query_pairs_mut().extend_pairs(params);
        }
        Ok(Self { method, url })
    }

    pub fn has_token(&self) -> bool {
        self.url.query_pairs().any(|(key, _)| key == TOKEN_PARAM)
    }

    /// Set the `token` query parameter, replacing any existing one.
    pub fn set_token(&mut self, token: &str) {
        let kept: Vec<(String, String)> = self
            .url
            .query_pairs()
            .filter(|(key, _)| key != TOKEN_PARAM)
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect();

        self.url.set_query(None);
        self.url
            .query_pairs_mut()
            .extend_pairs(kept)
            .append_pair(TOKEN_PARAM, token);
    }

    /// Strip any `token` query parameter.
    pub fn clear_token(&mut self) {
        if !self.has_token() {
            return;
        }
        let kept: Vec<(String, String)> = self
            .url
            .query_pairs()
            .filter(|(key, _)| key != TOKEN_PARAM)
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect();

        self.url.set_query(None);
        if !kept.is_empty() {
            self.url.query_pairs_mut().extend_pairs(kept);
        }
    }
}

// The query of a login call carries the password and every other call the
// token, so only the path is shown.
impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("method", &self.method)
            .field("path", &self.url.path())
            .finish_non_exhaustive()
    }
}

/// A response whose body has already been read to the end.
#[derive(Clone, PartialEq)]
pub struct Response {
    pub status: StatusCode,
    pub url: Url,
    pub body: Vec<u8>,
}

// The final URL echoes the request query and a login body holds the token.
impl fmt::Debug for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Response")
            .field("status", &self.status)
            .field("path", &self.url.path())
            .field("body_len", &self.body.len())
            .finish()
    }
}

impl Response {
    /// Parse the body as a JSON object. Other JSON values yield an empty map.
    pub fn json_object(&self) -> Result<Map<String, Value>> {
        match serde_json::from_slice::<Value>(&self.body)? {
            Value::Object(map) => Ok(map),
            _ => Ok(Map::new()),
        }
    }
}

/// Sends requests to the service.
///
/// Implementations must consume the whole response body before returning so
/// the underlying connection can carry the next request.
pub trait Transport {
    fn send(&self, request: &Request) -> Result<Response>;
}

/// HTTPS transport over a pooled blocking `reqwest` client. Redirects are
/// never followed.
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self> {
        let client = Client::builder().redirect(Policy::none()).build()?;
        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    fn send(&self, request: &Request) -> Result<Response> {
        // The query may hold credentials, log the path only.
        debug!(method = %request.method, path = request.url.path(), "sending request");

        let response = self
            .client
            .request(request.method.clone(), request.url.clone())
            .send()?;

        let status = response.status();
        let url = response.url().clone();
        let body = response.bytes()?.to_vec();

        debug!(status = status.as_u16(), bytes = body.len(), "received response");
        Ok(Response { status, url, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(url: &str) -> Request {
        Request::new(Method::GET, Url::parse(url).unwrap())
    }

    #[test]
    fn test_build_appends_params() {
        let base = Url::parse("https://btconnectedpower.com").unwrap();
        let req = Request::build(Method::GET, &base, "/api/monitor/status", &[("monitorId", "m 1")]).unwrap();
        assert_eq!(req.url.as_str(), "https://btconnectedpower.com/api/monitor/status?monitorId=m+1");

        let bare = Request::build(Method::POST, &base, "/api/users/login", &[]).unwrap();
        assert_eq!(bare.url.query(), None);
    }

    #[test]
    fn test_has_token_checks_parameter_names() {
        assert!(request("https://h/p?token=abc").has_token());
        assert!(request("https://h/p?a=1&token=").has_token());
        assert!(!request("https://h/p?tokens=1").has_token());
        assert!(!request("https://h/p?q=token").has_token());
        assert!(!request("https://h/token").has_token());
    }

    #[test]
    fn test_set_token_appends() {
        let mut req = request("https://h/p");
        req.set_token("abc");
        assert_eq!(req.url.as_str(), "https://h/p?token=abc");

        let mut req = request("https://h/p?monitorId=m1");
        req.set_token("a&b");
        assert_eq!(req.url.as_str(), "https://h/p?monitorId=m1&token=a%26b");
    }

    #[test]
    fn test_set_token_replaces_stale_token() {
        let mut req = request("https://h/p?token=old&monitorId=m1");
        req.set_token("new");
        let tokens: Vec<_> = req.url.query_pairs().filter(|(k, _)| k == TOKEN_PARAM).collect();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].1, "new");
        assert!(req.url.query_pairs().any(|(k, v)| k == "monitorId" && v == "m1"));
    }

    #[test]
    fn test_clear_token() {
        let mut req = request("https://h/p?token=old");
        req.clear_token();
        assert_eq!(req.url.query(), None);

        let mut req = request("https://h/p?token=old&a=1");
        req.clear_token();
        assert_eq!(req.url.query(), Some("a=1"));
    }

    #[test]
    fn test_json_object() {
        let url = Url::parse("https://h/p").unwrap();
        let response = Response { status: StatusCode::OK, url: url.clone(), body: br#"{"a":1}"#.to_vec() };
        assert_eq!(response.json_object().unwrap().get("a"), Some(&serde_json::json!(1)));

        let list = Response { status: StatusCode::OK, url: url.clone(), body: b"[1,2]".to_vec() };
        assert!(list.json_object().unwrap().is_empty());

        let broken = Response { status: StatusCode::OK, url, body: b"<html>".to_vec() };
        assert!(matches!(broken.json_object(), Err(Error::Json(_))));
    }

    #[test]
    fn test_debug_hides_query_and_body() {
        let req = request("https://h/api/users/login?email=me%40example.com&password=hunter2");
        let shown = format!("{req:?}");
        assert!(shown.contains("/api/users/login"));
        assert!(!shown.contains("hunter2"));
        assert!(!shown.contains("example.com"));

        let response = Response {
            status: StatusCode::OK,
            url: req.url.clone(),
            body: br#"{"token":"secret-token"}"#.to_vec(),
        };
        let shown = format!("{response:?}");
        assert!(shown.contains("200"));
        assert!(!shown.contains("hunter2"));
        assert!(!shown.contains("secret-token"));
    }
}
