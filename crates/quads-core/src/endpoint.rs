//! Endpoints and URL joining.

use crate::{Error, Result};
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use reqwest::Method;
use std::fmt;
use url::Url;

/// Characters escaped inside a single path segment.
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'\\')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// A concrete (verb, path) pair reachable under the API base URL.
///
/// `path` is relative to the base URL and may carry a pre-built query string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// HTTP verb
    pub method: Method,
    /// Relative path, optionally with `?query`
    pub path: String,
    /// Whether a JSON body is sent with the request
    pub expects_body: bool,
}

impl Endpoint {
    /// `GET path`
    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path, false)
    }

    /// `POST path` with a JSON body.
    #[must_use]
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path, true)
    }

    /// `PATCH path` with a JSON body.
    #[must_use]
    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path, true)
    }

    /// `DELETE path`
    #[must_use]
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path, false)
    }

    fn new(method: Method, path: impl Into<String>, expects_body: bool) -> Self {
        Self {
            method,
            path: path.into(),
            expects_body,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.path)
    }
}

/// Percent-encode `value` so it stays a single path segment.
///
/// Separators (`/`, `\`, `?`, `#`) and `%` are escaped. `.` and `..` cannot
/// be made literal by escaping and are left as is; [`join_url`] rejects them.
#[must_use]
pub fn path_segment(value: impl fmt::Display) -> String {
    utf8_percent_encode(&value.to_string(), SEGMENT).to_string()
}

fn is_dot_segment(segment: &str) -> bool {
    matches!(
        segment.to_ascii_lowercase().as_str(),
        "." | ".." | "%2e" | ".%2e" | "%2e." | "%2e%2e"
    )
}

/// Join `endpoint` onto `base`, keeping every segment of the base path.
///
/// The base is treated as a directory whether or not it ends in `/`, and a
/// leading `/` on the endpoint is ignored, so `/api/v3` + `/hosts` resolves
/// to `/api/v3/hosts` rather than `/hosts`. Query strings on the endpoint are
/// kept verbatim, including a bare trailing `?`.
///
/// # Errors
///
/// Returns [`Error::InvalidEndpoint`] if the endpoint path contains a `.` or
/// `..` segment or the joined URL cannot be parsed.
pub fn join_url(base: &Url, endpoint: &str) -> Result<Url> {
    let relative = endpoint.trim_start_matches('/');
    let path = relative.split(['?', '#']).next().unwrap_or_default();
    if path.split('/').any(is_dot_segment) {
        return Err(Error::InvalidEndpoint(format!(
            "Invalid API path `{endpoint}`: dot segments are not allowed"
        )));
    }

    let mut base = base.clone();
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.set_query(None);
    base.set_fragment(None);

    base.join(relative)
        .map_err(|err| Error::InvalidEndpoint(format!("Invalid API path `{endpoint}`: {err}")))
}
