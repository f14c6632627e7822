//! Request descriptors.
//!
//! [`VisitOptions`] is what callers build; the runtime turns it into a
//! [`Request`] (URL resolved, query serialized, headers merged) before the
//! transporter sees it.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// HTTP method of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    #[default]
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    /// Upper-case method name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

/// Fully resolved request handed to the transporter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Request {
    /// HTTP method.
    pub method: Method,
    /// Absolute URL, query included.
    pub url: String,
    /// JSON body (never set for GET).
    pub data: Option<Value>,
    /// Request headers, lower-case names.
    pub headers: BTreeMap<String, String>,
}

impl Request {
    /// Header value by case-insensitive name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }
}

/// Caller-side description of a navigation or data call.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct VisitOptions {
    /// HTTP method.
    pub method: Method,
    /// Absolute or base-relative URL.
    pub url: String,
    /// Query params for GET, JSON body otherwise.
    pub data: Option<Value>,
    /// Extra request headers.
    pub headers: BTreeMap<String, String>,
}

impl VisitOptions {
    /// GET request to `url`.
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::Get, url)
    }

    /// POST request to `url`.
    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::Post, url)
    }

    /// Request with an explicit method.
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            ..Self::default()
        }
    }

    /// Attach data.
    pub fn data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Add a header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .insert(name.into().to_ascii_lowercase(), value.into());
        self
    }
}

impl From<&str> for VisitOptions {
    fn from(url: &str) -> Self {
        Self::get(url)
    }
}

impl From<String> for VisitOptions {
    fn from(url: String) -> Self {
        Self::get(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_method_names() {
        assert_eq!(Method::default(), Method::Get);
        assert_eq!(Method::Patch.to_string(), "PATCH");
        assert_eq!(reqwest::Method::from(Method::Delete), reqwest::Method::DELETE);
        assert_eq!(serde_json::to_value(Method::Post).unwrap(), json!("POST"));
    }

    #[test]
    fn test_options_builder() {
        let options = VisitOptions::post("/users")
            .data(json!({"name": "Ada"}))
            .header("X-Trace", "1");

        assert_eq!(options.method, Method::Post);
        assert_eq!(options.url, "/users");
        assert_eq!(options.data, Some(json!({"name": "Ada"})));
        assert_eq!(options.headers.get("x-trace").map(String::as_str), Some("1"));
    }

    #[test]
    fn test_request_header_lookup_is_case_insensitive() {
        let request = Request {
            method: Method::Get,
            url: "https://app.test/".into(),
            data: None,
            headers: BTreeMap::from([("x-pont".to_string(), "true".to_string())]),
        };

        assert_eq!(request.header("X-Pont"), Some("true"));
        assert_eq!(request.header("accept"), None);
    }
}
