//! Raw and typed responses, and the default response classification.
//!
//! A raw response only counts as a protocol response when it carries the
//! protocol marker header and a JSON body with a known `type`:
//!
//! ```text
//! { "type": "visit",   "page": {...}, "layout": {...}, "globals": {...}, "effects": [...] }
//! { "type": "partial", "pageProps": {...}, "layoutProps": {...}, "globals": {...}, "effects": [...] }
//! { "type": "data",    "data": ..., "effects": [...] }
//! { "type": "empty",   "effects": [...] }
//! ```
//!
//! Anything else classifies as [`Response::Unhandled`].

use std::collections::BTreeMap;

use bytes::Bytes;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::debug;

use super::Props;
use crate::codec::JsonCodec;
use crate::context::RuntimeContext;
use crate::error::PontError;
use crate::service::ServiceObject;

/// Longest body excerpt quoted in an unhandled-response error.
const BODY_EXCERPT_LEN: usize = 120;

/// Response as returned by the transporter.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response headers, lower-case names.
    pub headers: BTreeMap<String, String>,
    /// Response body.
    pub body: Bytes,
}

impl RawResponse {
    /// Create a response; header names are lower-cased.
    pub fn new<H, K, V>(status: u16, headers: H, body: impl Into<Bytes>) -> Self
    where
        H: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        Self {
            status,
            headers: headers
                .into_iter()
                .map(|(k, v)| (k.as_ref().to_ascii_lowercase(), v.into()))
                .collect(),
            body: body.into(),
        }
    }

    /// Header value by case-insensitive name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Start of the body as lossy UTF-8, for diagnostics.
    pub fn body_excerpt(&self) -> String {
        let text = String::from_utf8_lossy(&self.body);
        let mut excerpt: String = text.chars().take(BODY_EXCERPT_LEN).collect();
        if text.chars().count() > BODY_EXCERPT_LEN {
            excerpt.push('…');
        }
        excerpt
    }
}

/// A server-rendered component by name.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct View {
    /// Component name.
    pub name: String,
    /// Component props.
    #[serde(default, deserialize_with = "lenient_props")]
    pub props: Props,
}

impl View {
    /// Create a view.
    pub fn new(name: impl Into<String>, props: Props) -> Self {
        Self {
            name: name.into(),
            props,
        }
    }
}

/// Full navigation: new page, optional layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Visit {
    /// Canonical URL of the page, if the server sets one.
    #[serde(default)]
    pub url: Option<String>,
    /// Page component.
    pub page: View,
    /// Layout component.
    #[serde(default)]
    pub layout: Option<View>,
    /// Global props.
    #[serde(default, deserialize_with = "lenient_props")]
    pub globals: Props,
    /// Raw effects, validated on dispatch.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub effects: Vec<Value>,
}

/// Prop update for the current page and layout.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Partial {
    /// Props merged into the current page.
    #[serde(default, deserialize_with = "lenient_optional_props")]
    pub page_props: Option<Props>,
    /// Props merged into the current layout.
    #[serde(default, deserialize_with = "lenient_optional_props")]
    pub layout_props: Option<Props>,
    /// Props merged into the globals.
    #[serde(default, deserialize_with = "lenient_optional_props")]
    pub globals: Option<Props>,
    /// Raw effects, validated on dispatch.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub effects: Vec<Value>,
}

/// Data call result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Data {
    /// Returned data.
    #[serde(default)]
    pub data: Value,
    /// Raw effects, validated on dispatch.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub effects: Vec<Value>,
}

/// Response with nothing but (optional) effects.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Empty {
    /// Raw effects, validated on dispatch.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub effects: Vec<Value>,
}

/// `null` reads as an empty list.
fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<Vec<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<Value>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Prop groups accept `null` and `[]` (an empty map serialized as a list)
/// as empty.
fn lenient_props<'de, D>(deserializer: D) -> std::result::Result<Props, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_optional_props(deserializer)?.unwrap_or_default())
}

fn lenient_optional_props<'de, D>(deserializer: D) -> std::result::Result<Option<Props>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(props)) => Ok(Some(props)),
        Some(Value::Array(items)) if items.is_empty() => Ok(Some(Props::new())),
        Some(other) => Err(D::Error::custom(format!(
            "expected a props object, got {other}"
        ))),
    }
}

/// Protocol body, tagged by `type`.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum Payload {
    Visit(Visit),
    #[serde(alias = "fragment")]
    Partial(Partial),
    Data(Data),
    Empty(Empty),
}

/// Typed response variant.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    /// Full navigation.
    Visit(Visit),
    /// Partial prop update.
    Partial(Partial),
    /// Data call result.
    Data(Data),
    /// Effects only.
    Empty(Empty),
    /// Not a protocol response.
    Unhandled(RawResponse),
}

impl Response {
    /// Variant name as used in the `type` field.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Visit(_) => "visit",
            Self::Partial(_) => "partial",
            Self::Data(_) => "data",
            Self::Empty(_) => "empty",
            Self::Unhandled(_) => "unhandled",
        }
    }

    /// Effects declared by the response.
    pub fn effects(&self) -> &[Value] {
        match self {
            Self::Visit(visit) => &visit.effects,
            Self::Partial(partial) => &partial.effects,
            Self::Data(data) => &data.effects,
            Self::Empty(empty) => &empty.effects,
            Self::Unhandled(_) => &[],
        }
    }

    /// Whether this is a navigation result (visit, partial or empty).
    pub fn is_navigation(&self) -> bool {
        matches!(self, Self::Visit(_) | Self::Partial(_) | Self::Empty(_))
    }
}

impl From<Payload> for Response {
    fn from(payload: Payload) -> Self {
        match payload {
            Payload::Visit(visit) => Self::Visit(visit),
            Payload::Partial(partial) => Self::Partial(partial),
            Payload::Data(data) => Self::Data(data),
            Payload::Empty(empty) => Self::Empty(empty),
        }
    }
}

/// Default `"responseHandler"` service.
///
/// Reads the protocol header name from the runtime configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseClassifier;

impl ResponseClassifier {
    /// Classify a raw response using `protocol_header` as the marker.
    pub fn classify(protocol_header: &str, raw: RawResponse) -> Response {
        if raw.header(protocol_header).is_none() {
            debug!(status = raw.status, "Response lacks protocol header");
            return Response::Unhandled(raw);
        }

        match JsonCodec::decode::<Payload>(&raw.body) {
            Ok(payload) => {
                let response = Response::from(payload);
                debug!(status = raw.status, kind = response.kind(), "Classified response");
                response
            }
            Err(e) => {
                debug!(status = raw.status, error = %e, "Response body is not a protocol payload");
                Response::Unhandled(raw)
            }
        }
    }
}

impl ServiceObject for ResponseClassifier {
    type Input = RawResponse;
    type Output = Response;

    fn handle(&self, ctx: &RuntimeContext, raw: RawResponse) -> Response {
        Self::classify(&ctx.config().protocol_header, raw)
    }
}

/// Default `"unhandledResponseHandler"` service.
pub fn unhandled_response(_ctx: &RuntimeContext, raw: RawResponse) -> PontError {
    PontError::UnhandledResponse {
        status: raw.status,
        reason: raw.body_excerpt(),
    }
}
