//! Protocol module - request descriptors, responses and payload format.
//!
//! This module implements the JSON side of the protocol:
//! - [`Request`] / [`VisitOptions`] for outgoing calls
//! - [`RawResponse`] as produced by the transporter
//! - [`Response`] variants produced by response classification

mod request;
mod response;

pub use request::{Method, Request, VisitOptions};
pub use response::{
    unhandled_response, Data, Empty, Partial, RawResponse, Response, ResponseClassifier, View,
    Visit,
};

/// Prop group: a JSON object.
pub type Props = serde_json::Map<String, serde_json::Value>;

/// Value of the protocol header on outgoing requests.
pub const PROTOCOL_HEADER_VALUE: &str = "true";
