//! Codec module - JSON payloads and query strings.
//!
//! - [`JsonCodec`] - JSON bodies via `serde_json`
//! - [`serialize_params`] - bracket-style query encoding for GET data
//!
//! # Example
//!
//! ```
//! use pont_client::codec::{serialize_params, JsonCodec};
//! use serde_json::json;
//!
//! let encoded = JsonCodec::encode(&json!({"ok": true})).unwrap();
//! let decoded: serde_json::Value = JsonCodec::decode(&encoded).unwrap();
//! assert_eq!(decoded, json!({"ok": true}));
//!
//! let query = serialize_params(&json!({"page": 2, "tags": ["a", "b"]}));
//! assert_eq!(query, "page=2&tags%5B%5D=a&tags%5B%5D=b");
//! ```

mod json;
mod params;

pub use json::JsonCodec;
pub use params::serialize_params;
