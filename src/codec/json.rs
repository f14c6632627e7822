//! JSON codec using `serde_json`.

use bytes::Bytes;

use crate::error::Result;

/// JSON codec for request and response bodies.
pub struct JsonCodec;

impl JsonCodec {
    /// Encode a value to JSON bytes.
    ///
    /// # Errors
    ///
    /// Returns error if the value cannot be serialized.
    #[inline]
    pub fn encode<T: serde::Serialize>(value: &T) -> Result<Bytes> {
        Ok(Bytes::from(serde_json::to_vec(value)?))
    }

    /// Decode JSON bytes to a value.
    ///
    /// # Errors
    ///
    /// Returns error if the bytes are not valid JSON for type T.
    #[inline]
    pub fn decode<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PontError;
    use serde::{Deserialize, Serialize};

    #[derive(Serialize, Deserialize, PartialEq, Debug)]
    struct Flash {
        level: String,
        message: String,
    }

    #[test]
    fn test_encode_decode_struct() {
        let original = Flash {
            level: "info".to_string(),
            message: "saved".to_string(),
        };

        let encoded = JsonCodec::encode(&original).unwrap();
        assert_eq!(&encoded[..], br#"{"level":"info","message":"saved"}"#);

        let decoded: Flash = JsonCodec::decode(&encoded).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn test_decode_invalid() {
        let result: Result<Flash> = JsonCodec::decode(b"<html>");
        assert!(matches!(result, Err(PontError::Json(_))));
    }

    #[test]
    fn test_decode_wrong_shape() {
        let result: Result<Flash> = JsonCodec::decode(br#"{"level":"info"}"#);
        assert!(result.is_err());
    }
}
