//! `reqwest`-backed transporter.

use std::collections::BTreeMap;

use tracing::debug;

use super::{transport_future, TransportFuture};
use crate::codec::JsonCodec;
use crate::config::RuntimeConfig;
use crate::error::Result;
use crate::protocol::{RawResponse, Request};
use crate::service::Service;

/// Default `"transporter"` service.
///
/// Holds one `reqwest::Client` (connection pool) shared by every request.
#[derive(Debug, Clone)]
pub struct HttpTransporter {
    client: reqwest::Client,
}

impl HttpTransporter {
    /// Build a transporter with the configured timeout.
    ///
    /// # Errors
    ///
    /// Returns `Http` if the client cannot be initialized.
    pub fn new(config: &RuntimeConfig) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client })
    }

    fn build_request(client: &reqwest::Client, request: &Request) -> Result<reqwest::RequestBuilder> {
        let mut builder = client.request(request.method.into(), request.url.as_str());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(data) = &request.data {
            builder = builder
                .header(reqwest::header::CONTENT_TYPE, "application/json")
                .body(JsonCodec::encode(data)?);
        }
        Ok(builder)
    }

    async fn send(client: reqwest::Client, request: Request) -> Result<RawResponse> {
        let builder = Self::build_request(&client, &request)?;
        let response = builder.send().await?;
        let status = response.status().as_u16();
        let headers: BTreeMap<String, String> = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response.bytes().await?;

        debug!(method = %request.method, url = %request.url, status, "HTTP exchange complete");
        Ok(RawResponse {
            status,
            headers,
            body,
        })
    }
}

impl Service for HttpTransporter {
    type Input = Request;
    type Output = TransportFuture;

    fn handle(&self, request: Request) -> TransportFuture {
        transport_future(Self::send(self.client.clone(), request))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::Method;
    use std::time::Duration;

    #[test]
    fn test_build_from_config() {
        let config = RuntimeConfig {
            timeout: Duration::from_secs(5),
            ..RuntimeConfig::default()
        };
        assert!(HttpTransporter::new(&config).is_ok());
    }

    #[test]
    fn test_body_is_encoded_json() {
        let client = reqwest::Client::new();
        let request = Request {
            method: Method::Post,
            url: "http://localhost/users".to_string(),
            data: Some(serde_json::json!({"name": "Ada"})),
            headers: BTreeMap::from([("accept".to_string(), "application/json".to_string())]),
        };

        let built = HttpTransporter::build_request(&client, &request)
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(built.method(), reqwest::Method::POST);
        assert_eq!(built.headers()["content-type"], "application/json");
        assert_eq!(built.headers()["accept"], "application/json");
        let body = built.body().and_then(|b| b.as_bytes()).unwrap();
        assert_eq!(body, br#"{"name":"Ada"}"#);
    }

    #[test]
    fn test_get_without_data_has_no_body() {
        let client = reqwest::Client::new();
        let request = Request {
            method: Method::Get,
            url: "http://localhost/users?page=2".to_string(),
            data: None,
            headers: BTreeMap::new(),
        };

        let built = HttpTransporter::build_request(&client, &request)
            .unwrap()
            .build()
            .unwrap();
        assert!(built.body().is_none());
        assert!(built.headers().get("content-type").is_none());
    }

    #[tokio::test]
    async fn test_connection_failure_is_http_error() {
        let transporter = HttpTransporter::new(&RuntimeConfig::default()).unwrap();
        let request = Request {
            method: Method::Get,
            url: "http://127.0.0.1:9/unreachable".to_string(),
            data: None,
            headers: BTreeMap::new(),
        };

        let result = transporter.handle(request).await;
        assert!(matches!(result, Err(crate::error::PontError::Http(_))));
    }
}
