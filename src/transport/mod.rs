//! Transport module - sending requests.
//!
//! The pipeline reaches the network only through the `"transporter"`
//! service, whose output is a [`TransportFuture`]. [`HttpTransporter`] is the
//! default implementation; tests and embedders register their own.

mod http;

pub use http::HttpTransporter;

use std::future::Future;
use std::pin::Pin;

use crate::error::Result;
use crate::protocol::RawResponse;

/// Boxed, sendable future.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Output of the `"transporter"` service.
pub type TransportFuture = BoxFuture<'static, Result<RawResponse>>;

/// Box an `async` block as a [`TransportFuture`].
pub fn transport_future<F>(future: F) -> TransportFuture
where
    F: Future<Output = Result<RawResponse>> + Send + 'static,
{
    Box::pin(future)
}
