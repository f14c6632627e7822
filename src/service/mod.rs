//! Service module - named, pluggable extension points.
//!
//! Provides:
//! - [`ServiceKey`] - a service name together with its call signature
//! - [`ServiceInit`] - the four initializer shapes (plus deferred factories)
//! - [`ServiceRegistry`] - one handler per name, invoked uniformly
//!
//! The pipeline consumes the five standard keys below. Applications may
//! declare their own keys for other extension points.

mod registry;
mod shape;

pub use registry::ServiceRegistry;
pub use shape::{Service, ServiceInit, ServiceObject, ServiceShape};

use std::fmt;
use std::marker::PhantomData;

use serde_json::Value;

use crate::error::PontError;
use crate::protocol::{Props, RawResponse, Request, Response};
use crate::transport::TransportFuture;

/// Typed service name.
///
/// The type parameters fix the input and output of the service; invoking a
/// name with a signature other than the registered one fails with
/// `ServiceSignature`.
pub struct ServiceKey<I, O> {
    name: &'static str,
    _signature: PhantomData<fn(I) -> O>,
}

impl<I, O> ServiceKey<I, O> {
    /// Declare a key.
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _signature: PhantomData,
        }
    }

    /// The service name.
    #[inline]
    pub const fn name(&self) -> &'static str {
        self.name
    }
}

impl<I, O> Clone for ServiceKey<I, O> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<I, O> Copy for ServiceKey<I, O> {}

impl<I, O> fmt::Debug for ServiceKey<I, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ServiceKey").field(&self.name).finish()
    }
}

/// Sends a request and yields the raw response.
pub const TRANSPORTER: ServiceKey<Request, TransportFuture> = ServiceKey::new("transporter");

/// Classifies a raw response into a typed [`Response`].
pub const RESPONSE_HANDLER: ServiceKey<RawResponse, Response> = ServiceKey::new("responseHandler");

/// Turns an unclassifiable response into the error the caller receives.
pub const UNHANDLED_RESPONSE_HANDLER: ServiceKey<RawResponse, PontError> =
    ServiceKey::new("unhandledResponseHandler");

/// Merges a partial prop group into a base one.
pub const PROPS_RECONCILER: ServiceKey<(Props, Props), Props> = ServiceKey::new("propsReconciler");

/// Serializes request data into a query string.
pub const PARAMS_SERIALIZER: ServiceKey<Value, String> = ServiceKey::new("paramsSerializer");

/// Names of the standard services.
pub const STANDARD_SERVICES: [&str; 5] = [
    TRANSPORTER.name(),
    RESPONSE_HANDLER.name(),
    UNHANDLED_RESPONSE_HANDLER.name(),
    PROPS_RECONCILER.name(),
    PARAMS_SERIALIZER.name(),
];
