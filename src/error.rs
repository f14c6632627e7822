//! Error types for pont-client.

use thiserror::Error;

/// Boxed error returned by effect handlers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Main error type for all pont operations.
#[derive(Debug, Error)]
pub enum PontError {
    /// Matcher is not one of the accepted forms (empty name, bad pattern).
    #[error("Invalid effect matcher: {reason}")]
    InvalidMatcher { reason: String },

    /// Handler could not be resolved into something callable.
    #[error("Invalid handler: {reason}")]
    InvalidHandler { reason: String },

    /// Effect is neither a string nor an object carrying a string `type`.
    #[error("Invalid effect: {reason}")]
    InvalidEffect { reason: String },

    /// No handler executed for the effect.
    #[error("Unhandled effect: {effect}")]
    UnhandledEffect { effect: String },

    /// An effect handler returned an error.
    #[error("Effect handler for `{effect}` failed: {source}")]
    EffectHandler {
        effect: String,
        #[source]
        source: BoxError,
    },

    /// No service registered under the given name.
    #[error("Unknown service: {name}")]
    UnknownService { name: String },

    /// A service is already registered under the given name.
    #[error("Service already registered: {name}")]
    DuplicateService { name: String },

    /// Service was registered with a different input/output signature.
    #[error("Service `{name}` was invoked with a signature it was not registered with")]
    ServiceSignature { name: String },

    /// Response kind does not fit the call that requested it.
    #[error("Response type mismatch: expected {expected}, got {actual}")]
    ResponseTypeMismatch {
        expected: &'static str,
        actual: &'static str,
    },

    /// Response could not be classified as a protocol response.
    #[error("Unhandled response (status {status}): {reason}")]
    UnhandledResponse { status: u16, reason: String },

    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL could not be parsed or joined.
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// Invalid runtime configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias using PontError.
pub type Result<T> = std::result::Result<T, PontError>;
