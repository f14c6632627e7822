//! Runtime context handed to services.

use std::sync::Arc;

use crate::config::RuntimeConfig;

/// Explicitly constructed runtime context.
///
/// Cheap to clone; every service invocation receives a reference to it.
#[derive(Debug, Clone, Default)]
pub struct RuntimeContext {
    config: Arc<RuntimeConfig>,
}

impl RuntimeContext {
    /// Create a context around a configuration.
    pub fn new(config: RuntimeConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// The runtime configuration.
    #[inline]
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }
}
