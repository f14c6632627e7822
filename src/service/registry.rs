//! Service registry and invoker.
//!
//! One entry per service name. The shape of an entry is fixed when it is
//! registered; invocation picks the calling convention with a single match
//! on the stored handler and returns the handler's output unchanged.
//!
//! # Example
//!
//! ```
//! use pont_client::service::{ServiceInit, ServiceKey, ServiceRegistry, ServiceShape};
//! use pont_client::RuntimeContext;
//!
//! const GREETER: ServiceKey<String, String> = ServiceKey::new("greeter");
//!
//! let ctx = RuntimeContext::default();
//! let registry = ServiceRegistry::new();
//!
//! let shape = registry
//!     .register(&ctx, GREETER, ServiceInit::function(|_ctx, name: String| format!("hello {name}")))
//!     .unwrap();
//! assert_eq!(shape, ServiceShape::Function);
//!
//! let greeting = registry.invoke(&ctx, GREETER, "pont".to_string()).unwrap();
//! assert_eq!(greeting, "hello pont");
//! ```

use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use tracing::trace;

use super::shape::{BoxService, Constructor, Function, ServiceInit, ServiceObject, ServiceShape};
use super::ServiceKey;
use crate::context::RuntimeContext;
use crate::error::{PontError, Result};
use crate::registration::Unregister;

/// Factories may return factories; this bounds the chain.
const MAX_FACTORY_DEPTH: usize = 8;

/// Classified handler, one variant per shape.
enum ServiceHandler<I, O> {
    Constructor(Constructor<I, O>),
    Instance(BoxService<I, O>),
    Function(Function<I, O>),
    Object(Box<dyn ServiceObject<Input = I, Output = O>>),
}

impl<I: 'static, O: 'static> ServiceHandler<I, O> {
    fn shape(&self) -> ServiceShape {
        match self {
            Self::Constructor(_) => ServiceShape::Constructor,
            Self::Instance(_) => ServiceShape::Instance,
            Self::Function(_) => ServiceShape::Function,
            Self::Object(_) => ServiceShape::Object,
        }
    }

    fn call(&self, ctx: &RuntimeContext, input: I) -> O {
        match self {
            Self::Constructor(construct) => construct(ctx).handle(input),
            Self::Instance(instance) => instance.handle(input),
            Self::Function(function) => function(ctx, input),
            Self::Object(object) => object.handle(ctx, input),
        }
    }
}

/// Registered service: name, fixed shape and type-erased handler.
struct ServiceEntry {
    name: &'static str,
    shape: ServiceShape,
    handler: Box<dyn Any + Send + Sync>,
}

impl std::fmt::Debug for ServiceEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceEntry")
            .field("name", &self.name)
            .field("shape", &self.shape)
            .finish()
    }
}

type Entries = HashMap<&'static str, Arc<ServiceEntry>>;

/// Registry holding one handler per service name.
#[derive(Default)]
pub struct ServiceRegistry {
    entries: Arc<RwLock<Entries>>,
}

impl ServiceRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a service, classifying its initializer once.
    ///
    /// Fails with `DuplicateService` if the name is taken.
    pub fn register<I, O>(
        &self,
        ctx: &RuntimeContext,
        key: ServiceKey<I, O>,
        init: ServiceInit<I, O>,
    ) -> Result<ServiceShape>
    where
        I: 'static,
        O: 'static,
    {
        self.attach(ctx, key, init).map(|entry| entry.shape)
    }

    /// Register a service and return a handle that removes it again.
    pub fn register_dynamic<I, O>(
        &self,
        ctx: &RuntimeContext,
        key: ServiceKey<I, O>,
        init: ServiceInit<I, O>,
    ) -> Result<Unregister>
    where
        I: 'static,
        O: 'static,
    {
        let entry = self.attach(ctx, key, init)?;
        let entries: Weak<RwLock<Entries>> = Arc::downgrade(&self.entries);

        Ok(Unregister::new(move || {
            if let Some(entries) = entries.upgrade() {
                let mut entries = entries.write();
                // A later registration under the same name is left alone.
                if entries
                    .get(entry.name)
                    .is_some_and(|current| Arc::ptr_eq(current, &entry))
                {
                    entries.remove(entry.name);
                }
            }
        }))
    }

    fn attach<I, O>(
        &self,
        ctx: &RuntimeContext,
        key: ServiceKey<I, O>,
        init: ServiceInit<I, O>,
    ) -> Result<Arc<ServiceEntry>>
    where
        I: 'static,
        O: 'static,
    {
        let name = key.name();
        if self.contains(name) {
            return Err(PontError::DuplicateService {
                name: name.to_string(),
            });
        }

        // Factories run outside the lock; they may consult the registry.
        let handler = classify(ctx, name, init)?;
        let entry = Arc::new(ServiceEntry {
            name,
            shape: handler.shape(),
            handler: Box::new(handler),
        });

        let mut entries = self.entries.write();
        if entries.contains_key(name) {
            return Err(PontError::DuplicateService {
                name: name.to_string(),
            });
        }
        entries.insert(name, Arc::clone(&entry));
        Ok(entry)
    }

    /// Invoke a service and return its output verbatim.
    pub fn invoke<I, O>(&self, ctx: &RuntimeContext, key: ServiceKey<I, O>, input: I) -> Result<O>
    where
        I: 'static,
        O: 'static,
    {
        let name = key.name();
        let entry = self
            .entries
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| PontError::UnknownService {
                name: name.to_string(),
            })?;

        let handler = entry
            .handler
            .downcast_ref::<ServiceHandler<I, O>>()
            .ok_or_else(|| PontError::ServiceSignature {
                name: name.to_string(),
            })?;

        trace!(service = name, shape = %entry.shape, "Invoking service");
        Ok(handler.call(ctx, input))
    }

    /// Whether a service is registered under the name.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.read().contains_key(name)
    }

    /// Shape of the service registered under the name.
    pub fn shape(&self, name: &str) -> Option<ServiceShape> {
        self.entries.read().get(name).map(|entry| entry.shape)
    }

    /// Names of all registered services, sorted.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.entries.read().keys().copied().collect();
        names.sort_unstable();
        names
    }
}

fn classify<I, O>(
    ctx: &RuntimeContext,
    name: &str,
    mut init: ServiceInit<I, O>,
) -> Result<ServiceHandler<I, O>> {
    for _ in 0..=MAX_FACTORY_DEPTH {
        init = match init {
            ServiceInit::Constructor(construct) => return Ok(ServiceHandler::Constructor(construct)),
            ServiceInit::Instance(instance) => return Ok(ServiceHandler::Instance(instance)),
            ServiceInit::Function(function) => return Ok(ServiceHandler::Function(function)),
            ServiceInit::Object(object) => return Ok(ServiceHandler::Object(object)),
            ServiceInit::Factory(factory) => factory(ctx),
        };
    }

    Err(PontError::InvalidHandler {
        reason: format!(
            "service `{name}` factory chain exceeded {MAX_FACTORY_DEPTH} levels without producing a handler"
        ),
    })
}
