//! Service shapes and initializers.
//!
//! A service implementation comes in one of four shapes, each with its own
//! calling convention:
//!
//! | shape | stored as | invocation |
//! |-------|-----------|------------|
//! | constructor | `Fn(&RuntimeContext) -> S` | new `S` per call, then `S::handle(input)` |
//! | instance | `S: Service` | `S::handle(input)` on the shared instance |
//! | function | `Fn(&RuntimeContext, I) -> O` | called with the context |
//! | object | `S: ServiceObject` | `S::handle(ctx, input)` |
//!
//! The [`Service`] trait is the marker for handler-bearing instances; no
//! type-identity checks are involved.

use std::fmt;

use crate::context::RuntimeContext;

/// Handler-bearing instance, built with the context it needs.
pub trait Service: Send + Sync + 'static {
    /// Call input.
    type Input;
    /// Call output.
    type Output;

    /// Handle one call.
    fn handle(&self, input: Self::Input) -> Self::Output;
}

/// Plain handler object receiving the context on every call.
pub trait ServiceObject: Send + Sync + 'static {
    /// Call input.
    type Input;
    /// Call output.
    type Output;

    /// Handle one call.
    fn handle(&self, ctx: &RuntimeContext, input: Self::Input) -> Self::Output;
}

/// Calling convention of a registered service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceShape {
    /// Re-instantiated on every call.
    Constructor,
    /// One shared instance.
    Instance,
    /// Plain function.
    Function,
    /// Object with a context-taking `handle`.
    Object,
}

impl fmt::Display for ServiceShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Constructor => "constructor",
            Self::Instance => "instance",
            Self::Function => "function",
            Self::Object => "object",
        })
    }
}

pub(crate) type BoxService<I, O> = Box<dyn Service<Input = I, Output = O>>;
pub(crate) type Constructor<I, O> = Box<dyn Fn(&RuntimeContext) -> BoxService<I, O> + Send + Sync>;
pub(crate) type Function<I, O> = Box<dyn Fn(&RuntimeContext, I) -> O + Send + Sync>;
pub(crate) type Factory<I, O> = Box<dyn FnOnce(&RuntimeContext) -> ServiceInit<I, O> + Send>;

/// Initializer accepted by service registration.
///
/// `Factory` is invoked once at registration time and its result is
/// classified again; the other variants map directly onto a
/// [`ServiceShape`].
pub enum ServiceInit<I, O> {
    /// See [`ServiceShape::Constructor`].
    Constructor(Constructor<I, O>),
    /// See [`ServiceShape::Instance`].
    Instance(BoxService<I, O>),
    /// See [`ServiceShape::Function`].
    Function(Function<I, O>),
    /// See [`ServiceShape::Object`].
    Object(Box<dyn ServiceObject<Input = I, Output = O>>),
    /// Produces another initializer at registration.
    Factory(Factory<I, O>),
}

impl<I: 'static, O: 'static> ServiceInit<I, O> {
    /// Build a new `S` from the context on every call.
    pub fn constructor<S, F>(construct: F) -> Self
    where
        S: Service<Input = I, Output = O>,
        F: Fn(&RuntimeContext) -> S + Send + Sync + 'static,
    {
        Self::Constructor(Box::new(move |ctx: &RuntimeContext| -> BoxService<I, O> {
            Box::new(construct(ctx))
        }))
    }

    /// Share one instance across calls.
    pub fn instance<S>(service: S) -> Self
    where
        S: Service<Input = I, Output = O>,
    {
        Self::Instance(Box::new(service))
    }

    /// Plain function called with the context.
    pub fn function<F>(function: F) -> Self
    where
        F: Fn(&RuntimeContext, I) -> O + Send + Sync + 'static,
    {
        Self::Function(Box::new(function))
    }

    /// Object whose `handle` receives the context explicitly.
    pub fn object<S>(object: S) -> Self
    where
        S: ServiceObject<Input = I, Output = O>,
    {
        Self::Object(Box::new(object))
    }

    /// Defer the choice of shape to registration time.
    pub fn factory<F>(factory: F) -> Self
    where
        F: FnOnce(&RuntimeContext) -> ServiceInit<I, O> + Send + 'static,
    {
        Self::Factory(Box::new(factory))
    }
}

impl<I, O> fmt::Debug for ServiceInit<I, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Constructor(_) => "Constructor",
            Self::Instance(_) => "Instance",
            Self::Function(_) => "Function",
            Self::Object(_) => "Object",
            Self::Factory(_) => "Factory",
        };
        write!(f, "ServiceInit::{name}")
    }
}
