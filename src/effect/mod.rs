//! Effect module - server-declared side effects and their dispatch.
//!
//! Provides:
//! - [`Effect`] - a named side-effect instruction with optional props
//! - [`Matcher`] - rules selecting which handlers run for an effect
//! - [`MatcherRegistry`] - handler registrations keyed by matcher
//! - [`EffectDispatcher`] - runs one effect through every matcher bucket
//! - [`DispatchContext`] - per-effect state shared by all handlers
//!
//! # Example
//!
//! ```
//! use pont_client::effect::{EffectDispatcher, Matcher};
//!
//! let dispatcher = EffectDispatcher::new();
//!
//! dispatcher
//!     .register("toast", |ctx| {
//!         ctx.handled();
//!         Ok(())
//!     })
//!     .unwrap();
//! dispatcher
//!     .register(Matcher::pattern("^analytics\\.").unwrap(), |_ctx| Ok(()))
//!     .unwrap();
//!
//! let report = dispatcher.dispatch("toast").unwrap();
//! assert!(report.handled);
//! ```

mod context;
mod dispatcher;
mod matcher;
mod registry;

pub use context::DispatchContext;
pub use dispatcher::{DispatchReport, EffectDispatcher};
pub use matcher::{IntoMatcher, Matcher};
pub use registry::{EffectHandler, HandlerResult, HandlerTable, MatcherRegistry};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{PontError, Result};

/// A named side-effect instruction declared by a response.
///
/// A bare string is shorthand for an effect without props.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value")]
pub struct Effect {
    #[serde(rename = "type")]
    kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    props: Option<Value>,
}

impl Effect {
    /// Create an effect without props.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            props: None,
        }
    }

    /// Create an effect carrying props.
    pub fn with_props(kind: impl Into<String>, props: Value) -> Self {
        Self {
            kind: kind.into(),
            props: Some(props),
        }
    }

    /// The effect `type`.
    #[inline]
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// The effect props, if any.
    #[inline]
    pub fn props(&self) -> Option<&Value> {
        self.props.as_ref()
    }

    /// Normalize a raw JSON value into an effect.
    ///
    /// Accepts a string or an object with a string `type`.
    pub fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::String(kind) => Ok(Self::new(kind.clone())),
            Value::Object(map) => match map.get("type") {
                Some(Value::String(kind)) => {
                    let props = map.get("props").filter(|p| !p.is_null()).cloned();
                    Ok(Self {
                        kind: kind.clone(),
                        props,
                    })
                }
                _ => Err(PontError::InvalidEffect {
                    reason: "object effect is missing a string `type`".to_string(),
                }),
            },
            other => Err(PontError::InvalidEffect {
                reason: format!("expected string or object, got {}", json_kind(other)),
            }),
        }
    }
}

impl TryFrom<Value> for Effect {
    type Error = PontError;

    fn try_from(value: Value) -> Result<Self> {
        Self::from_value(&value)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Conversion into an [`Effect`], validated at dispatch time.
pub trait IntoEffect {
    /// Convert, failing with `InvalidEffect` on malformed input.
    fn into_effect(self) -> Result<Effect>;
}

impl IntoEffect for Effect {
    fn into_effect(self) -> Result<Effect> {
        Ok(self)
    }
}

impl IntoEffect for &Effect {
    fn into_effect(self) -> Result<Effect> {
        Ok(self.clone())
    }
}

impl IntoEffect for &str {
    fn into_effect(self) -> Result<Effect> {
        Ok(Effect::new(self))
    }
}

impl IntoEffect for String {
    fn into_effect(self) -> Result<Effect> {
        Ok(Effect::new(self))
    }
}

impl IntoEffect for Value {
    fn into_effect(self) -> Result<Effect> {
        Effect::from_value(&self)
    }
}

impl IntoEffect for &Value {
    fn into_effect(self) -> Result<Effect> {
        Effect::from_value(self)
    }
}
