//! Dispatch context shared by every handler of one effect occurrence.
//!
//! The context is created once per dispatched effect and passed by
//! `&mut` reference to each handler in turn. Handlers can only mark the
//! effect as handled; the execution counters are maintained by the
//! dispatcher.
//!
//! # Example
//!
//! ```ignore
//! dispatcher.register("*", |ctx| {
//!     if !ctx.was_handled() {
//!         tracing::warn!(effect = ctx.kind(), "nobody handled effect");
//!     }
//!     Ok(())
//! })?;
//! ```

use serde_json::Value;

use super::Effect;

/// Per-effect state visible to all handlers of one dispatch.
#[derive(Debug)]
pub struct DispatchContext<'a> {
    effect: &'a Effect,
    handled: bool,
    executed: bool,
    execution_count: usize,
}

impl<'a> DispatchContext<'a> {
    pub(crate) fn new(effect: &'a Effect) -> Self {
        Self {
            effect,
            handled: false,
            executed: false,
            execution_count: 0,
        }
    }

    /// The effect being dispatched.
    #[inline]
    pub fn effect(&self) -> &'a Effect {
        self.effect
    }

    /// The effect `type`.
    #[inline]
    pub fn kind(&self) -> &'a str {
        self.effect.kind()
    }

    /// The effect props, if any.
    #[inline]
    pub fn props(&self) -> Option<&'a Value> {
        self.effect.props()
    }

    /// Mark the effect as handled for every handler that runs afterwards.
    pub fn handled(&mut self) {
        self.handled = true;
    }

    /// Whether any handler so far called [`handled`](Self::handled).
    #[inline]
    pub fn was_handled(&self) -> bool {
        self.handled
    }

    /// Whether any handler has started executing, including the current one.
    #[inline]
    pub fn was_executed(&self) -> bool {
        self.executed
    }

    /// Number of handlers that completed before the current one.
    #[inline]
    pub fn execution_count(&self) -> usize {
        self.execution_count
    }

    pub(crate) fn begin(&mut self) {
        self.executed = true;
    }

    pub(crate) fn complete(&mut self) {
        self.execution_count += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_fresh_context() {
        let effect = Effect::with_props("toast", json!({"text": "hi"}));
        let ctx = DispatchContext::new(&effect);

        assert_eq!(ctx.kind(), "toast");
        assert_eq!(ctx.props(), Some(&json!({"text": "hi"})));
        assert!(!ctx.was_handled());
        assert!(!ctx.was_executed());
        assert_eq!(ctx.execution_count(), 0);
    }

    #[test]
    fn test_counters_advance() {
        let effect = Effect::new("x");
        let mut ctx = DispatchContext::new(&effect);

        ctx.begin();
        assert!(ctx.was_executed());
        assert_eq!(ctx.execution_count(), 0);

        ctx.handled();
        ctx.complete();
        assert!(ctx.was_handled());
        assert_eq!(ctx.execution_count(), 1);
    }
}
