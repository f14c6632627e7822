//! Effect dispatcher.
//!
//! Runs one effect occurrence through the matcher buckets in a fixed order:
//!
//! 1. exact-name handlers
//! 2. pattern handlers, in pattern registration order
//! 3. predicate handlers, in predicate registration order
//! 4. `"default"` handlers, only if no handler has completed yet
//! 5. `"*"` handlers, always
//!
//! If no handler completed after step 5 the dispatch fails with
//! [`PontError::UnhandledEffect`].

use tracing::{debug, trace};

use super::registry::{EffectHandler, HandlerResult, HandlerTable, MatcherRegistry, Registered};
use super::{DispatchContext, IntoEffect, IntoMatcher};
use crate::error::{PontError, Result};
use crate::registration::Unregister;

/// Summary of one completed dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchReport {
    /// Number of handlers that ran to completion.
    pub executed: usize,
    /// Whether any handler marked the effect as handled.
    pub handled: bool,
}

/// Routes effects to the handlers registered in its [`MatcherRegistry`].
#[derive(Default)]
pub struct EffectDispatcher {
    registry: MatcherRegistry,
}

impl EffectDispatcher {
    /// Create a dispatcher with an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The underlying registry.
    pub fn registry(&self) -> &MatcherRegistry {
        &self.registry
    }

    /// Register a handler. See [`MatcherRegistry::register`].
    pub fn register<M, F>(&self, matcher: M, handler: F) -> Result<Unregister>
    where
        M: IntoMatcher,
        F: Fn(&mut DispatchContext<'_>) -> HandlerResult + Send + Sync + 'static,
    {
        self.registry.register(matcher, handler)
    }

    /// Register many handlers. See [`MatcherRegistry::register_all`].
    pub fn register_all<I, M, F>(&self, pairs: I) -> Result<Unregister>
    where
        I: IntoIterator<Item = (M, F)>,
        M: IntoMatcher,
        F: Fn(&mut DispatchContext<'_>) -> HandlerResult + Send + Sync + 'static,
    {
        self.registry.register_all(pairs)
    }

    /// Register a handler table. See [`MatcherRegistry::register_table`].
    pub fn register_table(&self, table: HandlerTable) -> Unregister {
        self.registry.register_table(table)
    }

    /// Dispatch one effect.
    pub fn dispatch<E: IntoEffect>(&self, effect: E) -> Result<DispatchReport> {
        let effect = effect.into_effect()?;
        let kind = effect.kind();
        debug!(effect = kind, "Dispatching effect");

        let snapshot = self.registry.snapshot(kind);
        let mut ctx = DispatchContext::new(&effect);

        run_all(&mut ctx, &snapshot.exact)?;

        for (pattern, handlers) in &snapshot.patterns {
            if pattern.is_match(kind) {
                run_all(&mut ctx, handlers)?;
            }
        }

        for (predicate, handlers) in &snapshot.predicates {
            if predicate(kind) {
                run_all(&mut ctx, handlers)?;
            }
        }

        if ctx.execution_count() == 0 {
            run_all(&mut ctx, &snapshot.defaults)?;
        }

        run_all(&mut ctx, &snapshot.wildcards)?;

        if ctx.execution_count() == 0 {
            return Err(PontError::UnhandledEffect {
                effect: kind.to_string(),
            });
        }

        trace!(
            effect = kind,
            executed = ctx.execution_count(),
            handled = ctx.was_handled(),
            "Effect dispatched"
        );

        Ok(DispatchReport {
            executed: ctx.execution_count(),
            handled: ctx.was_handled(),
        })
    }

    /// Dispatch effects in order, stopping at the first failure.
    ///
    /// Effects after a failing one are never converted or dispatched.
    pub fn dispatch_all<I>(&self, effects: I) -> Result<Vec<DispatchReport>>
    where
        I: IntoIterator,
        I::Item: IntoEffect,
    {
        effects
            .into_iter()
            .map(|effect| self.dispatch(effect))
            .collect()
    }
}

fn run_all(ctx: &mut DispatchContext<'_>, handlers: &[Registered]) -> Result<()> {
    for registered in handlers {
        run(ctx, &registered.handler)?;
    }
    Ok(())
}

fn run(ctx: &mut DispatchContext<'_>, handler: &EffectHandler) -> Result<()> {
    ctx.begin();
    handler(&mut *ctx).map_err(|source| PontError::EffectHandler {
        effect: ctx.kind().to_string(),
        source,
    })?;
    ctx.complete();
    Ok(())
}
