//! Matcher registry for effect handlers.
//!
//! Handlers are stored in one bucket per matcher form. Exact names are
//! keyed by name; patterns (keyed by source) and predicates (keyed by
//! identity) keep the order in which their first handler was registered.
//!
//! # Example
//!
//! ```ignore
//! let registry = MatcherRegistry::new();
//!
//! let unregister = registry.register("toast", |ctx| {
//!     ctx.handled();
//!     Ok(())
//! })?;
//!
//! // Later
//! unregister.unregister();
//! ```

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use regex::Regex;

use super::matcher::{IntoMatcher, Matcher, Predicate};
use super::DispatchContext;
use crate::error::{BoxError, PontError, Result};
use crate::registration::Unregister;

/// Result type for effect handlers.
pub type HandlerResult = std::result::Result<(), BoxError>;

/// Shared effect handler.
pub type EffectHandler = Arc<dyn Fn(&mut DispatchContext<'_>) -> HandlerResult + Send + Sync>;

/// Handler plus the id its unregistration handle refers to.
#[derive(Clone)]
pub(crate) struct Registered {
    id: u64,
    pub(crate) handler: EffectHandler,
}

#[derive(Default)]
struct Buckets {
    exact: HashMap<String, Vec<Registered>>,
    patterns: Vec<(Regex, Vec<Registered>)>,
    predicates: Vec<(Predicate, Vec<Registered>)>,
    defaults: Vec<Registered>,
    wildcards: Vec<Registered>,
}

impl Buckets {
    fn insert(&mut self, matcher: Matcher, entry: Registered) {
        match matcher {
            Matcher::Exact(name) => self.exact.entry(name).or_default().push(entry),
            Matcher::Pattern(re) => {
                let found = self
                    .patterns
                    .iter()
                    .position(|(existing, _)| existing.as_str() == re.as_str());
                match found.and_then(|i| self.patterns.get_mut(i)) {
                    Some((_, handlers)) => handlers.push(entry),
                    None => self.patterns.push((re, vec![entry])),
                }
            }
            Matcher::Predicate(p) => {
                let found = self
                    .predicates
                    .iter()
                    .position(|(existing, _)| Arc::ptr_eq(existing, &p));
                match found.and_then(|i| self.predicates.get_mut(i)) {
                    Some((_, handlers)) => handlers.push(entry),
                    None => self.predicates.push((p, vec![entry])),
                }
            }
            Matcher::Default => self.defaults.push(entry),
            Matcher::Wildcard => self.wildcards.push(entry),
        }
    }

    fn remove(&mut self, matcher: &Matcher, id: u64) {
        let retain = |handlers: &mut Vec<Registered>| handlers.retain(|r| r.id != id);

        match matcher {
            Matcher::Exact(name) => {
                if let Some(handlers) = self.exact.get_mut(name) {
                    retain(handlers);
                    if handlers.is_empty() {
                        self.exact.remove(name);
                    }
                }
            }
            Matcher::Pattern(re) => {
                for (_, handlers) in self
                    .patterns
                    .iter_mut()
                    .filter(|(existing, _)| existing.as_str() == re.as_str())
                {
                    retain(handlers);
                }
                self.patterns.retain(|(_, handlers)| !handlers.is_empty());
            }
            Matcher::Predicate(p) => {
                for (_, handlers) in self
                    .predicates
                    .iter_mut()
                    .filter(|(existing, _)| Arc::ptr_eq(existing, p))
                {
                    retain(handlers);
                }
                self.predicates.retain(|(_, handlers)| !handlers.is_empty());
            }
            Matcher::Default => retain(&mut self.defaults),
            Matcher::Wildcard => retain(&mut self.wildcards),
        }
    }

    fn len(&self) -> usize {
        self.exact.values().map(Vec::len).sum::<usize>()
            + self.patterns.iter().map(|(_, h)| h.len()).sum::<usize>()
            + self.predicates.iter().map(|(_, h)| h.len()).sum::<usize>()
            + self.defaults.len()
            + self.wildcards.len()
    }
}

/// Copy of the registry taken at the start of one dispatch.
///
/// Pattern and predicate tests run against the snapshot, outside the lock,
/// so handlers and predicates may register or unregister freely.
pub(crate) struct Snapshot {
    pub(crate) exact: Vec<Registered>,
    pub(crate) patterns: Vec<(Regex, Vec<Registered>)>,
    pub(crate) predicates: Vec<(Predicate, Vec<Registered>)>,
    pub(crate) defaults: Vec<Registered>,
    pub(crate) wildcards: Vec<Registered>,
}

/// Registry mapping matchers to effect handlers.
pub struct MatcherRegistry {
    buckets: Arc<RwLock<Buckets>>,
    next_id: AtomicU64,
}

impl MatcherRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            buckets: Arc::new(RwLock::new(Buckets::default())),
            next_id: AtomicU64::new(1),
        }
    }

    /// Register a handler under a matcher.
    ///
    /// The returned handle removes exactly this (matcher, handler) pair.
    pub fn register<M, F>(&self, matcher: M, handler: F) -> Result<Unregister>
    where
        M: IntoMatcher,
        F: Fn(&mut DispatchContext<'_>) -> HandlerResult + Send + Sync + 'static,
    {
        self.register_shared(matcher, Arc::new(handler))
    }

    /// Register an already shared handler under a matcher.
    pub fn register_shared<M: IntoMatcher>(
        &self,
        matcher: M,
        handler: EffectHandler,
    ) -> Result<Unregister> {
        Ok(self.attach(matcher.into_matcher()?, handler))
    }

    /// Register every `(matcher, handler)` pair in input order.
    ///
    /// All matchers are validated before anything is registered, so a
    /// failure leaves the registry untouched.
    pub fn register_all<I, M, F>(&self, pairs: I) -> Result<Unregister>
    where
        I: IntoIterator<Item = (M, F)>,
        M: IntoMatcher,
        F: Fn(&mut DispatchContext<'_>) -> HandlerResult + Send + Sync + 'static,
    {
        let table = pairs
            .into_iter()
            .try_fold(HandlerTable::new(), |table, (matcher, handler)| {
                Ok::<_, PontError>(table.on(matcher.into_matcher()?, handler))
            })?;
        Ok(self.register_table(table))
    }

    /// Register an explicit matcher → handler table in table order.
    pub fn register_table(&self, table: HandlerTable) -> Unregister {
        let handles = table
            .entries
            .into_iter()
            .map(|(matcher, handler)| self.attach(matcher, handler))
            .collect();
        Unregister::group(handles)
    }

    fn attach(&self, matcher: Matcher, handler: EffectHandler) -> Unregister {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.buckets
            .write()
            .insert(matcher.clone(), Registered { id, handler });

        let buckets: Weak<RwLock<Buckets>> = Arc::downgrade(&self.buckets);
        Unregister::new(move || {
            if let Some(buckets) = buckets.upgrade() {
                buckets.write().remove(&matcher, id);
            }
        })
    }

    /// Total number of registered handlers.
    pub fn len(&self) -> usize {
        self.buckets.read().len()
    }

    /// Whether no handler is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn snapshot(&self, kind: &str) -> Snapshot {
        let buckets = self.buckets.read();
        Snapshot {
            exact: buckets.exact.get(kind).cloned().unwrap_or_default(),
            patterns: buckets.patterns.clone(),
            predicates: buckets.predicates.clone(),
            defaults: buckets.defaults.clone(),
            wildcards: buckets.wildcards.clone(),
        }
    }
}

impl Default for MatcherRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Explicit, ordered matcher → handler table for bulk registration.
///
/// # Example
///
/// ```ignore
/// let table = HandlerTable::new()
///     .on(Matcher::parse("toast")?, |ctx| { ctx.handled(); Ok(()) })
///     .on(Matcher::Wildcard, |_ctx| Ok(()));
/// registry.register_table(table);
/// ```
#[derive(Default)]
pub struct HandlerTable {
    entries: Vec<(Matcher, EffectHandler)>,
}

impl HandlerTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a handler for a matcher.
    pub fn on<F>(mut self, matcher: Matcher, handler: F) -> Self
    where
        F: Fn(&mut DispatchContext<'_>) -> HandlerResult + Send + Sync + 'static,
    {
        let handler: EffectHandler = Arc::new(handler);
        self.entries.push((matcher, handler));
        self
    }

    /// Append a validated name (`"default"`, `"*"` or an effect name).
    pub fn on_name<F>(self, name: &str, handler: F) -> Result<Self>
    where
        F: Fn(&mut DispatchContext<'_>) -> HandlerResult + Send + Sync + 'static,
    {
        Ok(self.on(Matcher::parse(name)?, handler))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
