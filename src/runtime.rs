//! Runtime builder and navigation pipeline.
//!
//! The [`RuntimeBuilder`] collects configuration, services and effect
//! handlers. The [`Runtime`] then drives every call the same way:
//! 1. Build a [`Request`] (URL resolved, GET data serialized into the query)
//! 2. Invoke `"transporter"` and await the raw response
//! 3. Invoke `"responseHandler"` to classify it
//! 4. Escalate unhandled responses through `"unhandledResponseHandler"`
//! 5. Apply the response to [`AppState`] via `"propsReconciler"`
//! 6. Dispatch the response's effects, failing fast
//!
//! # Example
//!
//! ```ignore
//! use pont_client::Runtime;
//!
//! #[tokio::main]
//! async fn main() -> pont_client::Result<()> {
//!     let runtime = Runtime::builder()
//!         .base_url("https://app.example/")
//!         .effect("flash", |ctx| {
//!             println!("flash: {:?}", ctx.props());
//!             ctx.handled();
//!             Ok(())
//!         })
//!         .build()?;
//!
//!     let state = runtime.visit("/dashboard").await?;
//!     println!("now on {:?}", state.page.map(|p| p.name));
//!     Ok(())
//! }
//! ```

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::watch;
use tracing::{debug, warn};
use url::Url;

use crate::codec::serialize_params;
use crate::config::RuntimeConfig;
use crate::context::RuntimeContext;
use crate::effect::{
    DispatchContext, DispatchReport, EffectDispatcher, HandlerResult, HandlerTable, IntoEffect,
    IntoMatcher,
};
use crate::error::{PontError, Result};
use crate::protocol::{
    unhandled_response, Method, Props, Request, Response, ResponseClassifier, VisitOptions,
    PROTOCOL_HEADER_VALUE,
};
use crate::registration::Unregister;
use crate::service::{
    ServiceInit, ServiceKey, ServiceRegistry, PARAMS_SERIALIZER, PROPS_RECONCILER,
    RESPONSE_HANDLER, TRANSPORTER, UNHANDLED_RESPONSE_HANDLER,
};
use crate::state::{reconcile_props, AppState};
use crate::transport::HttpTransporter;

type PendingService = Box<dyn FnOnce(&RuntimeContext, &ServiceRegistry) -> Result<()>>;

/// Builder for configuring and creating a [`Runtime`].
///
/// Registration errors (bad matcher, duplicate service) are kept and
/// reported by [`build`](Self::build), so the fluent chain never breaks.
pub struct RuntimeBuilder {
    config: RuntimeConfig,
    services: Vec<PendingService>,
    effects: EffectDispatcher,
    default_services: bool,
    error: Option<PontError>,
}

impl RuntimeBuilder {
    /// Create a new runtime builder with default configuration.
    pub fn new() -> Self {
        Self {
            config: RuntimeConfig::default(),
            services: Vec::new(),
            effects: EffectDispatcher::new(),
            default_services: true,
            error: None,
        }
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the base URL relative request URLs are joined onto.
    pub fn base_url(mut self, url: &str) -> Self {
        match Url::parse(url) {
            Ok(url) => self.config.base_url = Some(url),
            Err(e) => self.fail(e.into()),
        }
        self
    }

    /// Set the protocol marker header.
    ///
    /// Default: `x-pont`
    pub fn protocol_header(mut self, name: &str) -> Self {
        self.config.protocol_header = name.to_ascii_lowercase();
        self
    }

    /// Add a header sent with every request.
    pub fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.config
            .headers
            .insert(name.to_ascii_lowercase(), value.into());
        self
    }

    /// Set the request timeout used by the default transporter.
    ///
    /// Default: 30 seconds
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Register a service.
    ///
    /// Standard services registered here replace the defaults.
    pub fn service<I, O>(mut self, key: ServiceKey<I, O>, init: ServiceInit<I, O>) -> Self
    where
        I: 'static,
        O: 'static,
    {
        self.services.push(Box::new(move |ctx: &RuntimeContext, registry: &ServiceRegistry| {
            registry.register(ctx, key, init).map(|_| ())
        }));
        self
    }

    /// Register an effect handler.
    pub fn effect<M, F>(mut self, matcher: M, handler: F) -> Self
    where
        M: IntoMatcher,
        F: Fn(&mut DispatchContext<'_>) -> HandlerResult + Send + Sync + 'static,
    {
        if let Err(e) = self.effects.register(matcher, handler) {
            self.fail(e);
        }
        self
    }

    /// Register a table of effect handlers.
    pub fn effects(self, table: HandlerTable) -> Self {
        self.effects.register_table(table);
        self
    }

    /// Do not register default implementations of the standard services.
    pub fn without_default_services(mut self) -> Self {
        self.default_services = false;
        self
    }

    /// Build the runtime.
    ///
    /// Registers pending services, then a default for every standard
    /// service left unregistered.
    pub fn build(self) -> Result<Runtime> {
        if let Some(e) = self.error {
            return Err(e);
        }

        let ctx = RuntimeContext::new(self.config);
        let services = ServiceRegistry::new();

        for register in self.services {
            register(&ctx, &services)?;
        }

        if self.default_services {
            register_default_services(&ctx, &services)?;
        }

        debug!(services = ?services.names(), "Runtime built");

        let (state, _) = watch::channel(AppState::default());
        Ok(Runtime {
            inner: Arc::new(Inner {
                ctx,
                services,
                effects: self.effects,
                state,
            }),
        })
    }

    fn fail(&mut self, error: PontError) {
        self.error.get_or_insert(error);
    }
}

impl Default for RuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn register_default_services(ctx: &RuntimeContext, services: &ServiceRegistry) -> Result<()> {
    if !services.contains(TRANSPORTER.name()) {
        let transporter = HttpTransporter::new(ctx.config())?;
        services.register(ctx, TRANSPORTER, ServiceInit::instance(transporter))?;
    }
    if !services.contains(RESPONSE_HANDLER.name()) {
        services.register(ctx, RESPONSE_HANDLER, ServiceInit::object(ResponseClassifier))?;
    }
    if !services.contains(UNHANDLED_RESPONSE_HANDLER.name()) {
        services.register(
            ctx,
            UNHANDLED_RESPONSE_HANDLER,
            ServiceInit::function(unhandled_response),
        )?;
    }
    if !services.contains(PROPS_RECONCILER.name()) {
        services.register(ctx, PROPS_RECONCILER, ServiceInit::function(reconcile_props))?;
    }
    if !services.contains(PARAMS_SERIALIZER.name()) {
        services.register(
            ctx,
            PARAMS_SERIALIZER,
            ServiceInit::function(|_ctx, params: Value| serialize_params(&params)),
        )?;
    }
    Ok(())
}

struct Inner {
    ctx: RuntimeContext,
    services: ServiceRegistry,
    effects: EffectDispatcher,
    state: watch::Sender<AppState>,
}

/// A configured runtime.
///
/// Cheap to clone; clones share registries and state. Concurrent calls are
/// not serialized: the last response to settle wins.
#[derive(Clone)]
pub struct Runtime {
    inner: Arc<Inner>,
}

impl Runtime {
    /// Create a new runtime builder.
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// The context handed to services.
    pub fn context(&self) -> &RuntimeContext {
        &self.inner.ctx
    }

    /// The service registry.
    pub fn services(&self) -> &ServiceRegistry {
        &self.inner.services
    }

    /// The effect dispatcher.
    pub fn effects(&self) -> &EffectDispatcher {
        &self.inner.effects
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> AppState {
        self.inner.state.borrow().clone()
    }

    /// Receiver notified on every state change.
    pub fn subscribe(&self) -> watch::Receiver<AppState> {
        self.inner.state.subscribe()
    }

    /// Register a service after startup.
    pub fn register_service<I, O>(
        &self,
        key: ServiceKey<I, O>,
        init: ServiceInit<I, O>,
    ) -> Result<Unregister>
    where
        I: 'static,
        O: 'static,
    {
        self.inner
            .services
            .register_dynamic(&self.inner.ctx, key, init)
    }

    /// Invoke a service with this runtime's context.
    pub fn invoke<I, O>(&self, key: ServiceKey<I, O>, input: I) -> Result<O>
    where
        I: 'static,
        O: 'static,
    {
        self.inner.services.invoke(&self.inner.ctx, key, input)
    }

    /// Register an effect handler.
    pub fn register_effect<M, F>(&self, matcher: M, handler: F) -> Result<Unregister>
    where
        M: IntoMatcher,
        F: Fn(&mut DispatchContext<'_>) -> HandlerResult + Send + Sync + 'static,
    {
        self.inner.effects.register(matcher, handler)
    }

    /// Register many effect handlers in order.
    pub fn register_effects<I, M, F>(&self, pairs: I) -> Result<Unregister>
    where
        I: IntoIterator<Item = (M, F)>,
        M: IntoMatcher,
        F: Fn(&mut DispatchContext<'_>) -> HandlerResult + Send + Sync + 'static,
    {
        self.inner.effects.register_all(pairs)
    }

    /// Register a table of effect handlers.
    pub fn register_effect_table(&self, table: HandlerTable) -> Unregister {
        self.inner.effects.register_table(table)
    }

    /// Dispatch one effect.
    pub fn dispatch_effect<E: IntoEffect>(&self, effect: E) -> Result<DispatchReport> {
        self.inner.effects.dispatch(effect)
    }

    /// Dispatch effects in order, stopping at the first failure.
    pub fn dispatch_effects<I>(&self, effects: I) -> Result<Vec<DispatchReport>>
    where
        I: IntoIterator,
        I::Item: IntoEffect,
    {
        self.inner.effects.dispatch_all(effects)
    }

    /// Navigate to `url` with a GET request.
    pub async fn visit(&self, url: &str) -> Result<AppState> {
        self.visit_with(VisitOptions::get(url)).await
    }

    /// Navigate with explicit request options.
    ///
    /// Accepts `visit`, `partial` and `empty` responses; a `data` response
    /// fails with `ResponseTypeMismatch` before any state change.
    pub async fn visit_with(&self, options: VisitOptions) -> Result<AppState> {
        let (response, url) = self.fetch(options).await?;

        if !response.is_navigation() {
            return Err(PontError::ResponseTypeMismatch {
                expected: "visit",
                actual: response.kind(),
            });
        }

        let effects = response.effects().to_vec();
        match response {
            Response::Visit(visit) => {
                let mut state = self.state();
                state.apply_visit(visit, url, |base, update| self.reconcile(base, update))?;
                self.inner.state.send_replace(state);
            }
            Response::Partial(partial) => {
                let mut state = self.state();
                state.apply_partial(partial, |base, update| self.reconcile(base, update))?;
                self.inner.state.send_replace(state);
            }
            _ => {}
        }

        self.dispatch_effects(effects)?;
        Ok(self.state())
    }

    /// Visit the current URL again.
    ///
    /// Fails with `Config` before the first visit.
    pub async fn reload(&self) -> Result<AppState> {
        let url = self
            .inner
            .state
            .borrow()
            .url
            .clone()
            .ok_or_else(|| PontError::Config("nothing to reload before the first visit".into()))?;
        self.visit(&url).await
    }

    /// Fetch data from `url` with a GET request.
    pub async fn data(&self, url: &str) -> Result<Value> {
        self.data_with(VisitOptions::get(url)).await
    }

    /// Fetch data with explicit request options.
    ///
    /// Returns `null` for an `empty` response; `visit` and `partial`
    /// responses fail with `ResponseTypeMismatch`.
    pub async fn data_with(&self, options: VisitOptions) -> Result<Value> {
        let (response, _) = self.fetch(options).await?;

        let (data, effects) = match response {
            Response::Data(data) => (data.data, data.effects),
            Response::Empty(empty) => (Value::Null, empty.effects),
            other => {
                return Err(PontError::ResponseTypeMismatch {
                    expected: "data",
                    actual: other.kind(),
                })
            }
        };

        self.dispatch_effects(effects)?;
        Ok(data)
    }

    /// Fetch data and deserialize it into `T`.
    pub async fn data_as<T: DeserializeOwned>(&self, options: impl Into<VisitOptions>) -> Result<T> {
        let value = self.data_with(options.into()).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Run the request through transporter and classification.
    async fn fetch(&self, options: VisitOptions) -> Result<(Response, String)> {
        let request = self.prepare(options)?;
        let url = request.url.clone();
        debug!(method = %request.method, url = %url, "Sending request");

        let raw = self.invoke(TRANSPORTER, request)?.await?;
        match self.invoke(RESPONSE_HANDLER, raw)? {
            Response::Unhandled(raw) => {
                warn!(status = raw.status, url = %url, "Escalating unhandled response");
                Err(self.invoke(UNHANDLED_RESPONSE_HANDLER, raw)?)
            }
            response => Ok((response, url)),
        }
    }

    fn prepare(&self, options: VisitOptions) -> Result<Request> {
        let config = self.inner.ctx.config();
        let mut url = config.resolve_url(&options.url)?;
        let mut data = options.data;

        if options.method == Method::Get {
            if let Some(params) = data.take() {
                let query = self.invoke(PARAMS_SERIALIZER, params)?;
                if !query.is_empty() {
                    let query = match url.query() {
                        Some(existing) if !existing.is_empty() => format!("{existing}&{query}"),
                        _ => query,
                    };
                    url.set_query(Some(&query));
                }
            }
        }

        let mut headers = config.headers.clone();
        headers.insert("accept".to_string(), "application/json".to_string());
        headers.extend(options.headers);
        headers.insert(
            config.protocol_header.clone(),
            PROTOCOL_HEADER_VALUE.to_string(),
        );

        Ok(Request {
            method: options.method,
            url: url.into(),
            data,
            headers,
        })
    }

    fn reconcile(&self, base: Props, partial: Props) -> Result<Props> {
        self.invoke(PROPS_RECONCILER, (base, partial))
    }
}

impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("config", self.inner.ctx.config())
            .field("services", &self.inner.services.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::RawResponse;
    use crate::service::STANDARD_SERVICES;
    use crate::transport::transport_future;
    use serde_json::json;
    use std::sync::Mutex;

    fn recording_transporter(
        seen: Arc<Mutex<Vec<Request>>>,
        body: Value,
    ) -> ServiceInit<Request, crate::transport::TransportFuture> {
        ServiceInit::function(move |_ctx, request: Request| {
            seen.lock().unwrap().push(request);
            let raw = RawResponse::new(200, [("x-pont", "true")], body.to_string());
            transport_future(async move { Ok(raw) })
        })
    }

    #[test]
    fn test_defaults_registered() {
        let runtime = Runtime::builder().build().unwrap();
        for name in STANDARD_SERVICES {
            assert!(runtime.services().contains(name), "{name} missing");
        }
    }

    #[test]
    fn test_without_defaults() {
        let runtime = Runtime::builder().without_default_services().build().unwrap();
        assert!(runtime.services().names().is_empty());
    }

    #[test]
    fn test_builder_reports_first_error() {
        let err = Runtime::builder()
            .effect("", |_ctx| Ok(()))
            .base_url("not a url")
            .build()
            .unwrap_err();
        assert!(matches!(err, PontError::InvalidMatcher { .. }));
    }

    #[test]
    fn test_builder_duplicate_service() {
        let err = Runtime::builder()
            .service(PARAMS_SERIALIZER, ServiceInit::function(|_ctx, _p: Value| String::new()))
            .service(PARAMS_SERIALIZER, ServiceInit::function(|_ctx, _p: Value| String::new()))
            .build()
            .unwrap_err();
        assert!(matches!(err, PontError::DuplicateService { .. }));
    }

    #[tokio::test]
    async fn test_prepare_get_serializes_query_and_headers() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let runtime = Runtime::builder()
            .base_url("https://app.test/")
            .header("X-Tenant", "acme")
            .service(TRANSPORTER, recording_transporter(seen.clone(), json!({"type": "empty"})))
            .build()
            .unwrap();

        runtime
            .visit_with(VisitOptions::get("/users?sort=name").data(json!({"page": 2})))
            .await
            .unwrap();

        let request = seen.lock().unwrap().pop().unwrap();
        assert_eq!(request.url, "https://app.test/users?sort=name&page=2");
        assert_eq!(request.data, None);
        assert_eq!(request.header("x-pont"), Some("true"));
        assert_eq!(request.header("accept"), Some("application/json"));
        assert_eq!(request.header("x-tenant"), Some("acme"));
    }

    #[tokio::test]
    async fn test_prepare_post_keeps_json_body() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let runtime = Runtime::builder()
            .base_url("https://app.test/")
            .service(TRANSPORTER, recording_transporter(seen.clone(), json!({"type": "data", "data": 1})))
            .build()
            .unwrap();

        let value = runtime
            .data_with(VisitOptions::post("/api/items").data(json!({"name": "x"})))
            .await
            .unwrap();

        assert_eq!(value, json!(1));
        let request = seen.lock().unwrap().pop().unwrap();
        assert_eq!(request.method, Method::Post);
        assert_eq!(request.url, "https://app.test/api/items");
        assert_eq!(request.data, Some(json!({"name": "x"})));
    }

    #[tokio::test]
    async fn test_reload_before_visit() {
        let runtime = Runtime::builder().build().unwrap();
        assert!(matches!(runtime.reload().await, Err(PontError::Config(_))));
    }

    #[tokio::test]
    async fn test_relative_url_without_base() {
        let runtime = Runtime::builder().build().unwrap();
        assert!(matches!(runtime.visit("/home").await, Err(PontError::Config(_))));
    }
}
