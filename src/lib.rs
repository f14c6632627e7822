//! # pont-client
//!
//! Client runtime for server-driven page navigation.
//!
//! The server renders pages and layouts by name and answers with JSON
//! payloads; this crate fetches them, keeps application state and routes
//! the effects a response declares to client-registered handlers.
//!
//! ## Architecture
//!
//! - **Services** ([`service`]): named extension points (transport, response
//!   classification, prop reconciliation, query serialization) registered in
//!   one of four shapes and invoked uniformly
//! - **Effects** ([`effect`]): matcher-based dispatch of server effects with
//!   per-effect shared state
//! - **Pipeline** ([`Runtime`]): request → transporter → classification →
//!   state update → effect dispatch
//!
//! ## Example
//!
//! ```ignore
//! use pont_client::Runtime;
//!
//! #[tokio::main]
//! async fn main() -> pont_client::Result<()> {
//!     let runtime = Runtime::builder()
//!         .base_url("https://app.example/")
//!         .effect("*", |_ctx| Ok(()))
//!         .build()?;
//!
//!     let mut updates = runtime.subscribe();
//!     runtime.visit("/").await?;
//!     updates.changed().await.ok();
//!     Ok(())
//! }
//! ```

pub mod codec;
pub mod config;
pub mod effect;
pub mod error;
pub mod protocol;
pub mod service;
pub mod state;
pub mod transport;

mod context;
mod registration;
mod runtime;

pub use config::RuntimeConfig;
pub use context::RuntimeContext;
pub use effect::{DispatchContext, DispatchReport, Effect, Matcher};
pub use error::{PontError, Result};
pub use protocol::{Method, VisitOptions};
pub use registration::Unregister;
pub use runtime::{Runtime, RuntimeBuilder};
pub use state::AppState;
