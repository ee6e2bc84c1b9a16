//! # dockdb
//!
//! Client runtime core for a desktop database-container manager.
//!
//! ## Components
//!
//! - **TTL cache** ([`cache::TtlCache`]): memoizes async fetches per key and
//!   serves stale data when a refresh fails
//! - **Polling manager** ([`polling::PollingManager`]): named recurring tasks
//!   gated by visibility and the active tab, auto-pausing after repeated failures
//! - **State store** ([`state::AppState`]): one observable state tree with
//!   path subscriptions, undo/redo history and persisted paths
//!
//! Around them sit the backend bridge and its typed services ([`backend`]),
//! durable key/value storage ([`storage`]), preference stores
//! ([`preferences`]) and [`runtime::ClientRuntime`], which builds one of
//! each from a [`config::RuntimeConfig`].
//!
//! ## Quick Start
//!
//! ```no_run
//! use dockdb::{ClientRuntime, Parser, SharedBackend};
//!
//! # async fn example(backend: SharedBackend) -> Result<(), dockdb::Error> {
//! let config = Parser::new().load_or_default(None)?;
//! let runtime = ClientRuntime::new(config, backend, None)?;
//! runtime.start();
//!
//! let _sub = runtime.state().subscribe("data.allContainers", |containers| {
//!     println!("{} containers", containers.as_array().map_or(0, |c| c.len()));
//! });
//! runtime.set_active_tab("images");
//! # runtime.shutdown();
//! # Ok(())
//! # }
//! ```
//!
//! ## Concurrency Model
//!
//! - Every shared component takes `&self` and is shared by `Arc` or a cheap clone
//! - No fetcher or polling callback is ever interrupted mid-flight; pausing,
//!   unregistering and invalidating only affect what happens next
//! - State listeners run synchronously, after the write, outside internal locks

pub mod backend;
pub mod cache;
pub mod config;
pub mod error;
pub mod polling;
pub mod preferences;
pub mod runtime;
pub mod state;
pub mod storage;

pub use backend::{Backend, SharedBackend};
pub use cache::TtlCache;
pub use config::{Parser, RuntimeConfig};
pub use error::{Error, Result};
pub use polling::{PollOptions, PollingManager};
pub use runtime::ClientRuntime;
pub use state::{AppState, StatePath, Subscription};
