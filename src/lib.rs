//! hutshim - runtime shim for file-driven services
//!
//! This is the convenience crate that re-exports the hutshim sub-crates.
//! Depend on it when a service wants the loop, the runtime client and the
//! method macro from a single place.
//!
//! # Architecture
//!
//! - **hutshim-core**: request/response types, codec, error mapping, observability
//! - **hutshim-client**: JSON-RPC client for the platform runtime endpoint
//! - **hutshim-runner**: request loop, dispatcher and lifecycle hooks
//! - **hutshim-macros**: `#[method]` for defining service methods
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use hutshim::{method, Interface, Shim};
//! use hutshim::core::ServiceError;
//!
//! #[method]
//! async fn add(x: i64, y: i64) -> Result<i64, ServiceError> {
//!     Ok(x + y)
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let shim = Shim::builder()
//!         .interface(Interface::new("Default").method("add", add()))
//!         .build()?;
//!
//!     shim.run().await?;
//!     Ok(())
//! }
//! ```
//!
//! Generated method code refers to `hutshim_runner` by name, so services
//! using `#[method]` also list `hutshim-runner` as a dependency.

pub use hutshim_client as client;
pub use hutshim_core as core;
pub use hutshim_macros as macros;
pub use hutshim_runner as runner;

pub use hutshim_client::RuntimeClient;
pub use hutshim_macros::method;
pub use hutshim_runner::{Context, Interface, Lifecycle, Shim};
