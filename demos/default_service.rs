//! Default service example
//!
//! Serves `Default.add`, `Default.greet` and `Default.whoami` from
//! `req.json`/`resp.json` in the current directory.
//!
//! Run with: cargo run --example default_service
//!
//! Then, from the same directory:
//!
//! ```text
//! mkdir -p .stackhut/abc
//! echo '{"req_id":"abc","method":"Default.add","params":[2,3]}' > req.json
//! ```
//!
//! Set `HUTSHIM_RUN_MODE=single` to serve one request and exit.

use async_trait::async_trait;
use hutshim::core::{MethodError, ObservabilityConfig, ServiceError};
use hutshim::{method, Context, Interface, Lifecycle, Shim};
use std::sync::atomic::{AtomicU64, Ordering};

#[method]
async fn add(x: i64, y: i64) -> Result<i64, ServiceError> {
    tracing::info!(x, y, "adding numbers");
    x.checked_add(y)
        .ok_or_else(|| ServiceError::new("integer overflow"))
}

#[method]
async fn greet(name: String) -> Result<String, ServiceError> {
    if name.trim().is_empty() {
        return Err(ServiceError::with_data(
            "name must not be empty",
            serde_json::json!({"field": "name"}),
        ));
    }
    Ok(format!("Hello, {}!", name))
}

#[method]
async fn whoami(ctx: Context) -> Result<serde_json::Value, MethodError> {
    if !hutshim::client::in_container() {
        return Ok(serde_json::json!(format!("local request {}", ctx.req_id())));
    }
    Ok(ctx.client().get_stackhut_user().await?)
}

#[derive(Default)]
struct Counter {
    served: AtomicU64,
}

#[async_trait]
impl Lifecycle for Counter {
    async fn pre_batch(&self) -> Result<(), MethodError> {
        tracing::info!("batch starting");
        Ok(())
    }

    async fn post_request(&self, ctx: &Context) -> Result<(), MethodError> {
        let served = self.served.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::info!(req_id = ctx.req_id(), served, "request finished");
        Ok(())
    }

    async fn shutdown(&self) -> Result<(), MethodError> {
        tracing::info!(served = self.served.load(Ordering::Relaxed), "shutting down");
        Ok(())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let otel_config = ObservabilityConfig::new("hutshim-default-service").with_log_level("info");

    let shim = Shim::builder()
        .root_dir(std::env::current_dir()?)
        .interface(
            Interface::new("Default")
                .method("add", add())
                .method("greet", greet())
                .method("whoami", whoami())
                .hooks(Counter::default()),
        )
        .with_observability(otel_config)
        .with_metrics()
        .build()?;

    let summary = shim.run().await?;
    tracing::info!(served = summary.served, end = ?summary.end, "service stopped");

    hutshim::core::shutdown_observability();
    // A pending read on a named request file would otherwise hold the runtime open
    std::process::exit(0);
}
