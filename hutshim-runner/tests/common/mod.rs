//! Common test utilities for hutshim-runner integration tests
//!
//! `Shim::run` changes the process working directory, so every test that runs
//! the loop goes through [`run_blocking`], which serializes them on a global
//! lock and drives the loop on its own runtime.

#![allow(dead_code)]

use async_trait::async_trait;
use hutshim_core::{codec, MethodError, ShimRequest, ShimResponse};
use hutshim_runner::{Context, Hook, Lifecycle, RunSummary, Shim, ShimBuilder, ShimConfig};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tempfile::TempDir;

static CWD_LOCK: Mutex<()> = Mutex::new(());

/// A service root with request/response files and a sandbox root
pub struct ServiceRoot {
    pub dir: TempDir,
}

impl ServiceRoot {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::create_dir(dir.path().join(".stackhut")).expect("sandbox root");
        Self { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Create the sandbox directory for `req_id`
    pub fn sandbox(&self, req_id: &str) -> PathBuf {
        let path = self.path().join(".stackhut").join(req_id);
        std::fs::create_dir_all(&path).expect("sandbox");
        path
    }

    pub fn write_request(&self, req_id: &str, method: &str, params: Vec<Value>) {
        let request = ShimRequest::new(req_id, method, params);
        let body = serde_json::to_string(&request).expect("encode request");
        self.write_raw_request(&body);
    }

    pub fn write_raw_request(&self, body: &str) {
        std::fs::write(self.path().join("req.json"), body).expect("write request");
    }

    pub fn response_exists(&self) -> bool {
        self.path().join("resp.json").exists()
    }

    pub fn read_response(&self) -> ShimResponse {
        let text = std::fs::read_to_string(self.path().join("resp.json")).expect("read response");
        codec::decode_response(&text).expect("decode response")
    }

    pub fn read_response_json(&self) -> Value {
        let text = std::fs::read_to_string(self.path().join("resp.json")).expect("read response");
        serde_json::from_str(&text).expect("response json")
    }

    /// Builder rooted here with signals off
    pub fn builder(&self) -> ShimBuilder {
        Shim::builder()
            .config(ShimConfig::new(self.path()))
            .handle_signals(false)
    }
}

/// Run the loop to completion with the working directory lock held
///
/// Restores the original working directory afterwards. The runtime is shut
/// down without waiting for blocking reads, which stay parked on a request
/// pipe nobody writes to after a signal.
pub fn run_blocking(shim: &Shim) -> hutshim_core::Result<RunSummary> {
    let _guard = CWD_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
    let original = std::env::current_dir().expect("cwd");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .expect("runtime");
    let result = runtime.block_on(shim.run());
    runtime.shutdown_timeout(Duration::from_millis(200));

    std::env::set_current_dir(original).expect("restore cwd");
    result
}

/// Send SIGTERM to this test process
///
/// Only safe once a run with signal handling on has installed its listener.
#[cfg(unix)]
pub fn terminate_self() {
    let status = std::process::Command::new("kill")
        .args(["-TERM", &std::process::id().to_string()])
        .status()
        .expect("kill");
    assert!(status.success());
}

/// Turn the request file into a named pipe with no writer
#[cfg(unix)]
pub fn make_request_fifo(root: &ServiceRoot) -> bool {
    let path = root.path().join("req.json");
    let _ = std::fs::remove_file(&path);
    std::process::Command::new("mkfifo")
        .arg(&path)
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

/// Run `f` with the working directory lock held
pub fn with_cwd_lock<T>(f: impl FnOnce() -> T) -> T {
    let _guard = CWD_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
    f()
}

/// Shared event log for hook ordering assertions
#[derive(Clone, Default)]
pub struct Events(Arc<Mutex<Vec<String>>>);

impl Events {
    pub fn push(&self, event: impl Into<String>) {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.into());
    }

    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.0.lock().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn count(&self, event: &str) -> usize {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|e| e.as_str() == event)
            .count()
    }
}

/// Hooks that record every call as `<name>.<hook>` and can be told to fail
pub struct Recorder {
    pub name: &'static str,
    pub events: Events,
    pub fail_on: Option<Hook>,
}

impl Recorder {
    pub fn new(name: &'static str, events: &Events) -> Self {
        Self {
            name,
            events: events.clone(),
            fail_on: None,
        }
    }

    pub fn failing(mut self, hook: Hook) -> Self {
        self.fail_on = Some(hook);
        self
    }

    fn record(&self, hook: Hook) -> Result<(), MethodError> {
        self.events.push(format!("{}.{}", self.name, hook));
        if self.fail_on == Some(hook) {
            return Err(MethodError::fault(format!("{} refused", hook)));
        }
        Ok(())
    }
}

#[async_trait]
impl Lifecycle for Recorder {
    async fn pre_request(&self, _ctx: &Context) -> Result<(), MethodError> {
        self.record(Hook::PreRequest)
    }

    async fn post_request(&self, _ctx: &Context) -> Result<(), MethodError> {
        self.record(Hook::PostRequest)
    }

    async fn pre_batch(&self) -> Result<(), MethodError> {
        self.record(Hook::PreBatch)
    }

    async fn post_batch(&self) -> Result<(), MethodError> {
        self.record(Hook::PostBatch)
    }

    async fn shutdown(&self) -> Result<(), MethodError> {
        self.record(Hook::Shutdown)
    }
}
