//! Call session state
//!
//! A [`Session`] holds the process-wide state shared by the runner and the
//! runtime client:
//!
//! - `root_dir`: the directory the process started in, fixed for its lifetime
//! - `req_id`: the request currently being served, set by the runner at the
//!   start of each request and read by every outbound call
//! - `id_val`: the JSON-RPC id of the next outbound call, bumped after every
//!   completed call and never reset
//!
//! # Request Lifecycle
//!
//! 1. **Begin**: runner calls `begin_request(req_id)` after parsing a request
//! 2. **Call**: service code makes outbound calls; each reads `req_id` and
//!    takes the id lock for the duration of the HTTP exchange
//! 3. **End**: runner calls `end_request()` once the response is known
//!
//! `id_val` survives across requests in a persistent run.

use hutshim_core::{Error, Result};
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::{Mutex, MutexGuard};

/// Shared session state, cheap to clone
#[derive(Clone, Debug)]
pub struct Session {
    inner: Arc<SessionInner>,
}

#[derive(Debug)]
struct SessionInner {
    root_dir: PathBuf,
    req_id: RwLock<Option<String>>,
    /// Held for the whole outbound exchange, so at most one call is in flight
    id_val: Mutex<u64>,
}

impl Session {
    /// Create a session rooted at `root_dir`
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                root_dir: root_dir.into(),
                req_id: RwLock::new(None),
                id_val: Mutex::new(0),
            }),
        }
    }

    /// Create a session rooted at the process's current directory
    pub fn from_current_dir() -> Result<Self> {
        let root = std::env::current_dir()
            .map_err(|e| Error::Io(format!("cannot determine working directory: {}", e)))?;
        Ok(Self::new(root))
    }

    /// Directory the process started in
    pub fn root_dir(&self) -> &Path {
        &self.inner.root_dir
    }

    /// Make `req_id` the active request
    pub fn begin_request(&self, req_id: impl Into<String>) {
        let mut guard = self
            .inner
            .req_id
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *guard = Some(req_id.into());
    }

    /// Clear the active request
    pub fn end_request(&self) {
        let mut guard = self
            .inner
            .req_id
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *guard = None;
    }

    /// The active request id, if a request is being served
    pub fn req_id(&self) -> Option<String> {
        self.inner
            .req_id
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The id the next outbound call will use
    ///
    /// Waits for any in-flight call to complete first.
    pub async fn id_val(&self) -> u64 {
        *self.inner.id_val.lock().await
    }

    /// Lock the id counter for one outbound exchange
    pub(crate) async fn lock_id(&self) -> MutexGuard<'_, u64> {
        self.inner.id_val.lock().await
    }
}

const CONTAINER_WORKDIR: &str = "/workdir";

/// Whether the process runs inside the platform's container
///
/// The platform mounts the service at `/workdir`.
pub fn in_container() -> bool {
    workdir_mounted(Path::new(CONTAINER_WORKDIR))
}

fn workdir_mounted(workdir: &Path) -> bool {
    workdir.exists()
}
