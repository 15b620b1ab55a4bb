//! Platform runtime functions
//!
//! Thin wrappers over [`RuntimeClient::call`] for the functions the platform
//! exposes to services. They only shape parameters; errors and the response
//! handling are exactly those of `call`.
//!
//! | Wrapper | Wire call | Defaults |
//! |---|---|---|
//! | `put_file(fname)` | `put_file(req_id, fname, make_public)` | `make_public = true` |
//! | `get_file(key)` | `get_file(req_id, key)` | |
//! | `download_file(url, fname)` | `download_file(req_id, url, fname)` | `fname = null` |
//! | `run_command(cmd, stdin)` | `run_command(req_id, cmd, stdin)` | `stdin = ""` |
//! | `get_stackhut_user()` | `get_stackhut_user(req_id)` | |
//! | `get_service_author()` | `get_service_author(req_id)` | |
//! | `is_author()` | `is_author(req_id)` | |

use crate::RuntimeClient;
use hutshim_core::Result;
use serde_json::{json, Value};

impl RuntimeClient {
    /// Upload a file from the sandbox directory and make it public
    pub async fn put_file(&self, fname: &str) -> Result<Value> {
        self.put_file_with(fname, true).await
    }

    /// Upload a file from the sandbox directory
    pub async fn put_file_with(&self, fname: &str, make_public: bool) -> Result<Value> {
        self.call("put_file", vec![json!(fname), json!(make_public)])
            .await
    }

    /// Fetch a previously stored file by key
    pub async fn get_file(&self, key: &str) -> Result<Value> {
        self.call("get_file", vec![json!(key)]).await
    }

    /// Have the platform download `url` into the sandbox directory
    ///
    /// With `fname = None` the platform names the file after the last URL
    /// segment. Resolves with the platform's reply, normally the name the
    /// file was saved under.
    pub async fn download_file(&self, url: &str, fname: Option<&str>) -> Result<Value> {
        self.call("download_file", vec![json!(url), json!(fname)])
            .await
    }

    /// Run a command on the platform side, feeding it `stdin` (default `""`)
    pub async fn run_command(&self, cmd: &str, stdin: Option<&str>) -> Result<Value> {
        self.call("run_command", vec![json!(cmd), json!(stdin.unwrap_or(""))])
            .await
    }

    /// Username of the user who made the current request
    ///
    /// The platform answers `null` for anonymous requests.
    pub async fn get_stackhut_user(&self) -> Result<Value> {
        self.call("get_stackhut_user", vec![]).await
    }

    /// Username of the service's author, `null` if the platform has none
    pub async fn get_service_author(&self) -> Result<Value> {
        self.call("get_service_author", vec![]).await
    }

    /// Whether the requesting user is the service's author
    pub async fn is_author(&self) -> Result<Value> {
        self.call("is_author", vec![]).await
    }
}
