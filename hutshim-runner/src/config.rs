//! Request loop configuration
//!
//! # Defaults
//!
//! - Root directory: the process's working directory at start
//! - Request file: `req.json`, response file: `resp.json`
//! - Sandbox root: `.stackhut`, so request `abc` runs in `<root>/.stackhut/abc`
//! - Runtime endpoint: `http://localhost:4000/jsonrpc`
//! - Run mode: persistent, no request limit
//!
//! # Environment Variables
//!
//! - `HUTSHIM_RUNTIME_URL`: runtime endpoint
//! - `HUTSHIM_RUN_MODE`: `single` or `persistent`

use hutshim_client::DEFAULT_RUNTIME_URL;
use hutshim_core::{Error, Result};
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;

/// Env var overriding the runtime endpoint
pub const ENV_RUNTIME_URL: &str = "HUTSHIM_RUNTIME_URL";
/// Env var selecting the run mode
pub const ENV_RUN_MODE: &str = "HUTSHIM_RUN_MODE";

/// Whether the process serves one request or keeps looping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunMode {
    /// Serve one request, then run the batch-end hooks and return
    SingleShot,
    /// Serve requests until end of input, a signal, a fault or the
    /// configured limit
    #[default]
    Persistent,
}

impl FromStr for RunMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "single" | "single-shot" | "singleshot" | "once" => Ok(RunMode::SingleShot),
            "persistent" | "loop" => Ok(RunMode::Persistent),
            other => Err(Error::Config(format!(
                "unknown run mode '{}', expected 'single' or 'persistent'",
                other
            ))),
        }
    }
}

/// Configuration for one run of the request loop
#[derive(Debug, Clone, PartialEq)]
pub struct ShimConfig {
    /// Directory holding the request/response files and the sandbox root
    pub root_dir: PathBuf,
    /// Request file name, relative to `root_dir`
    pub request_file: PathBuf,
    /// Response file name, relative to `root_dir`
    pub response_file: PathBuf,
    /// Sandbox root, relative to `root_dir`
    pub sandbox_root: PathBuf,
    /// Platform runtime endpoint for outbound calls
    pub runtime_url: String,
    /// Single-shot or persistent loop
    pub run_mode: RunMode,
    /// Stop the persistent loop after this many requests
    pub max_requests: Option<u64>,
    /// End the loop on SIGTERM / Ctrl-C while waiting for a request
    pub handle_signals: bool,
}

impl ShimConfig {
    /// Defaults rooted at `root_dir`, ignoring the environment
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
            request_file: PathBuf::from("req.json"),
            response_file: PathBuf::from("resp.json"),
            sandbox_root: PathBuf::from(".stackhut"),
            runtime_url: DEFAULT_RUNTIME_URL.to_string(),
            run_mode: RunMode::default(),
            max_requests: None,
            handle_signals: true,
        }
    }

    /// Defaults rooted at the current directory, with env overrides applied
    pub fn from_env() -> Result<Self> {
        let root = std::env::current_dir()
            .map_err(|e| Error::Io(format!("cannot determine working directory: {}", e)))?;
        Self::new(root).with_env_lookup(|key| std::env::var(key).ok())
    }

    /// Apply overrides read through `lookup`
    pub fn with_env_lookup<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_RUNTIME_URL).filter(|v| !v.trim().is_empty()) {
            self.runtime_url = url;
        }
        if let Some(mode) = lookup(ENV_RUN_MODE).filter(|v| !v.trim().is_empty()) {
            self.run_mode = mode.parse()?;
        }
        Ok(self)
    }

    /// Absolute path of the request file
    pub fn request_path(&self) -> PathBuf {
        self.root_dir.join(&self.request_file)
    }

    /// Absolute path of the response file
    pub fn response_path(&self) -> PathBuf {
        self.root_dir.join(&self.response_file)
    }

    /// Sandbox directory for `req_id`
    ///
    /// # Errors
    ///
    /// `Error::InvalidRequest` unless `req_id` is a single plain path
    /// component, so a request can never run outside the sandbox root.
    pub fn sandbox_dir(&self, req_id: &str) -> Result<PathBuf> {
        let mut components = Path::new(req_id).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => {
                Ok(self.root_dir.join(&self.sandbox_root).join(req_id))
            }
            _ => Err(Error::InvalidRequest(format!(
                "req_id '{}' is not a valid sandbox name",
                req_id
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = ShimConfig::new("/srv/service");

        assert_eq!(config.request_path(), PathBuf::from("/srv/service/req.json"));
        assert_eq!(config.response_path(), PathBuf::from("/srv/service/resp.json"));
        assert_eq!(config.runtime_url, "http://localhost:4000/jsonrpc");
        assert_eq!(config.run_mode, RunMode::Persistent);
        assert_eq!(config.max_requests, None);
        assert!(config.handle_signals);
    }

    #[test]
    fn test_sandbox_dir() {
        let config = ShimConfig::new("/srv/service");

        assert_eq!(
            config.sandbox_dir("abc").unwrap(),
            PathBuf::from("/srv/service/.stackhut/abc")
        );
        assert!(config.sandbox_dir("").is_err());
        assert!(config.sandbox_dir("..").is_err());
        assert!(config.sandbox_dir("../etc").is_err());
        assert!(config.sandbox_dir("a/b").is_err());
        assert!(config.sandbox_dir("/abs").is_err());
    }

    #[test]
    fn test_run_mode_parse() {
        assert_eq!("single".parse::<RunMode>().unwrap(), RunMode::SingleShot);
        assert_eq!("Persistent".parse::<RunMode>().unwrap(), RunMode::Persistent);
        assert!(matches!("forever".parse::<RunMode>(), Err(Error::Config(_))));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            (ENV_RUNTIME_URL, "http://127.0.0.1:9999/jsonrpc"),
            (ENV_RUN_MODE, "single"),
        ]
        .into_iter()
        .collect();

        let config = ShimConfig::new("/srv/service")
            .with_env_lookup(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.runtime_url, "http://127.0.0.1:9999/jsonrpc");
        assert_eq!(config.run_mode, RunMode::SingleShot);
    }

    #[test]
    fn test_invalid_env_run_mode() {
        let result = ShimConfig::new("/srv/service").with_env_lookup(|key| {
            (key == ENV_RUN_MODE).then(|| "sometimes".to_string())
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_blank_env_ignored() {
        let config = ShimConfig::new("/srv/service")
            .with_env_lookup(|_| Some("  ".to_string()))
            .unwrap();
        assert_eq!(config, ShimConfig::new("/srv/service"));
    }
}
