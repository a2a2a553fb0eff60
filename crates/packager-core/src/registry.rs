//! Registration of local packages with the host project's package manager
//!
//! The host project's manifest (`composer.json`) lists each local package as
//! a `path` repository. [`DependencyRegistry`] abstracts the operations the
//! package manager needs; [`ComposerRegistry`] runs them through the
//! `composer` executable.

use crate::config::PackagerConfig;
use crate::error::{PackagerError, Result};
use crate::path;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command as TokioCommand;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Whether a package is installed and which installed packages require it
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallStatus {
    pub installed: bool,
    pub required_by: Vec<String>,
}

/// Package-manager operations used by the package manager
///
/// Subprocess failures (non-zero exit, timeouts) are reported as `Ok(false)`;
/// `Err` is reserved for failures to run anything at all.
#[allow(async_fn_in_trait)]
pub trait DependencyRegistry {
    /// Add `package_path` as the path repository of `name`
    async fn register(&self, name: &str, package_path: &Path) -> Result<bool>;

    async fn unregister(&self, name: &str) -> Result<bool>;

    async fn install(&self, name: &str) -> Result<bool>;

    async fn uninstall(&self, name: &str) -> Result<bool>;

    /// Whether `name` is registered with `package_path` as its repository
    fn is_registered(&self, name: &str, package_path: &Path) -> Result<bool>;

    fn install_status(&self, name: &str) -> Result<InstallStatus>;
}

/// Limits applied to one subprocess
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessLimits {
    /// Maximum total runtime
    pub timeout: Option<Duration>,
    /// Maximum time without any output
    pub idle_timeout: Option<Duration>,
}

impl ProcessLimits {
    pub fn unbounded() -> Self {
        Self::default()
    }
}

enum Outcome {
    Exited(ExitStatus),
    WaitFailed(std::io::Error),
    TimedOut,
    Idle,
}

#[derive(Debug, Clone, Copy)]
enum Stream {
    Stdout,
    Stderr,
}

impl Stream {
    fn name(self) -> &'static str {
        match self {
            Stream::Stdout => "stdout",
            Stream::Stderr => "stderr",
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct Manifest {
    #[serde(default)]
    repositories: Repositories,
}

/// `repositories` may be a list or a name-keyed object
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Repositories {
    Keyed(BTreeMap<String, Value>),
    Listed(Vec<Value>),
}

impl Default for Repositories {
    fn default() -> Self {
        Repositories::Listed(Vec::new())
    }
}

#[derive(Debug, Default, Deserialize)]
struct LockFile {
    #[serde(default)]
    packages: Vec<LockedPackage>,
    #[serde(default, rename = "packages-dev")]
    packages_dev: Vec<LockedPackage>,
}

#[derive(Debug, Deserialize)]
struct LockedPackage {
    name: String,
    #[serde(default)]
    require: BTreeMap<String, Value>,
    #[serde(default, rename = "require-dev")]
    require_dev: BTreeMap<String, Value>,
}

/// [`DependencyRegistry`] backed by the `composer` executable
#[derive(Debug, Clone)]
pub struct ComposerRegistry {
    base_path: PathBuf,
    program: String,
    config_limits: ProcessLimits,
    install_limits: ProcessLimits,
}

impl ComposerRegistry {
    /// Registry for the host project at `base_path`
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            program: "composer".to_string(),
            config_limits: ProcessLimits {
                timeout: Some(Duration::from_secs(60)),
                idle_timeout: Some(Duration::from_secs(60)),
            },
            install_limits: ProcessLimits::unbounded(),
        }
    }

    pub fn from_config(base_path: impl Into<PathBuf>, config: &PackagerConfig) -> Self {
        let mut registry = Self::new(base_path);
        registry.config_limits = ProcessLimits {
            timeout: config.process_timeout_secs.map(Duration::from_secs),
            idle_timeout: config.process_idle_timeout_secs.map(Duration::from_secs),
        };
        registry
    }

    /// Use another executable in place of `composer`
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Repository URL of a package: its path relative to the base path
    pub fn repository_url(&self, package_path: &Path) -> Result<String> {
        path::relative(
            &self.base_path.to_string_lossy(),
            &package_path.to_string_lossy(),
            '/',
        )
    }

    fn read_json<T: serde::de::DeserializeOwned + Default>(&self, file: &str) -> Result<T> {
        let file = self.base_path.join(file);
        if !file.is_file() {
            return Ok(T::default());
        }
        let content = std::fs::read_to_string(&file).map_err(|e| PackagerError::io(&file, e))?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Run the program with `args` in the base path, streaming its output to the log
    async fn run(&self, args: &[&str], limits: ProcessLimits) -> Result<bool> {
        let command_line = format!("{} {}", self.program, args.join(" "));
        debug!(command = %command_line, "running");

        let mut child = TokioCommand::new(&self.program)
            .args(args)
            .current_dir(&self.base_path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| PackagerError::io(&self.base_path, e))?;

        let (Some(stdout), Some(stderr)) = (child.stdout.take(), child.stderr.take()) else {
            return Err(PackagerError::io(
                &self.base_path,
                std::io::Error::other("failed to capture process output"),
            ));
        };

        let mut stdout_reader = BufReader::new(stdout);
        let mut stderr_reader = BufReader::new(stderr);
        let mut stdout_line = Vec::new();
        let mut stderr_line = Vec::new();

        // Drain both streams until they close, then reap the child. Lines are
        // decoded lossily so undecodable output never stops the draining.
        let supervised = async {
            let mut stdout_open = true;
            let mut stderr_open = true;

            while stdout_open || stderr_open {
                let (read_stdout, read_stderr) = (stdout_open, stderr_open);
                let next_read = async {
                    tokio::select! {
                        read = stdout_reader.read_until(b'\n', &mut stdout_line), if read_stdout => (Stream::Stdout, read),
                        read = stderr_reader.read_until(b'\n', &mut stderr_line), if read_stderr => (Stream::Stderr, read),
                    }
                };

                let (stream, read) = match limits.idle_timeout {
                    Some(idle) => match timeout(idle, next_read).await {
                        Ok(next) => next,
                        Err(_) => return Outcome::Idle,
                    },
                    None => next_read.await,
                };

                let (line, open) = match stream {
                    Stream::Stdout => (&mut stdout_line, &mut stdout_open),
                    Stream::Stderr => (&mut stderr_line, &mut stderr_open),
                };
                match read {
                    Ok(0) => {
                        log_line(stream, line);
                        *open = false;
                    }
                    Ok(_) => log_line(stream, line),
                    Err(e) => {
                        debug!(stream = stream.name(), error = %e, "output stream failed");
                        *open = false;
                    }
                }
            }

            match child.wait().await {
                Ok(status) => Outcome::Exited(status),
                Err(e) => Outcome::WaitFailed(e),
            }
        };

        let outcome = match limits.timeout {
            Some(limit) => timeout(limit, supervised)
                .await
                .unwrap_or(Outcome::TimedOut),
            None => supervised.await,
        };

        match outcome {
            Outcome::Exited(status) => {
                if !status.success() {
                    warn!(
                        command = %command_line,
                        code = status.code().unwrap_or(-1),
                        "command failed"
                    );
                }
                Ok(status.success())
            }
            Outcome::WaitFailed(e) => Err(PackagerError::io(&self.base_path, e)),
            Outcome::TimedOut => {
                let _ = child.kill().await;
                warn!(command = %command_line, "command timed out");
                Ok(false)
            }
            Outcome::Idle => {
                let _ = child.kill().await;
                warn!(command = %command_line, "command produced no output before the idle timeout");
                Ok(false)
            }
        }
    }
}

/// Log a buffered output line and clear the buffer
fn log_line(stream: Stream, line: &mut Vec<u8>) {
    if !line.is_empty() {
        let text = String::from_utf8_lossy(line);
        debug!(stream = stream.name(), "{}", text.trim_end_matches(['\r', '\n']));
        line.clear();
    }
}

impl DependencyRegistry for ComposerRegistry {
    async fn register(&self, name: &str, package_path: &Path) -> Result<bool> {
        let url = self.repository_url(package_path)?;
        let repository_key = format!("repositories.{}", name);
        info!(package = name, url = %url, "registering path repository");

        let stability = self
            .run(&["config", "minimum-stability", "dev"], self.config_limits)
            .await?;
        let prefer_stable = self
            .run(&["config", "prefer-stable", "true"], self.config_limits)
            .await?;
        let repository = self
            .run(&["config", &repository_key, "path", &url], self.config_limits)
            .await?;

        Ok(stability && prefer_stable && repository)
    }

    async fn unregister(&self, name: &str) -> Result<bool> {
        info!(package = name, "unregistering path repository");
        let repository = format!("repositories.{}", name);
        self.run(&["config", "--unset", &repository], self.config_limits)
            .await
    }

    async fn install(&self, name: &str) -> Result<bool> {
        info!(package = name, "installing");
        self.run(&["require", name], self.install_limits).await
    }

    async fn uninstall(&self, name: &str) -> Result<bool> {
        info!(package = name, "uninstalling");
        self.run(&["remove", name], self.install_limits).await
    }

    fn is_registered(&self, name: &str, package_path: &Path) -> Result<bool> {
        let manifest: Manifest = self.read_json("composer.json")?;
        let repository = match manifest.repositories {
            Repositories::Keyed(map) => map.get(name).cloned(),
            Repositories::Listed(_) => None,
        };
        let Some(repository) = repository else {
            return Ok(false);
        };

        let expected = self.repository_url(package_path)?;
        Ok(repository.get("type").and_then(Value::as_str) == Some("path")
            && repository.get("url").and_then(Value::as_str) == Some(expected.as_str()))
    }

    fn install_status(&self, name: &str) -> Result<InstallStatus> {
        let lock: LockFile = self.read_json("composer.lock")?;
        let mut status = InstallStatus::default();

        for package in lock.packages.iter().chain(&lock.packages_dev) {
            if package.name == name {
                status.installed = true;
            }
            let requires = package.require.contains_key(name) || package.require_dev.contains_key(name);
            if requires && !status.required_by.contains(&package.name) {
                status.required_by.push(package.name.clone());
            }
        }

        Ok(status)
    }
}
