//! Version of the host framework the packages are generated for

use crate::error::{PackagerError, Result};
use crate::stubs::thread_version;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Framework package whose locked version is the host version
pub const FRAMEWORK_PACKAGE: &str = "laravel/framework";

/// Supplies the host framework version when no minimum version is given
pub trait HostVersionProvider {
    fn current_version(&self) -> Result<String>;
}

/// A version known up front
#[derive(Debug, Clone)]
pub struct FixedVersion(pub String);

impl HostVersionProvider for FixedVersion {
    fn current_version(&self) -> Result<String> {
        Ok(self.0.clone())
    }
}

/// Reads the framework version from the host project's lock file
#[derive(Debug, Clone)]
pub struct LockFileVersion {
    lock_file: PathBuf,
}

#[derive(Debug, Deserialize)]
struct LockFile {
    #[serde(default)]
    packages: Vec<LockedPackage>,
}

#[derive(Debug, Deserialize)]
struct LockedPackage {
    name: String,
    version: String,
}

impl LockFileVersion {
    pub fn new(base_path: &Path) -> Self {
        Self {
            lock_file: base_path.join("composer.lock"),
        }
    }
}

impl HostVersionProvider for LockFileVersion {
    fn current_version(&self) -> Result<String> {
        let content = std::fs::read_to_string(&self.lock_file)
            .map_err(|e| PackagerError::io(&self.lock_file, e))?;
        let lock: LockFile = serde_json::from_str(&content)?;

        lock.packages
            .into_iter()
            .find(|p| p.name == FRAMEWORK_PACKAGE)
            .map(|p| p.version)
            .ok_or_else(|| PackagerError::InvalidVersion(format!("{} is not locked", FRAMEWORK_PACKAGE)))
    }
}

/// Minimum version the generated package targets
///
/// An explicit version wins, then the configured one. Otherwise the release
/// thread of the host framework is used.
pub fn target_version(
    explicit: Option<&str>,
    configured: Option<&str>,
    host: &dyn HostVersionProvider,
) -> Result<String> {
    let given = [explicit, configured]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|v| !v.is_empty());
    if let Some(version) = given {
        return Ok(version.to_string());
    }
    thread_version(&host.current_version()?)
}
