//! Packager configuration (`packager.yaml`)

use crate::error::{PackagerError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Environment variable pointing at a config file
pub const CONFIG_ENV: &str = "PACKAGER_CONFIG";

/// Config file looked up in the base path when nothing else is given
pub const DEFAULT_CONFIG_FILE: &str = "packager.yaml";

/// Suggested values used when the caller does not supply them
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Suggestions {
    #[serde(default)]
    pub author_name: Option<String>,

    #[serde(default)]
    pub author_email: Option<String>,

    #[serde(default)]
    pub license: Option<String>,
}

/// Settings consumed by the creator, the manager and the CLI
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackagerConfig {
    /// Resource tag -> directory overriding the built-in layout
    #[serde(default)]
    pub skeleton_structure: BTreeMap<String, String>,

    /// Scratch directory for transient creation artifacts
    #[serde(default)]
    pub temporary_storage: Option<PathBuf>,

    /// Empty the scratch directory once creation finishes
    #[serde(default = "default_true")]
    pub delete_temp_after_do: bool,

    /// Lowest framework version generated packages target
    #[serde(default)]
    pub minimum_version: Option<String>,

    /// Root of the versioned stub folders
    #[serde(default)]
    pub stub_path: Option<PathBuf>,

    /// Prefix in front of the version in stub folder names
    #[serde(default = "default_stub_folder_prefix")]
    pub stub_folder_prefix: String,

    /// Directory (relative to the base path) holding all local packages
    #[serde(default = "default_packages_dir")]
    pub packages_dir: String,

    #[serde(default)]
    pub suggestions: Suggestions,

    /// Max runtime of package-manager config commands, in seconds
    #[serde(default = "default_process_timeout")]
    pub process_timeout_secs: Option<u64>,

    /// Max time without output from package-manager config commands, in seconds
    #[serde(default = "default_process_timeout")]
    pub process_idle_timeout_secs: Option<u64>,
}

fn default_true() -> bool {
    true
}

fn default_stub_folder_prefix() -> String {
    "laravel_".to_string()
}

fn default_packages_dir() -> String {
    "packages".to_string()
}

fn default_process_timeout() -> Option<u64> {
    Some(60)
}

impl Default for PackagerConfig {
    fn default() -> Self {
        Self {
            skeleton_structure: BTreeMap::new(),
            temporary_storage: None,
            delete_temp_after_do: default_true(),
            minimum_version: None,
            stub_path: None,
            stub_folder_prefix: default_stub_folder_prefix(),
            packages_dir: default_packages_dir(),
            suggestions: Suggestions::default(),
            process_timeout_secs: default_process_timeout(),
            process_idle_timeout_secs: default_process_timeout(),
        }
    }
}

impl PackagerConfig {
    /// Parse a YAML config document
    pub fn from_yaml(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    /// Read a config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| PackagerError::io(path, e))?;
        Self::from_yaml(&content)
    }

    /// Find the config for a project: explicit path, then `PACKAGER_CONFIG`,
    /// then `<base>/packager.yaml`, else defaults
    pub fn discover(explicit: Option<&Path>, base_path: &Path) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            return Self::load(Path::new(&path));
        }
        let default_file = base_path.join(DEFAULT_CONFIG_FILE);
        if default_file.is_file() {
            return Self::load(&default_file);
        }
        Ok(Self::default())
    }

    /// Scratch directory, defaulting to `<base>/storage/packager/temp`
    pub fn scratch_dir(&self, base_path: &Path) -> PathBuf {
        match &self.temporary_storage {
            Some(path) if path.is_absolute() => path.clone(),
            Some(path) => base_path.join(path),
            None => base_path.join("storage").join("packager").join("temp"),
        }
    }

    /// Stub root: the configured one, `<base>/stubs`, or the stubs bundled with this crate
    pub fn stub_root(&self, base_path: &Path) -> PathBuf {
        if let Some(path) = &self.stub_path {
            return if path.is_absolute() {
                path.clone()
            } else {
                base_path.join(path)
            };
        }
        let local = base_path.join("stubs");
        if local.is_dir() {
            return local;
        }
        bundled_stub_root()
    }
}

/// Stub folders shipped with the workspace
pub fn bundled_stub_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../stubs")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PackagerConfig::from_yaml("").unwrap();
        assert!(config.delete_temp_after_do);
        assert_eq!(config.stub_folder_prefix, "laravel_");
        assert_eq!(config.packages_dir, "packages");
        assert_eq!(config.process_timeout_secs, Some(60));
        assert!(config.skeleton_structure.is_empty());
    }

    #[test]
    fn test_parse_overrides() {
        let yaml = r#"
skeleton_structure:
  controller: Http/Api
  helper: ""
delete_temp_after_do: false
minimum_version: "5.8"
process_timeout_secs: null
suggestions:
  license: MIT
"#;
        let config = PackagerConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.skeleton_structure["controller"], "Http/Api");
        assert_eq!(config.skeleton_structure["helper"], "");
        assert!(!config.delete_temp_after_do);
        assert_eq!(config.minimum_version.as_deref(), Some("5.8"));
        assert_eq!(config.process_timeout_secs, None);
        assert_eq!(config.suggestions.license.as_deref(), Some("MIT"));
    }

    #[test]
    fn test_invalid_yaml() {
        assert!(matches!(
            PackagerConfig::from_yaml("skeleton_structure: [1, 2"),
            Err(PackagerError::Config(_))
        ));
    }

    #[test]
    fn test_scratch_dir() {
        let base = Path::new("/srv/app");
        let mut config = PackagerConfig::default();
        assert_eq!(
            config.scratch_dir(base),
            PathBuf::from("/srv/app/storage/packager/temp")
        );
        config.temporary_storage = Some(PathBuf::from("tmp/packager"));
        assert_eq!(config.scratch_dir(base), PathBuf::from("/srv/app/tmp/packager"));
    }
}
