//! Local package storage: create, find, list and remove packages of a host project

use crate::config::PackagerConfig;
use crate::creator::{CreatedPackage, PackageCreator};
use crate::error::{PackagerError, Result};
use crate::fs::Filesystem;
use crate::package::{split_package_name, PackageBuilder};
use crate::path;
use crate::registry::{DependencyRegistry, InstallStatus};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Name shown for packages whose manifest has no `name`
const UNKNOWN_PACKAGE: &str = "unknown/unknown";

/// A package found in the packages directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageEntry {
    pub name: String,
    /// Package directory relative to the base path
    pub path: String,
    pub registered: bool,
    pub installed: bool,
}

/// Outcome of [`PackageManager::create`]
#[derive(Debug, Clone)]
pub struct Creation {
    pub package: CreatedPackage,
    pub registered: bool,
}

/// Manages the packages stored under `<base>/<packages_dir>`
pub struct PackageManager<'f, F: Filesystem + ?Sized, R: DependencyRegistry> {
    fs: &'f F,
    registry: R,
    config: PackagerConfig,
    base_path: PathBuf,
}

impl<'f, F: Filesystem + ?Sized, R: DependencyRegistry> PackageManager<'f, F, R> {
    pub fn new(fs: &'f F, registry: R, config: PackagerConfig, base_path: impl Into<PathBuf>) -> Self {
        Self {
            fs,
            registry,
            config,
            base_path: base_path.into(),
        }
    }

    pub fn registry(&self) -> &R {
        &self.registry
    }

    pub fn config(&self) -> &PackagerConfig {
        &self.config
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Directory holding every local package
    pub fn packages_root(&self) -> PathBuf {
        self.base_path.join(&self.config.packages_dir)
    }

    /// `<base>/<packages_dir>/<vendor>/<project>`
    pub fn storage_path(&self, name: &str) -> Result<PathBuf> {
        let (vendor, project) = split_package_name(name)?;
        Ok(self.packages_root().join(vendor).join(project))
    }

    /// Whether the package is stored locally or already installed
    pub fn exists(&self, name: &str) -> Result<bool> {
        let manifest = self.storage_path(name)?.join("composer.json");
        if self.manifest_name(&manifest)?.as_deref() == Some(name) {
            return Ok(true);
        }
        Ok(self.registry.install_status(name)?.installed)
    }

    pub fn is_registered(&self, name: &str) -> Result<bool> {
        self.registry.is_registered(name, &self.storage_path(name)?)
    }

    pub fn install_status(&self, name: &str) -> Result<InstallStatus> {
        self.registry.install_status(name)
    }

    /// Generate the package tree, then register it with the host project
    pub async fn create(&self, builder: PackageBuilder, minimum_version: &str) -> Result<Creation> {
        let name = builder.names().name().to_string();
        if self.exists(&name)? {
            return Err(PackagerError::AlreadyExists(name));
        }

        let package = builder.lock();
        let storage = self.storage_path(&name)?;
        let creator = PackageCreator::new(self.fs, &self.config, &self.base_path);
        let created = creator.create(&package, &storage, minimum_version)?;

        let registered = self.registry.register(&name, &created.storage).await?;
        if !registered {
            warn!(package = %name, "package created but could not be registered");
        }

        Ok(Creation {
            package: created,
            registered,
        })
    }

    pub async fn register(&self, name: &str) -> Result<bool> {
        let storage = self.storage_path(name)?;
        self.registry.register(name, &storage).await
    }

    pub async fn unregister(&self, name: &str) -> Result<bool> {
        split_package_name(name)?;
        self.registry.unregister(name).await
    }

    pub async fn install(&self, name: &str) -> Result<bool> {
        self.registry.install(name).await
    }

    pub async fn uninstall(&self, name: &str) -> Result<bool> {
        self.registry.uninstall(name).await
    }

    /// Unregister the package and delete its directory
    ///
    /// The vendor directory goes too once it holds no other package.
    pub async fn remove(&self, name: &str) -> Result<bool> {
        let unregistered = self.registry.unregister(name).await?;
        if !unregistered {
            warn!(package = name, "could not unregister package, removing files anyway");
        }

        let storage = self.storage_path(name)?;
        if !self.fs.is_directory(&storage) {
            debug!(package = name, "nothing to delete");
            return Ok(true);
        }

        self.fs.delete_directory(&storage)?;
        info!(package = name, path = %storage.display(), "deleted package directory");

        if let Some(vendor) = storage.parent() {
            if self.fs.is_empty_directory(vendor) {
                self.fs.delete_directory(vendor)?;
                debug!(vendor = %vendor.display(), "deleted empty vendor directory");
            }
        }

        Ok(true)
    }

    /// Every package stored as `<vendor>/<project>/composer.json`
    pub fn all(&self) -> Result<Vec<PackageEntry>> {
        let root = self.packages_root();
        if !self.fs.is_directory(&root) {
            return Ok(Vec::new());
        }

        let mut entries = Vec::new();
        for vendor in self.fs.list_directories(&root)? {
            for project in self.fs.list_directories(&vendor)? {
                let manifest = project.join("composer.json");
                if !self.fs.is_file(&manifest) {
                    continue;
                }

                let name = self
                    .manifest_name(&manifest)?
                    .unwrap_or_else(|| UNKNOWN_PACKAGE.to_string());
                let relative = path::relative(
                    &self.base_path.to_string_lossy(),
                    &project.to_string_lossy(),
                    '/',
                )?;

                entries.push(PackageEntry {
                    registered: self.registry.is_registered(&name, &project)?,
                    installed: self.registry.install_status(&name)?.installed,
                    name,
                    path: relative,
                });
            }
        }

        Ok(entries)
    }

    /// `name` declared in a package manifest, if the manifest exists
    ///
    /// A manifest that does not parse has no name.
    fn manifest_name(&self, manifest: &Path) -> Result<Option<String>> {
        if !self.fs.is_file(manifest) {
            return Ok(None);
        }
        let value: Value = match serde_json::from_str(&self.fs.read_to_string(manifest)?) {
            Ok(value) => value,
            Err(e) => {
                warn!(manifest = %manifest.display(), error = %e, "ignoring unreadable package manifest");
                return Ok(None);
            }
        };
        Ok(value.get("name").and_then(Value::as_str).map(str::to_string))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::LocalFilesystem;
    use crate::resource::ResourceKind;
    use std::sync::Mutex;
    use tempfile::TempDir;

    #[derive(Default)]
    struct FakeRegistry {
        calls: Mutex<Vec<String>>,
        installed: Vec<String>,
        registered: Vec<String>,
        succeed: bool,
    }

    impl FakeRegistry {
        fn ok() -> Self {
            Self {
                succeed: true,
                ..Self::default()
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, call: String) -> Result<bool> {
            self.calls.lock().unwrap().push(call);
            Ok(self.succeed)
        }
    }

    impl DependencyRegistry for FakeRegistry {
        async fn register(&self, name: &str, package_path: &Path) -> Result<bool> {
            let dir = package_path.file_name().unwrap().to_string_lossy().into_owned();
            self.record(format!("register {} {}", name, dir))
        }

        async fn unregister(&self, name: &str) -> Result<bool> {
            self.record(format!("unregister {}", name))
        }

        async fn install(&self, name: &str) -> Result<bool> {
            self.record(format!("install {}", name))
        }

        async fn uninstall(&self, name: &str) -> Result<bool> {
            self.record(format!("uninstall {}", name))
        }

        fn is_registered(&self, name: &str, _package_path: &Path) -> Result<bool> {
            Ok(self.registered.iter().any(|n| n == name))
        }

        fn install_status(&self, name: &str) -> Result<InstallStatus> {
            Ok(InstallStatus {
                installed: self.installed.iter().any(|n| n == name),
                required_by: Vec::new(),
            })
        }
    }

    fn write(root: &Path, rel: &str, content: &str) {
        let file = root.join(rel);
        std::fs::create_dir_all(file.parent().unwrap()).unwrap();
        std::fs::write(file, content).unwrap();
    }

    fn config(tmp: &TempDir) -> PackagerConfig {
        let stubs = tmp.path().join("stubs");
        write(&stubs, "default/composer.stub", "{\"name\": \"{{@package name @package}}\"}\n");
        write(&stubs, "default/model.stub", "class {{@callback resource_name(model) @callback}} {}\n");
        PackagerConfig {
            stub_path: Some(stubs),
            ..PackagerConfig::default()
        }
    }

    #[test]
    fn test_storage_path() {
        let tmp = TempDir::new().unwrap();
        let fs = LocalFilesystem;
        let manager = PackageManager::new(&fs, FakeRegistry::ok(), PackagerConfig::default(), tmp.path());

        assert_eq!(
            manager.storage_path("acme/billing").unwrap(),
            tmp.path().join("packages/acme/billing")
        );
        assert!(matches!(
            manager.storage_path("billing"),
            Err(PackagerError::InvalidName { .. })
        ));
    }

    #[tokio::test]
    async fn test_create_registers_package() {
        let tmp = TempDir::new().unwrap();
        let fs = LocalFilesystem;
        let manager = PackageManager::new(&fs, FakeRegistry::ok(), config(&tmp), tmp.path());

        let mut builder = PackageBuilder::new("acme/billing").unwrap();
        builder.set_resources([ResourceKind::Model]);
        let creation = manager.create(builder, "5.0").await.unwrap();

        assert!(creation.registered);
        assert_eq!(creation.package.storage, tmp.path().join("packages/acme/billing"));
        assert_eq!(manager.registry().calls(), vec!["register acme/billing billing"]);
        assert_eq!(
            std::fs::read_to_string(
                creation.package.storage.join("src/Models/BillingModel.php")
            )
            .unwrap(),
            "class BillingModel {}\n"
        );
        assert!(manager.exists("acme/billing").unwrap());
    }

    #[tokio::test]
    async fn test_create_existing_package_fails() {
        let tmp = TempDir::new().unwrap();
        let fs = LocalFilesystem;
        write(
            tmp.path(),
            "packages/acme/billing/composer.json",
            r#"{"name": "acme/billing"}"#,
        );
        let manager = PackageManager::new(&fs, FakeRegistry::ok(), config(&tmp), tmp.path());

        let builder = PackageBuilder::new("acme/billing").unwrap();
        assert!(matches!(
            manager.create(builder, "5.0").await,
            Err(PackagerError::AlreadyExists(name)) if name == "acme/billing"
        ));
        assert!(manager.registry().calls().is_empty());
    }

    #[test]
    fn test_installed_package_exists() {
        let tmp = TempDir::new().unwrap();
        let fs = LocalFilesystem;
        let registry = FakeRegistry {
            installed: vec!["acme/billing".to_string()],
            ..FakeRegistry::ok()
        };
        let manager = PackageManager::new(&fs, registry, PackagerConfig::default(), tmp.path());

        assert!(manager.exists("acme/billing").unwrap());
        assert!(!manager.exists("acme/shop").unwrap());
    }

    #[tokio::test]
    async fn test_remove_deletes_empty_vendor() {
        let tmp = TempDir::new().unwrap();
        let fs = LocalFilesystem;
        write(tmp.path(), "packages/acme/billing/composer.json", "{}");
        write(tmp.path(), "packages/acme/shop/composer.json", "{}");
        let manager = PackageManager::new(&fs, FakeRegistry::ok(), PackagerConfig::default(), tmp.path());

        assert!(manager.remove("acme/billing").await.unwrap());
        assert!(!tmp.path().join("packages/acme/billing").exists());
        assert!(tmp.path().join("packages/acme").is_dir());

        assert!(manager.remove("acme/shop").await.unwrap());
        assert!(!tmp.path().join("packages/acme").exists());
        assert!(tmp.path().join("packages").is_dir());

        assert_eq!(
            manager.registry().calls(),
            vec!["unregister acme/billing", "unregister acme/shop"]
        );
    }

    #[tokio::test]
    async fn test_remove_missing_package_is_ok() {
        let tmp = TempDir::new().unwrap();
        let fs = LocalFilesystem;
        let manager = PackageManager::new(&fs, FakeRegistry::default(), PackagerConfig::default(), tmp.path());
        assert!(manager.remove("acme/ghost").await.unwrap());
    }

    #[test]
    fn test_all_lists_packages_two_levels_down() {
        let tmp = TempDir::new().unwrap();
        let fs = LocalFilesystem;
        write(tmp.path(), "packages/acme/billing/composer.json", r#"{"name": "acme/billing"}"#);
        write(tmp.path(), "packages/acme/nameless/composer.json", "{}");
        write(tmp.path(), "packages/acme/composer.json", r#"{"name": "too/shallow"}"#);
        write(tmp.path(), "packages/acme/deep/nested/composer.json", r#"{"name": "too/deep"}"#);
        let registry = FakeRegistry {
            registered: vec!["acme/billing".to_string()],
            ..FakeRegistry::ok()
        };
        let manager = PackageManager::new(&fs, registry, PackagerConfig::default(), tmp.path());

        let all = manager.all().unwrap();
        assert_eq!(
            all,
            vec![
                PackageEntry {
                    name: "acme/billing".to_string(),
                    path: "packages/acme/billing".to_string(),
                    registered: true,
                    installed: false,
                },
                PackageEntry {
                    name: UNKNOWN_PACKAGE.to_string(),
                    path: "packages/acme/nameless".to_string(),
                    registered: false,
                    installed: false,
                },
            ]
        );
    }

    #[test]
    fn test_all_lists_broken_manifest_as_unknown() {
        let tmp = TempDir::new().unwrap();
        let fs = LocalFilesystem;
        write(tmp.path(), "packages/acme/billing/composer.json", r#"{"name": "acme/billing"}"#);
        write(tmp.path(), "packages/acme/wip/composer.json", r#"{ "name": "#);
        let manager = PackageManager::new(&fs, FakeRegistry::ok(), PackagerConfig::default(), tmp.path());

        let names: Vec<String> = manager.all().unwrap().into_iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["acme/billing".to_string(), UNKNOWN_PACKAGE.to_string()]);
        assert!(manager.exists("acme/billing").unwrap());
        assert!(!manager.exists("acme/wip").unwrap());
    }

    #[test]
    fn test_all_without_packages_dir() {
        let tmp = TempDir::new().unwrap();
        let fs = LocalFilesystem;
        let manager = PackageManager::new(&fs, FakeRegistry::ok(), PackagerConfig::default(), tmp.path());
        assert!(manager.all().unwrap().is_empty());
    }
}
