//! Resource layout: where each requested resource kind lands in the package

use crate::error::{PackagerError, Result};
use crate::package::{case, PackageNames};
use crate::path;
use crate::resource::ResourceKind;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Timestamp format prefixed to migration files
pub const MIGRATION_TIMESTAMP_FORMAT: &str = "%Y_%m_%d_%H%M%S";

/// Fixed directories of a package rooted at its storage path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackagePaths {
    storage: PathBuf,
    namespace_directory: String,
}

impl PackagePaths {
    pub fn new(storage: impl Into<PathBuf>, namespace_directory: &str) -> Self {
        Self {
            storage: storage.into(),
            namespace_directory: namespace_directory.trim().to_string(),
        }
    }

    pub fn storage(&self) -> &Path {
        &self.storage
    }

    pub fn src(&self) -> PathBuf {
        self.storage.join("src")
    }

    pub fn tests(&self) -> PathBuf {
        self.storage.join("tests")
    }

    /// Root of namespaced code; `src` itself when no namespace directory is set
    pub fn namespace(&self) -> PathBuf {
        join_relative(&self.src(), &path::normalize(&self.namespace_directory, '/'))
    }

    /// `target` relative to the storage root, `/`-separated
    pub fn relative_to_storage(&self, target: &Path) -> Result<String> {
        path::relative_from(
            &self.storage.to_string_lossy(),
            &target.to_string_lossy(),
            "/",
            '/',
        )
    }

    /// `target` relative to the namespace root, where the service provider lives
    pub fn relative_to_namespace(&self, target: &Path) -> Result<String> {
        path::relative_from(
            &self.namespace().to_string_lossy(),
            &target.to_string_lossy(),
            "/",
            '/',
        )
    }
}

/// Destination directory of every requested resource kind, in request order
#[derive(Debug, Clone, Default)]
pub struct ResourceLayout {
    namespace_dir: PathBuf,
    dirs: Vec<(ResourceKind, PathBuf)>,
}

impl ResourceLayout {
    /// Compute destination directories
    ///
    /// `overrides` maps resource tags to custom relative directories and wins
    /// over the built-in table. Namespaced kinds go under `namespace_dir` with
    /// every segment title-cased; flat kinds go under `src_dir`.
    pub fn plan(
        resources: &[ResourceKind],
        src_dir: &Path,
        namespace_dir: &Path,
        overrides: &BTreeMap<String, String>,
    ) -> Result<Self> {
        let overrides = parse_overrides(overrides)?;
        let mut dirs = Vec::with_capacity(resources.len());

        for &kind in resources {
            let spec = kind.spec();
            let directory = overrides
                .get(&kind)
                .map(String::as_str)
                .unwrap_or(spec.default_dir);

            let dir = if spec.namespaced {
                join_relative(namespace_dir, &standardize_dir(directory, true))
            } else {
                join_relative(src_dir, &standardize_dir(directory, false))
            };

            debug!(resource = %kind, dir = %dir.display(), "planned resource directory");
            dirs.push((kind, dir));
        }

        Ok(Self {
            namespace_dir: namespace_dir.to_path_buf(),
            dirs,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.dirs.is_empty()
    }

    pub fn dir(&self, kind: ResourceKind) -> Option<&Path> {
        self.dirs
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, dir)| dir.as_path())
    }

    pub fn iter(&self) -> impl Iterator<Item = (ResourceKind, &Path)> {
        self.dirs.iter().map(|(kind, dir)| (*kind, dir.as_path()))
    }

    /// Full path of the file generated for `kind`
    pub fn file_path(
        &self,
        kind: ResourceKind,
        names: &PackageNames,
        timestamp: &str,
    ) -> Option<PathBuf> {
        let mut path = self.dir(kind)?.to_path_buf();
        if let Some(locale) = kind.locale_dir() {
            path.push(locale);
        }
        path.push(kind.file_name(&names.project(), &names.snake_project(), timestamp));
        Some(path)
    }

    /// Code namespace of `kind`: the package namespace plus the resource
    /// directory relative to the namespace directory
    pub fn resource_namespace(&self, kind: ResourceKind, namespace: &str) -> Result<Option<String>> {
        let Some(dir) = self.dir(kind) else {
            return Ok(None);
        };

        let relative = path::relative_from(
            &self.namespace_dir.to_string_lossy(),
            &dir.to_string_lossy(),
            "/",
            '\\',
        )?;

        let joined = format!("{}\\{}", namespace, relative);
        Ok(Some(joined.trim_end_matches('\\').to_string()))
    }
}

fn parse_overrides(overrides: &BTreeMap<String, String>) -> Result<BTreeMap<ResourceKind, String>> {
    overrides
        .iter()
        .map(|(tag, dir)| {
            let kind = tag
                .parse::<ResourceKind>()
                .map_err(|_| PackagerError::UnknownResourceKind(tag.clone()))?;
            Ok((kind, dir.clone()))
        })
        .collect()
}

/// Clean up a configured directory: unify separators, trim slashes and
/// standardize every segment
fn standardize_dir(directory: &str, title_case: bool) -> String {
    let normalized = path::normalize(directory.trim(), '/');

    normalized
        .trim_matches('/')
        .split('/')
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            if title_case {
                case::title(&case::snake(segment))
            } else {
                segment.replace(' ', "_")
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}

fn join_relative(base: &Path, relative: &str) -> PathBuf {
    relative
        .split('/')
        .filter(|segment| !segment.is_empty())
        .fold(base.to_path_buf(), |acc, segment| acc.join(segment))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::PackageBuilder;

    fn src() -> PathBuf {
        PathBuf::from("/pkg/src")
    }

    fn ns() -> PathBuf {
        PathBuf::from("/pkg/src/Acme/Billing")
    }

    #[test]
    fn test_package_paths() {
        let paths = PackagePaths::new("/pkg", " Acme\\Billing ");
        assert_eq!(paths.src(), PathBuf::from("/pkg/src"));
        assert_eq!(paths.tests(), PathBuf::from("/pkg/tests"));
        assert_eq!(paths.namespace(), ns());
        assert_eq!(PackagePaths::new("/pkg", "").namespace(), src());
        assert_eq!(
            paths.relative_to_storage(&paths.namespace()).unwrap(),
            "src/Acme/Billing"
        );
        assert_eq!(
            paths
                .relative_to_namespace(Path::new("/pkg/src/config/config.php"))
                .unwrap(),
            "../../config/config.php"
        );
        assert_eq!(
            PackagePaths::new("/pkg", "")
                .relative_to_namespace(Path::new("/pkg/src/routes"))
                .unwrap(),
            "routes"
        );
    }

    #[test]
    fn test_standardize_dir() {
        assert_eq!(standardize_dir("Http/Controllers", true), "Http/Controllers");
        assert_eq!(standardize_dir("\\http\\api_controllers/", true), "Http/Api_Controllers");
        assert_eq!(standardize_dir(" resources/my views ", false), "resources/my_views");
        assert_eq!(standardize_dir("", false), "");
    }

    #[test]
    fn test_namespaced_and_flat_destinations() {
        let layout = ResourceLayout::plan(
            &[ResourceKind::Controller, ResourceKind::Migration],
            &src(),
            &ns(),
            &BTreeMap::new(),
        )
        .unwrap();

        assert_eq!(
            layout.dir(ResourceKind::Controller).unwrap(),
            Path::new("/pkg/src/Acme/Billing/Http/Controllers")
        );
        assert_eq!(
            layout.dir(ResourceKind::Migration).unwrap(),
            Path::new("/pkg/src/database/migrations")
        );
        assert!(layout.dir(ResourceKind::View).is_none());
    }

    #[test]
    fn test_file_paths() {
        let package = PackageBuilder::new("acme/billing").unwrap().lock();
        let layout = ResourceLayout::plan(
            &[ResourceKind::Controller, ResourceKind::Migration, ResourceKind::Lang],
            &src(),
            &ns(),
            &BTreeMap::new(),
        )
        .unwrap();
        let ts = "2024_05_06_070809";

        assert_eq!(
            layout.file_path(ResourceKind::Controller, &package, ts).unwrap(),
            PathBuf::from("/pkg/src/Acme/Billing/Http/Controllers/BillingController.php")
        );
        assert_eq!(
            layout.file_path(ResourceKind::Migration, &package, ts).unwrap(),
            PathBuf::from("/pkg/src/database/migrations/2024_05_06_070809_create_billing_table.php")
        );
        assert_eq!(
            layout.file_path(ResourceKind::Lang, &package, ts).unwrap(),
            PathBuf::from("/pkg/src/resources/lang/en/demo.php")
        );
    }

    #[test]
    fn test_overrides_win() {
        let mut overrides = BTreeMap::new();
        overrides.insert("controller".to_string(), "api".to_string());
        overrides.insert("helper".to_string(), String::new());

        let layout = ResourceLayout::plan(
            &[ResourceKind::Controller, ResourceKind::Helper],
            &src(),
            &ns(),
            &overrides,
        )
        .unwrap();

        assert_eq!(
            layout.dir(ResourceKind::Controller).unwrap(),
            Path::new("/pkg/src/Acme/Billing/Api")
        );
        assert_eq!(layout.dir(ResourceKind::Helper).unwrap(), Path::new("/pkg/src"));
    }

    #[test]
    fn test_unknown_override_rejected() {
        let mut overrides = BTreeMap::new();
        overrides.insert("widget".to_string(), "Widgets".to_string());

        assert!(matches!(
            ResourceLayout::plan(&[ResourceKind::Model], &src(), &ns(), &overrides),
            Err(PackagerError::UnknownResourceKind(tag)) if tag == "widget"
        ));
    }

    #[test]
    fn test_resource_namespace() {
        let layout = ResourceLayout::plan(
            &[ResourceKind::Controller, ResourceKind::Model],
            &src(),
            &ns(),
            &BTreeMap::new(),
        )
        .unwrap();

        assert_eq!(
            layout
                .resource_namespace(ResourceKind::Controller, "Acme\\Billing")
                .unwrap()
                .unwrap(),
            "Acme\\Billing\\Http\\Controllers"
        );
        assert_eq!(
            layout
                .resource_namespace(ResourceKind::Model, "Acme\\Billing")
                .unwrap()
                .unwrap(),
            "Acme\\Billing\\Models"
        );
        assert!(layout
            .resource_namespace(ResourceKind::Facade, "Acme\\Billing")
            .unwrap()
            .is_none());
    }
}
