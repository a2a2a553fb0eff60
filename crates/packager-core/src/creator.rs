//! Package tree creation
//!
//! Builds the directory tree of a new package from the stub folders:
//! storage, `src`, namespace and `tests` directories, the basic files every
//! package has, then one file per requested resource kind.

use crate::config::PackagerConfig;
use crate::error::Result;
use crate::fs::{ensure_directory, Filesystem};
use crate::layout::{PackagePaths, ResourceLayout};
use crate::package::Package;
use crate::path;
use crate::resource::SOURCE_EXTENSION;
use crate::stubs::{DirectiveEngine, StubSet, TemplateChain, TemplateContext};
use chrono::{Local, NaiveDateTime};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Content of the `.gitignore` kept in the scratch directory
const SCRATCH_GITIGNORE: &str = "*\n!.gitignore";

/// Result of a successful creation run
#[derive(Debug, Clone)]
pub struct CreatedPackage {
    /// Absolute package root
    pub storage: PathBuf,
    /// Stub folders used, in lookup order
    pub chain: TemplateChain,
    /// Every file written, in creation order
    pub files: Vec<PathBuf>,
}

/// Creates package trees from a stub root
pub struct PackageCreator<'f, F: Filesystem + ?Sized> {
    fs: &'f F,
    stub_root: PathBuf,
    stub_folder_prefix: String,
    skeleton_structure: BTreeMap<String, String>,
    scratch_dir: PathBuf,
    delete_temp_after_do: bool,
}

impl<'f, F: Filesystem + ?Sized> PackageCreator<'f, F> {
    pub fn new(fs: &'f F, config: &PackagerConfig, base_path: &Path) -> Self {
        Self {
            fs,
            stub_root: config.stub_root(base_path),
            stub_folder_prefix: config.stub_folder_prefix.clone(),
            skeleton_structure: config.skeleton_structure.clone(),
            scratch_dir: config.scratch_dir(base_path),
            delete_temp_after_do: config.delete_temp_after_do,
        }
    }

    pub fn with_stub_root(mut self, stub_root: impl Into<PathBuf>) -> Self {
        self.stub_root = stub_root.into();
        self
    }

    pub fn scratch_dir(&self) -> &Path {
        &self.scratch_dir
    }

    /// Create `package` at `store_at` using stubs compatible with `minimum_version`
    pub fn create(&self, package: &Package, store_at: &Path, minimum_version: &str) -> Result<CreatedPackage> {
        self.create_at(package, store_at, minimum_version, Local::now().naive_local())
    }

    /// Same as [`create`](Self::create) with a fixed creation time
    pub fn create_at(
        &self,
        package: &Package,
        store_at: &Path,
        minimum_version: &str,
        created_at: NaiveDateTime,
    ) -> Result<CreatedPackage> {
        info!(package = package.name(), minimum_version, "creating package");

        let stubs = StubSet::discover(
            self.fs,
            &self.stub_root,
            &self.stub_folder_prefix,
            minimum_version,
        )?;

        let storage = PathBuf::from(path::absolute(&store_at.to_string_lossy())?);
        let paths = PackagePaths::new(storage.clone(), &package.namespace_directory());
        let layout = ResourceLayout::plan(
            package.resources(),
            &paths.src(),
            &paths.namespace(),
            &self.skeleton_structure,
        )?;

        self.prepare_scratch()?;

        let context = TemplateContext {
            package,
            layout: &layout,
            paths: &paths,
            created_at,
        };
        let mut run = CreationRun {
            fs: self.fs,
            stubs: &stubs,
            engine: DirectiveEngine::new(&stubs, context),
            scratch_dir: &self.scratch_dir,
            written: Vec::new(),
            traces: 0,
        };

        // Directories
        for dir in [paths.storage().to_path_buf(), paths.src(), paths.namespace(), paths.tests()] {
            ensure_directory(self.fs, &dir)?;
        }
        run.copy_stub("gitkeep", &paths.tests().join(".gitkeep"), false)?;

        // Basic files
        let storage_root = paths.storage();
        let project = package.project();
        run.copy_stub("gitignore", &storage_root.join(".gitignore"), false)?;
        run.copy_stub("phpunit", &storage_root.join("phpunit.xml"), false)?;
        run.copy_stub("travis", &storage_root.join(".travis.yml"), false)?;
        run.copy_stub("composer", &storage_root.join("composer.json"), true)?;
        run.copy_stub(
            "main_class",
            &paths.namespace().join(format!("{}.{}", project, SOURCE_EXTENSION)),
            true,
        )?;
        run.copy_stub(
            "service_provider",
            &paths
                .namespace()
                .join(format!("{}ServiceProvider.{}", project, SOURCE_EXTENSION)),
            true,
        )?;

        // Resources
        let timestamp = context.timestamp();
        for (kind, _) in layout.iter() {
            let Some(file) = layout.file_path(kind, package, &timestamp) else {
                continue;
            };
            if let Some(parent) = file.parent() {
                ensure_directory(self.fs, parent)?;
            }

            let is_placeholder = file.file_name().is_some_and(|name| name == ".gitkeep");
            let stub = if is_placeholder { "gitkeep" } else { kind.tag() };
            run.copy_stub(stub, &file, true)?;
        }

        let written = run.written;

        if self.delete_temp_after_do {
            debug!(scratch = %self.scratch_dir.display(), "cleaning scratch directory");
            self.fs.clean_directory(&self.scratch_dir)?;
        }

        info!(
            package = package.name(),
            files = written.len(),
            storage = %storage.display(),
            "package created"
        );

        Ok(CreatedPackage {
            storage,
            chain: stubs.chain().clone(),
            files: written,
        })
    }

    fn prepare_scratch(&self) -> Result<()> {
        ensure_directory(self.fs, &self.scratch_dir)?;
        self.fs.write_file(
            &self.scratch_dir.join(".gitignore"),
            SCRATCH_GITIGNORE.as_bytes(),
        )
    }
}

/// State of one creation run
struct CreationRun<'a, F: Filesystem + ?Sized> {
    fs: &'a F,
    stubs: &'a StubSet<'a, F>,
    engine: DirectiveEngine<'a, F>,
    scratch_dir: &'a Path,
    written: Vec<PathBuf>,
    traces: usize,
}

impl<F: Filesystem + ?Sized> CreationRun<'_, F> {
    /// Write the content of `stub` to `target`, resolving directives when `format` is set
    fn copy_stub(&mut self, stub: &str, target: &Path, format: bool) -> Result<()> {
        let content = match self.stubs.load(stub)? {
            Some(content) => content,
            None => {
                warn!(stub, target = %target.display(), "stub not found, writing empty file");
                String::new()
            }
        };

        let content = if format {
            let resolved = self.engine.resolve(&content)?;
            self.record_traces()?;
            resolved
        } else {
            content
        };

        self.fs.write_file(target, content.as_bytes())?;
        debug!(stub, file = %target.display(), "wrote file");
        self.written.push(target.to_path_buf());
        Ok(())
    }

    /// Keep every evaluated callback as a trace file in the scratch directory
    fn record_traces(&mut self) -> Result<()> {
        for trace in self.engine.take_traces() {
            self.traces += 1;
            let file = self.scratch_dir.join(format!("callback-{:04}.trace", self.traces));
            let body = format!("{}\n=>\n{}\n", trace.expression, trace.output);
            self.fs.write_file(&file, body.as_bytes())?;
        }
        Ok(())
    }
}
