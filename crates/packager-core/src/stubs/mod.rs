//! Stub lookup and content resolution
//!
//! This module provides:
//! - Version-compatible stub folder chains ([`TemplateChain`])
//! - Stub file lookup across a chain ([`StubSet`])
//! - Directive resolution inside stub content ([`DirectiveEngine`])
//! - The callback expression language used by `@callback` directives

pub mod callback;
pub mod chain;
pub mod directive;

use crate::error::Result;
use crate::fs::Filesystem;
use crate::layout::{PackagePaths, ResourceLayout, MIGRATION_TIMESTAMP_FORMAT};
use crate::package::Package;
use crate::path;
use chrono::NaiveDateTime;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub use chain::{thread_version, TemplateChain, DEFAULT_FOLDER};
pub use directive::{CallbackTrace, DirectiveEngine};

/// Extension of stub files
pub const STUB_EXTENSION: &str = "stub";

/// Stub files reachable through a version chain
pub struct StubSet<'f, F: Filesystem + ?Sized> {
    fs: &'f F,
    root: PathBuf,
    chain: TemplateChain,
}

impl<'f, F: Filesystem + ?Sized> StubSet<'f, F> {
    pub fn new(fs: &'f F, root: impl Into<PathBuf>, chain: TemplateChain) -> Self {
        Self {
            fs,
            root: root.into(),
            chain,
        }
    }

    /// List the folders under `root` and build the chain for `minimum`
    pub fn discover(fs: &'f F, root: &Path, prefix: &str, minimum: &str) -> Result<Self> {
        let chain = if fs.is_directory(root) {
            let names: Vec<String> = fs
                .list_directories(root)?
                .iter()
                .filter_map(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
                .collect();
            TemplateChain::resolve(names, prefix, minimum)?
        } else {
            warn!(root = %root.display(), "stub directory not found, using default folder only");
            TemplateChain::resolve(Vec::<String>::new(), prefix, minimum)?
        };

        debug!(chain = ?chain.folders(), "resolved stub chain");
        Ok(Self::new(fs, root, chain))
    }

    pub fn chain(&self) -> &TemplateChain {
        &self.chain
    }

    /// First file named `<stub>.stub` along the chain
    pub fn find(&self, stub: &str) -> Option<PathBuf> {
        let stub = path::normalize(stub.trim_matches(path::SEPARATORS.as_slice()), '/');

        self.chain.folders().iter().find_map(|folder| {
            let mut candidate = self.root.join(folder);
            for segment in stub.split('/') {
                candidate.push(segment);
            }
            candidate.set_extension(STUB_EXTENSION);
            self.fs.is_file(&candidate).then_some(candidate)
        })
    }

    /// Content of a stub, `None` when no folder has it
    pub fn load(&self, stub: &str) -> Result<Option<String>> {
        match self.find(stub) {
            Some(file) => {
                debug!(stub, file = %file.display(), "loading stub");
                self.fs.read_to_string(&file).map(Some)
            }
            None => {
                debug!(stub, "stub not found in any folder");
                Ok(None)
            }
        }
    }
}

/// Everything directives and callbacks may read during one creation run
#[derive(Debug, Clone, Copy)]
pub struct TemplateContext<'a> {
    pub package: &'a Package,
    pub layout: &'a ResourceLayout,
    pub paths: &'a PackagePaths,
    pub created_at: NaiveDateTime,
}

impl TemplateContext<'_> {
    /// Creation time as used in migration filenames
    pub fn timestamp(&self) -> String {
        self.created_at.format(MIGRATION_TIMESTAMP_FORMAT).to_string()
    }
}
