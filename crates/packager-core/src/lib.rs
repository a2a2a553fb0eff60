//! Packager Core - scaffolding and registration of local framework packages
//!
//! This library generates the source tree of a new package from versioned stub
//! folders and registers it as a local path repository of a host project.
//!
//! # Architecture
//!
//! The library is organized into layers:
//!
//! - **Layer 1: Core Operations** - path arithmetic, stub chains, directive
//!   resolution and resource layout planning
//! - **Layer 2: Orchestration** - [`PackageCreator`] builds a package tree,
//!   [`PackageManager`] stores, lists and registers packages through a
//!   [`DependencyRegistry`]
//! - **Layer 3: CLI/TUI Interface** - Optional cliclack-based command runners (feature-gated)
//!
//! # Feature Flags
//!
//! - `tui` (default): Enables the cliclack-based command runners
//!
//! # Example Usage (without TUI)
//!
//! ```ignore
//! use packager_core::{LocalFilesystem, PackageBuilder, PackageCreator, PackagerConfig, ResourceKind};
//!
//! let mut builder = PackageBuilder::new("acme/billing")?;
//! builder.set_resources([ResourceKind::Config, ResourceKind::Model]);
//! let package = builder.lock();
//!
//! let fs = LocalFilesystem;
//! let config = PackagerConfig::default();
//! let creator = PackageCreator::new(&fs, &config, base_path);
//! let created = creator.create(&package, &base_path.join("packages/acme/billing"), "5.8")?;
//! ```

pub mod config;
pub mod creator;
pub mod error;
pub mod fs;
pub mod host;
pub mod layout;
pub mod manager;
pub mod package;
pub mod path;
pub mod registry;
pub mod resource;
pub mod stubs;

#[cfg(feature = "tui")]
pub mod tui;

// Re-export main types for convenience
pub use config::PackagerConfig;
pub use creator::{CreatedPackage, PackageCreator};
pub use error::{PackagerError, Result};
pub use fs::{Filesystem, LocalFilesystem};
pub use host::{target_version, FixedVersion, HostVersionProvider, LockFileVersion};
pub use layout::{PackagePaths, ResourceLayout};
pub use manager::{PackageEntry, PackageManager};
pub use package::{Package, PackageBuilder, PackageInfo};
pub use registry::{ComposerRegistry, DependencyRegistry, InstallStatus};
pub use resource::ResourceKind;
pub use stubs::{DirectiveEngine, StubSet, TemplateChain};
