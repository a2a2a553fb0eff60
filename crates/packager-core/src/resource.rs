//! Resource kinds that can be generated inside a package

use crate::error::PackagerError;
use std::fmt;
use std::str::FromStr;

/// Extension of generated source files
pub const SOURCE_EXTENSION: &str = "php";

/// A category of generated artifact
///
/// Namespaced kinds live under the namespace directory; flat kinds live
/// directly under `src`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceKind {
    Facade,
    Interface,
    Abstract,
    Trait,
    Exception,
    Controller,
    Middleware,
    Model,
    Command,
    Config,
    Migration,
    Assets,
    Lang,
    View,
    Route,
    Helper,
}

/// Layout rule attached to every resource kind
#[derive(Debug, Clone, Copy)]
pub struct ResourceSpec {
    pub tag: &'static str,
    pub default_dir: &'static str,
    pub namespaced: bool,
}

/// How the output filename of a resource is built
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilePattern {
    /// Always the same name
    Fixed(&'static str),
    /// `<Project><suffix>.<ext>`
    ProjectSuffix(&'static str),
    /// `<timestamp>_create_<project_snake>_table.<ext>`
    Migration,
    /// Placeholder that only keeps the directory in version control
    Gitkeep,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 16] = [
        ResourceKind::Facade,
        ResourceKind::Interface,
        ResourceKind::Abstract,
        ResourceKind::Trait,
        ResourceKind::Exception,
        ResourceKind::Controller,
        ResourceKind::Middleware,
        ResourceKind::Model,
        ResourceKind::Command,
        ResourceKind::Config,
        ResourceKind::Migration,
        ResourceKind::Assets,
        ResourceKind::Lang,
        ResourceKind::View,
        ResourceKind::Route,
        ResourceKind::Helper,
    ];

    pub fn spec(&self) -> ResourceSpec {
        let (tag, default_dir, namespaced) = match self {
            ResourceKind::Facade => ("facade", "Facades", true),
            ResourceKind::Interface => ("interface", "Contracts", true),
            ResourceKind::Abstract => ("abstract", "Contracts", true),
            ResourceKind::Trait => ("trait", "Traits", true),
            ResourceKind::Exception => ("exception", "Exceptions", true),
            ResourceKind::Controller => ("controller", "Http/Controllers", true),
            ResourceKind::Middleware => ("middleware", "Http/Middleware", true),
            ResourceKind::Model => ("model", "Models", true),
            ResourceKind::Command => ("command", "Console/Commands", true),
            ResourceKind::Config => ("config", "config", false),
            ResourceKind::Migration => ("migration", "database/migrations", false),
            ResourceKind::Assets => ("assets", "resources/assets", false),
            ResourceKind::Lang => ("lang", "resources/lang", false),
            ResourceKind::View => ("view", "resources/views", false),
            ResourceKind::Route => ("route", "routes", false),
            ResourceKind::Helper => ("helper", "helpers", false),
        };
        ResourceSpec {
            tag,
            default_dir,
            namespaced,
        }
    }

    pub fn tag(&self) -> &'static str {
        self.spec().tag
    }

    pub fn is_namespaced(&self) -> bool {
        self.spec().namespaced
    }

    pub fn file_pattern(&self) -> FilePattern {
        match self {
            ResourceKind::Config => FilePattern::Fixed("config.php"),
            ResourceKind::Migration => FilePattern::Migration,
            ResourceKind::Lang => FilePattern::Fixed("demo.php"),
            ResourceKind::View => FilePattern::Fixed("demo.blade.php"),
            ResourceKind::Route => FilePattern::Fixed("routes.php"),
            ResourceKind::Helper => FilePattern::Fixed("helpers.php"),
            ResourceKind::Command => FilePattern::Fixed("DemoCommand.php"),
            ResourceKind::Trait => FilePattern::Fixed("DemoTrait.php"),
            ResourceKind::Facade => FilePattern::ProjectSuffix(""),
            ResourceKind::Interface => FilePattern::ProjectSuffix("Interface"),
            ResourceKind::Abstract => FilePattern::ProjectSuffix("Abstract"),
            ResourceKind::Exception => FilePattern::ProjectSuffix("Exception"),
            ResourceKind::Controller => FilePattern::ProjectSuffix("Controller"),
            ResourceKind::Middleware => FilePattern::ProjectSuffix("Middleware"),
            ResourceKind::Model => FilePattern::ProjectSuffix("Model"),
            ResourceKind::Assets => FilePattern::Gitkeep,
        }
    }

    /// Build the output filename
    ///
    /// `project` is the studly project name, `project_snake` its snake form and
    /// `timestamp` the creation time formatted as `Y_m_d_His`.
    pub fn file_name(&self, project: &str, project_snake: &str, timestamp: &str) -> String {
        match self.file_pattern() {
            FilePattern::Fixed(name) => name.to_string(),
            FilePattern::ProjectSuffix(suffix) => {
                format!("{}{}.{}", project, suffix, SOURCE_EXTENSION)
            }
            FilePattern::Migration => format!(
                "{}_create_{}_table.{}",
                timestamp, project_snake, SOURCE_EXTENSION
            ),
            FilePattern::Gitkeep => ".gitkeep".to_string(),
        }
    }

    /// Locale subdirectory placed between the resource dir and its file
    pub fn locale_dir(&self) -> Option<&'static str> {
        match self {
            ResourceKind::Lang => Some("en"),
            _ => None,
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag())
    }
}

impl FromStr for ResourceKind {
    type Err = PackagerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        ResourceKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.tag() == wanted)
            .ok_or_else(|| PackagerError::UnknownResourceKind(s.trim().to_string()))
    }
}

/// Parse a comma-separated list of resource tags; `all` selects every kind
pub fn parse_resource_list(list: &[String]) -> Result<Vec<ResourceKind>, PackagerError> {
    if list.iter().any(|s| s.trim().eq_ignore_ascii_case("all")) {
        return Ok(ResourceKind::ALL.to_vec());
    }
    list.iter()
        .filter(|s| !s.trim().is_empty())
        .map(|s| s.parse())
        .collect()
}
