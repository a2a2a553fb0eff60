//! Packager CLI - create and register local framework packages

use anyhow::Result;
use clap::{Parser, Subcommand};
use packager_core::tui::{self, NewArgs, UnregisterArgs, Workspace};
use packager_core::PackageInfo;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter
const LOG_ENV: &str = "PACKAGER_LOG";

#[derive(Parser, Debug)]
#[command(name = "packager")]
#[command(about = "Create and register local framework packages")]
#[command(version)]
pub struct Args {
    /// Root of the host project (defaults to the current directory)
    #[arg(long = "base-path", global = true)]
    pub base_path: Option<PathBuf>,

    /// Config file (defaults to $PACKAGER_CONFIG, then <base-path>/packager.yaml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory of versioned stub folders (for development use)
    #[arg(long = "stub-dir", global = true)]
    pub stub_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a new package with the given name
    New(CliNewArgs),
    /// Register an existing package to the application repositories
    Register(NameArgs),
    /// Unregister an existing package from the application repositories
    Unregister(CliUnregisterArgs),
    /// Unregister a package and delete its files
    Remove(CliRemoveArgs),
    /// List all packages
    List,
}

#[derive(Parser, Debug)]
pub struct NameArgs {
    /// The name (<vendor>/<project>) of the package
    pub name: String,
}

#[derive(Parser, Debug)]
pub struct CliNewArgs {
    /// The name (<vendor>/<project>) of the package
    pub name: String,

    /// Author name
    #[arg(long = "author-name")]
    pub author_name: Option<String>,

    /// Author email
    #[arg(long = "author-email")]
    pub author_email: Option<String>,

    /// Package description
    #[arg(long)]
    pub description: Option<String>,

    /// Package keywords (comma-separated)
    #[arg(long)]
    pub keywords: Option<String>,

    /// Package license
    #[arg(long)]
    pub license: Option<String>,

    /// Package homepage
    #[arg(long)]
    pub homepage: Option<String>,

    /// Namespace prefix of the package
    #[arg(long)]
    pub namespace: Option<String>,

    /// Directory of namespace autoloading, relative to src
    #[arg(long = "namespace-dir")]
    pub namespace_dir: Option<String>,

    /// Resources to generate (comma-separated, or "all")
    #[arg(short, long, value_delimiter = ',')]
    pub resources: Vec<String>,

    /// Lowest framework version the stubs must be compatible with (MAJOR.MINOR)
    #[arg(long = "min-version")]
    pub min_version: Option<String>,

    /// Install the package after creating it
    #[arg(short, long)]
    pub install: bool,
}

impl From<CliNewArgs> for NewArgs {
    fn from(args: CliNewArgs) -> Self {
        NewArgs {
            name: args.name,
            info: PackageInfo {
                author_name: args.author_name,
                author_email: args.author_email,
                description: args.description,
                keywords: args.keywords,
                license: args.license,
                homepage: args.homepage,
                namespace: args.namespace,
                namespace_directory: args.namespace_dir,
            },
            resources: args.resources,
            min_version: args.min_version,
            install: args.install,
        }
    }
}

#[derive(Parser, Debug)]
pub struct CliUnregisterArgs {
    /// The name (<vendor>/<project>) of the package
    pub name: String,

    /// Uninstall the package before unregistering it
    #[arg(short, long)]
    pub uninstall: bool,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

#[derive(Parser, Debug)]
pub struct CliRemoveArgs {
    /// The name (<vendor>/<project>) of the package
    pub name: String,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Ensure terminal cursor is restored on panic
    let default_panic = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = console::Term::stderr().show_cursor();
        default_panic(info);
    }));

    // Handle Ctrl+C gracefully
    ctrlc::set_handler(move || {
        let _ = console::Term::stderr().show_cursor();
        std::process::exit(130);
    })
    .ok();

    init_logging();

    let args = Args::parse();
    let workspace = Workspace::load(args.base_path, args.config, args.stub_dir)?;
    tracing::debug!(base_path = %workspace.base_path.display(), "workspace loaded");

    let result = match args.command {
        Command::New(new_args) => tui::new_package(&workspace, new_args.into()).await,
        Command::Register(NameArgs { name }) => tui::register(&workspace, &name).await,
        Command::Unregister(unregister_args) => {
            let args = UnregisterArgs {
                name: unregister_args.name,
                uninstall: unregister_args.uninstall,
                yes: unregister_args.yes,
            };
            tui::unregister(&workspace, args).await
        }
        Command::Remove(remove_args) => tui::remove(&workspace, &remove_args.name, remove_args.yes).await,
        Command::List => tui::list(&workspace),
    };

    // Ensure cursor is visible on normal exit
    let _ = console::Term::stderr().show_cursor();

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_new_args_conversion() {
        let args = Args::parse_from([
            "packager",
            "--base-path",
            "/srv/app",
            "new",
            "acme/billing",
            "--resources",
            "config,model",
            "--namespace",
            "Acme\\Billing",
            "--min-version",
            "5.8",
            "--install",
        ]);

        assert_eq!(args.base_path, Some(PathBuf::from("/srv/app")));
        let Command::New(new_args) = args.command else {
            panic!("expected the new command");
        };
        let new_args: NewArgs = new_args.into();
        assert_eq!(new_args.name, "acme/billing");
        assert_eq!(new_args.resources, vec!["config", "model"]);
        assert_eq!(new_args.info.namespace.as_deref(), Some("Acme\\Billing"));
        assert_eq!(new_args.min_version.as_deref(), Some("5.8"));
        assert!(new_args.install);
    }

    #[test]
    fn test_unregister_flags() {
        let args = Args::parse_from(["packager", "unregister", "acme/billing", "-u", "-y"]);
        let Command::Unregister(unregister) = args.command else {
            panic!("expected the unregister command");
        };
        assert!(unregister.uninstall);
        assert!(unregister.yes);
    }
}
