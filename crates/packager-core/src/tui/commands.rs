//! Charm-style command output using cliclack

use crate::config::PackagerConfig;
use crate::fs::LocalFilesystem;
use crate::host::{target_version, LockFileVersion};
use crate::manager::{PackageEntry, PackageManager};
use crate::package::{validate_package_name, PackageBuilder, PackageInfo};
use crate::registry::ComposerRegistry;
use crate::resource::parse_resource_list;
use anyhow::{Context, Result};
use colored::Colorize;
use std::path::PathBuf;

/// Host project the commands operate on
#[derive(Debug, Clone)]
pub struct Workspace {
    pub base_path: PathBuf,
    pub config: PackagerConfig,
}

impl Workspace {
    /// Resolve the base path and load its config
    ///
    /// `stub_dir` overrides the configured stub root.
    pub fn load(
        base_path: Option<PathBuf>,
        config_file: Option<PathBuf>,
        stub_dir: Option<PathBuf>,
    ) -> Result<Self> {
        let current_dir = std::env::current_dir().context("Failed to read the current directory")?;
        let base_path = match base_path {
            Some(path) if path.is_absolute() => path,
            Some(path) => current_dir.join(path),
            None => current_dir,
        };

        let mut config = PackagerConfig::discover(config_file.as_deref(), &base_path)
            .context("Failed to load packager config")?;
        if let Some(stub_dir) = stub_dir {
            config.stub_path = Some(stub_dir);
        }

        Ok(Self { base_path, config })
    }

    fn manager(&self) -> PackageManager<'static, LocalFilesystem, ComposerRegistry> {
        static FS: LocalFilesystem = LocalFilesystem;
        PackageManager::new(
            &FS,
            ComposerRegistry::from_config(&self.base_path, &self.config),
            self.config.clone(),
            &self.base_path,
        )
    }
}

/// Arguments of `packager new`
#[derive(Debug, Clone, Default)]
pub struct NewArgs {
    pub name: String,
    pub info: PackageInfo,
    /// Resource tags; `all` selects every kind
    pub resources: Vec<String>,
    pub min_version: Option<String>,
    pub install: bool,
}

/// Arguments of `packager unregister`
#[derive(Debug, Clone, Default)]
pub struct UnregisterArgs {
    pub name: String,
    pub uninstall: bool,
    pub yes: bool,
}

fn confirm(yes: bool) -> Result<bool> {
    if yes {
        return Ok(true);
    }
    Ok(cliclack::confirm("Are you sure?").initial_value(false).interact()?)
}

/// Create a package and register it with the host project
pub async fn new_package(workspace: &Workspace, args: NewArgs) -> Result<()> {
    cliclack::intro(format!("New package {}", args.name.bold()))?;

    let mut builder = PackageBuilder::new(&args.name)?;
    args.info.apply(&mut builder, &workspace.config.suggestions)?;
    let resources = parse_resource_list(&args.resources)?;
    if !resources.is_empty() {
        let tags: Vec<&str> = resources.iter().map(|r| r.tag()).collect();
        cliclack::log::info(format!("Resources: {}", tags.join(", ")))?;
    }
    builder.set_resources(resources);

    let minimum_version = target_version(
        args.min_version.as_deref(),
        workspace.config.minimum_version.as_deref(),
        &LockFileVersion::new(&workspace.base_path),
    )
    .context("Could not determine the framework version to target (use --min-version)")?;
    cliclack::log::info(format!("Targeting framework {}", minimum_version))?;

    let manager = workspace.manager();
    let spinner = cliclack::spinner();
    spinner.start("Creating the package...");

    let creation = match manager.create(builder, &minimum_version).await {
        Ok(creation) => creation,
        Err(e) => {
            spinner.error("The process encountered an error");
            return Err(e.into());
        }
    };

    spinner.stop(format!(
        "Created {} files in {}",
        creation.package.files.len(),
        creation.package.storage.display()
    ));

    if !creation.registered {
        cliclack::log::warning("The package could not be registered to the application repositories")?;
    }

    if args.install {
        let spinner = cliclack::spinner();
        spinner.start("Installing the package...");
        if manager.install(&args.name).await? {
            spinner.stop("Installed");
            cliclack::outro("Your package has been created and installed successfully.")?;
        } else {
            spinner.error("Installation failed");
            cliclack::outro(
                "Your package was created successfully but there was an error during the installation process."
                    .yellow(),
            )?;
        }
        return Ok(());
    }

    cliclack::log::info(format!(
        "You can install your package using the command: {}",
        format!("composer require {}", args.name).cyan()
    ))?;
    cliclack::outro("Your package has been created successfully.")?;
    Ok(())
}

/// Register an existing package with the host project
pub async fn register(workspace: &Workspace, name: &str) -> Result<()> {
    cliclack::intro(format!("Register {}", name.bold()))?;
    validate_package_name(name)?;

    let manager = workspace.manager();
    if !manager.exists(name)? {
        anyhow::bail!("This package does not exist.");
    }

    let spinner = cliclack::spinner();
    spinner.start("Registering the package...");
    if !manager.register(name).await? {
        spinner.error("Registration failed");
        anyhow::bail!("The process encountered an error.");
    }
    spinner.stop("Registered");

    cliclack::outro("Your package has been registered successfully.")?;
    Ok(())
}

/// Unregister a package, uninstalling it first when asked to
pub async fn unregister(workspace: &Workspace, args: UnregisterArgs) -> Result<()> {
    cliclack::intro(format!("Unregister {}", args.name.bold()))?;
    validate_package_name(&args.name)?;

    let manager = workspace.manager();
    let status = manager.install_status(&args.name)?;

    if status.installed {
        if !status.required_by.is_empty() {
            anyhow::bail!(
                "This package cannot be unregistered because it is required by: {}",
                status.required_by.join(", ")
            );
        }
        if !args.uninstall {
            cliclack::log::remark(format!(
                "Run \"composer remove {}\" first, or pass --uninstall",
                args.name
            ))?;
            anyhow::bail!("This package has been installed into your application.");
        }
    }

    if !confirm(args.yes)? {
        cliclack::outro_cancel("Your request has been canceled.")?;
        return Ok(());
    }

    if status.installed {
        let spinner = cliclack::spinner();
        spinner.start("Uninstalling the package...");
        if !manager.uninstall(&args.name).await? {
            spinner.error("Uninstall failed");
            anyhow::bail!("The process encountered an error.");
        }
        spinner.stop("Uninstalled");
    }

    let spinner = cliclack::spinner();
    spinner.start("Unregistering the package...");
    if !manager.unregister(&args.name).await? {
        spinner.error("Unregister failed");
        anyhow::bail!("The process encountered an error.");
    }
    spinner.stop("Unregistered");

    cliclack::outro("Your package has been unregistered successfully.")?;
    Ok(())
}

/// Unregister a package and delete its files
pub async fn remove(workspace: &Workspace, name: &str, yes: bool) -> Result<()> {
    cliclack::intro(format!("Remove {}", name.bold()))?;
    validate_package_name(name)?;

    let manager = workspace.manager();
    if manager.install_status(name)?.installed {
        cliclack::log::remark(format!("Run \"composer remove {}\" first", name))?;
        anyhow::bail!("This package has been installed into your application.");
    }

    let storage = manager.storage_path(name)?;
    cliclack::log::warning(format!("This deletes {}", storage.display()))?;
    if !confirm(yes)? {
        cliclack::outro_cancel("Your request has been canceled.")?;
        return Ok(());
    }

    let spinner = cliclack::spinner();
    spinner.start("Removing the package...");
    manager.remove(name).await?;
    spinner.stop("Removed");

    cliclack::outro("Your package has been removed successfully.")?;
    Ok(())
}

/// Print every local package as a table
pub fn list(workspace: &Workspace) -> Result<()> {
    let packages = workspace.manager().all()?;

    match packages.len() {
        0 => {
            println!("{}", "You don't have any packages.".green());
            return Ok(());
        }
        1 => println!("{}", "You have one package as follow:".green()),
        n => println!("{}", format!("You have {} packages as follow:", n).green()),
    }
    println!();
    print!("{}", render_table(&packages));
    Ok(())
}

fn flag(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "-"
    }
}

fn render_table(packages: &[PackageEntry]) -> String {
    let header = ["Package Name", "Package Path (from the base path)", "Registered?", "Installed?"];
    let rows: Vec<[String; 4]> = packages
        .iter()
        .map(|p| {
            [
                p.name.clone(),
                p.path.clone(),
                flag(p.registered).to_string(),
                flag(p.installed).to_string(),
            ]
        })
        .collect();

    let mut widths = header.map(str::len);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.len());
        }
    }

    let line = |cells: [&str; 4]| -> String {
        let padded: Vec<String> = cells
            .iter()
            .zip(widths)
            .map(|(cell, width)| format!("{:<width$}", cell, width = width))
            .collect();
        format!("  {}\n", padded.join("  ").trim_end())
    };

    let mut out = line(header).bold().to_string();
    for row in &rows {
        out.push_str(&line([&row[0], &row[1], &row[2], &row[3]]));
    }
    out
}
