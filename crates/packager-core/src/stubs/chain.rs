//! Version-compatible stub folder selection

use crate::error::{PackagerError, Result};
use semver::Version;

/// Folder used when no versioned folder has the requested stub
pub const DEFAULT_FOLDER: &str = "default";

/// Ordered stub folders: newest compatible version first, `default` last
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateChain {
    folders: Vec<String>,
}

impl TemplateChain {
    /// Build the lookup chain for `minimum` (`MAJOR.MINOR`)
    ///
    /// Folder names are `<prefix>MAJOR.MINOR`; names that do not parse are
    /// skipped, as are versions newer than `minimum`.
    pub fn resolve<I, S>(folders: I, prefix: &str, minimum: &str) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let limit = parse_thread_version(minimum)?;

        let mut versioned: Vec<(Version, String)> = folders
            .into_iter()
            .filter_map(|name| {
                let name = name.as_ref();
                folder_version(name, prefix).map(|version| (version, name.to_string()))
            })
            .filter(|(version, _)| *version <= limit)
            .collect();

        versioned.sort_by(|a, b| b.0.cmp(&a.0));

        let mut folders: Vec<String> = versioned.into_iter().map(|(_, name)| name).collect();
        folders.push(DEFAULT_FOLDER.to_string());

        Ok(Self { folders })
    }

    /// Chain holding only the default folder
    pub fn default_only() -> Self {
        Self {
            folders: vec![DEFAULT_FOLDER.to_string()],
        }
    }

    pub fn folders(&self) -> &[String] {
        &self.folders
    }
}

/// Version encoded in a stub folder name, if it is exactly `MAJOR.MINOR`
fn folder_version(name: &str, prefix: &str) -> Option<Version> {
    let raw = name.strip_prefix(prefix).unwrap_or(name);
    let (major, minor) = raw.split_once('.')?;
    if major.is_empty()
        || minor.is_empty()
        || !major.bytes().all(|b| b.is_ascii_digit())
        || !minor.bytes().all(|b| b.is_ascii_digit())
    {
        return None;
    }
    Some(Version::new(major.parse().ok()?, minor.parse().ok()?, 0))
}

/// Parse `MAJOR.MINOR` (a trailing patch component is ignored)
pub fn parse_thread_version(version: &str) -> Result<Version> {
    let invalid = || PackagerError::InvalidVersion(version.to_string());
    let cleaned = version.trim();
    let cleaned = cleaned.strip_prefix('v').unwrap_or(cleaned);

    let mut parts = cleaned.splitn(3, '.');
    let major = parts.next().ok_or_else(invalid)?;
    let minor = parts.next().ok_or_else(invalid)?;

    let major: u64 = major.parse().map_err(|_| invalid())?;
    let minor: u64 = minor.parse().map_err(|_| invalid())?;

    if let Some(patch) = parts.next() {
        Version::parse(&format!("{}.{}.{}", major, minor, patch)).map_err(|_| invalid())?;
    }

    Ok(Version::new(major, minor, 0))
}

/// Release thread of a full framework version
///
/// From major 6 onwards every minor belongs to the `MAJOR.0` thread;
/// before that the thread is `MAJOR.MINOR`.
pub fn thread_version(full_version: &str) -> Result<String> {
    let version = parse_thread_version(full_version)?;
    if version.major >= 6 {
        Ok(format!("{}.0", version.major))
    } else {
        Ok(format!("{}.{}", version.major, version.minor))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_filters_and_orders() {
        let chain = TemplateChain::resolve(["1.0", "3.0", "default", "2.0"], "", "2.5").unwrap();
        assert_eq!(chain.folders(), &["2.0", "1.0", "default"]);
    }

    #[test]
    fn test_chain_compares_numerically() {
        let chain = TemplateChain::resolve(
            ["laravel_5.2", "laravel_5.10", "laravel_10.0", "laravel_9.0"],
            "laravel_",
            "9.0",
        )
        .unwrap();
        assert_eq!(
            chain.folders(),
            &["laravel_9.0", "laravel_5.10", "laravel_5.2", "default"]
        );
    }

    #[test]
    fn test_chain_skips_unparseable_folders() {
        let chain =
            TemplateChain::resolve(["laravel_5", "pieces", "laravel_5.x", "laravel_4.2"], "laravel_", "5.0")
                .unwrap();
        assert_eq!(chain.folders(), &["laravel_4.2", "default"]);
    }

    #[test]
    fn test_chain_always_has_default() {
        let chain = TemplateChain::resolve(["7.0", "8.0"], "", "5.0").unwrap();
        assert_eq!(chain.folders(), &["default"]);

        let empty: [&str; 0] = [];
        assert_eq!(TemplateChain::resolve(empty, "", "1.0").unwrap(), TemplateChain::default_only());
    }

    #[test]
    fn test_invalid_minimum_version() {
        assert!(matches!(
            TemplateChain::resolve(["1.0"], "", "five"),
            Err(PackagerError::InvalidVersion(_))
        ));
        assert!(parse_thread_version("5").is_err());
        assert!(parse_thread_version("5.8.x").is_err());
    }

    #[test]
    fn test_thread_version() {
        assert_eq!(thread_version("5.8.35").unwrap(), "5.8");
        assert_eq!(thread_version("v10.48.4").unwrap(), "10.0");
        assert_eq!(thread_version("6.2").unwrap(), "6.0");
    }
}
