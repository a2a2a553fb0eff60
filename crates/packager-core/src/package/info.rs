//! Information entries of a new package, with suggested defaults

use super::{case, validate_namespace, PackageBuilder, PackageNames};
use crate::config::Suggestions;
use crate::error::Result;

const SUGGESTED_KEYWORDS: &str = "example, key, words";
const SUGGESTED_LICENSE: &str = "MIT";

/// Information given for a new package; `None` entries are suggested
#[derive(Debug, Clone, Default)]
pub struct PackageInfo {
    pub author_name: Option<String>,
    pub author_email: Option<String>,
    pub description: Option<String>,
    pub keywords: Option<String>,
    pub license: Option<String>,
    pub homepage: Option<String>,
    /// Namespace prefix, `Vendor\Project` by default
    pub namespace: Option<String>,
    /// Directory under `src` holding namespaced code, `src` itself by default
    pub namespace_directory: Option<String>,
}

fn given(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

impl PackageInfo {
    /// Fill every missing entry from `suggestions` or from the package name
    pub fn resolve(&self, names: &PackageNames, suggestions: &Suggestions) -> Result<Vec<(&'static str, String)>> {
        let author_name = given(&self.author_name)
            .or_else(|| given(&suggestions.author_name))
            .unwrap_or_else(|| case::title(&names.slug_vendor().replace('-', " ")));
        let author_email = given(&self.author_email)
            .or_else(|| given(&suggestions.author_email))
            .unwrap_or_else(|| format!("{}@{}.com", names.lower_vendor(), names.lower_project()));
        let description = given(&self.description)
            .unwrap_or_else(|| format!("The {}", case::title(&names.slug_project().replace('-', " "))));
        let keywords = given(&self.keywords).unwrap_or_else(|| SUGGESTED_KEYWORDS.to_string());
        let license = given(&self.license)
            .or_else(|| given(&suggestions.license))
            .unwrap_or_else(|| SUGGESTED_LICENSE.to_string());
        let homepage = given(&self.homepage)
            .unwrap_or_else(|| format!("https://{}.com", names.lower_project()));
        let namespace = match given(&self.namespace) {
            Some(namespace) => validate_namespace(&namespace)?,
            None => names.default_namespace(),
        };
        let namespace_directory = given(&self.namespace_directory)
            .map(|dir| {
                let dir = dir.replace('\\', "/");
                let dir = dir.trim_matches('/');
                match dir {
                    "src" => String::new(),
                    dir => dir.strip_prefix("src/").unwrap_or(dir).trim_matches('/').to_string(),
                }
            })
            .unwrap_or_default();

        Ok(vec![
            ("author_name", author_name),
            ("author_email", author_email),
            ("description", description),
            ("keywords", keywords),
            ("license", license),
            ("homepage", homepage),
            ("namespace", namespace),
            ("namespace_directory", namespace_directory),
        ])
    }

    /// Resolve and set every entry on `builder`
    pub fn apply(&self, builder: &mut PackageBuilder, suggestions: &Suggestions) -> Result<()> {
        for (key, value) in self.resolve(builder.names(), suggestions)? {
            builder.set_information(key, value);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PackagerError;

    #[test]
    fn test_suggestions_from_name() {
        let mut builder = PackageBuilder::new("jackie-do/user-billing").unwrap();
        PackageInfo::default()
            .apply(&mut builder, &Suggestions::default())
            .unwrap();
        let package = builder.lock();

        assert_eq!(package.field("author_name").unwrap(), "Jackie Do");
        assert_eq!(package.field("author_email").unwrap(), "jackiedo@userbilling.com");
        assert_eq!(package.field("description").unwrap(), "The User Billing");
        assert_eq!(package.field("keywords").unwrap(), "example, key, words");
        assert_eq!(package.field("license").unwrap(), "MIT");
        assert_eq!(package.field("homepage").unwrap(), "https://userbilling.com");
        assert_eq!(package.namespace(), "JackieDo\\UserBilling");
        assert_eq!(package.namespace_directory(), "");
        assert_eq!(package.author(), "Jackie Do <jackiedo@userbilling.com>");
    }

    #[test]
    fn test_configured_suggestions_and_given_values() {
        let suggestions = Suggestions {
            author_name: Some("Acme Team".to_string()),
            author_email: Some("dev@acme.test".to_string()),
            license: Some("Apache-2.0".to_string()),
        };
        let info = PackageInfo {
            author_name: Some("Jane".to_string()),
            namespace: Some("\\Acme\\Pay\\".to_string()),
            namespace_directory: Some("src/Acme/Pay/".to_string()),
            ..PackageInfo::default()
        };

        let mut builder = PackageBuilder::new("acme/billing").unwrap();
        info.apply(&mut builder, &suggestions).unwrap();
        let package = builder.lock();

        assert_eq!(package.author(), "Jane <dev@acme.test>");
        assert_eq!(package.field("license").unwrap(), "Apache-2.0");
        assert_eq!(package.namespace(), "Acme\\Pay");
        assert_eq!(package.namespace_directory(), "Acme/Pay");
    }

    #[test]
    fn test_invalid_namespace() {
        let info = PackageInfo {
            namespace: Some("Acme/Pay".to_string()),
            ..PackageInfo::default()
        };
        let mut builder = PackageBuilder::new("acme/billing").unwrap();
        assert!(matches!(
            info.apply(&mut builder, &Suggestions::default()),
            Err(PackagerError::InvalidNamespace(_))
        ));
    }
}
