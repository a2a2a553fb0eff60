//! Package descriptor: the in-memory record of the package being generated
//!
//! A package is described through a [`PackageBuilder`] and frozen with
//! [`PackageBuilder::lock`]. The resulting [`Package`] has no setters, so
//! information cannot change once creation starts.

pub mod case;
pub mod info;
pub mod name;

use crate::error::{PackagerError, Result};
use crate::resource::ResourceKind;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

pub use info::PackageInfo;
pub use name::{split_package_name, validate_namespace, validate_package_name};

/// Keys derived from the package name; never overwritten by `set_information`
const RESERVED_KEYS: [&str; 3] = ["name", "vendor", "project"];

/// A free-form information value
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum InfoValue {
    Text(String),
    List(Vec<String>),
}

impl fmt::Display for InfoValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InfoValue::Text(text) => write!(f, "{}", text),
            InfoValue::List(items) => write!(f, "{}", items.join(", ")),
        }
    }
}

impl From<&str> for InfoValue {
    fn from(value: &str) -> Self {
        InfoValue::Text(value.to_string())
    }
}

impl From<String> for InfoValue {
    fn from(value: String) -> Self {
        InfoValue::Text(value)
    }
}

/// Name segments plus every form derived from them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageNames {
    name: String,
    vendor: String,
    project: String,
}

impl PackageNames {
    fn parse(name: &str) -> Result<Self> {
        let (vendor, project) = split_package_name(name)?;
        Ok(Self {
            name: name.to_string(),
            vendor: vendor.to_string(),
            project: project.to_string(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn vendor(&self) -> String {
        case::studly(&self.vendor)
    }

    pub fn project(&self) -> String {
        case::studly(&self.project)
    }

    pub fn slug_vendor(&self) -> String {
        case::kebab(&self.vendor())
    }

    pub fn slug_project(&self) -> String {
        case::kebab(&self.project())
    }

    pub fn snake_vendor(&self) -> String {
        case::snake(&self.vendor())
    }

    pub fn snake_project(&self) -> String {
        case::snake(&self.project())
    }

    pub fn camel_vendor(&self) -> String {
        case::camel(&self.vendor())
    }

    pub fn camel_project(&self) -> String {
        case::camel(&self.project())
    }

    pub fn lower_vendor(&self) -> String {
        self.vendor().to_lowercase()
    }

    pub fn lower_project(&self) -> String {
        self.project().to_lowercase()
    }

    pub fn upper_vendor(&self) -> String {
        self.vendor().to_uppercase()
    }

    pub fn upper_project(&self) -> String {
        self.project().to_uppercase()
    }

    pub fn title_vendor(&self) -> String {
        case::title(&self.vendor())
    }

    pub fn title_project(&self) -> String {
        case::title(&self.project())
    }

    /// Default namespace prefix: `Vendor\Project`
    pub fn default_namespace(&self) -> String {
        format!("{}\\{}", self.vendor(), self.project())
    }
}

/// Mutable package description, consumed by [`PackageBuilder::lock`]
#[derive(Debug, Clone)]
pub struct PackageBuilder {
    names: PackageNames,
    information: BTreeMap<String, InfoValue>,
    resources: Vec<ResourceKind>,
}

impl PackageBuilder {
    /// Start describing the package `vendor/project`
    pub fn new(name: &str) -> Result<Self> {
        Ok(Self {
            names: PackageNames::parse(name)?,
            information: BTreeMap::new(),
            resources: Vec::new(),
        })
    }

    pub fn names(&self) -> &PackageNames {
        &self.names
    }

    /// Set one information entry
    ///
    /// `keywords` is split on commas. The name-derived keys are ignored.
    pub fn set_information(&mut self, key: &str, value: impl Into<InfoValue>) -> &mut Self {
        if RESERVED_KEYS.contains(&key) {
            return self;
        }

        let value = match (key, value.into()) {
            ("keywords", InfoValue::Text(text)) => InfoValue::List(
                text.split(',')
                    .map(str::trim)
                    .filter(|k| !k.is_empty())
                    .map(str::to_string)
                    .collect(),
            ),
            (_, value) => value,
        };

        self.information.insert(key.to_string(), value);
        self
    }

    /// Set the resource kinds to generate; duplicates are dropped, first wins
    pub fn set_resources(&mut self, resources: impl IntoIterator<Item = ResourceKind>) -> &mut Self {
        self.resources.clear();
        for kind in resources {
            if !self.resources.contains(&kind) {
                self.resources.push(kind);
            }
        }
        self
    }

    /// Freeze the description
    pub fn lock(self) -> Package {
        Package {
            names: self.names,
            information: self.information,
            resources: self.resources,
        }
    }
}

/// Immutable package description used by the creator
#[derive(Debug, Clone)]
pub struct Package {
    names: PackageNames,
    information: BTreeMap<String, InfoValue>,
    resources: Vec<ResourceKind>,
}

impl std::ops::Deref for Package {
    type Target = PackageNames;

    fn deref(&self) -> &Self::Target {
        &self.names
    }
}

impl Package {
    pub fn resources(&self) -> &[ResourceKind] {
        &self.resources
    }

    pub fn has_resource(&self, kind: ResourceKind) -> bool {
        self.resources.contains(&kind)
    }

    pub fn namespace(&self) -> String {
        match self.information.get("namespace") {
            Some(value) => value.to_string(),
            None => self.default_namespace(),
        }
    }

    pub fn addslashed_namespace(&self) -> String {
        self.namespace().replace('\\', "\\\\")
    }

    /// Directory under `src` holding namespaced code; empty means `src` itself
    pub fn namespace_directory(&self) -> String {
        self.information
            .get("namespace_directory")
            .map(|value| value.to_string().trim().to_string())
            .unwrap_or_default()
    }

    /// `Author Name <author@example.com>`
    pub fn author(&self) -> String {
        let name = self.original("author_name").map(|v| v.to_string());
        let email = self
            .original("author_email")
            .map(|v| v.to_string())
            .filter(|e| !e.is_empty())
            .map(|e| format!("<{}>", e));

        format!("{} {}", name.unwrap_or_default(), email.unwrap_or_default())
            .trim()
            .to_string()
    }

    /// Raw information entry
    pub fn original(&self, key: &str) -> Option<&InfoValue> {
        self.information.get(key)
    }

    /// Resolve a field by name, as used by the `@package` directive
    pub fn field(&self, field: &str) -> Result<String> {
        let value = match field {
            "name" => self.name().to_string(),
            "vendor" => self.vendor(),
            "project" => self.project(),
            "slug_vendor" => self.slug_vendor(),
            "slug_project" => self.slug_project(),
            "snake_vendor" => self.snake_vendor(),
            "snake_project" => self.snake_project(),
            "camel_vendor" => self.camel_vendor(),
            "camel_project" => self.camel_project(),
            "lower_vendor" => self.lower_vendor(),
            "lower_project" => self.lower_project(),
            "upper_vendor" => self.upper_vendor(),
            "upper_project" => self.upper_project(),
            "title_vendor" => self.title_vendor(),
            "title_project" => self.title_project(),
            "namespace" => self.namespace(),
            "addslashed_namespace" => self.addslashed_namespace(),
            "namespace_directory" => self.namespace_directory(),
            "author" => self.author(),
            other => self
                .information
                .get(other)
                .map(InfoValue::to_string)
                .ok_or_else(|| PackagerError::LookupError(other.to_string()))?,
        };
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn billing() -> Package {
        let mut builder = PackageBuilder::new("acme/user-billing").unwrap();
        builder
            .set_information("author_name", "Jane Doe")
            .set_information("author_email", "jane@acme.test")
            .set_information("keywords", "billing, invoices ,, payments")
            .set_information("vendor", "ignored");
        builder.lock()
    }

    #[test]
    fn test_derived_forms() {
        let package = billing();
        assert_eq!(package.vendor(), "Acme");
        assert_eq!(package.project(), "UserBilling");
        assert_eq!(package.slug_project(), "user-billing");
        assert_eq!(package.snake_project(), "user_billing");
        assert_eq!(package.camel_project(), "userBilling");
        assert_eq!(package.lower_project(), "userbilling");
        assert_eq!(package.upper_vendor(), "ACME");
        assert_eq!(package.title_project(), "Userbilling");
        assert_eq!(package.name(), "acme/user-billing");
    }

    #[test]
    fn test_studly_keeps_inner_capitals() {
        let package = PackageBuilder::new("acme/PDFparser").unwrap().lock();
        assert_eq!(package.project(), "PDFparser");
        assert_eq!(package.namespace(), "Acme\\PDFparser");
        assert_eq!(package.field("project").unwrap(), "PDFparser");
    }

    #[test]
    fn test_derived_forms_are_stable() {
        let package = billing();
        for field in ["vendor", "snake_project", "camel_vendor", "title_project"] {
            assert_eq!(package.field(field).unwrap(), package.field(field).unwrap());
        }
    }

    #[test]
    fn test_namespace_defaults_and_overrides() {
        let package = billing();
        assert_eq!(package.namespace(), "Acme\\UserBilling");
        assert_eq!(package.addslashed_namespace(), "Acme\\\\UserBilling");
        assert_eq!(package.namespace_directory(), "");

        let mut builder = PackageBuilder::new("acme/billing").unwrap();
        builder.set_information("namespace", "Acme\\Billing");
        assert_eq!(builder.lock().field("namespace").unwrap(), "Acme\\Billing");
    }

    #[test]
    fn test_author_and_keywords() {
        let package = billing();
        assert_eq!(package.author(), "Jane Doe <jane@acme.test>");
        assert_eq!(
            package.original("keywords"),
            Some(&InfoValue::List(vec![
                "billing".to_string(),
                "invoices".to_string(),
                "payments".to_string()
            ]))
        );
        assert_eq!(package.field("keywords").unwrap(), "billing, invoices, payments");
    }

    #[test]
    fn test_reserved_keys_are_ignored() {
        assert_eq!(billing().field("vendor").unwrap(), "Acme");
    }

    #[test]
    fn test_unknown_field_is_lookup_error() {
        assert!(matches!(
            billing().field("favourite_color"),
            Err(PackagerError::LookupError(field)) if field == "favourite_color"
        ));
    }

    #[test]
    fn test_resources_deduplicated_in_order() {
        let mut builder = PackageBuilder::new("acme/billing").unwrap();
        builder.set_resources([
            ResourceKind::Model,
            ResourceKind::Config,
            ResourceKind::Model,
        ]);
        let package = builder.lock();
        assert_eq!(package.resources(), &[ResourceKind::Model, ResourceKind::Config]);
        assert!(package.has_resource(ResourceKind::Config));
        assert!(!package.has_resource(ResourceKind::View));
    }

    #[test]
    fn test_invalid_name_rejected() {
        assert!(matches!(
            PackageBuilder::new("not-a-package"),
            Err(PackagerError::InvalidName { .. })
        ));
    }
}
