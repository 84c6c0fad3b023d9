//! Source registry.
//!
//! Declares the atomic buckets events come from, the summary groups that
//! combine buckets into reportable line items, and the routing rule each group
//! uses to pick a category. The registry is a plain value: it is built once
//! (from TOML or in code), validated, and handed to the components that need
//! it behind an `Arc`.

pub mod categorizer;
pub mod types;

use std::collections::{BTreeSet, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub use categorizer::Categorizer;
pub use types::{
    Bucket, Category, CategoryKey, Measure, MetricSpec, Origin, RoutingRule, SummaryGroup,
    ValueKind, CATEGORY_PLACEHOLDER,
};

const BUILTIN_REGISTRY: &str = include_str!("builtin.toml");

/// Validated set of buckets and summary groups.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Registry {
    buckets: Vec<Bucket>,
    groups: Vec<SummaryGroup>,
}

#[derive(Deserialize)]
struct RegistryFile {
    #[serde(default, rename = "bucket")]
    buckets: Vec<Bucket>,
    #[serde(default, rename = "group")]
    groups: Vec<SummaryGroup>,
}

impl Registry {
    /// Build and validate a registry.
    pub fn new(buckets: Vec<Bucket>, groups: Vec<SummaryGroup>) -> Result<Self, ConfigError> {
        validate(&buckets, &groups)?;
        Ok(Self { buckets, groups })
    }

    /// Parse a registry from TOML (`[[bucket]]` and `[[group]]` tables).
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let file: RegistryFile = toml::from_str(content)?;
        Self::new(file.buckets, file.groups)
    }

    /// Load a registry file from disk.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::LoadFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::from_toml_str(&content)
    }

    /// The registry shipped with the binary.
    pub fn builtin() -> Result<Self, ConfigError> {
        Self::from_toml_str(BUILTIN_REGISTRY)
    }

    pub fn buckets(&self) -> &[Bucket] {
        &self.buckets
    }

    pub fn groups(&self) -> &[SummaryGroup] {
        &self.groups
    }

    pub fn bucket(&self, id: &str) -> Option<&Bucket> {
        self.buckets.iter().find(|b| b.id == id)
    }

    pub fn group(&self, id: &str) -> Option<&SummaryGroup> {
        self.groups.iter().find(|g| g.id == id)
    }

    /// Groups named by `ids`, in registry order. An empty list selects all.
    pub fn select(&self, ids: &[String]) -> Result<Vec<&SummaryGroup>, ConfigError> {
        if ids.is_empty() {
            return Ok(self.groups.iter().collect());
        }
        if let Some(unknown) = ids.iter().find(|id| self.group(id).is_none()) {
            return Err(ConfigError::InvalidValue {
                key: "groups".to_string(),
                message: format!("unknown summary group '{unknown}'"),
            });
        }
        Ok(self
            .groups
            .iter()
            .filter(|g| ids.iter().any(|id| id == &g.id))
            .collect())
    }

    /// Distinct buckets feeding `groups`, in registry order.
    pub fn buckets_for(&self, groups: &[&SummaryGroup]) -> Vec<&Bucket> {
        let wanted: HashSet<&str> = groups
            .iter()
            .flat_map(|g| g.buckets.iter().map(String::as_str))
            .collect();
        self.buckets
            .iter()
            .filter(|b| wanted.contains(b.id.as_str()))
            .collect()
    }
}

fn registry_error(message: impl Into<String>) -> ConfigError {
    ConfigError::Registry(message.into())
}

fn validate(buckets: &[Bucket], groups: &[SummaryGroup]) -> Result<(), ConfigError> {
    let mut bucket_ids = HashSet::new();
    for bucket in buckets {
        if !bucket_ids.insert(bucket.id.as_str()) {
            return Err(registry_error(format!("duplicate bucket '{}'", bucket.id)));
        }
    }

    let mut group_ids = HashSet::new();
    let mut category_keys = HashSet::new();
    let mut output_keys = BTreeSet::new();

    for group in groups {
        if !group_ids.insert(group.id.as_str()) {
            return Err(registry_error(format!("duplicate group '{}'", group.id)));
        }
        if group.buckets.is_empty() {
            return Err(registry_error(format!("group '{}' has no buckets", group.id)));
        }
        if let Some(unknown) = group.buckets.iter().find(|b| !bucket_ids.contains(b.as_str())) {
            return Err(registry_error(format!(
                "group '{}' references unknown bucket '{unknown}'",
                group.id
            )));
        }
        if group.categories.is_empty() {
            return Err(registry_error(format!(
                "group '{}' declares no categories",
                group.id
            )));
        }
        for category in &group.categories {
            if !category_keys.insert(category.key.as_str()) {
                return Err(registry_error(format!(
                    "category '{}' is declared by more than one group",
                    category.key
                )));
            }
        }
        for target in group.routing.targets() {
            if group.category(target).is_none() {
                return Err(registry_error(format!(
                    "group '{}' routes to '{target}', which is not one of its categories",
                    group.id
                )));
            }
        }
        for metric in &group.metrics {
            for category in &group.categories {
                let key = metric.output_key_for(category);
                if !output_keys.insert(key.clone()) {
                    return Err(registry_error(format!("duplicate output key '{key}'")));
                }
            }
        }
    }
    Ok(())
}
