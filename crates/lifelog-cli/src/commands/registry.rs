use std::path::PathBuf;

use clap::Subcommand;
use lifelog_core::registry::{Origin, Registry, RoutingRule};
use lifelog_core::Config;

use super::{print_json, CliResult};

#[derive(Subcommand)]
pub enum RegistryAction {
    /// List buckets and summary groups
    Show,
    /// Validate a registry file (default: the configured one)
    Check {
        /// Registry TOML file
        path: Option<PathBuf>,
    },
}

fn describe_origin(origin: &Origin) -> String {
    match origin {
        Origin::Calendar { calendar } => format!("calendar '{calendar}'"),
        Origin::Collection {
            collection,
            date_property,
            ..
        } => format!("collection '{collection}' by '{date_property}'"),
    }
}

fn describe_routing(rule: &RoutingRule) -> String {
    match rule {
        RoutingRule::Direct { category } => format!("always {category}"),
        RoutingRule::PropertyValue {
            property, default, ..
        } => format!("by property '{property}', default {default}"),
        RoutingRule::ColorCode { default, .. } => format!("by color, default {default}"),
    }
}

fn print_human(registry: &Registry) {
    println!("Buckets:");
    for bucket in registry.buckets() {
        println!("  {:<14} {}", bucket.id, describe_origin(&bucket.origin));
    }
    println!("Groups:");
    for group in registry.groups() {
        let categories: Vec<&str> = group.categories.iter().map(|c| c.key.as_str()).collect();
        println!(
            "  {:<14} [{}] {} -> {}",
            group.id,
            group.buckets.join(", "),
            describe_routing(&group.routing),
            categories.join(", ")
        );
    }
}

pub fn run(action: RegistryAction, json: bool) -> CliResult {
    match action {
        RegistryAction::Show => {
            let registry = Config::load()?.registry()?;
            if json {
                print_json(&registry)?;
            } else {
                print_human(&registry);
            }
        }
        RegistryAction::Check { path } => {
            let registry = match path {
                Some(path) => Registry::load(&path)?,
                None => Config::load()?.registry()?,
            };
            println!(
                "ok: {} buckets, {} groups",
                registry.buckets().len(),
                registry.groups().len()
            );
        }
    }
    Ok(())
}
