//! Routing of raw events into categories.

use std::sync::Arc;

use super::types::{CategoryKey, RoutingRule, SummaryGroup};
use super::Registry;
use crate::events::{RawEvent, SourceEvent};

/// Maps raw events to category keys using a group's routing rule.
///
/// Categorization never fails. Events are user-edited upstream and can carry
/// legacy or malformed signals at any time; anything that does not match a
/// table entry lands in the group's default category.
#[derive(Debug, Clone)]
pub struct Categorizer {
    registry: Arc<Registry>,
}

impl Categorizer {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Category for `event` within `group`.
    pub fn categorize(&self, event: &RawEvent, group: &SummaryGroup) -> CategoryKey {
        let key = match &group.routing {
            RoutingRule::Direct { category } => category,
            RoutingRule::PropertyValue {
                property,
                table,
                default,
            } => event
                .properties
                .get(property)
                .and_then(|value| table.get(value.as_str()))
                .unwrap_or(default),
            RoutingRule::ColorCode { table, default } => event
                .color_id
                .as_deref()
                .and_then(|code| table.get(code))
                .unwrap_or(default),
        };
        key.clone()
    }

    /// Categorize every event of `group`'s buckets.
    pub fn categorize_all<'a>(
        &self,
        group: &SummaryGroup,
        events: impl IntoIterator<Item = &'a RawEvent>,
    ) -> Vec<SourceEvent> {
        events
            .into_iter()
            .map(|event| {
                let category = self.categorize(event, group);
                event.clone().into_source_event(category)
            })
            .collect()
    }
}
