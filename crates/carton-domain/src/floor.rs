//! Floor resolution across the authority hierarchy
//!
//! Constitutional and federal layers set a floor per topic. State-level
//! layers must either declare an equal-or-greater protection for each floor
//! topic or inherit the topic by reference. Topics the floor never addresses
//! are always permitted at the state level.
//!
//! Violations are reported, never corrected.

use crate::catalog::AuthorityCatalog;
use crate::layer::{LayerName, NodeLayers};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// A single breach of the floor invariant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FloorViolation {
    /// The state layers neither address nor inherit a floor topic
    Omitted {
        /// Topic tag
        topic: String,
        /// Floor protection level
        required_level: u8,
        /// Catalog ids establishing the floor
        floor_sources: Vec<String>,
    },

    /// The state layers address a floor topic at a lower protection level
    Weakened {
        /// Topic tag
        topic: String,
        /// Floor protection level
        required_level: u8,
        /// Highest level declared at the state level
        declared_level: u8,
        /// Catalog ids declared at the state level for this topic
        declared_by: Vec<String>,
    },
}

impl FloorViolation {
    /// Topic the violation concerns
    pub fn topic(&self) -> &str {
        match self {
            FloorViolation::Omitted { topic, .. } | FloorViolation::Weakened { topic, .. } => topic,
        }
    }
}

impl fmt::Display for FloorViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FloorViolation::Omitted {
                topic,
                required_level,
                floor_sources,
            } => write!(
                f,
                "Topic '{}' is neither addressed nor inherited; floor level {} set by {}",
                topic,
                required_level,
                floor_sources.join(", ")
            ),
            FloorViolation::Weakened {
                topic,
                required_level,
                declared_level,
                declared_by,
            } => write!(
                f,
                "Topic '{}' declared at level {} by {}, below floor level {}",
                topic,
                declared_level,
                declared_by.join(", "),
                required_level
            ),
        }
    }
}

/// Outcome of a floor check
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FloorCheckResult {
    /// True when no violations were found
    pub ok: bool,
    /// Floor topics examined
    pub topics_checked: Vec<String>,
    /// Violations, in topic order
    pub violations: Vec<FloorViolation>,
}

#[derive(Debug, Default)]
struct TopicLevel {
    level: u8,
    ids: Vec<String>,
}

/// Highest declared level per topic across the selected layers
fn topic_levels<'a>(
    layers: impl Iterator<Item = (&'a LayerName, &'a crate::layer::LayerContent)>,
    catalog: &AuthorityCatalog,
) -> BTreeMap<String, TopicLevel> {
    let mut out: BTreeMap<String, TopicLevel> = BTreeMap::new();
    for (_, content) in layers {
        for id in content.catalog_ids() {
            // Unknown ids are a referential problem, reported by the validator
            let Some(entry) = catalog.get(id) else {
                continue;
            };
            let slot = out.entry(entry.topic.clone()).or_default();
            slot.level = slot.level.max(entry.level);
            slot.ids.push(id.clone());
        }
    }
    out
}

/// Check a node's state layers against its own constitutional/federal layers
pub fn resolve_floor(layers: &NodeLayers, catalog: &AuthorityCatalog) -> FloorCheckResult {
    let floor = topic_levels(layers.iter().filter(|(name, _)| name.is_floor()), catalog);
    check_against(layers, floor, catalog)
}

/// Check a state node against its own floor layers and the baseline node's
///
/// The effective floor for a topic is the highest level either one declares.
pub fn resolve_floor_against(
    layers: &NodeLayers,
    baseline: &NodeLayers,
    catalog: &AuthorityCatalog,
) -> FloorCheckResult {
    let floor = topic_levels(
        layers
            .iter()
            .chain(baseline.iter())
            .filter(|(name, _)| name.is_floor()),
        catalog,
    );
    check_against(layers, floor, catalog)
}

fn check_against(
    layers: &NodeLayers,
    floor: BTreeMap<String, TopicLevel>,
    catalog: &AuthorityCatalog,
) -> FloorCheckResult {
    let state = topic_levels(layers.iter().filter(|(name, _)| !name.is_floor()), catalog);
    let inherited: BTreeSet<&String> = layers
        .iter()
        .filter(|(name, _)| !name.is_floor())
        .flat_map(|(_, content)| content.inherits.iter())
        .collect();

    let mut violations = Vec::new();
    for (topic, required) in &floor {
        if inherited.contains(topic) {
            continue;
        }
        match state.get(topic) {
            None => violations.push(FloorViolation::Omitted {
                topic: topic.clone(),
                required_level: required.level,
                floor_sources: dedup(&required.ids),
            }),
            Some(declared) if declared.level < required.level => {
                violations.push(FloorViolation::Weakened {
                    topic: topic.clone(),
                    required_level: required.level,
                    declared_level: declared.level,
                    declared_by: dedup(&declared.ids),
                })
            }
            Some(_) => {}
        }
    }

    FloorCheckResult {
        ok: violations.is_empty(),
        topics_checked: floor.keys().cloned().collect(),
        violations,
    }
}

fn dedup(ids: &[String]) -> Vec<String> {
    ids.iter().cloned().collect::<BTreeSet<_>>().into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CatalogEntry, EntryKind};
    use crate::layer::LayerContent;

    fn catalog() -> AuthorityCatalog {
        AuthorityCatalog::from_entries(
            "test",
            vec![
                CatalogEntry::new("CONST_4A_SEIZURE", LayerName::Constitutional, "search_and_seizure", 3, EntryKind::Constraint),
                CatalogEntry::new("FED_CAPTA", LayerName::Federal, "mandated_reporting", 2, EntryKind::Requirement),
                CatalogEntry::new("TX_WARRANT", LayerName::StateStatutory, "search_and_seizure", 4, EntryKind::Constraint),
                CatalogEntry::new("TX_CONSENT_ONLY", LayerName::StateStatutory, "search_and_seizure", 1, EntryKind::Constraint),
                CatalogEntry::new("TX_HOTLINE", LayerName::AdministrativeRule, "hotline_access", 1, EntryKind::Requirement),
            ],
        )
        .unwrap()
    }

    fn layer(ids: &[&str]) -> LayerContent {
        LayerContent {
            constraints_triggered: ids.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_equal_or_greater_protection_passes() {
        let mut layers = NodeLayers::new();
        layers.insert(LayerName::Constitutional, layer(&["CONST_4A_SEIZURE"]));
        layers.insert(LayerName::StateStatutory, layer(&["TX_WARRANT"]));
        let result = resolve_floor(&layers, &catalog());
        assert!(result.ok);
        assert_eq!(result.topics_checked, vec!["search_and_seizure".to_string()]);
    }

    #[test]
    fn test_weakened_protection_reported() {
        let mut layers = NodeLayers::new();
        layers.insert(LayerName::Constitutional, layer(&["CONST_4A_SEIZURE"]));
        layers.insert(LayerName::StateStatutory, layer(&["TX_CONSENT_ONLY"]));
        let result = resolve_floor(&layers, &catalog());
        assert!(!result.ok);
        assert!(matches!(
            &result.violations[0],
            FloorViolation::Weakened { required_level: 3, declared_level: 1, .. }
        ));
    }

    #[test]
    fn test_silent_omission_reported() {
        let mut layers = NodeLayers::new();
        layers.insert(LayerName::Federal, layer(&["FED_CAPTA"]));
        layers.insert(LayerName::AdministrativeRule, layer(&["TX_HOTLINE"]));
        let result = resolve_floor(&layers, &catalog());
        assert_eq!(result.violations.len(), 1);
        assert_eq!(result.violations[0].topic(), "mandated_reporting");
        assert!(result.violations[0]
            .to_string()
            .starts_with("Topic 'mandated_reporting' is neither addressed nor inherited; floor level"));
    }

    #[test]
    fn test_inherit_by_reference_satisfies_floor() {
        let mut layers = NodeLayers::new();
        layers.insert(LayerName::Federal, layer(&["FED_CAPTA"]));
        layers.insert(
            LayerName::StateStatutory,
            LayerContent {
                inherits: ["mandated_reporting".to_string()].into_iter().collect(),
                ..Default::default()
            },
        );
        assert!(resolve_floor(&layers, &catalog()).ok);
    }

    #[test]
    fn test_state_only_topic_is_permitted() {
        let mut layers = NodeLayers::new();
        layers.insert(LayerName::AdministrativeRule, layer(&["TX_HOTLINE"]));
        let result = resolve_floor(&layers, &catalog());
        assert!(result.ok);
        assert!(result.topics_checked.is_empty());
    }

    #[test]
    fn test_baseline_floor_applies_to_state_node() {
        let mut baseline = NodeLayers::new();
        baseline.insert(LayerName::Constitutional, layer(&["CONST_4A_SEIZURE"]));

        let mut state = NodeLayers::new();
        state.insert(LayerName::StateStatutory, layer(&["TX_CONSENT_ONLY"]));

        let result = resolve_floor_against(&state, &baseline, &catalog());
        assert_eq!(result.violations.len(), 1);
        assert_eq!(result.violations[0].topic(), "search_and_seizure");
    }
}
