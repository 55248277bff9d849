//! Authority layers - the vertical axis of the decision matrix

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// One rung of the authority hierarchy, ordered from highest to lowest
///
/// A lower layer may add protections but must never weaken a higher one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerName {
    /// U.S. Constitution
    Constitutional,
    /// Federal statute and regulation
    Federal,
    /// State constitution
    StateConstitutional,
    /// State statute
    StateStatutory,
    /// State administrative rule
    AdministrativeRule,
    /// Case law
    CaseLaw,
}

impl LayerName {
    /// All layers in authority order
    pub const ALL: [LayerName; 6] = [
        LayerName::Constitutional,
        LayerName::Federal,
        LayerName::StateConstitutional,
        LayerName::StateStatutory,
        LayerName::AdministrativeRule,
        LayerName::CaseLaw,
    ];

    /// Get the layer name as used in records
    pub fn as_str(&self) -> &'static str {
        match self {
            LayerName::Constitutional => "constitutional",
            LayerName::Federal => "federal",
            LayerName::StateConstitutional => "state_constitutional",
            LayerName::StateStatutory => "state_statutory",
            LayerName::AdministrativeRule => "administrative_rule",
            LayerName::CaseLaw => "case_law",
        }
    }

    /// Parse a layer name
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "constitutional" => Some(LayerName::Constitutional),
            "federal" => Some(LayerName::Federal),
            "state_constitutional" => Some(LayerName::StateConstitutional),
            "state_statutory" => Some(LayerName::StateStatutory),
            "administrative_rule" => Some(LayerName::AdministrativeRule),
            "case_law" => Some(LayerName::CaseLaw),
            _ => None,
        }
    }

    /// Layers that set the floor every state must meet
    pub fn is_floor(&self) -> bool {
        matches!(self, LayerName::Constitutional | LayerName::Federal)
    }
}

impl std::str::FromStr for LayerName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Invalid layer: {}", s))
    }
}

/// What a node declares within one layer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerContent {
    /// Catalog constraints this node triggers (e.g. `CONST_4A_SEIZURE`)
    #[serde(default)]
    pub constraints_triggered: BTreeSet<String>,

    /// Catalog requirements applicable at this node (e.g. `FED_CAPTA`)
    #[serde(default)]
    pub requirements_applicable: BTreeSet<String>,

    /// Topics this layer inherits by reference from a higher layer
    #[serde(default)]
    pub inherits: BTreeSet<String>,
}

impl LayerContent {
    /// Every catalog id referenced by this layer
    pub fn catalog_ids(&self) -> impl Iterator<Item = &String> {
        self.constraints_triggered
            .iter()
            .chain(self.requirements_applicable.iter())
    }

    /// Whether the layer declares nothing
    pub fn is_empty(&self) -> bool {
        self.constraints_triggered.is_empty()
            && self.requirements_applicable.is_empty()
            && self.inherits.is_empty()
    }
}

/// Fixed, enum-keyed layer mapping of a node
pub type NodeLayers = BTreeMap<LayerName, LayerContent>;
