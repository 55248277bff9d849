//! Node identity: jurisdiction, stage family and sequence

use serde::{Deserialize, Serialize};
use std::fmt;

/// A jurisdiction code such as `TX`, `DC`, or the federal baseline `FEDERAL`
///
/// Codes are upper-case ASCII alphanumerics so that they can be joined into
/// node keys with `_` without ambiguity.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Jurisdiction(String);

impl Jurisdiction {
    /// Code of the federal baseline jurisdiction
    pub const FEDERAL: &'static str = "FEDERAL";

    /// Parse and normalize a jurisdiction code
    ///
    /// "United States", "US" and "USA" all map to the federal baseline.
    pub fn new(value: &str) -> Result<Self, String> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err("Jurisdiction cannot be empty".to_string());
        }

        let upper = trimmed.to_ascii_uppercase();
        if matches!(upper.as_str(), "UNITED STATES" | "US" | "USA" | "FED" | "FEDERAL") {
            return Ok(Self::federal());
        }

        let code = upper.strip_prefix("US-").unwrap_or(&upper);
        if !code.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(format!("Invalid jurisdiction code: {}", value));
        }

        Ok(Self(code.to_string()))
    }

    /// The federal baseline jurisdiction
    pub fn federal() -> Self {
        Self(Self::FEDERAL.to_string())
    }

    /// Whether this is the federal baseline
    pub fn is_federal(&self) -> bool {
        self.0 == Self::FEDERAL
    }

    /// Get the code as a string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Jurisdiction {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<Jurisdiction> for String {
    fn from(value: Jurisdiction) -> Self {
        value.0
    }
}

impl fmt::Display for Jurisdiction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Stage family of a decision node, in process order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum NodeFamily {
    /// Intake: reports, hotline calls, referrals
    Inp,
    /// Decision points: screening, substantiation, removal decisions
    Dec,
    /// Actions taken: removal, placement, services
    Act,
    /// Outcomes: reunification, adoption, guardianship
    Out,
    /// Failure modes of the process
    Fail,
    /// Post-mortem and oversight controls
    Pmc,
}

impl NodeFamily {
    /// All families in process order
    pub const ALL: [NodeFamily; 6] = [
        NodeFamily::Inp,
        NodeFamily::Dec,
        NodeFamily::Act,
        NodeFamily::Out,
        NodeFamily::Fail,
        NodeFamily::Pmc,
    ];

    /// Get the family code as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeFamily::Inp => "INP",
            NodeFamily::Dec => "DEC",
            NodeFamily::Act => "ACT",
            NodeFamily::Out => "OUT",
            NodeFamily::Fail => "FAIL",
            NodeFamily::Pmc => "PMC",
        }
    }

    /// Parse a family code (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "INP" => Some(NodeFamily::Inp),
            "DEC" => Some(NodeFamily::Dec),
            "ACT" => Some(NodeFamily::Act),
            "OUT" => Some(NodeFamily::Out),
            "FAIL" => Some(NodeFamily::Fail),
            "PMC" => Some(NodeFamily::Pmc),
            _ => None,
        }
    }

    /// Families allowed to own `failure_modes` edges
    pub fn can_fail(&self) -> bool {
        matches!(self, NodeFamily::Dec | NodeFamily::Act | NodeFamily::Out)
    }
}

impl std::str::FromStr for NodeFamily {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Invalid node family: {}", s))
    }
}

impl fmt::Display for NodeFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A `(family, sequence)` position, shared by the baseline and every state
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Slot {
    /// Stage family
    pub family: NodeFamily,
    /// Sequence within the family, starting at 1
    pub sequence: u32,
}

impl Slot {
    /// Create a new slot
    pub fn new(family: NodeFamily, sequence: u32) -> Self {
        Self { family, sequence }
    }

    /// Parse `DEC-01` style slot notation
    pub fn parse(s: &str) -> Result<Self, String> {
        let (family, sequence) = s
            .trim()
            .split_once('-')
            .ok_or_else(|| format!("Invalid slot '{}': expected FAMILY-NN", s))?;
        let family = family.parse::<NodeFamily>()?;
        let sequence = sequence
            .parse::<u32>()
            .map_err(|_| format!("Invalid sequence in slot '{}'", s))?;
        if sequence == 0 {
            return Err(format!("Sequence must start at 1 in slot '{}'", s));
        }
        Ok(Self { family, sequence })
    }

    /// Place this slot in a jurisdiction
    pub fn in_jurisdiction(self, jurisdiction: Jurisdiction) -> NodeKey {
        NodeKey {
            jurisdiction,
            family: self.family,
            sequence: self.sequence,
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:02}", self.family, self.sequence)
    }
}

/// Unique identity of a decision node: `(jurisdiction, family, sequence)`
///
/// Displayed as `TX_DEC-01`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NodeKey {
    /// Owning jurisdiction
    pub jurisdiction: Jurisdiction,
    /// Stage family
    pub family: NodeFamily,
    /// Sequence within the family
    pub sequence: u32,
}

impl NodeKey {
    /// Create a new node key
    pub fn new(jurisdiction: Jurisdiction, family: NodeFamily, sequence: u32) -> Self {
        Self {
            jurisdiction,
            family,
            sequence,
        }
    }

    /// Parse a fully qualified key such as `TX_DEC-01`
    pub fn parse(s: &str) -> Result<Self, String> {
        let (jurisdiction, slot) = s
            .trim()
            .split_once('_')
            .ok_or_else(|| format!("Invalid node key '{}': expected JUR_FAMILY-NN", s))?;
        Ok(Slot::parse(slot)?.in_jurisdiction(Jurisdiction::new(jurisdiction)?))
    }

    /// Parse a key that may omit its jurisdiction (`DEC-03`), defaulting to `default`
    pub fn parse_in(s: &str, default: &Jurisdiction) -> Result<Self, String> {
        if s.contains('_') {
            Self::parse(s)
        } else {
            Ok(Slot::parse(s)?.in_jurisdiction(default.clone()))
        }
    }

    /// The `(family, sequence)` slot of this key
    pub fn slot(&self) -> Slot {
        Slot::new(self.family, self.sequence)
    }

    /// The same slot in another jurisdiction
    pub fn with_jurisdiction(&self, jurisdiction: &Jurisdiction) -> Self {
        self.slot().in_jurisdiction(jurisdiction.clone())
    }
}

impl TryFrom<String> for NodeKey {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<NodeKey> for String {
    fn from(value: NodeKey) -> Self {
        value.to_string()
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.jurisdiction, self.slot())
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn family() -> impl Strategy<Value = NodeFamily> {
        prop::sample::select(NodeFamily::ALL.to_vec())
    }

    proptest! {
        /// Property: key ordering groups by jurisdiction, then family, then sequence
        #[test]
        fn test_key_ordering_follows_fields(
            fa in family(),
            fb in family(),
            sa in 1u32..100,
            sb in 1u32..100,
        ) {
            let j = Jurisdiction::new("TX").unwrap();
            let a = NodeKey::new(j.clone(), fa, sa);
            let b = NodeKey::new(j, fb, sb);
            prop_assert_eq!(a < b, (fa, sa) < (fb, sb));
        }

        /// Property: Display output parses back to the same key
        #[test]
        fn test_key_display_parses(f in family(), seq in 1u32..1000) {
            let key = NodeKey::new(Jurisdiction::new("CA").unwrap(), f, seq);
            prop_assert_eq!(NodeKey::parse(&key.to_string()).unwrap(), key);
        }
    }
}
