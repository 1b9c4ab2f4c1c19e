// ── Entity identity types ──
//
// Every selectable thing on the map is an entity of one of four kinds.
// Identity is a plain string: CMS item ids for beaches and POIs, label
// text for regions and states.

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

// ── EntityType ──────────────────────────────────────────────────────

/// The kind of a selectable entity.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum EntityType {
    Beach,
    Poi,
    Region,
    State,
}

impl EntityType {
    /// Whether entities of this kind have a full detail record and a
    /// detail sidebar panel.
    pub fn has_detail(self) -> bool {
        matches!(self, Self::Beach | Self::Poi)
    }
}

// ── EntityId ────────────────────────────────────────────────────────

/// Canonical identifier for any entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for EntityId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl Borrow<str> for EntityId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for EntityId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;
    use std::str::FromStr;

    use super::*;

    #[test]
    fn entity_type_wire_names_are_lowercase() {
        assert_eq!(serde_json::to_string(&EntityType::Poi).unwrap(), "\"poi\"");
        assert_eq!(EntityType::from_str("Beach").unwrap(), EntityType::Beach);
        assert_eq!(EntityType::Region.to_string(), "region");
    }

    #[test]
    fn only_beaches_and_pois_have_detail() {
        assert!(EntityType::Beach.has_detail());
        assert!(EntityType::Poi.has_detail());
        assert!(!EntityType::Region.has_detail());
        assert!(!EntityType::State.has_detail());
    }

    #[test]
    fn entity_id_looks_up_by_str() {
        let mut map = HashMap::new();
        map.insert(EntityId::from("abc"), 1);
        assert_eq!(map.get("abc"), Some(&1));
    }
}
