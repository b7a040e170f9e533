use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Type matchups of one type, flattened to type names.
///
/// Fetched on demand for a single detail view and never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DamageRelations {
    #[serde(rename = "doubleDamageTo")]
    pub double_damage_to: Vec<String>,
    #[serde(rename = "doubleDamageFrom")]
    pub double_damage_from: Vec<String>,
    #[serde(rename = "halfDamageTo")]
    pub half_damage_to: Vec<String>,
    #[serde(rename = "halfDamageFrom")]
    pub half_damage_from: Vec<String>,
    #[serde(rename = "noDamageTo")]
    pub no_damage_to: Vec<String>,
    #[serde(rename = "noDamageFrom")]
    pub no_damage_from: Vec<String>,
}

impl DamageRelations {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.double_damage_to.is_empty()
            && self.double_damage_from.is_empty()
            && self.half_damage_to.is_empty()
            && self.half_damage_from.is_empty()
            && self.no_damage_to.is_empty()
            && self.no_damage_from.is_empty()
    }

    /// Types this one is weak against (takes double damage from)
    #[must_use]
    pub fn weaknesses(&self) -> &[String] {
        &self.double_damage_from
    }

    /// Types this one is strong against (deals double damage to)
    #[must_use]
    pub fn strengths(&self) -> &[String] {
        &self.double_damage_to
    }
}
