//! Raw detail payload shapes as they arrive from the two backends.
//!
//! The catalog path receives the full remote payload while the favorites path may
//! receive an already-simplified cached shape for the same logical entity. The
//! JSON -> variant decision is made once, in [`RawItem::from_value`]; consumers only
//! ever see the tagged variant.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::damage_relations::DamageRelations;
use crate::domain::errors::SyncError;

/// Tagged raw detail payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "shape", content = "payload", rename_all = "snake_case")]
pub enum RawItem {
    /// Full multi-field remote payload (`sprites.other.dream_world.front_default`)
    Remote(RemoteItem),
    /// Already-simplified cached shape (`sprites` is a flat url)
    Cached(CachedItem),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteItem {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub height: u32,
    #[serde(default)]
    pub weight: u32,
    #[serde(default)]
    pub sprites: Option<RemoteSprites>,
    #[serde(default)]
    pub types: Vec<TypeEntry>,
    #[serde(default)]
    pub stats: Vec<StatEntry>,
    #[serde(default)]
    pub abilities: Vec<AbilityEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteSprites {
    #[serde(default)]
    pub other: Option<OtherSprites>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OtherSprites {
    #[serde(default)]
    pub dream_world: Option<DreamWorldSprite>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DreamWorldSprite {
    #[serde(default)]
    pub front_default: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedItem {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub sprites: String,
    #[serde(default)]
    pub types: Vec<TypeEntry>,
    #[serde(default)]
    pub height: u32,
    #[serde(default)]
    pub weight: u32,
    #[serde(default)]
    pub abilities: Vec<AbilityEntry>,
    #[serde(default)]
    pub stats: Vec<StatEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedRef {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedUrlRef {
    pub name: String,
    #[serde(default)]
    pub url: Option<String>,
}

/// Type entry: `{type:{name}}` or a bare `"electric"`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TypeEntry {
    Nested {
        #[serde(rename = "type")]
        kind: NamedRef,
    },
    Bare(String),
}

/// Stat entry: `{base_stat, stat:{name}}` or `{name, value}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StatEntry {
    Nested { base_stat: u32, stat: NamedRef },
    Flat { name: String, value: u32 },
}

/// Ability entry: `{ability:{name,url}}` or a bare `"static"`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AbilityEntry {
    Nested { ability: NamedUrlRef },
    Bare(String),
}

impl TypeEntry {
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Nested { kind } => &kind.name,
            Self::Bare(name) => name,
        }
    }
}

impl StatEntry {
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Nested { stat, .. } => &stat.name,
            Self::Flat { name, .. } => name,
        }
    }

    #[must_use]
    pub const fn value(&self) -> u32 {
        match self {
            Self::Nested { base_stat, .. } => *base_stat,
            Self::Flat { value, .. } => *value,
        }
    }
}

impl AbilityEntry {
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Nested { ability } => &ability.name,
            Self::Bare(name) => name,
        }
    }
}

impl RawItem {
    /// Classifies an untyped detail body.
    ///
    /// `sprites` as an object (or absent) means the full remote payload, `sprites` as a
    /// string means the cached shape. Anything else is a validation failure.
    pub fn from_value(value: Value) -> Result<Self, SyncError> {
        if !value.is_object() {
            return Err(SyncError::Validation(format!(
                "detail payload must be a JSON object, got {}",
                json_kind(&value)
            )));
        }

        let cached = match value.get("sprites") {
            Some(Value::String(_)) => true,
            Some(Value::Object(_) | Value::Null) | None => false,
            Some(other) => {
                return Err(SyncError::Validation(format!(
                    "unsupported sprites field: {}",
                    json_kind(other)
                )));
            }
        };

        if cached {
            Ok(Self::Cached(serde_json::from_value(value)?))
        } else {
            Ok(Self::Remote(serde_json::from_value(value)?))
        }
    }

    #[must_use]
    pub const fn id(&self) -> u32 {
        match self {
            Self::Remote(item) => item.id,
            Self::Cached(item) => item.id,
        }
    }
}

const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// `GET /type/{name}` response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDetails {
    pub damage_relations: RawDamageRelations,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawDamageRelations {
    #[serde(default)]
    pub double_damage_to: Vec<NamedRef>,
    #[serde(default)]
    pub double_damage_from: Vec<NamedRef>,
    #[serde(default)]
    pub half_damage_to: Vec<NamedRef>,
    #[serde(default)]
    pub half_damage_from: Vec<NamedRef>,
    #[serde(default)]
    pub no_damage_to: Vec<NamedRef>,
    #[serde(default)]
    pub no_damage_from: Vec<NamedRef>,
}

impl From<RawDamageRelations> for DamageRelations {
    fn from(raw: RawDamageRelations) -> Self {
        fn names(refs: Vec<NamedRef>) -> Vec<String> {
            refs.into_iter().map(|r| r.name).collect()
        }
        Self {
            double_damage_to: names(raw.double_damage_to),
            double_damage_from: names(raw.double_damage_from),
            half_damage_to: names(raw.half_damage_to),
            half_damage_from: names(raw.half_damage_from),
            no_damage_to: names(raw.no_damage_to),
            no_damage_from: names(raw.no_damage_from),
        }
    }
}
