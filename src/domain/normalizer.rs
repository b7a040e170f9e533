//! Record Normalizer
//!
//! Pure mapping from either raw detail variant into the canonical [`ItemRecord`].
//! Both variants produce exactly the same record for the same logical item.

use serde_json::Value;

use crate::domain::errors::SyncError;
use crate::domain::item::{ItemRecord, ItemStat};
use crate::domain::payload::{AbilityEntry, CachedItem, RawItem, RemoteItem, StatEntry, TypeEntry};

/// Normalizes a tagged raw payload.
pub fn normalize(raw: RawItem) -> Result<ItemRecord, SyncError> {
    let record = match raw {
        RawItem::Remote(item) => from_remote(item),
        RawItem::Cached(item) => from_cached(item),
    };
    validate(&record)?;
    Ok(record)
}

/// Classifies and normalizes an untyped detail body in one step.
pub fn normalize_value(value: Value) -> Result<ItemRecord, SyncError> {
    normalize(RawItem::from_value(value)?)
}

fn from_remote(item: RemoteItem) -> ItemRecord {
    let sprite_url = item
        .sprites
        .and_then(|s| s.other)
        .and_then(|o| o.dream_world)
        .and_then(|d| d.front_default)
        .unwrap_or_default();

    ItemRecord {
        id: item.id,
        name: item.name,
        sprite_url,
        types: type_names(&item.types),
        height: item.height,
        weight: item.weight,
        abilities: ability_names(&item.abilities),
        stats: stats(&item.stats),
    }
}

fn from_cached(item: CachedItem) -> ItemRecord {
    ItemRecord {
        id: item.id,
        name: item.name,
        sprite_url: item.sprites,
        types: type_names(&item.types),
        height: item.height,
        weight: item.weight,
        abilities: ability_names(&item.abilities),
        stats: stats(&item.stats),
    }
}

fn type_names(entries: &[TypeEntry]) -> Vec<String> {
    entries.iter().map(|t| t.name().to_string()).collect()
}

fn ability_names(entries: &[AbilityEntry]) -> Vec<String> {
    entries.iter().map(|a| a.name().to_string()).collect()
}

fn stats(entries: &[StatEntry]) -> Vec<ItemStat> {
    entries
        .iter()
        .map(|s| ItemStat {
            name: s.name().to_string(),
            value: s.value(),
        })
        .collect()
}

fn validate(record: &ItemRecord) -> Result<(), SyncError> {
    if record.id == 0 {
        return Err(SyncError::Validation("item id must be non-zero".to_string()));
    }
    if record.name.trim().is_empty() {
        return Err(SyncError::Validation(format!("item {} has an empty name", record.id)));
    }
    Ok(())
}
