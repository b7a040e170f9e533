use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Canonical, normalized representation of one catalog entity.
///
/// `id` is unique across the whole item universe and is the only key used when
/// the catalog view and the favorites view are compared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ItemRecord {
    pub id: u32,
    pub name: String,
    #[serde(rename = "spriteUrl")]
    pub sprite_url: String,
    pub types: Vec<String>,
    pub height: u32,
    pub weight: u32,
    pub abilities: Vec<String>,
    pub stats: Vec<ItemStat>,
}

/// One `{name, value}` stat line (hp, attack, ...)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ItemStat {
    pub name: String,
    pub value: u32,
}

impl ItemRecord {
    /// First listed type; drives the damage-relations lookup of a detail view.
    #[must_use]
    pub fn primary_type(&self) -> Option<&str> {
        self.types.first().map(String::as_str)
    }

    /// Height in metres (remote unit is decimetres)
    #[must_use]
    pub fn height_m(&self) -> f64 {
        f64::from(self.height) / 10.0
    }

    /// Weight in kilograms (remote unit is hectograms)
    #[must_use]
    pub fn weight_kg(&self) -> f64 {
        f64::from(self.weight) / 10.0
    }

    #[must_use]
    pub fn stat(&self, name: &str) -> Option<u32> {
        self.stats.iter().find(|s| s.name == name).map(|s| s.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pikachu() -> ItemRecord {
        ItemRecord {
            id: 25,
            name: "pikachu".to_string(),
            sprite_url: "https://img/25.svg".to_string(),
            types: vec!["electric".to_string()],
            height: 4,
            weight: 60,
            abilities: vec!["static".to_string(), "lightning-rod".to_string()],
            stats: vec![
                ItemStat { name: "hp".to_string(), value: 35 },
                ItemStat { name: "speed".to_string(), value: 90 },
            ],
        }
    }

    #[test]
    fn unit_conversions() {
        let item = pikachu();
        assert!((item.height_m() - 0.4).abs() < f64::EPSILON);
        assert!((item.weight_kg() - 6.0).abs() < f64::EPSILON);
    }

    #[test]
    fn primary_type_and_stat_lookup() {
        let mut item = pikachu();
        assert_eq!(item.primary_type(), Some("electric"));
        assert_eq!(item.stat("speed"), Some(90));
        assert_eq!(item.stat("attack"), None);

        item.types.clear();
        assert_eq!(item.primary_type(), None);
    }

    #[test]
    fn serializes_with_shell_field_names() {
        let value = serde_json::to_value(pikachu()).unwrap();
        assert_eq!(value["spriteUrl"], "https://img/25.svg");
        assert_eq!(value["stats"][0]["name"], "hp");
    }
}
