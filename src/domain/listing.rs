//! List endpoint shapes: one page of item references plus the authoritative total.

use serde::{Deserialize, Serialize};
use url::Url;

/// `GET /pokemon?limit=&offset=` response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageListing {
    pub count: u32,
    pub results: Vec<ItemRef>,
}

/// Reference to one item: display name plus the per-item detail lookup handle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRef {
    pub name: String,
    pub url: String,
}

impl ItemRef {
    /// Numeric id encoded as the last path segment of the detail url
    /// (`.../pokemon/25/` -> 25). `None` when the handle is not shaped that way.
    #[must_use]
    pub fn id(&self) -> Option<u32> {
        let parsed = Url::parse(&self.url).ok()?;
        parsed
            .path_segments()?
            .filter(|segment| !segment.is_empty())
            .next_back()?
            .parse()
            .ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("https://pokeapi.co/api/v2/pokemon/25/", Some(25))]
    #[case("https://pokeapi.co/api/v2/pokemon/1", Some(1))]
    #[case("https://pokeapi.co/api/v2/pokemon/pikachu/", None)]
    #[case("not a url", None)]
    fn id_from_detail_url(#[case] url: &str, #[case] expected: Option<u32>) {
        let item = ItemRef {
            name: "x".to_string(),
            url: url.to_string(),
        };
        assert_eq!(item.id(), expected);
    }

    #[test]
    fn listing_deserializes_from_remote_json() {
        let json = r#"{"count":1302,"next":null,"previous":null,
            "results":[{"name":"bulbasaur","url":"https://pokeapi.co/api/v2/pokemon/1/"}]}"#;
        let listing: PageListing = serde_json::from_str(json).unwrap();
        assert_eq!(listing.count, 1302);
        assert_eq!(listing.results.len(), 1);
        assert_eq!(listing.results[0].id(), Some(1));
    }
}
