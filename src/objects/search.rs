//! Search results

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::xml::{self, NameXml, ValueXml};

/// Item type a search can be restricted to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchKind {
    BoardGame,
    BoardGameExpansion,
    BoardGameAccessory,
    RpgItem,
    VideoGame,
}

impl SearchKind {
    /// Value used by the `type` query parameter and the `type` attribute
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BoardGame => "boardgame",
            Self::BoardGameExpansion => "boardgameexpansion",
            Self::BoardGameAccessory => "boardgameaccessory",
            Self::RpgItem => "rpgitem",
            Self::VideoGame => "videogame",
        }
    }

    const ALL: [SearchKind; 5] = [
        Self::BoardGame,
        Self::BoardGameExpansion,
        Self::BoardGameAccessory,
        Self::RpgItem,
        Self::VideoGame,
    ];
}

impl fmt::Display for SearchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("invalid search type: {s}"))
    }
}

/// One search hit
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchResult {
    pub id: u64,
    pub name: String,
    /// `None` for types this client does not know
    pub kind: Option<SearchKind>,
    pub year_published: Option<i32>,
}

/// Decode a search page, keeping the server's order
pub(crate) fn results_from_page(page: SearchPage) -> Vec<SearchResult> {
    page.item
        .into_iter()
        .filter_map(|item| {
            let name = item
                .name
                .iter()
                .find(|n| n.is_primary())
                .or_else(|| item.name.first())
                .and_then(|n| xml::non_empty(n.value.as_deref()))?
                .to_string();
            Some(SearchResult {
                id: xml::convert_quiet(item.id.as_deref())?,
                name,
                kind: item.kind.as_deref().and_then(|k| k.parse().ok()),
                year_published: ValueXml::parse(&item.yearpublished),
            })
        })
        .collect()
}

#[derive(Debug, Deserialize)]
pub(crate) struct SearchPage {
    #[serde(default)]
    item: Vec<SearchItemXml>,
}

#[derive(Debug, Deserialize)]
struct SearchItemXml {
    #[serde(rename = "@type")]
    kind: Option<String>,
    #[serde(rename = "@id")]
    id: Option<String>,
    #[serde(default)]
    name: Vec<NameXml>,
    yearpublished: Option<ValueXml>,
}
