//! Hot lists

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::xml::{self, ValueXml};

/// Which hot list to fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HotItemKind {
    #[default]
    BoardGame,
    Rpg,
    VideoGame,
    BoardGamePerson,
    RpgPerson,
    BoardGameCompany,
    RpgCompany,
    VideoGameCompany,
}

impl HotItemKind {
    /// Value of the `type` query parameter
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BoardGame => "boardgame",
            Self::Rpg => "rpg",
            Self::VideoGame => "videogame",
            Self::BoardGamePerson => "boardgameperson",
            Self::RpgPerson => "rpgperson",
            Self::BoardGameCompany => "boardgamecompany",
            Self::RpgCompany => "rpgcompany",
            Self::VideoGameCompany => "videogamecompany",
        }
    }

    const ALL: [HotItemKind; 8] = [
        Self::BoardGame,
        Self::Rpg,
        Self::VideoGame,
        Self::BoardGamePerson,
        Self::RpgPerson,
        Self::BoardGameCompany,
        Self::RpgCompany,
        Self::VideoGameCompany,
    ];
}

impl fmt::Display for HotItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HotItemKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("invalid hot item type: {s}"))
    }
}

/// Entry of a hot list
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HotItem {
    pub id: u64,
    pub rank: u32,
    pub name: String,
    pub year_published: Option<i32>,
    pub thumbnail: Option<String>,
}

/// A hot list, in rank order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HotItems {
    pub items: Vec<HotItem>,
}

impl HotItems {
    pub(crate) fn from_page(page: HotPage) -> Self {
        let mut items: Vec<HotItem> = page
            .item
            .into_iter()
            .filter_map(|item| {
                Some(HotItem {
                    id: xml::convert_quiet(item.id.as_deref())?,
                    rank: xml::convert_quiet(item.rank.as_deref())?,
                    name: ValueXml::get(&item.name)?.to_string(),
                    year_published: ValueXml::parse(&item.yearpublished),
                    thumbnail: ValueXml::get(&item.thumbnail).map(str::to_string),
                })
            })
            .collect();
        items.sort_by_key(|item| item.rank);
        Self { items }
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the list is empty
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct HotPage {
    #[serde(default)]
    item: Vec<HotItemXml>,
}

#[derive(Debug, Deserialize)]
struct HotItemXml {
    #[serde(rename = "@id")]
    id: Option<String>,
    #[serde(rename = "@rank")]
    rank: Option<String>,
    thumbnail: Option<ValueXml>,
    name: Option<ValueXml>,
    yearpublished: Option<ValueXml>,
}
