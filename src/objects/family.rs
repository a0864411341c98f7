//! Families decoded from the `family` endpoint

use serde::{Deserialize, Serialize};

use super::game::LinkXml;
use super::GameLink;
use crate::xml::{self, non_empty, non_empty_owned, NameXml};

/// A group of related items, e.g. a game series or a theme
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Family {
    pub id: u64,
    /// e.g. `boardgamefamily`, `rpg`
    pub kind: String,
    pub name: String,
    pub alternative_names: Vec<String>,
    pub image: Option<String>,
    pub thumbnail: Option<String>,
    /// Items linked under the family's own type
    pub members: Vec<GameLink>,
    pub description: Option<String>,
}

/// The family with `id`, if the page holds one with a primary name
pub(crate) fn family_from_page(page: FamilyPage, id: u64) -> Option<Family> {
    page.item
        .into_iter()
        .filter_map(FamilyXml::into_family)
        .find(|family| family.id == id)
}

#[derive(Debug, Deserialize)]
pub(crate) struct FamilyPage {
    #[serde(default)]
    item: Vec<FamilyXml>,
}

#[derive(Debug, Deserialize)]
struct FamilyXml {
    #[serde(rename = "@type")]
    kind: Option<String>,
    #[serde(rename = "@id")]
    id: Option<String>,
    thumbnail: Option<String>,
    image: Option<String>,
    #[serde(default)]
    name: Vec<NameXml>,
    description: Option<String>,
    #[serde(default)]
    link: Vec<LinkXml>,
}

impl FamilyXml {
    fn into_family(self) -> Option<Family> {
        let id = xml::convert_quiet(self.id.as_deref())?;
        let name = self
            .name
            .iter()
            .find(|n| n.is_primary())
            .and_then(|n| non_empty_owned(n.value.clone()))?;
        let kind = non_empty_owned(self.kind).unwrap_or_else(|| "boardgamefamily".to_string());

        Some(Family {
            id,
            name,
            alternative_names: self
                .name
                .iter()
                .filter(|n| !n.is_primary())
                .filter_map(|n| non_empty_owned(n.value.clone()))
                .collect(),
            image: non_empty_owned(self.image),
            thumbnail: non_empty_owned(self.thumbnail),
            members: self
                .link
                .iter()
                .filter(|link| link.is(&kind))
                .filter_map(LinkXml::to_link)
                .collect(),
            description: non_empty(self.description.as_deref()).map(xml::unescape_html),
            kind,
        })
    }
}
