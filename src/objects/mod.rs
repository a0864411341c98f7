//! Domain objects returned by [`crate::BggClient`]
//!
//! Paginated entities ([`Guild`], [`User`], [`Plays`], [`Collection`]) implement
//! [`crate::fetcher::PageAggregate`]; the rest are decoded from a single page.

pub mod collection;
pub mod family;
pub mod game;
pub mod guild;
pub mod hot;
pub mod plays;
pub mod search;
pub mod unique;
pub mod user;

pub use collection::{Collection, CollectionItem, CollectionStats, CollectionStatus};
pub use family::Family;
pub use game::{Game, GameLink, GameStats, GameVersion, GameVideo};
pub use guild::{Guild, GuildLocation};
pub use hot::{HotItem, HotItemKind, HotItems};
pub use plays::{Player, PlaySession, Plays, PlaysOwner, PlaysSubject};
pub use search::{SearchKind, SearchResult};
pub use unique::{Keyed, UniqueList};
pub use user::{Buddy, RankedItem, User, UserGuild};

use serde::Serialize;

use crate::xml::{self, non_empty_owned, RanksXml};

/// Position of a game in one of the ranking lists
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rank {
    /// `subtype` or `family`
    pub kind: Option<String>,
    pub id: Option<u64>,
    /// e.g. `boardgame`, `strategygames`
    pub name: Option<String>,
    /// e.g. `Board Game Rank`
    pub friendly_name: Option<String>,
    /// `None` when the game is not ranked in this list
    pub value: Option<u32>,
    pub bayes_average: Option<f64>,
}

impl Rank {
    pub(crate) fn from_xml(ranks: Option<RanksXml>) -> Vec<Rank> {
        ranks
            .map(|r| r.rank)
            .unwrap_or_default()
            .into_iter()
            .map(|rank| Rank {
                kind: non_empty_owned(rank.kind),
                id: xml::convert_quiet(rank.id.as_deref()),
                name: non_empty_owned(rank.name),
                friendly_name: non_empty_owned(rank.friendly_name),
                value: xml::convert_quiet(rank.value.as_deref()),
                bayes_average: xml::convert_quiet(rank.bayes_average.as_deref()),
            })
            .collect()
    }
}
