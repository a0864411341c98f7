//! A user's game collection

use serde::{Deserialize, Serialize};

use super::unique::{Keyed, UniqueList};
use super::Rank;
use crate::fetcher::{FetcherError, FetcherResult, PageAggregate};
use crate::xml::{self, non_empty_owned, RanksXml, ValueXml};

/// Ownership flags of a collection entry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CollectionStatus {
    pub own: bool,
    pub prev_owned: bool,
    pub for_trade: bool,
    pub want: bool,
    pub want_to_play: bool,
    pub want_to_buy: bool,
    pub wishlist: bool,
    /// 1 (must have) to 5 (don't buy this)
    pub wishlist_priority: Option<u8>,
    pub preordered: bool,
    pub last_modified: Option<String>,
}

/// Game statistics attached to a collection entry
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CollectionStats {
    pub min_players: Option<u32>,
    pub max_players: Option<u32>,
    pub min_playing_time: Option<u32>,
    pub max_playing_time: Option<u32>,
    pub playing_time: Option<u32>,
    pub num_owned: Option<u32>,
    pub users_rated: Option<u32>,
    pub average: Option<f64>,
    pub bayes_average: Option<f64>,
    pub stddev: Option<f64>,
    pub median: Option<f64>,
    pub ranks: Vec<Rank>,
}

/// One entry of a collection
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollectionItem {
    /// Object (game) id
    pub id: u64,
    /// Id of this collection entry
    pub collection_id: Option<u64>,
    pub name: String,
    /// `boardgame`, `boardgameexpansion`, ...
    pub subtype: Option<String>,
    pub year_published: Option<i32>,
    pub image: Option<String>,
    pub thumbnail: Option<String>,
    pub num_plays: u32,
    pub status: CollectionStatus,
    /// The owner's own rating, 1 to 10
    pub rating: Option<f64>,
    pub stats: CollectionStats,
}

impl Keyed for CollectionItem {
    type Key = u64;

    fn key(&self) -> u64 {
        self.id
    }
}

/// A user's collection, fetched in one request
#[derive(Debug, Clone, Serialize)]
pub struct Collection {
    pub owner: String,
    pub declared_total: Option<usize>,
    pub items: UniqueList<CollectionItem>,
}

impl Collection {
    /// Number of entries
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the collection has no entries
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Entries marked as owned
    pub fn owned(&self) -> impl Iterator<Item = &CollectionItem> {
        self.items.iter().filter(|item| item.status.own)
    }
}

impl PageAggregate for Collection {
    type Owner = str;
    type Page = CollectionPage;

    fn from_first_page(owner: &str, page: CollectionPage) -> FetcherResult<Self> {
        if let Some(error) = page.error.first() {
            let message = non_empty_owned(error.message.clone())
                .unwrap_or_else(|| "collection not available".to_string());
            return Err(FetcherError::NotFound(format!("collection of {owner}: {message}")));
        }

        let mut collection = Collection {
            owner: owner.to_string(),
            declared_total: xml::convert(page.totalitems.as_deref(), "collection total")?,
            items: UniqueList::new(),
        };
        let total = collection.declared_total;
        collection
            .items
            .extend_up_to(page.item.into_iter().filter_map(ItemXml::into_item), total);
        Ok(collection)
    }

    fn merge_page(&mut self, page: CollectionPage) -> FetcherResult<usize> {
        Ok(self.items.extend_up_to(
            page.item.into_iter().filter_map(ItemXml::into_item),
            self.declared_total,
        ))
    }

    fn needs_more(&self) -> bool {
        false
    }

    fn accumulated(&self) -> usize {
        self.items.len()
    }

    fn progress(&self) -> (usize, usize) {
        (
            self.items.len(),
            self.declared_total.unwrap_or(self.items.len()),
        )
    }
}

#[doc(hidden)]
#[derive(Debug, Deserialize)]
pub struct CollectionPage {
    #[serde(rename = "@totalitems")]
    totalitems: Option<String>,
    #[serde(default)]
    item: Vec<ItemXml>,
    #[serde(default)]
    error: Vec<ErrorXml>,
}

#[derive(Debug, Deserialize)]
struct ErrorXml {
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ItemXml {
    #[serde(rename = "@objectid")]
    objectid: Option<String>,
    #[serde(rename = "@subtype")]
    subtype: Option<String>,
    #[serde(rename = "@collid")]
    collid: Option<String>,
    name: Option<ItemNameXml>,
    yearpublished: Option<String>,
    image: Option<String>,
    thumbnail: Option<String>,
    numplays: Option<String>,
    status: Option<StatusXml>,
    stats: Option<StatsXml>,
}

#[derive(Debug, Deserialize)]
struct ItemNameXml {
    #[serde(rename = "$text")]
    text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct StatusXml {
    #[serde(rename = "@own")]
    own: Option<String>,
    #[serde(rename = "@prevowned")]
    prevowned: Option<String>,
    #[serde(rename = "@fortrade")]
    fortrade: Option<String>,
    #[serde(rename = "@want")]
    want: Option<String>,
    #[serde(rename = "@wanttoplay")]
    wanttoplay: Option<String>,
    #[serde(rename = "@wanttobuy")]
    wanttobuy: Option<String>,
    #[serde(rename = "@wishlist")]
    wishlist: Option<String>,
    #[serde(rename = "@wishlistpriority")]
    wishlistpriority: Option<String>,
    #[serde(rename = "@preordered")]
    preordered: Option<String>,
    #[serde(rename = "@lastmodified")]
    lastmodified: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct StatsXml {
    #[serde(rename = "@minplayers")]
    minplayers: Option<String>,
    #[serde(rename = "@maxplayers")]
    maxplayers: Option<String>,
    #[serde(rename = "@minplaytime")]
    minplaytime: Option<String>,
    #[serde(rename = "@maxplaytime")]
    maxplaytime: Option<String>,
    #[serde(rename = "@playingtime")]
    playingtime: Option<String>,
    #[serde(rename = "@numowned")]
    numowned: Option<String>,
    rating: Option<RatingXml>,
}

#[derive(Debug, Default, Deserialize)]
struct RatingXml {
    #[serde(rename = "@value")]
    value: Option<String>,
    usersrated: Option<ValueXml>,
    average: Option<ValueXml>,
    bayesaverage: Option<ValueXml>,
    stddev: Option<ValueXml>,
    median: Option<ValueXml>,
    ranks: Option<RanksXml>,
}

impl ItemXml {
    fn into_item(self) -> Option<CollectionItem> {
        let status = self.status.unwrap_or_default();
        let stats = self.stats.unwrap_or_default();
        let rating = stats.rating.unwrap_or_default();

        Some(CollectionItem {
            id: xml::convert_quiet(self.objectid.as_deref())?,
            collection_id: xml::convert_quiet(self.collid.as_deref()),
            name: self
                .name
                .and_then(|name| non_empty_owned(name.text))
                .unwrap_or_default(),
            subtype: non_empty_owned(self.subtype),
            year_published: xml::convert_quiet(self.yearpublished.as_deref()),
            image: non_empty_owned(self.image),
            thumbnail: non_empty_owned(self.thumbnail),
            num_plays: xml::convert_or(self.numplays.as_deref(), 0),
            status: CollectionStatus {
                own: xml::flag(status.own.as_deref()),
                prev_owned: xml::flag(status.prevowned.as_deref()),
                for_trade: xml::flag(status.fortrade.as_deref()),
                want: xml::flag(status.want.as_deref()),
                want_to_play: xml::flag(status.wanttoplay.as_deref()),
                want_to_buy: xml::flag(status.wanttobuy.as_deref()),
                wishlist: xml::flag(status.wishlist.as_deref()),
                wishlist_priority: xml::convert_quiet(status.wishlistpriority.as_deref()),
                preordered: xml::flag(status.preordered.as_deref()),
                last_modified: non_empty_owned(status.lastmodified),
            },
            rating: xml::convert_quiet(rating.value.as_deref()),
            stats: CollectionStats {
                min_players: xml::convert_quiet(stats.minplayers.as_deref()),
                max_players: xml::convert_quiet(stats.maxplayers.as_deref()),
                min_playing_time: xml::convert_quiet(stats.minplaytime.as_deref()),
                max_playing_time: xml::convert_quiet(stats.maxplaytime.as_deref()),
                playing_time: xml::convert_quiet(stats.playingtime.as_deref()),
                num_owned: xml::convert_quiet(stats.numowned.as_deref()),
                users_rated: ValueXml::parse(&rating.usersrated),
                average: ValueXml::parse(&rating.average),
                bayes_average: ValueXml::parse(&rating.bayesaverage),
                stddev: ValueXml::parse(&rating.stddev),
                median: ValueXml::parse(&rating.median),
                ranks: Rank::from_xml(rating.ranks),
            },
        })
    }
}
