//! Users, with their buddies, guilds, hot list and top list
//!
//! Buddies and guilds are listed by the same endpoint, 100 per page, and are
//! paged together with one `page` parameter. Paging continues while either list
//! is short of its declared total.

use serde::{Deserialize, Serialize};

use super::unique::{Keyed, UniqueList};
use crate::config::USER_BUDDIES_PER_PAGE;
use crate::fetcher::{FetcherError, FetcherResult, PageAggregate};
use crate::xml::{self, non_empty_owned, ValueXml};

/// A user's buddy
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Buddy {
    pub id: u64,
    pub name: String,
}

impl Keyed for Buddy {
    type Key = u64;

    fn key(&self) -> u64 {
        self.id
    }
}

/// A guild the user belongs to
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserGuild {
    pub id: u64,
    pub name: String,
}

impl Keyed for UserGuild {
    type Key = u64;

    fn key(&self) -> u64 {
        self.id
    }
}

/// Entry of a user's hot or top list
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedItem {
    pub rank: u32,
    pub id: u64,
    pub name: String,
    /// Item type, e.g. `thing`
    pub kind: Option<String>,
}

/// A BoardGameGeek user
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: u64,
    pub name: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub avatar: Option<String>,
    pub year_registered: Option<i32>,
    pub last_login: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub homepage: Option<String>,
    pub xbox_account: Option<String>,
    pub wii_account: Option<String>,
    pub psn_account: Option<String>,
    pub battlenet_account: Option<String>,
    pub steam_account: Option<String>,
    pub trade_rating: Option<u32>,
    pub buddies: UniqueList<Buddy>,
    pub guilds: UniqueList<UserGuild>,
    pub top: Vec<RankedItem>,
    pub hot: Vec<RankedItem>,
    #[serde(skip)]
    buddies_total: Option<usize>,
    #[serde(skip)]
    guilds_total: Option<usize>,
}

impl User {
    /// Buddy count declared by the server (0 when buddies were not requested)
    pub fn total_buddies(&self) -> usize {
        self.buddies_total.unwrap_or(0)
    }

    /// Guild count declared by the server (0 when guilds were not requested)
    pub fn total_guilds(&self) -> usize {
        self.guilds_total.unwrap_or(0)
    }

    fn add_lists(&mut self, buddies: Option<ListXml>, guilds: Option<ListXml>) -> usize {
        let buddies = buddies.map(|list| list.buddy).unwrap_or_default();
        let guilds = guilds.map(|list| list.guild).unwrap_or_default();

        let added_buddies = self.buddies.extend_up_to(
            buddies.into_iter().filter_map(|e| {
                Some(Buddy {
                    id: xml::convert_quiet(e.id.as_deref())?,
                    name: non_empty_owned(e.name)?,
                })
            }),
            self.buddies_total,
        );
        let added_guilds = self.guilds.extend_up_to(
            guilds.into_iter().filter_map(|e| {
                Some(UserGuild {
                    id: xml::convert_quiet(e.id.as_deref())?,
                    name: non_empty_owned(e.name)?,
                })
            }),
            self.guilds_total,
        );

        added_buddies + added_guilds
    }
}

fn ranked_items(list: Option<RankedListXml>) -> Vec<RankedItem> {
    list.map(|list| list.item)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|item| {
            Some(RankedItem {
                rank: xml::convert_quiet(item.rank.as_deref())?,
                id: xml::convert_quiet(item.id.as_deref())?,
                name: non_empty_owned(item.name)?,
                kind: non_empty_owned(item.kind),
            })
        })
        .collect()
}

fn list_total(list: &Option<ListXml>, field: &str) -> FetcherResult<Option<usize>> {
    match list {
        Some(list) => xml::convert(list.total.as_deref(), field),
        None => Ok(None),
    }
}

impl PageAggregate for User {
    type Owner = str;
    type Page = UserPage;
    const PAGE_SIZE: Option<usize> = Some(USER_BUDDIES_PER_PAGE);

    fn from_first_page(name: &str, page: UserPage) -> FetcherResult<Self> {
        let id = xml::convert(page.id.as_deref(), "user id")?
            .ok_or_else(|| FetcherError::NotFound(format!("user {name}")))?;

        let text = |value: &Option<ValueXml>| ValueXml::get(value).map(str::to_string);

        let mut user = User {
            id,
            name: non_empty_owned(page.name).unwrap_or_else(|| name.to_string()),
            first_name: text(&page.firstname),
            last_name: text(&page.lastname),
            avatar: ValueXml::get(&page.avatarlink)
                .filter(|link| *link != "N/A")
                .map(str::to_string),
            year_registered: ValueXml::parse(&page.yearregistered),
            last_login: text(&page.lastlogin),
            state: text(&page.stateorprovince),
            country: text(&page.country),
            homepage: text(&page.webaddress),
            xbox_account: text(&page.xboxaccount),
            wii_account: text(&page.wiiaccount),
            psn_account: text(&page.psnaccount),
            battlenet_account: text(&page.battlenetaccount),
            steam_account: text(&page.steamaccount),
            trade_rating: ValueXml::parse(&page.traderating),
            buddies: UniqueList::new(),
            guilds: UniqueList::new(),
            top: ranked_items(page.top),
            hot: ranked_items(page.hot),
            buddies_total: list_total(&page.buddies, "buddies total")?,
            guilds_total: list_total(&page.guilds, "guilds total")?,
        };
        user.add_lists(page.buddies, page.guilds);
        Ok(user)
    }

    fn merge_page(&mut self, page: UserPage) -> FetcherResult<usize> {
        Ok(self.add_lists(page.buddies, page.guilds))
    }

    fn needs_more(&self) -> bool {
        self.buddies.len() < self.total_buddies() || self.guilds.len() < self.total_guilds()
    }

    fn accumulated(&self) -> usize {
        self.buddies.len().max(self.guilds.len())
    }

    fn progress(&self) -> (usize, usize) {
        (
            self.accumulated(),
            self.total_buddies().max(self.total_guilds()),
        )
    }
}

#[doc(hidden)]
#[derive(Debug, Deserialize)]
pub struct UserPage {
    #[serde(rename = "@id")]
    id: Option<String>,
    #[serde(rename = "@name")]
    name: Option<String>,
    firstname: Option<ValueXml>,
    lastname: Option<ValueXml>,
    avatarlink: Option<ValueXml>,
    yearregistered: Option<ValueXml>,
    lastlogin: Option<ValueXml>,
    stateorprovince: Option<ValueXml>,
    country: Option<ValueXml>,
    webaddress: Option<ValueXml>,
    xboxaccount: Option<ValueXml>,
    wiiaccount: Option<ValueXml>,
    psnaccount: Option<ValueXml>,
    battlenetaccount: Option<ValueXml>,
    steamaccount: Option<ValueXml>,
    traderating: Option<ValueXml>,
    buddies: Option<ListXml>,
    guilds: Option<ListXml>,
    top: Option<RankedListXml>,
    hot: Option<RankedListXml>,
}

/// `<buddies total="..">` / `<guilds total="..">`
#[derive(Debug, Deserialize)]
struct ListXml {
    #[serde(rename = "@total")]
    total: Option<String>,
    #[serde(default)]
    buddy: Vec<EntryXml>,
    #[serde(default)]
    guild: Vec<EntryXml>,
}

#[derive(Debug, Deserialize)]
struct EntryXml {
    #[serde(rename = "@id")]
    id: Option<String>,
    #[serde(rename = "@name")]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RankedListXml {
    #[serde(default)]
    item: Vec<RankedItemXml>,
}

#[derive(Debug, Deserialize)]
struct RankedItemXml {
    #[serde(rename = "@rank")]
    rank: Option<String>,
    #[serde(rename = "@type")]
    kind: Option<String>,
    #[serde(rename = "@id")]
    id: Option<String>,
    #[serde(rename = "@name")]
    name: Option<String>,
}
