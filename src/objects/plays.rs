//! Logged plays of a user or of a game

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::unique::{Keyed, UniqueList};
use crate::config::PLAYS_PER_PAGE;
use crate::fetcher::{FetcherError, FetcherResult, PageAggregate};
use crate::xml::{self, non_empty_owned, ValueXml};

/// Whose plays are being listed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaysSubject {
    /// Plays logged by a user
    User(String),
    /// Plays of a game, by anyone
    Game(u64),
}

/// Owner of a play list as confirmed by the server
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PlaysOwner {
    User { name: String, id: u64 },
    Game { id: u64 },
}

/// One participant of a play
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Player {
    pub username: Option<String>,
    pub user_id: Option<u64>,
    pub name: Option<String>,
    pub start_position: Option<String>,
    pub color: Option<String>,
    pub score: Option<String>,
    pub rating: Option<f64>,
    pub new: bool,
    pub win: bool,
}

/// A logged play
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaySession {
    pub id: u64,
    pub user_id: Option<u64>,
    /// Missing or `0000-00-00` dates are `None`
    pub date: Option<NaiveDate>,
    pub quantity: u32,
    /// Minutes
    pub duration: u32,
    pub incomplete: bool,
    pub nowinstats: bool,
    pub location: Option<String>,
    pub game_id: Option<u64>,
    pub game_name: Option<String>,
    pub game_subtypes: Vec<String>,
    pub comment: Option<String>,
    pub players: Vec<Player>,
}

impl Keyed for PlaySession {
    type Key = u64;

    fn key(&self) -> u64 {
        self.id
    }
}

/// Plays of a user or a game, merged across pages
#[derive(Debug, Clone, Serialize)]
pub struct Plays {
    pub owner: PlaysOwner,
    pub declared_total: usize,
    pub plays: UniqueList<PlaySession>,
}

impl Plays {
    /// Number of plays fetched
    pub fn len(&self) -> usize {
        self.plays.len()
    }

    /// Whether no plays were fetched
    pub fn is_empty(&self) -> bool {
        self.plays.is_empty()
    }

    fn add_plays(&mut self, plays: Vec<PlayXml>) -> usize {
        let owner_id = match &self.owner {
            PlaysOwner::User { id, .. } => Some(*id),
            PlaysOwner::Game { .. } => None,
        };
        let sessions = plays.into_iter().filter_map(|play| {
            let mut session = play.into_session()?;
            if owner_id.is_some() {
                session.user_id = owner_id;
            }
            Some(session)
        });
        self.plays.extend_up_to(sessions, Some(self.declared_total))
    }
}

impl PageAggregate for Plays {
    type Owner = PlaysSubject;
    type Page = PlaysPage;
    const PAGE_SIZE: Option<usize> = Some(PLAYS_PER_PAGE);

    fn from_first_page(subject: &PlaysSubject, page: PlaysPage) -> FetcherResult<Self> {
        let total: Option<usize> = xml::convert(page.total.as_deref(), "plays total")?;

        let (owner, declared_total) = match subject {
            PlaysSubject::User(name) => {
                let not_found = || FetcherError::NotFound(format!("plays of user {name}"));
                let total = total.ok_or_else(not_found)?;
                let username = non_empty_owned(page.username).ok_or_else(not_found)?;
                let id = xml::convert(page.userid.as_deref(), "plays user id")?.ok_or_else(not_found)?;
                (PlaysOwner::User { name: username, id }, total)
            }
            PlaysSubject::Game(id) => {
                let total = total
                    .ok_or_else(|| FetcherError::NotFound(format!("plays of game {id}")))?;
                (PlaysOwner::Game { id: *id }, total)
            }
        };

        let mut plays = Plays {
            owner,
            declared_total,
            plays: UniqueList::new(),
        };
        plays.add_plays(page.play);
        Ok(plays)
    }

    fn merge_page(&mut self, page: PlaysPage) -> FetcherResult<usize> {
        Ok(self.add_plays(page.play))
    }

    fn needs_more(&self) -> bool {
        self.plays.len() < self.declared_total
    }

    fn accumulated(&self) -> usize {
        self.plays.len()
    }

    fn progress(&self) -> (usize, usize) {
        (self.plays.len(), self.declared_total)
    }
}

#[doc(hidden)]
#[derive(Debug, Deserialize)]
pub struct PlaysPage {
    #[serde(rename = "@username")]
    username: Option<String>,
    #[serde(rename = "@userid")]
    userid: Option<String>,
    #[serde(rename = "@total")]
    total: Option<String>,
    #[serde(default)]
    play: Vec<PlayXml>,
}

#[derive(Debug, Deserialize)]
struct PlayXml {
    #[serde(rename = "@id")]
    id: Option<String>,
    #[serde(rename = "@userid")]
    userid: Option<String>,
    #[serde(rename = "@date")]
    date: Option<String>,
    #[serde(rename = "@quantity")]
    quantity: Option<String>,
    #[serde(rename = "@length")]
    length: Option<String>,
    #[serde(rename = "@incomplete")]
    incomplete: Option<String>,
    #[serde(rename = "@nowinstats")]
    nowinstats: Option<String>,
    #[serde(rename = "@location")]
    location: Option<String>,
    item: Option<PlayItemXml>,
    comments: Option<String>,
    players: Option<PlayersXml>,
}

impl PlayXml {
    fn into_session(self) -> Option<PlaySession> {
        let (game_id, game_name, game_subtypes) = match self.item {
            Some(item) => (
                xml::convert_quiet(item.objectid.as_deref()),
                non_empty_owned(item.name),
                item.subtypes
                    .map(|s| s.subtype)
                    .unwrap_or_default()
                    .into_iter()
                    .filter_map(|v| non_empty_owned(v.value))
                    .collect(),
            ),
            None => (None, None, Vec::new()),
        };

        Some(PlaySession {
            id: xml::convert_quiet(self.id.as_deref())?,
            user_id: xml::convert_quiet(self.userid.as_deref()),
            date: xml::convert_quiet(self.date.as_deref()),
            quantity: xml::convert_or(self.quantity.as_deref(), 1),
            duration: xml::convert_or(self.length.as_deref(), 0),
            incomplete: xml::flag(self.incomplete.as_deref()),
            nowinstats: xml::flag(self.nowinstats.as_deref()),
            location: non_empty_owned(self.location),
            game_id,
            game_name,
            game_subtypes,
            comment: non_empty_owned(self.comments),
            players: self
                .players
                .map(|p| p.player)
                .unwrap_or_default()
                .into_iter()
                .map(PlayerXml::into_player)
                .collect(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct PlayItemXml {
    #[serde(rename = "@name")]
    name: Option<String>,
    #[serde(rename = "@objectid")]
    objectid: Option<String>,
    subtypes: Option<SubtypesXml>,
}

#[derive(Debug, Deserialize)]
struct SubtypesXml {
    #[serde(default)]
    subtype: Vec<ValueXml>,
}

#[derive(Debug, Deserialize)]
struct PlayersXml {
    #[serde(default)]
    player: Vec<PlayerXml>,
}

#[derive(Debug, Deserialize)]
struct PlayerXml {
    #[serde(rename = "@username")]
    username: Option<String>,
    #[serde(rename = "@userid")]
    userid: Option<String>,
    #[serde(rename = "@name")]
    name: Option<String>,
    #[serde(rename = "@startposition")]
    startposition: Option<String>,
    #[serde(rename = "@color")]
    color: Option<String>,
    #[serde(rename = "@score")]
    score: Option<String>,
    #[serde(rename = "@new")]
    new: Option<String>,
    #[serde(rename = "@rating")]
    rating: Option<String>,
    #[serde(rename = "@win")]
    win: Option<String>,
}

impl PlayerXml {
    fn into_player(self) -> Player {
        Player {
            username: non_empty_owned(self.username),
            // anonymous players carry userid="0"
            user_id: xml::convert_quiet(self.userid.as_deref()).filter(|id| *id != 0),
            name: non_empty_owned(self.name),
            start_position: non_empty_owned(self.startposition),
            color: non_empty_owned(self.color),
            score: non_empty_owned(self.score),
            rating: xml::convert_quiet(self.rating.as_deref()),
            new: xml::flag(self.new.as_deref()),
            win: xml::flag(self.win.as_deref()),
        }
    }
}
