//! Board games and expansions decoded from the `thing` endpoint

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use super::Rank;
use crate::xml::{self, non_empty, non_empty_owned, NameXml, RanksXml, ValueXml};

/// Reference to a related entity (designer, category, expansion, ...)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameLink {
    pub id: u64,
    pub name: String,
}

/// A video posted on a game page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameVideo {
    pub id: u64,
    pub title: String,
    /// e.g. `review`, `instructional`
    pub category: Option<String>,
    pub language: Option<String>,
    pub link: String,
    pub uploader: Option<String>,
    pub uploader_id: Option<u64>,
    pub posted_at: Option<DateTime<FixedOffset>>,
}

/// A published edition of a game
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameVersion {
    pub id: u64,
    pub name: Option<String>,
    pub year_published: Option<i32>,
    pub language: Option<String>,
    pub publisher: Option<String>,
    pub artist: Option<String>,
    pub product_code: Option<String>,
    pub width: Option<f64>,
    pub length: Option<f64>,
    pub depth: Option<f64>,
    pub weight: Option<f64>,
    pub image: Option<String>,
    pub thumbnail: Option<String>,
}

/// Community statistics of a game
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GameStats {
    pub users_rated: Option<u32>,
    pub average: Option<f64>,
    pub bayes_average: Option<f64>,
    pub stddev: Option<f64>,
    pub median: Option<f64>,
    pub owned: Option<u32>,
    pub trading: Option<u32>,
    pub wanting: Option<u32>,
    pub wishing: Option<u32>,
    pub num_comments: Option<u32>,
    pub num_weights: Option<u32>,
    pub average_weight: Option<f64>,
    pub ranks: Vec<Rank>,
}

impl GameStats {
    /// Rank in the overall board game list
    pub fn boardgame_rank(&self) -> Option<u32> {
        self.ranks
            .iter()
            .find(|rank| rank.name.as_deref() == Some("boardgame"))
            .and_then(|rank| rank.value)
    }
}

/// A board game or expansion
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Game {
    pub id: u64,
    pub name: String,
    pub alternative_names: Vec<String>,
    /// `boardgame` or `boardgameexpansion`
    pub kind: String,
    pub expansion: bool,
    pub year_published: Option<i32>,
    pub min_players: Option<u32>,
    pub max_players: Option<u32>,
    pub playing_time: Option<u32>,
    pub min_playing_time: Option<u32>,
    pub max_playing_time: Option<u32>,
    pub min_age: Option<u32>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub thumbnail: Option<String>,
    pub families: Vec<GameLink>,
    pub categories: Vec<GameLink>,
    pub mechanics: Vec<GameLink>,
    pub designers: Vec<GameLink>,
    pub artists: Vec<GameLink>,
    pub publishers: Vec<GameLink>,
    pub implementations: Vec<GameLink>,
    /// Expansions of this game
    pub expansions: Vec<GameLink>,
    /// Games this expansion applies to
    pub expands: Vec<GameLink>,
    pub videos: Vec<GameVideo>,
    pub versions: Vec<GameVersion>,
    pub stats: GameStats,
}

impl Game {
    /// Shortcut for [`GameStats::boardgame_rank`]
    pub fn boardgame_rank(&self) -> Option<u32> {
        self.stats.boardgame_rank()
    }
}

/// Decode every item of a `thing` page that has an id and a primary name
pub(crate) fn games_from_page(page: ThingPage) -> Vec<Game> {
    page.item.into_iter().filter_map(ThingXml::into_game).collect()
}

#[derive(Debug, Deserialize)]
pub(crate) struct ThingPage {
    #[serde(default)]
    item: Vec<ThingXml>,
}

#[derive(Debug, Deserialize)]
struct ThingXml {
    #[serde(rename = "@type")]
    kind: Option<String>,
    #[serde(rename = "@id")]
    id: Option<String>,
    thumbnail: Option<String>,
    image: Option<String>,
    #[serde(default)]
    name: Vec<NameXml>,
    description: Option<String>,
    yearpublished: Option<ValueXml>,
    minplayers: Option<ValueXml>,
    maxplayers: Option<ValueXml>,
    playingtime: Option<ValueXml>,
    minplaytime: Option<ValueXml>,
    maxplaytime: Option<ValueXml>,
    minage: Option<ValueXml>,
    #[serde(default)]
    link: Vec<LinkXml>,
    videos: Option<VideosXml>,
    versions: Option<VersionsXml>,
    statistics: Option<StatisticsXml>,
}

/// `<link type="..." id="..." value="..."/>`
#[derive(Debug, Deserialize)]
pub(crate) struct LinkXml {
    #[serde(rename = "@type")]
    pub kind: Option<String>,
    #[serde(rename = "@id")]
    pub id: Option<String>,
    #[serde(rename = "@value")]
    pub value: Option<String>,
    #[serde(rename = "@inbound")]
    pub inbound: Option<String>,
}

impl LinkXml {
    pub fn is(&self, kind: &str) -> bool {
        self.kind.as_deref() == Some(kind)
    }

    /// Links without an id or a value are dropped
    pub fn to_link(&self) -> Option<GameLink> {
        Some(GameLink {
            id: xml::convert_quiet(self.id.as_deref())?,
            name: non_empty_owned(self.value.clone())?,
        })
    }
}

#[derive(Debug, Deserialize)]
struct VideosXml {
    #[serde(default)]
    video: Vec<VideoXml>,
}

#[derive(Debug, Deserialize)]
struct VideoXml {
    #[serde(rename = "@id")]
    id: Option<String>,
    #[serde(rename = "@title")]
    title: Option<String>,
    #[serde(rename = "@category")]
    category: Option<String>,
    #[serde(rename = "@language")]
    language: Option<String>,
    #[serde(rename = "@link")]
    link: Option<String>,
    #[serde(rename = "@username")]
    username: Option<String>,
    #[serde(rename = "@userid")]
    userid: Option<String>,
    #[serde(rename = "@postdate")]
    postdate: Option<String>,
}

impl VideoXml {
    fn into_video(self) -> Option<GameVideo> {
        Some(GameVideo {
            id: xml::convert_quiet(self.id.as_deref())?,
            title: non_empty_owned(self.title)?,
            link: non_empty_owned(self.link)?,
            category: non_empty_owned(self.category),
            language: non_empty_owned(self.language),
            uploader: non_empty_owned(self.username),
            uploader_id: xml::convert_quiet(self.userid.as_deref()),
            posted_at: non_empty(self.postdate.as_deref())
                .and_then(|date| DateTime::parse_from_rfc3339(date).ok()),
        })
    }
}

#[derive(Debug, Deserialize)]
struct VersionsXml {
    #[serde(default)]
    item: Vec<VersionXml>,
}

#[derive(Debug, Deserialize)]
struct VersionXml {
    #[serde(rename = "@type")]
    kind: Option<String>,
    #[serde(rename = "@id")]
    id: Option<String>,
    thumbnail: Option<String>,
    image: Option<String>,
    #[serde(default)]
    name: Vec<NameXml>,
    #[serde(default)]
    link: Vec<LinkXml>,
    yearpublished: Option<ValueXml>,
    productcode: Option<ValueXml>,
    width: Option<ValueXml>,
    length: Option<ValueXml>,
    depth: Option<ValueXml>,
    weight: Option<ValueXml>,
}

impl VersionXml {
    fn into_version(self) -> Option<GameVersion> {
        if self.kind.as_deref().is_some_and(|kind| kind != "boardgameversion") {
            return None;
        }
        let first_link = |kind: &str| {
            self.link
                .iter()
                .filter(|link| link.is(kind))
                .find_map(|link| non_empty_owned(link.value.clone()))
        };

        Some(GameVersion {
            id: xml::convert_quiet(self.id.as_deref())?,
            name: self
                .name
                .iter()
                .find(|n| n.is_primary())
                .and_then(|n| non_empty_owned(n.value.clone())),
            year_published: ValueXml::parse(&self.yearpublished),
            language: first_link("language"),
            publisher: first_link("boardgamepublisher"),
            artist: first_link("boardgameartist"),
            product_code: ValueXml::get(&self.productcode).map(str::to_string),
            width: ValueXml::parse(&self.width),
            length: ValueXml::parse(&self.length),
            depth: ValueXml::parse(&self.depth),
            weight: ValueXml::parse(&self.weight),
            image: non_empty_owned(self.image.clone()),
            thumbnail: non_empty_owned(self.thumbnail.clone()),
        })
    }
}

#[derive(Debug, Deserialize)]
struct StatisticsXml {
    ratings: Option<RatingsXml>,
}

#[derive(Debug, Default, Deserialize)]
struct RatingsXml {
    usersrated: Option<ValueXml>,
    average: Option<ValueXml>,
    bayesaverage: Option<ValueXml>,
    stddev: Option<ValueXml>,
    median: Option<ValueXml>,
    owned: Option<ValueXml>,
    trading: Option<ValueXml>,
    wanting: Option<ValueXml>,
    wishing: Option<ValueXml>,
    numcomments: Option<ValueXml>,
    numweights: Option<ValueXml>,
    averageweight: Option<ValueXml>,
    ranks: Option<RanksXml>,
}

impl ThingXml {
    fn into_game(self) -> Option<Game> {
        let id = xml::convert_quiet(self.id.as_deref())?;
        let name = self
            .name
            .iter()
            .find(|n| n.is_primary())
            .and_then(|n| non_empty(n.value.as_deref()))?
            .to_string();
        let alternative_names = self
            .name
            .iter()
            .filter(|n| !n.is_primary())
            .filter_map(|n| non_empty_owned(n.value.clone()))
            .collect();

        let kind = non_empty_owned(self.kind).unwrap_or_else(|| "boardgame".to_string());
        let links = |wanted: &str, inbound: Option<bool>| -> Vec<GameLink> {
            self.link
                .iter()
                .filter(|link| link.is(wanted))
                .filter(|link| inbound.map_or(true, |want| xml::flag(link.inbound.as_deref()) == want))
                .filter_map(LinkXml::to_link)
                .collect()
        };

        let ratings = self
            .statistics
            .and_then(|s| s.ratings)
            .unwrap_or_default();

        Some(Game {
            id,
            name,
            alternative_names,
            expansion: kind == "boardgameexpansion",
            year_published: ValueXml::parse(&self.yearpublished),
            min_players: ValueXml::parse(&self.minplayers),
            max_players: ValueXml::parse(&self.maxplayers),
            playing_time: ValueXml::parse(&self.playingtime),
            min_playing_time: ValueXml::parse(&self.minplaytime),
            max_playing_time: ValueXml::parse(&self.maxplaytime),
            min_age: ValueXml::parse(&self.minage),
            description: non_empty(self.description.as_deref()).map(xml::unescape_html),
            image: non_empty_owned(self.image.clone()),
            thumbnail: non_empty_owned(self.thumbnail.clone()),
            families: links("boardgamefamily", None),
            categories: links("boardgamecategory", None),
            mechanics: links("boardgamemechanic", None),
            designers: links("boardgamedesigner", None),
            artists: links("boardgameartist", None),
            publishers: links("boardgamepublisher", None),
            implementations: links("boardgameimplementation", None),
            expansions: links("boardgameexpansion", Some(false)),
            expands: links("boardgameexpansion", Some(true)),
            videos: self
                .videos
                .map(|v| v.video.into_iter().filter_map(VideoXml::into_video).collect())
                .unwrap_or_default(),
            versions: self
                .versions
                .map(|v| v.item.into_iter().filter_map(VersionXml::into_version).collect())
                .unwrap_or_default(),
            kind,
            stats: GameStats {
                users_rated: ValueXml::parse(&ratings.usersrated),
                average: ValueXml::parse(&ratings.average),
                bayes_average: ValueXml::parse(&ratings.bayesaverage),
                stddev: ValueXml::parse(&ratings.stddev),
                median: ValueXml::parse(&ratings.median),
                owned: ValueXml::parse(&ratings.owned),
                trading: ValueXml::parse(&ratings.trading),
                wanting: ValueXml::parse(&ratings.wanting),
                wishing: ValueXml::parse(&ratings.wishing),
                num_comments: ValueXml::parse(&ratings.numcomments),
                num_weights: ValueXml::parse(&ratings.numweights),
                average_weight: ValueXml::parse(&ratings.averageweight),
                ranks: Rank::from_xml(ratings.ranks),
            },
        })
    }
}
