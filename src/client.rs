//! Public entry point: one method per API operation
//!
//! Arguments are validated before any request is sent; a rejected argument is
//! a [`FetcherError::Validation`] and never costs rate-limit budget.

use chrono::NaiveDate;
use std::sync::Arc;
use tracing::{debug, info};
use url::Url;

use crate::config::ClientConfig;
use crate::fetcher::cache::CacheConfig;
use crate::fetcher::shared_resources::{global_http_client, global_rate_limiter};
use crate::fetcher::transport::{RateLimitedTransport, ReqwestTransport};
use crate::fetcher::{
    BggHttpClient, FetcherError, FetcherResult, PaginationHelper, ProgressSink, Transport,
};
use crate::objects::family::{family_from_page, FamilyPage};
use crate::objects::game::{games_from_page, ThingPage};
use crate::objects::hot::HotPage;
use crate::objects::search::{results_from_page, SearchPage};
use crate::objects::{
    Collection, Family, Game, Guild, HotItemKind, HotItems, Plays, PlaysSubject, SearchKind,
    SearchResult, User,
};

/// Format of date query parameters
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Which parts of a user profile to request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserOptions {
    pub buddies: bool,
    pub guilds: bool,
    pub hot: bool,
    pub top: bool,
}

impl Default for UserOptions {
    fn default() -> Self {
        Self {
            buddies: true,
            guilds: true,
            hot: true,
            top: true,
        }
    }
}

/// Plays of exactly one user or one game, optionally limited by date
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaysQuery {
    pub user: Option<String>,
    pub game_id: Option<u64>,
    pub min_date: Option<NaiveDate>,
    pub max_date: Option<NaiveDate>,
    /// Restrict to one item subtype, e.g. `boardgame`
    pub subtype: Option<String>,
}

impl PlaysQuery {
    /// Plays logged by `user`
    pub fn user(user: impl Into<String>) -> Self {
        Self {
            user: Some(user.into()),
            ..Self::default()
        }
    }

    /// Plays of game `game_id`
    pub fn game(game_id: u64) -> Self {
        Self {
            game_id: Some(game_id),
            ..Self::default()
        }
    }

    fn validate(&self) -> FetcherResult<(PlaysSubject, Vec<(&'static str, String)>)> {
        let mut params = Vec::new();
        let subject = match (&self.user, self.game_id) {
            (Some(_), Some(_)) => {
                return Err(FetcherError::Validation(
                    "plays can be listed for a user or a game, not both".to_string(),
                ))
            }
            (None, None) => {
                return Err(FetcherError::Validation(
                    "a user name or a game id is required".to_string(),
                ))
            }
            (Some(user), None) => {
                let user = user.trim();
                if user.is_empty() {
                    return Err(FetcherError::Validation("user name is empty".to_string()));
                }
                params.push(("username", user.to_string()));
                PlaysSubject::User(user.to_string())
            }
            (None, Some(0)) => {
                return Err(FetcherError::Validation("game id must be positive".to_string()))
            }
            (None, Some(id)) => {
                params.push(("id", id.to_string()));
                params.push(("type", "thing".to_string()));
                PlaysSubject::Game(id)
            }
        };

        if let (Some(min), Some(max)) = (self.min_date, self.max_date) {
            if min > max {
                return Err(FetcherError::Validation(format!(
                    "min date {min} is after max date {max}"
                )));
            }
        }
        if let Some(min) = self.min_date {
            params.push(("mindate", min.format(DATE_FORMAT).to_string()));
        }
        if let Some(max) = self.max_date {
            params.push(("maxdate", max.format(DATE_FORMAT).to_string()));
        }
        if let Some(subtype) = self.subtype.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            params.push(("subtype", subtype.to_string()));
        }

        Ok((subject, params))
    }
}

/// Collection request with the server-side filters
///
/// Tri-state flags: `Some(true)` keeps only matching items, `Some(false)`
/// excludes them, `None` does not filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectionQuery {
    pub user: String,
    pub subtype: Option<SearchKind>,
    pub exclude_subtype: Option<SearchKind>,
    pub own: Option<bool>,
    pub rated: Option<bool>,
    pub played: Option<bool>,
    pub commented: Option<bool>,
    pub for_trade: Option<bool>,
    pub want_in_trade: Option<bool>,
    pub wishlist: Option<bool>,
    pub preordered: Option<bool>,
    pub want_to_play: Option<bool>,
    pub want_to_buy: Option<bool>,
    pub prev_owned: Option<bool>,
    /// 1 (must have) to 5 (don't buy this)
    pub wishlist_priority: Option<u8>,
    /// Lowest personal rating, 1 to 10
    pub min_rating: Option<u8>,
    /// Highest personal rating, 1 to 10
    pub max_rating: Option<u8>,
    pub min_plays: Option<u32>,
    pub max_plays: Option<u32>,
    pub modified_since: Option<NaiveDate>,
}

impl CollectionQuery {
    /// Unfiltered collection of `user`
    pub fn new(user: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            ..Self::default()
        }
    }

    fn validate(&self) -> FetcherResult<Vec<(&'static str, String)>> {
        let user = self.user.trim();
        if user.is_empty() {
            return Err(FetcherError::Validation("user name is empty".to_string()));
        }

        for (field, rating) in [("min rating", self.min_rating), ("max rating", self.max_rating)] {
            if let Some(rating) = rating {
                if !(1..=10).contains(&rating) {
                    return Err(FetcherError::Validation(format!(
                        "{field} must be between 1 and 10, got {rating}"
                    )));
                }
            }
        }
        if let (Some(min), Some(max)) = (self.min_rating, self.max_rating) {
            if min > max {
                return Err(FetcherError::Validation(format!(
                    "min rating {min} is above max rating {max}"
                )));
            }
        }
        if let Some(priority) = self.wishlist_priority {
            if !(1..=5).contains(&priority) {
                return Err(FetcherError::Validation(format!(
                    "wishlist priority must be between 1 and 5, got {priority}"
                )));
            }
        }
        if let (Some(min), Some(max)) = (self.min_plays, self.max_plays) {
            if min > max {
                return Err(FetcherError::Validation(format!(
                    "min plays {min} is above max plays {max}"
                )));
            }
        }

        let mut params = vec![("username", user.to_string()), ("stats", "1".to_string())];
        if let Some(kind) = self.subtype {
            params.push(("subtype", kind.to_string()));
        }
        if let Some(kind) = self.exclude_subtype {
            params.push(("excludesubtype", kind.to_string()));
        }

        let flags = [
            ("own", self.own),
            ("rated", self.rated),
            ("played", self.played),
            ("comment", self.commented),
            ("trade", self.for_trade),
            ("want", self.want_in_trade),
            ("wishlist", self.wishlist),
            ("preordered", self.preordered),
            ("wanttoplay", self.want_to_play),
            ("wanttobuy", self.want_to_buy),
            ("prevowned", self.prev_owned),
        ];
        for (name, flag) in flags {
            if let Some(flag) = flag {
                params.push((name, if flag { "1" } else { "0" }.to_string()));
            }
        }

        if let Some(priority) = self.wishlist_priority {
            params.push(("wishlistpriority", priority.to_string()));
        }
        if let Some(rating) = self.min_rating {
            params.push(("minrating", rating.to_string()));
        }
        if let Some(rating) = self.max_rating {
            params.push(("rating", rating.to_string()));
        }
        if let Some(plays) = self.min_plays {
            params.push(("minplays", plays.to_string()));
        }
        if let Some(plays) = self.max_plays {
            params.push(("maxplays", plays.to_string()));
        }
        if let Some(date) = self.modified_since {
            params.push(("modifiedsince", date.format(DATE_FORMAT).to_string()));
        }

        Ok(params)
    }
}

/// How to identify a game
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameLookup {
    Id(u64),
    Name(String),
}

/// Which game to pick when a name matches several
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChoosePolicy {
    /// First search hit
    #[default]
    First,
    /// Most recently published
    Recent,
    /// Best (lowest) board game rank
    BestRank,
}

impl std::str::FromStr for ChoosePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "first" => Ok(Self::First),
            "recent" => Ok(Self::Recent),
            "best-rank" | "best_rank" | "bestrank" => Ok(Self::BestRank),
            other => Err(format!("invalid choose policy: {other} (expected first, recent or best-rank)")),
        }
    }
}

/// BoardGameGeek XML API client
#[derive(Clone)]
pub struct BggClient {
    http: BggHttpClient,
}

impl BggClient {
    /// Client talking to the real API through the shared rate limiter and the
    /// configured cache
    ///
    /// # Errors
    /// [`FetcherError::Validation`] for an invalid endpoint or cache URI.
    pub fn new(config: ClientConfig) -> FetcherResult<Self> {
        let cache = CacheConfig::from_uri(&config.cache)?;
        let limiter = global_rate_limiter(config.requests_per_minute);
        let transport: Arc<dyn Transport> = Arc::new(RateLimitedTransport::new(
            ReqwestTransport::new(global_http_client()),
            limiter,
        ));
        Self::with_transport(config, cache.wrap(transport))
    }

    /// Client sending every request through `transport` as-is
    ///
    /// # Errors
    /// [`FetcherError::Validation`] for an invalid endpoint.
    pub fn with_transport(config: ClientConfig, transport: Arc<dyn Transport>) -> FetcherResult<Self> {
        Url::parse(&config.api_endpoint).map_err(|e| {
            FetcherError::Validation(format!("invalid API endpoint '{}': {e}", config.api_endpoint))
        })?;

        Ok(Self {
            http: BggHttpClient::new(transport, config.api_endpoint, config.retry),
        })
    }

    /// Underlying page client
    pub fn http(&self) -> &BggHttpClient {
        &self.http
    }

    /// Fetch a guild, paging through its member list when `include_members` is set
    pub async fn fetch_guild(
        &self,
        id: u64,
        progress: Option<&mut dyn ProgressSink>,
        include_members: bool,
    ) -> FetcherResult<Guild> {
        if id == 0 {
            return Err(FetcherError::Validation("guild id must be positive".to_string()));
        }

        let mut params = vec![("id", id.to_string())];
        if include_members {
            params.push(("members", "1".to_string()));
        }

        info!("Fetching guild {}", id);
        PaginationHelper::fetch_all(&self.http, "guild", &params, &id, progress).await
    }

    /// Fetch a user profile, paging through buddies and guilds
    pub async fn fetch_user(
        &self,
        name: &str,
        progress: Option<&mut dyn ProgressSink>,
        options: UserOptions,
    ) -> FetcherResult<User> {
        let name = name.trim();
        if name.is_empty() {
            return Err(FetcherError::Validation("user name is empty".to_string()));
        }

        let flag = |on: bool| if on { "1" } else { "0" }.to_string();
        let params = vec![
            ("name", name.to_string()),
            ("buddies", flag(options.buddies)),
            ("guilds", flag(options.guilds)),
            ("hot", flag(options.hot)),
            ("top", flag(options.top)),
        ];

        info!("Fetching user {}", name);
        PaginationHelper::fetch_all(&self.http, "user", &params, name, progress).await
    }

    /// Fetch every play of a user or a game
    pub async fn fetch_plays(
        &self,
        query: &PlaysQuery,
        progress: Option<&mut dyn ProgressSink>,
    ) -> FetcherResult<Plays> {
        let (subject, params) = query.validate()?;

        info!("Fetching plays of {:?}", subject);
        PaginationHelper::fetch_all(&self.http, "plays", &params, &subject, progress).await
    }

    /// Fetch a user's collection
    pub async fn fetch_collection(&self, query: &CollectionQuery) -> FetcherResult<Collection> {
        let params = query.validate()?;
        let user = query.user.trim();

        info!("Fetching collection of {}", user);
        PaginationHelper::fetch_all(&self.http, "collection", &params, user, None).await
    }

    /// Fetch a hot list
    pub async fn hot_items(&self, kind: HotItemKind) -> FetcherResult<HotItems> {
        let page: HotPage = self
            .http
            .fetch_page("hot", &[("type", kind.to_string())])
            .await?;
        Ok(HotItems::from_page(page))
    }

    /// Search items by name
    pub async fn search(
        &self,
        query: &str,
        kinds: &[SearchKind],
        exact: bool,
    ) -> FetcherResult<Vec<SearchResult>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(FetcherError::Validation("search query is empty".to_string()));
        }

        let mut params = vec![("query", query.to_string())];
        if !kinds.is_empty() {
            let kinds: Vec<&str> = kinds.iter().map(SearchKind::as_str).collect();
            params.push(("type", kinds.join(",")));
        }
        if exact {
            params.push(("exact", "1".to_string()));
        }

        let page: SearchPage = self.http.fetch_page("search", &params).await?;
        let results = results_from_page(page);
        debug!("Search for {:?} returned {} results", query, results.len());
        Ok(results)
    }

    /// Fetch games by id, with statistics, videos and versions, in one request
    ///
    /// Unknown ids are silently missing from the result.
    pub async fn fetch_games(&self, ids: &[u64]) -> FetcherResult<Vec<Game>> {
        if ids.is_empty() || ids.contains(&0) {
            return Err(FetcherError::Validation("game ids must be positive".to_string()));
        }

        let ids: Vec<String> = ids.iter().map(u64::to_string).collect();
        let params = [
            ("id", ids.join(",")),
            ("stats", "1".to_string()),
            ("videos", "1".to_string()),
            ("versions", "1".to_string()),
        ];
        let page: ThingPage = self.http.fetch_page("thing", &params).await?;
        Ok(games_from_page(page))
    }

    /// Fetch a family and the items linked to it
    pub async fn fetch_family(&self, id: u64) -> FetcherResult<Family> {
        if id == 0 {
            return Err(FetcherError::Validation("family id must be positive".to_string()));
        }

        info!("Fetching family {}", id);
        let page: FamilyPage = self.http.fetch_page("family", &[("id", id.to_string())]).await?;
        family_from_page(page, id).ok_or_else(|| FetcherError::NotFound(format!("family {id}")))
    }

    /// Fetch one game by id or by name
    pub async fn fetch_game(&self, lookup: GameLookup, policy: ChoosePolicy) -> FetcherResult<Game> {
        match lookup {
            GameLookup::Id(id) => self.fetch_game_by_id(id).await,
            GameLookup::Name(name) => {
                let candidates = self.game_candidates(&name).await?;
                match policy {
                    ChoosePolicy::BestRank => self.best_ranked(&name, &candidates).await,
                    _ => {
                        let id = choose_by_search(&candidates, policy)
                            .ok_or_else(|| FetcherError::NotFound(format!("game {name}")))?;
                        self.fetch_game_by_id(id).await
                    }
                }
            }
        }
    }

    /// Resolve a game name to an id
    pub async fn get_game_id(&self, name: &str, policy: ChoosePolicy) -> FetcherResult<u64> {
        let candidates = self.game_candidates(name).await?;
        match policy {
            ChoosePolicy::BestRank => Ok(self.best_ranked(name, &candidates).await?.id),
            _ => choose_by_search(&candidates, policy)
                .ok_or_else(|| FetcherError::NotFound(format!("game {name}"))),
        }
    }

    async fn fetch_game_by_id(&self, id: u64) -> FetcherResult<Game> {
        let games = self.fetch_games(&[id]).await?;
        games
            .into_iter()
            .find(|game| game.id == id)
            .ok_or_else(|| FetcherError::NotFound(format!("game {id}")))
    }

    async fn game_candidates(&self, name: &str) -> FetcherResult<Vec<SearchResult>> {
        let candidates = self.search(name, &[SearchKind::BoardGame], true).await?;
        if candidates.is_empty() {
            return Err(FetcherError::NotFound(format!("game {}", name.trim())));
        }
        Ok(candidates)
    }

    async fn best_ranked(&self, name: &str, candidates: &[SearchResult]) -> FetcherResult<Game> {
        let ids: Vec<u64> = candidates.iter().map(|c| c.id).collect();
        let mut games = self.fetch_games(&ids).await?;
        // keep search order so ties go to the first hit
        games.sort_by_key(|game| ids.iter().position(|id| *id == game.id));

        let mut best: Option<(u32, usize)> = None;
        for (i, game) in games.iter().enumerate() {
            if let Some(rank) = game.boardgame_rank() {
                if best.map_or(true, |(best_rank, _)| rank < best_rank) {
                    best = Some((rank, i));
                }
            }
        }

        let index = best.map_or(0, |(_, i)| i);
        if index >= games.len() {
            return Err(FetcherError::NotFound(format!("game {}", name.trim())));
        }
        Ok(games.swap_remove(index))
    }
}

/// Pick a candidate id without fetching game details
fn choose_by_search(candidates: &[SearchResult], policy: ChoosePolicy) -> Option<u64> {
    match policy {
        ChoosePolicy::Recent => {
            let mut best: Option<&SearchResult> = None;
            for candidate in candidates {
                let year = candidate.year_published.unwrap_or(i32::MIN);
                if best.map_or(true, |b| year > b.year_published.unwrap_or(i32::MIN)) {
                    best = Some(candidate);
                }
            }
            best.map(|c| c.id)
        }
        _ => candidates.first().map(|c| c.id),
    }
}
