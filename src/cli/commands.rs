//! Subcommand arguments, execution and rendering

use chrono::NaiveDate;
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing::info;

use super::{CliError, OutputFormat};
use crate::client::{BggClient, ChoosePolicy, CollectionQuery, GameLookup, PlaysQuery, UserOptions};
use crate::fetcher::ProgressError;
use crate::objects::{
    Collection, Family, Game, GameLink, Guild, HotItemKind, HotItems, Plays, SearchKind,
    SearchResult, User,
};

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|e| format!("invalid date '{s}' (expected YYYY-MM-DD): {e}"))
}

/// Progress bar fed by the pagination callback
fn create_progress_bar(message: String) -> ProgressBar {
    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
            .expect("hardcoded template is valid")
            .progress_chars("#>-"),
    );
    pb.set_message(message);
    pb
}

fn progress_callback(pb: &ProgressBar) -> impl FnMut(usize, usize) -> Result<(), ProgressError> + Send + '_ {
    move |fetched, total| {
        pb.set_length(total as u64);
        pb.set_position(fetched as u64);
        Ok(())
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_field(label: &str, value: Option<impl std::fmt::Display>) {
    if let Some(value) = value {
        println!("{label:<16} {value}");
    }
}

/// `bgg user`
#[derive(Args, Debug)]
pub struct UserArgs {
    /// User name
    pub name: String,

    /// Skip the buddy list
    #[arg(long)]
    pub no_buddies: bool,

    /// Skip the guild list
    #[arg(long)]
    pub no_guilds: bool,

    /// Skip the hot list
    #[arg(long)]
    pub no_hot: bool,

    /// Skip the top list
    #[arg(long)]
    pub no_top: bool,
}

impl UserArgs {
    /// Fetch and print the user
    pub async fn execute(&self, bgg: &BggClient, format: OutputFormat) -> Result<(), CliError> {
        let options = UserOptions {
            buddies: !self.no_buddies,
            guilds: !self.no_guilds,
            hot: !self.no_hot,
            top: !self.no_top,
        };

        let pb = create_progress_bar(format!("Fetching {}", self.name));
        let mut progress = progress_callback(&pb);
        let result = bgg.fetch_user(&self.name, Some(&mut progress), options).await;
        pb.finish_and_clear();
        let user = result?;

        match format {
            OutputFormat::Json => print_json(&user),
            OutputFormat::Human => {
                print_user(&user);
                Ok(())
            }
        }
    }
}

fn print_user(user: &User) {
    println!("User: {} (id: {})", user.name, user.id);
    let full_name = [user.first_name.as_deref(), user.last_name.as_deref()]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(" ");
    print_field("Name:", Some(full_name).filter(|n| !n.is_empty()));
    print_field("Registered:", user.year_registered);
    print_field("Country:", user.country.as_deref());
    print_field("Trade rating:", user.trade_rating);
    println!("Buddies:         {} of {}", user.buddies.len(), user.total_buddies());
    println!("Guilds:          {} of {}", user.guilds.len(), user.total_guilds());
    for item in &user.top {
        println!("  top #{:<3} {} ({})", item.rank, item.name, item.id);
    }
    for item in &user.hot {
        println!("  hot #{:<3} {} ({})", item.rank, item.name, item.id);
    }
}

/// `bgg guild`
#[derive(Args, Debug)]
pub struct GuildArgs {
    /// Guild id
    pub id: u64,

    /// Only fetch the guild header
    #[arg(long)]
    pub no_members: bool,
}

impl GuildArgs {
    /// Fetch and print the guild
    pub async fn execute(&self, bgg: &BggClient, format: OutputFormat) -> Result<(), CliError> {
        let pb = create_progress_bar(format!("Fetching guild {}", self.id));
        let mut progress = progress_callback(&pb);
        let result = bgg.fetch_guild(self.id, Some(&mut progress), !self.no_members).await;
        pb.finish_and_clear();
        let guild = result?;

        match format {
            OutputFormat::Json => print_json(&guild),
            OutputFormat::Human => {
                print_guild(&guild);
                Ok(())
            }
        }
    }
}

fn print_guild(guild: &Guild) {
    println!("Guild: {} (id: {})", guild.name, guild.id);
    print_field("Category:", guild.category.as_deref());
    print_field("Created:", guild.created.as_deref());
    print_field("Manager:", guild.manager.as_deref());
    print_field("Website:", guild.website.as_deref());
    print_field("Address:", guild.address());
    print_field("City:", guild.location.city.as_deref());
    print_field("Country:", guild.location.country.as_deref());
    if let Some(count) = guild.member_count {
        println!("Members:         {} of {}", guild.members.len(), count);
        for member in &guild.members {
            println!("  {member}");
        }
    }
}

/// `bgg game`
#[derive(Args, Debug)]
pub struct GameArgs {
    /// Game name (exact board game match)
    pub name: Option<String>,

    /// Game id
    #[arg(long, conflicts_with = "name")]
    pub id: Option<u64>,

    /// Which match to pick when several games share the name: first, recent or best-rank
    #[arg(long, default_value = "first")]
    pub choose: ChoosePolicy,
}

impl GameArgs {
    /// Fetch and print the game
    pub async fn execute(&self, bgg: &BggClient, format: OutputFormat) -> Result<(), CliError> {
        let lookup = match (&self.name, self.id) {
            (_, Some(id)) => GameLookup::Id(id),
            (Some(name), None) => GameLookup::Name(name.clone()),
            (None, None) => {
                return Err(CliError::InvalidArgument(
                    "a game name or --id is required".to_string(),
                ))
            }
        };

        let game = bgg.fetch_game(lookup, self.choose).await?;
        match format {
            OutputFormat::Json => print_json(&game),
            OutputFormat::Human => {
                print_game(&game);
                Ok(())
            }
        }
    }
}

fn print_game(game: &Game) {
    println!("{} (id: {})", game.name, game.id);
    print_field("Type:", Some(&game.kind));
    print_field("Published:", game.year_published);
    if let (Some(min), Some(max)) = (game.min_players, game.max_players) {
        println!("{:<16} {}-{}", "Players:", min, max);
    }
    print_field("Playing time:", game.playing_time.map(|t| format!("{t} min")));
    print_field("Min age:", game.min_age);
    print_field("Rank:", game.boardgame_rank());
    print_field("Average:", game.stats.average.map(|a| format!("{a:.2}")));
    print_field("Weight:", game.stats.average_weight.map(|w| format!("{w:.2}")));
    let names = |links: &[GameLink]| {
        links.iter().map(|l| l.name.as_str()).collect::<Vec<_>>().join(", ")
    };
    for (label, links) in [
        ("Designers:", &game.designers),
        ("Categories:", &game.categories),
        ("Mechanics:", &game.mechanics),
        ("Expands:", &game.expands),
    ] {
        if !links.is_empty() {
            println!("{label:<16} {}", names(links));
        }
    }
    if !game.expansions.is_empty() {
        println!("{:<16} {}", "Expansions:", game.expansions.len());
    }
    if !game.versions.is_empty() {
        println!("{:<16} {}", "Versions:", game.versions.len());
    }
    if !game.videos.is_empty() {
        println!("{:<16} {}", "Videos:", game.videos.len());
    }
    if let Some(description) = &game.description {
        println!("\n{description}");
    }
}

/// `bgg family`
#[derive(Args, Debug)]
pub struct FamilyArgs {
    /// Family id
    pub id: u64,
}

impl FamilyArgs {
    /// Fetch and print the family
    pub async fn execute(&self, bgg: &BggClient, format: OutputFormat) -> Result<(), CliError> {
        let family = bgg.fetch_family(self.id).await?;
        match format {
            OutputFormat::Json => print_json(&family),
            OutputFormat::Human => {
                print_family(&family);
                Ok(())
            }
        }
    }
}

fn print_family(family: &Family) {
    println!("{} (id: {})", family.name, family.id);
    print_field("Type:", Some(&family.kind));
    if !family.alternative_names.is_empty() {
        println!("{:<16} {}", "Also known as:", family.alternative_names.join(", "));
    }
    println!("{:<16} {}", "Members:", family.members.len());
    for member in &family.members {
        println!("  {:>8} {}", member.id, member.name);
    }
    if let Some(description) = &family.description {
        println!("\n{description}");
    }
}

/// `bgg plays`
#[derive(Args, Debug)]
pub struct PlaysArgs {
    /// Plays logged by this user
    #[arg(long)]
    pub user: Option<String>,

    /// Plays of this game
    #[arg(long)]
    pub game_id: Option<u64>,

    /// Earliest play date (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    pub min_date: Option<NaiveDate>,

    /// Latest play date (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    pub max_date: Option<NaiveDate>,

    /// Item subtype, e.g. boardgame
    #[arg(long)]
    pub subtype: Option<String>,
}

impl PlaysArgs {
    /// Fetch and print the plays
    pub async fn execute(&self, bgg: &BggClient, format: OutputFormat) -> Result<(), CliError> {
        let query = PlaysQuery {
            user: self.user.clone(),
            game_id: self.game_id,
            min_date: self.min_date,
            max_date: self.max_date,
            subtype: self.subtype.clone(),
        };

        let pb = create_progress_bar("Fetching plays".to_string());
        let mut progress = progress_callback(&pb);
        let result = bgg.fetch_plays(&query, Some(&mut progress)).await;
        pb.finish_and_clear();
        let plays = result?;

        info!("Fetched {} of {} plays", plays.len(), plays.declared_total);
        match format {
            OutputFormat::Json => print_json(&plays),
            OutputFormat::Human => {
                print_plays(&plays);
                Ok(())
            }
        }
    }
}

fn print_plays(plays: &Plays) {
    println!("Plays: {} of {}", plays.len(), plays.declared_total);
    for play in plays.plays.iter() {
        let date = play
            .date
            .map(|d| d.to_string())
            .unwrap_or_else(|| "----------".to_string());
        println!(
            "  {date} {:>3}x {} ({} players, {} min)",
            play.quantity,
            play.game_name.as_deref().unwrap_or("?"),
            play.players.len(),
            play.duration
        );
    }
}

/// `bgg collection`
#[derive(Args, Debug)]
pub struct CollectionArgs {
    /// User name
    pub user: String,

    /// Item subtype to include
    #[arg(long)]
    pub subtype: Option<SearchKind>,

    /// Item subtype to exclude
    #[arg(long)]
    pub exclude_subtype: Option<SearchKind>,

    /// Filter on owned (true/false)
    #[arg(long)]
    pub own: Option<bool>,

    /// Filter on rated (true/false)
    #[arg(long)]
    pub rated: Option<bool>,

    /// Filter on played (true/false)
    #[arg(long)]
    pub played: Option<bool>,

    /// Filter on wishlist (true/false)
    #[arg(long)]
    pub wishlist: Option<bool>,

    /// Filter on for trade (true/false)
    #[arg(long)]
    pub for_trade: Option<bool>,

    /// Filter on want to play (true/false)
    #[arg(long)]
    pub want_to_play: Option<bool>,

    /// Filter on previously owned (true/false)
    #[arg(long)]
    pub prev_owned: Option<bool>,

    /// Wishlist priority, 1 to 5
    #[arg(long)]
    pub wishlist_priority: Option<u8>,

    /// Lowest personal rating, 1 to 10
    #[arg(long)]
    pub min_rating: Option<u8>,

    /// Highest personal rating, 1 to 10
    #[arg(long)]
    pub max_rating: Option<u8>,

    /// Minimum number of plays
    #[arg(long)]
    pub min_plays: Option<u32>,

    /// Maximum number of plays
    #[arg(long)]
    pub max_plays: Option<u32>,

    /// Only items modified since this date (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    pub modified_since: Option<NaiveDate>,
}

impl CollectionArgs {
    fn query(&self) -> CollectionQuery {
        CollectionQuery {
            subtype: self.subtype,
            exclude_subtype: self.exclude_subtype,
            own: self.own,
            rated: self.rated,
            played: self.played,
            wishlist: self.wishlist,
            for_trade: self.for_trade,
            want_to_play: self.want_to_play,
            prev_owned: self.prev_owned,
            wishlist_priority: self.wishlist_priority,
            min_rating: self.min_rating,
            max_rating: self.max_rating,
            min_plays: self.min_plays,
            max_plays: self.max_plays,
            modified_since: self.modified_since,
            ..CollectionQuery::new(self.user.clone())
        }
    }

    /// Fetch and print the collection
    pub async fn execute(&self, bgg: &BggClient, format: OutputFormat) -> Result<(), CliError> {
        let collection = bgg.fetch_collection(&self.query()).await?;
        match format {
            OutputFormat::Json => print_json(&collection),
            OutputFormat::Human => {
                print_collection(&collection);
                Ok(())
            }
        }
    }
}

fn print_collection(collection: &Collection) {
    println!("Collection of {}: {} items", collection.owner, collection.len());
    for item in collection.items.iter() {
        let rating = item
            .rating
            .map(|r| format!("{r:.1}"))
            .unwrap_or_else(|| "-".to_string());
        let year = item
            .year_published
            .map(|y| y.to_string())
            .unwrap_or_default();
        println!(
            "  {:>8} {} {} (rating {}, {} plays){}",
            item.id,
            item.name,
            year,
            rating,
            item.num_plays,
            if item.status.own { " [owned]" } else { "" }
        );
    }
}

/// `bgg search`
#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Text to search for
    pub query: String,

    /// Restrict to item types (repeatable)
    #[arg(long = "type")]
    pub kinds: Vec<SearchKind>,

    /// Match the name exactly
    #[arg(long)]
    pub exact: bool,
}

impl SearchArgs {
    /// Run the search and print the results
    pub async fn execute(&self, bgg: &BggClient, format: OutputFormat) -> Result<(), CliError> {
        let results = bgg.search(&self.query, &self.kinds, self.exact).await?;
        match format {
            OutputFormat::Json => print_json(&results),
            OutputFormat::Human => {
                print_search(&results);
                Ok(())
            }
        }
    }
}

fn print_search(results: &[SearchResult]) {
    println!("{} results", results.len());
    for result in results {
        let kind = result.kind.map(|k| k.to_string()).unwrap_or_default();
        let year = result
            .year_published
            .map(|y| format!(" ({y})"))
            .unwrap_or_default();
        println!("  {:>8} {}{} {}", result.id, result.name, year, kind);
    }
}

/// `bgg hot`
#[derive(Args, Debug)]
pub struct HotArgs {
    /// List type, e.g. boardgame, rpg, videogame
    #[arg(long = "type", default_value = "boardgame")]
    pub kind: HotItemKind,
}

impl HotArgs {
    /// Fetch and print the hot list
    pub async fn execute(&self, bgg: &BggClient, format: OutputFormat) -> Result<(), CliError> {
        let hot = bgg.hot_items(self.kind).await?;
        match format {
            OutputFormat::Json => print_json(&hot),
            OutputFormat::Human => {
                print_hot(&hot);
                Ok(())
            }
        }
    }
}

fn print_hot(hot: &HotItems) {
    for item in &hot.items {
        let year = item
            .year_published
            .map(|y| format!(" ({y})"))
            .unwrap_or_default();
        println!("  #{:<3} {}{} [{}]", item.rank, item.name, year, item.id);
    }
}
