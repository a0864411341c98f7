//! End-to-end client flows against a scripted API

use crate::common::fake_api::{guild_page, plays_page, user_page, FakeApi};
use bgg_client::{
    ChoosePolicy, CollectionQuery, FetcherError, GameLookup, PlaysQuery, ProgressError,
    UserOptions,
};
use std::time::Duration;

const NO_WAIT: Duration = Duration::ZERO;

#[tokio::test]
async fn test_guild_members_fetched_across_pages() {
    let api = FakeApi::new();
    api.respond("guild", 1, guild_page(30, 0..25));
    api.respond("guild", 2, guild_page(30, 25..30));
    let bgg = api.client(3, NO_WAIT);

    let mut reports = Vec::new();
    let mut progress = |fetched: usize, total: usize| -> Result<(), ProgressError> {
        reports.push((fetched, total));
        Ok(())
    };
    let guild = bgg.fetch_guild(1229, Some(&mut progress), true).await.unwrap();

    assert_eq!(guild.name, "Geekcon");
    assert_eq!(guild.member_count, Some(30));
    assert_eq!(guild.members.len(), 30);
    assert_eq!(guild.members[0], "member0");
    assert_eq!(guild.members[29], "member29");
    assert_eq!(reports, vec![(25, 30), (30, 30)]);

    let requests = api.requests_to("guild");
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].param("page"), None);
    assert_eq!(requests[0].param("members"), Some("1"));
    assert_eq!(requests[0].param("id"), Some("1229"));
    assert_eq!(requests[1].param("page"), Some("2"));
}

#[tokio::test]
async fn test_guild_without_members_is_single_request() {
    let api = FakeApi::new();
    let header_only = guild_page(30, 0..0).replace(r#"<members count="30" page="1"></members>"#, "");
    api.respond("guild", 1, header_only);
    let bgg = api.client(3, NO_WAIT);

    let guild = bgg.fetch_guild(1229, None, false).await.unwrap();

    assert!(guild.members.is_empty());
    assert_eq!(guild.member_count, None);
    assert_eq!(api.requests().len(), 1);
    assert_eq!(api.requests()[0].param("members"), None);
}

#[tokio::test]
async fn test_unknown_guild_is_not_found() {
    let api = FakeApi::new();
    api.respond(
        "guild",
        1,
        r#"<guild id="0" termsofuse="https://boardgamegeek.com/xmlapi/termsofuse"><error>Guild not found.</error></guild>"#,
    );
    let bgg = api.client(3, NO_WAIT);

    let err = bgg.fetch_guild(99999999, None, true).await.unwrap_err();
    assert!(matches!(err, FetcherError::NotFound(_)));
}

#[tokio::test]
async fn test_guild_id_zero_rejected_before_request() {
    let api = FakeApi::new();
    let bgg = api.client(3, NO_WAIT);

    let err = bgg.fetch_guild(0, None, true).await.unwrap_err();
    assert!(matches!(err, FetcherError::Validation(_)));
    assert!(api.requests().is_empty());
}

#[tokio::test]
async fn test_user_lists_paged_in_lock_step() {
    let api = FakeApi::new();
    // guilds are complete on page 1 and repeated on page 2
    api.respond("user", 1, user_page(150, 0..100, 3, 0..3));
    api.respond("user", 2, user_page(150, 100..150, 3, 0..3));
    let bgg = api.client(3, NO_WAIT);

    let user = bgg
        .fetch_user("fagentu007", None, UserOptions::default())
        .await
        .unwrap();

    assert_eq!(user.id, 39488);
    assert_eq!(user.first_name.as_deref(), Some("Cosmin"));
    assert_eq!(user.buddies.len(), 150);
    assert_eq!(user.total_buddies(), 150);
    assert_eq!(user.guilds.len(), 3);
    assert_eq!(user.total_guilds(), 3);
    assert_eq!(api.requests_to("user").len(), 2);

    let first = &api.requests()[0];
    assert_eq!(first.param("name"), Some("fagentu007"));
    assert_eq!(first.param("buddies"), Some("1"));
    assert_eq!(first.param("hot"), Some("1"));
}

#[tokio::test]
async fn test_user_options_become_flags() {
    let api = FakeApi::new();
    api.respond("user", 1, user_page(0, 0..0, 0, 0..0));
    let bgg = api.client(3, NO_WAIT);

    let options = UserOptions {
        buddies: false,
        guilds: false,
        hot: false,
        top: true,
    };
    bgg.fetch_user("fagentu007", None, options).await.unwrap();

    let request = &api.requests()[0];
    assert_eq!(request.param("buddies"), Some("0"));
    assert_eq!(request.param("guilds"), Some("0"));
    assert_eq!(request.param("hot"), Some("0"));
    assert_eq!(request.param("top"), Some("1"));
}

#[tokio::test]
async fn test_blank_user_name_rejected() {
    let api = FakeApi::new();
    let bgg = api.client(3, NO_WAIT);

    let err = bgg
        .fetch_user("   ", None, UserOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, FetcherError::Validation(_)));
    assert!(api.requests().is_empty());
}

#[tokio::test]
async fn test_plays_stop_when_a_page_adds_nothing() {
    let api = FakeApi::new();
    api.respond("plays", 1, plays_page(300, 1..101));
    // the server keeps serving the first page
    api.respond("plays", 2, plays_page(300, 1..101));
    let bgg = api.client(3, NO_WAIT);

    let plays = bgg
        .fetch_plays(&PlaysQuery::user("fagentu007"), None)
        .await
        .unwrap();

    assert_eq!(plays.declared_total, 300);
    assert_eq!(plays.len(), 100);
    assert_eq!(api.requests_to("plays").len(), 2);
    assert!(plays.plays.iter().all(|p| p.user_id == Some(39488)));
}

#[tokio::test]
async fn test_plays_with_zero_total_are_empty() {
    let api = FakeApi::new();
    api.respond("plays", 1, plays_page(0, 0..0));
    let bgg = api.client(3, NO_WAIT);

    let plays = bgg
        .fetch_plays(&PlaysQuery::user("fagentu007"), None)
        .await
        .unwrap();

    assert!(plays.is_empty());
    assert_eq!(api.requests().len(), 1);
}

#[tokio::test]
async fn test_plays_of_unknown_user_are_not_found() {
    let api = FakeApi::new();
    api.respond(
        "plays",
        1,
        "<error><message>Invalid object or user</message></error>",
    );
    let bgg = api.client(3, NO_WAIT);

    let err = bgg
        .fetch_plays(&PlaysQuery::user("nobody-at-all"), None)
        .await
        .unwrap_err();
    assert!(matches!(err, FetcherError::NotFound(_)));
}

#[tokio::test]
async fn test_plays_query_needs_exactly_one_subject() {
    let api = FakeApi::new();
    let bgg = api.client(3, NO_WAIT);

    let neither = PlaysQuery::default();
    let both = PlaysQuery {
        game_id: Some(13),
        ..PlaysQuery::user("fagentu007")
    };

    for query in [neither, both] {
        let err = bgg.fetch_plays(&query, None).await.unwrap_err();
        assert!(matches!(err, FetcherError::Validation(_)));
    }
    assert!(api.requests().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_collection_waits_while_pending() {
    let api = FakeApi::new();
    api.respond_status(
        "collection",
        1,
        202,
        "<message>Your request for this collection has been accepted and will be processed.</message>",
    );
    api.respond_status("collection", 1, 202, "<message>Still processing</message>");
    api.respond(
        "collection",
        1,
        r#"<items totalitems="1"><item objecttype="thing" objectid="13" subtype="boardgame" collid="1"><name sortindex="1">Catan</name><status own="1"/><numplays>3</numplays></item></items>"#,
    );
    let bgg = api.client(5, Duration::from_secs(2));

    let start = tokio::time::Instant::now();
    let collection = bgg
        .fetch_collection(&CollectionQuery::new("fagentu007"))
        .await
        .unwrap();

    // 2s, then 2s * 1.5
    assert_eq!(start.elapsed(), Duration::from_secs(5));
    assert_eq!(collection.len(), 1);
    assert_eq!(collection.owned().count(), 1);
    assert_eq!(api.requests().len(), 3);
    assert_eq!(api.requests()[0].param("stats"), Some("1"));
}

#[tokio::test(start_paused = true)]
async fn test_pending_beyond_budget_is_retry_exhausted() {
    let api = FakeApi::new();
    api.respond_status("collection", 1, 202, "<message>accepted</message>");
    let bgg = api.client(2, Duration::from_secs(1));

    let err = bgg
        .fetch_collection(&CollectionQuery::new("fagentu007"))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        FetcherError::RetryExhausted {
            attempts: 3,
            max_retries: 2
        }
    ));
    assert_eq!(api.requests().len(), 3);
}

#[tokio::test]
async fn test_invalid_collection_filters_rejected() {
    let api = FakeApi::new();
    let bgg = api.client(3, NO_WAIT);

    let query = CollectionQuery {
        min_rating: Some(11),
        ..CollectionQuery::new("fagentu007")
    };
    let err = bgg.fetch_collection(&query).await.unwrap_err();
    assert!(matches!(err, FetcherError::Validation(_)));
    assert!(api.requests().is_empty());
}

#[tokio::test]
async fn test_protocol_error_mid_pagination_keeps_partial_result() {
    let api = FakeApi::new();
    api.respond("guild", 1, guild_page(30, 0..25));
    api.respond_html("guild", 2);
    let bgg = api.client(3, NO_WAIT);

    let guild = bgg.fetch_guild(1229, None, true).await.unwrap();

    assert_eq!(guild.members.len(), 25);
    assert_eq!(api.requests().len(), 2);
}

#[tokio::test]
async fn test_protocol_error_on_first_page_is_returned() {
    let api = FakeApi::new();
    api.respond_html("guild", 1);
    let bgg = api.client(3, NO_WAIT);

    let err = bgg.fetch_guild(1229, None, true).await.unwrap_err();
    assert!(matches!(err, FetcherError::Protocol(_)));
}

#[tokio::test]
async fn test_progress_callback_error_aborts_fetch() {
    let api = FakeApi::new();
    api.respond("guild", 1, guild_page(30, 0..25));
    api.respond("guild", 2, guild_page(30, 25..30));
    let bgg = api.client(3, NO_WAIT);

    let mut progress =
        |_: usize, _: usize| -> Result<(), ProgressError> { Err("interrupted".into()) };
    let err = bgg
        .fetch_guild(1229, Some(&mut progress), true)
        .await
        .unwrap_err();

    assert!(matches!(err, FetcherError::Aborted(_)));
    assert_eq!(api.requests().len(), 1);
}

#[tokio::test]
async fn test_timeouts_exhaust_budget() {
    let api = FakeApi::new();
    api.time_out("hot", 1);
    let bgg = api.client(2, NO_WAIT);

    let err = bgg
        .hot_items(bgg_client::HotItemKind::BoardGame)
        .await
        .unwrap_err();
    assert!(matches!(err, FetcherError::Timeout { attempts: 3 }));
}

#[tokio::test]
async fn test_game_by_name_best_rank() {
    let api = FakeApi::new();
    api.respond(
        "search",
        1,
        r#"<items total="2">
            <item type="boardgame" id="13"><name type="primary" value="Catan"/><yearpublished value="1995"/></item>
            <item type="boardgame" id="278"><name type="primary" value="Catan"/><yearpublished value="2015"/></item>
        </items>"#,
    );
    api.respond(
        "thing",
        1,
        format!(
            "<items>{}{}</items>",
            thing(13, "Catan", "429"),
            thing(278, "Catan", "Not Ranked")
        ),
    );
    let bgg = api.client(3, NO_WAIT);

    let best = bgg
        .fetch_game(GameLookup::Name("Catan".to_string()), ChoosePolicy::BestRank)
        .await
        .unwrap();
    assert_eq!(best.id, 13);

    let recent = bgg
        .get_game_id("Catan", ChoosePolicy::Recent)
        .await
        .unwrap();
    assert_eq!(recent, 278);

    let search = &api.requests_to("search")[0];
    assert_eq!(search.param("exact"), Some("1"));
    assert_eq!(search.param("type"), Some("boardgame"));
}

#[tokio::test]
async fn test_game_name_without_match_is_not_found() {
    let api = FakeApi::new();
    api.respond("search", 1, r#"<items total="0"/>"#);
    let bgg = api.client(3, NO_WAIT);

    let err = bgg
        .get_game_id("No Such Game", ChoosePolicy::First)
        .await
        .unwrap_err();
    assert!(matches!(err, FetcherError::NotFound(_)));
}

fn thing(id: u64, name: &str, rank: &str) -> String {
    format!(
        r#"<item type="boardgame" id="{id}">
            <name type="primary" sortindex="1" value="{name}"/>
            <yearpublished value="1995"/>
            <statistics page="1"><ratings>
                <usersrated value="100"/>
                <average value="7.1"/>
                <bayesaverage value="7.0"/>
                <ranks>
                    <rank type="subtype" id="1" name="boardgame" friendlyname="Board Game Rank" value="{rank}" bayesaverage="7.0"/>
                </ranks>
            </ratings></statistics>
        </item>"#
    )
}
