//! Integration tests for request spacing

use async_trait::async_trait;
use bgg_client::fetcher::transport::RateLimitedTransport;
use bgg_client::fetcher::{RateLimiter, RawResponse, Transport, TransportError};
use bgg_client::{BggClient, ClientConfig, HotItemKind};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

/// Records when each request reached the network
#[derive(Default)]
struct Stamps(Mutex<Vec<Instant>>);

#[async_trait]
impl Transport for Stamps {
    async fn get(
        &self,
        _url: &str,
        _params: &[(&str, String)],
        _timeout: Duration,
    ) -> Result<RawResponse, TransportError> {
        self.0.lock().unwrap().push(Instant::now());
        Ok(RawResponse::xml(200, "<items/>"))
    }
}

#[tokio::test(start_paused = true)]
async fn test_requests_are_spaced_by_budget() {
    let stamps = Arc::new(Stamps::default());
    let limiter = Arc::new(RateLimiter::new(30));
    let transport = Arc::new(RateLimitedTransport::new(stamps.clone(), limiter));
    let bgg = BggClient::with_transport(ClientConfig::uncached(), transport).unwrap();

    for _ in 0..3 {
        bgg.hot_items(HotItemKind::BoardGame).await.unwrap();
    }

    let stamps = stamps.0.lock().unwrap();
    assert_eq!(stamps.len(), 3);
    assert!(stamps[1] - stamps[0] >= Duration::from_secs(2));
    assert!(stamps[2] - stamps[1] >= Duration::from_secs(2));
}

#[tokio::test(start_paused = true)]
async fn test_clients_sharing_a_limiter_share_the_budget() {
    let stamps = Arc::new(Stamps::default());
    let limiter = Arc::new(RateLimiter::new(60));

    let first = BggClient::with_transport(
        ClientConfig::uncached(),
        Arc::new(RateLimitedTransport::new(stamps.clone(), limiter.clone())),
    )
    .unwrap();
    let second = BggClient::with_transport(
        ClientConfig::uncached(),
        Arc::new(RateLimitedTransport::new(stamps.clone(), limiter)),
    )
    .unwrap();

    let start = Instant::now();
    let (a, b) = tokio::join!(
        first.hot_items(HotItemKind::BoardGame),
        second.hot_items(HotItemKind::Rpg)
    );
    a.unwrap();
    b.unwrap();

    assert!(start.elapsed() >= Duration::from_secs(1));
    assert_eq!(stamps.0.lock().unwrap().len(), 2);
}

#[test]
fn test_min_interval_from_requests_per_minute() {
    assert_eq!(RateLimiter::new(30).min_interval(), Duration::from_secs(2));
    assert_eq!(RateLimiter::new(120).min_interval(), Duration::from_millis(500));
}
