//! Scripted stand-in for the XML API
//!
//! Responses are queued per `(endpoint, page)`; the last queued response for a
//! route is repeated once the queue is down to one entry. Every request is
//! recorded for later assertions.

use async_trait::async_trait;
use bgg_client::fetcher::{RawResponse, Transport, TransportError};
use bgg_client::{BggClient, ClientConfig, RetryPolicy};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// One recorded request
#[derive(Debug, Clone)]
pub struct Request {
    pub endpoint: String,
    pub params: Vec<(String, String)>,
}

impl Request {
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Page number, 1 when the parameter is omitted
    pub fn page(&self) -> u32 {
        self.param("page").and_then(|p| p.parse().ok()).unwrap_or(1)
    }
}

type Route = (String, u32);

#[derive(Default)]
pub struct FakeApi {
    routes: Mutex<HashMap<Route, VecDeque<Result<RawResponse, TransportError>>>>,
    requests: Mutex<Vec<Request>>,
}

impl FakeApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn push(&self, endpoint: &str, page: u32, response: Result<RawResponse, TransportError>) {
        self.routes
            .lock()
            .unwrap()
            .entry((endpoint.to_string(), page))
            .or_default()
            .push_back(response);
    }

    /// Queue a 200 XML response
    pub fn respond(&self, endpoint: &str, page: u32, body: impl Into<String>) {
        self.push(endpoint, page, Ok(RawResponse::xml(200, body)));
    }

    /// Queue a response with an arbitrary status
    pub fn respond_status(&self, endpoint: &str, page: u32, status: u16, body: impl Into<String>) {
        self.push(endpoint, page, Ok(RawResponse::xml(status, body)));
    }

    /// Queue an HTML error page
    pub fn respond_html(&self, endpoint: &str, page: u32) {
        self.push(
            endpoint,
            page,
            Ok(RawResponse {
                status: 200,
                content_type: Some("text/html; charset=utf-8".to_string()),
                body: "<html><body>Something went wrong</body></html>".to_string(),
            }),
        );
    }

    /// Queue a transport timeout
    pub fn time_out(&self, endpoint: &str, page: u32) {
        self.push(endpoint, page, Err(TransportError::Timeout));
    }

    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requests_to(&self, endpoint: &str) -> Vec<Request> {
        self.requests()
            .into_iter()
            .filter(|r| r.endpoint == endpoint)
            .collect()
    }

    /// Client without cache whose retries wait `retry_delay`
    pub fn client(self: &Arc<Self>, max_retries: u32, retry_delay: Duration) -> BggClient {
        let config = ClientConfig {
            retry: RetryPolicy {
                max_retries,
                retry_delay,
                ..RetryPolicy::default()
            },
            ..ClientConfig::uncached()
        };
        BggClient::with_transport(config, self.clone()).unwrap()
    }
}

#[async_trait]
impl Transport for FakeApi {
    async fn get(
        &self,
        url: &str,
        params: &[(&str, String)],
        _timeout: Duration,
    ) -> Result<RawResponse, TransportError> {
        let request = Request {
            endpoint: url.rsplit('/').next().unwrap_or_default().to_string(),
            params: params
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        };
        let route = (request.endpoint.clone(), request.page());
        self.requests.lock().unwrap().push(request);

        let mut routes = self.routes.lock().unwrap();
        match routes.get_mut(&route) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap(),
            Some(queue) if !queue.is_empty() => queue[0].clone(),
            _ => Ok(RawResponse::xml(404, "<error>no such route</error>")),
        }
    }
}

/// `<member/>` elements named `member{i}`
fn members(range: std::ops::Range<usize>) -> String {
    range
        .map(|i| format!(r#"<member name="member{i}" date="2012-01-01"/>"#))
        .collect()
}

pub fn guild_page(count: usize, range: std::ops::Range<usize>) -> String {
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
        <guild id="1229" name="Geekcon" created="Sat, 01 Jan 2005 00:00:00 +0000" termsofuse="https://boardgamegeek.com/xmlapi/termsofuse">
            <category>group</category>
            <website></website>
            <manager>admin</manager>
            <description>A guild</description>
            <location><city>Springfield</city><country>United States</country></location>
            <members count="{count}" page="1">{}</members>
        </guild>"#,
        members(range)
    )
}

pub fn user_page(buddies_total: usize, buddies: std::ops::Range<u64>, guilds_total: usize, guilds: std::ops::Range<u64>) -> String {
    let buddy_xml: String = buddies
        .map(|i| format!(r#"<buddy id="{i}" name="buddy{i}"/>"#))
        .collect();
    let guild_xml: String = guilds
        .map(|i| format!(r#"<guild id="{i}" name="guild{i}"/>"#))
        .collect();
    format!(
        r#"<user id="39488" name="fagentu007">
            <firstname value="Cosmin"/><lastname value="L"/>
            <buddies total="{buddies_total}" page="1">{buddy_xml}</buddies>
            <guilds total="{guilds_total}" page="1">{guild_xml}</guilds>
        </user>"#
    )
}

pub fn plays_page(total: usize, ids: std::ops::Range<u64>) -> String {
    let plays: String = ids
        .map(|id| {
            format!(
                r#"<play id="{id}" date="2014-02-17" quantity="1" length="30" incomplete="0" nowinstats="0" location="">
                    <item name="Catan" objecttype="thing" objectid="13"/>
                </play>"#
            )
        })
        .collect();
    format!(r#"<plays username="fagentu007" userid="39488" total="{total}" page="1">{plays}</plays>"#)
}
