//! Guilds and their member lists

use serde::{Deserialize, Serialize};

use crate::config::GUILD_MEMBERS_PER_PAGE;
use crate::fetcher::{FetcherError, FetcherResult, PageAggregate};
use crate::xml::{self, non_empty_owned};

/// Postal address of a guild
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GuildLocation {
    pub addr1: Option<String>,
    pub addr2: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
}

impl GuildLocation {
    /// `addr1` and `addr2` joined by a space, `None` when both are empty
    pub fn address(&self) -> Option<String> {
        let parts: Vec<&str> = [self.addr1.as_deref(), self.addr2.as_deref()]
            .into_iter()
            .flatten()
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(" "))
        }
    }
}

/// A BoardGameGeek guild
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Guild {
    pub id: u64,
    pub name: String,
    pub created: Option<String>,
    pub category: Option<String>,
    pub website: Option<String>,
    pub manager: Option<String>,
    pub description: Option<String>,
    pub location: GuildLocation,
    /// Member count declared by the server; `None` when members were not requested
    pub member_count: Option<usize>,
    /// Member names in listing order (duplicates are kept)
    pub members: Vec<String>,
}

impl Guild {
    /// Shortcut for [`GuildLocation::address`]
    pub fn address(&self) -> Option<String> {
        self.location.address()
    }

    fn add_members(&mut self, page: Option<MembersXml>) -> usize {
        let Some(members) = page else {
            return 0;
        };
        let before = self.members.len();
        for member in members.member {
            if self
                .member_count
                .is_some_and(|count| self.members.len() >= count)
            {
                break;
            }
            if let Some(name) = non_empty_owned(member.name) {
                self.members.push(name);
            }
        }
        self.members.len() - before
    }
}

impl PageAggregate for Guild {
    type Owner = u64;
    type Page = GuildPage;
    const PAGE_SIZE: Option<usize> = Some(GUILD_MEMBERS_PER_PAGE);

    fn from_first_page(id: &u64, page: GuildPage) -> FetcherResult<Self> {
        let name = non_empty_owned(page.name)
            .ok_or_else(|| FetcherError::NotFound(format!("guild {id}")))?;

        let location = page.location.unwrap_or_default();
        let member_count = match &page.members {
            Some(members) => xml::convert(members.count.as_deref(), "guild members count")?,
            None => None,
        };

        let mut guild = Guild {
            id: xml::convert_or(page.id.as_deref(), *id),
            name,
            created: non_empty_owned(page.created),
            category: non_empty_owned(page.category),
            website: non_empty_owned(page.website),
            manager: non_empty_owned(page.manager),
            description: xml::non_empty(page.description.as_deref()).map(xml::unescape_html),
            location: GuildLocation {
                addr1: non_empty_owned(location.addr1),
                addr2: non_empty_owned(location.addr2),
                city: non_empty_owned(location.city),
                state: non_empty_owned(location.stateorprovince),
                postal_code: non_empty_owned(location.postalcode),
                country: non_empty_owned(location.country),
            },
            member_count,
            members: Vec::new(),
        };
        guild.add_members(page.members);
        Ok(guild)
    }

    fn merge_page(&mut self, page: GuildPage) -> FetcherResult<usize> {
        Ok(self.add_members(page.members))
    }

    fn needs_more(&self) -> bool {
        self.member_count
            .is_some_and(|count| self.members.len() < count)
    }

    fn accumulated(&self) -> usize {
        self.members.len()
    }

    fn progress(&self) -> (usize, usize) {
        (
            self.members.len(),
            self.member_count.unwrap_or(self.members.len()),
        )
    }
}

#[doc(hidden)]
#[derive(Debug, Deserialize)]
pub struct GuildPage {
    #[serde(rename = "@id")]
    id: Option<String>,
    #[serde(rename = "@name")]
    name: Option<String>,
    #[serde(rename = "@created")]
    created: Option<String>,
    category: Option<String>,
    website: Option<String>,
    manager: Option<String>,
    description: Option<String>,
    location: Option<LocationXml>,
    members: Option<MembersXml>,
}

#[derive(Debug, Default, Deserialize)]
struct LocationXml {
    addr1: Option<String>,
    addr2: Option<String>,
    city: Option<String>,
    stateorprovince: Option<String>,
    postalcode: Option<String>,
    country: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MembersXml {
    #[serde(rename = "@count")]
    count: Option<String>,
    #[serde(default)]
    member: Vec<MemberXml>,
}

#[derive(Debug, Deserialize)]
struct MemberXml {
    #[serde(rename = "@name")]
    name: Option<String>,
}
