//! XML document decoding and attribute conversion
//!
//! Page records are plain serde structs decoded by `quick-xml`: attributes are
//! `@name` fields, element text is `$text`. Numeric attributes are kept as
//! strings and converted with the helpers below, which decide per field whether
//! a malformed value is an error ([`convert`]) or simply absent ([`convert_quiet`],
//! [`convert_or`]).

use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::borrow::Cow;
use std::str::FromStr;

use crate::fetcher::{FetcherError, FetcherResult};

/// Decode a whole response body into `T`
///
/// # Errors
/// [`FetcherError::Protocol`] when the body is not well-formed XML or does not
/// match the expected layout.
pub fn parse_document<T: DeserializeOwned>(body: &str) -> FetcherResult<T> {
    quick_xml::de::from_str(body)
        .map_err(|e| FetcherError::Protocol(format!("failed to parse XML response: {e}")))
}

/// Treat empty and whitespace-only values as absent
pub fn non_empty(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|s| !s.is_empty())
}

/// Owned variant of [`non_empty`]
pub fn non_empty_owned(raw: Option<String>) -> Option<String> {
    non_empty(raw.as_deref()).map(str::to_string)
}

/// Strict conversion: absent is `None`, malformed is an error
///
/// # Errors
/// [`FetcherError::Protocol`] naming `field` when the value does not parse.
pub fn convert<T: FromStr>(raw: Option<&str>, field: &str) -> FetcherResult<Option<T>> {
    match non_empty(raw) {
        None => Ok(None),
        Some(value) => value.parse().map(Some).map_err(|_| {
            FetcherError::Protocol(format!("invalid value {value:?} for {field}"))
        }),
    }
}

/// Quiet conversion: absent or malformed is `None`
pub fn convert_quiet<T: FromStr>(raw: Option<&str>) -> Option<T> {
    non_empty(raw).and_then(|value| value.parse().ok())
}

/// Quiet conversion with a fallback
pub fn convert_or<T: FromStr>(raw: Option<&str>, default: T) -> T {
    convert_quiet(raw).unwrap_or(default)
}

/// `"1"` / `"true"` flags used by the API for booleans
pub fn flag(raw: Option<&str>) -> bool {
    matches!(non_empty(raw), Some("1") | Some("true"))
}

/// Decode HTML entities left in description text (`&#10;`, `&quot;`, `&mdash;`, ...)
///
/// Text that cannot be decoded is returned unchanged.
pub fn unescape_html(text: &str) -> String {
    match quick_xml::escape::unescape_with(text, quick_xml::escape::resolve_html5_entity) {
        Ok(Cow::Borrowed(s)) => s.to_string(),
        Ok(Cow::Owned(s)) => s,
        Err(_) => text.to_string(),
    }
}

/// `<element value="..."/>`
#[derive(Debug, Default, Clone, Deserialize)]
pub(crate) struct ValueXml {
    #[serde(rename = "@value")]
    pub value: Option<String>,
}

impl ValueXml {
    pub fn get(this: &Option<ValueXml>) -> Option<&str> {
        this.as_ref().and_then(|v| non_empty(v.value.as_deref()))
    }

    pub fn parse<T: FromStr>(this: &Option<ValueXml>) -> Option<T> {
        convert_quiet(Self::get(this))
    }
}

/// `<name type="primary" value="..." sortindex="1"/>`
#[derive(Debug, Default, Clone, Deserialize)]
pub(crate) struct NameXml {
    #[serde(rename = "@type")]
    pub kind: Option<String>,
    #[serde(rename = "@value")]
    pub value: Option<String>,
}

impl NameXml {
    pub fn is_primary(&self) -> bool {
        self.kind.as_deref() == Some("primary")
    }
}

/// `<ranks><rank .../></ranks>`
#[derive(Debug, Default, Clone, Deserialize)]
pub(crate) struct RanksXml {
    #[serde(default)]
    pub rank: Vec<RankXml>,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub(crate) struct RankXml {
    #[serde(rename = "@type")]
    pub kind: Option<String>,
    #[serde(rename = "@id")]
    pub id: Option<String>,
    #[serde(rename = "@name")]
    pub name: Option<String>,
    #[serde(rename = "@friendlyname")]
    pub friendly_name: Option<String>,
    #[serde(rename = "@value")]
    pub value: Option<String>,
    #[serde(rename = "@bayesaverage")]
    pub bayes_average: Option<String>,
}
