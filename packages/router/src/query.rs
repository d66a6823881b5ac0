//! Parsing and serialization of query strings.
//!
//! A query is an insertion ordered map from keys to [`QueryValue`]s. Keys that appear more than
//! once while parsing become [`QueryValue::List`]s, and serialization emits one `key=value` pair
//! per list element.

use indexmap::IndexMap;
use tracing::warn;
use urlencoding::encode as encode_uri_component;

/// A parsed query string.
pub type Query = IndexMap<String, QueryValue>;

/// The value of a single query key.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum QueryValue {
    /// The key is present but has no value. It is skipped entirely when serializing.
    Undefined,
    /// The key has no `=` part, e.g. `?flag`.
    Null,
    /// A regular value.
    Value(String),
    /// A key that appeared more than once.
    List(Vec<QueryValue>),
}

impl QueryValue {
    /// Get the value, if this is a [`QueryValue::Value`].
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Value(v) => Some(v),
            _ => None,
        }
    }

    /// Get the list, if this is a [`QueryValue::List`].
    pub fn as_list(&self) -> Option<&[QueryValue]> {
        match self {
            Self::List(l) => Some(l),
            _ => None,
        }
    }

    // mirrors how a loosely typed host would print a nested value
    fn flatten(&self) -> String {
        match self {
            Self::Undefined | Self::Null => String::new(),
            Self::Value(v) => v.clone(),
            Self::List(l) => l.iter().map(Self::flatten).collect::<Vec<_>>().join(","),
        }
    }
}

impl From<&str> for QueryValue {
    fn from(value: &str) -> Self {
        Self::Value(value.to_string())
    }
}

impl From<String> for QueryValue {
    fn from(value: String) -> Self {
        Self::Value(value)
    }
}

impl From<&String> for QueryValue {
    fn from(value: &String) -> Self {
        Self::Value(value.clone())
    }
}

macro_rules! scalar_query_value {
    ($($t:ty),*) => {
        $(
            impl From<$t> for QueryValue {
                fn from(value: $t) -> Self {
                    Self::Value(value.to_string())
                }
            }
        )*
    };
}

scalar_query_value!(bool, char, i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64);

impl<T: Into<QueryValue>> From<Option<T>> for QueryValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

impl<T: Into<QueryValue>> From<Vec<T>> for QueryValue {
    fn from(value: Vec<T>) -> Self {
        Self::List(value.into_iter().map(Into::into).collect())
    }
}

/// Percent-encode a query key or value.
///
/// Everything but ASCII alphanumerics and `-_.~` is escaped, except that commas are kept
/// readable.
pub fn encode(value: &str) -> String {
    encode_uri_component(value).replace("%2C", ",")
}

/// Percent-decode a query key, value or path parameter.
///
/// Values that do not decode to valid UTF-8 are returned unchanged.
pub fn decode(value: &str) -> String {
    match urlencoding::decode(value) {
        Ok(decoded) => decoded.into_owned(),
        Err(err) => {
            warn!(value, %err, "failed to decode uri component, keeping it raw");
            value.to_string()
        }
    }
}

/// Parse a query string.
///
/// One leading `?`, `#` or `&` is ignored. `+` decodes to a space.
///
/// ```rust
/// # use waypost_router::query::{parse_query, QueryValue};
/// let query = parse_query("?a=1&b=2&b=3&flag");
/// assert_eq!(query["a"], QueryValue::from("1"));
/// assert_eq!(query["b"], QueryValue::from(vec!["2", "3"]));
/// assert_eq!(query["flag"], QueryValue::Null);
/// ```
pub fn parse_query(query: &str) -> Query {
    let mut res = Query::new();

    let query = query.trim();
    let query = query
        .strip_prefix(['?', '#', '&'])
        .unwrap_or(query);

    if query.is_empty() {
        return res;
    }

    for param in query.split('&') {
        let param = param.replace('+', " ");
        let (key, val) = match param.split_once('=') {
            Some((key, val)) => (decode(key), QueryValue::Value(decode(val))),
            None => (decode(&param), QueryValue::Null),
        };

        match res.get_mut(&key) {
            None => {
                res.insert(key, val);
            }
            Some(QueryValue::List(list)) => list.push(val),
            Some(existing) => {
                let first = std::mem::replace(existing, QueryValue::Undefined);
                *existing = QueryValue::List(vec![first, val]);
            }
        }
    }

    res
}

/// Serialize a query.
///
/// Keys are emitted in insertion order. [`QueryValue::Undefined`] values are omitted and
/// [`QueryValue::Null`] values produce a bare key. A non-empty result starts with `?`.
///
/// ```rust
/// # use waypost_router::query::{parse_query, stringify_query};
/// assert_eq!(stringify_query(&parse_query("a=1&b=2&b=3")), "?a=1&b=2&b=3");
/// assert_eq!(stringify_query(&parse_query("")), "");
/// ```
pub fn stringify_query(query: &Query) -> String {
    let pairs: Vec<String> = query
        .iter()
        .map(|(key, val)| match val {
            QueryValue::Undefined => String::new(),
            QueryValue::Null => encode(key),
            QueryValue::Value(v) => format!("{}={}", encode(key), encode(v)),
            QueryValue::List(list) => {
                let mut result = Vec::with_capacity(list.len());
                for item in list {
                    match item {
                        QueryValue::Undefined => {}
                        QueryValue::Null => result.push(encode(key)),
                        other => result.push(format!("{}={}", encode(key), encode(&other.flatten()))),
                    }
                }
                result.join("&")
            }
        })
        .filter(|pair| !pair.is_empty())
        .collect();

    match pairs.is_empty() {
        true => String::new(),
        false => format!("?{}", pairs.join("&")),
    }
}

/// Parse `query` and merge the explicitly supplied `extra` values over it.
///
/// Explicit values win. They are expected to already be in their string form, which the
/// [`From`] implementations of [`QueryValue`] take care of.
pub fn resolve_query(query: &str, extra: &Query) -> Query {
    let mut parsed = parse_query(query);
    for (key, value) in extra {
        parsed.insert(key.clone(), value.clone());
    }
    parsed
}
