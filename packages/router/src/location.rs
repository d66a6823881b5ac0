//! Navigation targets and their normalization.

use indexmap::IndexMap;

use crate::{
    path::{parse_path, resolve_path},
    query::{resolve_query, Query, QueryValue},
    state::Route,
};

/// Route parameters, by name.
pub type Params = IndexMap<String, String>;

/// A navigation target as a user describes it.
#[derive(Debug, Clone, PartialEq)]
pub enum RawLocation {
    /// A path, optionally with a query and hash. Relative paths resolve against the current
    /// route.
    Path(String),
    /// A structured target.
    Descriptor(LocationDescriptor),
    /// A target that was normalized already. Normalizing it again returns it unchanged.
    Normalized(Location),
}

impl RawLocation {
    /// Whether a navigation to this location should replace the current history entry.
    pub fn wants_replace(&self) -> bool {
        match self {
            Self::Path(_) => false,
            Self::Descriptor(d) => d.replace,
            Self::Normalized(l) => l.replace,
        }
    }
}

impl From<&str> for RawLocation {
    fn from(value: &str) -> Self {
        Self::Path(value.to_string())
    }
}

impl From<String> for RawLocation {
    fn from(value: String) -> Self {
        Self::Path(value)
    }
}

impl From<LocationDescriptor> for RawLocation {
    fn from(value: LocationDescriptor) -> Self {
        Self::Descriptor(value)
    }
}

impl From<Location> for RawLocation {
    fn from(value: Location) -> Self {
        Self::Normalized(value)
    }
}

/// A structured navigation target.
///
/// Targets with a `name` skip path resolution. Without `name` and `path`, the target is the
/// current path with a new query or hash.
///
/// ```rust
/// # use waypost_router::prelude::*;
/// let to = LocationDescriptor::named("user")
///     .param("id", "42")
///     .query("tab", "posts")
///     .replace();
/// assert_eq!(to.name.as_deref(), Some("user"));
/// assert!(to.replace);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LocationDescriptor {
    /// The name of the target route.
    pub name: Option<String>,
    /// The target path, possibly relative and carrying a query and hash.
    pub path: Option<String>,
    /// Parameters for named targets.
    pub params: Params,
    /// Query values, merged over the query of `path`.
    pub query: Query,
    /// The hash, with or without the leading `#`.
    pub hash: Option<String>,
    /// Resolve relative paths by appending to the current path.
    pub append: bool,
    /// Replace the current history entry.
    pub replace: bool,
}

impl LocationDescriptor {
    /// Target `path`.
    pub fn path(path: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            ..Default::default()
        }
    }

    /// Target the route named `name`.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    /// Add a parameter.
    pub fn param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.params.insert(key.into(), value.to_string());
        self
    }

    /// Add a query value.
    pub fn query(mut self, key: impl Into<String>, value: impl Into<QueryValue>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    /// Set the hash.
    pub fn hash(mut self, hash: impl Into<String>) -> Self {
        self.hash = Some(hash.into());
        self
    }

    /// Resolve relative paths by appending to the current path.
    pub fn append(mut self) -> Self {
        self.append = true;
        self
    }

    /// Replace the current history entry.
    pub fn replace(mut self) -> Self {
        self.replace = true;
        self
    }
}

/// A normalized navigation target.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Location {
    /// The name of the target route.
    pub name: Option<String>,
    /// The absolute path, without query and hash. Named targets may lack it.
    pub path: Option<String>,
    /// Parameters for named targets.
    pub params: Params,
    /// The complete query.
    pub query: Query,
    /// The hash, either empty or starting with `#`.
    pub hash: String,
    /// Replace the current history entry.
    pub replace: bool,
}

/// Turn a [`RawLocation`] into a [`Location`].
///
/// Relative paths resolve against `current` (or `/`), and `append` makes them extend the current
/// path instead of replacing its last segment. Normalizing a [`RawLocation::Normalized`] returns
/// the contained location unchanged.
///
/// ```rust
/// # use waypost_router::location::{normalize_location, RawLocation};
/// let location = normalize_location(&RawLocation::from("/a?x=1#top"), None, false);
/// assert_eq!(location.path.as_deref(), Some("/a"));
/// assert_eq!(location.hash, "#top");
/// ```
pub fn normalize_location(raw: &RawLocation, current: Option<&Route>, append: bool) -> Location {
    let descriptor = match raw {
        RawLocation::Normalized(location) => return location.clone(),
        RawLocation::Path(path) => LocationDescriptor::path(path.as_str()),
        RawLocation::Descriptor(descriptor) => descriptor.clone(),
    };

    if let Some(name) = descriptor.name.as_deref().filter(|n| !n.is_empty()) {
        return Location {
            name: Some(name.to_string()),
            path: descriptor.path,
            params: descriptor.params,
            query: descriptor.query,
            hash: descriptor.hash.map(ensure_hash_prefix).unwrap_or_default(),
            replace: descriptor.replace,
        };
    }

    let parsed = parse_path(descriptor.path.as_deref().unwrap_or_default());
    let base_path = current.map_or("/", |c| c.path());
    let path = match parsed.path.is_empty() {
        true => base_path.to_string(),
        false => resolve_path(&parsed.path, base_path, append || descriptor.append),
    };

    let query = resolve_query(&parsed.query, &descriptor.query);

    let hash = match descriptor.hash.filter(|h| !h.is_empty()) {
        Some(hash) => ensure_hash_prefix(hash),
        None => parsed.hash,
    };

    Location {
        name: None,
        path: Some(path),
        params: Params::new(),
        query,
        hash,
        replace: descriptor.replace,
    }
}

fn ensure_hash_prefix(hash: String) -> String {
    match hash.is_empty() || hash.starts_with('#') {
        true => hash,
        false => format!("#{hash}"),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn path_targets() {
        let location = normalize_location(&"/a/b?x=1&x=2#h".into(), None, false);
        assert_eq!(location.path.as_deref(), Some("/a/b"));
        assert_eq!(location.query["x"], QueryValue::from(vec!["1", "2"]));
        assert_eq!(location.hash, "#h");
        assert_eq!(location.name, None);
    }

    #[test]
    fn named_targets_are_copied() {
        let raw: RawLocation = LocationDescriptor::named("user")
            .param("id", 1)
            .hash("top")
            .into();
        let location = normalize_location(&raw, None, false);
        assert_eq!(location.name.as_deref(), Some("user"));
        assert_eq!(location.params["id"], "1");
        assert_eq!(location.hash, "#top");
        assert_eq!(location.path, None);
    }

    #[test]
    fn explicit_query_wins() {
        let raw: RawLocation = LocationDescriptor::path("/a?x=1&y=2").query("x", 3).into();
        let location = normalize_location(&raw, None, false);
        assert_eq!(location.query["x"], QueryValue::from("3"));
        assert_eq!(location.query["y"], QueryValue::from("2"));
    }

    #[test]
    fn empty_path_keeps_current_path() {
        let current = Route::from_location(&Location {
            path: Some("/docs/intro".into()),
            ..Default::default()
        });
        let raw: RawLocation = LocationDescriptor::default().hash("#faq").into();
        let location = normalize_location(&raw, Some(&current), false);
        assert_eq!(location.path.as_deref(), Some("/docs/intro"));
        assert_eq!(location.hash, "#faq");

        let location = normalize_location(&"?page=2".into(), Some(&current), false);
        assert_eq!(location.path.as_deref(), Some("/docs/intro"));
        assert_eq!(location.query["page"], QueryValue::from("2"));
    }

    #[test]
    fn relative_to_current() {
        let current = Route::from_location(&Location {
            path: Some("/docs/intro".into()),
            ..Default::default()
        });
        let location = normalize_location(&"setup".into(), Some(&current), false);
        assert_eq!(location.path.as_deref(), Some("/docs/setup"));

        let location = normalize_location(&"setup".into(), Some(&current), true);
        assert_eq!(location.path.as_deref(), Some("/docs/intro/setup"));

        let raw: RawLocation = LocationDescriptor::path("setup").append().into();
        let location = normalize_location(&raw, Some(&current), false);
        assert_eq!(location.path.as_deref(), Some("/docs/intro/setup"));
    }

    #[test]
    fn normalizing_twice_is_a_no_op() {
        let location = normalize_location(&"/a?b=c#d".into(), None, false);
        let again = normalize_location(&RawLocation::Normalized(location.clone()), None, true);
        assert_eq!(location, again);
    }
}
