//! Snapshots of resolved navigations.

use crate::{
    location::{Location, Params},
    query::{stringify_query, Query},
    route_map::{RecordId, RouteRecord},
};

/// Arbitrary data attached to a route.
pub type Meta = serde_json::Map<String, serde_json::Value>;

/// A snapshot of a resolved navigation.
///
/// A [`Route`] never changes once created. The records in [`Route::matched`] are identified by
/// their [`RecordId`], so two routes that render the same record share that id.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    name: Option<String>,
    meta: Meta,
    path: String,
    hash: String,
    query: Query,
    params: Params,
    full_path: String,
    matched: Vec<RecordId>,
    redirected_from: Option<String>,
}

impl Default for Route {
    fn default() -> Self {
        Self::start()
    }
}

impl Route {
    /// The route the router starts in: path `/` without any matched records.
    pub fn start() -> Self {
        Self::from_location(&Location {
            path: Some("/".to_string()),
            ..Default::default()
        })
    }

    /// A route for `location` that matched no record.
    pub(crate) fn from_location(location: &Location) -> Self {
        Self::new(None, Vec::new(), location)
    }

    pub(crate) fn new(record: Option<&RouteRecord>, matched: Vec<RecordId>, location: &Location) -> Self {
        let path = location
            .path
            .clone()
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| "/".to_string());
        let full_path = format!("{path}{}{}", stringify_query(&location.query), location.hash);

        Self {
            name: location
                .name
                .clone()
                .or_else(|| record.and_then(|r| r.name().map(str::to_string))),
            meta: record.map(|r| r.meta().clone()).unwrap_or_default(),
            path,
            hash: location.hash.clone(),
            query: location.query.clone(),
            params: location.params.clone(),
            full_path,
            matched,
            redirected_from: None,
        }
    }

    pub(crate) fn with_redirected_from(mut self, full_path: Option<String>) -> Self {
        self.redirected_from = full_path;
        self
    }

    /// Check whether this is a route without matched records at path `/`.
    pub fn is_start(&self) -> bool {
        self.matched.is_empty() && self.full_path == "/"
    }

    /// The name of the route.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The meta data of the deepest matched record.
    pub fn meta(&self) -> &Meta {
        &self.meta
    }

    /// The path, without query and hash.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The hash. Either empty or starting with `#`.
    pub fn hash(&self) -> &str {
        &self.hash
    }

    /// The query.
    pub fn query(&self) -> &Query {
        &self.query
    }

    /// The decoded parameters.
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Get a single parameter.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// Path, query and hash in their serialized form.
    pub fn full_path(&self) -> &str {
        &self.full_path
    }

    /// The matched records, root first. Empty if nothing matched.
    pub fn matched(&self) -> &[RecordId] {
        &self.matched
    }

    /// The full path of the navigation that was redirected to this route, if any.
    pub fn redirected_from(&self) -> Option<&str> {
        self.redirected_from.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::query::QueryValue;

    #[test]
    fn start() {
        let start = Route::start();
        assert_eq!(start.path(), "/");
        assert_eq!(start.full_path(), "/");
        assert!(start.matched().is_empty());
        assert!(start.is_start());
        assert_eq!(Route::default(), start);
    }

    #[test]
    fn full_path() {
        let mut location = Location {
            path: Some("/search".into()),
            hash: "#results".into(),
            ..Default::default()
        };
        location.query.insert("q".into(), QueryValue::from("a b"));
        location.query.insert("page".into(), QueryValue::from(2));

        let route = Route::from_location(&location);
        assert_eq!(route.full_path(), "/search?q=a%20b&page=2#results");
        assert!(!route.is_start());
    }

    #[test]
    fn missing_path_falls_back_to_root() {
        let route = Route::from_location(&Location {
            name: Some("missing".into()),
            ..Default::default()
        });
        assert_eq!(route.path(), "/");
        assert_eq!(route.name(), Some("missing"));
    }
}
