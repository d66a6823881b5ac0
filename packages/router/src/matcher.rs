use tracing::warn;

use crate::{
    location::{normalize_location, Params, RawLocation},
    query::decode,
    route_map::{RecordId, RouteTable},
    state::Route,
};

/// A registered route, as reported by [`Router::get_routes`](crate::Router::get_routes).
#[derive(Debug, Clone, PartialEq)]
pub struct RouteRecordInfo {
    /// Identifies the record in [`Route::matched`].
    pub id: RecordId,
    /// The normalized path.
    pub path: String,
    /// The name.
    pub name: Option<String>,
    /// The meta data.
    pub meta: crate::state::Meta,
    /// The parent record.
    pub parent: Option<RecordId>,
    /// The names of the views the record renders into.
    pub slots: Vec<String>,
}

impl RouteTable {
    pub(crate) fn info(&self, id: RecordId) -> Option<RouteRecordInfo> {
        self.get(id).map(|record| RouteRecordInfo {
            id,
            path: record.path().to_string(),
            name: record.name().map(str::to_string),
            meta: record.meta().clone(),
            parent: record.parent(),
            slots: record.components.keys().cloned().collect(),
        })
    }

    /// Resolve `raw` against `current` and find the record it targets.
    ///
    /// Targets that match nothing produce a route without matched records.
    pub(crate) fn match_route(&self, raw: &RawLocation, current: Option<&Route>) -> Route {
        let mut location = normalize_location(raw, current, false);

        if let Some(name) = location.name.clone() {
            let Some(id) = self.by_name(&name) else {
                warn!(name, "route with this name does not exist");
                return Route::from_location(&location);
            };
            let Some(record) = self.get(id) else {
                return Route::from_location(&location);
            };

            location.path = match record.pattern().fill(&location.params) {
                Ok(path) => Some(path),
                Err(param) => {
                    warn!(name, param, "missing param for named route");
                    Some("/".to_string())
                }
            };
            return Route::new(Some(record), self.format_match(id), &location);
        }

        if let Some(path) = location.path.clone() {
            location.params = Params::new();
            for id in self.routes() {
                let Some(record) = self.get(id) else {
                    continue;
                };
                let Some(captures) = record.pattern().captures(&path) else {
                    continue;
                };

                for (key, value) in captures {
                    if let Some(value) = value {
                        location.params.insert(key, decode(&value));
                    }
                }
                return Route::new(Some(record), self.format_match(id), &location);
            }
        }

        Route::from_location(&location)
    }
}
