//! The compiled route table.

use std::collections::HashMap;

use indexmap::IndexMap;
use slotmap::SlotMap;
use tracing::debug;

use crate::{
    guards::{EnteredCallback, NavigationGuard},
    path::clean_path,
    route_definition::{ComponentSlot, Instance, PathPattern, RouteConfig},
    state::Meta,
};

slotmap::new_key_type! {
    /// Identifies a [`RouteRecord`] for as long as the router lives.
    pub struct RecordId;
}

/// A compiled [`RouteConfig`], linked to its parent.
pub struct RouteRecord {
    path: String,
    pattern: PathPattern,
    name: Option<String>,
    meta: Meta,
    parent: Option<RecordId>,
    pub(crate) components: IndexMap<String, ComponentSlot>,
    pub(crate) before_enter: Option<NavigationGuard>,
    pub(crate) instances: IndexMap<String, Instance>,
    pub(crate) entered_cbs: IndexMap<String, Vec<EnteredCallback>>,
}

impl RouteRecord {
    /// The normalized path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The compiled path.
    pub fn pattern(&self) -> &PathPattern {
        &self.pattern
    }

    /// The name.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The meta data.
    pub fn meta(&self) -> &Meta {
        &self.meta
    }

    /// The parent record.
    pub fn parent(&self) -> Option<RecordId> {
        self.parent
    }
}

impl std::fmt::Debug for RouteRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteRecord")
            .field("path", &self.path)
            .field("name", &self.name)
            .field("meta", &self.meta)
            .field("parent", &self.parent)
            .field("components", &self.components)
            .field("instances", &self.instances.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

/// All records, with indexes by path (in registration order) and by name.
#[derive(Default)]
pub(crate) struct RouteTable {
    records: SlotMap<RecordId, RouteRecord>,
    path_list: Vec<String>,
    path_map: HashMap<String, RecordId>,
    name_map: HashMap<String, RecordId>,
}

impl RouteTable {
    pub(crate) fn new(configs: Vec<RouteConfig>) -> Self {
        let mut table = Self::default();
        table.add_routes(configs, None);
        table
    }

    /// Register `configs` below `parent`. Existing records are left alone.
    pub(crate) fn add_routes(&mut self, configs: Vec<RouteConfig>, parent: Option<RecordId>) {
        for config in configs {
            self.add_route_record(config, parent);
        }
    }

    fn add_route_record(&mut self, config: RouteConfig, parent: Option<RecordId>) -> RecordId {
        let RouteConfig {
            path,
            name,
            components,
            children,
            meta,
            before_enter,
        } = config;

        let parent_path = parent.and_then(|p| self.records.get(p)).map(|p| p.path.as_str());
        let path = normalize_path(&path, parent_path);

        let id = self.records.insert(RouteRecord {
            pattern: PathPattern::compile(&path),
            path: path.clone(),
            name: name.clone(),
            meta,
            parent,
            components,
            before_enter,
            instances: IndexMap::new(),
            entered_cbs: IndexMap::new(),
        });

        // children first, so a child with an empty path wins the parent's url
        for child in children {
            self.add_route_record(child, Some(id));
        }

        if self.path_map.contains_key(&path) {
            debug!(path, "a route with this path exists already, ignoring the new one");
        } else {
            self.path_list.push(path.clone());
            self.path_map.insert(path, id);
        }

        if let Some(name) = name {
            if self.name_map.contains_key(&name) {
                debug!(name, "a route with this name exists already, ignoring the new one");
            } else {
                self.name_map.insert(name, id);
            }
        }

        id
    }

    pub(crate) fn get(&self, id: RecordId) -> Option<&RouteRecord> {
        self.records.get(id)
    }

    pub(crate) fn get_mut(&mut self, id: RecordId) -> Option<&mut RouteRecord> {
        self.records.get_mut(id)
    }

    pub(crate) fn by_name(&self, name: &str) -> Option<RecordId> {
        self.name_map.get(name).copied()
    }

    /// The records reachable by path, in registration order.
    pub(crate) fn routes(&self) -> impl Iterator<Item = RecordId> + '_ {
        self.path_list.iter().filter_map(|p| self.path_map.get(p).copied())
    }

    /// The chain from the root ancestor of `id` down to `id`.
    pub(crate) fn format_match(&self, id: RecordId) -> Vec<RecordId> {
        let mut res = Vec::new();
        let mut current = Some(id);
        while let Some(id) = current {
            res.push(id);
            current = self.records.get(id).and_then(|r| r.parent);
        }
        res.reverse();
        res
    }
}

/// Normalize the path of a record, joining relative paths to the parent path.
fn normalize_path(path: &str, parent: Option<&str>) -> String {
    let path = path.strip_suffix('/').unwrap_or(path);

    let joined = match (path.starts_with('/'), parent) {
        (true, _) => path.to_string(),
        (false, None) => format!("/{path}"),
        (false, Some(parent)) => clean_path(&format!("{parent}/{path}")),
    };

    let trimmed = joined.strip_suffix('/').unwrap_or(&joined);
    match trimmed.is_empty() {
        true => "/".to_string(),
        false => trimmed.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn paths(table: &RouteTable) -> Vec<String> {
        table
            .routes()
            .map(|id| table.get(id).map(|r| r.path().to_string()).unwrap_or_default())
            .collect()
    }

    #[test]
    fn normalize() {
        assert_eq!(normalize_path("/", None), "/");
        assert_eq!(normalize_path("", None), "/");
        assert_eq!(normalize_path("a", None), "/a");
        assert_eq!(normalize_path("/a/", None), "/a");
        assert_eq!(normalize_path("b", Some("/a")), "/a/b");
        assert_eq!(normalize_path("b/", Some("/a")), "/a/b");
        assert_eq!(normalize_path("/b", Some("/a")), "/b");
        assert_eq!(normalize_path("", Some("/a")), "/a");
        assert_eq!(normalize_path("a", Some("/")), "/a");
        assert_eq!(normalize_path("", Some("/")), "/");
    }

    #[test]
    fn children_are_registered_first() {
        let table = RouteTable::new(vec![
            RouteConfig::new("/a").children([RouteConfig::new("b"), RouteConfig::new("/c")]),
            RouteConfig::new("/d"),
        ]);
        assert_eq!(paths(&table), ["/a/b", "/c", "/a", "/d"]);
    }

    #[test]
    fn chains_walk_up_to_the_root() {
        let table = RouteTable::new(vec![RouteConfig::new("/a")
            .name("a")
            .child(RouteConfig::new("b").name("b").child(RouteConfig::new("c").name("c")))]);

        let a = table.by_name("a").unwrap();
        let b = table.by_name("b").unwrap();
        let c = table.by_name("c").unwrap();
        assert_eq!(table.format_match(c), vec![a, b, c]);
        assert_eq!(table.get(c).unwrap().path(), "/a/b/c");
        assert_eq!(table.get(b).unwrap().parent(), Some(a));
    }

    #[test]
    fn first_registration_wins() {
        let table = RouteTable::new(vec![
            RouteConfig::new("/x").name("first").meta("n", 1),
            RouteConfig::new("/x/").name("second").meta("n", 2),
            RouteConfig::new("/y").name("first").meta("n", 3),
        ]);

        let winner = table.routes().next().unwrap();
        assert_eq!(table.get(winner).unwrap().meta()["n"], 1);
        assert_eq!(paths(&table), ["/x", "/y"]);
        assert_eq!(table.by_name("first"), Some(winner));
        assert!(table.by_name("second").is_some());
    }

    #[test]
    fn extend_below_a_parent() {
        let mut table = RouteTable::new(vec![RouteConfig::new("/admin").name("admin")]);
        let admin = table.by_name("admin");
        table.add_routes(vec![RouteConfig::new("users")], admin);

        assert_eq!(paths(&table), ["/admin", "/admin/users"]);
    }
}
