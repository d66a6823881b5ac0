//! Data types for describing which components render at which paths.

use std::{future::Future, rc::Rc};

use indexmap::IndexMap;

use crate::{
    error::GuardError,
    guards::{guard, NavigationGuard, Next},
    state::{Meta, Route},
};

mod component;
pub use component::*;

mod pattern;
pub use pattern::*;

/// The name of the view unnamed components render into.
pub const DEFAULT_SLOT: &str = "default";

/// A route, as the user describes it.
///
/// Children inherit the path of their parent unless their own path is absolute.
///
/// ```rust
/// # use waypost_router::prelude::*;
/// let config = RouteConfig::new("/users")
///     .name("users")
///     .component(Component::new("UserList"))
///     .meta("requires_auth", true)
///     .child(
///         RouteConfig::new(":id")
///             .name("user")
///             .component(Component::new("User"))
///             .named_component("sidebar", Component::new("UserSidebar")),
///     );
/// assert_eq!(config.path(), "/users");
/// ```
#[derive(Clone)]
pub struct RouteConfig {
    pub(crate) path: String,
    pub(crate) name: Option<String>,
    pub(crate) components: IndexMap<String, ComponentSlot>,
    pub(crate) children: Vec<RouteConfig>,
    pub(crate) meta: Meta,
    pub(crate) before_enter: Option<NavigationGuard>,
}

impl RouteConfig {
    /// Create a new [`RouteConfig`] for `path`.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            name: None,
            components: IndexMap::new(),
            children: Vec::new(),
            meta: Meta::new(),
            before_enter: None,
        }
    }

    /// The path, as given.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Give the route a name, for name based navigation.
    ///
    /// Names should be unique. If two routes share a name, the first one registered keeps it.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Render `component` into the default view.
    pub fn component(self, component: impl Into<ComponentSlot>) -> Self {
        self.named_component(DEFAULT_SLOT, component)
    }

    /// Render `component` into the view named `slot`.
    pub fn named_component(mut self, slot: impl Into<String>, component: impl Into<ComponentSlot>) -> Self {
        self.components.insert(slot.into(), component.into());
        self
    }

    /// Render a component into the default view that is only created once the route is entered.
    pub fn lazy_component<F, Fut>(self, factory: F) -> Self
    where
        F: Fn() -> Fut + 'static,
        Fut: Future<Output = Result<Rc<dyn RouteComponent>, GuardError>> + 'static,
    {
        self.named_lazy_component(DEFAULT_SLOT, factory)
    }

    /// Render a component into the view named `slot` that is only created once the route is
    /// entered.
    pub fn named_lazy_component<F, Fut>(self, slot: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> Fut + 'static,
        Fut: Future<Output = Result<Rc<dyn RouteComponent>, GuardError>> + 'static,
    {
        self.named_component(slot, ComponentSlot::lazy(factory))
    }

    /// Add a nested route.
    pub fn child(mut self, child: RouteConfig) -> Self {
        self.children.push(child);
        self
    }

    /// Add several nested routes.
    pub fn children(mut self, children: impl IntoIterator<Item = RouteConfig>) -> Self {
        self.children.extend(children);
        self
    }

    /// Attach a meta value.
    pub fn meta(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.meta.insert(key.into(), value.into());
        self
    }

    /// Set a guard that runs whenever the route is entered.
    ///
    /// A route has at most one such guard, later calls replace it.
    pub fn before_enter<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(&Route, &Route) -> Fut + 'static,
        Fut: Future<Output = Next> + 'static,
    {
        self.before_enter = Some(guard(f));
        self
    }
}

impl std::fmt::Debug for RouteConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteConfig")
            .field("path", &self.path)
            .field("name", &self.name)
            .field("components", &self.components)
            .field("children", &self.children)
            .field("meta", &self.meta)
            .field("before_enter", &self.before_enter.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_components_keep_their_order() {
        let config = RouteConfig::new("/")
            .named_component("sidebar", Component::new("Sidebar"))
            .component(Component::new("Main"))
            .named_lazy_component("footer", || async {
                Ok::<_, GuardError>(Rc::new(Component::new("Footer")) as Rc<dyn RouteComponent>)
            });

        let slots: Vec<_> = config.components.keys().cloned().collect();
        assert_eq!(slots, ["sidebar", DEFAULT_SLOT, "footer"]);
        assert!(config.components["footer"].ready().is_none());
        assert!(config.components[DEFAULT_SLOT].ready().is_some());
    }

    #[test]
    fn meta_and_children() {
        let config = RouteConfig::new("/a")
            .meta("title", "A")
            .meta("depth", 1)
            .children([RouteConfig::new("b"), RouteConfig::new("c")]);

        assert_eq!(config.meta["title"], "A");
        assert_eq!(config.meta["depth"], 1);
        assert_eq!(config.children.len(), 2);
    }
}
