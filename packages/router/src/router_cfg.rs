use std::rc::Rc;

use waypost_history::History;

use crate::route_definition::RouteConfig;

/// Global configuration options for the router.
///
/// This implements [`Default`] and follows the builder pattern, so you can use it like this:
/// ```rust
/// # use std::rc::Rc;
/// # use waypost_router::prelude::*;
/// # use waypost_history::MemoryHistory;
/// let options = RouterOptions::default()
///     .base("/app")
///     .history(Rc::new(MemoryHistory::with_initial_url("http://localhost/app/#/about")))
///     .route(RouteConfig::new("/").name("home"))
///     .route(RouteConfig::new("/about").name("about"));
/// ```
#[derive(Default)]
pub struct RouterOptions {
    pub(crate) routes: Vec<RouteConfig>,
    pub(crate) base: Option<String>,
    pub(crate) history: Option<Rc<dyn History>>,
}

impl RouterOptions {
    /// Set the routes, replacing any added before.
    pub fn routes(self, routes: impl IntoIterator<Item = RouteConfig>) -> Self {
        Self {
            routes: routes.into_iter().collect(),
            ..self
        }
    }

    /// Add a route.
    pub fn route(mut self, route: RouteConfig) -> Self {
        self.routes.push(route);
        self
    }

    /// The path prefix of the application, used when building links.
    ///
    /// Defaults to the base the [`History`] provider reports, or `/`.
    pub fn base(self, base: impl Into<String>) -> Self {
        Self {
            base: Some(base.into()),
            ..self
        }
    }

    /// The [`History`] provider to read and write the location with.
    ///
    /// Defaults to a [`MemoryHistory`](waypost_history::MemoryHistory).
    pub fn history(self, history: Rc<dyn History>) -> Self {
        Self {
            history: Some(history),
            ..self
        }
    }
}

impl std::fmt::Debug for RouterOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouterOptions")
            .field("routes", &self.routes)
            .field("base", &self.base)
            .field("history", &self.history.is_some())
            .finish()
    }
}
