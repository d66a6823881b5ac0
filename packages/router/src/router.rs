use std::{
    cell::{Cell, RefCell},
    future::Future,
    rc::Rc,
};

use futures_channel::mpsc::{unbounded, UnboundedReceiver, UnboundedSender};
use futures_util::{future::LocalBoxFuture, FutureExt, StreamExt};
use tracing::{debug, warn};
use waypost_history::{History, MemoryHistory};

use crate::{
    error::NavigationError,
    guards::{guard, AfterHook, HookList, NavigationGuard, Next, Unregister},
    history::{create_href, HashHistory},
    location::{normalize_location, Location, RawLocation},
    matcher::RouteRecordInfo,
    route_definition::{Instance, RouteConfig},
    route_map::{RecordId, RouteTable},
    router_cfg::RouterOptions,
    state::Route,
    transition::{before_queue, resolve_queue, resolve_queue_steps, run_queue, Interrupt},
};

/// Messages the [`Router`] event loop handles.
pub(crate) enum RouterMessage {
    /// The host location changed outside of the router.
    Update,
}

/// What to do with the host location once a navigation commits.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Completion {
    Push,
    Replace,
    /// The host changed its location itself.
    Foreign,
    /// The first navigation of the first application.
    Init,
}

/// Identifies an application using the router. See [`Router::init`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AppId(u64);

/// The result of [`Router::resolve`].
#[derive(Clone, Debug, PartialEq)]
pub struct Resolved {
    /// The normalized target.
    pub location: Location,
    /// The route the target matches.
    pub route: Route,
    /// A link to the route, including base and hash prefix.
    pub href: String,
}

struct RouterInner {
    table: RefCell<RouteTable>,
    history: HashHistory,
    before_hooks: HookList<NavigationGuard>,
    resolve_hooks: HookList<NavigationGuard>,
    after_hooks: HookList<AfterHook>,
    apps: RefCell<Vec<AppId>>,
    next_app: Cell<u64>,
    tx: UnboundedSender<RouterMessage>,
    rx: RefCell<Option<UnboundedReceiver<RouterMessage>>>,
}

/// A hash-mode router.
///
/// The router matches locations against its route table, runs navigation guards, and keeps the
/// committed [`Route`] in the hash of a [`History`] provider. Cloning a [`Router`] is cheap, all
/// clones share the same state.
///
/// ```rust
/// # use waypost_router::prelude::*;
/// # futures::executor::block_on(async {
/// let router = Router::new(
///     RouterOptions::default()
///         .route(RouteConfig::new("/").name("home"))
///         .route(RouteConfig::new("/user/:id").name("user")),
/// );
/// router.init().await;
///
/// let route = router.push("/user/42").await.unwrap();
/// assert_eq!(route.param("id"), Some("42"));
/// assert_eq!(router.current_route().full_path(), "/user/42");
/// # });
/// ```
#[derive(Clone)]
pub struct Router {
    inner: Rc<RouterInner>,
}

impl Router {
    /// Create a new [`Router`].
    ///
    /// This makes sure the hash of the host location starts with a `/`, but does not navigate.
    /// Call [`Router::init`] for that.
    pub fn new(options: RouterOptions) -> Self {
        let RouterOptions {
            routes,
            base,
            history,
        } = options;

        let host: Rc<dyn History> = history.unwrap_or_else(|| Rc::new(MemoryHistory::default()));
        let (tx, rx) = unbounded();

        Self {
            inner: Rc::new(RouterInner {
                table: RefCell::new(RouteTable::new(routes)),
                history: HashHistory::new(host, base.as_deref()),
                before_hooks: Default::default(),
                resolve_hooks: Default::default(),
                after_hooks: Default::default(),
                apps: Default::default(),
                next_app: Cell::new(0),
                tx,
                rx: RefCell::new(Some(rx)),
            }),
        }
    }

    /// The [`History`] provider.
    pub fn history(&self) -> Rc<dyn History> {
        self.inner.history.host().clone()
    }

    /// The normalized base. Empty for applications served from the root.
    pub fn base(&self) -> &str {
        self.inner.history.base()
    }

    /// The committed route.
    pub fn current_route(&self) -> Route {
        self.inner.history.current()
    }

    /// Set the callback that is notified about every committed route, replacing the previous one.
    pub fn listen(&self, callback: impl Fn(&Route) + 'static) {
        self.inner.history.listen(Rc::new(callback));
    }

    /// Find the route `raw` targets, resolving relative targets against `current`.
    ///
    /// Targets that match no record produce a route with empty [`Route::matched`].
    pub fn match_route(&self, raw: impl Into<RawLocation>, current: Option<&Route>) -> Route {
        self.inner.table.borrow().match_route(&raw.into(), current)
    }

    /// Normalize and match `to`, and build a link to it.
    ///
    /// Relative targets resolve against `current`, or the committed route.
    pub fn resolve(&self, to: impl Into<RawLocation>, current: Option<&Route>, append: bool) -> Resolved {
        let committed;
        let current = match current {
            Some(current) => current,
            None => {
                committed = self.current_route();
                &committed
            }
        };

        let location = normalize_location(&to.into(), Some(current), append);
        let route = self.match_route(location.clone(), Some(current));
        let full_path = route.redirected_from().unwrap_or(route.full_path());
        let href = create_href(self.base(), full_path);

        Resolved {
            location,
            route,
            href,
        }
    }

    /// Navigate to `to`, adding a history entry.
    ///
    /// Resolves with the committed route. If a guard redirects, this resolves with the outcome of
    /// the redirected navigation.
    pub fn push(
        &self,
        to: impl Into<RawLocation>,
    ) -> LocalBoxFuture<'static, Result<Route, NavigationError>> {
        self.transition_to(to.into(), Completion::Push, None)
    }

    /// Navigate to `to`, replacing the current history entry.
    pub fn replace(
        &self,
        to: impl Into<RawLocation>,
    ) -> LocalBoxFuture<'static, Result<Route, NavigationError>> {
        self.transition_to(to.into(), Completion::Replace, None)
    }

    /// Move `delta` steps through the session history.
    ///
    /// The resulting navigation is performed by [`Router::run`].
    pub fn go(&self, delta: isize) {
        self.inner.history.go(delta);
    }

    /// Go back one step. See [`Router::go`].
    pub fn back(&self) {
        self.go(-1);
    }

    /// Go forward one step. See [`Router::go`].
    pub fn forward(&self) {
        self.go(1);
    }

    /// Register a guard that runs before every navigation.
    pub fn before_each<F, Fut>(&self, f: F) -> Unregister
    where
        F: Fn(&Route, &Route) -> Fut + 'static,
        Fut: Future<Output = Next> + 'static,
    {
        self.inner.before_hooks.register(guard(f))
    }

    /// Register a guard that runs after all other guards of a navigation.
    pub fn before_resolve<F, Fut>(&self, f: F) -> Unregister
    where
        F: Fn(&Route, &Route) -> Fut + 'static,
        Fut: Future<Output = Next> + 'static,
    {
        self.inner.resolve_hooks.register(guard(f))
    }

    /// Register a hook that is called after every committed navigation, with the new and the
    /// previous route.
    pub fn after_each(&self, hook: impl Fn(&Route, &Route) + 'static) -> Unregister {
        self.inner.after_hooks.register(Rc::new(hook))
    }

    /// Add a top level route.
    pub fn add_route(&self, route: RouteConfig) {
        self.add_routes([route]);
    }

    /// Add a route below the route named `parent`.
    ///
    /// If there is no such route, the route is added at the top level.
    pub fn add_child_route(&self, parent: &str, route: RouteConfig) {
        let mut table = self.inner.table.borrow_mut();
        let parent_id = table.by_name(parent);
        if parent_id.is_none() {
            warn!(parent, "parent route does not exist, adding route at the top level");
        }
        debug!(parent, path = route.path(), "adding child route");
        table.add_routes(vec![route], parent_id);
    }

    /// Add several top level routes.
    pub fn add_routes(&self, routes: impl IntoIterator<Item = RouteConfig>) {
        let routes: Vec<_> = routes.into_iter().collect();
        debug!(count = routes.len(), "adding routes");
        self.inner.table.borrow_mut().add_routes(routes, None);
    }

    /// All routes reachable by path, in matching order.
    pub fn get_routes(&self) -> Vec<RouteRecordInfo> {
        let table = self.inner.table.borrow();
        table.routes().filter_map(|id| table.info(id)).collect()
    }

    /// Look up a single record, e.g. one of [`Route::matched`].
    pub fn record(&self, id: RecordId) -> Option<RouteRecordInfo> {
        self.inner.table.borrow().info(id)
    }

    /// Register an application using the router.
    ///
    /// The first application triggers the initial navigation to the location the [`History`]
    /// provider shows. Once that navigation commits, the router starts listening for foreign
    /// navigation, which [`Router::run`] handles.
    pub fn init(&self) -> impl Future<Output = AppId> + 'static {
        let router = self.clone();
        async move {
            let inner = &router.inner;
            let id = AppId(inner.next_app.get());
            inner.next_app.set(id.0 + 1);

            let first = {
                let mut apps = inner.apps.borrow_mut();
                apps.push(id);
                apps.len() == 1
            };
            if !first {
                return id;
            }

            let location = inner.history.current_location();
            match router
                .transition_to(location.into(), Completion::Init, None)
                .await
            {
                Ok(_) => router.setup_listeners(),
                Err(err) => debug!(%err, "initial navigation did not commit"),
            }
            id
        }
    }

    /// Unregister an application. Releasing the last one stops listening for foreign navigation
    /// and resets the current route.
    pub fn release(&self, app: AppId) {
        let empty = {
            let mut apps = self.inner.apps.borrow_mut();
            apps.retain(|a| *a != app);
            apps.is_empty()
        };

        if empty {
            debug!("last application released, tearing down");
            self.inner.history.teardown();
        }
    }

    /// The router's event loop, navigating whenever the host location changes outside of the
    /// router (e.g. through [`Router::go`] or the back button).
    ///
    /// The returned future does not complete while the router exists. Only one event loop can
    /// run, later calls return immediately.
    pub async fn run(&self) {
        let Some(mut rx) = self.inner.rx.borrow_mut().take() else {
            warn!("the router event loop is already running");
            return;
        };

        while let Some(message) = rx.next().await {
            match message {
                RouterMessage::Update => {
                    let location = self.inner.history.current_location();
                    if let Err(err) = self
                        .transition_to(location.into(), Completion::Foreign, None)
                        .await
                    {
                        debug!(%err, "foreign navigation did not commit");
                    }
                }
            }
        }
    }

    /// Register or clear the mounted instance of the component in view `slot` of `record`.
    pub fn set_instance(&self, record: RecordId, slot: &str, instance: Option<Instance>) {
        let mut table = self.inner.table.borrow_mut();
        let Some(record) = table.get_mut(record) else {
            return;
        };

        match instance {
            Some(instance) => {
                record.instances.insert(slot.to_string(), instance);
            }
            None => {
                record.instances.shift_remove(slot);
            }
        }
    }

    /// Tell the router the components of `route` are mounted.
    ///
    /// This calls the callbacks the enter guards of `route` queued through
    /// [`Next::ContinueWith`], for every view that has a mounted instance.
    pub fn route_entered(&self, route: &Route) {
        let mut pending = Vec::new();
        {
            let mut table = self.inner.table.borrow_mut();
            for id in route.matched() {
                let Some(record) = table.get_mut(*id) else {
                    continue;
                };
                let instances: Vec<_> = record
                    .instances
                    .iter()
                    .map(|(slot, instance)| (slot.clone(), instance.clone()))
                    .collect();
                for (slot, instance) in instances {
                    if let Some(callbacks) = record.entered_cbs.shift_remove(&slot) {
                        pending.push((instance, callbacks));
                    }
                }
            }
        }

        // outside of the borrow, callbacks may use the router
        for (instance, callbacks) in pending {
            for callback in callbacks {
                if !instance.is_being_destroyed() {
                    callback(&instance);
                }
            }
        }
    }

    fn setup_listeners(&self) {
        let tx = self.inner.tx.clone();
        self.inner.history.setup_listeners(Rc::new(move || {
            tx.unbounded_send(RouterMessage::Update).ok();
        }));
    }

    fn transition_to(
        &self,
        raw: RawLocation,
        completion: Completion,
        redirected_from: Option<String>,
    ) -> LocalBoxFuture<'static, Result<Route, NavigationError>> {
        let router = self.clone();
        async move {
            let inner = &router.inner;
            let prev = inner.history.current();
            let route = inner
                .table
                .borrow()
                .match_route(&raw, Some(&prev))
                .with_redirected_from(redirected_from);
            debug!(from = prev.full_path(), to = route.full_path(), "starting navigation");

            match router.confirm_transition(&route, &prev).await {
                Ok(()) => {
                    router.commit(&route, &prev, completion);
                    Ok(route)
                }
                Err(Interrupt::Abort) => {
                    debug!(to = route.full_path(), "navigation aborted");
                    inner.history.ensure_url(true);
                    Err(NavigationError::Aborted)
                }
                Err(Interrupt::Fail(err)) => {
                    debug!(to = route.full_path(), %err, "navigation failed");
                    inner.history.ensure_url(true);
                    Err(err.into())
                }
                Err(Interrupt::Redirect(to)) => {
                    debug!(from = route.full_path(), ?to, "navigation redirected");
                    inner.history.ensure_url(true);

                    let completion = match to.wants_replace() {
                        true => Completion::Replace,
                        false => Completion::Push,
                    };
                    let from = route
                        .redirected_from()
                        .unwrap_or(route.full_path())
                        .to_string();
                    router.transition_to(to, completion, Some(from)).await
                }
                Err(Interrupt::Panicked) => Err(NavigationError::GuardPanicked),
            }
        }
        .boxed_local()
    }

    async fn confirm_transition(&self, route: &Route, current: &Route) -> Result<(), Interrupt> {
        let inner = &self.inner;
        let diff = resolve_queue(current.matched(), route.matched());

        let queue = before_queue(&inner.table.borrow(), &diff, inner.before_hooks.snapshot());
        run_queue(&inner.table, queue, route, current).await?;

        // enter guards of async components only exist now
        let queue = resolve_queue_steps(
            &inner.table.borrow(),
            &diff.activated,
            inner.resolve_hooks.snapshot(),
        );
        run_queue(&inner.table, queue, route, current).await
    }

    fn commit(&self, route: &Route, prev: &Route, completion: Completion) {
        let history = &self.inner.history;
        history.update_route(route.clone());

        match completion {
            Completion::Push => history.push_hash(route.full_path()),
            Completion::Replace => history.replace_hash(route.full_path()),
            Completion::Foreign if !history.supports_push_state() => {
                history.replace_hash(route.full_path())
            }
            Completion::Foreign | Completion::Init => {}
        }
        history.ensure_url(false);

        for hook in self.inner.after_hooks.snapshot() {
            hook(route, prev);
        }
        debug!(to = route.full_path(), "navigation committed");
    }
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("base", &self.base())
            .field("current", &self.current_route())
            .field("apps", &self.inner.apps.borrow())
            .finish_non_exhaustive()
    }
}
