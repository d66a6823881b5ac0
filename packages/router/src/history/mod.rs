//! The hash-mode adapter between the router and a [`History`] provider.
//!
//! The router keeps the committed route in the hash of the host location, so a location looks
//! like `<base>#<path><?query><#hash>`.

use std::{cell::RefCell, rc::Rc};

use tracing::trace;
use waypost_history::{History, HistoryEvent, ListenerId};

use crate::state::Route;

mod hash;
pub(crate) use hash::create_href;

pub(crate) struct HashHistory {
    host: Rc<dyn History>,
    base: String,
    current: RefCell<Route>,
    callback: RefCell<Option<Rc<dyn Fn(&Route)>>>,
    listeners: RefCell<Vec<ListenerId>>,
}

impl HashHistory {
    pub(crate) fn new(host: Rc<dyn History>, base: Option<&str>) -> Self {
        let base = hash::normalize_base(base, host.as_ref());
        hash::ensure_slash(host.as_ref());

        Self {
            host,
            base,
            current: RefCell::new(Route::start()),
            callback: RefCell::new(None),
            listeners: RefCell::new(Vec::new()),
        }
    }

    pub(crate) fn host(&self) -> &Rc<dyn History> {
        &self.host
    }

    pub(crate) fn base(&self) -> &str {
        &self.base
    }

    pub(crate) fn current(&self) -> Route {
        self.current.borrow().clone()
    }

    /// The location the host currently shows.
    pub(crate) fn current_location(&self) -> String {
        hash::get_hash(self.host.as_ref())
    }

    /// Set the callback notified about every committed route. Replaces the previous one.
    pub(crate) fn listen(&self, callback: Rc<dyn Fn(&Route)>) {
        *self.callback.borrow_mut() = Some(callback);
    }

    pub(crate) fn update_route(&self, route: Route) {
        *self.current.borrow_mut() = route.clone();

        let callback = self.callback.borrow().clone();
        if let Some(callback) = callback {
            callback(&route);
        }
    }

    /// Attach `handler` to the navigation events of the host, unless that happened already.
    pub(crate) fn setup_listeners(&self, handler: Rc<dyn Fn()>) {
        let mut listeners = self.listeners.borrow_mut();
        if !listeners.is_empty() {
            return;
        }

        let event = match self.supports_push_state() {
            true => HistoryEvent::PopState,
            false => HistoryEvent::HashChange,
        };
        trace!(?event, "listening for foreign navigation");
        listeners.push(self.host.listen(event, handler));
    }

    /// Detach all listeners and forget the current route.
    pub(crate) fn teardown(&self) {
        for id in self.listeners.borrow_mut().drain(..) {
            self.host.unlisten(id);
        }
        *self.current.borrow_mut() = Route::start();
    }

    pub(crate) fn supports_push_state(&self) -> bool {
        self.host.supports_push_state()
    }

    pub(crate) fn go(&self, delta: isize) {
        self.host.go(delta);
    }

    pub(crate) fn push_hash(&self, path: &str) {
        hash::push_hash(self.host.as_ref(), path);
    }

    pub(crate) fn replace_hash(&self, path: &str) {
        hash::replace_hash(self.host.as_ref(), path);
    }

    /// Make the host show the current route, if it doesn't already.
    pub(crate) fn ensure_url(&self, push: bool) {
        let current = self.current.borrow().full_path().to_string();
        if self.current_location() != current {
            match push {
                true => self.push_hash(&current),
                false => self.replace_hash(&current),
            }
        }
    }
}
