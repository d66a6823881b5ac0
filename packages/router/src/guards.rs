//! Navigation guards and hooks.
//!
//! A guard is an async function receiving the route being navigated to and the route being left.
//! It decides how the navigation proceeds by resolving to a [`Next`].

use std::{
    cell::{Cell, RefCell},
    fmt::Debug,
    future::Future,
    rc::{Rc, Weak},
};

use futures_util::{future::LocalBoxFuture, FutureExt};

use crate::{
    error::GuardError,
    location::RawLocation,
    route_definition::Instance,
    state::Route,
};

/// The decision of a navigation guard.
pub enum Next {
    /// Let the navigation proceed.
    Continue,
    /// Let the navigation proceed, and call the callback with the component instance once the
    /// route was entered.
    ///
    /// Only `before_route_enter` guards of components can use the callback. For all other guards
    /// this is the same as [`Next::Continue`].
    ContinueWith(EnteredCallback),
    /// Stop the navigation and restore the previous location.
    Abort,
    /// Stop the navigation and start a new one to the given location.
    ///
    /// The new navigation replaces the current history entry if the location asks for it.
    Redirect(RawLocation),
    /// Stop the navigation because of an error.
    Fail(GuardError),
}

impl Next {
    /// Create a [`Next::Redirect`].
    pub fn redirect(to: impl Into<RawLocation>) -> Self {
        Self::Redirect(to.into())
    }

    /// Create a [`Next::Fail`].
    pub fn fail(err: impl Into<GuardError>) -> Self {
        Self::Fail(err.into())
    }

    /// Create a [`Next::ContinueWith`].
    pub fn with_instance(callback: impl FnOnce(&Instance) + 'static) -> Self {
        Self::ContinueWith(Box::new(callback))
    }
}

impl Debug for Next {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Continue => write!(f, "Continue"),
            Self::ContinueWith(_) => write!(f, "ContinueWith"),
            Self::Abort => write!(f, "Abort"),
            Self::Redirect(to) => f.debug_tuple("Redirect").field(to).finish(),
            Self::Fail(err) => f.debug_tuple("Fail").field(err).finish(),
        }
    }
}

impl From<bool> for Next {
    fn from(value: bool) -> Self {
        match value {
            true => Self::Continue,
            false => Self::Abort,
        }
    }
}

impl From<RawLocation> for Next {
    fn from(value: RawLocation) -> Self {
        Self::Redirect(value)
    }
}

impl From<GuardError> for Next {
    fn from(value: GuardError) -> Self {
        Self::Fail(value)
    }
}

/// A callback queued by a `before_route_enter` guard.
pub type EnteredCallback = Box<dyn FnOnce(&Instance)>;

/// The future a guard returns.
pub type GuardFuture = LocalBoxFuture<'static, Next>;

/// A guard that receives the target and the current route.
pub type NavigationGuard = Rc<dyn Fn(&Route, &Route) -> GuardFuture>;

/// A guard bound to a mounted component instance.
pub type InstanceGuard = Rc<dyn Fn(&Instance, &Route, &Route) -> GuardFuture>;

/// A hook called after a navigation committed, with the new and the previous route.
pub type AfterHook = Rc<dyn Fn(&Route, &Route)>;

/// Turn an async closure into a [`NavigationGuard`].
///
/// ```rust
/// # use waypost_router::prelude::*;
/// let only_home = guard(|to, _| {
///     let home = to.path() == "/";
///     async move { Next::from(home) }
/// });
/// ```
pub fn guard<F, Fut>(f: F) -> NavigationGuard
where
    F: Fn(&Route, &Route) -> Fut + 'static,
    Fut: Future<Output = Next> + 'static,
{
    Rc::new(move |to: &Route, from: &Route| f(to, from).boxed_local())
}

/// Turn a synchronous closure into a [`NavigationGuard`].
pub fn sync_guard<F>(f: F) -> NavigationGuard
where
    F: Fn(&Route, &Route) -> Next + 'static,
{
    Rc::new(move |to: &Route, from: &Route| {
        futures_util::future::ready(f(to, from)).boxed_local()
    })
}

/// Removes a hook registered with the router.
pub struct Unregister {
    remove: Box<dyn FnOnce()>,
}

impl Unregister {
    /// Remove the hook. Doing this during a navigation does not affect that navigation.
    pub fn unregister(self) {
        (self.remove)()
    }
}

impl Debug for Unregister {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Unregister").finish_non_exhaustive()
    }
}

/// An ordered list of hooks that can be removed through an [`Unregister`] handle.
pub(crate) struct HookList<T> {
    hooks: Rc<RefCell<Vec<(u64, T)>>>,
    next_id: Cell<u64>,
}

impl<T> Default for HookList<T> {
    fn default() -> Self {
        Self {
            hooks: Default::default(),
            next_id: Cell::new(0),
        }
    }
}

impl<T: Clone + 'static> HookList<T> {
    pub(crate) fn register(&self, hook: T) -> Unregister {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.hooks.borrow_mut().push((id, hook));

        let hooks: Weak<RefCell<Vec<(u64, T)>>> = Rc::downgrade(&self.hooks);
        Unregister {
            remove: Box::new(move || {
                if let Some(hooks) = hooks.upgrade() {
                    hooks.borrow_mut().retain(|(i, _)| *i != id);
                }
            }),
        }
    }

    /// Copy the hooks, so that changes made while they run don't affect the caller.
    pub(crate) fn snapshot(&self) -> Vec<T> {
        self.hooks.borrow().iter().map(|(_, h)| h.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unregister_removes_only_its_hook() {
        let list = HookList::<&'static str>::default();
        let a = list.register("a");
        let _b = list.register("b");
        let c = list.register("c");

        c.unregister();
        assert_eq!(list.snapshot(), vec!["a", "b"]);

        a.unregister();
        assert_eq!(list.snapshot(), vec!["b"]);
    }

    #[test]
    fn unregister_after_drop_is_harmless() {
        let handle = {
            let list = HookList::<u8>::default();
            list.register(1)
        };
        handle.unregister();
    }

    #[test]
    fn next_conversions() {
        assert!(matches!(Next::from(true), Next::Continue));
        assert!(matches!(Next::from(false), Next::Abort));
        assert!(matches!(Next::redirect("/login"), Next::Redirect(_)));
        assert!(matches!(Next::fail("nope"), Next::Fail(e) if e.message() == "nope"));
    }
}
