use std::{any::Any, fmt::Debug, future::Future, rc::Rc};

use futures_util::{future::LocalBoxFuture, FutureExt};

use crate::{
    error::GuardError,
    guards::{GuardFuture, InstanceGuard, NavigationGuard, Next},
    state::Route,
};

/// A mounted instance of a [`RouteComponent`].
///
/// The router hands instances to `before_route_update` and `before_route_leave` guards, and to
/// callbacks returned from `before_route_enter` guards through [`Next::ContinueWith`].
pub trait ComponentInstance: Any {
    /// Whether the instance is being torn down. Pending enter callbacks skip such instances.
    fn is_being_destroyed(&self) -> bool {
        false
    }

    /// Get the instance as [`Any`], for downcasting.
    fn as_any(&self) -> &dyn Any;
}

/// A shared handle to a [`ComponentInstance`].
pub type Instance = Rc<dyn ComponentInstance>;

/// Something a route renders, which may guard navigations to, within and away from it.
pub trait RouteComponent {
    /// Guards run before a route rendering this component is entered. No instance exists yet.
    fn enter_guards(&self) -> Vec<NavigationGuard> {
        Vec::new()
    }

    /// Guards run when the route stays active but its location changes.
    fn update_guards(&self) -> Vec<InstanceGuard> {
        Vec::new()
    }

    /// Guards run before a route rendering this component is left.
    fn leave_guards(&self) -> Vec<InstanceGuard> {
        Vec::new()
    }
}

/// Produces a [`RouteComponent`] the first time a route needs it.
pub type LazyComponent =
    Rc<dyn Fn() -> LocalBoxFuture<'static, Result<Rc<dyn RouteComponent>, GuardError>>>;

/// The component registered for one named view of a route.
#[derive(Clone)]
pub enum ComponentSlot {
    /// A component that is ready to use.
    Ready(Rc<dyn RouteComponent>),
    /// A component that still has to be resolved.
    Lazy(LazyComponent),
}

impl ComponentSlot {
    /// Create a [`ComponentSlot::Lazy`] from an async factory.
    pub fn lazy<F, Fut>(factory: F) -> Self
    where
        F: Fn() -> Fut + 'static,
        Fut: Future<Output = Result<Rc<dyn RouteComponent>, GuardError>> + 'static,
    {
        Self::Lazy(Rc::new(move || factory().boxed_local()))
    }

    /// Get the component, if it is resolved.
    pub fn ready(&self) -> Option<&Rc<dyn RouteComponent>> {
        match self {
            Self::Ready(c) => Some(c),
            Self::Lazy(_) => None,
        }
    }
}

impl Debug for ComponentSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ready(_) => f.write_str("Ready"),
            Self::Lazy(_) => f.write_str("Lazy"),
        }
    }
}

impl<C: RouteComponent + 'static> From<C> for ComponentSlot {
    fn from(value: C) -> Self {
        Self::Ready(Rc::new(value))
    }
}

impl From<Rc<dyn RouteComponent>> for ComponentSlot {
    fn from(value: Rc<dyn RouteComponent>) -> Self {
        Self::Ready(value)
    }
}

/// A [`RouteComponent`] assembled from closures.
///
/// ```rust
/// # use waypost_router::prelude::*;
/// let component = Component::new("Editor")
///     .before_route_leave(|_, _, _| async { Next::Abort })
///     .before_route_enter(|to, _| {
///         let allowed = to.query().contains_key("token");
///         async move { if allowed { Next::Continue } else { Next::redirect("/login") } }
///     });
/// assert_eq!(component.name(), "Editor");
/// assert_eq!(component.leave_guards().len(), 1);
/// ```
#[derive(Clone, Default)]
pub struct Component {
    name: String,
    enter: Vec<NavigationGuard>,
    update: Vec<InstanceGuard>,
    leave: Vec<InstanceGuard>,
}

impl Component {
    /// Create a [`Component`] without any guards.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// The name of the component, only used for diagnostics.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Add a guard run before the component's route is entered.
    pub fn before_route_enter<F, Fut>(mut self, guard: F) -> Self
    where
        F: Fn(&Route, &Route) -> Fut + 'static,
        Fut: Future<Output = Next> + 'static,
    {
        self.enter.push(crate::guards::guard(guard));
        self
    }

    /// Add a guard run when the component's route is reused for another location.
    pub fn before_route_update<F, Fut>(mut self, guard: F) -> Self
    where
        F: Fn(&Instance, &Route, &Route) -> Fut + 'static,
        Fut: Future<Output = Next> + 'static,
    {
        self.update.push(instance_guard(guard));
        self
    }

    /// Add a guard run before the component's route is left.
    pub fn before_route_leave<F, Fut>(mut self, guard: F) -> Self
    where
        F: Fn(&Instance, &Route, &Route) -> Fut + 'static,
        Fut: Future<Output = Next> + 'static,
    {
        self.leave.push(instance_guard(guard));
        self
    }
}

impl Debug for Component {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Component")
            .field("name", &self.name)
            .field("enter", &self.enter.len())
            .field("update", &self.update.len())
            .field("leave", &self.leave.len())
            .finish()
    }
}

impl RouteComponent for Component {
    fn enter_guards(&self) -> Vec<NavigationGuard> {
        self.enter.clone()
    }

    fn update_guards(&self) -> Vec<InstanceGuard> {
        self.update.clone()
    }

    fn leave_guards(&self) -> Vec<InstanceGuard> {
        self.leave.clone()
    }
}

fn instance_guard<F, Fut>(guard: F) -> InstanceGuard
where
    F: Fn(&Instance, &Route, &Route) -> Fut + 'static,
    Fut: Future<Output = Next> + 'static,
{
    Rc::new(
        move |instance: &Instance, to: &Route, from: &Route| -> GuardFuture {
            guard(instance, to, from).boxed_local()
        },
    )
}
