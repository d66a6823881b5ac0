//! A hash-mode client side router.
//!
//! Routes are declared as a tree of [`RouteConfig`](route_definition::RouteConfig)s. A
//! [`Router`] compiles them into a route table, matches navigation targets against it, runs the
//! navigation guards of the routes being left, reused and entered, and finally commits the new
//! [`Route`](state::Route) by writing it into the hash of a
//! [`History`](waypost_history::History) provider.
//!
//! ```rust
//! use waypost_router::prelude::*;
//!
//! # futures::executor::block_on(async {
//! let router = Router::new(
//!     RouterOptions::default()
//!         .route(RouteConfig::new("/").name("home"))
//!         .route(
//!             RouteConfig::new("/admin")
//!                 .name("admin")
//!                 .before_enter(|_, _| async { Next::redirect("/") }),
//!         ),
//! );
//! router.init().await;
//!
//! let route = router.push("/admin").await.unwrap();
//! assert_eq!(route.path(), "/");
//! assert_eq!(route.redirected_from(), Some("/admin"));
//! # });
//! ```
#![deny(missing_docs)]

pub mod error;
pub mod guards;
pub mod location;
pub mod path;
pub mod query;
pub mod route_definition;
pub mod state;
pub mod transition;

mod history;
mod matcher;
mod route_map;
mod router;
mod router_cfg;

pub use error::{GuardError, NavigationError};
pub use matcher::RouteRecordInfo;
pub use route_map::RecordId;
pub use router::{AppId, Resolved, Router};
pub use router_cfg::RouterOptions;

/// A collection of useful items most applications might need.
pub mod prelude {
    pub use crate::error::{GuardError, NavigationError};
    pub use crate::guards::{guard, sync_guard, Next, Unregister};
    pub use crate::location::{Location, LocationDescriptor, Params, RawLocation};
    pub use crate::query::{Query, QueryValue};
    pub use crate::route_definition::{
        Component, ComponentInstance, ComponentSlot, Instance, RouteComponent, RouteConfig,
    };
    pub use crate::state::{Meta, Route};
    pub use crate::{AppId, RecordId, Resolved, RouteRecordInfo, Router, RouterOptions};
}
