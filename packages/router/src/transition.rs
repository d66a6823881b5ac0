//! The guard queues run between matching a target and committing it.

use std::{
    cell::RefCell,
    panic::{catch_unwind, AssertUnwindSafe},
    rc::Rc,
};

use futures_util::{future::try_join_all, FutureExt};
use tracing::{error, trace};

use crate::{
    error::GuardError,
    guards::{InstanceGuard, NavigationGuard, Next},
    location::RawLocation,
    route_definition::{ComponentSlot, Instance, LazyComponent, RouteComponent},
    route_map::{RecordId, RouteTable},
    state::Route,
};

/// How the records of two routes relate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueueDiff {
    /// Records both routes share, root first.
    pub updated: Vec<RecordId>,
    /// Records only the next route has, root first.
    pub activated: Vec<RecordId>,
    /// Records only the current route has, deepest first.
    pub deactivated: Vec<RecordId>,
}

/// Compare the matched records of the current and the next route.
///
/// Both routes share the records up to the first index where they differ.
///
/// ```rust
/// # use waypost_router::prelude::*;
/// # use waypost_router::transition::resolve_queue;
/// let router = Router::new(RouterOptions::default().route(
///     RouteConfig::new("/a").name("a").children([
///         RouteConfig::new("b").name("b"),
///         RouteConfig::new("c").name("c"),
///     ]),
/// ));
/// let b = router.match_route("/a/b", None);
/// let c = router.match_route("/a/c", None);
///
/// let diff = resolve_queue(b.matched(), c.matched());
/// assert_eq!(diff.updated, [b.matched()[0]]);
/// assert_eq!(diff.activated, [c.matched()[1]]);
/// assert_eq!(diff.deactivated, [b.matched()[1]]);
/// ```
pub fn resolve_queue(current: &[RecordId], next: &[RecordId]) -> QueueDiff {
    let max = current.len().max(next.len());
    let i = (0..max)
        .find(|&i| current.get(i) != next.get(i))
        .unwrap_or(max);

    QueueDiff {
        updated: next[..i.min(next.len())].to_vec(),
        activated: next[i.min(next.len())..].to_vec(),
        deactivated: current[i.min(current.len())..].iter().rev().copied().collect(),
    }
}

/// A single entry of a guard queue.
pub(crate) enum Step {
    Guard(NavigationGuard),
    /// An enter guard of a component, whose callback belongs to `slot` of `record`.
    Enter {
        guard: NavigationGuard,
        record: RecordId,
        slot: String,
    },
    ResolveAsync(Vec<(RecordId, String, LazyComponent)>),
}

/// Why a queue stopped early.
#[derive(Debug)]
pub(crate) enum Interrupt {
    Abort,
    Redirect(RawLocation),
    Fail(GuardError),
    Panicked,
}

/// Leave guards, global before hooks, update guards, `before_enter` of activated records and the
/// async component resolver.
pub(crate) fn before_queue(
    table: &RouteTable,
    diff: &QueueDiff,
    before_hooks: Vec<NavigationGuard>,
) -> Vec<Option<Step>> {
    let mut queue = extract_instance_guards(table, &diff.deactivated, true, |c| c.leave_guards());
    queue.extend(before_hooks.into_iter().map(|g| Some(Step::Guard(g))));
    queue.extend(extract_instance_guards(table, &diff.updated, false, |c| {
        c.update_guards()
    }));
    queue.extend(diff.activated.iter().map(|id| {
        table
            .get(*id)
            .and_then(|r| r.before_enter.clone())
            .map(Step::Guard)
    }));
    queue.push(Some(Step::ResolveAsync(lazy_components(table, &diff.activated))));
    queue
}

/// Enter guards of activated records and the global resolve hooks.
pub(crate) fn resolve_queue_steps(
    table: &RouteTable,
    activated: &[RecordId],
    resolve_hooks: Vec<NavigationGuard>,
) -> Vec<Option<Step>> {
    let mut queue = Vec::new();
    for &id in activated {
        let Some(record) = table.get(id) else {
            continue;
        };
        for (slot, component) in &record.components {
            let Some(component) = component.ready() else {
                continue;
            };
            for guard in component.enter_guards() {
                queue.push(Some(Step::Enter {
                    guard,
                    record: id,
                    slot: slot.clone(),
                }));
            }
        }
    }
    queue.extend(resolve_hooks.into_iter().map(|g| Some(Step::Guard(g))));
    queue
}

/// Collect the guards `role` yields for every resolved component of `records`, bound to the
/// mounted instance. Guards of components without an instance leave an empty entry.
fn extract_instance_guards(
    table: &RouteTable,
    records: &[RecordId],
    reverse_slots: bool,
    role: impl Fn(&dyn RouteComponent) -> Vec<InstanceGuard>,
) -> Vec<Option<Step>> {
    let mut queue = Vec::new();
    for &id in records {
        let Some(record) = table.get(id) else {
            continue;
        };

        let mut slots: Vec<_> = record.components.iter().collect();
        if reverse_slots {
            slots.reverse();
        }

        for (slot, component) in slots {
            let Some(component) = component.ready() else {
                continue;
            };
            let instance = record.instances.get(slot);
            for guard in role(component.as_ref()) {
                queue.push(instance.map(|i| Step::Guard(bind_guard(guard, i.clone()))));
            }
        }
    }
    queue
}

fn bind_guard(guard: InstanceGuard, instance: Instance) -> NavigationGuard {
    Rc::new(move |to: &Route, from: &Route| guard(&instance, to, from))
}

fn lazy_components(table: &RouteTable, records: &[RecordId]) -> Vec<(RecordId, String, LazyComponent)> {
    records
        .iter()
        .filter_map(|id| table.get(*id).map(|r| (*id, r)))
        .flat_map(|(id, record)| {
            record
                .components
                .iter()
                .filter_map(move |(slot, component)| match component {
                    ComponentSlot::Lazy(factory) => Some((id, slot.clone(), factory.clone())),
                    ComponentSlot::Ready(_) => None,
                })
        })
        .collect()
}

/// Run `queue` one step at a time, until it is exhausted or a step interrupts it.
pub(crate) async fn run_queue(
    table: &RefCell<RouteTable>,
    queue: Vec<Option<Step>>,
    to: &Route,
    from: &Route,
) -> Result<(), Interrupt> {
    for (index, step) in queue.into_iter().enumerate() {
        let Some(step) = step else {
            trace!(index, "skipping unbound guard");
            continue;
        };
        trace!(index, to = to.full_path(), "running queue step");

        let next = match step {
            Step::Guard(guard) => invoke(&guard, to, from).await?,
            Step::Enter {
                guard,
                record,
                slot,
            } => match invoke(&guard, to, from).await? {
                Next::ContinueWith(callback) => {
                    if let Some(record) = table.borrow_mut().get_mut(record) {
                        record.entered_cbs.entry(slot).or_default().push(callback);
                    }
                    Next::Continue
                }
                next => next,
            },
            Step::ResolveAsync(pending) => resolve_async_components(table, pending).await,
        };

        match next {
            Next::Continue | Next::ContinueWith(_) => {}
            Next::Abort => return Err(Interrupt::Abort),
            Next::Redirect(to) => return Err(Interrupt::Redirect(to)),
            Next::Fail(err) => return Err(Interrupt::Fail(err)),
        }
    }

    Ok(())
}

async fn invoke(guard: &NavigationGuard, to: &Route, from: &Route) -> Result<Next, Interrupt> {
    let Ok(future) = catch_unwind(AssertUnwindSafe(|| guard(to, from))) else {
        error!(to = to.full_path(), from = from.full_path(), "navigation guard panicked");
        return Err(Interrupt::Panicked);
    };

    match AssertUnwindSafe(future).catch_unwind().await {
        Ok(next) => Ok(next),
        Err(_) => {
            error!(to = to.full_path(), from = from.full_path(), "navigation guard panicked");
            Err(Interrupt::Panicked)
        }
    }
}

/// Resolve all lazy components, storing each in its record as soon as it is ready.
///
/// Fails with the first error, without waiting for the other factories.
async fn resolve_async_components(
    table: &RefCell<RouteTable>,
    pending: Vec<(RecordId, String, LazyComponent)>,
) -> Next {
    if pending.is_empty() {
        return Next::Continue;
    }

    let resolved = try_join_all(pending.into_iter().map(|(record, slot, factory)| async move {
        let component = match catch_unwind(AssertUnwindSafe(|| factory())) {
            Ok(future) => AssertUnwindSafe(future)
                .catch_unwind()
                .await
                .unwrap_or_else(|_| Err(panicked(&slot))),
            Err(_) => Err(panicked(&slot)),
        };

        match component {
            Ok(component) => {
                trace!(slot, "resolved async component");
                if let Some(record) = table.borrow_mut().get_mut(record) {
                    record.components.insert(slot, ComponentSlot::Ready(component));
                }
                Ok(())
            }
            Err(err) => Err(err),
        }
    }))
    .await;

    match resolved {
        Ok(_) => Next::Continue,
        Err(err) => Next::Fail(err),
    }
}

fn panicked(slot: &str) -> GuardError {
    GuardError::new(format!(
        "Failed to resolve async component {slot}: the factory panicked"
    ))
}
