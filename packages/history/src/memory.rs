use std::{cell::RefCell, rc::Rc};

use slab::Slab;
use tracing::trace;

use crate::{History, HistoryError, HistoryEvent, ListenerId};

struct MemoryHistoryState {
    entries: Vec<String>,
    index: usize,
}

impl MemoryHistoryState {
    fn current(&self) -> &str {
        &self.entries[self.index]
    }

    fn push(&mut self, url: String) {
        self.entries.truncate(self.index + 1);
        self.entries.push(url);
        self.index = self.entries.len() - 1;
    }

    fn replace(&mut self, url: String) {
        self.entries[self.index] = url;
    }
}

/// A [`History`] provider that emulates a browser window in memory.
///
/// Entries are complete urls. `push_state` and `replace_state` never notify listeners, while
/// traversals, fragment assignments and whole-location changes that only differ in their
/// fragment fire [`HistoryEvent::PopState`] followed by [`HistoryEvent::HashChange`], the order a
/// browser uses.
pub struct MemoryHistory {
    state: RefCell<MemoryHistoryState>,
    listeners: RefCell<Slab<(HistoryEvent, Rc<dyn Fn()>)>>,
    base_href: Option<String>,
    push_state: bool,
    reject_state: bool,
}

impl Default for MemoryHistory {
    fn default() -> Self {
        Self::with_initial_url("http://localhost/")
    }
}

impl MemoryHistory {
    /// Create a [`MemoryHistory`] showing `url`.
    ///
    /// ```rust
    /// # use waypost_history::{History, MemoryHistory};
    /// let history = MemoryHistory::with_initial_url("http://localhost/app/#/users");
    /// assert_eq!(history.href(), "http://localhost/app/#/users");
    /// assert_eq!(history.can_go_back(), false);
    /// ```
    pub fn with_initial_url(url: impl ToString) -> Self {
        Self {
            state: MemoryHistoryState {
                entries: vec![url.to_string()],
                index: 0,
            }
            .into(),
            listeners: Default::default(),
            base_href: None,
            push_state: true,
            reject_state: false,
        }
    }

    /// Pretend the document carries `<base href="...">`.
    pub fn with_base_href(mut self, base: impl ToString) -> Self {
        self.base_href = Some(base.to_string());
        self
    }

    /// Pretend the host has no `pushState`/`replaceState` support.
    pub fn without_push_state(mut self) -> Self {
        self.push_state = false;
        self
    }

    /// Make every `push_state`/`replace_state` call fail, like a host throwing a security error.
    pub fn rejecting_state_changes(mut self) -> Self {
        self.reject_state = true;
        self
    }

    /// Simulate the user typing `url` into the location bar.
    pub fn visit(&self, url: impl ToString) {
        self.assign(&url.to_string());
    }

    /// Get a copy of every history entry, oldest first.
    pub fn entries(&self) -> Vec<String> {
        self.state.borrow().entries.clone()
    }

    fn fire(&self, events: &[HistoryEvent]) {
        // collect first, listeners may register or remove listeners themselves
        let callbacks: Vec<_> = {
            let listeners = self.listeners.borrow();
            let callbacks = events
                .iter()
                .flat_map(|event| {
                    listeners
                        .iter()
                        .filter(move |(_, (e, _))| e == event)
                        .map(|(_, (_, cb))| cb.clone())
                })
                .collect();
            callbacks
        };

        for callback in callbacks {
            callback();
        }
    }

    fn navigate(&self, url: String, push: bool) {
        let previous = self.href();
        {
            let mut write = self.state.borrow_mut();
            match push {
                true => write.push(url),
                false => write.replace(url),
            }
        }

        let current = self.href();
        trace!(%previous, %current, push, "location changed");
        if same_document(&previous, &current) && fragment(&previous) != fragment(&current) {
            self.fire(&[HistoryEvent::PopState, HistoryEvent::HashChange]);
        }
    }
}

impl History for MemoryHistory {
    fn href(&self) -> String {
        self.state.borrow().current().to_string()
    }

    fn base_href(&self) -> Option<String> {
        self.base_href.clone()
    }

    fn supports_push_state(&self) -> bool {
        self.push_state
    }

    fn can_go_back(&self) -> bool {
        self.state.borrow().index > 0
    }

    fn can_go_forward(&self) -> bool {
        let state = self.state.borrow();
        state.index + 1 < state.entries.len()
    }

    fn push_state(&self, url: &str) -> Result<(), HistoryError> {
        if !self.push_state {
            return Err(HistoryError::Unsupported("pushState"));
        }
        if self.reject_state {
            return Err(HistoryError::Rejected {
                url: url.to_string(),
            });
        }

        self.state.borrow_mut().push(url.to_string());
        Ok(())
    }

    fn replace_state(&self, url: &str) -> Result<(), HistoryError> {
        if !self.push_state {
            return Err(HistoryError::Unsupported("replaceState"));
        }
        if self.reject_state {
            return Err(HistoryError::Rejected {
                url: url.to_string(),
            });
        }

        self.state.borrow_mut().replace(url.to_string());
        Ok(())
    }

    fn assign(&self, url: &str) {
        self.navigate(url.to_string(), true);
    }

    fn replace_location(&self, url: &str) {
        self.navigate(url.to_string(), false);
    }

    fn set_hash(&self, hash: &str) {
        let current = self.href();
        let document = current.split_once('#').map_or(current.as_str(), |(d, _)| d);
        let hash = hash.strip_prefix('#').unwrap_or(hash);
        self.navigate(format!("{document}#{hash}"), true);
    }

    fn go(&self, delta: isize) {
        let (previous, current) = {
            let mut write = self.state.borrow_mut();
            let Some(target) = (write.index as isize).checked_add(delta) else {
                return;
            };
            if delta == 0 || target < 0 || target >= write.entries.len() as isize {
                return;
            }

            let previous = write.current().to_string();
            write.index = target as usize;
            trace!(delta, index = write.index, "traversing history");
            (previous, write.current().to_string())
        };

        match fragment(&previous) != fragment(&current) {
            true => self.fire(&[HistoryEvent::PopState, HistoryEvent::HashChange]),
            false => self.fire(&[HistoryEvent::PopState]),
        }
    }

    fn listen(&self, event: HistoryEvent, callback: Rc<dyn Fn()>) -> ListenerId {
        ListenerId(self.listeners.borrow_mut().insert((event, callback)))
    }

    fn unlisten(&self, id: ListenerId) {
        let mut listeners = self.listeners.borrow_mut();
        if listeners.contains(id.0) {
            listeners.remove(id.0);
        }
    }
}

fn fragment(url: &str) -> Option<&str> {
    url.split_once('#').map(|(_, f)| f)
}

fn same_document(a: &str, b: &str) -> bool {
    let doc = |u: &str| u.split_once('#').map_or(u, |(d, _)| d).to_string();
    doc(a) == doc(b)
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn push_and_go() {
        let history = MemoryHistory::default();
        history.push_state("http://localhost/#/a").unwrap();
        history.push_state("http://localhost/#/b").unwrap();
        assert!(history.can_go_back());
        assert!(!history.can_go_forward());

        history.go(-2);
        assert_eq!(history.href(), "http://localhost/");
        assert!(history.can_go_forward());

        history.go(5);
        assert_eq!(history.href(), "http://localhost/");

        history.go(1);
        assert_eq!(history.href(), "http://localhost/#/a");
    }

    #[test]
    fn huge_moves_are_ignored() {
        let history = MemoryHistory::default();
        history.push_state("http://localhost/#/a").unwrap();

        history.go(isize::MAX);
        assert_eq!(history.href(), "http://localhost/#/a");
        history.go(isize::MIN);
        assert_eq!(history.href(), "http://localhost/#/a");

        history.go(-1);
        assert_eq!(history.href(), "http://localhost/");
    }

    #[test]
    fn push_drops_future() {
        let history = MemoryHistory::default();
        history.push_state("http://localhost/#/a").unwrap();
        history.go(-1);
        history.push_state("http://localhost/#/b").unwrap();
        assert_eq!(
            history.entries(),
            vec!["http://localhost/", "http://localhost/#/b"]
        );
    }

    #[test]
    fn state_changes_are_silent() {
        let history = MemoryHistory::default();
        let fired = Rc::new(Cell::new(0));
        let f = fired.clone();
        history.listen(HistoryEvent::PopState, Rc::new(move || f.set(f.get() + 1)));

        history.push_state("http://localhost/#/a").unwrap();
        history.replace_state("http://localhost/#/b").unwrap();
        assert_eq!(fired.get(), 0);

        history.go(-1);
        assert_eq!(fired.get(), 1);
    }

    #[test]
    fn set_hash_fires_both_events() {
        let history = MemoryHistory::default().without_push_state();
        let events = Rc::new(RefCell::new(Vec::new()));
        for event in [HistoryEvent::PopState, HistoryEvent::HashChange] {
            let e = events.clone();
            history.listen(event, Rc::new(move || e.borrow_mut().push(event)));
        }

        history.set_hash("/users");
        assert_eq!(history.href(), "http://localhost/#/users");
        assert_eq!(
            *events.borrow(),
            vec![HistoryEvent::PopState, HistoryEvent::HashChange]
        );
    }

    #[test]
    fn unsupported_and_rejected() {
        let history = MemoryHistory::default().without_push_state();
        assert_eq!(
            history.push_state("http://localhost/#/a"),
            Err(HistoryError::Unsupported("pushState"))
        );

        let history = MemoryHistory::default().rejecting_state_changes();
        assert!(matches!(
            history.replace_state("http://localhost/#/a"),
            Err(HistoryError::Rejected { .. })
        ));
        assert_eq!(history.href(), "http://localhost/");
    }

    #[test]
    fn unlisten() {
        let history = MemoryHistory::default();
        let fired = Rc::new(Cell::new(false));
        let f = fired.clone();
        let id = history.listen(HistoryEvent::HashChange, Rc::new(move || f.set(true)));
        history.unlisten(id);
        history.unlisten(id);

        history.visit("http://localhost/#/other");
        assert!(!fired.get());
        assert_eq!(history.href(), "http://localhost/#/other");
    }
}
