//! History Integration
//!
//! waypost relies on a [`History`] provider to read and write the location the user sees (the
//! browser address bar, or an emulation of it), to move through the session history, and to be
//! told when the location changes outside of the router (back/forward buttons, manual edits).
//!
//! To integrate waypost with any kind of host, implement the [`History`] trait. This crate ships
//! [`MemoryHistory`], an in-memory emulation of a browser window that is used by default and in
//! tests.

use std::rc::Rc;

mod memory;
pub use memory::*;

/// Events a [`History`] provider reports to its listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HistoryEvent {
    /// The active history entry changed because of a traversal (e.g. `go(-1)`), or because the
    /// location was mutated in a way that creates a new entry.
    PopState,
    /// The fragment (`#...`) of the location changed.
    HashChange,
}

/// Identifies a listener registered through [`History::listen`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub usize);

/// A native history primitive refused to perform an operation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HistoryError {
    /// The host does not allow state changes at the moment (e.g. a sandboxed frame).
    #[error("history state change to `{url}` was rejected by the host")]
    Rejected {
        /// The url that should have been written.
        url: String,
    },
    /// The host does not support the primitive at all.
    #[error("the host does not support `{0}`")]
    Unsupported(&'static str),
}

/// An integration with some kind of navigation history and location bar.
///
/// All methods take `&self`: providers are shared between the router and its listeners, and use
/// interior mutability where they keep state. The described behaviors mimic a web browser
/// `window`, which most users already know.
pub trait History {
    /// Get the complete current location, including any fragment.
    ///
    /// ```rust
    /// # use waypost_history::{History, MemoryHistory};
    /// let history = MemoryHistory::default();
    /// assert_eq!(history.href(), "http://localhost/");
    /// ```
    #[must_use]
    fn href(&self) -> String;

    /// Get the document base, the equivalent of `<base href="...">`.
    ///
    /// Providers without such a concept return [`None`].
    fn base_href(&self) -> Option<String> {
        None
    }

    /// Check whether [`History::push_state`] and [`History::replace_state`] are available.
    fn supports_push_state(&self) -> bool {
        true
    }

    /// Check whether there is a previous page to navigate back to.
    ///
    /// If a provider cannot know this, it should return [`true`].
    #[must_use]
    fn can_go_back(&self) -> bool {
        true
    }

    /// Check whether there is a future page to navigate forward to.
    ///
    /// If a provider cannot know this, it should return [`true`].
    #[must_use]
    fn can_go_forward(&self) -> bool {
        true
    }

    /// Add a new history entry showing `url`, dropping the navigation future.
    ///
    /// This must not notify listeners.
    fn push_state(&self, url: &str) -> Result<(), HistoryError>;

    /// Overwrite the current history entry with `url`.
    ///
    /// This must not notify listeners.
    fn replace_state(&self, url: &str) -> Result<(), HistoryError>;

    /// Navigate the whole location to `url`, adding a history entry.
    fn assign(&self, url: &str);

    /// Navigate the whole location to `url`, overwriting the current history entry.
    fn replace_location(&self, url: &str);

    /// Set the fragment of the current location, adding a history entry.
    ///
    /// `hash` is given without the leading `#`.
    fn set_hash(&self, hash: &str);

    /// Move `delta` steps through the session history. Out of range moves do nothing.
    fn go(&self, delta: isize);

    /// Register `callback` to be called whenever `event` fires.
    fn listen(&self, event: HistoryEvent, callback: Rc<dyn Fn()>) -> ListenerId;

    /// Remove a listener registered with [`History::listen`].
    fn unlisten(&self, id: ListenerId);
}
