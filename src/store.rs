//! The shared chat state and its three interchangeable containers.
//!
//! Every container holds the clock value and the message log and satisfies
//! [`ChatStore`]. They differ in how a reader comes to depend on a slice of
//! the state:
//!
//! - [`AtomStore`] keeps each slice in its own [`State`](crate::State).
//! - [`ProxyStore`] keeps one mutable object; snapshots record which
//!   fields were touched.
//! - [`SelectorStore`] notifies every listener on every change; selections
//!   forward a change only when the selected value differs.
use std::rc::Rc;

use parse_display::{Display, FromStr};
use serde::{Deserialize, Serialize};

use crate::{
    core::{ActionContext, SignalContext},
    MessageLog,
};

mod atom;
mod proxy;
mod selector;

pub use atom::AtomStore;
pub use proxy::{ProxyMut, ProxySnapshot, ProxyStore};
pub use selector::{Selected, SelectorStore};


/// The whole chat state at one point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatSnapshot {
    pub time: String,
    pub messages: MessageLog,
}

/// A container shared by the chat widgets.
pub trait ChatStore: 'static {
    fn manager(&self) -> Manager;

    /// Reads the clock value and depends on it.
    fn time(&self, sc: &mut SignalContext) -> String;

    /// Reads the message log and depends on it.
    fn messages(&self, sc: &mut SignalContext) -> MessageLog;

    /// Reads both slices and depends on both.
    fn read(&self, sc: &mut SignalContext) -> ChatSnapshot {
        ChatSnapshot {
            time: self.time(sc),
            messages: self.messages(sc),
        }
    }

    /// Replaces the clock value. Writing the value already held notifies nobody.
    fn set_time(&self, time: String, ac: &mut ActionContext);

    /// Appends `text` stamped with the clock value current at the time of the call.
    ///
    /// Empty text is appended like any other.
    fn append_message(&self, text: String, ac: &mut ActionContext);
}

/// Selects the [`ChatStore`] implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, FromStr)]
#[display(style = "snake_case")]
pub enum Manager {
    Atom,
    Proxy,
    #[default]
    Selector,
}

impl Manager {
    pub const ALL: [Manager; 3] = [Manager::Atom, Manager::Proxy, Manager::Selector];

    pub fn create(self) -> Rc<dyn ChatStore> {
        match self {
            Manager::Atom => Rc::new(AtomStore::new()),
            Manager::Proxy => Rc::new(ProxyStore::new()),
            Manager::Selector => Rc::new(SelectorStore::new()),
        }
    }
}
