use std::{
    cell::RefCell,
    rc::{Rc, Weak},
};

use slabmap::SlabMap;
use tracing::debug;

use crate::{
    core::{
        ActionContext, BindKey, BindSource, NotifyContext, SignalContext, SinkBindings, Slot,
    },
    Message, MessageLog, Subscription,
};

use super::{ChatSnapshot, ChatStore, Manager};

type Listener = Rc<RefCell<dyn FnMut(&ChatSnapshot, &ChatSnapshot, &mut NotifyContext)>>;

/// An external store holding the whole state.
///
/// Every change is announced to every listener. Readers subscribe through a
/// [`Selected`] value, which re-runs its selector on each change and
/// notifies its own readers only when the result differs.
pub struct SelectorStore {
    node: Rc<StoreNode>,
    time: Selected<String>,
    messages: Selected<MessageLog>,
}

#[derive(Default)]
struct StoreNode {
    state: RefCell<ChatSnapshot>,
    listeners: RefCell<SlabMap<Listener>>,
}
impl StoreNode {
    fn add_listener(
        self: &Rc<Self>,
        listener: impl FnMut(&ChatSnapshot, &ChatSnapshot, &mut NotifyContext) + 'static,
    ) -> Subscription {
        let key = self.listeners.borrow_mut().insert(Rc::new(RefCell::new(listener)));
        Subscription::from_weak_fn(Rc::downgrade(self), move |node| {
            node.listeners.borrow_mut().remove(key);
        })
    }
}

impl Default for SelectorStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SelectorStore {
    pub fn new() -> Self {
        let node = Rc::new(StoreNode::default());
        let time = Selected::new(&node, |s| s.time.clone());
        let messages = Selected::new(&node, |s| s.messages.clone());
        Self {
            node,
            time,
            messages,
        }
    }

    /// Returns the current state without depending on it.
    pub fn get_state(&self) -> ChatSnapshot {
        self.node.state.borrow().clone()
    }

    /// Applies `f` to the state and, if the state changed, calls every listener
    /// with the new and the previous state.
    pub fn set_state(&self, ac: &mut ActionContext, f: impl FnOnce(&mut ChatSnapshot)) {
        let (next, prev) = {
            let mut state = self.node.state.borrow_mut();
            let prev = state.clone();
            f(&mut *state);
            if *state == prev {
                return;
            }
            (state.clone(), prev)
        };
        let listeners: Vec<Listener> = self.node.listeners.borrow().values().cloned().collect();
        let nc = ac.nc();
        for listener in listeners {
            (&mut *listener.borrow_mut())(&next, &prev, nc);
        }
    }

    /// Registers a listener called with the new and the previous state after every change.
    pub fn subscribe(
        &self,
        mut listener: impl FnMut(&ChatSnapshot, &ChatSnapshot) + 'static,
    ) -> Subscription {
        self.node.add_listener(move |next, prev, _nc| listener(next, prev))
    }

    /// Creates a derived value that changes only when `selector` returns a different result.
    pub fn select<T: PartialEq + 'static>(
        &self,
        selector: impl Fn(&ChatSnapshot) -> T + 'static,
    ) -> Selected<T> {
        Selected::new(&self.node, selector)
    }

    pub fn listener_count(&self) -> usize {
        self.node.listeners.borrow().len()
    }
}

impl ChatStore for SelectorStore {
    fn manager(&self) -> Manager {
        Manager::Selector
    }
    fn time(&self, sc: &mut SignalContext) -> String {
        self.time.get(sc)
    }
    fn messages(&self, sc: &mut SignalContext) -> MessageLog {
        self.messages.get(sc)
    }
    fn set_time(&self, time: String, ac: &mut ActionContext) {
        debug!(manager = "selector", %time, "set_time");
        self.set_state(ac, |s| s.time = time);
    }
    fn append_message(&self, text: String, ac: &mut ActionContext) {
        self.set_state(ac, |s| {
            let time = s.time.clone();
            debug!(manager = "selector", %text, %time, "append_message");
            s.messages.push(Message { text, time });
        });
    }
}

/// A value selected from a [`SelectorStore`].
pub struct Selected<T: 'static> {
    node: Rc<SelectedNode<T>>,
    _listener: Subscription,
}

struct SelectedNode<T: 'static> {
    value: RefCell<T>,
    sinks: RefCell<SinkBindings>,
}

impl<T: PartialEq + 'static> Selected<T> {
    fn new(store: &Rc<StoreNode>, selector: impl Fn(&ChatSnapshot) -> T + 'static) -> Self {
        let node = Rc::new(SelectedNode {
            value: RefCell::new(selector(&*store.state.borrow())),
            sinks: RefCell::new(SinkBindings::new()),
        });
        let weak: Weak<SelectedNode<T>> = Rc::downgrade(&node);
        let listener = store.add_listener(move |next, _prev, nc| {
            if let Some(node) = weak.upgrade() {
                node.on_change(selector(next), nc);
            }
        });
        Self {
            node,
            _listener: listener,
        }
    }

    /// Borrows the selected value and depends on it.
    pub fn with<U>(&self, sc: &mut SignalContext, f: impl FnOnce(&T) -> U) -> U {
        self.node.bind(sc);
        f(&self.node.value.borrow())
    }

    /// Gets the selected value and depends on it.
    pub fn get(&self, sc: &mut SignalContext) -> T
    where
        T: Clone,
    {
        self.with(sc, T::clone)
    }
}

impl<T: PartialEq + 'static> SelectedNode<T> {
    fn bind(self: &Rc<Self>, sc: &mut SignalContext) {
        self.sinks.borrow_mut().bind(self.clone(), Slot(0), sc);
    }
    fn on_change(&self, value: T, nc: &mut NotifyContext) {
        {
            let mut current = self.value.borrow_mut();
            if *current == value {
                return;
            }
            *current = value;
        }
        self.sinks.borrow_mut().notify(nc);
    }
}

impl<T: 'static> BindSource for SelectedNode<T> {
    fn unbind(self: Rc<Self>, _slot: Slot, key: BindKey) {
        self.sinks.borrow_mut().unbind(key);
    }
}
