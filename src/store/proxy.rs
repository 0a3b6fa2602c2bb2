use std::{
    cell::{Ref, RefCell},
    rc::Rc,
};

use tracing::debug;

use crate::{
    core::{
        ActionContext, BindKey, BindSource, NotifyContext, SignalContext, SinkBindings, Slot,
    },
    Message, MessageLog,
};

use super::{ChatSnapshot, ChatStore, Manager};

const TIME: Slot = Slot(0);
const MESSAGES: Slot = Slot(1);
const FIELDS: [Slot; 2] = [TIME, MESSAGES];

/// One mutable object with per-field change tracking.
///
/// Readers go through a [`ProxySnapshot`], which depends only on the fields
/// actually read. Writers go through a [`ProxyMut`], which notifies the
/// readers of each written field when it is dropped.
#[derive(Default)]
pub struct ProxyStore(Rc<ProxyNode>);

#[derive(Default)]
struct ProxyNode {
    state: RefCell<ChatSnapshot>,
    sinks: [RefCell<SinkBindings>; 2],
}
impl ProxyNode {
    fn bind(self: &Rc<Self>, slot: Slot, sc: &mut SignalContext) {
        self.sinks[slot.0].borrow_mut().bind(self.clone(), slot, sc);
    }
    fn notify(&self, slot: Slot, nc: &mut NotifyContext) {
        self.sinks[slot.0].borrow_mut().notify(nc);
    }
}
impl BindSource for ProxyNode {
    fn unbind(self: Rc<Self>, slot: Slot, key: BindKey) {
        self.sinks[slot.0].borrow_mut().unbind(key);
    }
}

impl ProxyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a read view that depends on each field the first time it is read.
    pub fn snapshot<'a, 's>(&'a self, sc: &'a mut SignalContext<'s>) -> ProxySnapshot<'a, 's> {
        ProxySnapshot { node: &self.0, sc }
    }

    /// Returns a writable proxy. Readers are notified when it is dropped.
    pub fn proxy<'a>(&'a self, ac: &'a mut ActionContext) -> ProxyMut<'a> {
        ProxyMut {
            node: &self.0,
            changed: [false; 2],
            nc: ac.nc(),
        }
    }

    /// Number of readers currently depending on the clock value and on the message log.
    pub fn reader_counts(&self) -> (usize, usize) {
        (
            self.0.sinks[TIME.0].borrow().len(),
            self.0.sinks[MESSAGES.0].borrow().len(),
        )
    }
}

pub struct ProxySnapshot<'a, 's> {
    node: &'a Rc<ProxyNode>,
    sc: &'a mut SignalContext<'s>,
}
impl ProxySnapshot<'_, '_> {
    pub fn time(&mut self) -> String {
        self.node.bind(TIME, self.sc);
        self.node.state.borrow().time.clone()
    }
    pub fn messages(&mut self) -> MessageLog {
        self.node.bind(MESSAGES, self.sc);
        self.node.state.borrow().messages.clone()
    }
}

pub struct ProxyMut<'a> {
    node: &'a ProxyNode,
    changed: [bool; 2],
    nc: &'a mut NotifyContext,
}
impl ProxyMut<'_> {
    pub fn time(&self) -> Ref<'_, str> {
        Ref::map(self.node.state.borrow(), |s| s.time.as_str())
    }
    pub fn messages(&self) -> Ref<'_, MessageLog> {
        Ref::map(self.node.state.borrow(), |s| &s.messages)
    }
    pub fn set_time(&mut self, time: String) {
        let mut state = self.node.state.borrow_mut();
        if state.time != time {
            state.time = time;
            self.changed[TIME.0] = true;
        }
    }
    pub fn push_message(&mut self, message: Message) {
        self.node.state.borrow_mut().messages.push(message);
        self.changed[MESSAGES.0] = true;
    }
}
impl Drop for ProxyMut<'_> {
    fn drop(&mut self) {
        for slot in FIELDS {
            if self.changed[slot.0] {
                self.node.notify(slot, self.nc);
            }
        }
    }
}

impl ChatStore for ProxyStore {
    fn manager(&self) -> Manager {
        Manager::Proxy
    }
    fn time(&self, sc: &mut SignalContext) -> String {
        self.snapshot(sc).time()
    }
    fn messages(&self, sc: &mut SignalContext) -> MessageLog {
        self.snapshot(sc).messages()
    }
    fn read(&self, sc: &mut SignalContext) -> ChatSnapshot {
        let mut snap = self.snapshot(sc);
        ChatSnapshot {
            time: snap.time(),
            messages: snap.messages(),
        }
    }
    fn set_time(&self, time: String, ac: &mut ActionContext) {
        debug!(manager = "proxy", %time, "set_time");
        self.proxy(ac).set_time(time);
    }
    fn append_message(&self, text: String, ac: &mut ActionContext) {
        let mut proxy = self.proxy(ac);
        let time = proxy.time().to_string();
        debug!(manager = "proxy", %text, %time, "append_message");
        proxy.push_message(Message { text, time });
    }
}
