use tracing::debug;

use crate::{
    core::{ActionContext, SignalContext},
    Message, MessageLog, State,
};

use super::{ChatStore, Manager};

/// Two independent atoms; appending reads the time atom without depending on it.
#[derive(Default)]
pub struct AtomStore {
    time: State<String>,
    messages: State<MessageLog>,
}

impl AtomStore {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn time_atom(&self) -> &State<String> {
        &self.time
    }
    pub fn messages_atom(&self) -> &State<MessageLog> {
        &self.messages
    }
}

impl ChatStore for AtomStore {
    fn manager(&self) -> Manager {
        Manager::Atom
    }
    fn time(&self, sc: &mut SignalContext) -> String {
        self.time.get(sc)
    }
    fn messages(&self, sc: &mut SignalContext) -> MessageLog {
        self.messages.get(sc)
    }
    fn set_time(&self, time: String, ac: &mut ActionContext) {
        debug!(manager = "atom", %time, "set_time");
        self.time.set_dedup(time, ac);
    }
    fn append_message(&self, text: String, ac: &mut ActionContext) {
        let time = self.time.get(&mut ac.sc());
        debug!(manager = "atom", %text, %time, "append_message");
        self.messages.update(ac, |log| log.push(Message { text, time }));
    }
}
