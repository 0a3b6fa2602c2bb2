use futures::channel::mpsc::{unbounded, UnboundedReceiver, UnboundedSender};
use parse_display::Display;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{core::ActionContext, store::ChatStore, ChannelClosed};


/// A mutation submitted from outside the runtime's thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ChatCommand {
    #[display("set_time({0})")]
    SetTime(String),
    #[display("append_message({0})")]
    AppendMessage(String),
}

impl ChatCommand {
    pub fn apply(self, store: &dyn ChatStore, ac: &mut ActionContext) {
        match self {
            ChatCommand::SetTime(time) => store.set_time(time, ac),
            ChatCommand::AppendMessage(text) => store.append_message(text, ac),
        }
    }
}

/// Creates a channel whose sender can be moved to other threads.
///
/// Commands are applied one at a time, in send order, by whoever owns the receiver.
pub fn command_channel() -> (CommandSender, CommandReceiver) {
    let (tx, rx) = unbounded();
    (CommandSender(tx), CommandReceiver(rx))
}

#[derive(Debug, Clone)]
pub struct CommandSender(UnboundedSender<ChatCommand>);

impl CommandSender {
    pub fn send(&self, command: ChatCommand) -> Result<(), ChannelClosed> {
        self.0.unbounded_send(command).map_err(|_| ChannelClosed {})
    }
    pub fn set_time(&self, time: impl Into<String>) -> Result<(), ChannelClosed> {
        self.send(ChatCommand::SetTime(time.into()))
    }
    pub fn append_message(&self, text: impl Into<String>) -> Result<(), ChannelClosed> {
        self.send(ChatCommand::AppendMessage(text.into()))
    }
}

#[derive(Debug)]
pub struct CommandReceiver(UnboundedReceiver<ChatCommand>);

impl CommandReceiver {
    /// Applies every command received so far. Returns how many were applied.
    pub fn drain(&mut self, store: &dyn ChatStore, ac: &mut ActionContext) -> usize {
        let mut count = 0;
        while let Ok(Some(command)) = self.0.try_next() {
            debug!(%command, "applying command");
            command.apply(store, ac);
            count += 1;
        }
        count
    }
}
