use std::{ops::Deref, rc::Rc};

use parse_display::Display;
use serde::{Deserialize, Serialize};


/// A chat message and the clock value it was sent at.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[display("[{time}] {text}")]
pub struct Message {
    pub text: String,
    pub time: String,
}

impl Message {
    pub fn new(text: impl Into<String>, time: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            time: time.into(),
        }
    }
}

/// Append-only list of messages in send order.
///
/// Clones share storage; appending to a shared log copies it first, so a
/// clone taken earlier keeps seeing the messages it was taken with.
#[derive(Debug, Clone, Default, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageLog(Rc<Vec<Message>>);

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn push(&mut self, message: Message) {
        Rc::make_mut(&mut self.0).push(message);
    }
    pub fn as_slice(&self) -> &[Message] {
        &self.0
    }
    pub fn shares_storage_with(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}
impl PartialEq for MessageLog {
    fn eq(&self, other: &Self) -> bool {
        self.shares_storage_with(other) || self.0 == other.0
    }
}
impl Deref for MessageLog {
    type Target = [Message];
    fn deref(&self) -> &Self::Target {
        self.as_slice()
    }
}
impl<'a> IntoIterator for &'a MessageLog {
    type Item = &'a Message;
    type IntoIter = std::slice::Iter<'a, Message>;
    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
impl FromIterator<Message> for MessageLog {
    fn from_iter<I: IntoIterator<Item = Message>>(iter: I) -> Self {
        Self(Rc::new(iter.into_iter().collect()))
    }
}
