use std::{cell::RefCell, rc::Rc};

use parse_display::Display;
use slabmap::SlabMap;

use crate::{core::ActionContext, Subscription};

/// A key press delivered to the chat screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum Key {
    #[display("{0}")]
    Char(char),
    Backspace,
    Enter,
}

type KeyListener = Rc<RefCell<dyn FnMut(Key, &mut ActionContext)>>;

/// Window-level key listeners.
#[derive(Clone, Default)]
pub struct Keyboard(Rc<RefCell<SlabMap<KeyListener>>>);

impl Keyboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `f` until the returned subscription is dropped.
    pub fn add_listener(&self, f: impl FnMut(Key, &mut ActionContext) + 'static) -> Subscription {
        let key = self.0.borrow_mut().insert(Rc::new(RefCell::new(f)));
        Subscription::from_weak_fn(Rc::downgrade(&self.0), move |listeners| {
            listeners.borrow_mut().remove(key);
        })
    }

    /// Delivers `key` to every listener in registration order.
    pub fn dispatch(&self, key: Key, ac: &mut ActionContext) {
        let listeners: Vec<KeyListener> = self.0.borrow().values().cloned().collect();
        for listener in listeners {
            (&mut *listener.borrow_mut())(key, ac);
        }
    }

    /// Types each character of `text`.
    pub fn type_text(&self, text: &str, ac: &mut ActionContext) {
        for c in text.chars() {
            self.dispatch(Key::Char(c), ac);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.0.borrow().len()
    }
}
