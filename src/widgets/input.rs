use std::{cell::RefCell, mem::take, rc::Rc};

use tracing::debug;

use crate::{core::ActionContext, store::ChatStore, Key, Subscription};

use super::{MountEnv, View};

/// The text line. Its text is local to the widget and never shared.
pub struct Input {
    state: Rc<InputState>,
    _listener: Subscription,
}

struct InputState {
    store: Rc<dyn ChatStore>,
    text: RefCell<String>,
    view: View,
}

impl InputState {
    fn on_key(&self, key: Key, ac: &mut ActionContext) {
        match key {
            Key::Char(c) => self.text.borrow_mut().push(c),
            Key::Backspace => {
                self.text.borrow_mut().pop();
            }
            Key::Enter => {
                debug!("enter pressed");
                self.submit(ac);
            }
        }
        self.render();
    }

    // empty text is sent as well
    fn submit(&self, ac: &mut ActionContext) {
        let text = take(&mut *self.text.borrow_mut());
        self.store.append_message(text, ac);
    }

    fn render(&self) {
        self.view.render(vec![format!("> {}", self.text.borrow())]);
    }
}

impl Input {
    /// Mounts the input and starts listening to the keyboard.
    pub fn mount(store: &Rc<dyn ChatStore>, env: &MountEnv) -> Self {
        let state = Rc::new(InputState {
            store: store.clone(),
            text: RefCell::new(String::new()),
            view: View::default(),
        });
        state.render();
        let listener = env.keyboard.add_listener({
            let state = state.clone();
            move |key, ac| state.on_key(key, ac)
        });
        Self {
            state,
            _listener: listener,
        }
    }

    /// The send button: appends the current text and clears it.
    pub fn send(&self, ac: &mut ActionContext) {
        self.state.submit(ac);
        self.state.render();
    }

    pub fn text(&self) -> String {
        self.state.text.borrow().clone()
    }
    pub fn view(&self) -> &View {
        &self.state.view
    }
}
