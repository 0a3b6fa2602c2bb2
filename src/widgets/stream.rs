use std::rc::Rc;

use crate::{effect, store::ChatStore, Subscription};

use super::View;

/// One line per message, oldest first.
pub struct Stream {
    view: Rc<View>,
    _render: Subscription,
}

impl Stream {
    pub fn mount(store: &Rc<dyn ChatStore>) -> Self {
        let view = Rc::new(View::default());
        let render = effect({
            let store = store.clone();
            let view = view.clone();
            move |sc| {
                let messages = store.messages(sc);
                view.render(messages.iter().map(|m| m.to_string()).collect());
            }
        });
        Self {
            view,
            _render: render,
        }
    }
    pub fn view(&self) -> &View {
        &self.view
    }
}
