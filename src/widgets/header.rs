use std::rc::Rc;

use crate::{effect, store::ChatStore, Subscription};

use super::{MountEnv, View};

/// Shows `<username> | <time>` and keeps the clock running while mounted.
pub struct Header {
    view: Rc<View>,
    _render: Subscription,
    _clock: Subscription,
}

impl Header {
    pub fn mount(store: &Rc<dyn ChatStore>, env: &MountEnv) -> Self {
        let view = Rc::new(View::default());
        let render = effect({
            let store = store.clone();
            let view = view.clone();
            let username = env.username.clone();
            move |sc| {
                let time = store.time(sc);
                view.render(vec![format!("{username} | {time}")]);
            }
        });
        let clock = env.clock.activate(store.clone(), &env.timers);
        Self {
            view,
            _render: render,
            _clock: clock,
        }
    }
    pub fn view(&self) -> &View {
        &self.view
    }
}
