use std::{
    cell::RefCell,
    rc::{Rc, Weak},
};

use crate::{
    core::{BindSink, NotifyContext, SignalContext, Slot, SourceBindings, Task},
    Subscription,
};

#[cfg(test)]
mod tests;

/// Call a function each time a dependency changes.
///
/// The function is first called on the next [`Runtime::update`](crate::core::Runtime::update),
/// and again after any state it read during its previous call notifies.
///
/// If the [`Subscription`] returned from this function is dropped, the function will not be called again.
pub fn effect(f: impl FnMut(&mut SignalContext) + 'static) -> Subscription {
    let node = EffectNode::new(f);
    node.schedule();
    Subscription::from_rc(node)
}

struct EffectData<F> {
    f: F,
    sources: SourceBindings,
    is_dirty: bool,
}

struct EffectNode<F> {
    data: RefCell<EffectData<F>>,
    this: Weak<Self>,
}
impl<F> EffectNode<F>
where
    F: FnMut(&mut SignalContext) + 'static,
{
    fn new(f: F) -> Rc<Self> {
        Rc::new_cyclic(|this| Self {
            data: RefCell::new(EffectData {
                f,
                sources: SourceBindings::new(),
                is_dirty: true,
            }),
            this: this.clone(),
        })
    }

    fn schedule(self: &Rc<Self>) {
        Task::from_weak_fn(Rc::downgrade(self), Self::call).schedule()
    }
    fn call(self: Rc<Self>) {
        let EffectData {
            f,
            sources,
            is_dirty,
        } = &mut *self.data.borrow_mut();
        if *is_dirty {
            *is_dirty = false;
            let sink: Weak<dyn BindSink> = self.this.clone();
            sources.update(sink, Slot(0), f);
        }
    }
}

impl<F> BindSink for EffectNode<F>
where
    F: FnMut(&mut SignalContext) + 'static,
{
    fn notify(self: Rc<Self>, _slot: Slot, _nc: &mut NotifyContext) {
        let need_schedule = {
            let mut d = self.data.borrow_mut();
            !std::mem::replace(&mut d.is_dirty, true)
        };
        if need_schedule {
            self.schedule();
        }
    }
}
