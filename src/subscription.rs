use std::{
    any::Any,
    mem::take,
    rc::{Rc, Weak},
};


/// Keeps a registration alive; dropping it unregisters.
#[must_use]
pub struct Subscription(RawSubscription);

impl Subscription {
    pub fn from_fn(f: impl FnOnce() + 'static) -> Self {
        Subscription(RawSubscription::Fn(Box::new(f)))
    }
    pub fn from_rc(rc: Rc<dyn Any>) -> Self {
        Subscription(RawSubscription::Rc(rc))
    }

    /// Calls `unsubscribe` on drop if `this` is still alive.
    pub fn from_weak_fn<T: 'static>(
        this: Weak<T>,
        unsubscribe: impl FnOnce(Rc<T>) + 'static,
    ) -> Self {
        Self::from_fn(move || {
            if let Some(this) = this.upgrade() {
                unsubscribe(this)
            }
        })
    }
}
impl Drop for Subscription {
    fn drop(&mut self) {
        match take(&mut self.0) {
            RawSubscription::Empty => {}
            RawSubscription::Fn(f) => f(),
            RawSubscription::Rc(_) => {}
        }
    }
}
impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.0 {
            RawSubscription::Empty => write!(f, "Subscription(dropped)"),
            RawSubscription::Fn(_) => write!(f, "Subscription(fn)"),
            RawSubscription::Rc(_) => write!(f, "Subscription(rc)"),
        }
    }
}

#[derive(Default)]
enum RawSubscription {
    #[default]
    Empty,
    Fn(Box<dyn FnOnce() + 'static>),
    Rc(#[allow(unused)] Rc<dyn Any>),
}
