use std::{
    any::Any,
    cell::RefCell,
    mem::{replace, take, transmute},
    rc::{Rc, Weak},
    thread::AccessError,
};

use derive_ex::derive_ex;
use slabmap::SlabMap;


thread_local! {
    static GLOBALS: RefCell<Globals> = RefCell::new(Globals::new());
}

struct Globals {
    is_runtime_exists: bool,
    unbinds: Vec<Vec<SourceBinding>>,
    actions: Vec<Action>,
    tasks: Vec<Task>,
}
impl Globals {
    fn new() -> Self {
        Self {
            is_runtime_exists: false,
            unbinds: Vec::new(),
            actions: Vec::new(),
            tasks: Vec::new(),
        }
    }
    fn with<T>(f: impl FnOnce(&mut Self) -> T) -> T {
        GLOBALS.with(|g| f(&mut g.borrow_mut()))
    }
    fn try_with<T>(f: impl FnOnce(&mut Self) -> T) -> Result<T, AccessError> {
        GLOBALS.try_with(|g| f(&mut g.borrow_mut()))
    }
    fn swap_vec<T>(f: impl FnOnce(&mut Self) -> &mut Vec<T>, values: &mut Vec<T>) -> bool {
        Self::with(|g| std::mem::swap(f(g), values));
        !values.is_empty()
    }
    fn assert_exists(&self) {
        if !self.is_runtime_exists {
            panic!("`Runtime` is not created.");
        }
    }
    fn push_action(&mut self, action: Action) {
        self.assert_exists();
        self.actions.push(action);
    }
    fn push_unbind(bindings: Vec<SourceBinding>) {
        let _ = Self::try_with(|g| g.unbinds.push(bindings));
    }
}

/// Reactive runtime.
///
/// Owns the queues of pending actions and tasks for the current thread.
/// Only one `Runtime` may exist per thread at a time.
#[derive_ex(Default)]
#[default(Self::new())]
pub struct Runtime {
    actions_buffer: Vec<Action>,
    tasks_buffer: Vec<Task>,
    unbinds_buffer: Vec<Vec<SourceBinding>>,
}
impl Runtime {
    pub fn new() -> Self {
        if Globals::with(|g| replace(&mut g.is_runtime_exists, true)) {
            panic!("Only one `Runtime` can exist in the same thread at the same time.");
        };
        Self {
            actions_buffer: Vec::new(),
            tasks_buffer: Vec::new(),
            unbinds_buffer: Vec::new(),
        }
    }

    pub fn ac(&mut self) -> &mut ActionContext {
        ActionContext::new(self)
    }

    /// Returns a [`SignalContext`] that does not track dependencies.
    pub fn sc(&mut self) -> SignalContext<'_> {
        SignalContext { sink: None }
    }

    /// Perform scheduled actions.
    ///
    /// Actions spawned while running are performed in the same call.
    /// Returns `true` if any action was performed.
    pub fn run_actions(&mut self) -> bool {
        self.apply_unbind();
        let mut handled = false;
        let mut actions = take(&mut self.actions_buffer);
        while Globals::swap_vec(|g| &mut g.actions, &mut actions) {
            for action in actions.drain(..) {
                action.call(self.ac());
                handled = true;
            }
        }
        self.actions_buffer = actions;
        handled
    }

    /// Perform scheduled tasks.
    ///
    /// Returns `true` if any task was performed.
    pub fn run_tasks(&mut self) -> bool {
        self.apply_unbind();
        let mut handled = false;
        let mut tasks = take(&mut self.tasks_buffer);
        while Globals::swap_vec(|g| &mut g.tasks, &mut tasks) {
            for task in tasks.drain(..) {
                task.run();
                handled = true;
            }
        }
        self.tasks_buffer = tasks;
        handled
    }

    fn apply_unbind(&mut self) -> bool {
        let mut handled = false;
        let mut unbinds = take(&mut self.unbinds_buffer);
        while Globals::swap_vec(|g| &mut g.unbinds, &mut unbinds) {
            for unbind in unbinds.drain(..) {
                for sb in unbind {
                    sb.unbind();
                }
                handled = true;
            }
        }
        self.unbinds_buffer = unbinds;
        handled
    }

    /// Repeat [`run_actions`](Self::run_actions) and [`run_tasks`](Self::run_tasks)
    /// until there is nothing left to do.
    pub fn update(&mut self) {
        loop {
            if self.run_actions() {
                continue;
            }
            if self.run_tasks() {
                continue;
            }
            break;
        }
    }
}

impl Drop for Runtime {
    fn drop(&mut self) {
        let (actions, tasks) = Globals::with(|g| {
            g.is_runtime_exists = false;
            (take(&mut g.actions), take(&mut g.tasks))
        });
        drop(actions);
        drop(tasks);
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct Slot(pub usize);

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct BindKey(usize);

struct SourceBinding {
    source: Rc<dyn BindSource>,
    slot: Slot,
    key: BindKey,
}
impl SourceBinding {
    fn is_same(&self, node: &Rc<dyn BindSource>, slot: Slot) -> bool {
        Rc::ptr_eq(&self.source, node) && self.slot == slot
    }
    fn unbind(self) {
        self.source.unbind(self.slot, self.key);
    }
}

/// The sources a sink read during its last run.
#[derive(Default)]
pub struct SourceBindings(Vec<SourceBinding>);

impl SourceBindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Calls `f` while recording every source it reads.
    ///
    /// Sources read in the previous run but not in this one are unbound.
    pub fn update<T>(
        &mut self,
        sink: Weak<dyn BindSink>,
        slot: Slot,
        f: impl FnOnce(&mut SignalContext) -> T,
    ) -> T {
        let mut sink = Sink {
            sink,
            slot,
            sources: take(self),
            sources_len: 0,
        };
        let ret = f(&mut SignalContext {
            sink: Some(&mut sink),
        });
        *self = sink.sources;
        for b in self.0.drain(sink.sources_len..) {
            b.unbind();
        }
        ret
    }
    pub fn len(&self) -> usize {
        self.0.len()
    }
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
impl Drop for SourceBindings {
    fn drop(&mut self) {
        if !self.0.is_empty() {
            Globals::push_unbind(take(&mut self.0));
        }
    }
}

struct SinkBinding {
    sink: Weak<dyn BindSink>,
    slot: Slot,
    is_dirty: bool,
}

impl SinkBinding {
    fn notify(&self, nc: &mut NotifyContext) {
        if let Some(node) = self.sink.upgrade() {
            node.notify(self.slot, nc)
        }
    }
}

/// The sinks that read a source since it last notified them.
#[derive(Default)]
pub struct SinkBindings(SlabMap<SinkBinding>);

impl SinkBindings {
    pub fn new() -> Self {
        Self(SlabMap::new())
    }
    pub fn bind(&mut self, this: Rc<dyn BindSource>, this_slot: Slot, sc: &mut SignalContext) {
        let Some(sink) = &mut sc.sink else {
            return;
        };
        if let Some(source_old) = sink.sources.0.get(sink.sources_len) {
            if source_old.is_same(&this, this_slot) {
                self.0[source_old.key.0].is_dirty = false;
                sink.sources_len += 1;
                return;
            }
        }
        let key = BindKey(self.0.insert(SinkBinding {
            sink: sink.sink.clone(),
            slot: sink.slot,
            is_dirty: false,
        }));
        if let Some(old) = sink.push(SourceBinding {
            source: this,
            slot: this_slot,
            key,
        }) {
            Globals::push_unbind(vec![old]);
        }
    }

    /// Unbinds the dependency identified by the given `key`.
    pub fn unbind(&mut self, key: BindKey) {
        self.0.remove(key.0);
    }

    /// Notifies every sink that has read this source since the last notification.
    pub fn notify(&mut self, nc: &mut NotifyContext) {
        self.0.optimize();
        for binding in self.0.values_mut() {
            if !binding.is_dirty {
                binding.is_dirty = true;
                binding.notify(nc);
            }
        }
    }
    pub fn len(&self) -> usize {
        self.0.len()
    }
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

struct Sink {
    sink: Weak<dyn BindSink>,
    slot: Slot,
    sources: SourceBindings,
    sources_len: usize,
}
impl Sink {
    #[must_use]
    fn push(&mut self, binding: SourceBinding) -> Option<SourceBinding> {
        let index = self.sources_len;
        self.sources_len += 1;
        if index < self.sources.0.len() {
            Some(replace(&mut self.sources.0[index], binding))
        } else {
            self.sources.0.push(binding);
            None
        }
    }
}

/// Context for retrieving state and tracking dependencies.
pub struct SignalContext<'s> {
    sink: Option<&'s mut Sink>,
}

pub trait BindSink: 'static {
    fn notify(self: Rc<Self>, slot: Slot, nc: &mut NotifyContext);
}

pub trait BindSource: 'static {
    fn unbind(self: Rc<Self>, slot: Slot, key: BindKey);
}

/// Context for state invalidation notification
#[repr(transparent)]
pub struct NotifyContext(ActionContext);

impl NotifyContext {
    fn new(ac: &mut ActionContext) -> &mut Self {
        unsafe { transmute(ac) }
    }
}

/// Context for changing state.
#[repr(transparent)]
pub struct ActionContext(Runtime);

impl ActionContext {
    fn new(rt: &mut Runtime) -> &mut Self {
        unsafe { transmute(rt) }
    }
    pub fn nc(&mut self) -> &mut NotifyContext {
        NotifyContext::new(self)
    }

    /// Returns a [`SignalContext`] for reading state while changing it.
    pub fn sc(&mut self) -> SignalContext<'_> {
        self.0.sc()
    }
}

/// Spawns a new action.
///
/// Actions run in the order they were spawned on the next
/// [`Runtime::run_actions`] or [`Runtime::update`].
pub fn spawn_action(f: impl FnOnce(&mut ActionContext) + 'static) {
    let _ = Globals::try_with(|g| g.push_action(Action(Box::new(f))));
}

struct Action(Box<dyn FnOnce(&mut ActionContext)>);

impl Action {
    fn call(self, ac: &mut ActionContext) {
        (self.0)(ac)
    }
}

/// A deferred call on a node that is skipped if the node has been dropped.
pub struct Task {
    this: Weak<dyn Any>,
    #[allow(clippy::type_complexity)]
    f: Box<dyn Fn(Weak<dyn Any>)>,
}

impl Task {
    pub fn from_weak_fn<T: Any>(this: Weak<T>, f: impl Fn(Rc<T>) + Copy + 'static) -> Self {
        Task {
            this,
            f: Box::new(move |this| {
                if let Some(this) = this.upgrade() {
                    if let Ok(this) = this.downcast() {
                        f(this)
                    }
                }
            }),
        }
    }

    pub fn schedule(self) {
        let _ = Globals::try_with(|g| g.tasks.push(self));
    }
    fn run(self) {
        (self.f)(self.this)
    }
}
