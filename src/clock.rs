//! Interval timers and the clock that feeds the shared time value.
use std::{cell::RefCell, rc::Rc, time::Duration};

use slabmap::SlabMap;
use time::{macros::format_description, OffsetDateTime, UtcOffset};
use tracing::{debug, trace, warn};

use crate::{spawn_action, store::ChatStore, Subscription};


/// Produces the display string for "now".
pub trait TimeSource: 'static {
    fn now(&self) -> String;
}

/// The local wall clock, formatted like `9:05:07 AM`.
#[derive(Debug, Clone, Copy)]
pub struct LocalClock {
    offset: UtcOffset,
}

impl LocalClock {
    /// Captures the local UTC offset; falls back to UTC when it cannot be determined.
    pub fn new() -> Self {
        let offset = UtcOffset::current_local_offset().unwrap_or_else(|e| {
            warn!(error = %e, "local offset unavailable, showing UTC");
            UtcOffset::UTC
        });
        Self { offset }
    }
    pub fn with_offset(offset: UtcOffset) -> Self {
        Self { offset }
    }

    pub fn format(&self, t: OffsetDateTime) -> String {
        let format = format_description!("[hour repr:12 padding:none]:[minute]:[second] [period]");
        t.to_offset(self.offset).format(format).unwrap_or_else(|e| {
            warn!(error = %e, "failed to format time");
            String::new()
        })
    }
}
impl Default for LocalClock {
    fn default() -> Self {
        Self::new()
    }
}
impl TimeSource for LocalClock {
    fn now(&self) -> String {
        self.format(OffsetDateTime::now_utc())
    }
}

/// A queue of interval timers driven by a virtual clock.
///
/// Time only moves when [`advance`](Self::advance) or
/// [`advance_to`](Self::advance_to) is called.
#[derive(Clone, Default)]
pub struct Timers(Rc<RefCell<TimerQueue>>);

#[derive(Default)]
struct TimerQueue {
    now: Duration,
    entries: SlabMap<Interval>,
}

struct Interval {
    period: Duration,
    next: Duration,
    tick: Rc<RefCell<dyn FnMut()>>,
}

impl Timers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Calls `tick` every `period` until the returned subscription is dropped.
    ///
    /// # Panics
    ///
    /// Panics if `period` is zero.
    pub fn set_interval(&self, period: Duration, tick: impl FnMut() + 'static) -> Subscription {
        assert!(!period.is_zero(), "interval period must be greater than zero");
        let key = {
            let mut q = self.0.borrow_mut();
            let next = q.now + period;
            q.entries.insert(Interval {
                period,
                next,
                tick: Rc::new(RefCell::new(tick)),
            })
        };
        debug!(key, ?period, "interval started");
        Subscription::from_weak_fn(Rc::downgrade(&self.0), move |q| {
            if q.borrow_mut().entries.remove(key).is_some() {
                debug!(key, "interval cancelled");
            }
        })
    }

    pub fn advance(&self, d: Duration) {
        let to = self.now() + d;
        self.advance_to(to);
    }

    /// Moves the clock forward to `to`, firing every due interval in deadline order.
    ///
    /// Moving backwards does nothing.
    pub fn advance_to(&self, to: Duration) {
        loop {
            let tick = {
                let q = &mut *self.0.borrow_mut();
                let Some((key, next)) = q
                    .entries
                    .iter()
                    .map(|(key, e)| (key, e.next))
                    .filter(|&(_, next)| next <= to)
                    .min_by_key(|&(key, next)| (next, key))
                else {
                    break;
                };
                let e = &mut q.entries[key];
                e.next += e.period;
                q.now = q.now.max(next);
                trace!(key, at = ?next, "interval fired");
                e.tick.clone()
            };
            (&mut *tick.borrow_mut())();
        }
        let mut q = self.0.borrow_mut();
        q.now = q.now.max(to);
    }

    pub fn now(&self) -> Duration {
        self.0.borrow().now
    }

    /// The earliest time at which an interval fires.
    pub fn next_deadline(&self) -> Option<Duration> {
        self.0.borrow().entries.values().map(|e| e.next).min()
    }

    /// Number of active intervals.
    pub fn len(&self) -> usize {
        self.0.borrow().entries.len()
    }
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Writes the current time into a store once per period.
#[derive(Clone)]
pub struct ClockSource {
    period: Duration,
    source: Rc<dyn TimeSource>,
}

impl ClockSource {
    pub fn new(period: Duration, source: Rc<dyn TimeSource>) -> Self {
        Self { period, source }
    }
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Starts ticking into `store`. Dropping the returned subscription stops the clock.
    ///
    /// Each tick reads the time immediately and schedules `set_time` as an action.
    pub fn activate(&self, store: Rc<dyn ChatStore>, timers: &Timers) -> Subscription {
        let source = self.source.clone();
        timers.set_interval(self.period, move || {
            let time = source.now();
            let store = store.clone();
            spawn_action(move |ac| store.set_time(time, ac));
        })
    }
}
