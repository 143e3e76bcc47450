// Copyright 2025 the Overstory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Deferred work.
//!
//! The runtime never reenters itself from a host callback. Anything that must
//! happen "later" (arming an outside-pointer listener, measuring a surface
//! after it has been laid out, restoring focus after a scope is gone) is
//! queued here as a typed [`Continuation`] and executed when the host drives
//! [`Runtime::tick`](crate::Runtime::tick), [`Runtime::paint`](crate::Runtime::paint),
//! or [`Runtime::advance`](crate::Runtime::advance).
//!
//! Continuations name their owner by generational handle; the owner may be
//! gone by the time they run, in which case they do nothing. Owners also keep
//! the [`TaskId`] of pending work and cancel it on disposal.

use alloc::vec::Vec;

use crate::dismiss::LayerHandle;
use crate::floating::PositionerHandle;
use crate::menu::MenuHandle;
use crate::overlay::OverlayHandle;

/// When deferred work should run.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Deferral {
    /// On the next [`Runtime::tick`](crate::Runtime::tick).
    Tick,
    /// On the next [`Runtime::paint`](crate::Runtime::paint), after layout.
    Paint,
    /// Once the clock has advanced by this many milliseconds.
    After(u64),
}

/// Identifier of a queued task; used for cancellation.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) struct TaskId(u64);

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Continuation<K> {
    ArmLayer(LayerHandle),
    RevealFloating(PositionerHandle),
    CloseMenu(MenuHandle),
    ClearTypeahead(MenuHandle),
    RestoreFocus(K),
    FinishExit(OverlayHandle),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Due {
    Tick,
    Paint,
    At(u64),
}

#[derive(Clone, Debug)]
struct Task<K> {
    id: TaskId,
    due: Due,
    work: Continuation<K>,
}

/// FIFO queues for tick and paint work plus a millisecond timer wheel.
#[derive(Clone, Debug)]
pub(crate) struct Scheduler<K> {
    now: u64,
    next_id: u64,
    tasks: Vec<Task<K>>,
}

impl<K> Default for Scheduler<K> {
    fn default() -> Self {
        Self {
            now: 0,
            next_id: 0,
            tasks: Vec::new(),
        }
    }
}

impl<K: Copy> Scheduler<K> {
    pub(crate) fn now(&self) -> u64 {
        self.now
    }

    pub(crate) fn schedule(&mut self, when: Deferral, work: Continuation<K>) -> TaskId {
        let due = match when {
            Deferral::Tick => Due::Tick,
            Deferral::Paint => Due::Paint,
            Deferral::After(ms) => Due::At(self.now.saturating_add(ms)),
        };
        self.next_id += 1;
        let id = TaskId(self.next_id);
        self.tasks.push(Task { id, due, work });
        id
    }

    /// Drop a pending task. Returns `false` if it already ran or was cancelled.
    pub(crate) fn cancel(&mut self, id: TaskId) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.id != id);
        self.tasks.len() != before
    }

    pub(crate) fn pending(&self) -> usize {
        self.tasks.len()
    }

    /// Remove and return every tick task queued so far, oldest first.
    pub(crate) fn take_ticks(&mut self) -> Vec<Continuation<K>> {
        self.take_where(|d| d == Due::Tick)
    }

    /// Remove and return every paint task queued so far, oldest first.
    pub(crate) fn take_paints(&mut self) -> Vec<Continuation<K>> {
        self.take_where(|d| d == Due::Paint)
    }

    /// Pop the earliest timer due at or before `until`, moving the clock to its
    /// deadline. Ties run in scheduling order.
    pub(crate) fn pop_timer(&mut self, until: u64) -> Option<Continuation<K>> {
        let (pos, at) = self
            .tasks
            .iter()
            .enumerate()
            .filter_map(|(i, t)| match t.due {
                Due::At(at) if at <= until => Some((i, at)),
                _ => None,
            })
            .min_by_key(|&(i, at)| (at, self.tasks[i].id.0))?;
        self.now = self.now.max(at);
        Some(self.tasks.remove(pos).work)
    }

    pub(crate) fn set_now(&mut self, now: u64) {
        self.now = self.now.max(now);
    }

    fn take_where(&mut self, pred: impl Fn(Due) -> bool) -> Vec<Continuation<K>> {
        let mut out = Vec::new();
        let mut kept = Vec::with_capacity(self.tasks.len());
        for task in self.tasks.drain(..) {
            if pred(task.due) {
                out.push(task.work);
            } else {
                kept.push(task);
            }
        }
        self.tasks = kept;
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(n: u32) -> Continuation<u32> {
        Continuation::RestoreFocus(n)
    }

    #[test]
    fn ticks_drain_in_fifo_order_and_leave_other_work() {
        let mut s = Scheduler::default();
        s.schedule(Deferral::Tick, close(1));
        s.schedule(Deferral::Paint, close(2));
        s.schedule(Deferral::Tick, close(3));
        assert_eq!(s.take_ticks(), [close(1), close(3)]);
        assert_eq!(s.pending(), 1);
        assert_eq!(s.take_paints(), [close(2)]);
    }

    #[test]
    fn timers_fire_in_deadline_order() {
        let mut s = Scheduler::default();
        s.schedule(Deferral::After(50), close(1));
        s.schedule(Deferral::After(10), close(2));
        s.schedule(Deferral::After(10), close(3));
        assert_eq!(s.pop_timer(5), None);
        assert_eq!(s.pop_timer(20), Some(close(2)));
        assert_eq!(s.now(), 10);
        assert_eq!(s.pop_timer(20), Some(close(3)));
        assert_eq!(s.pop_timer(20), None);
        s.set_now(20);
        assert_eq!(s.pop_timer(60), Some(close(1)));
        assert_eq!(s.now(), 50);
    }

    #[test]
    fn cancelled_tasks_never_run() {
        let mut s = Scheduler::default();
        let id = s.schedule(Deferral::Tick, close(1));
        assert!(s.cancel(id));
        assert!(!s.cancel(id));
        assert!(s.take_ticks().is_empty());
    }
}
