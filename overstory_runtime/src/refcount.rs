// Copyright 2025 the Overstory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Reference-counted process-wide effects: scroll locking and focus guards.
//!
//! Both effects are applied when their count goes from zero to one and
//! reverted when it returns to zero. Unbalanced releases are clamped at zero
//! and logged.

use overstory_surface::Host;

use crate::arena::Slot;

/// Saturating acquire/release counter.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct RefCount {
    count: usize,
}

impl RefCount {
    /// Current count.
    pub fn get(self) -> usize {
        self.count
    }

    /// Increment. Returns `true` on the transition from zero.
    pub fn acquire(&mut self) -> bool {
        self.count += 1;
        self.count == 1
    }

    /// Decrement. Returns `true` on the transition to zero; releasing at zero
    /// is a no-op that returns `false`.
    pub fn release(&mut self) -> bool {
        match self.count {
            0 => false,
            n => {
                self.count = n - 1;
                self.count == 0
            }
        }
    }
}

/// Shared counter freezing background scroll while any modal surface is open.
#[derive(Clone, Debug, Default)]
pub struct ScrollLock {
    count: RefCount,
}

impl ScrollLock {
    /// Number of outstanding locks.
    pub fn count(&self) -> usize {
        self.count.get()
    }

    /// Take a lock; the first one freezes scrolling with scrollbar compensation.
    pub fn lock<H: Host>(&mut self, host: &mut H) {
        if self.count.acquire() {
            let compensation = host.scrollbar_width().max(0.0);
            tracing::debug!(compensation, "scroll frozen");
            host.freeze_scroll(compensation);
        }
    }

    /// Drop a lock; the last one restores the saved styles.
    pub fn unlock<H: Host>(&mut self, host: &mut H) {
        if self.count.get() == 0 {
            tracing::warn!("unbalanced scroll unlock ignored");
            return;
        }
        if self.count.release() {
            tracing::debug!("scroll restored");
            host.unfreeze_scroll();
        }
    }
}

/// Shared counter keeping focus sentinels at both ends of the surface tree.
#[derive(Clone, Debug, Default)]
pub struct FocusGuards {
    count: RefCount,
}

impl FocusGuards {
    /// Number of outstanding installs.
    pub fn count(&self) -> usize {
        self.count.get()
    }

    /// Install; the first call inserts the sentinels.
    pub fn install<H: Host>(&mut self, host: &mut H) {
        if self.count.acquire() {
            tracing::debug!("focus guards inserted");
            host.insert_focus_guards();
        }
    }

    /// Uninstall; the last call removes the sentinels.
    pub fn uninstall<H: Host>(&mut self, host: &mut H) {
        if self.count.get() == 0 {
            tracing::warn!("unbalanced focus guard uninstall ignored");
            return;
        }
        if self.count.release() {
            tracing::debug!("focus guards removed");
            host.remove_focus_guards();
        }
    }
}

/// Disposer for one scroll lock taken through [`Runtime::lock_scroll`](crate::Runtime::lock_scroll).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct LockHandle(pub(crate) Slot);

/// Disposer for one guard install taken through
/// [`Runtime::install_focus_guards`](crate::Runtime::install_focus_guards).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct GuardHandle(pub(crate) Slot);

#[cfg(test)]
mod tests {
    use super::*;
    use overstory_surface::{Document, Surface};

    #[test]
    fn scroll_lock_applies_on_first_and_reverts_on_last() {
        let mut doc = Document::new();
        doc.set_scrollbar_width(15.0);
        let mut lock = ScrollLock::default();
        lock.lock(&mut doc);
        lock.lock(&mut doc);
        assert_eq!(doc.scroll_frozen(), Some(15.0));
        lock.unlock(&mut doc);
        assert_eq!(doc.scroll_frozen(), Some(15.0), "still held once");
        lock.unlock(&mut doc);
        assert_eq!(doc.scroll_frozen(), None);
        // A third unlock is clamped: no effect, count stays at zero.
        lock.unlock(&mut doc);
        assert_eq!(lock.count(), 0);
        assert_eq!(doc.scroll_frozen(), None);
        lock.lock(&mut doc);
        assert_eq!(lock.count(), 1);
        assert_eq!(doc.scroll_frozen(), Some(15.0));
    }

    #[test]
    fn negative_scrollbar_width_is_not_compensated() {
        let mut doc = Document::new();
        doc.set_scrollbar_width(-3.0);
        let mut lock = ScrollLock::default();
        lock.lock(&mut doc);
        assert_eq!(doc.scroll_frozen(), Some(0.0));
    }

    #[test]
    fn guards_are_inserted_once() {
        let mut doc = Document::new();
        let body = doc.body();
        let content = doc.insert(Some(body), Surface::default());
        let mut guards = FocusGuards::default();
        guards.install(&mut doc);
        let first = doc.focus_guards();
        guards.install(&mut doc);
        assert_eq!(doc.focus_guards(), first);
        assert_eq!(doc.children_of(body).len(), 3);
        guards.uninstall(&mut doc);
        assert!(doc.focus_guards().is_some());
        guards.uninstall(&mut doc);
        assert_eq!(doc.children_of(body), &[content]);
        guards.uninstall(&mut doc);
        assert_eq!(guards.count(), 0);
    }

    #[test]
    fn refcount_saturates_at_zero() {
        let mut rc = RefCount::default();
        assert!(!rc.release());
        assert!(rc.acquire());
        assert!(!rc.acquire());
        assert!(!rc.release());
        assert!(rc.release());
        assert_eq!(rc.get(), 0);
    }
}
