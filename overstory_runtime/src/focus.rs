// Copyright 2025 the Overstory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Focus scopes: a stack of containers that trap sequential focus.
//!
//! Exactly one scope is unpaused at any time: the most recently activated one
//! still on the stack. Activating a scope pauses the previous top; releasing a
//! scope (from any position) unpauses whichever scope is then on top.
//!
//! The active scope:
//! - wraps Tab from the last visible tabbable descendant to the first, and
//!   Shift+Tab the other way;
//! - pulls focus back when it lands outside the container, to the last
//!   element focused inside or else the container itself.

use alloc::boxed::Box;
use core::fmt;

use overstory_surface::Host;
use smallvec::SmallVec;

use crate::arena::{Arena, Slot};
use crate::tabbable::{auto_focus_target, visible_tabbable};

/// Disposer for an active focus scope.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ScopeHandle(pub(crate) Slot);

/// Where focus goes when a scope activates.
pub enum InitialFocus<H: Host> {
    /// A specific surface.
    Surface(H::Key),
    /// Resolved against the host at activation time.
    Deferred(Box<dyn FnOnce(&H) -> Option<H::Key>>),
}

impl<H: Host> fmt::Debug for InitialFocus<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Surface(k) => f.debug_tuple("Surface").field(k).finish(),
            Self::Deferred(_) => f.write_str("Deferred(..)"),
        }
    }
}

/// Options for [`Runtime::activate_focus_scope`](crate::Runtime::activate_focus_scope).
pub struct ScopeOptions<H: Host> {
    /// Explicit initial focus. Falls back to automatic selection when it
    /// resolves to nothing or to a surface that cannot take focus.
    pub initial_focus: Option<InitialFocus<H>>,
    /// Leave focus where it is on activation.
    pub skip_auto_focus: bool,
    /// Return focus, one tick after release, to whatever held it on activation.
    pub restore_focus: bool,
}

impl<H: Host> Default for ScopeOptions<H> {
    fn default() -> Self {
        Self {
            initial_focus: None,
            skip_auto_focus: false,
            restore_focus: true,
        }
    }
}

impl<H: Host> fmt::Debug for ScopeOptions<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopeOptions")
            .field("initial_focus", &self.initial_focus)
            .field("skip_auto_focus", &self.skip_auto_focus)
            .field("restore_focus", &self.restore_focus)
            .finish()
    }
}

#[derive(Clone, Debug)]
struct Scope<K> {
    container: K,
    paused: bool,
    last_focused: Option<K>,
    restore_to: Option<K>,
}

/// What a focus-in did.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum FocusInOutcome {
    /// No active scope, or the target is inside it.
    Accepted,
    /// Focus was pulled back into the active scope.
    Redirected,
}

#[derive(Clone, Debug)]
pub(crate) struct FocusScopeStack<K> {
    scopes: Arena<Scope<K>>,
    order: SmallVec<[Slot; 8]>,
}

impl<K> Default for FocusScopeStack<K> {
    fn default() -> Self {
        Self {
            scopes: Arena::default(),
            order: SmallVec::new(),
        }
    }
}

impl<K: Copy + Eq> FocusScopeStack<K> {
    pub(crate) fn len(&self) -> usize {
        self.order.len()
    }

    pub(crate) fn top(&self) -> Option<Slot> {
        self.order.last().copied()
    }

    pub(crate) fn is_paused(&self, slot: Slot) -> Option<bool> {
        self.scopes.get(slot).map(|s| s.paused)
    }

    pub(crate) fn container(&self, slot: Slot) -> Option<K> {
        self.scopes.get(slot).map(|s| s.container)
    }

    /// Push a scope for `container`, pausing the previous top, and move focus into it.
    pub(crate) fn activate<H: Host<Key = K>>(
        &mut self,
        host: &mut H,
        container: K,
        options: ScopeOptions<H>,
    ) -> Slot {
        if let Some(prev) = self.top().and_then(|s| self.scopes.get_mut(s)) {
            prev.paused = true;
        }
        let slot = self.scopes.insert(Scope {
            container,
            paused: false,
            last_focused: None,
            restore_to: host.focused().filter(|_| options.restore_focus),
        });
        self.order.push(slot);

        if !options.skip_auto_focus {
            let explicit = match options.initial_focus {
                Some(InitialFocus::Surface(k)) => Some(k),
                Some(InitialFocus::Deferred(thunk)) => thunk(&*host),
                None => None,
            }
            .filter(|&k| host.can_focus(k));
            let target = explicit
                .or_else(|| auto_focus_target(host, container))
                .unwrap_or(container);
            if !host.focus(target) && target != container {
                host.focus(container);
            }
        }
        self.note_focus(host);
        slot
    }

    /// Remove a scope wherever it sits. Returns the surface focus should be
    /// restored to, or `None` for a stale slot.
    pub(crate) fn release(&mut self, slot: Slot) -> Option<Option<K>> {
        let scope = self.scopes.remove(slot)?;
        self.order.retain(|s| *s != slot);
        if let Some(top) = self.top().and_then(|s| self.scopes.get_mut(s)) {
            top.paused = false;
        }
        Some(scope.restore_to)
    }

    /// React to focus arriving at `target`.
    pub(crate) fn focus_in<H: Host<Key = K>>(&mut self, host: &mut H, target: K) -> FocusInOutcome {
        let Some(scope) = self.top().and_then(|s| self.scopes.get_mut(s)) else {
            return FocusInOutcome::Accepted;
        };
        if host.contains(scope.container, target) {
            scope.last_focused = Some(target);
            return FocusInOutcome::Accepted;
        }
        let back = scope
            .last_focused
            .filter(|&k| host.can_focus(k) && host.contains(scope.container, k))
            .unwrap_or(scope.container);
        tracing::trace!("focus left the active scope; pulling it back");
        host.focus(back);
        FocusInOutcome::Redirected
    }

    /// Handle Tab on the active scope. Returns `true` if the host's default
    /// traversal must be suppressed.
    pub(crate) fn tab<H: Host<Key = K>>(&mut self, host: &mut H, backward: bool) -> bool {
        let Some(top) = self.top() else {
            return false;
        };
        let Some(container) = self.container(top) else {
            return false;
        };
        let focused = host.focused();
        if focused.is_some_and(|f| !host.contains(container, f)) {
            return false;
        }
        let candidates = visible_tabbable(host, container);
        let (Some(&first), Some(&last)) = (candidates.first(), candidates.last()) else {
            return true;
        };
        let in_list = focused.is_some_and(|f| candidates.contains(&f));
        let target = if !in_list {
            Some(if backward { last } else { first })
        } else if !backward && focused == Some(last) {
            Some(first)
        } else if backward && focused == Some(first) {
            Some(last)
        } else {
            None
        };
        match target {
            Some(t) => {
                host.focus(t);
                self.note_focus(host);
                true
            }
            None => false,
        }
    }

    /// Record the host's current focus as the active scope's last focused
    /// element if it lies inside the container.
    pub(crate) fn note_focus<H: Host<Key = K>>(&mut self, host: &H) {
        let Some(focused) = host.focused() else {
            return;
        };
        if let Some(scope) = self.top().and_then(|s| self.scopes.get_mut(s))
            && host.contains(scope.container, focused)
        {
            scope.last_focused = Some(focused);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use overstory_surface::{Document, Surface, SurfaceId};

    fn dialog(doc: &mut Document, labels: &[&str]) -> (SurfaceId, alloc::vec::Vec<SurfaceId>) {
        let body = doc.body();
        let c = doc.insert(Some(body), Surface::container());
        let items = labels
            .iter()
            .map(|l| doc.insert(Some(c), Surface::button(l)))
            .collect();
        (c, items)
    }

    #[test]
    fn activation_focuses_first_tabbable_and_pauses_previous() {
        let mut doc = Document::new();
        let (c1, i1) = dialog(&mut doc, &["a", "b"]);
        let (c2, i2) = dialog(&mut doc, &["c"]);
        let mut stack = FocusScopeStack::default();
        let s1 = stack.activate(&mut doc, c1, ScopeOptions::default());
        assert_eq!(doc.focused(), Some(i1[0]));
        let s2 = stack.activate(&mut doc, c2, ScopeOptions::default());
        assert_eq!(doc.focused(), Some(i2[0]));
        assert_eq!(stack.is_paused(s1), Some(true));
        assert_eq!(stack.is_paused(s2), Some(false));
        assert_eq!(stack.release(s2), Some(Some(i1[0])));
        assert_eq!(stack.is_paused(s1), Some(false));
        assert_eq!(stack.release(s2), None, "double release is a no-op");
    }

    #[test]
    fn releasing_a_middle_scope_keeps_the_top_active() {
        let mut doc = Document::new();
        let (c1, _) = dialog(&mut doc, &["a"]);
        let (c2, _) = dialog(&mut doc, &["b"]);
        let (c3, _) = dialog(&mut doc, &["c"]);
        let mut stack = FocusScopeStack::default();
        let s1 = stack.activate(&mut doc, c1, ScopeOptions::default());
        let s2 = stack.activate(&mut doc, c2, ScopeOptions::default());
        let s3 = stack.activate(&mut doc, c3, ScopeOptions::default());
        assert!(stack.release(s2).is_some());
        assert_eq!(stack.top(), Some(s3));
        assert_eq!(stack.is_paused(s3), Some(false));
        assert_eq!(stack.is_paused(s1), Some(true));
    }

    #[test]
    fn tab_wraps_in_both_directions() {
        let mut doc = Document::new();
        let (c, items) = dialog(&mut doc, &["a", "b", "c"]);
        let mut stack = FocusScopeStack::default();
        stack.activate(&mut doc, c, ScopeOptions::default());
        doc.focus(items[2]);
        assert!(stack.tab(&mut doc, false));
        assert_eq!(doc.focused(), Some(items[0]));
        assert!(stack.tab(&mut doc, true));
        assert_eq!(doc.focused(), Some(items[2]));
        doc.focus(items[1]);
        assert!(!stack.tab(&mut doc, false), "middle items use native traversal");
    }

    #[test]
    fn tab_with_no_tabbables_is_swallowed() {
        let mut doc = Document::new();
        let (c, _) = dialog(&mut doc, &[]);
        let mut stack = FocusScopeStack::default();
        stack.activate(&mut doc, c, ScopeOptions::default());
        assert_eq!(doc.focused(), Some(c));
        assert!(stack.tab(&mut doc, false));
        assert_eq!(doc.focused(), Some(c));
    }

    #[test]
    fn focus_outside_is_pulled_back_to_last_focused() {
        let mut doc = Document::new();
        let outside = doc.insert(Some(doc.body()), Surface::button("outside"));
        let (c, items) = dialog(&mut doc, &["a", "b"]);
        let mut stack = FocusScopeStack::default();
        stack.activate(&mut doc, c, ScopeOptions::default());
        doc.focus(items[1]);
        assert_eq!(stack.focus_in(&mut doc, items[1]), FocusInOutcome::Accepted);
        doc.focus(outside);
        assert_eq!(stack.focus_in(&mut doc, outside), FocusInOutcome::Redirected);
        assert_eq!(doc.focused(), Some(items[1]));
    }

    #[test]
    fn explicit_initial_focus_wins_and_invalid_falls_back() {
        let mut doc = Document::new();
        let (c, items) = dialog(&mut doc, &["a", "b"]);
        let mut stack = FocusScopeStack::default();
        let target = items[1];
        let s = stack.activate(
            &mut doc,
            c,
            ScopeOptions {
                initial_focus: Some(InitialFocus::Deferred(Box::new(move |_| Some(target)))),
                ..ScopeOptions::default()
            },
        );
        assert_eq!(doc.focused(), Some(target));
        stack.release(s);

        let stale = doc.insert(None, Surface::button("gone"));
        doc.remove(stale);
        stack.activate(
            &mut doc,
            c,
            ScopeOptions {
                initial_focus: Some(InitialFocus::Surface(stale)),
                ..ScopeOptions::default()
            },
        );
        assert_eq!(doc.focused(), Some(items[0]));
    }
}
