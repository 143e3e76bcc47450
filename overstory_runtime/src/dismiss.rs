// Copyright 2025 the Overstory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dismiss layers: a stack of surfaces that close on the cancel key or on a
//! pointer press outside them.
//!
//! Only the topmost layer reacts. A layer listens for outside pointers only
//! after it has been armed, one tick after activation, so the press that
//! opened it cannot also close it.
//!
//! Pointer detection runs in two phases. The capture phase marks every layer
//! whose container holds the target; the bubble phase then asks only the
//! topmost layer, which dismisses if it was not marked. Marks are cleared after
//! every press.
//!
//! Layers may isolate pointer events: while any isolating layer is active,
//! presses that land outside the topmost isolating layer and every layer above
//! it are reported as suppressed.

use alloc::boxed::Box;
use core::fmt;

use overstory_surface::Host;
use smallvec::SmallVec;

use crate::arena::{Arena, Slot};
use crate::event::{DismissReason, Interaction};
use crate::menu::MenuHandle;
use crate::overlay::OverlayHandle;
use crate::scheduler::TaskId;

/// Disposer for an active dismiss layer.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct LayerHandle(pub(crate) Slot);

/// A hook that may veto a dismissal with [`Interaction::prevent_default`].
pub type DismissHook<K> = Box<dyn FnMut(&mut Interaction<K>)>;

/// Options for [`Runtime::activate_dismiss_layer`](crate::Runtime::activate_dismiss_layer).
pub struct LayerOptions<K> {
    /// Suppress pointer input outside this layer (and the layers above it).
    pub isolate_pointer_events: bool,
    /// Runs before a cancel-key dismissal.
    pub on_cancel_key: Option<DismissHook<K>>,
    /// Runs before an outside-pointer dismissal.
    pub on_outside_pointer: Option<DismissHook<K>>,
    /// Runs when the layer is dismissed. The layer stays active until the
    /// caller deactivates it.
    pub on_dismiss: Option<Box<dyn FnMut(DismissReason)>>,
}

impl<K> Default for LayerOptions<K> {
    fn default() -> Self {
        Self {
            isolate_pointer_events: false,
            on_cancel_key: None,
            on_outside_pointer: None,
            on_dismiss: None,
        }
    }
}

impl<K> fmt::Debug for LayerOptions<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayerOptions")
            .field("isolate_pointer_events", &self.isolate_pointer_events)
            .field("on_cancel_key", &self.on_cancel_key.is_some())
            .field("on_outside_pointer", &self.on_outside_pointer.is_some())
            .field("on_dismiss", &self.on_dismiss.is_some())
            .finish()
    }
}

impl<K: 'static> LayerOptions<K> {
    /// Options for a layer that vetoes every dismissal attempt.
    pub fn undismissable() -> Self {
        Self {
            on_cancel_key: Some(Box::new(Interaction::prevent_default)),
            on_outside_pointer: Some(Box::new(Interaction::prevent_default)),
            ..Self::default()
        }
    }
}

/// Who closes a layer once it is dismissed.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Owner {
    Caller,
    Overlay(OverlayHandle),
    Menu(MenuHandle),
}

struct Layer<K> {
    container: K,
    options: LayerOptions<K>,
    owner: Owner,
    armed: bool,
    pointer_inside: bool,
    arm_task: Option<TaskId>,
}

impl<K: fmt::Debug> fmt::Debug for Layer<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Layer")
            .field("container", &self.container)
            .field("options", &self.options)
            .field("owner", &self.owner)
            .field("armed", &self.armed)
            .field("pointer_inside", &self.pointer_inside)
            .field("arm_task", &self.arm_task)
            .finish()
    }
}

/// A dismissal that got past the hooks.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) struct Dismissal<K> {
    pub(crate) layer: LayerHandle,
    pub(crate) owner: Owner,
    pub(crate) reason: DismissReason,
    pub(crate) target: Option<K>,
}

#[derive(Debug)]
pub(crate) struct DismissLayerStack<K> {
    layers: Arena<Layer<K>>,
    order: SmallVec<[Slot; 8]>,
}

impl<K> Default for DismissLayerStack<K> {
    fn default() -> Self {
        Self {
            layers: Arena::default(),
            order: SmallVec::new(),
        }
    }
}

impl<K: Copy + Eq> DismissLayerStack<K> {
    pub(crate) fn len(&self) -> usize {
        self.order.len()
    }

    pub(crate) fn top(&self) -> Option<LayerHandle> {
        self.order.last().copied().map(LayerHandle)
    }

    pub(crate) fn is_armed(&self, layer: LayerHandle) -> Option<bool> {
        self.layers.get(layer.0).map(|l| l.armed)
    }

    pub(crate) fn push(&mut self, container: K, options: LayerOptions<K>, owner: Owner) -> LayerHandle {
        let slot = self.layers.insert(Layer {
            container,
            options,
            owner,
            armed: false,
            pointer_inside: false,
            arm_task: None,
        });
        self.order.push(slot);
        LayerHandle(slot)
    }

    pub(crate) fn set_arm_task(&mut self, layer: LayerHandle, task: TaskId) {
        if let Some(l) = self.layers.get_mut(layer.0) {
            l.arm_task = Some(task);
        }
    }

    /// Start listening for outside pointers. Stale handles are ignored.
    pub(crate) fn arm(&mut self, layer: LayerHandle) {
        if let Some(l) = self.layers.get_mut(layer.0) {
            l.armed = true;
            l.arm_task = None;
        }
    }

    /// Remove a layer. Returns its pending arm task, or `None` for stale handles.
    pub(crate) fn remove(&mut self, layer: LayerHandle) -> Option<Option<TaskId>> {
        let removed = self.layers.remove(layer.0)?;
        self.order.retain(|s| *s != layer.0);
        Some(removed.arm_task)
    }

    /// Index into `order` of the topmost isolating layer.
    fn isolation_floor(&self) -> Option<usize> {
        self.order.iter().rposition(|s| {
            self.layers
                .get(*s)
                .is_some_and(|l| l.options.isolate_pointer_events)
        })
    }

    /// Container of the topmost isolating layer.
    pub(crate) fn isolation_root(&self) -> Option<K> {
        let floor = self.isolation_floor()?;
        self.layers.get(self.order[floor]).map(|l| l.container)
    }

    pub(crate) fn is_suppressed<H: Host<Key = K>>(&self, host: &H, target: K) -> bool {
        let Some(floor) = self.isolation_floor() else {
            return false;
        };
        !self.order[floor..].iter().any(|s| {
            self.layers
                .get(*s)
                .is_some_and(|l| host.contains(l.container, target))
        })
    }

    pub(crate) fn pointer_down<H: Host<Key = K>>(
        &mut self,
        host: &H,
        target: K,
    ) -> Option<Dismissal<K>> {
        for slot in &self.order {
            if let Some(l) = self.layers.get_mut(*slot) {
                l.pointer_inside = host.contains(l.container, target);
            }
        }
        let result = self.bubble_pointer(target);
        for slot in &self.order {
            if let Some(l) = self.layers.get_mut(*slot) {
                l.pointer_inside = false;
            }
        }
        result
    }

    fn bubble_pointer(&mut self, target: K) -> Option<Dismissal<K>> {
        let top = self.top()?;
        let layer = self.layers.get_mut(top.0)?;
        if !layer.armed || layer.pointer_inside {
            return None;
        }
        let mut interaction = Interaction::new(DismissReason::OutsidePointer, Some(target));
        if let Some(hook) = layer.options.on_outside_pointer.as_mut() {
            hook(&mut interaction);
        }
        if interaction.default_prevented() {
            tracing::trace!("outside-pointer dismissal vetoed");
            return None;
        }
        Some(Self::dismiss(top, layer, DismissReason::OutsidePointer, Some(target)))
    }

    pub(crate) fn cancel_key(&mut self) -> Option<Dismissal<K>> {
        let top = self.top()?;
        let layer = self.layers.get_mut(top.0)?;
        let mut interaction = Interaction::new(DismissReason::CancelKey, None);
        if let Some(hook) = layer.options.on_cancel_key.as_mut() {
            hook(&mut interaction);
        }
        if interaction.default_prevented() {
            tracing::trace!("cancel-key dismissal vetoed");
            return None;
        }
        Some(Self::dismiss(top, layer, DismissReason::CancelKey, None))
    }

    fn dismiss(
        handle: LayerHandle,
        layer: &mut Layer<K>,
        reason: DismissReason,
        target: Option<K>,
    ) -> Dismissal<K> {
        if let Some(cb) = layer.options.on_dismiss.as_mut() {
            cb(reason);
        }
        Dismissal {
            layer: handle,
            owner: layer.owner,
            reason,
            target,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::rc::Rc;
    use alloc::vec::Vec;
    use core::cell::RefCell;
    use overstory_surface::{Document, Surface, SurfaceId};

    type Log = Rc<RefCell<Vec<(u8, DismissReason)>>>;

    fn logging(log: &Log, tag: u8) -> LayerOptions<SurfaceId> {
        let log = log.clone();
        LayerOptions {
            on_dismiss: Some(Box::new(move |r| log.borrow_mut().push((tag, r)))),
            ..LayerOptions::default()
        }
    }

    #[test]
    fn only_the_top_layer_hears_the_cancel_key() {
        let mut doc = Document::new();
        let body = doc.body();
        let log = Log::default();
        let mut stack = DismissLayerStack::default();
        let containers: Vec<_> = (0..3)
            .map(|_| doc.insert(Some(body), Surface::container()))
            .collect();
        let l1 = stack.push(containers[0], logging(&log, 1), Owner::Caller);
        let l2 = stack.push(containers[1], logging(&log, 2), Owner::Caller);
        let l3 = stack.push(containers[2], logging(&log, 3), Owner::Caller);

        let d = stack.cancel_key().unwrap();
        assert_eq!(d.layer, l3);
        assert_eq!(*log.borrow(), [(3, DismissReason::CancelKey)]);

        stack.remove(l3);
        assert_eq!(stack.cancel_key().unwrap().layer, l2);
        assert_eq!(log.borrow().len(), 2);
        assert!(stack.is_armed(l1).is_some());
    }

    #[test]
    fn unarmed_layers_ignore_outside_pointers() {
        let mut doc = Document::new();
        let body = doc.body();
        let outside = doc.insert(Some(body), Surface::button("x"));
        let c = doc.insert(Some(body), Surface::container());
        let mut stack = DismissLayerStack::default();
        let l = stack.push(c, LayerOptions::default(), Owner::Caller);
        assert!(stack.pointer_down(&doc, outside).is_none());
        stack.arm(l);
        assert!(stack.pointer_down(&doc, c).is_none(), "inside presses never dismiss");
        let d = stack.pointer_down(&doc, outside).unwrap();
        assert_eq!(d.reason, DismissReason::OutsidePointer);
        assert_eq!(d.target, Some(outside));
    }

    #[test]
    fn hooks_can_veto() {
        let mut doc = Document::new();
        let body = doc.body();
        let outside = doc.insert(Some(body), Surface::button("x"));
        let c = doc.insert(Some(body), Surface::container());
        let mut stack = DismissLayerStack::default();
        let l = stack.push(c, LayerOptions::undismissable(), Owner::Caller);
        stack.arm(l);
        assert!(stack.pointer_down(&doc, outside).is_none());
        assert!(stack.cancel_key().is_none());
    }

    #[test]
    fn isolation_allows_layers_above_the_floor() {
        let mut doc = Document::new();
        let body = doc.body();
        let page = doc.insert(Some(body), Surface::button("page"));
        let modal = doc.insert(Some(body), Surface::container());
        let popover = doc.insert(Some(body), Surface::container());
        let mut stack = DismissLayerStack::default();
        let l1 = stack.push(
            modal,
            LayerOptions {
                isolate_pointer_events: true,
                ..LayerOptions::default()
            },
            Owner::Caller,
        );
        stack.push(popover, LayerOptions::default(), Owner::Caller);
        assert_eq!(stack.isolation_root(), Some(modal));
        assert!(stack.is_suppressed(&doc, page));
        assert!(!stack.is_suppressed(&doc, modal));
        assert!(!stack.is_suppressed(&doc, popover));
        stack.remove(l1);
        assert_eq!(stack.isolation_root(), None);
        assert!(!stack.is_suppressed(&doc, page));
    }
}
