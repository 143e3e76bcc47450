// Copyright 2025 the Overstory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Composite overlays: dialogs, alert dialogs, sheets, and popovers.
//!
//! Opening acquires, in order, a scroll lock (modal only), the focus guards,
//! a focus scope, a dismiss layer, and a positioner (anchored only). Closing
//! releases them in reverse order and then waits for the host to report the
//! end of the exit animation, or for the fallback delay, before hiding the
//! container. Reopening the same container while it is still animating out
//! cancels the pending hide.

use alloc::boxed::Box;
use core::fmt;

use overstory_placement::PlacementSpec;
use overstory_surface::{Attribute, Host, OpenState};

use crate::arena::Slot;
use crate::dismiss::{LayerHandle, LayerOptions, Owner};
use crate::floating::PositionerHandle;
use crate::focus::{InitialFocus, ScopeHandle, ScopeOptions};
use crate::refcount::{GuardHandle, LockHandle};
use crate::runtime::Runtime;
use crate::scheduler::{Continuation, Deferral, TaskId};

/// Exit fallback used by [`OverlayOptions::sheet`].
pub const SHEET_EXIT_FALLBACK_MS: u64 = 350;

/// Handle to an overlay; closing it is its disposer.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct OverlayHandle(pub(crate) Slot);

/// Options for [`Runtime::open_overlay`].
pub struct OverlayOptions<H: Host> {
    /// Surface that opened the overlay; receives open/expanded markers.
    pub trigger: Option<H::Key>,
    /// Lock background scroll and isolate pointer events.
    pub modal: bool,
    /// Allow the cancel key and outside pointers to close the overlay.
    pub dismissible: bool,
    /// Initial focus inside the container.
    pub initial_focus: Option<InitialFocus<H>>,
    /// Anchor and placement for floating overlays.
    pub anchor: Option<(H::Key, PlacementSpec)>,
    /// Override of [`RuntimeConfig::exit_fallback_ms`](crate::RuntimeConfig::exit_fallback_ms).
    pub exit_fallback_ms: Option<u64>,
    /// Called whenever the overlay closes, including by dismissal.
    pub on_close: Option<Box<dyn FnMut()>>,
}

impl<H: Host> Default for OverlayOptions<H> {
    fn default() -> Self {
        Self {
            trigger: None,
            modal: true,
            dismissible: true,
            initial_focus: None,
            anchor: None,
            exit_fallback_ms: None,
            on_close: None,
        }
    }
}

impl<H: Host> fmt::Debug for OverlayOptions<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OverlayOptions")
            .field("trigger", &self.trigger)
            .field("modal", &self.modal)
            .field("dismissible", &self.dismissible)
            .field("initial_focus", &self.initial_focus)
            .field("anchor", &self.anchor)
            .field("exit_fallback_ms", &self.exit_fallback_ms)
            .field("on_close", &self.on_close.is_some())
            .finish()
    }
}

impl<H: Host> OverlayOptions<H> {
    /// A modal, dismissible dialog opened from `trigger`.
    pub fn dialog(trigger: H::Key) -> Self {
        Self {
            trigger: Some(trigger),
            ..Self::default()
        }
    }

    /// A modal dialog that ignores the cancel key and outside pointers and
    /// focuses `cancel` on open.
    pub fn alert_dialog(trigger: H::Key, cancel: H::Key) -> Self {
        Self {
            dismissible: false,
            initial_focus: Some(InitialFocus::Surface(cancel)),
            ..Self::dialog(trigger)
        }
    }

    /// A modal dialog sliding in from an edge, with a longer exit fallback.
    pub fn sheet(trigger: H::Key) -> Self {
        Self {
            exit_fallback_ms: Some(SHEET_EXIT_FALLBACK_MS),
            ..Self::dialog(trigger)
        }
    }

    /// A non-modal surface floating against `trigger`.
    pub fn popover(trigger: H::Key, placement: PlacementSpec) -> Self {
        Self {
            modal: false,
            anchor: Some((trigger, placement)),
            ..Self::dialog(trigger)
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Phase {
    Open,
    Closing,
}

pub(crate) struct Overlay<K> {
    container: K,
    trigger: Option<K>,
    phase: Phase,
    lock: Option<LockHandle>,
    guards: Option<GuardHandle>,
    scope: Option<ScopeHandle>,
    layer: Option<LayerHandle>,
    positioner: Option<PositionerHandle>,
    exit_fallback_ms: u64,
    exit_task: Option<TaskId>,
    on_close: Option<Box<dyn FnMut()>>,
}

impl<K: fmt::Debug> fmt::Debug for Overlay<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Overlay")
            .field("container", &self.container)
            .field("trigger", &self.trigger)
            .field("phase", &self.phase)
            .field("exit_task", &self.exit_task)
            .finish_non_exhaustive()
    }
}

impl<H: Host> Runtime<H> {
    /// Open an overlay on `container`.
    ///
    /// Opening a container that is already open returns the existing handle.
    pub fn open_overlay(&mut self, container: H::Key, options: OverlayOptions<H>) -> OverlayHandle {
        let mut stale = None;
        for (slot, o) in self.overlays.iter() {
            if o.container == container {
                match o.phase {
                    Phase::Open => return OverlayHandle(slot),
                    Phase::Closing => stale = Some(slot),
                }
            }
        }
        if let Some(slot) = stale
            && let Some(o) = self.overlays.remove(slot)
            && let Some(task) = o.exit_task
        {
            self.scheduler.cancel(task);
            tracing::trace!(?container, "reopened during exit; hide cancelled");
        }

        let OverlayOptions {
            trigger,
            modal,
            dismissible,
            initial_focus,
            anchor,
            exit_fallback_ms,
            on_close,
        } = options;

        self.host.set_attribute(container, Attribute::Visible(true));
        self.host
            .set_attribute(container, Attribute::State(OpenState::Open));
        if let Some(t) = trigger {
            self.host.set_attribute(t, Attribute::State(OpenState::Open));
            self.host.set_attribute(t, Attribute::Expanded(true));
        }

        let overlay = OverlayHandle(self.overlays.insert(Overlay {
            container,
            trigger,
            phase: Phase::Open,
            lock: None,
            guards: None,
            scope: None,
            layer: None,
            positioner: None,
            exit_fallback_ms: exit_fallback_ms.unwrap_or(self.config.exit_fallback_ms),
            exit_task: None,
            on_close,
        }));

        let lock = modal.then(|| self.lock_scroll());
        let guards = self.install_focus_guards();
        let scope = self.activate_focus_scope(
            container,
            ScopeOptions {
                initial_focus,
                ..ScopeOptions::default()
            },
        );
        let layer_options = if dismissible {
            LayerOptions::default()
        } else {
            LayerOptions::undismissable()
        };
        let layer = self.push_layer(
            container,
            LayerOptions {
                isolate_pointer_events: modal,
                ..layer_options
            },
            Owner::Overlay(overlay),
        );
        let positioner = anchor.map(|(a, spec)| self.position_floating(a, container, spec));

        if let Some(o) = self.overlays.get_mut(overlay.0) {
            o.lock = lock;
            o.guards = Some(guards);
            o.scope = Some(scope);
            o.layer = Some(layer);
            o.positioner = positioner;
        }
        tracing::debug!(?container, modal, dismissible, "overlay opened");
        overlay
    }

    /// Close an open overlay. Returns `false` if it is not open.
    pub fn close_overlay(&mut self, overlay: OverlayHandle) -> bool {
        let Some(o) = self
            .overlays
            .get_mut(overlay.0)
            .filter(|o| o.phase == Phase::Open)
        else {
            return false;
        };
        o.phase = Phase::Closing;
        let (container, trigger, fallback) = (o.container, o.trigger, o.exit_fallback_ms);
        let (positioner, layer, scope, guards, lock) = (
            o.positioner.take(),
            o.layer.take(),
            o.scope.take(),
            o.guards.take(),
            o.lock.take(),
        );

        if let Some(p) = positioner {
            self.dispose_positioner(p);
        }
        if let Some(l) = layer {
            self.deactivate_dismiss_layer(l);
        }
        if let Some(s) = scope {
            self.release_focus_scope(s);
        }
        if let Some(g) = guards {
            self.uninstall_focus_guards(g);
        }
        if let Some(l) = lock {
            self.unlock_scroll(l);
        }

        self.host
            .set_attribute(container, Attribute::State(OpenState::Closed));
        if let Some(t) = trigger {
            self.host
                .set_attribute(t, Attribute::State(OpenState::Closed));
            self.host.set_attribute(t, Attribute::Expanded(false));
        }

        let task = self
            .scheduler
            .schedule(Deferral::After(fallback), Continuation::FinishExit(overlay));
        if let Some(o) = self.overlays.get_mut(overlay.0) {
            o.exit_task = Some(task);
            if let Some(cb) = o.on_close.as_mut() {
                cb();
            }
        }
        tracing::debug!(?container, "overlay closing");
        true
    }

    /// Whether `overlay` is open (not closing or closed).
    pub fn is_overlay_open(&self, overlay: OverlayHandle) -> bool {
        self.overlays
            .get(overlay.0)
            .is_some_and(|o| o.phase == Phase::Open)
    }

    /// Whether `overlay` has closed but its container is still shown.
    pub fn is_overlay_exiting(&self, overlay: OverlayHandle) -> bool {
        self.overlays
            .get(overlay.0)
            .is_some_and(|o| o.phase == Phase::Closing)
    }

    pub(crate) fn exit_animation_end(&mut self, surface: H::Key) {
        let closing = self
            .overlays
            .iter()
            .find(|(_, o)| o.container == surface && o.phase == Phase::Closing)
            .map(|(slot, _)| OverlayHandle(slot));
        if let Some(overlay) = closing {
            self.finish_exit(overlay);
        }
    }

    pub(crate) fn finish_exit(&mut self, overlay: OverlayHandle) {
        if !self
            .overlays
            .get(overlay.0)
            .is_some_and(|o| o.phase == Phase::Closing)
        {
            return;
        }
        let Some(o) = self.overlays.remove(overlay.0) else {
            return;
        };
        if let Some(task) = o.exit_task {
            self.scheduler.cancel(task);
        }
        self.host.set_attribute(o.container, Attribute::Visible(false));
        tracing::trace!(container = ?o.container, "overlay hidden");
    }
}
