// Copyright 2025 the Overstory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The runtime context: owns the host, every registry, and the scheduler.

use core::fmt;

use overstory_placement::{Align, PlacementSpec, Side};
use overstory_surface::Host;

use crate::arena::Arena;
use crate::config::RuntimeConfig;
use crate::dismiss::{DismissLayerStack, Dismissal, LayerHandle, LayerOptions, Owner};
use crate::event::{EventResponse, InputEvent, KeyCode, Modifiers};
use crate::floating::{Positioner, PositionerHandle};
use crate::focus::{FocusInOutcome, FocusScopeStack, ScopeHandle, ScopeOptions};
use crate::menu::{MenuHandle, MenuSession};
use crate::overlay::{Overlay, OverlayHandle};
use crate::refcount::{FocusGuards, GuardHandle, LockHandle, ScrollLock};
use crate::scheduler::{Continuation, Deferral, Scheduler};

/// Any disposer returned by a [`Runtime`] acquisition.
///
/// Disposing is idempotent: a second dispose, or a dispose after the runtime
/// tore the resource down on its own, is a no-op.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Disposer {
    /// A scroll lock.
    Lock(LockHandle),
    /// A focus guard install.
    Guards(GuardHandle),
    /// A focus scope.
    Scope(ScopeHandle),
    /// A dismiss layer.
    Layer(LayerHandle),
    /// A floating positioner.
    Positioner(PositionerHandle),
    /// A menu session and its submenus.
    Menu(MenuHandle),
    /// A composite overlay.
    Overlay(OverlayHandle),
}

macro_rules! disposer_from {
    ($($handle:ident => $variant:ident),* $(,)?) => {
        $(
            impl From<$handle> for Disposer {
                fn from(h: $handle) -> Self {
                    Self::$variant(h)
                }
            }
        )*
    };
}

disposer_from!(
    LockHandle => Lock,
    GuardHandle => Guards,
    ScopeHandle => Scope,
    LayerHandle => Layer,
    PositionerHandle => Positioner,
    MenuHandle => Menu,
    OverlayHandle => Overlay,
);

/// Single-threaded overlay interaction runtime.
///
/// All state lives here; there are no globals. The host drives the runtime by
/// delivering [`InputEvent`]s and by calling [`Runtime::tick`],
/// [`Runtime::paint`], and [`Runtime::advance`] to run deferred work.
pub struct Runtime<H: Host> {
    pub(crate) host: H,
    pub(crate) config: RuntimeConfig,
    pub(crate) scheduler: Scheduler<H::Key>,
    scroll_lock: ScrollLock,
    focus_guards: FocusGuards,
    locks: Arena<()>,
    guards: Arena<()>,
    pub(crate) scopes: FocusScopeStack<H::Key>,
    pub(crate) layers: DismissLayerStack<H::Key>,
    isolation: Option<H::Key>,
    pub(crate) positioners: Arena<Positioner<H::Key>>,
    pub(crate) menus: Arena<MenuSession<H::Key>>,
    pub(crate) overlays: Arena<Overlay<H::Key>>,
}

impl<H: Host + fmt::Debug> fmt::Debug for Runtime<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("host", &self.host)
            .field("config", &self.config)
            .field("now", &self.scheduler.now())
            .field("scroll_locks", &self.scroll_lock.count())
            .field("focus_guards", &self.focus_guards.count())
            .field("focus_scopes", &self.scopes.len())
            .field("dismiss_layers", &self.layers.len())
            .field("positioners", &self.positioners.len())
            .field("menus", &self.menus.len())
            .field("overlays", &self.overlays.len())
            .finish_non_exhaustive()
    }
}

impl<H: Host> Runtime<H> {
    /// Create a runtime with the default [`RuntimeConfig`].
    pub fn new(host: H) -> Self {
        Self::with_config(host, RuntimeConfig::default())
    }

    /// Create a runtime with explicit configuration.
    pub fn with_config(host: H, config: RuntimeConfig) -> Self {
        Self {
            host,
            config,
            scheduler: Scheduler::default(),
            scroll_lock: ScrollLock::default(),
            focus_guards: FocusGuards::default(),
            locks: Arena::default(),
            guards: Arena::default(),
            scopes: FocusScopeStack::default(),
            layers: DismissLayerStack::default(),
            isolation: None,
            positioners: Arena::default(),
            menus: Arena::default(),
            overlays: Arena::default(),
        }
    }

    /// The host.
    pub fn host(&self) -> &H {
        &self.host
    }

    /// The host, mutably. Changes made here are not observed until the next event.
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Consume the runtime, returning the host.
    pub fn into_host(self) -> H {
        self.host
    }

    /// Active configuration.
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Milliseconds elapsed on the runtime clock.
    pub fn now(&self) -> u64 {
        self.scheduler.now()
    }

    /// Number of tasks waiting to run.
    pub fn pending_tasks(&self) -> usize {
        self.scheduler.pending()
    }

    /// A placement on `side`/`align` using the configured collision padding.
    pub fn placement(&self, side: Side, align: Align) -> PlacementSpec {
        PlacementSpec {
            side,
            align,
            collision_padding: self.config.collision_padding,
            ..PlacementSpec::default()
        }
    }

    /// Run the tasks deferred to the next tick. Tasks queued while they run
    /// wait for the following tick.
    pub fn tick(&mut self) {
        for work in self.scheduler.take_ticks() {
            self.run(work);
        }
    }

    /// Run the tasks deferred to the next paint.
    pub fn paint(&mut self) {
        for work in self.scheduler.take_paints() {
            self.run(work);
        }
    }

    /// Advance the clock by `ms`, firing due timers in deadline order.
    ///
    /// Tick and paint work is not run implicitly.
    pub fn advance(&mut self, ms: u64) {
        let until = self.scheduler.now().saturating_add(ms);
        while let Some(work) = self.scheduler.pop_timer(until) {
            self.run(work);
        }
        self.scheduler.set_now(until);
    }

    fn run(&mut self, work: Continuation<H::Key>) {
        match work {
            Continuation::ArmLayer(layer) => self.layers.arm(layer),
            Continuation::RevealFloating(p) => self.reveal_floating(p),
            Continuation::CloseMenu(menu) => {
                self.close_menu_session(menu);
            }
            Continuation::ClearTypeahead(menu) => self.clear_typeahead(menu),
            Continuation::RestoreFocus(target) => self.restore_focus(target),
            Continuation::FinishExit(overlay) => self.finish_exit(overlay),
        }
    }

    /// Take a scroll lock.
    pub fn lock_scroll(&mut self) -> LockHandle {
        self.scroll_lock.lock(&mut self.host);
        LockHandle(self.locks.insert(()))
    }

    /// Release a scroll lock. Returns `false` if it was already released.
    pub fn unlock_scroll(&mut self, lock: LockHandle) -> bool {
        if self.locks.remove(lock.0).is_none() {
            return false;
        }
        self.scroll_lock.unlock(&mut self.host);
        true
    }

    /// Outstanding scroll locks.
    pub fn scroll_lock_count(&self) -> usize {
        self.scroll_lock.count()
    }

    /// Install focus guards.
    pub fn install_focus_guards(&mut self) -> GuardHandle {
        self.focus_guards.install(&mut self.host);
        GuardHandle(self.guards.insert(()))
    }

    /// Uninstall focus guards. Returns `false` if already uninstalled.
    pub fn uninstall_focus_guards(&mut self, guards: GuardHandle) -> bool {
        if self.guards.remove(guards.0).is_none() {
            return false;
        }
        self.focus_guards.uninstall(&mut self.host);
        true
    }

    /// Outstanding focus guard installs.
    pub fn focus_guard_count(&self) -> usize {
        self.focus_guards.count()
    }

    /// Trap focus inside `container`, pausing the current scope.
    pub fn activate_focus_scope(
        &mut self,
        container: H::Key,
        options: ScopeOptions<H>,
    ) -> ScopeHandle {
        let slot = self.scopes.activate(&mut self.host, container, options);
        tracing::debug!(?container, depth = self.scopes.len(), "focus scope activated");
        ScopeHandle(slot)
    }

    /// Release a scope from anywhere in the stack. Focus returns, one tick
    /// later, to whatever held it when the scope was activated.
    pub fn release_focus_scope(&mut self, scope: ScopeHandle) -> bool {
        let Some(restore) = self.scopes.release(scope.0) else {
            return false;
        };
        tracing::debug!(depth = self.scopes.len(), "focus scope released");
        if let Some(target) = restore {
            self.scheduler
                .schedule(Deferral::Tick, Continuation::RestoreFocus(target));
        }
        true
    }

    /// The unpaused scope, if any.
    pub fn active_scope(&self) -> Option<ScopeHandle> {
        self.scopes.top().map(ScopeHandle)
    }

    /// Whether `scope` is paused, or `None` for a released scope.
    pub fn is_scope_paused(&self, scope: ScopeHandle) -> Option<bool> {
        self.scopes.is_paused(scope.0)
    }

    /// Number of scopes on the stack.
    pub fn focus_scope_count(&self) -> usize {
        self.scopes.len()
    }

    /// Push a dismiss layer for `container`. It starts reacting to outside
    /// pointers on the next tick.
    pub fn activate_dismiss_layer(
        &mut self,
        container: H::Key,
        options: LayerOptions<H::Key>,
    ) -> LayerHandle {
        self.push_layer(container, options, Owner::Caller)
    }

    pub(crate) fn push_layer(
        &mut self,
        container: H::Key,
        options: LayerOptions<H::Key>,
        owner: Owner,
    ) -> LayerHandle {
        let layer = self.layers.push(container, options, owner);
        let task = self
            .scheduler
            .schedule(Deferral::Tick, Continuation::ArmLayer(layer));
        self.layers.set_arm_task(layer, task);
        self.sync_isolation();
        tracing::debug!(?container, depth = self.layers.len(), "dismiss layer activated");
        layer
    }

    /// Remove a dismiss layer from anywhere in the stack.
    pub fn deactivate_dismiss_layer(&mut self, layer: LayerHandle) -> bool {
        let Some(arm_task) = self.layers.remove(layer) else {
            return false;
        };
        if let Some(task) = arm_task {
            self.scheduler.cancel(task);
        }
        self.sync_isolation();
        tracing::debug!(depth = self.layers.len(), "dismiss layer deactivated");
        true
    }

    /// The topmost dismiss layer.
    pub fn top_layer(&self) -> Option<LayerHandle> {
        self.layers.top()
    }

    /// Whether `layer` listens for outside pointers yet, or `None` when inactive.
    pub fn is_layer_armed(&self, layer: LayerHandle) -> Option<bool> {
        self.layers.is_armed(layer)
    }

    /// Number of active dismiss layers.
    pub fn dismiss_layer_count(&self) -> usize {
        self.layers.len()
    }

    fn sync_isolation(&mut self) {
        let root = self.layers.isolation_root();
        if root != self.isolation {
            self.isolation = root;
            self.host.set_pointer_isolation(root);
        }
    }

    /// Dispose any acquisition. Returns `false` if it was already disposed.
    pub fn dispose(&mut self, disposer: impl Into<Disposer>) -> bool {
        match disposer.into() {
            Disposer::Lock(h) => self.unlock_scroll(h),
            Disposer::Guards(h) => self.uninstall_focus_guards(h),
            Disposer::Scope(h) => self.release_focus_scope(h),
            Disposer::Layer(h) => self.deactivate_dismiss_layer(h),
            Disposer::Positioner(h) => self.dispose_positioner(h),
            Disposer::Menu(h) => self.close_menu_session(h),
            Disposer::Overlay(h) => self.close_overlay(h),
        }
    }

    /// Move focus on behalf of the runtime, keeping the active scope's record current.
    pub(crate) fn move_focus(&mut self, target: H::Key) -> bool {
        if !self.host.focus(target) {
            return false;
        }
        self.scopes.focus_in(&mut self.host, target);
        true
    }

    fn restore_focus(&mut self, target: H::Key) {
        if let Some(container) = self.scopes.top().and_then(|s| self.scopes.container(s))
            && !self.host.contains(container, target)
        {
            tracing::trace!(?target, "focus restore skipped; target outside active scope");
            return;
        }
        if self.host.can_focus(target) {
            self.move_focus(target);
        }
    }

    /// Process one input event.
    pub fn handle_event(&mut self, event: InputEvent<H::Key>) -> EventResponse {
        match event {
            InputEvent::PointerDown { target, .. } => {
                let mut response = EventResponse {
                    pointer_suppressed: self.layers.is_suppressed(&self.host, target),
                    ..EventResponse::default()
                };
                if let Some(d) = self.layers.pointer_down(&self.host, target) {
                    self.apply_dismissal(d, &mut response);
                }
                response
            }
            InputEvent::PointerMove { target, .. } => {
                self.menu_pointer_move(target);
                EventResponse::default()
            }
            InputEvent::Click { target } => self.menu_click(target),
            InputEvent::KeyDown { key, modifiers } => self.key_down(key, modifiers),
            InputEvent::FocusIn { target } => {
                if self.scopes.focus_in(&mut self.host, target) == FocusInOutcome::Accepted {
                    self.menu_focus_in(target);
                }
                EventResponse::default()
            }
            InputEvent::Scroll | InputEvent::Resize => {
                self.update_positions();
                EventResponse::default()
            }
            InputEvent::ExitAnimationEnd(surface) => {
                self.exit_animation_end(surface);
                EventResponse::default()
            }
        }
    }

    fn key_down(&mut self, key: KeyCode, modifiers: Modifiers) -> EventResponse {
        if let Some(response) = self.menu_key_down(key, modifiers) {
            return response;
        }
        match key {
            KeyCode::Tab if !modifiers.has_command() => {
                if self.scopes.tab(&mut self.host, modifiers.contains(Modifiers::SHIFT)) {
                    EventResponse::prevented()
                } else {
                    EventResponse::default()
                }
            }
            KeyCode::Escape => {
                let mut response = EventResponse::default();
                if let Some(d) = self.layers.cancel_key() {
                    response.default_prevented = true;
                    self.apply_dismissal(d, &mut response);
                }
                response
            }
            _ => EventResponse::default(),
        }
    }

    fn apply_dismissal(&mut self, d: Dismissal<H::Key>, response: &mut EventResponse) {
        tracing::debug!(reason = ?d.reason, "layer dismissed");
        match d.owner {
            Owner::Caller => response.dismissed = Some(d.layer),
            Owner::Overlay(overlay) => {
                self.close_overlay(overlay);
            }
            Owner::Menu(menu) => self.menu_dismissed(menu, d.reason, d.target),
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::rc::Rc;
    use core::cell::Cell;

    use overstory_surface::{Document, Host, Surface, SurfaceId};

    use crate::{
        DismissReason, EventResponse, InputEvent, KeyCode, LayerOptions, Modifiers, Runtime,
        ScopeOptions,
    };

    fn key(key: KeyCode) -> InputEvent<SurfaceId> {
        InputEvent::KeyDown {
            key,
            modifiers: Modifiers::empty(),
        }
    }

    fn press(target: SurfaceId) -> InputEvent<SurfaceId> {
        InputEvent::PointerDown {
            target,
            position: kurbo::Point::ZERO,
        }
    }

    #[test]
    fn scope_release_restores_focus_after_a_tick() {
        let mut doc = Document::new();
        let body = doc.body();
        let opener = doc.insert(Some(body), Surface::button("open"));
        let c = doc.insert(Some(body), Surface::container());
        let ok = doc.insert(Some(c), Surface::button("ok"));
        doc.focus(opener);
        let mut rt = Runtime::new(doc);

        let scope = rt.activate_focus_scope(c, ScopeOptions::default());
        assert_eq!(rt.host().focused(), Some(ok));
        assert!(rt.release_focus_scope(scope));
        assert_eq!(rt.host().focused(), Some(ok), "restore waits for a tick");
        rt.tick();
        assert_eq!(rt.host().focused(), Some(opener));
        assert!(!rt.dispose(scope));
    }

    #[test]
    fn tab_wraps_and_focus_in_is_redirected() {
        let mut doc = Document::new();
        let body = doc.body();
        let outside = doc.insert(Some(body), Surface::button("outside"));
        let c = doc.insert(Some(body), Surface::container());
        let a = doc.insert(Some(c), Surface::button("a"));
        let b = doc.insert(Some(c), Surface::button("b"));
        let mut rt = Runtime::new(doc);
        rt.activate_focus_scope(c, ScopeOptions::default());

        rt.host_mut().focus(b);
        assert_eq!(rt.handle_event(key(KeyCode::Tab)), EventResponse::prevented());
        assert_eq!(rt.host().focused(), Some(a));
        let back = rt.handle_event(InputEvent::KeyDown {
            key: KeyCode::Tab,
            modifiers: Modifiers::SHIFT,
        });
        assert!(back.default_prevented);
        assert_eq!(rt.host().focused(), Some(b));

        rt.host_mut().focus(outside);
        rt.handle_event(InputEvent::FocusIn { target: outside });
        assert_eq!(rt.host().focused(), Some(b));
    }

    #[test]
    fn tab_with_command_modifiers_is_left_to_the_host() {
        let mut doc = Document::new();
        let body = doc.body();
        let c = doc.insert(Some(body), Surface::container());
        let a = doc.insert(Some(c), Surface::button("a"));
        let b = doc.insert(Some(c), Surface::button("b"));
        let mut rt = Runtime::new(doc);
        rt.activate_focus_scope(c, ScopeOptions::default());
        rt.host_mut().focus(b);

        for modifiers in [
            Modifiers::CTRL,
            Modifiers::ALT,
            Modifiers::META,
            Modifiers::CTRL | Modifiers::SHIFT,
        ] {
            let r = rt.handle_event(InputEvent::KeyDown {
                key: KeyCode::Tab,
                modifiers,
            });
            assert_eq!(r, EventResponse::default(), "{modifiers:?}");
            assert_eq!(rt.host().focused(), Some(b), "{modifiers:?}");
        }
        rt.handle_event(key(KeyCode::Tab));
        assert_eq!(rt.host().focused(), Some(a), "plain tab still wraps");
    }

    #[test]
    fn caller_layers_report_dismissal_and_arm_after_a_tick() {
        let mut doc = Document::new();
        let body = doc.body();
        let page = doc.insert(Some(body), Surface::button("page"));
        let c = doc.insert(Some(body), Surface::container());
        let mut rt = Runtime::new(doc);
        let seen = Rc::new(Cell::new(None));
        let sink = seen.clone();
        let layer = rt.activate_dismiss_layer(
            c,
            LayerOptions {
                on_dismiss: Some(alloc::boxed::Box::new(move |r| sink.set(Some(r)))),
                ..LayerOptions::default()
            },
        );
        assert_eq!(rt.is_layer_armed(layer), Some(false));
        assert_eq!(rt.handle_event(press(page)).dismissed, None);
        rt.tick();
        assert_eq!(rt.handle_event(press(page)).dismissed, Some(layer));
        assert_eq!(seen.get(), Some(DismissReason::OutsidePointer));

        let r = rt.handle_event(key(KeyCode::Escape));
        assert!(r.default_prevented);
        assert_eq!(seen.get(), Some(DismissReason::CancelKey));
        assert!(rt.deactivate_dismiss_layer(layer));
        assert!(!rt.deactivate_dismiss_layer(layer));
        assert_eq!(rt.handle_event(key(KeyCode::Escape)), EventResponse::default());
    }

    #[test]
    fn rapid_open_close_never_arms_a_stale_layer() {
        let mut doc = Document::new();
        let body = doc.body();
        let c = doc.insert(Some(body), Surface::container());
        let mut rt = Runtime::new(doc);
        let first = rt.activate_dismiss_layer(c, LayerOptions::default());
        rt.deactivate_dismiss_layer(first);
        let second = rt.activate_dismiss_layer(c, LayerOptions::default());
        assert_eq!(rt.pending_tasks(), 1, "the first arm task was cancelled");
        rt.tick();
        assert_eq!(rt.is_layer_armed(first), None);
        assert_eq!(rt.is_layer_armed(second), Some(true));
    }

    #[test]
    fn pointer_isolation_follows_the_topmost_isolating_layer() {
        let mut doc = Document::new();
        let body = doc.body();
        let page = doc.insert(Some(body), Surface::button("page"));
        let c1 = doc.insert(Some(body), Surface::container());
        let c2 = doc.insert(Some(body), Surface::container());
        let mut rt = Runtime::new(doc);
        let isolating = || LayerOptions {
            isolate_pointer_events: true,
            ..LayerOptions::default()
        };
        let l1 = rt.activate_dismiss_layer(c1, isolating());
        let l2 = rt.activate_dismiss_layer(c2, isolating());
        assert_eq!(rt.host().pointer_isolation(), Some(c2));
        assert!(rt.handle_event(press(page)).pointer_suppressed);
        assert!(rt.handle_event(press(c1)).pointer_suppressed);
        rt.dispose(l2);
        assert_eq!(rt.host().pointer_isolation(), Some(c1));
        assert!(!rt.handle_event(press(c1)).pointer_suppressed);
        rt.dispose(l1);
        assert_eq!(rt.host().pointer_isolation(), None);
        assert!(!rt.handle_event(press(page)).pointer_suppressed);
    }

    #[test]
    fn lock_and_guard_disposers_are_idempotent() {
        let mut doc = Document::new();
        doc.set_scrollbar_width(12.0);
        let mut rt = Runtime::new(doc);
        let a = rt.lock_scroll();
        let b = rt.lock_scroll();
        assert!(rt.dispose(a));
        assert!(!rt.dispose(a), "double dispose");
        assert_eq!(rt.scroll_lock_count(), 1);
        assert_eq!(rt.host().scroll_frozen(), Some(12.0));
        rt.dispose(b);
        assert_eq!(rt.host().scroll_frozen(), None);

        let g = rt.install_focus_guards();
        assert!(rt.host().focus_guards().is_some());
        assert!(rt.uninstall_focus_guards(g));
        assert!(!rt.uninstall_focus_guards(g));
        assert_eq!(rt.focus_guard_count(), 0);
        assert!(rt.host().focus_guards().is_none());
    }

    #[test]
    fn timers_advance_in_order() {
        let mut doc = Document::new();
        let body = doc.body();
        let c = doc.insert(Some(body), Surface::button("c"));
        let mut rt = Runtime::new(doc);
        rt.scheduler.schedule(
            crate::scheduler::Deferral::After(30),
            crate::scheduler::Continuation::RestoreFocus(c),
        );
        rt.advance(29);
        assert_eq!(rt.host().focused(), None);
        rt.advance(1);
        assert_eq!(rt.host().focused(), Some(c));
        assert_eq!(rt.now(), 30);
    }
}
