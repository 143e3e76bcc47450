// Copyright 2025 the Overstory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Menu sessions: keyboard, pointer, and typeahead interaction for an open
//! menu and its submenus.
//!
//! A root session owns a scroll lock (modal menus only), the focus guards, a
//! focus scope, a dismiss layer, and a positioner when anchored. Each submenu
//! is a session of its own with a scope, a layer, and a positioner anchored to
//! its trigger item. At most one submenu per session is open; opening another
//! closes the first. Closing a session closes its submenus first.
//!
//! ## Keys
//!
//! | Key | Effect |
//! | --- | --- |
//! | next / previous (per [`Orientation`]) | move the highlight, wrapping, skipping disabled items |
//! | `Home` / `End` | highlight the first / last enabled item |
//! | `Enter` / `Space` | activate the highlighted item |
//! | toward a submenu's side | open the highlighted submenu and highlight its first item |
//! | away from a submenu's side | close the submenu, returning focus to its trigger |
//! | printable characters | typeahead |
//! | `Tab` | swallowed |
//!
//! The cancel key is left to the session's dismiss layer.

use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;
use core::mem;

use hashbrown::HashMap;
use overstory_placement::{Align, PlacementSpec, Side};
use overstory_surface::{Attribute, Host, OpenState};

use crate::arena::Slot;
use crate::dismiss::{LayerHandle, LayerOptions, Owner};
use crate::event::{DismissReason, EventResponse, KeyCode, Modifiers};
use crate::floating::PositionerHandle;
use crate::focus::{ScopeHandle, ScopeOptions};
use crate::refcount::{GuardHandle, LockHandle};
use crate::runtime::Runtime;
use crate::scheduler::{Continuation, Deferral, TaskId};
use crate::typeahead::next_match;

/// Disposer for an open menu session.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct MenuHandle(pub(crate) Slot);

/// Axis along which a menu's items are navigated.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Orientation {
    /// Up/Down arrows navigate.
    #[default]
    Vertical,
    /// Left/Right arrows navigate, as in a menu bar.
    Horizontal,
}

impl Orientation {
    fn keys(self) -> (KeyCode, KeyCode) {
        match self {
            Self::Vertical => (KeyCode::ArrowDown, KeyCode::ArrowUp),
            Self::Horizontal => (KeyCode::ArrowRight, KeyCode::ArrowLeft),
        }
    }
}

fn arrow_toward(side: Side) -> KeyCode {
    match side {
        Side::Top => KeyCode::ArrowUp,
        Side::Bottom => KeyCode::ArrowDown,
        Side::Left => KeyCode::ArrowLeft,
        Side::Right => KeyCode::ArrowRight,
    }
}

/// A nested menu hanging off a [`ItemKind::Submenu`] item.
#[derive(Clone, Debug, PartialEq)]
pub struct SubmenuSpec<K> {
    /// Surface holding the submenu's items.
    pub content: K,
    /// The submenu's items. Moved into the session while it is open and
    /// handed back, with any checked-state changes, when it closes.
    pub items: Vec<MenuItem<K>>,
    /// Placement against the trigger item.
    pub placement: PlacementSpec,
}

impl<K> SubmenuSpec<K> {
    /// A submenu opening to the right of its trigger, top edges aligned.
    pub fn new(content: K, items: Vec<MenuItem<K>>) -> Self {
        Self {
            content,
            items,
            placement: PlacementSpec {
                side: Side::Right,
                align: Align::Start,
                ..PlacementSpec::default()
            },
        }
    }
}

/// What activating an item does.
#[derive(Clone, Debug, PartialEq)]
pub enum ItemKind<K> {
    /// Selects and closes the whole menu tree.
    Action,
    /// Toggles; the menu stays open.
    Checkbox {
        /// Current state.
        checked: bool,
    },
    /// Checks this item and unchecks the rest of its group; the menu stays open.
    Radio {
        /// Group shared with sibling radio items in the same session.
        group: u32,
        /// Current state.
        checked: bool,
    },
    /// Opens a nested menu.
    Submenu(SubmenuSpec<K>),
}

/// One entry of a menu.
#[derive(Clone, Debug, PartialEq)]
pub struct MenuItem<K> {
    /// The item's surface.
    pub node: K,
    /// Behavior on activation.
    pub kind: ItemKind<K>,
    /// Disabled items are skipped by navigation and typeahead.
    pub disabled: bool,
    /// Typeahead text; defaults to the surface's text content.
    pub label: Option<String>,
}

impl<K> MenuItem<K> {
    /// A plain action item.
    pub fn action(node: K) -> Self {
        Self {
            node,
            kind: ItemKind::Action,
            disabled: false,
            label: None,
        }
    }

    /// A checkbox item.
    pub fn checkbox(node: K, checked: bool) -> Self {
        Self {
            kind: ItemKind::Checkbox { checked },
            ..Self::action(node)
        }
    }

    /// A radio item in `group`.
    pub fn radio(node: K, group: u32, checked: bool) -> Self {
        Self {
            kind: ItemKind::Radio { group, checked },
            ..Self::action(node)
        }
    }

    /// A submenu trigger.
    pub fn submenu(node: K, spec: SubmenuSpec<K>) -> Self {
        Self {
            kind: ItemKind::Submenu(spec),
            ..Self::action(node)
        }
    }

    /// Override the typeahead text.
    #[must_use]
    pub fn with_label(mut self, label: &str) -> Self {
        self.label = Some(String::from(label));
        self
    }

    /// Mark disabled.
    #[must_use]
    pub fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }

    /// Checked state of checkbox and radio items.
    pub fn checked(&self) -> Option<bool> {
        match self.kind {
            ItemKind::Checkbox { checked } | ItemKind::Radio { checked, .. } => Some(checked),
            _ => None,
        }
    }
}

/// An item activation reported to [`MenuOptions::on_select`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct MenuSelection<K> {
    /// The activated item.
    pub item: K,
    /// New checked state for checkbox and radio items.
    pub checked: Option<bool>,
}

/// Options for [`Runtime::open_menu_session`].
pub struct MenuOptions<K> {
    /// Top-level items.
    pub items: Vec<MenuItem<K>>,
    /// Trigger to place the menu against; unanchored menus are not positioned.
    pub anchor: Option<K>,
    /// Placement against `anchor`.
    pub placement: PlacementSpec,
    /// Navigation axis.
    pub orientation: Orientation,
    /// Lock background scroll and isolate pointer events while open.
    pub modal: bool,
    /// Highlight the first item on open instead of focusing the container.
    pub highlight_first: bool,
    /// Called for every item activation in the tree, including submenus.
    pub on_select: Option<Box<dyn FnMut(MenuSelection<K>)>>,
}

impl<K> Default for MenuOptions<K> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            anchor: None,
            placement: PlacementSpec {
                align: Align::Start,
                ..PlacementSpec::default()
            },
            orientation: Orientation::Vertical,
            modal: true,
            highlight_first: false,
            on_select: None,
        }
    }
}

impl<K: fmt::Debug> fmt::Debug for MenuOptions<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MenuOptions")
            .field("items", &self.items)
            .field("anchor", &self.anchor)
            .field("placement", &self.placement)
            .field("orientation", &self.orientation)
            .field("modal", &self.modal)
            .field("highlight_first", &self.highlight_first)
            .field("on_select", &self.on_select.is_some())
            .finish()
    }
}

enum SessionKind<K> {
    Root {
        on_select: Option<Box<dyn FnMut(MenuSelection<K>)>>,
        anchor: Option<K>,
        lock: Option<LockHandle>,
        guards: GuardHandle,
    },
    Submenu {
        parent: MenuHandle,
        trigger: K,
        side: Side,
    },
}

pub(crate) struct MenuSession<K> {
    container: K,
    items: Vec<MenuItem<K>>,
    orientation: Orientation,
    highlighted: Option<usize>,
    typeahead: String,
    typeahead_task: Option<TaskId>,
    close_task: Option<TaskId>,
    submenus: HashMap<K, MenuHandle>,
    kind: SessionKind<K>,
    scope: Option<ScopeHandle>,
    layer: Option<LayerHandle>,
    positioner: Option<PositionerHandle>,
    pointer_inside: bool,
}

impl<K: fmt::Debug> fmt::Debug for MenuSession<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MenuSession")
            .field("container", &self.container)
            .field("items", &self.items.len())
            .field("highlighted", &self.highlighted)
            .field("typeahead", &self.typeahead)
            .field("submenus", &self.submenus)
            .finish_non_exhaustive()
    }
}

impl<K: Copy + Eq> MenuSession<K> {
    fn parent(&self) -> Option<MenuHandle> {
        match self.kind {
            SessionKind::Submenu { parent, .. } => Some(parent),
            SessionKind::Root { .. } => None,
        }
    }

    fn enabled(&self) -> impl DoubleEndedIterator<Item = usize> + '_ {
        self.items
            .iter()
            .enumerate()
            .filter(|(_, item)| !item.disabled)
            .map(|(i, _)| i)
    }

    fn step(&self, forward: bool) -> Option<usize> {
        let n = self.items.len();
        let Some(current) = self.highlighted else {
            return if forward {
                self.enabled().next()
            } else {
                self.enabled().next_back()
            };
        };
        (1..=n)
            .map(|k| {
                if forward {
                    (current + k) % n
                } else {
                    (current + n - k) % n
                }
            })
            .find(|&i| !self.items[i].disabled)
    }

    fn item_index(&self, node: K) -> Option<usize> {
        self.items.iter().position(|i| i.node == node)
    }
}

enum Step {
    First,
    Last,
    Next,
    Prev,
}

impl<H: Host> Runtime<H> {
    /// Open a root menu on `container`.
    pub fn open_menu_session(
        &mut self,
        container: H::Key,
        options: MenuOptions<H::Key>,
    ) -> MenuHandle {
        let MenuOptions {
            items,
            anchor,
            placement,
            orientation,
            modal,
            highlight_first,
            on_select,
        } = options;
        let lock = modal.then(|| self.lock_scroll());
        let guards = self.install_focus_guards();
        let menu = self.spawn_session(
            container,
            items,
            orientation,
            SessionKind::Root {
                on_select,
                anchor,
                lock,
                guards,
            },
            anchor.map(|a| (a, placement)),
            modal,
        );
        if let Some(a) = anchor {
            self.host.set_attribute(a, Attribute::Expanded(true));
            self.host.set_attribute(a, Attribute::State(OpenState::Open));
        }
        if highlight_first {
            self.move_highlight(menu, Step::First);
        }
        tracing::debug!(?container, modal, "menu opened");
        menu
    }

    fn spawn_session(
        &mut self,
        container: H::Key,
        items: Vec<MenuItem<H::Key>>,
        orientation: Orientation,
        kind: SessionKind<H::Key>,
        anchor: Option<(H::Key, PlacementSpec)>,
        isolate: bool,
    ) -> MenuHandle {
        let is_root = matches!(kind, SessionKind::Root { .. });
        for item in &items {
            if let Some(checked) = item.checked() {
                self.host.set_attribute(item.node, Attribute::Checked(checked));
            }
        }
        let menu = MenuHandle(self.menus.insert(MenuSession {
            container,
            items,
            orientation,
            highlighted: None,
            typeahead: String::new(),
            typeahead_task: None,
            close_task: None,
            submenus: HashMap::new(),
            kind,
            scope: None,
            layer: None,
            positioner: None,
            pointer_inside: false,
        }));
        self.host.set_attribute(container, Attribute::Visible(true));
        self.host
            .set_attribute(container, Attribute::State(OpenState::Open));
        let scope = self.activate_focus_scope(
            container,
            ScopeOptions {
                initial_focus: None,
                skip_auto_focus: true,
                restore_focus: is_root,
            },
        );
        self.move_focus(container);
        let layer = self.push_layer(
            container,
            LayerOptions {
                isolate_pointer_events: isolate,
                ..LayerOptions::default()
            },
            Owner::Menu(menu),
        );
        let positioner = anchor.map(|(a, spec)| self.position_floating(a, container, spec));
        if let Some(s) = self.menus.get_mut(menu.0) {
            s.scope = Some(scope);
            s.layer = Some(layer);
            s.positioner = positioner;
        }
        menu
    }

    /// Close a session and everything nested under it. Returns `false` if it
    /// was already closed.
    pub fn close_menu_session(&mut self, menu: MenuHandle) -> bool {
        let Some(session) = self.menus.get(menu.0) else {
            return false;
        };
        let children: Vec<MenuHandle> = session.submenus.values().copied().collect();
        for child in children {
            self.close_menu_session(child);
        }
        let Some(session) = self.menus.remove(menu.0) else {
            return false;
        };
        for task in [session.typeahead_task, session.close_task].into_iter().flatten() {
            self.scheduler.cancel(task);
        }
        if let Some(item) = session.highlighted.map(|i| session.items[i].node) {
            self.host.set_attribute(item, Attribute::Highlighted(false));
        }
        if let Some(p) = session.positioner {
            self.dispose_positioner(p);
        }
        if let Some(l) = session.layer {
            self.deactivate_dismiss_layer(l);
        }
        if let Some(s) = session.scope {
            self.release_focus_scope(s);
        }
        let container = session.container;
        self.host.set_attribute(container, Attribute::Visible(false));
        self.host
            .set_attribute(container, Attribute::State(OpenState::Closed));
        match session.kind {
            SessionKind::Root {
                anchor,
                lock,
                guards,
                ..
            } => {
                self.uninstall_focus_guards(guards);
                if let Some(lock) = lock {
                    self.unlock_scroll(lock);
                }
                if let Some(a) = anchor {
                    self.host.set_attribute(a, Attribute::Expanded(false));
                    self.host
                        .set_attribute(a, Attribute::State(OpenState::Closed));
                }
                tracing::debug!(?container, "menu closed");
            }
            SessionKind::Submenu {
                parent, trigger, ..
            } => {
                if let Some(p) = self.menus.get_mut(parent.0) {
                    p.submenus.remove(&trigger);
                    let idx = p.item_index(trigger);
                    if let Some(ItemKind::Submenu(spec)) = idx.map(|i| &mut p.items[i].kind) {
                        spec.items = session.items;
                    }
                }
                self.host.set_attribute(trigger, Attribute::Expanded(false));
                self.host
                    .set_attribute(trigger, Attribute::State(OpenState::Closed));
                tracing::trace!(?container, "submenu closed");
            }
        }
        true
    }

    /// Whether `menu` is still open.
    pub fn is_menu_open(&self, menu: MenuHandle) -> bool {
        self.menus.contains(menu.0)
    }

    /// The highlighted item of `menu`.
    pub fn current_highlight(&self, menu: MenuHandle) -> Option<H::Key> {
        let s = self.menus.get(menu.0)?;
        s.highlighted.map(|i| s.items[i].node)
    }

    /// The open submenu of `menu`, if any.
    pub fn open_submenu_of(&self, menu: MenuHandle) -> Option<MenuHandle> {
        self.menus.get(menu.0)?.submenus.values().next().copied()
    }

    /// Items of `menu` with their current checked state.
    pub fn menu_items(&self, menu: MenuHandle) -> Option<&[MenuItem<H::Key>]> {
        self.menus.get(menu.0).map(|s| s.items.as_slice())
    }

    /// Highlight and focus `item` programmatically. Returns `false` if it is
    /// not an enabled item of `menu`.
    pub fn highlight_item(&mut self, menu: MenuHandle, item: H::Key) -> bool {
        let Some(idx) = self
            .menus
            .get(menu.0)
            .and_then(|s| s.item_index(item).filter(|&i| !s.items[i].disabled))
        else {
            return false;
        };
        self.set_highlight(menu, Some(idx), true);
        true
    }

    /// Move the highlight. With `focus`, the item also takes focus and any
    /// submenu not hanging off it is closed first.
    fn set_highlight(&mut self, menu: MenuHandle, idx: Option<usize>, focus: bool) {
        let Some(s) = self.menus.get_mut(menu.0) else {
            return;
        };
        let old = s.highlighted.map(|i| s.items[i].node);
        let new = idx.map(|i| s.items[i].node);
        s.highlighted = idx;
        let stray: Vec<MenuHandle> = if focus {
            s.submenus
                .iter()
                .filter(|(trigger, _)| Some(**trigger) != new)
                .map(|(_, child)| *child)
                .collect()
        } else {
            Vec::new()
        };
        if old != new {
            if let Some(o) = old {
                self.host.set_attribute(o, Attribute::Highlighted(false));
            }
            if let Some(n) = new {
                self.host.set_attribute(n, Attribute::Highlighted(true));
            }
        }
        for child in stray {
            self.close_menu_session(child);
        }
        if focus && let Some(n) = new {
            self.move_focus(n);
        }
    }

    fn move_highlight(&mut self, menu: MenuHandle, step: Step) {
        let Some(s) = self.menus.get(menu.0) else {
            return;
        };
        let target = match step {
            Step::First => s.enabled().next(),
            Step::Last => s.enabled().next_back(),
            Step::Next => s.step(true),
            Step::Prev => s.step(false),
        };
        if target.is_some() {
            self.set_highlight(menu, target, true);
        }
    }

    fn root_of(&self, mut menu: MenuHandle) -> MenuHandle {
        while let Some(parent) = self.menus.get(menu.0).and_then(MenuSession::parent) {
            menu = parent;
        }
        menu
    }

    fn depth(&self, mut menu: MenuHandle) -> usize {
        let mut depth = 0;
        while let Some(parent) = self.menus.get(menu.0).and_then(MenuSession::parent) {
            depth += 1;
            menu = parent;
        }
        depth
    }

    /// Whether `node` lies in `menu`'s container or any of its open submenus.
    fn tree_contains(&self, menu: MenuHandle, node: H::Key) -> bool {
        let Some(s) = self.menus.get(menu.0) else {
            return false;
        };
        self.host.contains(s.container, node)
            || s.submenus.values().any(|&c| self.tree_contains(c, node))
    }

    /// The most deeply nested session whose container holds `node`.
    fn deepest_menu_at(&self, node: H::Key) -> Option<MenuHandle> {
        self.menus
            .iter()
            .filter(|(_, s)| self.host.contains(s.container, node))
            .map(|(slot, _)| MenuHandle(slot))
            .max_by_key(|&m| self.depth(m))
    }

    fn notify_select(&mut self, menu: MenuHandle, selection: MenuSelection<H::Key>) {
        let root = self.root_of(menu);
        if let Some(SessionKind::Root {
            on_select: Some(cb),
            ..
        }) = self.menus.get_mut(root.0).map(|s| &mut s.kind)
        {
            cb(selection);
        }
    }

    fn activate_item(&mut self, menu: MenuHandle, idx: usize) {
        let Some(s) = self.menus.get_mut(menu.0) else {
            return;
        };
        let Some(item) = s.items.get_mut(idx).filter(|i| !i.disabled) else {
            return;
        };
        let node = item.node;
        match &mut item.kind {
            ItemKind::Checkbox { checked } => {
                *checked = !*checked;
                let now = *checked;
                self.host.set_attribute(node, Attribute::Checked(now));
                self.notify_select(
                    menu,
                    MenuSelection {
                        item: node,
                        checked: Some(now),
                    },
                );
            }
            ItemKind::Radio { group, .. } => {
                let group = *group;
                let mut writes = Vec::new();
                for (i, other) in s.items.iter_mut().enumerate() {
                    if let ItemKind::Radio { group: g, checked } = &mut other.kind
                        && *g == group
                    {
                        let on = i == idx;
                        if *checked != on {
                            *checked = on;
                            writes.push((other.node, on));
                        }
                    }
                }
                for (n, on) in writes {
                    self.host.set_attribute(n, Attribute::Checked(on));
                }
                self.notify_select(
                    menu,
                    MenuSelection {
                        item: node,
                        checked: Some(true),
                    },
                );
            }
            ItemKind::Submenu(_) => self.open_submenu(menu, idx),
            ItemKind::Action => {
                self.notify_select(
                    menu,
                    MenuSelection {
                        item: node,
                        checked: None,
                    },
                );
                let root = self.root_of(menu);
                let task = self
                    .scheduler
                    .schedule(Deferral::Tick, Continuation::CloseMenu(root));
                if let Some(r) = self.menus.get_mut(root.0)
                    && let Some(prev) = r.close_task.replace(task)
                {
                    self.scheduler.cancel(prev);
                }
            }
        }
    }

    fn open_submenu(&mut self, menu: MenuHandle, idx: usize) {
        let Some(s) = self.menus.get(menu.0) else {
            return;
        };
        let Some(trigger) = s.items.get(idx).map(|i| i.node) else {
            return;
        };
        if let Some(&existing) = s.submenus.get(&trigger) {
            self.move_highlight(existing, Step::First);
            return;
        }
        let siblings: Vec<MenuHandle> = s.submenus.values().copied().collect();
        for sibling in siblings {
            self.close_menu_session(sibling);
        }
        let Some(s) = self.menus.get_mut(menu.0) else {
            return;
        };
        let ItemKind::Submenu(spec) = &mut s.items[idx].kind else {
            return;
        };
        let items = mem::take(&mut spec.items);
        let (content, placement) = (spec.content, spec.placement);
        self.set_highlight(menu, Some(idx), false);
        self.host.set_attribute(trigger, Attribute::Expanded(true));
        self.host
            .set_attribute(trigger, Attribute::State(OpenState::Open));
        let child = self.spawn_session(
            content,
            items,
            Orientation::Vertical,
            SessionKind::Submenu {
                parent: menu,
                trigger,
                side: placement.side,
            },
            Some((trigger, placement)),
            false,
        );
        if let Some(s) = self.menus.get_mut(menu.0) {
            s.submenus.insert(trigger, child);
        }
        self.move_highlight(child, Step::First);
        tracing::trace!(?trigger, "submenu opened");
    }

    /// Close a submenu and move focus back to its trigger.
    fn close_to_trigger(&mut self, menu: MenuHandle) {
        let Some(SessionKind::Submenu {
            parent, trigger, ..
        }) = self.menus.get(menu.0).map(|s| &s.kind)
        else {
            return;
        };
        let (parent, trigger) = (*parent, *trigger);
        self.close_menu_session(menu);
        let idx = self.menus.get(parent.0).and_then(|p| p.item_index(trigger));
        if idx.is_some() {
            self.set_highlight(parent, idx, true);
        }
    }

    pub(crate) fn menu_dismissed(
        &mut self,
        menu: MenuHandle,
        reason: DismissReason,
        target: Option<H::Key>,
    ) {
        let Some(parent) = self.menus.get(menu.0).map(MenuSession::parent) else {
            return;
        };
        let Some(parent) = parent else {
            self.close_menu_session(menu);
            return;
        };
        match reason {
            DismissReason::CancelKey => self.close_to_trigger(menu),
            DismissReason::OutsidePointer => {
                let root = self.root_of(parent);
                let inside_ancestor = target.is_some_and(|t| {
                    let mut cursor = Some(parent);
                    while let Some(m) = cursor {
                        let Some(s) = self.menus.get(m.0) else { break };
                        if self.host.contains(s.container, t) {
                            return true;
                        }
                        cursor = s.parent();
                    }
                    false
                });
                if inside_ancestor {
                    self.close_menu_session(menu);
                } else {
                    self.close_menu_session(root);
                }
            }
        }
    }

    pub(crate) fn menu_key_down(
        &mut self,
        key: KeyCode,
        modifiers: Modifiers,
    ) -> Option<EventResponse> {
        let focused = self.host.focused()?;
        let menu = self.deepest_menu_at(focused)?;
        let s = self.menus.get(menu.0)?;
        let (next, prev) = s.orientation.keys();
        let typing = !s.typeahead.is_empty();
        let highlighted_side = s.highlighted.and_then(|i| match &s.items[i].kind {
            ItemKind::Submenu(spec) => Some(spec.placement.side),
            _ => None,
        });
        let own_side = match s.kind {
            SessionKind::Submenu { side, .. } => Some(side),
            SessionKind::Root { .. } => None,
        };
        let highlighted = s.highlighted;

        match key {
            KeyCode::Tab => {}
            k if k == next => self.move_highlight(menu, Step::Next),
            k if k == prev => self.move_highlight(menu, Step::Prev),
            KeyCode::Home => self.move_highlight(menu, Step::First),
            KeyCode::End => self.move_highlight(menu, Step::Last),
            KeyCode::Space if typing => self.typeahead(menu, ' '),
            KeyCode::Enter | KeyCode::Space => {
                if let Some(i) = highlighted {
                    self.activate_item(menu, i);
                }
            }
            KeyCode::Character(c) if !modifiers.has_command() => self.typeahead(menu, c),
            k if highlighted_side.is_some_and(|side| k == arrow_toward(side)) => {
                if let Some(i) = highlighted {
                    self.open_submenu(menu, i);
                }
            }
            k if own_side.is_some_and(|side| k == arrow_toward(side.opposite())) => {
                self.close_to_trigger(menu);
            }
            _ => return None,
        }
        Some(EventResponse::prevented())
    }

    fn typeahead(&mut self, menu: MenuHandle, c: char) {
        if !self.menus.contains(menu.0) {
            return;
        }
        let delay = self.config.typeahead_reset_ms;
        let task = self
            .scheduler
            .schedule(Deferral::After(delay), Continuation::ClearTypeahead(menu));
        let Some(s) = self.menus.get_mut(menu.0) else {
            return;
        };
        s.typeahead.push(c);
        if let Some(prev) = s.typeahead_task.replace(task) {
            self.scheduler.cancel(prev);
        }
        let Some(s) = self.menus.get(menu.0) else {
            return;
        };
        let enabled: Vec<usize> = s.enabled().collect();
        let texts: Vec<String> = enabled
            .iter()
            .map(|&i| {
                let item = &s.items[i];
                item.label
                    .clone()
                    .unwrap_or_else(|| self.host.text_content(item.node))
            })
            .collect();
        let current = s
            .highlighted
            .and_then(|h| enabled.iter().position(|&i| i == h));
        if let Some(m) = next_match(&texts, current, &s.typeahead) {
            self.set_highlight(menu, Some(enabled[m]), true);
        }
    }

    pub(crate) fn clear_typeahead(&mut self, menu: MenuHandle) {
        if let Some(s) = self.menus.get_mut(menu.0) {
            s.typeahead.clear();
            s.typeahead_task = None;
        }
    }

    pub(crate) fn menu_pointer_move(&mut self, target: Option<H::Key>) {
        for slot in self.menus.slots() {
            let menu = MenuHandle(slot);
            let inside = target.is_some_and(|t| self.tree_contains(menu, t));
            let Some(s) = self.menus.get_mut(slot) else {
                continue;
            };
            let left = s.pointer_inside && !inside;
            s.pointer_inside = inside;
            // A session with an open submenu keeps its trigger highlighted.
            if left && s.submenus.is_empty() {
                let container = s.container;
                self.set_highlight(menu, None, false);
                self.move_focus(container);
            }
        }
        let Some(t) = target else { return };
        let Some(menu) = self.deepest_menu_at(t) else {
            return;
        };
        let Some(s) = self.menus.get(menu.0) else {
            return;
        };
        let Some(idx) = s.items.iter().position(|i| self.host.contains(i.node, t)) else {
            return;
        };
        if s.items[idx].disabled {
            let container = s.container;
            self.set_highlight(menu, None, false);
            self.move_focus(container);
        } else if s.highlighted != Some(idx) {
            self.set_highlight(menu, Some(idx), true);
        }
    }

    pub(crate) fn menu_click(&mut self, target: H::Key) -> EventResponse {
        let Some(menu) = self.deepest_menu_at(target) else {
            return EventResponse::default();
        };
        let idx = self
            .menus
            .get(menu.0)
            .and_then(|s| s.items.iter().position(|i| self.host.contains(i.node, target)));
        match idx {
            Some(i) => {
                self.activate_item(menu, i);
                EventResponse::prevented()
            }
            None => EventResponse::default(),
        }
    }

    pub(crate) fn menu_focus_in(&mut self, target: H::Key) {
        if let Some(menu) = self.deepest_menu_at(target)
            && let Some(idx) = self.menus.get(menu.0).and_then(|s| s.item_index(target))
        {
            self.set_highlight(menu, Some(idx), false);
        }
    }
}
