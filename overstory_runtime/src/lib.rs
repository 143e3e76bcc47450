// Copyright 2025 the Overstory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Overstory Runtime: interaction plumbing for overlays.
//!
//! This crate coordinates the pieces every floating or modal surface needs,
//! against any surface tree that implements [`Host`]:
//!
//! - **Scroll lock** and **focus guards**: reference-counted process-wide
//!   effects, applied on the first acquisition and reverted on the last.
//! - **Focus scopes** ([`Runtime::activate_focus_scope`]): a stack of
//!   containers trapping sequential focus; only the top one is active.
//! - **Dismiss layers** ([`Runtime::activate_dismiss_layer`]): a stack of
//!   surfaces closing on the cancel key or an outside pointer press; only the
//!   top one reacts, and hooks can veto.
//! - **Floating positioners** ([`Runtime::position_floating`]): hide, measure
//!   after layout, place with [`overstory_placement::resolve`], reveal, and
//!   follow scroll and resize.
//! - **Menu sessions** ([`Runtime::open_menu_session`]): highlight navigation,
//!   typeahead, checkbox and radio items, and nested submenus.
//! - **Overlays** ([`Runtime::open_overlay`]): dialogs, alert dialogs, sheets,
//!   and popovers composed from the pieces above.
//!
//! Everything is single-threaded and owned by one [`Runtime`] value; there is
//! no global state. Work that must happen later is queued and run when the
//! host calls [`Runtime::tick`], [`Runtime::paint`], or [`Runtime::advance`].
//! Every acquisition returns a handle whose disposal is idempotent.
//!
//! ## Minimal example
//!
//! A dialog that traps focus and closes on the cancel key:
//!
//! ```rust
//! use overstory_runtime::{InputEvent, KeyCode, Modifiers, OverlayOptions, Runtime};
//! use overstory_surface::{Document, Host, OpenState, Surface};
//!
//! let mut doc = Document::new();
//! let body = doc.body();
//! let open = doc.insert(Some(body), Surface::button("Open"));
//! let dialog = doc.insert(Some(body), Surface::container());
//! let ok = doc.insert(Some(dialog), Surface::button("OK"));
//! doc.focus(open);
//!
//! let mut rt = Runtime::new(doc);
//! let handle = rt.open_overlay(dialog, OverlayOptions::dialog(open));
//! assert_eq!(rt.host().focused(), Some(ok));
//! assert!(rt.host().scroll_frozen().is_some());
//!
//! let response = rt.handle_event(InputEvent::KeyDown {
//!     key: KeyCode::Escape,
//!     modifiers: Modifiers::empty(),
//! });
//! assert!(response.default_prevented);
//! assert!(!rt.is_overlay_open(handle));
//! assert_eq!(rt.host().attributes(dialog).unwrap().state, Some(OpenState::Closed));
//!
//! // Focus returns to the trigger on the next tick; the container hides once
//! // the exit fallback elapses.
//! rt.tick();
//! assert_eq!(rt.host().focused(), Some(open));
//! rt.advance(250);
//! assert_eq!(rt.host().attributes(dialog).unwrap().visible, Some(false));
//! ```
//!
//! ## Features
//!
//! - `std` (default): enables `std` support for `kurbo`.
//! - `libm`: enables `no_std` builds that rely on `libm` for floating-point math.
//!
//! Diagnostics are emitted through `tracing` at `debug` and `trace` levels;
//! unbalanced releases are reported at `warn`.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod arena;
mod config;
mod dismiss;
mod event;
mod floating;
mod focus;
mod menu;
mod overlay;
mod refcount;
mod runtime;
mod scheduler;
mod tabbable;
mod typeahead;

pub use overstory_surface::Host;

pub use config::RuntimeConfig;
pub use dismiss::{DismissHook, LayerHandle, LayerOptions};
pub use event::{DismissReason, EventResponse, InputEvent, Interaction, KeyCode, Modifiers};
pub use floating::PositionerHandle;
pub use focus::{InitialFocus, ScopeHandle, ScopeOptions};
pub use menu::{
    ItemKind, MenuHandle, MenuItem, MenuOptions, MenuSelection, Orientation, SubmenuSpec,
};
pub use overlay::{OverlayHandle, OverlayOptions, SHEET_EXIT_FALLBACK_MS};
pub use refcount::{FocusGuards, GuardHandle, LockHandle, RefCount, ScrollLock};
pub use runtime::{Disposer, Runtime};
pub use tabbable::{is_visible, tabbable, visible_tabbable};
