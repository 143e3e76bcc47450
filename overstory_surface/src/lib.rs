// Copyright 2025 the Overstory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Overstory Surface: the host boundary of the overlay runtime.
//!
//! The runtime never owns the surfaces it manages. It reads their geometry
//! and focus properties, moves focus between them, and writes a small set of
//! presentation attributes. Everything it needs from its environment is
//! expressed by the [`Host`] trait.
//!
//! ## Reads
//!
//! - Tree structure: [`Host::parent_of`] and [`Host::children_of`] (document order).
//! - Geometry: [`Host::bounds`] (`None` when a surface cannot be measured),
//!   [`Host::viewport`], and [`Host::scrollbar_width`].
//! - Focus: [`Host::props`], [`Host::focused`], and [`Host::can_focus`].
//! - Search text: [`Host::text_content`].
//!
//! ## Writes
//!
//! - [`Host::focus`] moves focus; [`Host::set_attribute`] writes an [`Attribute`].
//! - Process-wide effects, applied only on reference-count transitions by the runtime:
//!   [`Host::freeze_scroll`] / [`Host::unfreeze_scroll`],
//!   [`Host::insert_focus_guards`] / [`Host::remove_focus_guards`], and
//!   [`Host::set_pointer_isolation`].
//!
//! ## Reference host
//!
//! [`Document`] is an in-memory surface tree implementing [`Host`]. It records
//! every side effect so tests and demos can observe them:
//!
//! ```rust
//! use kurbo::Rect;
//! use overstory_surface::{Document, Host, Surface, SurfaceProps};
//!
//! let mut doc = Document::new();
//! let body = doc.body();
//! let button = doc.insert(
//!     Some(body),
//!     Surface {
//!         bounds: Rect::new(0.0, 0.0, 80.0, 24.0),
//!         props: SurfaceProps::focusable(),
//!         ..Surface::default()
//!     },
//! );
//!
//! assert!(doc.focus(button));
//! assert_eq!(doc.focused(), Some(button));
//! assert!(doc.contains(body, button));
//! ```
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod document;
mod types;

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt::Debug;
use core::hash::Hash;

use kurbo::{Rect, Size};

pub use document::{Attributes, Document, Surface, SurfaceId};
pub use types::{Attribute, OpenState, SurfaceFlags, SurfaceProps};

/// The environment the runtime operates in.
///
/// Implementations adapt a concrete UI toolkit (a DOM, a retained widget tree,
/// a terminal UI) to the runtime. All methods must tolerate stale keys by
/// returning `None`/`false`/empty values.
pub trait Host {
    /// Opaque handle to a surface owned by the host.
    type Key: Copy + Eq + Hash + Debug + 'static;

    /// Parent of `node`, or `None` for roots and stale keys.
    fn parent_of(&self, node: Self::Key) -> Option<Self::Key>;

    /// Children of `node` in document order.
    fn children_of(&self, node: Self::Key) -> &[Self::Key];

    /// Bounding rectangle in viewport coordinates, or `None` when not measurable.
    fn bounds(&self, node: Self::Key) -> Option<Rect>;

    /// Size of the viewport.
    fn viewport(&self) -> Size;

    /// Width of the classic scrollbar currently taking layout space.
    fn scrollbar_width(&self) -> f64;

    /// Focus properties of `node`, or `None` for stale keys.
    fn props(&self, node: Self::Key) -> Option<SurfaceProps>;

    /// Full text content of `node`, used for typeahead matching.
    fn text_content(&self, node: Self::Key) -> String;

    /// The surface that currently holds focus.
    fn focused(&self) -> Option<Self::Key>;

    /// Whether `node` can currently receive focus.
    fn can_focus(&self, node: Self::Key) -> bool;

    /// Move focus to `node`. Returns `false` if the node cannot take focus.
    fn focus(&mut self, node: Self::Key) -> bool;

    /// Write a presentation attribute onto `node`.
    fn set_attribute(&mut self, node: Self::Key, attribute: Attribute);

    /// Suppress pointer input everywhere except inside `interactive`;
    /// `None` restores the state from before isolation began.
    fn set_pointer_isolation(&mut self, interactive: Option<Self::Key>);

    /// Freeze background scrolling, padding the document by `compensation`
    /// to avoid layout shift. The host saves the styles it overrides.
    fn freeze_scroll(&mut self, compensation: f64);

    /// Restore the styles saved by [`Host::freeze_scroll`].
    fn unfreeze_scroll(&mut self);

    /// Insert the pair of focus guard sentinels at both extremities of the surface tree.
    fn insert_focus_guards(&mut self);

    /// Remove the focus guard sentinels.
    fn remove_focus_guards(&mut self);

    /// Whether `node` is `ancestor` or one of its descendants.
    fn contains(&self, ancestor: Self::Key, node: Self::Key) -> bool {
        let mut current = Some(node);
        while let Some(n) = current {
            if n == ancestor {
                return true;
            }
            current = self.parent_of(n);
        }
        false
    }

    /// All descendants of `root` in document order, excluding `root` itself.
    fn descendants(&self, root: Self::Key) -> Vec<Self::Key> {
        let mut out = Vec::new();
        let mut stack: Vec<Self::Key> = self.children_of(root).iter().rev().copied().collect();
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(self.children_of(node).iter().rev().copied());
        }
        out
    }
}
