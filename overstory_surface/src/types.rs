// Copyright 2025 the Overstory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Public types shared across the host boundary: surface flags, focus
//! properties, and the presentation attributes the runtime writes.

use kurbo::Point;
use overstory_placement::{Align, Side};

bitflags::bitflags! {
    /// Per-surface flags consulted for focus and visibility decisions.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct SurfaceFlags: u16 {
        /// The surface can receive focus programmatically.
        const FOCUSABLE          = 0b0000_0000_0001;
        /// The surface is disabled.
        const DISABLED           = 0b0000_0000_0010;
        /// The surface carries the `hidden` attribute.
        const HIDDEN             = 0b0000_0000_0100;
        /// The surface is an input of type hidden; never tabbable.
        const HIDDEN_INPUT       = 0b0000_0000_1000;
        /// The surface is a link. Links are deprioritised for auto-focus.
        const LINK               = 0b0000_0001_0000;
        /// The surface is display-suppressed; hides its whole subtree.
        const DISPLAY_NONE       = 0b0000_0010_0000;
        /// The surface itself is visibility-suppressed.
        const VISIBILITY_HIDDEN  = 0b0000_0100_0000;
        /// The surface is a focus guard sentinel inserted by the runtime.
        const FOCUS_GUARD        = 0b0000_1000_0000;
    }
}

impl Default for SurfaceFlags {
    fn default() -> Self {
        Self::empty()
    }
}

/// Focus-related properties of a surface, as reported by the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SurfaceProps {
    /// Sequential focus order. Negative values are reachable by script only.
    pub tab_index: i32,
    /// Visibility and focus flags.
    pub flags: SurfaceFlags,
}

impl Default for SurfaceProps {
    fn default() -> Self {
        Self {
            tab_index: -1,
            flags: SurfaceFlags::empty(),
        }
    }
}

impl SurfaceProps {
    /// Properties of a natively focusable control such as a button.
    pub fn focusable() -> Self {
        Self {
            tab_index: 0,
            flags: SurfaceFlags::FOCUSABLE,
        }
    }

    /// Properties of a focusable link.
    pub fn link() -> Self {
        Self {
            tab_index: 0,
            flags: SurfaceFlags::FOCUSABLE | SurfaceFlags::LINK,
        }
    }

    /// Properties of a container that takes focus by script but is not in the tab order.
    pub fn programmatic() -> Self {
        Self {
            tab_index: -1,
            flags: SurfaceFlags::FOCUSABLE,
        }
    }

    /// Returns a copy with `flags` added.
    #[must_use]
    pub fn with(mut self, flags: SurfaceFlags) -> Self {
        self.flags |= flags;
        self
    }
}

/// Open/closed state marker written onto triggers and contents.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum OpenState {
    /// Currently open.
    Open,
    /// Currently closed.
    Closed,
}

/// A presentation attribute the runtime writes onto a caller-owned surface.
///
/// The runtime never creates or destroys surfaces; these writes are its only
/// side effects on them.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Attribute {
    /// Whether the surface is rendered.
    Visible(bool),
    /// Whether the surface accepts pointer interaction.
    Interactive(bool),
    /// Fixed-position origin in viewport coordinates.
    Position(Point),
    /// Side and alignment a floating surface was resolved to.
    Placement {
        /// Resolved side.
        side: Side,
        /// Resolved alignment.
        align: Align,
    },
    /// Menu item highlight marker.
    Highlighted(bool),
    /// Checked state of a checkbox or radio menu item.
    Checked(bool),
    /// Open/closed state marker.
    State(OpenState),
    /// Expanded marker for triggers.
    Expanded(bool),
}
