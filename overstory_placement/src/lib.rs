// Copyright 2025 the Overstory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Overstory Placement: anchor-relative placement of floating surfaces.
//!
//! This crate answers one question: given an anchor rectangle, the size of a
//! floating rectangle, a viewport, and a [`PlacementSpec`], where should the
//! floating rectangle go? It is a pure function with no state and no knowledge
//! of any scene tree, event loop, or renderer.
//!
//! ## Algorithm
//!
//! 1. Place the floating box on [`PlacementSpec::side`] of the anchor, separated
//!    by [`PlacementSpec::side_offset`], and aligned along the cross axis per
//!    [`PlacementSpec::align`] and [`PlacementSpec::align_offset`].
//! 2. **Flip**: if [`PlacementSpec::avoid_collisions`] is set and the box
//!    crosses a viewport edge on the primary axis, try the mirrored side
//!    (top ↔ bottom, left ↔ right). The flip is taken only if the mirrored side
//!    stays within the viewport. The edges themselves are the threshold; the
//!    collision padding plays no part in the flip. Flipping never rotates to a
//!    perpendicular side and is attempted at most once.
//! 3. **Shift**: always clamp both axes into
//!    `[padding, viewport - size - padding]`, whether or not collisions are
//!    avoided. When the floating box is larger than the viewport the clamp
//!    still yields `padding`; the caller owns what that looks like.
//!
//! ## Minimal example
//!
//! ```rust
//! use kurbo::{Rect, Size};
//! use overstory_placement::{Align, PlacementSpec, Side, resolve};
//!
//! let anchor = Rect::new(100.0, 560.0, 180.0, 590.0);
//! let floating = Size::new(120.0, 200.0);
//! let viewport = Size::new(800.0, 600.0);
//!
//! let spec = PlacementSpec {
//!     side: Side::Bottom,
//!     side_offset: 8.0,
//!     ..PlacementSpec::default()
//! };
//!
//! // Not enough room below the anchor, plenty above: the box flips.
//! let placed = resolve(anchor, floating, viewport, &spec);
//! assert_eq!(placed.side, Side::Top);
//! assert_eq!(placed.align, Align::Center);
//! assert_eq!(placed.top, 560.0 - 200.0 - 8.0);
//! ```
//!
//! ## Features
//!
//! - `std` (default): enables `std` support for `kurbo`.
//! - `libm`: enables `no_std` builds that rely on `libm` for floating-point math.
//!
//! This crate is `no_std`.

#![no_std]

use kurbo::{Point, Rect, Size};

/// Default clamp padding between a floating surface and the viewport edges.
pub const DEFAULT_COLLISION_PADDING: f64 = 4.0;

/// Side of the anchor the floating surface is placed on.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Side {
    /// Above the anchor.
    Top,
    /// Below the anchor.
    Bottom,
    /// Left of the anchor.
    Left,
    /// Right of the anchor.
    Right,
}

impl Side {
    /// The mirrored side on the same axis.
    pub const fn opposite(self) -> Self {
        match self {
            Self::Top => Self::Bottom,
            Self::Bottom => Self::Top,
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }

    /// Returns `true` for [`Side::Top`] and [`Side::Bottom`].
    pub const fn is_vertical(self) -> bool {
        matches!(self, Self::Top | Self::Bottom)
    }

    /// Lowercase name, suitable for a presentation attribute.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Top => "top",
            Self::Bottom => "bottom",
            Self::Left => "left",
            Self::Right => "right",
        }
    }
}

/// Cross-axis alignment of the floating surface against the anchor.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Align {
    /// Align the leading edges.
    Start,
    /// Center on the anchor.
    Center,
    /// Align the trailing edges.
    End,
}

impl Align {
    /// Lowercase name, suitable for a presentation attribute.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Center => "center",
            Self::End => "end",
        }
    }
}

/// Placement preferences supplied by the caller.
///
/// Immutable for the duration of a positioning session.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PlacementSpec {
    /// Preferred side.
    pub side: Side,
    /// Cross-axis alignment.
    pub align: Align,
    /// Gap between the anchor and the floating surface along the primary axis.
    pub side_offset: f64,
    /// Shift along the cross axis, away from the aligned edge.
    ///
    /// For [`Align::End`] the offset is applied toward the start so that a
    /// positive value always moves the surface inward from its aligned edge.
    pub align_offset: f64,
    /// Enables the flip to the mirrored side.
    pub avoid_collisions: bool,
    /// Minimum distance to keep from the viewport edges when shifting.
    pub collision_padding: f64,
}

impl Default for PlacementSpec {
    fn default() -> Self {
        Self {
            side: Side::Bottom,
            align: Align::Center,
            side_offset: 0.0,
            align_offset: 0.0,
            avoid_collisions: true,
            collision_padding: DEFAULT_COLLISION_PADDING,
        }
    }
}

/// Output of [`resolve`].
///
/// Coordinates are in the same space as the anchor rectangle and viewport
/// (typically viewport/client space).
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ResolvedPlacement {
    /// Y coordinate of the floating surface's top edge.
    pub top: f64,
    /// X coordinate of the floating surface's left edge.
    pub left: f64,
    /// Side actually used after flip resolution.
    pub side: Side,
    /// Alignment actually used.
    pub align: Align,
}

impl ResolvedPlacement {
    /// Top-left corner as a point.
    pub fn origin(&self) -> Point {
        Point::new(self.left, self.top)
    }

    /// The placed rectangle for a floating surface of `size`.
    pub fn rect(&self, size: Size) -> Rect {
        Rect::from_origin_size(self.origin(), size)
    }
}

/// Resolve the placement of a floating surface.
///
/// Only the size of `floating` matters; its current origin is ignored.
/// Identical inputs always yield identical outputs.
pub fn resolve(
    anchor: Rect,
    floating: Size,
    viewport: Size,
    spec: &PlacementSpec,
) -> ResolvedPlacement {
    let mut side = spec.side;
    let mut primary = primary_coord(side, anchor, floating, spec.side_offset);
    let cross = cross_coord(side, spec.align, anchor, floating, spec.align_offset);

    if spec.avoid_collisions && overflows(side, primary, floating, viewport) {
        let mirrored = side.opposite();
        let candidate = primary_coord(mirrored, anchor, floating, spec.side_offset);
        if !overflows(mirrored, candidate, floating, viewport) {
            side = mirrored;
            primary = candidate;
        }
    }

    let (mut top, mut left) = if side.is_vertical() {
        (primary, cross)
    } else {
        (cross, primary)
    };

    let pad = spec.collision_padding;
    left = clamp_axis(left, viewport.width - floating.width - pad, pad);
    top = clamp_axis(top, viewport.height - floating.height - pad, pad);

    ResolvedPlacement {
        top,
        left,
        side,
        align: spec.align,
    }
}

/// Coordinate along the primary axis (y for vertical sides, x otherwise).
fn primary_coord(side: Side, anchor: Rect, floating: Size, offset: f64) -> f64 {
    match side {
        Side::Top => anchor.y0 - floating.height - offset,
        Side::Bottom => anchor.y1 + offset,
        Side::Left => anchor.x0 - floating.width - offset,
        Side::Right => anchor.x1 + offset,
    }
}

fn cross_coord(side: Side, align: Align, anchor: Rect, floating: Size, offset: f64) -> f64 {
    let (start, end, len) = if side.is_vertical() {
        (anchor.x0, anchor.x1, floating.width)
    } else {
        (anchor.y0, anchor.y1, floating.height)
    };
    match align {
        Align::Start => start + offset,
        Align::Center => start + ((end - start) - len) / 2.0 + offset,
        Align::End => end - len - offset,
    }
}

/// Whether the box crosses a viewport edge on the primary axis of `side`.
fn overflows(side: Side, primary: f64, floating: Size, viewport: Size) -> bool {
    let (len, limit) = if side.is_vertical() {
        (floating.height, viewport.height)
    } else {
        (floating.width, viewport.width)
    };
    primary < 0.0 || primary + len > limit
}

/// `max(min_edge, min(value, max_edge))`: the lower bound wins when the box
/// is larger than the viewport.
fn clamp_axis(value: f64, max_edge: f64, min_edge: f64) -> f64 {
    value.min(max_edge).max(min_edge)
}
