// Copyright 2025 the Overstory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Floating positioners: keep a surface placed against its anchor.
//!
//! Activation hides the floating surface and makes it non-interactive, then
//! waits for the next paint so the host has laid it out. On that paint the
//! surface is measured, resolved with [`overstory_placement::resolve`], moved,
//! and revealed. Scroll and resize events re-resolve every revealed
//! positioner.
//!
//! When either surface cannot be measured the position is left untouched, but
//! the surface is still revealed.

use overstory_placement::{PlacementSpec, ResolvedPlacement, resolve};
use overstory_surface::{Attribute, Host};

use crate::arena::Slot;
use crate::runtime::Runtime;
use crate::scheduler::{Continuation, Deferral, TaskId};

/// Disposer for an active positioner.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct PositionerHandle(pub(crate) Slot);

#[derive(Clone, Debug)]
pub(crate) struct Positioner<K> {
    anchor: K,
    floating: K,
    spec: PlacementSpec,
    revealed: bool,
    last: Option<ResolvedPlacement>,
    reveal_task: Option<TaskId>,
}

impl<H: Host> Runtime<H> {
    /// Place `floating` against `anchor` from the next paint on.
    pub fn position_floating(
        &mut self,
        anchor: H::Key,
        floating: H::Key,
        spec: PlacementSpec,
    ) -> PositionerHandle {
        self.host.set_attribute(floating, Attribute::Visible(false));
        self.host.set_attribute(floating, Attribute::Interactive(false));
        let handle = PositionerHandle(self.positioners.insert(Positioner {
            anchor,
            floating,
            spec,
            revealed: false,
            last: None,
            reveal_task: None,
        }));
        let task = self
            .scheduler
            .schedule(Deferral::Paint, Continuation::RevealFloating(handle));
        if let Some(p) = self.positioners.get_mut(handle.0) {
            p.reveal_task = Some(task);
        }
        tracing::debug!(?anchor, ?floating, side = spec.side.as_str(), "positioner active");
        handle
    }

    /// Stop tracking. Returns `false` for a stale handle.
    pub fn dispose_positioner(&mut self, positioner: PositionerHandle) -> bool {
        let Some(p) = self.positioners.remove(positioner.0) else {
            return false;
        };
        if let Some(task) = p.reveal_task {
            self.scheduler.cancel(task);
        }
        true
    }

    /// The placement most recently applied by `positioner`.
    pub fn resolved_placement(&self, positioner: PositionerHandle) -> Option<ResolvedPlacement> {
        self.positioners.get(positioner.0).and_then(|p| p.last)
    }

    /// Re-resolve every revealed positioner against current geometry.
    pub fn update_positions(&mut self) {
        for slot in self.positioners.slots() {
            if self.positioners.get(slot).is_some_and(|p| p.revealed) {
                self.place(PositionerHandle(slot));
            }
        }
    }

    pub(crate) fn reveal_floating(&mut self, positioner: PositionerHandle) {
        let Some(p) = self.positioners.get_mut(positioner.0) else {
            return;
        };
        p.reveal_task = None;
        p.revealed = true;
        let floating = p.floating;
        if self.place(positioner).is_none() {
            tracing::trace!(?floating, "revealed without measurement");
        }
        self.host.set_attribute(floating, Attribute::Visible(true));
        self.host.set_attribute(floating, Attribute::Interactive(true));
    }

    fn place(&mut self, positioner: PositionerHandle) -> Option<ResolvedPlacement> {
        let p = self.positioners.get(positioner.0)?;
        let (anchor, floating, spec) = (p.anchor, p.floating, p.spec);
        let anchor_rect = self.host.bounds(anchor)?;
        let size = self.host.bounds(floating)?.size();
        let placed = resolve(anchor_rect, size, self.host.viewport(), &spec);
        self.host
            .set_attribute(floating, Attribute::Position(placed.origin()));
        self.host.set_attribute(
            floating,
            Attribute::Placement {
                side: placed.side,
                align: placed.align,
            },
        );
        if let Some(p) = self.positioners.get_mut(positioner.0) {
            p.last = Some(placed);
        }
        Some(placed)
    }
}

#[cfg(test)]
mod tests {
    use kurbo::{Point, Rect, Size};
    use overstory_placement::{Align, PlacementSpec, Side};
    use overstory_surface::{Document, Surface};

    use crate::{InputEvent, Runtime};

    fn sized(w: f64, h: f64) -> Surface {
        Surface {
            bounds: Rect::new(0.0, 0.0, w, h),
            ..Surface::container()
        }
    }

    #[test]
    fn hidden_until_paint_then_placed_and_revealed() {
        let mut doc = Document::with_viewport(Size::new(800.0, 600.0));
        let body = doc.body();
        let anchor = doc.insert(
            Some(body),
            Surface {
                bounds: Rect::new(100.0, 560.0, 180.0, 590.0),
                ..Surface::button("open")
            },
        );
        let pop = doc.insert(Some(body), sized(120.0, 200.0));
        let mut rt = Runtime::new(doc);
        let spec = PlacementSpec {
            side: Side::Bottom,
            side_offset: 8.0,
            ..PlacementSpec::default()
        };
        let h = rt.position_floating(anchor, pop, spec);
        let attrs = rt.host().attributes(pop).unwrap();
        assert_eq!(attrs.visible, Some(false));
        assert_eq!(attrs.interactive, Some(false));
        assert!(rt.resolved_placement(h).is_none());

        rt.paint();
        let placed = rt.resolved_placement(h).unwrap();
        assert_eq!(placed.side, Side::Top, "no room below");
        let attrs = rt.host().attributes(pop).unwrap();
        assert_eq!(attrs.visible, Some(true));
        assert_eq!(attrs.interactive, Some(true));
        assert_eq!(attrs.placement, Some((Side::Top, Align::Center)));
        assert_eq!(attrs.position, Some(Point::new(80.0, 352.0)));
    }

    #[test]
    fn resize_re_resolves_and_dispose_stops_tracking() {
        let mut doc = Document::new();
        let body = doc.body();
        let anchor = doc.insert(
            Some(body),
            Surface {
                bounds: Rect::new(10.0, 10.0, 50.0, 30.0),
                ..Surface::button("a")
            },
        );
        let pop = doc.insert(Some(body), sized(100.0, 100.0));
        let mut rt = Runtime::new(doc);
        let h = rt.position_floating(anchor, pop, PlacementSpec::default());
        rt.paint();
        assert_eq!(rt.resolved_placement(h).unwrap().side, Side::Bottom);

        rt.host_mut().set_bounds(anchor, Rect::new(10.0, 560.0, 50.0, 580.0));
        rt.handle_event(InputEvent::Resize);
        assert_eq!(rt.resolved_placement(h).unwrap().side, Side::Top);

        assert!(rt.dispose_positioner(h));
        assert!(!rt.dispose_positioner(h));
        rt.host_mut().set_bounds(anchor, Rect::new(10.0, 10.0, 50.0, 30.0));
        rt.handle_event(InputEvent::Scroll);
        assert_eq!(
            rt.host().attributes(pop).unwrap().placement,
            Some((Side::Top, Align::Center))
        );
    }

    #[test]
    fn disposing_before_paint_cancels_reveal() {
        let mut doc = Document::new();
        let body = doc.body();
        let anchor = doc.insert(Some(body), Surface::button("a"));
        let pop = doc.insert(Some(body), sized(10.0, 10.0));
        let mut rt = Runtime::new(doc);
        let h = rt.position_floating(anchor, pop, PlacementSpec::default());
        rt.dispose_positioner(h);
        rt.paint();
        assert_eq!(rt.host().attributes(pop).unwrap().visible, Some(false));
    }
}
