// Copyright 2025 the Overstory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Property tests for placement resolution.

use kurbo::{Rect, Size};
use overstory_placement::{Align, PlacementSpec, Side, resolve};
use proptest::prelude::*;

const VIEWPORT: Size = Size::new(1024.0, 768.0);

fn side() -> impl Strategy<Value = Side> {
    prop_oneof![
        Just(Side::Top),
        Just(Side::Bottom),
        Just(Side::Left),
        Just(Side::Right),
    ]
}

fn align() -> impl Strategy<Value = Align> {
    prop_oneof![Just(Align::Start), Just(Align::Center), Just(Align::End)]
}

fn anchor() -> impl Strategy<Value = Rect> {
    (-200.0..1200.0_f64, -200.0..1000.0_f64, 1.0..300.0_f64, 1.0..200.0_f64)
        .prop_map(|(x, y, w, h)| Rect::new(x, y, x + w, y + h))
}

proptest! {
    #[test]
    fn resolve_is_deterministic(
        anchor in anchor(),
        w in 1.0..900.0_f64,
        h in 1.0..700.0_f64,
        side in side(),
        align in align(),
        offset in 0.0..32.0_f64,
    ) {
        let spec = PlacementSpec { side, align, side_offset: offset, ..PlacementSpec::default() };
        let a = resolve(anchor, Size::new(w, h), VIEWPORT, &spec);
        let b = resolve(anchor, Size::new(w, h), VIEWPORT, &spec);
        prop_assert_eq!(a, b);
    }

    #[test]
    fn shifted_box_stays_inside_padded_viewport(
        anchor in anchor(),
        w in 1.0..1000.0_f64,
        h in 1.0..750.0_f64,
        side in side(),
        align in align(),
        offset in 0.0..32.0_f64,
        align_offset in -16.0..16.0_f64,
    ) {
        let spec = PlacementSpec {
            side,
            align,
            side_offset: offset,
            align_offset,
            ..PlacementSpec::default()
        };
        let pad = spec.collision_padding;
        let placed = resolve(anchor, Size::new(w, h), VIEWPORT, &spec);
        prop_assert!(placed.top >= pad);
        prop_assert!(placed.top <= VIEWPORT.height - h - pad);
        prop_assert!(placed.left >= pad);
        prop_assert!(placed.left <= VIEWPORT.width - w - pad);
    }

    #[test]
    fn flip_stays_on_primary_axis(anchor in anchor(), w in 1.0..900.0_f64, h in 1.0..700.0_f64, side in side()) {
        let spec = PlacementSpec { side, ..PlacementSpec::default() };
        let placed = resolve(anchor, Size::new(w, h), VIEWPORT, &spec);
        prop_assert!(placed.side == side || placed.side == side.opposite());
    }
}
