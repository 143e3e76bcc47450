// Copyright 2025 the Overstory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Popover placement: flipping and shifting against the viewport edges.
//!
//! The first half calls the pure resolver directly. The second half anchors a
//! popover to a trigger near the bottom edge and shows the hide, measure,
//! reveal sequence, then moves the trigger and repositions on scroll.
//!
//! Run:
//! - `cargo run -p overstory_demos --example popover_placement`

use kurbo::{Point, Rect, Size};
use overstory_placement::{Align, PlacementSpec, Side, resolve};
use overstory_runtime::{InputEvent, OverlayOptions, Runtime};
use overstory_surface::{Document, Surface};

fn show(label: &str, anchor: Rect, floating: Size, viewport: Size, spec: &PlacementSpec) {
    let placed = resolve(anchor, floating, viewport, spec);
    println!(
        "  {label:<28} requested {:?}/{:?} -> {:?}/{:?} at ({:.1}, {:.1})",
        spec.side, spec.align, placed.side, placed.align, placed.left, placed.top,
    );
}

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_target(false)
        .init();

    let viewport = Size::new(800.0, 600.0);
    let tooltip = Size::new(200.0, 80.0);

    println!("== Resolver ==");
    let spec = PlacementSpec {
        side: Side::Bottom,
        side_offset: 8.0,
        ..PlacementSpec::default()
    };
    show("fits below", Rect::new(300.0, 100.0, 400.0, 130.0), tooltip, viewport, &spec);
    show("flips above", Rect::new(300.0, 540.0, 400.0, 570.0), tooltip, viewport, &spec);
    show(
        "shifted from left edge",
        Rect::new(0.0, 100.0, 40.0, 130.0),
        tooltip,
        viewport,
        &spec,
    );
    let no_avoid = PlacementSpec {
        avoid_collisions: false,
        ..spec
    };
    show(
        "no flip, shift only",
        Rect::new(300.0, 540.0, 400.0, 570.0),
        tooltip,
        viewport,
        &no_avoid,
    );
    let right_end = PlacementSpec {
        side: Side::Right,
        align: Align::End,
        ..PlacementSpec::default()
    };
    show(
        "flips to the left",
        Rect::new(700.0, 200.0, 760.0, 230.0),
        tooltip,
        viewport,
        &right_end,
    );

    println!("\n== Anchored popover ==");
    let mut doc = Document::with_viewport(viewport);
    let body = doc.body();
    let trigger = doc.insert(
        Some(body),
        Surface {
            bounds: Rect::new(40.0, 550.0, 120.0, 580.0),
            ..Surface::button("Filter")
        },
    );
    let popover = doc.insert(
        Some(body),
        Surface {
            bounds: Rect::new(0.0, 0.0, 240.0, 160.0),
            ..Surface::container()
        },
    );
    doc.insert(
        Some(popover),
        Surface {
            bounds: Rect::new(0.0, 0.0, 80.0, 24.0),
            ..Surface::button("Apply")
        },
    );

    let mut rt = Runtime::new(doc);
    let placement = rt.placement(Side::Bottom, Align::Start);
    let handle = rt.open_overlay(popover, OverlayOptions::popover(trigger, placement));

    let report = |rt: &Runtime<Document>, when: &str| {
        let attrs = rt.host().attributes(popover).cloned().unwrap_or_default();
        println!(
            "  {when:<16} visible={:?} interactive={:?} position={:?} placement={:?}",
            attrs.visible, attrs.interactive, attrs.position, attrs.placement,
        );
    };
    report(&rt, "after open");
    rt.paint();
    report(&rt, "after paint");
    println!(
        "  scroll locks={} isolation={:?}",
        rt.scroll_lock_count(),
        rt.host().pointer_isolation(),
    );

    rt.host_mut().set_bounds(trigger, Rect::new(600.0, 40.0, 680.0, 70.0));
    rt.handle_event(InputEvent::Scroll);
    report(&rt, "after scroll");

    rt.tick();
    let response = rt.handle_event(InputEvent::PointerDown {
        target: body,
        position: Point::new(10.0, 10.0),
    });
    println!(
        "  outside pointer: suppressed={} open={}",
        response.pointer_suppressed,
        rt.is_overlay_open(handle),
    );
    rt.handle_event(InputEvent::ExitAnimationEnd(popover));
    report(&rt, "after exit");
}
