// Copyright 2025 the Overstory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A settings dialog with a nested options menu, driven by scripted input.
//!
//! This example shows how to:
//! - open a modal dialog with `Runtime::open_overlay` and watch scroll lock,
//!   focus guards, and pointer isolation come and go;
//! - open a menu anchored to a button inside the dialog, navigate it with
//!   arrows and typeahead, and open a submenu;
//! - dismiss layers one at a time with the cancel key.
//!
//! Run:
//! - `cargo run -p overstory_demos --example dialog_and_menu`

use kurbo::{Point, Rect};
use overstory_placement::{Align, Side};
use overstory_runtime::{
    InputEvent, KeyCode, MenuItem, MenuOptions, Modifiers, OverlayOptions, Runtime, SubmenuSpec,
};
use overstory_surface::{Document, Host, Surface, SurfaceId};

fn key(rt: &mut Runtime<Document>, key: KeyCode) {
    let response = rt.handle_event(InputEvent::KeyDown {
        key,
        modifiers: Modifiers::empty(),
    });
    let focused = describe(rt, rt.host().focused());
    println!(
        "  {:<18} prevented={:<5} focus={focused}",
        format!("{key:?}"),
        response.default_prevented,
    );
}

fn describe(rt: &Runtime<Document>, id: Option<SurfaceId>) -> String {
    match id {
        Some(id) => {
            let text = rt.host().text_content(id);
            if text.is_empty() {
                format!("{id:?}")
            } else {
                format!("{text:?}")
            }
        }
        None => "<none>".into(),
    }
}

fn status(rt: &Runtime<Document>) {
    println!(
        "  scroll locks={} guards={} scopes={} layers={} isolation={}",
        rt.scroll_lock_count(),
        rt.focus_guard_count(),
        rt.focus_scope_count(),
        rt.dismiss_layer_count(),
        describe(rt, rt.host().pointer_isolation()),
    );
}

fn leaf(doc: &mut Document, parent: SurfaceId, text: &str, bounds: Rect) -> SurfaceId {
    doc.insert(
        Some(parent),
        Surface {
            bounds,
            ..Surface::button(text)
        },
    )
}

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_target(false)
        .init();

    let mut doc = Document::new();
    doc.set_scrollbar_width(15.0);
    let body = doc.body();
    let settings = leaf(&mut doc, body, "Settings", Rect::new(16.0, 16.0, 96.0, 40.0));

    let dialog = doc.insert(
        Some(body),
        Surface {
            bounds: Rect::new(200.0, 150.0, 600.0, 450.0),
            ..Surface::container()
        },
    );
    let more = leaf(&mut doc, dialog, "More", Rect::new(220.0, 170.0, 300.0, 194.0));
    let close = leaf(&mut doc, dialog, "Close", Rect::new(500.0, 400.0, 580.0, 424.0));

    let menu = doc.insert(
        Some(body),
        Surface {
            bounds: Rect::new(0.0, 0.0, 160.0, 96.0),
            ..Surface::container()
        },
    );
    let rename = leaf(&mut doc, menu, "Rename", Rect::ZERO);
    let export = leaf(&mut doc, menu, "Export", Rect::ZERO);
    let archive = leaf(&mut doc, menu, "Archive", Rect::ZERO);

    let formats = doc.insert(
        Some(body),
        Surface {
            bounds: Rect::new(0.0, 0.0, 120.0, 64.0),
            ..Surface::container()
        },
    );
    let pdf = leaf(&mut doc, formats, "PDF", Rect::ZERO);
    let png = leaf(&mut doc, formats, "PNG", Rect::ZERO);

    doc.focus(settings);
    let mut rt = Runtime::new(doc);

    println!("== Open the settings dialog ==");
    let overlay = rt.open_overlay(dialog, OverlayOptions::dialog(settings));
    status(&rt);
    println!("  focus={}", describe(&rt, rt.host().focused()));
    rt.tick();

    println!("\n== Tab wraps inside the dialog ==");
    key(&mut rt, KeyCode::Tab);
    key(&mut rt, KeyCode::Tab);

    println!("\n== Open the \"More\" menu ==");
    rt.host_mut().focus(more);
    rt.handle_event(InputEvent::FocusIn { target: more });
    let placement = rt.placement(Side::Bottom, Align::Start);
    let session = rt.open_menu_session(
        menu,
        MenuOptions {
            items: vec![
                MenuItem::action(rename),
                MenuItem::submenu(
                    export,
                    SubmenuSpec::new(
                        formats,
                        vec![MenuItem::radio(pdf, 0, true), MenuItem::radio(png, 0, false)],
                    ),
                ),
                MenuItem::action(archive),
            ],
            anchor: Some(more),
            placement,
            on_select: Some(Box::new(|s| {
                println!("  selected {:?} checked={:?}", s.item, s.checked);
            })),
            ..MenuOptions::default()
        },
    );
    rt.paint();
    rt.tick();
    println!(
        "  menu placed at {:?}",
        rt.host().attributes(menu).and_then(|a| a.position)
    );
    status(&rt);

    println!("\n== Navigate ==");
    key(&mut rt, KeyCode::ArrowDown);
    key(&mut rt, KeyCode::Character('e'));
    key(&mut rt, KeyCode::ArrowRight);
    rt.paint();
    key(&mut rt, KeyCode::ArrowDown);
    key(&mut rt, KeyCode::Enter);
    println!("  submenu open: {:?}", rt.open_submenu_of(session).is_some());

    println!("\n== Pointer inside the dialog, outside every menu ==");
    rt.tick();
    let response = rt.handle_event(InputEvent::PointerDown {
        target: close,
        position: Point::new(510.0, 410.0),
    });
    println!(
        "  suppressed={} menu open={}",
        response.pointer_suppressed,
        rt.is_menu_open(session)
    );
    rt.tick();
    status(&rt);

    println!("\n== Cancel key closes the dialog ==");
    key(&mut rt, KeyCode::Escape);
    rt.tick();
    println!("  focus={}", describe(&rt, rt.host().focused()));
    rt.advance(250);
    println!(
        "  dialog visible={:?} open={}",
        rt.host().attributes(dialog).and_then(|a| a.visible),
        rt.is_overlay_open(overlay)
    );
    status(&rt);
}
