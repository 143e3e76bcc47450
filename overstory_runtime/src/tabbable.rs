// Copyright 2025 the Overstory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Sequential-focus candidates inside a container.

use alloc::vec::Vec;

use overstory_surface::{Host, SurfaceFlags};

/// Tabbable descendants of `container` in document order.
///
/// A surface is tabbable when it has properties, a non-negative tab index,
/// and is not disabled, `hidden`, or a hidden input. The container itself is
/// never included. Hidden ancestors do not exclude their descendants here;
/// see [`is_visible`].
pub fn tabbable<H: Host>(host: &H, container: H::Key) -> Vec<H::Key> {
    host.descendants(container)
        .into_iter()
        .filter(|&node| {
            host.props(node).is_some_and(|p| {
                p.tab_index >= 0
                    && !p.flags.intersects(
                        SurfaceFlags::DISABLED | SurfaceFlags::HIDDEN | SurfaceFlags::HIDDEN_INPUT,
                    )
            })
        })
        .collect()
}

/// Whether `node` is rendered, looking up to (but not past) `container`.
///
/// `node` must not be visibility-suppressed itself, and neither it nor any
/// ancestor below `container` may be display-suppressed.
pub fn is_visible<H: Host>(host: &H, node: H::Key, container: H::Key) -> bool {
    let flags = |n| host.props(n).map(|p| p.flags).unwrap_or_default();
    if flags(node).contains(SurfaceFlags::VISIBILITY_HIDDEN) {
        return false;
    }
    let mut current = Some(node);
    while let Some(n) = current {
        if n == container {
            break;
        }
        if flags(n).contains(SurfaceFlags::DISPLAY_NONE) {
            return false;
        }
        current = host.parent_of(n);
    }
    true
}

/// Visible tabbable descendants; the wrap boundaries of a focus scope.
pub fn visible_tabbable<H: Host>(host: &H, container: H::Key) -> Vec<H::Key> {
    tabbable(host, container)
        .into_iter()
        .filter(|&n| is_visible(host, n, container))
        .collect()
}

/// Where a newly activated scope moves focus when the caller gave no target.
///
/// Prefers the first visible tabbable surface that is not a link, then the
/// first visible tabbable surface of any kind. `None` means "the container".
pub(crate) fn auto_focus_target<H: Host>(host: &H, container: H::Key) -> Option<H::Key> {
    let candidates = visible_tabbable(host, container);
    let is_link = |n| {
        host.props(n)
            .is_some_and(|p| p.flags.contains(SurfaceFlags::LINK))
    };
    candidates
        .iter()
        .copied()
        .find(|&n| !is_link(n))
        .or_else(|| candidates.first().copied())
}

#[cfg(test)]
mod tests {
    use super::*;
    use overstory_surface::{Document, Surface, SurfaceProps};

    #[test]
    fn filters_disabled_hidden_and_negative_tab_index() {
        let mut doc = Document::new();
        let body = doc.body();
        let c = doc.insert(Some(body), Surface::container());
        let ok = doc.insert(Some(c), Surface::button("ok"));
        let disabled = doc.insert(Some(c), Surface::button("x"));
        doc.set_props(disabled, SurfaceProps::focusable().with(SurfaceFlags::DISABLED));
        let hidden_input = doc.insert(Some(c), Surface::button("h"));
        doc.set_props(
            hidden_input,
            SurfaceProps::focusable().with(SurfaceFlags::HIDDEN_INPUT),
        );
        let scripted = doc.insert(Some(c), Surface::container());
        let nested = doc.insert(Some(scripted), Surface::button("nested"));
        assert_eq!(tabbable(&doc, c), [ok, nested]);
    }

    #[test]
    fn display_none_ancestor_hides_descendants() {
        let mut doc = Document::new();
        let body = doc.body();
        let c = doc.insert(Some(body), Surface::container());
        let section = doc.insert(Some(c), Surface::default());
        doc.set_props(
            section,
            SurfaceProps::default().with(SurfaceFlags::DISPLAY_NONE),
        );
        let inside = doc.insert(Some(section), Surface::button("in"));
        let invisible = doc.insert(Some(c), Surface::button("vis"));
        doc.set_props(
            invisible,
            SurfaceProps::focusable().with(SurfaceFlags::VISIBILITY_HIDDEN),
        );
        let shown = doc.insert(Some(c), Surface::button("shown"));
        assert!(!is_visible(&doc, inside, c));
        assert!(!is_visible(&doc, invisible, c));
        assert_eq!(visible_tabbable(&doc, c), [shown]);
    }

    #[test]
    fn auto_focus_skips_links_when_possible() {
        let mut doc = Document::new();
        let body = doc.body();
        let c = doc.insert(Some(body), Surface::container());
        let link = doc.insert(Some(c), Surface::button("help"));
        doc.set_props(link, SurfaceProps::link());
        assert_eq!(auto_focus_target(&doc, c), Some(link));
        let button = doc.insert(Some(c), Surface::button("ok"));
        assert_eq!(auto_focus_target(&doc, c), Some(button));
        let empty = doc.insert(Some(body), Surface::container());
        assert_eq!(auto_focus_target(&doc, empty), None);
    }
}
