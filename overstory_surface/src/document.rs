// Copyright 2025 the Overstory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! In-memory reference host: a generational surface tree that records effects.

use alloc::string::String;
use alloc::vec::Vec;

use kurbo::{Point, Rect, Size};
use overstory_placement::{Align, Side};

use crate::Host;
use crate::types::{Attribute, OpenState, SurfaceFlags, SurfaceProps};

/// Identifier for a surface in a [`Document`] (generational).
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct SurfaceId(u32, u32);

impl SurfaceId {
    const fn idx(self) -> usize {
        self.0 as usize
    }
}

/// Data supplied when inserting a surface.
#[derive(Clone, Debug)]
pub struct Surface {
    /// Bounds in viewport coordinates.
    pub bounds: Rect,
    /// Focus properties.
    pub props: SurfaceProps,
    /// Own text; [`Host::text_content`] concatenates it with descendants' text.
    pub text: String,
}

impl Default for Surface {
    fn default() -> Self {
        Self {
            bounds: Rect::ZERO,
            props: SurfaceProps::default(),
            text: String::new(),
        }
    }
}

impl Surface {
    /// A focusable control with the given text.
    pub fn button(text: &str) -> Self {
        Self {
            props: SurfaceProps::focusable(),
            text: String::from(text),
            ..Self::default()
        }
    }

    /// A container that takes focus by script only.
    pub fn container() -> Self {
        Self {
            props: SurfaceProps::programmatic(),
            ..Self::default()
        }
    }
}

/// Presentation attributes last written onto a surface.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Attributes {
    /// Last [`Attribute::Visible`] write.
    pub visible: Option<bool>,
    /// Last [`Attribute::Interactive`] write.
    pub interactive: Option<bool>,
    /// Last [`Attribute::Position`] write.
    pub position: Option<Point>,
    /// Last [`Attribute::Placement`] write.
    pub placement: Option<(Side, Align)>,
    /// Last [`Attribute::Highlighted`] write.
    pub highlighted: bool,
    /// Last [`Attribute::Checked`] write.
    pub checked: Option<bool>,
    /// Last [`Attribute::State`] write.
    pub state: Option<OpenState>,
    /// Last [`Attribute::Expanded`] write.
    pub expanded: Option<bool>,
}

#[derive(Clone, Debug)]
struct Node {
    generation: u32,
    parent: Option<SurfaceId>,
    children: Vec<SurfaceId>,
    surface: Surface,
    attributes: Attributes,
}

/// In-memory surface tree implementing [`Host`].
///
/// A `Document` starts with a single root, the [`Document::body`]. Stale
/// [`SurfaceId`]s are ignored by every method.
#[derive(Clone, Debug)]
pub struct Document {
    nodes: Vec<Option<Node>>,
    generations: Vec<u32>,
    free_list: Vec<usize>,
    body: SurfaceId,
    viewport: Size,
    scrollbar_width: f64,
    focused: Option<SurfaceId>,
    focus_log: Vec<SurfaceId>,
    guards: Option<(SurfaceId, SurfaceId)>,
    scroll_compensation: Option<f64>,
    pointer_isolation: Option<SurfaceId>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create a document with an 800×600 viewport and an empty body.
    pub fn new() -> Self {
        Self::with_viewport(Size::new(800.0, 600.0))
    }

    /// Create a document with the given viewport size.
    pub fn with_viewport(viewport: Size) -> Self {
        let mut doc = Self {
            nodes: Vec::new(),
            generations: Vec::new(),
            free_list: Vec::new(),
            body: SurfaceId(0, 0),
            viewport,
            scrollbar_width: 0.0,
            focused: None,
            focus_log: Vec::new(),
            guards: None,
            scroll_compensation: None,
            pointer_isolation: None,
        };
        doc.body = doc.insert(
            None,
            Surface {
                bounds: Rect::from_origin_size(Point::ZERO, viewport),
                ..Surface::default()
            },
        );
        doc
    }

    /// The root surface.
    pub fn body(&self) -> SurfaceId {
        self.body
    }

    /// Insert a new surface as the last child of `parent` (or as a detached root).
    pub fn insert(&mut self, parent: Option<SurfaceId>, surface: Surface) -> SurfaceId {
        let node = |generation| Node {
            generation,
            parent: None,
            children: Vec::new(),
            surface,
            attributes: Attributes::default(),
        };
        let id = if let Some(idx) = self.free_list.pop() {
            let generation = self.generations[idx].saturating_add(1);
            self.generations[idx] = generation;
            self.nodes[idx] = Some(node(generation));
            #[allow(
                clippy::cast_possible_truncation,
                reason = "SurfaceId uses 32-bit indices by design."
            )]
            SurfaceId(idx as u32, generation)
        } else {
            self.nodes.push(Some(node(1)));
            self.generations.push(1);
            #[allow(
                clippy::cast_possible_truncation,
                reason = "SurfaceId uses 32-bit indices by design."
            )]
            SurfaceId((self.nodes.len() - 1) as u32, 1)
        };
        if let Some(p) = parent
            && self.is_alive(p)
        {
            self.link(id, p, None);
        }
        id
    }

    /// Remove a surface and its subtree. Focus inside the subtree is dropped.
    pub fn remove(&mut self, id: SurfaceId) {
        if !self.is_alive(id) {
            return;
        }
        if let Some(parent) = self.node(id).and_then(|n| n.parent) {
            self.unlink(id, parent);
        }
        let mut stack = alloc::vec![id];
        while let Some(n) = stack.pop() {
            if let Some(node) = self.nodes[n.idx()].take() {
                stack.extend(node.children);
                self.free_list.push(n.idx());
                if self.focused == Some(n) {
                    self.focused = None;
                }
            }
        }
    }

    /// Returns true if `id` refers to a live surface.
    pub fn is_alive(&self, id: SurfaceId) -> bool {
        self.node(id).is_some()
    }

    /// Replace the bounds of a surface.
    pub fn set_bounds(&mut self, id: SurfaceId, bounds: Rect) {
        if let Some(n) = self.node_mut(id) {
            n.surface.bounds = bounds;
        }
    }

    /// Replace the focus properties of a surface.
    pub fn set_props(&mut self, id: SurfaceId, props: SurfaceProps) {
        if let Some(n) = self.node_mut(id) {
            n.surface.props = props;
        }
    }

    /// Resize the viewport.
    pub fn set_viewport(&mut self, viewport: Size) {
        self.viewport = viewport;
    }

    /// Set the width reported by [`Host::scrollbar_width`].
    pub fn set_scrollbar_width(&mut self, width: f64) {
        self.scrollbar_width = width;
    }

    /// Attributes last written onto `id`.
    pub fn attributes(&self, id: SurfaceId) -> Option<&Attributes> {
        self.node(id).map(|n| &n.attributes)
    }

    /// Every successful focus move, oldest first.
    pub fn focus_log(&self) -> &[SurfaceId] {
        &self.focus_log
    }

    /// The guard sentinels, if installed.
    pub fn focus_guards(&self) -> Option<(SurfaceId, SurfaceId)> {
        self.guards
    }

    /// The scroll compensation applied while scroll is frozen.
    pub fn scroll_frozen(&self) -> Option<f64> {
        self.scroll_compensation
    }

    /// The only surface that accepts pointer input while isolation is active.
    pub fn pointer_isolation(&self) -> Option<SurfaceId> {
        self.pointer_isolation
    }

    fn node(&self, id: SurfaceId) -> Option<&Node> {
        self.nodes
            .get(id.idx())
            .and_then(|n| n.as_ref())
            .filter(|n| n.generation == id.1)
    }

    fn node_mut(&mut self, id: SurfaceId) -> Option<&mut Node> {
        self.nodes
            .get_mut(id.idx())
            .and_then(|n| n.as_mut())
            .filter(|n| n.generation == id.1)
    }

    fn link(&mut self, id: SurfaceId, parent: SurfaceId, at: Option<usize>) {
        if let Some(p) = self.node_mut(parent) {
            match at {
                Some(i) => p.children.insert(i.min(p.children.len()), id),
                None => p.children.push(id),
            }
        }
        if let Some(n) = self.node_mut(id) {
            n.parent = Some(parent);
        }
    }

    fn unlink(&mut self, id: SurfaceId, parent: SurfaceId) {
        if let Some(p) = self.node_mut(parent) {
            p.children.retain(|c| *c != id);
        }
        if let Some(n) = self.node_mut(id) {
            n.parent = None;
        }
    }

    fn guard_surface() -> Surface {
        Surface {
            props: SurfaceProps::focusable().with(SurfaceFlags::FOCUS_GUARD),
            ..Surface::default()
        }
    }
}

impl Host for Document {
    type Key = SurfaceId;

    fn parent_of(&self, node: SurfaceId) -> Option<SurfaceId> {
        self.node(node).and_then(|n| n.parent)
    }

    fn children_of(&self, node: SurfaceId) -> &[SurfaceId] {
        self.node(node).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    fn bounds(&self, node: SurfaceId) -> Option<Rect> {
        self.node(node).map(|n| n.surface.bounds)
    }

    fn viewport(&self) -> Size {
        self.viewport
    }

    fn scrollbar_width(&self) -> f64 {
        self.scrollbar_width
    }

    fn props(&self, node: SurfaceId) -> Option<SurfaceProps> {
        self.node(node).map(|n| n.surface.props)
    }

    fn text_content(&self, node: SurfaceId) -> String {
        let mut out = String::new();
        if let Some(n) = self.node(node) {
            out.push_str(&n.surface.text);
        }
        for d in self.descendants(node) {
            if let Some(n) = self.node(d) {
                out.push_str(&n.surface.text);
            }
        }
        out
    }

    fn focused(&self) -> Option<SurfaceId> {
        self.focused
    }

    fn can_focus(&self, node: SurfaceId) -> bool {
        self.node(node).is_some_and(|n| {
            let flags = n.surface.props.flags;
            flags.contains(SurfaceFlags::FOCUSABLE)
                && !flags.intersects(SurfaceFlags::DISABLED | SurfaceFlags::HIDDEN_INPUT)
        })
    }

    fn focus(&mut self, node: SurfaceId) -> bool {
        if !self.can_focus(node) {
            return false;
        }
        self.focused = Some(node);
        self.focus_log.push(node);
        true
    }

    fn set_attribute(&mut self, node: SurfaceId, attribute: Attribute) {
        let Some(n) = self.node_mut(node) else {
            return;
        };
        let attrs = &mut n.attributes;
        match attribute {
            Attribute::Visible(v) => attrs.visible = Some(v),
            Attribute::Interactive(v) => attrs.interactive = Some(v),
            Attribute::Position(p) => {
                attrs.position = Some(p);
                n.surface.bounds = Rect::from_origin_size(p, n.surface.bounds.size());
            }
            Attribute::Placement { side, align } => attrs.placement = Some((side, align)),
            Attribute::Highlighted(v) => attrs.highlighted = v,
            Attribute::Checked(v) => attrs.checked = Some(v),
            Attribute::State(s) => attrs.state = Some(s),
            Attribute::Expanded(v) => attrs.expanded = Some(v),
        }
    }

    fn set_pointer_isolation(&mut self, interactive: Option<SurfaceId>) {
        self.pointer_isolation = interactive;
    }

    fn freeze_scroll(&mut self, compensation: f64) {
        self.scroll_compensation = Some(compensation);
    }

    fn unfreeze_scroll(&mut self) {
        self.scroll_compensation = None;
    }

    fn insert_focus_guards(&mut self) {
        if self.guards.is_some() {
            return;
        }
        let body = self.body;
        let first = self.insert(None, Self::guard_surface());
        self.link(first, body, Some(0));
        let last = self.insert(Some(body), Self::guard_surface());
        self.guards = Some((first, last));
    }

    fn remove_focus_guards(&mut self) {
        if let Some((first, last)) = self.guards.take() {
            self.remove(first);
            self.remove(last);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn stale_ids_are_ignored_after_slot_reuse() {
        let mut doc = Document::new();
        let body = doc.body();
        let a = doc.insert(Some(body), Surface::button("a"));
        doc.remove(a);
        let b = doc.insert(Some(body), Surface::button("b"));
        assert!(!doc.is_alive(a), "removed id must be stale");
        assert!(doc.is_alive(b));
        assert!(!doc.focus(a));
        assert_eq!(doc.children_of(body), &[b]);
    }

    #[test]
    fn descendants_are_in_document_order() {
        let mut doc = Document::new();
        let body = doc.body();
        let a = doc.insert(Some(body), Surface::default());
        let a1 = doc.insert(Some(a), Surface::default());
        let a2 = doc.insert(Some(a), Surface::default());
        let b = doc.insert(Some(body), Surface::default());
        assert_eq!(doc.descendants(body), vec![a, a1, a2, b]);
        assert!(doc.contains(a, a2));
        assert!(!doc.contains(a, b));
    }

    #[test]
    fn guards_sit_at_both_extremities() {
        let mut doc = Document::new();
        let body = doc.body();
        let content = doc.insert(Some(body), Surface::default());
        doc.insert_focus_guards();
        let (first, last) = doc.focus_guards().unwrap();
        assert_eq!(doc.children_of(body), &[first, content, last]);
        doc.remove_focus_guards();
        assert_eq!(doc.children_of(body), &[content]);
        assert!(!doc.is_alive(first));
    }

    #[test]
    fn position_attribute_moves_bounds() {
        let mut doc = Document::new();
        let body = doc.body();
        let pop = doc.insert(
            Some(body),
            Surface {
                bounds: Rect::new(0.0, 0.0, 50.0, 20.0),
                ..Surface::default()
            },
        );
        doc.set_attribute(pop, Attribute::Position(Point::new(10.0, 30.0)));
        assert_eq!(doc.bounds(pop), Some(Rect::new(10.0, 30.0, 60.0, 50.0)));
        assert_eq!(
            doc.attributes(pop).unwrap().position,
            Some(Point::new(10.0, 30.0))
        );
    }

    #[test]
    fn text_content_concatenates_subtree() {
        let mut doc = Document::new();
        let body = doc.body();
        let item = doc.insert(Some(body), Surface::button("Ap"));
        doc.insert(
            Some(item),
            Surface {
                text: String::from("ple"),
                ..Surface::default()
            },
        );
        assert_eq!(doc.text_content(item), "Apple");
    }

    #[test]
    fn disabled_surfaces_refuse_focus() {
        let mut doc = Document::new();
        let body = doc.body();
        let b = doc.insert(Some(body), Surface::button("b"));
        doc.set_props(b, SurfaceProps::focusable().with(SurfaceFlags::DISABLED));
        assert!(!doc.can_focus(b));
        assert!(!doc.focus(b));
        assert!(doc.focus_log().is_empty());
    }
}
