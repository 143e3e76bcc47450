// Copyright 2025 the Overstory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Input delivered by the host and the runtime's response to it.

use kurbo::Point;

use crate::dismiss::LayerHandle;

/// Logical keys the runtime reacts to.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum KeyCode {
    /// Sequential focus navigation.
    Tab,
    /// The cancel key.
    Escape,
    /// Activation.
    Enter,
    /// Activation, or part of a typeahead string while one is in progress.
    Space,
    /// Up arrow.
    ArrowUp,
    /// Down arrow.
    ArrowDown,
    /// Left arrow.
    ArrowLeft,
    /// Right arrow.
    ArrowRight,
    /// Jump to the first item.
    Home,
    /// Jump to the last item.
    End,
    /// A printable character.
    Character(char),
    /// Anything else; ignored by the runtime.
    Other,
}

bitflags::bitflags! {
    /// Modifier keys held during a key press.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Modifiers: u8 {
        /// Shift.
        const SHIFT = 0b0001;
        /// Control.
        const CTRL  = 0b0010;
        /// Alt / Option.
        const ALT   = 0b0100;
        /// Meta / Command.
        const META  = 0b1000;
    }
}

impl Modifiers {
    /// Returns `true` if any of Control, Alt, or Meta is held.
    pub fn has_command(self) -> bool {
        self.intersects(Self::CTRL | Self::ALT | Self::META)
    }
}

/// An input event delivered by the host.
///
/// Events are processed synchronously by [`Runtime::handle_event`](crate::Runtime::handle_event).
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum InputEvent<K> {
    /// A pointer was pressed over `target`.
    PointerDown {
        /// Deepest surface under the pointer.
        target: K,
        /// Viewport position.
        position: Point,
    },
    /// The pointer moved; `target` is `None` when it left every surface.
    PointerMove {
        /// Deepest surface under the pointer.
        target: Option<K>,
        /// Viewport position.
        position: Point,
    },
    /// A completed click (press and release over the same surface).
    Click {
        /// Clicked surface.
        target: K,
    },
    /// A key was pressed while focus was wherever [`Host::focused`](overstory_surface::Host::focused) says.
    KeyDown {
        /// Logical key.
        key: KeyCode,
        /// Held modifiers.
        modifiers: Modifiers,
    },
    /// Focus moved to `target` by means the runtime did not initiate.
    FocusIn {
        /// Newly focused surface.
        target: K,
    },
    /// Something scrolled.
    Scroll,
    /// The viewport was resized.
    Resize,
    /// An exit animation on `surface` finished.
    ExitAnimationEnd(K),
}

/// What the runtime did with an event.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct EventResponse {
    /// The host must suppress its default behavior for the event.
    pub default_prevented: bool,
    /// The event landed outside the interactive region while pointer isolation
    /// is active; the host must not deliver it to the target.
    pub pointer_suppressed: bool,
    /// A dismiss layer owned by the caller asked to be dismissed.
    pub dismissed: Option<LayerHandle>,
}

impl EventResponse {
    pub(crate) fn prevented() -> Self {
        Self {
            default_prevented: true,
            ..Self::default()
        }
    }
}

/// Why a dismiss layer is being asked to close.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum DismissReason {
    /// The cancel key was pressed while the layer was topmost.
    CancelKey,
    /// A pointer went down outside the topmost layer.
    OutsidePointer,
}

/// A dismiss attempt handed to caller hooks, which may veto it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Interaction<K> {
    /// What triggered the attempt.
    pub reason: DismissReason,
    /// Pointer target for [`DismissReason::OutsidePointer`].
    pub target: Option<K>,
    default_prevented: bool,
}

impl<K> Interaction<K> {
    pub(crate) fn new(reason: DismissReason, target: Option<K>) -> Self {
        Self {
            reason,
            target,
            default_prevented: false,
        }
    }

    /// Veto the dismissal.
    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    /// Returns `true` once [`Interaction::prevent_default`] has been called.
    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }
}
