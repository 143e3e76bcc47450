// Copyright 2025 the Overstory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Runtime tunables.

use overstory_placement::DEFAULT_COLLISION_PADDING;

/// Timing and geometry defaults applied by a [`Runtime`](crate::Runtime).
///
/// Values can be overridden per call where the corresponding options struct
/// exposes them.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RuntimeConfig {
    /// Clamp padding used when a caller does not specify one.
    pub collision_padding: f64,
    /// Idle time after which a menu's typeahead buffer is cleared, in milliseconds.
    pub typeahead_reset_ms: u64,
    /// Time a closing overlay stays visible while waiting for its exit
    /// animation to report completion, in milliseconds.
    pub exit_fallback_ms: u64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            collision_padding: DEFAULT_COLLISION_PADDING,
            typeahead_reset_ms: 1000,
            exit_fallback_ms: 250,
        }
    }
}
