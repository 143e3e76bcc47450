// Copyright 2025 the Overstory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Generational slot storage shared by every runtime registry.
//!
//! A [`Slot`] names an entry together with the generation it was created in.
//! Once the entry is removed the slot goes stale: lookups return `None` and
//! removal is a no-op, even after the index is reused.

use alloc::vec::Vec;

/// Generational index into an [`Arena`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) struct Slot(u32, u32);

impl Slot {
    const fn idx(self) -> usize {
        self.0 as usize
    }
}

#[derive(Clone, Debug)]
pub(crate) struct Arena<T> {
    entries: Vec<Option<(u32, T)>>,
    generations: Vec<u32>,
    free_list: Vec<usize>,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            generations: Vec::new(),
            free_list: Vec::new(),
        }
    }
}

impl<T> Arena<T> {
    pub(crate) fn insert(&mut self, value: T) -> Slot {
        if let Some(idx) = self.free_list.pop() {
            let generation = self.generations[idx].saturating_add(1);
            self.generations[idx] = generation;
            self.entries[idx] = Some((generation, value));
            #[allow(
                clippy::cast_possible_truncation,
                reason = "Slot uses 32-bit indices."
            )]
            Slot(idx as u32, generation)
        } else {
            self.entries.push(Some((1, value)));
            self.generations.push(1);
            #[allow(
                clippy::cast_possible_truncation,
                reason = "Slot uses 32-bit indices."
            )]
            Slot((self.entries.len() - 1) as u32, 1)
        }
    }

    pub(crate) fn remove(&mut self, slot: Slot) -> Option<T> {
        let entry = self.entries.get_mut(slot.idx())?;
        if entry.as_ref().is_none_or(|(g, _)| *g != slot.1) {
            return None;
        }
        let (_, value) = entry.take()?;
        self.free_list.push(slot.idx());
        Some(value)
    }

    pub(crate) fn get(&self, slot: Slot) -> Option<&T> {
        self.entries
            .get(slot.idx())
            .and_then(|e| e.as_ref())
            .filter(|(g, _)| *g == slot.1)
            .map(|(_, v)| v)
    }

    pub(crate) fn get_mut(&mut self, slot: Slot) -> Option<&mut T> {
        self.entries
            .get_mut(slot.idx())
            .and_then(|e| e.as_mut())
            .filter(|(g, _)| *g == slot.1)
            .map(|(_, v)| v)
    }

    pub(crate) fn contains(&self, slot: Slot) -> bool {
        self.get(slot).is_some()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len() - self.free_list.len()
    }

    /// Live entries in index order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = (Slot, &T)> {
        self.entries.iter().enumerate().filter_map(|(idx, e)| {
            e.as_ref().map(|(g, v)| {
                #[allow(
                    clippy::cast_possible_truncation,
                    reason = "Slot uses 32-bit indices."
                )]
                (Slot(idx as u32, *g), v)
            })
        })
    }

    pub(crate) fn slots(&self) -> Vec<Slot> {
        self.iter().map(|(s, _)| s).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removed_slots_go_stale_after_reuse() {
        let mut arena = Arena::default();
        let a = arena.insert("a");
        assert_eq!(arena.remove(a), Some("a"));
        let b = arena.insert("b");
        assert_eq!(a.idx(), b.idx());
        assert!(arena.get(a).is_none());
        assert!(arena.remove(a).is_none());
        assert_eq!(arena.get(b), Some(&"b"));
        assert_eq!(arena.len(), 1);
    }

    #[test]
    fn iter_skips_free_entries() {
        let mut arena = Arena::default();
        let a = arena.insert(1);
        let b = arena.insert(2);
        let c = arena.insert(3);
        arena.remove(b);
        let live: Vec<_> = arena.iter().map(|(s, v)| (s, *v)).collect();
        assert_eq!(live, [(a, 1), (c, 3)]);
    }
}
