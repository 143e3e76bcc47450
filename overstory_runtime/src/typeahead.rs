// Copyright 2025 the Overstory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Typeahead matching for menu items.

use alloc::string::String;

/// Collapse a buffer made of one repeated character to that character.
///
/// Pressing the same key repeatedly cycles through items sharing that first
/// letter rather than searching for "aaa".
pub(crate) fn normalize(buffer: &str) -> &str {
    let mut chars = buffer.char_indices();
    let Some((_, first)) = chars.next() else {
        return buffer;
    };
    if chars.all(|(_, c)| c == first) {
        &buffer[..first.len_utf8()]
    } else {
        buffer
    }
}

/// Find the candidate whose text starts with `buffer`, case-insensitively.
///
/// Candidates are searched in order starting at `current`, wrapping around.
/// A single-character search skips `current` and only comes back to it when
/// nothing else matches; longer searches include it first so that typing more
/// characters refines the current match.
pub(crate) fn next_match<S: AsRef<str>>(
    candidates: &[S],
    current: Option<usize>,
    buffer: &str,
) -> Option<usize> {
    let search: String = normalize(buffer).to_lowercase();
    if search.is_empty() || candidates.is_empty() {
        return None;
    }
    let n = candidates.len();
    let start = current.filter(|&c| c < n).unwrap_or(0);
    let matches = |i: usize| {
        candidates[i]
            .as_ref()
            .trim_start()
            .to_lowercase()
            .starts_with(&search)
    };
    let single = search.chars().count() == 1 && current.is_some();
    let mut order = (0..n).map(|k| (start + k) % n);
    if single {
        order.skip(1).find(|&i| matches(i)).or_else(|| matches(start).then_some(start))
    } else {
        order.find(|&i| matches(i))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRUIT: [&str; 4] = ["Apple", "Apricot", "Banana", "avocado"];

    #[test]
    fn repeated_characters_collapse() {
        assert_eq!(normalize("aaa"), "a");
        assert_eq!(normalize("ap"), "ap");
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("éé"), "é");
    }

    #[test]
    fn single_character_cycles_through_matches() {
        assert_eq!(next_match(&FRUIT, Some(0), "a"), Some(1));
        assert_eq!(next_match(&FRUIT, Some(1), "aa"), Some(3));
        assert_eq!(next_match(&FRUIT, Some(3), "aaa"), Some(0));
    }

    #[test]
    fn single_match_falls_back_to_current() {
        assert_eq!(next_match(&FRUIT, Some(2), "b"), Some(2));
        assert_eq!(next_match(&FRUIT, Some(2), "z"), None);
    }

    #[test]
    fn longer_search_refines_from_current() {
        assert_eq!(next_match(&FRUIT, Some(0), "ap"), Some(0));
        assert_eq!(next_match(&FRUIT, Some(0), "apr"), Some(1));
        assert_eq!(next_match(&FRUIT, None, "b"), Some(2));
    }
}
