//! Bit-parallel approximate string matching
//!
//! Locates the occurrence of a pattern closest to an expected position,
//! tolerating errors. A candidate's score mixes its error count with its
//! distance from the expected position; the best-scoring candidate below
//! the configured threshold wins.

use crate::{options::Options, text};
use std::collections::HashMap;

impl Options {
    /// Locate the occurrence of `pattern` in `text` nearest `loc`, allowing
    /// for errors.
    ///
    /// Returns the index of the best match in UTF-16 code units, or `None`
    /// when nothing scores below `match_threshold`. An empty pattern
    /// matches at `loc`.
    ///
    /// # Panics
    ///
    /// Panics if an inexact search is required for a pattern longer than
    /// `match_max_bits` units.
    ///
    /// ```
    /// use mend::Options;
    ///
    /// let options = Options::new();
    /// assert_eq!(options.locate("abcdefghijk", "fgh", 0), Some(5));
    /// assert_eq!(options.locate("abcdefghijk", "efxhi", 0), Some(4));
    /// ```
    pub fn locate(&self, text: &str, pattern: &str, loc: usize) -> Option<usize> {
        let text = text::to_units(text);
        let pattern = text::to_units(pattern);
        locate_units(self, &text, &pattern, loc)
    }
}

/// Locate the occurrence of `pattern` in `text` nearest `loc` using default
/// [`Options`].
pub fn locate(text: &str, pattern: &str, loc: usize) -> Option<usize> {
    Options::new().locate(text, pattern, loc)
}

pub(crate) fn locate_units(
    options: &Options,
    text: &[u16],
    pattern: &[u16],
    loc: usize,
) -> Option<usize> {
    let loc = loc.min(text.len());
    if text == pattern {
        // Shortcut (potentially not guaranteed by the algorithm).
        return Some(0);
    }
    if text.is_empty() {
        // Nothing to match.
        return None;
    }
    if loc + pattern.len() <= text.len() && text[loc..loc + pattern.len()] == *pattern {
        // Perfect match at the perfect spot!
        return Some(loc);
    }
    // Do a fuzzy compare.
    bitap(options, text, pattern, loc)
}

fn bitap(options: &Options, text: &[u16], pattern: &[u16], loc: usize) -> Option<usize> {
    assert!(
        pattern.len() <= options.match_max_bits,
        "pattern longer than the bit vector"
    );

    // Initialise the alphabet.
    let alphabet = alphabet(pattern);

    // Highest score beyond which we give up.
    let mut score_threshold = options.match_threshold;
    // Is there a nearby exact match? (speedup)
    if let Some(best) = text::find_sub(text, pattern, loc) {
        score_threshold = score(options, 0, best, loc, pattern.len()).min(score_threshold);
        // What about in the other direction? (speedup)
        if let Some(best) = text::rfind_sub(text, pattern, loc + pattern.len()) {
            score_threshold = score(options, 0, best, loc, pattern.len()).min(score_threshold);
        }
    }

    // Initialise the bit arrays.
    let match_mask: u64 = 1 << (pattern.len() - 1);
    let mut best_loc: Option<usize> = None;

    let mut bin_max = pattern.len() + text.len();
    let mut last_rd: Vec<u64> = Vec::new();
    for d in 0..pattern.len() {
        // Scan for the best match; each iteration allows for one more
        // error. Run a binary search to determine how far from 'loc' we can
        // stray at this error level.
        let mut bin_min = 0;
        let mut bin_mid = bin_max;
        while bin_min < bin_mid {
            if score(options, d, loc + bin_mid, loc, pattern.len()) <= score_threshold {
                bin_min = bin_mid;
            } else {
                bin_max = bin_mid;
            }
            bin_mid = (bin_max - bin_min) / 2 + bin_min;
        }
        // Use the result from this iteration as the maximum for the next.
        bin_max = bin_mid;
        let mut start = if loc + 1 > bin_mid { loc + 1 - bin_mid } else { 1 };
        let finish = (loc + bin_mid).min(text.len()) + pattern.len();

        let mut rd = vec![0u64; finish + 2];
        rd[finish + 1] = (1 << d) - 1;
        let mut j = finish;
        while j >= start {
            let char_match = if text.len() < j {
                // Out of range.
                0
            } else {
                alphabet.get(&text[j - 1]).copied().unwrap_or(0)
            };
            let last = |index: usize| last_rd.get(index).copied().unwrap_or(0);
            rd[j] = if d == 0 {
                // First pass: exact match.
                ((rd[j + 1] << 1) | 1) & char_match
            } else {
                // Subsequent passes: fuzzy match.
                (((rd[j + 1] << 1) | 1) & char_match)
                    | (((last(j + 1) | last(j)) << 1) | 1)
                    | last(j + 1)
            };
            if rd[j] & match_mask != 0 {
                let this_score = score(options, d, j - 1, loc, pattern.len());
                // This match will almost certainly be better than any
                // existing match, but check anyway.
                if this_score <= score_threshold {
                    // Told you so.
                    score_threshold = this_score;
                    let this_loc = j - 1;
                    best_loc = Some(this_loc);
                    if this_loc > loc {
                        // When passing loc, don't exceed our current
                        // distance from loc.
                        start = if 2 * loc > this_loc {
                            (2 * loc - this_loc).max(1)
                        } else {
                            1
                        };
                    } else {
                        // Already passed loc, downhill from here on in.
                        break;
                    }
                }
            }
            j -= 1;
        }
        // No hope for a (better) match at greater error levels.
        if score(options, d + 1, loc, loc, pattern.len()) > score_threshold {
            break;
        }
        last_rd = rd;
    }
    best_loc
}

// Compute and return the score for a match with `errors` errors found at
// `x`. 0.0 is a perfect match, 1.0 a terrible one.
fn score(options: &Options, errors: usize, x: usize, loc: usize, pattern_len: usize) -> f64 {
    let accuracy = errors as f64 / pattern_len as f64;
    let proximity = loc.abs_diff(x);
    if options.match_distance == 0 {
        // Dodge divide by zero.
        return if proximity == 0 { accuracy } else { 1.0 };
    }
    accuracy + proximity as f64 / options.match_distance as f64
}

// Initialise the alphabet for the bit-parallel search: a mask per distinct
// unit marking the positions at which it occurs in the pattern.
fn alphabet(pattern: &[u16]) -> HashMap<u16, u64> {
    let mut masks = HashMap::with_capacity(pattern.len());
    for (i, &unit) in pattern.iter().enumerate() {
        *masks.entry(unit).or_insert(0) |= 1 << (pattern.len() - i - 1);
    }
    masks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn units(text: &str) -> Vec<u16> {
        text::to_units(text)
    }

    #[test]
    fn alphabet_unique() {
        let expected: HashMap<u16, u64> =
            [(b'a' as u16, 4), (b'b' as u16, 2), (b'c' as u16, 1)].into();
        assert_eq!(alphabet(&units("abc")), expected);
    }

    #[test]
    fn alphabet_duplicates() {
        let expected: HashMap<u16, u64> =
            [(b'a' as u16, 37), (b'b' as u16, 18), (b'c' as u16, 8)].into();
        assert_eq!(alphabet(&units("abcaba")), expected);
    }

    fn bitap_with(options: &Options, text: &str, pattern: &str, loc: usize) -> Option<usize> {
        bitap(options, &units(text), &units(pattern), loc)
    }

    #[test]
    fn bitap_matching() {
        let mut options = Options::new();
        options.set_match_distance(100).set_match_threshold(0.5);

        // Exact matches.
        assert_eq!(bitap_with(&options, "abcdefghijk", "fgh", 5), Some(5));
        assert_eq!(bitap_with(&options, "abcdefghijk", "fgh", 0), Some(5));

        // Fuzzy matches.
        assert_eq!(bitap_with(&options, "abcdefghijk", "efxhi", 0), Some(4));
        assert_eq!(bitap_with(&options, "abcdefghijk", "cdefxyhijk", 5), Some(2));
        assert_eq!(bitap_with(&options, "abcdefghijk", "bxy", 1), None);

        // Overflow.
        assert_eq!(bitap_with(&options, "123456789xx0", "3456789x0", 2), Some(2));

        // Edges.
        assert_eq!(bitap_with(&options, "abcdef", "xxabc", 4), Some(0));
        assert_eq!(bitap_with(&options, "abcdef", "defyy", 4), Some(3));
        assert_eq!(bitap_with(&options, "abcdef", "xabcdefy", 0), Some(0));
    }

    #[test]
    fn bitap_threshold() {
        let mut options = Options::new();
        options.set_match_distance(100).set_match_threshold(0.4);
        assert_eq!(bitap_with(&options, "abcdefghijk", "efxyhi", 1), Some(4));

        options.set_match_threshold(0.3);
        assert_eq!(bitap_with(&options, "abcdefghijk", "efxyhi", 1), None);

        options.set_match_threshold(0.0);
        assert_eq!(bitap_with(&options, "abcdefghijk", "bcdef", 1), Some(1));
    }

    #[test]
    fn bitap_multiple_select() {
        let mut options = Options::new();
        options.set_match_distance(100).set_match_threshold(0.5);
        assert_eq!(bitap_with(&options, "abcdexyzabcde", "abccde", 3), Some(0));
        assert_eq!(bitap_with(&options, "abcdexyzabcde", "abccde", 5), Some(8));
    }

    #[test]
    fn bitap_distance() {
        let mut options = Options::new();
        // Strict location.
        options.set_match_distance(10);
        assert_eq!(
            bitap_with(&options, "abcdefghijklmnopqrstuvwxyz", "abcdefg", 24),
            None
        );
        assert_eq!(
            bitap_with(&options, "abcdefghijklmnopqrstuvwxyz", "abcdxxefg", 1),
            Some(0)
        );
        // Loose location.
        options.set_match_distance(1000);
        assert_eq!(
            bitap_with(&options, "abcdefghijklmnopqrstuvwxyz", "abcdefg", 24),
            Some(0)
        );
    }

    #[test]
    fn locate_shortcuts() {
        let options = Options::new();
        assert_eq!(options.locate("abcdef", "abcdef", 1000), Some(0));
        assert_eq!(options.locate("", "abcdef", 1), None);
        assert_eq!(options.locate("abcdef", "", 3), Some(3));
        assert_eq!(options.locate("abcdef", "de", 3), Some(3));
    }

    #[test]
    fn locate_complex() {
        let mut options = Options::new();
        options.set_match_threshold(0.7);
        assert_eq!(
            options.locate("I am the very model of a modern major general.", " that berry ", 5),
            Some(4)
        );
    }
}
