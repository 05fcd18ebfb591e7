mod format;
mod parse;


pub use parse::ParsePatchError;

use crate::{
    bitap,
    diff::{self, Diff},
    options::Options,
    text,
};
use std::time::Instant;

/// A contiguous hunk of change
///
/// Bundles a diff local to the hunk with the hunk's position and span in
/// the source (`old_range`) and destination (`new_range`) texts, including
/// the context equalities used to re-anchor the hunk at apply time.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct Hunk {
    diffs: Vec<Diff>,
    old_range: HunkRange,
    new_range: HunkRange,
}

impl Hunk {
    /// Returns the edit operations in the hunk
    pub fn diffs(&self) -> &[Diff] {
        &self.diffs
    }

    /// Returns the corresponding range for the source text of the hunk
    pub fn old_range(&self) -> HunkRange {
        self.old_range
    }

    /// Returns the corresponding range for the destination text of the hunk
    pub fn new_range(&self) -> HunkRange {
        self.new_range
    }
}

/// The range of a hunk in either the source or destination text
///
/// `start` is 0-based and `len` counts UTF-16 code units. The `Display`
/// impl renders the 1-based wire form used in hunk headers.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub struct HunkRange {
    start: usize,
    len: usize,
}

impl HunkRange {
    pub(crate) fn new(start: usize, len: usize) -> Self {
        Self { start, len }
    }

    /// Returns the starting position of the range
    pub fn start(&self) -> usize {
        self.start
    }

    /// Returns the number of units spanned by the range
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the range spans no units
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// An ordered list of hunks turning a source text into a destination text
///
/// Produced by the `create_patch` family, serialized with `Display` and
/// parsed back with [`str::parse`]. Positions of successive hunks are
/// monotonically non-decreasing in both texts.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct Patch {
    hunks: Vec<Hunk>,
}

impl Patch {
    /// Returns the hunks in the patch
    pub fn hunks(&self) -> &[Hunk] {
        &self.hunks
    }

    /// Returns `true` if the patch contains no hunks
    pub fn is_empty(&self) -> bool {
        self.hunks.is_empty()
    }
}

impl Options {
    /// Compute a patch turning `original` into `modified`.
    ///
    /// A diff is computed and semantically cleaned up before the hunks are
    /// built.
    ///
    /// ```
    /// use mend::Options;
    ///
    /// let patch = Options::new().create_patch(
    ///     "The quick brown fox jumps over the lazy dog.",
    ///     "That quick brown fox jumped over a lazy dog.",
    /// );
    /// assert_eq!(
    ///     patch.to_string(),
    ///     "@@ -1,11 +1,12 @@\n Th\n-e\n+at\n  quick b\n\
    ///      @@ -22,18 +22,17 @@\n jump\n-s\n+ed\n  over \n-the\n+a\n  laz\n",
    /// );
    /// ```
    pub fn create_patch(&self, original: &str, modified: &str) -> Patch {
        let original = text::to_units(original);
        let modified = text::to_units(modified);
        let deadline = self.diff_timeout.map(|timeout| Instant::now() + timeout);
        let mut diffs = diff::diff_units(&original, &modified, self.checklines, deadline);
        if diffs.len() > 2 {
            diff::cleanup_semantic(&mut diffs);
            self.cleanup_efficiency(&mut diffs);
        }
        make(self, &original, &diffs)
    }

    /// Compute a patch from a precomputed diff, deriving the source text
    /// from the diff itself.
    pub fn create_patch_from_diffs(&self, diffs: &[Diff]) -> Patch {
        make(self, &diff::original_units(diffs), diffs)
    }

    /// Compute a patch from a source text and a precomputed diff over it.
    pub fn create_patch_with_diffs(&self, original: &str, diffs: &[Diff]) -> Patch {
        make(self, &text::to_units(original), diffs)
    }

    /// Merge a patch onto `text`, allowing for errors.
    ///
    /// Each hunk is re-anchored with a fuzzy search before being applied,
    /// so the patch survives moderate drift of the underlying text.
    /// Returns the patched text along with a flag per hunk indicating
    /// whether it could be applied. Mis-application is never an error.
    ///
    /// ```
    /// use mend::Options;
    ///
    /// let options = Options::new();
    /// let patch = options.create_patch(
    ///     "The quick brown fox jumps over the lazy dog.",
    ///     "That quick brown fox jumped over a lazy dog.",
    /// );
    /// let (patched, applied) =
    ///     options.apply("The quick red rabbit jumps over the tired tiger.", &patch);
    /// assert_eq!(patched, "That quick red rabbit jumped over a tired tiger.");
    /// assert_eq!(applied, vec![true, true]);
    /// ```
    pub fn apply(&self, text: &str, patch: &Patch) -> (String, Vec<bool>) {
        let base = text::to_units(text);
        if patch.is_empty() {
            return (text::to_string_lossy(&base), Vec::new());
        }

        // Deep copy the patch so that no changes are made to the original.
        let mut patch = patch.clone();
        let null_padding = self.add_padding(&mut patch);
        let mut base = {
            let mut padded = null_padding.clone();
            padded.extend_from_slice(&base);
            padded.extend_from_slice(&null_padding);
            padded
        };
        self.split_max(&mut patch);

        // Count of units deviating from the expected position so far. If a
        // hunk lands ten units to the right, the next one is expected ten
        // units to the right of its recorded position too.
        let mut delta: isize = 0;
        let mut results = vec![false; patch.hunks.len()];
        for (x, hunk) in patch.hunks.iter().enumerate() {
            let expected_loc = hunk.new_range.start as isize + delta;
            let hunk_text1 = diff::original_units(&hunk.diffs);
            let search_loc = expected_loc.max(0) as usize;
            let mut start_loc;
            let mut end_loc = None;
            if hunk_text1.len() > self.match_max_bits {
                // A monster delete from split_max: anchor on its head and
                // tail separately.
                start_loc =
                    bitap::locate_units(self, &base, &hunk_text1[..self.match_max_bits], search_loc);
                if start_loc.is_some() {
                    end_loc = bitap::locate_units(
                        self,
                        &base,
                        &hunk_text1[hunk_text1.len() - self.match_max_bits..],
                        search_loc + hunk_text1.len() - self.match_max_bits,
                    );
                    if end_loc.is_none() || start_loc >= end_loc {
                        // Can't find valid trailing context, drop this hunk.
                        start_loc = None;
                    }
                }
            } else {
                start_loc = bitap::locate_units(self, &base, &hunk_text1, search_loc);
            }
            let found = match start_loc {
                None => {
                    // No match found. Subtract the delta for this failed
                    // hunk from subsequent hunks.
                    delta -= hunk.new_range.len as isize - hunk.old_range.len as isize;
                    continue;
                }
                Some(found) => found,
            };
            // Found a match.
            results[x] = true;
            delta = found as isize - expected_loc;
            let base_text2 = match end_loc {
                None => base[found..(found + hunk_text1.len()).min(base.len())].to_vec(),
                Some(end) => base[found..(end + self.match_max_bits).min(base.len())].to_vec(),
            };
            if hunk_text1 == base_text2 {
                // Perfect match, just shove the replacement text in.
                let replacement = diff::modified_units(&hunk.diffs);
                base.splice(found..found + hunk_text1.len(), replacement);
            } else {
                // Imperfect match. Run a diff to get a framework of
                // equivalent indices.
                let deadline = self.diff_timeout.map(|timeout| Instant::now() + timeout);
                let mut diffs = diff::diff_units(&hunk_text1, &base_text2, false, deadline);
                if hunk_text1.len() > self.match_max_bits
                    && diff::levenshtein(&diffs) as f64 / hunk_text1.len() as f64
                        > self.delete_threshold
                {
                    // The end points match, but the content is unacceptably
                    // bad.
                    results[x] = false;
                } else {
                    diff::cleanup_semantic_lossless(&mut diffs);
                    let mut index1 = 0;
                    for op in &hunk.diffs {
                        match op {
                            Diff::Equal(_) => {}
                            Diff::Insert(units) => {
                                let index2 = diff::translate_position(&diffs, index1);
                                base.splice(found + index2..found + index2, units.iter().copied());
                            }
                            Diff::Delete(units) => {
                                let index2 = diff::translate_position(&diffs, index1);
                                let end = diff::translate_position(&diffs, index1 + units.len());
                                base.drain(found + index2..found + end);
                            }
                        }
                        if !op.is_delete() {
                            index1 += op.len();
                        }
                    }
                }
            }
        }
        // Strip the padding off.
        let inner = &base[null_padding.len()..base.len() - null_padding.len()];
        (text::to_string_lossy(inner), results)
    }

    /// Add padding of unique low code points to the edges of the patch so
    /// that hunks touching the start or end of the text have context to
    /// anchor on.
    ///
    /// Intended to be called from [`apply`]; exposed for callers that wrap
    /// the text themselves. Returns the padding string added to each side.
    ///
    /// [`apply`]: Options::apply
    pub fn add_padding(&self, patch: &mut Patch) -> Vec<u16> {
        let padding_len = self.patch_margin;
        let null_padding: Vec<u16> = (1..=padding_len as u16).collect();

        // Bump all the hunks forward.
        for hunk in &mut patch.hunks {
            hunk.old_range.start += padding_len;
            hunk.new_range.start += padding_len;
        }

        let Some(first) = patch.hunks.first_mut() else {
            return null_padding;
        };
        if first.diffs.first().map_or(true, |diff| !diff.is_equal()) {
            // Add null padding equality.
            first.diffs.insert(0, Diff::Equal(null_padding.clone()));
            first.old_range.start -= padding_len;
            first.new_range.start -= padding_len;
            first.old_range.len += padding_len;
            first.new_range.len += padding_len;
        } else if padding_len > first.diffs[0].len() {
            // Grow first equality to fill the padding.
            let extra = padding_len - first.diffs[0].len();
            let lead = null_padding[first.diffs[0].len()..].to_vec();
            first.diffs[0].text_mut().splice(0..0, lead);
            first.old_range.start -= extra;
            first.new_range.start -= extra;
            first.old_range.len += extra;
            first.new_range.len += extra;
        }

        let last = patch.hunks.last_mut().unwrap();
        if last.diffs.last().map_or(true, |diff| !diff.is_equal()) {
            // Add null padding equality.
            last.diffs.push(Diff::Equal(null_padding.clone()));
            last.old_range.len += padding_len;
            last.new_range.len += padding_len;
        } else if padding_len > last.diffs.last().unwrap().len() {
            // Grow last equality to fill the padding.
            let tail_len = last.diffs.last().unwrap().len();
            let extra = padding_len - tail_len;
            last.diffs
                .last_mut()
                .unwrap()
                .text_mut()
                .extend_from_slice(&null_padding[..extra]);
            last.old_range.len += extra;
            last.new_range.len += extra;
        }

        null_padding
    }

    /// Break up any hunk spanning more source units than `match_max_bits`,
    /// so that every hunk can be anchored by the fuzzy locator.
    ///
    /// Intended to be called from [`apply`].
    ///
    /// [`apply`]: Options::apply
    pub fn split_max(&self, patch: &mut Patch) {
        let patch_size = self.match_max_bits;
        let margin = self.patch_margin;
        let Some(cap) = patch_size.checked_sub(margin) else {
            return;
        };

        let mut x = 0;
        while x < patch.hunks.len() {
            if patch.hunks[x].old_range.len <= patch_size {
                x += 1;
                continue;
            }
            let mut big = patch.hunks.remove(x);
            let mut start1 = big.old_range.start;
            let mut start2 = big.new_range.start;
            let mut precontext: Vec<u16> = Vec::new();
            while !big.diffs.is_empty() {
                // Create one of several smaller hunks.
                let mut hunk = Hunk {
                    old_range: HunkRange::new(start1 - precontext.len(), 0),
                    new_range: HunkRange::new(start2 - precontext.len(), 0),
                    diffs: Vec::new(),
                };
                let mut empty = true;
                if !precontext.is_empty() {
                    hunk.old_range.len = precontext.len();
                    hunk.new_range.len = precontext.len();
                    hunk.diffs.push(Diff::Equal(precontext.clone()));
                }
                while !big.diffs.is_empty() && hunk.old_range.len < cap {
                    let first_len = big.diffs[0].len();
                    if big.diffs[0].is_insert() {
                        // Insertions are harmless.
                        let op = big.diffs.remove(0);
                        hunk.new_range.len += first_len;
                        start2 += first_len;
                        hunk.diffs.push(op);
                        empty = false;
                    } else if big.diffs[0].is_delete()
                        && hunk.diffs.len() == 1
                        && hunk.diffs[0].is_equal()
                        && first_len > 2 * patch_size
                    {
                        // This is a large deletion. Let it pass in one
                        // chunk.
                        let op = big.diffs.remove(0);
                        hunk.old_range.len += first_len;
                        start1 += first_len;
                        hunk.diffs.push(op);
                        empty = false;
                    } else {
                        // Deletion or equality. Only take as much as we can
                        // stomach.
                        let is_equal = big.diffs[0].is_equal();
                        let take = first_len.min(cap - hunk.old_range.len);
                        let units = big.diffs[0].text()[..take].to_vec();
                        hunk.old_range.len += take;
                        start1 += take;
                        if is_equal {
                            hunk.new_range.len += take;
                            start2 += take;
                        } else {
                            empty = false;
                        }
                        hunk.diffs.push(if is_equal {
                            Diff::Equal(units)
                        } else {
                            Diff::Delete(units)
                        });
                        if take == first_len {
                            big.diffs.remove(0);
                        } else {
                            big.diffs[0].text_mut().drain(..take);
                        }
                    }
                }
                // Compute the head context for the next hunk.
                let text2 = diff::modified_units(&hunk.diffs);
                precontext = text2[text2.len().saturating_sub(margin)..].to_vec();
                // Append the end context for this hunk.
                let text1 = diff::original_units(&big.diffs);
                let postcontext = &text1[..text1.len().min(margin)];
                if !postcontext.is_empty() {
                    hunk.old_range.len += postcontext.len();
                    hunk.new_range.len += postcontext.len();
                    match hunk.diffs.last_mut() {
                        Some(last) if last.is_equal() => {
                            last.text_mut().extend_from_slice(postcontext);
                        }
                        _ => hunk.diffs.push(Diff::Equal(postcontext.to_vec())),
                    }
                }
                if !empty {
                    patch.hunks.insert(x, hunk);
                    x += 1;
                }
            }
        }
    }
}

/// Compute a patch turning `original` into `modified`, using default
/// [`Options`].
pub fn create_patch(original: &str, modified: &str) -> Patch {
    Options::new().create_patch(original, modified)
}

/// Merge a patch onto `text` using default [`Options`], allowing for
/// errors.
pub fn apply(text: &str, patch: &Patch) -> (String, Vec<bool>) {
    Options::new().apply(text, patch)
}

// Walk the diff, opening a hunk at each run of edits and closing it once a
// long equality (or the end of the diff) is reached.
fn make(options: &Options, source: &[u16], diffs: &[Diff]) -> Patch {
    let mut hunks = Vec::new();
    if diffs.is_empty() {
        // Get rid of the null case.
        return Patch { hunks };
    }

    let mut hunk = Hunk::default();
    // Number of units into the source text.
    let mut char_count1 = 0;
    // Number of units into the destination text.
    let mut char_count2 = 0;
    // Unlike unified diffs, this format has rolling context: the context of
    // a hunk reflects all earlier hunks having been applied. `prepatch`
    // recreates that text, `postpatch` additionally has the current hunk
    // applied.
    let mut prepatch: Vec<u16> = source.to_vec();
    let mut postpatch: Vec<u16> = source.to_vec();

    for (i, diff) in diffs.iter().enumerate() {
        if hunk.diffs.is_empty() && !diff.is_equal() {
            // A new hunk starts here.
            hunk.old_range.start = char_count1;
            hunk.new_range.start = char_count2;
        }
        match diff {
            Diff::Insert(units) => {
                hunk.diffs.push(diff.clone());
                hunk.new_range.len += units.len();
                postpatch.splice(char_count2..char_count2, units.iter().copied());
            }
            Diff::Delete(units) => {
                hunk.diffs.push(diff.clone());
                hunk.old_range.len += units.len();
                postpatch.drain(char_count2..char_count2 + units.len());
            }
            Diff::Equal(units) => {
                if units.len() <= 2 * options.patch_margin
                    && !hunk.diffs.is_empty()
                    && i != diffs.len() - 1
                {
                    // Small equality inside a hunk.
                    hunk.diffs.push(diff.clone());
                    hunk.old_range.len += units.len();
                    hunk.new_range.len += units.len();
                }
                if units.len() >= 2 * options.patch_margin && !hunk.diffs.is_empty() {
                    // Time for a new hunk.
                    add_context(options, &mut hunk, &prepatch);
                    hunks.push(std::mem::take(&mut hunk));
                    prepatch = postpatch.clone();
                    char_count1 = char_count2;
                }
            }
        }
        if !diff.is_insert() {
            char_count1 += diff.len();
        }
        if !diff.is_delete() {
            char_count2 += diff.len();
        }
    }
    // Pick up the leftover hunk if not empty.
    if !hunk.diffs.is_empty() {
        add_context(options, &mut hunk, &prepatch);
        hunks.push(hunk);
    }

    Patch { hunks }
}

// Increase the context of `hunk` until it is unique in `source`, but don't
// let the pattern expand beyond the fuzzy locator's bit width.
fn add_context(options: &Options, hunk: &mut Hunk, source: &[u16]) {
    if source.is_empty() {
        return;
    }
    let mut pattern = &source[hunk.new_range.start..hunk.new_range.start + hunk.old_range.len];
    let mut padding = 0;

    // Grow the pattern around the hunk until it is unique. Stop growing at
    // the point where the locator could no longer find it.
    while text::find_sub(source, pattern, 0) != text::rfind_sub(source, pattern, source.len())
        && pattern.len() < options.match_max_bits.saturating_sub(2 * options.patch_margin)
    {
        padding += options.patch_margin;
        let start = hunk.new_range.start.saturating_sub(padding);
        let end = (hunk.new_range.start + hunk.old_range.len + padding).min(source.len());
        pattern = &source[start..end];
    }
    // Add one chunk for good luck.
    padding += options.patch_margin;

    let prefix_start = hunk.new_range.start.saturating_sub(padding);
    let prefix = &source[prefix_start..hunk.new_range.start];
    if !prefix.is_empty() {
        hunk.diffs.insert(0, Diff::Equal(prefix.to_vec()));
    }
    let suffix_start = hunk.new_range.start + hunk.old_range.len;
    let suffix_end = (suffix_start + padding).min(source.len());
    let suffix = &source[suffix_start..suffix_end];
    if !suffix.is_empty() {
        hunk.diffs.push(Diff::Equal(suffix.to_vec()));
    }

    // Roll back the start points and extend the lengths.
    hunk.old_range.start -= prefix.len();
    hunk.new_range.start -= prefix.len();
    hunk.old_range.len += prefix.len() + suffix.len();
    hunk.new_range.len += prefix.len() + suffix.len();
}
