use crate::{options::Options, text};
use std::{
    collections::{hash_map::Entry, HashMap},
    fmt,
    time::Instant,
};

mod bisect;
mod cleanup;
mod delta;
mod format;


pub use cleanup::{cleanup_merge, cleanup_semantic, cleanup_semantic_lossless};
pub use delta::{from_delta, to_delta, ParseDeltaError};
pub use format::{pretty_console, pretty_html};

pub(crate) use bisect::bisect;

/// A single edit operation in a diff
///
/// A diff between two texts is an ordered sequence of these operations.
/// Replaying the `Equal` and `Delete` payloads reconstructs the original
/// text; replaying the `Equal` and `Insert` payloads reconstructs the
/// modified text. Payloads are UTF-16 code units.
#[derive(Clone, PartialEq, Eq)]
pub enum Diff {
    /// A run of units present in both texts
    Equal(Vec<u16>),
    /// A run of units present only in the original text
    Delete(Vec<u16>),
    /// A run of units present only in the modified text
    Insert(Vec<u16>),
}

impl Diff {
    /// Construct an `Equal` operation from a `&str`
    pub fn equal(text: &str) -> Self {
        Diff::Equal(text::to_units(text))
    }

    /// Construct a `Delete` operation from a `&str`
    pub fn delete(text: &str) -> Self {
        Diff::Delete(text::to_units(text))
    }

    /// Construct an `Insert` operation from a `&str`
    pub fn insert(text: &str) -> Self {
        Diff::Insert(text::to_units(text))
    }

    /// The payload of this operation, in UTF-16 code units
    pub fn text(&self) -> &[u16] {
        match self {
            Diff::Equal(text) | Diff::Delete(text) | Diff::Insert(text) => text,
        }
    }

    /// The payload of this operation as a `String`
    pub fn text_lossy(&self) -> String {
        text::to_string_lossy(self.text())
    }

    pub(crate) fn text_mut(&mut self) -> &mut Vec<u16> {
        match self {
            Diff::Equal(text) | Diff::Delete(text) | Diff::Insert(text) => text,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.text().len()
    }

    pub(crate) fn is_equal(&self) -> bool {
        matches!(self, Diff::Equal(_))
    }

    pub(crate) fn is_delete(&self) -> bool {
        matches!(self, Diff::Delete(_))
    }

    pub(crate) fn is_insert(&self) -> bool {
        matches!(self, Diff::Insert(_))
    }
}

impl fmt::Debug for Diff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Diff::Equal(_) => "Equal",
            Diff::Delete(_) => "Delete",
            Diff::Insert(_) => "Insert",
        };
        write!(f, "{}({:?})", name, self.text_lossy())
    }
}

impl Options {
    /// Find the differences between two texts.
    ///
    /// The result is normalized: adjacent operations never share a tag and
    /// no `Equal` is empty. Computation stops at the configured timeout,
    /// degrading to a valid but non-minimal diff.
    ///
    /// ```
    /// use mend::{Diff, Options};
    ///
    /// let diffs = Options::new().diff("The quick brown fox.", "The slow brown fox.");
    /// assert_eq!(
    ///     diffs,
    ///     vec![
    ///         Diff::equal("The "),
    ///         Diff::delete("quick"),
    ///         Diff::insert("slow"),
    ///         Diff::equal(" brown fox."),
    ///     ],
    /// );
    /// ```
    pub fn diff(&self, original: &str, modified: &str) -> Vec<Diff> {
        let original = text::to_units(original);
        let modified = text::to_units(modified);
        let deadline = self.diff_timeout.map(|timeout| Instant::now() + timeout);
        diff_units(&original, &modified, self.checklines, deadline)
    }
}

/// Find the differences between two texts using default [`Options`].
pub fn diff(original: &str, modified: &str) -> Vec<Diff> {
    Options::new().diff(original, modified)
}

/// Diff two unit slices, stripping any common prefix or suffix off the
/// texts before diffing.
pub(crate) fn diff_units(
    old: &[u16],
    new: &[u16],
    checklines: bool,
    deadline: Option<Instant>,
) -> Vec<Diff> {
    // Speedup for equality.
    if old == new {
        if old.is_empty() {
            return Vec::new();
        }
        return vec![Diff::Equal(old.to_vec())];
    }

    let prefix_len = text::common_prefix_len(old, new);
    let prefix = &old[..prefix_len];
    let old = &old[prefix_len..];
    let new = &new[prefix_len..];

    let suffix_len = text::common_suffix_len(old, new);
    let suffix = &old[old.len() - suffix_len..];
    let old = &old[..old.len() - suffix_len];
    let new = &new[..new.len() - suffix_len];

    let mut diffs = compute(old, new, checklines, deadline);

    if !prefix.is_empty() {
        diffs.insert(0, Diff::Equal(prefix.to_vec()));
    }
    if !suffix.is_empty() {
        diffs.push(Diff::Equal(suffix.to_vec()));
    }
    cleanup::cleanup_merge(&mut diffs);
    diffs
}

// Assumes that the texts do not have any common prefix or suffix.
fn compute(old: &[u16], new: &[u16], checklines: bool, deadline: Option<Instant>) -> Vec<Diff> {
    if old.is_empty() {
        return vec![Diff::Insert(new.to_vec())];
    }
    if new.is_empty() {
        return vec![Diff::Delete(old.to_vec())];
    }

    let (long, short) = if old.len() > new.len() {
        (old, new)
    } else {
        (new, old)
    };
    if let Some(i) = text::find_sub(long, short, 0) {
        // Shorter text is inside the longer text.
        let before = long[..i].to_vec();
        let after = long[i + short.len()..].to_vec();
        return if old.len() > new.len() {
            vec![
                Diff::Delete(before),
                Diff::Equal(short.to_vec()),
                Diff::Delete(after),
            ]
        } else {
            vec![
                Diff::Insert(before),
                Diff::Equal(short.to_vec()),
                Diff::Insert(after),
            ]
        };
    }
    if short.len() == 1 {
        // Single unit with no containment, therefore no common middle.
        return vec![Diff::Delete(old.to_vec()), Diff::Insert(new.to_vec())];
    }

    // Check whether the problem can be split around a large shared middle.
    // Unavailable without a deadline since it trades optimality for speed.
    if deadline.is_some() {
        if let Some(half) = half_match(old, new) {
            let mut diffs = diff_units(half.old_prefix, half.new_prefix, checklines, deadline);
            diffs.push(Diff::Equal(half.common.to_vec()));
            diffs.extend(diff_units(
                half.old_suffix,
                half.new_suffix,
                checklines,
                deadline,
            ));
            return diffs;
        }
    }

    if checklines && old.len() > 100 && new.len() > 100 {
        return line_mode(old, new, deadline);
    }

    bisect(old, new, deadline)
}

struct HalfMatch<'a> {
    old_prefix: &'a [u16],
    old_suffix: &'a [u16],
    new_prefix: &'a [u16],
    new_suffix: &'a [u16],
    common: &'a [u16],
}

/// Do the two texts share a substring which is at least half the length of
/// the longer text?
fn half_match<'a>(old: &'a [u16], new: &'a [u16]) -> Option<HalfMatch<'a>> {
    let (long, short) = if old.len() > new.len() {
        (old, new)
    } else {
        (new, old)
    };
    if long.len() < 4 || short.len() * 2 < long.len() {
        return None;
    }

    // Check whether the second quarter or the midpoint seeds a half match.
    let half1 = half_match_at(long, short, (long.len() + 3) / 4);
    let half2 = half_match_at(long, short, (long.len() + 1) / 2);
    let half = match (half1, half2) {
        (None, None) => return None,
        (Some(half), None) | (None, Some(half)) => half,
        (Some(half1), Some(half2)) => {
            if half1.4.len() > half2.4.len() {
                half1
            } else {
                half2
            }
        }
    };

    let (long_prefix, long_suffix, short_prefix, short_suffix, common) = half;
    Some(if old.len() > new.len() {
        HalfMatch {
            old_prefix: long_prefix,
            old_suffix: long_suffix,
            new_prefix: short_prefix,
            new_suffix: short_suffix,
            common,
        }
    } else {
        HalfMatch {
            old_prefix: short_prefix,
            old_suffix: short_suffix,
            new_prefix: long_prefix,
            new_suffix: long_suffix,
            common,
        }
    })
}

type HalfMatchParts<'a> = (&'a [u16], &'a [u16], &'a [u16], &'a [u16], &'a [u16]);

// Does a substring of `short` exist within `long` that is at least half the
// length of `long`, seeded from the quarter-length window of `long` at `i`?
fn half_match_at<'a>(long: &'a [u16], short: &'a [u16], i: usize) -> Option<HalfMatchParts<'a>> {
    let seed = &long[i..i + long.len() / 4];
    let mut best: Option<HalfMatchParts<'a>> = None;
    let mut best_common_len = 0;

    let mut j = text::find_sub(short, seed, 0);
    while let Some(found) = j {
        let prefix_len = text::common_prefix_len(&long[i..], &short[found..]);
        let suffix_len = text::common_suffix_len(&long[..i], &short[..found]);
        if best_common_len < suffix_len + prefix_len {
            best_common_len = suffix_len + prefix_len;
            best = Some((
                &long[..i - suffix_len],
                &long[i + prefix_len..],
                &short[..found - suffix_len],
                &short[found + prefix_len..],
                &short[found - suffix_len..found + prefix_len],
            ));
        }
        j = text::find_sub(short, seed, found + 1);
    }

    if best_common_len * 2 >= long.len() {
        best
    } else {
        None
    }
}

// Do a quick line-level diff on both texts, then rediff the parts for
// greater accuracy. This speedup can produce non-minimal diffs.
fn line_mode(old: &[u16], new: &[u16], deadline: Option<Instant>) -> Vec<Diff> {
    let (old_hashed, new_hashed, lines) = lines_to_units(old, new);

    let mut diffs = diff_units(&old_hashed, &new_hashed, false, deadline);

    // Convert the diff back to real text.
    units_to_lines(&mut diffs, &lines);
    // Eliminate freak matches (e.g. blank lines).
    cleanup::cleanup_semantic(&mut diffs);

    // Rediff any replacement blocks, this time unit-by-unit.
    // Add a dummy entry at the end.
    diffs.push(Diff::Equal(Vec::new()));
    let mut pointer = 0;
    let mut count_delete = 0;
    let mut count_insert = 0;
    let mut text_delete: Vec<u16> = Vec::new();
    let mut text_insert: Vec<u16> = Vec::new();
    while pointer < diffs.len() {
        match &diffs[pointer] {
            Diff::Insert(text) => {
                count_insert += 1;
                text_insert.extend_from_slice(text);
            }
            Diff::Delete(text) => {
                count_delete += 1;
                text_delete.extend_from_slice(text);
            }
            Diff::Equal(_) => {
                // Upon reaching an equality, rediff any prior replacement.
                if count_delete >= 1 && count_insert >= 1 {
                    let sub_diffs = diff_units(&text_delete, &text_insert, false, deadline);
                    let start = pointer - count_delete - count_insert;
                    let inserted = sub_diffs.len();
                    diffs.splice(start..pointer, sub_diffs);
                    pointer = start + inserted;
                }
                count_insert = 0;
                count_delete = 0;
                text_delete.clear();
                text_insert.clear();
            }
        }
        pointer += 1;
    }
    diffs.pop(); // Remove the dummy entry at the end.

    diffs
}

/// Classifies whole lines, collapsing each distinct line to a single UTF-16
/// unit so that a unit-level diff becomes a line-level diff.
///
/// The zeroth slot of the line table is reserved blank so that hashed units
/// start at 1. The table holds at most `u16::MAX` distinct lines; once it
/// fills, the remainder of a text is treated as one line.
struct LineTable {
    lines: Vec<Vec<u16>>,
    ids: HashMap<Vec<u16>, u16>,
}

impl LineTable {
    fn new() -> Self {
        Self {
            lines: vec![Vec::new()],
            ids: HashMap::new(),
        }
    }

    fn hash(&mut self, text: &[u16]) -> Vec<u16> {
        const NEWLINE: u16 = b'\n' as u16;
        let mut hashed = Vec::new();
        let mut line_start = 0;
        while line_start < text.len() {
            let line_end = text::find_sub(text, &[NEWLINE], line_start)
                .map(|i| i + 1)
                .unwrap_or(text.len());
            let mut line = &text[line_start..line_end];
            if self.lines.len() == usize::from(u16::MAX) && !self.ids.contains_key(line) {
                // Table full, treat the rest of the text as one line.
                line = &text[line_start..];
            }
            match self.ids.entry(line.to_vec()) {
                Entry::Occupied(o) => hashed.push(*o.get()),
                Entry::Vacant(v) => {
                    let id = self.lines.len() as u16;
                    self.lines.push(line.to_vec());
                    hashed.push(*v.insert(id));
                }
            }
            line_start += line.len();
        }
        hashed
    }
}

// Split two texts into lines and reduce them to strings of line ids.
fn lines_to_units(old: &[u16], new: &[u16]) -> (Vec<u16>, Vec<u16>, Vec<Vec<u16>>) {
    let mut table = LineTable::new();
    let old_hashed = table.hash(old);
    let new_hashed = table.hash(new);
    (old_hashed, new_hashed, table.lines)
}

// Rehydrate a diff over line ids into real lines of text.
fn units_to_lines(diffs: &mut [Diff], lines: &[Vec<u16>]) {
    for diff in diffs {
        let text = diff
            .text()
            .iter()
            .flat_map(|&id| lines[usize::from(id)].iter().copied())
            .collect();
        *diff.text_mut() = text;
    }
}

/// Compute the source text of a diff (all equalities and deletions).
pub fn original_text(diffs: &[Diff]) -> String {
    text::to_string_lossy(&original_units(diffs))
}

/// Compute the destination text of a diff (all equalities and insertions).
pub fn modified_text(diffs: &[Diff]) -> String {
    text::to_string_lossy(&modified_units(diffs))
}

pub(crate) fn original_units(diffs: &[Diff]) -> Vec<u16> {
    diffs
        .iter()
        .filter(|diff| !diff.is_insert())
        .flat_map(|diff| diff.text().iter().copied())
        .collect()
}

pub(crate) fn modified_units(diffs: &[Diff]) -> Vec<u16> {
    diffs
        .iter()
        .filter(|diff| !diff.is_delete())
        .flat_map(|diff| diff.text().iter().copied())
        .collect()
}

/// Compute the Levenshtein distance of a diff, in UTF-16 code units.
pub fn levenshtein(diffs: &[Diff]) -> usize {
    let mut distance = 0;
    let mut insertions = 0;
    let mut deletions = 0;
    for diff in diffs {
        match diff {
            Diff::Insert(text) => insertions += text.len(),
            Diff::Delete(text) => deletions += text.len(),
            Diff::Equal(_) => {
                // A deletion paired with an insertion is one substitution.
                distance += insertions.max(deletions);
                insertions = 0;
                deletions = 0;
            }
        }
    }
    distance + insertions.max(deletions)
}

/// Given a position in the source text, compute the equivalent position in
/// the destination text.
///
/// e.g. "The cat" vs "The big cat": 1 maps to 1, 5 maps to 8. A position
/// inside a deletion maps to the start of that deletion in the destination.
pub fn translate_position(diffs: &[Diff], loc: usize) -> usize {
    let mut chars1 = 0;
    let mut chars2 = 0;
    let mut last_chars1 = 0;
    let mut last_chars2 = 0;
    let mut hit = None;
    for diff in diffs {
        if !diff.is_insert() {
            chars1 += diff.len();
        }
        if !diff.is_delete() {
            chars2 += diff.len();
        }
        if chars1 > loc {
            // Overshot the location.
            hit = Some(diff);
            break;
        }
        last_chars1 = chars1;
        last_chars2 = chars2;
    }
    if let Some(diff) = hit {
        if diff.is_delete() {
            // The location was deleted.
            return last_chars2;
        }
    }
    // Add the remaining unit length.
    last_chars2 + (loc - last_chars1)
}
