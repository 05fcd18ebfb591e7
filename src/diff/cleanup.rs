//! Post-processing passes over a diff
//!
//! These trade theoretical minimality for human-readable alignment at word
//! and line boundaries, and normalize the operation sequence.

use super::Diff;
use crate::{options::Options, text};
use regex::Regex;
use std::sync::LazyLock;

// Boundary patterns for `semantic_score`.
static BLANK_LINE_END: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n\r?\n$").unwrap());
static BLANK_LINE_START: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\r?\n\r?\n").unwrap());

/// Reorder and merge like edit sections, merging equalities.
///
/// Any edit section can move as long as it doesn't cross an equality.
/// Repeated until a full pass makes no change. Idempotent.
pub fn cleanup_merge(diffs: &mut Vec<Diff>) {
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
                pointer += 1;
            }
            Diff::Delete(text) => {
                count_delete += 1;
                text_delete.extend_from_slice(text);
                pointer += 1;
            }
            Diff::Equal(_) => {
                // Upon reaching an equality, check for prior redundancies.
                if count_delete + count_insert > 1 {
                    if count_delete != 0 && count_insert != 0 {
                        // Factor out any common prefix.
                        let common_len = text::common_prefix_len(&text_insert, &text_delete);
                        if common_len != 0 {
                            let run_start = pointer - count_delete - count_insert;
                            if run_start > 0 && diffs[run_start - 1].is_equal() {
                                diffs[run_start - 1]
                                    .text_mut()
                                    .extend_from_slice(&text_insert[..common_len]);
                            } else {
                                diffs.insert(0, Diff::Equal(text_insert[..common_len].to_vec()));
                                pointer += 1;
                            }
                            text_insert.drain(..common_len);
                            text_delete.drain(..common_len);
                        }
                        // Factor out any common suffix.
                        let common_len = text::common_suffix_len(&text_insert, &text_delete);
                        if common_len != 0 {
                            let suffix = text_insert[text_insert.len() - common_len..].to_vec();
                            let equality = diffs[pointer].text_mut();
                            equality.splice(0..0, suffix);
                            text_insert.truncate(text_insert.len() - common_len);
                            text_delete.truncate(text_delete.len() - common_len);
                        }
                    }
                    // Delete the offending records and add the merged ones.
                    pointer -= count_delete + count_insert;
                    diffs.drain(pointer..pointer + count_delete + count_insert);
                    if !text_delete.is_empty() {
                        diffs.insert(pointer, Diff::Delete(text_delete.clone()));
                        pointer += 1;
                    }
                    if !text_insert.is_empty() {
                        diffs.insert(pointer, Diff::Insert(text_insert.clone()));
                        pointer += 1;
                    }
                    pointer += 1;
                } else if pointer != 0 && diffs[pointer - 1].is_equal() {
                    // Merge this equality with the previous one.
                    let text = diffs[pointer].text().to_vec();
                    diffs[pointer - 1].text_mut().extend_from_slice(&text);
                    diffs.remove(pointer);
                } else {
                    pointer += 1;
                }
                count_insert = 0;
                count_delete = 0;
                text_delete.clear();
                text_insert.clear();
            }
        }
    }
    if diffs.last().is_some_and(|diff| diff.text().is_empty()) {
        diffs.pop(); // Remove the dummy entry at the end.
    }

    // Second pass: look for single edits surrounded on both sides by
    // equalities which can be shifted sideways to eliminate an equality.
    // e.g: A<ins>BA</ins>C -> <ins>AB</ins>AC
    let mut changes = false;
    let mut pointer = 1;
    while pointer + 1 < diffs.len() {
        if diffs[pointer - 1].is_equal() && diffs[pointer + 1].is_equal() {
            // This is a single edit surrounded by equalities.
            let previous = diffs[pointer - 1].text().to_vec();
            let next = diffs[pointer + 1].text().to_vec();
            if diffs[pointer].text().ends_with(&previous) {
                // Shift the edit over the previous equality.
                let edit = diffs[pointer].text_mut();
                let kept = edit[..edit.len() - previous.len()].to_vec();
                edit.clear();
                edit.extend_from_slice(&previous);
                edit.extend_from_slice(&kept);
                diffs[pointer + 1].text_mut().splice(0..0, previous);
                diffs.remove(pointer - 1);
                changes = true;
            } else if diffs[pointer].text().starts_with(&next) {
                // Shift the edit over the next equality.
                diffs[pointer - 1].text_mut().extend_from_slice(&next);
                let edit = diffs[pointer].text_mut();
                edit.drain(..next.len());
                edit.extend_from_slice(&next);
                diffs.remove(pointer + 1);
                changes = true;
            }
        }
        pointer += 1;
    }
    // If shifts were made, the diff needs reordering and another shift sweep.
    if changes {
        cleanup_merge(diffs);
    }
}

/// Reduce the number of edits by eliminating semantically trivial
/// equalities.
pub fn cleanup_semantic(diffs: &mut Vec<Diff>) {
    let mut changes = false;
    // Stack of indices where equalities are found.
    let mut equalities: Vec<usize> = Vec::new();
    // Always equal to the text of diffs[equalities.last()].
    let mut last_equality: Option<Vec<u16>> = None;
    let mut pointer = 0;
    // Number of units that changed prior to the equality.
    let mut length_insertions1 = 0;
    let mut length_deletions1 = 0;
    // Number of units that changed after the equality.
    let mut length_insertions2 = 0;
    let mut length_deletions2 = 0;
    while pointer < diffs.len() {
        if diffs[pointer].is_equal() {
            equalities.push(pointer);
            length_insertions1 = length_insertions2;
            length_deletions1 = length_deletions2;
            length_insertions2 = 0;
            length_deletions2 = 0;
            last_equality = Some(diffs[pointer].text().to_vec());
            pointer += 1;
        } else {
            if diffs[pointer].is_insert() {
                length_insertions2 += diffs[pointer].len();
            } else {
                length_deletions2 += diffs[pointer].len();
            }
            // Eliminate an equality that is smaller or equal to the edits on
            // both sides of it.
            let eliminate = last_equality.as_ref().is_some_and(|equality| {
                equality.len() <= length_insertions1.max(length_deletions1)
                    && equality.len() <= length_insertions2.max(length_deletions2)
            });
            if eliminate {
                let equality = last_equality.take().unwrap();
                let index = *equalities.last().unwrap();
                // Duplicate record.
                diffs.insert(index, Diff::Delete(equality));
                // Change second copy to insert.
                let second = diffs[index + 1].text().to_vec();
                diffs[index + 1] = Diff::Insert(second);
                // Throw away the equality we just deleted.
                equalities.pop();
                // Throw away the previous equality (it needs to be
                // reevaluated).
                equalities.pop();
                pointer = equalities.last().map(|&index| index + 1).unwrap_or(0);
                length_insertions1 = 0;
                length_deletions1 = 0;
                length_insertions2 = 0;
                length_deletions2 = 0;
                changes = true;
            } else {
                pointer += 1;
            }
        }
    }

    // Normalize the diff.
    if changes {
        cleanup_merge(diffs);
    }
    cleanup_semantic_lossless(diffs);

    // Find any overlaps between deletions and insertions.
    // e.g: <del>abcxxx</del><ins>xxxdef</ins>
    //   -> <del>abc</del>xxx<ins>def</ins>
    // e.g: <del>xxxabc</del><ins>defxxx</ins>
    //   -> <ins>def</ins>xxx<del>abc</del>
    // Only extract an overlap if it is as big as the edit ahead or behind
    // it.
    let mut pointer = 1;
    while pointer < diffs.len() {
        if diffs[pointer - 1].is_delete() && diffs[pointer].is_insert() {
            let deletion = diffs[pointer - 1].text().to_vec();
            let insertion = diffs[pointer].text().to_vec();
            let overlap1 = text::common_overlap_len(&deletion, &insertion);
            let overlap2 = text::common_overlap_len(&insertion, &deletion);
            if overlap1 >= overlap2 {
                if overlap1 * 2 >= deletion.len() || overlap1 * 2 >= insertion.len() {
                    // Overlap found. Insert an equality and trim the
                    // surrounding edits.
                    diffs.insert(pointer, Diff::Equal(insertion[..overlap1].to_vec()));
                    diffs[pointer - 1] = Diff::Delete(deletion[..deletion.len() - overlap1].to_vec());
                    diffs[pointer + 1] = Diff::Insert(insertion[overlap1..].to_vec());
                    pointer += 1;
                }
            } else if overlap2 * 2 >= deletion.len() || overlap2 * 2 >= insertion.len() {
                // Reverse overlap found. Insert an equality and swap and
                // trim the surrounding edits.
                diffs.insert(pointer, Diff::Equal(deletion[..overlap2].to_vec()));
                diffs[pointer - 1] = Diff::Insert(insertion[..insertion.len() - overlap2].to_vec());
                diffs[pointer + 1] = Diff::Delete(deletion[overlap2..].to_vec());
                pointer += 1;
            }
            pointer += 1;
        }
        pointer += 1;
    }
}

/// Look for single edits surrounded on both sides by equalities which can be
/// shifted sideways to align the edit to a word boundary.
///
/// e.g: `The c<ins>at c</ins>ame.` -> `The <ins>cat </ins>came.`
pub fn cleanup_semantic_lossless(diffs: &mut Vec<Diff>) {
    let mut pointer = 1;
    // Intentionally ignore the first and last element (they don't qualify).
    while pointer + 1 < diffs.len() {
        if diffs[pointer - 1].is_equal() && diffs[pointer + 1].is_equal() {
            // This is a single edit surrounded by equalities.
            let mut equality1 = diffs[pointer - 1].text().to_vec();
            let mut edit = diffs[pointer].text().to_vec();
            let mut equality2 = diffs[pointer + 1].text().to_vec();

            // First, shift the edit as far left as possible.
            let common_offset = text::common_suffix_len(&equality1, &edit);
            if common_offset != 0 {
                let common = edit[edit.len() - common_offset..].to_vec();
                equality1.truncate(equality1.len() - common_offset);
                edit.truncate(edit.len() - common_offset);
                edit.splice(0..0, common.iter().copied());
                equality2.splice(0..0, common);
            }

            // Second, step unit by unit right, looking for the best fit.
            let mut best_equality1 = equality1.clone();
            let mut best_edit = edit.clone();
            let mut best_equality2 = equality2.clone();
            let mut best_score =
                semantic_score(&equality1, &edit) + semantic_score(&edit, &equality2);
            while !edit.is_empty() && !equality2.is_empty() && edit[0] == equality2[0] {
                equality1.push(edit[0]);
                edit.remove(0);
                edit.push(equality2[0]);
                equality2.remove(0);
                let score = semantic_score(&equality1, &edit) + semantic_score(&edit, &equality2);
                // The >= encourages trailing rather than leading whitespace
                // on edits.
                if score >= best_score {
                    best_score = score;
                    best_equality1 = equality1.clone();
                    best_edit = edit.clone();
                    best_equality2 = equality2.clone();
                }
            }

            if diffs[pointer - 1].text() != best_equality1.as_slice() {
                // We have an improvement, save it back to the diff.
                if !best_equality1.is_empty() {
                    *diffs[pointer - 1].text_mut() = best_equality1;
                } else {
                    diffs.remove(pointer - 1);
                    pointer -= 1;
                }
                *diffs[pointer].text_mut() = best_edit;
                if !best_equality2.is_empty() {
                    *diffs[pointer + 1].text_mut() = best_equality2;
                } else {
                    diffs.remove(pointer + 1);
                    pointer -= 1;
                }
            }
        }
        pointer += 1;
    }
}

// Given two texts, compute a score representing whether the internal
// boundary falls on logical boundaries. Scores range from 6 (best) to 0
// (worst).
fn semantic_score(one: &[u16], two: &[u16]) -> u32 {
    if one.is_empty() || two.is_empty() {
        // Edges are the best.
        return 6;
    }

    let char1 = unit_to_char(one[one.len() - 1]);
    let char2 = unit_to_char(two[0]);
    let non_alphanumeric1 = !char1.is_ascii_alphanumeric();
    let non_alphanumeric2 = !char2.is_ascii_alphanumeric();
    let whitespace1 = non_alphanumeric1 && char1.is_whitespace();
    let whitespace2 = non_alphanumeric2 && char2.is_whitespace();
    let line_break1 = whitespace1 && (char1 == '\n' || char1 == '\r');
    let line_break2 = whitespace2 && (char2 == '\n' || char2 == '\r');
    let blank_line1 = line_break1 && BLANK_LINE_END.is_match(&text::to_string_lossy(one));
    let blank_line2 = line_break2 && BLANK_LINE_START.is_match(&text::to_string_lossy(two));

    if blank_line1 || blank_line2 {
        // Five points for blank lines.
        5
    } else if line_break1 || line_break2 {
        // Four points for line breaks.
        4
    } else if non_alphanumeric1 && !whitespace1 && whitespace2 {
        // Three points for end of sentences.
        3
    } else if whitespace1 || whitespace2 {
        // Two points for whitespace.
        2
    } else if non_alphanumeric1 || non_alphanumeric2 {
        // One point for non-alphanumeric.
        1
    } else {
        0
    }
}

// Unpaired surrogates fall back to the replacement character, which scores
// as non-alphanumeric.
fn unit_to_char(unit: u16) -> char {
    char::from_u32(u32::from(unit)).unwrap_or('\u{fffd}')
}

impl Options {
    /// Reduce the number of edits by eliminating operationally trivial
    /// equalities, those shorter than `edit_cost` sandwiched between
    /// non-trivial edits.
    pub fn cleanup_efficiency(&self, diffs: &mut Vec<Diff>) {
        cleanup_efficiency(diffs, self.edit_cost)
    }
}

fn cleanup_efficiency(diffs: &mut Vec<Diff>, edit_cost: usize) {
    let mut changes = false;
    // Stack of indices where equalities are found.
    let mut equalities: Vec<usize> = Vec::new();
    // Always equal to the text of diffs[equalities.last()].
    let mut last_equality: Option<Vec<u16>> = None;
    let mut pointer = 0;
    // Is there an insertion or deletion operation before the last equality.
    let mut pre_ins = false;
    let mut pre_del = false;
    // Is there an insertion or deletion operation after the last equality.
    let mut post_ins = false;
    let mut post_del = false;
    while pointer < diffs.len() {
        if diffs[pointer].is_equal() {
            if diffs[pointer].len() < edit_cost && (post_ins || post_del) {
                // Candidate found.
                equalities.push(pointer);
                pre_ins = post_ins;
                pre_del = post_del;
                last_equality = Some(diffs[pointer].text().to_vec());
            } else {
                // Not a candidate, and can never become one.
                equalities.clear();
                last_equality = None;
            }
            post_ins = false;
            post_del = false;
            pointer += 1;
        } else {
            if diffs[pointer].is_delete() {
                post_del = true;
            } else {
                post_ins = true;
            }
            // Five types to be split:
            // <ins>A</ins><del>B</del>XY<ins>C</ins><del>D</del>
            // <ins>A</ins>X<ins>C</ins><del>D</del>
            // <ins>A</ins><del>B</del>X<ins>C</ins>
            // <ins>A</del>X<ins>C</ins><del>D</del>
            // <ins>A</ins><del>B</del>X<del>C</del>
            let edits = usize::from(pre_ins)
                + usize::from(pre_del)
                + usize::from(post_ins)
                + usize::from(post_del);
            let eliminate = last_equality.as_ref().is_some_and(|equality| {
                (pre_ins && pre_del && post_ins && post_del)
                    || (equality.len() < edit_cost / 2 && edits == 3)
            });
            if eliminate {
                let equality = last_equality.take().unwrap();
                let index = *equalities.last().unwrap();
                // Duplicate record.
                diffs.insert(index, Diff::Delete(equality));
                // Change second copy to insert.
                let second = diffs[index + 1].text().to_vec();
                diffs[index + 1] = Diff::Insert(second);
                // Throw away the equality we just deleted.
                equalities.pop();
                if pre_ins && pre_del {
                    // No changes made which could affect previous entry,
                    // keep going.
                    post_ins = true;
                    post_del = true;
                    equalities.clear();
                    pointer += 1;
                } else {
                    // Throw away the previous equality.
                    equalities.pop();
                    pointer = equalities.last().map(|&index| index + 1).unwrap_or(0);
                    post_ins = false;
                    post_del = false;
                }
                changes = true;
            } else {
                pointer += 1;
            }
        }
    }

    if changes {
        cleanup_merge(diffs);
    }
}
