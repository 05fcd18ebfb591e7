use super::{diff_units, Diff};
use std::time::Instant;

// Find the 'middle snake' of a diff, split the problem in two and return the
// recursively constructed diff.
// See Myers 1986 paper: An O(ND) Difference Algorithm and Its Variations.
//
// The forward and reverse wavefronts are walked simultaneously; when they
// overlap on a diagonal the edit graph is split at that cell. The `v` arrays
// record the furthest-reaching x per diagonal `k` and are indexed by
// `k + v_offset` to keep negative diagonals addressable.
pub(crate) fn bisect(old: &[u16], new: &[u16], deadline: Option<Instant>) -> Vec<Diff> {
    let old_len = old.len() as isize;
    let new_len = new.len() as isize;
    let max_d = (old.len() + new.len() + 1) / 2;
    let v_offset = max_d as isize;
    let v_length = 2 * max_d;
    let mut v1 = vec![-1isize; v_length];
    let mut v2 = vec![-1isize; v_length];
    v1[(v_offset + 1) as usize] = 0;
    v2[(v_offset + 1) as usize] = 0;
    let delta = old_len - new_len;
    // If the total number of units is odd, then the front path will collide
    // with the reverse path.
    let front = delta % 2 != 0;
    // Offsets for start and end of k loop. Prevents mapping of space beyond
    // the grid.
    let mut k1start: isize = 0;
    let mut k1end: isize = 0;
    let mut k2start: isize = 0;
    let mut k2end: isize = 0;
    for d in 0..max_d as isize {
        // Bail out if deadline is reached.
        if deadline.is_some_and(|deadline| Instant::now() > deadline) {
            break;
        }

        // Walk the front path one step.
        let mut k1 = -d + k1start;
        while k1 <= d - k1end {
            let k1_offset = (v_offset + k1) as usize;
            let mut x1 = if k1 == -d || (k1 != d && v1[k1_offset - 1] < v1[k1_offset + 1]) {
                v1[k1_offset + 1]
            } else {
                v1[k1_offset - 1] + 1
            };
            let mut y1 = x1 - k1;
            while x1 < old_len && y1 < new_len && old[x1 as usize] == new[y1 as usize] {
                x1 += 1;
                y1 += 1;
            }
            v1[k1_offset] = x1;
            if x1 > old_len {
                // Ran off the right of the graph.
                k1end += 2;
            } else if y1 > new_len {
                // Ran off the bottom of the graph.
                k1start += 2;
            } else if front {
                let k2_offset = v_offset + delta - k1;
                if k2_offset >= 0 && (k2_offset as usize) < v_length && v2[k2_offset as usize] != -1
                {
                    // Mirror x2 onto top-left coordinate system.
                    let x2 = old_len - v2[k2_offset as usize];
                    if x1 >= x2 {
                        // Overlap detected.
                        return split(old, new, x1 as usize, y1 as usize, deadline);
                    }
                }
            }
            k1 += 2;
        }

        // Walk the reverse path one step.
        let mut k2 = -d + k2start;
        while k2 <= d - k2end {
            let k2_offset = (v_offset + k2) as usize;
            let mut x2 = if k2 == -d || (k2 != d && v2[k2_offset - 1] < v2[k2_offset + 1]) {
                v2[k2_offset + 1]
            } else {
                v2[k2_offset - 1] + 1
            };
            let mut y2 = x2 - k2;
            while x2 < old_len
                && y2 < new_len
                && old[(old_len - x2 - 1) as usize] == new[(new_len - y2 - 1) as usize]
            {
                x2 += 1;
                y2 += 1;
            }
            v2[k2_offset] = x2;
            if x2 > old_len {
                // Ran off the left of the graph.
                k2end += 2;
            } else if y2 > new_len {
                // Ran off the top of the graph.
                k2start += 2;
            } else if !front {
                let k1_offset = v_offset + delta - k2;
                if k1_offset >= 0 && (k1_offset as usize) < v_length && v1[k1_offset as usize] != -1
                {
                    let x1 = v1[k1_offset as usize];
                    let y1 = v_offset + x1 - k1_offset;
                    // Mirror x2 onto top-left coordinate system.
                    let x2 = old_len - x2;
                    if x1 >= x2 {
                        // Overlap detected.
                        return split(old, new, x1 as usize, y1 as usize, deadline);
                    }
                }
            }
            k2 += 2;
        }
    }
    // Number of diffs equals number of units, no commonality at all, or the
    // deadline expired.
    vec![Diff::Delete(old.to_vec()), Diff::Insert(new.to_vec())]
}

// Given the location of the middle snake, split the diff in two parts and
// recurse.
fn split(old: &[u16], new: &[u16], x: usize, y: usize, deadline: Option<Instant>) -> Vec<Diff> {
    let mut diffs = diff_units(&old[..x], &new[..y], false, deadline);
    diffs.extend(diff_units(&old[x..], &new[y..], false, deadline));
    diffs
}
