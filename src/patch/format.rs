//! Textual representation of a patch

use super::{Hunk, HunkRange, Patch};
use crate::{diff::Diff, text};
use std::fmt::{Display, Formatter, Result};

impl Display for Patch {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        for hunk in &self.hunks {
            write!(f, "{}", hunk)?;
        }
        Ok(())
    }
}

impl Display for Hunk {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        writeln!(f, "@@ -{} +{} @@", self.old_range, self.new_range)?;
        for diff in &self.diffs {
            let sign = match diff {
                Diff::Insert(_) => '+',
                Diff::Delete(_) => '-',
                Diff::Equal(_) => ' ',
            };
            writeln!(f, "{}{}", sign, text::percent_encode(diff.text()))?;
        }
        Ok(())
    }
}

impl Display for HunkRange {
    // The wire form is 1-based, omits a length of 1, and leaves the start
    // 0-based when the length is 0.
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        if self.len == 0 {
            write!(f, "{},0", self.start)
        } else if self.len == 1 {
            write!(f, "{}", self.start + 1)
        } else {
            write!(f, "{},{}", self.start + 1, self.len)
        }
    }
}
