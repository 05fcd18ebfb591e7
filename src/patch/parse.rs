//! Parse the textual representation of a patch

use super::{Hunk, HunkRange, Patch};
use crate::{diff::Diff, text};
use regex::Regex;
use std::{str::FromStr, sync::LazyLock};
use thiserror::Error;

static HUNK_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^@@ -(\d+),?(\d*) \+(\d+),?(\d*) @@$").unwrap());

/// An error returned when parsing a patch from its textual representation
/// fails
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParsePatchError {
    /// A line where a `@@` hunk header was expected did not parse as one
    #[error("invalid hunk header {0:?}")]
    InvalidHeader(String),
    /// A hunk body line started with something other than ` `, `+` or `-`
    #[error("invalid operation sign {0:?}")]
    InvalidSign(char),
    /// A hunk body line failed to percent-decode
    #[error("invalid payload encoding: {0}")]
    Decode(#[from] text::DecodeError),
}

impl FromStr for Patch {
    type Err = ParsePatchError;

    /// Parse a textual representation of a patch.
    ///
    /// ```
    /// use mend::Patch;
    ///
    /// let patch: Patch = "@@ -21,18 +22,17 @@\n jump\n-s\n+ed\n  over \n-the\n+a\n  laz\n"
    ///     .parse()
    ///     .unwrap();
    /// assert_eq!(patch.hunks().len(), 1);
    /// ```
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        parse(input)
    }
}

fn parse(input: &str) -> Result<Patch, ParsePatchError> {
    let mut hunks = Vec::new();
    if input.is_empty() {
        return Ok(Patch { hunks });
    }
    let lines: Vec<&str> = input.split('\n').collect();
    let mut pointer = 0;
    while pointer < lines.len() {
        let header = lines[pointer];
        if header.is_empty() {
            // Trailing newline after the final hunk.
            pointer += 1;
            continue;
        }
        let captures = HUNK_HEADER
            .captures(header)
            .ok_or_else(|| ParsePatchError::InvalidHeader(header.to_string()))?;
        let old_range = range(&captures, 1, header)?;
        let new_range = range(&captures, 3, header)?;
        pointer += 1;

        let mut diffs = Vec::new();
        while pointer < lines.len() {
            let line = lines[pointer];
            let Some(sign) = line.chars().next() else {
                // Blank line? Whatever.
                pointer += 1;
                continue;
            };
            if sign == '@' {
                // Start of next hunk.
                break;
            }
            let units = text::percent_decode(&line[sign.len_utf8()..])?;
            match sign {
                '-' => diffs.push(Diff::Delete(units)),
                '+' => diffs.push(Diff::Insert(units)),
                ' ' => diffs.push(Diff::Equal(units)),
                _ => return Err(ParsePatchError::InvalidSign(sign)),
            }
            pointer += 1;
        }

        hunks.push(Hunk {
            diffs,
            old_range,
            new_range,
        });
    }
    Ok(Patch { hunks })
}

// Decode one `start[,len]` coordinate pair from the header captures. The
// wire form is 1-based with the length defaulting to 1; a length of 0
// leaves the start 0-based, matching classic unified-diff convention.
fn range(
    captures: &regex::Captures<'_>,
    index: usize,
    header: &str,
) -> Result<HunkRange, ParsePatchError> {
    let invalid = || ParsePatchError::InvalidHeader(header.to_string());
    let start: usize = captures[index].parse().map_err(|_| invalid())?;
    let len = &captures[index + 1];
    Ok(if len.is_empty() {
        HunkRange::new(start.checked_sub(1).ok_or_else(invalid)?, 1)
    } else if len == "0" {
        HunkRange::new(start, 0)
    } else {
        let start = start.checked_sub(1).ok_or_else(invalid)?;
        HunkRange::new(start, len.parse().map_err(|_| invalid())?)
    })
}
