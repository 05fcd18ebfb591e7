//! Compact textual encoding of a diff
//!
//! Operations are tab-separated. `=n` keeps `n` units of the source text,
//! `-n` deletes `n` units, and `+text` inserts percent-encoded text, e.g.
//! `=3\t-2\t+ing` means keep 3 units, delete 2, insert "ing". Unit counts
//! are UTF-16 code units.

use super::Diff;
use crate::text::{self, DecodeError};
use thiserror::Error;

/// An error returned when a delta cannot be reconciled with its source text
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseDeltaError {
    /// An insertion payload failed to decode
    #[error("invalid insertion payload: {0}")]
    Decode(#[from] DecodeError),
    /// A `=`/`-` token did not carry a parseable unit count
    #[error("invalid unit count {0:?}")]
    InvalidLength(String),
    /// The delta consumed more units than the source text has
    #[error("delta overruns the {0} units of the source text")]
    SourceOverrun(usize),
    /// The delta ended before consuming the whole source text
    #[error("delta consumed {consumed} of {expected} source units")]
    SourceUnderrun { consumed: usize, expected: usize },
    /// A token started with something other than `=`, `-` or `+`
    #[error("unknown delta operator {0:?}")]
    UnknownOperator(char),
}

/// Crush a diff into the encoded string of operations required to transform
/// its source text into its destination text.
pub fn to_delta(diffs: &[Diff]) -> String {
    let tokens: Vec<String> = diffs
        .iter()
        .map(|diff| match diff {
            Diff::Insert(units) => format!("+{}", text::percent_encode(units)),
            Diff::Delete(units) => format!("-{}", units.len()),
            Diff::Equal(units) => format!("={}", units.len()),
        })
        .collect();
    tokens.join("\t")
}

/// Given the source text and a delta, rebuild the full diff.
pub fn from_delta(source: &str, delta: &str) -> Result<Vec<Diff>, ParseDeltaError> {
    let source = text::to_units(source);
    let mut diffs = Vec::new();
    // Cursor in the source text.
    let mut pointer: usize = 0;
    for token in delta.split('\t') {
        if token.is_empty() {
            // Blank tokens are ok (from a trailing \t).
            continue;
        }
        // Each token begins with a one character operator.
        let mut chars = token.chars();
        let operator = chars.next().unwrap();
        let param = chars.as_str();
        match operator {
            '+' => diffs.push(Diff::Insert(text::percent_decode(param)?)),
            '-' | '=' => {
                let count: usize = param
                    .parse()
                    .map_err(|_| ParseDeltaError::InvalidLength(param.to_string()))?;
                let end = pointer
                    .checked_add(count)
                    .filter(|&end| end <= source.len())
                    .ok_or(ParseDeltaError::SourceOverrun(source.len()))?;
                let units = source[pointer..end].to_vec();
                pointer = end;
                if operator == '=' {
                    diffs.push(Diff::Equal(units));
                } else {
                    diffs.push(Diff::Delete(units));
                }
            }
            _ => return Err(ParseDeltaError::UnknownOperator(operator)),
        }
    }
    if pointer != source.len() {
        return Err(ParseDeltaError::SourceUnderrun {
            consumed: pointer,
            expected: source.len(),
        });
    }
    Ok(diffs)
}
