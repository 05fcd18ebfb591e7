//! Tools for diffing, fuzzy matching, and patching drifted text
//!
//! ## Overview
//!
//! This library computes minimal edit scripts between two texts, locates
//! approximate occurrences of a pattern in a text, and produces patch files
//! that can be applied even after the underlying text has drifted. The
//! diff implementation is based on [Myers' diff algorithm] with semantic
//! post-processing; the fuzzy locator is a bit-parallel [Bitap] search;
//! patch application re-anchors each hunk with the locator before applying
//! it.
//!
//! All positions and lengths exposed by this crate are measured in UTF-16
//! code units, and the delta and patch text formats count units the same
//! way, so serialized forms interoperate with other engines that fix that
//! unit.
//!
//! ## Diffing
//!
//! ```
//! use mend::{diff, Diff};
//!
//! let diffs = diff("The quick brown fox.", "The slow brown fox.");
//! assert_eq!(
//!     diffs,
//!     vec![
//!         Diff::equal("The "),
//!         Diff::delete("quick"),
//!         Diff::insert("slow"),
//!         Diff::equal(" brown fox."),
//!     ],
//! );
//! ```
//!
//! Diffs round-trip through a compact delta encoding:
//!
//! ```
//! # use mend::diff;
//! use mend::{from_delta, to_delta, original_text};
//!
//! let diffs = diff("jumps over the lazy", "jumped over a lazy");
//! let delta = to_delta(&diffs);
//! assert_eq!(from_delta(&original_text(&diffs), &delta).unwrap(), diffs);
//! ```
//!
//! ## Creating and applying a patch
//!
//! A [`Patch`] between two texts can be created, serialized with its
//! [`Display`] impl, parsed back with [`str::parse`], and applied to a
//! third text that has meanwhile drifted:
//!
//! ```
//! use mend::{apply, create_patch, Patch};
//!
//! let original = "The quick brown fox jumps over the lazy dog.";
//! let modified = "That quick brown fox jumped over a lazy dog.";
//!
//! let patch = create_patch(original, modified);
//! let serialized = patch.to_string();
//! let patch: Patch = serialized.parse().unwrap();
//!
//! // The base text no longer matches the original, but every hunk still
//! // finds its anchor.
//! let (patched, applied) = apply("The quick red rabbit jumps over the tired tiger.", &patch);
//! assert_eq!(patched, "That quick red rabbit jumped over a tired tiger.");
//! assert!(applied.into_iter().all(|ok| ok));
//! ```
//!
//! ## Fuzzy locating
//!
//! ```
//! use mend::locate;
//!
//! assert_eq!(locate("abcdefghijk", "fgh", 0), Some(5));
//! assert_eq!(locate("abcdefghijk", "bxy", 1), None);
//! ```
//!
//! ## Tuning
//!
//! Every entry point is also available on [`Options`], which carries the
//! diff timeout, match threshold and distance, and patch construction
//! knobs.
//!
//! [Myers' diff algorithm]: http://www.xmailserver.org/diff2.pdf
//! [Bitap]: https://en.wikipedia.org/wiki/Bitap_algorithm
//! [`Display`]: std::fmt::Display

mod bitap;
mod diff;
mod options;
mod patch;
mod text;

pub use bitap::locate;
pub use diff::{
    cleanup_merge, cleanup_semantic, cleanup_semantic_lossless, diff, from_delta, levenshtein,
    modified_text, original_text, pretty_console, pretty_html, to_delta, translate_position, Diff,
    ParseDeltaError,
};
pub use options::Options;
pub use patch::{apply, create_patch, Hunk, HunkRange, ParsePatchError, Patch};
pub use text::DecodeError;
