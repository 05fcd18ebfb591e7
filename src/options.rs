use std::time::Duration;

/// Set of options for modifying how a diff is computed, how fuzzy locating
/// scores candidates, and how patches are built and applied.
///
/// ```
/// use mend::Options;
/// use std::time::Duration;
///
/// let mut options = Options::new();
/// options
///     .set_diff_timeout(Some(Duration::from_millis(500)))
///     .set_match_threshold(0.3);
///
/// let diffs = options.diff("original text", "edited text");
/// ```
#[derive(Debug, Clone)]
pub struct Options {
    /// Wall-clock budget for computing a diff. `None` means no limit and a
    /// guaranteed-minimal result.
    pub(crate) diff_timeout: Option<Duration>,
    /// Run a line-level diff first to identify changed areas (faster,
    /// slightly less optimal).
    pub(crate) checklines: bool,
    /// Cost of an empty edit operation in terms of edit characters.
    pub(crate) edit_cost: usize,
    /// At what point is no match declared (0.0 = perfection, 1.0 = very
    /// loose).
    pub(crate) match_threshold: f64,
    /// How far to search for a match (0 = exact location, 1000+ = broad
    /// match). A match this many units away from the expected location adds
    /// 1.0 to its score.
    pub(crate) match_distance: usize,
    /// When deleting a large block of text, how closely the contents must
    /// match the expected contents (0.0 = perfection, 1.0 = very loose).
    /// `match_threshold` controls how closely the end points must match.
    pub(crate) delete_threshold: f64,
    /// Chunk size for context length.
    pub(crate) patch_margin: usize,
    /// The number of bits in the fuzzy-locate bit vectors.
    pub(crate) match_max_bits: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            diff_timeout: Some(Duration::from_secs(1)),
            checklines: true,
            edit_cost: 4,
            match_threshold: 0.5,
            match_distance: 1000,
            delete_threshold: 0.5,
            patch_margin: 4,
            match_max_bits: 32,
        }
    }
}

impl Options {
    /// Construct a new `Options` with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the wall-clock budget for computing a diff, `None` for no limit.
    ///
    /// On expiry the diff degrades to a valid but non-minimal result rather
    /// than erroring.
    pub fn set_diff_timeout(&mut self, timeout: Option<Duration>) -> &mut Self {
        self.diff_timeout = timeout;
        self
    }

    /// Enable or disable the line-level pre-diff speedup.
    pub fn set_checklines(&mut self, checklines: bool) -> &mut Self {
        self.checklines = checklines;
        self
    }

    /// Set the cost of an empty edit operation for the efficiency cleanup.
    pub fn set_edit_cost(&mut self, edit_cost: usize) -> &mut Self {
        self.edit_cost = edit_cost;
        self
    }

    /// Set the score cutoff for fuzzy locating (0.0 = exact only, 1.0 =
    /// anything goes).
    pub fn set_match_threshold(&mut self, match_threshold: f64) -> &mut Self {
        self.match_threshold = match_threshold;
        self
    }

    /// Set how strongly positional drift penalizes a fuzzy match.
    pub fn set_match_distance(&mut self, match_distance: usize) -> &mut Self {
        self.match_distance = match_distance;
        self
    }

    /// Set the tolerated Levenshtein fraction when applying a large delete.
    pub fn set_delete_threshold(&mut self, delete_threshold: f64) -> &mut Self {
        self.delete_threshold = delete_threshold;
        self
    }

    /// Set the number of context units added around each hunk.
    pub fn set_patch_margin(&mut self, patch_margin: usize) -> &mut Self {
        self.patch_margin = patch_margin;
        self
    }

    /// Set the number of bits in the fuzzy-locate bit vectors.
    ///
    /// Also bounds the hunk size produced by [`split_max`]. The bit vectors
    /// are 64 bits wide, so values above 64 are rejected.
    ///
    /// [`split_max`]: Options::split_max
    pub fn set_match_max_bits(&mut self, match_max_bits: usize) -> &mut Self {
        assert!(
            (1..=64).contains(&match_max_bits),
            "match_max_bits must be between 1 and 64"
        );
        self.match_max_bits = match_max_bits;
        self
    }
}
