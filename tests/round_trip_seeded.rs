//! Seeded differential tests for the diff/delta/patch round-trip
//! properties. Deterministic: a fixed-seed LCG drives every case.

use mend::{
    apply, cleanup_merge, cleanup_semantic, create_patch, diff, from_delta, modified_text,
    original_text, to_delta, Options, Patch,
};

struct Lcg(u64);

impl Lcg {
    fn new(seed: u64) -> Self {
        Self(seed)
    }

    fn next(&mut self) -> u64 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.0
    }

    fn below(&mut self, n: usize) -> usize {
        (self.next() >> 33) as usize % n
    }
}

// Small alphabet with newlines and spaces, to exercise the semantic
// boundary logic and produce plenty of accidental repetition.
fn random_text(rng: &mut Lcg, max_len: usize) -> String {
    const ALPHABET: &[u8] = b"abc \n";
    let len = rng.below(max_len + 1);
    (0..len)
        .map(|_| ALPHABET[rng.below(ALPHABET.len())] as char)
        .collect()
}

#[test]
fn diff_reconstructs_both_texts() {
    let mut rng = Lcg::new(0x5eed_0001);
    for _ in 0..300 {
        let old = random_text(&mut rng, 60);
        let new = random_text(&mut rng, 60);
        let diffs = diff(&old, &new);
        assert_eq!(original_text(&diffs), old, "old: {:?} new: {:?}", old, new);
        assert_eq!(modified_text(&diffs), new, "old: {:?} new: {:?}", old, new);
    }
}

#[test]
fn cleanup_passes_are_idempotent() {
    let mut rng = Lcg::new(0x5eed_0002);
    for _ in 0..200 {
        let old = random_text(&mut rng, 40);
        let new = random_text(&mut rng, 40);
        let mut diffs = diff(&old, &new);

        let normalized = diffs.clone();
        cleanup_merge(&mut diffs);
        assert_eq!(diffs, normalized);

        cleanup_semantic(&mut diffs);
        let once = diffs.clone();
        cleanup_semantic(&mut diffs);
        assert_eq!(diffs, once);
    }
}

#[test]
fn delta_round_trips() {
    let mut rng = Lcg::new(0x5eed_0003);
    for _ in 0..200 {
        let old = random_text(&mut rng, 50);
        let new = random_text(&mut rng, 50);
        let diffs = diff(&old, &new);
        let delta = to_delta(&diffs);
        assert_eq!(
            from_delta(&old, &delta).expect("delta must parse"),
            diffs,
            "old: {:?} new: {:?}",
            old,
            new
        );
    }
}

#[test]
fn patch_text_round_trips() {
    let mut rng = Lcg::new(0x5eed_0004);
    for _ in 0..200 {
        let old = random_text(&mut rng, 50);
        let new = random_text(&mut rng, 50);
        let patch = create_patch(&old, &new);
        let serialized = patch.to_string();
        let reparsed: Patch = serialized.parse().expect("patch text must parse");
        assert_eq!(reparsed, patch, "old: {:?} new: {:?}", old, new);
    }
}

#[test]
fn patches_apply_cleanly_to_their_own_source() {
    let mut rng = Lcg::new(0x5eed_0005);
    for _ in 0..200 {
        let old = random_text(&mut rng, 50);
        let new = random_text(&mut rng, 50);
        let patch = create_patch(&old, &new);
        let (patched, applied) = apply(&old, &patch);
        assert_eq!(patched, new, "old: {:?} new: {:?}", old, new);
        assert!(
            applied.into_iter().all(|ok| ok),
            "old: {:?} new: {:?}",
            old,
            new
        );
    }
}

#[test]
fn empty_patch_applies_to_anything() {
    let mut rng = Lcg::new(0x5eed_0006);
    for _ in 0..50 {
        let text = random_text(&mut rng, 50);
        let other = random_text(&mut rng, 50);
        let patch = create_patch(&text, &text);
        let (patched, applied) = apply(&other, &patch);
        assert_eq!(patched, other);
        assert!(applied.is_empty());
    }
}

#[test]
fn exactness_is_independent_of_the_timeout() {
    // Without a timeout the half-match speedup is disabled; both settings
    // must still produce valid edit scripts.
    let mut unlimited = Options::new();
    unlimited.set_diff_timeout(None);
    let mut rng = Lcg::new(0x5eed_0007);
    for _ in 0..100 {
        let old = random_text(&mut rng, 60);
        let new = random_text(&mut rng, 60);
        let diffs = unlimited.diff(&old, &new);
        assert_eq!(original_text(&diffs), old);
        assert_eq!(modified_text(&diffs), new);
    }
}
