use crate::model::Fingerprint;

/// A discrete metric over fingerprints. The BK-tree is generic over the
/// metric; any implementation must satisfy the metric axioms (identity
/// of indiscernibles, symmetry, triangle inequality) or radius-search
/// pruning will drop valid matches.
pub trait Metric {
    fn distance(&self, a: Fingerprint, b: Fingerprint) -> u32;
}

/// Hamming distance: the number of differing bits between two
/// fingerprints. Range 0..=64.
#[derive(Debug, Clone, Copy, Default)]
pub struct HammingMetric;

impl Metric for HammingMetric {
    fn distance(&self, a: Fingerprint, b: Fingerprint) -> u32 {
        (a ^ b).count_ones()
    }
}
