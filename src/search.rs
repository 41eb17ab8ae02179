use crate::bktree::BkTree;
use crate::grouping::{self, Grouping};
use crate::metric::HammingMetric;
use crate::model::{Fingerprint, Record};
use ahash::AHashSet;
use tracing::debug;

/// Turns a raw record collection into a queryable index in one step.
///
/// `build` partitions the records by exact fingerprint (retained as the
/// lookup table) and indexes the distinct fingerprints in a BK-tree.
/// Instances are built fresh per query session and discarded after it;
/// a shared instance carries no thread-safety guarantee.
pub struct SimilaritySearch {
    by_hash: Grouping,
    tree: BkTree<HammingMetric>,
}

impl SimilaritySearch {
    /// Index a snapshot of records. An empty collection yields an index
    /// that answers every subsequent query with empty results.
    pub fn build(records: &[Record]) -> Self {
        let by_hash = grouping::group_by_hash(records);
        let tree = BkTree::build(by_hash.keys(), HammingMetric);
        debug!(
            "Indexed {} records under {} distinct fingerprints",
            records.len(),
            tree.len(),
        );
        Self { by_hash, tree }
    }

    /// Every distinct fingerprint in the indexed snapshot.
    pub fn fingerprints(&self) -> impl Iterator<Item = Fingerprint> + '_ {
        self.by_hash.keys()
    }

    /// Fingerprints with more than one byte-identical record.
    ///
    /// Read-only: the exact-hash table is left intact. Callers wanting
    /// the pruned table apply `grouping::remove_single_member_groups`
    /// to their own grouping explicitly.
    pub fn exact_matches(&self) -> AHashSet<Fingerprint> {
        self.by_hash
            .iter()
            .filter(|(_, members)| members.len() > 1)
            .map(|(key, _)| key)
            .collect()
    }

    /// All records whose fingerprint is within `radius` bits of
    /// `query`, grouped under each matching fingerprint. Every returned
    /// group has at least one member.
    pub fn distance_match(&self, query: Fingerprint, radius: u32) -> Grouping {
        let mut result = Grouping::new();
        for key in self.tree.search_within(query, radius) {
            if let Some(members) = self.by_hash.get(key) {
                result.add_all(key, members.iter().cloned());
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // distinct keys {1, 2, 3, 6} with multiplicities 1, 2, 2, 3
    fn seed_records() -> Vec<Record> {
        [1u64, 2, 2, 3, 3, 6, 6, 6]
            .iter()
            .enumerate()
            .map(|(i, &fp)| Record::new(format!("/img/{i}.jpg"), fp))
            .collect()
    }

    #[test]
    fn test_distance_match_radius_zero() {
        let search = SimilaritySearch::build(&seed_records());
        let result = search.distance_match(2, 0);
        assert_eq!(result.len(), 1);
        assert_eq!(result.get(2).map(|g| g.len()), Some(2));
    }

    #[test]
    fn test_distance_match_radius_one() {
        let search = SimilaritySearch::build(&seed_records());
        let result = search.distance_match(2, 1);
        assert_eq!(result.len(), 3);
        assert!(result.contains_key(2));
        assert!(result.contains_key(3));
        assert!(result.contains_key(6));
    }

    #[test]
    fn test_distance_match_radius_two() {
        let search = SimilaritySearch::build(&seed_records());
        let result = search.distance_match(2, 2);
        assert_eq!(result.len(), 4);
        assert!(result.contains_key(1));
        assert_eq!(result.get(6).map(|g| g.len()), Some(3));
    }

    #[test]
    fn test_exact_matches_are_multi_member_keys() {
        let search = SimilaritySearch::build(&seed_records());
        let exact = search.exact_matches();
        assert_eq!(exact.len(), 3);
        assert!(exact.contains(&2));
        assert!(exact.contains(&3));
        assert!(exact.contains(&6));
        assert!(!exact.contains(&1));
    }

    #[test]
    fn test_exact_matches_does_not_mutate() {
        let search = SimilaritySearch::build(&seed_records());
        let _ = search.exact_matches();
        let _ = search.exact_matches();
        // singleton key 1 still answers distance queries afterwards
        let result = search.distance_match(1, 0);
        assert_eq!(result.get(1).map(|g| g.len()), Some(1));
    }

    #[test]
    fn test_empty_input_answers_empty() {
        let search = SimilaritySearch::build(&[]);
        assert!(search.exact_matches().is_empty());
        assert!(search.distance_match(42, 64).is_empty());
    }
}
