use crate::metric::Metric;
use crate::model::Fingerprint;
use ahash::{AHashMap, AHashSet};

/// One node in the tree arena. Children are keyed by their exact
/// distance to this node's key; at most one child exists per distance.
#[derive(Debug)]
struct Node {
    key: Fingerprint,
    children: AHashMap<u32, usize>,
}

/// Burkhard–Keller tree over fingerprints, generic over the metric.
///
/// Nodes live in an arena and address each other by index, so bulk
/// builds stay allocation-friendly and dropping the tree never recurses
/// through ownership chains. Every distinct fingerprint appears exactly
/// once; callers dedupe before indexing (the grouping carries the
/// multiplicity, not the tree).
#[derive(Debug)]
pub struct BkTree<M: Metric> {
    metric: M,
    nodes: Vec<Node>,
}

impl<M: Metric> BkTree<M> {
    pub fn new(metric: M) -> Self {
        Self {
            metric,
            nodes: Vec::new(),
        }
    }

    /// Build a tree from a sequence of distinct keys. The first key
    /// encountered becomes the root; root choice affects balance only,
    /// never correctness.
    pub fn build<I>(keys: I, metric: M) -> Self
    where
        I: IntoIterator<Item = Fingerprint>,
    {
        let mut tree = Self::new(metric);
        for key in keys {
            tree.insert(key);
        }
        tree
    }

    /// Insert a key. Descends by exact distance until a free distance
    /// slot is found, then attaches a leaf there. Inserting a key that
    /// is already indexed is a no-op (the descent terminates at
    /// distance 0).
    pub fn insert(&mut self, key: Fingerprint) {
        if self.nodes.is_empty() {
            self.nodes.push(Node {
                key,
                children: AHashMap::new(),
            });
            return;
        }

        let mut current = 0usize;
        loop {
            let d = self.metric.distance(key, self.nodes[current].key);
            if d == 0 {
                // key already indexed
                return;
            }
            match self.nodes[current].children.get(&d) {
                Some(&child) => current = child,
                None => {
                    let leaf = self.nodes.len();
                    self.nodes.push(Node {
                        key,
                        children: AHashMap::new(),
                    });
                    self.nodes[current].children.insert(d, leaf);
                    return;
                }
            }
        }
    }

    /// All indexed keys whose distance to `query` is <= `radius`
    /// (inclusive). The query key itself need not be indexed.
    ///
    /// Work-list traversal with triangle-inequality pruning: once a
    /// node's distance `d` to the query is known, only children on
    /// edges within `[d - radius, d + radius]` can hold a match, so
    /// every other subtree is skipped.
    pub fn search_within(&self, query: Fingerprint, radius: u32) -> AHashSet<Fingerprint> {
        let mut matches = AHashSet::new();
        if self.nodes.is_empty() {
            return matches;
        }

        let mut pending = vec![0usize];
        while let Some(index) = pending.pop() {
            let node = &self.nodes[index];
            let d = self.metric.distance(query, node.key);
            if d <= radius {
                matches.insert(node.key);
            }

            let low = d.saturating_sub(radius);
            let high = d.saturating_add(radius);
            for (&edge, &child) in &node.children {
                if (low..=high).contains(&edge) {
                    pending.push(child);
                }
            }
        }
        matches
    }

    /// Number of distinct keys indexed.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
