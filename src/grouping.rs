use crate::model::{Fingerprint, Record};
use ahash::{AHashMap, AHashSet};

/// Mapping from a fingerprint to the set of records sharing or matching
/// it under some criterion.
///
/// Member sets have set semantics: adding the same record twice
/// collapses to one entry. Keys with zero members are never
/// materialized — `add` is the only way a key appears, so every group
/// holds at least one record.
///
/// Mutation contracts are explicit: operations taking `&mut self`
/// (`add`, `remove`, `merge_from`, and the `remove_*` utilities below)
/// change the grouping in place; everything else is read-only.
#[derive(Debug, Clone, Default)]
pub struct Grouping {
    groups: AHashMap<Fingerprint, AHashSet<Record>>,
}

impl Grouping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a record to the group for `key`, creating the group if
    /// needed. Duplicate records collapse.
    pub fn add(&mut self, key: Fingerprint, record: Record) {
        self.groups.entry(key).or_default().insert(record);
    }

    /// Add every record in `records` to the group for `key`. An empty
    /// sequence leaves the grouping untouched; no zero-member group
    /// appears.
    pub fn add_all<I>(&mut self, key: Fingerprint, records: I)
    where
        I: IntoIterator<Item = Record>,
    {
        let mut records = records.into_iter().peekable();
        if records.peek().is_none() {
            return;
        }
        self.groups.entry(key).or_default().extend(records);
    }

    pub fn get(&self, key: Fingerprint) -> Option<&AHashSet<Record>> {
        self.groups.get(&key)
    }

    pub fn contains_key(&self, key: Fingerprint) -> bool {
        self.groups.contains_key(&key)
    }

    /// Remove a group, returning its members if it existed.
    pub fn remove(&mut self, key: Fingerprint) -> Option<AHashSet<Record>> {
        self.groups.remove(&key)
    }

    /// Union every group of `other` into this grouping.
    pub fn merge_from(&mut self, other: Grouping) {
        for (key, members) in other.groups {
            self.groups.entry(key).or_default().extend(members);
        }
    }

    /// Enumeration order of keys is unspecified.
    pub fn keys(&self) -> impl Iterator<Item = Fingerprint> + '_ {
        self.groups.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Fingerprint, &AHashSet<Record>)> {
        self.groups.iter().map(|(key, members)| (*key, members))
    }

    /// Number of groups (distinct keys).
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Partition records by exact fingerprint equality. Deterministic:
/// the same input always yields groups with identical membership.
pub fn group_by_hash(records: &[Record]) -> Grouping {
    let mut grouping = Grouping::new();
    for record in records {
        grouping.add(record.fingerprint, record.clone());
    }
    grouping
}

/// In-place removal of every group with exactly one member.
pub fn remove_single_member_groups(grouping: &mut Grouping) {
    grouping.groups.retain(|_, members| members.len() > 1);
}

/// In-place removal of redundant clusterings.
///
/// Each group's clustering identity is the set of distinct fingerprints
/// among its members. Two groups reached from different seed
/// fingerprints but covering the same key-set are redundant; only one
/// survives. A `hash_sum` over the key-set is used as a cheap pre-check
/// before falling back to full set comparison. Keys are visited in
/// sorted order so the survivor is deterministic run-to-run, though
/// only the survivor count is contractual.
pub fn remove_duplicate_sets(grouping: &mut Grouping) {
    let mut keys: Vec<Fingerprint> = grouping.keys().collect();
    keys.sort_unstable();

    let mut retained: AHashMap<u128, Vec<AHashSet<Fingerprint>>> = AHashMap::new();
    for key in keys {
        let key_set: AHashSet<Fingerprint> = match grouping.get(key) {
            Some(members) => members.iter().map(|r| r.fingerprint).collect(),
            None => continue,
        };
        let sum = hash_sum(key_set.iter().copied());
        let candidates = retained.entry(sum).or_default();
        if candidates.iter().any(|seen| *seen == key_set) {
            grouping.remove(key);
        } else {
            candidates.push(key_set);
        }
    }
}

/// Sum of the numeric fingerprint values; an empty sequence sums to
/// zero. Cheap canonical fingerprint of a group's key content for
/// set-equality pre-checks. `u128` cannot overflow until the sequence
/// approaches 2^64 maximal fingerprints.
pub fn hash_sum<I>(fingerprints: I) -> u128
where
    I: IntoIterator<Item = Fingerprint>,
{
    fingerprints.into_iter().map(u128::from).sum()
}
