use ahash::AHashMap;
use lookalike::{
    Error, Fingerprint, PostStage, QueryPipelineBuilder, Record, RecordSource, SimilaritySearch,
    TagSource,
};
use std::sync::Arc;

struct InMemoryRepository {
    records: Vec<Record>,
    ignored: Vec<String>,
    tags: AHashMap<String, Vec<Fingerprint>>,
}

impl RecordSource for InMemoryRepository {
    fn all(&self) -> Result<Vec<Record>, Error> {
        Ok(self.records.clone())
    }

    fn all_without_ignored(&self) -> Result<Vec<Record>, Error> {
        Ok(self
            .records
            .iter()
            .filter(|r| !self.ignored.contains(&r.path))
            .cloned()
            .collect())
    }

    fn by_path(&self, prefix: &str) -> Result<Vec<Record>, Error> {
        Ok(self
            .records
            .iter()
            .filter(|r| r.path.starts_with(prefix))
            .cloned()
            .collect())
    }
}

impl TagSource for InMemoryRepository {
    fn fingerprints_with_tag(&self, tag: &str) -> Result<Vec<Fingerprint>, Error> {
        Ok(self.tags.get(tag).cloned().unwrap_or_default())
    }
}

fn make_record(path: &str, fingerprint: Fingerprint) -> Record {
    Record::new(path, fingerprint)
}

/// A small photo library: an exact-duplicate pair, a near-duplicate
/// cluster one bit apart, and two unrelated singles.
fn photo_library() -> Vec<Record> {
    vec![
        make_record("/photos/beach.jpg", 0xDEADBEEF00000000),
        make_record("/backup/beach.jpg", 0xDEADBEEF00000000),
        make_record("/photos/beach-edit.jpg", 0xDEADBEEF00000001),
        make_record("/photos/cat.jpg", 0x1234567812345678),
        make_record("/photos/dog.jpg", 0x0F0F0F0F0F0F0F0F),
    ]
}

fn repository() -> Arc<InMemoryRepository> {
    let mut tags = AHashMap::new();
    tags.insert(
        "beach".to_string(),
        vec![0xDEADBEEF00000000u64, 0xDEADBEEF00000001],
    );
    Arc::new(InMemoryRepository {
        records: photo_library(),
        ignored: vec!["/backup/beach.jpg".to_string()],
        tags,
    })
}

#[test]
fn test_exact_duplicate_pipeline_end_to_end() {
    let pipeline = QueryPipelineBuilder::new(repository())
        .post_stage(PostStage::RemoveSingleMemberGroups)
        .build()
        .unwrap();

    let grouping = pipeline.query(None);
    // only the byte-identical beach pair survives the prune
    assert_eq!(grouping.len(), 1);
    let members = grouping.get(0xDEADBEEF00000000).unwrap();
    assert_eq!(members.len(), 2);
    assert!(members.contains(&make_record("/photos/beach.jpg", 0xDEADBEEF00000000)));
    assert!(members.contains(&make_record("/backup/beach.jpg", 0xDEADBEEF00000000)));
}

#[test]
fn test_radius_pipeline_finds_near_duplicates() {
    let pipeline = QueryPipelineBuilder::new(repository())
        .radius(1)
        .post_stage(PostStage::RemoveSingleMemberGroups)
        .build()
        .unwrap();

    let grouping = pipeline.query(None);
    // the edited beach shot joins the originals; cat and dog stay alone
    assert_eq!(grouping.len(), 2);
    assert_eq!(grouping.get(0xDEADBEEF00000000).map(|g| g.len()), Some(3));
    assert_eq!(grouping.get(0xDEADBEEF00000001).map(|g| g.len()), Some(3));
}

#[test]
fn test_remove_duplicate_sets_collapses_mirror_seeds() {
    // radius 1 yields the same three-record cluster from both beach
    // seeds; the duplicate-set prune keeps exactly one of them
    let pipeline = QueryPipelineBuilder::new(repository())
        .radius(1)
        .post_stage(PostStage::RemoveSingleMemberGroups)
        .post_stage(PostStage::RemoveDuplicateSets)
        .build()
        .unwrap();

    let grouping = pipeline.query(None);
    assert_eq!(grouping.len(), 1);
    let (_, members) = grouping.iter().next().unwrap();
    assert_eq!(members.len(), 3);
}

#[test]
fn test_scoped_query_restricts_fetch() {
    let pipeline = QueryPipelineBuilder::new(repository())
        .post_stage(PostStage::RemoveSingleMemberGroups)
        .build()
        .unwrap();

    // nothing under /photos/ is byte-identical to anything else there
    let grouping = pipeline.query(Some("/photos/"));
    assert!(grouping.is_empty());
}

#[test]
fn test_exclude_ignored_drops_backup_copy() {
    let pipeline = QueryPipelineBuilder::new(repository())
        .exclude_ignored()
        .post_stage(PostStage::RemoveSingleMemberGroups)
        .build()
        .unwrap();

    // the backup copy was the only exact duplicate
    assert!(pipeline.query(None).is_empty());
}

#[test]
fn test_tag_driven_pipeline_seeds_from_tagged_fingerprints() {
    let repo = repository();
    let pipeline = QueryPipelineBuilder::new(repo.clone())
        .tag_source(repo)
        .tagged("beach")
        .radius(1)
        .build()
        .unwrap();

    let grouping = pipeline.query(None);
    assert_eq!(grouping.len(), 2);
    assert!(!grouping.contains_key(0x1234567812345678));
}

#[test]
fn test_tag_without_matches_yields_empty_grouping() {
    let repo = repository();
    let pipeline = QueryPipelineBuilder::new(repo.clone())
        .tag_source(repo)
        .tagged("no-such-tag")
        .radius(1)
        .build()
        .unwrap();

    assert!(pipeline.query(None).is_empty());
}

#[test]
fn test_builder_produces_independent_pipelines() {
    let mut builder = QueryPipelineBuilder::new(repository());
    let exact = builder.build().unwrap();
    builder
        .radius(1)
        .post_stage(PostStage::RemoveSingleMemberGroups);
    let near = builder.build().unwrap();

    // the earlier pipeline kept its exact-hash, no-prune configuration
    assert_eq!(exact.query(None).len(), 4);
    assert_eq!(near.query(None).len(), 2);
}

#[test]
fn test_empty_repository_boundary() {
    let empty = Arc::new(InMemoryRepository {
        records: Vec::new(),
        ignored: Vec::new(),
        tags: AHashMap::new(),
    });
    let pipeline = QueryPipelineBuilder::new(empty)
        .radius(4)
        .build()
        .unwrap();
    assert!(pipeline.query(None).is_empty());

    let search = SimilaritySearch::build(&[]);
    assert!(search.exact_matches().is_empty());
    assert!(search.distance_match(0xDEADBEEF, 64).is_empty());
}

#[test]
fn test_query_with_stats_accounts_for_every_phase() {
    let pipeline = QueryPipelineBuilder::new(repository()).build().unwrap();
    let (grouping, stats) = pipeline.query_with_stats(None);
    assert_eq!(stats.records_fetched, 5);
    assert_eq!(stats.groups, grouping.len());
    assert_eq!(grouping.len(), 4);
}
