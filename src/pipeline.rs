use crate::config::EngineConfig;
use crate::error::Error;
use crate::grouping::{self, Grouping};
use crate::model::{Fingerprint, Record, FINGERPRINT_BITS};
use crate::search::SimilaritySearch;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Supplies fingerprinted records to the fetch stage. Implementations
/// wrap whatever storage the host application uses; blocking inside an
/// implementation is opaque to the pipeline.
pub trait RecordSource {
    fn all(&self) -> Result<Vec<Record>, Error>;
    fn all_without_ignored(&self) -> Result<Vec<Record>, Error>;
    fn by_path(&self, prefix: &str) -> Result<Vec<Record>, Error>;
}

/// Resolves a tag label to the fingerprints carrying it.
pub trait TagSource {
    fn fingerprints_with_tag(&self, tag: &str) -> Result<Vec<Fingerprint>, Error>;
}

/// A post-processing step applied to the grouping after the grouping
/// stage. Stages mutate the grouping in place and run left-to-right in
/// registration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostStage {
    RemoveSingleMemberGroups,
    RemoveDuplicateSets,
}

impl PostStage {
    fn apply(self, grouping: &mut Grouping) {
        match self {
            PostStage::RemoveSingleMemberGroups => {
                grouping::remove_single_member_groups(grouping)
            }
            PostStage::RemoveDuplicateSets => grouping::remove_duplicate_sets(grouping),
        }
    }
}

#[derive(Clone)]
enum GroupingMode {
    ExactHash,
    TagDriven {
        tag: String,
        source: Arc<dyn TagSource>,
    },
}

/// Per-query timings and counts, in the shape the rest of the system
/// reports phase results.
#[derive(Debug)]
pub struct QueryStats {
    pub fetch_duration: Duration,
    pub group_duration: Duration,
    pub post_duration: Duration,
    pub records_fetched: usize,
    pub groups: usize,
}

/// A frozen fetch → group → post-process query. Built by
/// [`QueryPipelineBuilder`]; each instance is immutable and owns `Arc`
/// handles to its collaborators.
///
/// Queries are best-effort: a failing collaborator is logged and
/// replaced with an empty result, never propagated — the pipeline
/// always returns a (possibly empty) grouping.
#[derive(Clone)]
pub struct QueryPipeline {
    records: Arc<dyn RecordSource>,
    include_ignored: bool,
    radius: u32,
    mode: GroupingMode,
    post_stages: Vec<PostStage>,
}

impl QueryPipeline {
    /// Run the query for an optional path-prefix scope.
    pub fn query(&self, scope: Option<&str>) -> Grouping {
        self.query_with_stats(scope).0
    }

    /// Run the full query pipeline:
    /// 1. Fetch records from the record source (scoped, if requested)
    /// 2. Group them (exact hash, radius search, or tag-driven)
    /// 3. Apply post-processing stages in registration order
    pub fn query_with_stats(&self, scope: Option<&str>) -> (Grouping, QueryStats) {
        info!("Running similarity query (scope: {:?})...", scope);

        let fetch_start = Instant::now();
        let records = self.fetch(scope);
        let fetch_duration = fetch_start.elapsed();
        debug!(
            "Fetch completed in {:.3}s — {} records",
            fetch_duration.as_secs_f64(),
            records.len(),
        );

        let group_start = Instant::now();
        let mut grouping = self.group(&records);
        let group_duration = group_start.elapsed();
        debug!(
            "Grouping completed in {:.3}s — {} groups",
            group_duration.as_secs_f64(),
            grouping.len(),
        );

        let post_start = Instant::now();
        for stage in &self.post_stages {
            stage.apply(&mut grouping);
        }
        let post_duration = post_start.elapsed();
        debug!(
            "Post-processing completed in {:.3}s — {} groups remain",
            post_duration.as_secs_f64(),
            grouping.len(),
        );

        let stats = QueryStats {
            fetch_duration,
            group_duration,
            post_duration,
            records_fetched: records.len(),
            groups: grouping.len(),
        };
        (grouping, stats)
    }

    fn fetch(&self, scope: Option<&str>) -> Vec<Record> {
        let fetched = match scope {
            Some(prefix) => self.records.by_path(prefix),
            None if self.include_ignored => self.records.all(),
            None => self.records.all_without_ignored(),
        };
        match fetched {
            Ok(records) => records,
            Err(e) => {
                warn!("Record fetch failed, continuing with no records: {}", e);
                Vec::new()
            }
        }
    }

    fn group(&self, records: &[Record]) -> Grouping {
        match &self.mode {
            GroupingMode::ExactHash if self.radius == 0 => grouping::group_by_hash(records),
            GroupingMode::ExactHash => {
                let search = SimilaritySearch::build(records);
                let seeds: Vec<Fingerprint> = search.fingerprints().collect();
                collect_radius_groups(&search, &seeds, self.radius)
            }
            GroupingMode::TagDriven { tag, source } => {
                let seeds = match source.fingerprints_with_tag(tag) {
                    Ok(seeds) => seeds,
                    Err(e) => {
                        warn!(
                            "Tag lookup for '{}' failed, returning empty grouping: {}",
                            tag, e,
                        );
                        return Grouping::new();
                    }
                };
                let search = SimilaritySearch::build(records);
                collect_radius_groups(&search, &seeds, self.radius)
            }
        }
    }
}

/// One radius query per seed; every matched record lands in the seed's
/// group, so a group holds the full neighborhood of its seed.
fn collect_radius_groups(
    search: &SimilaritySearch,
    seeds: &[Fingerprint],
    radius: u32,
) -> Grouping {
    let mut result = Grouping::new();
    for &seed in seeds {
        let matched = search.distance_match(seed, radius);
        for (_, members) in matched.iter() {
            result.add_all(seed, members.iter().cloned());
        }
    }
    result
}

/// Assembles [`QueryPipeline`]s. Defaults: fetch all records including
/// ignored ones, exact-hash grouping at radius 0, no post-processing.
///
/// The builder stays usable after `build()`; each call captures the
/// configuration at that moment, so one builder can produce several
/// independent pipelines.
#[derive(Clone)]
pub struct QueryPipelineBuilder {
    records: Arc<dyn RecordSource>,
    tags: Option<Arc<dyn TagSource>>,
    include_ignored: bool,
    radius: u32,
    tag: Option<String>,
    post_stages: Vec<PostStage>,
}

impl QueryPipelineBuilder {
    pub fn new(records: Arc<dyn RecordSource>) -> Self {
        Self {
            records,
            tags: None,
            include_ignored: true,
            radius: 0,
            tag: None,
            post_stages: Vec::new(),
        }
    }

    /// Supply the tag-lookup collaborator. Required before building a
    /// tag-driven pipeline.
    pub fn tag_source(&mut self, tags: Arc<dyn TagSource>) -> &mut Self {
        self.tags = Some(tags);
        self
    }

    /// Swap the fetch stage to skip records marked ignored upstream.
    pub fn exclude_ignored(&mut self) -> &mut Self {
        self.include_ignored = false;
        self
    }

    /// Set the Hamming radius for the grouping stage. Validated at
    /// `build()`: a radius wider than the fingerprint is rejected.
    pub fn radius(&mut self, radius: u32) -> &mut Self {
        self.radius = radius;
        self
    }

    /// Swap the grouping stage to seed radius queries only from
    /// fingerprints carrying `tag`.
    pub fn tagged(&mut self, tag: impl Into<String>) -> &mut Self {
        self.tag = Some(tag.into());
        self
    }

    /// Append a post-processing stage; stages run in the order added.
    pub fn post_stage(&mut self, stage: PostStage) -> &mut Self {
        self.post_stages.push(stage);
        self
    }

    /// Map an [`EngineConfig`] onto the builder opt-ins.
    pub fn apply_config(&mut self, config: &EngineConfig) -> &mut Self {
        self.include_ignored = config.include_ignored;
        self.radius = config.radius;
        if let Some(tag) = &config.tag {
            self.tag = Some(tag.clone());
        }
        self
    }

    /// Freeze the current configuration into an immutable pipeline.
    pub fn build(&self) -> Result<QueryPipeline, Error> {
        if self.radius > FINGERPRINT_BITS {
            return Err(Error::RadiusTooLarge(self.radius));
        }
        let mode = match &self.tag {
            Some(tag) => {
                let source = self.tags.clone().ok_or(Error::MissingTagSource)?;
                GroupingMode::TagDriven {
                    tag: tag.clone(),
                    source,
                }
            }
            None => GroupingMode::ExactHash,
        };
        Ok(QueryPipeline {
            records: Arc::clone(&self.records),
            include_ignored: self.include_ignored,
            radius: self.radius,
            mode,
            post_stages: self.post_stages.clone(),
        })
    }
}
