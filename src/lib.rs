pub mod bktree;
pub mod config;
pub mod error;
pub mod grouping;
pub mod metric;
pub mod model;
pub mod pipeline;
pub mod search;

pub use bktree::BkTree;
pub use crate::config::{load_configuration, EngineConfig};
pub use error::Error;
pub use grouping::Grouping;
pub use metric::{HammingMetric, Metric};
pub use model::{Fingerprint, Record, FINGERPRINT_BITS};
pub use pipeline::{
    PostStage, QueryPipeline, QueryPipelineBuilder, QueryStats, RecordSource, TagSource,
};
pub use search::SimilaritySearch;
