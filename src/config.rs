use ::config::{Config, ConfigError, File as ConfigFile};
use serde::Deserialize;

/// Host-supplied engine defaults, typically loaded once at startup and
/// applied to a pipeline builder via
/// [`QueryPipelineBuilder::apply_config`](crate::QueryPipelineBuilder::apply_config).
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Hamming radius for the grouping stage; 0 means exact-hash only.
    #[serde(default)]
    pub radius: u32,
    /// Whether fetches include records marked ignored upstream.
    #[serde(default = "default_include_ignored")]
    pub include_ignored: bool,
    /// When set, grouping is seeded only from fingerprints carrying
    /// this tag.
    #[serde(default)]
    pub tag: Option<String>,
}

fn default_include_ignored() -> bool {
    true
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            radius: 0,
            include_ignored: true,
            tag: None,
        }
    }
}

pub fn load_configuration() -> Result<EngineConfig, ConfigError> {
    let builder = Config::builder()
        .add_source(ConfigFile::with_name("Config").required(false))
        .build()?;
    builder.try_deserialize::<EngineConfig>()
}
