use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("search radius {0} exceeds the 64-bit fingerprint width")]
    RadiusTooLarge(u32),

    #[error("tag-driven grouping configured without a tag source")]
    MissingTagSource,

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Repository error: {0}")]
    Repository(String),
}
