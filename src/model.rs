use serde::{Deserialize, Serialize};

/// A 64-bit perceptual hash summarizing an image's visual content.
/// Equality is bitwise; visually similar images have fingerprints with
/// low Hamming distance.
pub type Fingerprint = u64;

/// Bit width of a fingerprint; the largest meaningful search radius.
pub const FINGERPRINT_BITS: u32 = 64;

/// A fingerprinted image known to the system.
///
/// Immutable value object: equality and hashing cover the (path,
/// fingerprint) pair, so collections of records have set semantics.
/// Many records may share one fingerprint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Record {
    pub path: String,
    pub fingerprint: Fingerprint,
}

impl Record {
    pub fn new(path: impl Into<String>, fingerprint: Fingerprint) -> Self {
        Self {
            path: path.into(),
            fingerprint,
        }
    }
}
