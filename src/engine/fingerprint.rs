// * Content Fingerprinting
// * SHA-256 over the cleaned content bytes, rendered as lowercase hex.
// * Callers compare fingerprints across crawls to skip unchanged or duplicate pages.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentFingerprint(String);

impl ContentFingerprint {
    // * Fingerprints the UTF-8 bytes of the given content
    pub fn compute(content: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(content.as_bytes());
        Self(format!("{:x}", hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// * Checks if content has changed by comparing fingerprints
pub fn has_content_changed(new: &ContentFingerprint, cached: &ContentFingerprint) -> bool {
    new != cached
}
