//! Content fingerprints used to correlate status lines with inputs

use sha2::{Digest, Sha256};

/// Hex-encoded SHA-256 digest of the UTF-8 bytes of `content`
pub fn fingerprint(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}
