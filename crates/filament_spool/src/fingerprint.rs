//! Content fingerprints using xxHash3.
//!
//! Rendered output is compared between commits by fingerprint rather than by
//! keeping whole serialized snapshots around.

use xxhash_rust::xxh3::xxh3_64;

/// Compute a 64-bit fingerprint of the given text.
#[inline]
pub fn fingerprint(content: &str) -> u64 {
    xxh3_64(content.as_bytes())
}

/// Compute the fingerprint of a string and return it as 16 hex characters.
#[inline]
pub fn fingerprint_hex(content: &str) -> String {
    format!("{:016x}", fingerprint(content))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_is_stable() {
        let html = "<div>0</div>";
        assert_eq!(fingerprint(html), fingerprint(html));
    }

    #[test]
    fn test_fingerprint_tracks_content() {
        assert_ne!(fingerprint("<div>0</div>"), fingerprint("<div>1</div>"));
    }

    #[test]
    fn test_hex_format() {
        let hex = fingerprint_hex("<span></span>");
        assert_eq!(hex.len(), 16);
        assert!(hex.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
