//! JSON encoding of scan results.

use dirsnap_core::ScanResult;
use serde::Deserialize;
use tracing::debug;

use crate::error::Result;

/// Encode a scan result as compact UTF-8 JSON.
pub fn encode(result: &ScanResult) -> Result<Vec<u8>> {
    let bytes = serde_json::to_vec(result)?;
    debug!(bytes = bytes.len(), "encoded scan result");
    Ok(bytes)
}

/// Decode a scan result previously produced by [`encode`].
///
/// Every tree level nests two JSON values, so the nesting limit is lifted and
/// the stack grows on demand instead.
pub fn decode(bytes: &[u8]) -> Result<ScanResult> {
    let mut json = serde_json::Deserializer::from_slice(bytes);
    json.disable_recursion_limit();

    let result = ScanResult::deserialize(serde_stacker::Deserializer::new(&mut json))?;
    json.end()?;
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use dirsnap_core::Node;
    use std::time::{Duration, UNIX_EPOCH};

    #[test]
    fn test_subsecond_precision_survives() {
        let t = UNIX_EPOCH + Duration::from_nanos(1_700_000_000_123_456_789);
        let mut root = Node::new_directory("r", "/r", t);
        root.children.push(Node::new_file("f", "/r/f", 3, t));
        root.size = 3;

        let result = ScanResult {
            root,
            total_files: 1,
            total_folders: 0,
            scanned_at: DateTime::<Utc>::from(t),
            root_path: "/r".into(),
            warnings: Vec::new(),
        };

        let bytes = encode(&result).unwrap();
        let text = std::str::from_utf8(&bytes).unwrap();
        assert!(text.contains("2023-11-14T22:13:20.123456789Z"));
        assert_eq!(decode(&bytes).unwrap(), result);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(decode(b"{not json").is_err());
    }

    #[test]
    fn test_decode_rejects_trailing_data() {
        let result = ScanResult {
            root: Node::new_directory("r", "/r", UNIX_EPOCH),
            total_files: 0,
            total_folders: 0,
            scanned_at: DateTime::<Utc>::from(UNIX_EPOCH),
            root_path: "/r".into(),
            warnings: Vec::new(),
        };
        let mut bytes = encode(&result).unwrap();
        assert_eq!(decode(&bytes).unwrap(), result);

        bytes.extend_from_slice(b" {}");
        assert!(decode(&bytes).is_err());
    }
}
