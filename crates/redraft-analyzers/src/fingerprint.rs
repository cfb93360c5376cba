use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::types::{AnalyzerContext, DocumentMeta, TierFlags};

/// Canonical serialization of everything that affects an analyzer's output.
///
/// Field order is fixed by the struct definition, so two logically identical
/// requests serialize byte-identically regardless of how the caller built
/// its maps. Anything not listed here must not influence analyzer results.
#[derive(Serialize)]
struct FingerprintInput<'a> {
    analyzer_id: &'a str,
    text: &'a str,
    meta: &'a DocumentMeta,
    tiers: &'a TierFlags,
}

/// SHA-256 fingerprint identifying one analyzer invocation, hex-encoded.
pub fn fingerprint(analyzer_id: &str, text: &str, context: &AnalyzerContext) -> String {
    let input = FingerprintInput {
        analyzer_id,
        text,
        meta: &context.meta,
        tiers: &context.tiers,
    };
    use std::fmt::Write as _;

    // Serialization of a plain struct with string/bool fields cannot fail.
    let canonical = serde_json::to_vec(&input).unwrap_or_default();
    let digest = Sha256::digest(&canonical);
    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        let _ = write!(out, "{byte:02x}");
    }
    out
}
