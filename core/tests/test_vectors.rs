//! Verify normalization against JSON test vectors stored in `test-vectors/`.
//!
//! Each case names a failure (network, an HTTP status plus raw body, or an
//! unclassified reason) and the exact `{message, status}` it must produce.

use imagegen_core::{normalize, Failure, NormalizedError};

/// Build the `Failure` a vector case describes.
fn failure(case: &serde_json::Value) -> Failure {
    let f = &case["failure"];
    match f["kind"].as_str().unwrap() {
        "network" => Failure::Network {
            reason: f["reason"].as_str().unwrap().to_string(),
        },
        "http" => Failure::from_status(
            f["status"].as_u64().unwrap() as u16,
            f["body"].as_str().unwrap(),
        ),
        "unclassified" => Failure::Unclassified {
            status: None,
            reason: f["reason"].as_str().unwrap().to_string(),
        },
        other => panic!("unknown failure kind: {other}"),
    }
}

#[test]
fn normalize_test_vectors() {
    let raw = include_str!("../../test-vectors/normalize.json");
    let vectors: serde_json::Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let expected = NormalizedError::new(
            case["expected"]["message"].as_str().unwrap(),
            case["expected"]["status"].as_u64().unwrap() as u16,
        );

        assert_eq!(normalize(&failure(case)), expected, "{name}");
    }
}

#[test]
fn every_vector_failure_converts_into_a_normalized_error() {
    let raw = include_str!("../../test-vectors/normalize.json");
    let vectors: serde_json::Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let err: NormalizedError = failure(case).into();
        assert!(!err.message.is_empty(), "{name}: empty message");
        assert_ne!(err.status, 0, "{name}: zero status");
    }
}
