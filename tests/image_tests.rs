//! Tests for image reference canonicalization.
//!
//! Validates the official-index heuristic, tag/port disambiguation, and the
//! canonical `docker://` serialization against real-world image names.

use proptest::prelude::*;
use recipebuilder::image::{normalize_image_reference, ImageReference};
use recipebuilder::{Error, ErrorKind};

fn parts(reference: &str) -> (String, String, String) {
    let r = ImageReference::parse(reference).unwrap();
    (r.index, r.repository, r.tag)
}

fn triple(index: &str, repository: &str, tag: &str) -> (String, String, String) {
    (index.to_string(), repository.to_string(), tag.to_string())
}

// =============================================================================
// Official Index Tests
// =============================================================================

#[test]
fn test_single_segment_gets_library_namespace() {
    assert_eq!(parts("ubuntu"), triple("", "library/ubuntu", ""));
}

#[test]
fn test_single_segment_with_tag() {
    assert_eq!(parts("ubuntu:14.04"), triple("", "library/ubuntu", "14.04"));
}

#[test]
fn test_user_namespace_on_official_index() {
    assert_eq!(
        parts("cloudfoundry/lattice-app:latest"),
        triple("", "cloudfoundry/lattice-app", "latest")
    );
}

#[test]
fn test_explicit_default_index() {
    assert_eq!(
        parts("docker.io/library/nginx"),
        triple("docker.io", "library/nginx", "")
    );
}

#[test]
fn test_explicit_default_index_single_repo_segment() {
    assert_eq!(parts("docker.io/nginx:1.25"), triple("docker.io", "library/nginx", "1.25"));
}

#[test]
fn test_bare_localhost_is_official_repository() {
    assert_eq!(parts("localhost"), triple("", "library/localhost", ""));
}

// =============================================================================
// Private Index Tests
// =============================================================================

#[test]
fn test_registry_with_port_and_tag() {
    assert_eq!(
        parts("myregistry.com:5000/foo/bar:1.0"),
        triple("myregistry.com:5000", "foo/bar", "1.0")
    );
}

#[test]
fn test_registry_with_port_without_tag() {
    assert_eq!(
        parts("myregistry.com:5000/foo/bar"),
        triple("myregistry.com:5000", "foo/bar", "")
    );
}

#[test]
fn test_localhost_is_private_index() {
    assert_eq!(parts("localhost/foo"), triple("localhost", "foo", ""));
    assert_eq!(parts("localhost:5000/foo:dev"), triple("localhost:5000", "foo", "dev"));
}

#[test]
fn test_dotted_host_is_private_index() {
    assert_eq!(
        parts("ghcr.io/owner/repo:tag"),
        triple("ghcr.io", "owner/repo", "tag")
    );
}

#[test]
fn test_private_index_does_not_get_library_namespace() {
    assert_eq!(parts("quay.io/busybox"), triple("quay.io", "busybox", ""));
}

#[test]
fn test_host_port_without_dot_is_private_index() {
    assert_eq!(parts("registry:5000/app"), triple("registry:5000", "app", ""));
}

// =============================================================================
// Canonical URI Tests
// =============================================================================

#[test]
fn test_canonical_uri_official() {
    assert_eq!(
        normalize_image_reference("ubuntu").unwrap(),
        "docker:///library/ubuntu"
    );
    assert_eq!(
        normalize_image_reference("ubuntu:trusty").unwrap(),
        "docker:///library/ubuntu#trusty"
    );
}

#[test]
fn test_canonical_uri_private() {
    assert_eq!(
        normalize_image_reference("myregistry.com:5000/foo/bar:1.0").unwrap(),
        "docker://myregistry.com:5000/foo/bar#1.0"
    );
    assert_eq!(
        normalize_image_reference("docker.io/library/nginx").unwrap(),
        "docker://docker.io/library/nginx"
    );
}

#[test]
fn test_from_canonical_reads_back_parts() {
    let uri = "docker://myregistry.com:5000/foo/bar#1.0";
    let r = ImageReference::from_canonical(uri).unwrap();
    assert_eq!(r.index, "myregistry.com:5000");
    assert_eq!(r.repository, "foo/bar");
    assert_eq!(r.tag, "1.0");
    assert_eq!(r.to_uri(), uri);
}

#[test]
fn test_from_canonical_rejects_other_scheme() {
    let err = ImageReference::from_canonical("https://example.com/foo").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedImageReference);
}

#[test]
fn test_canonical_uri_escapes_unusual_characters() {
    let uri = normalize_image_reference("foo bar:v 1").unwrap();
    assert_eq!(uri, "docker:///library/foo%20bar#v%201");

    let r = ImageReference::from_canonical(&uri).unwrap();
    assert_eq!(r.repository, "library/foo bar");
    assert_eq!(r.tag, "v 1");
}

#[test]
fn test_is_official() {
    assert!(ImageReference::parse("ubuntu").unwrap().is_official());
    assert!(ImageReference::parse("docker.io/nginx").unwrap().is_official());
    assert!(!ImageReference::parse("quay.io/foo").unwrap().is_official());
}

// =============================================================================
// Rejection Tests
// =============================================================================

#[test]
fn test_scheme_is_rejected() {
    let err = normalize_image_reference("docker:///library/ubuntu").unwrap_err();
    assert!(matches!(err, Error::UnexpectedScheme { ref reference } if reference == "docker:///library/ubuntu"));
}

#[test]
fn test_private_index_without_repository_is_malformed() {
    let err = normalize_image_reference("quay.io/").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedImageReference);
}

#[test]
fn test_empty_reference_is_malformed() {
    let err = normalize_image_reference("").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedImageReference);
}

#[test]
fn test_overlong_reference_is_malformed() {
    let long = format!("foo/{}", "a".repeat(600));
    let err = normalize_image_reference(&long).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedImageReference);
}

// =============================================================================
// Idempotence
// =============================================================================

#[test]
fn test_renormalizing_canonical_name_is_stable() {
    for reference in [
        "ubuntu",
        "ubuntu:14.04",
        "docker.io/nginx",
        "cloudfoundry/lattice-app",
        "myregistry.com:5000/foo/bar:1.0",
        "localhost/foo",
    ] {
        let once = ImageReference::parse(reference).unwrap();
        let twice = ImageReference::parse(&once.image_name()).unwrap();
        assert_eq!(once, twice, "unstable for {}", reference);
    }
}

fn segment() -> impl Strategy<Value = String> {
    "[a-z0-9]{1,8}(-[a-z0-9]{1,4})?"
}

fn reference() -> impl Strategy<Value = String> {
    let host = prop_oneof![
        Just(String::new()),
        Just("docker.io/".to_string()),
        Just("localhost:5000/".to_string()),
        "[a-z]{2,6}\\.(com|io)(:[1-9][0-9]{1,3})?/",
    ];
    let tag = prop_oneof![Just(String::new()), ":[a-zA-Z0-9_.]{1,8}"];
    (host, prop::collection::vec(segment(), 1..4), tag)
        .prop_map(|(host, path, tag)| format!("{}{}{}", host, path.join("/"), tag))
}

proptest! {
    #[test]
    fn prop_canonicalization_is_idempotent(reference in reference()) {
        let once = ImageReference::parse(&reference).unwrap();
        let twice = ImageReference::parse(&once.image_name()).unwrap();
        prop_assert_eq!(&once, &twice);
    }

    #[test]
    fn prop_canonical_uri_round_trips(reference in reference()) {
        let parsed = ImageReference::parse(&reference).unwrap();
        let back = ImageReference::from_canonical(&parsed.to_uri()).unwrap();
        prop_assert_eq!(parsed, back);
    }
}
