//! Tests for execution metadata decoding.
//!
//! Validates port extraction (default port, tcp filtering, declaration
//! order) and run-as user extraction.

use recipebuilder::constants::{DEFAULT_PORT, DEFAULT_USER};
use recipebuilder::metadata::{extract_exposed_ports, extract_user, ExecutionMetadata, ExposedPort};
use recipebuilder::{Error, ErrorKind};

// =============================================================================
// Decoding Tests
// =============================================================================

#[test]
fn test_empty_blob_decodes_to_empty_metadata() {
    assert_eq!(ExecutionMetadata::parse("").unwrap(), ExecutionMetadata::default());
    assert_eq!(ExecutionMetadata::parse("  ").unwrap(), ExecutionMetadata::default());
}

#[test]
fn test_decodes_full_metadata() {
    let metadata = ExecutionMetadata::parse(
        r#"{"cmd":["/server"],"entrypoint":["/bin/sh","-c"],"workdir":"/app",
            "user":"app","ports":[{"Port":8080,"Protocol":"tcp"},{"Port":53,"Protocol":"udp"}]}"#,
    )
    .unwrap();

    assert_eq!(metadata.cmd, vec!["/server"]);
    assert_eq!(metadata.entrypoint, vec!["/bin/sh", "-c"]);
    assert_eq!(metadata.workdir, "/app");
    assert_eq!(metadata.user, "app");
    assert_eq!(
        metadata.exposed_ports,
        vec![
            ExposedPort { port: 8080, protocol: "tcp".to_string() },
            ExposedPort { port: 53, protocol: "udp".to_string() },
        ]
    );
}

#[test]
fn test_null_blob_decodes_to_empty_metadata() {
    assert_eq!(ExecutionMetadata::parse("null").unwrap(), ExecutionMetadata::default());
}

#[test]
fn test_null_fields_take_defaults() {
    let metadata = ExecutionMetadata::parse(r#"{"user":null,"cmd":null,"ports":null}"#).unwrap();
    assert_eq!(metadata, ExecutionMetadata::default());
    assert_eq!(extract_user(&metadata), DEFAULT_USER);
    assert_eq!(extract_exposed_ports(&metadata).unwrap().as_slice(), &[DEFAULT_PORT]);
}

#[test]
fn test_lowercase_port_fields_are_accepted() {
    let metadata =
        ExecutionMetadata::parse(r#"{"ports":[{"port":8080,"protocol":"tcp"}]}"#).unwrap();
    assert_eq!(extract_exposed_ports(&metadata).unwrap().as_slice(), &[8080]);
}

#[test]
fn test_port_without_protocol_is_unsupported() {
    let metadata = ExecutionMetadata::parse(r#"{"ports":[{"Port":8080}]}"#).unwrap();
    assert_eq!(metadata.exposed_ports[0].protocol, "");

    let err = extract_exposed_ports(&metadata).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NoSupportedPortsFound);
}

#[test]
fn test_unknown_fields_are_ignored() {
    let metadata = ExecutionMetadata::parse(r#"{"user":"app","labels":{"a":"b"}}"#).unwrap();
    assert_eq!(metadata.user, "app");
}

#[test]
fn test_invalid_json_is_malformed() {
    let err = ExecutionMetadata::parse("{not json").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedMetadata);
}

#[test]
fn test_wrong_shape_is_malformed() {
    let err = ExecutionMetadata::parse(r#"{"ports":"8080"}"#).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedMetadata);

    let err = ExecutionMetadata::parse("[1, 2]").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedMetadata);
}

// =============================================================================
// Port Extraction Tests
// =============================================================================

#[test]
fn test_no_declared_ports_yields_default() {
    let ports = extract_exposed_ports(&ExecutionMetadata::default()).unwrap();
    assert_eq!(ports.as_slice(), &[DEFAULT_PORT]);
}

#[test]
fn test_collects_tcp_ports_in_declaration_order() {
    let metadata = ExecutionMetadata::parse(
        r#"{"ports":[{"Port":9090,"Protocol":"tcp"},{"Port":53,"Protocol":"udp"},{"Port":8081,"Protocol":"tcp"}]}"#,
    )
    .unwrap();

    let ports = extract_exposed_ports(&metadata).unwrap();
    assert_eq!(ports.as_slice(), &[9090, 8081]);
    assert_eq!(ports.first(), 9090);
}

#[test]
fn test_only_udp_ports_is_error() {
    let metadata =
        ExecutionMetadata::parse(r#"{"ports":[{"Port":53,"Protocol":"udp"}]}"#).unwrap();

    let err = extract_exposed_ports(&metadata).unwrap_err();
    match err {
        Error::NoSupportedPortsFound { protocols } => assert_eq!(protocols, vec!["udp"]),
        other => panic!("unexpected error: {:?}", other),
    }
}

// =============================================================================
// User Extraction Tests
// =============================================================================

#[test]
fn test_user_from_metadata() {
    let metadata = ExecutionMetadata::parse(r#"{"user":"vcap"}"#).unwrap();
    assert_eq!(extract_user(&metadata), "vcap");
}

#[test]
fn test_missing_user_defaults_to_root() {
    assert_eq!(extract_user(&ExecutionMetadata::default()), DEFAULT_USER);
    assert_eq!(DEFAULT_USER, "root");
}
