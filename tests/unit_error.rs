/// Unit tests for the error taxonomy and its messages

use ferrous_ioc::{ArgumentError, ConstructionStage, DiError, PanicError, ResolutionChain};
use std::error::Error as _;

fn chain(keys: &[&str]) -> ResolutionChain {
    ResolutionChain::from(keys.iter().map(|k| k.to_string()).collect::<Vec<_>>())
}

#[test]
fn test_service_not_registered_display() {
    let error = DiError::ServiceNotRegistered {
        key: "app::Repo_sql".to_string(),
        chain: chain(&["app::Api", "app::Repo_sql"]),
    };
    assert_eq!(
        error.to_string(),
        "service not registered: app::Repo_sql (resolving app::Api -> app::Repo_sql)"
    );
    assert_eq!(error.chain().map(ResolutionChain::len), Some(2));
}

#[test]
fn test_no_constructor_display() {
    let error = DiError::NoConstructorAvailable {
        key: "app::Store".to_string(),
        implementation: "app::MemoryStore",
    };
    assert_eq!(error.to_string(), "no constructor available on app::MemoryStore for app::Store");
    assert!(error.chain().is_none());
}

#[test]
fn test_construction_failed_keeps_source() {
    let error = DiError::ConstructionFailed {
        key: "app::Client".to_string(),
        implementation: "app::HttpClient",
        stage: ConstructionStage::Method("connect"),
        source: Box::new(ArgumentError::OutOfRange { index: 2, len: 1 }),
    };

    assert_eq!(
        error.to_string(),
        "construction of app::HttpClient for app::Client failed in method `connect`: \
         argument 2 is out of range (1 arguments supplied)"
    );
    let source = error.source().expect("source is exposed");
    assert_eq!(
        source.downcast_ref::<ArgumentError>(),
        Some(&ArgumentError::OutOfRange { index: 2, len: 1 })
    );
}

#[test]
fn test_stage_display() {
    assert_eq!(ConstructionStage::Constructor.to_string(), "constructor");
    assert_eq!(ConstructionStage::Property("logger").to_string(), "property `logger`");
    assert_eq!(ConstructionStage::Method("init").to_string(), "method `init`");
}

#[test]
fn test_parameter_mismatch_display() {
    let error = DiError::ParameterMismatch {
        key: "app::Settings".to_string(),
        supplied: 1,
        required: 3,
    };
    assert_eq!(
        error.to_string(),
        "parameter mismatch for app::Settings: 1 constants supplied, 3 external parameters declared"
    );
}

#[test]
fn test_circular_and_depth_display() {
    let error = DiError::CircularDependency(chain(&["A", "B", "A"]));
    assert_eq!(error.to_string(), "circular dependency: A -> B -> A");
    assert_eq!(error.chain().and_then(ResolutionChain::requested), Some("A"));
    assert_eq!(error.chain().and_then(ResolutionChain::last), Some("A"));

    assert_eq!(DiError::DepthExceeded(256).to_string(), "max resolution depth 256 exceeded");
}

#[test]
fn test_type_mismatch_and_configuration_display() {
    let error = DiError::TypeMismatch {
        key: "u32".to_string(),
        expected: "u32",
    };
    assert_eq!(error.to_string(), "type mismatch for u32: expected u32");

    let error = DiError::Configuration {
        key: "FERROUS_IOC_MAX_DEPTH".to_string(),
        value: "deep".to_string(),
    };
    assert_eq!(error.to_string(), "invalid configuration value for FERROUS_IOC_MAX_DEPTH: \"deep\"");
}

#[test]
fn test_argument_error_display() {
    assert_eq!(
        ArgumentError::TypeMismatch { index: 0, expected: "u16" }.to_string(),
        "argument 0 is not a `u16`"
    );
}

#[test]
fn test_panic_error_display() {
    assert_eq!(PanicError("boom".to_string()).to_string(), "panicked: boom");
}

#[test]
fn test_chain_accessors() {
    let empty = ResolutionChain::default();
    assert!(empty.is_empty());
    assert_eq!(empty.requested(), None);
    assert_eq!(empty.to_string(), "");

    let path = chain(&["a", "b", "c"]);
    assert_eq!(path.iter().collect::<Vec<_>>(), vec!["a", "b", "c"]);
    assert_eq!(path.requested(), Some("a"));
    assert_eq!(path.last(), Some("c"));
}
