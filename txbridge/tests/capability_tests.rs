//! Tests for the capability query on wrapped resources

#[path = "testutils/mod.rs"]
mod testutils;

use std::sync::Arc;
use testutils::test_fixture::TestFixture;
use txbridge::datasource::{InMemoryXaDataSource, MemoryLogSink};
use txbridge::{BridgeError, XaDataSource};

#[test]
fn test_unwrap_returns_wrapped_instance() {
    let fixture = TestFixture::new();
    let sales = fixture.sales();

    assert!(sales.supports::<InMemoryXaDataSource>());
    let unwrapped = sales.unwrap_as::<InMemoryXaDataSource>().unwrap();
    assert!(Arc::ptr_eq(&unwrapped, &fixture.vendor));

    // Vendor-specific call on the unwrapped instance is visible through the wrapper
    unwrapped.set_available(false);
    assert!(sales.get_xa_connection().is_err());
}

#[test]
fn test_unwrap_to_unrelated_type_fails() {
    let fixture = TestFixture::new();
    let sales = fixture.sales();

    assert!(!sales.supports::<MemoryLogSink>());
    let err = sales.unwrap_as::<MemoryLogSink>().unwrap_err();
    assert!(matches!(err, BridgeError::UnsupportedCapability(_)));
    assert!(err.to_string().contains("MemoryLogSink"));
}

#[test]
fn test_log_writer_reaches_vendor() {
    let fixture = TestFixture::new();
    let sales = fixture.sales();
    let sink = Arc::new(MemoryLogSink::new());

    sales.set_log_writer(Some(sink.clone()));
    sales.get_xa_connection().unwrap();

    assert_eq!(sink.lines().len(), 1);
    assert!(fixture.vendor.log_writer().is_some());
}
