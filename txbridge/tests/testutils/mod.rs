//! Test utilities for txbridge integration tests
//!
//! - TestFixture: a bridge wired to an in-memory registry, coordinator and
//!   vendor resource bound as `jdbc/Sales`

#![allow(dead_code)]

pub mod test_fixture;

/// Route library logging to the test harness (RUST_LOG controls verbosity)
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
