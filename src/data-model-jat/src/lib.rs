pub mod db;
pub mod errors;
pub mod models;
pub mod schema;
pub mod validation;

// Make test_helpers available for tests in this crate and dependent crates
#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;
