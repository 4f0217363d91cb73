//! Browser driving: the page port the harness talks to and its backends.

pub mod backend;
pub mod mock;
pub mod types;

pub use backend::{ChromeBackend, ChromeBackendConfig, Introspect, PageBackend};
pub use mock::{MockDom, MockElement, MockPage};
pub use types::{DriverError, DriverResult, LabelRect};
