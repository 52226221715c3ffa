//! Portable extraction of `RT_STRING` resources from PE images.
//!
//! Reads DLLs and executables as plain data (no loader involved) and hands
//! back each string-table block as UTF-16 code units.

pub mod error;
pub mod resource;

#[cfg(any(test, feature = "test-support"))]
pub mod image_builder;

pub use error::PeError;
pub use resource::{ResourceName, StringTableResource, load_string_tables, read_string_tables};
