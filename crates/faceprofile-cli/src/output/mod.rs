//! Output adapters for classification reports.

mod json;

pub use json::JsonOutput;
