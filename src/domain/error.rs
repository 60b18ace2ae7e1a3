//! Error types for the enforcement core

/// A reading that cannot be evaluated at all
///
/// Filtered or absent input is never an error; only malformed measurements are.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ReadingError {
    #[error("non-finite {field}: {value}")]
    NonFinite { field: &'static str, value: f64 },
}
