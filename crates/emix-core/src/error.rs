//! Unified error type for the emix workspace
//!
//! [`EmixError`] is the boundary type. Layer-specific errors in `emix-algo`
//! (indexing, parameters, model assembly) convert into it so callers can
//! handle every failure uniformly.
//!
//! # Example
//!
//! ```ignore
//! use emix_core::{EmixError, EmixResult};
//!
//! fn plan(network: &Network) -> EmixResult<()> {
//!     let report = network.validate();
//!     if report.has_errors() {
//!         return Err(EmixError::Validation(report.summary()));
//!     }
//!     Ok(())
//! }
//! ```

use thiserror::Error;

/// Unified error type for all emix operations.
#[derive(Error, Debug)]
pub enum EmixError {
    /// I/O errors (config files)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed configuration files
    #[error("Parse error: {0}")]
    Parse(String),

    /// Network validation findings that block optimization
    #[error("Validation error: {0}")]
    Validation(String),

    /// Index construction errors (duplicate names, bad samples)
    #[error("Index error: {0}")]
    Index(String),

    /// Missing or inconsistent element attributes
    #[error("Parameter error: {0}")]
    Parameter(String),

    /// Model assembly and solver errors
    #[error("Solver error: {0}")]
    Solver(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Convenience type alias for Results using EmixError.
pub type EmixResult<T> = Result<T, EmixError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = EmixError::Parameter("generator gen_1 has no efficiency".into());
        assert!(err.to_string().starts_with("Parameter error"));
        assert!(err.to_string().contains("gen_1"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "config missing");
        let err: EmixError = io_err.into();
        assert!(matches!(err, EmixError::Io(_)));
    }

    #[test]
    fn test_question_mark_operator() {
        fn inner() -> EmixResult<()> {
            Err(EmixError::Index("duplicate bus".into()))
        }

        fn outer() -> EmixResult<()> {
            inner()?;
            Ok(())
        }

        assert!(matches!(outer(), Err(EmixError::Index(_))));
    }
}
