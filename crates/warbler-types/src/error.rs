use thiserror::Error;

/// Errors produced by field validation on Warbler records.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("{field} must not be empty")]
    EmptyField { field: &'static str },

    #[error("{field} is too long: at most {max} characters, got {actual}")]
    TooLong {
        field: &'static str,
        max: usize,
        actual: usize,
    },
}
