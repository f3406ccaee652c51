//! Core domain errors

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Missing required columns: {missing:?}")]
    Schema { missing: Vec<String> },

    #[error("No valid data: {0}")]
    EmptyInput(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl Error {
    /// Whether this error is caused by the input itself (as opposed to setup)
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Error::Schema { .. } | Error::EmptyInput(_) | Error::Csv(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
