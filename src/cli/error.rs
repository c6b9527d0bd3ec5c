//! CLI-level errors (wraps application errors)

use thiserror::Error;

use crate::application::ApplicationError;
use crate::domain::DomainError;

/// CLI errors are the top-level error type.
/// These are what get displayed to the user.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    Application(#[from] ApplicationError),

    #[error("invalid arguments: {0}")]
    InvalidArgs(String),
}

impl From<DomainError> for CliError {
    fn from(e: DomainError) -> Self {
        Self::Application(ApplicationError::from(e))
    }
}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

impl CliError {
    /// Get the appropriate exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::InvalidArgs(_) => crate::exitcode::USAGE,
            CliError::Application(e) => match e {
                ApplicationError::Domain(d) => match d {
                    DomainError::OutOfRange { .. } => crate::exitcode::USAGE,
                    DomainError::NoRoot | DomainError::MultipleRoots(_) => {
                        crate::exitcode::SOFTWARE
                    }
                    _ => crate::exitcode::DATAERR,
                },
                ApplicationError::MalformedPersistence { .. } => crate::exitcode::DATAERR,
                ApplicationError::Io { .. } => crate::exitcode::IOERR,
                ApplicationError::Config(_) => crate::exitcode::CONFIG,
            },
        }
    }
}
