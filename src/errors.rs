use std::io;

use thiserror::Error;

use crate::api::ApiError;
use crate::config::ConfigError;
use crate::output::OutputError;

pub const EXIT_OK: i32 = 0;
pub const EXIT_ERROR: i32 = 1;
pub const EXIT_USAGE: i32 = 2;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Output(#[from] OutputError),
    #[error("prompt error: {0}")]
    Prompt(#[from] dialoguer::Error),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

impl CliError {
    pub fn usage(message: impl Into<String>) -> Self {
        CliError::Usage(message.into())
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Usage(_) => EXIT_USAGE,
            _ => EXIT_ERROR,
        }
    }

    #[cfg(test)]
    pub fn is_usage(&self) -> bool {
        matches!(self, CliError::Usage(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usage_errors_map_to_usage_exit_code() {
        let error = CliError::usage("invalid --limit 0 (expected 1-20)");
        assert_eq!(error.exit_code(), EXIT_USAGE);
        assert_eq!(error.to_string(), "invalid --limit 0 (expected 1-20)");
    }

    #[test]
    fn operational_errors_map_to_generic_exit_code() {
        let error = CliError::from(ConfigError::NoToken);
        assert_eq!(error.exit_code(), EXIT_ERROR);
        assert!(!error.is_usage());

        let error = CliError::from(ApiError::Status {
            status: 500,
            message: "boom".to_string(),
        });
        assert_eq!(error.exit_code(), EXIT_ERROR);
    }
}
