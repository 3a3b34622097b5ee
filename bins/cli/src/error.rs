use spread_schema_shared::{ErrorEnvelope, ErrorKind};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Ok = 0,
    Internal = 1,
    InvalidInput = 2,
    Io = 3,
}

impl ExitCode {
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Exit code for a failed load or validation.
    #[must_use]
    pub fn for_envelope(error: &ErrorEnvelope) -> Self {
        if error.code.namespace() == "core"
            && matches!(error.code.code(), "not_found" | "permission_denied" | "io")
        {
            return Self::Io;
        }
        match error.kind {
            ErrorKind::Expected => Self::InvalidInput,
            ErrorKind::Invariant | ErrorKind::Unexpected => Self::Internal,
        }
    }
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("logging setup failed: {0}")]
    Logging(String),
}

impl CliError {
    #[must_use]
    pub const fn exit_code(&self) -> ExitCode {
        match self {
            Self::InvalidInput(_) => ExitCode::InvalidInput,
            Self::Io(_) => ExitCode::Io,
            Self::Serialization(_) | Self::Logging(_) => ExitCode::Internal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spread_schema_shared::{ErrorClass, ErrorCode};

    #[test]
    fn envelopes_map_to_exit_codes() {
        let missing = ErrorEnvelope::unexpected(
            ErrorCode::not_found(),
            "gone",
            ErrorClass::NonRetriable,
        );
        assert_eq!(ExitCode::for_envelope(&missing), ExitCode::Io);

        let invalid = ErrorEnvelope::expected(ErrorCode::new("schema", "unknown_field"), "bad");
        assert_eq!(ExitCode::for_envelope(&invalid), ExitCode::InvalidInput);

        let internal =
            ErrorEnvelope::unexpected(ErrorCode::internal(), "boom", ErrorClass::NonRetriable);
        assert_eq!(ExitCode::for_envelope(&internal), ExitCode::Internal);
    }

    #[test]
    fn io_errors_exit_with_io_code() {
        let error = CliError::from(std::io::Error::other("disk"));
        assert_eq!(error.exit_code().as_u8(), 3);
    }
}
