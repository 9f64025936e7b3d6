//! Process exit codes
//!
//! Scripts can tell failure classes apart without parsing output.

use mu_core::Error;

/// Exit codes returned by `mu`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success = 0,
    GeneralError = 1,
    /// Bad arguments or invalid input media
    UsageError = 2,
    NetworkError = 3,
    /// Missing or rejected session
    AuthError = 4,
    UnsupportedMedia = 5,
    RetriesExhausted = 6,
}

impl ExitCode {
    pub fn code(self) -> i32 {
        self as i32
    }

    /// Map an upload error to the exit code reported for it
    pub fn from_error(error: &Error) -> Self {
        match error {
            Error::Validation(_) | Error::MediaTooLong { .. } | Error::InvalidConfiguration(_) => {
                ExitCode::UsageError
            }
            Error::UnsupportedMediaFormat(_) => ExitCode::UnsupportedMedia,
            Error::RetriesExhausted { .. } => ExitCode::RetriesExhausted,
            Error::Transport(_) | Error::Network(_) | Error::Transmission(_) => {
                ExitCode::NetworkError
            }
            Error::Config(msg) if msg.contains("session") => ExitCode::AuthError,
            _ => ExitCode::GeneralError,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mu_core::MediaKind;

    #[test]
    fn test_from_error() {
        assert_eq!(
            ExitCode::from_error(&Error::Validation("x".into())),
            ExitCode::UsageError
        );
        assert_eq!(
            ExitCode::from_error(&Error::RetriesExhausted {
                kind: MediaKind::Photo,
                attempts: 5,
                last_error: "x".into()
            }),
            ExitCode::RetriesExhausted
        );
        assert_eq!(
            ExitCode::from_error(&Error::Config("No session id: set MU_SESSION_ID".into())),
            ExitCode::AuthError
        );
        assert_eq!(ExitCode::Success.code(), 0);
    }
}
