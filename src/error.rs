//! Errors a caller needs to branch on. Everything else travels as `eyre::Report`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    /// A byte-range read came back as a zip container. Range reads into an
    /// archive would corrupt the buffer, so the strategy must be abandoned.
    #[error("blob is zip-encoded, range not supported")]
    ArchiveRange,
    #[error("{context}: unexpected status {status}")]
    UnexpectedStatus { context: &'static str, status: u16 },
    #[error("log output too large ({size_mb:.1} MB, max {max_mb} MB)")]
    TooLarge { size_mb: f64, max_mb: usize },
}

#[cfg(test)]
mod tests {
    use super::*;
    use color_eyre::eyre::Report;

    #[test]
    fn downcast_through_report() {
        let report: Report = FetchError::ArchiveRange.into();
        assert!(matches!(
            report.downcast_ref::<FetchError>(),
            Some(FetchError::ArchiveRange)
        ));
    }

    #[test]
    fn status_message() {
        let err = FetchError::UnexpectedStatus {
            context: "blob fetch",
            status: 500,
        };
        assert_eq!(err.to_string(), "blob fetch: unexpected status 500");
    }
}
