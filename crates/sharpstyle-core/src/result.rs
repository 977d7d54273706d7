//! Result type alias for engine operations

use crate::error::SharpstyleError;

/// Standard Result type for engine operations
pub type Result<T> = std::result::Result<T, SharpstyleError>;

/// Extension trait for Result to provide additional convenience methods
pub trait ResultExt<T> {
    /// Convert an error to a recoverable error if possible
    fn recoverable(self) -> Result<Option<T>>;
}

impl<T> ResultExt<T> for Result<T> {
    fn recoverable(self) -> Result<Option<T>> {
        match self {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.is_recoverable() => {
                tracing::warn!("Recoverable error: {}", err);
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Location;

    #[test]
    fn test_recoverable_swallows_engine_faults_only() {
        let fault: Result<()> = Err(SharpstyleError::engine_fault(
            "SA1000",
            Location::default(),
            "panicked",
        ));
        assert!(matches!(fault.recoverable(), Ok(None)));

        let cancelled: Result<()> = Err(SharpstyleError::Cancelled);
        assert!(cancelled.recoverable().is_err());

        let ok: Result<u8> = Ok(1);
        assert!(matches!(ok.recoverable(), Ok(Some(1))));
    }
}
