//! Logging support

#[cfg(feature = "std")]
use log::{debug, error, info, warn};

use crate::Error;

/// Enum that describes level associated with a log message
#[derive(Debug, Eq, PartialEq)]
pub enum PsLogLevels {
    /// Common error logging level
    PsError,
    /// Common info logging level
    PsInfo,
    /// Common warn logging level
    PsWarn,
    /// Common debug logging level
    PsDebug,
}

/// `log_message` provides a logging function that forwards to the `log` facade.
#[cfg(feature = "std")]
pub fn log_message(level: &PsLogLevels, message: &str) {
    match level {
        PsLogLevels::PsError => error!("{}", message),
        PsLogLevels::PsWarn => warn!("{}", message),
        PsLogLevels::PsInfo => info!("{}", message),
        PsLogLevels::PsDebug => debug!("{}", message),
    }
}

#[cfg(not(feature = "std"))]
/// `log_message` does nothing when std feature gate is not used
pub fn log_message(_level: &PsLogLevels, _message: &str) {}

/// `log_skipped_object` records a directory object that was excluded from a scan because it could
/// not be decoded.
#[cfg(feature = "std")]
pub fn log_skipped_object(kind: &str, object: &str, err: &Error) {
    error!("Skipping {} {}: {}", kind, object, err);
}

#[cfg(not(feature = "std"))]
/// `log_skipped_object` does nothing when std feature gate is not used
pub fn log_skipped_object(_kind: &str, _object: &str, _err: &Error) {}
