//! Device errors.

use failure::Fail;

/// Error reported by the backend device.
///
/// Returned from construction paths, where it aborts startup.
/// During steady state it is fatal, see [`OrFatal`].
#[derive(Clone, Debug, Fail, PartialEq, Eq)]
pub enum DeviceError {
    /// Device or host memory is exhausted.
    #[fail(display = "Out of memory")]
    OutOfMemory,

    /// Logical device is lost. Re-initialization required.
    #[fail(display = "Device lost. Re-initialization required")]
    DeviceLost,

    /// Backend rejected the call as invalid usage.
    #[fail(display = "Validation failed: {}", _0)]
    Validation(String),

    /// Backend doesn't support the operation.
    #[fail(display = "Unsupported operation: {}", _0)]
    Unsupported(&'static str),
}

/// Conversion of device failures into process-ending panics.
///
/// Partial progress in a recording stream can't be rolled back once barriers
/// have mutated resource state bookkeeping, so steady-state device failures are not returned.
pub trait OrFatal<T> {
    /// Unwrap the value or log and panic naming the failed operation.
    fn or_fatal(self, what: &str) -> T;
}

impl<T> OrFatal<T> for Result<T, DeviceError> {
    fn or_fatal(self, what: &str) -> T {
        match self {
            Ok(value) => value,
            Err(err) => {
                log::error!("{} failed: {}", what, err);
                panic!("{} failed: {}", what, err)
            }
        }
    }
}
