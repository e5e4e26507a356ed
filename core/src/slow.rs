//! Macros that do run-time consistency checks. These can be disabled, but this increases
//! the risk of bookkeeping errors going unnoticed.
//! Contract checks of the public API are plain `assert!`s and are never disabled.

/// `assert!` that exists only if `"no-slow-safety-checks"` feature is not enabled.
#[cfg(not(feature = "no-slow-safety-checks"))]
#[macro_export]
macro_rules! kiln_slow_assert {
    ($($arg:tt)*) => {
        assert!($($arg)*);
    }
}

/// `assert_eq!` that exists only if `"no-slow-safety-checks"` feature is not enabled.
#[cfg(not(feature = "no-slow-safety-checks"))]
#[macro_export]
macro_rules! kiln_slow_assert_eq {
    ($($arg:tt)*) => {
        assert_eq!($($arg)*);
    }
}

/// `assert!` that exists only if `"no-slow-safety-checks"` feature is not enabled.
#[cfg(feature = "no-slow-safety-checks")]
#[macro_export]
macro_rules! kiln_slow_assert {
    ($($arg:tt)*) => {};
}

/// `assert_eq!` that exists only if `"no-slow-safety-checks"` feature is not enabled.
#[cfg(feature = "no-slow-safety-checks")]
#[macro_export]
macro_rules! kiln_slow_assert_eq {
    ($($arg:tt)*) => {};
}
