//! Kiln's top level crate.
//! Reexports all others and ties command submission together in [`Commands`].
//!
//! [`Commands`]: struct.Commands.html

#![warn(
    missing_debug_implementations,
    missing_docs,
    trivial_casts,
    trivial_numeric_casts,
    unused_extern_crates,
    unused_import_braces,
    unused_qualifications
)]

#[cfg(feature = "command")]
mod commands;

#[cfg(feature = "command")]
pub use crate::commands::Commands;

#[doc(inline)]
pub use kiln_core as core;

#[cfg(feature = "command")]
#[doc(inline)]
pub use kiln_command as command;

#[cfg(feature = "resource")]
#[doc(inline)]
pub use kiln_resource as resource;

#[cfg(feature = "mock")]
#[doc(inline)]
pub use kiln_mock as mock;
