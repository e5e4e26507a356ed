//! Crate that contains the backend abstraction and the types shared by kiln crates.

#![warn(
    missing_debug_implementations,
    missing_copy_implementations,
    missing_docs,
    trivial_casts,
    trivial_numeric_casts,
    unused_extern_crates,
    unused_import_braces,
    unused_qualifications
)]

pub use crate::{backend::*, error::*, fence::*, kind::*, types::*};

#[macro_use]
mod slow;
mod backend;
mod error;
mod fence;
mod kind;
pub mod types;
