//! Headless backend for kiln.
//!
//! A worker thread plays the role of the GPU. It executes submitted batches of every queue
//! in submission order, honors GPU-side waits and signals fences.
//! Copies are applied to simulated memory, and the device side state of every resource
//! is tracked to report barriers that don't match it, the way an API validation layer would.
//!
//! Execution can be paused to keep work in flight, and everything executed is recorded
//! into a timeline with logical timestamps.

#![warn(
    missing_debug_implementations,
    missing_docs,
    trivial_casts,
    trivial_numeric_casts,
    unused_extern_crates,
    unused_import_braces,
    unused_qualifications
)]

mod device;
mod handle;
mod list;
mod timeline;

pub use crate::{
    device::{MockDevice, TEXTURE_DATA_PITCH_ALIGNMENT, TEXTURE_DATA_PLACEMENT_ALIGNMENT},
    handle::*,
    list::{Command, MockCommandList},
    timeline::TimelineEvent,
};
