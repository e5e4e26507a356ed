//! Command submission for kiln.
//!
//! [`CommandManager`] owns one [`CommandQueue`] per [`QueueKind`] and tracks submitted work
//! with fence values. [`CommandContextManager`] hands out recycled [`CommandContext`]s
//! that record barriers, copies, draws and dispatches and submit themselves on `finish`.
//!
//! [`QueueKind`]: ../kiln_core/enum.QueueKind.html

#![forbid(overflowing_literals)]
#![deny(missing_copy_implementations)]
#![deny(missing_debug_implementations)]
#![deny(missing_docs)]
#![deny(path_statements)]
#![deny(trivial_bounds)]
#![deny(type_alias_bounds)]
#![deny(unconditional_recursion)]
#![deny(while_true)]
#![deny(bad_style)]
#![deny(future_incompatible)]
#![warn(rust_2018_compatibility)]
#![warn(rust_2018_idioms)]
#![allow(unused_unsafe)]

mod config;
mod context;
mod context_manager;
mod manager;
mod pool;
mod queue;

#[cfg(test)]
mod test;

pub use crate::{
    config::{Config, QueueConfig},
    context::{CommandContext, ComputeContext, GraphicsContext, BARRIER_BUFFER_SIZE},
    context_manager::CommandContextManager,
    manager::CommandManager,
    pool::AllocatorPool,
    queue::CommandQueue,
};
