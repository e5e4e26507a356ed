//! Plain data types shared by the backend abstraction and the command layer.

mod barrier;
mod desc;
mod draw;
mod state;

pub use self::{barrier::*, desc::*, draw::*, state::*};
