//! In-memory state for bots and visitors.

mod models;
mod state;

pub use models::*;
pub use state::*;
