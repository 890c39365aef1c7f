//! Append-only arenas addressed by typed identifiers.

mod data;
mod id;
mod slot;

pub use data::Arena;
pub use id::{Id, Identifier};
