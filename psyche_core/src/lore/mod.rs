//! Lore module - the group's collective memory.
//!
//! - **Legends**: crystallized events remembered by the whole cast
//! - **Norms**: how accepted or taboo each kind of legend has become
//! - **Goals**: multi-step plans, some inspired by remembered legends

mod goals;
mod legend;
mod norms;

pub use goals::*;
pub use legend::*;
pub use norms::*;
