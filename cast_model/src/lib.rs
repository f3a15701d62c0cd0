//! # Cast Model
//!
//! The "Cast Bible" crate - canonical character records, the rules that
//! bound them, and the store that manages their lifecycle. This crate holds
//! no simulation logic; the engines in `psyche_core` mutate these records.

pub mod config;
pub mod entities;
pub mod error;
pub mod mechanics;
pub mod world_state;

pub use config::*;
pub use entities::*;
pub use error::*;
pub use mechanics::*;
pub use world_state::*;
