//! # Psyche Core
//!
//! The "inner life" of the emergent narrative system. This crate reads the
//! character records in `cast_model`, turns detected story events into
//! lasting changes of feeling, perception, standing and identity, and
//! composes short summaries for the text generator.
//!
//! ## Core Components
//!
//! - **qualia**: how events feel before anyone thinks about them
//! - **information**: subjective interpretation of an event by one observer
//! - **relations**: asymmetric perceptions, with a legacy scalar mode
//! - **hierarchy**: social capital and status bands
//! - **crucible**: formative events reshaping personality and self-image
//! - **lore**: legends, norms, and legend-inspired goals
//! - **gossip**: rumors, distortion, and reputation
//! - **secrets**: what characters keep to themselves
//! - **director**: off-screen simulation of the living world
//! - **context_composer**: prioritized, budgeted prompt summaries
//! - **simulation**: owns all state and runs the event cascade
//! - **persist** / **inspect**: snapshots and read-only views
//!
//! ## Design Philosophy
//!
//! - **State-Driven**: engines hold only configuration; the simulation owns every record
//! - **Event-Driven**: the core reacts to detected events, one full cascade at a time
//! - **Bounded**: every numeric field is clamped after it changes

pub mod context_composer;
pub mod crucible;
pub mod director;
pub mod error;
pub mod events;
pub mod gossip;
pub mod hierarchy;
pub mod information;
pub mod inspect;
pub mod lore;
pub mod persist;
pub mod qualia;
pub mod relations;
pub mod secrets;
pub mod simulation;

pub use context_composer::*;
pub use crucible::*;
pub use director::*;
pub use error::*;
pub use events::*;
pub use gossip::*;
pub use hierarchy::*;
pub use information::*;
pub use inspect::*;
pub use lore::*;
pub use persist::*;
pub use qualia::*;
pub use relations::*;
pub use secrets::*;
pub use simulation::*;
