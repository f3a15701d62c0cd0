//! Snapshot persistence for save/load.
//!
//! The whole simulation state serializes to one JSON document. Every field
//! carries a serde default, so documents from older builds load with the
//! missing parts reset, and a document that cannot be read at all can be
//! replaced by an empty state.

use cast_model::{clamp_score, CastState, CharacterId, SimConfig};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::director::{Schedule, ScheduledEvent};
use crate::error::PersistError;
use crate::gossip::{GossipEngine, Rumor};
use crate::lore::{Goal, GoalsEngine, Legend, LoreEngine, NormsEngine};
use crate::secrets::{Secret, SecretLedger};
use crate::simulation::Simulation;

/// Current snapshot format version.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Everything needed to resume a story.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Snapshot {
    /// Format version for compatibility checking.
    pub version: u32,
    pub cast: CastState,
    pub legends: Vec<Legend>,
    /// Events left before another legend may form.
    pub cooldown: u32,
    pub rumors: Vec<Rumor>,
    pub reputation: BTreeMap<CharacterId, f32>,
    pub norms: NormsEngine,
    pub goals: Vec<Goal>,
    pub secrets: Vec<Secret>,
    pub schedule: Vec<ScheduledEvent>,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            cast: CastState::default(),
            legends: Vec::new(),
            cooldown: 0,
            rumors: Vec::new(),
            reputation: BTreeMap::new(),
            norms: NormsEngine::default(),
            goals: Vec::new(),
            secrets: Vec::new(),
            schedule: Vec::new(),
        }
    }
}

impl Snapshot {
    /// Copy the persistent state out of a simulation.
    pub fn capture(sim: &Simulation) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            cast: sim.cast.clone(),
            legends: sim.lore.legends().to_vec(),
            cooldown: sim.lore.cooldown(),
            rumors: sim.gossip.rumors().cloned().collect(),
            reputation: sim.gossip.reputations().clone(),
            norms: sim.norms.clone(),
            goals: sim.goals.goals().cloned().collect(),
            secrets: sim.secrets.secrets().cloned().collect(),
            schedule: sim.schedule.events().to_vec(),
        }
    }

    pub fn to_json(&self) -> Result<String, PersistError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse a snapshot, rejecting documents written by a newer format.
    pub fn from_json(text: &str) -> Result<Self, PersistError> {
        let mut snapshot: Self = serde_json::from_str(text)?;
        if snapshot.version > SNAPSHOT_VERSION {
            return Err(PersistError::VersionMismatch {
                expected: SNAPSHOT_VERSION,
                found: snapshot.version,
            });
        }
        snapshot.sanitize();
        Ok(snapshot)
    }

    /// Parse a snapshot, falling back to an empty state when it is unreadable.
    pub fn from_json_or_default(text: &str) -> Self {
        match Self::from_json(text) {
            Ok(snapshot) => snapshot,
            Err(error) => {
                tracing::warn!(target: "persist", %error, "snapshot unreadable, resetting to defaults");
                Self::default()
            }
        }
    }

    /// Clamp every bounded field back into range.
    pub fn sanitize(&mut self) {
        self.version = SNAPSHOT_VERSION;
        self.cast.sanitize();
        self.norms.sanitize();
        for value in self.reputation.values_mut() {
            *value = clamp_score(*value);
        }
    }
}

impl Simulation {
    /// Rebuild a simulation from a snapshot. Indexes are re-derived.
    pub fn from_snapshot(config: SimConfig, mut snapshot: Snapshot) -> Self {
        snapshot.sanitize();
        let mut sim = Simulation::new(config);
        sim.lore = LoreEngine::restore(sim.config.lore.clone(), snapshot.legends, snapshot.cooldown);
        sim.gossip = GossipEngine::restore(sim.config.gossip.clone(), snapshot.rumors, snapshot.reputation);
        sim.goals = GoalsEngine::restore(snapshot.goals);
        sim.secrets = SecretLedger::restore(snapshot.secrets);
        sim.schedule = Schedule::restore(snapshot.schedule);
        sim.norms = snapshot.norms;
        // Reseed from the turn so a resumed story does not replay its opening rolls.
        sim.rng = StdRng::seed_from_u64(sim.config.seed.wrapping_add(snapshot.cast.clock.turn));
        sim.cast = snapshot.cast;
        tracing::debug!(
            target: "persist",
            characters = sim.cast.len(),
            legends = sim.lore.legends().len(),
            turn = sim.cast.clock.turn,
            "simulation restored"
        );
        sim
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot::capture(self)
    }
}
