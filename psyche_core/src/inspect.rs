//! Read-only views for tooling and debugging.

use cast_model::{Character, CharacterId, NarrativeClock};
use std::collections::BTreeMap;

use crate::gossip::Rumor;
use crate::lore::{Goal, Legend, NormStance};
use crate::simulation::Simulation;

/// One norm as shown to an operator.
#[derive(Debug, Clone, PartialEq)]
pub struct NormView {
    pub key: String,
    pub strength: f32,
    pub stance: NormStance,
}

/// Shared-borrow window onto a running simulation.
#[derive(Clone, Copy)]
pub struct Inspector<'a> {
    sim: &'a Simulation,
}

impl<'a> Inspector<'a> {
    pub fn new(sim: &'a Simulation) -> Self {
        Self { sim }
    }

    pub fn clock(&self) -> &'a NarrativeClock {
        &self.sim.cast.clock
    }

    pub fn scene(&self) -> Option<&'a str> {
        self.sim.cast.clock.scene.as_deref()
    }

    pub fn character(&self, id: &CharacterId) -> Option<&'a Character> {
        self.sim.cast.character(id)
    }

    pub fn active_characters(&self) -> Vec<&'a Character> {
        self.sim.cast.characters().filter(|c| c.is_active()).collect()
    }

    /// Every rumor, newest first.
    pub fn rumors(&self) -> Vec<&'a Rumor> {
        let mut rumors: Vec<&Rumor> = self.sim.gossip.rumors().collect();
        rumors.sort_by(|a, b| b.turn_created.cmp(&a.turn_created));
        rumors
    }

    pub fn rumors_about(&self, id: &CharacterId) -> Vec<&'a Rumor> {
        self.sim.gossip.rumors_about(id)
    }

    pub fn reputation(&self, id: &CharacterId) -> f32 {
        self.sim.gossip.reputation(id)
    }

    /// Characters with a recorded reputation, best first.
    pub fn reputation_ranking(&self) -> Vec<(&'a CharacterId, f32)> {
        let mut ranking: Vec<(&CharacterId, f32)> = self
            .sim
            .gossip
            .reputations()
            .iter()
            .map(|(id, value)| (id, *value))
            .collect();
        ranking.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        ranking
    }

    /// Legends still in living memory.
    pub fn legends(&self) -> Vec<&'a Legend> {
        self.sim.lore.legends().iter().filter(|l| !l.archived).collect()
    }

    pub fn archived_legends(&self) -> Vec<&'a Legend> {
        self.sim.lore.legends().iter().filter(|l| l.archived).collect()
    }

    pub fn norms(&self) -> Vec<NormView> {
        let norms = &self.sim.norms;
        norms
            .strengths()
            .iter()
            .map(|(key, strength)| NormView {
                key: key.clone(),
                strength: *strength,
                stance: norms.stance(key),
            })
            .collect()
    }

    pub fn goals_for(&self, id: &CharacterId) -> Vec<&'a Goal> {
        self.sim.goals.goals_for(id)
    }

    /// Number of characters per tier label.
    pub fn tier_counts(&self) -> BTreeMap<&'static str, usize> {
        let mut counts = BTreeMap::new();
        for character in self.sim.cast.characters() {
            *counts.entry(character.tier.label()).or_insert(0) += 1;
        }
        counts
    }
}

impl Simulation {
    pub fn inspect(&self) -> Inspector<'_> {
        Inspector::new(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::RawEvent;
    use cast_model::SimConfig;

    fn id(name: &str) -> CharacterId {
        CharacterId::new(name)
    }

    #[test]
    fn test_empty_simulation() {
        let sim = Simulation::new(SimConfig::default());
        let inspector = sim.inspect();
        assert!(inspector.rumors().is_empty());
        assert!(inspector.legends().is_empty());
        assert!(inspector.norms().is_empty());
        assert_eq!(inspector.reputation(&id("nobody")), 50.0);
        assert_eq!(inspector.scene(), None);
    }

    #[test]
    fn test_views_follow_play() {
        let mut sim = Simulation::new(SimConfig::default());
        sim.set_scene("Harbor");
        let witnesses: Vec<String> = (0..10).map(|i| format!("w{}", i)).collect();
        sim.process_event(
            &RawEvent::new("BETRAYAL", "sell_out", "mara")
                .with_target("jon")
                .with_modifier(-40.0)
                .with_witnesses(witnesses.iter().map(String::as_str)),
        );
        sim.process_event(&RawEvent::new("SOCIAL", "compliment", "ana").with_modifier(20.0).with_witnesses(["bo"]));

        let inspector = sim.inspect();
        assert_eq!(inspector.scene(), Some("Harbor"));
        assert_eq!(inspector.rumors().len(), 2);
        assert_eq!(inspector.rumors_about(&id("jon")).len(), 1);
        assert!(inspector.reputation(&id("mara")) < 50.0);
        assert_eq!(inspector.reputation_ranking()[0].0, &id("ana"));

        assert_eq!(inspector.legends().len(), 1);
        let norms = inspector.norms();
        assert_eq!(norms.len(), 1);
        assert_eq!(norms[0].key, "BETRAYAL");
        assert!(norms[0].strength < 0.5);

        assert_eq!(inspector.active_characters().len(), 14);
        assert_eq!(inspector.tier_counts()["EXTRA"], 14);
    }
}
