//! Character definitions.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::{CharacterId, Perception, Personality, QualiaState, SelfConcept, SocialStanding};
use crate::mechanics::{CharacterStatus, Tier, TraitAxis};
use crate::world_state::FlagValue;

/// The canonical per-character record.
///
/// Every field carries a serde default so records written by older builds
/// reload with the same shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Character {
    pub id: CharacterId,
    pub mentions: u32,
    pub first_seen: u64,
    pub last_seen: u64,
    pub tier: Tier,
    pub status: CharacterStatus,

    pub personality: Personality,
    pub self_concept: SelfConcept,
    pub qualia: QualiaState,

    /// Other character ID -> this character's view of them.
    pub perceptions: BTreeMap<CharacterId, Perception>,
    pub social: SocialStanding,

    /// Derived qualitative labels.
    pub tags: BTreeSet<String>,
    /// Sparse bookkeeping for off-screen simulation.
    pub flags: BTreeMap<String, FlagValue>,

    /// Number of events this character took part in.
    pub interactions: u32,
    /// Axes where personality and self-concept have drifted apart.
    pub conflicts: BTreeSet<TraitAxis>,
}

impl Default for Character {
    fn default() -> Self {
        Self::new(CharacterId::default(), 0)
    }
}

impl Character {
    /// Create a character first mentioned on `turn`.
    pub fn new(id: impl Into<CharacterId>, turn: u64) -> Self {
        let personality = Personality::default();
        Self {
            id: id.into(),
            mentions: 0,
            first_seen: turn,
            last_seen: turn,
            tier: Tier::Extra,
            status: CharacterStatus::Active,
            self_concept: SelfConcept::mirror(&personality),
            personality,
            qualia: QualiaState::baseline(),
            perceptions: BTreeMap::new(),
            social: SocialStanding::default(),
            tags: BTreeSet::new(),
            flags: BTreeMap::new(),
            interactions: 0,
            conflicts: BTreeSet::new(),
        }
    }

    /// Builder: set the personality and mirror it into the self-concept.
    pub fn with_personality(mut self, personality: Personality) -> Self {
        self.personality = personality;
        self.personality.clamp();
        self.self_concept = SelfConcept::mirror(&self.personality);
        self
    }

    /// Builder: set the qualia state.
    pub fn with_qualia(mut self, qualia: QualiaState) -> Self {
        self.qualia = qualia;
        self.qualia.clamp();
        self
    }

    /// Builder: set the tier.
    pub fn with_tier(mut self, tier: Tier) -> Self {
        self.tier = tier;
        self
    }

    pub fn is_active(&self) -> bool {
        self.status == CharacterStatus::Active
    }

    pub fn is_frozen(&self) -> bool {
        self.status == CharacterStatus::Frozen
    }

    /// This character's view of `other`, if one has formed.
    pub fn perception_of(&self, other: &CharacterId) -> Option<&Perception> {
        self.perceptions.get(other)
    }

    /// This character's view of `other`, created with defaults when absent.
    pub fn perception_mut(&mut self, other: &CharacterId) -> &mut Perception {
        self.perceptions.entry(other.clone()).or_default()
    }

    /// Gap between objective personality and self-image on one axis.
    pub fn divergence(&self, axis: TraitAxis) -> f32 {
        (self.personality.get(axis) - self.self_concept.get(axis)).abs()
    }

    /// Re-derive the conflict flags against a divergence threshold.
    pub fn refresh_conflicts(&mut self, threshold: f32) {
        for axis in TraitAxis::ALL {
            if self.divergence(axis) > threshold {
                self.conflicts.insert(axis);
            } else {
                self.conflicts.remove(&axis);
            }
        }
    }

    pub fn set_flag(&mut self, key: impl Into<String>, value: FlagValue) {
        self.flags.insert(key.into(), value);
    }

    pub fn flag(&self, key: &str) -> Option<&FlagValue> {
        self.flags.get(key)
    }

    /// Clamp every bounded field back into range.
    pub fn sanitize(&mut self) {
        self.personality.clamp();
        self.self_concept.clamp();
        self.qualia.clamp();
        self.social.clamp();
        for perception in self.perceptions.values_mut() {
            perception.clamp();
        }
        self.perceptions.remove(&self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_character() {
        let character = Character::new("mara", 3);
        assert_eq!(character.id.as_str(), "mara");
        assert_eq!(character.first_seen, 3);
        assert_eq!(character.tier, Tier::Extra);
        assert!(character.is_active());
        assert!(character.perceptions.is_empty());
        assert_eq!(character.self_concept, SelfConcept::mirror(&character.personality));
    }

    #[test]
    fn test_perception_mut_creates_default() {
        let mut character = Character::new("mara", 0);
        let jon = CharacterId::new("jon");
        character.perception_mut(&jon).affection += 10.0;
        assert_eq!(character.perception_of(&jon).unwrap().affection, 60.0);
    }

    #[test]
    fn test_refresh_conflicts() {
        let mut character = Character::new("mara", 0);
        character.self_concept.perceived_trust = 0.9;
        character.personality.trust = 0.5;
        character.refresh_conflicts(0.2);
        assert!(character.conflicts.contains(&TraitAxis::Trust));

        character.personality.trust = 0.8;
        character.refresh_conflicts(0.2);
        assert!(character.conflicts.is_empty());
    }

    #[test]
    fn test_sanitize_clamps_everything() {
        let mut character = Character::new("mara", 0);
        character.personality.bravery = 4.0;
        character.qualia.valence = -1.0;
        character.social.capital = 999.0;
        character.perception_mut(&CharacterId::new("jon")).trust = 400.0;
        character.perception_mut(&CharacterId::new("mara")).trust = 10.0;

        character.sanitize();

        assert_eq!(character.personality.bravery, 1.0);
        assert_eq!(character.qualia.valence, 0.0);
        assert_eq!(character.social.capital, 300.0);
        assert_eq!(character.perceptions.len(), 1);
        assert_eq!(character.perceptions[&CharacterId::new("jon")].trust, 100.0);
    }

    #[test]
    fn test_missing_fields_deserialize_to_defaults() {
        let character: Character = serde_json::from_str(r#"{"id":"ghost","mentions":4}"#).unwrap();
        assert_eq!(character.id.as_str(), "ghost");
        assert_eq!(character.mentions, 4);
        assert_eq!(character.qualia, QualiaState::baseline());
        assert_eq!(character.social.capital, 100.0);
    }
}
