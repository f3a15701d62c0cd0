//! Gossip engine - rumors, their drift, and the reputations they leave.
//!
//! Rumors travel a looser path than the main cascade: they are born from
//! observed events, spread hop by hop, and warp a little with every telling.

use cast_model::{clamp_score, clamp_unit, CastState, CharacterId, GossipConfig, SCORE_MAX};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use uuid::Uuid;

use crate::error::GossipError;
use crate::events::{InteractionCategory, Spin, StoryEvent};

/// Reputation every character starts with.
pub const NEUTRAL_REPUTATION: f32 = SCORE_MAX / 2.0;

/// Unique identifier for rumors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RumorId(pub Uuid);

impl RumorId {
    /// Create a new random rumor ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RumorId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RumorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Rumor {
    pub id: RumorId,
    /// Event type key the rumor retells.
    pub kind: String,
    pub subject: CharacterId,
    pub target: Option<CharacterId>,
    pub spin: Spin,
    /// How far the telling has drifted from what happened, in `[0, 1]`.
    pub distortion: f32,
    pub turn_created: u64,
    pub known_by: BTreeSet<CharacterId>,
    pub hops: u32,
    pub verified: bool,
}

impl Default for Rumor {
    fn default() -> Self {
        Self {
            id: RumorId::new(),
            kind: String::new(),
            subject: CharacterId::default(),
            target: None,
            spin: Spin::Neutral,
            distortion: 0.0,
            turn_created: 0,
            known_by: BTreeSet::new(),
            hops: 0,
            verified: false,
        }
    }
}

impl Rumor {
    pub fn is_known_by(&self, id: &CharacterId) -> bool {
        self.known_by.contains(id)
    }

    pub fn is_about(&self, id: &CharacterId) -> bool {
        &self.subject == id || self.target.as_ref() == Some(id)
    }
}

#[derive(Debug, Clone, Default)]
pub struct GossipEngine {
    config: GossipConfig,
    rumors: BTreeMap<RumorId, Rumor>,
    reputation: BTreeMap<CharacterId, f32>,
}

impl GossipEngine {
    pub fn new(config: GossipConfig) -> Self {
        Self {
            config,
            rumors: BTreeMap::new(),
            reputation: BTreeMap::new(),
        }
    }

    /// Rebuild from persisted rumors and reputations.
    pub fn restore(config: GossipConfig, rumors: Vec<Rumor>, reputation: BTreeMap<CharacterId, f32>) -> Self {
        let rumors = rumors
            .into_iter()
            .map(|mut rumor| {
                rumor.distortion = clamp_unit(rumor.distortion);
                (rumor.id, rumor)
            })
            .collect();
        let reputation = reputation
            .into_iter()
            .map(|(id, value)| (id, clamp_score(value)))
            .collect();
        Self {
            config,
            rumors,
            reputation,
        }
    }

    pub fn config(&self) -> &GossipConfig {
        &self.config
    }

    pub fn rumor(&self, id: RumorId) -> Option<&Rumor> {
        self.rumors.get(&id)
    }

    pub fn rumors(&self) -> impl Iterator<Item = &Rumor> {
        self.rumors.values()
    }

    pub fn rumors_about(&self, id: &CharacterId) -> Vec<&Rumor> {
        self.rumors.values().filter(|r| r.is_about(id)).collect()
    }

    pub fn rumors_known_by(&self, id: &CharacterId) -> Vec<&Rumor> {
        self.rumors.values().filter(|r| r.is_known_by(id)).collect()
    }

    /// Turn an observed event into a rumor, colored by the observer's bias.
    ///
    /// Events below the impact floor are not worth retelling. Dislike of
    /// the subject pushes the spin one step negative and adds distortion.
    pub fn observe(
        &mut self,
        event: &StoryEvent,
        observer: &CharacterId,
        cast: &CastState,
        turn: u64,
    ) -> Option<RumorId> {
        if event.impact() < self.config.min_impact || observer.is_blank() {
            return None;
        }

        let mut spin = if event.kind.category() == Some(InteractionCategory::Betrayal) {
            Spin::Negative
        } else {
            Spin::from_modifier(event.kind.signed_modifier(), self.config.spin_threshold)
        };

        // 1.0 is open hostility, -1.0 is adoration.
        let bias = cast
            .character(observer)
            .and_then(|c| c.perception_of(&event.actor))
            .map(|p| ((NEUTRAL_REPUTATION - p.affection) / NEUTRAL_REPUTATION).clamp(-1.0, 1.0))
            .unwrap_or(0.0);
        if bias > 0.4 {
            spin = match spin {
                Spin::Positive => Spin::Neutral,
                _ => Spin::Negative,
            };
        }

        let mut known_by: BTreeSet<CharacterId> = event.witnesses.iter().cloned().collect();
        known_by.insert(observer.clone());

        let rumor = Rumor {
            id: RumorId::new(),
            kind: event.type_key(),
            subject: event.actor.clone(),
            target: event.target.clone(),
            spin,
            distortion: clamp_unit(self.config.base_distortion + bias.abs() * self.config.bias_weight),
            turn_created: turn,
            known_by,
            hops: 0,
            verified: false,
        };
        let id = rumor.id;
        tracing::debug!(
            target: "gossip",
            rumor = %id,
            subject = %rumor.subject,
            observer = %observer,
            spin = ?rumor.spin,
            "rumor started"
        );
        self.rumors.insert(id, rumor);
        Some(id)
    }

    /// Tell a rumor from one character to another.
    ///
    /// Returns `Ok(true)` when `to` newly learned it. Every hop adds a fixed
    /// amount of distortion.
    pub fn spread_rumor(&mut self, id: RumorId, from: &CharacterId, to: &CharacterId) -> Result<bool, GossipError> {
        let rumor = self.rumors.get_mut(&id).ok_or(GossipError::UnknownRumor(id))?;
        if from == to || !rumor.is_known_by(from) || rumor.is_known_by(to) {
            return Ok(false);
        }
        rumor.known_by.insert(to.clone());
        rumor.hops = rumor.hops.saturating_add(1);
        rumor.distortion = clamp_unit(rumor.distortion + self.config.hop_drift);
        tracing::trace!(target: "gossip", rumor = %id, from = %from, to = %to, hops = rumor.hops, "rumor spread");
        Ok(true)
    }

    /// Let two characters swap what they have heard.
    ///
    /// Only ACTIVE, acquainted pairs gossip. Each rumor known by exactly one
    /// of them passes to the other with a fixed probability.
    pub fn auto_propagate<R: Rng>(
        &mut self,
        a: &CharacterId,
        b: &CharacterId,
        cast: &CastState,
        rng: &mut R,
    ) -> Vec<RumorId> {
        if a == b || !cast.is_active(a) || !cast.is_active(b) || !cast.acquainted(a, b) {
            return Vec::new();
        }
        let probability = match self.config.auto_spread_probability {
            p if p.is_finite() => p.clamp(0.0, 1.0),
            _ => 0.0,
        };
        let candidates: Vec<(RumorId, bool)> = self
            .rumors
            .values()
            .filter(|r| r.is_known_by(a) != r.is_known_by(b))
            .map(|r| (r.id, r.is_known_by(a)))
            .collect();

        let mut spread = Vec::new();
        for (id, a_knows) in candidates {
            if !rng.gen_bool(probability) {
                continue;
            }
            let (from, to) = if a_knows { (a, b) } else { (b, a) };
            if let Ok(true) = self.spread_rumor(id, from, to) {
                spread.push(id);
            }
        }
        spread
    }

    pub fn reputation(&self, id: &CharacterId) -> f32 {
        self.reputation.get(id).copied().unwrap_or(NEUTRAL_REPUTATION)
    }

    pub fn reputations(&self) -> &BTreeMap<CharacterId, f32> {
        &self.reputation
    }

    /// Nudge the subject's reputation by the rumor's spin and distortion.
    pub fn update_reputation(&mut self, id: RumorId) -> Result<f32, GossipError> {
        let rumor = self.rumors.get(&id).ok_or(GossipError::UnknownRumor(id))?;
        let delta = rumor.spin.sign() * rumor.distortion * self.config.reputation_scale;
        let slot = self
            .reputation
            .entry(rumor.subject.clone())
            .or_insert(NEUTRAL_REPUTATION);
        *slot = clamp_score(*slot + delta);
        Ok(*slot)
    }

    /// Mark a rumor as confirmed. Verified rumors are never pruned.
    pub fn verify(&mut self, id: RumorId) -> Result<(), GossipError> {
        let rumor = self.rumors.get_mut(&id).ok_or(GossipError::UnknownRumor(id))?;
        rumor.verified = true;
        Ok(())
    }

    /// Drop unverified rumors older than `max_age` turns.
    pub fn prune(&mut self, turn: u64, max_age: u64) -> usize {
        let before = self.rumors.len();
        self.rumors
            .retain(|_, r| r.verified || turn.saturating_sub(r.turn_created) <= max_age);
        let pruned = before - self.rumors.len();
        if pruned > 0 {
            tracing::debug!(target: "gossip", pruned, "stale rumors dropped");
        }
        pruned
    }
}
