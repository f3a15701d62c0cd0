//! Story events: the detector's loose input shape and the validated union
//! the engines consume.

use cast_model::CharacterId;
use serde::{Deserialize, Serialize};

/// Largest accepted intensity multiplier.
pub const MAX_INTENSITY: f32 = 3.0;

/// An event exactly as the external detector emits it. Every field is
/// optional; [`RawEvent::normalize`] decides what is usable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawEvent {
    #[serde(rename = "type")]
    pub event_type: Option<String>,
    pub action: Option<String>,
    pub actor: Option<String>,
    pub target: Option<String>,
    pub raw_modifier: Option<f32>,
    pub intensity: Option<f32>,
    pub witnesses: Option<Vec<String>>,
    pub success: Option<bool>,
    pub spread_count: Option<u32>,
}

impl RawEvent {
    /// Convenience constructor for the common `type/action/actor` triple.
    pub fn new(event_type: &str, action: &str, actor: &str) -> Self {
        Self {
            event_type: Some(event_type.to_string()),
            action: Some(action.to_string()),
            actor: Some(actor.to_string()),
            ..Default::default()
        }
    }

    pub fn with_target(mut self, target: &str) -> Self {
        self.target = Some(target.to_string());
        self
    }

    pub fn with_modifier(mut self, modifier: f32) -> Self {
        self.raw_modifier = Some(modifier);
        self
    }

    pub fn with_intensity(mut self, intensity: f32) -> Self {
        self.intensity = Some(intensity);
        self
    }

    pub fn with_witnesses<'a>(mut self, witnesses: impl IntoIterator<Item = &'a str>) -> Self {
        self.witnesses = Some(witnesses.into_iter().map(str::to_string).collect());
        self
    }

    pub fn with_success(mut self, success: bool) -> Self {
        self.success = Some(success);
        self
    }

    /// Validate into a [`StoryEvent`]. Events without an actor are dropped;
    /// a missing or unknown type becomes [`EventKind::Unknown`].
    pub fn normalize(&self) -> Option<StoryEvent> {
        let actor = clean_id(self.actor.as_deref())?;
        let target = clean_id(self.target.as_deref()).filter(|t| *t != actor);

        let mut witnesses: Vec<CharacterId> = Vec::new();
        for name in self.witnesses.iter().flatten() {
            if let Some(id) = clean_id(Some(name)) {
                if id != actor && Some(&id) != target.as_ref() && !witnesses.contains(&id) {
                    witnesses.push(id);
                }
            }
        }

        let modifier = finite_or(self.raw_modifier, 0.0);
        let action = self
            .action
            .as_deref()
            .map(|a| a.trim().to_lowercase())
            .unwrap_or_default();
        let type_label = self
            .event_type
            .as_deref()
            .map(|t| t.trim().to_uppercase())
            .unwrap_or_default();

        let kind = match type_label.as_str() {
            "RELATION_CHANGE" => EventKind::RelationChange { change: modifier },
            "GOAL_COMPLETE" => EventKind::GoalComplete {
                success: self.success.unwrap_or(modifier >= 0.0),
            },
            "RUMOR_SPREAD" => EventKind::RumorSpread {
                spin: Spin::from_modifier(modifier, 0.0),
                spread_count: self.spread_count.unwrap_or(1),
            },
            label => match InteractionCategory::parse(label) {
                Some(category) => EventKind::Interaction {
                    category,
                    action,
                    raw_modifier: modifier,
                },
                None => EventKind::Unknown {
                    label: if label.is_empty() { None } else { Some(label.to_string()) },
                    action,
                    raw_modifier: modifier,
                },
            },
        };

        Some(StoryEvent {
            kind,
            actor,
            target,
            witnesses,
            intensity: finite_or(self.intensity, 1.0).clamp(0.0, MAX_INTENSITY),
        })
    }
}

fn clean_id(raw: Option<&str>) -> Option<CharacterId> {
    let trimmed = raw?.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(CharacterId::new(trimmed))
    }
}

fn finite_or(value: Option<f32>, fallback: f32) -> f32 {
    value.filter(|v| v.is_finite()).unwrap_or(fallback)
}

/// Broad category of an interaction between characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum InteractionCategory {
    Social,
    Combat,
    Romance,
    Betrayal,
    Achievement,
    Sacrifice,
    Loss,
    Discovery,
}

impl InteractionCategory {
    pub fn parse(label: &str) -> Option<Self> {
        match label.to_uppercase().as_str() {
            "SOCIAL" | "DIALOGUE" => Some(Self::Social),
            "COMBAT" | "FIGHT" => Some(Self::Combat),
            "ROMANCE" => Some(Self::Romance),
            "BETRAYAL" => Some(Self::Betrayal),
            "ACHIEVEMENT" | "HEROISM" => Some(Self::Achievement),
            "SACRIFICE" => Some(Self::Sacrifice),
            "LOSS" | "TRAGEDY" => Some(Self::Loss),
            "DISCOVERY" => Some(Self::Discovery),
            _ => None,
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            Self::Social => "SOCIAL",
            Self::Combat => "COMBAT",
            Self::Romance => "ROMANCE",
            Self::Betrayal => "BETRAYAL",
            Self::Achievement => "ACHIEVEMENT",
            Self::Sacrifice => "SACRIFICE",
            Self::Loss => "LOSS",
            Self::Discovery => "DISCOVERY",
        }
    }
}

/// Tone of a rumor, or of an event as retold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Spin {
    Positive,
    #[default]
    Neutral,
    Negative,
}

impl Spin {
    /// Classify a signed modifier, treating `|m| <= threshold` as neutral.
    pub fn from_modifier(modifier: f32, threshold: f32) -> Self {
        if modifier > threshold {
            Spin::Positive
        } else if modifier < -threshold {
            Spin::Negative
        } else {
            Spin::Neutral
        }
    }

    pub fn sign(&self) -> f32 {
        match self {
            Spin::Positive => 1.0,
            Spin::Neutral => 0.0,
            Spin::Negative => -1.0,
        }
    }
}

/// Closed union of event shapes the cascade understands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum EventKind {
    Interaction {
        category: InteractionCategory,
        action: String,
        raw_modifier: f32,
    },
    RelationChange {
        change: f32,
    },
    GoalComplete {
        success: bool,
    },
    RumorSpread {
        spin: Spin,
        spread_count: u32,
    },
    /// Anything the detector labelled with a type we do not model.
    Unknown {
        label: Option<String>,
        action: String,
        raw_modifier: f32,
    },
}

impl EventKind {
    /// Stable key for norms and lore lookups.
    pub fn type_key(&self) -> String {
        match self {
            EventKind::Interaction { category, .. } => category.key().to_string(),
            EventKind::RelationChange { .. } => "RELATION_CHANGE".to_string(),
            EventKind::GoalComplete { .. } => "GOAL_COMPLETE".to_string(),
            EventKind::RumorSpread { .. } => "RUMOR_SPREAD".to_string(),
            EventKind::Unknown { label, .. } => {
                label.clone().unwrap_or_else(|| "UNKNOWN".to_string())
            }
        }
    }

    /// Signed emotional charge of the event before anyone interprets it.
    pub fn signed_modifier(&self) -> f32 {
        match self {
            EventKind::Interaction { raw_modifier, .. }
            | EventKind::Unknown { raw_modifier, .. } => *raw_modifier,
            EventKind::RelationChange { change } => *change,
            EventKind::GoalComplete { success } => {
                if *success {
                    10.0
                } else {
                    -5.0
                }
            }
            EventKind::RumorSpread { spin, spread_count } => {
                spin.sign() * (*spread_count).min(10) as f32
            }
        }
    }

    pub fn action(&self) -> &str {
        match self {
            EventKind::Interaction { action, .. } | EventKind::Unknown { action, .. } => action,
            _ => "",
        }
    }

    pub fn category(&self) -> Option<InteractionCategory> {
        match self {
            EventKind::Interaction { category, .. } => Some(*category),
            _ => None,
        }
    }
}

/// A validated event, ready for the cascade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryEvent {
    pub kind: EventKind,
    pub actor: CharacterId,
    pub target: Option<CharacterId>,
    /// Present onlookers, excluding actor and target.
    pub witnesses: Vec<CharacterId>,
    pub intensity: f32,
}

impl StoryEvent {
    pub fn new(kind: EventKind, actor: impl Into<CharacterId>) -> Self {
        Self {
            kind,
            actor: actor.into(),
            target: None,
            witnesses: Vec::new(),
            intensity: 1.0,
        }
    }

    pub fn with_target(mut self, target: impl Into<CharacterId>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn with_witnesses(mut self, witnesses: impl IntoIterator<Item = CharacterId>) -> Self {
        self.witnesses = witnesses.into_iter().collect();
        self
    }

    pub fn with_intensity(mut self, intensity: f32) -> Self {
        self.intensity = intensity.clamp(0.0, MAX_INTENSITY);
        self
    }

    /// Actor, target, then witnesses, without duplicates.
    pub fn involved(&self) -> Vec<CharacterId> {
        let mut ids = vec![self.actor.clone()];
        if let Some(target) = &self.target {
            ids.push(target.clone());
        }
        for witness in &self.witnesses {
            if !ids.contains(witness) {
                ids.push(witness.clone());
            }
        }
        ids
    }

    /// Magnitude of the event on a 0-100 scale.
    pub fn impact(&self) -> f32 {
        let base = match &self.kind {
            EventKind::GoalComplete { success: true } => 30.0,
            EventKind::GoalComplete { success: false } => 15.0,
            EventKind::RumorSpread { spread_count, .. } => (*spread_count as f32) * 5.0,
            kind => kind.signed_modifier().abs(),
        };
        (base * self.intensity).min(100.0)
    }

    pub fn type_key(&self) -> String {
        self.kind.type_key()
    }
}
