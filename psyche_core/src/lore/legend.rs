//! Legends and the engine that crystallizes them.

use cast_model::{CharacterId, LoreConfig};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::events::{EventKind, InteractionCategory, Spin, StoryEvent};

/// Unique identifier for legends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LegendId(pub Uuid);

impl LegendId {
    /// Create a new random legend ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for LegendId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for LegendId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What sort of story a legend tells.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LegendKind {
    Heroism,
    Betrayal,
    Sacrifice,
    Romance,
    Rivalry,
    Fellowship,
    Triumph,
    Tragedy,
    Scandal,
    Discovery,
    /// A type the cascade does not model; keeps the detector's label.
    Other(String),
}

impl Default for LegendKind {
    fn default() -> Self {
        LegendKind::Other("UNKNOWN".to_string())
    }
}

impl LegendKind {
    /// Classify the story an event would become.
    pub fn from_event(kind: &EventKind) -> Self {
        match kind {
            EventKind::Interaction {
                category,
                raw_modifier,
                ..
            } => match category {
                InteractionCategory::Social if *raw_modifier < 0.0 => LegendKind::Rivalry,
                InteractionCategory::Social => LegendKind::Fellowship,
                InteractionCategory::Combat if *raw_modifier < 0.0 => LegendKind::Rivalry,
                InteractionCategory::Combat => LegendKind::Heroism,
                InteractionCategory::Romance => LegendKind::Romance,
                InteractionCategory::Betrayal => LegendKind::Betrayal,
                InteractionCategory::Achievement => LegendKind::Triumph,
                InteractionCategory::Sacrifice => LegendKind::Sacrifice,
                InteractionCategory::Loss => LegendKind::Tragedy,
                InteractionCategory::Discovery => LegendKind::Discovery,
            },
            EventKind::RelationChange { change } if *change < 0.0 => LegendKind::Rivalry,
            EventKind::RelationChange { .. } => LegendKind::Fellowship,
            EventKind::GoalComplete { success: true } => LegendKind::Triumph,
            EventKind::GoalComplete { success: false } => LegendKind::Tragedy,
            EventKind::RumorSpread {
                spin: Spin::Negative,
                ..
            } => LegendKind::Scandal,
            EventKind::RumorSpread { .. } => LegendKind::Other("RUMOR_SPREAD".to_string()),
            EventKind::Unknown { label, .. } => {
                LegendKind::Other(label.clone().unwrap_or_default())
            }
        }
    }

    /// Stable key shared with the norms table.
    pub fn key(&self) -> String {
        match self {
            LegendKind::Heroism => "HEROISM".to_string(),
            LegendKind::Betrayal => "BETRAYAL".to_string(),
            LegendKind::Sacrifice => "SACRIFICE".to_string(),
            LegendKind::Romance => "ROMANCE".to_string(),
            LegendKind::Rivalry => "RIVALRY".to_string(),
            LegendKind::Fellowship => "FELLOWSHIP".to_string(),
            LegendKind::Triumph => "TRIUMPH".to_string(),
            LegendKind::Tragedy => "TRAGEDY".to_string(),
            LegendKind::Scandal => "SCANDAL".to_string(),
            LegendKind::Discovery => "DISCOVERY".to_string(),
            LegendKind::Other(label) if label.trim().is_empty() => "UNKNOWN".to_string(),
            LegendKind::Other(label) => label.trim().to_uppercase(),
        }
    }

    /// Human-readable noun for summaries and goal text.
    pub fn noun(&self) -> String {
        match self {
            LegendKind::Other(_) => "strange tale".to_string(),
            kind => kind.key().to_lowercase(),
        }
    }

    /// How the group judges this kind of story, from -1 (taboo) to 1 (admired).
    pub fn moral_valence(&self) -> f32 {
        match self {
            LegendKind::Heroism | LegendKind::Sacrifice => 1.0,
            LegendKind::Triumph => 0.8,
            LegendKind::Fellowship => 0.6,
            LegendKind::Romance => 0.4,
            LegendKind::Discovery => 0.3,
            LegendKind::Tragedy => -0.3,
            LegendKind::Rivalry => -0.4,
            LegendKind::Scandal => -0.8,
            LegendKind::Betrayal => -1.0,
            LegendKind::Other(_) => 0.0,
        }
    }
}

/// A crystallized event retained in collective memory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Legend {
    pub id: LegendId,
    pub kind: LegendKind,
    /// Actor first, then target.
    pub participants: Vec<CharacterId>,
    pub witnesses: u32,
    pub potential: f32,
    pub turn_created: u64,
    /// Never empty.
    pub text: String,
    pub archived: bool,
}

impl Default for Legend {
    fn default() -> Self {
        Self {
            id: LegendId::new(),
            kind: LegendKind::default(),
            participants: Vec::new(),
            witnesses: 0,
            potential: 0.0,
            turn_created: 0,
            text: LoreEngine::generate_lore_text(None),
            archived: false,
        }
    }
}

impl Legend {
    pub fn involves(&self, id: &CharacterId) -> bool {
        self.participants.contains(id)
    }
}

/// Crystallizes impactful events into legends and answers lookups.
#[derive(Debug, Clone, Default)]
pub struct LoreEngine {
    config: LoreConfig,
    legends: Vec<Legend>,
    /// Events left to skip before another legend may form.
    cooldown: u32,
}

impl LoreEngine {
    pub fn new(config: LoreConfig) -> Self {
        Self {
            config,
            legends: Vec::new(),
            cooldown: 0,
        }
    }

    /// Rebuild an engine from persisted legends. Blank texts are regenerated.
    pub fn restore(config: LoreConfig, mut legends: Vec<Legend>, cooldown: u32) -> Self {
        for legend in &mut legends {
            if legend.text.trim().is_empty() {
                legend.text = fallback_text(&legend.kind, legend.participants.first());
            }
            if !legend.potential.is_finite() || legend.potential < 0.0 {
                legend.potential = 0.0;
            }
        }
        Self {
            config,
            legends,
            cooldown,
        }
    }

    pub fn legends(&self) -> &[Legend] {
        &self.legends
    }

    pub fn legend(&self, id: LegendId) -> Option<&Legend> {
        self.legends.iter().find(|l| l.id == id)
    }

    pub fn cooldown(&self) -> u32 {
        self.cooldown
    }

    /// Legends naming a character, newest first.
    pub fn legends_involving(&self, id: &CharacterId) -> Vec<&Legend> {
        self.legends.iter().rev().filter(|l| l.involves(id)).collect()
    }

    /// Impact x witnesses x rarity. Rarity falls as legends of the same kind pile up.
    pub fn potential(&self, event: &StoryEvent) -> f32 {
        let kind = LegendKind::from_event(&event.kind);
        let same_kind = self.legends.iter().filter(|l| l.kind == kind).count();
        let rarity = 1.0 / (1.0 + same_kind as f32);
        let witnesses = event.witnesses.len().max(1) as f32;
        event.impact() * witnesses * rarity
    }

    /// Offer an event for crystallization. Each call spends one cooldown step.
    pub fn consider(&mut self, event: &StoryEvent, turn: u64) -> Option<LegendId> {
        if self.cooldown > 0 {
            self.cooldown -= 1;
            tracing::trace!(target: "lore.crystallize", remaining = self.cooldown, "cooling down");
            return None;
        }
        let potential = self.potential(event);
        if potential < self.config.potential_threshold {
            return None;
        }
        Some(self.crystallize(event, turn))
    }

    /// Turn an event into a legend unconditionally and start the cooldown.
    pub fn crystallize(&mut self, event: &StoryEvent, turn: u64) -> LegendId {
        let mut participants = vec![event.actor.clone()];
        if let Some(target) = &event.target {
            if !participants.contains(target) {
                participants.push(target.clone());
            }
        }

        let legend = Legend {
            id: LegendId::new(),
            kind: LegendKind::from_event(&event.kind),
            participants,
            witnesses: event.witnesses.len() as u32,
            potential: self.potential(event),
            turn_created: turn,
            text: Self::generate_lore_text(Some(event)),
            archived: false,
        };
        let id = legend.id;

        tracing::debug!(
            target: "lore.crystallize",
            kind = %legend.kind.key(),
            potential = legend.potential,
            witnesses = legend.witnesses,
            turn,
            "legend crystallized"
        );

        self.legends.push(legend);
        self.cooldown = self.config.cooldown_events;
        id
    }

    /// Describe an event as the group will retell it. Never returns an empty string.
    pub fn generate_lore_text(event: Option<&StoryEvent>) -> String {
        let Some(event) = event else {
            return "An untold tale passed into memory, its details already blurring.".to_string();
        };

        let actor = display_name(Some(&event.actor));
        let target = event.target.as_ref().map(|t| display_name(Some(t)));
        let audience = match event.witnesses.len() {
            0 => "the tale".to_string(),
            1 => "one witness".to_string(),
            n => format!("{} witnesses", n),
        };

        match LegendKind::from_event(&event.kind) {
            LegendKind::Heroism => format!(
                "{} stood firm against {}, and {} will not forget it.",
                actor,
                target.unwrap_or_else(|| "overwhelming odds".to_string()),
                audience
            ),
            LegendKind::Betrayal => format!(
                "{} betrayed {}; {} carry the wound still.",
                actor,
                target.unwrap_or_else(|| "those who trusted them".to_string()),
                audience
            ),
            LegendKind::Sacrifice => format!(
                "{} gave up something precious for {}, as {} recall.",
                actor,
                target.unwrap_or_else(|| "the group".to_string()),
                audience
            ),
            LegendKind::Romance => format!(
                "The bond between {} and {} became a story {} retell fondly.",
                actor,
                target.unwrap_or_else(|| "a stranger".to_string()),
                audience
            ),
            LegendKind::Rivalry => format!(
                "The clash between {} and {} split the room, and {} took sides.",
                actor,
                target.unwrap_or_else(|| "the world".to_string()),
                audience
            ),
            LegendKind::Fellowship => format!(
                "{} and {} proved what loyalty means, and {} saw it.",
                actor,
                target.unwrap_or_else(|| "their companions".to_string()),
                audience
            ),
            LegendKind::Triumph => format!(
                "{} achieved what others thought impossible, and {} spread the word.",
                actor, audience
            ),
            LegendKind::Tragedy => format!(
                "{} suffered a loss that {} still mourn.",
                actor, audience
            ),
            LegendKind::Scandal => format!(
                "Whispers about {} grew into a scandal that {} cannot unhear.",
                actor, audience
            ),
            LegendKind::Discovery => format!(
                "{} uncovered something that changed what {} believe.",
                actor, audience
            ),
            other => fallback_text(&other, Some(&event.actor)),
        }
    }

    /// Strongest non-archived legend of a kind.
    pub fn relevant_legend(&self, kind: &LegendKind) -> Option<&Legend> {
        self.legends
            .iter()
            .filter(|l| !l.archived && &l.kind == kind)
            .max_by(|a, b| {
                a.potential
                    .partial_cmp(&b.potential)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
    }

    /// Archive legends older than the configured age. Legends are never deleted.
    pub fn archive_stale(&mut self, turn: u64) -> usize {
        let max_age = self.config.archive_after_turns;
        let mut archived = 0;
        for legend in self.legends.iter_mut().filter(|l| !l.archived) {
            if turn.saturating_sub(legend.turn_created) > max_age {
                legend.archived = true;
                archived += 1;
            }
        }
        archived
    }
}

fn display_name(id: Option<&CharacterId>) -> String {
    match id {
        Some(id) if !id.is_blank() => id.to_string(),
        _ => "someone".to_string(),
    }
}

fn fallback_text(kind: &LegendKind, actor: Option<&CharacterId>) -> String {
    let actor = display_name(actor);
    match kind {
        LegendKind::Other(label) if !label.trim().is_empty() && label.trim() != "UNKNOWN" => format!(
            "{} was at the heart of what the group still calls '{}'.",
            actor,
            label.trim().to_lowercase().replace('_', " ")
        ),
        LegendKind::Other(_) => format!(
            "Something happened around {} that no one can quite explain, yet everyone remembers.",
            actor
        ),
        kind => format!("{} is remembered for a tale of {}.", actor, kind.noun()),
    }
}
