//! Secrets - things characters know and have not said.

use cast_model::CharacterId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use uuid::Uuid;

/// Unique identifier for secrets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SecretId(pub Uuid);

impl SecretId {
    /// Create a new random secret ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SecretId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SecretId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How much a secret would cost its holder if it came out. Ordered from
/// least to most damaging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub enum SecretSeverity {
    #[default]
    Minor,
    Moderate,
    Major,
    /// Exposure would end the holder's place in the story.
    Critical,
}

impl SecretSeverity {
    pub fn label(&self) -> &'static str {
        match self {
            SecretSeverity::Minor => "minor",
            SecretSeverity::Moderate => "moderate",
            SecretSeverity::Major => "major",
            SecretSeverity::Critical => "critical",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Secret {
    pub id: SecretId,

    /// Who is keeping it.
    pub holder: CharacterId,

    pub text: String,

    pub severity: SecretSeverity,

    /// Whether the secret has come out in the story.
    pub revealed: bool,

    /// Characters other than the holder who know.
    pub known_by: BTreeSet<CharacterId>,
}

impl Default for Secret {
    fn default() -> Self {
        Self::new(CharacterId::default(), String::new())
    }
}

impl Secret {
    pub fn new(holder: impl Into<CharacterId>, text: impl Into<String>) -> Self {
        Self {
            id: SecretId::new(),
            holder: holder.into(),
            text: text.into(),
            severity: SecretSeverity::Minor,
            revealed: false,
            known_by: BTreeSet::new(),
        }
    }

    /// Set the severity.
    pub fn with_severity(mut self, severity: SecretSeverity) -> Self {
        self.severity = severity;
        self
    }

    /// Let another character in on it.
    pub fn with_confidant(mut self, confidant: impl Into<CharacterId>) -> Self {
        let confidant = confidant.into();
        if confidant != self.holder {
            self.known_by.insert(confidant);
        }
        self
    }

    pub fn is_known_by(&self, id: &CharacterId) -> bool {
        self.revealed || &self.holder == id || self.known_by.contains(id)
    }
}

/// Every secret in the story, indexed by holder.
#[derive(Debug, Clone, Default)]
pub struct SecretLedger {
    secrets: BTreeMap<SecretId, Secret>,
    by_holder: BTreeMap<CharacterId, Vec<SecretId>>,
}

impl SecretLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn restore(secrets: Vec<Secret>) -> Self {
        let mut ledger = Self::new();
        for secret in secrets {
            ledger.add(secret);
        }
        ledger
    }

    pub fn add(&mut self, secret: Secret) -> SecretId {
        let id = secret.id;
        self.by_holder
            .entry(secret.holder.clone())
            .or_default()
            .push(id);
        self.secrets.insert(id, secret);
        id
    }

    pub fn get(&self, id: SecretId) -> Option<&Secret> {
        self.secrets.get(&id)
    }

    pub fn secrets(&self) -> impl Iterator<Item = &Secret> {
        self.secrets.values()
    }

    /// Bring a secret into the open. Returns false for unknown ids or
    /// secrets already revealed.
    pub fn reveal(&mut self, id: SecretId) -> bool {
        match self.secrets.get_mut(&id) {
            Some(secret) if !secret.revealed => {
                secret.revealed = true;
                tracing::debug!(target: "secrets", secret = %id, holder = %secret.holder, "secret revealed");
                true
            }
            _ => false,
        }
    }

    /// Share a secret with one more character.
    pub fn confide(&mut self, id: SecretId, confidant: &CharacterId) -> bool {
        match self.secrets.get_mut(&id) {
            Some(secret) if &secret.holder != confidant => secret.known_by.insert(confidant.clone()),
            _ => false,
        }
    }

    /// Unrevealed secrets a character is keeping, most severe first.
    pub fn kept_by(&self, holder: &CharacterId) -> Vec<&Secret> {
        let mut kept: Vec<&Secret> = self
            .by_holder
            .get(holder)
            .map(|ids| ids.iter().filter_map(|id| self.secrets.get(id)).collect())
            .unwrap_or_default();
        kept.retain(|s| !s.revealed);
        kept.sort_by(|a, b| b.severity.cmp(&a.severity));
        kept
    }

    /// Secrets visible to a character: their own, those confided to them,
    /// and anything revealed.
    pub fn visible_for(&self, id: &CharacterId) -> Vec<&Secret> {
        self.secrets.values().filter(|s| s.is_known_by(id)).collect()
    }
}
