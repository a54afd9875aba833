//! Encounters: named, persisted groups of catalog adversaries.
//!
//! The JSON shape matches what the browser client keeps in local storage
//! (camelCase keys). The share code is base64 over the UTF-8 JSON of the
//! shareable subset, suitable for a URL parameter.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::catalog::Catalog;
use crate::error::EncounterError;

/// Largest quantity one entry may hold.
pub const MAX_ENTRY_QUANTITY: u32 = 1000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncounterAdversary {
    pub id: String,
    pub adversary_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_name: Option<String>,
    pub quantity: u32,
    #[serde(default)]
    pub upscaling: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Encounter {
    pub id: String,
    pub name: String,
    pub player_count: u32,
    #[serde(default)]
    pub adversaries: Vec<EncounterAdversary>,
    #[serde(default)]
    pub battle_point_modifier: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_encounter_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<String>,
}

/// An entry dropped because its adversary is not in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MissingAdversary {
    pub entry_id: String,
    pub adversary_id: String,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SharedEncounter {
    id: String,
    name: String,
    player_count: u32,
    adversaries: Vec<EncounterAdversary>,
    #[serde(default)]
    battle_point_modifier: i32,
}

impl Encounter {
    pub fn new(name: impl Into<String>, player_count: u32) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            player_count: player_count.max(1),
            adversaries: Vec::new(),
            battle_point_modifier: 0,
            saved_encounter_id: None,
            saved_at: None,
        }
    }

    pub fn from_json_str(text: &str) -> Result<Self, EncounterError> {
        let encounter: Encounter = serde_json::from_str(text)?;
        encounter.validate()?;
        Ok(encounter)
    }

    pub fn to_json(&self) -> Result<String, EncounterError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), EncounterError> {
        if self.player_count == 0 {
            return Err(EncounterError::InvalidPlayerCount(self.name.clone()));
        }
        if let Some(entry) = self
            .adversaries
            .iter()
            .find(|e| !(1..=MAX_ENTRY_QUANTITY).contains(&e.quantity))
        {
            return Err(EncounterError::InvalidQuantity(entry.id.clone()));
        }
        Ok(())
    }

    /// Adds `quantity` of an adversary. Folds into an existing plain entry
    /// (no custom name, no upscaling) for the same adversary when there is
    /// one. Quantities clamp into 1..=[`MAX_ENTRY_QUANTITY`]. Returns the id
    /// of the entry that holds them.
    pub fn add_adversary(&mut self, adversary_id: &str, quantity: u32) -> String {
        let quantity = quantity.clamp(1, MAX_ENTRY_QUANTITY);
        if let Some(entry) = self.adversaries.iter_mut().find(|e| {
            e.adversary_id == adversary_id && e.custom_name.is_none() && e.upscaling == 0
        }) {
            entry.quantity = entry.quantity.saturating_add(quantity).min(MAX_ENTRY_QUANTITY);
            return entry.id.clone();
        }
        let id = Uuid::new_v4().to_string();
        self.adversaries.push(EncounterAdversary {
            id: id.clone(),
            adversary_id: adversary_id.to_string(),
            custom_name: None,
            quantity,
            upscaling: 0,
        });
        id
    }

    pub fn entry(&self, entry_id: &str) -> Option<&EncounterAdversary> {
        self.adversaries.iter().find(|e| e.id == entry_id)
    }

    fn entry_mut(&mut self, entry_id: &str) -> Option<&mut EncounterAdversary> {
        self.adversaries.iter_mut().find(|e| e.id == entry_id)
    }

    pub fn remove_entry(&mut self, entry_id: &str) -> bool {
        let before = self.adversaries.len();
        self.adversaries.retain(|e| e.id != entry_id);
        self.adversaries.len() != before
    }

    /// Quantity clamps into 1..=[`MAX_ENTRY_QUANTITY`]; remove the entry to
    /// drop it entirely.
    pub fn set_quantity(&mut self, entry_id: &str, quantity: u32) -> bool {
        self.entry_mut(entry_id)
            .map(|e| e.quantity = quantity.clamp(1, MAX_ENTRY_QUANTITY))
            .is_some()
    }

    pub fn set_upscaling(&mut self, entry_id: &str, upscaling: i32) -> bool {
        self.entry_mut(entry_id)
            .map(|e| e.upscaling = upscaling)
            .is_some()
    }

    pub fn set_custom_name(&mut self, entry_id: &str, name: Option<String>) -> bool {
        self.entry_mut(entry_id)
            .map(|e| e.custom_name = name.filter(|n| !n.trim().is_empty()))
            .is_some()
    }

    pub fn total_creatures(&self) -> u32 {
        self.adversaries
            .iter()
            .fold(0u32, |total, e| total.saturating_add(e.quantity))
    }

    /// Drops entries whose adversary is not in `catalog` and reports them.
    pub fn resolve_against(&mut self, catalog: &Catalog) -> Vec<MissingAdversary> {
        let mut missing = Vec::new();
        let encounter_id = self.id.clone();
        self.adversaries.retain(|entry| {
            if catalog.contains(&entry.adversary_id) {
                return true;
            }
            warn!(
                encounter = %encounter_id,
                entry = %entry.id,
                adversary = %entry.adversary_id,
                "dropping entry for unknown adversary"
            );
            missing.push(MissingAdversary {
                entry_id: entry.id.clone(),
                adversary_id: entry.adversary_id.clone(),
            });
            false
        });
        missing
    }

    pub fn mark_saved(&mut self, saved_encounter_id: impl Into<String>, saved_at: impl Into<String>) {
        self.saved_encounter_id = Some(saved_encounter_id.into());
        self.saved_at = Some(saved_at.into());
    }

    /// Base64 of the shareable subset (no persistence fields).
    pub fn to_share_code(&self) -> Result<String, EncounterError> {
        let shared = SharedEncounter {
            id: self.id.clone(),
            name: self.name.clone(),
            player_count: self.player_count,
            adversaries: self.adversaries.clone(),
            battle_point_modifier: self.battle_point_modifier,
        };
        let json = serde_json::to_string(&shared)?;
        Ok(STANDARD.encode(json.as_bytes()))
    }

    pub fn from_share_code(code: &str) -> Result<Self, EncounterError> {
        let bytes = STANDARD.decode(code.trim())?;
        let json = String::from_utf8(bytes)?;
        let shared: SharedEncounter = serde_json::from_str(&json)?;
        let encounter = Encounter {
            id: shared.id,
            name: shared.name,
            player_count: shared.player_count,
            adversaries: shared.adversaries,
            battle_point_modifier: shared.battle_point_modifier,
            saved_encounter_id: None,
            saved_at: None,
        };
        encounter.validate()?;
        Ok(encounter)
    }
}
