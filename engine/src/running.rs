//! Live combat tracking for an encounter that is being played.
//!
//! A [`RunningEncounter`] is a throwaway snapshot: one instance per creature,
//! each with its own HP and Stress pools sized from the scaled statblock.
//! Pools count *marked* slots, so a fresh instance starts at 0 and is
//! defeated once every HP slot is marked. Nothing here writes back to the
//! encounter or to storage.

use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::adversary::Thresholds;
use crate::catalog::Catalog;
use crate::encounter::{Encounter, MAX_ENTRY_QUANTITY};
use crate::scaling::{ScalingOptions, compute_scaled_stats_with};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HpThreshold {
    Minor,
    Major,
    Severe,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncounterInstance {
    pub instance_id: String,
    pub encounter_adversary_id: String,
    pub adversary_id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_name: Option<String>,
    pub upscaling: i32,
    #[serde(rename = "currentHP")]
    pub current_hp: i32,
    #[serde(rename = "maxHP")]
    pub max_hp: i32,
    pub current_stress: i32,
    pub max_stress: i32,
    pub thresholds: Option<Thresholds>,
    pub hp_threshold: HpThreshold,
}

impl EncounterInstance {
    pub fn display_name(&self) -> &str {
        self.custom_name.as_deref().unwrap_or(&self.name)
    }

    pub fn is_defeated(&self) -> bool {
        self.current_hp >= self.max_hp
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunningEncounter {
    pub id: String,
    pub name: String,
    pub player_count: u32,
    pub battle_point_modifier: i32,
    pub instances: Vec<EncounterInstance>,
}

impl RunningEncounter {
    pub fn instance(&self, instance_id: &str) -> Option<&EncounterInstance> {
        self.instances.iter().find(|i| i.instance_id == instance_id)
    }

    pub fn defeated(&self) -> impl Iterator<Item = &EncounterInstance> {
        self.instances.iter().filter(|i| i.is_defeated())
    }

    pub fn is_over(&self) -> bool {
        self.instances.iter().all(|i| i.is_defeated())
    }
}

/// Severity label for a tracked HP value. Creatures without thresholds are
/// always `Minor`.
pub fn get_hp_threshold(current_hp: i32, thresholds: Option<Thresholds>) -> HpThreshold {
    match thresholds {
        None => HpThreshold::Minor,
        Some(t) if current_hp <= t.severe => HpThreshold::Severe,
        Some(t) if current_hp <= t.major => HpThreshold::Major,
        Some(_) => HpThreshold::Minor,
    }
}

pub fn initialize_running_encounter(encounter: &Encounter, catalog: &Catalog) -> RunningEncounter {
    initialize_running_encounter_with(encounter, catalog, &ScalingOptions::default())
}

/// Expands every entry into `quantity` instances (at most
/// [`MAX_ENTRY_QUANTITY`]). Entries whose adversary is
/// missing are skipped; callers are expected to have resolved the encounter
/// against the catalog already.
pub fn initialize_running_encounter_with(
    encounter: &Encounter,
    catalog: &Catalog,
    opts: &ScalingOptions,
) -> RunningEncounter {
    let mut instances = Vec::new();
    for entry in &encounter.adversaries {
        let Some(adversary) = catalog.get(&entry.adversary_id) else {
            continue;
        };
        let stats = compute_scaled_stats_with(adversary, entry.upscaling, opts);
        for n in 1..=entry.quantity.min(MAX_ENTRY_QUANTITY) {
            instances.push(EncounterInstance {
                instance_id: format!("{}-{}", entry.id, n),
                encounter_adversary_id: entry.id.clone(),
                adversary_id: adversary.id.clone(),
                name: adversary.name.clone(),
                custom_name: entry.custom_name.clone(),
                upscaling: entry.upscaling,
                current_hp: 0,
                max_hp: stats.hp,
                current_stress: 0,
                max_stress: stats.stress,
                thresholds: stats.thresholds,
                hp_threshold: get_hp_threshold(0, stats.thresholds),
            });
        }
    }
    debug!(
        encounter = %encounter.id,
        instances = instances.len(),
        "running encounter initialized"
    );
    RunningEncounter {
        id: Uuid::new_v4().to_string(),
        name: encounter.name.clone(),
        player_count: encounter.player_count,
        battle_point_modifier: encounter.battle_point_modifier,
        instances,
    }
}

fn clamp_pool(current: i32, delta: i32, max: i32) -> i32 {
    current.saturating_add(delta).clamp(0, max.max(0))
}

/// Returns a copy of `instances` with the HP of `instance_id` moved by
/// `delta`, clamped into `0..=max_hp`. Unknown ids change nothing.
pub fn update_instance_hp(
    instances: &[EncounterInstance],
    instance_id: &str,
    delta: i32,
) -> Vec<EncounterInstance> {
    instances
        .iter()
        .map(|inst| {
            if inst.instance_id != instance_id {
                return inst.clone();
            }
            let current_hp = clamp_pool(inst.current_hp, delta, inst.max_hp);
            EncounterInstance {
                current_hp,
                hp_threshold: get_hp_threshold(current_hp, inst.thresholds),
                ..inst.clone()
            }
        })
        .collect()
}

pub fn update_instance_stress(
    instances: &[EncounterInstance],
    instance_id: &str,
    delta: i32,
) -> Vec<EncounterInstance> {
    instances
        .iter()
        .map(|inst| {
            if inst.instance_id != instance_id {
                return inst.clone();
            }
            EncounterInstance {
                current_stress: clamp_pool(inst.current_stress, delta, inst.max_stress),
                ..inst.clone()
            }
        })
        .collect()
}

/// HP slots marked by one hit. Severe damage marks 3, major 2, anything
/// else that lands 1. Without thresholds a creature goes down in one hit, so
/// the whole pool is marked.
pub fn hp_marks_for_damage(damage: i32, thresholds: Option<Thresholds>, max_hp: i32) -> i32 {
    if damage <= 0 {
        return 0;
    }
    match thresholds {
        None => max_hp.max(1),
        Some(t) if damage >= t.severe => 3,
        Some(t) if damage >= t.major => 2,
        Some(_) => 1,
    }
}

/// Converts raw damage into HP marks for one instance and applies them.
pub fn apply_damage(
    instances: &[EncounterInstance],
    instance_id: &str,
    damage: i32,
) -> Vec<EncounterInstance> {
    match instances.iter().find(|i| i.instance_id == instance_id) {
        Some(inst) => {
            let marks = hp_marks_for_damage(damage, inst.thresholds, inst.max_hp);
            debug!(instance = %instance_id, damage, marks, "damage applied");
            update_instance_hp(instances, instance_id, marks)
        }
        None => instances.to_vec(),
    }
}
