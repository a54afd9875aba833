use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

pub mod adversary;
pub mod api;
pub mod battle_points;
pub mod catalog;
pub mod config;
pub mod content;
pub mod dice;
pub mod encounter;
pub mod error;
pub mod running;
pub mod scaling;

pub use adversary::{Adversary, AdversaryStats, Feature, FeatureEntry, Role, Thresholds};
pub use catalog::{AdversaryFilter, Catalog};
pub use dice::{
    find_dice_in_text, format_roll_result, parse_dice_expression, roll_d20_with_modifier,
    roll_dice_expression, segment_dice_text, DiceExpression, DiceSpan, RollResult, TextSegment,
};
pub use encounter::{Encounter, EncounterAdversary, MAX_ENTRY_QUANTITY, MissingAdversary};
pub use error::{CatalogError, ConfigError, DiceError, EncounterError};
pub use running::{
    get_hp_threshold, initialize_running_encounter, update_instance_hp, update_instance_stress,
    EncounterInstance, HpThreshold, RunningEncounter,
};
pub use scaling::{
    calculate_stat_adjustments, compute_scaled_stats, effective_tier, scale_damage_dice,
    scale_damage_dice_in_text, StatAdjustments,
};

pub const MIN_TIER: u8 = 1;
pub const MAX_TIER: u8 = 4;

/// Source of die results. Real play uses an entropy-seeded ChaCha stream;
/// tests and simulations pin a seed or script exact faces.
pub struct Dice {
    source: DiceSource,
}

enum DiceSource {
    Rng(ChaCha8Rng),
    Scripted { faces: Vec<u32>, next: usize },
}

impl Dice {
    pub fn from_entropy() -> Self {
        Self { source: DiceSource::Rng(ChaCha8Rng::from_entropy()) }
    }

    pub fn from_seed(seed: u64) -> Self {
        Self { source: DiceSource::Rng(ChaCha8Rng::seed_from_u64(seed)) }
    }

    /// Replays `faces` in order, cycling when exhausted. Each face is clamped
    /// into the die being rolled.
    pub fn from_scripted(faces: Vec<u32>) -> Self {
        Self { source: DiceSource::Scripted { faces, next: 0 } }
    }

    /// One uniform draw in `1..=sides`. `sides` of zero is treated as a d1.
    pub fn roll_die(&mut self, sides: u32) -> u32 {
        let sides = sides.max(1);
        match &mut self.source {
            DiceSource::Rng(rng) => rng.gen_range(1..=sides),
            DiceSource::Scripted { faces, next } => {
                if faces.is_empty() {
                    return 1;
                }
                let face = faces[*next % faces.len()];
                *next += 1;
                face.clamp(1, sides)
            }
        }
    }

    pub fn d20(&mut self) -> u32 {
        self.roll_die(20)
    }
}

impl Default for Dice {
    fn default() -> Self {
        Self::from_entropy()
    }
}
