//! Tier scaling: shifts an adversary up or down the four power tiers.
//!
//! Each role has a fixed adjustment per tier transition (1→2, 2→3, 3→4).
//! Scaling across several tiers sums every transition crossed; scaling down
//! subtracts the same entries, so up-then-down along one path is lossless.
//! Nothing in here fails: bad dice text passes through, unknown roles use the
//! STANDARD table and tiers clamp into 1..=4.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::adversary::{Adversary, AdversaryStats, Feature, FeatureEntry, Role, Thresholds};
use crate::{MAX_TIER, MIN_TIER};

/// Stat change for crossing one tier boundary upward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TierAdjustment {
    pub difficulty: i32,
    pub threshold_major: Option<i32>,
    pub threshold_severe: Option<i32>,
    pub hp: i32,
    pub stress: i32,
    pub attack_mod: i32,
}

const fn step(
    difficulty: i32,
    major: i32,
    severe: i32,
    hp: i32,
    stress: i32,
    attack_mod: i32,
) -> TierAdjustment {
    TierAdjustment {
        difficulty,
        threshold_major: Some(major),
        threshold_severe: Some(severe),
        hp,
        stress,
        attack_mod,
    }
}

const fn minion_step(difficulty: i32, hp: i32, stress: i32, attack_mod: i32) -> TierAdjustment {
    TierAdjustment {
        difficulty,
        threshold_major: None,
        threshold_severe: None,
        hp,
        stress,
        attack_mod,
    }
}

// Indexed by transition: [1→2, 2→3, 3→4].
const STANDARD: [TierAdjustment; 3] = [
    step(3, 5, 10, 1, 1, 1),
    step(2, 7, 15, 1, 1, 1),
    step(2, 10, 20, 1, 1, 1),
];
const BRUISER: [TierAdjustment; 3] = [
    step(2, 6, 12, 2, 1, 2),
    step(3, 10, 20, 2, 1, 2),
    step(2, 15, 25, 2, 1, 2),
];
const HORDE: [TierAdjustment; 3] = [
    step(2, 5, 8, 2, 0, 0),
    step(2, 12, 12, 0, 1, 1),
    step(2, 15, 27, 2, 0, 0),
];
const LEADER: [TierAdjustment; 3] = [
    step(2, 6, 10, 0, 0, 1),
    step(2, 6, 15, 1, 0, 2),
    step(2, 7, 20, 2, 1, 3),
];
const MINION: [TierAdjustment; 3] = [
    minion_step(1, 0, 0, 1),
    minion_step(1, 0, 1, 1),
    minion_step(1, 0, 0, 1),
];
const RANGED: [TierAdjustment; 3] = [
    step(1, 3, 6, 1, 0, 1),
    step(3, 7, 14, 1, 1, 2),
    step(2, 5, 10, 1, 1, 1),
];
const SKULK: [TierAdjustment; 3] = [
    step(2, 3, 8, 1, 1, 1),
    step(3, 8, 12, 1, 1, 1),
    step(3, 8, 10, 1, 1, 1),
];
const SOLO: [TierAdjustment; 3] = [
    step(2, 5, 10, 0, 1, 2),
    step(2, 7, 15, 2, 1, 2),
    step(3, 12, 25, 0, 1, 3),
];
const SUPPORT: [TierAdjustment; 3] = [
    step(2, 3, 10, 1, 1, 1),
    step(2, 7, 12, 0, 0, 1),
    step(2, 8, 15, 1, 1, 1),
];

pub fn scaling_table(role: Role) -> &'static [TierAdjustment; 3] {
    match role {
        Role::Bruiser => &BRUISER,
        Role::Horde => &HORDE,
        Role::Leader => &LEADER,
        Role::Minion => &MINION,
        Role::Ranged => &RANGED,
        Role::Skulk => &SKULK,
        Role::Solo => &SOLO,
        Role::Support => &SUPPORT,
        Role::Standard | Role::Social | Role::Legendary | Role::Colossal | Role::Unknown => {
            &STANDARD
        }
    }
}

/// Knobs the pure scaling rules leave open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScalingOptions {
    /// Floor for rescaled dice counts. `None` leaves counts unclamped, so
    /// `1d8+2` scaled down one tier becomes `0d8+0`.
    #[serde(default)]
    pub min_damage_dice: Option<u32>,
}

/// `base_tier + upscaling`, clamped into 1..=4.
pub fn effective_tier(base_tier: u8, upscaling: i32) -> u8 {
    let shifted = base_tier as i64 + upscaling as i64;
    shifted.clamp(MIN_TIER as i64, MAX_TIER as i64) as u8
}

/// Signed tier shift after clamping.
pub fn tier_delta(base_tier: u8, upscaling: i32) -> i32 {
    effective_tier(base_tier, upscaling) as i32 - base_tier as i32
}

#[derive(Debug, Default)]
struct Accumulated {
    difficulty: i32,
    thresholds: Option<(i32, i32)>,
    hp: i32,
    stress: i32,
    attack_mod: i32,
}

fn accumulate(role: Role, from: u8, to: u8) -> Accumulated {
    let table = scaling_table(role);
    let (lo, hi, sign) = if to >= from { (from, to, 1) } else { (to, from, -1) };
    let mut acc = Accumulated {
        thresholds: Some((0, 0)),
        ..Default::default()
    };
    // Transition index for lo→lo+1 is lo-1; tiers outside 1..=4 never get here.
    for tier in lo.max(MIN_TIER)..hi.min(MAX_TIER) {
        let adj = &table[(tier - 1) as usize];
        acc.difficulty += sign * adj.difficulty;
        acc.hp += sign * adj.hp;
        acc.stress += sign * adj.stress;
        acc.attack_mod += sign * adj.attack_mod;
        acc.thresholds = match (acc.thresholds, adj.threshold_major, adj.threshold_severe) {
            (Some((major, severe)), Some(dm), Some(ds)) => {
                Some((major + sign * dm, severe + sign * ds))
            }
            _ => None,
        };
    }
    acc
}

pub fn compute_scaled_stats(adversary: &Adversary, upscaling: i32) -> AdversaryStats {
    compute_scaled_stats_with(adversary, upscaling, &ScalingOptions::default())
}

pub fn compute_scaled_stats_with(
    adversary: &Adversary,
    upscaling: i32,
    opts: &ScalingOptions,
) -> AdversaryStats {
    let base = &adversary.stats;
    let target = effective_tier(adversary.tier, upscaling);
    if upscaling == 0 || target == adversary.tier {
        return base.clone();
    }

    let delta = target as i32 - adversary.tier as i32;
    let acc = accumulate(adversary.role, adversary.tier, target);
    debug!(
        adversary = %adversary.id,
        from = adversary.tier,
        to = target,
        "scaling adversary stats"
    );

    let thresholds = if adversary.is_minion() {
        None
    } else {
        match (base.thresholds, acc.thresholds) {
            (Some(t), Some((dm, ds))) => Some(Thresholds::new(t.major + dm, t.severe + ds)),
            (other, _) => other,
        }
    };

    AdversaryStats {
        difficulty: (base.difficulty + acc.difficulty).max(1),
        thresholds,
        hp: (base.hp + acc.hp).max(1),
        stress: (base.stress + acc.stress).max(0),
        attack_mod: base.attack_mod + acc.attack_mod,
        damage_dice: scale_damage_dice_with(&base.damage_dice, delta, opts),
    }
}

static DAMAGE_DICE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(\d+)\s*d\s*(\d+)\s*(?:([+-])\s*(\d+))?\s*$").expect("damage dice regex")
});

static AVERAGE_FORM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b\d+\s*\(\s*(\d+)d(\d+)(?:\s*([+-])\s*(\d+))?\s*\)")
        .expect("average dice regex")
});

static BARE_FORM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(\d+)d(\d+)(?:\s*([+-])\s*(\d+))?\b").expect("bare dice regex")
});

/// Dice pieces pulled out of a regex match, in the capture layout shared by
/// all three patterns above: count, sides, sign, modifier.
#[derive(Debug, Clone, Copy)]
struct DiceParts {
    count: i64,
    sides: i64,
    modifier: i64,
}

impl DiceParts {
    fn from_captures(caps: &Captures<'_>) -> Option<Self> {
        let count = caps.get(1)?.as_str().parse().ok()?;
        let sides = caps.get(2)?.as_str().parse().ok()?;
        let modifier = match (caps.get(3), caps.get(4)) {
            (Some(sign), Some(value)) => {
                let v: i64 = value.as_str().parse().ok()?;
                if sign.as_str() == "-" { -v } else { v }
            }
            _ => 0,
        };
        Some(Self { count, sides, modifier })
    }

    /// `None` when the rescaled numbers no longer fit; callers keep the
    /// original text then.
    fn scaled(self, delta: i32, opts: &ScalingOptions) -> Option<Self> {
        let delta = delta as i64;
        let mut count = self.count.checked_add(delta)?;
        if let Some(floor) = opts.min_damage_dice {
            count = count.max(floor as i64);
        }
        Some(Self {
            count,
            sides: self.sides,
            modifier: self.modifier.checked_add(delta * 2)?,
        })
    }

    fn average(&self) -> Option<i64> {
        let rolled = self.count.checked_mul(self.sides.checked_add(1)?)?;
        rolled.div_euclid(2).checked_add(self.modifier)
    }

    fn render(&self) -> String {
        format!("{}d{}{:+}", self.count, self.sides, self.modifier)
    }
}

/// Rescales a `<count>d<sides>[±mod]` string: one die and +2 per tier.
/// Anything else (flat values, ranges like `1-3`) is returned unchanged.
pub fn scale_damage_dice(dice: &str, tier_delta: i32) -> String {
    scale_damage_dice_with(dice, tier_delta, &ScalingOptions::default())
}

pub fn scale_damage_dice_with(dice: &str, tier_delta: i32, opts: &ScalingOptions) -> String {
    if tier_delta == 0 {
        return dice.to_string();
    }
    match DAMAGE_DICE
        .captures(dice)
        .and_then(|caps| DiceParts::from_captures(&caps))
        .and_then(|parts| parts.scaled(tier_delta, opts))
    {
        Some(parts) => parts.render(),
        None => dice.to_string(),
    }
}

fn placeholder(index: usize) -> String {
    format!("\u{E000}{}\u{E001}", index)
}

/// Rescales damage written into feature prose. Handles `27 (6d8)` average
/// forms first, parking each rewrite behind a placeholder so the bare-dice
/// pass cannot scale the same dice twice, then bare `1d8+3` forms.
pub fn scale_damage_dice_in_text(text: &str, tier_delta: i32) -> String {
    scale_damage_dice_in_text_with(text, tier_delta, &ScalingOptions::default())
}

pub fn scale_damage_dice_in_text_with(text: &str, tier_delta: i32, opts: &ScalingOptions) -> String {
    if tier_delta == 0 {
        return text.to_string();
    }

    let mut parked: Vec<String> = Vec::new();
    let first = AVERAGE_FORM.replace_all(text, |caps: &Captures<'_>| {
        let rewritten = DiceParts::from_captures(caps)
            .and_then(|parts| parts.scaled(tier_delta, opts))
            .and_then(|scaled| Some(format!("{} ({})", scaled.average()?, scaled.render())));
        // Unscalable forms are parked verbatim so the bare pass leaves them alone.
        parked.push(rewritten.unwrap_or_else(|| caps[0].to_string()));
        placeholder(parked.len() - 1)
    });

    let second = BARE_FORM.replace_all(&first, |caps: &Captures<'_>| {
        DiceParts::from_captures(caps)
            .and_then(|parts| parts.scaled(tier_delta, opts))
            .map(|scaled| scaled.render())
            .unwrap_or_else(|| caps[0].to_string())
    });

    let mut out = second.into_owned();
    for (index, rewritten) in parked.iter().enumerate() {
        out = out.replace(&placeholder(index), rewritten);
    }
    out
}

pub fn scale_features(features: &[Feature], tier_delta: i32, opts: &ScalingOptions) -> Vec<Feature> {
    features
        .iter()
        .map(|feature| Feature {
            name: feature.name.clone(),
            entries: feature
                .entries
                .iter()
                .map(|entry| FeatureEntry {
                    name: entry.name.clone(),
                    description: scale_damage_dice_in_text_with(
                        &entry.description,
                        tier_delta,
                        opts,
                    ),
                })
                .collect(),
        })
        .collect()
}

/// Signed per-field difference between base and scaled stats, for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatAdjustments {
    pub difficulty: i32,
    pub threshold_major: Option<i32>,
    pub threshold_severe: Option<i32>,
    pub hp: i32,
    pub stress: i32,
    pub attack_mod: i32,
    pub damage_dice_changed: bool,
}

impl StatAdjustments {
    pub fn is_empty(&self) -> bool {
        self.difficulty == 0
            && self.threshold_major.unwrap_or(0) == 0
            && self.threshold_severe.unwrap_or(0) == 0
            && self.hp == 0
            && self.stress == 0
            && self.attack_mod == 0
            && !self.damage_dice_changed
    }
}

pub fn calculate_stat_adjustments(base: &AdversaryStats, scaled: &AdversaryStats) -> StatAdjustments {
    let (threshold_major, threshold_severe) = match (base.thresholds, scaled.thresholds) {
        (Some(b), Some(s)) => (Some(s.major - b.major), Some(s.severe - b.severe)),
        _ => (None, None),
    };
    StatAdjustments {
        difficulty: scaled.difficulty - base.difficulty,
        threshold_major,
        threshold_severe,
        hp: scaled.hp - base.hp,
        stress: scaled.stress - base.stress,
        attack_mod: scaled.attack_mod - base.attack_mod,
        damage_dice_changed: scaled.damage_dice != base.damage_dice,
    }
}

/// Everything a statblock view needs after applying an upscaling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScaledAdversary {
    pub adversary_id: String,
    pub name: String,
    pub role: Role,
    pub base_tier: u8,
    pub effective_tier: u8,
    pub tier_delta: i32,
    pub base: AdversaryStats,
    pub stats: AdversaryStats,
    pub adjustments: StatAdjustments,
    pub features: Vec<Feature>,
}

pub fn scale_adversary(adversary: &Adversary, upscaling: i32, opts: &ScalingOptions) -> ScaledAdversary {
    let stats = compute_scaled_stats_with(adversary, upscaling, opts);
    let delta = tier_delta(adversary.tier, upscaling);
    ScaledAdversary {
        adversary_id: adversary.id.clone(),
        name: adversary.name.clone(),
        role: adversary.role,
        base_tier: adversary.tier,
        effective_tier: effective_tier(adversary.tier, upscaling),
        tier_delta: delta,
        adjustments: calculate_stat_adjustments(&adversary.stats, &stats),
        base: adversary.stats.clone(),
        stats,
        features: scale_features(&adversary.features, delta, opts),
    }
}
