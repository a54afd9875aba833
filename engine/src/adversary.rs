use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Adversary archetype. Governs battle-point cost and which scaling table
/// applies. Role strings in data that match none of the known archetypes
/// load as `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    Standard,
    Bruiser,
    Horde,
    Leader,
    Minion,
    Ranged,
    Skulk,
    Solo,
    Support,
    Social,
    Legendary,
    Colossal,
    Unknown,
}

impl Role {
    pub const ALL: [Role; 12] = [
        Role::Standard,
        Role::Bruiser,
        Role::Horde,
        Role::Leader,
        Role::Minion,
        Role::Ranged,
        Role::Skulk,
        Role::Solo,
        Role::Support,
        Role::Social,
        Role::Legendary,
        Role::Colossal,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Role::Standard => "STANDARD",
            Role::Bruiser => "BRUISER",
            Role::Horde => "HORDE",
            Role::Leader => "LEADER",
            Role::Minion => "MINION",
            Role::Ranged => "RANGED",
            Role::Skulk => "SKULK",
            Role::Solo => "SOLO",
            Role::Support => "SUPPORT",
            Role::Social => "SOCIAL",
            Role::Legendary => "LEGENDARY",
            Role::Colossal => "COLOSSAL",
            Role::Unknown => "UNKNOWN",
        }
    }

    /// Case-insensitive lookup of a known role. `None` for anything else.
    pub fn parse(s: &str) -> Option<Role> {
        let wanted = s.trim();
        Role::ALL
            .into_iter()
            .find(|r| r.as_str().eq_ignore_ascii_case(wanted))
    }

    pub fn is_minion(&self) -> bool {
        matches!(self, Role::Minion)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for Role {
    fn from(s: String) -> Self {
        Role::parse(&s).unwrap_or(Role::Unknown)
    }
}

impl From<Role> for String {
    fn from(r: Role) -> Self {
        r.as_str().to_string()
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::parse(s).ok_or_else(|| format!("unknown role '{}'", s))
    }
}

/// Damage breakpoints. Creatures either have both or neither.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Thresholds {
    pub major: i32,
    pub severe: i32,
}

impl Thresholds {
    pub fn new(major: i32, severe: i32) -> Self {
        Self { major, severe }
    }

    /// Rebuilds the pair from nullable fields; `None` unless both are set.
    pub fn from_parts(major: Option<i32>, severe: Option<i32>) -> Option<Self> {
        match (major, severe) {
            (Some(major), Some(severe)) => Some(Self { major, severe }),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("thresholds must both be set or both be null (major={major:?}, severe={severe:?})")]
pub struct PartialThresholds {
    pub major: Option<i32>,
    pub severe: Option<i32>,
}

/// Combat statistics of an adversary at a given tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawStats", into = "RawStats")]
pub struct AdversaryStats {
    pub difficulty: i32,
    pub thresholds: Option<Thresholds>,
    pub hp: i32,
    pub stress: i32,
    pub attack_mod: i32,
    pub damage_dice: String,
}

impl AdversaryStats {
    pub fn threshold_major(&self) -> Option<i32> {
        self.thresholds.map(|t| t.major)
    }

    pub fn threshold_severe(&self) -> Option<i32> {
        self.thresholds.map(|t| t.severe)
    }
}

/// Flat on-disk shape of [`AdversaryStats`].
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawStats {
    difficulty: i32,
    #[serde(default)]
    threshold_major: Option<i32>,
    #[serde(default)]
    threshold_severe: Option<i32>,
    hp: i32,
    #[serde(default)]
    stress: i32,
    #[serde(default)]
    attack_mod: i32,
    #[serde(default)]
    damage_dice: String,
}

impl TryFrom<RawStats> for AdversaryStats {
    type Error = PartialThresholds;

    fn try_from(raw: RawStats) -> Result<Self, Self::Error> {
        let thresholds = match (raw.threshold_major, raw.threshold_severe) {
            (None, None) => None,
            (Some(major), Some(severe)) => Some(Thresholds { major, severe }),
            (major, severe) => return Err(PartialThresholds { major, severe }),
        };
        Ok(Self {
            difficulty: raw.difficulty,
            thresholds,
            hp: raw.hp,
            stress: raw.stress,
            attack_mod: raw.attack_mod,
            damage_dice: raw.damage_dice,
        })
    }
}

impl From<AdversaryStats> for RawStats {
    fn from(s: AdversaryStats) -> Self {
        Self {
            difficulty: s.difficulty,
            threshold_major: s.threshold_major(),
            threshold_severe: s.threshold_severe(),
            hp: s.hp,
            stress: s.stress,
            attack_mod: s.attack_mod,
            damage_dice: s.damage_dice,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureEntry {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feature {
    pub name: String,
    #[serde(default)]
    pub entries: Vec<FeatureEntry>,
}

/// A statblock from the static catalog. Never mutated after load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Adversary {
    pub id: String,
    pub name: String,
    pub tier: u8,
    pub role: Role,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub biome: String,
    #[serde(default)]
    pub source: String,
    pub stats: AdversaryStats,
    #[serde(default)]
    pub features: Vec<Feature>,
    #[serde(default)]
    pub original_cr: Option<String>,
}

impl Adversary {
    pub fn is_minion(&self) -> bool {
        self.role.is_minion()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_parse_is_case_insensitive() {
        assert_eq!(Role::parse("bruiser"), Some(Role::Bruiser));
        assert_eq!(Role::parse(" Minion "), Some(Role::Minion));
        assert_eq!(Role::parse("wizard"), None);
        assert_eq!(Role::from("wizard".to_string()), Role::Unknown);
    }

    #[test]
    fn stats_reject_half_null_thresholds() {
        let json = r#"{"difficulty":12,"threshold_major":7,"threshold_severe":null,
            "hp":5,"stress":3,"attack_mod":1,"damage_dice":"1d8+2"}"#;
        let err = serde_json::from_str::<AdversaryStats>(json).unwrap_err();
        assert!(err.to_string().contains("both be set or both be null"));
    }

    #[test]
    fn stats_keep_flat_json_shape() {
        let stats = AdversaryStats {
            difficulty: 10,
            thresholds: None,
            hp: 1,
            stress: 1,
            attack_mod: -1,
            damage_dice: "2".into(),
        };
        let value = serde_json::to_value(&stats).unwrap();
        assert!(value["threshold_major"].is_null());
        assert!(value["threshold_severe"].is_null());
        assert_eq!(value["attack_mod"], -1);
    }
}
