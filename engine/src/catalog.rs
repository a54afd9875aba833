use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::adversary::{Adversary, Role};
use crate::error::CatalogError;
use crate::{MAX_TIER, MIN_TIER};

/// The static adversary dataset, keyed by id in source order.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    adversaries: IndexMap<String, Adversary>,
}

impl Catalog {
    /// Validates and indexes `records`. Minions carrying thresholds are
    /// normalized to none.
    pub fn from_adversaries(records: Vec<Adversary>) -> Result<Self, CatalogError> {
        let mut adversaries = IndexMap::with_capacity(records.len());
        for mut adv in records {
            if !(MIN_TIER..=MAX_TIER).contains(&adv.tier) {
                return Err(CatalogError::InvalidTier {
                    id: adv.id,
                    tier: adv.tier,
                });
            }
            if adv.is_minion() && adv.stats.thresholds.is_some() {
                warn!(adversary = %adv.id, "minion has thresholds; dropping them");
                adv.stats.thresholds = None;
            } else if !adv.is_minion() && adv.stats.thresholds.is_none() {
                warn!(adversary = %adv.id, role = %adv.role, "non-minion without thresholds");
            }
            if adversaries.contains_key(&adv.id) {
                return Err(CatalogError::DuplicateId(adv.id));
            }
            adversaries.insert(adv.id.clone(), adv);
        }
        debug!(count = adversaries.len(), "catalog loaded");
        Ok(Self { adversaries })
    }

    pub fn from_json_str(text: &str) -> Result<Self, CatalogError> {
        let records: Vec<Adversary> = serde_json::from_str(text)?;
        Self::from_adversaries(records)
    }

    pub fn from_yaml_str(text: &str) -> Result<Self, CatalogError> {
        let records: Vec<Adversary> = serde_yaml::from_str(text)?;
        Self::from_adversaries(records)
    }

    /// Loads a `.json`, `.yaml` or `.yml` file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_text_for_path(path, &text)
    }

    /// Parses `text` in the format implied by `path`'s extension.
    pub fn from_text_for_path(path: &Path, text: &str) -> Result<Self, CatalogError> {
        match extension(path).as_deref() {
            Some("json") => Self::from_json_str(text),
            Some("yaml") | Some("yml") => Self::from_yaml_str(text),
            _ => Err(CatalogError::UnknownFormat(path.to_path_buf())),
        }
    }

    /// The dataset compiled into the crate.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_json_str(crate::content::BUILTIN_ADVERSARIES)
    }

    pub fn get(&self, id: &str) -> Option<&Adversary> {
        self.adversaries.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.adversaries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.adversaries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adversaries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Adversary> {
        self.adversaries.values()
    }

    pub fn filter<'a>(&'a self, filter: &'a AdversaryFilter) -> impl Iterator<Item = &'a Adversary> {
        self.iter().filter(move |a| filter.matches(a))
    }

    pub fn categories(&self) -> Vec<String> {
        self.distinct(|a| &a.category)
    }

    pub fn biomes(&self) -> Vec<String> {
        self.distinct(|a| &a.biome)
    }

    pub fn sources(&self) -> Vec<String> {
        self.distinct(|a| &a.source)
    }

    fn distinct(&self, field: impl Fn(&Adversary) -> &String) -> Vec<String> {
        self.iter()
            .map(field)
            .filter(|v| !v.is_empty())
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

/// Catalog query. Empty lists match everything; text fields compare
/// case-insensitively.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdversaryFilter {
    #[serde(default)]
    pub tiers: Vec<u8>,
    #[serde(default)]
    pub roles: Vec<Role>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub biomes: Vec<String>,
    #[serde(default)]
    pub sources: Vec<String>,
    /// Substring of the name or id.
    #[serde(default)]
    pub search: Option<String>,
}

impl AdversaryFilter {
    pub fn matches(&self, adv: &Adversary) -> bool {
        (self.tiers.is_empty() || self.tiers.contains(&adv.tier))
            && (self.roles.is_empty() || self.roles.contains(&adv.role))
            && any_eq(&self.categories, &adv.category)
            && any_eq(&self.biomes, &adv.biome)
            && any_eq(&self.sources, &adv.source)
            && self.search.as_deref().is_none_or(|needle| {
                let needle = needle.trim().to_lowercase();
                adv.name.to_lowercase().contains(&needle) || adv.id.to_lowercase().contains(&needle)
            })
    }
}

fn any_eq(wanted: &[String], value: &str) -> bool {
    wanted.is_empty() || wanted.iter().any(|w| w.eq_ignore_ascii_case(value))
}
