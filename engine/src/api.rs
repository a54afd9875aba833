use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};
use encoding_rs::Encoding;
use serde::{Deserialize, Serialize};

use crate::battle_points::{BattlePointSummary, evaluate_encounter};
use crate::catalog::Catalog;
use crate::config::EngineConfig;
use crate::dice::DiceExpression;
use crate::encounter::{Encounter, MissingAdversary};
use crate::running::{
    EncounterInstance, RunningEncounter, apply_damage, initialize_running_encounter_with,
    update_instance_hp, update_instance_stress,
};
use crate::scaling::{ScaledAdversary, ScalingOptions, scale_adversary};
use crate::{Dice, content};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ScaleConfig {
    pub adversary: String,
    #[serde(default)]
    pub upscaling: i32,
    #[serde(default)]
    pub catalog_path: Option<PathBuf>,
    #[serde(default)]
    pub scaling: ScalingOptions,
}

/// Where an encounter comes from: a builtin id, a JSON file or a share code.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct EncounterSource {
    #[serde(default)]
    pub encounter_id: Option<String>,
    #[serde(default)]
    pub encounter_path: Option<PathBuf>,
    #[serde(default)]
    pub share_code: Option<String>,
}

/// One tracker edit, applied in order during a run.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum TrackerAction {
    /// Raw damage, converted to HP marks through the thresholds.
    Damage { instance: String, amount: i32 },
    Hp { instance: String, delta: i32 },
    Stress { instance: String, delta: i32 },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RunConfig {
    #[serde(flatten)]
    pub source: EncounterSource,
    #[serde(default)]
    pub catalog_path: Option<PathBuf>,
    #[serde(default)]
    pub scaling: ScalingOptions,
    #[serde(default)]
    pub actions: Vec<TrackerAction>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct RunResult {
    pub encounter: Encounter,
    pub missing: Vec<MissingAdversary>,
    pub budget: BattlePointSummary,
    pub running: RunningEncounter,
    pub log: Vec<String>,
}

/// Reads a text file, decoding UTF-8/UTF-16 when it starts with a BOM.
pub fn read_text_auto(path: &Path) -> Result<String> {
    let bytes = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    if let Some((enc, bom_len)) = Encoding::for_bom(&bytes) {
        let (cow, _, _) = enc.decode(&bytes[bom_len..]);
        Ok(cow.into_owned())
    } else {
        String::from_utf8(bytes).with_context(|| format!("{} is not UTF-8", path.display()))
    }
}

/// The defaults when no config file is given.
pub fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    match path {
        Some(p) => {
            let text = read_text_auto(p)?;
            EngineConfig::from_text_for_path(p, &text)
                .with_context(|| format!("invalid config: {}", p.display()))
        }
        None => Ok(EngineConfig::default()),
    }
}

/// `path` may also name a builtin catalog such as `core`.
pub fn load_catalog(path: Option<&Path>) -> Result<Catalog> {
    let Some(p) = path else {
        return Catalog::builtin().context("builtin catalog is invalid");
    };
    if let Some(text) = p.to_str().and_then(|name| content::builtin_catalogs().get(name).copied()) {
        return Catalog::from_json_str(text)
            .with_context(|| format!("builtin catalog '{}' is invalid", p.display()));
    }
    let text = read_text_auto(p)?;
    Catalog::from_text_for_path(p, &text)
        .with_context(|| format!("failed to load catalog: {}", p.display()))
}

pub fn load_encounter(source: &EncounterSource) -> Result<Encounter> {
    if let Some(code) = &source.share_code {
        return Encounter::from_share_code(code).context("failed to decode share code");
    }
    if let Some(path) = &source.encounter_path {
        let text = read_text_auto(path)?;
        return Encounter::from_json_str(&text)
            .with_context(|| format!("failed to parse encounter JSON: {}", path.display()));
    }
    if let Some(id) = &source.encounter_id {
        let builtins = content::builtin_encounters();
        let text = builtins
            .get(id.as_str())
            .ok_or_else(|| anyhow!("unknown builtin encounter '{}'", id))?;
        return Encounter::from_json_str(text)
            .with_context(|| format!("builtin encounter '{}' is invalid", id));
    }
    bail!("no encounter given (need an id, a path or a share code)")
}

pub fn scale(cfg: ScaleConfig) -> Result<ScaledAdversary> {
    let catalog = load_catalog(cfg.catalog_path.as_deref())?;
    let adversary = catalog
        .get(&cfg.adversary)
        .ok_or_else(|| anyhow!("adversary '{}' not found", cfg.adversary))?;
    Ok(scale_adversary(adversary, cfg.upscaling, &cfg.scaling))
}

/// Loads an encounter, drops unknown entries, prices it and expands it into
/// a tracker, then replays `actions` against the tracker.
pub fn run_encounter(cfg: RunConfig) -> Result<RunResult> {
    let catalog = load_catalog(cfg.catalog_path.as_deref())?;
    let encounter = load_encounter(&cfg.source)?;
    Ok(run_loaded(&catalog, encounter, &cfg.scaling, &cfg.actions))
}

/// [`run_encounter`] for an encounter and catalog the caller already holds.
pub fn run_loaded(
    catalog: &Catalog,
    mut encounter: Encounter,
    scaling: &ScalingOptions,
    actions: &[TrackerAction],
) -> RunResult {
    let mut log = Vec::new();

    let missing = encounter.resolve_against(catalog);
    for m in &missing {
        log.push(format!(
            "[WARN] entry {} dropped: adversary '{}' not in catalog",
            m.entry_id, m.adversary_id
        ));
    }

    let budget = evaluate_encounter(&encounter, catalog);
    log.push(format!(
        "[BUDGET] spent {} of {} ({:+} remaining)",
        budget.spent, budget.budget, budget.remaining
    ));

    let mut running = initialize_running_encounter_with(&encounter, catalog, scaling);
    log.push(format!(
        "[START] {}: {} creatures for {} players",
        running.name,
        running.instances.len(),
        running.player_count
    ));

    for action in actions {
        let (id, next) = match action {
            TrackerAction::Damage { instance, amount } => {
                (instance, apply_damage(&running.instances, instance, *amount))
            }
            TrackerAction::Hp { instance, delta } => {
                (instance, update_instance_hp(&running.instances, instance, *delta))
            }
            TrackerAction::Stress { instance, delta } => {
                (instance, update_instance_stress(&running.instances, instance, *delta))
            }
        };
        match (running.instance(id), next.iter().find(|i| &i.instance_id == id)) {
            (Some(before), Some(after)) => log_change(&mut log, action, before, after),
            _ => log.push(format!("[SKIP] no instance '{}'", id)),
        }
        running.instances = next;
    }

    if running.is_over() && !running.instances.is_empty() {
        log.push("[END] every creature is defeated".to_string());
    }

    RunResult {
        encounter,
        missing,
        budget,
        running,
        log,
    }
}

fn log_change(
    log: &mut Vec<String>,
    action: &TrackerAction,
    before: &EncounterInstance,
    after: &EncounterInstance,
) {
    let name = after.display_name();
    match action {
        TrackerAction::Damage { amount, .. } => log.push(format!(
            "[DMG][{}] {} damage → HP {} → {}/{}",
            name, amount, before.current_hp, after.current_hp, after.max_hp
        )),
        TrackerAction::Hp { .. } => log.push(format!(
            "[HP][{}] {} → {}/{} ({:?})",
            name, before.current_hp, after.current_hp, after.max_hp, after.hp_threshold
        )),
        TrackerAction::Stress { .. } => log.push(format!(
            "[STRESS][{}] {} → {}/{}",
            name, before.current_stress, after.current_stress, after.max_stress
        )),
    }
    if after.is_defeated() && !before.is_defeated() {
        log.push(format!("[DOWN][{}] defeated", name));
    }
}

/// Spread of many rolls of one expression.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct RollSpread {
    pub expression: String,
    pub samples: u32,
    pub min: i32,
    pub max: i32,
    pub mean: f64,
    pub median: i32,
    pub listed_average: i64,
}

pub fn roll_spread(expression: &DiceExpression, samples: u32, seed: u64) -> Result<RollSpread> {
    if samples == 0 {
        bail!("need at least one sample");
    }
    let mut dice = Dice::from_seed(seed);
    let mut totals: Vec<i32> = (0..samples).map(|_| expression.roll(&mut dice).total).collect();
    totals.sort_unstable();
    let sum: i64 = totals.iter().map(|&t| t as i64).sum();
    let mid = totals.len() / 2;
    let median = if totals.len() % 2 == 1 {
        totals[mid]
    } else {
        ((totals[mid - 1] as i64 + totals[mid] as i64) / 2) as i32
    };
    Ok(RollSpread {
        expression: expression.to_string(),
        samples,
        min: totals[0],
        max: totals[totals.len() - 1],
        mean: sum as f64 / samples as f64,
        median,
        listed_average: expression.average(),
    })
}
