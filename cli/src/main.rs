use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow, bail};
use clap::{Args, Parser, Subcommand};
use engine::api::{
    EncounterSource, TrackerAction, load_config, load_encounter, read_text_auto, run_loaded,
};
use engine::battle_points::{BudgetRating, evaluate_encounter};
use engine::config::{EngineConfig, init_tracing};
use engine::scaling::{ScaledAdversary, scale_adversary};
use engine::{AdversaryFilter, Catalog, Dice, DiceExpression, Encounter, Role, format_roll_result};
use tracing::{Level, debug};

#[derive(Parser)]
#[command(name = "encounter-cli")]
#[command(about = "Adversary catalog, tier scaling and encounter tracker")]
struct Cli {
    /// Config file (.json, .yaml or .yml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Adversary catalog file, overriding the config and the builtin set
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    /// More log output on stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// List catalog adversaries, optionally filtered
    List {
        /// Only these tiers (repeatable)
        #[arg(long)]
        tier: Vec<u8>,
        /// Only these roles (repeatable)
        #[arg(long)]
        role: Vec<Role>,
        #[arg(long)]
        category: Vec<String>,
        #[arg(long)]
        biome: Vec<String>,
        #[arg(long)]
        source: Vec<String>,
        /// Substring of the name or id
        #[arg(long)]
        search: Option<String>,
    },
    /// Print one statblock, scaled by --up tiers
    Show {
        id: String,
        #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
        up: i32,
    },
    /// Scaled statblock as JSON
    Scale {
        id: String,
        #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
        up: i32,
    },
    /// Roll a dice expression such as 2d6+3
    Roll {
        expression: String,
        /// RNG seed for determinism
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Attack roll, from a flat modifier or an adversary's (scaled) statblock
    Attack {
        #[arg(long, allow_hyphen_values = true, conflicts_with = "adversary")]
        modifier: Option<i32>,
        #[arg(long)]
        adversary: Option<String>,
        #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
        up: i32,
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Work with saved encounters
    Encounter {
        #[command(subcommand)]
        cmd: EncounterCmd,
    },
}

#[derive(Subcommand)]
enum EncounterCmd {
    /// Battle point budget against what the encounter spends
    Budget(EncounterArgs),
    /// Print the share code for an encounter
    Share(EncounterArgs),
    /// Decode a share code into encounter JSON
    Import {
        code: String,
        /// Write the JSON here instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Expand into a tracker and replay tracker actions
    Run {
        #[command(flatten)]
        source: EncounterArgs,
        /// JSON array of actions, e.g. [{"op":"damage","instance":"e1-1","amount":7}]
        #[arg(long)]
        actions: Option<PathBuf>,
        /// Print the whole result as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

#[derive(Args)]
#[group(required = true, multiple = false)]
struct EncounterArgs {
    /// Builtin encounter id
    #[arg(long)]
    id: Option<String>,
    /// Encounter JSON file
    #[arg(long)]
    file: Option<PathBuf>,
    /// Share code
    #[arg(long)]
    code: Option<String>,
}

impl EncounterArgs {
    fn source(&self) -> EncounterSource {
        EncounterSource {
            encounter_id: self.id.clone(),
            encounter_path: self.file.clone(),
            share_code: self.code.clone(),
        }
    }
}

/// The --catalog flag wins over the config file.
fn load_catalog(cfg: &EngineConfig, flag: Option<&Path>) -> anyhow::Result<Catalog> {
    engine::api::load_catalog(flag.or(cfg.catalog_path.as_deref()))
}

fn dice(seed: Option<u64>) -> Dice {
    seed.map(Dice::from_seed).unwrap_or_default()
}

fn log_level(verbose: u8, cfg: &EngineConfig) -> anyhow::Result<Level> {
    Ok(match verbose {
        0 => cfg.level()?,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    })
}

fn signed(delta: i32) -> String {
    if delta == 0 {
        String::new()
    } else {
        format!(" ({:+})", delta)
    }
}

fn print_statblock(view: &ScaledAdversary) {
    let tier = if view.tier_delta == 0 {
        format!("tier {}", view.base_tier)
    } else {
        format!("tier {} → {}", view.base_tier, view.effective_tier)
    };
    let s = &view.stats;
    let adj = &view.adjustments;
    println!("{} [{}] ({}, {})", view.name, view.adversary_id, tier, view.role);
    println!("difficulty:  {}{}", s.difficulty, signed(adj.difficulty));
    match s.thresholds {
        Some(t) => println!(
            "thresholds:  {}/{}{}",
            t.major,
            t.severe,
            match (adj.threshold_major, adj.threshold_severe) {
                (Some(m), Some(v)) if m != 0 || v != 0 => format!(" ({:+}/{:+})", m, v),
                _ => String::new(),
            }
        ),
        None => println!("thresholds:  none"),
    }
    println!("hp:          {}{}", s.hp, signed(adj.hp));
    println!("stress:      {}{}", s.stress, signed(adj.stress));
    println!("attack:      {:+}{}", s.attack_mod, signed(adj.attack_mod));
    if adj.damage_dice_changed {
        println!("damage:      {} (was {})", s.damage_dice, view.base.damage_dice);
    } else {
        println!("damage:      {}", s.damage_dice);
    }
    for feature in &view.features {
        println!();
        println!("{}", feature.name);
        for entry in &feature.entries {
            println!("  {}: {}", entry.name, entry.description);
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = load_config(cli.config.as_deref())?;
    init_tracing(log_level(cli.verbose, &cfg)?);
    debug!(config = ?cli.config, "config loaded");

    match cli.cmd {
        Cmd::List {
            tier,
            role,
            category,
            biome,
            source,
            search,
        } => {
            let catalog = load_catalog(&cfg, cli.catalog.as_deref())?;
            let filter = AdversaryFilter {
                tiers: tier,
                roles: role,
                categories: category,
                biomes: biome,
                sources: source,
                search,
            };
            for adv in catalog.filter(&filter) {
                println!(
                    "{:<20} T{} {:<10} {}",
                    adv.id, adv.tier, adv.role, adv.name
                );
            }
        }
        Cmd::Show { id, up } => {
            let catalog = load_catalog(&cfg, cli.catalog.as_deref())?;
            let adv = catalog
                .get(&id)
                .ok_or_else(|| anyhow!("adversary '{}' not found", id))?;
            print_statblock(&scale_adversary(adv, up, &cfg.scaling));
        }
        Cmd::Scale { id, up } => {
            let catalog = load_catalog(&cfg, cli.catalog.as_deref())?;
            let adv = catalog
                .get(&id)
                .ok_or_else(|| anyhow!("adversary '{}' not found", id))?;
            let view = scale_adversary(adv, up, &cfg.scaling);
            println!("{}", serde_json::to_string_pretty(&view)?);
        }
        Cmd::Roll { expression, seed } => {
            let expr: DiceExpression = expression
                .parse()
                .with_context(|| format!("cannot roll '{}'", expression))?;
            let res = expr.roll(&mut dice(seed));
            println!("{}", format_roll_result(&res));
        }
        Cmd::Attack {
            modifier,
            adversary,
            up,
            seed,
        } => {
            let mut dice = dice(seed);
            match (modifier, adversary) {
                (Some(m), None) => {
                    let res = DiceExpression::new(1, 20, m).roll(&mut dice);
                    println!("attack: {}", format_roll_result(&res));
                }
                (None, Some(id)) => {
                    let catalog = load_catalog(&cfg, cli.catalog.as_deref())?;
                    let adv = catalog
                        .get(&id)
                        .ok_or_else(|| anyhow!("adversary '{}' not found", id))?;
                    let view = scale_adversary(adv, up, &cfg.scaling);
                    let res = DiceExpression::new(1, 20, view.stats.attack_mod).roll(&mut dice);
                    println!("attack: {}", format_roll_result(&res));
                    match view.stats.damage_dice.parse::<DiceExpression>() {
                        Ok(expr) => {
                            let dmg = expr.roll(&mut dice);
                            println!("damage: {}", format_roll_result(&dmg));
                        }
                        Err(_) => println!("damage: {}", view.stats.damage_dice),
                    }
                }
                _ => bail!("give either --modifier or --adversary"),
            }
        }
        Cmd::Encounter { cmd } => run_encounter_cmd(cmd, &cfg, cli.catalog.as_deref())?,
    }
    Ok(())
}

fn run_encounter_cmd(
    cmd: EncounterCmd,
    cfg: &EngineConfig,
    catalog_flag: Option<&Path>,
) -> anyhow::Result<()> {
    match cmd {
        EncounterCmd::Budget(args) => {
            let catalog = load_catalog(cfg, catalog_flag)?;
            let mut encounter = load_encounter(&args.source())?;
            for m in encounter.resolve_against(&catalog) {
                eprintln!(
                    "warning: entry {} skipped, adversary '{}' not in catalog",
                    m.entry_id, m.adversary_id
                );
            }
            let summary = evaluate_encounter(&encounter, &catalog);
            let rating = match summary.rating {
                BudgetRating::Under => "under budget",
                BudgetRating::Balanced => "on budget",
                BudgetRating::Over => "over budget",
            };
            println!("encounter:  {}", encounter.name);
            println!("players:    {}", encounter.player_count);
            println!("budget:     {}", summary.budget);
            println!("spent:      {}", summary.spent);
            println!("remaining:  {} ({})", summary.remaining, rating);
        }
        EncounterCmd::Share(args) => {
            let encounter = load_encounter(&args.source())?;
            println!("{}", encounter.to_share_code()?);
        }
        EncounterCmd::Import { code, out } => {
            let encounter = Encounter::from_share_code(&code).context("failed to decode share code")?;
            let json = encounter.to_json()?;
            match out {
                Some(path) => fs::write(&path, json)
                    .with_context(|| format!("failed to write {}", path.display()))?,
                None => println!("{}", json),
            }
        }
        EncounterCmd::Run {
            source,
            actions,
            json,
        } => {
            let catalog = load_catalog(cfg, catalog_flag)?;
            let encounter = load_encounter(&source.source())?;
            let actions: Vec<TrackerAction> = match actions {
                Some(path) => {
                    let text = read_text_auto(&path)?;
                    serde_json::from_str(&text)
                        .with_context(|| format!("invalid actions file: {}", path.display()))?
                }
                None => Vec::new(),
            };
            let result = run_loaded(&catalog, encounter, &cfg.scaling, &actions);
            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
                return Ok(());
            }
            for line in &result.log {
                println!("{}", line);
            }
            println!();
            for inst in &result.running.instances {
                println!(
                    "{:<10} {:<22} HP {:>2}/{:<2} stress {}/{}{}",
                    inst.instance_id,
                    inst.display_name(),
                    inst.current_hp,
                    inst.max_hp,
                    inst.current_stress,
                    inst.max_stress,
                    if inst.is_defeated() { "  [down]" } else { "" }
                );
            }
        }
    }
    Ok(())
}
