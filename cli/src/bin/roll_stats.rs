use clap::Parser;
use engine::api::{load_catalog, load_config, roll_spread};
use engine::scaling::{ScalingOptions, scale_adversary};
use engine::{Dice, DiceExpression};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "roll-stats")]
#[command(about = "Monte Carlo spread of a dice expression or an adversary's damage")]
struct Args {
    /// Dice expression (NdS±K)
    #[arg(long, conflicts_with = "adversary")]
    dice: Option<String>,

    /// Adversary id; uses its (scaled) damage dice and attack modifier
    #[arg(long)]
    adversary: Option<String>,

    /// Tier shift applied to --adversary
    #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
    up: i32,

    /// Floor for rescaled damage dice counts, overriding the config
    #[arg(long)]
    min_dice: Option<u32>,

    /// Config file (.json, .yaml or .yml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Optional catalog file (falls back to the config, then the builtin set)
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Also report how often d20+attack meets this difficulty
    #[arg(long)]
    difficulty: Option<i32>,

    /// Number of trials
    #[arg(long, default_value_t = 10000)]
    trials: u32,

    /// RNG seed
    #[arg(long, default_value_t = 12345)]
    seed: u64,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let cfg = load_config(args.config.as_deref())?;

    // What to roll, and the attack bonus that goes with it
    let (label, expr, attack_mod) = match (&args.dice, &args.adversary) {
        (Some(s), None) => {
            let expr: DiceExpression = s.parse()?;
            (s.clone(), expr, 0)
        }
        (None, Some(id)) => {
            let catalog = load_catalog(args.catalog.as_deref().or(cfg.catalog_path.as_deref()))?;
            let adv = catalog
                .get(id)
                .ok_or_else(|| anyhow::anyhow!("adversary '{}' not found", id))?;
            let opts = ScalingOptions {
                min_damage_dice: args.min_dice.or(cfg.scaling.min_damage_dice),
            };
            let view = scale_adversary(adv, args.up, &opts);
            let expr: DiceExpression = view.stats.damage_dice.parse().map_err(|e| {
                anyhow::anyhow!(
                    "{} deals '{}', which is not rollable: {}",
                    view.name,
                    view.stats.damage_dice,
                    e
                )
            })?;
            let label = format!("{} (tier {})", view.name, view.effective_tier);
            (label, expr, view.stats.attack_mod)
        }
        _ => anyhow::bail!("give either --dice or --adversary"),
    };

    let spread = roll_spread(&expr, args.trials, args.seed)?;

    println!("roll-stats results");
    println!("------------------");
    println!("trials:             {}", spread.samples);
    println!("source:             {}", label);
    println!("expression:         {}", spread.expression);
    println!();
    println!("min / max:          {} / {}", spread.min, spread.max);
    println!("listed average:     {}", spread.listed_average);
    println!("mean:               {:.2}", spread.mean);
    println!("median:             {}", spread.median);

    if let Some(difficulty) = args.difficulty {
        let mut dice = Dice::from_seed(args.seed.wrapping_add(1));
        let attack = DiceExpression::new(1, 20, attack_mod);
        let hits = (0..args.trials)
            .filter(|_| attack.roll(&mut dice).total >= difficulty)
            .count();
        println!(
            "hit rate vs {:>2}:     {:.1}% (attack {:+})",
            difficulty,
            hits as f64 * 100.0 / args.trials as f64,
            attack_mod
        );
    }

    Ok(())
}
