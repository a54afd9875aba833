use std::path::Path;

use engine::api::{
    EncounterSource, RunConfig, ScaleConfig, TrackerAction, load_catalog, load_config, load_encounter,
    roll_spread, run_encounter, scale,
};
use engine::scaling::ScalingOptions;
use engine::{DiceExpression, Encounter};

fn ambush_run(actions: Vec<TrackerAction>) -> RunConfig {
    RunConfig {
        source: EncounterSource {
            encounter_id: Some("bandit_ambush".into()),
            ..Default::default()
        },
        catalog_path: None,
        scaling: ScalingOptions::default(),
        actions,
    }
}

#[test]
fn scale_with_builtins() {
    let view = scale(ScaleConfig {
        adversary: "bandit-brute".into(),
        upscaling: 1,
        catalog_path: None,
        scaling: ScalingOptions::default(),
    })
    .unwrap();
    assert_eq!(view.effective_tier, 2);
    assert_eq!(view.stats.hp, 8);
    assert_eq!(view.adjustments.hp, 2);
}

#[test]
fn scale_unknown_adversary_fails() {
    let err = scale(ScaleConfig {
        adversary: "nobody".into(),
        upscaling: 0,
        catalog_path: None,
        scaling: ScalingOptions::default(),
    })
    .unwrap_err();
    assert!(err.to_string().contains("nobody"));
}

#[test]
fn run_without_actions_reports_budget_and_start() {
    let res = run_encounter(ambush_run(vec![])).unwrap();
    assert!(res.missing.is_empty());
    assert_eq!(res.running.instances.len(), 8);
    assert_eq!(
        res.log,
        vec![
            "[BUDGET] spent 12 of 14 (+2 remaining)".to_string(),
            "[START] Bandit Ambush: 8 creatures for 4 players".to_string(),
        ]
    );
}

#[test]
fn run_replays_tracker_actions() {
    let res = run_encounter(ambush_run(vec![
        TrackerAction::Damage {
            instance: "e4-1".into(),
            amount: 3,
        },
        TrackerAction::Hp {
            instance: "e1-1".into(),
            delta: 2,
        },
        TrackerAction::Stress {
            instance: "e3-1".into(),
            delta: 5,
        },
        TrackerAction::Hp {
            instance: "e9-9".into(),
            delta: 1,
        },
    ]))
    .unwrap();

    let rabble = res.running.instance("e4-1").unwrap();
    assert!(rabble.is_defeated());
    assert_eq!(res.running.instance("e1-1").unwrap().current_hp, 2);
    assert_eq!(res.running.instance("e3-1").unwrap().current_stress, 2);
    assert_eq!(res.running.defeated().count(), 1);
    assert!(!res.running.is_over());

    assert!(res.log.iter().any(|l| l.starts_with("[DMG][Bandit Rabble] 3 damage")));
    assert!(res.log.contains(&"[DOWN][Bandit Rabble] defeated".to_string()));
    assert!(res.log.iter().any(|l| l.starts_with("[STRESS][Bandit Cutthroat] 0 → 2/2")));
    assert!(res.log.contains(&"[SKIP] no instance 'e9-9'".to_string()));
}

#[test]
fn run_ends_when_everything_is_down() {
    let mut enc = Encounter::new("Lone Mote", 1);
    enc.add_adversary("shadow-mote", 1);
    let code = enc.to_share_code().unwrap();
    let id = format!("{}-1", enc.adversaries[0].id);
    let res = run_encounter(RunConfig {
        source: EncounterSource {
            share_code: Some(code),
            ..Default::default()
        },
        catalog_path: None,
        scaling: ScalingOptions::default(),
        actions: vec![TrackerAction::Damage {
            instance: id,
            amount: 1,
        }],
    })
    .unwrap();
    assert!(res.running.is_over());
    assert_eq!(res.log.last().unwrap(), "[END] every creature is defeated");
}

#[test]
fn run_warns_about_missing_adversaries() {
    let mut enc = Encounter::new("Half Real", 2);
    enc.add_adversary("bandit-archer", 1);
    let ghost = enc.add_adversary("retired-ghoul", 2);
    let res = run_encounter(RunConfig {
        source: EncounterSource {
            share_code: Some(enc.to_share_code().unwrap()),
            ..Default::default()
        },
        catalog_path: None,
        scaling: ScalingOptions::default(),
        actions: vec![],
    })
    .unwrap();
    assert_eq!(res.missing.len(), 1);
    assert_eq!(res.encounter.adversaries.len(), 1);
    assert_eq!(res.running.instances.len(), 1);
    assert_eq!(
        res.log[0],
        format!("[WARN] entry {} dropped: adversary 'retired-ghoul' not in catalog", ghost)
    );
}

#[test]
fn tracker_actions_deserialize_from_tagged_json() {
    let cfg: RunConfig = serde_json::from_str(
        r#"{"encounter_id":"sunken_shrine","actions":[{"op":"damage","instance":"s1-1","amount":9}]}"#,
    )
    .unwrap();
    assert_eq!(cfg.source.encounter_id.as_deref(), Some("sunken_shrine"));
    assert_eq!(
        cfg.actions,
        vec![TrackerAction::Damage {
            instance: "s1-1".into(),
            amount: 9,
        }]
    );
    let res = run_encounter(cfg).unwrap();
    assert_eq!(res.running.instance("s1-1").unwrap().current_hp, 2);
}

#[test]
fn load_encounter_needs_a_source() {
    assert!(load_encounter(&EncounterSource::default()).is_err());
    let unknown = EncounterSource {
        encounter_id: Some("dragon_lair".into()),
        ..Default::default()
    };
    assert!(load_encounter(&unknown).is_err());
}

#[test]
fn roll_spread_brackets_the_listed_average() {
    let expr = DiceExpression::new(2, 6, 2);
    let spread = roll_spread(&expr, 500, 7).unwrap();
    assert_eq!(spread.samples, 500);
    assert_eq!(spread.listed_average, 9);
    assert!(spread.min >= 4 && spread.max <= 14);
    assert!(spread.mean > 7.0 && spread.mean < 11.0);
    assert_eq!(spread.expression, "2d6+2");

    let again = roll_spread(&expr, 500, 7).unwrap();
    assert_eq!(again.mean, spread.mean);
    assert!(roll_spread(&expr, 0, 7).is_err());
}

#[test]
fn catalogs_load_by_builtin_name() {
    let core = load_catalog(Some(Path::new("core"))).unwrap();
    assert_eq!(core.len(), 12);
    assert!(load_catalog(Some(Path::new("no/such/catalog.json"))).is_err());
}

#[test]
fn roll_spread_median_near_the_i32_ceiling() {
    let expr = DiceExpression::new(1, 1, i32::MAX);
    let spread = roll_spread(&expr, 2, 1).unwrap();
    assert_eq!(spread.median, i32::MAX);
    assert_eq!(spread.min, i32::MAX);
    assert_eq!(spread.max, i32::MAX);

    let low = roll_spread(&DiceExpression::new(1, 1, i32::MIN), 4, 1).unwrap();
    assert_eq!(low.median, i32::MIN + 1);
}

fn temp_file(name: &str, contents: &[u8]) -> std::path::PathBuf {
    let dir = std::env::temp_dir().join(format!("encounter-engine-tests-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

#[test]
fn files_with_a_utf8_bom_load_everywhere() {
    let mut catalog = vec![0xEF, 0xBB, 0xBF];
    catalog.extend_from_slice(engine::content::builtin_catalogs()["core"].as_bytes());
    let path = temp_file("core_bom.json", &catalog);
    assert_eq!(load_catalog(Some(path.as_path())).unwrap().len(), 12);

    let config = temp_file("bom.yaml", b"\xEF\xBB\xBFscaling:\n  min_damage_dice: 2\n");
    let cfg = load_config(Some(config.as_path())).unwrap();
    assert_eq!(cfg.scaling.min_damage_dice, Some(2));

    let encounter = temp_file(
        "bom_encounter.json",
        b"\xEF\xBB\xBF{\"id\":\"e\",\"name\":\"Bom\",\"playerCount\":3}",
    );
    let enc = load_encounter(&EncounterSource {
        encounter_path: Some(encounter),
        ..Default::default()
    })
    .unwrap();
    assert_eq!(enc.player_count, 3);
}
