use engine::scaling::{
    ScalingOptions, scale_adversary, scale_damage_dice_in_text_with, scale_damage_dice_with,
};
use engine::{
    Adversary, AdversaryStats, Catalog, Role, Thresholds, calculate_stat_adjustments,
    compute_scaled_stats, effective_tier, scale_damage_dice, scale_damage_dice_in_text,
};

fn catalog() -> Catalog {
    Catalog::builtin().expect("builtin catalog")
}

fn custom(role: Role, tier: u8, difficulty: i32, hp: i32, stress: i32) -> Adversary {
    Adversary {
        id: "custom".into(),
        name: "Custom".into(),
        tier,
        role,
        category: String::new(),
        biome: String::new(),
        source: String::new(),
        stats: AdversaryStats {
            difficulty,
            thresholds: if role.is_minion() {
                None
            } else {
                Some(Thresholds::new(3, 6))
            },
            hp,
            stress,
            attack_mod: 0,
            damage_dice: "1d6".into(),
        },
        features: vec![],
        original_cr: None,
    }
}

#[test]
fn effective_tier_clamps_both_ends() {
    assert_eq!(effective_tier(1, 0), 1);
    assert_eq!(effective_tier(1, 2), 3);
    assert_eq!(effective_tier(3, 5), 4);
    assert_eq!(effective_tier(2, -7), 1);
    assert_eq!(effective_tier(4, i32::MAX), 4);
    assert_eq!(effective_tier(1, i32::MIN), 1);
}

#[test]
fn zero_upscaling_is_identity() {
    let cat = catalog();
    for adv in cat.iter() {
        assert_eq!(compute_scaled_stats(adv, 0), adv.stats);
    }
}

#[test]
fn upscaling_past_the_top_tier_is_identity() {
    let cat = catalog();
    let wyrm = cat.get("ashen-wyrm").unwrap();
    assert_eq!(compute_scaled_stats(wyrm, 2), wyrm.stats);
}

#[test]
fn bruiser_one_tier_up() {
    let cat = catalog();
    let brute = cat.get("bandit-brute").unwrap();
    let scaled = compute_scaled_stats(brute, 1);
    assert_eq!(scaled.difficulty, 15);
    assert_eq!(scaled.thresholds, Some(Thresholds::new(14, 26)));
    assert_eq!(scaled.hp, 8);
    assert_eq!(scaled.stress, 4);
    assert_eq!(scaled.attack_mod, 4);
    assert_eq!(scaled.damage_dice, "2d10+5");
}

#[test]
fn standard_three_tiers_up_sums_every_transition() {
    let mut adv = custom(Role::Standard, 1, 11, 4, 2);
    adv.stats.damage_dice = "1d8+2".into();
    let scaled = compute_scaled_stats(&adv, 3);
    assert_eq!(scaled.difficulty, 11 + 3 + 2 + 2);
    assert_eq!(scaled.thresholds, Some(Thresholds::new(3 + 22, 6 + 45)));
    assert_eq!(scaled.hp, 7);
    assert_eq!(scaled.stress, 5);
    assert_eq!(scaled.attack_mod, 3);
    assert_eq!(scaled.damage_dice, "4d8+8");
}

#[test]
fn standard_one_tier_down_subtracts_the_same_step() {
    let cat = catalog();
    let warden = cat.get("shrine-warden").unwrap();
    let scaled = compute_scaled_stats(warden, -1);
    assert_eq!(scaled.difficulty, 12);
    assert_eq!(scaled.thresholds, Some(Thresholds::new(5, 10)));
    assert_eq!(scaled.hp, 4);
    assert_eq!(scaled.stress, 2);
    assert_eq!(scaled.attack_mod, 1);
    assert_eq!(scaled.damage_dice, "1d8+0");
}

#[test]
fn downscaling_respects_stat_floors() {
    let adv = custom(Role::Standard, 2, 2, 1, 0);
    let scaled = compute_scaled_stats(&adv, -1);
    assert_eq!(scaled.difficulty, 1);
    assert_eq!(scaled.hp, 1);
    assert_eq!(scaled.stress, 0);
    assert_eq!(scaled.attack_mod, -1);
}

#[test]
fn minions_never_gain_thresholds() {
    let cat = catalog();
    let rabble = cat.get("bandit-rabble").unwrap();
    let scaled = compute_scaled_stats(rabble, 2);
    assert_eq!(scaled.thresholds, None);
    assert_eq!(scaled.difficulty, 12);
    assert_eq!(scaled.hp, 1);
    assert_eq!(scaled.stress, 2);
    assert_eq!(scaled.attack_mod, 1);
    // flat damage is not dice, so it is left alone
    assert_eq!(scaled.damage_dice, "2");
}

#[test]
fn minion_thresholds_forced_off_even_when_present() {
    let mut adv = custom(Role::Minion, 1, 10, 1, 1);
    adv.stats.thresholds = Some(Thresholds::new(1, 2));
    assert_eq!(compute_scaled_stats(&adv, 1).thresholds, None);
}

#[test]
fn unknown_role_scales_like_standard() {
    let standard = custom(Role::Standard, 1, 10, 3, 1);
    let unknown = custom(Role::Unknown, 1, 10, 3, 1);
    assert_eq!(
        compute_scaled_stats(&standard, 2),
        compute_scaled_stats(&unknown, 2)
    );
}

#[test]
fn damage_dice_rule() {
    assert_eq!(scale_damage_dice("1d8+2", 1), "2d8+4");
    assert_eq!(scale_damage_dice("1d8+2", -1), "0d8+0");
    assert_eq!(scale_damage_dice("2d6", 1), "3d6+2");
    assert_eq!(scale_damage_dice("1d6-1", 1), "2d6+1");
    assert_eq!(scale_damage_dice("3d12+8", -2), "1d12+4");
    assert_eq!(scale_damage_dice("1d8+2", 0), "1d8+2");
}

#[test]
fn damage_dice_passthrough_for_non_dice() {
    assert_eq!(scale_damage_dice("1-3", 2), "1-3");
    assert_eq!(scale_damage_dice("2", 1), "2");
    assert_eq!(scale_damage_dice("", 1), "");
    assert_eq!(scale_damage_dice("1d8 fire", 1), "1d8 fire");
}

#[test]
fn damage_dice_too_large_to_rescale_pass_through() {
    assert_eq!(
        scale_damage_dice("9223372036854775807d6", 1),
        "9223372036854775807d6"
    );
    assert_eq!(
        scale_damage_dice("1d6+9223372036854775807", 1),
        "1d6+9223372036854775807"
    );
    assert_eq!(
        scale_damage_dice("99999999999999999999d6", 1),
        "99999999999999999999d6"
    );
}

#[test]
fn text_scaling_leaves_oversized_dice_alone() {
    let text = "takes 1 (9999999999d9999999999) damage";
    assert_eq!(scale_damage_dice_in_text(text, 1), text);
    assert_eq!(
        scale_damage_dice_in_text("9223372036854775807d6 or 1d4", 1),
        "9223372036854775807d6 or 2d4+2"
    );
}

#[test]
fn damage_dice_floor_option() {
    let opts = ScalingOptions {
        min_damage_dice: Some(1),
    };
    assert_eq!(scale_damage_dice_with("1d8+2", -1, &opts), "1d8+0");
    assert_eq!(scale_damage_dice_with("1d8+2", 1, &opts), "2d8+4");
}

#[test]
fn text_scaling_rewrites_average_form_once() {
    let text = "Targets hit take 13 (2d10+2) physical damage.";
    assert_eq!(
        scale_damage_dice_in_text(text, 1),
        "Targets hit take 20 (3d10+4) physical damage."
    );
    assert_eq!(
        scale_damage_dice_in_text("take 33 (6d10) damage", 1),
        "take 40 (7d10+2) damage"
    );
}

#[test]
fn text_scaling_handles_both_forms_together() {
    let text = "Deal 10 (3d6) now and 1d4 later.";
    assert_eq!(
        scale_damage_dice_in_text(text, 1),
        "Deal 16 (4d6+2) now and 2d4+2 later."
    );
}

#[test]
fn text_scaling_bare_dice_with_spaced_modifier() {
    assert_eq!(
        scale_damage_dice_in_text("deals 1d8 + 3 damage", -1),
        "deals 0d8+1 damage"
    );
}

#[test]
fn text_scaling_leaves_prose_without_dice() {
    let text = "Make a Strength Reaction Roll (14) or be knocked Prone.";
    assert_eq!(scale_damage_dice_in_text(text, 2), text);
    assert_eq!(scale_damage_dice_in_text("1d8+3", 0), "1d8+3");
}

#[test]
fn text_scaling_honours_dice_floor() {
    let opts = ScalingOptions {
        min_damage_dice: Some(1),
    };
    assert_eq!(
        scale_damage_dice_in_text_with("takes 4 (1d6) damage", -1, &opts),
        "takes 1 (1d6-2) damage"
    );
}

#[test]
fn adjustments_report_signed_deltas() {
    let cat = catalog();
    let brute = cat.get("bandit-brute").unwrap();
    let scaled = compute_scaled_stats(brute, 1);
    let adj = calculate_stat_adjustments(&brute.stats, &scaled);
    assert_eq!(adj.difficulty, 2);
    assert_eq!(adj.threshold_major, Some(6));
    assert_eq!(adj.threshold_severe, Some(12));
    assert_eq!(adj.hp, 2);
    assert_eq!(adj.stress, 1);
    assert_eq!(adj.attack_mod, 2);
    assert!(adj.damage_dice_changed);
    assert!(!adj.is_empty());

    let same = calculate_stat_adjustments(&brute.stats, &brute.stats);
    assert!(same.is_empty());
}

#[test]
fn adjustments_for_minions_have_no_threshold_delta() {
    let cat = catalog();
    let rabble = cat.get("bandit-rabble").unwrap();
    let adj = calculate_stat_adjustments(&rabble.stats, &compute_scaled_stats(rabble, 1));
    assert_eq!(adj.threshold_major, None);
    assert_eq!(adj.threshold_severe, None);
    assert!(!adj.damage_dice_changed);
}

#[test]
fn scaled_adversary_rewrites_feature_text() {
    let cat = catalog();
    let colossus = cat.get("reef-colossus").unwrap();
    let view = scale_adversary(colossus, 1, &ScalingOptions::default());
    assert_eq!(view.base_tier, 3);
    assert_eq!(view.effective_tier, 4);
    assert_eq!(view.tier_delta, 1);
    assert_eq!(view.stats.damage_dice, "4d10+6");
    let tide = &view.features[0].entries[0].description;
    assert!(tide.contains("40 (7d10+2)"), "{}", tide);
    let shed = &view.features[1].entries[0].description;
    assert!(shed.contains("3d8+5"), "{}", shed);
}

#[test]
fn scaled_adversary_clamped_request_keeps_features() {
    let cat = catalog();
    let wyrm = cat.get("ashen-wyrm").unwrap();
    let view = scale_adversary(wyrm, 3, &ScalingOptions::default());
    assert_eq!(view.tier_delta, 0);
    assert_eq!(view.features, wyrm.features);
    assert!(view.adjustments.is_empty());
}
