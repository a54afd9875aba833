use serde::{Deserialize, Serialize};

use crate::adversary::Role;
use crate::catalog::Catalog;
use crate::encounter::{Encounter, MAX_ENTRY_QUANTITY};

/// Points available before modifiers: three per player plus two.
pub fn base_budget(player_count: u32) -> i32 {
    3 * player_count.max(1) as i32 + 2
}

/// Cost of one adversary of `role`. Minions are costed per group in
/// [`entry_cost`] instead.
pub fn role_cost(role: Role) -> i32 {
    match role {
        Role::Minion | Role::Social | Role::Support => 1,
        Role::Horde | Role::Ranged | Role::Skulk | Role::Standard | Role::Unknown => 2,
        Role::Leader => 3,
        Role::Bruiser => 4,
        Role::Solo | Role::Legendary | Role::Colossal => 5,
    }
}

/// Minions cost one point per group the size of the party, rounded up.
pub fn entry_cost(role: Role, quantity: u32, player_count: u32) -> i32 {
    let quantity = quantity.min(MAX_ENTRY_QUANTITY);
    if role.is_minion() {
        quantity.div_ceil(player_count.max(1)) as i32 * role_cost(role)
    } else {
        quantity as i32 * role_cost(role)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetRating {
    Under,
    Balanced,
    Over,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattlePointSummary {
    pub budget: i32,
    pub spent: i32,
    pub remaining: i32,
    pub rating: BudgetRating,
}

/// Prices every resolvable entry of `encounter` against its budget.
/// Entries missing from the catalog cost nothing.
pub fn evaluate_encounter(encounter: &Encounter, catalog: &Catalog) -> BattlePointSummary {
    let budget = base_budget(encounter.player_count) + encounter.battle_point_modifier;
    let spent = encounter
        .adversaries
        .iter()
        .filter_map(|entry| {
            catalog
                .get(&entry.adversary_id)
                .map(|adv| entry_cost(adv.role, entry.quantity, encounter.player_count))
        })
        .sum::<i32>();
    let remaining = budget - spent;
    let rating = match remaining {
        r if r > 0 => BudgetRating::Under,
        0 => BudgetRating::Balanced,
        _ => BudgetRating::Over,
    };
    BattlePointSummary {
        budget,
        spent,
        remaining,
        rating,
    }
}
