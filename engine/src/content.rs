use std::collections::HashMap;

pub const BUILTIN_ADVERSARIES: &str = include_str!("../content/adversaries.json");

pub fn builtin_catalogs() -> HashMap<&'static str, &'static str> {
    HashMap::from([("core", BUILTIN_ADVERSARIES)])
}

pub fn builtin_encounters() -> HashMap<&'static str, &'static str> {
    HashMap::from([
        (
            "bandit_ambush",
            include_str!("../content/encounters/bandit_ambush.json"),
        ),
        (
            "sunken_shrine",
            include_str!("../content/encounters/sunken_shrine.json"),
        ),
    ])
}
