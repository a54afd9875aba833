//! Dice notation: parsing `NdM±K`, rolling, and the canonical text form of a
//! roll (`2d6(3, 5)+2 = 10`).
//!
//! Parsing never panics. The `Option` helpers return `None` for anything that
//! is not a rollable expression; [`DiceExpression::from_str`] reports why.

use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::Dice;
use crate::error::DiceError;

/// Upper bounds keep a single roll cheap and its total inside `i32`.
pub const MAX_DICE_COUNT: u32 = 1_000;
pub const MAX_DIE_SIDES: u32 = 10_000;

static DICE_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(\d*)d(\d+)([+-]\d+)?").expect("dice prefix regex"));

static DICE_IN_TEXT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b\d*d\d+(?:[+-]\d+)?\b").expect("inline dice regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiceExpression {
    pub count: u32,
    pub sides: u32,
    pub modifier: i32,
}

impl DiceExpression {
    pub fn new(count: u32, sides: u32, modifier: i32) -> Self {
        Self { count, sides, modifier }
    }

    /// Listed average: `floor(count * (sides + 1) / 2) + modifier`.
    pub fn average(&self) -> i64 {
        (self.count as i64 * (self.sides as i64 + 1)).div_euclid(2) + self.modifier as i64
    }

    pub fn min(&self) -> i64 {
        self.count as i64 + self.modifier as i64
    }

    pub fn max(&self) -> i64 {
        self.count as i64 * self.sides as i64 + self.modifier as i64
    }

    pub fn roll(&self, dice: &mut Dice) -> RollResult {
        let rolls: Vec<u32> = (0..self.count).map(|_| dice.roll_die(self.sides)).collect();
        let sum: i64 = rolls.iter().map(|&r| r as i64).sum();
        let total = (sum + self.modifier as i64).clamp(i32::MIN as i64, i32::MAX as i64) as i32;
        RollResult {
            expression: self.to_string(),
            count: self.count,
            sides: self.sides,
            modifier: self.modifier,
            rolls,
            total,
        }
    }
}

impl FromStr for DiceExpression {
    type Err = DiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        if text.is_empty() {
            return Err(DiceError::Empty);
        }
        let caps = DICE_PREFIX
            .captures(text)
            .ok_or_else(|| DiceError::InvalidNotation(text.to_string()))?;
        let matched = caps[0].to_string();

        let count = match &caps[1] {
            "" => 1,
            digits => digits
                .parse::<u32>()
                .map_err(|_| DiceError::OutOfRange(matched.clone()))?,
        };
        let sides = caps[2]
            .parse::<u32>()
            .map_err(|_| DiceError::OutOfRange(matched.clone()))?;
        let modifier = match caps.get(3) {
            Some(m) => m
                .as_str()
                .parse::<i32>()
                .map_err(|_| DiceError::OutOfRange(matched.clone()))?,
            None => 0,
        };

        if count == 0 {
            return Err(DiceError::NoDice(matched));
        }
        if sides == 0 {
            return Err(DiceError::InvalidDieSize(matched));
        }
        if count > MAX_DICE_COUNT || sides > MAX_DIE_SIDES {
            return Err(DiceError::OutOfRange(matched));
        }
        Ok(Self { count, sides, modifier })
    }
}

impl fmt::Display for DiceExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}d{}", self.count, self.sides)?;
        if self.modifier != 0 {
            write!(f, "{:+}", self.modifier)?;
        }
        Ok(())
    }
}

/// Outcome of rolling one expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollResult {
    pub expression: String,
    pub count: u32,
    pub sides: u32,
    pub modifier: i32,
    pub rolls: Vec<u32>,
    pub total: i32,
}

impl fmt::Display for RollResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let faces = self
            .rolls
            .iter()
            .map(|r| r.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        write!(f, "{}d{}({})", self.count, self.sides, faces)?;
        if self.modifier != 0 {
            write!(f, "{:+}", self.modifier)?;
        }
        write!(f, " = {}", self.total)
    }
}

pub fn parse_dice_expression(text: &str) -> Option<DiceExpression> {
    text.parse().ok()
}

/// Parse and roll with fresh entropy. `None` means no roll is possible.
pub fn roll_dice_expression(text: &str) -> Option<RollResult> {
    roll_dice_expression_with(&mut Dice::from_entropy(), text)
}

pub fn roll_dice_expression_with(dice: &mut Dice, text: &str) -> Option<RollResult> {
    parse_dice_expression(text).map(|expr| expr.roll(dice))
}

/// Attack roll: one d20 plus the attack bonus.
pub fn roll_d20_with_modifier(modifier: i32) -> RollResult {
    roll_d20_with_modifier_with(&mut Dice::from_entropy(), modifier)
}

pub fn roll_d20_with_modifier_with(dice: &mut Dice, modifier: i32) -> RollResult {
    DiceExpression::new(1, 20, modifier).roll(dice)
}

pub fn format_roll_result(result: &RollResult) -> String {
    result.to_string()
}

/// A rollable dice expression found inside prose.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiceSpan {
    /// Byte range into the searched text.
    pub start: usize,
    pub end: usize,
    pub expression: DiceExpression,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextSegment<'a> {
    Text(&'a str),
    Roll {
        text: &'a str,
        expression: DiceExpression,
    },
}

/// Locates every bare dice expression in `text` that can actually be rolled.
pub fn find_dice_in_text(text: &str) -> Vec<DiceSpan> {
    DICE_IN_TEXT
        .find_iter(text)
        .filter_map(|m| {
            parse_dice_expression(m.as_str()).map(|expression| DiceSpan {
                start: m.start(),
                end: m.end(),
                expression,
            })
        })
        .collect()
}

/// Splits prose into plain text and roll targets. Concatenating the segment
/// texts reproduces the input exactly.
pub fn segment_dice_text(text: &str) -> Vec<TextSegment<'_>> {
    let mut segments = Vec::new();
    let mut cursor = 0;
    for span in find_dice_in_text(text) {
        if span.start > cursor {
            segments.push(TextSegment::Text(&text[cursor..span.start]));
        }
        segments.push(TextSegment::Roll {
            text: &text[span.start..span.end],
            expression: span.expression,
        });
        cursor = span.end;
    }
    if cursor < text.len() {
        segments.push(TextSegment::Text(&text[cursor..]));
    }
    segments
}
