//! Meso range formulas
//!
//! Drop amounts follow two exponential curves fitted against the existing
//! meso drops, split at level 90. Bosses get a flat multiplier on top.
//!
//! ```text
//! level < 90   min = 30.32 * e^(0.03281 * lvl)   max = 44.46 * e^(0.03290 * lvl)
//! level >= 90  min = 72.71 * e^(0.02285 * lvl)   max = 133.82 * e^(0.02059 * lvl)
//! boss         min *= 3                          max *= 10
//! ```
//!
//! Values are truncated, never rounded: the integers end up verbatim in the
//! generated SQL.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// `dropperid` in `drop_data` is a signed INT
pub type MonsterId = i32;

/// Meso range for every monster known to the stat catalog
pub type MesoRangeTable = HashMap<MonsterId, MesoRange>;

/// Levels at or above this use the high-level curve
pub const LEVEL_THRESHOLD: u32 = 90;

pub const BOSS_MIN_MULTIPLIER: u64 = 3;
pub const BOSS_MAX_MULTIPLIER: u64 = 10;

/// Stats the catalog knows about a monster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonsterStats {
    pub monster_id: MonsterId,
    pub level: u32,
    #[serde(default)]
    pub is_boss: bool,
}

/// Inclusive meso amount range for one drop row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MesoRange {
    pub min: u64,
    pub max: u64,
}

/// `coef * e^(rate * level)`, truncated toward zero
struct Curve {
    coef: f64,
    rate: f64,
}

impl Curve {
    fn eval(&self, level: u32) -> u64 {
        // `as` saturates on overflow/inf, which is what we want for absurd levels
        (self.coef * (self.rate * level as f64).exp()) as u64
    }
}

const LOW_MIN: Curve = Curve { coef: 30.32032228, rate: 0.03281144930 };
const LOW_MAX: Curve = Curve { coef: 44.45878459, rate: 0.03289611686 };
const HIGH_MIN: Curve = Curve { coef: 72.70814714, rate: 0.02284640619 };
const HIGH_MAX: Curve = Curve { coef: 133.8194881, rate: 0.02059225059 };

/// Compute the meso range for a monster of the given level
pub fn compute_range(level: u32, is_boss: bool) -> MesoRange {
    let (min_curve, max_curve) = if level < LEVEL_THRESHOLD {
        (&LOW_MIN, &LOW_MAX)
    } else {
        (&HIGH_MIN, &HIGH_MAX)
    };

    let mut min = min_curve.eval(level);
    let mut max = max_curve.eval(level);

    if is_boss {
        min = min.saturating_mul(BOSS_MIN_MULTIPLIER);
        max = max.saturating_mul(BOSS_MAX_MULTIPLIER);
    }

    // High-level curves cross around level 271
    MesoRange { min, max: max.max(min) }
}

impl MonsterStats {
    pub fn meso_range(&self) -> MesoRange {
        compute_range(self.level, self.is_boss)
    }
}

/// Compute ranges for every monster in the catalog
pub fn compute_all_ranges(stats: &HashMap<MonsterId, MonsterStats>) -> MesoRangeTable {
    stats
        .iter()
        .map(|(id, mob)| (*id, mob.meso_range()))
        .collect()
}
