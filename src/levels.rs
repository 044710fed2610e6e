// =============================================================================
// Support / Resistance Level Detector
// =============================================================================
//
// Step 1: Pivots: candle `i` with `lookback` neighbours on both sides is a
//          high pivot when its high strictly exceeds every neighbouring high,
//          and a low pivot when its low is strictly below every neighbouring
//          low. A candle can be both.
// Step 2: Greedy clustering in discovery order: each unclustered pivot seeds
//          a cluster and absorbs every later unclustered pivot within
//          `tolerance` relative distance of the seed.
// Step 3: Cluster price = mean of members; resistance when above the last
//          close, support otherwise; strength = min(members / 3, 1).
// Step 4: Keep the 3 nearest supports and 3 nearest resistances, ordered by
//          price descending.
// =============================================================================

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::types::Candle;

pub const DEFAULT_PIVOT_LOOKBACK: usize = 3;
pub const DEFAULT_CLUSTER_TOLERANCE: f64 = 0.015;
pub const MIN_CANDLES_FOR_LEVELS: usize = 20;

/// Levels kept on each side of the price.
const LEVELS_PER_SIDE: usize = 3;

/// Members needed for full strength.
const FULL_STRENGTH_MEMBERS: f64 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LevelType {
    Support,
    Resistance,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Level {
    pub price: f64,
    #[serde(rename = "type")]
    pub level_type: LevelType,
    /// min(members / 3, 1).
    pub strength: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PivotKind {
    High,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PivotPoint {
    pub price: f64,
    pub index: usize,
    pub kind: PivotKind,
}

/// Local extrema relative to a symmetric window of `lookback` candles.
///
/// # Panics
/// When `lookback` is zero.
pub fn find_pivot_points(candles: &[Candle], lookback: usize) -> Vec<PivotPoint> {
    assert!(lookback >= 1, "pivot lookback must be >= 1");

    let mut pivots = Vec::new();
    if candles.len() <= 2 * lookback {
        return pivots;
    }

    for i in lookback..candles.len() - lookback {
        let current = &candles[i];
        let neighbours = (i - lookback..=i + lookback)
            .filter(|&j| j != i)
            .map(|j| &candles[j]);

        let mut is_high = true;
        let mut is_low = true;
        for n in neighbours {
            if n.high >= current.high {
                is_high = false;
            }
            if n.low <= current.low {
                is_low = false;
            }
        }

        if is_high {
            pivots.push(PivotPoint {
                price: current.high,
                index: i,
                kind: PivotKind::High,
            });
        }
        if is_low {
            pivots.push(PivotPoint {
                price: current.low,
                index: i,
                kind: PivotKind::Low,
            });
        }
    }

    pivots
}

/// Group pivots into levels, classifying each against `current_price`.
pub fn cluster_levels(pivots: &[PivotPoint], current_price: f64, tolerance: f64) -> Vec<Level> {
    let mut used = vec![false; pivots.len()];
    let mut levels = Vec::new();

    for i in 0..pivots.len() {
        if used[i] {
            continue;
        }
        used[i] = true;
        let seed = pivots[i].price;

        let mut sum = seed;
        let mut members = 1usize;
        for j in (i + 1)..pivots.len() {
            if used[j] {
                continue;
            }
            if ((seed - pivots[j].price) / seed).abs() <= tolerance {
                used[j] = true;
                sum += pivots[j].price;
                members += 1;
            }
        }

        let price = sum / members as f64;
        let level_type = if price > current_price {
            LevelType::Resistance
        } else {
            LevelType::Support
        };

        levels.push(Level {
            price,
            level_type,
            strength: (members as f64 / FULL_STRENGTH_MEMBERS).min(1.0),
        });
    }

    levels
}

/// Nearest support and resistance levels around the last close.
///
/// Returns an empty list when fewer than `min_candles` candles are given.
pub fn find_support_resistance(
    candles: &[Candle],
    lookback: usize,
    tolerance: f64,
    min_candles: usize,
) -> Vec<Level> {
    let Some(last) = candles.last() else {
        return Vec::new();
    };
    if candles.len() < min_candles {
        return Vec::new();
    }

    let pivots = find_pivot_points(candles, lookback);
    nearest_levels(cluster_levels(&pivots, last.close, tolerance))
}

/// Closest supports (highest first) and resistances (lowest first) up to
/// three per side, merged by price descending.
fn nearest_levels(levels: Vec<Level>) -> Vec<Level> {
    let (mut supports, mut resistances): (Vec<Level>, Vec<Level>) = levels
        .into_iter()
        .partition(|l| l.level_type == LevelType::Support);

    supports.sort_by(by_price_desc);
    supports.truncate(LEVELS_PER_SIDE);
    resistances.sort_by(|a, b| by_price_desc(b, a));
    resistances.truncate(LEVELS_PER_SIDE);

    let mut levels = resistances;
    levels.extend(supports);
    levels.sort_by(by_price_desc);
    levels
}

/// Default-parameter convenience wrapper.
pub fn support_resistance(candles: &[Candle]) -> Vec<Level> {
    find_support_resistance(
        candles,
        DEFAULT_PIVOT_LOOKBACK,
        DEFAULT_CLUSTER_TOLERANCE,
        MIN_CANDLES_FOR_LEVELS,
    )
}

/// Prices of the levels of one type, in the order given.
pub fn prices_of(levels: &[Level], level_type: LevelType) -> Vec<f64> {
    levels
        .iter()
        .filter(|l| l.level_type == level_type)
        .map(|l| l.price)
        .collect()
}

fn by_price_desc(a: &Level, b: &Level) -> Ordering {
    b.price.partial_cmp(&a.price).unwrap_or(Ordering::Equal)
}
