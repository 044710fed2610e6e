// =============================================================================
// Volume Analysis
// =============================================================================
//
//   avg_volume   = mean volume over the last `period` candles
//   volume_ratio = current_volume / avg_volume
//
// ratio > 1.5 is high participation, < 0.5 low, anything else normal. With
// fewer than `period` candles the average runs over whatever is available.
// =============================================================================

use serde::{Deserialize, Serialize};

use crate::types::Candle;

const HIGH_VOLUME_RATIO: f64 = 1.5;
const LOW_VOLUME_RATIO: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VolumeTrend {
    High,
    Low,
    #[default]
    Normal,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeAnalysis {
    pub current_volume: f64,
    pub avg_volume: f64,
    pub volume_ratio: f64,
    pub trend: VolumeTrend,
}

impl Default for VolumeAnalysis {
    fn default() -> Self {
        Self {
            current_volume: 0.0,
            avg_volume: 0.0,
            volume_ratio: 1.0,
            trend: VolumeTrend::Normal,
        }
    }
}

/// Compare the latest candle's volume with the trailing average.
///
/// # Panics
/// When `period` is zero.
pub fn analyze_volume(candles: &[Candle], period: usize) -> VolumeAnalysis {
    assert!(period >= 1, "volume period must be >= 1");

    let Some(last) = candles.last() else {
        return VolumeAnalysis::default();
    };

    let window = &candles[candles.len().saturating_sub(period)..];
    let avg_volume = window.iter().map(|c| c.volume).sum::<f64>() / window.len() as f64;
    let current_volume = last.volume;

    let volume_ratio = if avg_volume != 0.0 {
        current_volume / avg_volume
    } else {
        1.0
    };

    let trend = if volume_ratio > HIGH_VOLUME_RATIO {
        VolumeTrend::High
    } else if volume_ratio < LOW_VOLUME_RATIO {
        VolumeTrend::Low
    } else {
        VolumeTrend::Normal
    };

    VolumeAnalysis {
        current_volume,
        avg_volume,
        volume_ratio,
        trend,
    }
}
