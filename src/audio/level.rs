use serde::{Deserialize, Serialize};

/// Number of bars in the level display
pub const LEVEL_BARS: usize = 10;

/// Mean amplitude covered by each lit bar (full scale 255 = 10 bars)
const BAR_STEP: f64 = 7.5;

/// Lit state of a single display bar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BarState {
    Lit,
    Unlit,
}

/// A single reduced input-level reading
///
/// Derived data for display only; recomputed on every spectrum frame and
/// replaced immediately, never buffered or replayed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelSample {
    /// Lit-bar count in `[0, LEVEL_BARS]`
    pub bars_lit: usize,
    /// Per-bar states, cumulative from the lowest bar up
    pub bars: [BarState; LEVEL_BARS],
}

impl LevelSample {
    /// The all-dark sample shown whenever no capture is active
    pub fn dark() -> Self {
        Self {
            bars_lit: 0,
            bars: [BarState::Unlit; LEVEL_BARS],
        }
    }
}

/// Reduces spectrum frames into lit-bar counts for the live indicator
pub struct LevelMeter;

impl LevelMeter {
    /// Reduce one frame of frequency-bin amplitudes to a level sample
    ///
    /// Takes the arithmetic mean across bins and maps it to a bar count
    /// via `floor(mean / BAR_STEP)`, clamped to the bar range. Bars light
    /// cumulatively from the bottom, and the bar at the count index is lit
    /// too, so even a silent frame shows the lowest bar.
    pub fn reduce(bins: &[u8]) -> LevelSample {
        let mean = if bins.is_empty() {
            0.0
        } else {
            bins.iter().map(|&bin| bin as f64).sum::<f64>() / bins.len() as f64
        };

        let bars_lit = ((mean / BAR_STEP).floor() as usize).min(LEVEL_BARS);

        let mut bars = [BarState::Unlit; LEVEL_BARS];
        for (index, bar) in bars.iter_mut().enumerate() {
            if index <= bars_lit {
                *bar = BarState::Lit;
            }
        }

        LevelSample { bars_lit, bars }
    }
}
