use serde::Deserialize;
use utoipa::ToSchema;

/// Which cluster wins when a swing is equally close to two open clusters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ClusterTieBreak {
    /// Cluster with the earlier first member
    #[default]
    OldestLevel,
    /// Cluster with the later first member
    NewestLevel,
}

/// How bars with equal highs are treated by swing detection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PlateauRule {
    /// Every neighbour in the window must be strictly lower
    Strict,
    /// The first bar of an equal-high plateau is the swing
    #[default]
    FirstBar,
}

/// Configuration parameters for resistance flip detection
#[derive(Debug, Clone, PartialEq)]
pub struct FlipConfig {
    /// Bars on each side a swing high must beat
    pub swing_window: usize,
    /// Max % distance between a swing and its level
    pub level_tolerance_pct: f64,
    /// Min swings for a level to count as resistance
    pub min_tests: usize,
    /// Min % a close must clear the level to break out
    pub breakout_threshold_pct: f64,
    /// % band around the level that counts as testing it now
    pub current_test_tolerance_pct: f64,
    /// % above the level still counted as testing (early bounce)
    pub extended_tolerance_pct: f64,
    /// % close below the level that fails the flip, defaults to `level_tolerance_pct`
    pub failed_flip_tolerance_pct: Option<f64>,
    pub cluster_tie_break: ClusterTieBreak,
    pub plateau_rule: PlateauRule,
}

impl FlipConfig {
    pub fn failed_flip_tolerance(&self) -> f64 {
        self.failed_flip_tolerance_pct
            .unwrap_or(self.level_tolerance_pct)
    }

    /// Shortest series swing detection can work with
    pub fn min_bars(&self) -> usize {
        2 * self.swing_window + 1
    }
}

impl Default for FlipConfig {
    fn default() -> Self {
        Self {
            swing_window: 2,
            level_tolerance_pct: 2.0,
            min_tests: 3,
            breakout_threshold_pct: 2.0,
            current_test_tolerance_pct: 2.0,
            extended_tolerance_pct: 5.0,
            failed_flip_tolerance_pct: None,
            cluster_tie_break: ClusterTieBreak::OldestLevel,
            plateau_rule: PlateauRule::FirstBar,
        }
    }
}
