use crate::dimension::DimensionScale;

/// カバレッジが無い軸にも最低限効かせる重みの下限
pub const DEFAULT_FLOOR_WEIGHT: f64 = 0.6;

/// 結果文で使う上位軸の数
pub const DEFAULT_TOP_DIMENSIONS: usize = 3;

/// タグ化する偏りの閾値（半スパンに対する割合）
pub const DEFAULT_TAG_THRESHOLD: f64 = 0.3;

/// 上位軸抽出の配合
/// 目的: 「どれだけ強く持っているか」より「どれだけ一致したか」を優先する
pub const NARRATIVE_WEIGHTS: NarrativeWeights = NarrativeWeights {
    strength: 0.4,
    closeness: 0.6,
};

#[derive(Debug, Clone, Copy)]
pub struct NarrativeWeights {
    pub strength: f64,
    pub closeness: f64,
}

impl NarrativeWeights {
    pub fn sum(&self) -> f64 {
        self.strength + self.closeness
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringConfig {
    pub scale: DimensionScale,
    pub floor_weight: f64,
    pub top_dimensions: usize,
    pub tag_threshold: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self::for_scale(DimensionScale::ZERO_TO_TEN)
    }
}

impl ScoringConfig {
    pub fn for_scale(scale: DimensionScale) -> Self {
        Self {
            scale,
            floor_weight: DEFAULT_FLOOR_WEIGHT,
            top_dimensions: DEFAULT_TOP_DIMENSIONS,
            tag_threshold: DEFAULT_TAG_THRESHOLD,
        }
    }

    /// `QM_FLOOR_WEIGHT` で下限重みを上書きする（不正値は無視）
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(floor) = env_floor_weight() {
            self.floor_weight = floor;
        }
        self
    }
}

fn env_floor_weight() -> Option<f64> {
    std::env::var("QM_FLOOR_WEIGHT")
        .ok()
        .and_then(|s| s.parse::<f64>().ok())
        .filter(|v| v.is_finite() && *v >= 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn narrative_weights_sum_to_one() {
        assert!((NARRATIVE_WEIGHTS.sum() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn config_keeps_declared_scale() {
        let config = ScoringConfig::for_scale(DimensionScale::ZERO_TO_HUNDRED);
        assert_eq!(config.scale.span(), 100.0);
        assert_eq!(config.floor_weight, DEFAULT_FLOOR_WEIGHT);
    }
}
