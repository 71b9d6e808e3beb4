use super::scoring::ScoredCandidate;
use crate::dimension::{Dimension, MIN_DENOMINATOR};

/// 上位が 100 付近に張り付くカタログ向けの表示スコア補正
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationPolicy {
    /// これ未満の分布幅は「ほぼ同点」とみなし順位ベースに切り替える
    pub min_spread: f64,
    pub band_low: f64,
    pub band_high: f64,
    /// 1 未満で上位側の差を広げる
    pub easing_exponent: f64,
    pub fallback_start: f64,
    pub fallback_floor: f64,
    pub rank_epsilon: f64,
}

impl Default for CalibrationPolicy {
    fn default() -> Self {
        Self {
            min_spread: 3.0,
            band_low: 55.0,
            band_high: 97.0,
            easing_exponent: 0.85,
            fallback_start: 95.0,
            fallback_floor: 60.0,
            rank_epsilon: 0.01,
        }
    }
}

/// 順位順（raw_score 降順）のリストに表示スコアを割り当てる。並び替えはしない。
pub fn calibrate<D: Dimension>(scored: &mut [ScoredCandidate<'_, D>], policy: &CalibrationPolicy) {
    if scored.is_empty() {
        return;
    }

    let (min, max) = scored
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), s| {
            (lo.min(s.raw_score), hi.max(s.raw_score))
        });
    let spread = max - min;

    if spread < policy.min_spread {
        for (index, entry) in scored.iter_mut().enumerate() {
            entry.score = (policy.fallback_start - index as f64).max(policy.fallback_floor);
        }
        return;
    }

    let band = policy.band_high - policy.band_low;
    let exponent = policy.easing_exponent.max(MIN_DENOMINATOR);
    for (index, entry) in scored.iter_mut().enumerate() {
        let t = ((entry.raw_score - min) / spread.max(MIN_DENOMINATOR)).clamp(0.0, 1.0);
        let eased = 1.0 - (1.0 - t).powf(exponent);
        let value = policy.band_low + band * eased - index as f64 * policy.rank_epsilon;
        entry.score = round2(value.clamp(0.0, 100.0));
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
