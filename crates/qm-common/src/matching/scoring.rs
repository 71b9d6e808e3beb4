use std::cmp::Ordering;

use super::{preference::PreferenceProfile, weights::ScoringConfig};
use crate::{
    catalog::{CandidateProfile, Catalog},
    dimension::{Dimension, MIN_DENOMINATOR},
};

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredCandidate<'a, D: Dimension> {
    pub candidate: &'a CandidateProfile<D>,
    /// 丸め前の類似度（0〜100）。順位付けに使う。
    pub similarity: f64,
    /// 丸め後の生スコア
    pub raw_score: f64,
    /// 表示スコア（キャリブレーション後。無ければ raw_score と同じ）
    pub score: f64,
    /// 1 始まりの順位
    pub rank: usize,
}

/// 重み付きユークリッド距離を 0〜100 の類似度に変換する
///
/// 各軸の重みは `max(回答重み合計, floor_weight)`。最大距離は宣言された
/// 値域のスパンから求める（0〜10 なら 1軸あたり `w * 100`）。
pub fn similarity<D: Dimension>(
    candidate: &CandidateProfile<D>,
    preference: &PreferenceProfile<D>,
    config: &ScoringConfig,
) -> f64 {
    let span = config.scale.span();
    let mut distance_sq = 0.0;
    let mut max_distance_sq = 0.0;

    for dim in D::ALL {
        let weight = preference.weight(*dim).max(config.floor_weight);
        let wanted = preference.value(*dim);
        let actual = candidate.value(*dim).unwrap_or_else(|| config.scale.neutral());
        let gap = actual - wanted;

        distance_sq += weight * gap * gap;
        max_distance_sq += weight * span * span;
    }

    let normalized = distance_sq.sqrt() / max_distance_sq.max(MIN_DENOMINATOR).sqrt();
    let score = (1.0 - normalized) * 100.0;
    if score.is_finite() {
        score.clamp(0.0, 100.0)
    } else {
        0.0
    }
}

/// 丸め済みスコア（0〜100 の整数値）
pub fn score<D: Dimension>(
    candidate: &CandidateProfile<D>,
    preference: &PreferenceProfile<D>,
    config: &ScoringConfig,
) -> f64 {
    similarity(candidate, preference, config).round()
}

/// カタログ全体を採点して順位付けする
///
/// 並び順: 類似度降順 → priority 昇順 → id 昇順（入力順には依存しない）
pub fn rank_candidates<'a, D: Dimension>(
    catalog: &'a Catalog<D>,
    preference: &PreferenceProfile<D>,
    config: &ScoringConfig,
) -> Vec<ScoredCandidate<'a, D>> {
    let mut scored: Vec<_> = catalog
        .candidates()
        .iter()
        .map(|candidate| {
            let similarity = similarity(candidate, preference, config);
            ScoredCandidate {
                candidate,
                similarity,
                raw_score: similarity.round(),
                score: similarity.round(),
                rank: 0,
            }
        })
        .collect();

    scored.sort_by(compare_scored);
    for (index, entry) in scored.iter_mut().enumerate() {
        entry.rank = index + 1;
    }

    scored
}

fn compare_scored<D: Dimension>(
    a: &ScoredCandidate<'_, D>,
    b: &ScoredCandidate<'_, D>,
) -> Ordering {
    match b
        .similarity
        .partial_cmp(&a.similarity)
        .unwrap_or(Ordering::Equal)
    {
        Ordering::Equal => a
            .candidate
            .priority
            .cmp(&b.candidate.priority)
            .then_with(|| a.candidate.id.cmp(&b.candidate.id)),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        dimension::{DimensionScale, filled, test_support::Axis},
        matching::preference::PreferenceProfile,
    };

    fn uniform(id: &str, priority: u32, value: f64) -> CandidateProfile<Axis> {
        let pairs: Vec<_> = Axis::ALL.iter().map(|d| (*d, value)).collect();
        CandidateProfile::new(id, id, priority, &pairs)
    }

    fn pref_at(value: f64) -> PreferenceProfile<Axis> {
        PreferenceProfile {
            vector: filled(value),
            weights: filled(1.0),
            answered: 1,
        }
    }

    #[test]
    fn identical_profile_scores_one_hundred() {
        let config = ScoringConfig::default();
        assert_eq!(score(&uniform("a", 1, 7.0), &pref_at(7.0), &config), 100.0);
    }

    #[test]
    fn opposite_profile_scores_zero() {
        let config = ScoringConfig::default();
        assert_eq!(score(&uniform("a", 1, 0.0), &pref_at(10.0), &config), 0.0);
    }

    #[test]
    fn scores_stay_in_bounds_for_degenerate_inputs() {
        let config = ScoringConfig::default();
        let zero = PreferenceProfile {
            vector: filled(0.0),
            weights: filled(0.0),
            answered: 0,
        };
        for value in [0.0, 2.5, 5.0, 10.0] {
            let s = score(&uniform("a", 1, value), &zero, &config);
            assert!((0.0..=100.0).contains(&s));
        }

        let no_floor = ScoringConfig {
            floor_weight: 0.0,
            ..ScoringConfig::default()
        };
        let s = similarity(&uniform("a", 1, 3.0), &zero, &no_floor);
        assert!((0.0..=100.0).contains(&s));
    }

    #[test]
    fn max_gap_follows_declared_scale() {
        let ten = ScoringConfig::for_scale(DimensionScale::ZERO_TO_TEN);
        let hundred = ScoringConfig::for_scale(DimensionScale::ZERO_TO_HUNDRED);

        let small = similarity(&uniform("a", 1, 5.0), &pref_at(7.5), &ten);
        let large = similarity(&uniform("a", 1, 50.0), &pref_at(75.0), &hundred);
        assert!((small - large).abs() < 1e-9);
        assert!((small - 75.0).abs() < 1e-9);
    }

    #[test]
    fn floor_weight_keeps_uncovered_dimensions_in_play() {
        let config = ScoringConfig::default();
        let mut pref = pref_at(5.0);
        for dim in Axis::ALL {
            pref.weights.insert(*dim, 0.0);
        }
        pref.weights.insert(Axis::A, 2.0);

        let mut near_on_a = uniform("a", 1, 5.0);
        near_on_a.profile.insert(Axis::H, 10.0);
        let s = similarity(&near_on_a, &pref, &config);
        assert!(s < 100.0, "uncovered dimension must still count: {s}");
    }

    #[test]
    fn ranking_is_deterministic_with_tie_breaks() {
        let config = ScoringConfig::default();
        let catalog = Catalog::load(
            vec![
                uniform("zeta", 2, 6.0),
                uniform("alpha", 2, 4.0),
                uniform("beta", 1, 4.0),
                uniform("gamma", 1, 9.0),
            ],
            DimensionScale::ZERO_TO_TEN,
        )
        .unwrap();

        let ranked = rank_candidates(&catalog, &pref_at(5.0), &config);
        let order: Vec<_> = ranked.iter().map(|s| s.candidate.id.as_str()).collect();

        // 4.0 と 6.0 は中立5から等距離 → priority, id の順
        assert_eq!(order, vec!["beta", "alpha", "zeta", "gamma"]);
        assert_eq!(
            ranked.iter().map(|s| s.rank).collect::<Vec<_>>(),
            vec![1, 2, 3, 4]
        );
        assert!(ranked.iter().all(|s| s.score == s.raw_score));

        let again = rank_candidates(&catalog, &pref_at(5.0), &config);
        assert_eq!(ranked, again);
    }
}
