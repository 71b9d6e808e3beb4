use std::cmp::Ordering;

use super::{preference::PreferenceProfile, scoring::ScoredCandidate, weights::NARRATIVE_WEIGHTS};
use crate::{
    catalog::CandidateProfile,
    dimension::{Dimension, DimensionScale, MIN_DENOMINATOR},
};

/// 軸ごとの「結果説明への効き具合」
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DimensionRelevance<D: Dimension> {
    pub dimension: D,
    pub strength: f64,
    pub closeness: f64,
    pub coverage: f64,
    pub relevance: f64,
}

/// 全軸を関連度順に並べる
///
/// relevance = (強さ * 0.4 + 一致度 * 0.6) * (0.5 + 0.5 * カバレッジ)
pub fn rank_dimensions<D: Dimension>(
    candidate: &CandidateProfile<D>,
    preference: &PreferenceProfile<D>,
    scale: DimensionScale,
) -> Vec<DimensionRelevance<D>> {
    let span = scale.span();
    let half_span = span / 2.0;
    let neutral = scale.neutral();
    let max_weight = preference
        .weights
        .values()
        .copied()
        .fold(0.0_f64, f64::max)
        .max(MIN_DENOMINATOR);

    let mut ranked: Vec<_> = D::ALL
        .iter()
        .map(|dim| {
            let wanted = preference.value(*dim);
            let actual = candidate.value(*dim).unwrap_or(neutral);
            let strength = ((wanted - neutral).abs() / half_span).clamp(0.0, 1.0);
            let closeness = (1.0 - (actual - wanted).abs() / span).clamp(0.0, 1.0);
            let coverage = (preference.weight(*dim) / max_weight).clamp(0.0, 1.0);
            let relevance = (strength * NARRATIVE_WEIGHTS.strength
                + closeness * NARRATIVE_WEIGHTS.closeness)
                * (0.5 + 0.5 * coverage);

            DimensionRelevance {
                dimension: *dim,
                strength,
                closeness,
                coverage,
                relevance,
            }
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.relevance
            .partial_cmp(&a.relevance)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.dimension.cmp(&b.dimension))
    });
    ranked
}

/// 上位 `k` 軸
pub fn top_dimensions<D: Dimension>(
    candidate: &CandidateProfile<D>,
    preference: &PreferenceProfile<D>,
    scale: DimensionScale,
    k: usize,
) -> Vec<D> {
    rank_dimensions(candidate, preference, scale)
        .into_iter()
        .take(k)
        .map(|r| r.dimension)
        .collect()
}

/// 結果の一文説明（テンプレートのみ、乱数なし）
pub fn build_insight<D: Dimension>(top: &ScoredCandidate<'_, D>, dimensions: &[D]) -> String {
    let labels: Vec<_> = dimensions.iter().take(3).map(|d| d.label()).collect();
    let name = &top.candidate.name;
    let score = top.score.round();

    match labels.as_slice() {
        [] => format!("{name} is your closest match at {score:.0}%."),
        [only] => format!("{name} is your closest match at {score:.0}%, driven mostly by {only}."),
        [init @ .., last] => format!(
            "{name} is your closest match at {score:.0}%, with {} and {last} lining up best.",
            init.join(", ")
        ),
    }
}

/// 上位3件 + 強いシグナルの要約行
pub fn summary_lines<D: Dimension>(
    scored: &[ScoredCandidate<'_, D>],
    dimensions: &[D],
) -> Vec<String> {
    let mut lines: Vec<String> = scored
        .iter()
        .take(3)
        .map(|s| format!("#{} {} - {:.0}%", s.rank, s.candidate.name, s.score.round()))
        .collect();

    if !dimensions.is_empty() {
        let labels: Vec<_> = dimensions.iter().map(|d| d.label()).collect();
        lines.push(format!("Strongest signals: {}", labels.join(", ")));
    }

    lines
}

/// 中立から `threshold * 半スパン` 以上偏った軸を、偏りの強い順にタグ化する
pub fn derive_tags<D: Dimension>(
    preference: &PreferenceProfile<D>,
    scale: DimensionScale,
    threshold: f64,
) -> Vec<String> {
    let neutral = scale.neutral();
    let cutoff = threshold * scale.span() / 2.0;

    let mut leaning: Vec<(D, f64)> = D::ALL
        .iter()
        .filter(|dim| preference.is_covered(**dim))
        .map(|dim| (*dim, preference.value(*dim) - neutral))
        .filter(|(_, delta)| delta.abs() >= cutoff)
        .collect();

    leaning.sort_by(|a, b| {
        b.1.abs()
            .partial_cmp(&a.1.abs())
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    });

    leaning
        .into_iter()
        .map(|(dim, delta)| {
            if delta > 0.0 {
                dim.high_label().to_string()
            } else {
                dim.low_label().to_string()
            }
        })
        .collect()
}

/// 上位 `n` 件の表示スコアを合計 100 の整数パーセントに変換する（最大剰余法）
pub fn percentage_shares<D: Dimension>(
    scored: &[ScoredCandidate<'_, D>],
    n: usize,
) -> Vec<(String, u32)> {
    let top: Vec<_> = scored.iter().take(n).collect();
    if top.is_empty() {
        return Vec::new();
    }

    let total: f64 = top.iter().map(|s| s.score.max(0.0)).sum();
    let exact: Vec<f64> = if total > MIN_DENOMINATOR {
        top.iter().map(|s| s.score.max(0.0) / total * 100.0).collect()
    } else {
        vec![100.0 / top.len() as f64; top.len()]
    };

    let mut shares: Vec<u32> = exact.iter().map(|v| v.floor() as u32).collect();
    let mut remainder = 100u32.saturating_sub(shares.iter().sum());

    let mut order: Vec<usize> = (0..exact.len()).collect();
    order.sort_by(|a, b| {
        let fa = exact[*a] - exact[*a].floor();
        let fb = exact[*b] - exact[*b].floor();
        fb.partial_cmp(&fa).unwrap_or(Ordering::Equal).then(a.cmp(b))
    });
    for index in order {
        if remainder == 0 {
            break;
        }
        shares[index] += 1;
        remainder -= 1;
    }

    top.iter()
        .zip(shares)
        .map(|(s, share)| (s.candidate.id.clone(), share))
        .collect()
}
