use std::borrow::Borrow;

use tracing::debug;

use crate::{
    dimension::{Dimension, DimensionMap, DimensionScale, MIN_DENOMINATOR, filled},
    question::{AnswerOption, Question},
};

/// ユーザーの嗜好ベクトルと軸ごとの重み合計
#[derive(Debug, Clone, PartialEq)]
pub struct PreferenceProfile<D: Dimension> {
    /// 軸ごとの加重平均（回答がない軸は中立値）
    pub vector: DimensionMap<D>,
    /// 軸ごとに実際の回答が寄与した重みの合計
    pub weights: DimensionMap<D>,
    /// 有効に解決できた回答数
    pub answered: usize,
}

impl<D: Dimension> PreferenceProfile<D> {
    /// 全軸中立（回答ゼロ）のプロファイル
    pub fn neutral(scale: DimensionScale) -> Self {
        Self {
            vector: filled(scale.neutral()),
            weights: filled(0.0),
            answered: 0,
        }
    }

    pub fn value(&self, dim: D) -> f64 {
        self.vector.get(&dim).copied().unwrap_or_default()
    }

    pub fn weight(&self, dim: D) -> f64 {
        self.weights.get(&dim).copied().unwrap_or_default()
    }

    pub fn is_covered(&self, dim: D) -> bool {
        self.weight(dim) > MIN_DENOMINATOR
    }
}

/// `answer_ids[i]` を `questions[i]` の選択肢IDとして解決する。
/// 未回答・範囲外・未知のIDはいずれも `None`。
pub fn resolve_answer<'q, D, S>(
    question: &'q Question<D>,
    answer_id: Option<&S>,
) -> Option<&'q AnswerOption<D>>
where
    D: Dimension,
    S: AsRef<str> + ?Sized,
{
    let answer_id = answer_id?.as_ref();
    let option = question.option(answer_id);
    if option.is_none() {
        debug!(
            question_id = %question.id,
            answer_id,
            "unknown option id; treating question as unanswered"
        );
    }
    option
}

/// 選ばれた選択肢のベクトルを設問の重みで加重平均する
pub fn build_preference<D, Q, S>(
    questions: &[Q],
    answer_ids: &[Option<S>],
    scale: DimensionScale,
) -> PreferenceProfile<D>
where
    D: Dimension,
    Q: Borrow<Question<D>>,
    S: AsRef<str>,
{
    let mut sums: DimensionMap<D> = filled(0.0);
    let mut weights: DimensionMap<D> = filled(0.0);
    let mut answered = 0;

    for (index, question) in questions.iter().enumerate() {
        let question = question.borrow();
        let answer_id = answer_ids.get(index).and_then(Option::as_ref);
        let Some(option) = resolve_answer(question, answer_id) else {
            continue;
        };

        answered += 1;
        for (dim, value) in &option.vector {
            *sums.entry(*dim).or_default() += value * question.weight;
            *weights.entry(*dim).or_default() += question.weight;
        }
    }

    let vector = D::ALL
        .iter()
        .map(|dim| {
            let total = weights.get(dim).copied().unwrap_or_default();
            let value = if total > MIN_DENOMINATOR {
                sums.get(dim).copied().unwrap_or_default() / total
            } else {
                scale.neutral()
            };
            (*dim, value)
        })
        .collect();

    PreferenceProfile {
        vector,
        weights,
        answered,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dimension::test_support::Axis;

    fn bank() -> Vec<Question<Axis>> {
        vec![
            Question::new(
                "q1",
                "one",
                1.0,
                vec![
                    AnswerOption::new("hot", "Hot", &[(Axis::A, 9.0), (Axis::B, 4.0)]),
                    AnswerOption::new("cold", "Cold", &[(Axis::A, 1.0)]),
                ],
            ),
            Question::new(
                "q2",
                "two",
                1.5,
                vec![AnswerOption::new("fast", "Fast", &[(Axis::A, 3.0), (Axis::C, 8.0)])],
            ),
        ]
    }

    #[test]
    fn computes_weighted_average_per_dimension() {
        let bank = bank();
        let answers = [Some("hot"), Some("fast")];

        let pref = build_preference(&bank, &answers, DimensionScale::ZERO_TO_TEN);

        let expected_a = (9.0 * 1.0 + 3.0 * 1.5) / 2.5;
        assert!((pref.value(Axis::A) - expected_a).abs() < 1e-9);
        assert!((pref.value(Axis::B) - 4.0).abs() < 1e-9);
        assert!((pref.value(Axis::C) - 8.0).abs() < 1e-9);
        assert_eq!(pref.weight(Axis::A), 2.5);
        assert_eq!(pref.weight(Axis::C), 1.5);
        assert_eq!(pref.answered, 2);
    }

    #[test]
    fn uncovered_dimensions_fall_back_to_neutral() {
        let bank = bank();
        let pref = build_preference(&bank, &[Some("cold"), None], DimensionScale::ZERO_TO_TEN);

        for dim in [Axis::B, Axis::C, Axis::D, Axis::H] {
            assert_eq!(pref.value(dim), 5.0);
            assert_eq!(pref.weight(dim), 0.0);
        }
        assert_eq!(pref.vector.len(), Axis::ALL.len());
        assert_eq!(pref.weights.len(), Axis::ALL.len());
    }

    #[test]
    fn unknown_and_missing_answers_contribute_nothing() {
        let bank = bank();
        let pref = build_preference(&bank, &[Some("lukewarm")], DimensionScale::ZERO_TO_TEN);

        assert_eq!(pref.answered, 0);
        assert_eq!(pref, PreferenceProfile::neutral(DimensionScale::ZERO_TO_TEN));
    }

    #[test]
    fn neutral_uses_scale_midpoint() {
        let bank = bank();
        let answers: [Option<&str>; 2] = [None, None];
        let pref = build_preference(&bank, &answers, DimensionScale::ZERO_TO_HUNDRED);
        assert!(pref.vector.values().all(|v| *v == 50.0));
    }
}
