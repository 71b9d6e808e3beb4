use std::borrow::Borrow;

use rand::Rng;
use tracing::debug;

use super::{
    calibration::{CalibrationPolicy, calibrate},
    narrative::{build_insight, derive_tags, percentage_shares, summary_lines, top_dimensions},
    preference::{PreferenceProfile, build_preference, resolve_answer},
    scoring::{ScoredCandidate, rank_candidates},
    selector::select_questions,
    weights::ScoringConfig,
};
use crate::{
    catalog::{CandidateProfile, Catalog, CatalogError},
    dimension::{Dimension, DimensionMap},
    question::{Question, validate_bank},
};

/// 嗜好ベクトルから直接導くサブタイプ（カタログに依存しないラベル）
pub type SubtypeFn<D> = fn(&PreferenceProfile<D>, &ScoringConfig) -> Option<String>;

/// 1 つのクイズ領域の静的定義
#[derive(Debug, Clone)]
pub struct QuizDefinition<D: Dimension> {
    pub title: &'static str,
    pub questions: Vec<Question<D>>,
    pub candidates: Vec<CandidateProfile<D>>,
    pub config: ScoringConfig,
    pub calibration: Option<CalibrationPolicy>,
    /// 出題数の既定範囲 (min, max)
    pub question_range: (usize, usize),
    /// 割合表示する上位件数（0 なら出さない）
    pub share_count: usize,
    pub subtype: Option<SubtypeFn<D>>,
}

/// 回答の再現可能な記録（UI と AI プロンプトの両方が使う）
#[derive(Debug, Clone, PartialEq)]
pub struct AnswerSummaryItem<D: Dimension> {
    pub question_id: String,
    pub question_title: String,
    pub option_id: String,
    pub option_label: String,
    pub weight: f64,
    pub vector: DimensionMap<D>,
}

/// 1 回の採点結果
#[derive(Debug, Clone)]
pub struct QuizOutcome<'a, D: Dimension> {
    pub scored: Vec<ScoredCandidate<'a, D>>,
    pub preference: PreferenceProfile<D>,
    pub answer_summary: Vec<AnswerSummaryItem<D>>,
    pub top_dimensions: Vec<D>,
    pub summary_lines: Vec<String>,
    pub insight: String,
    pub tags: Vec<String>,
    pub shares: Vec<(String, u32)>,
    pub subtype: Option<String>,
}

impl<'a, D: Dimension> QuizOutcome<'a, D> {
    pub fn top(&self) -> Option<&ScoredCandidate<'a, D>> {
        self.scored.first()
    }

    pub fn top_three(&self) -> &[ScoredCandidate<'a, D>] {
        &self.scored[..self.scored.len().min(3)]
    }
}

/// 汎用スコアリングエンジン（領域ごとの違いは `QuizDefinition` に閉じ込める）
#[derive(Debug, Clone)]
pub struct ScoringEngine<D: Dimension> {
    title: &'static str,
    questions: Vec<Question<D>>,
    catalog: Catalog<D>,
    config: ScoringConfig,
    calibration: Option<CalibrationPolicy>,
    question_range: (usize, usize),
    share_count: usize,
    subtype: Option<SubtypeFn<D>>,
}

impl<D: Dimension> ScoringEngine<D> {
    /// 設問バンクとカタログを検証して組み立てる。不備は起動時エラー。
    pub fn new(definition: QuizDefinition<D>) -> Result<Self, CatalogError> {
        let config = definition.config;
        validate_bank(&definition.questions, config.scale)?;
        let catalog = Catalog::load(definition.candidates, config.scale)?;

        let (min, max) = definition.question_range;
        if min == 0 || min > max {
            return Err(CatalogError::InvalidQuestionRange { min, max });
        }

        Ok(Self {
            title: definition.title,
            questions: definition.questions,
            catalog,
            config,
            calibration: definition.calibration,
            question_range: definition.question_range,
            share_count: definition.share_count,
            subtype: definition.subtype,
        })
    }

    pub fn title(&self) -> &'static str {
        self.title
    }

    pub fn questions(&self) -> &[Question<D>] {
        &self.questions
    }

    pub fn catalog(&self) -> &Catalog<D> {
        &self.catalog
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    pub fn question_range(&self) -> (usize, usize) {
        self.question_range
    }

    pub fn question(&self, id: &str) -> Option<&Question<D>> {
        self.questions.iter().find(|q| q.id == id)
    }

    /// 出題セットを抽選する。範囲指定が無ければ領域の既定値。
    pub fn sample<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        range: Option<(usize, usize)>,
    ) -> Vec<&Question<D>> {
        let (min, max) = range.unwrap_or(self.question_range);
        select_questions(&self.questions, min, max, rng)
    }

    /// 回答 → 嗜好ベクトル → 採点 → (補正) → 説明文 の一直線パイプライン
    pub fn evaluate<Q, S>(&self, questions: &[Q], answer_ids: &[Option<S>]) -> QuizOutcome<'_, D>
    where
        Q: Borrow<Question<D>>,
        S: AsRef<str>,
    {
        let preference = build_preference(questions, answer_ids, self.config.scale);
        let answer_summary = summarize_answers(questions, answer_ids);

        let mut scored = rank_candidates(&self.catalog, &preference, &self.config);
        if let Some(policy) = &self.calibration {
            calibrate(&mut scored, policy);
        }

        let top_dims = scored
            .first()
            .map(|top| {
                top_dimensions(
                    top.candidate,
                    &preference,
                    self.config.scale,
                    self.config.top_dimensions,
                )
            })
            .unwrap_or_default();

        let insight = scored
            .first()
            .map(|top| build_insight(top, &top_dims))
            .unwrap_or_default();
        let summary = summary_lines(&scored, &top_dims);
        let tags = derive_tags(&preference, self.config.scale, self.config.tag_threshold);
        let shares = if self.share_count > 0 {
            percentage_shares(&scored, self.share_count)
        } else {
            Vec::new()
        };
        let subtype = self.subtype.and_then(|f| f(&preference, &self.config));

        debug!(
            quiz = self.title,
            answered = preference.answered,
            asked = questions.len(),
            top = scored.first().map(|s| s.candidate.id.as_str()).unwrap_or(""),
            "quiz evaluated"
        );

        QuizOutcome {
            scored,
            preference,
            answer_summary,
            top_dimensions: top_dims,
            summary_lines: summary,
            insight,
            tags,
            shares,
            subtype,
        }
    }
}

fn summarize_answers<D, Q, S>(
    questions: &[Q],
    answer_ids: &[Option<S>],
) -> Vec<AnswerSummaryItem<D>>
where
    D: Dimension,
    Q: Borrow<Question<D>>,
    S: AsRef<str>,
{
    questions
        .iter()
        .enumerate()
        .filter_map(|(index, question)| {
            let question = question.borrow();
            let option = resolve_answer(question, answer_ids.get(index).and_then(Option::as_ref))?;
            Some(AnswerSummaryItem {
                question_id: question.id.clone(),
                question_title: question.title.clone(),
                option_id: option.id.clone(),
                option_label: option.label.clone(),
                weight: question.weight,
                vector: option.vector.clone(),
            })
        })
        .collect()
}
