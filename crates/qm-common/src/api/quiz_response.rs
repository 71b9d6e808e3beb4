use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    dimension::{Dimension, keyed},
    domains::QuizDomain,
    enrichment::EnrichedNarrative,
    matching::{AnswerSummaryItem, ScoredCandidate},
    question::{AnswerOption, Question},
};

/// クイズ一覧の1件
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuizSummaryDto {
    pub domain: QuizDomain,
    pub title: String,
    pub question_count: usize,
    pub min_questions: usize,
    pub max_questions: usize,
    pub candidate_count: usize,
    /// 軸キー（表示順）
    pub dimensions: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizListResponse {
    pub quizzes: Vec<QuizSummaryDto>,
}

/// 選択肢（ベクトルはクライアントに渡さない）
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OptionDto {
    pub id: String,
    pub label: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuestionDto {
    pub id: String,
    pub title: String,
    pub options: Vec<OptionDto>,
}

impl<D: Dimension> From<&AnswerOption<D>> for OptionDto {
    fn from(value: &AnswerOption<D>) -> Self {
        Self {
            id: value.id.clone(),
            label: value.label.clone(),
        }
    }
}

impl<D: Dimension> From<&Question<D>> for QuestionDto {
    fn from(value: &Question<D>) -> Self {
        Self {
            id: value.id.clone(),
            title: value.title.clone(),
            options: value.options.iter().map(OptionDto::from).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionSetResponse {
    pub domain: QuizDomain,
    pub title: String,
    pub questions: Vec<QuestionDto>,
}

/// 採点済み候補
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CandidateDto {
    pub id: String,
    pub name: String,
    pub rank: usize,
    /// 表示スコア（補正後、0〜100）
    pub score: f64,
    /// 補正前のスコア
    pub raw_score: f64,
    pub summary: String,
    pub tags: Vec<String>,
}

impl<D: Dimension> From<&ScoredCandidate<'_, D>> for CandidateDto {
    fn from(value: &ScoredCandidate<'_, D>) -> Self {
        Self {
            id: value.candidate.id.clone(),
            name: value.candidate.name.clone(),
            rank: value.rank,
            score: value.score,
            raw_score: value.raw_score,
            summary: value.candidate.meta.summary.clone(),
            tags: value.candidate.meta.tags.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnswerSummaryDto {
    pub question_id: String,
    pub question_title: String,
    pub option_id: String,
    pub option_label: String,
    pub weight: f64,
    pub vector: BTreeMap<String, f64>,
}

impl<D: Dimension> From<&AnswerSummaryItem<D>> for AnswerSummaryDto {
    fn from(value: &AnswerSummaryItem<D>) -> Self {
        Self {
            question_id: value.question_id.clone(),
            question_title: value.question_title.clone(),
            option_id: value.option_id.clone(),
            option_label: value.option_label.clone(),
            weight: value.weight,
            vector: keyed(&value.vector),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ShareDto {
    pub id: String,
    pub share: u32,
}

/// ローカル採点結果（AI なしでも常に完結する）
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuizResultDto {
    pub domain: QuizDomain,
    pub top: Option<CandidateDto>,
    pub top_three: Vec<CandidateDto>,
    pub ranking: Vec<CandidateDto>,
    pub preference: BTreeMap<String, f64>,
    pub dimension_weights: BTreeMap<String, f64>,
    pub asked: usize,
    pub answered: usize,
    pub answer_summary: Vec<AnswerSummaryDto>,
    pub top_dimensions: Vec<String>,
    pub summary_lines: Vec<String>,
    pub insight: String,
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub shares: Vec<ShareDto>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtype: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EnrichmentStatus {
    /// 要求されなかった／無効
    Skipped,
    /// AI 文面を検証して採用
    Applied,
    /// 失敗・タイムアウト・検証不合格でローカル結果のみ
    Fallback,
}

impl EnrichmentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Skipped => "skipped",
            Self::Applied => "applied",
            Self::Fallback => "fallback",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizResultResponse {
    pub evaluation_id: String,
    pub generated_at: DateTime<Utc>,
    pub result: QuizResultDto,
    pub enrichment: Option<EnrichedNarrative>,
    pub enrichment_status: EnrichmentStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enrichment_status_serializes_snake_case() {
        let json = serde_json::to_string(&EnrichmentStatus::Fallback).unwrap();
        assert_eq!(json, "\"fallback\"");
        assert_eq!(EnrichmentStatus::Applied.as_str(), "applied");
    }

    #[test]
    fn question_dto_hides_vectors() {
        use crate::dimension::test_support::Axis;

        let question = Question::new(
            "q1",
            "Pick one",
            1.0,
            vec![AnswerOption::new("a", "Alpha", &[(Axis::A, 3.0)])],
        );
        let json = serde_json::to_value(QuestionDto::from(&question)).unwrap();
        assert_eq!(json["options"][0]["id"], "a");
        assert!(json["options"][0].get("vector").is_none());
    }
}
