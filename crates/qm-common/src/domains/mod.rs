//! 提供中のクイズ領域と、API 層向けに軸型を隠したレジストリ

pub mod attachment;
pub mod city;
pub mod talent;

use std::{collections::HashSet, fmt, str::FromStr};

use once_cell::sync::OnceCell;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::{
    api::{AnswerSummaryDto, CandidateDto, QuestionDto, QuizResultDto, QuizSummaryDto, ShareDto},
    catalog::CatalogError,
    dimension::{Dimension, keyed},
    enrichment::EnrichmentPayload,
    matching::ScoringEngine,
    question::Question,
};

pub use attachment::AttachmentDimension;
pub use city::CityDimension;
pub use talent::TalentDimension;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuizDomain {
    City,
    Talent,
    Attachment,
}

impl QuizDomain {
    pub const ALL: [QuizDomain; 3] = [QuizDomain::City, QuizDomain::Talent, QuizDomain::Attachment];

    pub fn as_str(self) -> &'static str {
        match self {
            QuizDomain::City => "city",
            QuizDomain::Talent => "talent",
            QuizDomain::Attachment => "attachment",
        }
    }
}

impl fmt::Display for QuizDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown quiz domain: {0}")]
pub struct UnknownDomain(pub String);

impl FromStr for QuizDomain {
    type Err = UnknownDomain;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let lower = value.trim().to_ascii_lowercase();
        QuizDomain::ALL
            .into_iter()
            .find(|domain| domain.as_str() == lower)
            .ok_or_else(|| UnknownDomain(value.to_string()))
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EvaluationError {
    #[error("received {answers} answers for {questions} questions")]
    TooManyAnswers { questions: usize, answers: usize },
}

/// 採点結果と、AI 文面生成に渡すデータ
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub result: QuizResultDto,
    pub payload: EnrichmentPayload,
}

/// 軸型を消した1領域ぶんの操作
trait ErasedQuiz: Send + Sync {
    fn summary(&self, domain: QuizDomain) -> QuizSummaryDto;
    fn title(&self) -> &'static str;
    fn sample(&self, rng: &mut dyn RngCore, range: Option<(usize, usize)>) -> Vec<QuestionDto>;
    fn evaluate(
        &self,
        domain: QuizDomain,
        question_ids: &[String],
        answer_ids: &[Option<String>],
    ) -> Result<Evaluation, EvaluationError>;
}

impl<D: Dimension> ErasedQuiz for ScoringEngine<D> {
    fn summary(&self, domain: QuizDomain) -> QuizSummaryDto {
        let (min, max) = self.question_range();
        QuizSummaryDto {
            domain,
            title: self.title().to_string(),
            question_count: self.questions().len(),
            min_questions: min,
            max_questions: max,
            candidate_count: self.catalog().len(),
            dimensions: D::ALL.iter().map(|d| d.key().to_string()).collect(),
        }
    }

    fn title(&self) -> &'static str {
        ScoringEngine::title(self)
    }

    fn sample(&self, rng: &mut dyn RngCore, range: Option<(usize, usize)>) -> Vec<QuestionDto> {
        ScoringEngine::sample(self, rng, range)
            .into_iter()
            .map(QuestionDto::from)
            .collect()
    }

    fn evaluate(
        &self,
        domain: QuizDomain,
        question_ids: &[String],
        answer_ids: &[Option<String>],
    ) -> Result<Evaluation, EvaluationError> {
        if answer_ids.len() > question_ids.len() {
            return Err(EvaluationError::TooManyAnswers {
                questions: question_ids.len(),
                answers: answer_ids.len(),
            });
        }

        let mut questions: Vec<&Question<D>> = Vec::with_capacity(question_ids.len());
        let mut answers: Vec<Option<&str>> = Vec::with_capacity(question_ids.len());
        let mut seen: HashSet<&str> = HashSet::with_capacity(question_ids.len());
        for (index, question_id) in question_ids.iter().enumerate() {
            let Some(question) = self.question(question_id) else {
                warn!(%domain, question_id = %question_id, "unknown question id; skipping");
                continue;
            };
            // 同じ問題は最初の回答だけ採点する
            if !seen.insert(question.id.as_str()) {
                warn!(%domain, question_id = %question_id, "repeated question id; skipping");
                continue;
            }
            questions.push(question);
            answers.push(answer_ids.get(index).and_then(|a| a.as_deref()));
        }

        let outcome = ScoringEngine::evaluate(self, &questions, &answers);
        let payload = EnrichmentPayload::from_outcome(
            domain.as_str(),
            self.title(),
            self.catalog(),
            &outcome,
        );

        let result = QuizResultDto {
            domain,
            top: outcome.top().map(CandidateDto::from),
            top_three: outcome.top_three().iter().map(CandidateDto::from).collect(),
            ranking: outcome.scored.iter().map(CandidateDto::from).collect(),
            preference: keyed(&outcome.preference.vector),
            dimension_weights: keyed(&outcome.preference.weights),
            asked: questions.len(),
            answered: outcome.preference.answered,
            answer_summary: outcome.answer_summary.iter().map(AnswerSummaryDto::from).collect(),
            top_dimensions: outcome
                .top_dimensions
                .iter()
                .map(|d| d.key().to_string())
                .collect(),
            summary_lines: outcome.summary_lines.clone(),
            insight: outcome.insight.clone(),
            tags: outcome.tags.clone(),
            shares: outcome
                .shares
                .iter()
                .map(|(id, share)| ShareDto {
                    id: id.clone(),
                    share: *share,
                })
                .collect(),
            subtype: outcome.subtype.clone(),
        };

        Ok(Evaluation { result, payload })
    }
}

/// 全領域のエンジン。プロセス内で一度だけ組み立て、以後は読み取り専用。
pub struct QuizRegistry {
    city: ScoringEngine<CityDimension>,
    talent: ScoringEngine<TalentDimension>,
    attachment: ScoringEngine<AttachmentDimension>,
}

static REGISTRY: OnceCell<QuizRegistry> = OnceCell::new();

/// プロセス共有のレジストリ。初回呼び出しで全カタログを検証する。
pub fn registry() -> Result<&'static QuizRegistry, CatalogError> {
    REGISTRY.get_or_try_init(QuizRegistry::load)
}

impl QuizRegistry {
    pub fn load() -> Result<Self, CatalogError> {
        let registry = Self {
            city: ScoringEngine::new(city::definition())?,
            talent: ScoringEngine::new(talent::definition())?,
            attachment: ScoringEngine::new(attachment::definition())?,
        };
        info!(domains = QuizDomain::ALL.len(), "quiz catalogs loaded");
        Ok(registry)
    }

    fn engine(&self, domain: QuizDomain) -> &dyn ErasedQuiz {
        match domain {
            QuizDomain::City => &self.city,
            QuizDomain::Talent => &self.talent,
            QuizDomain::Attachment => &self.attachment,
        }
    }

    pub fn summaries(&self) -> Vec<QuizSummaryDto> {
        QuizDomain::ALL
            .into_iter()
            .map(|domain| self.engine(domain).summary(domain))
            .collect()
    }

    pub fn title(&self, domain: QuizDomain) -> &'static str {
        self.engine(domain).title()
    }

    pub fn sample(
        &self,
        domain: QuizDomain,
        rng: &mut dyn RngCore,
        range: Option<(usize, usize)>,
    ) -> Vec<QuestionDto> {
        self.engine(domain).sample(rng, range)
    }

    /// 問題IDの並びと回答IDの並び（同じ添字）から採点する。
    /// 未知の問題IDは警告して読み飛ばし、その添字の回答も捨てる。
    pub fn evaluate(
        &self,
        domain: QuizDomain,
        question_ids: &[String],
        answer_ids: &[Option<String>],
    ) -> Result<Evaluation, EvaluationError> {
        self.engine(domain).evaluate(domain, question_ids, answer_ids)
    }
}
