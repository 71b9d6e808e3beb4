//! AI 文面生成の入出力境界
//!
//! LLM に渡すデータ (`EnrichmentPayload`) と、戻ってきた応答の検証
//! (`validate_narrative`) をここに集める。応答は信頼しない。候補名は
//! すべてカタログの正規名に解決できなければ不合格とし、呼び出し側は
//! ローカル結果だけを返す。

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    api::AnswerSummaryDto,
    catalog::Catalog,
    dimension::{Dimension, keyed},
    matching::QuizOutcome,
};

pub const MAX_NARRATIVE_CHARS: usize = 1200;
pub const MAX_HIGHLIGHTS: usize = 5;
pub const MAX_HIGHLIGHT_CHARS: usize = 200;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LegalName {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PayloadCandidate {
    pub id: String,
    pub name: String,
    pub score: f64,
}

/// LLM に渡すデータ一式
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EnrichmentPayload {
    pub domain: String,
    pub quiz_title: String,
    pub top_three: Vec<PayloadCandidate>,
    pub preference: BTreeMap<String, f64>,
    pub top_dimensions: Vec<String>,
    pub answer_summary: Vec<AnswerSummaryDto>,
    pub local_insight: String,
    /// 応答中で使ってよい候補名
    pub legal_names: Vec<LegalName>,
}

impl EnrichmentPayload {
    pub fn from_outcome<D: Dimension>(
        domain: &str,
        quiz_title: &str,
        catalog: &Catalog<D>,
        outcome: &QuizOutcome<'_, D>,
    ) -> Self {
        Self {
            domain: domain.to_string(),
            quiz_title: quiz_title.to_string(),
            top_three: outcome
                .top_three()
                .iter()
                .map(|s| PayloadCandidate {
                    id: s.candidate.id.clone(),
                    name: s.candidate.name.clone(),
                    score: s.score,
                })
                .collect(),
            preference: keyed(&outcome.preference.vector),
            top_dimensions: outcome
                .top_dimensions
                .iter()
                .map(|d| d.key().to_string())
                .collect(),
            answer_summary: outcome.answer_summary.iter().map(AnswerSummaryDto::from).collect(),
            local_insight: outcome.insight.clone(),
            legal_names: catalog
                .legal_names()
                .into_iter()
                .map(|(id, name)| LegalName { id, name })
                .collect(),
        }
    }

    /// ユーザーメッセージ本文（JSON）
    pub fn to_prompt(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// LLM が返すべき JSON の形
#[derive(Debug, Clone, Deserialize)]
pub struct RawNarrative {
    pub narrative: String,
    #[serde(default)]
    pub top_pick: Option<String>,
    #[serde(default)]
    pub mentioned: Vec<String>,
    #[serde(default)]
    pub highlights: Vec<String>,
}

/// 検証済みの AI 文面。候補名はすべて正規名。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EnrichedNarrative {
    pub narrative: String,
    pub top_pick: Option<String>,
    pub mentioned: Vec<String>,
    pub highlights: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("response is not valid narrative JSON: {0}")]
    Malformed(String),
    #[error("narrative is empty")]
    EmptyNarrative,
    #[error("response references unknown candidate {0:?}")]
    UnknownCandidate(String),
}

/// 応答を囲むマークダウンのコードフェンスを外す
fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

fn normalize_name(value: &str) -> String {
    value
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

fn resolve_name<'a>(value: &str, legal_names: &'a [LegalName]) -> Result<&'a str, ValidationError> {
    let wanted = normalize_name(value);
    legal_names
        .iter()
        .find(|legal| normalize_name(&legal.id) == wanted || normalize_name(&legal.name) == wanted)
        .map(|legal| legal.name.as_str())
        .ok_or_else(|| ValidationError::UnknownCandidate(value.to_string()))
}

fn truncate_chars(value: &str, max: usize) -> String {
    let value = value.trim();
    if value.chars().count() <= max {
        return value.to_string();
    }
    let mut cut: String = value.chars().take(max.saturating_sub(3)).collect();
    cut.push_str("...");
    cut
}

/// LLM 応答を検証して正規化する
pub fn validate_narrative(
    content: &str,
    legal_names: &[LegalName],
) -> Result<EnrichedNarrative, ValidationError> {
    let raw: RawNarrative = serde_json::from_str(strip_code_fence(content))
        .map_err(|err| ValidationError::Malformed(err.to_string()))?;

    if raw.narrative.trim().is_empty() {
        return Err(ValidationError::EmptyNarrative);
    }

    let top_pick = raw
        .top_pick
        .as_deref()
        .filter(|name| !name.trim().is_empty())
        .map(|name| resolve_name(name, legal_names).map(str::to_string))
        .transpose()?;

    let mut mentioned: Vec<String> = Vec::new();
    for name in raw.mentioned.iter().filter(|name| !name.trim().is_empty()) {
        let canonical = resolve_name(name, legal_names)?;
        if !mentioned.iter().any(|seen| seen == canonical) {
            mentioned.push(canonical.to_string());
        }
    }

    let highlights = raw
        .highlights
        .iter()
        .filter(|h| !h.trim().is_empty())
        .take(MAX_HIGHLIGHTS)
        .map(|h| truncate_chars(h, MAX_HIGHLIGHT_CHARS))
        .collect();

    Ok(EnrichedNarrative {
        narrative: truncate_chars(&raw.narrative, MAX_NARRATIVE_CHARS),
        top_pick,
        mentioned,
        highlights,
        model: None,
    })
}
