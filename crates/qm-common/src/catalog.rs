use std::collections::HashSet;

use thiserror::Error;

use crate::dimension::{Dimension, DimensionMap, DimensionScale, vector};

/// 静的データ（設問バンク・候補カタログ）の不備。起動時に検出して落とす。
#[derive(Debug, Error, PartialEq)]
pub enum CatalogError {
    #[error("question bank is empty")]
    EmptyQuestionBank,
    #[error("duplicate question id: {0}")]
    DuplicateQuestion(String),
    #[error("question {question} has invalid weight {weight}")]
    InvalidWeight { question: String, weight: f64 },
    #[error("question {0} has no options")]
    NoOptions(String),
    #[error("question {question} has duplicate option id {option}")]
    DuplicateOption { question: String, option: String },
    #[error("candidate catalog is empty")]
    EmptyCatalog,
    #[error("duplicate candidate id: {0}")]
    DuplicateCandidate(String),
    #[error("candidate {candidate} is missing dimension {dimension}")]
    MissingDimension {
        candidate: String,
        dimension: &'static str,
    },
    #[error("{owner}: value {value} for {dimension} is outside the declared scale")]
    OutOfScale {
        owner: String,
        dimension: &'static str,
        value: f64,
    },
    #[error("invalid question range {min}..={max}")]
    InvalidQuestionRange { min: usize, max: usize },
}

/// 表示用メタデータ
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DisplayMeta {
    pub summary: String,
    pub tags: Vec<String>,
}

/// 候補プロファイル（都市・才能・アーキタイプなど）。実行時に変更しない。
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateProfile<D: Dimension> {
    pub id: String,
    pub name: String,
    /// 同点時の二次キー（小さいほど優先、人気順など）
    pub priority: u32,
    pub profile: DimensionMap<D>,
    pub meta: DisplayMeta,
}

impl<D: Dimension> CandidateProfile<D> {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        priority: u32,
        pairs: &[(D, f64)],
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            priority,
            profile: vector(pairs),
            meta: DisplayMeta::default(),
        }
    }

    pub fn with_meta(mut self, summary: impl Into<String>, tags: &[&str]) -> Self {
        self.meta = DisplayMeta {
            summary: summary.into(),
            tags: tags.iter().map(|tag| tag.to_string()).collect(),
        };
        self
    }

    pub fn value(&self, dim: D) -> Option<f64> {
        self.profile.get(&dim).copied()
    }
}

/// 検証済みの候補カタログ
#[derive(Debug, Clone)]
pub struct Catalog<D: Dimension> {
    candidates: Vec<CandidateProfile<D>>,
}

impl<D: Dimension> Catalog<D> {
    /// 全候補が全軸を値域内で持つことを確認してから受け入れる
    pub fn load(
        candidates: Vec<CandidateProfile<D>>,
        scale: DimensionScale,
    ) -> Result<Self, CatalogError> {
        if candidates.is_empty() {
            return Err(CatalogError::EmptyCatalog);
        }

        let mut seen = HashSet::new();
        for candidate in &candidates {
            if !seen.insert(candidate.id.as_str()) {
                return Err(CatalogError::DuplicateCandidate(candidate.id.clone()));
            }
            for dim in D::ALL {
                let value = candidate
                    .value(*dim)
                    .ok_or_else(|| CatalogError::MissingDimension {
                        candidate: candidate.id.clone(),
                        dimension: dim.key(),
                    })?;
                if !scale.contains(value) {
                    return Err(CatalogError::OutOfScale {
                        owner: candidate.id.clone(),
                        dimension: dim.key(),
                        value,
                    });
                }
            }
        }

        Ok(Self { candidates })
    }

    pub fn candidates(&self) -> &[CandidateProfile<D>] {
        &self.candidates
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// 名前・ID の一覧（AI 応答の検証に使う正規名セット）
    pub fn legal_names(&self) -> Vec<(String, String)> {
        self.candidates
            .iter()
            .map(|c| (c.id.clone(), c.name.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dimension::test_support::Axis;

    fn full(id: &str, value: f64) -> CandidateProfile<Axis> {
        let pairs: Vec<_> = Axis::ALL.iter().map(|d| (*d, value)).collect();
        CandidateProfile::new(id, id.to_uppercase(), 1, &pairs)
    }

    #[test]
    fn loads_complete_catalog() {
        let catalog =
            Catalog::load(vec![full("a", 3.0), full("b", 7.0)], DimensionScale::ZERO_TO_TEN)
                .unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.legal_names()[1], ("b".to_string(), "B".to_string()));
    }

    #[test]
    fn fails_fast_on_missing_dimension() {
        let mut broken = full("a", 3.0);
        broken.profile.remove(&Axis::H);

        let err = Catalog::load(vec![broken], DimensionScale::ZERO_TO_TEN).unwrap_err();
        assert_eq!(
            err,
            CatalogError::MissingDimension {
                candidate: "a".into(),
                dimension: "h",
            }
        );
    }

    #[test]
    fn rejects_out_of_scale_and_duplicates() {
        assert!(matches!(
            Catalog::load(vec![full("a", 30.0)], DimensionScale::ZERO_TO_TEN),
            Err(CatalogError::OutOfScale { .. })
        ));
        assert!(matches!(
            Catalog::load(vec![full("a", 1.0), full("a", 2.0)], DimensionScale::ZERO_TO_TEN),
            Err(CatalogError::DuplicateCandidate(_))
        ));
        assert_eq!(
            Catalog::<Axis>::load(vec![], DimensionScale::ZERO_TO_TEN).unwrap_err(),
            CatalogError::EmptyCatalog
        );
    }
}
