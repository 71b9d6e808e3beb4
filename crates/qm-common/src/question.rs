use std::collections::HashSet;

use crate::{
    catalog::CatalogError,
    dimension::{Dimension, DimensionMap, DimensionScale, vector},
};

/// 回答選択肢。`vector` はすべての軸を網羅しなくてよい（未指定軸は「寄与なし」）。
#[derive(Debug, Clone, PartialEq)]
pub struct AnswerOption<D: Dimension> {
    pub id: String,
    pub label: String,
    pub vector: DimensionMap<D>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Question<D: Dimension> {
    pub id: String,
    pub title: String,
    pub weight: f64,
    pub options: Vec<AnswerOption<D>>,
}

impl<D: Dimension> AnswerOption<D> {
    pub fn new(id: impl Into<String>, label: impl Into<String>, pairs: &[(D, f64)]) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            vector: vector(pairs),
        }
    }
}

impl<D: Dimension> Question<D> {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        weight: f64,
        options: Vec<AnswerOption<D>>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            weight,
            options,
        }
    }

    /// 回答IDから選択肢を引く。未知のIDは `None`（未回答扱い）。
    pub fn option(&self, option_id: &str) -> Option<&AnswerOption<D>> {
        self.options.iter().find(|option| option.id == option_id)
    }
}

/// 設問バンクの静的検証（起動時に一度だけ）
pub fn validate_bank<D: Dimension>(
    questions: &[Question<D>],
    scale: DimensionScale,
) -> Result<(), CatalogError> {
    if questions.is_empty() {
        return Err(CatalogError::EmptyQuestionBank);
    }

    let mut seen = HashSet::new();
    for question in questions {
        if !seen.insert(question.id.as_str()) {
            return Err(CatalogError::DuplicateQuestion(question.id.clone()));
        }
        if !question.weight.is_finite() || question.weight <= 0.0 {
            return Err(CatalogError::InvalidWeight {
                question: question.id.clone(),
                weight: question.weight,
            });
        }
        if question.options.is_empty() {
            return Err(CatalogError::NoOptions(question.id.clone()));
        }

        let mut option_ids = HashSet::new();
        for option in &question.options {
            if !option_ids.insert(option.id.as_str()) {
                return Err(CatalogError::DuplicateOption {
                    question: question.id.clone(),
                    option: option.id.clone(),
                });
            }
            if let Some((dim, value)) = option.vector.iter().find(|(_, v)| !scale.contains(**v)) {
                return Err(CatalogError::OutOfScale {
                    owner: format!("{}/{}", question.id, option.id),
                    dimension: dim.key(),
                    value: *value,
                });
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dimension::test_support::Axis;

    fn question(id: &str, weight: f64) -> Question<Axis> {
        Question::new(
            id,
            "title",
            weight,
            vec![
                AnswerOption::new("x", "X", &[(Axis::A, 8.0)]),
                AnswerOption::new("y", "Y", &[(Axis::B, 2.0)]),
            ],
        )
    }

    #[test]
    fn accepts_well_formed_bank() {
        let bank = vec![question("q1", 1.0), question("q2", 1.2)];
        assert!(validate_bank(&bank, DimensionScale::ZERO_TO_TEN).is_ok());
    }

    #[test]
    fn rejects_duplicate_ids_and_bad_weights() {
        let dup = vec![question("q1", 1.0), question("q1", 1.0)];
        assert!(matches!(
            validate_bank(&dup, DimensionScale::ZERO_TO_TEN),
            Err(CatalogError::DuplicateQuestion(id)) if id == "q1"
        ));

        let zero = vec![question("q1", 0.0)];
        assert!(matches!(
            validate_bank(&zero, DimensionScale::ZERO_TO_TEN),
            Err(CatalogError::InvalidWeight { .. })
        ));
    }

    #[test]
    fn rejects_option_values_outside_scale() {
        let mut q = question("q1", 1.0);
        q.options[0].vector.insert(Axis::C, 12.0);
        let err = validate_bank(&[q], DimensionScale::ZERO_TO_TEN).unwrap_err();
        assert!(err.to_string().contains("q1/x"));
    }

    #[test]
    fn option_lookup_returns_none_for_unknown_id() {
        let q = question("q1", 1.0);
        assert!(q.option("x").is_some());
        assert!(q.option("nope").is_none());
    }
}
