use serde::Deserialize;

/// 出題リクエストのクエリ (`?min=&max=&seed=`)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QuestionQuery {
    #[serde(default)]
    pub min: Option<usize>,
    #[serde(default)]
    pub max: Option<usize>,
    /// 指定時は同じ出題セットを再現する
    #[serde(default)]
    pub seed: Option<u64>,
}

impl QuestionQuery {
    /// 片側だけ指定された場合はもう片側に揃える
    pub fn range(&self) -> Option<(usize, usize)> {
        match (self.min, self.max) {
            (None, None) => None,
            (Some(min), None) => Some((min, min)),
            (None, Some(max)) => Some((max, max)),
            (Some(min), Some(max)) => Some((min, max)),
        }
    }
}

/// 採点リクエスト。`answer_ids[i]` は `question_ids[i]` への回答（null は未回答）。
#[derive(Debug, Clone, Deserialize)]
pub struct QuizRequest {
    pub question_ids: Vec<String>,
    #[serde(default)]
    pub answer_ids: Vec<Option<String>>,
    #[serde(default)]
    pub enrich: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_defaults_missing_fields() {
        let req: QuizRequest = serde_json::from_str(r#"{"question_ids":["q1","q2"]}"#).unwrap();
        assert_eq!(req.question_ids.len(), 2);
        assert!(req.answer_ids.is_empty());
        assert!(!req.enrich);
    }

    #[test]
    fn request_accepts_null_answers() {
        let req: QuizRequest = serde_json::from_str(
            r#"{"question_ids":["q1","q2"],"answer_ids":["a",null],"enrich":true}"#,
        )
        .unwrap();
        assert_eq!(req.answer_ids, vec![Some("a".to_string()), None]);
        assert!(req.enrich);
    }

    #[test]
    fn query_range_fills_missing_bound() {
        let query = QuestionQuery {
            min: Some(4),
            ..Default::default()
        };
        assert_eq!(query.range(), Some((4, 4)));
        assert_eq!(QuestionQuery::default().range(), None);
    }
}
