use std::time::Instant;

use axum::{
    Json,
    extract::{Path, Query, State},
};
use chrono::Utc;
use rand::{SeedableRng, rngs::StdRng};
use tracing::{info, warn};

use qm_common::api::{
    EnrichmentStatus, QuestionQuery, QuestionSetResponse, QuizListResponse, QuizRequest,
    QuizResultResponse,
};
use qm_common::ids::EvaluationId;
use qm_common::{Evaluation, QuizDomain};
use qm_metrics::{record_enrichment, record_evaluation};

use crate::SharedState;
use crate::error::ApiError;

pub async fn list_quizzes(State(state): State<SharedState>) -> Json<QuizListResponse> {
    Json(QuizListResponse {
        quizzes: state.registry.summaries(),
    })
}

/// 出題。`seed` を指定すると同じ並びが再現される
pub async fn sample_questions(
    State(state): State<SharedState>,
    Path(domain): Path<String>,
    Query(query): Query<QuestionQuery>,
) -> Result<Json<QuestionSetResponse>, ApiError> {
    let domain: QuizDomain = domain.parse()?;

    let mut rng = match query.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let questions = state.registry.sample(domain, &mut rng, query.range());

    Ok(Json(QuestionSetResponse {
        domain,
        title: state.registry.title(domain).to_string(),
        questions,
    }))
}

/// 採点してから、要求があれば AI 文面を付ける。AI 側の失敗は結果に影響しない
pub async fn submit_results(
    State(state): State<SharedState>,
    Path(domain): Path<String>,
    Json(request): Json<QuizRequest>,
) -> Result<Json<QuizResultResponse>, ApiError> {
    let domain: QuizDomain = domain.parse()?;

    let started = Instant::now();
    let Evaluation { result, payload } =
        state.registry.evaluate(domain, &request.question_ids, &request.answer_ids)?;
    record_evaluation(domain.as_str(), result.answered, started.elapsed());

    let (enrichment, enrichment_status) = match (&state.enricher, request.enrich) {
        (Some(enricher), true) => {
            match enricher.enrich(&payload, state.config.enrich_deadline).await {
                Ok(narrative) => (Some(narrative), EnrichmentStatus::Applied),
                Err(err) => {
                    warn!(%domain, error = %err, "enrichment failed, returning local result");
                    (None, EnrichmentStatus::Fallback)
                }
            }
        }
        _ => (None, EnrichmentStatus::Skipped),
    };
    record_enrichment(domain.as_str(), enrichment_status.as_str());

    let evaluation_id = EvaluationId::generate();
    info!(
        %domain,
        evaluation_id = %evaluation_id,
        answered = result.answered,
        top = result.top.as_ref().map(|top| top.id.as_str()).unwrap_or(""),
        enrichment = enrichment_status.as_str(),
        "quiz evaluated"
    );

    Ok(Json(QuizResultResponse {
        evaluation_id: evaluation_id.into_inner(),
        generated_at: Utc::now(),
        result,
        enrichment,
        enrichment_status,
    }))
}
