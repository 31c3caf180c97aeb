use crate::infra::{ApiState, AppState};
use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, Path, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use grc_assess::error::AppError;
use grc_assess::workflows::questions::{
    append_questions, generate_template, CampaignId, CommitFailure, CommitSummary, ImportResult,
    QuestionImporter, QuestionRepository, SourceFormat, TEMPLATE_CONTENT_TYPE, TEMPLATE_FILENAME,
};
use grc_assess::workflows::scoring::{
    prioritize_controls, risk_matrix_bands, risk_matrix_level, risk_score_bands, BandTable,
    CampaignOutcome, Control, ControlRisk, MaturityAssessment, MatrixLevel, MatrixRisk,
    QualificationQuestion, QualificationResponse, RiskLevel,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub(crate) struct ControlAssessmentRequest {
    pub(crate) control_id: String,
    pub(crate) maturity_level: i32,
    pub(crate) target_maturity: i32,
    pub(crate) weight: i32,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MaturityScoringRequest {
    pub(crate) controls: Vec<ControlAssessmentRequest>,
}

#[derive(Debug, Serialize)]
pub(crate) struct MaturityScoringResponse {
    pub(crate) controls: Vec<ControlRisk>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CampaignScoringRequest {
    pub(crate) questions: Vec<QualificationQuestion>,
    #[serde(default)]
    pub(crate) responses: Vec<QualificationResponse>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RiskMatrixRequest {
    pub(crate) probability: i32,
    pub(crate) impact: i32,
}

#[derive(Debug, Serialize)]
pub(crate) struct BandsResponse {
    pub(crate) risk_score: &'static BandTable<RiskLevel>,
    pub(crate) risk_matrix: &'static BandTable<MatrixLevel>,
}

#[derive(Debug, Serialize)]
pub(crate) struct CommitView {
    pub(crate) created: usize,
    pub(crate) failed: Vec<CommitFailure>,
    pub(crate) message: String,
}

impl From<CommitSummary> for CommitView {
    fn from(summary: CommitSummary) -> Self {
        let message = summary.message();
        Self {
            created: summary.created,
            failed: summary.failed,
            message,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ImportResponse {
    pub(crate) campaign_id: String,
    pub(crate) import: ImportResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) commit: Option<CommitView>,
}

pub(crate) fn with_assessment_routes<R>(state: Arc<ApiState<R>>) -> Router
where
    R: QuestionRepository + 'static,
{
    assessment_router(state)
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
}

/// Question import and scoring endpoints, without the operational routes.
pub(crate) fn assessment_router<R>(state: Arc<ApiState<R>>) -> Router
where
    R: QuestionRepository + 'static,
{
    let upload_limit = state.import.max_upload_bytes;

    Router::new()
        .route("/api/v1/questions/template", get(template_endpoint))
        .route(
            "/api/v1/questions/import/preview",
            post(import_preview_endpoint::<R>),
        )
        .route(
            "/api/v1/campaigns/:campaign_id/questions/import",
            post(import_questions_endpoint::<R>),
        )
        .route("/api/v1/scoring/maturity", post(maturity_scoring_endpoint))
        .route(
            "/api/v1/scoring/campaign",
            post(campaign_scoring_endpoint::<R>),
        )
        .route("/api/v1/scoring/risk-matrix", post(risk_matrix_endpoint))
        .route("/api/v1/classification/bands", get(bands_endpoint))
        .layer(DefaultBodyLimit::max(upload_limit))
        .with_state(state)
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn template_endpoint() -> Result<Response, AppError> {
    let body = generate_template()?;
    let disposition = format!("attachment; filename=\"{TEMPLATE_FILENAME}\"");
    let disposition = HeaderValue::from_str(&disposition)
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"));

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, HeaderValue::from_static(TEMPLATE_CONTENT_TYPE)),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response())
}

fn upload_format(headers: &HeaderMap) -> SourceFormat {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(SourceFormat::from_content_type)
        .unwrap_or(SourceFormat::Csv)
}

fn parse_upload<R>(
    state: &ApiState<R>,
    headers: &HeaderMap,
    body: Bytes,
) -> Result<ImportResult, AppError> {
    let format = upload_format(headers);
    let result = QuestionImporter::from_upload(body.to_vec(), format, &state.import)?;
    Ok(result)
}

pub(crate) async fn import_preview_endpoint<R>(
    State(state): State<Arc<ApiState<R>>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<ImportResult>, AppError>
where
    R: QuestionRepository + 'static,
{
    parse_upload(&state, &headers, body).map(Json)
}

/// Commits only fully valid files; any invalid row blocks the whole commit.
pub(crate) async fn import_questions_endpoint<R>(
    State(state): State<Arc<ApiState<R>>>,
    Path(campaign_id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, AppError>
where
    R: QuestionRepository + 'static,
{
    let import = parse_upload(&state, &headers, body)?;

    if !import.is_clean() {
        tracing::info!(
            campaign = %campaign_id,
            invalid = import.invalid_count,
            "question import blocked by invalid rows"
        );
        let response = ImportResponse {
            campaign_id,
            import,
            commit: None,
        };
        return Ok((StatusCode::UNPROCESSABLE_ENTITY, Json(response)).into_response());
    }

    let campaign = CampaignId(campaign_id);
    let summary = append_questions(state.repository.as_ref(), &campaign, &import).await?;
    let status = if summary.is_complete() {
        StatusCode::CREATED
    } else {
        StatusCode::MULTI_STATUS
    };

    let response = ImportResponse {
        campaign_id: campaign.0,
        import,
        commit: Some(summary.into()),
    };
    Ok((status, Json(response)).into_response())
}

pub(crate) async fn maturity_scoring_endpoint(
    Json(payload): Json<MaturityScoringRequest>,
) -> Result<Json<MaturityScoringResponse>, AppError> {
    let pairs: Vec<(MaturityAssessment, Control)> = payload
        .controls
        .into_iter()
        .map(|control| {
            (
                MaturityAssessment {
                    control_id: control.control_id.clone(),
                    maturity_level: control.maturity_level,
                    target_maturity: control.target_maturity,
                },
                Control {
                    id: control.control_id,
                    weight: control.weight,
                },
            )
        })
        .collect();

    let controls = prioritize_controls(&pairs)?;
    Ok(Json(MaturityScoringResponse { controls }))
}

pub(crate) async fn campaign_scoring_endpoint<R>(
    State(state): State<Arc<ApiState<R>>>,
    Json(payload): Json<CampaignScoringRequest>,
) -> Result<Json<CampaignOutcome>, AppError>
where
    R: QuestionRepository + 'static,
{
    let outcome = state
        .evaluator
        .evaluate(&payload.questions, &payload.responses)?;
    Ok(Json(outcome))
}

pub(crate) async fn risk_matrix_endpoint(
    Json(payload): Json<RiskMatrixRequest>,
) -> Result<Json<MatrixRisk>, AppError> {
    let risk = risk_matrix_level(payload.probability, payload.impact)?;
    Ok(Json(risk))
}

pub(crate) async fn bands_endpoint() -> Json<BandsResponse> {
    Json(BandsResponse {
        risk_score: risk_score_bands(),
        risk_matrix: risk_matrix_bands(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::InMemoryQuestionRepository;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use grc_assess::config::ImportConfig;
    use grc_assess::workflows::scoring::CampaignEvaluator;
    use serde_json::Value;
    use tower::ServiceExt;

    fn test_state(max_upload_bytes: usize) -> Arc<ApiState<InMemoryQuestionRepository>> {
        Arc::new(ApiState {
            repository: Arc::new(InMemoryQuestionRepository::default()),
            import: ImportConfig { max_upload_bytes },
            evaluator: CampaignEvaluator::new(70),
        })
    }

    async fn send(router: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = router.oneshot(request).await.expect("router responds");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body reads");
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    fn csv_upload(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "text/csv")
            .body(Body::from(body.to_string()))
            .expect("request builds")
    }

    fn json_post(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request builds")
    }

    #[tokio::test]
    async fn template_is_served_as_attachment() {
        let response = template_endpoint().await.expect("template renders");
        assert_eq!(response.status(), StatusCode::OK);
        let disposition = response
            .headers()
            .get(header::CONTENT_DISPOSITION)
            .and_then(|value| value.to_str().ok())
            .expect("disposition header");
        assert!(disposition.contains(TEMPLATE_FILENAME));
    }

    #[tokio::test]
    async fn preview_reports_row_errors_without_committing() {
        let state = test_state(1024);
        let router = assessment_router(state.clone());
        let (status, body) = send(
            router,
            csv_upload(
                "/api/v1/questions/import/preview",
                "pergunta;tipo;peso\nQ1;texto;10\nQ2;múltipla escolha;200\n",
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["valid_count"], 1);
        assert_eq!(body["invalid_count"], 1);
        assert_eq!(body["questions"][1]["row_number"], 3);
        assert_eq!(
            state
                .repository
                .count(&CampaignId("any".to_string()))
                .await
                .expect("counts"),
            0
        );
    }

    #[tokio::test]
    async fn import_commits_clean_files_after_existing_questions() {
        let state = test_state(1024);
        let csv = "pergunta;tipo\nQ1;text\nQ2;number\n";

        let (status, body) = send(
            assessment_router(state.clone()),
            csv_upload("/api/v1/campaigns/camp-1/questions/import", csv),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["commit"]["created"], 2);
        assert_eq!(body["commit"]["message"], "2 question(s) created");

        let (status, _) = send(
            assessment_router(state.clone()),
            csv_upload("/api/v1/campaigns/camp-1/questions/import", csv),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let stored = state.repository.questions(&CampaignId("camp-1".to_string()));
        let order: Vec<_> = stored
            .iter()
            .map(|stored| stored.question.order_index)
            .collect();
        assert_eq!(order, vec![0, 1, 2, 3]);
    }

    #[tokio::test]
    async fn import_with_invalid_rows_is_rejected_before_commit() {
        let state = test_state(1024);
        let (status, body) = send(
            assessment_router(state.clone()),
            csv_upload(
                "/api/v1/campaigns/camp-2/questions/import",
                "pergunta;tipo\nQ1;text\n;text\n",
            ),
        )
        .await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body.get("commit").is_none());
        assert_eq!(body["import"]["invalid_count"], 1);
        assert!(state
            .repository
            .questions(&CampaignId("camp-2".to_string()))
            .is_empty());
    }

    #[tokio::test]
    async fn structural_errors_and_oversized_uploads_are_rejected() {
        let (status, body) = send(
            assessment_router(test_state(1024)),
            csv_upload("/api/v1/questions/import/preview", "tipo;peso\ntext;10\n"),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"]
            .as_str()
            .expect("error message")
            .contains("pergunta"));

        let (status, _) = send(
            assessment_router(test_state(16)),
            csv_upload(
                "/api/v1/questions/import/preview",
                "pergunta\nthis body is longer than sixteen bytes\n",
            ),
        )
        .await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn maturity_scoring_ranks_controls() {
        let Json(body) = maturity_scoring_endpoint(Json(MaturityScoringRequest {
            controls: vec![
                ControlAssessmentRequest {
                    control_id: "AC-02".to_string(),
                    maturity_level: 3,
                    target_maturity: 4,
                    weight: 1,
                },
                ControlAssessmentRequest {
                    control_id: "AC-01".to_string(),
                    maturity_level: 1,
                    target_maturity: 4,
                    weight: 3,
                },
            ],
        }))
        .await
        .expect("scores");

        assert_eq!(body.controls[0].control_id, "AC-01");
        assert_eq!(body.controls[0].score, 9);
        assert_eq!(body.controls[0].level, RiskLevel::High);
        assert_eq!(body.controls[1].level, RiskLevel::Low);
    }

    #[tokio::test]
    async fn out_of_scale_inputs_map_to_unprocessable_entity() {
        let (status, body) = send(
            assessment_router(test_state(1024)),
            json_post(
                "/api/v1/scoring/maturity",
                json!({ "controls": [{ "control_id": "AC-01", "maturity_level": 7, "target_maturity": 4, "weight": 2 }] }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["error"].as_str().expect("message").contains("maturity"));

        let (status, _) = send(
            assessment_router(test_state(1024)),
            json_post(
                "/api/v1/scoring/risk-matrix",
                json!({ "probability": 6, "impact": 1 }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn campaign_scoring_applies_knockout_and_threshold() {
        let (status, body) = send(
            assessment_router(test_state(1024)),
            json_post(
                "/api/v1/scoring/campaign",
                json!({
                    "questions": [
                        { "id": "q1", "weight": 10.0 },
                        { "id": "iso", "weight": 10.0, "is_ko": true, "ko_value": "Não" }
                    ],
                    "responses": [
                        { "question_id": "q1", "answer": "Sim", "score_awarded": 10.0 },
                        { "question_id": "iso", "answer": "não", "score_awarded": 0.0 }
                    ]
                }),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["score"], 50);
        assert_eq!(body["ko_triggered"], true);
        assert_eq!(body["verdict"], "disqualified");
        assert_eq!(body["pass_threshold"], 70);
        assert_eq!(body["compliant"], false);
    }

    #[tokio::test]
    async fn risk_matrix_and_bands_are_exposed() {
        let Json(risk) = risk_matrix_endpoint(Json(RiskMatrixRequest {
            probability: 3,
            impact: 4,
        }))
        .await
        .expect("classifies");
        assert_eq!(risk.score, 12);
        assert_eq!(risk.level, MatrixLevel::Medium);

        let (status, body) = send(
            assessment_router(test_state(1024)),
            Request::builder()
                .uri("/api/v1/classification/bands")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["risk_score"]["domain_min"], -15);
        assert_eq!(body["risk_score"]["bands"][2]["level"], "HIGH");
        assert!(body["risk_matrix"]["bands"][4]["max"].is_null());
    }

    #[tokio::test]
    async fn healthcheck_reports_ok() {
        let Json(body) = healthcheck().await;
        assert_eq!(body["status"], "ok");
    }
}
