//! HTTP API v1, one endpoint group per assistant.
//!
//! Endpoints:
//!
//! - `GET    /v1/agents`                        - Registered agents
//! - `POST   /v1/code-review`                   - Review one source file
//! - `POST   /v1/support`                       - Answer a customer query
//! - `POST   /v1/news`                          - News digest for a topic
//! - `POST   /v1/study`                         - Study plan from a topic or PDF notes
//! - `POST   /v1/travel/sessions`               - Start a travel session
//! - `GET    /v1/travel/sessions/{id}`          - Trip summary, plan and Q&A history
//! - `POST   /v1/travel/sessions/{id}/plan`     - Plan (or re-plan) the trip
//! - `POST   /v1/travel/sessions/{id}/questions` - Ask a follow-up question
//! - `DELETE /v1/travel/sessions/{id}`          - End the session

use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use relaydesk_agent::document::{self, DocumentFormat};
use relaydesk_agent::session::{QnaPair, SessionId, SharedSession};
use relaydesk_agent::{CodeReview, NewsDigest, StudyPlan, StudyRequest, SupportReply, TripPlan, TripRequest};
use relaydesk_core::error::{Error, ProviderError, ValidationError};

use crate::SharedState;

// ── Router ────────────────────────────────────────────────────────────────

/// Build the v1 API router. Nest this under "/v1" in the main router.
pub fn v1_router(state: SharedState) -> Router {
    Router::new()
        .route("/agents", get(list_agents_handler))
        .route("/code-review", post(code_review_handler))
        .route("/support", post(support_handler))
        .route("/news", post(news_handler))
        .route("/study", post(study_handler))
        .route("/travel/sessions", post(create_session_handler))
        .route(
            "/travel/sessions/{id}",
            get(get_session_handler).delete(end_session_handler),
        )
        .route("/travel/sessions/{id}/plan", post(plan_trip_handler))
        .route("/travel/sessions/{id}/questions", post(ask_question_handler))
        .with_state(state)
}

// ── Errors ────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Everything a handler can fail with.
#[derive(Debug)]
pub enum ApiError {
    Domain(Error),
    SessionNotFound(String),
    BadRequest(String),
}

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        ApiError::Domain(e)
    }
}

impl From<ValidationError> for ApiError {
    fn from(e: ValidationError) -> Self {
        ApiError::Domain(e.into())
    }
}

/// HTTP status for a domain error.
fn status_for(error: &Error) -> StatusCode {
    match error {
        Error::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        Error::Document(_) => StatusCode::BAD_REQUEST,
        Error::Provider(e) | Error::Stage { source: e, .. } => match e {
            ProviderError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            ProviderError::InvalidRequest(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_GATEWAY,
        },
        Error::Pipeline(_) | Error::Registry(_) | Error::Config { .. } | Error::Serialization(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Domain(e) => {
                let status = status_for(&e);
                if status.is_server_error() {
                    warn!(status = status.as_u16(), error = %e, "Request failed");
                }
                (status, e.to_string())
            }
            ApiError::SessionNotFound(id) => {
                (StatusCode::NOT_FOUND, format!("Session '{id}' not found"))
            }
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
        };
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

fn decode_base64(field: &str, data: &str) -> Result<Vec<u8>, ApiError> {
    BASE64
        .decode(data.trim())
        .map_err(|e| ApiError::BadRequest(format!("{field} is not valid base64: {e}")))
}

// ── Agents ────────────────────────────────────────────────────────────────

#[derive(Serialize, Deserialize)]
pub struct AgentDto {
    pub name: String,
    pub instructions: String,
}

#[derive(Serialize, Deserialize)]
pub struct AgentListResponse {
    pub agents: Vec<AgentDto>,
    pub count: usize,
}

async fn list_agents_handler(State(state): State<SharedState>) -> Json<AgentListResponse> {
    let agents: Vec<AgentDto> = state
        .assistants
        .registry()
        .iter()
        .map(|a| AgentDto {
            name: a.name().to_string(),
            instructions: a.instructions().to_string(),
        })
        .collect();
    let count = agents.len();
    Json(AgentListResponse { agents, count })
}

// ── Code review ───────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct CodeReviewRequest {
    pub filename: String,
    /// Source text.
    #[serde(default)]
    pub content: Option<String>,
    /// Raw file bytes, base64-encoded; checked for UTF-8.
    #[serde(default)]
    pub content_base64: Option<String>,
}

async fn code_review_handler(
    State(state): State<SharedState>,
    Json(payload): Json<CodeReviewRequest>,
) -> ApiResult<CodeReview> {
    info!(filename = %payload.filename, "v1/code-review request");

    let bytes = match (payload.content, payload.content_base64) {
        (Some(text), _) => text.into_bytes(),
        (None, Some(encoded)) => decode_base64("content_base64", &encoded)?,
        (None, None) => return Err(ValidationError::MissingField("content").into()),
    };

    let review = state
        .assistants
        .code_review
        .review_file(&state.client, &payload.filename, bytes)
        .await?;
    Ok(Json(review))
}

// ── Support ───────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct SupportRequest {
    pub query: String,
}

async fn support_handler(
    State(state): State<SharedState>,
    Json(payload): Json<SupportRequest>,
) -> ApiResult<SupportReply> {
    info!(query_len = payload.query.len(), "v1/support request");
    let reply = state
        .assistants
        .support
        .handle(&state.client, &payload.query)
        .await?;
    Ok(Json(reply))
}

// ── News ──────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct NewsRequest {
    pub topic: String,
}

async fn news_handler(
    State(state): State<SharedState>,
    Json(payload): Json<NewsRequest>,
) -> ApiResult<NewsDigest> {
    info!(topic = %payload.topic, "v1/news request");
    let digest = state
        .assistants
        .news
        .digest(&state.client, &payload.topic)
        .await?;
    Ok(Json(digest))
}

// ── Study ─────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct StudyHttpRequest {
    #[serde(default)]
    pub topic: Option<String>,
    /// Defaults to today.
    #[serde(default)]
    pub deadline: Option<NaiveDate>,
    /// PDF notes, base64-encoded.
    #[serde(default)]
    pub pdf_base64: Option<String>,
}

async fn study_handler(
    State(state): State<SharedState>,
    Json(payload): Json<StudyHttpRequest>,
) -> ApiResult<StudyPlan> {
    info!(has_pdf = payload.pdf_base64.is_some(), "v1/study request");

    let notes = match payload.pdf_base64.as_deref() {
        Some(encoded) => {
            let bytes = decode_base64("pdf_base64", encoded)?;
            let text = document::extract_text_blocking(bytes, DocumentFormat::Pdf)
                .await
                .map_err(Error::from)?;
            Some(text)
        }
        None => None,
    };

    let request = StudyRequest {
        topic: payload.topic,
        notes,
        deadline: payload.deadline,
    };
    let plan = state.assistants.study.plan(&state.client, request).await?;
    Ok(Json(plan))
}

// ── Travel sessions ───────────────────────────────────────────────────────

#[derive(Serialize, Deserialize)]
pub struct CreateSessionResponse {
    pub id: String,
}

#[derive(Serialize, Deserialize)]
pub struct SessionResponse {
    pub id: String,
    pub trip_summary: Option<String>,
    pub plan: Option<TripPlan>,
    pub qna_history: Vec<QnaPair>,
    pub created_at: String,
}

#[derive(Deserialize)]
pub struct QuestionRequest {
    pub question: String,
}

#[derive(Serialize, Deserialize)]
pub struct AnswerResponse {
    pub question: String,
    pub answer: String,
    pub qna_history: Vec<QnaPair>,
}

async fn find_session(state: &SharedState, id: &str) -> Result<SharedSession, ApiError> {
    let parsed: SessionId = id
        .parse()
        .map_err(|_| ApiError::SessionNotFound(id.to_string()))?;
    state
        .sessions
        .get(&parsed)
        .await
        .ok_or_else(|| ApiError::SessionNotFound(id.to_string()))
}

async fn create_session_handler(
    State(state): State<SharedState>,
) -> (StatusCode, Json<CreateSessionResponse>) {
    let id = state.sessions.create().await;
    info!(session = %id, "v1/travel session created");
    (
        StatusCode::CREATED,
        Json(CreateSessionResponse { id: id.to_string() }),
    )
}

async fn get_session_handler(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> ApiResult<SessionResponse> {
    let session = find_session(&state, &id).await?;
    let ctx = session.lock().await;
    Ok(Json(SessionResponse {
        id: ctx.id.to_string(),
        trip_summary: ctx.trip_summary.clone(),
        plan: ctx.plan.clone(),
        qna_history: ctx.qna_history.clone(),
        created_at: ctx.created_at.to_rfc3339(),
    }))
}

async fn end_session_handler(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let parsed: SessionId = id
        .parse()
        .map_err(|_| ApiError::SessionNotFound(id.clone()))?;
    if state.sessions.end(&parsed).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::SessionNotFound(id))
    }
}

async fn plan_trip_handler(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(payload): Json<TripRequest>,
) -> ApiResult<TripPlan> {
    let session = find_session(&state, &id).await?;
    let mut ctx = session.lock().await;
    let plan = state
        .assistants
        .travel
        .plan(&state.client, &mut ctx, &payload)
        .await?;
    Ok(Json(plan))
}

async fn ask_question_handler(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(payload): Json<QuestionRequest>,
) -> ApiResult<AnswerResponse> {
    let session = find_session(&state, &id).await?;
    let mut ctx = session.lock().await;
    let answer = state
        .assistants
        .travel
        .ask(&state.client, &mut ctx, &payload.question)
        .await?;
    Ok(Json(AnswerResponse {
        question: payload.question,
        answer,
        qna_history: ctx.qna_history.clone(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GatewayState;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tower::ServiceExt;

    use relaydesk_agent::CompletionClient;
    use relaydesk_config::AppConfig;
    use relaydesk_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};

    /// Lightweight mock provider for gateway tests.
    struct MockProvider {
        response: Result<String, ProviderError>,
        calls: AtomicUsize,
    }

    impl MockProvider {
        fn new(text: &str) -> Self {
            Self {
                response: Ok(text.to_string()),
                calls: AtomicUsize::new(0),
            }
        }

        fn failing(error: ProviderError) -> Self {
            Self {
                response: Err(error),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait::async_trait]
    impl Provider for MockProvider {
        fn name(&self) -> &str {
            "gateway_mock"
        }

        async fn complete(
            &self,
            _request: ProviderRequest,
        ) -> Result<ProviderResponse, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let text = self.response.clone()?;
            Ok(ProviderResponse {
                message: relaydesk_core::message::Message::assistant(text),
                usage: Some(Usage {
                    prompt_tokens: 10,
                    completion_tokens: 5,
                    total_tokens: 15,
                }),
                model: "mock-model".into(),
            })
        }
    }

    fn test_state(provider: Arc<MockProvider>) -> SharedState {
        let client = CompletionClient::new(provider, "mock-model");
        Arc::new(GatewayState::new(AppConfig::default(), client).unwrap())
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(response: Response) -> serde_json::Value {
        let body = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn list_agents() {
        let app = v1_router(test_state(Arc::new(MockProvider::new("unused"))));

        let req = Request::builder().uri("/agents").body(Body::empty()).unwrap();
        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let list: AgentListResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(list.count, 15);
        assert!(list.agents.iter().any(|a| a.name == "Inquiry Agent"));
    }

    #[tokio::test]
    async fn support_faq_hit_makes_no_model_call() {
        let provider = Arc::new(MockProvider::new("unused"));
        let app = v1_router(test_state(provider.clone()));

        let response = app
            .oneshot(post_json("/support", serde_json::json!({"query": "Iphone Availability"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = json_body(response).await;
        assert_eq!(json["answer"], "Haan, iPhone currently stock mein available hai.");
        assert_eq!(json["model_calls"], 0);
        assert_eq!(json["path"], serde_json::json!(["faq_direct"]));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn blank_support_query_is_unprocessable() {
        let app = v1_router(test_state(Arc::new(MockProvider::new("unused"))));
        let response = app
            .oneshot(post_json("/support", serde_json::json!({"query": "  "})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn code_review_runs_three_stages() {
        let provider = Arc::new(MockProvider::new("reviewed"));
        let app = v1_router(test_state(provider.clone()));

        let response = app
            .oneshot(post_json(
                "/code-review",
                serde_json::json!({"filename": "main.go", "content": "package main"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = json_body(response).await;
        assert_eq!(json["analysis"], "reviewed");
        assert_eq!(json["documentation"], "reviewed");
        assert_eq!(provider.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn code_review_rejects_unknown_file_types_and_bad_utf8() {
        let state = test_state(Arc::new(MockProvider::new("unused")));

        let response = v1_router(state.clone())
            .oneshot(post_json(
                "/code-review",
                serde_json::json!({"filename": "notes.txt", "content": "hello"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let invalid_utf8 = BASE64.encode([0xffu8, 0xfe, 0xfd]);
        let response = v1_router(state)
            .oneshot(post_json(
                "/code-review",
                serde_json::json!({"filename": "x.rs", "content_base64": invalid_utf8}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn provider_timeout_maps_to_gateway_timeout() {
        let provider = Arc::new(MockProvider::failing(ProviderError::Timeout {
            agent: "Search Agent".into(),
            timeout_secs: 120,
        }));
        let app = v1_router(test_state(provider));

        let response = app
            .oneshot(post_json("/news", serde_json::json!({"topic": "AI"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
    }

    #[tokio::test]
    async fn unreachable_provider_maps_to_bad_gateway() {
        let provider = Arc::new(MockProvider::failing(ProviderError::Network("refused".into())));
        let app = v1_router(test_state(provider.clone()));

        let response = app
            .oneshot(post_json("/news", serde_json::json!({"topic": "AI"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let json = json_body(response).await;
        assert!(json["error"].as_str().unwrap().contains("search"));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn study_requires_topic_or_pdf() {
        let app = v1_router(test_state(Arc::new(MockProvider::new("unused"))));
        let response = app
            .oneshot(post_json("/study", serde_json::json!({"deadline": "2026-12-01"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn study_rejects_non_pdf_upload() {
        let app = v1_router(test_state(Arc::new(MockProvider::new("unused"))));
        let response = app
            .oneshot(post_json(
                "/study",
                serde_json::json!({"pdf_base64": BASE64.encode(b"plain text")}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let app = v1_router(test_state(Arc::new(MockProvider::new("unused"))));
        let response = app
            .oneshot(post_json("/study", serde_json::json!({"pdf_base64": "@@not base64@@"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn study_topic_returns_plan_and_links() {
        let provider = Arc::new(MockProvider::new("See [Kaggle](https://kaggle.com/learn)"));
        let app = v1_router(test_state(provider));

        let response = app
            .oneshot(post_json(
                "/study",
                serde_json::json!({"topic": "Statistics", "deadline": "2026-12-01"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = json_body(response).await;
        assert_eq!(json["source"], "topic");
        assert_eq!(json["deadline"], "2026-12-01");
        assert_eq!(json["resources"][0]["url"], "https://kaggle.com/learn");
    }

    #[tokio::test]
    async fn travel_session_flow() {
        let provider = Arc::new(MockProvider::new("Sounds great"));
        let state = test_state(provider.clone());

        // Create
        let response = v1_router(state.clone())
            .oneshot(post_json("/travel/sessions", serde_json::json!({})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let id = json_body(response).await["id"].as_str().unwrap().to_string();

        // Asking before planning is a validation error
        let response = v1_router(state.clone())
            .oneshot(post_json(
                &format!("/travel/sessions/{id}/questions"),
                serde_json::json!({"question": "Weather?"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        // Plan
        let response = v1_router(state.clone())
            .oneshot(post_json(
                &format!("/travel/sessions/{id}/plan"),
                serde_json::json!({
                    "country": "Pakistan",
                    "cities": "lahore, hunza",
                    "travel_type": "family",
                    "duration_days": 6,
                    "budget_usd": 1500
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let plan = json_body(response).await;
        assert_eq!(plan["trip"]["cities"], serde_json::json!(["Lahore", "Hunza"]));
        assert_eq!(plan["trip"]["group_size"], 4);

        // Three questions, three pairs in order
        for q in ["Best food?", "Safe at night?", "Local SIM?"] {
            let response = v1_router(state.clone())
                .oneshot(post_json(
                    &format!("/travel/sessions/{id}/questions"),
                    serde_json::json!({"question": q}),
                ))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }

        let req = Request::builder()
            .uri(format!("/travel/sessions/{id}"))
            .body(Body::empty())
            .unwrap();
        let response = v1_router(state.clone()).oneshot(req).await.unwrap();
        let session = json_body(response).await;
        let questions: Vec<&str> = session["qna_history"]
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["question"].as_str().unwrap())
            .collect();
        assert_eq!(questions, vec!["Best food?", "Safe at night?", "Local SIM?"]);
        assert!(session["trip_summary"].as_str().unwrap().starts_with("Country: Pakistan"));
        // 2 planning stages + 3 answers
        assert_eq!(provider.calls.load(Ordering::SeqCst), 5);

        // End
        let req = Request::builder()
            .method("DELETE")
            .uri(format!("/travel/sessions/{id}"))
            .body(Body::empty())
            .unwrap();
        let response = v1_router(state.clone()).oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let req = Request::builder()
            .uri(format!("/travel/sessions/{id}"))
            .body(Body::empty())
            .unwrap();
        let response = v1_router(state).oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn question_is_echoed_and_stored_verbatim() {
        let state = test_state(Arc::new(MockProvider::new("Try the local market")));
        let id = state.sessions.create().await;

        let response = v1_router(state.clone())
            .oneshot(post_json(
                &format!("/travel/sessions/{id}/plan"),
                serde_json::json!({"country": "Turkey", "cities": "istanbul"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let question = "  Where to eat?  ";
        let response = v1_router(state)
            .oneshot(post_json(
                &format!("/travel/sessions/{id}/questions"),
                serde_json::json!({"question": question}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = json_body(response).await;
        assert_eq!(json["question"], question);
        assert_eq!(json["qna_history"][0]["question"], question);
        assert_eq!(json["answer"], "Try the local market");
    }

    #[tokio::test]
    async fn invalid_trip_is_unprocessable() {
        let state = test_state(Arc::new(MockProvider::new("unused")));
        let id = state.sessions.create().await;

        let response = v1_router(state)
            .oneshot(post_json(
                &format!("/travel/sessions/{id}/plan"),
                serde_json::json!({"country": "", "cities": "Paris"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn unknown_session_is_not_found() {
        let app = v1_router(test_state(Arc::new(MockProvider::new("unused"))));
        let req = Request::builder()
            .uri("/travel/sessions/not-a-session")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
