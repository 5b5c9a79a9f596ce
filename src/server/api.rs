//! HTTP API server implementation

use axum::{
    extract::{rejection::JsonRejection, Json, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::core::client::MessagesClient;
use crate::core::config::TranslatorConfig;
use crate::core::errors::{ErrorCategory, TranslationError};
use crate::core::models::{ConversationTurn, ModelHint, TranslationRequest};
use crate::core::orchestrator::Translator;
use crate::core::registry::Register;

/// Application state
#[derive(Clone)]
pub struct AppState {
    translator: Arc<Translator>,
}

/// Health check response
#[derive(Serialize)]
struct HealthResponse {
    status: String,
    service: String,
    version: String,
}

/// Segment-and-translate request body
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentTranslateRequest {
    /// Text to translate
    pub text: Option<String>,
    /// `ancient`, `modern` or `english`
    pub input_language: Option<String>,
    /// One or more language codes
    pub output_languages: Option<Vec<String>>,
    /// Model variant; unknown values use the default
    pub model: Option<String>,
}

/// Original block in a translation response
#[derive(Debug, Serialize)]
pub struct OriginalBlock {
    /// Input language code
    pub language: Register,
    /// Echoed source block with `<sN>` tags
    pub text: String,
}

/// Segment-and-translate response body
#[derive(Debug, Serialize)]
pub struct SegmentTranslateResponse {
    /// Source block
    pub original: OriginalBlock,
    /// Tagged block per requested language; `""` when not found
    pub translations: BTreeMap<Register, String>,
}

/// Follow-up query request body
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequest {
    /// Full document for context
    pub original_text: Option<String>,
    /// Sentence the question is about
    pub highlighted_sentence: Option<String>,
    /// The question
    pub user_question: Option<String>,
    /// Earlier turns; `null` and absent both mean none
    pub conversation_history: Option<Vec<ConversationTurn>>,
    /// Model variant; unknown values use the default
    pub model: Option<String>,
}

/// Follow-up query response body
#[derive(Debug, Serialize)]
pub struct QueryResponse {
    /// Generator answer, unparsed
    pub response: String,
}

/// Error body: stable category, human details, timestamp
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Category code
    pub error: String,
    /// Human-readable message
    pub details: String,
    /// RFC 3339 time of the failure
    pub timestamp: String,
}

/// Error returned by handlers
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    error: TranslationError,
}

impl ApiError {
    /// Full status mapping used by the translation endpoint
    fn translation(error: TranslationError) -> Self {
        let status = match error.category() {
            ErrorCategory::Validation => StatusCode::BAD_REQUEST,
            ErrorCategory::Timeout => StatusCode::GATEWAY_TIMEOUT,
            ErrorCategory::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ErrorCategory::GenerationFailed | ErrorCategory::Internal => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        Self { status, error }
    }

    /// The query endpoint only distinguishes bad input from failure
    fn query(error: TranslationError) -> Self {
        let status = match error.category() {
            ErrorCategory::Validation => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self { status, error }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!("Request failed: {}", self.error);
        } else {
            info!("Request rejected: {}", self.error);
        }

        let body = ErrorResponse {
            error: self.error.category().code().to_string(),
            details: self.error.to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError {
            status: StatusCode::BAD_REQUEST,
            error: TranslationError::validation(rejection.body_text()),
        }
    }
}

/// Health check handler
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        service: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Turn the loosely typed body into a validated request
fn build_request(payload: SegmentTranslateRequest) -> Result<TranslationRequest, TranslationError> {
    let input = payload
        .input_language
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .map(str::parse::<Register>)
        .transpose()?;

    let outputs = payload
        .output_languages
        .unwrap_or_default()
        .iter()
        .map(|code| code.parse::<Register>())
        .collect::<Result<Vec<_>, _>>()?;

    let request = TranslationRequest::try_new(payload.text.unwrap_or_default(), input, outputs)?;
    Ok(request.with_model_hint(ModelHint::from_wire(payload.model.as_deref())))
}

/// Segment and translate handler
async fn segment_and_translate(
    State(state): State<AppState>,
    payload: Result<Json<SegmentTranslateRequest>, JsonRejection>,
) -> Result<Json<SegmentTranslateResponse>, ApiError> {
    let Json(payload) = payload?;
    let request = build_request(payload).map_err(ApiError::translation)?;

    let result = state
        .translator
        .translate(&request)
        .await
        .map_err(ApiError::translation)?;

    let translations = result
        .translations
        .into_iter()
        .map(|(register, text)| (register, text.raw_block))
        .collect();

    Ok(Json(SegmentTranslateResponse {
        original: OriginalBlock {
            language: result.original.register,
            text: result.original.raw_block,
        },
        translations,
    }))
}

/// Follow-up query handler
async fn query(
    State(state): State<AppState>,
    payload: Result<Json<QueryRequest>, JsonRejection>,
) -> Result<Json<QueryResponse>, ApiError> {
    let Json(payload) = payload?;
    let response = state
        .translator
        .converse(
            payload.original_text.as_deref().unwrap_or_default(),
            payload.highlighted_sentence.as_deref().unwrap_or_default(),
            payload.user_question.as_deref().unwrap_or_default(),
            payload.conversation_history.as_deref().unwrap_or_default(),
            ModelHint::from_wire(payload.model.as_deref()),
        )
        .await
        .map_err(ApiError::query)?;

    Ok(Json(QueryResponse { response }))
}

/// Build the router around a translator
pub fn router(translator: Translator) -> Router {
    let state = AppState {
        translator: Arc::new(translator),
    };

    Router::new()
        .route("/health", get(health_check))
        .route("/api/segment-and-translate", post(segment_and_translate))
        .route("/api/query-claude", post(query))
        .route("/api/query", post(query))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Run the HTTP server
pub async fn run_server(host: String, port: u16, config: TranslatorConfig) -> anyhow::Result<()> {
    let policy = config.retry_policy();
    let client = MessagesClient::new(config)?;
    let translator = Translator::new(Arc::new(client), policy);

    let app = router(translator);

    // Bind address
    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;

    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::invoker::RetryPolicy;
    use crate::core::mock::{MockGenerator, MockReply};
    use assert_json_diff::{assert_json_eq, assert_json_include};
    use axum::body::Body;
    use axum::http::Request;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    const ANALECTS: &str = "ANCIENT:\n<s1>学而时习之</s1>\nMODERN:\n<s1>学习并时常复习它</s1>\nENGLISH:\n<s1>Learn and practice it often</s1>";

    fn app(generator: Arc<MockGenerator>) -> Router {
        router(Translator::new(generator, RetryPolicy::default()))
    }

    async fn post_json(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_translate_endpoint() {
        let generator = Arc::new(MockGenerator::replying(ANALECTS));
        let (status, body) = post_json(
            app(generator),
            "/api/segment-and-translate",
            json!({
                "text": "学而时习之",
                "inputLanguage": "ancient",
                "outputLanguages": ["modern", "english"],
                "model": "sonnet"
            }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_json_eq!(
            body,
            json!({
                "original": { "language": "ancient", "text": "<s1>学而时习之</s1>" },
                "translations": {
                    "modern": "<s1>学习并时常复习它</s1>",
                    "english": "<s1>Learn and practice it often</s1>"
                }
            })
        );
    }

    #[tokio::test]
    async fn test_translate_missing_register_is_empty_string() {
        let generator = Arc::new(MockGenerator::replying("MODERN:\n<s1>你好</s1>"));
        let (status, body) = post_json(
            app(generator),
            "/api/segment-and-translate",
            json!({ "text": "Hello", "inputLanguage": "english", "outputLanguages": ["modern", "ancient"] }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_json_include!(
            actual: body,
            expected: json!({ "translations": { "modern": "<s1>你好</s1>", "ancient": "" } })
        );
    }

    #[tokio::test]
    async fn test_translate_validation_never_calls_generator() {
        let generator = Arc::new(MockGenerator::replying(ANALECTS));
        let cases = [
            json!({ "text": "学而时习之", "inputLanguage": "ancient", "outputLanguages": [] }),
            json!({ "text": "学而时习之", "inputLanguage": "ancient" }),
            json!({ "inputLanguage": "ancient", "outputLanguages": ["modern"] }),
            json!({ "text": "学而时习之", "outputLanguages": ["modern"] }),
            json!({ "text": "学而时习之", "inputLanguage": "latin", "outputLanguages": ["modern"] }),
        ];

        for case in cases {
            let (status, body) =
                post_json(app(generator.clone()), "/api/segment-and-translate", case).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body["error"], "validation_error");
            assert!(!body["details"].as_str().unwrap().is_empty());
            assert!(body["timestamp"].is_string());
        }
        assert_eq!(generator.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_translate_timeout_maps_to_504() {
        let generator = Arc::new(MockGenerator::hanging());
        let (status, body) = post_json(
            app(generator.clone()),
            "/api/segment-and-translate",
            json!({ "text": "Hi", "inputLanguage": "english", "outputLanguages": ["modern"] }),
        )
        .await;

        assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(body["error"], "timeout");
        assert_eq!(generator.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_translate_rate_limit_maps_to_429() {
        let generator = Arc::new(MockGenerator::scripted([], MockReply::RateLimited));
        let (status, body) = post_json(
            app(generator),
            "/api/segment-and-translate",
            json!({ "text": "Hi", "inputLanguage": "english", "outputLanguages": ["modern"] }),
        )
        .await;

        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(body["error"], "rate_limited");
    }

    #[tokio::test(start_paused = true)]
    async fn test_translate_other_failure_maps_to_500() {
        let generator = Arc::new(MockGenerator::scripted([], MockReply::Fail("boom".to_string())));
        let (status, body) = post_json(
            app(generator),
            "/api/segment-and-translate",
            json!({ "text": "Hi", "inputLanguage": "english", "outputLanguages": ["modern"] }),
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "generation_failed");
        assert!(body["details"].as_str().unwrap().contains("boom"));
    }

    #[tokio::test]
    async fn test_query_endpoint() {
        let generator = Arc::new(MockGenerator::replying("It means joy."));
        let (status, body) = post_json(
            app(generator.clone()),
            "/api/query-claude",
            json!({
                "originalText": "学而时习之，不亦说乎？",
                "highlightedSentence": "不亦说乎",
                "userQuestion": "What does 说 mean?",
                "conversationHistory": [
                    { "role": "user", "content": "Who wrote this?" },
                    { "role": "assistant", "content": "Confucius' disciples." }
                ]
            }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_json_eq!(body, json!({ "response": "It means joy." }));
        assert!(generator.prompts()[0].0.contains("User: Who wrote this?"));
    }

    #[tokio::test]
    async fn test_query_accepts_null_history() {
        let generator = Arc::new(MockGenerator::replying("Joy."));
        for uri in ["/api/query-claude", "/api/query"] {
            let (status, body) = post_json(
                app(generator.clone()),
                uri,
                json!({
                    "originalText": "学而时习之，不亦说乎？",
                    "highlightedSentence": "不亦说乎",
                    "userQuestion": "What does 说 mean?",
                    "conversationHistory": null
                }),
            )
            .await;

            assert_eq!(status, StatusCode::OK);
            assert_json_eq!(body, json!({ "response": "Joy." }));
        }
        assert!(!generator.prompts()[0].0.contains("Previous conversation:"));
    }

    #[tokio::test]
    async fn test_malformed_body_is_validation_error() {
        let generator = Arc::new(MockGenerator::replying(ANALECTS));
        let (status, body) = post_json(
            app(generator.clone()),
            "/api/segment-and-translate",
            json!({ "text": "学而时习之", "inputLanguage": "ancient", "outputLanguages": "modern" }),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "validation_error");
        assert!(body["timestamp"].is_string());

        let (status, body) = post_json(
            app(generator.clone()),
            "/api/query-claude",
            json!({ "originalText": 42, "highlightedSentence": "b", "userQuestion": "c" }),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "validation_error");
        assert_eq!(generator.calls(), 0);
    }

    #[tokio::test]
    async fn test_query_requires_fields() {
        let generator = Arc::new(MockGenerator::replying("unused"));
        let (status, body) = post_json(
            app(generator.clone()),
            "/api/query",
            json!({ "originalText": "学而时习之", "userQuestion": "Why?" }),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "validation_error");
        assert_eq!(generator.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_query_timeout_maps_to_500() {
        let generator = Arc::new(MockGenerator::hanging());
        let (status, _) = post_json(
            app(generator),
            "/api/query",
            json!({ "originalText": "a", "highlightedSentence": "b", "userQuestion": "c" }),
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_health() {
        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let response = app(Arc::new(MockGenerator::replying("")))
            .oneshot(request)
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
