//! HTTP surface: multipart annotation endpoints plus session management.
//!
//! Generalizes `original_source/backend/diarization_service/main.py`'s
//! FastAPI routes onto an axum router (`AppState`, `ApiError`/
//! `IntoResponse`, `ServiceHandle` with graceful shutdown via a oneshot
//! channel).

use axum::extract::{DefaultBodyLimit, Multipart, Path as AxumPath, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::oneshot;

use crate::collaborators::{AnnotatedSegment, Diarizer, Embedder, Transcriber};
use crate::config::Config;
use crate::error::{CollaboratorError, ServiceError};
use crate::orchestrator::{Orchestrator, ProcessRequest};
use crate::session::SessionStore;

#[derive(Clone)]
struct AppState {
    orchestrator: Arc<Orchestrator>,
    transcriber: Arc<dyn Transcriber>,
    diarizer: Arc<dyn Diarizer>,
    embedder: Option<Arc<dyn Embedder>>,
    sessions: Arc<SessionStore>,
    diarizer_model: Arc<str>,
}

#[derive(Serialize)]
struct RootResponse {
    service: &'static str,
    version: &'static str,
    endpoints: RootEndpoints,
}

#[derive(Serialize)]
struct RootEndpoints {
    health: &'static str,
    inference: &'static str,
    transcribe: &'static str,
    session_speakers: &'static str,
    session_clear: &'static str,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    services: HealthServices,
    config: HealthConfig,
}

#[derive(Serialize)]
struct HealthServices {
    transcriber: &'static str,
    diarizer: &'static str,
    embedder: &'static str,
}

#[derive(Serialize)]
struct HealthConfig {
    diarizer_model: Arc<str>,
    speaker_continuity_enabled: bool,
}

#[derive(Serialize)]
struct InferenceResponse {
    segments: Vec<AnnotatedSegment>,
    text: String,
}

#[derive(Serialize)]
struct SpeakersResponse {
    session_id: String,
    speakers: Vec<crate::speaker::SpeakerSummary>,
    speaker_count: usize,
}

#[derive(Serialize)]
struct ClearSessionResponse {
    status: &'static str,
    message: String,
}

#[derive(Serialize)]
struct ApiErrorResponse {
    error: ApiErrorBody,
}

#[derive(Serialize)]
struct ApiErrorBody {
    message: String,
    #[serde(rename = "type")]
    error_type: &'static str,
}

#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
    error_type: &'static str,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
            error_type: "invalid_request_error",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiErrorResponse {
            error: ApiErrorBody {
                message: self.message,
                error_type: self.error_type,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Collaborator(CollaboratorError::Timeout { .. }) => ApiError {
                status: StatusCode::GATEWAY_TIMEOUT,
                message: err.to_string(),
                error_type: "timeout_error",
            },
            ServiceError::Collaborator(_) => ApiError {
                status: StatusCode::BAD_GATEWAY,
                message: err.to_string(),
                error_type: "upstream_error",
            },
            ServiceError::Timeout { .. } => ApiError {
                status: StatusCode::GATEWAY_TIMEOUT,
                message: err.to_string(),
                error_type: "timeout_error",
            },
            ServiceError::CorruptInput(_) | ServiceError::ClientError(_) => {
                ApiError::bad_request(err.to_string())
            }
            ServiceError::Persistence(_) | ServiceError::Io(_) => ApiError {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                message: err.to_string(),
                error_type: "server_error",
            },
        }
    }
}

/// Running service handle, with graceful shutdown via a oneshot channel.
pub struct ServiceHandle {
    addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: tokio::task::JoinHandle<()>,
}

impl ServiceHandle {
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Err(e) = self.task.await {
            tracing::warn!("service task join error: {e}");
        }
    }
}

/// Bind and start the HTTP server described by `config`, using the given
/// collaborators and session store.
pub async fn start(
    config: &Config,
    orchestrator: Arc<Orchestrator>,
    transcriber: Arc<dyn Transcriber>,
    diarizer: Arc<dyn Diarizer>,
    embedder: Option<Arc<dyn Embedder>>,
    sessions: Arc<SessionStore>,
) -> Result<ServiceHandle, ServiceError> {
    let bind_addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    let local_addr = listener.local_addr()?;

    let state = AppState {
        orchestrator,
        transcriber,
        diarizer,
        embedder,
        sessions,
        diarizer_model: Arc::from(config.diarizer_model.as_str()),
    };

    let app = build_router(state, config.max_upload_bytes);
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let task = tokio::spawn(async move {
        tracing::info!(addr = %local_addr, "speakerkeep listening");
        if let Err(e) = axum::serve(listener, app.into_make_service())
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            })
            .await
        {
            tracing::error!("HTTP server failed: {e}");
        }
        tracing::info!("speakerkeep stopped");
    });

    Ok(ServiceHandle {
        addr: local_addr,
        shutdown_tx: Some(shutdown_tx),
        task,
    })
}

fn build_router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/inference", post(inference))
        .route("/transcribe", post(inference))
        .route("/session/:session_id/speakers", get(session_speakers))
        .route("/session/:session_id", delete(clear_session))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .with_state(state)
}

async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        service: "speakerkeep",
        version: env!("CARGO_PKG_VERSION"),
        endpoints: RootEndpoints {
            health: "Service health check",
            inference: "Transcribe with diarization (pass session_id for cross-chunk tracking)",
            transcribe: "Alias of /inference",
            session_speakers: "GET /session/{session_id}/speakers - speaker summary for a session",
            session_clear: "DELETE /session/{session_id} - clear session data",
        },
    })
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let transcriber_ok = state.transcriber.health().await;
    let diarizer_ok = state.diarizer.health().await;
    let embedder_ok = match &state.embedder {
        Some(embedder) => embedder.health().await,
        None => false,
    };

    let status = if transcriber_ok && diarizer_ok {
        "ok"
    } else if transcriber_ok {
        "degraded"
    } else {
        "error"
    };

    Json(HealthResponse {
        status,
        services: HealthServices {
            transcriber: if transcriber_ok { "ok" } else { "unavailable" },
            diarizer: if diarizer_ok { "ok" } else { "unavailable" },
            embedder: if state.embedder.is_none() {
                "not_configured"
            } else if embedder_ok {
                "ok"
            } else {
                "unavailable"
            },
        },
        config: HealthConfig {
            diarizer_model: state.diarizer_model.clone(),
            speaker_continuity_enabled: state.embedder.is_some(),
        },
    })
}

struct InferenceRequest {
    audio_bytes: Vec<u8>,
    diarize: bool,
    temperature: Option<f32>,
    session_id: Option<String>,
    num_speakers: Option<u32>,
}

async fn parse_multipart(mut multipart: Multipart) -> Result<InferenceRequest, ApiError> {
    let mut audio_bytes: Option<Vec<u8>> = None;
    let mut diarize = true;
    let mut temperature: Option<f32> = None;
    let mut session_id: Option<String> = None;
    let mut num_speakers: Option<u32> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("invalid multipart request: {e}")))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "file" => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("failed to read file field: {e}")))?;
                audio_bytes = Some(bytes.to_vec());
            }
            "diarize" => {
                let value = field.text().await.unwrap_or_default();
                diarize = parse_bool(&value, true);
            }
            "temperature" => {
                let value = field.text().await.unwrap_or_default();
                temperature = value.trim().parse().ok();
            }
            "session_id" => {
                let value = field.text().await.unwrap_or_default();
                session_id = Some(value).filter(|s| !s.is_empty());
            }
            "num_speakers" => {
                let value = field.text().await.unwrap_or_default();
                num_speakers = value.trim().parse().ok();
            }
            _ => {}
        }
    }

    let audio_bytes =
        audio_bytes.ok_or_else(|| ApiError::bad_request("missing required multipart field: file"))?;

    Ok(InferenceRequest {
        audio_bytes,
        diarize,
        temperature,
        session_id,
        num_speakers,
    })
}

fn parse_bool(value: &str, default: bool) -> bool {
    match value.trim().to_lowercase().as_str() {
        "" => default,
        "true" | "1" | "yes" => true,
        "false" | "0" | "no" => false,
        _ => default,
    }
}

async fn inference(State(state): State<AppState>, multipart: Multipart) -> Result<Response, ApiError> {
    let request = parse_multipart(multipart).await?;

    tracing::info!(
        bytes = request.audio_bytes.len(),
        session_id = request.session_id.as_deref().unwrap_or(""),
        num_speakers = request.num_speakers,
        "processing inference request"
    );

    let segments = state
        .orchestrator
        .process(ProcessRequest {
            audio_bytes: request.audio_bytes,
            enable_diarization: request.diarize,
            session_id: request.session_id,
            num_speakers_hint: request.num_speakers,
            temperature: request.temperature,
        })
        .await?;

    let text = segments
        .iter()
        .map(|s| s.text.as_str())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    Ok(Json(InferenceResponse { segments, text }).into_response())
}

async fn session_speakers(
    State(state): State<AppState>,
    AxumPath(session_id): AxumPath<String>,
) -> Json<SpeakersResponse> {
    let speakers = state.sessions.speakers_summary(&session_id);
    Json(SpeakersResponse {
        session_id,
        speaker_count: speakers.len(),
        speakers,
    })
}

async fn clear_session(
    State(state): State<AppState>,
    AxumPath(session_id): AxumPath<String>,
) -> Json<ClearSessionResponse> {
    state.sessions.clear(&session_id);
    Json(ClearSessionResponse {
        status: "ok",
        message: format!("session {session_id} cleared"),
    })
}
