//! HTTP front end for the response pipeline.
//!
//! ## Endpoints
//!
//! - `POST /api/chat`: `{message, agent_name?, history?}` → [`UnifiedResponse`]
//! - `GET /api/personas`: built-in personas and their repertoires
//! - `GET /api/health`: liveness probe

use crate::config::ServerConfig;
use crate::error::{AcademyError, Result};
use crate::persona::{Persona, PersonaId};
use crate::pipeline::{ChatRequest, ErrorBody, ResponseAssembler, UnifiedResponse};
use axum::Router;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Shown to the user when text generation fails.
pub const UNAVAILABLE_MESSAGE: &str =
    "The tutor is unavailable right now. Please try again in a moment.";

/// Returned when the request has no usable message.
pub const MESSAGE_REQUIRED: &str = "Message is required";

/// One entry of `GET /api/personas`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonaSummary {
    /// Lookup slug.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Expression labels.
    pub expressions: Vec<String>,
    /// Animation clip names.
    pub animations: Vec<String>,
}

impl From<&Persona> for PersonaSummary {
    fn from(persona: &Persona) -> Self {
        Self {
            id: persona.id.slug().to_owned(),
            name: persona.name.to_owned(),
            expressions: persona
                .expressions
                .iter()
                .map(|(expression, _)| expression.label().to_owned())
                .collect(),
            animations: persona.animations.iter().map(|a| (*a).to_owned()).collect(),
        }
    }
}

#[derive(Clone)]
struct AppState {
    assembler: Arc<ResponseAssembler>,
}

/// Build the router without binding a socket.
pub fn router(assembler: Arc<ResponseAssembler>) -> Router {
    Router::new()
        .route("/api/chat", post(handle_chat))
        .route("/api/personas", get(handle_personas))
        .route("/api/health", get(handle_health))
        .with_state(AppState { assembler })
}

/// A running chat server.
///
/// The server task is aborted when this is dropped.
pub struct ChatServer {
    addr: SocketAddr,
    handle: Option<JoinHandle<()>>,
}

impl ChatServer {
    /// Start the chat server.
    ///
    /// Binds to `{config.host}:{config.port}` (use port `0` for auto-assign)
    /// and begins serving in a background tokio task.
    ///
    /// # Errors
    ///
    /// Returns an error if the TCP listener cannot bind.
    pub async fn start(config: &ServerConfig, assembler: Arc<ResponseAssembler>) -> Result<Self> {
        let app = router(assembler);

        let bind_addr = format!("{}:{}", config.host, config.port);
        let listener = TcpListener::bind(&bind_addr)
            .await
            .map_err(|e| AcademyError::Server(format!("bind {bind_addr} failed: {e}")))?;

        let addr = listener
            .local_addr()
            .map_err(|e| AcademyError::Server(format!("failed to get local addr: {e}")))?;

        info!("chat server listening on http://{addr}/api");

        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                error!("chat server error: {e}");
            }
        });

        Ok(Self {
            addr,
            handle: Some(handle),
        })
    }

    /// Returns the address the server is listening on.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Returns the port the server is listening on.
    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Base URL for clients, e.g. `http://127.0.0.1:3000`.
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Abort the server task.
    pub fn shutdown(&self) {
        if let Some(handle) = &self.handle {
            handle.abort();
        }
    }

    /// Serve until the server task ends.
    ///
    /// # Errors
    ///
    /// Returns an error if the task panicked or was aborted.
    pub async fn wait(mut self) -> Result<()> {
        match self.handle.take() {
            Some(handle) => handle
                .await
                .map_err(|e| AcademyError::Server(format!("server task ended abnormally: {e}"))),
            None => Ok(()),
        }
    }
}

impl Drop for ChatServer {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(ErrorBody {
            error: message.to_owned(),
        }),
    )
        .into_response()
}

async fn handle_chat(
    State(state): State<AppState>,
    body: std::result::Result<Json<ChatRequest>, JsonRejection>,
) -> Response {
    let request = match body {
        Ok(Json(request)) => request,
        Err(rejection) => {
            warn!("rejected chat body: {rejection}");
            return error_response(StatusCode::BAD_REQUEST, MESSAGE_REQUIRED);
        }
    };
    let Some(message) = request.trimmed_message() else {
        return error_response(StatusCode::BAD_REQUEST, MESSAGE_REQUIRED);
    };

    match state
        .assembler
        .respond(message, &request.history, request.agent_name.as_deref())
        .await
    {
        Ok(response) => (StatusCode::OK, Json::<UnifiedResponse>(response)).into_response(),
        Err(AcademyError::Pipeline(_)) => {
            error_response(StatusCode::BAD_REQUEST, MESSAGE_REQUIRED)
        }
        Err(e) => {
            error!("chat request failed: {e}");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, UNAVAILABLE_MESSAGE)
        }
    }
}

async fn handle_personas() -> Json<Vec<PersonaSummary>> {
    Json(
        PersonaId::ALL
            .iter()
            .map(|id| PersonaSummary::from(id.persona()))
            .collect(),
    )
}

async fn handle_health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
