//! REST server exposing the loans management system.
//!
//! Routes:
//! - `POST /clients`, `GET /clients/{ktpNumber}`
//! - `GET|POST /clients/{ktpNumber}/goLoans`
//! - `POST /clients/{ktpNumber}/goLoans/repayments`
//!
//! Anything else answers 404 `Use /clients`.

use crate::adapters::http::dto::{
    ApplyForLoanRequest, ClientResponse, LoanResponse, RepaymentRequest, client_url, loans_url,
};
use crate::adapters::http::error::ApiError;
use crate::domain::{ClientData, LmsError, Term};
use crate::ports::Lms;
use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::de::DeserializeOwned;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Shared state handed to every handler.
#[derive(Clone)]
struct AppState {
    lms: Arc<dyn Lms>,
    public_url: Arc<str>,
}

/// Build the router. `public_url` prefixes Location headers and links.
pub fn create_router(public_url: &str, lms: Arc<dyn Lms>) -> Router {
    let state = AppState {
        lms,
        public_url: Arc::from(public_url.trim_end_matches('/')),
    };
    Router::new()
        .route(
            "/clients",
            get(get_clients).post(post_clients).options(options_clients),
        )
        .route("/clients/{ktp_number}", get(get_client))
        .route("/clients/{ktp_number}/goLoans", get(get_loan).post(post_loan))
        .route(
            "/clients/{ktp_number}/goLoans/repayments",
            post(post_repayment),
        )
        .fallback(use_clients)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// REST server providing LMS functionality.
pub struct LoansServer {
    addr: String,
    public_url: String,
    lms: Arc<dyn Lms>,
}

impl LoansServer {
    pub fn new(addr: impl Into<String>, public_url: impl Into<String>, lms: Arc<dyn Lms>) -> Self {
        Self {
            addr: addr.into(),
            public_url: public_url.into(),
            lms,
        }
    }

    /// Bind and serve until `shutdown` resolves.
    pub async fn start<F>(self, shutdown: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(&self.addr).await?;
        self.serve(listener, shutdown).await
    }

    /// Serve on an already bound listener until `shutdown` resolves.
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let local = listener.local_addr()?;
        info!(addr = %local, public_url = %self.public_url, "starting server on http://{}/", local);
        let app = create_router(&self.public_url, self.lms);
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await?;
        info!("server stopped");
        Ok(())
    }
}

/// Decode a JSON object body. Arrays and scalars are refused even when the target has defaults.
fn read_json_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    let value: serde_json::Value =
        serde_json::from_slice(body).map_err(|e| ApiError::MalformedJson(e.to_string()))?;
    if !value.is_object() {
        return Err(ApiError::MalformedJson("expected a JSON object".to_string()));
    }
    serde_json::from_value(value).map_err(|e| ApiError::MalformedJson(e.to_string()))
}

async fn use_clients() -> Response {
    (StatusCode::NOT_FOUND, "Use /clients").into_response()
}

async fn get_clients() -> Response {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        "POST /clients to register a new client",
    )
        .into_response()
}

async fn options_clients() -> Response {
    (StatusCode::OK, [(header::ALLOW, "OPTIONS, POST")]).into_response()
}

async fn post_clients(State(state): State<AppState>, body: Bytes) -> Result<Response, ApiError> {
    let data: ClientData = read_json_body(&body)?;
    let client = state
        .lms
        .register_client(data)
        .await
        .map_err(|e| ApiError::with_status(StatusCode::BAD_REQUEST, e))?;
    let location = client_url(&state.public_url, client.ktp_number());
    Ok((StatusCode::CREATED, [(header::LOCATION, location)]).into_response())
}

async fn get_client(
    State(state): State<AppState>,
    Path(ktp_number): Path<String>,
) -> Result<Json<ClientResponse>, ApiError> {
    let found = state
        .lms
        .client_by_ktp_number(&ktp_number)
        .await
        .map_err(|source| ApiError::ClientLookup {
            ktp_number: ktp_number.clone(),
            source,
        })?;
    let client = found.ok_or_else(|| ApiError::from_lms(LmsError::ClientNotFound))?;
    Ok(Json(ClientResponse::new(&client, &state.public_url)))
}

async fn get_loan(
    State(state): State<AppState>,
    Path(ktp_number): Path<String>,
) -> Result<Json<LoanResponse>, ApiError> {
    let found = state
        .lms
        .client_by_ktp_number(&ktp_number)
        .await
        .map_err(ApiError::from_lms)?;
    let client = found.ok_or_else(|| ApiError::from_lms(LmsError::ClientNotFound))?;
    let loan = client.active_loan().ok_or(ApiError::LoanNotFound)?;
    Ok(Json(LoanResponse::from(loan)))
}

async fn post_loan(
    State(state): State<AppState>,
    Path(ktp_number): Path<String>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let request: ApplyForLoanRequest = read_json_body(&body)?;
    state
        .lms
        .apply_for_loan(&ktp_number, request.amount, Term(request.term))
        .await
        .map_err(ApiError::from_lms)?;
    let location = loans_url(&state.public_url, &ktp_number);
    Ok((StatusCode::CREATED, [(header::LOCATION, location)]).into_response())
}

async fn post_repayment(
    State(state): State<AppState>,
    Path(ktp_number): Path<String>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let request: RepaymentRequest = read_json_body(&body)?;
    let remaining = state
        .lms
        .repay(&ktp_number, request.amount)
        .await
        .map_err(ApiError::from_lms)?;
    Ok(match remaining {
        Some(loan) => (StatusCode::OK, Json(LoanResponse::from(&loan))).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    })
}
