//! Integration tests for the REST adapter.
//!
//! Drives the router with tower::ServiceExt::oneshot against the real service and an
//! in-memory repository.

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
    response::Response,
};
use payday_lms::adapters::http::create_router;
use payday_lms::adapters::persistence::MemoryClientRepo;
use payday_lms::domain::{Client, ClientData, MAXIMUM_AMOUNT_FOR_FIRST_LOAN, RepoError, Term};
use payday_lms::ports::{ClientRepo, Lms};
use payday_lms::usecases::LoanService;
use serde_json::{Value as JsonValue, json};
use std::sync::Arc;
use tower::ServiceExt;

const PUBLIC_URL: &str = "http://lms.test";
const KTP_NUMBER: &str = "3522582509010002";
const BIRTH_DATE: &str = "1 December 1994";
const NAME: &str = "Doe";

fn client_data() -> ClientData {
    ClientData {
        ktp_number: KTP_NUMBER.into(),
        birth_date: BIRTH_DATE.into(),
        name: NAME.into(),
        ..Default::default()
    }
}

fn app() -> (Router, Arc<LoanService>) {
    let lms = Arc::new(LoanService::new(Arc::new(MemoryClientRepo::new())));
    (create_router(PUBLIC_URL, lms.clone()), lms)
}

/// Repository that is always down.
struct BrokenRepo;

#[async_trait::async_trait]
impl ClientRepo for BrokenRepo {
    async fn by_ktp_number(&self, _: &str) -> Result<Option<Client>, RepoError> {
        Err(RepoError::new("database is down"))
    }

    async fn save(&self, _: &Client) -> Result<(), RepoError> {
        Err(RepoError::new("database is down"))
    }
}

fn broken_app() -> Router {
    create_router(PUBLIC_URL, Arc::new(LoanService::new(Arc::new(BrokenRepo))))
}

async fn send(app: Router, method: &str, uri: &str, body: Option<&str>) -> Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if body.is_some() {
        builder = builder.header(header::CONTENT_TYPE, "application/json");
    }
    let request = builder
        .body(body.map(|b| Body::from(b.to_string())).unwrap_or_else(Body::empty))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

async fn body_text(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn body_json(response: Response) -> JsonValue {
    serde_json::from_str(&body_text(response).await).unwrap()
}

fn register_body() -> String {
    json!({ "ktpNumber": KTP_NUMBER, "birthDate": BIRTH_DATE, "name": NAME }).to_string()
}

// ===== /clients =====

#[tokio::test]
async fn test_get_slash() {
    let (app, _) = app();
    let response = send(app, "GET", "/", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_text(response).await, "Use /clients");
}

#[tokio::test]
async fn test_get_clients_not_allowed() {
    let (app, _) = app();
    let response = send(app, "GET", "/clients", None).await;
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(
        body_text(response).await,
        "POST /clients to register a new client"
    );
}

#[tokio::test]
async fn test_options_clients() {
    let (app, _) = app();
    let response = send(app, "OPTIONS", "/clients", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::ALLOW], "OPTIONS, POST");
}

#[tokio::test]
async fn test_post_clients_registers_client() {
    let (app, lms) = app();

    let response = send(app, "POST", "/clients", Some(&register_body())).await;

    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(
        response.headers()[header::LOCATION],
        format!("{}/clients/{}", PUBLIC_URL, KTP_NUMBER).as_str()
    );
    let client = lms.client_by_ktp_number(KTP_NUMBER).await.unwrap().unwrap();
    assert_eq!(client.birth_date(), BIRTH_DATE);
    assert_eq!(client.name(), NAME);
    assert!(!client.has_active_loan());
}

#[tokio::test]
async fn test_post_clients_when_client_already_exists() {
    let (app, lms) = app();
    lms.register_client(client_data()).await.unwrap();

    let response = send(app, "POST", "/clients", Some(&register_body())).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/json"
    );
    assert_eq!(
        body_json(response).await,
        json!({ "error": "client_already_exists", "params": {} })
    );
}

#[tokio::test]
async fn test_post_clients_with_incorrect_json() {
    for body in ["", "[]", " ", "\n", "{"] {
        let (app, _) = app();
        let response = send(app, "POST", "/clients", Some(body)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body {body:?}");
        assert!(
            body_text(response)
                .await
                .starts_with("JSON unmarshaling failed"),
            "body {body:?}"
        );
    }
}

#[tokio::test]
async fn test_post_clients_when_repo_is_failing() {
    let response = send(broken_app(), "POST", "/clients", Some(&register_body())).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "server_error");
    assert_eq!(
        body["params"]["TechnicalError"],
        format!(
            "registering client {} {} with ktp number {}: database is down",
            BIRTH_DATE, NAME, KTP_NUMBER
        )
    );
}

// ===== /clients/{ktpNumber} =====

#[tokio::test]
async fn test_get_client() {
    let (app, lms) = app();
    lms.register_client(client_data()).await.unwrap();

    let response = send(app, "GET", &format!("/clients/{}", KTP_NUMBER), None).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({
            "ktpNumber": KTP_NUMBER,
            "birthDate": BIRTH_DATE,
            "name": NAME,
            "goLoans": {
                "links": [
                    { "rel": "self", "href": format!("{}/clients/{}/goLoans", PUBLIC_URL, KTP_NUMBER) }
                ]
            }
        })
    );
}

#[tokio::test]
async fn test_get_unexisting_client() {
    let (app, _) = app();
    let response = send(app, "GET", "/clients/1", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        body_json(response).await,
        json!({ "error": "client_does_not_exist", "params": {} })
    );
}

#[tokio::test]
async fn test_get_client_when_repo_is_failing() {
    let response = send(broken_app(), "GET", &format!("/clients/{}", KTP_NUMBER), None).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body_json(response).await,
        json!({
            "error": "server_error",
            "params": {
                "TechnicalError": format!(
                    "problem getting client with ktpNumber {k}: loading client by ktp number {k}: database is down",
                    k = KTP_NUMBER
                )
            }
        })
    );
}

// ===== /clients/{ktpNumber}/goLoans =====

#[tokio::test]
async fn test_apply_for_loan_and_get_it() {
    let (app, lms) = app();
    lms.register_client(client_data()).await.unwrap();
    let loans = format!("/clients/{}/goLoans", KTP_NUMBER);

    let response = send(
        app.clone(),
        "POST",
        &loans,
        Some(r#"{"amount": 10000000, "term": 30}"#),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(
        response.headers()[header::LOCATION],
        format!("{}{}", PUBLIC_URL, loans).as_str()
    );

    let response = send(app, "GET", &loans, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({ "amount": 10_000_000, "term": 30, "remaining": 10_000_000 })
    );
}

#[tokio::test]
async fn test_get_loan_when_client_has_none() {
    let (app, lms) = app();
    lms.register_client(client_data()).await.unwrap();

    let response = send(app, "GET", &format!("/clients/{}/goLoans", KTP_NUMBER), None).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        body_json(response).await,
        json!({ "error": "loan_does_not_exist", "params": {} })
    );
}

#[tokio::test]
async fn test_apply_for_too_high_loan() {
    let (app, lms) = app();
    lms.register_client(client_data()).await.unwrap();
    let body = json!({ "amount": MAXIMUM_AMOUNT_FOR_FIRST_LOAN + 1, "term": 30 }).to_string();

    let response = send(
        app,
        "POST",
        &format!("/clients/{}/goLoans", KTP_NUMBER),
        Some(&body),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await,
        json!({ "error": "amount_too_high", "params": { "MaxAmount": MAXIMUM_AMOUNT_FOR_FIRST_LOAN } })
    );
}

#[tokio::test]
async fn test_apply_for_second_loan() {
    let (app, lms) = app();
    lms.register_client(client_data()).await.unwrap();
    lms.apply_for_loan(KTP_NUMBER, 100, Term(30)).await.unwrap();

    let response = send(
        app,
        "POST",
        &format!("/clients/{}/goLoans", KTP_NUMBER),
        Some(r#"{"amount": 1, "term": 1}"#),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await,
        json!({ "error": "client_already_has_loan", "params": {} })
    );
}

#[tokio::test]
async fn test_apply_for_loan_for_unknown_client() {
    let (app, _) = app();
    let response = send(
        app,
        "POST",
        "/clients/1/goLoans",
        Some(r#"{"amount": 1, "term": 1}"#),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        body_json(response).await,
        json!({ "error": "client_does_not_exist", "params": {} })
    );
}

#[tokio::test]
async fn test_apply_for_loan_with_missing_term() {
    let (app, lms) = app();
    lms.register_client(client_data()).await.unwrap();
    let response = send(
        app,
        "POST",
        &format!("/clients/{}/goLoans", KTP_NUMBER),
        Some(r#"{"amount": 1}"#),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(
        body_text(response)
            .await
            .starts_with("JSON unmarshaling failed")
    );
}

// ===== /clients/{ktpNumber}/goLoans/repayments =====

#[tokio::test]
async fn test_repayments_until_loan_is_settled() {
    let (app, lms) = app();
    lms.register_client(client_data()).await.unwrap();
    lms.apply_for_loan(KTP_NUMBER, 10_000_000, Term(30))
        .await
        .unwrap();
    let repayments = format!("/clients/{}/goLoans/repayments", KTP_NUMBER);

    let response = send(app.clone(), "POST", &repayments, Some(r#"{"amount": 50}"#)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({ "amount": 10_000_000, "term": 30, "remaining": 9_999_950 })
    );

    let response = send(
        app.clone(),
        "POST",
        &repayments,
        Some(r#"{"amount": 9999951}"#),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await,
        json!({ "error": "repayment_amount_too_high", "params": { "Remaining": 9_999_950 } })
    );

    let response = send(
        app.clone(),
        "POST",
        &repayments,
        Some(r#"{"amount": 9999950}"#),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let client = lms.client_by_ktp_number(KTP_NUMBER).await.unwrap().unwrap();
    assert!(!client.has_active_loan());

    let response = send(app, "POST", &repayments, Some(r#"{"amount": 1}"#)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await,
        json!({ "error": "client_has_no_active_loan", "params": {} })
    );
}

#[tokio::test]
async fn test_repayment_when_repo_is_failing() {
    let response = send(
        broken_app(),
        "POST",
        &format!("/clients/{}/goLoans/repayments", KTP_NUMBER),
        Some(r#"{"amount": 1}"#),
    )
    .await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert_eq!(body["error"], "server_error");
    assert_eq!(
        body["params"]["TechnicalError"],
        format!("client {} is repaying 1: database is down", KTP_NUMBER)
    );
}
