use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use assessment_client::error::ApiError;
use assessment_client::infrastructure::CSRF_HEADER;
use assessment_client::{
    AppError, AssessmentApi, AssessmentClient, ClientState, Config, RegistrationNumber,
};
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value as JsonValue};
use tokio::net::TcpListener;

#[derive(Clone, Default)]
struct Seen {
    requests: Arc<Mutex<Vec<(String, Option<String>, JsonValue)>>>,
}

impl Seen {
    fn record(&self, route: String, headers: &HeaderMap, body: JsonValue) {
        let csrf = headers
            .get(CSRF_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        self.requests.lock().unwrap().push((route, csrf, body));
    }

    fn all(&self) -> Vec<(String, Option<String>, JsonValue)> {
        self.requests.lock().unwrap().clone()
    }
}

async fn update_state(
    State(seen): State<Seen>,
    Path((exam, assessment)): Path<(String, String)>,
    headers: HeaderMap,
    Json(body): Json<JsonValue>,
) -> Json<JsonValue> {
    seen.record(format!("state {}/{}", exam, assessment), &headers, body);
    Json(json!([
        {"callback": "showMessage", "data": {"message": "saved"}},
        {"callback": "focusElement", "data": {"element": "q2"}}
    ]))
}

async fn load_answers(
    State(seen): State<Seen>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Json<JsonValue> {
    let registration = params.get("registration").cloned().unwrap_or_default();
    seen.record(format!("answers {}", registration), &headers, JsonValue::Null);
    Json(json!([{"callback": "setElementContent", "data": {"element": "q1", "content": "x"}}]))
}

async fn load_reference() -> (StatusCode, &'static str) {
    (StatusCode::INTERNAL_SERVER_ERROR, "boom")
}

async fn random_student() -> Json<JsonValue> {
    Json(json!({"registration": "555"}))
}

async fn dynexite_answers() -> &'static str {
    "Aufgabe 1: B"
}

async fn element_action(
    State(seen): State<Seen>,
    Path(name): Path<String>,
    headers: HeaderMap,
    Json(body): Json<JsonValue>,
) -> &'static str {
    seen.record(format!("element {}", name), &headers, body);
    "not json"
}

async fn slow_random_student() -> Json<JsonValue> {
    tokio::time::sleep(Duration::from_secs(3)).await;
    Json(json!({"registration": "late"}))
}

async fn spawn_server(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

async fn client_for(router: Router, timeout_secs: u64) -> AssessmentClient {
    let base_url = spawn_server(router).await;
    let config = Config {
        base_url,
        exam_id: "3".to_string(),
        assessment_id: "12".to_string(),
        csrf_token: "token-abc".to_string(),
        request_timeout_secs: timeout_secs,
        ..Config::default()
    };
    AssessmentClient::new(&config).unwrap()
}

fn exam_router(seen: Seen) -> Router {
    Router::new()
        .route("/exam/:exam/assessment/:assessment/state", post(update_state))
        .route("/exam/:exam/assessment/:assessment/answers", get(load_answers))
        .route(
            "/exam/:exam/assessment/:assessment/reference",
            get(load_reference),
        )
        .route(
            "/exam/:exam/assessment/:assessment/dynexite/answers",
            get(dynexite_answers),
        )
        .route("/exam/:exam/random-student", get(random_student))
        .route("/element/:name/action", post(element_action))
        .with_state(seen)
}

#[tokio::test]
async fn update_state_posts_json_with_csrf_and_parses_actions() {
    let seen = Seen::default();
    let client = client_for(exam_router(seen.clone()), 10).await;

    let mut state = ClientState::new();
    state.set("q1", json!("a"));
    state.set("q2", json!([1, 2]));

    let actions = client.update_state(&state).await.unwrap();
    assert_eq!(actions.len(), 2);
    assert_eq!(actions[0].callback, "showMessage");
    assert_eq!(actions[1].data, json!({"element": "q2"}));

    let requests = seen.all();
    assert_eq!(requests.len(), 1);
    let (route, csrf, body) = &requests[0];
    assert_eq!(route, "state 3/12");
    assert_eq!(csrf.as_deref(), Some("token-abc"));
    assert_eq!(body, &json!({"q1": "a", "q2": [1, 2]}));
}

#[tokio::test]
async fn get_requests_carry_registration_and_csrf() {
    let seen = Seen::default();
    let client = client_for(exam_router(seen.clone()), 10).await;

    let registration = RegistrationNumber::parse("12 34").unwrap();
    let actions = client.load_answers(&registration).await.unwrap();
    assert_eq!(actions[0].callback, "setElementContent");

    let requests = seen.all();
    assert_eq!(requests[0].0, "answers 12 34");
    assert_eq!(requests[0].1.as_deref(), Some("token-abc"));

    let student = client.random_student().await.unwrap();
    assert_eq!(student.registration, "555");

    let text = client.dynexite_answers(&registration).await.unwrap();
    assert_eq!(text, "Aufgabe 1: B");
}

#[tokio::test]
async fn non_success_status_is_bad_status() {
    let client = client_for(exam_router(Seen::default()), 10).await;

    let err = client.load_reference().await.unwrap_err();
    match err {
        AppError::Api(ApiError::BadStatus { status, body, .. }) => {
            assert_eq!(status, 500);
            assert_eq!(body, "boom");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn malformed_response_is_json_error() {
    let seen = Seen::default();
    let client = client_for(exam_router(seen.clone()), 10).await;

    let err = client
        .element_action("q 7", &json!({"run": true}))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AppError::Api(ApiError::JsonParseFailed { .. })
    ));
    assert_eq!(seen.all()[0].0, "element q 7");
    assert_eq!(seen.all()[0].2, json!({"run": true}));
}

#[tokio::test]
async fn slow_server_times_out() {
    let router = Router::new().route("/exam/:exam/random-student", get(slow_random_student));
    let client = client_for(router, 1).await;

    let err = client.random_student().await.unwrap_err();
    assert!(matches!(err, AppError::Api(ApiError::Timeout { .. })));
}
