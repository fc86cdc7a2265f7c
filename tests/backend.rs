//! Drive the clients against a fake backend running on localhost.

use axum::{
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use medibook::{
    storage::FileStorage, ApiClient, ApiError, AuthClient, AuthError,
    Credentials, Decision, Identity, Navigation, NewAppointment, Profile,
    Role, RouteGuard, SessionStore, SignupData,
};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use url::Url;

/// A request the fake backend received.
#[derive(Debug, Clone)]
struct Seen {
    path: &'static str,
    authorization: Option<String>,
    body: Value,
}

#[derive(Debug, Clone, Default)]
struct Backend {
    seen: Arc<Mutex<Vec<Seen>>>,
}

impl Backend {
    fn record(&self, path: &'static str, headers: &HeaderMap, body: Value) {
        let authorization = headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .map(String::from);

        self.seen.lock().unwrap().push(Seen {
            path,
            authorization,
            body,
        });
    }

    fn requests_to(&self, path: &str) -> Vec<Seen> {
        self.seen
            .lock()
            .unwrap()
            .iter()
            .filter(|seen| seen.path == path)
            .cloned()
            .collect()
    }
}

fn doctor() -> Value {
    json!({
        "_id": "d-7",
        "email": "house@example.com",
        "firstName": "Gregory",
        "lastName": "House",
        "medicalSpecialty": "Diagnostics"
    })
}

async fn doctor_login(
    State(backend): State<Backend>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    backend.record("/api/auth/login", &headers, body.clone());

    match body["password"].as_str() {
        Some("vicodin") => (
            StatusCode::OK,
            Json(json!({ "token": "DOCTOR-TOKEN", "user": doctor() })),
        ),
        Some("half-done") => {
            (StatusCode::OK, Json(json!({ "token": "BARE-TOKEN" })))
        },
        Some("pending") => (
            StatusCode::OK,
            Json(json!({ "message": "Account pending approval" })),
        ),
        _ => (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "message": "Invalid credentials" })),
        ),
    }
}

async fn patient_login(
    State(backend): State<Backend>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    backend.record("/api/patient/login", &headers, body);

    Json(json!({
        "token": "PATIENT-TOKEN",
        "patient": {
            "_id": "p-42",
            "email": "jane@example.com",
            "firstName": "Jane",
            "lastName": "Doe",
            "assignedDoctor": "d-7"
        }
    }))
}

async fn signup(
    State(backend): State<Backend>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    backend.record("/api/auth/signup", &headers, body);

    (
        StatusCode::CREATED,
        Json(json!({ "token": "NEW-DOCTOR-TOKEN", "user": doctor() })),
    )
}

async fn reset_password(
    State(backend): State<Backend>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    backend.record("/api/auth/reset-password", &headers, body);

    Json(json!({ "message": "Check your inbox" }))
}

async fn doctor_appointments(
    State(backend): State<Backend>,
    headers: HeaderMap,
) -> impl IntoResponse {
    backend.record("/api/appointments/doctor", &headers, Value::Null);

    Json(json!([
        {
            "_id": "apt-1",
            "patient": { "firstName": "Jane", "lastName": "Doe" },
            "time": "2026-03-02T10:00:00.000Z",
            "treatment": "Checkup",
            "duration": "30",
            "status": "Pending"
        }
    ]))
}

async fn book_appointment(
    State(backend): State<Backend>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    backend.record("/api/appointments/book", &headers, body);

    (
        StatusCode::CREATED,
        Json(json!({ "message": "Appointment requested" })),
    )
}

async fn patients(
    State(backend): State<Backend>,
    headers: HeaderMap,
) -> impl IntoResponse {
    backend.record("/api/patient", &headers, Value::Null);

    StatusCode::INTERNAL_SERVER_ERROR
}

async fn spawn(backend: Backend) -> Url {
    let app = Router::new()
        .route("/api/auth/login", post(doctor_login))
        .route("/api/patient/login", post(patient_login))
        .route("/api/auth/signup", post(signup))
        .route("/api/auth/reset-password", post(reset_password))
        .route("/api/appointments/doctor", get(doctor_appointments))
        .route("/api/appointments/book", post(book_appointment))
        .route("/api/patient", get(patients))
        .with_state(backend);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

    Url::parse(&format!("http://{}/api/", addr)).unwrap()
}

struct Harness {
    backend: Backend,
    store: SessionStore,
    auth: AuthClient,
    api: ApiClient,
}

async fn harness_with(store: SessionStore) -> Harness {
    let backend = Backend::default();
    let url = spawn(backend.clone()).await;
    let http = reqwest::Client::new();

    Harness {
        auth: AuthClient::new(http.clone(), url.clone(), store.clone()),
        api: ApiClient::new(http, url, store.clone()),
        backend,
        store,
    }
}

async fn harness() -> Harness { harness_with(SessionStore::in_memory()).await }

#[tokio::test]
async fn doctor_login_populates_the_session() {
    let h = harness().await;
    let credentials = Credentials::new("house@example.com", "vicodin")
        .remember_me(true);

    let session = h.auth.login(&credentials, Role::Doctor).await.unwrap();

    assert_eq!(session.token.as_deref(), Some("DOCTOR-TOKEN"));
    assert_eq!(session.role, Some(Role::Doctor));
    assert_eq!(session.user.unwrap().full_name(), "Gregory House");
    assert_eq!(h.store.read().unwrap().role, Some(Role::Doctor));

    let sent = h.backend.requests_to("/api/auth/login");
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].body["email"], "house@example.com");
    assert_eq!(sent[0].body["rememberMe"], true);
    assert_eq!(sent[0].authorization, None);
}

#[tokio::test]
async fn patient_login_unlocks_the_patient_pages() {
    let h = harness().await;
    let credentials = Credentials::new("jane@example.com", "hunter2");

    let session = h.auth.login(&credentials, Role::Patient).await.unwrap();

    assert_eq!(session.role, Some(Role::Patient));
    let user = session.user.unwrap();
    assert_eq!(user.record_id(), Some("p-42"));
    assert_eq!(user.assigned_doctor(), Some("d-7"));

    let guard = RouteGuard::new(h.store.clone());
    assert!(matches!(
        guard.navigate("/patient/dashboard"),
        Navigation::Render { .. }
    ));
    assert_eq!(
        guard.navigate("/doctor/dashboard"),
        Navigation::Redirect(Decision::RedirectToDashboard {
            role: Role::Patient,
            from: String::from("/doctor/dashboard"),
        })
    );
}

#[tokio::test]
async fn bad_credentials_show_the_server_message() {
    let h = harness().await;
    let credentials = Credentials::new("house@example.com", "lupus");

    let err = h.auth.login(&credentials, Role::Doctor).await.unwrap_err();

    match err {
        AuthError::Rejected { status, ref message } => {
            assert_eq!(status, Some(reqwest::StatusCode::UNAUTHORIZED));
            assert_eq!(message, "Invalid credentials");
        },
        other => panic!("Expected a rejection, got {:?}", other),
    }
    assert!(h.store.read().unwrap().is_empty());
}

#[tokio::test]
async fn a_success_without_a_token_leaves_the_session_alone() {
    let store = SessionStore::in_memory();
    let jane = Profile {
        first_name: String::from("Jane"),
        ..Default::default()
    };
    store.write("OLD-TOKEN", &Identity::Patient(jane)).unwrap();
    let h = harness_with(store).await;
    let credentials = Credentials::new("house@example.com", "pending");

    let err = h.auth.login(&credentials, Role::Doctor).await.unwrap_err();

    assert_eq!(err.user_message(), "Account pending approval");
    let session = h.store.read().unwrap();
    assert_eq!(session.token.as_deref(), Some("OLD-TOKEN"));
    assert_eq!(session.role, Some(Role::Patient));
}

#[tokio::test]
async fn a_token_without_a_profile_is_stored_then_logged_out() {
    let h = harness().await;
    let credentials = Credentials::new("house@example.com", "half-done");

    let session = h.auth.login(&credentials, Role::Doctor).await.unwrap();

    assert_eq!(session.token.as_deref(), Some("BARE-TOKEN"));
    assert_eq!(session.role, Some(Role::Doctor));
    assert_eq!(session.user, None);

    let guard = RouteGuard::new(h.store.clone());
    assert_eq!(
        guard.check("/doctor/dashboard", Role::Doctor),
        Decision::RedirectToLogin {
            from: Some(String::from("/doctor/dashboard")),
        }
    );
    assert!(h.store.read().unwrap().is_empty());
}

#[tokio::test]
async fn signing_up_logs_straight_in() {
    let h = harness().await;
    let form = SignupData {
        first_name: String::from("Gregory"),
        last_name: String::from("House"),
        email: String::from("house@example.com"),
        password: "vicodin".into(),
        confirm_password: "vicodin".into(),
        phone_number: String::from("555-0199"),
        state: String::from("NJ"),
        medical_specialty: String::from("Diagnostics"),
    };

    let session = h.auth.signup(&form, Role::Doctor).await.unwrap();

    assert_eq!(session.token.as_deref(), Some("NEW-DOCTOR-TOKEN"));
    assert_eq!(session.role, Some(Role::Doctor));

    let sent = h.backend.requests_to("/api/auth/signup");
    assert_eq!(sent[0].body["medicalSpecialty"], "Diagnostics");
    assert!(sent[0].body.get("confirmPassword").is_none());
}

#[tokio::test]
async fn resetting_a_password_keeps_the_session() {
    let h = harness().await;
    let credentials = Credentials::new("house@example.com", "vicodin");
    h.auth.login(&credentials, Role::Doctor).await.unwrap();

    let message = h.auth.reset_password("house@example.com").await.unwrap();

    assert_eq!(message, "Check your inbox");
    assert!(h.auth.is_authenticated());
    let sent = h.backend.requests_to("/api/auth/reset-password");
    assert_eq!(sent[0].body, json!({ "email": "house@example.com" }));
}

#[tokio::test]
async fn resource_requests_carry_the_token() {
    let h = harness().await;
    let credentials = Credentials::new("house@example.com", "vicodin");
    h.auth.login(&credentials, Role::Doctor).await.unwrap();

    let appointments = h.api.doctor_appointments().await.unwrap();

    assert_eq!(appointments.len(), 1);
    assert_eq!(appointments[0].counterpart().unwrap().full_name(), "Jane Doe");
    let sent = h.backend.requests_to("/api/appointments/doctor");
    assert_eq!(sent[0].authorization.as_deref(), Some("Bearer DOCTOR-TOKEN"));
}

#[tokio::test]
async fn bookings_go_to_the_assigned_doctor() {
    let h = harness().await;
    let credentials = Credentials::new("jane@example.com", "hunter2");
    h.auth.login(&credentials, Role::Patient).await.unwrap();
    let appointment = NewAppointment {
        time: Utc::now(),
        treatment: String::from("Checkup"),
        duration: String::from("30"),
        notes: None,
        doctor_id: None,
    };

    let message = h.api.book_appointment(&appointment).await.unwrap();

    assert_eq!(message.as_deref(), Some("Appointment requested"));
    let sent = h.backend.requests_to("/api/appointments/book");
    assert_eq!(sent[0].body["doctorId"], "d-7");
    assert_eq!(
        sent[0].authorization.as_deref(),
        Some("Bearer PATIENT-TOKEN")
    );
}

#[tokio::test]
async fn silent_server_errors_get_a_readable_message() {
    let h = harness().await;
    let credentials = Credentials::new("house@example.com", "vicodin");
    h.auth.login(&credentials, Role::Doctor).await.unwrap();

    let err = h.api.patients().await.unwrap_err();

    assert!(matches!(err, ApiError::Rejected { .. }));
    assert_eq!(err.to_string(), "Failed to load patients");
}

#[tokio::test]
async fn persisted_sessions_survive_a_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");
    let h = harness_with(SessionStore::new(FileStorage::new(&path))).await;
    let credentials = Credentials::new("house@example.com", "vicodin");
    h.auth.login(&credentials, Role::Doctor).await.unwrap();

    let reopened = SessionStore::new(FileStorage::new(&path));
    let session = reopened.read().unwrap();

    assert_eq!(session.token.as_deref(), Some("DOCTOR-TOKEN"));
    assert_eq!(session.role, Some(Role::Doctor));

    h.auth.logout().unwrap();
    assert!(reopened.read().unwrap().is_empty());
}
