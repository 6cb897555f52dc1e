use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use tower::ServiceExt;

use carepoint_core::{CoreConfig, CoreServices, Role, SeedUser};

const ADMIN_KEY: &str = "admin-key-0123456789";
const DOCTOR_KEY: &str = "doctor-key-0123456789";
const NURSE_KEY: &str = "nurse-key-0123456789";
const PHARMACIST_KEY: &str = "pharm-key-0123456789";

fn seed(name: &str, role: Role, key: &str) -> SeedUser {
    SeedUser {
        name: name.into(),
        email: format!("{}@clinic.test", role.as_str()),
        role,
        api_key: key.into(),
    }
}

fn app() -> Router {
    let cfg = CoreConfig::new(Some(ADMIN_KEY.into()), 30).unwrap();
    let services = CoreServices::new(Arc::new(cfg));
    services
        .bootstrap(vec![
            seed("Dr Ada", Role::Doctor, DOCTOR_KEY),
            seed("Nurse Ify", Role::Nurse, NURSE_KEY),
            seed("Pharm Tunde", Role::Pharmacist, PHARMACIST_KEY),
        ])
        .unwrap();
    api_rest::router(services)
}

async fn send(app: &Router, method: Method, uri: &str, key: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(key) = key {
        builder = builder.header("x-api-key", key);
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), 1 << 20).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

async fn create_patient(app: &Router) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/patients",
        Some(NURSE_KEY),
        Some(json!({
            "firstName": "Amara",
            "lastName": "Okafor",
            "dateOfBirth": "1990-04-12"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn health_is_public() {
    let app = app();
    let (status, body) = send(&app, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
}

#[tokio::test]
async fn missing_or_unknown_key_is_401() {
    let app = app();
    let (status, body) = send(&app, Method::GET, "/patients", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "AUTH_REQUIRED");

    let (status, _) = send(&app, Method::GET, "/patients", Some("nope-0123456789abcdef"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn symptom_checker_scores_both_diseases() {
    let app = app();
    let (status, body) = send(
        &app,
        Method::POST,
        "/symptom-checker",
        Some(PHARMACIST_KEY),
        Some(json!({
            "symptoms": [
                {"symptom": "fever"},
                {"symptom": "chills"},
                {"symptom": "headache"},
                {"symptom": "nausea"},
                {"symptom": "vomiting"}
            ]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["malaria"]["score"], 5);
    assert_eq!(body["malaria"]["riskLevel"], "high");
    assert_eq!(
        body["malaria"]["recommendation"],
        "Immediate malaria testing and treatment recommended"
    );
    assert_eq!(body["typhoid"]["score"], 2);
    assert_eq!(body["typhoid"]["riskLevel"], "low");
    assert_eq!(body["typhoid"]["matchingSymptoms"], json!(["fever", "headache"]));
}

#[tokio::test]
async fn symptom_checker_honours_lab_results() {
    let app = app();
    let (status, body) = send(
        &app,
        Method::POST,
        "/symptom-checker",
        Some(DOCTOR_KEY),
        Some(json!({
            "symptoms": [{"symptom": "fever"}],
            "testResults": {"malaria": {"rapidTest": "positive"}}
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["malaria"]["score"], 1);
    assert_eq!(body["malaria"]["riskLevel"], "high");
    assert_eq!(body["typhoid"]["riskLevel"], "low");
}

#[tokio::test]
async fn symptom_checker_rejects_empty_list() {
    let app = app();
    let (status, body) = send(
        &app,
        Method::POST,
        "/symptom-checker",
        Some(DOCTOR_KEY),
        Some(json!({"symptoms": []})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert_eq!(body["error"]["message"], "symptoms required");
}

#[tokio::test]
async fn symptoms_that_are_not_a_list_fail_validation() {
    let app = app();
    for symptoms in [json!("fever"), json!({"symptom": "fever"}), json!(["fever"])] {
        let (status, body) = send(
            &app,
            Method::POST,
            "/symptom-checker",
            Some(DOCTOR_KEY),
            Some(json!({"symptoms": symptoms})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert_eq!(body["error"]["message"], "symptoms must be a list of symptom objects");
    }
}

#[tokio::test]
async fn blank_severity_fails_validation() {
    let app = app();
    let (status, body) = send(
        &app,
        Method::POST,
        "/symptom-checker",
        Some(DOCTOR_KEY),
        Some(json!({"symptoms": [{"symptom": "fever", "severity": ""}]})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn unknown_lab_outcome_is_bad_request() {
    let app = app();
    let (status, body) = send(
        &app,
        Method::POST,
        "/symptom-checker",
        Some(DOCTOR_KEY),
        Some(json!({
            "symptoms": [{"symptom": "fever"}],
            "testResults": {"malaria": {"microscopy": "maybe"}}
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn diagnosis_stores_tiers_and_update_keeps_them() {
    let app = app();
    let patient_id = create_patient(&app).await;

    let (status, diagnosis) = send(
        &app,
        Method::POST,
        "/diagnoses",
        Some(DOCTOR_KEY),
        Some(json!({
            "patientId": patient_id,
            "symptoms": [{"symptom": "fever", "severity": "severe"}],
            "typhoidAssessment": {"testResults": {"widalTest": "positive"}},
            "finalDiagnosis": "Typhoid fever"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(diagnosis["malariaAssessment"]["riskLevel"], "low");
    assert_eq!(diagnosis["typhoidAssessment"]["riskLevel"], "high");
    assert!(diagnosis["malariaAssessment"].get("score").is_none());
    let id = diagnosis["id"].as_str().unwrap();

    let (status, updated) = send(
        &app,
        Method::PUT,
        &format!("/diagnoses/{id}"),
        Some(DOCTOR_KEY),
        Some(json!({
            "symptoms": [
                {"symptom": "fever"}, {"symptom": "chills"}, {"symptom": "headache"},
                {"symptom": "nausea"}, {"symptom": "vomiting"}
            ]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["malariaAssessment"]["riskLevel"], "low");

    let (status, reassessed) = send(
        &app,
        Method::POST,
        &format!("/diagnoses/{id}/reassess"),
        Some(DOCTOR_KEY),
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reassessed["diagnosis"]["malariaAssessment"]["riskLevel"], "high");
    assert_eq!(reassessed["assessment"]["malaria"]["score"], 5);

    let (status, reassessed) = send(
        &app,
        Method::POST,
        &format!("/diagnoses/{id}/reassess"),
        Some(DOCTOR_KEY),
        Some(json!({"testResults": {"malaria": {"microscopy": "negative"}}})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let typhoid = &reassessed["diagnosis"]["typhoidAssessment"];
    assert_eq!(typhoid["testResults"]["widalTest"], "positive");
    assert_eq!(typhoid["riskLevel"], "high");
}

#[tokio::test]
async fn nurses_cannot_record_diagnoses() {
    let app = app();
    let patient_id = create_patient(&app).await;
    let (status, body) = send(
        &app,
        Method::POST,
        "/diagnoses",
        Some(NURSE_KEY),
        Some(json!({"patientId": patient_id, "symptoms": [{"symptom": "fever"}]})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "FORBIDDEN");
}

#[tokio::test]
async fn double_booking_is_a_conflict() {
    let app = app();
    let patient_id = create_patient(&app).await;
    let (_, me) = send(&app, Method::GET, "/users/me", Some(DOCTOR_KEY), None).await;
    let doctor_id = me["id"].as_str().unwrap().to_string();
    let at = (Utc::now() + Duration::days(2)).to_rfc3339();

    let booking = json!({"patientId": patient_id, "doctorId": doctor_id, "scheduledAt": at});
    let (status, _) = send(&app, Method::POST, "/appointments", Some(NURSE_KEY), Some(booking.clone())).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(&app, Method::POST, "/appointments", Some(NURSE_KEY), Some(booking)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "CONFLICT");
}

#[tokio::test]
async fn prescription_dispense_flow() {
    let app = app();
    let patient_id = create_patient(&app).await;
    let (status, prescription) = send(
        &app,
        Method::POST,
        "/prescriptions",
        Some(DOCTOR_KEY),
        Some(json!({
            "patientId": patient_id,
            "medications": [{
                "name": "Ciprofloxacin",
                "dosage": "500 mg",
                "frequency": "twice daily",
                "durationDays": 7,
                "quantity": 14
            }]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = prescription["id"].as_str().unwrap();

    let (status, dispensed) = send(
        &app,
        Method::POST,
        &format!("/prescriptions/{id}/dispense"),
        Some(PHARMACIST_KEY),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(dispensed["status"], "dispensed");

    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/prescriptions/{id}/dispense"),
        Some(PHARMACIST_KEY),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn unknown_record_is_404_and_bad_id_is_400() {
    let app = app();
    let (status, body) = send(
        &app,
        Method::GET,
        &format!("/patients/{}", uuid::Uuid::new_v4()),
        Some(NURSE_KEY),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");

    let (status, _) = send(&app, Method::GET, "/patients/not-a-uuid", Some(NURSE_KEY), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn summary_report_is_admin_only() {
    let app = app();
    let (status, body) = send(&app, Method::GET, "/reports/summary", Some(ADMIN_KEY), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["usersByRole"]["doctor"], 1);
    assert_eq!(body["patients"], 0);

    let (status, _) = send(&app, Method::GET, "/reports/summary", Some(DOCTOR_KEY), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn openapi_document_is_served() {
    let app = app();
    let (status, body) = send(&app, Method::GET, "/api-docs/openapi.json", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/symptom-checker"].is_object());
}
