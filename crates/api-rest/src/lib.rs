//! # API REST
//!
//! REST API implementation for CarePoint.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - API-key authentication and role errors as JSON bodies
//! - OpenAPI/Swagger documentation
//!
//! Uses `api-shared` for common types and `carepoint-core` for every record operation.

#![warn(rust_2018_idioms)]

mod auth;
pub mod error;
mod extract;
mod handlers;

use axum::routing::{get, post, put};
use axum::{middleware, Router};
use tower_http::cors::CorsLayer;
use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use api_shared::API_KEY_HEADER;
use carepoint_core::CoreServices;

use handlers::{
    appointments, diagnoses, health, patients, prescriptions, reports, symptom_checker, users,
};

pub use error::{ApiError, ApiResult};

/// Application state shared by every handler and the auth middleware.
#[derive(Clone)]
pub struct AppState {
    pub services: CoreServices,
}

struct ApiKeySecurity;

impl Modify for ApiKeySecurity {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "api_key",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new(API_KEY_HEADER))),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        symptom_checker::check_symptoms,
        users::list_users,
        users::create_user,
        users::current_user,
        users::get_user,
        users::update_user,
        users::deactivate_user,
        patients::list_patients,
        patients::create_patient,
        patients::get_patient,
        patients::update_patient,
        appointments::list_appointments,
        appointments::create_appointment,
        appointments::get_appointment,
        appointments::update_appointment_status,
        diagnoses::list_diagnoses,
        diagnoses::create_diagnosis,
        diagnoses::get_diagnosis,
        diagnoses::update_diagnosis,
        diagnoses::reassess_diagnosis,
        prescriptions::list_prescriptions,
        prescriptions::create_prescription,
        prescriptions::get_prescription,
        prescriptions::dispense_prescription,
        prescriptions::cancel_prescription,
        reports::summary_report,
    ),
    components(schemas(
        api_shared::HealthRes,
        api_shared::ErrorBody,
        api_shared::ErrorDetail,
        carepoint_assessment::AssessmentRequest,
        carepoint_assessment::Assessment,
        carepoint_assessment::DiseaseAssessment,
        carepoint_assessment::RiskLevel,
        carepoint_assessment::SymptomInput,
        carepoint_assessment::SymptomEntry,
        carepoint_assessment::Severity,
        carepoint_assessment::LabResults,
        carepoint_assessment::LabOutcome,
        carepoint_assessment::MalariaTests,
        carepoint_assessment::TyphoidTests,
        carepoint_core::Role,
        carepoint_core::UserProfile,
        carepoint_core::NewUser,
        carepoint_core::UserUpdate,
        carepoint_core::Gender,
        carepoint_core::Patient,
        carepoint_core::NewPatient,
        carepoint_core::PatientUpdate,
        carepoint_core::AppointmentStatus,
        carepoint_core::Appointment,
        carepoint_core::NewAppointment,
        carepoint_core::AppointmentStatusUpdate,
        carepoint_core::MalariaSpecies,
        carepoint_core::MalariaAssessmentRecord,
        carepoint_core::TyphoidAssessmentRecord,
        carepoint_core::MalariaAssessmentInput,
        carepoint_core::TyphoidAssessmentInput,
        carepoint_core::Diagnosis,
        carepoint_core::NewDiagnosis,
        carepoint_core::DiagnosisUpdate,
        carepoint_core::LabResultsUpdate,
        carepoint_core::ReassessRequest,
        carepoint_core::ReassessedDiagnosis,
        carepoint_core::PrescriptionStatus,
        carepoint_core::Medication,
        carepoint_core::Prescription,
        carepoint_core::NewPrescription,
        carepoint_core::RiskCounts,
        carepoint_core::SummaryReport,
    )),
    modifiers(&ApiKeySecurity),
    tags(
        (name = "symptom-checker", description = "Rule-based malaria and typhoid risk assessment"),
        (name = "diagnoses", description = "Diagnosis records with embedded risk tiers")
    )
)]
pub struct ApiDoc;

/// Build the REST router.
///
/// `/health`, `/swagger-ui` and `/api-docs` are public. Every other route requires an
/// `x-api-key` header resolving to an active account.
pub fn router(services: CoreServices) -> Router {
    let state = AppState { services };

    let protected = Router::new()
        .route("/symptom-checker", post(symptom_checker::check_symptoms))
        .route("/users", get(users::list_users).post(users::create_user))
        .route("/users/me", get(users::current_user))
        .route(
            "/users/:id",
            get(users::get_user)
                .put(users::update_user)
                .delete(users::deactivate_user),
        )
        .route(
            "/patients",
            get(patients::list_patients).post(patients::create_patient),
        )
        .route(
            "/patients/:id",
            get(patients::get_patient).put(patients::update_patient),
        )
        .route(
            "/appointments",
            get(appointments::list_appointments).post(appointments::create_appointment),
        )
        .route("/appointments/:id", get(appointments::get_appointment))
        .route(
            "/appointments/:id/status",
            put(appointments::update_appointment_status),
        )
        .route(
            "/diagnoses",
            get(diagnoses::list_diagnoses).post(diagnoses::create_diagnosis),
        )
        .route(
            "/diagnoses/:id",
            get(diagnoses::get_diagnosis).put(diagnoses::update_diagnosis),
        )
        .route(
            "/diagnoses/:id/reassess",
            post(diagnoses::reassess_diagnosis),
        )
        .route(
            "/prescriptions",
            get(prescriptions::list_prescriptions).post(prescriptions::create_prescription),
        )
        .route("/prescriptions/:id", get(prescriptions::get_prescription))
        .route(
            "/prescriptions/:id/dispense",
            post(prescriptions::dispense_prescription),
        )
        .route(
            "/prescriptions/:id/cancel",
            post(prescriptions::cancel_prescription),
        )
        .route("/reports/summary", get(reports::summary_report))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_api_key,
        ));

    Router::new()
        .route("/health", get(health::health))
        .merge(protected)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
