use serde::{Deserialize, Serialize};

/// Body of the health endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

/// Liveness check shared by the HTTP server and the CLI.
#[derive(Clone, Default)]
pub struct HealthService;

impl HealthService {
    pub fn new() -> Self {
        Self
    }

    /// Static method to check health without creating an instance.
    pub fn check_health() -> HealthRes {
        HealthRes {
            ok: true,
            message: "CarePoint is alive".into(),
        }
    }
}
