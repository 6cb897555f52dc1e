//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and passed into core services, so request
//! handling never reads process-wide environment variables.

use crate::access::Role;
use crate::constants::{
    DEFAULT_APPOINTMENT_MINUTES, MAX_APPOINTMENT_MINUTES, MIN_API_KEY_LEN, MIN_APPOINTMENT_MINUTES,
};
use crate::{RecordError, RecordResult};
use serde::Deserialize;
use std::path::Path;

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    admin_api_key: Option<String>,
    default_appointment_minutes: u32,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::InvalidInput`] if the admin key is shorter than the minimum key
    /// length or the appointment length is outside the bookable range.
    pub fn new(
        admin_api_key: Option<String>,
        default_appointment_minutes: u32,
    ) -> RecordResult<Self> {
        let admin_api_key = admin_api_key
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty());

        if let Some(key) = &admin_api_key {
            validate_api_key_format(key)?;
        }
        validate_appointment_minutes(default_appointment_minutes)?;

        Ok(Self {
            admin_api_key,
            default_appointment_minutes,
        })
    }

    pub fn admin_api_key(&self) -> Option<&str> {
        self.admin_api_key.as_deref()
    }

    pub fn default_appointment_minutes(&self) -> u32 {
        self.default_appointment_minutes
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            admin_api_key: None,
            default_appointment_minutes: DEFAULT_APPOINTMENT_MINUTES,
        }
    }
}

pub(crate) fn validate_api_key_format(key: &str) -> RecordResult<()> {
    if key.len() < MIN_API_KEY_LEN {
        return Err(RecordError::InvalidInput(format!(
            "api key must be at least {MIN_API_KEY_LEN} characters"
        )));
    }
    if key.chars().any(char::is_whitespace) {
        return Err(RecordError::InvalidInput(
            "api key must not contain whitespace".into(),
        ));
    }
    Ok(())
}

pub(crate) fn validate_appointment_minutes(minutes: u32) -> RecordResult<()> {
    if !(MIN_APPOINTMENT_MINUTES..=MAX_APPOINTMENT_MINUTES).contains(&minutes) {
        return Err(RecordError::InvalidInput(format!(
            "appointment length must be between {MIN_APPOINTMENT_MINUTES} and {MAX_APPOINTMENT_MINUTES} minutes"
        )));
    }
    Ok(())
}

/// Parse the default appointment length from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns [`DEFAULT_APPOINTMENT_MINUTES`].
pub fn appointment_minutes_from_env_value(value: Option<String>) -> RecordResult<u32> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());

    match value {
        None => Ok(DEFAULT_APPOINTMENT_MINUTES),
        Some(v) => {
            let minutes = v.parse::<u32>().map_err(|_| {
                RecordError::InvalidInput(format!("appointment length '{v}' is not a number"))
            })?;
            validate_appointment_minutes(minutes)?;
            Ok(minutes)
        }
    }
}

/// One account from the seed-users file.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct SeedUser {
    pub name: String,
    pub email: String,
    pub role: Role,
    pub api_key: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SeedFile {
    #[serde(default)]
    users: Vec<SeedUser>,
}

/// Parse seed accounts from YAML text.
///
/// Uses `serde_path_to_error` so a schema mismatch reports the failing path
/// (for example `users[1].role`).
pub fn parse_seed_users(yaml_text: &str) -> RecordResult<Vec<SeedUser>> {
    let deserializer = serde_yaml::Deserializer::from_str(yaml_text);

    match serde_path_to_error::deserialize::<_, SeedFile>(deserializer) {
        Ok(file) => Ok(file.users),
        Err(err) => {
            let path = err.path().to_string();
            let path = if path.is_empty() || path == "." {
                "<root>".to_string()
            } else {
                path
            };
            Err(RecordError::SeedFileSchema {
                path,
                message: err.into_inner().to_string(),
            })
        }
    }
}

/// Read and parse the seed-users file at `path`.
pub fn load_seed_users(path: &Path) -> RecordResult<Vec<SeedUser>> {
    let text = std::fs::read_to_string(path).map_err(RecordError::SeedFileRead)?;
    parse_seed_users(&text)
}
