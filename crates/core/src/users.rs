//! Staff accounts and API-key authentication.
//!
//! API keys are stored as SHA-256 digests. Issuing and rotating keys is left to operators; this
//! module only registers accounts with a caller-supplied key and resolves keys to principals.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use uuid::Uuid;

use carepoint_types::NonEmptyText;

use crate::access::{Principal, Role};
use crate::config::{validate_api_key_format, SeedUser};
use crate::store::{Entity, Store};
use crate::{RecordError, RecordResult};

/// Stored account. Never serialised directly; see [`UserProfile`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    api_key_digest: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for User {
    const KIND: &'static str = "user";

    fn id(&self) -> Uuid {
        self.id
    }

    fn unique_keys(&self) -> Vec<(&'static str, String)> {
        vec![
            ("email", self.email.clone()),
            ("api key", self.api_key_digest.clone()),
        ]
    }
}

/// Public view of an account.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
            active: user.active,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub role: Role,
    pub api_key: String,
}

impl From<SeedUser> for NewUser {
    fn from(seed: SeedUser) -> Self {
        Self {
            name: seed.name,
            email: seed.email,
            role: seed.role,
            api_key: seed.api_key,
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub active: Option<bool>,
}

fn digest_api_key(api_key: &str) -> String {
    hex::encode(Sha256::digest(api_key.as_bytes()))
}

fn normalise_email(email: &str) -> RecordResult<String> {
    let email = NonEmptyText::new("email", email)?.as_str().to_lowercase();
    let valid = email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
    if !valid {
        return Err(RecordError::InvalidInput(format!(
            "'{email}' is not a valid email address"
        )));
    }
    Ok(email)
}

#[derive(Clone)]
pub struct UserService {
    store: Arc<Store>,
}

impl UserService {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    /// Register an account without a role check. Startup bootstrap only.
    pub fn bootstrap(&self, new_user: NewUser) -> RecordResult<UserProfile> {
        let email = normalise_email(&new_user.email)?;
        if let Some(existing) = self.store.users.find_one(|u| u.email == email)? {
            tracing::info!(email = %existing.email, "bootstrap account already present");
            return Ok(UserProfile::from(&existing));
        }
        self.insert(new_user)
    }

    /// Register an account. Admin only.
    ///
    /// # Errors
    ///
    /// - [`RecordError::Forbidden`] if the caller is not an admin,
    /// - [`RecordError::InvalidInput`] for a blank name, malformed email or weak API key,
    /// - [`RecordError::Conflict`] if the email or API key is already registered.
    pub fn create(&self, principal: &Principal, new_user: NewUser) -> RecordResult<UserProfile> {
        principal.require("create users", &[Role::Admin])?;
        self.insert(new_user)
    }

    fn insert(&self, new_user: NewUser) -> RecordResult<UserProfile> {
        let name = NonEmptyText::new("name", &new_user.name)?;
        let email = normalise_email(&new_user.email)?;
        validate_api_key_format(&new_user.api_key)?;

        let now = Utc::now();
        let user = self.store.users.insert(User {
            id: Uuid::new_v4(),
            name: name.into_string(),
            email,
            role: new_user.role,
            api_key_digest: digest_api_key(&new_user.api_key),
            active: true,
            created_at: now,
            updated_at: now,
        })?;

        tracing::info!(user_id = %user.id, role = %user.role, "user created");
        Ok(UserProfile::from(&user))
    }

    pub fn list(&self, principal: &Principal) -> RecordResult<Vec<UserProfile>> {
        principal.require("list users", &[Role::Admin])?;
        Ok(self
            .store
            .users
            .find(|_| true)?
            .iter()
            .map(UserProfile::from)
            .collect())
    }

    /// Fetch an account. Admins may read any account; everyone else only their own.
    pub fn get(&self, principal: &Principal, id: Uuid) -> RecordResult<UserProfile> {
        if principal.user_id != id {
            principal.require("read other users", &[Role::Admin])?;
        }
        Ok(UserProfile::from(&self.store.users.get(id)?))
    }

    /// Change name, role or active flag. Admin only; admins cannot demote or deactivate
    /// themselves.
    pub fn update(
        &self,
        principal: &Principal,
        id: Uuid,
        update: UserUpdate,
    ) -> RecordResult<UserProfile> {
        principal.require("update users", &[Role::Admin])?;

        if principal.user_id == id
            && (update.active == Some(false) || update.role.is_some_and(|r| r != Role::Admin))
        {
            return Err(RecordError::InvalidInput(
                "admins cannot demote or deactivate their own account".into(),
            ));
        }

        let name = update
            .name
            .as_deref()
            .map(|n| NonEmptyText::new("name", n))
            .transpose()?;

        let user = self.store.users.update(id, |user| {
            if let Some(name) = name {
                user.name = name.into_string();
            }
            if let Some(role) = update.role {
                user.role = role;
            }
            if let Some(active) = update.active {
                user.active = active;
            }
            user.updated_at = Utc::now();
            Ok(())
        })?;

        tracing::info!(user_id = %user.id, role = %user.role, active = user.active, "user updated");
        Ok(UserProfile::from(&user))
    }

    /// Deactivate an account. Accounts are never deleted so records keep their authors.
    pub fn deactivate(&self, principal: &Principal, id: Uuid) -> RecordResult<UserProfile> {
        self.update(
            principal,
            id,
            UserUpdate {
                active: Some(false),
                ..UserUpdate::default()
            },
        )
    }

    /// Resolve an API key to the active account holding it.
    pub fn authenticate(&self, api_key: &str) -> RecordResult<Principal> {
        let digest = digest_api_key(api_key.trim());
        match self.store.users.find_one(|u| u.api_key_digest == digest)? {
            Some(user) if user.active => Ok(Principal {
                user_id: user.id,
                name: user.name,
                role: user.role,
            }),
            Some(user) => {
                tracing::warn!(user_id = %user.id, "inactive account presented an api key");
                Err(RecordError::Unauthenticated)
            }
            None => Err(RecordError::Unauthenticated),
        }
    }

    /// Active account with the doctor role, as required for bookings and prescriptions.
    pub(crate) fn require_active_doctor(&self, id: Uuid) -> RecordResult<User> {
        let user = self.store.users.get(id)?;
        if user.role != Role::Doctor || !user.active {
            return Err(RecordError::InvalidInput(format!(
                "user {id} is not an active doctor"
            )));
        }
        Ok(user)
    }

    pub(crate) fn count_by_role(&self, role: Role) -> RecordResult<usize> {
        self.store.users.count(|u| u.role == role)
    }
}
