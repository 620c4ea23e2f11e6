//! Records and payloads exchanged with the ProdFlow admin API.
//!
//! Three flat record kinds exist: [`User`], [`Role`] and [`Device`]. Identifiers are
//! assigned by the server and never generated here. A user's `role_ids` are weak
//! references; nothing on the client side follows or cleans them up.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::error::{ClientError, Result};

/// Maximum length of user name fields and passwords.
pub const MAX_NAME_LEN: usize = 99;
/// Maximum length of a fingerprint token.
pub const MAX_FINGER_TOKEN_LEN: usize = 64;
/// Minimum password length.
pub const MIN_PASSWORD_LEN: usize = 8;

/// The resource collections exposed under `/v1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Users,
    Roles,
    Devices,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 3] = [Self::Users, Self::Roles, Self::Devices];

    /// Path segment of the collection (`/v1/{segment}`).
    pub fn path_segment(&self) -> &'static str {
        match self {
            Self::Users => "users",
            Self::Roles => "roles",
            Self::Devices => "devices",
        }
    }

    /// Query parameter the collection endpoint filters by name on.
    ///
    /// For users the filter matches the username as well as the person-name fields.
    pub fn search_param(&self) -> &'static str {
        match self {
            Self::Users => "name",
            Self::Roles => "role_name",
            Self::Devices => "device_name",
        }
    }

    /// Singular name used in messages.
    pub fn singular(&self) -> &'static str {
        match self {
            Self::Users => "user",
            Self::Roles => "role",
            Self::Devices => "device",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path_segment())
    }
}

/// A payload that can be checked before it is sent.
pub trait Validate {
    fn validate(&self) -> Result<()>;
}

/// Ties a record type to its collection and payload types.
pub trait Resource: DeserializeOwned + Clone + Send + Sync + 'static {
    const KIND: ResourceKind;

    type Create: Serialize + Validate + Send + Sync;
    type Update: Serialize + Validate + Send + Sync;

    fn id(&self) -> Uuid;
}

// --- Users ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patronymic: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finger_token: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub role_ids: Vec<Uuid>,
}

impl User {
    /// `Last First Patronymic`, the way the admin tables show a person.
    pub fn full_name(&self) -> String {
        match &self.patronymic {
            Some(p) if !p.is_empty() => format!("{} {} {}", self.last_name, self.first_name, p),
            _ => format!("{} {}", self.last_name, self.first_name),
        }
    }
}

impl Resource for User {
    const KIND: ResourceKind = ResourceKind::Users;
    type Create = NewUser;
    type Update = UserPatch;

    fn id(&self) -> Uuid {
        self.id
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NewUser {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patronymic: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finger_token: Option<String>,
    pub role_ids: Vec<Uuid>,
}

impl Validate for NewUser {
    fn validate(&self) -> Result<()> {
        required_name("username", &self.username)?;
        required_name("first_name", &self.first_name)?;
        required_name("last_name", &self.last_name)?;
        check_patronymic(self.patronymic.as_deref())?;
        check_password(self.password.as_deref())?;
        check_finger_token(self.finger_token.as_deref())
    }
}

/// Partial update of a user; only the fields that are set are sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UserPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patronymic: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finger_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role_ids: Option<Vec<Uuid>>,
}

impl Validate for UserPatch {
    fn validate(&self) -> Result<()> {
        if let Some(v) = &self.username {
            required_name("username", v)?;
        }
        if let Some(v) = &self.first_name {
            required_name("first_name", v)?;
        }
        if let Some(v) = &self.last_name {
            required_name("last_name", v)?;
        }
        check_patronymic(self.patronymic.as_deref())?;
        check_password(self.password.as_deref())?;
        check_finger_token(self.finger_token.as_deref())
    }
}

// --- Roles ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: Uuid,
    pub name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub permissions: Vec<String>,
}

impl Resource for Role {
    const KIND: ResourceKind = ResourceKind::Roles;
    type Create = NewRole;
    type Update = RolePatch;

    fn id(&self) -> Uuid {
        self.id
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NewRole {
    pub name: String,
    pub permissions: Vec<String>,
}

impl Validate for NewRole {
    fn validate(&self) -> Result<()> {
        not_blank("name", &self.name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RolePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permissions: Option<Vec<String>>,
}

impl Validate for RolePatch {
    fn validate(&self) -> Result<()> {
        match &self.name {
            Some(name) => not_blank("name", name),
            None => Ok(()),
        }
    }
}

// --- Devices ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub id: Uuid,
    pub name: String,
    pub android_id: String,
}

impl Resource for Device {
    const KIND: ResourceKind = ResourceKind::Devices;
    type Create = NewDevice;
    type Update = DevicePatch;

    fn id(&self) -> Uuid {
        self.id
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NewDevice {
    pub name: String,
    pub android_id: String,
}

impl Validate for NewDevice {
    fn validate(&self) -> Result<()> {
        not_blank("name", &self.name)?;
        not_blank("android_id", &self.android_id)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DevicePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub android_id: Option<String>,
}

impl Validate for DevicePatch {
    fn validate(&self) -> Result<()> {
        if let Some(name) = &self.name {
            not_blank("name", name)?;
        }
        if let Some(android_id) = &self.android_id {
            not_blank("android_id", android_id)?;
        }
        Ok(())
    }
}

// --- Auth ---

/// Username/password pair posted to the token endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Validate for Credentials {
    fn validate(&self) -> Result<()> {
        not_blank("username", &self.username)?;
        if self.password.is_empty() {
            return Err(ClientError::validation("password", "is required"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
}

// --- helpers ---

fn null_as_empty<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

fn not_blank(field: &'static str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ClientError::validation(field, "must not be empty"));
    }
    Ok(())
}

fn max_len(field: &'static str, value: &str, max: usize) -> Result<()> {
    if value.chars().count() > max {
        return Err(ClientError::validation(
            field,
            format!("must be at most {max} characters"),
        ));
    }
    Ok(())
}

fn required_name(field: &'static str, value: &str) -> Result<()> {
    not_blank(field, value)?;
    max_len(field, value, MAX_NAME_LEN)
}

fn check_patronymic(value: Option<&str>) -> Result<()> {
    match value {
        Some(v) => max_len("patronymic", v, MAX_NAME_LEN),
        None => Ok(()),
    }
}

fn check_password(value: Option<&str>) -> Result<()> {
    let Some(password) = value else {
        return Ok(());
    };
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ClientError::validation(
            "password",
            format!("must be at least {MIN_PASSWORD_LEN} characters long"),
        ));
    }
    max_len("password", password, MAX_NAME_LEN)
}

fn check_finger_token(value: Option<&str>) -> Result<()> {
    match value {
        Some(v) => max_len("finger_token", v, MAX_FINGER_TOKEN_LEN),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn new_user() -> NewUser {
        NewUser {
            username: "ivanov".into(),
            first_name: "Ivan".into(),
            last_name: "Ivanov".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_user_deserialize_null_roles() {
        let user: User = serde_json::from_value(json!({
            "id": "6f1c2a36-3f0e-4a59-9d0b-2f4c1d2a7b10",
            "username": "ivanov",
            "first_name": "Ivan",
            "last_name": "Ivanov",
            "patronymic": null,
            "finger_token": null,
            "role_ids": null
        }))
        .unwrap();
        assert!(user.role_ids.is_empty());
        assert_eq!(user.patronymic, None);
        assert_eq!(user.full_name(), "Ivanov Ivan");
    }

    #[test]
    fn test_user_ignores_password_in_read_model() {
        let user: User = serde_json::from_value(json!({
            "id": "6f1c2a36-3f0e-4a59-9d0b-2f4c1d2a7b10",
            "username": "ivanov",
            "first_name": "Ivan",
            "last_name": "Ivanov",
            "patronymic": "Petrovich",
            "password": "hashed",
        }))
        .unwrap();
        assert_eq!(user.full_name(), "Ivanov Ivan Petrovich");
        let out = serde_json::to_value(&user).unwrap();
        assert!(out.get("password").is_none());
    }

    #[test]
    fn test_patch_serializes_only_set_fields() {
        let patch = UserPatch {
            first_name: Some("Petr".into()),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&patch).unwrap(),
            json!({ "first_name": "Petr" })
        );

        let patch = RolePatch {
            permissions: Some(vec!["get_users".into()]),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&patch).unwrap(),
            json!({ "permissions": ["get_users"] })
        );
    }

    #[test]
    fn test_new_user_validation() {
        assert!(new_user().validate().is_ok());

        let user = NewUser {
            username: "   ".into(),
            ..new_user()
        };
        let err = user.validate().unwrap_err();
        assert!(matches!(err, ClientError::Validation { field: "username", .. }));

        let user = NewUser {
            last_name: "x".repeat(MAX_NAME_LEN + 1),
            ..new_user()
        };
        assert!(matches!(
            user.validate(),
            Err(ClientError::Validation { field: "last_name", .. })
        ));

        let user = NewUser {
            password: Some("short".into()),
            ..new_user()
        };
        assert!(matches!(
            user.validate(),
            Err(ClientError::Validation { field: "password", .. })
        ));

        let user = NewUser {
            password: Some("longenough".into()),
            finger_token: Some("f".repeat(MAX_FINGER_TOKEN_LEN)),
            ..new_user()
        };
        assert!(user.validate().is_ok());

        let user = NewUser {
            finger_token: Some("f".repeat(MAX_FINGER_TOKEN_LEN + 1)),
            ..new_user()
        };
        assert!(matches!(
            user.validate(),
            Err(ClientError::Validation { field: "finger_token", .. })
        ));
    }

    #[test]
    fn test_patch_validation() {
        assert!(UserPatch::default().validate().is_ok());
        let patch = UserPatch {
            first_name: Some(String::new()),
            ..Default::default()
        };
        assert!(patch.validate().is_err());

        assert!(RolePatch::default().validate().is_ok());
        assert!(
            RolePatch {
                name: Some(" ".into()),
                ..Default::default()
            }
            .validate()
            .is_err()
        );

        assert!(
            DevicePatch {
                android_id: Some(String::new()),
                ..Default::default()
            }
            .validate()
            .is_err()
        );
    }

    #[test]
    fn test_role_and_device_validation() {
        assert!(NewRole::default().validate().is_err());
        assert!(
            NewRole {
                name: "operators".into(),
                permissions: vec![],
            }
            .validate()
            .is_ok()
        );

        let device = NewDevice {
            name: "Scanner 1".into(),
            android_id: String::new(),
        };
        assert!(matches!(
            device.validate(),
            Err(ClientError::Validation { field: "android_id", .. })
        ));
    }

    #[test]
    fn test_credentials_validation() {
        let creds = Credentials {
            username: "admin".into(),
            password: String::new(),
        };
        assert!(matches!(
            creds.validate(),
            Err(ClientError::Validation { field: "password", .. })
        ));
    }

    #[test]
    fn test_resource_kind_paths() {
        assert_eq!(ResourceKind::Users.path_segment(), "users");
        assert_eq!(ResourceKind::Roles.to_string(), "roles");
        assert_eq!(ResourceKind::Devices.singular(), "device");
        assert_eq!(User::KIND, ResourceKind::Users);
        assert_eq!(Role::KIND, ResourceKind::Roles);
        assert_eq!(Device::KIND, ResourceKind::Devices);
    }
}
