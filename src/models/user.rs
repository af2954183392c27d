use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const USERS: &str = "users";

/// Fields a user may change on their own profile
pub const UPDATABLE_FIELDS: &[&str] = &[
    "onboardingStep",
    "isProfileComplete",
    "professionId",
    "specialityIds",
    "firstName",
    "lastName",
    "birthDate",
];

pub const DEFAULT_ROLE: &str = "user";

/// Profile document written at account provisioning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDocument {
    pub uid: String,
    pub email: String,
    #[serde(with = "super::timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "super::timestamp")]
    pub updated_at: DateTime<Utc>,
    pub role: String,
    pub is_profile_complete: bool,
    pub onboarding_step: u32,
}

impl UserDocument {
    pub fn provision(uid: &str, email: Option<&str>, now: DateTime<Utc>) -> Self {
        Self {
            uid: uid.to_string(),
            email: email.unwrap_or_default().to_string(),
            created_at: now,
            updated_at: now,
            role: DEFAULT_ROLE.to_string(),
            is_profile_complete: false,
            onboarding_step: 0,
        }
    }
}
