use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// User record as stored by either backend.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String, // login identity, unique
    pub role: String,
    pub website: Option<String>,
    pub age: Option<i32>,
    pub photo: Option<String>,
    #[serde(skip_serializing)]
    pub password_hash: String, // Argon2 PHC string, not exposed in JSON
    pub is_active: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Fields needed to insert a user. The password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub role: String,
    pub website: Option<String>,
    pub age: Option<i32>,
    pub photo: Option<String>,
    pub password_hash: String,
    pub is_active: bool,
}

/// Partial update; `None` keeps the stored value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
    pub website: Option<String>,
    pub age: Option<i32>,
    pub photo: Option<String>,
    pub is_active: Option<bool>,
}

impl UserPatch {
    pub fn apply(self, user: &mut User) {
        if let Some(name) = self.name {
            user.name = name;
        }
        if let Some(email) = self.email {
            user.email = email;
        }
        if let Some(role) = self.role {
            user.role = role;
        }
        if let Some(website) = self.website {
            user.website = Some(website);
        }
        if let Some(age) = self.age {
            user.age = Some(age);
        }
        if let Some(photo) = self.photo {
            user.photo = Some(photo);
        }
        if let Some(is_active) = self.is_active {
            user.is_active = is_active;
        }
    }
}
