use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo_types::User;

/// Request body for user registration. Spanish aliases match the signup form.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    #[serde(alias = "nombre")]
    pub name: String,
    #[serde(alias = "apellido")]
    pub surname: String,
    pub dni: String,
    #[serde(default)]
    pub cuil_cuit: Option<String>,
    pub email: String,
    #[serde(default, alias = "telefono")]
    pub phone: String,
    #[serde(default = "default_guests", alias = "cantidad_personas")]
    pub guests: i32,
    pub password: String,
}

fn default_guests() -> i32 {
    1
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateUserRequest {
    #[serde(alias = "nombre")]
    pub name: String,
    #[serde(alias = "apellido")]
    pub surname: String,
    pub email: String,
}

/// Row of the admin user listing.
#[derive(Debug, Serialize)]
pub struct UserListItem {
    pub id: Uuid,
    pub name: String,
    pub surname: String,
    pub email: String,
}

impl From<User> for UserListItem {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            name: u.name,
            surname: u.surname,
            email: u.email,
        }
    }
}

/// Returned after registration.
#[derive(Debug, Serialize)]
pub struct RegisteredUser {
    pub id: Uuid,
    pub name: String,
    pub surname: String,
    pub dni: String,
    pub cuil_cuit: Option<String>,
    pub email: String,
    pub phone: String,
    pub guests: i32,
    pub active: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<User> for RegisteredUser {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            name: u.name,
            surname: u.surname,
            dni: u.dni,
            cuil_cuit: u.cuil_cuit,
            email: u.email,
            phone: u.phone,
            guests: u.guests,
            active: u.active,
            created_at: u.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}
