use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::error::ApiError;
use crate::model::role::Role;

/// Full user row, password hash included. Never serialized.
#[derive(Debug, FromRow)]
pub struct UserRow {
    pub id: u64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub role: String,
}

impl UserRow {
    pub fn role(&self) -> Result<Role, ApiError> {
        self.role
            .parse()
            .map_err(|_| ApiError::Internal(format!("Ruolo sconosciuto: {}", self.role)))
    }
}

/// Public user shape returned by register/login/me.
#[derive(Debug, Serialize, ToSchema)]
pub struct UserResponse {
    #[schema(example = 1)]
    pub id: u64,
    #[serde(rename = "nome")]
    #[schema(example = "Mario")]
    pub first_name: String,
    #[serde(rename = "cognome")]
    #[schema(example = "Rossi")]
    pub last_name: String,
    #[schema(example = "mario.rossi@example.com")]
    pub email: String,
    #[serde(rename = "ruolo")]
    pub role: Role,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_response_uses_italian_field_names() {
        let user = UserResponse {
            id: 1,
            first_name: "Mario".into(),
            last_name: "Rossi".into(),
            email: "m@example.com".into(),
            role: Role::Employee,
        };
        let value = serde_json::to_value(&user).unwrap();
        assert_eq!(value["nome"], "Mario");
        assert_eq!(value["cognome"], "Rossi");
        assert_eq!(value["ruolo"], "Dipendente");
    }

    #[test]
    fn unknown_role_column_is_internal_error() {
        let row = UserRow {
            id: 1,
            first_name: "a".into(),
            last_name: "b".into(),
            email: "a@b.it".into(),
            password: "hash".into(),
            role: "Stagista".into(),
        };
        assert!(matches!(row.role(), Err(ApiError::Internal(_))));
    }
}
