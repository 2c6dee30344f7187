use actix_web::{FromRequest, HttpRequest, dev::Payload, web::Data};
use futures::future::{Ready, ready};

use crate::auth::jwt::verify_token;
use crate::config::Config;
use crate::error::ApiError;
use crate::model::role::Role;

pub const SESSION_COOKIE: &str = "token";

/// Identity decoded from the session cookie, available to every
/// handler as an extractor.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: u64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: Role,
}

impl FromRequest for AuthUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let token = match req.cookie(SESSION_COOKIE) {
            Some(c) => c.value().to_owned(),
            None => {
                return ready(Err(ApiError::Unauthorized(
                    "Accesso negato: Autenticazione richiesta".into(),
                )
                .into()));
            }
        };

        let config = match req.app_data::<Data<Config>>() {
            Some(c) => c,
            None => {
                return ready(Err(
                    ApiError::Internal("Configurazione non disponibile".into()).into()
                ));
            }
        };

        // Missing cookie is 401, a bad or expired one is 403.
        let claims = match verify_token(&token, &config.jwt_secret) {
            Ok(c) => c,
            Err(_) => {
                return ready(Err(
                    ApiError::Forbidden("Token non valido o scaduto".into()).into()
                ));
            }
        };

        ready(Ok(AuthUser {
            id: claims.user_id,
            first_name: claims.first_name,
            last_name: claims.last_name,
            email: claims.email,
            role: claims.role,
        }))
    }
}

impl AuthUser {
    pub fn require_manager(&self) -> Result<(), ApiError> {
        if self.role == Role::Manager {
            Ok(())
        } else {
            Err(ApiError::Forbidden(
                "Operazione consentita solo ai Responsabili".into(),
            ))
        }
    }

    pub fn is_employee(&self) -> bool {
        self.role == Role::Employee
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: Role) -> AuthUser {
        AuthUser {
            id: 1,
            first_name: "Mario".into(),
            last_name: "Rossi".into(),
            email: "m@example.com".into(),
            role,
        }
    }

    #[test]
    fn employee_fails_manager_gate() {
        assert!(matches!(
            user(Role::Employee).require_manager(),
            Err(ApiError::Forbidden(_))
        ));
        assert!(user(Role::Manager).require_manager().is_ok());
    }
}
