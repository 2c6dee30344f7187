use actix_web::middleware::Next;
use actix_web::{
    Error, HttpMessage, HttpResponse,
    body::BoxBody,
    dev::{ServiceRequest, ServiceResponse},
    web::Data,
};
use serde_json::json;

use crate::auth::auth::{AuthUser, SESSION_COOKIE};
use crate::auth::jwt::verify_token;
use crate::config::Config;

/// Authentication gate for protected scopes: pulls the JWT from the
/// session cookie and stashes the decoded identity in the request
/// extensions. Missing cookie → 401, invalid or expired token → 403.
pub async fn auth_middleware(
    req: ServiceRequest,
    next: Next<BoxBody>,
) -> Result<ServiceResponse<BoxBody>, Error> {
    let config = req
        .app_data::<Data<Config>>()
        .ok_or_else(|| actix_web::error::ErrorInternalServerError("App config missing"))?;

    let token = match req.cookie(SESSION_COOKIE) {
        Some(c) => c.value().to_owned(),
        None => {
            let resp = HttpResponse::Unauthorized()
                .json(json!({"error": "Accesso negato: Autenticazione richiesta"}));
            return Ok(req.into_response(resp.map_into_boxed_body()));
        }
    };

    let claims = match verify_token(&token, &config.jwt_secret) {
        Ok(c) => c,
        Err(_) => {
            let resp =
                HttpResponse::Forbidden().json(json!({"error": "Token non valido o scaduto"}));
            return Ok(req.into_response(resp.map_into_boxed_body()));
        }
    };

    let auth_user = AuthUser {
        id: claims.user_id,
        first_name: claims.first_name,
        last_name: claims.last_name,
        email: claims.email,
        role: claims.role,
    };

    req.extensions_mut().insert(auth_user);

    next.call(req).await
}
