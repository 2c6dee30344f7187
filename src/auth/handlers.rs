use actix_web::cookie::{Cookie, SameSite, time::Duration};
use actix_web::{HttpResponse, web};
use serde::Deserialize;
use serde_json::json;
use sqlx::MySqlPool;
use tracing::{error, info, instrument};
use utoipa::ToSchema;

use crate::auth::auth::{AuthUser, SESSION_COOKIE};
use crate::auth::jwt::generate_session_token;
use crate::auth::password::{hash_password, verify_password};
use crate::config::Config;
use crate::error::ApiError;
use crate::model::role::Role;
use crate::model::user::{UserRow, UserResponse};

#[derive(Deserialize, ToSchema)]
pub struct RegisterRequest {
    #[serde(rename = "nome")]
    #[schema(example = "Mario")]
    pub first_name: String,
    #[serde(rename = "cognome")]
    #[schema(example = "Rossi")]
    pub last_name: String,
    #[schema(example = "mario.rossi@example.com")]
    pub email: String,
    #[schema(example = "password123")]
    pub password: String,
    /// Defaults to Dipendente when omitted.
    #[serde(rename = "ruolo")]
    pub role: Option<Role>,
}

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    #[schema(example = "mario.rossi@example.com")]
    pub email: String,
    #[schema(example = "password123")]
    pub password: String,
}

/// Loose format check only: local part and domain non-empty, no
/// whitespace, domain contains an inner dot. Deliverability is not
/// verified.
fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    let clean = |s: &str| !s.is_empty() && !s.contains(char::is_whitespace) && !s.contains('@');
    clean(local) && clean(domain) && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
}

fn session_cookie(token: String, config: &Config) -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE, token)
        .path("/")
        .http_only(true)
        .secure(config.production)
        .same_site(if config.production {
            SameSite::None
        } else {
            SameSite::Lax
        })
        .max_age(Duration::seconds(config.token_ttl as i64))
        .finish()
}

#[utoipa::path(
    post,
    path = "/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Utente registrato", body = Object),
        (status = 400, description = "Dati mancanti o non validi"),
        (status = 409, description = "Email già registrata")
    ),
    tag = "Autenticazione"
)]
pub async fn register(
    payload: web::Json<RegisterRequest>,
    pool: web::Data<MySqlPool>,
) -> Result<HttpResponse, ApiError> {
    let first_name = payload.first_name.trim();
    let last_name = payload.last_name.trim();
    let email = payload.email.trim();

    if first_name.is_empty() || last_name.is_empty() || email.is_empty() || payload.password.is_empty() {
        return Err(ApiError::Validation(
            "Nome, cognome, email e password sono obbligatori".into(),
        ));
    }
    if !is_valid_email(email) {
        return Err(ApiError::Validation("Formato email non valido".into()));
    }
    if payload.password.len() < 6 {
        return Err(ApiError::Validation(
            "La password deve essere di almeno 6 caratteri".into(),
        ));
    }

    // App-level duplicate check; the unique key is the backstop.
    let existing = sqlx::query_scalar::<_, u64>("SELECT id FROM users WHERE email = ?")
        .bind(email)
        .fetch_optional(pool.get_ref())
        .await?;
    if existing.is_some() {
        return Err(ApiError::Conflict("Email già registrata".into()));
    }

    let hashed = hash_password(&payload.password).map_err(|e| ApiError::Internal(e.to_string()))?;
    let role = payload.role.unwrap_or(Role::Employee);

    let result = sqlx::query(
        "INSERT INTO users (first_name, last_name, email, password, role) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(first_name)
    .bind(last_name)
    .bind(email)
    .bind(&hashed)
    .bind(role.as_str())
    .execute(pool.get_ref())
    .await
    .map_err(|e| match &e {
        sqlx::Error::Database(db_err) if db_err.code() == Some("23000".into()) => {
            ApiError::Conflict("Email già registrata".into())
        }
        _ => {
            error!(error = %e, "Failed to register user");
            ApiError::Internal(e.to_string())
        }
    })?;

    let id = result.last_insert_id();
    info!(user_id = id, "User registered");

    Ok(HttpResponse::Created().json(json!({
        "message": "Utente registrato con successo",
        "user": UserResponse {
            id,
            first_name: first_name.to_owned(),
            last_name: last_name.to_owned(),
            email: email.to_owned(),
            role,
        },
    })))
}

#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login effettuato, cookie di sessione impostato", body = Object),
        (status = 400, description = "Email e password sono obbligatorie"),
        (status = 401, description = "Credenziali non valide")
    ),
    tag = "Autenticazione"
)]
#[instrument(name = "auth_login", skip(payload, pool, config), fields(email = %payload.email))]
pub async fn login(
    payload: web::Json<LoginRequest>,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> Result<HttpResponse, ApiError> {
    if payload.email.trim().is_empty() || payload.password.is_empty() {
        return Err(ApiError::Validation(
            "Email e password sono obbligatorie".into(),
        ));
    }

    let user = sqlx::query_as::<_, UserRow>(
        "SELECT id, first_name, last_name, email, password, role FROM users WHERE email = ?",
    )
    .bind(payload.email.trim())
    .fetch_optional(pool.get_ref())
    .await?;

    // Same message for unknown email and wrong password.
    let Some(user) = user else {
        info!("Login failed: unknown email");
        return Err(ApiError::Unauthorized("Credenziali non valide".into()));
    };
    if verify_password(&payload.password, &user.password).is_err() {
        info!("Login failed: password mismatch");
        return Err(ApiError::Unauthorized("Credenziali non valide".into()));
    }

    let role = user.role()?;
    let token = generate_session_token(
        user.id,
        user.email.clone(),
        user.first_name.clone(),
        user.last_name.clone(),
        role,
        &config.jwt_secret,
        config.token_ttl,
    )
    .map_err(|e| ApiError::Internal(e.to_string()))?;

    info!(user_id = user.id, "Login successful");

    Ok(HttpResponse::Ok()
        .cookie(session_cookie(token, &config))
        .json(json!({
            "message": "Login effettuato con successo",
            "user": UserResponse {
                id: user.id,
                first_name: user.first_name,
                last_name: user.last_name,
                email: user.email,
                role,
            },
        })))
}

#[utoipa::path(
    get,
    path = "/auth/me",
    responses(
        (status = 200, description = "Dati dell'utente autenticato", body = Object),
        (status = 401, description = "Non autenticato"),
        (status = 403, description = "Token non valido o scaduto")
    ),
    security(("cookieAuth" = [])),
    tag = "Autenticazione"
)]
pub async fn me(auth: AuthUser) -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "authenticated": true,
        "user": UserResponse {
            id: auth.id,
            first_name: auth.first_name,
            last_name: auth.last_name,
            email: auth.email,
            role: auth.role,
        },
    }))
}

#[utoipa::path(
    post,
    path = "/auth/logout",
    responses(
        (status = 200, description = "Cookie di sessione rimosso", body = Object)
    ),
    tag = "Autenticazione"
)]
pub async fn logout(config: web::Data<Config>) -> HttpResponse {
    // No server-side revocation: a copied token stays valid until its
    // natural expiry.
    let mut cookie = session_cookie(String::new(), &config);
    cookie.make_removal();

    HttpResponse::Ok().cookie(cookie).json(json!({
        "message": "Logout effettuato con successo",
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_validation() {
        assert!(is_valid_email("mario.rossi@example.com"));
        assert!(is_valid_email("m@example.com"));
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("mario@"));
        assert!(!is_valid_email("mario@nodot"));
        assert!(!is_valid_email("mario@.com"));
        assert!(!is_valid_email("ma rio@example.com"));
        assert!(!is_valid_email("mario@exa mple.com"));
    }
}
