use actix_web::{HttpResponse, web};
use serde::Deserialize;
use serde_json::json;
use sqlx::MySqlPool;
use tracing::info;
use utoipa::ToSchema;

use crate::auth::auth::AuthUser;
use crate::error::ApiError;
use crate::model::category::Category;

#[derive(Deserialize, ToSchema)]
pub struct CreateCategory {
    #[serde(rename = "categoriaId")]
    #[schema(example = 10)]
    pub id: u64,
    #[serde(rename = "descrizione")]
    #[schema(example = "Permesso per motivi personali")]
    pub description: String,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateCategory {
    #[serde(rename = "descrizione")]
    #[schema(example = "Ferie annuali")]
    pub description: String,
}

#[utoipa::path(
    get,
    path = "/categorie",
    responses(
        (status = 200, description = "Lista categorie ordinata per descrizione", body = Object),
        (status = 401, description = "Non autenticato")
    ),
    security(("cookieAuth" = [])),
    tag = "Categorie"
)]
pub async fn category_list(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> Result<HttpResponse, ApiError> {
    let categories = sqlx::query_as::<_, Category>(
        "SELECT id, description FROM categories ORDER BY description ASC",
    )
    .fetch_all(pool.get_ref())
    .await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "count": categories.len(),
        "data": categories,
    })))
}

#[utoipa::path(
    get,
    path = "/categorie/{id}",
    params(("id" = u64, Path, description = "ID della categoria")),
    responses(
        (status = 200, description = "Categoria trovata", body = Category),
        (status = 404, description = "Categoria non trovata")
    ),
    security(("cookieAuth" = [])),
    tag = "Categorie"
)]
pub async fn get_category(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();

    let category =
        sqlx::query_as::<_, Category>("SELECT id, description FROM categories WHERE id = ?")
            .bind(id)
            .fetch_optional(pool.get_ref())
            .await?
            .ok_or_else(|| ApiError::NotFound("Categoria non trovata".into()))?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "data": category,
    })))
}

#[utoipa::path(
    post,
    path = "/categorie",
    request_body = CreateCategory,
    responses(
        (status = 201, description = "Categoria creata", body = Category),
        (status = 400, description = "Dati mancanti"),
        (status = 403, description = "Solo i Responsabili possono creare categorie"),
        (status = 409, description = "ID o descrizione già esistenti")
    ),
    security(("cookieAuth" = [])),
    tag = "Categorie"
)]
pub async fn create_category(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateCategory>,
) -> Result<HttpResponse, ApiError> {
    auth.require_manager()?;

    let description = payload.description.trim();
    if description.is_empty() {
        return Err(ApiError::Validation("La descrizione è obbligatoria".into()));
    }

    // The description check is case-insensitive, the id check exact.
    let existing = sqlx::query_scalar::<_, u64>(
        "SELECT id FROM categories WHERE id = ? OR LOWER(description) = LOWER(?)",
    )
    .bind(payload.id)
    .bind(description)
    .fetch_optional(pool.get_ref())
    .await?;
    if existing.is_some() {
        return Err(ApiError::Conflict(
            "Esiste già una categoria con questo ID o descrizione".into(),
        ));
    }

    sqlx::query("INSERT INTO categories (id, description) VALUES (?, ?)")
        .bind(payload.id)
        .bind(description)
        .execute(pool.get_ref())
        .await?;

    info!(category_id = payload.id, "Category created");

    Ok(HttpResponse::Created().json(json!({
        "success": true,
        "message": "Categoria creata con successo",
        "data": Category { id: payload.id, description: description.to_owned() },
    })))
}

#[utoipa::path(
    put,
    path = "/categorie/{id}",
    params(("id" = u64, Path, description = "ID della categoria da modificare")),
    request_body = UpdateCategory,
    responses(
        (status = 200, description = "Categoria modificata", body = Category),
        (status = 400, description = "Dati mancanti"),
        (status = 403, description = "Solo i Responsabili possono modificare categorie"),
        (status = 404, description = "Categoria non trovata"),
        (status = 409, description = "Descrizione già in uso")
    ),
    security(("cookieAuth" = [])),
    tag = "Categorie"
)]
pub async fn update_category(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<UpdateCategory>,
) -> Result<HttpResponse, ApiError> {
    auth.require_manager()?;

    let id = path.into_inner();
    let description = payload.description.trim();
    if description.is_empty() {
        return Err(ApiError::Validation("La descrizione è obbligatoria".into()));
    }

    let exists = sqlx::query_scalar::<_, u64>("SELECT id FROM categories WHERE id = ?")
        .bind(id)
        .fetch_optional(pool.get_ref())
        .await?;
    if exists.is_none() {
        return Err(ApiError::NotFound("Categoria non trovata".into()));
    }

    let duplicate = sqlx::query_scalar::<_, u64>(
        "SELECT id FROM categories WHERE LOWER(description) = LOWER(?) AND id != ?",
    )
    .bind(description)
    .bind(id)
    .fetch_optional(pool.get_ref())
    .await?;
    if duplicate.is_some() {
        return Err(ApiError::Conflict(
            "Esiste già un'altra categoria con questa descrizione".into(),
        ));
    }

    sqlx::query("UPDATE categories SET description = ? WHERE id = ?")
        .bind(description)
        .bind(id)
        .execute(pool.get_ref())
        .await?;

    info!(category_id = id, "Category updated");

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Categoria modificata con successo",
        "data": Category { id, description: description.to_owned() },
    })))
}

#[utoipa::path(
    delete,
    path = "/categorie/{id}",
    params(("id" = u64, Path, description = "ID della categoria da eliminare")),
    responses(
        (status = 200, description = "Categoria eliminata", body = Object),
        (status = 403, description = "Solo i Responsabili possono eliminare categorie"),
        (status = 404, description = "Categoria non trovata"),
        (status = 409, description = "Categoria referenziata da richieste esistenti")
    ),
    security(("cookieAuth" = [])),
    tag = "Categorie"
)]
pub async fn delete_category(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    auth.require_manager()?;

    let id = path.into_inner();

    let exists = sqlx::query_scalar::<_, u64>("SELECT id FROM categories WHERE id = ?")
        .bind(id)
        .fetch_optional(pool.get_ref())
        .await?;
    if exists.is_none() {
        return Err(ApiError::NotFound("Categoria non trovata".into()));
    }

    // Explicit existence check mirroring the FK RESTRICT constraint.
    let usage = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM leave_requests WHERE category_id = ?",
    )
    .bind(id)
    .fetch_one(pool.get_ref())
    .await?;
    if usage > 0 {
        return Ok(HttpResponse::Conflict().json(json!({
            "error": "Impossibile eliminare: ci sono richieste associate a questa categoria",
            "details": format!("Trovate {} richieste", usage),
        })));
    }

    sqlx::query("DELETE FROM categories WHERE id = ?")
        .bind(id)
        .execute(pool.get_ref())
        .await?;

    info!(category_id = id, "Category deleted");

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Categoria eliminata con successo",
    })))
}
