use actix_web::{HttpResponse, web};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::{MySqlPool, prelude::FromRow};
use tracing::info;
use utoipa::{IntoParams, ToSchema};

use crate::auth::auth::AuthUser;
use crate::error::ApiError;
use crate::model::leave_request::{
    RequestStatus, check_delete, check_edit, check_evaluate, validate_date_order,
    validate_not_past,
};

#[derive(Deserialize, ToSchema)]
pub struct CreateLeaveRequest {
    #[serde(rename = "dataInizio")]
    #[schema(example = "2026-02-01", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[serde(rename = "dataFine")]
    #[schema(example = "2026-02-05", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    #[serde(rename = "categoriaId")]
    #[schema(example = 1)]
    pub category_id: u64,
    #[serde(rename = "motivazione")]
    #[schema(example = "Vacanze estive")]
    pub motivation: Option<String>,
    /// Employees may only create requests for themselves.
    #[serde(rename = "utenteId")]
    #[schema(example = 1)]
    pub user_id: u64,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateLeaveRequest {
    #[serde(rename = "dataInizio")]
    #[schema(example = "2026-02-01", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[serde(rename = "dataFine")]
    #[schema(example = "2026-02-05", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    #[serde(rename = "categoriaId")]
    #[schema(example = 1)]
    pub category_id: u64,
    #[serde(rename = "motivazione")]
    pub motivation: Option<String>,
}

#[derive(Deserialize, IntoParams)]
pub struct LeaveFilter {
    /// Filter by requester (Managers only; Employees are always scoped
    /// to themselves)
    #[serde(rename = "utenteId")]
    pub user_id: Option<u64>,
    /// Filter by request status
    #[serde(rename = "stato")]
    pub status: Option<RequestStatus>,
    /// Filter by leave category
    #[serde(rename = "categoriaId")]
    pub category_id: Option<u64>,
}

/// Joined detail row returned by the list/get endpoints.
#[derive(Serialize, FromRow, ToSchema)]
pub struct LeaveDetail {
    #[serde(rename = "RichiestaID")]
    pub id: u64,
    #[serde(rename = "DataRichiesta")]
    #[schema(format = "date-time", value_type = String)]
    pub requested_at: DateTime<Utc>,
    #[serde(rename = "DataInizio")]
    #[schema(format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[serde(rename = "DataFine")]
    #[schema(format = "date", value_type = String)]
    pub end_date: NaiveDate,
    #[serde(rename = "Motivazione")]
    pub motivation: Option<String>,
    #[serde(rename = "Stato")]
    #[schema(example = "In attesa")]
    pub status: String,
    #[serde(rename = "DataValutazione")]
    #[schema(format = "date-time", value_type = Option<String>)]
    pub evaluated_at: Option<DateTime<Utc>>,
    #[serde(rename = "UtenteID")]
    pub user_id: u64,
    #[serde(rename = "RichiedenteNome")]
    pub requester_first_name: String,
    #[serde(rename = "RichiedenteCognome")]
    pub requester_last_name: String,
    #[serde(rename = "RichiedenteEmail")]
    pub requester_email: String,
    #[serde(rename = "CategoriaID")]
    pub category_id: u64,
    #[serde(rename = "CategoriaDescrizione")]
    pub category_description: String,
    #[serde(rename = "UtenteValutazioneID")]
    pub evaluator_id: Option<u64>,
    #[serde(rename = "ValutatoreNome")]
    pub evaluator_first_name: Option<String>,
    #[serde(rename = "ValutatoreCognome")]
    pub evaluator_last_name: Option<String>,
}

/// Creation response payload (camelCase keys, historical wire shape).
#[derive(Serialize, FromRow, ToSchema)]
pub struct CreatedLeave {
    pub id: u64,
    #[serde(rename = "dataRichiesta")]
    #[schema(format = "date-time", value_type = String)]
    pub requested_at: DateTime<Utc>,
    #[serde(rename = "dataInizio")]
    #[schema(format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[serde(rename = "dataFine")]
    #[schema(format = "date", value_type = String)]
    pub end_date: NaiveDate,
    #[serde(rename = "categoriaId")]
    pub category_id: u64,
    #[serde(rename = "motivazione")]
    pub motivation: Option<String>,
    #[serde(rename = "stato")]
    #[schema(example = "In attesa")]
    pub status: String,
    #[serde(rename = "utenteId")]
    pub user_id: u64,
}

/// Edit response payload (PascalCase keys, historical wire shape).
#[derive(Serialize, FromRow, ToSchema)]
pub struct LeaveSummary {
    #[serde(rename = "RichiestaID")]
    pub id: u64,
    #[serde(rename = "DataRichiesta")]
    #[schema(format = "date-time", value_type = String)]
    pub requested_at: DateTime<Utc>,
    #[serde(rename = "DataInizio")]
    #[schema(format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[serde(rename = "DataFine")]
    #[schema(format = "date", value_type = String)]
    pub end_date: NaiveDate,
    #[serde(rename = "CategoriaID")]
    pub category_id: u64,
    #[serde(rename = "Motivazione")]
    pub motivation: Option<String>,
    #[serde(rename = "Stato")]
    pub status: String,
    #[serde(rename = "UtenteID")]
    pub user_id: u64,
}

#[derive(Serialize, FromRow, ToSchema)]
pub struct EvaluationResult {
    #[serde(rename = "RichiestaID")]
    pub id: u64,
    #[serde(rename = "Stato")]
    #[schema(example = "Approvato")]
    pub status: String,
    #[serde(rename = "DataValutazione")]
    #[schema(format = "date-time", value_type = Option<String>)]
    pub evaluated_at: Option<DateTime<Utc>>,
    #[serde(rename = "UtenteValutazioneID")]
    pub evaluator_id: Option<u64>,
}

/// Minimal row used for ownership/status checks before mutating.
#[derive(FromRow)]
struct LeaveRow {
    #[allow(dead_code)]
    id: u64,
    status: String,
    user_id: u64,
}

impl LeaveRow {
    fn status(&self) -> Result<RequestStatus, ApiError> {
        self.status
            .parse()
            .map_err(|_| ApiError::Internal(format!("Stato sconosciuto: {}", self.status)))
    }
}

const DETAIL_QUERY: &str = r#"
SELECT
    rp.id, rp.requested_at, rp.start_date, rp.end_date, rp.motivation, rp.status,
    rp.evaluated_at, rp.user_id,
    u.first_name AS requester_first_name,
    u.last_name AS requester_last_name,
    u.email AS requester_email,
    c.id AS category_id,
    c.description AS category_description,
    rp.evaluator_id,
    val.first_name AS evaluator_first_name,
    val.last_name AS evaluator_last_name
FROM leave_requests rp
INNER JOIN users u ON rp.user_id = u.id
INNER JOIN categories c ON rp.category_id = c.id
LEFT JOIN users val ON rp.evaluator_id = val.id
"#;

// Helper enum for typed SQLx binding of dynamic filters
enum FilterValue {
    U64(u64),
    Str(&'static str),
}

fn build_filters(
    scope_user: Option<u64>,
    status: Option<RequestStatus>,
    category_id: Option<u64>,
) -> (String, Vec<FilterValue>) {
    let mut where_sql = String::from(" WHERE 1=1");
    let mut args = Vec::new();

    if let Some(uid) = scope_user {
        where_sql.push_str(" AND rp.user_id = ?");
        args.push(FilterValue::U64(uid));
    }
    if let Some(status) = status {
        where_sql.push_str(" AND rp.status = ?");
        args.push(FilterValue::Str(status.as_str()));
    }
    if let Some(cid) = category_id {
        where_sql.push_str(" AND rp.category_id = ?");
        args.push(FilterValue::U64(cid));
    }

    (where_sql, args)
}

async fn ensure_category_exists(pool: &MySqlPool, id: u64) -> Result<(), ApiError> {
    let found = sqlx::query_scalar::<_, u64>("SELECT id FROM categories WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    if found.is_none() {
        return Err(ApiError::NotFound("Categoria non trovata".into()));
    }
    Ok(())
}

async fn fetch_leave_row(pool: &MySqlPool, id: u64) -> Result<LeaveRow, ApiError> {
    sqlx::query_as::<_, LeaveRow>("SELECT id, status, user_id FROM leave_requests WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| ApiError::NotFound("Richiesta non trovata".into()))
}

/* =========================
List leave requests
========================= */
#[utoipa::path(
    get,
    path = "/permessi",
    params(LeaveFilter),
    responses(
        (status = 200, description = "Lista richieste, ordinata per data richiesta discendente", body = Object),
        (status = 401, description = "Non autenticato")
    ),
    security(("cookieAuth" = [])),
    tag = "Permessi"
)]
pub async fn leave_list(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<LeaveFilter>,
) -> Result<HttpResponse, ApiError> {
    // Employees only ever see their own rows; the utenteId filter is a
    // Manager feature.
    let scope_user = if auth.is_employee() {
        Some(auth.id)
    } else {
        query.user_id
    };

    let (where_sql, args) = build_filters(scope_user, query.status, query.category_id);
    let sql = format!("{DETAIL_QUERY}{where_sql} ORDER BY rp.requested_at DESC");

    let mut q = sqlx::query_as::<_, LeaveDetail>(&sql);
    for arg in args {
        q = match arg {
            FilterValue::U64(v) => q.bind(v),
            FilterValue::Str(s) => q.bind(s),
        };
    }
    let rows = q.fetch_all(pool.get_ref()).await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "count": rows.len(),
        "data": rows,
    })))
}

/* =========================
Pending queue (Manager)
========================= */
#[utoipa::path(
    get,
    path = "/permessi/da-approvare",
    responses(
        (status = 200, description = "Richieste in attesa, ordinate per data richiesta ascendente", body = Object),
        (status = 403, description = "Solo i Responsabili possono vedere le richieste da approvare")
    ),
    security(("cookieAuth" = [])),
    tag = "Permessi"
)]
pub async fn pending_queue(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> Result<HttpResponse, ApiError> {
    auth.require_manager()?;

    let sql = format!("{DETAIL_QUERY} WHERE rp.status = ? ORDER BY rp.requested_at ASC");
    let rows = sqlx::query_as::<_, LeaveDetail>(&sql)
        .bind(RequestStatus::Pending.as_str())
        .fetch_all(pool.get_ref())
        .await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "count": rows.len(),
        "data": rows,
    })))
}

/* =========================
Get single request
========================= */
#[utoipa::path(
    get,
    path = "/permessi/{id}",
    params(("id" = u64, Path, description = "ID della richiesta")),
    responses(
        (status = 200, description = "Richiesta trovata", body = LeaveDetail),
        (status = 403, description = "Non hai i permessi per visualizzare questa richiesta"),
        (status = 404, description = "Richiesta non trovata")
    ),
    security(("cookieAuth" = [])),
    tag = "Permessi"
)]
pub async fn get_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();

    let sql = format!("{DETAIL_QUERY} WHERE rp.id = ?");
    let row = sqlx::query_as::<_, LeaveDetail>(&sql)
        .bind(id)
        .fetch_optional(pool.get_ref())
        .await?
        .ok_or_else(|| ApiError::NotFound("Richiesta non trovata".into()))?;

    if auth.is_employee() && row.user_id != auth.id {
        return Err(ApiError::Forbidden(
            "Non hai i permessi per visualizzare questa richiesta".into(),
        ));
    }

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "data": row,
    })))
}

/* =========================
Create leave request
========================= */
#[utoipa::path(
    post,
    path = "/permessi",
    request_body = CreateLeaveRequest,
    responses(
        (status = 201, description = "Richiesta creata con stato In attesa", body = CreatedLeave),
        (status = 400, description = "Date non valide"),
        (status = 403, description = "I dipendenti possono creare solo richieste per se stessi"),
        (status = 404, description = "Categoria o utente non trovato")
    ),
    security(("cookieAuth" = [])),
    tag = "Permessi"
)]
pub async fn create_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateLeaveRequest>,
) -> Result<HttpResponse, ApiError> {
    if auth.is_employee() && payload.user_id != auth.id {
        return Err(ApiError::Forbidden(
            "Non hai i permessi per creare richieste per altri utenti".into(),
        ));
    }

    validate_date_order(payload.start_date, payload.end_date)?;
    validate_not_past(payload.start_date, Utc::now().date_naive())?;

    ensure_category_exists(pool.get_ref(), payload.category_id).await?;

    let requester = sqlx::query_scalar::<_, u64>("SELECT id FROM users WHERE id = ?")
        .bind(payload.user_id)
        .fetch_optional(pool.get_ref())
        .await?;
    if requester.is_none() {
        return Err(ApiError::NotFound("Utente non trovato".into()));
    }

    let result = sqlx::query(
        "INSERT INTO leave_requests (user_id, category_id, start_date, end_date, motivation) \
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(payload.user_id)
    .bind(payload.category_id)
    .bind(payload.start_date)
    .bind(payload.end_date)
    .bind(payload.motivation.clone().unwrap_or_default())
    .execute(pool.get_ref())
    .await?;

    let id = result.last_insert_id();
    let created = sqlx::query_as::<_, CreatedLeave>(
        "SELECT id, requested_at, start_date, end_date, category_id, motivation, status, user_id \
         FROM leave_requests WHERE id = ?",
    )
    .bind(id)
    .fetch_one(pool.get_ref())
    .await?;

    info!(request_id = id, user_id = payload.user_id, "Leave request created");

    Ok(HttpResponse::Created().json(json!({
        "success": true,
        "message": "Richiesta di permesso creata con successo",
        "data": created,
    })))
}

/* =========================
Edit leave request
========================= */
#[utoipa::path(
    put,
    path = "/permessi/{id}",
    params(("id" = u64, Path, description = "ID della richiesta da modificare")),
    request_body = UpdateLeaveRequest,
    responses(
        (status = 200, description = "Richiesta modificata", body = LeaveSummary),
        (status = 400, description = "Date non valide o richiesta già valutata"),
        (status = 403, description = "Non hai i permessi per modificare questa richiesta"),
        (status = 404, description = "Richiesta o categoria non trovata")
    ),
    security(("cookieAuth" = [])),
    tag = "Permessi"
)]
pub async fn update_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<UpdateLeaveRequest>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();

    validate_date_order(payload.start_date, payload.end_date)?;

    let existing = fetch_leave_row(pool.get_ref(), id).await?;
    check_edit(auth.id, existing.user_id, existing.status()?)?;

    ensure_category_exists(pool.get_ref(), payload.category_id).await?;

    // Status and evaluator are untouched by an edit.
    sqlx::query(
        "UPDATE leave_requests SET start_date = ?, end_date = ?, category_id = ?, motivation = ? \
         WHERE id = ?",
    )
    .bind(payload.start_date)
    .bind(payload.end_date)
    .bind(payload.category_id)
    .bind(payload.motivation.clone().unwrap_or_default())
    .bind(id)
    .execute(pool.get_ref())
    .await?;

    let updated = sqlx::query_as::<_, LeaveSummary>(
        "SELECT id, requested_at, start_date, end_date, category_id, motivation, status, user_id \
         FROM leave_requests WHERE id = ?",
    )
    .bind(id)
    .fetch_one(pool.get_ref())
    .await?;

    info!(request_id = id, "Leave request updated");

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Richiesta modificata con successo",
        "data": updated,
    })))
}

/* =========================
Approve / reject (Manager)
========================= */
async fn evaluate(
    auth: &AuthUser,
    pool: &MySqlPool,
    id: u64,
    outcome: RequestStatus,
) -> Result<HttpResponse, ApiError> {
    auth.require_manager()?;

    let existing = fetch_leave_row(pool, id).await?;
    check_evaluate(existing.status()?)?;

    sqlx::query(
        "UPDATE leave_requests SET status = ?, evaluated_at = NOW(), evaluator_id = ? WHERE id = ?",
    )
    .bind(outcome.as_str())
    .bind(auth.id)
    .bind(id)
    .execute(pool)
    .await?;

    let row = sqlx::query_as::<_, EvaluationResult>(
        "SELECT id, status, evaluated_at, evaluator_id FROM leave_requests WHERE id = ?",
    )
    .bind(id)
    .fetch_one(pool)
    .await?;

    let message = if outcome == RequestStatus::Approved {
        "Richiesta approvata con successo"
    } else {
        "Richiesta rifiutata con successo"
    };

    info!(request_id = id, evaluator_id = auth.id, outcome = outcome.as_str(), "Leave request evaluated");

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": message,
        "data": row,
    })))
}

#[utoipa::path(
    put,
    path = "/permessi/{id}/approva",
    params(("id" = u64, Path, description = "ID della richiesta da approvare")),
    responses(
        (status = 200, description = "Richiesta approvata", body = EvaluationResult),
        (status = 400, description = "La richiesta è già stata valutata"),
        (status = 403, description = "Solo i Responsabili possono approvare le richieste"),
        (status = 404, description = "Richiesta non trovata")
    ),
    security(("cookieAuth" = [])),
    tag = "Permessi"
)]
pub async fn approve_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    evaluate(&auth, pool.get_ref(), path.into_inner(), RequestStatus::Approved).await
}

#[utoipa::path(
    put,
    path = "/permessi/{id}/rifiuta",
    params(("id" = u64, Path, description = "ID della richiesta da rifiutare")),
    responses(
        (status = 200, description = "Richiesta rifiutata", body = EvaluationResult),
        (status = 400, description = "La richiesta è già stata valutata"),
        (status = 403, description = "Solo i Responsabili possono rifiutare le richieste"),
        (status = 404, description = "Richiesta non trovata")
    ),
    security(("cookieAuth" = [])),
    tag = "Permessi"
)]
pub async fn reject_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    evaluate(&auth, pool.get_ref(), path.into_inner(), RequestStatus::Rejected).await
}

/* =========================
Delete leave request
========================= */
#[utoipa::path(
    delete,
    path = "/permessi/{id}",
    params(("id" = u64, Path, description = "ID della richiesta da eliminare")),
    responses(
        (status = 200, description = "Richiesta eliminata", body = Object),
        (status = 400, description = "Stato non eliminabile"),
        (status = 403, description = "Non hai i permessi per eliminare questa richiesta"),
        (status = 404, description = "Richiesta non trovata")
    ),
    security(("cookieAuth" = [])),
    tag = "Permessi"
)]
pub async fn delete_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();

    let existing = fetch_leave_row(pool.get_ref(), id).await?;
    check_delete(auth.role, auth.id, existing.user_id, existing.status()?)?;

    sqlx::query("DELETE FROM leave_requests WHERE id = ?")
        .bind(id)
        .execute(pool.get_ref())
        .await?;

    info!(request_id = id, "Leave request deleted");

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Richiesta eliminata con successo",
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filters_compose_in_order() {
        let (sql, args) = build_filters(Some(3), Some(RequestStatus::Pending), Some(7));
        assert_eq!(
            sql,
            " WHERE 1=1 AND rp.user_id = ? AND rp.status = ? AND rp.category_id = ?"
        );
        assert_eq!(args.len(), 3);
        assert!(matches!(args[1], FilterValue::Str("In attesa")));
    }

    #[test]
    fn no_filters_yields_bare_clause() {
        let (sql, args) = build_filters(None, None, None);
        assert_eq!(sql, " WHERE 1=1");
        assert!(args.is_empty());
    }

    #[test]
    fn leave_detail_serializes_wire_keys() {
        let row = LeaveDetail {
            id: 5,
            requested_at: Utc::now(),
            start_date: NaiveDate::from_ymd_opt(2099, 1, 10).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2099, 1, 15).unwrap(),
            motivation: Some("Vacanze".into()),
            status: "In attesa".into(),
            evaluated_at: None,
            user_id: 1,
            requester_first_name: "Mario".into(),
            requester_last_name: "Rossi".into(),
            requester_email: "m@example.com".into(),
            category_id: 1,
            category_description: "Ferie".into(),
            evaluator_id: None,
            evaluator_first_name: None,
            evaluator_last_name: None,
        };
        let value = serde_json::to_value(&row).unwrap();
        assert_eq!(value["RichiestaID"], 5);
        assert_eq!(value["Stato"], "In attesa");
        assert_eq!(value["DataInizio"], "2099-01-10");
        assert_eq!(value["CategoriaDescrizione"], "Ferie");
        assert!(value["DataValutazione"].is_null());
    }

    #[test]
    fn leave_row_rejects_unknown_status() {
        let row = LeaveRow {
            id: 1,
            status: "Sospeso".into(),
            user_id: 1,
        };
        assert!(matches!(row.status(), Err(ApiError::Internal(_))));
    }
}
