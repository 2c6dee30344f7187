use actix_web::{HttpResponse, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::{MySqlPool, prelude::FromRow};
use utoipa::{IntoParams, ToSchema};

use crate::auth::auth::AuthUser;
use crate::error::ApiError;
use crate::model::leave_request::RequestStatus;

#[derive(Deserialize, IntoParams)]
pub struct StatsFilter {
    /// Filter by requester
    #[serde(rename = "utenteId")]
    pub user_id: Option<u64>,
    /// Filter by month of the start date (effective only together with
    /// `anno`)
    #[serde(rename = "mese")]
    pub month: Option<u32>,
    /// Filter by year of the start date
    #[serde(rename = "anno")]
    pub year: Option<i32>,
}

/// One aggregation bucket: a user in a given month/year. Only approved
/// requests enter the aggregation, so the two day totals coincide; both
/// are kept for wire compatibility.
#[derive(Serialize, FromRow, ToSchema)]
pub struct StatsRow {
    #[serde(rename = "UtenteID")]
    pub user_id: u64,
    #[serde(rename = "Nome")]
    pub first_name: String,
    #[serde(rename = "Cognome")]
    pub last_name: String,
    #[serde(rename = "Email")]
    pub email: String,
    #[serde(rename = "NumeroRichieste")]
    pub request_count: i64,
    /// Sum of inclusive day spans (end - start + 1)
    #[serde(rename = "GiorniTotaliRichiesti")]
    pub total_days: i64,
    #[serde(rename = "GiorniTotaliApprovati")]
    pub approved_days: i64,
    #[serde(rename = "Mese")]
    pub month: i64,
    #[serde(rename = "Anno")]
    pub year: i64,
}

enum FilterValue {
    U64(u64),
    I64(i64),
}

fn build_filters(filter: &StatsFilter) -> (String, Vec<FilterValue>) {
    let mut where_sql = String::from(" WHERE rp.status = ?");
    let mut args = Vec::new();

    if let Some(uid) = filter.user_id {
        where_sql.push_str(" AND rp.user_id = ?");
        args.push(FilterValue::U64(uid));
    }
    match (filter.month, filter.year) {
        (Some(month), Some(year)) => {
            where_sql.push_str(" AND MONTH(rp.start_date) = ? AND YEAR(rp.start_date) = ?");
            args.push(FilterValue::I64(month as i64));
            args.push(FilterValue::I64(year as i64));
        }
        (_, Some(year)) => {
            where_sql.push_str(" AND YEAR(rp.start_date) = ?");
            args.push(FilterValue::I64(year as i64));
        }
        // month without year is ignored
        _ => {}
    }

    (where_sql, args)
}

#[utoipa::path(
    get,
    path = "/permessi/statistiche",
    params(StatsFilter),
    responses(
        (status = 200, description = "Statistiche aggregate delle richieste approvate", body = Object),
        (status = 403, description = "Solo i Responsabili possono vedere le statistiche")
    ),
    security(("cookieAuth" = [])),
    tag = "Permessi"
)]
pub async fn leave_statistics(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<StatsFilter>,
) -> Result<HttpResponse, ApiError> {
    auth.require_manager()?;

    let (where_sql, args) = build_filters(&query);
    let sql = format!(
        "SELECT \
            u.id AS user_id, u.first_name, u.last_name, u.email, \
            CAST(COUNT(rp.id) AS SIGNED) AS request_count, \
            CAST(SUM(DATEDIFF(rp.end_date, rp.start_date) + 1) AS SIGNED) AS total_days, \
            CAST(SUM(DATEDIFF(rp.end_date, rp.start_date) + 1) AS SIGNED) AS approved_days, \
            CAST(MONTH(rp.start_date) AS SIGNED) AS month, \
            CAST(YEAR(rp.start_date) AS SIGNED) AS year \
         FROM leave_requests rp \
         INNER JOIN users u ON rp.user_id = u.id\
         {where_sql} \
         GROUP BY u.id, u.first_name, u.last_name, u.email, \
            MONTH(rp.start_date), YEAR(rp.start_date) \
         ORDER BY u.last_name, u.first_name, \
            YEAR(rp.start_date) DESC, MONTH(rp.start_date) DESC"
    );

    let mut q = sqlx::query_as::<_, StatsRow>(&sql).bind(RequestStatus::Approved.as_str());
    for arg in args {
        q = match arg {
            FilterValue::U64(v) => q.bind(v),
            FilterValue::I64(v) => q.bind(v),
        };
    }
    let rows = q.fetch_all(pool.get_ref()).await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "count": rows.len(),
        "data": rows,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn month_requires_year() {
        let (sql, args) = build_filters(&StatsFilter {
            user_id: None,
            month: Some(2),
            year: None,
        });
        assert_eq!(sql, " WHERE rp.status = ?");
        assert!(args.is_empty());
    }

    #[test]
    fn month_and_year_both_bound() {
        let (sql, args) = build_filters(&StatsFilter {
            user_id: Some(1),
            month: Some(2),
            year: Some(2026),
        });
        assert_eq!(
            sql,
            " WHERE rp.status = ? AND rp.user_id = ? AND MONTH(rp.start_date) = ? AND YEAR(rp.start_date) = ?"
        );
        assert_eq!(args.len(), 3);
    }

    #[test]
    fn year_alone_is_accepted() {
        let (sql, args) = build_filters(&StatsFilter {
            user_id: None,
            month: None,
            year: Some(2026),
        });
        assert_eq!(sql, " WHERE rp.status = ? AND YEAR(rp.start_date) = ?");
        assert_eq!(args.len(), 1);
    }

    #[test]
    fn stats_row_serializes_wire_keys() {
        let row = StatsRow {
            user_id: 1,
            first_name: "Mario".into(),
            last_name: "Rossi".into(),
            email: "m@example.com".into(),
            request_count: 2,
            total_days: 8,
            approved_days: 8,
            month: 2,
            year: 2026,
        };
        let value = serde_json::to_value(&row).unwrap();
        assert_eq!(value["UtenteID"], 1);
        assert_eq!(value["NumeroRichieste"], 2);
        assert_eq!(value["GiorniTotaliRichiesti"], 8);
        assert_eq!(value["Anno"], 2026);
    }
}
