use crate::api::category::{CreateCategory, UpdateCategory};
use crate::api::leave_request::{
    CreateLeaveRequest, CreatedLeave, EvaluationResult, LeaveDetail, LeaveSummary,
    UpdateLeaveRequest,
};
use crate::api::statistics::StatsRow;
use crate::auth::handlers::{LoginRequest, RegisterRequest};
use crate::model::category::Category;
use crate::model::leave_request::RequestStatus;
use crate::model::role::Role;
use crate::model::user::UserResponse;
use utoipa::Modify;
use utoipa::OpenApi;
use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Gestione Permessi API",
        version = "1.0.0",
        description = r#"
## Gestione Permessi

Backend per la gestione delle richieste di permesso aziendali.

### 🔹 Funzionalità
- **Autenticazione**
  - Registrazione, login e logout con sessione in cookie
- **Categorie**
  - Catalogo delle tipologie di permesso (gestito dai Responsabili)
- **Permessi**
  - Richiesta, modifica e cancellazione dei permessi
  - Approvazione/rifiuto da parte dei Responsabili
  - Statistiche aggregate sui permessi approvati

### 🔐 Sicurezza
La sessione è trasportata in un cookie **HttpOnly** chiamato `token`.
Gli endpoint protetti richiedono il cookie; le operazioni riservate
richiedono il ruolo **Responsabile**.

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::auth::handlers::register,
        crate::auth::handlers::login,
        crate::auth::handlers::me,
        crate::auth::handlers::logout,

        crate::api::category::category_list,
        crate::api::category::get_category,
        crate::api::category::create_category,
        crate::api::category::update_category,
        crate::api::category::delete_category,

        crate::api::leave_request::leave_list,
        crate::api::leave_request::pending_queue,
        crate::api::leave_request::get_leave,
        crate::api::leave_request::create_leave,
        crate::api::leave_request::update_leave,
        crate::api::leave_request::approve_leave,
        crate::api::leave_request::reject_leave,
        crate::api::leave_request::delete_leave,

        crate::api::statistics::leave_statistics
    ),
    components(
        schemas(
            RegisterRequest,
            LoginRequest,
            UserResponse,
            Role,
            RequestStatus,
            Category,
            CreateCategory,
            UpdateCategory,
            CreateLeaveRequest,
            UpdateLeaveRequest,
            LeaveDetail,
            CreatedLeave,
            LeaveSummary,
            EvaluationResult,
            StatsRow
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Autenticazione", description = "Registrazione, login e sessione"),
        (name = "Categorie", description = "Catalogo delle tipologie di permesso"),
        (name = "Permessi", description = "Richieste di permesso e valutazione"),
    )
)]
pub struct ApiDoc;

pub struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "cookieAuth",
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new("token"))),
            );
        }
    }
}
