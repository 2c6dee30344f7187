use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;

/// Leave category reference row. The id is caller-supplied, not
/// auto-generated.
#[derive(Debug, Serialize, FromRow, ToSchema)]
pub struct Category {
    #[serde(rename = "CategoriaID")]
    #[schema(example = 1)]
    pub id: u64,
    #[serde(rename = "Descrizione")]
    #[schema(example = "Ferie")]
    pub description: String,
}
