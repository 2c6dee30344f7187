use serde::{Deserialize, Serialize};

use crate::model::role::Role;

/// Claims signed into the `token` session cookie. Everything the
/// frontend needs about the current user travels in here; there is no
/// server-side session state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: u64,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub exp: usize,
    pub jti: String,
}
