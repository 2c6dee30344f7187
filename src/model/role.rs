use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

/// User roles. The Italian labels are the wire format and are also what
/// the `users.role` column stores, so no mapping layer is needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema)]
pub enum Role {
    #[serde(rename = "Dipendente")]
    #[strum(serialize = "Dipendente")]
    Employee,
    #[serde(rename = "Responsabile")]
    #[strum(serialize = "Responsabile")]
    Manager,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Employee => "Dipendente",
            Role::Manager => "Responsabile",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_wire_labels() {
        assert_eq!("Dipendente".parse::<Role>().unwrap(), Role::Employee);
        assert_eq!("Responsabile".parse::<Role>().unwrap(), Role::Manager);
        assert!("Admin".parse::<Role>().is_err());
    }

    #[test]
    fn serializes_to_wire_labels() {
        assert_eq!(
            serde_json::to_string(&Role::Employee).unwrap(),
            "\"Dipendente\""
        );
        assert_eq!(
            serde_json::to_string(&Role::Manager).unwrap(),
            "\"Responsabile\""
        );
    }
}
