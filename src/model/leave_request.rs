use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

use crate::error::ApiError;
use crate::model::role::Role;

/// Lifecycle states of a leave request. A request is created as
/// `Pending` and moves exactly once to `Approved` or `Rejected`.
/// As with [`Role`](crate::model::role::Role), the Italian labels are
/// both the wire format and the stored column value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema)]
pub enum RequestStatus {
    #[serde(rename = "In attesa")]
    #[strum(serialize = "In attesa")]
    Pending,
    #[serde(rename = "Approvato")]
    #[strum(serialize = "Approvato")]
    Approved,
    #[serde(rename = "Rifiutato")]
    #[strum(serialize = "Rifiutato")]
    Rejected,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "In attesa",
            RequestStatus::Approved => "Approvato",
            RequestStatus::Rejected => "Rifiutato",
        }
    }

    pub fn is_pending(self) -> bool {
        self == RequestStatus::Pending
    }
}

/// End date must be strictly after the start date.
pub fn validate_date_order(start: NaiveDate, end: NaiveDate) -> Result<(), ApiError> {
    if end <= start {
        return Err(ApiError::Validation(
            "La data di fine deve essere successiva alla data di inizio".into(),
        ));
    }
    Ok(())
}

/// Creation-only rule: the start date may not lie before the current day.
pub fn validate_not_past(start: NaiveDate, today: NaiveDate) -> Result<(), ApiError> {
    if start < today {
        return Err(ApiError::Validation(
            "La data di inizio non può essere nel passato".into(),
        ));
    }
    Ok(())
}

/// A request can be edited only while pending, and only by its owner.
/// The status check comes first: an evaluated request yields 400 even
/// for a caller who does not own it.
pub fn check_edit(caller_id: u64, owner_id: u64, status: RequestStatus) -> Result<(), ApiError> {
    if !status.is_pending() {
        return Err(ApiError::Validation(
            "Non è possibile modificare una richiesta già valutata".into(),
        ));
    }
    if caller_id != owner_id {
        return Err(ApiError::Forbidden(
            "Non hai i permessi per modificare questa richiesta".into(),
        ));
    }
    Ok(())
}

/// Approve/reject may only fire on a pending request. The role gate
/// (Manager only) is enforced by the caller before reaching this point.
pub fn check_evaluate(status: RequestStatus) -> Result<(), ApiError> {
    if !status.is_pending() {
        return Err(ApiError::Validation(
            "La richiesta è già stata valutata".into(),
        ));
    }
    Ok(())
}

/// Deletion policy:
/// - employees may delete only their own pending requests;
/// - managers may delete pending or approved requests, but not rejected
///   ones.
pub fn check_delete(
    role: Role,
    caller_id: u64,
    owner_id: u64,
    status: RequestStatus,
) -> Result<(), ApiError> {
    match role {
        Role::Employee => {
            if caller_id != owner_id {
                return Err(ApiError::Forbidden(
                    "Non hai i permessi per eliminare questa richiesta".into(),
                ));
            }
            if !status.is_pending() {
                return Err(ApiError::Validation(
                    "Non è possibile eliminare una richiesta già valutata".into(),
                ));
            }
            Ok(())
        }
        Role::Manager => {
            if status == RequestStatus::Rejected {
                return Err(ApiError::Validation(
                    "Solo le richieste in attesa o approvate possono essere eliminate dai responsabili"
                        .into(),
                ));
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn status_parses_wire_labels() {
        assert_eq!(
            "In attesa".parse::<RequestStatus>().unwrap(),
            RequestStatus::Pending
        );
        assert_eq!(
            "Approvato".parse::<RequestStatus>().unwrap(),
            RequestStatus::Approved
        );
        assert_eq!(
            "Rifiutato".parse::<RequestStatus>().unwrap(),
            RequestStatus::Rejected
        );
        assert!("pending".parse::<RequestStatus>().is_err());
    }

    #[test]
    fn end_must_be_strictly_after_start() {
        let start = date(2099, 1, 10);
        assert!(validate_date_order(start, date(2099, 1, 9)).is_err());
        assert!(validate_date_order(start, start).is_err());
        assert!(validate_date_order(start, date(2099, 1, 11)).is_ok());
    }

    #[test]
    fn start_may_not_be_in_the_past() {
        let today = date(2026, 1, 14);
        assert!(validate_not_past(date(2026, 1, 13), today).is_err());
        assert!(validate_not_past(today, today).is_ok());
        assert!(validate_not_past(date(2026, 1, 15), today).is_ok());
    }

    #[test]
    fn edit_blocked_once_evaluated() {
        // status check wins over ownership: 400, not 403
        let err = check_edit(1, 1, RequestStatus::Approved).unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
        let err = check_edit(2, 1, RequestStatus::Rejected).unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[test]
    fn edit_requires_ownership() {
        let err = check_edit(2, 1, RequestStatus::Pending).unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));
        assert!(check_edit(1, 1, RequestStatus::Pending).is_ok());
    }

    #[test]
    fn evaluate_fires_only_from_pending() {
        assert!(check_evaluate(RequestStatus::Pending).is_ok());
        assert!(matches!(
            check_evaluate(RequestStatus::Approved).unwrap_err(),
            ApiError::Validation(_)
        ));
        assert!(matches!(
            check_evaluate(RequestStatus::Rejected).unwrap_err(),
            ApiError::Validation(_)
        ));
    }

    #[test]
    fn employee_deletes_only_own_pending() {
        assert!(check_delete(Role::Employee, 1, 1, RequestStatus::Pending).is_ok());
        assert!(matches!(
            check_delete(Role::Employee, 2, 1, RequestStatus::Pending).unwrap_err(),
            ApiError::Forbidden(_)
        ));
        assert!(matches!(
            check_delete(Role::Employee, 1, 1, RequestStatus::Approved).unwrap_err(),
            ApiError::Validation(_)
        ));
    }

    #[test]
    fn manager_deletes_pending_or_approved_only() {
        assert!(check_delete(Role::Manager, 9, 1, RequestStatus::Pending).is_ok());
        assert!(check_delete(Role::Manager, 9, 1, RequestStatus::Approved).is_ok());
        assert!(matches!(
            check_delete(Role::Manager, 9, 1, RequestStatus::Rejected).unwrap_err(),
            ApiError::Validation(_)
        ));
    }
}
