use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::ServiceError;

/// Approver comments are capped at the column width.
pub const MAX_COMMENT_LEN: usize = 500;

/// Optional deployment-specific rule tying `requested_days` to the date
/// range. No rule ships by default; `Err` carries the rejection message.
pub type DayCountPolicy = fn(NaiveDate, NaiveDate, u32) -> Result<(), String>;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, strum::Display, ToSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum VacationStatus {
    Pending,
    Approved,
    ApprovedWithChanges,
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum DecisionAction {
    Approve,
    ApproveWithChanges,
    Reject,
}

impl DecisionAction {
    pub fn target_status(&self) -> VacationStatus {
        match self {
            DecisionAction::Approve => VacationStatus::Approved,
            DecisionAction::ApproveWithChanges => VacationStatus::ApprovedWithChanges,
            DecisionAction::Reject => VacationStatus::Rejected,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(example = json!({
    "id": 1,
    "employee_id": 1000,
    "start_date": "2025-06-01",
    "end_date": "2025-06-05",
    "requested_days": 5,
    "status": "PENDING",
    "approver_comment": null,
    "approved_start_date": null,
    "approved_end_date": null,
    "approved_days": null,
    "created_at": "2025-05-20T09:00:00Z",
    "decided_at": null,
    "approver_id": null
}))]
pub struct VacationRequest {
    #[schema(example = 1)]
    pub id: u64,
    /// Owning employee; set once at creation, never reassigned.
    #[schema(example = 1000)]
    pub employee_id: u64,
    #[schema(example = "2025-06-01", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2025-06-05", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    #[schema(example = 5)]
    pub requested_days: u32,
    pub status: VacationStatus,
    #[schema(nullable = true)]
    pub approver_comment: Option<String>,
    #[schema(format = "date", value_type = Option<String>, nullable = true)]
    pub approved_start_date: Option<NaiveDate>,
    #[schema(format = "date", value_type = Option<String>, nullable = true)]
    pub approved_end_date: Option<NaiveDate>,
    #[schema(nullable = true)]
    pub approved_days: Option<u32>,
    #[schema(example = "2025-05-20T09:00:00Z", format = "date-time", value_type = String)]
    pub created_at: DateTime<Utc>,
    #[schema(format = "date-time", value_type = Option<String>, nullable = true)]
    pub decided_at: Option<DateTime<Utc>>,
    #[schema(nullable = true)]
    pub approver_id: Option<u64>,
}

/// Fields of a not-yet-persisted request; the store assigns the id and
/// sets status PENDING.
#[derive(Debug, Clone)]
pub struct NewVacationRequest {
    pub employee_id: u64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub requested_days: u32,
    pub created_at: DateTime<Utc>,
}

/// Reviewer decision payload, one per request lifetime.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ApprovalCommand {
    pub action: DecisionAction,
    #[schema(example = "2025-06-02", format = "date", value_type = Option<String>)]
    pub approved_start_date: Option<NaiveDate>,
    #[schema(example = "2025-06-04", format = "date", value_type = Option<String>)]
    pub approved_end_date: Option<NaiveDate>,
    #[schema(example = 3)]
    pub approved_days: Option<u32>,
    #[schema(example = "Team capacity, shortened by one day")]
    pub approver_comment: Option<String>,
}

/// The write produced by a decision: everything `decide` is allowed to
/// touch. Applied against the store conditionally on status PENDING.
#[derive(Debug, Clone)]
pub struct DecisionRecord {
    pub status: VacationStatus,
    pub approved_start_date: Option<NaiveDate>,
    pub approved_end_date: Option<NaiveDate>,
    pub approved_days: Option<u32>,
    pub approver_comment: Option<String>,
    pub approver_id: u64,
    pub decided_at: DateTime<Utc>,
}

/// Checks a submission before anything is persisted.
pub fn validate_submission(
    start_date: NaiveDate,
    end_date: NaiveDate,
    requested_days: u32,
    day_policy: Option<DayCountPolicy>,
) -> Result<(), ServiceError> {
    if start_date > end_date {
        return Err(ServiceError::validation(
            "start_date cannot be after end_date",
        ));
    }
    if requested_days == 0 {
        return Err(ServiceError::validation(
            "requested_days must be a positive number",
        ));
    }
    if let Some(policy) = day_policy {
        policy(start_date, end_date, requested_days).map_err(ServiceError::Validation)?;
    }
    Ok(())
}

fn validate_comment(comment: &Option<String>) -> Result<(), ServiceError> {
    if let Some(text) = comment {
        if text.chars().count() > MAX_COMMENT_LEN {
            return Err(ServiceError::validation(format!(
                "approver_comment exceeds {} characters",
                MAX_COMMENT_LEN
            )));
        }
    }
    Ok(())
}

impl VacationRequest {
    pub fn is_pending(&self) -> bool {
        self.status == VacationStatus::Pending
    }

    /// Computes the one-time transition out of PENDING.
    ///
    /// APPROVE copies the requested range/day count into the approved
    /// fields unless the command overrides them. APPROVE_WITH_CHANGES
    /// requires at least one override and falls back to the requested
    /// values for the rest. REJECT leaves every approved field empty.
    pub fn decision(
        &self,
        cmd: &ApprovalCommand,
        approver_id: u64,
        decided_at: DateTime<Utc>,
    ) -> Result<DecisionRecord, ServiceError> {
        if !self.is_pending() {
            return Err(ServiceError::Conflict(
                "Vacation request already decided".into(),
            ));
        }

        validate_comment(&cmd.approver_comment)?;

        let (approved_start_date, approved_end_date, approved_days) = match cmd.action {
            DecisionAction::Reject => (None, None, None),
            DecisionAction::Approve | DecisionAction::ApproveWithChanges => {
                if cmd.action == DecisionAction::ApproveWithChanges
                    && cmd.approved_start_date.is_none()
                    && cmd.approved_end_date.is_none()
                    && cmd.approved_days.is_none()
                {
                    return Err(ServiceError::validation(
                        "APPROVE_WITH_CHANGES requires at least one of approved_start_date, approved_end_date or approved_days",
                    ));
                }

                let start = cmd.approved_start_date.unwrap_or(self.start_date);
                let end = cmd.approved_end_date.unwrap_or(self.end_date);
                let days = cmd.approved_days.unwrap_or(self.requested_days);

                if start > end {
                    return Err(ServiceError::validation(
                        "approved_start_date cannot be after approved_end_date",
                    ));
                }
                if days == 0 {
                    return Err(ServiceError::validation(
                        "approved_days must be a positive number",
                    ));
                }

                (Some(start), Some(end), Some(days))
            }
        };

        Ok(DecisionRecord {
            status: cmd.action.target_status(),
            approved_start_date,
            approved_end_date,
            approved_days,
            approver_comment: cmd.approver_comment.clone(),
            approver_id,
            decided_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn pending_request() -> VacationRequest {
        VacationRequest {
            id: 7,
            employee_id: 1000,
            start_date: date(2025, 6, 1),
            end_date: date(2025, 6, 5),
            requested_days: 5,
            status: VacationStatus::Pending,
            approver_comment: None,
            approved_start_date: None,
            approved_end_date: None,
            approved_days: None,
            created_at: Utc.with_ymd_and_hms(2025, 5, 20, 9, 0, 0).unwrap(),
            decided_at: None,
            approver_id: None,
        }
    }

    fn command(action: DecisionAction) -> ApprovalCommand {
        ApprovalCommand {
            action,
            approved_start_date: None,
            approved_end_date: None,
            approved_days: None,
            approver_comment: None,
        }
    }

    fn decided_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, 21, 12, 0, 0).unwrap()
    }

    #[test]
    fn submission_rejects_inverted_range() {
        let err = validate_submission(date(2025, 6, 5), date(2025, 6, 1), 5, None).unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[test]
    fn submission_rejects_zero_days() {
        let err = validate_submission(date(2025, 6, 1), date(2025, 6, 5), 0, None).unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[test]
    fn submission_runs_the_configured_day_policy() {
        fn span_must_cover_days(start: NaiveDate, end: NaiveDate, days: u32) -> Result<(), String> {
            let span = (end - start).num_days() as u32 + 1;
            if days > span {
                Err(format!("requested_days {} exceeds the {}-day range", days, span))
            } else {
                Ok(())
            }
        }

        assert!(
            validate_submission(date(2025, 6, 1), date(2025, 6, 5), 5, Some(span_must_cover_days))
                .is_ok()
        );
        let err =
            validate_submission(date(2025, 6, 1), date(2025, 6, 2), 5, Some(span_must_cover_days))
                .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[test]
    fn approve_defaults_to_the_requested_range() {
        let request = pending_request();
        let record = request
            .decision(&command(DecisionAction::Approve), 99, decided_at())
            .unwrap();

        assert_eq!(record.status, VacationStatus::Approved);
        assert_eq!(record.approved_start_date, Some(request.start_date));
        assert_eq!(record.approved_end_date, Some(request.end_date));
        assert_eq!(record.approved_days, Some(request.requested_days));
        assert_eq!(record.approver_id, 99);
        assert_eq!(record.decided_at, decided_at());
    }

    #[test]
    fn approve_with_changes_requires_an_override() {
        let request = pending_request();
        let err = request
            .decision(&command(DecisionAction::ApproveWithChanges), 99, decided_at())
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[test]
    fn approve_with_changes_falls_back_for_unsupplied_fields() {
        let request = pending_request();
        let mut cmd = command(DecisionAction::ApproveWithChanges);
        cmd.approved_days = Some(3);

        let record = request.decision(&cmd, 99, decided_at()).unwrap();
        assert_eq!(record.status, VacationStatus::ApprovedWithChanges);
        assert_eq!(record.approved_start_date, Some(request.start_date));
        assert_eq!(record.approved_end_date, Some(request.end_date));
        assert_eq!(record.approved_days, Some(3));
    }

    #[test]
    fn approve_with_changes_rejects_inverted_approved_range() {
        let request = pending_request();
        let mut cmd = command(DecisionAction::ApproveWithChanges);
        cmd.approved_start_date = Some(date(2025, 6, 10));

        let err = request.decision(&cmd, 99, decided_at()).unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[test]
    fn reject_keeps_approved_fields_empty() {
        let request = pending_request();
        let mut cmd = command(DecisionAction::Reject);
        cmd.approver_comment = Some("Blackout week".to_string());

        let record = request.decision(&cmd, 99, decided_at()).unwrap();
        assert_eq!(record.status, VacationStatus::Rejected);
        assert_eq!(record.approved_start_date, None);
        assert_eq!(record.approved_end_date, None);
        assert_eq!(record.approved_days, None);
        assert_eq!(record.approver_comment.as_deref(), Some("Blackout week"));
    }

    #[test]
    fn comment_over_500_chars_is_rejected() {
        let request = pending_request();
        let mut cmd = command(DecisionAction::Reject);
        cmd.approver_comment = Some("x".repeat(MAX_COMMENT_LEN + 1));

        let err = request.decision(&cmd, 99, decided_at()).unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[test]
    fn decided_request_cannot_be_decided_again() {
        let mut request = pending_request();
        request.status = VacationStatus::Approved;
        request.decided_at = Some(decided_at());
        request.approver_id = Some(99);

        let err = request
            .decision(&command(DecisionAction::Reject), 99, decided_at())
            .unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
    }
}
