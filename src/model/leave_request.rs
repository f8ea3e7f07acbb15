use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use utoipa::ToSchema;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum LeaveStatus {
    Pending,
    Approved,
    Rejected,
    Cancelled,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum LeaveDuration {
    FullDay,
    HalfDay,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum HalfDayType {
    FirstHalf,
    SecondHalf,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LeaveRequest {
    pub id: u64,
    pub employee_id: u64,
    #[schema(example = "2026-01-01", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-01-02", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    #[schema(example = 2.0, value_type = f64)]
    pub total_days: Decimal,
    #[schema(example = 2.0, value_type = f64)]
    pub working_days: Decimal,
    pub reason: String,
    pub status: LeaveStatus,
    pub duration: LeaveDuration,
    /// Set iff duration is HALF_DAY
    pub half_day_type: Option<HalfDayType>,
    /// Stored at creation time so auto-approval counting never has to
    /// guess from processing latency.
    pub auto_approved: bool,
    #[schema(format = "date-time", value_type = Option<String>)]
    pub processed_at: Option<DateTime<Utc>>,
    pub processed_by: Option<u64>,
    #[schema(format = "date-time", value_type = String)]
    pub created_at: DateTime<Utc>,
}

impl LeaveRequest {
    /// PENDING leaves and APPROVED leaves that have not started yet
    /// are the only ones an employee may still cancel.
    pub fn can_cancel(&self, today: NaiveDate) -> bool {
        match self.status {
            LeaveStatus::Pending => true,
            LeaveStatus::Approved => self.start_date > today,
            _ => false,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self.status, LeaveStatus::Pending | LeaveStatus::Approved)
    }

    /// Interval intersection test used for the overlap rule.
    pub fn overlaps(&self, start: NaiveDate, end: NaiveDate) -> bool {
        self.start_date <= end && self.end_date >= start
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leave(status: LeaveStatus, start: NaiveDate) -> LeaveRequest {
        LeaveRequest {
            id: 1,
            employee_id: 1,
            start_date: start,
            end_date: start,
            total_days: Decimal::ONE,
            working_days: Decimal::ONE,
            reason: "trip".into(),
            status,
            duration: LeaveDuration::FullDay,
            half_day_type: None,
            auto_approved: false,
            processed_at: None,
            processed_by: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn pending_is_always_cancellable() {
        let today = NaiveDate::from_ymd_opt(2026, 6, 10).unwrap();
        assert!(leave(LeaveStatus::Pending, today).can_cancel(today));
    }

    #[test]
    fn approved_is_cancellable_only_before_start() {
        let today = NaiveDate::from_ymd_opt(2026, 6, 10).unwrap();
        let future = today.succ_opt().unwrap();
        assert!(leave(LeaveStatus::Approved, future).can_cancel(today));
        assert!(!leave(LeaveStatus::Approved, today).can_cancel(today));
    }

    #[test]
    fn terminal_states_are_not_cancellable() {
        let today = NaiveDate::from_ymd_opt(2026, 6, 10).unwrap();
        let future = today.succ_opt().unwrap();
        assert!(!leave(LeaveStatus::Rejected, future).can_cancel(today));
        assert!(!leave(LeaveStatus::Cancelled, future).can_cancel(today));
    }

    #[test]
    fn overlap_is_inclusive_on_both_ends() {
        let start = NaiveDate::from_ymd_opt(2026, 6, 10).unwrap();
        let req = leave(LeaveStatus::Pending, start);
        assert!(req.overlaps(start, start));
        assert!(!req.overlaps(start.succ_opt().unwrap(), start.succ_opt().unwrap()));
        assert!(!req.overlaps(start.pred_opt().unwrap(), start.pred_opt().unwrap()));
    }

    #[test]
    fn status_round_trips_through_its_string_form() {
        assert_eq!(LeaveStatus::Pending.to_string(), "PENDING");
        assert_eq!("CANCELLED".parse::<LeaveStatus>().unwrap(), LeaveStatus::Cancelled);
        assert_eq!(HalfDayType::FirstHalf.to_string(), "FIRST_HALF");
    }
}
