//! Storage boundary. Composite operations are atomic per (employee,
//! year) ledger entry and per request id: balance movement and status
//! mutation inside one call either both apply or neither does.

pub mod memory;
pub mod mysql;

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;

use crate::domain::error::LeaveError;
use crate::domain::guard::ListScope;
use crate::model::balance::{LeaveBalance, YearEndAction, YearEndOutcome};
use crate::model::employee::Employee;
use crate::model::holiday::Holiday;
use crate::model::leave_request::{HalfDayType, LeaveDuration, LeaveRequest, LeaveStatus};
use crate::model::notification::Notification;

#[derive(Debug, Clone, Copy)]
pub struct PageRequest {
    pub page: u64,     // 1-based
    pub per_page: u64, // items per page
}

impl PageRequest {
    pub fn new(page: Option<u64>, per_page: Option<u64>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            per_page: per_page.unwrap_or(10).clamp(1, 100),
        }
    }

    pub fn offset(&self) -> u64 {
        (self.page - 1) * self.per_page
    }
}

#[derive(Debug, Clone)]
pub struct PageResult<T> {
    pub data: Vec<T>,
    pub page: u64,
    pub per_page: u64,
    pub total: i64,
}

/// Everything needed to persist a freshly validated leave request. The
/// workflow decides the candidate status and auto-approval before this
/// reaches the store; the store guards overlap, balance and the
/// auto-approval cap atomically.
#[derive(Debug, Clone)]
pub struct NewLeaveRequest {
    pub employee_id: u64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub total_days: Decimal,
    pub working_days: Decimal,
    pub reason: String,
    pub duration: LeaveDuration,
    pub half_day_type: Option<HalfDayType>,
    pub status: LeaveStatus,
    pub auto_approved: bool,
    pub processed_at: Option<DateTime<Utc>>,
    /// Candidate auto-approval cap. When set, the store re-counts the
    /// start month's auto-approved requests inside the same atomic unit
    /// and downgrades the request to PENDING if the cap is already met.
    pub auto_approval_cap: Option<i64>,
    /// Default entitlement for lazily created ledger entries
    pub entitlement: Decimal,
}

/// Check-and-set status transition for approve/reject. Applies only if
/// the stored status still equals `expect` at commit time.
#[derive(Debug, Clone)]
pub struct LeaveTransition {
    pub id: u64,
    pub expect: LeaveStatus,
    pub to: LeaveStatus,
    pub processed_by: u64,
    pub processed_at: DateTime<Utc>,
    /// Restore the request's working days to its start-year ledger entry
    pub restore_balance: bool,
    pub entitlement: Decimal,
}

#[derive(Debug, Clone)]
pub struct YearEndRequest {
    pub employee_id: u64,
    pub year: i32,
    pub action: YearEndAction,
    pub entitlement: Decimal,
    pub carry_forward_max: Decimal,
    pub encashment_max: Decimal,
}

#[derive(Debug, Clone)]
pub struct NewEmployee {
    pub name: String,
    pub email: String,
    pub department: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub role_id: u8,
    pub employee_id: Option<u64>,
    /// MANAGER accounts start unapproved and cannot log in until an
    /// admin approves them.
    pub is_approved: bool,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRecord {
    pub id: u64,
    pub username: String,
    pub password: String,
    pub role_id: u8,
    pub employee_id: Option<u64>,
    pub is_approved: bool,
}

#[async_trait]
pub trait LeaveStore: Send + Sync {
    // ---- leave requests ----

    /// Atomic apply: overlap check against active requests, lazy ledger
    /// creation, balance deduction, insert. Any failure leaves nothing
    /// behind.
    async fn apply_leave(&self, new: NewLeaveRequest) -> Result<LeaveRequest, LeaveError>;

    async fn leave_by_id(&self, id: u64) -> Result<LeaveRequest, LeaveError>;

    /// Atomic status CAS plus optional balance restore.
    async fn transition_leave(&self, t: LeaveTransition) -> Result<LeaveRequest, LeaveError>;

    /// Atomic cancel: re-checks cancellability against `today` at commit
    /// time, then flips status and restores the balance.
    async fn cancel_leave(
        &self,
        id: u64,
        today: NaiveDate,
        entitlement: Decimal,
    ) -> Result<LeaveRequest, LeaveError>;

    /// Scoped listing, newest created first.
    async fn list_leaves(
        &self,
        scope: &ListScope,
        status: Option<LeaveStatus>,
        page: PageRequest,
    ) -> Result<PageResult<LeaveRequest>, LeaveError>;

    async fn count_auto_approved_in_month(
        &self,
        employee_id: u64,
        year: i32,
        month: u32,
    ) -> Result<i64, LeaveError>;

    // ---- balance ledger ----

    async fn get_or_create_balance(
        &self,
        employee_id: u64,
        year: i32,
        entitlement: Decimal,
    ) -> Result<LeaveBalance, LeaveError>;

    /// Atomic year-end settlement; fails `AlreadyProcessed` once the
    /// year's action is set.
    async fn process_year_end(
        &self,
        req: YearEndRequest,
    ) -> Result<(LeaveBalance, YearEndOutcome), LeaveError>;

    // ---- holidays ----

    async fn holiday_dates_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<HashSet<NaiveDate>, LeaveError>;

    async fn create_holiday(&self, name: String, date: NaiveDate) -> Result<Holiday, LeaveError>;

    async fn holidays_by_year(&self, year: Option<i32>) -> Result<Vec<Holiday>, LeaveError>;

    async fn delete_holiday(&self, id: u64) -> Result<(), LeaveError>;

    // ---- employees ----

    async fn create_employee(&self, new: NewEmployee) -> Result<Employee, LeaveError>;

    async fn employee_by_id(&self, id: u64) -> Result<Option<Employee>, LeaveError>;

    async fn list_employees(&self, page: PageRequest) -> Result<PageResult<Employee>, LeaveError>;

    /// User ids of managers whose employee profile sits in `department`.
    async fn manager_user_ids(&self, department: &str) -> Result<Vec<u64>, LeaveError>;

    async fn user_id_of_employee(&self, employee_id: u64) -> Result<Option<u64>, LeaveError>;

    // ---- users (auth glue) ----

    async fn create_user(&self, new: NewUser) -> Result<u64, LeaveError>;

    async fn user_by_username(&self, username: &str) -> Result<Option<UserRecord>, LeaveError>;

    /// Flips the approval gate on a user account (manager vetting).
    async fn set_user_approval(&self, user_id: u64, approved: bool) -> Result<(), LeaveError>;

    // ---- notifications ----

    async fn insert_notification(&self, user_id: u64, message: String) -> Result<(), LeaveError>;

    async fn notifications_for_user(
        &self,
        user_id: u64,
        page: PageRequest,
    ) -> Result<PageResult<Notification>, LeaveError>;

    async fn mark_notification_read(&self, id: u64, user_id: u64) -> Result<(), LeaveError>;
}
