//! In-memory store, used by the test suite and when no DATABASE_URL is
//! configured. A single mutex serializes every mutation, which trivially
//! gives the per-entry atomicity the composite operations require.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;

use crate::domain::error::LeaveError;
use crate::domain::guard::ListScope;
use crate::model::balance::{LeaveBalance, YearEndOutcome};
use crate::model::employee::Employee;
use crate::model::holiday::Holiday;
use crate::model::leave_request::{LeaveRequest, LeaveStatus};
use crate::model::notification::Notification;

use super::{
    LeaveStore, LeaveTransition, NewEmployee, NewLeaveRequest, NewUser, PageRequest, PageResult,
    UserRecord, YearEndRequest,
};

#[derive(Default)]
struct MemInner {
    next_id: u64,
    leaves: HashMap<u64, LeaveRequest>,
    balances: HashMap<(u64, i32), LeaveBalance>,
    holidays: BTreeMap<NaiveDate, Holiday>,
    employees: HashMap<u64, Employee>,
    users: HashMap<u64, UserRecord>,
    notifications: Vec<Notification>,
}

impl MemInner {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn balance_mut(
        &mut self,
        employee_id: u64,
        year: i32,
        entitlement: Decimal,
    ) -> &mut LeaveBalance {
        let id = if self.balances.contains_key(&(employee_id, year)) {
            0
        } else {
            self.next_id()
        };
        self.balances.entry((employee_id, year)).or_insert_with(|| {
            let mut balance = LeaveBalance::new(employee_id, year, entitlement);
            balance.id = id;
            balance
        })
    }
}

#[derive(Default)]
pub struct MemStore {
    inner: Mutex<MemInner>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemInner> {
        self.inner.lock().unwrap_or_else(|poison| poison.into_inner())
    }
}

fn not_found_leave(id: u64) -> LeaveError {
    LeaveError::NotFound(format!("Leave request with id: {}", id))
}

fn paginate<T: Clone>(items: Vec<T>, page: PageRequest) -> PageResult<T> {
    let total = items.len() as i64;
    let data = items
        .into_iter()
        .skip(page.offset() as usize)
        .take(page.per_page as usize)
        .collect();
    PageResult {
        data,
        page: page.page,
        per_page: page.per_page,
        total,
    }
}

#[async_trait]
impl LeaveStore for MemStore {
    async fn apply_leave(&self, new: NewLeaveRequest) -> Result<LeaveRequest, LeaveError> {
        let mut inner = self.lock();

        let overlaps = inner.leaves.values().any(|existing| {
            existing.employee_id == new.employee_id
                && existing.is_active()
                && existing.overlaps(new.start_date, new.end_date)
        });
        if overlaps {
            return Err(LeaveError::Overlap);
        }

        // Authoritative cap recheck, under the same lock as the insert
        let mut status = new.status;
        let mut auto_approved = new.auto_approved;
        let mut processed_at = new.processed_at;
        if let Some(cap) = new.auto_approval_cap {
            let prior = inner
                .leaves
                .values()
                .filter(|leave| {
                    leave.employee_id == new.employee_id
                        && leave.auto_approved
                        && leave.created_at.year() == new.start_date.year()
                        && leave.created_at.month() == new.start_date.month()
                })
                .count() as i64;
            if prior >= cap {
                status = LeaveStatus::Pending;
                auto_approved = false;
                processed_at = None;
            }
        }

        let year = new.start_date.year();
        inner
            .balance_mut(new.employee_id, year, new.entitlement)
            .deduct(new.working_days)?;

        let id = inner.next_id();
        let leave = LeaveRequest {
            id,
            employee_id: new.employee_id,
            start_date: new.start_date,
            end_date: new.end_date,
            total_days: new.total_days,
            working_days: new.working_days,
            reason: new.reason,
            status,
            duration: new.duration,
            half_day_type: new.half_day_type,
            auto_approved,
            processed_at,
            processed_by: None,
            created_at: Utc::now(),
        };
        inner.leaves.insert(id, leave.clone());
        Ok(leave)
    }

    async fn leave_by_id(&self, id: u64) -> Result<LeaveRequest, LeaveError> {
        self.lock()
            .leaves
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found_leave(id))
    }

    async fn transition_leave(&self, t: LeaveTransition) -> Result<LeaveRequest, LeaveError> {
        let mut inner = self.lock();

        let current = inner.leaves.get(&t.id).ok_or_else(|| not_found_leave(t.id))?;
        if current.status != t.expect {
            return Err(LeaveError::InvalidTransition(format!(
                "Only {} leaves can be processed. Current status: {}",
                t.expect, current.status
            )));
        }

        let mut updated = current.clone();
        updated.status = t.to;
        updated.processed_at = Some(t.processed_at);
        updated.processed_by = Some(t.processed_by);

        if t.restore_balance {
            let year = updated.start_date.year();
            let days = updated.working_days;
            inner
                .balance_mut(updated.employee_id, year, t.entitlement)
                .restore(days);
        }

        inner.leaves.insert(t.id, updated.clone());
        Ok(updated)
    }

    async fn cancel_leave(
        &self,
        id: u64,
        today: NaiveDate,
        entitlement: Decimal,
    ) -> Result<LeaveRequest, LeaveError> {
        let mut inner = self.lock();

        let current = inner.leaves.get(&id).ok_or_else(|| not_found_leave(id))?;
        if !current.can_cancel(today) {
            return Err(LeaveError::InvalidTransition(
                "You can only cancel pending leaves or leaves that haven't started yet".into(),
            ));
        }

        let mut updated = current.clone();
        updated.status = LeaveStatus::Cancelled;

        let year = updated.start_date.year();
        let days = updated.working_days;
        inner
            .balance_mut(updated.employee_id, year, entitlement)
            .restore(days);

        inner.leaves.insert(id, updated.clone());
        Ok(updated)
    }

    async fn list_leaves(
        &self,
        scope: &ListScope,
        status: Option<LeaveStatus>,
        page: PageRequest,
    ) -> Result<PageResult<LeaveRequest>, LeaveError> {
        let inner = self.lock();

        let mut filtered: Vec<LeaveRequest> = inner
            .leaves
            .values()
            .filter(|leave| match scope {
                ListScope::All => true,
                ListScope::Own(employee_id) => leave.employee_id == *employee_id,
                ListScope::Department(department) => inner
                    .employees
                    .get(&leave.employee_id)
                    .and_then(|e| e.department.as_deref())
                    .is_some_and(|d| d == department),
            })
            .filter(|leave| status.is_none_or(|s| leave.status == s))
            .cloned()
            .collect();

        // newest first, id as tiebreaker
        filtered.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(paginate(filtered, page))
    }

    async fn count_auto_approved_in_month(
        &self,
        employee_id: u64,
        year: i32,
        month: u32,
    ) -> Result<i64, LeaveError> {
        let inner = self.lock();
        let count = inner
            .leaves
            .values()
            .filter(|leave| {
                leave.employee_id == employee_id
                    && leave.auto_approved
                    && leave.created_at.year() == year
                    && leave.created_at.month() == month
            })
            .count();
        Ok(count as i64)
    }

    async fn get_or_create_balance(
        &self,
        employee_id: u64,
        year: i32,
        entitlement: Decimal,
    ) -> Result<LeaveBalance, LeaveError> {
        let mut inner = self.lock();
        Ok(inner.balance_mut(employee_id, year, entitlement).clone())
    }

    async fn process_year_end(
        &self,
        req: YearEndRequest,
    ) -> Result<(LeaveBalance, YearEndOutcome), LeaveError> {
        let mut inner = self.lock();

        let balance = inner
            .balances
            .get_mut(&(req.employee_id, req.year))
            .ok_or_else(|| LeaveError::NotFound(format!("Leave balance for year: {}", req.year)))?;

        let outcome = balance.apply_year_end(
            req.action,
            req.carry_forward_max,
            req.encashment_max,
            Utc::now(),
        )?;
        let settled = balance.clone();

        if let YearEndOutcome::Carried(to_carry) = outcome {
            let entitlement = req.entitlement;
            inner
                .balance_mut(req.employee_id, req.year + 1, entitlement)
                .receive_carry(to_carry, entitlement);
        }

        Ok((settled, outcome))
    }

    async fn holiday_dates_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<HashSet<NaiveDate>, LeaveError> {
        let inner = self.lock();
        Ok(inner.holidays.range(start..=end).map(|(date, _)| *date).collect())
    }

    async fn create_holiday(&self, name: String, date: NaiveDate) -> Result<Holiday, LeaveError> {
        let mut inner = self.lock();
        if inner.holidays.contains_key(&date) {
            return Err(LeaveError::InvalidRequest(format!(
                "Holiday already exists for date: {}",
                date
            )));
        }
        let id = inner.next_id();
        let holiday = Holiday {
            id,
            name,
            date,
            year: date.year(),
        };
        inner.holidays.insert(date, holiday.clone());
        Ok(holiday)
    }

    async fn holidays_by_year(&self, year: Option<i32>) -> Result<Vec<Holiday>, LeaveError> {
        let inner = self.lock();
        Ok(inner
            .holidays
            .values()
            .filter(|h| year.is_none_or(|y| h.year == y))
            .cloned()
            .collect())
    }

    async fn delete_holiday(&self, id: u64) -> Result<(), LeaveError> {
        let mut inner = self.lock();
        let date = inner
            .holidays
            .values()
            .find(|h| h.id == id)
            .map(|h| h.date)
            .ok_or_else(|| LeaveError::NotFound(format!("Holiday with id: {}", id)))?;
        inner.holidays.remove(&date);
        Ok(())
    }

    async fn create_employee(&self, new: NewEmployee) -> Result<Employee, LeaveError> {
        let mut inner = self.lock();
        if inner.employees.values().any(|e| e.email == new.email) {
            return Err(LeaveError::InvalidRequest("Email already exists".into()));
        }
        let id = inner.next_id();
        let employee = Employee {
            id,
            name: new.name,
            email: new.email,
            department: new.department,
        };
        inner.employees.insert(id, employee.clone());
        Ok(employee)
    }

    async fn employee_by_id(&self, id: u64) -> Result<Option<Employee>, LeaveError> {
        Ok(self.lock().employees.get(&id).cloned())
    }

    async fn list_employees(&self, page: PageRequest) -> Result<PageResult<Employee>, LeaveError> {
        let inner = self.lock();
        let mut employees: Vec<Employee> = inner.employees.values().cloned().collect();
        employees.sort_by_key(|e| e.id);
        Ok(paginate(employees, page))
    }

    async fn manager_user_ids(&self, department: &str) -> Result<Vec<u64>, LeaveError> {
        let inner = self.lock();
        let mut ids: Vec<u64> = inner
            .users
            .values()
            .filter(|user| user.role_id == 2 && user.is_approved)
            .filter(|user| {
                user.employee_id
                    .and_then(|id| inner.employees.get(&id))
                    .and_then(|e| e.department.as_deref())
                    .is_some_and(|d| d == department)
            })
            .map(|user| user.id)
            .collect();
        ids.sort_unstable();
        Ok(ids)
    }

    async fn user_id_of_employee(&self, employee_id: u64) -> Result<Option<u64>, LeaveError> {
        Ok(self
            .lock()
            .users
            .values()
            .find(|user| user.employee_id == Some(employee_id))
            .map(|user| user.id))
    }

    async fn create_user(&self, new: NewUser) -> Result<u64, LeaveError> {
        let mut inner = self.lock();
        if inner.users.values().any(|u| u.username == new.username) {
            return Err(LeaveError::InvalidRequest("Username already exists".into()));
        }
        let id = inner.next_id();
        inner.users.insert(
            id,
            UserRecord {
                id,
                username: new.username,
                password: new.password_hash,
                role_id: new.role_id,
                employee_id: new.employee_id,
                is_approved: new.is_approved,
            },
        );
        Ok(id)
    }

    async fn set_user_approval(&self, user_id: u64, approved: bool) -> Result<(), LeaveError> {
        let mut inner = self.lock();
        let user = inner
            .users
            .get_mut(&user_id)
            .ok_or_else(|| LeaveError::NotFound(format!("User with id: {}", user_id)))?;
        user.is_approved = approved;
        Ok(())
    }

    async fn user_by_username(&self, username: &str) -> Result<Option<UserRecord>, LeaveError> {
        Ok(self
            .lock()
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn insert_notification(&self, user_id: u64, message: String) -> Result<(), LeaveError> {
        let mut inner = self.lock();
        let id = inner.next_id();
        inner.notifications.push(Notification {
            id,
            user_id,
            message,
            is_read: false,
            created_at: Utc::now(),
        });
        Ok(())
    }

    async fn notifications_for_user(
        &self,
        user_id: u64,
        page: PageRequest,
    ) -> Result<PageResult<Notification>, LeaveError> {
        let inner = self.lock();
        let mut rows: Vec<Notification> = inner
            .notifications
            .iter()
            .filter(|n| n.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(paginate(rows, page))
    }

    async fn mark_notification_read(&self, id: u64, user_id: u64) -> Result<(), LeaveError> {
        let mut inner = self.lock();
        let row = inner
            .notifications
            .iter_mut()
            .find(|n| n.id == id && n.user_id == user_id)
            .ok_or_else(|| LeaveError::NotFound(format!("Notification with id: {}", id)))?;
        row.is_read = true;
        Ok(())
    }
}
