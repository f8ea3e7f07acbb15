//! MySQL store. Composite operations run inside a transaction with
//! `SELECT ... FOR UPDATE` row locks, so balance movement and status
//! mutation commit together or not at all.

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{MySql, MySqlPool, Transaction, prelude::FromRow};

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

pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

fn storage(e: sqlx::Error) -> LeaveError {
    LeaveError::Storage(e.into())
}

fn parse_error(e: strum::ParseError, what: &str) -> LeaveError {
    LeaveError::Storage(anyhow::anyhow!("invalid {} stored in database: {}", what, e))
}

fn is_duplicate(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23000"))
}

// Helper enum for typed SQLx binding of dynamic filters
enum FilterValue {
    U64(u64),
    Str(String),
}

#[derive(FromRow)]
struct LeaveRow {
    id: u64,
    employee_id: u64,
    start_date: NaiveDate,
    end_date: NaiveDate,
    total_days: Decimal,
    working_days: Decimal,
    reason: String,
    status: String,
    duration: String,
    half_day_type: Option<String>,
    auto_approved: bool,
    processed_at: Option<DateTime<Utc>>,
    processed_by: Option<u64>,
    created_at: DateTime<Utc>,
}

impl TryFrom<LeaveRow> for LeaveRequest {
    type Error = LeaveError;

    fn try_from(row: LeaveRow) -> Result<Self, LeaveError> {
        Ok(LeaveRequest {
            id: row.id,
            employee_id: row.employee_id,
            start_date: row.start_date,
            end_date: row.end_date,
            total_days: row.total_days,
            working_days: row.working_days,
            reason: row.reason,
            status: row.status.parse().map_err(|e| parse_error(e, "status"))?,
            duration: row.duration.parse().map_err(|e| parse_error(e, "duration"))?,
            half_day_type: row
                .half_day_type
                .map(|s| s.parse().map_err(|e| parse_error(e, "half_day_type")))
                .transpose()?,
            auto_approved: row.auto_approved,
            processed_at: row.processed_at,
            processed_by: row.processed_by,
            created_at: row.created_at,
        })
    }
}

#[derive(FromRow)]
struct BalanceRow {
    id: u64,
    employee_id: u64,
    year: i32,
    total_entitlement: Decimal,
    used_leaves: Decimal,
    remaining_leaves: Decimal,
    carried_forward: Decimal,
    year_end_action: Option<String>,
    year_end_action_at: Option<DateTime<Utc>>,
}

impl TryFrom<BalanceRow> for LeaveBalance {
    type Error = LeaveError;

    fn try_from(row: BalanceRow) -> Result<Self, LeaveError> {
        Ok(LeaveBalance {
            id: row.id,
            employee_id: row.employee_id,
            year: row.year,
            total_entitlement: row.total_entitlement,
            used_leaves: row.used_leaves,
            remaining_leaves: row.remaining_leaves,
            carried_forward: row.carried_forward,
            year_end_action: row
                .year_end_action
                .map(|s| s.parse().map_err(|e| parse_error(e, "year_end_action")))
                .transpose()?,
            year_end_action_at: row.year_end_action_at,
        })
    }
}

const LEAVE_COLUMNS: &str = "id, employee_id, start_date, end_date, total_days, working_days, \
     reason, status, duration, half_day_type, auto_approved, processed_at, processed_by, created_at";

const BALANCE_COLUMNS: &str = "id, employee_id, year, total_entitlement, used_leaves, \
     remaining_leaves, carried_forward, year_end_action, year_end_action_at";

impl MySqlStore {
    async fn leave_for_update(
        tx: &mut Transaction<'_, MySql>,
        id: u64,
    ) -> Result<LeaveRequest, LeaveError> {
        let row: Option<LeaveRow> = sqlx::query_as(&format!(
            "SELECT {LEAVE_COLUMNS} FROM leave_requests WHERE id = ? FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut **tx)
        .await
        .map_err(storage)?;

        row.ok_or_else(|| LeaveError::NotFound(format!("Leave request with id: {}", id)))?
            .try_into()
    }

    /// Lazily creates the ledger row, then locks it for this transaction.
    async fn balance_for_update(
        tx: &mut Transaction<'_, MySql>,
        employee_id: u64,
        year: i32,
        entitlement: Decimal,
    ) -> Result<LeaveBalance, LeaveError> {
        sqlx::query(
            r#"
            INSERT IGNORE INTO leave_balances
                (employee_id, year, total_entitlement, used_leaves, remaining_leaves, carried_forward)
            VALUES (?, ?, ?, 0, ?, 0)
            "#,
        )
        .bind(employee_id)
        .bind(year)
        .bind(entitlement)
        .bind(entitlement)
        .execute(&mut **tx)
        .await
        .map_err(storage)?;

        let row: BalanceRow = sqlx::query_as(&format!(
            "SELECT {BALANCE_COLUMNS} FROM leave_balances WHERE employee_id = ? AND year = ? FOR UPDATE"
        ))
        .bind(employee_id)
        .bind(year)
        .fetch_one(&mut **tx)
        .await
        .map_err(storage)?;

        row.try_into()
    }

    async fn save_balance(
        tx: &mut Transaction<'_, MySql>,
        balance: &LeaveBalance,
    ) -> Result<(), LeaveError> {
        sqlx::query(
            r#"
            UPDATE leave_balances
            SET total_entitlement = ?, used_leaves = ?, remaining_leaves = ?,
                carried_forward = ?, year_end_action = ?, year_end_action_at = ?
            WHERE employee_id = ? AND year = ?
            "#,
        )
        .bind(balance.total_entitlement)
        .bind(balance.used_leaves)
        .bind(balance.remaining_leaves)
        .bind(balance.carried_forward)
        .bind(balance.year_end_action.map(|a| a.to_string()))
        .bind(balance.year_end_action_at)
        .bind(balance.employee_id)
        .bind(balance.year)
        .execute(&mut **tx)
        .await
        .map_err(storage)?;
        Ok(())
    }
}

#[async_trait]
impl LeaveStore for MySqlStore {
    async fn apply_leave(&self, new: NewLeaveRequest) -> Result<LeaveRequest, LeaveError> {
        let mut tx = self.pool.begin().await.map_err(storage)?;

        // Ledger row lock comes first; it serializes concurrent applies
        // for the employee-year before any request rows are read.
        let year = new.start_date.year();
        let mut balance =
            Self::balance_for_update(&mut tx, new.employee_id, year, new.entitlement).await?;

        // Locking read: sees committed inserts, not the REPEATABLE READ
        // snapshot taken at transaction start.
        let overlapping: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM leave_requests
            WHERE employee_id = ?
            AND status IN ('PENDING', 'APPROVED')
            AND start_date <= ? AND end_date >= ?
            FOR UPDATE
            "#,
        )
        .bind(new.employee_id)
        .bind(new.end_date)
        .bind(new.start_date)
        .fetch_one(&mut *tx)
        .await
        .map_err(storage)?;

        if overlapping > 0 {
            return Err(LeaveError::Overlap);
        }

        // Authoritative cap recheck inside the transaction
        let mut status = new.status;
        let mut auto_approved = new.auto_approved;
        let mut processed_at = new.processed_at;
        if let Some(cap) = new.auto_approval_cap {
            let prior: i64 = sqlx::query_scalar(
                r#"
                SELECT COUNT(*) FROM leave_requests
                WHERE employee_id = ? AND auto_approved = TRUE
                AND YEAR(created_at) = ? AND MONTH(created_at) = ?
                FOR UPDATE
                "#,
            )
            .bind(new.employee_id)
            .bind(new.start_date.year())
            .bind(new.start_date.month())
            .fetch_one(&mut *tx)
            .await
            .map_err(storage)?;

            if prior >= cap {
                status = LeaveStatus::Pending;
                auto_approved = false;
                processed_at = None;
            }
        }

        balance.deduct(new.working_days)?;
        Self::save_balance(&mut tx, &balance).await?;

        let created_at = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO leave_requests
                (employee_id, start_date, end_date, total_days, working_days, reason,
                 status, duration, half_day_type, auto_approved, processed_at, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(new.employee_id)
        .bind(new.start_date)
        .bind(new.end_date)
        .bind(new.total_days)
        .bind(new.working_days)
        .bind(&new.reason)
        .bind(status.to_string())
        .bind(new.duration.to_string())
        .bind(new.half_day_type.map(|h| h.to_string()))
        .bind(auto_approved)
        .bind(processed_at)
        .bind(created_at)
        .execute(&mut *tx)
        .await
        .map_err(storage)?;

        tx.commit().await.map_err(storage)?;

        Ok(LeaveRequest {
            id: result.last_insert_id(),
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
            created_at,
        })
    }

    async fn leave_by_id(&self, id: u64) -> Result<LeaveRequest, LeaveError> {
        let row: Option<LeaveRow> =
            sqlx::query_as(&format!("SELECT {LEAVE_COLUMNS} FROM leave_requests WHERE id = ?"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(storage)?;

        row.ok_or_else(|| LeaveError::NotFound(format!("Leave request with id: {}", id)))?
            .try_into()
    }

    async fn transition_leave(&self, t: LeaveTransition) -> Result<LeaveRequest, LeaveError> {
        let mut tx = self.pool.begin().await.map_err(storage)?;

        let mut leave = Self::leave_for_update(&mut tx, t.id).await?;
        if leave.status != t.expect {
            return Err(LeaveError::InvalidTransition(format!(
                "Only {} leaves can be processed. Current status: {}",
                t.expect, leave.status
            )));
        }

        sqlx::query("UPDATE leave_requests SET status = ?, processed_at = ?, processed_by = ? WHERE id = ?")
            .bind(t.to.to_string())
            .bind(t.processed_at)
            .bind(t.processed_by)
            .bind(t.id)
            .execute(&mut *tx)
            .await
            .map_err(storage)?;

        if t.restore_balance {
            let year = leave.start_date.year();
            let mut balance =
                Self::balance_for_update(&mut tx, leave.employee_id, year, t.entitlement).await?;
            balance.restore(leave.working_days);
            Self::save_balance(&mut tx, &balance).await?;
        }

        tx.commit().await.map_err(storage)?;

        leave.status = t.to;
        leave.processed_at = Some(t.processed_at);
        leave.processed_by = Some(t.processed_by);
        Ok(leave)
    }

    async fn cancel_leave(
        &self,
        id: u64,
        today: NaiveDate,
        entitlement: Decimal,
    ) -> Result<LeaveRequest, LeaveError> {
        let mut tx = self.pool.begin().await.map_err(storage)?;

        let mut leave = Self::leave_for_update(&mut tx, id).await?;
        if !leave.can_cancel(today) {
            return Err(LeaveError::InvalidTransition(
                "You can only cancel pending leaves or leaves that haven't started yet".into(),
            ));
        }

        sqlx::query("UPDATE leave_requests SET status = ? WHERE id = ?")
            .bind(LeaveStatus::Cancelled.to_string())
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(storage)?;

        let year = leave.start_date.year();
        let mut balance =
            Self::balance_for_update(&mut tx, leave.employee_id, year, entitlement).await?;
        balance.restore(leave.working_days);
        Self::save_balance(&mut tx, &balance).await?;

        tx.commit().await.map_err(storage)?;

        leave.status = LeaveStatus::Cancelled;
        Ok(leave)
    }

    async fn list_leaves(
        &self,
        scope: &ListScope,
        status: Option<LeaveStatus>,
        page: PageRequest,
    ) -> Result<PageResult<LeaveRequest>, LeaveError> {
        // -------------------------
        // WHERE clause
        // -------------------------
        let mut where_sql = String::from(" WHERE 1=1");
        let mut args: Vec<FilterValue> = Vec::new();

        match scope {
            ListScope::All => {}
            ListScope::Own(employee_id) => {
                where_sql.push_str(" AND lr.employee_id = ?");
                args.push(FilterValue::U64(*employee_id));
            }
            ListScope::Department(department) => {
                where_sql.push_str(" AND e.department = ?");
                args.push(FilterValue::Str(department.clone()));
            }
        }

        if let Some(status) = status {
            where_sql.push_str(" AND lr.status = ?");
            args.push(FilterValue::Str(status.to_string()));
        }

        let from_sql = " FROM leave_requests lr JOIN employees e ON e.id = lr.employee_id";

        // -------------------------
        // COUNT query
        // -------------------------
        let count_sql = format!("SELECT COUNT(*){}{}", from_sql, where_sql);
        let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
        for arg in &args {
            count_q = match arg {
                FilterValue::U64(v) => count_q.bind(*v),
                FilterValue::Str(s) => count_q.bind(s.clone()),
            };
        }
        let total = count_q.fetch_one(&self.pool).await.map_err(storage)?;

        // -------------------------
        // DATA query
        // -------------------------
        let data_sql = format!(
            "SELECT lr.id, lr.employee_id, lr.start_date, lr.end_date, lr.total_days, \
             lr.working_days, lr.reason, lr.status, lr.duration, lr.half_day_type, \
             lr.auto_approved, lr.processed_at, lr.processed_by, lr.created_at{}{} \
             ORDER BY lr.created_at DESC, lr.id DESC LIMIT ? OFFSET ?",
            from_sql, where_sql
        );
        let mut data_q = sqlx::query_as::<_, LeaveRow>(&data_sql);
        for arg in args {
            data_q = match arg {
                FilterValue::U64(v) => data_q.bind(v),
                FilterValue::Str(s) => data_q.bind(s),
            };
        }

        let rows = data_q
            .bind(page.per_page)
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await
            .map_err(storage)?;

        let data = rows
            .into_iter()
            .map(LeaveRequest::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(PageResult {
            data,
            page: page.page,
            per_page: page.per_page,
            total,
        })
    }

    async fn count_auto_approved_in_month(
        &self,
        employee_id: u64,
        year: i32,
        month: u32,
    ) -> Result<i64, LeaveError> {
        sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM leave_requests
            WHERE employee_id = ?
            AND auto_approved = TRUE
            AND YEAR(created_at) = ?
            AND MONTH(created_at) = ?
            "#,
        )
        .bind(employee_id)
        .bind(year)
        .bind(month)
        .fetch_one(&self.pool)
        .await
        .map_err(storage)
    }

    async fn get_or_create_balance(
        &self,
        employee_id: u64,
        year: i32,
        entitlement: Decimal,
    ) -> Result<LeaveBalance, LeaveError> {
        let mut tx = self.pool.begin().await.map_err(storage)?;
        let balance = Self::balance_for_update(&mut tx, employee_id, year, entitlement).await?;
        tx.commit().await.map_err(storage)?;
        Ok(balance)
    }

    async fn process_year_end(
        &self,
        req: YearEndRequest,
    ) -> Result<(LeaveBalance, YearEndOutcome), LeaveError> {
        let mut tx = self.pool.begin().await.map_err(storage)?;

        let row: Option<BalanceRow> = sqlx::query_as(&format!(
            "SELECT {BALANCE_COLUMNS} FROM leave_balances WHERE employee_id = ? AND year = ? FOR UPDATE"
        ))
        .bind(req.employee_id)
        .bind(req.year)
        .fetch_optional(&mut *tx)
        .await
        .map_err(storage)?;

        let mut balance: LeaveBalance = row
            .ok_or_else(|| LeaveError::NotFound(format!("Leave balance for year: {}", req.year)))?
            .try_into()?;

        let outcome = balance.apply_year_end(
            req.action,
            req.carry_forward_max,
            req.encashment_max,
            Utc::now(),
        )?;
        Self::save_balance(&mut tx, &balance).await?;

        if let YearEndOutcome::Carried(to_carry) = outcome {
            let mut next =
                Self::balance_for_update(&mut tx, req.employee_id, req.year + 1, req.entitlement)
                    .await?;
            next.receive_carry(to_carry, req.entitlement);
            Self::save_balance(&mut tx, &next).await?;
        }

        tx.commit().await.map_err(storage)?;
        Ok((balance, outcome))
    }

    async fn holiday_dates_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<HashSet<NaiveDate>, LeaveError> {
        let dates: Vec<NaiveDate> =
            sqlx::query_scalar("SELECT date FROM holidays WHERE date BETWEEN ? AND ?")
                .bind(start)
                .bind(end)
                .fetch_all(&self.pool)
                .await
                .map_err(storage)?;
        Ok(dates.into_iter().collect())
    }

    async fn create_holiday(&self, name: String, date: NaiveDate) -> Result<Holiday, LeaveError> {
        let result = sqlx::query("INSERT INTO holidays (name, date, year) VALUES (?, ?, ?)")
            .bind(&name)
            .bind(date)
            .bind(date.year())
            .execute(&self.pool)
            .await;

        match result {
            Ok(done) => Ok(Holiday {
                id: done.last_insert_id(),
                name,
                date,
                year: date.year(),
            }),
            Err(e) if is_duplicate(&e) => Err(LeaveError::InvalidRequest(format!(
                "Holiday already exists for date: {}",
                date
            ))),
            Err(e) => Err(storage(e)),
        }
    }

    async fn holidays_by_year(&self, year: Option<i32>) -> Result<Vec<Holiday>, LeaveError> {
        let rows = match year {
            Some(y) => {
                sqlx::query_as::<_, Holiday>(
                    "SELECT id, name, date, year FROM holidays WHERE year = ? ORDER BY date",
                )
                .bind(y)
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query_as::<_, Holiday>(
                    "SELECT id, name, date, year FROM holidays ORDER BY date",
                )
                .fetch_all(&self.pool)
                .await
            }
        };
        rows.map_err(storage)
    }

    async fn delete_holiday(&self, id: u64) -> Result<(), LeaveError> {
        let result = sqlx::query("DELETE FROM holidays WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(storage)?;

        if result.rows_affected() == 0 {
            return Err(LeaveError::NotFound(format!("Holiday with id: {}", id)));
        }
        Ok(())
    }

    async fn create_employee(&self, new: NewEmployee) -> Result<Employee, LeaveError> {
        let result = sqlx::query("INSERT INTO employees (name, email, department) VALUES (?, ?, ?)")
            .bind(&new.name)
            .bind(&new.email)
            .bind(&new.department)
            .execute(&self.pool)
            .await;

        match result {
            Ok(done) => Ok(Employee {
                id: done.last_insert_id(),
                name: new.name,
                email: new.email,
                department: new.department,
            }),
            Err(e) if is_duplicate(&e) => {
                Err(LeaveError::InvalidRequest("Email already exists".into()))
            }
            Err(e) => Err(storage(e)),
        }
    }

    async fn employee_by_id(&self, id: u64) -> Result<Option<Employee>, LeaveError> {
        sqlx::query_as::<_, Employee>(
            "SELECT id, name, email, department FROM employees WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage)
    }

    async fn list_employees(&self, page: PageRequest) -> Result<PageResult<Employee>, LeaveError> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM employees")
            .fetch_one(&self.pool)
            .await
            .map_err(storage)?;

        let data = sqlx::query_as::<_, Employee>(
            "SELECT id, name, email, department FROM employees ORDER BY id LIMIT ? OFFSET ?",
        )
        .bind(page.per_page)
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await
        .map_err(storage)?;

        Ok(PageResult {
            data,
            page: page.page,
            per_page: page.per_page,
            total,
        })
    }

    async fn manager_user_ids(&self, department: &str) -> Result<Vec<u64>, LeaveError> {
        sqlx::query_scalar(
            r#"
            SELECT u.id FROM users u
            JOIN employees e ON e.id = u.employee_id
            WHERE u.role_id = 2 AND u.is_approved = TRUE AND e.department = ?
            "#,
        )
        .bind(department)
        .fetch_all(&self.pool)
        .await
        .map_err(storage)
    }

    async fn user_id_of_employee(&self, employee_id: u64) -> Result<Option<u64>, LeaveError> {
        sqlx::query_scalar("SELECT id FROM users WHERE employee_id = ?")
            .bind(employee_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage)
    }

    async fn create_user(&self, new: NewUser) -> Result<u64, LeaveError> {
        let result = sqlx::query(
            "INSERT INTO users (username, password, role_id, employee_id, is_approved) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&new.username)
        .bind(&new.password_hash)
        .bind(new.role_id)
        .bind(new.employee_id)
        .bind(new.is_approved)
        .execute(&self.pool)
        .await;

        match result {
            Ok(done) => Ok(done.last_insert_id()),
            Err(e) if is_duplicate(&e) => {
                Err(LeaveError::InvalidRequest("Username already exists".into()))
            }
            Err(e) => Err(storage(e)),
        }
    }

    async fn user_by_username(&self, username: &str) -> Result<Option<UserRecord>, LeaveError> {
        sqlx::query_as::<_, UserRecord>(
            "SELECT id, username, password, role_id, employee_id, is_approved FROM users WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage)
    }

    async fn set_user_approval(&self, user_id: u64, approved: bool) -> Result<(), LeaveError> {
        // rows_affected is 0 for a no-op UPDATE, so existence is checked
        // separately to keep re-approval idempotent.
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = ?)")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(storage)?;

        if !exists {
            return Err(LeaveError::NotFound(format!("User with id: {}", user_id)));
        }

        sqlx::query("UPDATE users SET is_approved = ? WHERE id = ?")
            .bind(approved)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(storage)?;
        Ok(())
    }

    async fn insert_notification(&self, user_id: u64, message: String) -> Result<(), LeaveError> {
        sqlx::query(
            "INSERT INTO notifications (user_id, message, is_read, created_at) VALUES (?, ?, FALSE, ?)",
        )
        .bind(user_id)
        .bind(&message)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(storage)?;
        Ok(())
    }

    async fn notifications_for_user(
        &self,
        user_id: u64,
        page: PageRequest,
    ) -> Result<PageResult<Notification>, LeaveError> {
        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM notifications WHERE user_id = ?")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await
                .map_err(storage)?;

        let data = sqlx::query_as::<_, Notification>(
            r#"
            SELECT id, user_id, message, is_read, created_at
            FROM notifications
            WHERE user_id = ?
            ORDER BY created_at DESC, id DESC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(user_id)
        .bind(page.per_page)
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await
        .map_err(storage)?;

        Ok(PageResult {
            data,
            page: page.page,
            per_page: page.per_page,
            total,
        })
    }

    async fn mark_notification_read(&self, id: u64, user_id: u64) -> Result<(), LeaveError> {
        let result =
            sqlx::query("UPDATE notifications SET is_read = TRUE WHERE id = ? AND user_id = ?")
                .bind(id)
                .bind(user_id)
                .execute(&self.pool)
                .await
                .map_err(storage)?;

        if result.rows_affected() == 0 {
            return Err(LeaveError::NotFound(format!("Notification with id: {}", id)));
        }
        Ok(())
    }
}
