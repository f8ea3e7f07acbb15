//! Leave request lifecycle engine: validation, working-day calculation,
//! balance accounting, auto-approval and the status state machine.
//! Status and balance move together inside one atomic store call; events
//! go out only after that call has committed.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::domain::calendar;
use crate::domain::error::LeaveError;
use crate::domain::events::{DomainEvent, Notifier};
use crate::domain::guard::{self, Actor, ListScope};
use crate::domain::policy::AutoApprovalPolicy;
use crate::model::balance::{LeaveBalance, YearEndAction, YearEndOutcome};
use crate::model::leave_request::{HalfDayType, LeaveDuration, LeaveRequest, LeaveStatus};
use crate::store::{
    LeaveStore, LeaveTransition, NewLeaveRequest, PageRequest, PageResult, YearEndRequest,
};
use crate::utils::employee_cache::EmployeeDirectory;

/// Leave policy values consumed by the workflow; sourced from config.
#[derive(Debug, Clone)]
pub struct LeavePolicy {
    pub annual_entitlement: Decimal,
    pub carry_forward_max: Decimal,
    pub encashment_max: Decimal,
    pub auto_approval_threshold: Decimal,
    pub auto_approval_monthly_cap: i64,
}

impl Default for LeavePolicy {
    fn default() -> Self {
        Self {
            annual_entitlement: Decimal::from(24),
            carry_forward_max: Decimal::from(12),
            encashment_max: Decimal::from(10),
            auto_approval_threshold: Decimal::from(2),
            auto_approval_monthly_cap: 2,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ApplyLeave {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: String,
    pub duration: LeaveDuration,
    pub half_day_type: Option<HalfDayType>,
}

pub struct LeaveWorkflow {
    store: Arc<dyn LeaveStore>,
    notifier: Arc<dyn Notifier>,
    directory: EmployeeDirectory,
    policy: LeavePolicy,
    auto_approval: AutoApprovalPolicy,
}

impl LeaveWorkflow {
    pub fn new(store: Arc<dyn LeaveStore>, notifier: Arc<dyn Notifier>, policy: LeavePolicy) -> Self {
        let auto_approval = AutoApprovalPolicy {
            threshold: policy.auto_approval_threshold,
            monthly_cap: policy.auto_approval_monthly_cap,
        };
        Self {
            directory: EmployeeDirectory::new(store.clone()),
            store,
            notifier,
            policy,
            auto_approval,
        }
    }

    /// Submit a leave request for the acting employee. Balance is
    /// deducted together with the insert, so a failed deduction aborts
    /// the whole apply and nothing is persisted.
    pub async fn apply(&self, actor: &Actor, input: ApplyLeave) -> Result<LeaveRequest, LeaveError> {
        let employee_id = actor.employee_id()?;
        let employee = self.directory.get(employee_id).await?;

        let today = Utc::now().date_naive();
        self.validate(&input, today)?;

        let holidays = self
            .store
            .holiday_dates_between(input.start_date, input.end_date)
            .await?;
        let total_days = calendar::total_days(input.start_date, input.end_date, input.duration);
        let working_days =
            calendar::working_days(input.start_date, input.end_date, input.duration, &holidays)?;

        let auto_approved = self
            .auto_approval
            .should_auto_approve(
                self.store.as_ref(),
                employee_id,
                working_days,
                input.start_date,
            )
            .await?;

        let now = Utc::now();
        let saved = self
            .store
            .apply_leave(NewLeaveRequest {
                employee_id,
                start_date: input.start_date,
                end_date: input.end_date,
                total_days,
                working_days,
                reason: input.reason,
                duration: input.duration,
                half_day_type: input.half_day_type,
                status: if auto_approved {
                    LeaveStatus::Approved
                } else {
                    LeaveStatus::Pending
                },
                auto_approved,
                processed_at: auto_approved.then_some(now),
                // The store re-checks the cap inside its atomic unit; a
                // concurrent apply can downgrade this candidate approval.
                auto_approval_cap: auto_approved.then_some(self.auto_approval.monthly_cap),
                entitlement: self.policy.annual_entitlement,
            })
            .await?;

        if saved.auto_approved {
            info!(employee_id, leave_id = saved.id, "Leave auto-approved");
        }

        let mut events = vec![DomainEvent::LeaveApplied(saved.clone())];
        if saved.status == LeaveStatus::Pending {
            if let Some(department) = employee.department.as_deref() {
                match self.store.manager_user_ids(department).await {
                    Ok(manager_ids) => {
                        for manager_id in manager_ids {
                            events.push(DomainEvent::ManagerNotify {
                                manager_id,
                                text: format!(
                                    "New leave request submitted by {}",
                                    employee.name
                                ),
                            });
                        }
                    }
                    Err(e) => warn!(error = %e, department, "Failed to resolve department managers"),
                }
            }
        }
        self.publish(events).await;

        Ok(saved)
    }

    /// Approve a PENDING request. Balance stays untouched; it was
    /// already deducted at apply time.
    pub async fn approve(&self, actor: &Actor, id: u64) -> Result<LeaveRequest, LeaveError> {
        let updated = self.decide(actor, id, LeaveStatus::Approved, false).await?;
        self.publish(vec![
            DomainEvent::LeaveApproved(updated.clone()),
            DomainEvent::EmployeeNotify {
                employee_id: updated.employee_id,
                text: format!(
                    "Your leave request from {} to {} has been approved.",
                    updated.start_date, updated.end_date
                ),
            },
        ])
        .await;
        Ok(updated)
    }

    /// Reject a PENDING request and give the deducted balance back.
    pub async fn reject(&self, actor: &Actor, id: u64) -> Result<LeaveRequest, LeaveError> {
        let updated = self.decide(actor, id, LeaveStatus::Rejected, true).await?;
        self.publish(vec![
            DomainEvent::LeaveRejected(updated.clone()),
            DomainEvent::EmployeeNotify {
                employee_id: updated.employee_id,
                text: format!(
                    "Your leave request from {} to {} has been rejected.",
                    updated.start_date, updated.end_date
                ),
            },
        ])
        .await;
        Ok(updated)
    }

    async fn decide(
        &self,
        actor: &Actor,
        id: u64,
        to: LeaveStatus,
        restore_balance: bool,
    ) -> Result<LeaveRequest, LeaveError> {
        let leave = self.store.leave_by_id(id).await?;
        let employee = self.directory.get(leave.employee_id).await?;
        guard::can_decide(actor, &employee)?;

        self.store
            .transition_leave(LeaveTransition {
                id,
                expect: LeaveStatus::Pending,
                to,
                processed_by: actor.user_id,
                processed_at: Utc::now(),
                restore_balance,
                entitlement: self.policy.annual_entitlement,
            })
            .await
    }

    /// Cancel an own request: PENDING always, APPROVED only while the
    /// start date is still in the future. Restores the balance.
    pub async fn cancel(&self, actor: &Actor, id: u64) -> Result<LeaveRequest, LeaveError> {
        let leave = self.store.leave_by_id(id).await?;
        guard::ensure_owner(actor, leave.employee_id)?;

        let today = Utc::now().date_naive();
        let updated = self
            .store
            .cancel_leave(id, today, self.policy.annual_entitlement)
            .await?;

        self.publish(vec![
            DomainEvent::LeaveCancelled(updated.clone()),
            DomainEvent::EmployeeNotify {
                employee_id: updated.employee_id,
                text: format!(
                    "Your leave request from {} to {} has been cancelled.",
                    updated.start_date, updated.end_date
                ),
            },
        ])
        .await;
        Ok(updated)
    }

    pub async fn get_by_id(&self, actor: &Actor, id: u64) -> Result<LeaveRequest, LeaveError> {
        let leave = self.store.leave_by_id(id).await?;
        let employee = self.directory.get(leave.employee_id).await?;
        guard::can_view(actor, &employee)?;
        Ok(leave)
    }

    /// Scoped listing: ADMIN all, MANAGER own department, EMPLOYEE own.
    pub async fn list_all(
        &self,
        actor: &Actor,
        status: Option<LeaveStatus>,
        page: PageRequest,
    ) -> Result<PageResult<LeaveRequest>, LeaveError> {
        let scope = guard::list_scope(actor)?;
        self.store.list_leaves(&scope, status, page).await
    }

    pub async fn list_by_employee(
        &self,
        actor: &Actor,
        employee_id: u64,
        status: Option<LeaveStatus>,
        page: PageRequest,
    ) -> Result<PageResult<LeaveRequest>, LeaveError> {
        let employee = self.directory.get(employee_id).await?;
        guard::can_view(actor, &employee)?;
        self.store
            .list_leaves(&ListScope::Own(employee_id), status, page)
            .await
    }

    pub async fn get_balance(
        &self,
        actor: &Actor,
        employee_id: u64,
        year: i32,
    ) -> Result<LeaveBalance, LeaveError> {
        let employee = self.directory.get(employee_id).await?;
        guard::can_view(actor, &employee)?;
        self.store
            .get_or_create_balance(employee_id, year, self.policy.annual_entitlement)
            .await
    }

    /// One-shot year-end settlement (ADMIN only). CARRY_FORWARD rolls
    /// the capped remainder into next year; ENCASHMENT records the
    /// capped amount without executing payroll.
    pub async fn process_year_end(
        &self,
        actor: &Actor,
        employee_id: u64,
        year: i32,
        action: YearEndAction,
    ) -> Result<(LeaveBalance, YearEndOutcome), LeaveError> {
        guard::require_admin(actor)?;
        self.directory.get(employee_id).await?;

        let result = self
            .store
            .process_year_end(YearEndRequest {
                employee_id,
                year,
                action,
                entitlement: self.policy.annual_entitlement,
                carry_forward_max: self.policy.carry_forward_max,
                encashment_max: self.policy.encashment_max,
            })
            .await?;

        info!(employee_id, year, action = %action, "Year-end action processed");
        Ok(result)
    }

    fn validate(&self, input: &ApplyLeave, today: NaiveDate) -> Result<(), LeaveError> {
        if input.start_date < today {
            return Err(LeaveError::InvalidRequest(
                "Start date cannot be before today".into(),
            ));
        }
        if input.end_date < input.start_date {
            return Err(LeaveError::InvalidRequest(
                "End date must be after or equal to start date".into(),
            ));
        }
        if input.reason.trim().is_empty() {
            return Err(LeaveError::InvalidRequest("Reason cannot be empty".into()));
        }
        match input.duration {
            LeaveDuration::HalfDay => {
                if input.start_date != input.end_date {
                    return Err(LeaveError::InvalidRequest(
                        "Half-day leave must cover a single day".into(),
                    ));
                }
                if input.half_day_type.is_none() {
                    return Err(LeaveError::InvalidRequest(
                        "Half-day type is required for half-day leave".into(),
                    ));
                }
            }
            LeaveDuration::FullDay => {
                if input.half_day_type.is_some() {
                    return Err(LeaveError::InvalidRequest(
                        "Half-day type is only valid for half-day leave".into(),
                    ));
                }
            }
        }
        Ok(())
    }

    async fn publish(&self, events: Vec<DomainEvent>) {
        // Delivery is fire-and-forget from the workflow's perspective;
        // the notifier absorbs its own failures.
        for event in events {
            self.notifier.publish(event).await;
        }
    }
}
