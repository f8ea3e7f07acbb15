//! Outbound domain events. The workflow queues events while it runs and
//! publishes them only after the store mutation has committed, so a
//! failed delivery can never be confused with a failed domain mutation.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::model::leave_request::LeaveRequest;
use crate::store::LeaveStore;

#[derive(Debug, Clone)]
pub enum DomainEvent {
    LeaveApplied(LeaveRequest),
    LeaveApproved(LeaveRequest),
    LeaveRejected(LeaveRequest),
    LeaveCancelled(LeaveRequest),
    /// In-app notification for a manager, addressed by user id
    ManagerNotify { manager_id: u64, text: String },
    /// In-app notification for an employee, addressed by employee id
    EmployeeNotify { employee_id: u64, text: String },
}

/// Consumer of outbound events. Implementations must not propagate
/// delivery failures back into the workflow.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn publish(&self, event: DomainEvent);
}

/// Default notifier: logs the lifecycle events (where the upstream
/// system sent email) and persists the in-app notification rows.
pub struct InAppNotifier {
    store: Arc<dyn LeaveStore>,
}

impl InAppNotifier {
    pub fn new(store: Arc<dyn LeaveStore>) -> Self {
        Self { store }
    }

    async fn notify_user(&self, user_id: u64, text: String) {
        if let Err(e) = self.store.insert_notification(user_id, text).await {
            warn!(error = %e, user_id, "Failed to persist notification");
        }
    }
}

#[async_trait]
impl Notifier for InAppNotifier {
    async fn publish(&self, event: DomainEvent) {
        match event {
            DomainEvent::LeaveApplied(leave) => {
                info!(
                    leave_id = leave.id,
                    employee_id = leave.employee_id,
                    status = %leave.status,
                    "Leave applied"
                );
            }
            DomainEvent::LeaveApproved(leave) => {
                info!(leave_id = leave.id, employee_id = leave.employee_id, "Leave approved");
            }
            DomainEvent::LeaveRejected(leave) => {
                info!(leave_id = leave.id, employee_id = leave.employee_id, "Leave rejected");
            }
            DomainEvent::LeaveCancelled(leave) => {
                info!(leave_id = leave.id, employee_id = leave.employee_id, "Leave cancelled");
            }
            DomainEvent::ManagerNotify { manager_id, text } => {
                self.notify_user(manager_id, text).await;
            }
            DomainEvent::EmployeeNotify { employee_id, text } => {
                match self.store.user_id_of_employee(employee_id).await {
                    Ok(Some(user_id)) => self.notify_user(user_id, text).await,
                    Ok(None) => {
                        warn!(employee_id, "No user linked to employee, dropping notification")
                    }
                    Err(e) => warn!(error = %e, employee_id, "Failed to resolve employee user"),
                }
            }
        }
    }
}
