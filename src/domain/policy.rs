use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;

use crate::domain::error::LeaveError;
use crate::store::LeaveStore;

/// Auto-approval gate: short leaves go straight to APPROVED until the
/// employee exhausts their monthly allowance of system approvals.
#[derive(Debug, Clone)]
pub struct AutoApprovalPolicy {
    /// Working-day ceiling for an auto-approvable request
    pub threshold: Decimal,
    /// Auto-approvals allowed per employee per calendar month
    pub monthly_cap: i64,
}

impl AutoApprovalPolicy {
    pub fn decide(&self, working_days: Decimal, prior_auto_approved: i64) -> bool {
        if working_days > self.threshold {
            return false;
        }
        prior_auto_approved < self.monthly_cap
    }

    /// Counts prior auto-approved requests created in the calendar
    /// month of `start_date`. Requests carry an explicit
    /// `auto_approved` flag, so the count never misclassifies a fast
    /// human approval.
    pub async fn should_auto_approve(
        &self,
        store: &dyn LeaveStore,
        employee_id: u64,
        working_days: Decimal,
        start_date: NaiveDate,
    ) -> Result<bool, LeaveError> {
        if working_days > self.threshold {
            return Ok(false);
        }

        let prior = store
            .count_auto_approved_in_month(employee_id, start_date.year(), start_date.month())
            .await?;

        Ok(self.decide(working_days, prior))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> AutoApprovalPolicy {
        AutoApprovalPolicy {
            threshold: Decimal::from(2),
            monthly_cap: 2,
        }
    }

    #[test]
    fn long_leaves_are_never_auto_approved() {
        assert!(!policy().decide(Decimal::new(25, 1), 0));
    }

    #[test]
    fn short_leaves_pass_until_the_monthly_cap() {
        let p = policy();
        assert!(p.decide(Decimal::from(2), 0));
        assert!(p.decide(Decimal::new(5, 1), 1));
        assert!(!p.decide(Decimal::ONE, 2));
    }
}
