use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use tracing::warn;
use utoipa::ToSchema;

use crate::domain::error::LeaveError;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum YearEndAction {
    CarryForward,
    Encashment,
}

/// What a processed year-end action settled on. Encashment is recorded
/// only; payroll settlement happens elsewhere.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum YearEndOutcome {
    #[schema(value_type = f64)]
    Carried(Decimal),
    #[schema(value_type = f64)]
    Encashed(Decimal),
}

/// Per-(employee, year) balance ledger entry. `remaining_leaves` is
/// maintained alongside `used_leaves` rather than derived, so historical
/// edits stay auditable.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LeaveBalance {
    pub id: u64,
    pub employee_id: u64,
    pub year: i32,
    #[schema(example = 24.0, value_type = f64)]
    pub total_entitlement: Decimal,
    #[schema(example = 3.0, value_type = f64)]
    pub used_leaves: Decimal,
    #[schema(example = 21.0, value_type = f64)]
    pub remaining_leaves: Decimal,
    #[schema(example = 0.0, value_type = f64)]
    pub carried_forward: Decimal,
    pub year_end_action: Option<YearEndAction>,
    #[schema(format = "date-time", value_type = Option<String>)]
    pub year_end_action_at: Option<DateTime<Utc>>,
}

impl LeaveBalance {
    pub fn new(employee_id: u64, year: i32, entitlement: Decimal) -> Self {
        Self {
            id: 0,
            employee_id,
            year,
            total_entitlement: entitlement,
            used_leaves: Decimal::ZERO,
            remaining_leaves: entitlement,
            carried_forward: Decimal::ZERO,
            year_end_action: None,
            year_end_action_at: None,
        }
    }

    pub fn deduct(&mut self, days: Decimal) -> Result<(), LeaveError> {
        if self.remaining_leaves < days {
            return Err(LeaveError::InsufficientBalance {
                available: self.remaining_leaves,
                required: days,
            });
        }
        self.used_leaves += days;
        self.remaining_leaves -= days;
        Ok(())
    }

    /// Reverses a deduction. An out-of-sequence restore is clamped so
    /// `used_leaves` never goes negative.
    pub fn restore(&mut self, days: Decimal) {
        let restorable = days.min(self.used_leaves);
        if restorable < days {
            warn!(
                employee_id = self.employee_id,
                year = self.year,
                requested = %days,
                restorable = %restorable,
                "Restore exceeds used leaves, clamping"
            );
        }
        self.used_leaves -= restorable;
        self.remaining_leaves += restorable;
    }

    pub fn can_process_year_end(&self) -> bool {
        self.year_end_action.is_none()
    }

    /// Marks this year's entry with its one-time year-end action and
    /// returns what was carried or encashed. A second call fails.
    pub fn apply_year_end(
        &mut self,
        action: YearEndAction,
        carry_forward_max: Decimal,
        encashment_max: Decimal,
        now: DateTime<Utc>,
    ) -> Result<YearEndOutcome, LeaveError> {
        if !self.can_process_year_end() {
            return Err(LeaveError::AlreadyProcessed(self.year));
        }

        let outcome = match action {
            YearEndAction::CarryForward => {
                YearEndOutcome::Carried(self.remaining_leaves.min(carry_forward_max))
            }
            YearEndAction::Encashment => {
                YearEndOutcome::Encashed(self.remaining_leaves.min(encashment_max))
            }
        };

        self.year_end_action = Some(action);
        self.year_end_action_at = Some(now);
        Ok(outcome)
    }

    /// Applies a carried-forward amount onto the following year's entry.
    pub fn receive_carry(&mut self, carried: Decimal, base_entitlement: Decimal) {
        self.carried_forward = carried;
        self.total_entitlement = base_entitlement + carried;
        self.remaining_leaves = self.total_entitlement - self.used_leaves;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(n: i64, scale: u32) -> Decimal {
        Decimal::new(n, scale)
    }

    #[test]
    fn deduct_then_restore_is_idempotent_on_remaining() {
        let mut balance = LeaveBalance::new(1, 2026, Decimal::from(24));
        balance.deduct(dec(25, 1)).unwrap();
        assert_eq!(balance.used_leaves, dec(25, 1));
        assert_eq!(balance.remaining_leaves, dec(215, 1));
        balance.restore(dec(25, 1));
        assert_eq!(balance.used_leaves, Decimal::ZERO);
        assert_eq!(balance.remaining_leaves, Decimal::from(24));
    }

    #[test]
    fn deduct_beyond_remaining_fails() {
        let mut balance = LeaveBalance::new(1, 2026, Decimal::ONE);
        let err = balance.deduct(Decimal::from(2)).unwrap_err();
        assert!(matches!(err, LeaveError::InsufficientBalance { .. }));
        assert_eq!(balance.remaining_leaves, Decimal::ONE);
    }

    #[test]
    fn restore_clamps_at_zero_used() {
        let mut balance = LeaveBalance::new(1, 2026, Decimal::from(24));
        balance.deduct(Decimal::ONE).unwrap();
        balance.restore(Decimal::from(3));
        assert_eq!(balance.used_leaves, Decimal::ZERO);
        assert_eq!(balance.remaining_leaves, Decimal::from(24));
    }

    #[test]
    fn carry_forward_is_capped() {
        let mut balance = LeaveBalance::new(1, 2026, Decimal::from(24));
        balance.deduct(Decimal::from(4)).unwrap();
        let outcome = balance
            .apply_year_end(
                YearEndAction::CarryForward,
                Decimal::from(12),
                Decimal::from(10),
                Utc::now(),
            )
            .unwrap();
        assert_eq!(outcome, YearEndOutcome::Carried(Decimal::from(12)));
        assert_eq!(balance.year_end_action, Some(YearEndAction::CarryForward));
    }

    #[test]
    fn encashment_takes_remaining_when_under_cap() {
        let mut balance = LeaveBalance::new(1, 2026, Decimal::from(24));
        balance.deduct(Decimal::from(18)).unwrap();
        let outcome = balance
            .apply_year_end(
                YearEndAction::Encashment,
                Decimal::from(12),
                Decimal::from(10),
                Utc::now(),
            )
            .unwrap();
        assert_eq!(outcome, YearEndOutcome::Encashed(Decimal::from(6)));
    }

    #[test]
    fn year_end_is_single_shot() {
        let mut balance = LeaveBalance::new(1, 2026, Decimal::from(24));
        balance
            .apply_year_end(
                YearEndAction::Encashment,
                Decimal::from(12),
                Decimal::from(10),
                Utc::now(),
            )
            .unwrap();
        let err = balance
            .apply_year_end(
                YearEndAction::CarryForward,
                Decimal::from(12),
                Decimal::from(10),
                Utc::now(),
            )
            .unwrap_err();
        assert!(matches!(err, LeaveError::AlreadyProcessed(2026)));
    }

    #[test]
    fn receive_carry_tops_up_next_year() {
        let mut next = LeaveBalance::new(1, 2027, Decimal::from(24));
        next.deduct(Decimal::from(2)).unwrap();
        next.receive_carry(Decimal::from(12), Decimal::from(24));
        assert_eq!(next.total_entitlement, Decimal::from(36));
        assert_eq!(next.remaining_leaves, Decimal::from(34));
        assert_eq!(next.carried_forward, Decimal::from(12));
    }
}
