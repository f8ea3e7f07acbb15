//! Working-day arithmetic over calendar dates, a Saturday/Sunday weekend
//! rule and a holiday set. Pure; callers fetch the holiday set once per
//! calculation.

use std::collections::HashSet;

use chrono::{Datelike, NaiveDate, Weekday};
use once_cell::sync::Lazy;
use rust_decimal::Decimal;

use crate::domain::error::LeaveError;
use crate::model::leave_request::LeaveDuration;

pub static HALF_DAY: Lazy<Decimal> = Lazy::new(|| Decimal::new(5, 1));

pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

pub fn is_working_day(date: NaiveDate, holidays: &HashSet<NaiveDate>) -> bool {
    !is_weekend(date) && !holidays.contains(&date)
}

/// Working days covered by a leave request.
///
/// Half-day: 0.5, but only on a working day (start == end is the
/// caller's precondition). Full-day: every date in [start, end] that is
/// neither weekend nor holiday; zero working days rejects the request.
pub fn working_days(
    start: NaiveDate,
    end: NaiveDate,
    duration: LeaveDuration,
    holidays: &HashSet<NaiveDate>,
) -> Result<Decimal, LeaveError> {
    if duration == LeaveDuration::HalfDay {
        if is_weekend(start) {
            return Err(LeaveError::InvalidRequest(
                "Half-day leave cannot be on weekend".into(),
            ));
        }
        if holidays.contains(&start) {
            return Err(LeaveError::InvalidRequest(
                "Half-day leave cannot be on a festival holiday".into(),
            ));
        }
        return Ok(*HALF_DAY);
    }

    let mut days = Decimal::ZERO;
    let mut current = start;
    while current <= end {
        if is_working_day(current, holidays) {
            days += Decimal::ONE;
        }
        current = match current.succ_opt() {
            Some(next) => next,
            None => break,
        };
    }

    if days.is_zero() {
        return Err(LeaveError::InvalidRequest(
            "Leave request has no working days. All days are weekends or holidays.".into(),
        ));
    }

    Ok(days)
}

/// Inclusive calendar-day count, regardless of weekends and holidays.
pub fn total_days(start: NaiveDate, end: NaiveDate, duration: LeaveDuration) -> Decimal {
    if duration == LeaveDuration::HalfDay {
        return *HALF_DAY;
    }
    Decimal::from(end.signed_duration_since(start).num_days() + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn saturday_and_sunday_are_weekend() {
        assert!(is_weekend(date(2025, 6, 7)));
        assert!(is_weekend(date(2025, 6, 8)));
        assert!(!is_weekend(date(2025, 6, 9)));
    }

    #[test]
    fn working_days_equal_total_days_without_weekends_or_holidays() {
        // Mon 2025-06-02 to Tue 2025-06-03
        let start = date(2025, 6, 2);
        let end = date(2025, 6, 3);
        let holidays = HashSet::new();
        let working = working_days(start, end, LeaveDuration::FullDay, &holidays).unwrap();
        assert_eq!(working, Decimal::from(2));
        assert_eq!(total_days(start, end, LeaveDuration::FullDay), working);
    }

    #[test]
    fn weekends_and_holidays_are_excluded() {
        // Fri 2025-06-06 to Tue 2025-06-10, Monday is a holiday
        let start = date(2025, 6, 6);
        let end = date(2025, 6, 10);
        let holidays: HashSet<_> = [date(2025, 6, 9)].into_iter().collect();
        let working = working_days(start, end, LeaveDuration::FullDay, &holidays).unwrap();
        assert_eq!(working, Decimal::from(2)); // Fri + Tue
        assert_eq!(total_days(start, end, LeaveDuration::FullDay), Decimal::from(5));
    }

    #[test]
    fn all_non_working_range_is_rejected() {
        // Sat to Sun
        let err = working_days(
            date(2025, 6, 7),
            date(2025, 6, 8),
            LeaveDuration::FullDay,
            &HashSet::new(),
        )
        .unwrap_err();
        assert!(matches!(err, LeaveError::InvalidRequest(_)));
    }

    #[test]
    fn half_day_is_half_regardless_of_range() {
        let day = date(2025, 6, 2);
        let working = working_days(day, day, LeaveDuration::HalfDay, &HashSet::new()).unwrap();
        assert_eq!(working, Decimal::new(5, 1));
        assert_eq!(total_days(day, day, LeaveDuration::HalfDay), Decimal::new(5, 1));
    }

    #[test]
    fn half_day_on_weekend_or_holiday_is_rejected() {
        let saturday = date(2025, 6, 7);
        assert!(working_days(saturday, saturday, LeaveDuration::HalfDay, &HashSet::new()).is_err());

        let monday = date(2025, 6, 9);
        let holidays: HashSet<_> = [monday].into_iter().collect();
        assert!(working_days(monday, monday, LeaveDuration::HalfDay, &holidays).is_err());
    }
}
