//! End-to-end workflow tests over the in-memory store: apply through
//! auto-approval, decisions, cancellation and year-end settlement.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Datelike, Duration, Months, NaiveDate, Utc, Weekday};
use rust_decimal::Decimal;

use lms::domain::error::LeaveError;
use lms::domain::events::{DomainEvent, InAppNotifier, Notifier};
use lms::domain::guard::Actor;
use lms::domain::policy::AutoApprovalPolicy;
use lms::domain::workflow::{ApplyLeave, LeavePolicy, LeaveWorkflow};
use lms::model::balance::{YearEndAction, YearEndOutcome};
use lms::model::leave_request::{HalfDayType, LeaveDuration, LeaveRequest, LeaveStatus};
use lms::model::role::Role;
use lms::store::{LeaveStore, NewEmployee, NewLeaveRequest, NewUser, PageRequest, memory::MemStore};

#[derive(Default)]
struct RecordingNotifier {
    events: Mutex<Vec<DomainEvent>>,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn publish(&self, event: DomainEvent) {
        self.events.lock().unwrap().push(event);
    }
}

struct TestEnv {
    store: Arc<MemStore>,
    events: Arc<RecordingNotifier>,
    workflow: LeaveWorkflow,
}

fn env_with_policy(policy: LeavePolicy) -> TestEnv {
    let store = Arc::new(MemStore::new());
    let events = Arc::new(RecordingNotifier::default());
    let workflow = LeaveWorkflow::new(store.clone(), events.clone(), policy);
    TestEnv {
        store,
        events,
        workflow,
    }
}

fn env() -> TestEnv {
    env_with_policy(LeavePolicy::default())
}

async fn add_employee(store: &MemStore, name: &str, department: &str) -> u64 {
    store
        .create_employee(NewEmployee {
            name: name.into(),
            email: format!("{}@corp.test", name),
            department: Some(department.into()),
        })
        .await
        .unwrap()
        .id
}

fn employee_actor(employee_id: u64, department: &str) -> Actor {
    Actor {
        user_id: 100 + employee_id,
        username: format!("emp{}", employee_id),
        role: Role::Employee,
        employee_id: Some(employee_id),
        department: Some(department.into()),
    }
}

fn manager_actor(department: &str) -> Actor {
    Actor {
        user_id: 2,
        username: "manager".into(),
        role: Role::Manager,
        employee_id: None,
        department: Some(department.into()),
    }
}

fn admin_actor() -> Actor {
    Actor {
        user_id: 1,
        username: "admin".into(),
        role: Role::Admin,
        employee_id: None,
        department: None,
    }
}

/// First Monday at least a week from now, so every applied leave starts
/// in the future and Mon..Fri are plain working days.
fn next_monday() -> NaiveDate {
    let mut date = Utc::now().date_naive() + Duration::days(7);
    while date.weekday() != Weekday::Mon {
        date = date.succ_opt().unwrap();
    }
    date
}

async fn apply_full_day(
    workflow: &LeaveWorkflow,
    actor: &Actor,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<LeaveRequest, LeaveError> {
    workflow
        .apply(
            actor,
            ApplyLeave {
                start_date: start,
                end_date: end,
                reason: "trip".into(),
                duration: LeaveDuration::FullDay,
                half_day_type: None,
            },
        )
        .await
}

#[actix_web::test]
async fn short_leave_is_auto_approved_and_deducted() {
    let env = env();
    let emp = add_employee(&env.store, "alice", "Sales").await;
    let actor = employee_actor(emp, "Sales");

    let monday = next_monday();
    let leave = apply_full_day(&env.workflow, &actor, monday, monday.succ_opt().unwrap())
        .await
        .unwrap();

    assert_eq!(leave.status, LeaveStatus::Approved);
    assert!(leave.auto_approved);
    assert!(leave.processed_at.is_some());
    assert_eq!(leave.working_days, Decimal::from(2));

    let balance = env
        .workflow
        .get_balance(&actor, emp, monday.year())
        .await
        .unwrap();
    assert_eq!(balance.remaining_leaves, Decimal::from(22));
    assert_eq!(balance.used_leaves, Decimal::from(2));

    // auto-approved requests raise no manager notifications
    let events = env.events.events.lock().unwrap();
    assert!(matches!(events[0], DomainEvent::LeaveApplied(_)));
    assert!(
        !events
            .iter()
            .any(|e| matches!(e, DomainEvent::ManagerNotify { .. }))
    );
}

#[actix_web::test]
async fn auto_approval_cap_is_anchored_to_the_start_month() {
    let env = env();
    let emp = add_employee(&env.store, "bob", "Sales").await;

    let today = Utc::now().date_naive();
    // two auto-approved requests created now, starting earlier this month
    for day in [1, 3] {
        let date = today.with_day(day).unwrap();
        env.store
            .apply_leave(NewLeaveRequest {
                employee_id: emp,
                start_date: date,
                end_date: date,
                total_days: Decimal::ONE,
                working_days: Decimal::ONE,
                reason: "errand".into(),
                duration: LeaveDuration::FullDay,
                half_day_type: None,
                status: LeaveStatus::Approved,
                auto_approved: true,
                processed_at: Some(Utc::now()),
                auto_approval_cap: None,
                entitlement: Decimal::from(24),
            })
            .await
            .unwrap();
    }

    let policy = AutoApprovalPolicy {
        threshold: Decimal::from(2),
        monthly_cap: 2,
    };

    // a third short leave starting this month is over the cap
    let gate = policy
        .should_auto_approve(
            env.store.as_ref(),
            emp,
            Decimal::ONE,
            today.with_day(20).unwrap(),
        )
        .await
        .unwrap();
    assert!(!gate);

    // a start in the next month looks at an empty window
    let next_month = today.with_day(15).unwrap() + Months::new(1);
    let gate = policy
        .should_auto_approve(env.store.as_ref(), emp, Decimal::ONE, next_month)
        .await
        .unwrap();
    assert!(gate);

    // the store repeats the count inside apply and downgrades an
    // over-cap candidate approval
    let over_cap = |start: NaiveDate| NewLeaveRequest {
        employee_id: emp,
        start_date: start,
        end_date: start,
        total_days: Decimal::ONE,
        working_days: Decimal::ONE,
        reason: "errand".into(),
        duration: LeaveDuration::FullDay,
        half_day_type: None,
        status: LeaveStatus::Approved,
        auto_approved: true,
        processed_at: Some(Utc::now()),
        auto_approval_cap: Some(2),
        entitlement: Decimal::from(24),
    };

    let third = env
        .store
        .apply_leave(over_cap(today.with_day(20).unwrap()))
        .await
        .unwrap();
    assert_eq!(third.status, LeaveStatus::Pending);
    assert!(!third.auto_approved);
    assert!(third.processed_at.is_none());

    // the next-month window is empty, so the candidate approval stands
    let fourth = env.store.apply_leave(over_cap(next_month)).await.unwrap();
    assert_eq!(fourth.status, LeaveStatus::Approved);
    assert!(fourth.auto_approved);
}

#[actix_web::test]
async fn long_leave_needs_a_human_decision() {
    let env = env();
    let emp = add_employee(&env.store, "carol", "Sales").await;
    let actor = employee_actor(emp, "Sales");

    let monday = next_monday();
    let leave = apply_full_day(&env.workflow, &actor, monday, monday + Duration::days(4))
        .await
        .unwrap();

    assert_eq!(leave.status, LeaveStatus::Pending);
    assert_eq!(leave.working_days, Decimal::from(5));
    assert!(!leave.auto_approved);
}

#[actix_web::test]
async fn half_day_costs_half_a_working_day() {
    let env = env();
    let emp = add_employee(&env.store, "dora", "Sales").await;
    let actor = employee_actor(emp, "Sales");

    let monday = next_monday();
    let leave = env
        .workflow
        .apply(
            &actor,
            ApplyLeave {
                start_date: monday,
                end_date: monday,
                reason: "appointment".into(),
                duration: LeaveDuration::HalfDay,
                half_day_type: Some(HalfDayType::FirstHalf),
            },
        )
        .await
        .unwrap();

    assert_eq!(leave.working_days, Decimal::new(5, 1));
    assert_eq!(leave.total_days, Decimal::new(5, 1));

    let balance = env
        .workflow
        .get_balance(&actor, emp, monday.year())
        .await
        .unwrap();
    assert_eq!(balance.remaining_leaves, Decimal::new(235, 1));
}

#[actix_web::test]
async fn insufficient_balance_persists_nothing() {
    let env = env_with_policy(LeavePolicy {
        annual_entitlement: Decimal::from(3),
        ..LeavePolicy::default()
    });
    let emp = add_employee(&env.store, "erin", "Sales").await;
    let actor = employee_actor(emp, "Sales");

    let monday = next_monday();
    let err = apply_full_day(&env.workflow, &actor, monday, monday + Duration::days(4))
        .await
        .unwrap_err();
    assert!(matches!(err, LeaveError::InsufficientBalance { .. }));

    let listing = env
        .workflow
        .list_all(&admin_actor(), None, PageRequest::new(None, None))
        .await
        .unwrap();
    assert!(listing.data.is_empty());

    let balance = env
        .workflow
        .get_balance(&actor, emp, monday.year())
        .await
        .unwrap();
    assert_eq!(balance.remaining_leaves, Decimal::from(3));
}

#[actix_web::test]
async fn overlapping_request_is_rejected() {
    let env = env();
    let emp = add_employee(&env.store, "finn", "Sales").await;
    let actor = employee_actor(emp, "Sales");

    let monday = next_monday();
    apply_full_day(&env.workflow, &actor, monday, monday + Duration::days(2))
        .await
        .unwrap();

    // shares Wednesday with the first request
    let err = apply_full_day(
        &env.workflow,
        &actor,
        monday + Duration::days(2),
        monday + Duration::days(3),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, LeaveError::Overlap));

    // a different employee is unaffected
    let other = add_employee(&env.store, "gina", "Sales").await;
    apply_full_day(
        &env.workflow,
        &employee_actor(other, "Sales"),
        monday + Duration::days(2),
        monday + Duration::days(3),
    )
    .await
    .unwrap();
}

#[actix_web::test]
async fn reject_restores_the_deducted_balance() {
    let env = env();
    let emp = add_employee(&env.store, "hana", "Sales").await;
    let actor = employee_actor(emp, "Sales");

    let monday = next_monday();
    let leave = apply_full_day(&env.workflow, &actor, monday, monday + Duration::days(4))
        .await
        .unwrap();
    assert_eq!(leave.status, LeaveStatus::Pending);

    let rejected = env
        .workflow
        .reject(&manager_actor("Sales"), leave.id)
        .await
        .unwrap();
    assert_eq!(rejected.status, LeaveStatus::Rejected);
    assert_eq!(rejected.processed_by, Some(2));

    let balance = env
        .workflow
        .get_balance(&actor, emp, monday.year())
        .await
        .unwrap();
    assert_eq!(balance.remaining_leaves, Decimal::from(24));
}

#[actix_web::test]
async fn approve_keeps_the_deduction_and_is_single_shot() {
    let env = env();
    let emp = add_employee(&env.store, "iris", "Sales").await;
    let actor = employee_actor(emp, "Sales");

    let monday = next_monday();
    let leave = apply_full_day(&env.workflow, &actor, monday, monday + Duration::days(4))
        .await
        .unwrap();

    let approved = env
        .workflow
        .approve(&manager_actor("Sales"), leave.id)
        .await
        .unwrap();
    assert_eq!(approved.status, LeaveStatus::Approved);

    // second decision on the same request fails the status check
    let err = env
        .workflow
        .reject(&manager_actor("Sales"), leave.id)
        .await
        .unwrap_err();
    assert!(matches!(err, LeaveError::InvalidTransition(_)));

    let balance = env
        .workflow
        .get_balance(&actor, emp, monday.year())
        .await
        .unwrap();
    assert_eq!(balance.remaining_leaves, Decimal::from(19));
}

#[actix_web::test]
async fn manager_is_fenced_into_their_department() {
    let env = env();
    let emp = add_employee(&env.store, "jack", "Engineering").await;
    let actor = employee_actor(emp, "Engineering");

    let monday = next_monday();
    let leave = apply_full_day(&env.workflow, &actor, monday, monday + Duration::days(4))
        .await
        .unwrap();

    let err = env
        .workflow
        .approve(&manager_actor("Sales"), leave.id)
        .await
        .unwrap_err();
    assert!(matches!(err, LeaveError::Forbidden(_)));

    // the owning employee cannot approve either
    let err = env.workflow.approve(&actor, leave.id).await.unwrap_err();
    assert!(matches!(err, LeaveError::Forbidden(_)));

    // admin may decide across departments
    env.workflow.approve(&admin_actor(), leave.id).await.unwrap();
}

#[actix_web::test]
async fn cancel_restores_balance_and_is_terminal() {
    let env = env();
    let emp = add_employee(&env.store, "kate", "Sales").await;
    let actor = employee_actor(emp, "Sales");

    let monday = next_monday();
    // auto-approved, but start date is still in the future
    let leave = apply_full_day(&env.workflow, &actor, monday, monday.succ_opt().unwrap())
        .await
        .unwrap();
    assert_eq!(leave.status, LeaveStatus::Approved);

    let cancelled = env.workflow.cancel(&actor, leave.id).await.unwrap();
    assert_eq!(cancelled.status, LeaveStatus::Cancelled);

    let balance = env
        .workflow
        .get_balance(&actor, emp, monday.year())
        .await
        .unwrap();
    assert_eq!(balance.remaining_leaves, Decimal::from(24));

    let err = env.workflow.cancel(&actor, leave.id).await.unwrap_err();
    assert!(matches!(err, LeaveError::InvalidTransition(_)));

    // only the owner may cancel
    let other = add_employee(&env.store, "liam", "Sales").await;
    let leave = apply_full_day(
        &env.workflow,
        &employee_actor(other, "Sales"),
        monday,
        monday,
    )
    .await
    .unwrap();
    let err = env.workflow.cancel(&actor, leave.id).await.unwrap_err();
    assert!(matches!(err, LeaveError::Forbidden(_)));
}

#[actix_web::test]
async fn started_approved_leave_cannot_be_cancelled() {
    let env = env();
    let emp = add_employee(&env.store, "mona", "Sales").await;
    let actor = employee_actor(emp, "Sales");

    let today = Utc::now().date_naive();
    // seeded directly; the workflow would not accept a past start date
    let leave = env
        .store
        .apply_leave(NewLeaveRequest {
            employee_id: emp,
            start_date: today - Duration::days(1),
            end_date: today + Duration::days(1),
            total_days: Decimal::from(3),
            working_days: Decimal::from(3),
            reason: "ongoing".into(),
            duration: LeaveDuration::FullDay,
            half_day_type: None,
            status: LeaveStatus::Approved,
            auto_approved: false,
            processed_at: Some(Utc::now()),
            auto_approval_cap: None,
            entitlement: Decimal::from(24),
        })
        .await
        .unwrap();

    let err = env.workflow.cancel(&actor, leave.id).await.unwrap_err();
    assert!(matches!(err, LeaveError::InvalidTransition(_)));
}

#[actix_web::test]
async fn carry_forward_rolls_capped_remainder_into_next_year() {
    let env = env();
    let emp = add_employee(&env.store, "nina", "Sales").await;
    let actor = employee_actor(emp, "Sales");

    let monday = next_monday();
    let year = monday.year();
    // use 5 working days, leaving 19 remaining
    apply_full_day(&env.workflow, &actor, monday, monday + Duration::days(4))
        .await
        .unwrap();

    let (balance, outcome) = env
        .workflow
        .process_year_end(&admin_actor(), emp, year, YearEndAction::CarryForward)
        .await
        .unwrap();

    assert_eq!(outcome, YearEndOutcome::Carried(Decimal::from(12)));
    assert_eq!(balance.year_end_action, Some(YearEndAction::CarryForward));

    let next = env
        .workflow
        .get_balance(&admin_actor(), emp, year + 1)
        .await
        .unwrap();
    assert_eq!(next.carried_forward, Decimal::from(12));
    assert_eq!(next.total_entitlement, Decimal::from(36));
    assert_eq!(next.remaining_leaves, Decimal::from(36));

    // the settlement is single-shot per year
    let err = env
        .workflow
        .process_year_end(&admin_actor(), emp, year, YearEndAction::Encashment)
        .await
        .unwrap_err();
    assert!(matches!(err, LeaveError::AlreadyProcessed(y) if y == year));
}

#[actix_web::test]
async fn encashment_is_recorded_without_touching_next_year() {
    let env = env();
    let emp = add_employee(&env.store, "omar", "Sales").await;
    let actor = employee_actor(emp, "Sales");

    let monday = next_monday();
    let year = monday.year();
    apply_full_day(&env.workflow, &actor, monday, monday.succ_opt().unwrap())
        .await
        .unwrap();

    let (_, outcome) = env
        .workflow
        .process_year_end(&admin_actor(), emp, year, YearEndAction::Encashment)
        .await
        .unwrap();
    // remaining 22, capped at 10
    assert_eq!(outcome, YearEndOutcome::Encashed(Decimal::from(10)));

    let next = env
        .workflow
        .get_balance(&admin_actor(), emp, year + 1)
        .await
        .unwrap();
    assert_eq!(next.carried_forward, Decimal::ZERO);
    assert_eq!(next.total_entitlement, Decimal::from(24));
}

#[actix_web::test]
async fn year_end_is_admin_only_and_needs_an_existing_ledger() {
    let env = env();
    let emp = add_employee(&env.store, "pia", "Sales").await;

    let err = env
        .workflow
        .process_year_end(
            &manager_actor("Sales"),
            emp,
            2026,
            YearEndAction::CarryForward,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, LeaveError::Forbidden(_)));

    // no ledger entry exists yet for this employee/year
    let err = env
        .workflow
        .process_year_end(&admin_actor(), emp, 2026, YearEndAction::CarryForward)
        .await
        .unwrap_err();
    assert!(matches!(err, LeaveError::NotFound(_)));
}

#[actix_web::test]
async fn listing_is_scoped_by_role() {
    let env = env();
    let sales = add_employee(&env.store, "quinn", "Sales").await;
    let engineering = add_employee(&env.store, "rhea", "Engineering").await;

    let monday = next_monday();
    apply_full_day(&env.workflow, &employee_actor(sales, "Sales"), monday, monday)
        .await
        .unwrap();
    apply_full_day(
        &env.workflow,
        &employee_actor(engineering, "Engineering"),
        monday,
        monday,
    )
    .await
    .unwrap();

    let all = env
        .workflow
        .list_all(&admin_actor(), None, PageRequest::new(None, None))
        .await
        .unwrap();
    assert_eq!(all.total, 2);

    let sales_only = env
        .workflow
        .list_all(&manager_actor("Sales"), None, PageRequest::new(None, None))
        .await
        .unwrap();
    assert_eq!(sales_only.total, 1);
    assert_eq!(sales_only.data[0].employee_id, sales);

    let own = env
        .workflow
        .list_all(
            &employee_actor(engineering, "Engineering"),
            None,
            PageRequest::new(None, None),
        )
        .await
        .unwrap();
    assert_eq!(own.total, 1);
    assert_eq!(own.data[0].employee_id, engineering);
}

#[actix_web::test]
async fn pending_leave_notifies_department_managers_in_app() {
    let store = Arc::new(MemStore::new());
    let notifier = Arc::new(InAppNotifier::new(store.clone()));
    let workflow = LeaveWorkflow::new(store.clone(), notifier, LeavePolicy::default());

    let emp = add_employee(&store, "sara", "Sales").await;
    let emp_user = store
        .create_user(NewUser {
            username: "sara".into(),
            password_hash: "x".into(),
            role_id: 3,
            employee_id: Some(emp),
            is_approved: true,
        })
        .await
        .unwrap();

    let mgr = add_employee(&store, "tess", "Sales").await;
    let mgr_user = store
        .create_user(NewUser {
            username: "tess".into(),
            password_hash: "x".into(),
            role_id: 2,
            employee_id: Some(mgr),
            is_approved: true,
        })
        .await
        .unwrap();

    let actor = employee_actor(emp, "Sales");
    let monday = next_monday();
    let leave = apply_full_day(&workflow, &actor, monday, monday + Duration::days(4))
        .await
        .unwrap();
    assert_eq!(leave.status, LeaveStatus::Pending);

    let inbox = store
        .notifications_for_user(mgr_user, PageRequest::new(None, None))
        .await
        .unwrap();
    assert_eq!(inbox.total, 1);
    assert!(inbox.data[0].message.contains("sara"));
    assert!(!inbox.data[0].is_read);

    // the decision notifies the employee
    workflow
        .approve(
            &Actor {
                user_id: mgr_user,
                username: "tess".into(),
                role: Role::Manager,
                employee_id: Some(mgr),
                department: Some("Sales".into()),
            },
            leave.id,
        )
        .await
        .unwrap();

    let inbox = store
        .notifications_for_user(emp_user, PageRequest::new(None, None))
        .await
        .unwrap();
    assert_eq!(inbox.total, 1);
    assert!(inbox.data[0].message.contains("approved"));

    store
        .mark_notification_read(inbox.data[0].id, emp_user)
        .await
        .unwrap();
    let inbox = store
        .notifications_for_user(emp_user, PageRequest::new(None, None))
        .await
        .unwrap();
    assert!(inbox.data[0].is_read);
}
