use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, openapi};

use crate::api::balance::YearEndReq;
use crate::api::employee::{CreateEmployee, EmployeeListResponse};
use crate::api::holiday::CreateHoliday;
use crate::api::leave::{ApplyLeaveReq, LeaveFilter, LeaveListResponse, LeaveResponse};
use crate::api::notification::NotificationListResponse;
use crate::model::balance::{LeaveBalance, YearEndAction, YearEndOutcome};
use crate::model::employee::Employee;
use crate::model::holiday::Holiday;
use crate::model::leave_request::{HalfDayType, LeaveDuration, LeaveRequest, LeaveStatus};
use crate::model::notification::Notification;
use crate::models::{LoginReqDto, RegisterReq, TokenPair};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Leave Management API",
        version = "1.0.0",
        description = r#"
## Leave Management System

This API drives the full leave request lifecycle for an organization.

### 🔹 Key Features
- **Leave Requests**
  - Apply (full-day or half-day), approve, reject, and cancel
  - Working-day calculation that skips weekends and company holidays
  - Auto-approval for short leaves, capped per employee per month
- **Balance Ledger**
  - Per-year entitlement tracking with deduction on apply and
    restoration on reject/cancel
  - Year-end carry-forward or encashment, one action per year
- **Holiday Calendar**
  - Admin-managed company holidays feeding the working-day rules
- **Notifications**
  - In-app notifications for managers and employees

### 🔐 Security
Endpoints are protected with **JWT Bearer authentication**. Managers act
only inside their own department; admins act anywhere.

### 📦 Response Format
- JSON-based RESTful responses
- Pagination supported for list endpoints

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::auth::handlers::register,
        crate::auth::handlers::login,
        crate::auth::handlers::refresh_token,
        crate::auth::handlers::approve_user,
        crate::auth::handlers::revoke_user,

        crate::api::leave::leave_list,
        crate::api::leave::employee_leave_list,
        crate::api::leave::get_leave,
        crate::api::leave::apply_leave,
        crate::api::leave::approve_leave,
        crate::api::leave::reject_leave,
        crate::api::leave::cancel_leave,

        crate::api::balance::get_balance,
        crate::api::balance::process_year_end,

        crate::api::holiday::create_holiday,
        crate::api::holiday::list_holidays,
        crate::api::holiday::delete_holiday,

        crate::api::employee::create_employee,
        crate::api::employee::get_employee,
        crate::api::employee::list_employees,

        crate::api::notification::list_notifications,
        crate::api::notification::mark_read
    ),
    components(
        schemas(
            RegisterReq,
            LoginReqDto,
            TokenPair,
            ApplyLeaveReq,
            LeaveFilter,
            LeaveResponse,
            LeaveListResponse,
            LeaveRequest,
            LeaveStatus,
            LeaveDuration,
            HalfDayType,
            LeaveBalance,
            YearEndAction,
            YearEndOutcome,
            YearEndReq,
            CreateHoliday,
            Holiday,
            CreateEmployee,
            Employee,
            EmployeeListResponse,
            Notification,
            NotificationListResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Registration and token APIs"),
        (name = "Leave", description = "Leave request lifecycle APIs"),
        (name = "Balance", description = "Balance ledger and year-end APIs"),
        (name = "Holiday", description = "Holiday calendar APIs"),
        (name = "Employee", description = "Employee profile APIs"),
        (name = "Notification", description = "In-app notification APIs"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}
