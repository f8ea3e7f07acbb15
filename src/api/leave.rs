use actix_web::{HttpResponse, Responder, web};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::error::LeaveError;
use crate::domain::guard::Actor;
use crate::domain::workflow::{ApplyLeave, LeaveWorkflow};
use crate::model::leave_request::{HalfDayType, LeaveDuration, LeaveRequest, LeaveStatus};
use crate::store::{PageRequest, PageResult};

#[derive(Deserialize, ToSchema)]
pub struct ApplyLeaveReq {
    #[schema(example = "2026-06-02", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-06-03", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    #[schema(example = "Family trip")]
    pub reason: String,
    #[schema(example = "FULL_DAY")]
    pub duration: LeaveDuration,
    /// Required iff duration is HALF_DAY
    #[schema(example = json!(null))]
    pub half_day_type: Option<HalfDayType>,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct LeaveFilter {
    /// Filter by leave status
    #[schema(example = "PENDING")]
    pub status: Option<String>,
    /// Pagination page number (start with 1)
    #[schema(example = 1)]
    pub page: Option<u64>, // 1-based
    /// Pagination per page number
    #[schema(example = 10)]
    pub per_page: Option<u64>, // items per page
}

impl LeaveFilter {
    fn status(&self) -> Result<Option<LeaveStatus>, LeaveError> {
        self.status
            .as_deref()
            .map(|s| {
                s.parse().map_err(|_| {
                    LeaveError::InvalidRequest(format!(
                        "Invalid status: {}. Allowed: PENDING, APPROVED, REJECTED, CANCELLED",
                        s
                    ))
                })
            })
            .transpose()
    }

    fn page(&self) -> PageRequest {
        PageRequest::new(self.page, self.per_page)
    }
}

#[derive(Serialize, ToSchema)]
pub struct LeaveResponse {
    #[serde(flatten)]
    pub leave: LeaveRequest,
    /// Whether the owner could still cancel this request right now
    #[schema(example = true)]
    pub can_cancel: bool,
}

impl From<LeaveRequest> for LeaveResponse {
    fn from(leave: LeaveRequest) -> Self {
        let can_cancel = leave.can_cancel(Utc::now().date_naive());
        Self { leave, can_cancel }
    }
}

#[derive(Serialize, ToSchema)]
pub struct LeaveListResponse {
    pub data: Vec<LeaveResponse>,
    #[schema(example = 1)]
    pub page: u64,
    #[schema(example = 10)]
    pub per_page: u64,
    #[schema(example = 1)]
    pub total: i64,
}

impl From<PageResult<LeaveRequest>> for LeaveListResponse {
    fn from(result: PageResult<LeaveRequest>) -> Self {
        Self {
            data: result.data.into_iter().map(LeaveResponse::from).collect(),
            page: result.page,
            per_page: result.per_page,
            total: result.total,
        }
    }
}

/* =========================
Apply for leave
========================= */
#[utoipa::path(
    post,
    path = "/api/v1/leave",
    request_body(
        content = ApplyLeaveReq,
        description = "Leave application payload",
        content_type = "application/json"
    ),
    responses(
        (status = 201, description = "Leave request submitted; status is APPROVED when auto-approval applied", body = LeaveResponse),
        (status = 400, description = "Validation failed or insufficient balance"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "No employee profile"),
        (status = 409, description = "Overlapping leave request exists")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn apply_leave(
    actor: Actor,
    workflow: web::Data<LeaveWorkflow>,
    payload: web::Json<ApplyLeaveReq>,
) -> Result<impl Responder, LeaveError> {
    let payload = payload.into_inner();
    let leave = workflow
        .apply(
            &actor,
            ApplyLeave {
                start_date: payload.start_date,
                end_date: payload.end_date,
                reason: payload.reason,
                duration: payload.duration,
                half_day_type: payload.half_day_type,
            },
        )
        .await?;

    Ok(HttpResponse::Created().json(LeaveResponse::from(leave)))
}

/* =========================
Approve leave (Admin/Manager)
========================= */
#[utoipa::path(
    put,
    path = "/api/v1/leave/{leave_id}/approve",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to approve")
    ),
    responses(
        (status = 200, description = "Leave approved", body = LeaveResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Actor may not decide this leave"),
        (status = 404, description = "Leave request not found"),
        (status = 409, description = "Leave is not PENDING")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn approve_leave(
    actor: Actor,
    workflow: web::Data<LeaveWorkflow>,
    path: web::Path<u64>,
) -> Result<impl Responder, LeaveError> {
    let leave = workflow.approve(&actor, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(LeaveResponse::from(leave)))
}

/* =========================
Reject leave (Admin/Manager)
========================= */
#[utoipa::path(
    put,
    path = "/api/v1/leave/{leave_id}/reject",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to reject")
    ),
    responses(
        (status = 200, description = "Leave rejected and balance restored", body = LeaveResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Actor may not decide this leave"),
        (status = 404, description = "Leave request not found"),
        (status = 409, description = "Leave is not PENDING")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn reject_leave(
    actor: Actor,
    workflow: web::Data<LeaveWorkflow>,
    path: web::Path<u64>,
) -> Result<impl Responder, LeaveError> {
    let leave = workflow.reject(&actor, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(LeaveResponse::from(leave)))
}

/* =========================
Cancel own leave
========================= */
#[utoipa::path(
    put,
    path = "/api/v1/leave/{leave_id}/cancel",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to cancel")
    ),
    responses(
        (status = 200, description = "Leave cancelled and balance restored", body = LeaveResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the owner of this leave"),
        (status = 404, description = "Leave request not found"),
        (status = 409, description = "Leave can no longer be cancelled")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn cancel_leave(
    actor: Actor,
    workflow: web::Data<LeaveWorkflow>,
    path: web::Path<u64>,
) -> Result<impl Responder, LeaveError> {
    let leave = workflow.cancel(&actor, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(LeaveResponse::from(leave)))
}

/// for getting a leave application details endpoint
#[utoipa::path(
    get,
    path = "/api/v1/leave/{leave_id}",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to fetch")
    ),
    responses(
        (status = 200, description = "Leave request found", body = LeaveResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Outside the actor's view scope"),
        (status = 404, description = "Leave request not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn get_leave(
    actor: Actor,
    workflow: web::Data<LeaveWorkflow>,
    path: web::Path<u64>,
) -> Result<impl Responder, LeaveError> {
    let leave = workflow.get_by_id(&actor, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(LeaveResponse::from(leave)))
}

/// Paginated listing, scoped by role: ADMIN sees all, MANAGER their
/// department, EMPLOYEE their own requests.
#[utoipa::path(
    get,
    path = "/api/v1/leave",
    params(LeaveFilter),
    responses(
        (status = 200, description = "Paginated leave list", body = LeaveListResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn leave_list(
    actor: Actor,
    workflow: web::Data<LeaveWorkflow>,
    query: web::Query<LeaveFilter>,
) -> Result<impl Responder, LeaveError> {
    let status = query.status()?;
    let result = workflow.list_all(&actor, status, query.page()).await?;
    Ok(HttpResponse::Ok().json(LeaveListResponse::from(result)))
}

/// for getting one employee's leave history endpoint
#[utoipa::path(
    get,
    path = "/api/v1/leave/employee/{employee_id}",
    params(
        ("employee_id" = u64, Path, description = "Employee whose leaves to list"),
        LeaveFilter
    ),
    responses(
        (status = 200, description = "Paginated leave list", body = LeaveListResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Outside the actor's view scope"),
        (status = 404, description = "Employee not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn employee_leave_list(
    actor: Actor,
    workflow: web::Data<LeaveWorkflow>,
    path: web::Path<u64>,
    query: web::Query<LeaveFilter>,
) -> Result<impl Responder, LeaveError> {
    let status = query.status()?;
    let result = workflow
        .list_by_employee(&actor, path.into_inner(), status, query.page())
        .await?;
    Ok(HttpResponse::Ok().json(LeaveListResponse::from(result)))
}
