use actix_web::{HttpResponse, Responder, web};
use chrono::{Datelike, Utc};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use crate::domain::error::LeaveError;
use crate::domain::guard::Actor;
use crate::domain::workflow::LeaveWorkflow;
use crate::model::balance::{LeaveBalance, YearEndAction};

#[derive(Deserialize, IntoParams)]
pub struct BalanceQuery {
    /// Ledger year, defaults to the current year
    pub year: Option<i32>,
}

#[derive(Deserialize, ToSchema)]
pub struct YearEndReq {
    #[schema(example = 2026)]
    pub year: i32,
    #[schema(example = "CARRY_FORWARD")]
    pub action: YearEndAction,
}

/// for getting an employee's balance ledger entry endpoint
#[utoipa::path(
    get,
    path = "/api/v1/balance/{employee_id}",
    params(
        ("employee_id" = u64, Path, description = "Employee whose balance to fetch"),
        BalanceQuery
    ),
    responses(
        (status = 200, description = "Balance ledger entry", body = LeaveBalance),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Outside the actor's view scope"),
        (status = 404, description = "Employee not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Balance"
)]
pub async fn get_balance(
    actor: Actor,
    workflow: web::Data<LeaveWorkflow>,
    path: web::Path<u64>,
    query: web::Query<BalanceQuery>,
) -> Result<impl Responder, LeaveError> {
    let year = query.year.unwrap_or_else(|| Utc::now().year());
    let balance = workflow.get_balance(&actor, path.into_inner(), year).await?;
    Ok(HttpResponse::Ok().json(balance))
}

/// One-shot year-end settlement for one employee (ADMIN only).
/// CARRY_FORWARD rolls the capped remainder into next year's entry;
/// ENCASHMENT records the capped amount for payroll to pick up.
#[utoipa::path(
    post,
    path = "/api/v1/balance/{employee_id}/year-end",
    params(
        ("employee_id" = u64, Path, description = "Employee to settle")
    ),
    request_body = YearEndReq,
    responses(
        (status = 200, description = "Year-end action processed", body = Object, example = json!({
            "balance": {"employee_id": 7, "year": 2026, "remaining_leaves": 14.0},
            "outcome": {"CARRIED": 12.0}
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Employee or balance year not found"),
        (status = 409, description = "Year already settled")
    ),
    security(("bearer_auth" = [])),
    tag = "Balance"
)]
pub async fn process_year_end(
    actor: Actor,
    workflow: web::Data<LeaveWorkflow>,
    path: web::Path<u64>,
    payload: web::Json<YearEndReq>,
) -> Result<impl Responder, LeaveError> {
    let (balance, outcome) = workflow
        .process_year_end(&actor, path.into_inner(), payload.year, payload.action)
        .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "balance": balance,
        "outcome": outcome
    })))
}
