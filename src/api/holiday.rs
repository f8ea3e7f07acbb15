use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use crate::domain::error::LeaveError;
use crate::domain::guard::{self, Actor};
use crate::model::holiday::Holiday;
use crate::store::LeaveStore;

#[derive(Deserialize, ToSchema)]
pub struct CreateHoliday {
    #[schema(example = "Victory Day")]
    pub name: String,
    #[schema(example = "2026-12-16", format = "date", value_type = String)]
    pub date: NaiveDate,
}

#[derive(Deserialize, IntoParams)]
pub struct HolidayQuery {
    /// Restrict to one calendar year
    pub year: Option<i32>,
}

/* =========================
Create holiday (Admin)
========================= */
#[utoipa::path(
    post,
    path = "/api/v1/holiday",
    request_body = CreateHoliday,
    responses(
        (status = 201, description = "Holiday created", body = Holiday),
        (status = 400, description = "Duplicate date"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only")
    ),
    security(("bearer_auth" = [])),
    tag = "Holiday"
)]
pub async fn create_holiday(
    actor: Actor,
    store: web::Data<dyn LeaveStore>,
    payload: web::Json<CreateHoliday>,
) -> Result<impl Responder, LeaveError> {
    guard::require_admin(&actor)?;

    let payload = payload.into_inner();
    if payload.name.trim().is_empty() {
        return Err(LeaveError::InvalidRequest("Holiday name cannot be empty".into()));
    }

    let holiday = store
        .create_holiday(payload.name.trim().to_string(), payload.date)
        .await?;
    Ok(HttpResponse::Created().json(holiday))
}

/// for getting the holiday calendar endpoint
#[utoipa::path(
    get,
    path = "/api/v1/holiday",
    params(HolidayQuery),
    responses(
        (status = 200, description = "Holiday list, ordered by date", body = [Holiday]),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Holiday"
)]
pub async fn list_holidays(
    _actor: Actor,
    store: web::Data<dyn LeaveStore>,
    query: web::Query<HolidayQuery>,
) -> Result<impl Responder, LeaveError> {
    let holidays = store.holidays_by_year(query.year).await?;
    Ok(HttpResponse::Ok().json(holidays))
}

/* =========================
Delete holiday (Admin)
========================= */
#[utoipa::path(
    delete,
    path = "/api/v1/holiday/{holiday_id}",
    params(
        ("holiday_id" = u64, Path, description = "ID of the holiday to delete")
    ),
    responses(
        (status = 204, description = "Holiday deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Holiday not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Holiday"
)]
pub async fn delete_holiday(
    actor: Actor,
    store: web::Data<dyn LeaveStore>,
    path: web::Path<u64>,
) -> Result<impl Responder, LeaveError> {
    guard::require_admin(&actor)?;
    store.delete_holiday(path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}
