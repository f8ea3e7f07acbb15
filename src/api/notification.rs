use actix_web::{HttpResponse, Responder, web};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::error::LeaveError;
use crate::domain::guard::Actor;
use crate::model::notification::Notification;
use crate::store::{LeaveStore, PageRequest, PageResult};

#[derive(Deserialize, IntoParams)]
pub struct NotificationPageQuery {
    /// Pagination page number (start with 1)
    pub page: Option<u64>,
    /// Pagination per page number
    pub per_page: Option<u64>,
}

#[derive(Serialize, ToSchema)]
pub struct NotificationListResponse {
    pub data: Vec<Notification>,
    #[schema(example = 1)]
    pub page: u64,
    #[schema(example = 10)]
    pub per_page: u64,
    #[schema(example = 1)]
    pub total: i64,
}

impl From<PageResult<Notification>> for NotificationListResponse {
    fn from(result: PageResult<Notification>) -> Self {
        Self {
            data: result.data,
            page: result.page,
            per_page: result.per_page,
            total: result.total,
        }
    }
}

/// Newest-first notifications for the acting user.
#[utoipa::path(
    get,
    path = "/api/v1/notification",
    params(NotificationPageQuery),
    responses(
        (status = 200, description = "Paginated notification list", body = NotificationListResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Notification"
)]
pub async fn list_notifications(
    actor: Actor,
    store: web::Data<dyn LeaveStore>,
    query: web::Query<NotificationPageQuery>,
) -> Result<impl Responder, LeaveError> {
    let result = store
        .notifications_for_user(actor.user_id, PageRequest::new(query.page, query.per_page))
        .await?;
    Ok(HttpResponse::Ok().json(NotificationListResponse::from(result)))
}

/// Marks one of the acting user's notifications as read.
#[utoipa::path(
    put,
    path = "/api/v1/notification/{notification_id}/read",
    params(
        ("notification_id" = u64, Path, description = "ID of the notification to mark read")
    ),
    responses(
        (status = 204, description = "Notification marked read"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Notification not found for this user")
    ),
    security(("bearer_auth" = [])),
    tag = "Notification"
)]
pub async fn mark_read(
    actor: Actor,
    store: web::Data<dyn LeaveStore>,
    path: web::Path<u64>,
) -> Result<impl Responder, LeaveError> {
    store
        .mark_notification_read(path.into_inner(), actor.user_id)
        .await?;
    Ok(HttpResponse::NoContent().finish())
}
