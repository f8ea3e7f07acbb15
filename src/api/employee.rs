use actix_web::{HttpResponse, Responder, web};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::error::LeaveError;
use crate::domain::guard::{self, Actor};
use crate::model::employee::Employee;
use crate::store::{LeaveStore, NewEmployee, PageRequest, PageResult};

#[derive(Deserialize, ToSchema)]
pub struct CreateEmployee {
    #[schema(example = "John Doe")]
    pub name: String,
    #[schema(example = "jdoe@example.com")]
    pub email: String,
    #[schema(example = "Engineering")]
    pub department: Option<String>,
}

#[derive(Deserialize, IntoParams)]
pub struct EmployeePageQuery {
    /// Pagination page number (start with 1)
    pub page: Option<u64>,
    /// Pagination per page number
    pub per_page: Option<u64>,
}

#[derive(Serialize, ToSchema)]
pub struct EmployeeListResponse {
    pub data: Vec<Employee>,
    #[schema(example = 1)]
    pub page: u64,
    #[schema(example = 10)]
    pub per_page: u64,
    #[schema(example = 1)]
    pub total: i64,
}

impl From<PageResult<Employee>> for EmployeeListResponse {
    fn from(result: PageResult<Employee>) -> Self {
        Self {
            data: result.data,
            page: result.page,
            per_page: result.per_page,
            total: result.total,
        }
    }
}

/* =========================
Create employee profile (Admin)
========================= */
#[utoipa::path(
    post,
    path = "/api/v1/employee",
    request_body = CreateEmployee,
    responses(
        (status = 201, description = "Employee created", body = Employee),
        (status = 400, description = "Invalid payload"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only")
    ),
    security(("bearer_auth" = [])),
    tag = "Employee"
)]
pub async fn create_employee(
    actor: Actor,
    store: web::Data<dyn LeaveStore>,
    payload: web::Json<CreateEmployee>,
) -> Result<impl Responder, LeaveError> {
    guard::require_admin(&actor)?;

    let payload = payload.into_inner();
    if payload.name.trim().is_empty() || payload.email.trim().is_empty() {
        return Err(LeaveError::InvalidRequest(
            "Name and email cannot be empty".into(),
        ));
    }

    let employee = store
        .create_employee(NewEmployee {
            name: payload.name.trim().to_string(),
            email: payload.email.trim().to_string(),
            department: payload.department,
        })
        .await?;

    Ok(HttpResponse::Created().json(employee))
}

/// for getting an employee profile endpoint
#[utoipa::path(
    get,
    path = "/api/v1/employee/{employee_id}",
    params(
        ("employee_id" = u64, Path, description = "ID of the employee to fetch")
    ),
    responses(
        (status = 200, description = "Employee found", body = Employee),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Outside the actor's view scope"),
        (status = 404, description = "Employee not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Employee"
)]
pub async fn get_employee(
    actor: Actor,
    store: web::Data<dyn LeaveStore>,
    path: web::Path<u64>,
) -> Result<impl Responder, LeaveError> {
    let employee_id = path.into_inner();
    let employee = store
        .employee_by_id(employee_id)
        .await?
        .ok_or_else(|| LeaveError::NotFound(format!("Employee with id: {}", employee_id)))?;

    guard::can_view(&actor, &employee)?;
    Ok(HttpResponse::Ok().json(employee))
}

/* =========================
List employees (Admin)
========================= */
#[utoipa::path(
    get,
    path = "/api/v1/employee",
    params(EmployeePageQuery),
    responses(
        (status = 200, description = "Paginated employee list", body = EmployeeListResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only")
    ),
    security(("bearer_auth" = [])),
    tag = "Employee"
)]
pub async fn list_employees(
    actor: Actor,
    store: web::Data<dyn LeaveStore>,
    query: web::Query<EmployeePageQuery>,
) -> Result<impl Responder, LeaveError> {
    guard::require_admin(&actor)?;

    let result = store
        .list_employees(PageRequest::new(query.page, query.per_page))
        .await?;
    Ok(HttpResponse::Ok().json(EmployeeListResponse::from(result)))
}
