use actix_web::{HttpRequest, HttpResponse, Responder, web};
use serde_json::json;
use tracing::{debug, info, instrument};

use crate::auth::jwt::{TokenSubject, generate_access_token, generate_refresh_token, verify_token};
use crate::auth::password::{hash_password, verify_password};
use crate::config::Config;
use crate::domain::error::LeaveError;
use crate::domain::guard::{self, Actor};
use crate::model::role::Role;
use crate::models::{LoginReqDto, RegisterReq, TokenPair, TokenType};
use crate::store::{LeaveStore, NewEmployee, NewUser};

/// User registration. MANAGER and EMPLOYEE accounts get an employee
/// profile created and linked in the same call. ADMIN accounts are
/// provisioned at deployment and cannot be self-registered; MANAGER
/// accounts start unapproved and cannot log in until an admin approves
/// them.
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterReq,
    responses(
        (status = 201, description = "User registered successfully"),
        (status = 400, description = "Invalid payload or username taken"),
        (status = 403, description = "Admin registration is not allowed")
    ),
    tag = "Auth"
)]
pub async fn register(
    payload: web::Json<RegisterReq>,
    store: web::Data<dyn LeaveStore>,
) -> Result<HttpResponse, LeaveError> {
    let payload = payload.into_inner();
    let username = payload.username.trim().to_lowercase();

    if username.is_empty() || payload.password.is_empty() {
        return Err(LeaveError::InvalidRequest(
            "Username and password must not be empty".into(),
        ));
    }

    let role = Role::from_id(payload.role_id)
        .ok_or_else(|| LeaveError::InvalidRequest("Invalid role id".into()))?;

    if role == Role::Admin {
        return Err(LeaveError::Forbidden(
            "Admin registration is not allowed".into(),
        ));
    }

    if payload.name.trim().is_empty() || payload.email.trim().is_empty() {
        return Err(LeaveError::InvalidRequest(
            "Name and email are required".into(),
        ));
    }
    let employee = store
        .create_employee(NewEmployee {
            name: payload.name.trim().to_string(),
            email: payload.email.trim().to_string(),
            department: payload.department.clone(),
        })
        .await?;
    let employee_id = Some(employee.id);

    let hashed = hash_password(&payload.password);
    let user_id = store
        .create_user(NewUser {
            username: username.clone(),
            password_hash: hashed,
            role_id: payload.role_id,
            employee_id,
            is_approved: role != Role::Manager,
        })
        .await?;

    info!(user_id, username = %username, "User registered");

    Ok(HttpResponse::Created().json(json!({
        "message": "User registered successfully",
        "user_id": user_id,
        "employee_id": employee_id
    })))
}

#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginReqDto,
    responses(
        (status = 200, description = "Token pair issued", body = TokenPair),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "Auth"
)]
#[instrument(
    name = "auth_login",
    skip(store, config, user),
    fields(username = %user.username)
)]
pub async fn login(
    user: web::Json<LoginReqDto>,
    store: web::Data<dyn LeaveStore>,
    config: web::Data<Config>,
) -> Result<HttpResponse, LeaveError> {
    info!("Login request received");

    if user.username.trim().is_empty() || user.password.is_empty() {
        info!("Validation failed: empty username or password");
        return Ok(HttpResponse::BadRequest().body("Username or password required"));
    }

    debug!("Fetching user");
    let db_user = match store.user_by_username(&user.username.to_lowercase()).await? {
        Some(u) => u,
        None => {
            info!("Invalid credentials: user not found");
            return Ok(HttpResponse::Unauthorized().body("Invalid credentials"));
        }
    };

    debug!("Verifying password");
    if !verify_password(&user.password, &db_user.password) {
        info!("Invalid credentials: password mismatch");
        return Ok(HttpResponse::Unauthorized().body("Invalid credentials"));
    }

    if !db_user.is_approved {
        info!("Login blocked: account pending approval");
        return Ok(HttpResponse::Forbidden().body("Account is pending admin approval"));
    }

    // Department rides along in the claims so scoping checks need no
    // extra lookup per request.
    let department = match db_user.employee_id {
        Some(employee_id) => store
            .employee_by_id(employee_id)
            .await?
            .and_then(|e| e.department),
        None => None,
    };

    let subject = TokenSubject {
        user_id: db_user.id,
        username: db_user.username,
        role: db_user.role_id,
        employee_id: db_user.employee_id,
        department,
    };

    let access_token = generate_access_token(&subject, &config.jwt_secret, config.access_token_ttl);
    let refresh_token =
        generate_refresh_token(&subject, &config.jwt_secret, config.refresh_token_ttl);

    info!("Login successful");

    Ok(HttpResponse::Ok().json(TokenPair {
        access_token,
        refresh_token,
    }))
}

/// Exchanges a refresh token for a fresh pair. Tokens are stateless;
/// revocation happens by rotating the signing secret.
#[utoipa::path(
    post,
    path = "/auth/refresh",
    responses(
        (status = 200, description = "New token pair", body = TokenPair),
        (status = 401, description = "Missing or invalid refresh token")
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn refresh_token(req: HttpRequest, config: web::Data<Config>) -> impl Responder {
    let header = match req.headers().get("Authorization") {
        Some(h) => h.to_str().unwrap_or(""),
        None => return HttpResponse::Unauthorized().body("No token"),
    };

    let token = match header.strip_prefix("Bearer ") {
        Some(t) => t,
        None => return HttpResponse::Unauthorized().body("Invalid token"),
    };

    let claims = match verify_token(token, &config.jwt_secret) {
        Ok(c) => c,
        Err(_) => return HttpResponse::Unauthorized().finish(),
    };

    if claims.token_type != TokenType::Refresh {
        return HttpResponse::Unauthorized().finish();
    }

    let subject = TokenSubject {
        user_id: claims.user_id,
        username: claims.sub,
        role: claims.role,
        employee_id: claims.employee_id,
        department: claims.department,
    };

    let access_token = generate_access_token(&subject, &config.jwt_secret, config.access_token_ttl);
    let refresh_token =
        generate_refresh_token(&subject, &config.jwt_secret, config.refresh_token_ttl);

    HttpResponse::Ok().json(TokenPair {
        access_token,
        refresh_token,
    })
}

/// Admin vetting for manager accounts: a registered manager stays
/// locked out of login until approved here.
#[utoipa::path(
    put,
    path = "/api/v1/user/{id}/approve",
    params(("id" = u64, Path, description = "User id")),
    responses(
        (status = 200, description = "User approved"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn approve_user(
    actor: Actor,
    path: web::Path<u64>,
    store: web::Data<dyn LeaveStore>,
) -> Result<HttpResponse, LeaveError> {
    guard::require_admin(&actor)?;
    let user_id = path.into_inner();
    store.set_user_approval(user_id, true).await?;

    info!(user_id, approved_by = actor.user_id, "User approved");
    Ok(HttpResponse::Ok().json(json!({ "message": "User approved" })))
}

#[utoipa::path(
    put,
    path = "/api/v1/user/{id}/revoke",
    params(("id" = u64, Path, description = "User id")),
    responses(
        (status = 200, description = "User approval revoked"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn revoke_user(
    actor: Actor,
    path: web::Path<u64>,
    store: web::Data<dyn LeaveStore>,
) -> Result<HttpResponse, LeaveError> {
    guard::require_admin(&actor)?;
    let user_id = path.into_inner();
    store.set_user_approval(user_id, false).await?;

    info!(user_id, revoked_by = actor.user_id, "User approval revoked");
    Ok(HttpResponse::Ok().json(json!({ "message": "User approval revoked" })))
}
