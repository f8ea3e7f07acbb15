use actix_web::{FromRequest, HttpMessage, HttpRequest, dev::Payload, error::ErrorUnauthorized, web::Data};
use futures::future::{Ready, ready};

use crate::auth::jwt::verify_token;
use crate::config::Config;
use crate::domain::guard::Actor;
use crate::model::role::Role;
use crate::models::{Claims, TokenType};

pub fn actor_from_claims(claims: Claims) -> Result<Actor, &'static str> {
    if claims.token_type != TokenType::Access {
        return Err("Not an access token");
    }
    let role = Role::from_id(claims.role).ok_or("Invalid role")?;
    Ok(Actor {
        user_id: claims.user_id,
        username: claims.sub,
        role,
        employee_id: claims.employee_id,
        department: claims.department,
    })
}

/// Handlers take `Actor` directly. The auth middleware has usually
/// already parked one in the request extensions; decoding the bearer
/// token here again covers routes mounted without the middleware.
impl FromRequest for Actor {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        if let Some(actor) = req.extensions().get::<Actor>() {
            return ready(Ok(actor.clone()));
        }

        let token = match req
            .headers()
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
        {
            Some(t) => t,
            None => return ready(Err(ErrorUnauthorized("Missing token"))),
        };

        let config = match req.app_data::<Data<Config>>() {
            Some(c) => c,
            None => {
                return ready(Err(actix_web::error::ErrorInternalServerError(
                    "Config missing",
                )));
            }
        };

        let claims = match verify_token(token, &config.jwt_secret) {
            Ok(c) => c,
            Err(_) => return ready(Err(ErrorUnauthorized("Invalid token"))),
        };

        ready(actor_from_claims(claims).map_err(ErrorUnauthorized))
    }
}
