use std::env;

use dotenvy::dotenv;
use rust_decimal::Decimal;

use crate::domain::workflow::LeavePolicy;

#[derive(Clone)]
pub struct Config {
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub server_addr: String,
    pub access_token_ttl: usize,
    pub refresh_token_ttl: usize,

    // Leave policy
    pub annual_entitlement: Decimal,
    pub carry_forward_max: Decimal,
    pub encashment_max: Decimal,
    pub auto_approval_threshold: Decimal,
    pub auto_approval_monthly_cap: i64,

    // Rate limiting
    pub rate_login_per_min: u32,
    pub rate_register_per_min: u32,
    pub rate_refresh_per_min: u32,
    pub rate_protected_per_min: u32,

    pub api_prefix: String,
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        Self {
            server_addr: env_or("SERVER_ADDR", "127.0.0.1:8080"),
            // Absent DATABASE_URL selects the in-memory store
            database_url: env::var("DATABASE_URL").ok(),
            jwt_secret: env::var("JWT_SECRET").expect("JWT_SECRET must be set"),
            access_token_ttl: env_or("ACCESS_TOKEN_TTL", "900").parse().unwrap(), // 15 min
            refresh_token_ttl: env_or("REFRESH_TOKEN_TTL", "604800").parse().unwrap(), // 7 days

            annual_entitlement: env_or("ANNUAL_ENTITLEMENT", "24").parse().unwrap(),
            carry_forward_max: env_or("CARRY_FORWARD_MAX", "12").parse().unwrap(),
            encashment_max: env_or("ENCASHMENT_MAX", "10").parse().unwrap(),
            auto_approval_threshold: env_or("AUTO_APPROVAL_THRESHOLD", "2").parse().unwrap(),
            auto_approval_monthly_cap: env_or("AUTO_APPROVAL_MONTHLY_CAP", "2").parse().unwrap(),

            rate_login_per_min: env_or("RATE_LOGIN_PER_MIN", "60").parse().unwrap(),
            rate_register_per_min: env_or("RATE_REGISTER_PER_MIN", "30").parse().unwrap(),
            rate_refresh_per_min: env_or("RATE_REFRESH_PER_MIN", "30").parse().unwrap(),
            rate_protected_per_min: env_or("RATE_PROTECTED_PER_MIN", "1000").parse().unwrap(),

            api_prefix: env_or("API_PREFIX", "/api/v1"),
        }
    }

    pub fn leave_policy(&self) -> LeavePolicy {
        LeavePolicy {
            annual_entitlement: self.annual_entitlement,
            carry_forward_max: self.carry_forward_max,
            encashment_max: self.encashment_max,
            auto_approval_threshold: self.auto_approval_threshold,
            auto_approval_monthly_cap: self.auto_approval_monthly_cap,
        }
    }
}
