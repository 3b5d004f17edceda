//! Sign-in sync and the admin guard.
//!
//! Authentication itself is delegated to the external identity provider;
//! `handle_sync` records what the provider asserted. Admin authorization is
//! a single designated identity checked against configuration — no policy
//! decision here trusts client-side role claims beyond that match.

use std::net::{IpAddr, SocketAddr};

use axum::{extract::State, http::HeaderMap, Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::errors::AppError;
use crate::models::user::User;
use crate::state::AppState;
use crate::upgrade::validation::is_valid_email;

pub const ADMIN_HEADER: &str = "x-admin-email";

#[derive(Debug, Deserialize)]
pub struct SyncRequest {
    pub user_id: String,
    pub email: String,
    pub display_name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SyncResponse {
    pub success: bool,
    pub user: User,
}

/// POST /api/v1/auth/sync
///
/// Idempotent upsert on sign-in: creates the user with default free tokens
/// on first sight, refreshes `last_login` on every call.
pub async fn handle_sync(
    State(state): State<AppState>,
    Json(req): Json<SyncRequest>,
) -> Result<Json<SyncResponse>, AppError> {
    if req.user_id.trim().is_empty() {
        return Err(AppError::Validation("user_id must not be empty".to_string()));
    }
    if !is_valid_email(&req.email) {
        return Err(AppError::Validation(
            "email is not a valid email address".to_string(),
        ));
    }

    let user = state
        .store
        .upsert_user(
            req.user_id.trim(),
            &req.email,
            req.display_name.as_deref(),
            Utc::now(),
        )
        .await?;
    Ok(Json(SyncResponse {
        success: true,
        user,
    }))
}

/// Checks the caller against the configured admin identity and returns the
/// reviewer email to stamp onto reviewed records. The response is a bare
/// Forbidden either way — it never reveals which identities are admins.
pub fn require_admin(config: &Config, headers: &HeaderMap) -> Result<String, AppError> {
    let claimed = headers
        .get(ADMIN_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .unwrap_or_default();
    if claimed.is_empty() || !claimed.eq_ignore_ascii_case(&config.admin_email) {
        return Err(AppError::Forbidden("Admin access required".to_string()));
    }
    Ok(claimed.to_string())
}

/// Client IP for rate limiting: first `X-Forwarded-For` hop when present
/// (the service runs behind a proxy in production), else the socket peer.
pub fn client_ip(headers: &HeaderMap, addr: SocketAddr) -> IpAddr {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or_else(|| addr.ip())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn config() -> Config {
        Config {
            database_url: String::new(),
            ai_api_key: String::new(),
            admin_email: "admin@cvforge.app".to_string(),
            upgrade_amount: 299,
            port: 8080,
            rust_log: "info".to_string(),
        }
    }

    fn headers_with_admin(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(ADMIN_HEADER, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_admin_header_matches_case_insensitively() {
        let reviewer = require_admin(&config(), &headers_with_admin("Admin@CVForge.app")).unwrap();
        assert_eq!(reviewer, "Admin@CVForge.app");
    }

    #[test]
    fn test_missing_header_is_forbidden() {
        assert!(require_admin(&config(), &HeaderMap::new()).is_err());
    }

    #[test]
    fn test_wrong_identity_is_forbidden() {
        assert!(require_admin(&config(), &headers_with_admin("user@example.com")).is_err());
    }

    #[test]
    fn test_client_ip_prefers_forwarded_header() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.9, 10.0.0.1"),
        );
        let addr: SocketAddr = "127.0.0.1:9000".parse().unwrap();
        assert_eq!(client_ip(&headers, addr), "203.0.113.9".parse::<IpAddr>().unwrap());
    }

    #[test]
    fn test_client_ip_falls_back_to_peer() {
        let addr: SocketAddr = "192.0.2.5:9000".parse().unwrap();
        assert_eq!(
            client_ip(&HeaderMap::new(), addr),
            "192.0.2.5".parse::<IpAddr>().unwrap()
        );
    }
}
