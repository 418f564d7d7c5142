/// Authentication Routes
///
/// HTTP surface of the session lifecycle: register, login, refresh, logout.
/// Handlers only move data between HTTP and `AuthService`; every rule lives there.

use actix_web::{web, HttpRequest, HttpResponse};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::auth::{AccessClaims, AuthService, SessionGrant};
use crate::error::{AppError, AuthError, ErrorContext, ValidationError};
use crate::session_cookie::RefreshCookie;

/// Credentials for register and login
#[derive(Deserialize)]
pub struct CredentialsRequest {
    pub username: String,
    pub password: String,
}

/// Optional body for refresh/logout when the client cannot send cookies
#[derive(Deserialize, Default)]
pub struct RefreshRequest {
    pub refresh_token: Option<String>,
}

/// Login / refresh response
#[derive(Serialize)]
pub struct SessionResponse {
    pub uid: String,
    pub access_token: String,
    /// Access token expiry (Unix timestamp)
    pub expires_at: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

/// Current session information
#[derive(Serialize)]
pub struct MeResponse {
    pub uid: String,
    pub expires_at: i64,
}

fn session_response(grant: SessionGrant, cookie: &RefreshCookie) -> HttpResponse {
    let max_age = grant.tokens.refresh_expires_at - Utc::now().timestamp();
    let refresh_cookie = cookie.issue(&grant.tokens.refresh_token, max_age);

    let body = SessionResponse {
        uid: grant.uid,
        access_token: grant.tokens.access_token,
        expires_at: grant.tokens.expires_at,
        refresh_token: cookie
            .expose_in_body()
            .then_some(grant.tokens.refresh_token),
    };

    HttpResponse::Ok().cookie(refresh_cookie).json(body)
}

fn body_token(body: &Option<web::Json<RefreshRequest>>) -> Option<&str> {
    body.as_ref().and_then(|b| b.refresh_token.as_deref())
}

/// POST /auth/register
///
/// # Errors
/// - 400: invalid username or weak password
/// - 409: username already taken
pub async fn register(
    form: web::Json<CredentialsRequest>,
    auth: web::Data<AuthService>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("account_registration");

    let uid = auth
        .register(&form.username, &form.password)
        .await
        .map_err(|e| {
            context.log_error(&e);
            e
        })?;

    tracing::info!(request_id = %context.request_id, uid = %uid, "Registration completed");
    Ok(HttpResponse::Ok().json(serde_json::json!({})))
}

/// POST /auth/login
///
/// Returns the access token and sets the refresh-token cookie.
///
/// # Errors
/// - 400: missing fields
/// - 401: unknown username or wrong password (same response for both)
/// - 403: account inactive
pub async fn login(
    form: web::Json<CredentialsRequest>,
    auth: web::Data<AuthService>,
    cookie: web::Data<RefreshCookie>,
) -> Result<HttpResponse, AppError> {
    let grant = auth.login(&form.username, &form.password).await?;
    Ok(session_response(grant, cookie.get_ref()))
}

/// POST /auth/refresh
///
/// Reads the refresh token from the cookie (or the `refresh_token` body field),
/// returns a new access token and rotates the cookie.
///
/// # Errors
/// - 401: missing, invalid, expired or superseded refresh token
pub async fn refresh(
    req: HttpRequest,
    body: Option<web::Json<RefreshRequest>>,
    auth: web::Data<AuthService>,
    cookie: web::Data<RefreshCookie>,
) -> Result<HttpResponse, AppError> {
    let presented = cookie
        .extract(&req, body_token(&body))
        .ok_or(AuthError::MissingToken)?;

    let grant = auth.refresh(&presented).await?;
    Ok(session_response(grant, cookie.get_ref()))
}

/// POST /auth/logout
///
/// **Requires a valid access token** (`Authorization: Bearer`), plus the
/// refresh token of the same account. Clears the cookie.
///
/// # Errors
/// - 400: no refresh token supplied
/// - 401: invalid access token, or refresh token not the live one
pub async fn logout(
    req: HttpRequest,
    body: Option<web::Json<RefreshRequest>>,
    claims: web::ReqData<AccessClaims>,
    auth: web::Data<AuthService>,
    cookie: web::Data<RefreshCookie>,
) -> Result<HttpResponse, AppError> {
    let presented = cookie
        .extract(&req, body_token(&body))
        .ok_or_else(|| ValidationError::EmptyField("refresh_token".to_string()))?;

    let context = ErrorContext::new("logout").with_user_id(claims.uid.clone());
    auth.logout(&presented, Some(&claims.uid))
        .await
        .map_err(|e| {
            context.log_error(&e);
            e
        })?;

    Ok(HttpResponse::Ok()
        .cookie(cookie.clear())
        .json(serde_json::json!({})))
}

/// GET /api/me
///
/// Subject and expiry of the presented access token.
pub async fn current_session(claims: web::ReqData<AccessClaims>) -> HttpResponse {
    HttpResponse::Ok().json(MeResponse {
        uid: claims.uid.clone(),
        expires_at: claims.exp,
    })
}
