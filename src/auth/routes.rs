//! Authentication REST API routes

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use std::sync::Arc;

use crate::error::ApiError;

use super::{
    codes::{generate_code, CodeStore, InMemoryCodeStore},
    database::AuthDatabase,
    email::EmailSender,
    jwt::{JwtConfig, JwtManager},
    models::*,
    password::{hash_password, normalize_email, validate_email, validate_password, verify_password},
};

/// Shared authentication state
pub struct AuthState {
    pub db: AuthDatabase,
    pub jwt: JwtManager,
    pub email: EmailSender,
    pub codes: Arc<dyn CodeStore>,
}

impl AuthState {
    pub fn new(db_path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let db = AuthDatabase::new(db_path)?;
        let jwt = JwtManager::new(JwtConfig::from_env());
        let email = EmailSender::from_env();

        Ok(Self {
            db,
            jwt,
            email,
            codes: Arc::new(InMemoryCodeStore::new()),
        })
    }
}

/// Routes that require no credentials
pub fn auth_router(state: Arc<AuthState>) -> Router {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .with_state(state)
}

/// Routes guarded by a bearer token
pub fn user_router(state: Arc<AuthState>) -> Router {
    Router::new()
        .route("/request-password-change", post(request_password_change))
        .route("/change-password", post(change_password))
        .with_state(state)
}

/// Extract and verify the caller identity from `Authorization: Bearer <token>`.
/// A missing or malformed header is an authorization failure; a token that
/// fails verification is an authentication failure.
fn bearer_claims(headers: &HeaderMap, jwt: &JwtManager) -> Result<Claims, ApiError> {
    let header = headers
        .get(header::AUTHORIZATION)
        .ok_or_else(|| ApiError::Authorization("Authorization header missing".to_string()))?;
    let value = header
        .to_str()
        .map_err(|_| ApiError::Authorization("Authorization header missing".to_string()))?;
    let token = value
        .strip_prefix("Bearer ")
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::Authorization("Token missing".to_string()))?;

    let data = jwt
        .verify_token(token)
        .map_err(|_| ApiError::Authentication("Invalid or expired token".to_string()))?;
    Ok(data.claims)
}

/// POST /api/auth/register - Register new user
async fn register(
    State(state): State<Arc<AuthState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let email = normalize_email(&req.email);
    validate_email(&email).map_err(|e| ApiError::Validation(e.to_string()))?;
    validate_password(&req.password).map_err(|e| ApiError::Validation(e.to_string()))?;

    if state.db.find_user_by_email(&email)?.is_some() {
        return Err(ApiError::Conflict("Email already registered".to_string()));
    }

    let password_hash = hash_password(&req.password).map_err(|e| {
        log::error!("Password hashing error: {}", e);
        ApiError::Internal
    })?;

    let now = chrono::Utc::now().to_rfc3339();
    let user = User {
        id: uuid::Uuid::new_v4().to_string(),
        email,
        password_hash,
        created_at: now.clone(),
        updated_at: now,
    };
    state.db.create_user(&user)?;

    log::info!("Registered user {}", user.id);
    Ok((StatusCode::CREATED, Json(user)))
}

/// POST /api/auth/login - Login with email/password
async fn login(
    State(state): State<Arc<AuthState>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    // Unknown email and wrong password produce the same response, so a
    // caller cannot probe which addresses have accounts.
    let invalid = || ApiError::Authentication("Invalid credentials".to_string());

    let email = normalize_email(&req.email);
    let user = state.db.find_user_by_email(&email)?.ok_or_else(invalid)?;

    let matches = verify_password(&req.password, &user.password_hash).map_err(|e| {
        log::error!("Password verification error: {}", e);
        ApiError::Internal
    })?;
    if !matches {
        return Err(invalid());
    }

    let token = state.jwt.create_token(&user.id, &user.email).map_err(|e| {
        log::error!("JWT creation error: {}", e);
        ApiError::Internal
    })?;

    Ok(Json(LoginResponse {
        token,
        user_id: user.id,
    }))
}

/// POST /api/user/request-password-change - Send a verification code
async fn request_password_change(
    State(state): State<Arc<AuthState>>,
    headers: HeaderMap,
    Json(req): Json<RequestPasswordChangeRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let claims = bearer_claims(&headers, &state.jwt)?;

    let email = normalize_email(&req.email);
    if claims.email != email {
        return Err(ApiError::Authorization(
            "You can only request a password change for your own account".to_string(),
        ));
    }

    if state.db.find_user_by_email(&email)?.is_none() {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    let code = generate_code();
    state.codes.put(&email, &code);

    // The code stays stored on a failed send: a retried request can still
    // succeed, and an already-delivered code is never silently invalidated.
    if let Err(e) = state.email.send_verification_code(&email, &code).await {
        log::error!("Failed to send verification code to {}: {}", email, e);
        return Err(ApiError::Transient(
            "Error sending verification code.".to_string(),
        ));
    }

    // The code itself never appears in the response.
    Ok(Json(MessageResponse {
        message: "Verification code sent to your email.".to_string(),
    }))
}

/// POST /api/user/change-password - Verify the code and update the password
async fn change_password(
    State(state): State<Arc<AuthState>>,
    headers: HeaderMap,
    Json(req): Json<ChangePasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let claims = bearer_claims(&headers, &state.jwt)?;

    let email = normalize_email(&req.email);
    if claims.email != email {
        return Err(ApiError::Authorization(
            "You can only change the password for your own account".to_string(),
        ));
    }

    validate_password(&req.new_password).map_err(|e| ApiError::Validation(e.to_string()))?;

    let user = state
        .db
        .find_user_by_email(&email)?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    // Consume the code atomically before touching the record; a mismatch and
    // a missing code are indistinguishable to the caller.
    if !state.codes.take_if_matches(&email, &req.verification_code) {
        return Err(ApiError::Validation(
            "Invalid or expired verification code.".to_string(),
        ));
    }

    let password_hash = hash_password(&req.new_password).map_err(|e| {
        log::error!("Password hashing error: {}", e);
        ApiError::Internal
    })?;
    state.db.update_password(&user.id, &password_hash)?;

    log::info!("Password updated for user {}", user.id);
    Ok(Json(MessageResponse {
        message: "Password updated successfully.".to_string(),
    }))
}
