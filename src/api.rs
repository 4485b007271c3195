//! HTTP API handlers for Airwatch.
//!
//! The router is the presentation boundary: handlers translate requests into
//! calls on the services held in [`AppState`] and map their errors onto
//! status codes with an [`ErrorResponse`] body.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::{info, instrument, warn};

use crate::auth::{AuthError, AuthService, RegistrationForm};
use crate::classify::{Classification, classify};
use crate::complaints::{
    COMPLAINT_CATEGORIES, ComplaintDesk, ComplaintError, ComplaintForm, SUBMIT_FAILED_MESSAGE,
    TRACK_FAILED_MESSAGE,
};
use crate::dashboard::{DashboardView, DashboardViewModel};
use crate::error::ValidationError;
use crate::guidance::{GuidanceText, HealthAdvisor};
use crate::model::{AqiQuery, Complaint, LoginRequest, SubmissionReceipt, User};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub auth: AuthService,
    pub complaints: ComplaintDesk,
    pub advisor: HealthAdvisor,
    pub dashboard: Arc<DashboardView>,
}

/// Error body returned by every failing endpoint.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Unauthorized(String),
    BadGateway(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::BadGateway(msg) => (StatusCode::BAD_GATEWAY, msg),
        };

        let body = ErrorResponse {
            success: false,
            message,
        };
        (status, Json(body)).into_response()
    }
}

impl From<ValidationError> for ApiError {
    fn from(e: ValidationError) -> Self {
        ApiError::BadRequest(e.to_string())
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::Validation(e) => e.into(),
            AuthError::Rejected(msg) => ApiError::Unauthorized(msg),
            AuthError::Fetch(e) => ApiError::BadGateway(e.to_string()),
        }
    }
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/classify", get(get_classify))
        .route("/guidance", get(get_guidance))
        .route("/dashboard", get(get_dashboard))
        .route("/dashboard/refresh", post(post_dashboard_refresh))
        .route("/auth/login", post(post_login))
        .route("/auth/register", post(post_register))
        .route("/auth/logout", post(post_logout))
        .route("/auth/session", get(get_session))
        .route("/complaints", post(post_complaint))
        .route("/complaints/categories", get(get_categories))
        .route("/complaints/:user_id", get(get_complaints))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}

/// GET /health - Simple health check endpoint.
pub async fn health_check() -> impl IntoResponse {
    StatusCode::OK
}

/// GET /classify?aqi=388 - Severity tier and colour for an AQI value.
#[instrument]
pub async fn get_classify(
    Query(query): Query<AqiQuery>,
) -> Result<Json<Classification>, ApiError> {
    let classification = classify(query.aqi).inspect_err(|e| {
        warn!(aqi = query.aqi, error = %e, "Rejected AQI value");
    })?;
    Ok(Json(classification))
}

/// GET /guidance?aqi=388 - Health guidance for an AQI value.
///
/// Fractional values are rounded up, which keeps them in the tier
/// `/classify` reports.
#[instrument(skip(state))]
pub async fn get_guidance(
    State(state): State<AppState>,
    Query(query): Query<AqiQuery>,
) -> Result<Json<GuidanceText>, ApiError> {
    let classification = classify(query.aqi)?;
    let aqi = classification.aqi.ceil() as u32;

    let guidance = state.advisor.generate_guidance(aqi).await;
    info!(aqi, origin = ?guidance.origin, "Guidance served");
    Ok(Json(guidance))
}

/// GET /dashboard - The model currently on screen.
pub async fn get_dashboard(State(state): State<AppState>) -> Json<DashboardViewModel> {
    Json(state.dashboard.current())
}

/// POST /dashboard/refresh - Reload snapshot and guidance.
#[instrument(skip(state))]
pub async fn post_dashboard_refresh(State(state): State<AppState>) -> Json<DashboardViewModel> {
    Json(state.dashboard.refresh().await)
}

/// POST /auth/login - Sign in.
#[instrument(skip(state, request), fields(username = %request.username))]
pub async fn post_login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<User>, ApiError> {
    let user = state.auth.login(&request.username, &request.password).await?;
    Ok(Json(user))
}

/// POST /auth/register - Create an account.
#[instrument(skip(state, form), fields(username = %form.username))]
pub async fn post_register(
    State(state): State<AppState>,
    Json(form): Json<RegistrationForm>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    let user = state.auth.register(&form).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// POST /auth/logout - Sign out.
pub async fn post_logout(State(state): State<AppState>) -> StatusCode {
    state.auth.logout();
    StatusCode::NO_CONTENT
}

/// GET /auth/session - The signed-in user, or `null`.
pub async fn get_session(State(state): State<AppState>) -> Json<Option<User>> {
    Json(state.auth.current_user())
}

/// POST /complaints - File a complaint.
///
/// # Request Body
///
/// ```json
/// {
///     "user_id": "USR1001",
///     "category": "Waste Burning",
///     "description": "Garbage burning behind the market",
///     "location": "Lat: 28.6469, Lon: 77.3164",
///     "priority": "High"
/// }
/// ```
#[instrument(skip(state, form))]
pub async fn post_complaint(
    State(state): State<AppState>,
    Json(form): Json<ComplaintForm>,
) -> Result<(StatusCode, Json<SubmissionReceipt>), ApiError> {
    match state.complaints.submit(&form).await {
        Ok(receipt) => Ok((StatusCode::CREATED, Json(receipt))),
        Err(ComplaintError::Validation(e)) => Err(e.into()),
        Err(ComplaintError::Fetch(_)) => Err(ApiError::BadGateway(SUBMIT_FAILED_MESSAGE.to_string())),
    }
}

/// GET /complaints/:user_id - A user's complaints, newest first.
#[instrument(skip(state))]
pub async fn get_complaints(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<Complaint>>, ApiError> {
    match state.complaints.track(&user_id).await {
        Ok(complaints) => Ok(Json(complaints)),
        Err(ComplaintError::Validation(e)) => Err(e.into()),
        Err(ComplaintError::Fetch(_)) => Err(ApiError::BadGateway(TRACK_FAILED_MESSAGE.to_string())),
    }
}

/// GET /complaints/categories - Categories offered on the report form.
pub async fn get_categories() -> Json<[&'static str; 5]> {
    Json(COMPLAINT_CATEGORIES)
}
