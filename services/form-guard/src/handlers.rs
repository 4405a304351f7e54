// SPDX-FileCopyrightText: 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
// SPDX-License-Identifier: PMPL-1.0-or-later

//! HTTP handlers for the public contact and recruitment forms.
//!
//! Every submission goes through the same pipeline: honeypot, rate limit,
//! field validation, (recruitment only) CV upload, forward, record. Each
//! client IP gets its own submission history, the server-side counterpart
//! of the visitor's browser storage.

use crate::config::Config;
use crate::forms::{FormCategory, FormPayload, FormTarget, ValidationError};
use crate::forwarder::{FormForwarder, SubmitResult};
use crate::guard::{validate_honeypot, Clock, SubmissionGuard, SystemClock};
use crate::metrics::{Metrics, Outcome};
use crate::store::{KeyValueStore, ScopedStore};
use axum::{
    extract::{multipart::MultipartError, ConnectInfo, DefaultBodyLimit, Multipart, State},
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use content_gateway::storage::{validate_file_size, ObjectStorage, StorageFolder, UploadFile};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::{debug, info, warn};
use url::Url;

/// Hidden field name shared by both forms
pub const HONEYPOT_FIELD: &str = "website";
/// Multipart part carrying the CV file
pub const CV_FIELD: &str = "cv";

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn KeyValueStore>,
    pub clock: Arc<dyn Clock>,
    pub forwarder: FormForwarder,
    pub cta_target: Option<FormTarget>,
    pub recruitment_target: Option<FormTarget>,
    pub storage: Option<ObjectStorage>,
    pub metrics: Metrics,
}

impl AppState {
    /// Build state from configuration. Missing or malformed form URLs leave
    /// that form disabled rather than failing start-up.
    pub fn build(
        config: Config,
        store: Arc<dyn KeyValueStore>,
        storage: Option<ObjectStorage>,
    ) -> anyhow::Result<Self> {
        let forwarder = FormForwarder::new(config.forms.timeout())?;
        let cta_target = form_target(FormCategory::Cta, config.forms.cta_url.as_deref());
        let recruitment_target =
            form_target(FormCategory::Recruitment, config.forms.recruitment_url.as_deref());
        if storage.is_none() {
            warn!("Object storage unavailable, recruitment submissions will fail");
        }

        Ok(Self {
            config,
            store,
            clock: Arc::new(SystemClock),
            forwarder,
            cta_target,
            recruitment_target,
            storage,
            metrics: Metrics::new()?,
        })
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Guard over the given client's history.
    pub fn guard_for(&self, client: &str) -> SubmissionGuard {
        let scoped = ScopedStore::new(self.store.clone(), client);
        SubmissionGuard::new(Arc::new(scoped), &self.config.guard).with_clock(self.clock.clone())
    }

    fn target(&self, category: FormCategory) -> Option<&FormTarget> {
        match category {
            FormCategory::Cta => self.cta_target.as_ref(),
            FormCategory::Recruitment => self.recruitment_target.as_ref(),
        }
    }
}

fn form_target(category: FormCategory, url: Option<&str>) -> Option<FormTarget> {
    let Some(raw) = url else {
        warn!(%category, "Form URL not configured, form disabled");
        return None;
    };
    match Url::parse(raw) {
        Ok(url) => Some(FormTarget::new(category, url)),
        Err(e) => {
            warn!(%category, url = raw, error = %e, "Invalid form URL, form disabled");
            None
        }
    }
}

/// Build the service router.
pub fn router(state: Arc<AppState>) -> Router {
    let upload_limit = usize::try_from(state.config.uploads.max_cv_bytes)
        .unwrap_or(usize::MAX)
        .saturating_add(1024 * 1024);
    let metrics_path = state.config.metrics.path.clone();

    let mut app = Router::new()
        .route("/health", get(health))
        .route("/healthz", get(health))
        .route("/api/forms/contact", post(contact))
        .route(
            "/api/forms/recruitment",
            post(recruitment).layer(DefaultBodyLimit::max(upload_limit)),
        );
    if state.config.metrics.enabled {
        app = app.route(&metrics_path, get(metrics));
    }
    if let Some(cors) = cors_layer(&state.config.allowed_origins) {
        app = app.layer(cors);
    }

    app.layer(TraceLayer::new_for_http()).with_state(state)
}

/// Restrictive CORS for the site's own origins.
fn cors_layer(allowed_origins: &[String]) -> Option<CorsLayer> {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();
    if origins.is_empty() {
        return None;
    }
    Some(
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE]),
    )
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after_secs: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<&'static str>,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

/// User-visible failures. Error bodies carry a stable `code` for the UI to
/// localise.
#[derive(Debug)]
pub enum ApiError {
    RateLimited { retry_after: Duration },
    Validation(ValidationError),
    FileTooLarge { limit: u64 },
    UnsupportedFile { extension: String },
    UploadFailed,
    ForwardFailed(String),
    Unavailable(&'static str),
    BadRequest(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, error, field, retry) = match self {
            Self::RateLimited { retry_after } => {
                let secs = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
                (
                    StatusCode::TOO_MANY_REQUESTS,
                    "RATE_LIMITED",
                    "Too many submissions, please try again later".to_string(),
                    None,
                    Some(secs),
                )
            }
            Self::Validation(e) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "VALIDATION_FAILED",
                e.to_string(),
                Some(e.field()),
                None,
            ),
            Self::FileTooLarge { limit } => (
                StatusCode::PAYLOAD_TOO_LARGE,
                "FILE_TOO_LARGE",
                format!("File exceeds the {limit} byte limit"),
                Some(CV_FIELD),
                None,
            ),
            Self::UnsupportedFile { extension } => (
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                "UNSUPPORTED_FILE_TYPE",
                format!("Files of type .{extension} are not accepted"),
                Some(CV_FIELD),
                None,
            ),
            Self::UploadFailed => (
                StatusCode::BAD_GATEWAY,
                "UPLOAD_FAILED",
                "Could not upload your file, please try again later".to_string(),
                Some(CV_FIELD),
                None,
            ),
            Self::ForwardFailed(message) => (StatusCode::BAD_GATEWAY, "FORWARD_FAILED", message, None, None),
            Self::Unavailable(what) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "UNAVAILABLE",
                format!("The {what} is not available right now"),
                None,
                None,
            ),
            Self::BadRequest(message) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", message, None, None),
        };

        let body = Json(ErrorResponse {
            error,
            code,
            retry_after_secs: retry,
            field,
        });
        match retry {
            Some(secs) => (status, [(header::RETRY_AFTER, secs.to_string())], body).into_response(),
            None => (status, body).into_response(),
        }
    }
}

/// Contact form body.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactRequest {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub interests: Vec<String>,
    /// Honeypot
    #[serde(default)]
    pub website: String,
}

impl ContactRequest {
    fn into_payload(self) -> FormPayload {
        FormPayload::new()
            .with_text("fullName", self.full_name)
            .with_text("email", self.email)
            .with_text("phone", self.phone)
            .with_text("description", self.description)
            .with_list("interests", self.interests)
    }
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "form-guard",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Prometheus metrics endpoint.
pub async fn metrics(State(state): State<Arc<AppState>>) -> Response {
    match state.metrics.render() {
        Ok(text) => text.into_response(),
        Err(e) => {
            warn!(error = %e, "Metrics encoding failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Contact (CTA) form submission.
pub async fn contact(
    State(state): State<Arc<AppState>>,
    connect: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    Json(req): Json<ContactRequest>,
) -> Result<Json<SubmitResult>, ApiError> {
    let category = FormCategory::Cta;
    let client = client_key(&headers, connect, state.config.guard.trust_forwarded_for);

    if !validate_honeypot(&req.website) {
        return Ok(drop_spam(&state, category, &client));
    }

    let guard = state.guard_for(&client);
    ensure_allowed(&state, &guard, category, &client)?;

    let payload = req.into_payload();
    category
        .schema()
        .validate(&payload)
        .map_err(|e| invalid(&state, category, e))?;

    let target = state
        .target(category)
        .ok_or(ApiError::Unavailable("contact form"))?;
    let result = state.forwarder.submit_to_google_form(target, &payload).await;
    finish(&state, guard, category, &client, result).await
}

/// Recruitment form submission (multipart with a `cv` file part).
pub async fn recruitment(
    State(state): State<Arc<AppState>>,
    connect: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Json<SubmitResult>, ApiError> {
    let category = FormCategory::Recruitment;
    let client = client_key(&headers, connect, state.config.guard.trust_forwarded_for);
    let limit = state.config.uploads.max_cv_bytes;

    let form = read_recruitment_form(&mut multipart, limit).await?;

    if !validate_honeypot(&form.honeypot) {
        return Ok(drop_spam(&state, category, &client));
    }

    let guard = state.guard_for(&client);
    ensure_allowed(&state, &guard, category, &client)?;

    let mut payload = form.payload;
    let schema = category.schema();
    schema
        .validate_user_fields(&payload)
        .map_err(|e| invalid(&state, category, e))?;

    let cv = form
        .cv
        .ok_or_else(|| invalid(&state, category, ValidationError::MissingField(CV_FIELD)))?;
    if !validate_file_size(cv.size(), limit) {
        state.metrics.observe(category, Outcome::Invalid);
        return Err(ApiError::FileTooLarge { limit });
    }
    let extension = cv.extension();
    if !state
        .config
        .uploads
        .allowed_cv_extensions
        .iter()
        .any(|allowed| allowed.eq_ignore_ascii_case(&extension))
    {
        state.metrics.observe(category, Outcome::Invalid);
        return Err(ApiError::UnsupportedFile { extension });
    }

    let target = state
        .target(category)
        .ok_or(ApiError::Unavailable("recruitment form"))?;
    let storage = state.storage.as_ref().ok_or_else(|| {
        state.metrics.observe(category, Outcome::UploadFailed);
        ApiError::UploadFailed
    })?;

    let cv_url = match storage.upload(&cv, StorageFolder::Cv).await {
        Ok(url) => url,
        Err(e) => {
            warn!(%client, error = %e, "CV upload failed, submission aborted");
            state.metrics.observe(category, Outcome::UploadFailed);
            return Err(ApiError::UploadFailed);
        }
    };
    attach_cv(&state, storage, category, &mut payload, &cv_url).await?;

    let result = state.forwarder.submit_to_google_form(target, &payload).await;
    if !result.success {
        discard_upload(storage, &cv_url).await;
    }
    finish(&state, guard, category, &client, result).await
}

struct RecruitmentForm {
    payload: FormPayload,
    honeypot: String,
    cv: Option<UploadFile>,
}

async fn read_recruitment_form(multipart: &mut Multipart, limit: u64) -> Result<RecruitmentForm, ApiError> {
    let mut form = RecruitmentForm {
        payload: FormPayload::new(),
        honeypot: String::new(),
        cv: None,
    };
    let part_error = |e: MultipartError| {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::FileTooLarge { limit }
        } else {
            ApiError::BadRequest(e.body_text())
        }
    };

    while let Some(field) = multipart.next_field().await.map_err(part_error)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "" => continue,
            CV_FIELD => {
                let file_name = field.file_name().unwrap_or(CV_FIELD).to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field.bytes().await.map_err(part_error)?;
                // Browsers send an empty part for an untouched file input.
                if !bytes.is_empty() {
                    form.cv = Some(UploadFile {
                        file_name,
                        content_type,
                        bytes: bytes.to_vec(),
                    });
                }
            }
            HONEYPOT_FIELD => form.honeypot = field.text().await.map_err(part_error)?,
            _ => {
                let value = field.text().await.map_err(part_error)?;
                form.payload.set_text(&name, value);
            }
        }
    }

    Ok(form)
}

/// Fill in the uploaded CV and revalidate. A rejected payload takes the
/// upload with it.
async fn attach_cv(
    state: &AppState,
    storage: &ObjectStorage,
    category: FormCategory,
    payload: &mut FormPayload,
    cv_url: &str,
) -> Result<(), ApiError> {
    payload.set_text("cvUrl", cv_url);
    if let Err(e) = category.schema().validate(payload) {
        discard_upload(storage, cv_url).await;
        return Err(invalid(state, category, e));
    }
    Ok(())
}

async fn discard_upload(storage: &ObjectStorage, cv_url: &str) {
    if let Err(e) = storage.delete(cv_url).await {
        warn!(%cv_url, error = %e, "Orphaned CV left in storage");
    }
}

/// Client identity used to scope submission history.
fn client_key(headers: &HeaderMap, connect: Option<ConnectInfo<SocketAddr>>, trust_forwarded_for: bool) -> String {
    if trust_forwarded_for {
        let forwarded = headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .and_then(|v| v.parse::<IpAddr>().ok());
        if let Some(ip) = forwarded {
            return ip.to_string();
        }
    }
    connect
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Honeypot hit: look like a success, forward and record nothing.
fn drop_spam(state: &AppState, category: FormCategory, client: &str) -> Json<SubmitResult> {
    info!(%category, %client, "Honeypot filled, submission dropped");
    state.metrics.observe(category, Outcome::SpamDropped);
    Json(SubmitResult::sent())
}

fn ensure_allowed(
    state: &AppState,
    guard: &SubmissionGuard,
    category: FormCategory,
    client: &str,
) -> Result<(), ApiError> {
    if guard.check_rate_limit(category) {
        return Ok(());
    }
    let retry_after = guard
        .retry_after(category)
        .unwrap_or(state.config.guard.window_duration());
    info!(
        %category,
        %client,
        retry_after_secs = retry_after.as_secs(),
        "Submission rate limited"
    );
    state.metrics.observe(category, Outcome::RateLimited);
    Err(ApiError::RateLimited { retry_after })
}

fn invalid(state: &AppState, category: FormCategory, error: ValidationError) -> ApiError {
    debug!(%category, error = %error, "Submission rejected");
    state.metrics.observe(category, Outcome::Invalid);
    ApiError::Validation(error)
}

/// Record quota only for forwarded submissions. The store may write to
/// disk, so recording runs on the blocking pool.
async fn finish(
    state: &AppState,
    guard: SubmissionGuard,
    category: FormCategory,
    client: &str,
    result: SubmitResult,
) -> Result<Json<SubmitResult>, ApiError> {
    if !result.success {
        state.metrics.observe(category, Outcome::ForwardFailed);
        return Err(ApiError::ForwardFailed(result.message));
    }
    match tokio::task::spawn_blocking(move || guard.record_submission(category)).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!(%category, %client, error = %e, "Could not record submission"),
        Err(e) => warn!(%category, %client, error = %e, "Submission recording task failed"),
    }
    state.metrics.observe(category, Outcome::Accepted);
    Ok(Json(result))
}
