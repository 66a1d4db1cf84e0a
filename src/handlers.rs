use crate::application::upload;
use crate::application::{
    download, navigate, AppContext, Confirmation, DeleteOutcome, DeleteStatus, DownloadOutcome,
    FileSummary, LoginRequest, Navigation, Route, SelectedFile, SharedContext, UploadError,
    UploadFlow, UploadRequest, UploadState, ViewResponse,
};
use crate::domain::{human_size, DEFAULT_MEDIA_TYPE};
use base64::Engine;
use hyper::header::{self, HeaderMap, HeaderValue};
use hyper::{Body, Method, Request, Response, StatusCode};
use std::convert::Infallible;
use std::sync::MutexGuard;
use thiserror::Error;

/// Cookie carrying the client's session id
pub const SESSION_COOKIE: &str = "sharecloud_session";

// Room for JSON framing around the base64 payload
const BODY_OVERHEAD: usize = 64 * 1024;

#[derive(Error, Debug)]
pub enum HandlerError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl HandlerError {
    pub fn status(&self) -> StatusCode {
        match self {
            HandlerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            HandlerError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            HandlerError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            HandlerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn into_response(self) -> Response<Body> {
        let body = json::object! { "error" => self.to_string() };
        let mut response = Response::new(Body::from(body.dump()));
        *response.status_mut() = self.status();
        response.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        response
    }
}

impl From<UploadError> for HandlerError {
    fn from(e: UploadError) -> Self {
        match e {
            UploadError::TooLarge { .. } => HandlerError::PayloadTooLarge(e.to_string()),
            _ => HandlerError::BadRequest(e.to_string()),
        }
    }
}

impl From<hyper::Error> for HandlerError {
    fn from(e: hyper::Error) -> Self {
        HandlerError::BadRequest(format!("Failed to read request body: {}", e))
    }
}

impl From<serde_json::Error> for HandlerError {
    fn from(e: serde_json::Error) -> Self {
        HandlerError::BadRequest(format!("Invalid JSON: {}", e))
    }
}

impl From<hyper::http::Error> for HandlerError {
    fn from(e: hyper::http::Error) -> Self {
        HandlerError::Internal(e.to_string())
    }
}

fn lock(ctx: &SharedContext) -> Result<MutexGuard<'_, AppContext>, HandlerError> {
    ctx.lock()
        .map_err(|_| HandlerError::Internal("application state lock poisoned".to_string()))
}

/// Entry point for every HTTP request.
///
/// Issues a session cookie to clients that do not carry one yet; errors are
/// turned into JSON error documents, so this never fails.
pub async fn handle_request(
    ctx: SharedContext,
    req: Request<Body>,
) -> Result<Response<Body>, Infallible> {
    let (session_id, issued) = match session_from_headers(req.headers()) {
        Some(id) => (id, false),
        None => (new_session_id(), true),
    };

    let method = req.method().clone();
    let path = req.uri().path().to_string();
    tracing::info!(%method, %path, "Request received");

    let mut response = match dispatch(&ctx, &session_id, req).await {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!(%method, %path, error = %e, "Request failed");
            e.into_response()
        }
    };

    // A login that rotated the session has already set its own cookie
    if issued && !response.headers().contains_key(header::SET_COOKIE) {
        set_session_cookie(&mut response, &session_id);
    }

    Ok(response)
}

async fn dispatch(
    ctx: &SharedContext,
    session_id: &str,
    req: Request<Body>,
) -> Result<Response<Body>, HandlerError> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let query = req.uri().query().map(str::to_string);
    let segments: Vec<&str> = path.trim_matches('/').split('/').collect();

    match (&method, segments.as_slice()) {
        (&Method::POST, [""]) => upload_file(ctx, req).await,
        (&Method::GET, ["file", id, "download"]) => download_file(ctx, id),
        (&Method::POST, ["login"]) => login(ctx, session_id, req).await,
        (&Method::POST, ["logout"]) => logout(ctx, session_id),
        (&Method::DELETE, ["dashboard", "files", id]) => {
            delete_file(ctx, session_id, id, query.as_deref())
        }
        (&Method::GET, _) => render(ctx, session_id, &path),
        _ => Err(HandlerError::MethodNotAllowed),
    }
}

/// GET on a view route, with the dashboard/login redirects applied
fn render(ctx: &SharedContext, session_id: &str, path: &str) -> Result<Response<Body>, HandlerError> {
    let context = lock(ctx)?;

    match navigate(path, context.sessions.is_authenticated(session_id)) {
        Navigation::Redirect(route) => redirect(&route),
        Navigation::Render(Route::Upload) => json_response(
            StatusCode::OK,
            &ViewResponse::Upload {
                max_upload_bytes: context.config.max_upload_bytes,
                max_upload_label: human_size(context.config.max_upload_bytes as u64),
            },
        ),
        Navigation::Render(Route::File(id)) => match context.store.get(&id) {
            Some(record) => json_response(
                StatusCode::OK,
                &ViewResponse::File {
                    file: FileSummary::from(record),
                    download_path: format!("/file/{}/download", id),
                },
            ),
            None => json_response(StatusCode::NOT_FOUND, &ViewResponse::file_not_found(&id)),
        },
        Navigation::Render(Route::Login) => {
            json_response(StatusCode::OK, &ViewResponse::Login { error: None })
        }
        Navigation::Render(Route::Dashboard) => json_response(
            StatusCode::OK,
            &ViewResponse::dashboard(context.store.list_recent_first()),
        ),
        Navigation::Render(Route::NotFound(path)) => {
            json_response(StatusCode::NOT_FOUND, &ViewResponse::not_found(&path))
        }
    }
}

async fn upload_file(ctx: &SharedContext, req: Request<Body>) -> Result<Response<Body>, HandlerError> {
    let settings = lock(ctx)?.upload_settings();
    let body_limit = settings.max_bytes / 3 * 4 + 4 + BODY_OVERHEAD;

    if content_length(req.headers()).map_or(false, |len| len > body_limit) {
        return Err(HandlerError::PayloadTooLarge(format!(
            "request body exceeds {} bytes",
            body_limit
        )));
    }

    let body = hyper::body::to_bytes(req.into_body()).await?;
    if body.len() > body_limit {
        return Err(HandlerError::PayloadTooLarge(format!(
            "request body exceeds {} bytes",
            body_limit
        )));
    }

    let request: UploadRequest = serde_json::from_slice(&body)?;
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(request.content.trim())
        .map_err(UploadError::from)?;

    tracing::info!(name = %request.file_name, size = bytes.len(), "Upload started");

    let public_url = settings.public_url.clone();
    let flow = UploadFlow::new(settings);
    let mut updates = flow.subscribe();
    let file = SelectedFile {
        name: request.file_name,
        media_type: request.media_type,
        bytes,
    };

    let submitted = flow.execute(file, |build| {
        let mut context = lock(ctx)?;
        let id = context.store.next_id();
        let record = build(&id);
        context.store.upload(record.clone());
        Ok::<_, HandlerError>(record)
    });
    tokio::pin!(submitted);

    // Follow the progress indicator until the record is submitted
    let mut progress = 0;
    let record = loop {
        tokio::select! {
            result = &mut submitted => break result?,
            Ok(()) = updates.changed() => {
                if let UploadState::Uploading { progress: value } = *updates.borrow_and_update() {
                    progress = value;
                }
            }
        }
    };

    let share_url = match flow.state() {
        UploadState::Completed { share_url, .. } => share_url,
        _ => upload::share_url(&public_url, &record.id),
    };

    json_response(
        StatusCode::CREATED,
        &ViewResponse::UploadComplete {
            file: FileSummary::from(&record),
            share_url,
            progress,
        },
    )
}

fn download_file(ctx: &SharedContext, id: &str) -> Result<Response<Body>, HandlerError> {
    let outcome = {
        let mut context = lock(ctx)?;
        download(&mut context.store, id)
    };

    match outcome {
        DownloadOutcome::NotFound => {
            json_response(StatusCode::NOT_FOUND, &ViewResponse::file_not_found(id))
        }
        DownloadOutcome::Unavailable { record, message } => json_response(
            StatusCode::OK,
            &ViewResponse::ContentUnavailable {
                file: FileSummary::from(&record),
                message,
            },
        ),
        DownloadOutcome::Ready { payload, .. } => {
            tracing::info!(id = %id, name = %payload.file_name, "Serving download");
            let content_type = HeaderValue::from_str(&payload.media_type)
                .unwrap_or_else(|_| HeaderValue::from_static(DEFAULT_MEDIA_TYPE));

            Ok(Response::builder()
                .status(StatusCode::OK)
                .header(header::CONTENT_TYPE, content_type)
                .header(
                    header::CONTENT_DISPOSITION,
                    content_disposition(&payload.file_name),
                )
                .header(header::ETAG, format!("\"{}\"", payload.digest))
                .header(header::CONTENT_LENGTH, payload.bytes.len())
                .body(Body::from(payload.bytes))?)
        }
    }
}

async fn login(
    ctx: &SharedContext,
    session_id: &str,
    req: Request<Body>,
) -> Result<Response<Body>, HandlerError> {
    let body = hyper::body::to_bytes(req.into_body()).await?;
    let form: LoginRequest = serde_json::from_slice(&body)?;

    let mut context = lock(ctx)?;

    if context.sessions.is_authenticated(session_id) {
        return redirect(&Route::Dashboard);
    }

    // Authenticated sessions always run under a server-issued id
    let rotated = new_session_id();
    match context.sessions.login(&rotated, &form.email, &form.password) {
        Ok(()) => {
            tracing::info!("Admin session started");
            let mut response = redirect(&Route::Dashboard)?;
            set_session_cookie(&mut response, &rotated);
            Ok(response)
        }
        Err(e) => {
            tracing::warn!(error = %e, "Admin login rejected");
            json_response(
                StatusCode::UNAUTHORIZED,
                &ViewResponse::Login {
                    error: Some(e.to_string()),
                },
            )
        }
    }
}

fn logout(ctx: &SharedContext, session_id: &str) -> Result<Response<Body>, HandlerError> {
    if lock(ctx)?.sessions.logout(session_id) {
        tracing::info!("Admin session ended");
    }
    redirect(&Route::Upload)
}

fn delete_file(
    ctx: &SharedContext,
    session_id: &str,
    id: &str,
    query: Option<&str>,
) -> Result<Response<Body>, HandlerError> {
    let mut context = lock(ctx)?;

    if !context.sessions.is_authenticated(session_id) {
        return redirect(&Route::Login);
    }

    let confirmation = match query_param(query, "confirm") {
        Some("yes") | Some("true") => Confirmation::Confirmed,
        Some(_) => Confirmation::Declined,
        None => {
            return match context.store.get(id) {
                Some(record) => json_response(
                    StatusCode::OK,
                    &ViewResponse::ConfirmDelete {
                        id: id.to_string(),
                        original_name: record.original_name.clone(),
                        prompt: format!(
                            "Are you sure you want to delete {}?",
                            record.original_name
                        ),
                        confirm_path: format!("/dashboard/files/{}?confirm=yes", id),
                        decline_path: format!("/dashboard/files/{}?confirm=no", id),
                    },
                ),
                None => delete_result(id, DeleteStatus::NotFound),
            };
        }
    };

    let status = match context.store.delete(id, confirmation) {
        DeleteOutcome::Deleted(_) => DeleteStatus::Deleted,
        DeleteOutcome::Declined => DeleteStatus::Declined,
        DeleteOutcome::NotFound => DeleteStatus::NotFound,
    };

    delete_result(id, status)
}

fn delete_result(id: &str, outcome: DeleteStatus) -> Result<Response<Body>, HandlerError> {
    json_response(
        StatusCode::OK,
        &ViewResponse::DeleteResult {
            id: id.to_string(),
            outcome,
        },
    )
}

fn json_response(status: StatusCode, view: &ViewResponse) -> Result<Response<Body>, HandlerError> {
    let body = serde_json::to_string(view)?;
    Ok(Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body))?)
}

fn redirect(route: &Route) -> Result<Response<Body>, HandlerError> {
    let location = route.path();
    let body = serde_json::to_string(&ViewResponse::Redirect {
        location: location.clone(),
    })?;

    Ok(Response::builder()
        .status(StatusCode::SEE_OTHER)
        .header(header::LOCATION, location)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body))?)
}

fn new_session_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

fn set_session_cookie(response: &mut Response<Body>, session_id: &str) {
    let cookie = format!("{}={}; Path=/; HttpOnly; SameSite=Lax", SESSION_COOKIE, session_id);
    if let Ok(value) = HeaderValue::from_str(&cookie) {
        response.headers_mut().insert(header::SET_COOKIE, value);
    }
}

fn session_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|cookies| cookies.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == SESSION_COOKIE && is_session_id(value))
        .map(|(_, value)| value.to_string())
}

fn is_session_id(value: &str) -> bool {
    !value.is_empty() && value.len() <= 64 && value.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}

fn content_length(headers: &HeaderMap) -> Option<usize> {
    headers
        .get(header::CONTENT_LENGTH)?
        .to_str()
        .ok()?
        .parse()
        .ok()
}

fn query_param<'a>(query: Option<&'a str>, name: &str) -> Option<&'a str> {
    query?
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
}

/// `attachment` disposition with an ASCII fallback name and the exact name
/// percent-encoded as UTF-8
fn content_disposition(file_name: &str) -> String {
    let fallback: String = file_name
        .chars()
        .map(|c| {
            if (c.is_ascii_graphic() && c != '"' && c != '\\') || c == ' ' {
                c
            } else {
                '_'
            }
        })
        .collect();

    let mut encoded = String::with_capacity(file_name.len());
    for byte in file_name.bytes() {
        if byte.is_ascii_alphanumeric() || b"-._~".contains(&byte) {
            encoded.push(byte as char);
        } else {
            encoded.push_str(&format!("%{:02X}", byte));
        }
    }

    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback, encoded
    )
}
