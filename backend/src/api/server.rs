//! HTTP server for spreadsheet uploads.
//!
//! # API Endpoints
//!
//! | Method | Path        | Description                                   |
//! |--------|-------------|-----------------------------------------------|
//! | GET    | `/`         | Upload form                                   |
//! | GET    | `/health`   | Health check                                  |
//! | POST   | `/convert`  | Convert uploaded `files` to CSV (or ZIP)      |
//! | GET    | `/api/logs` | SSE stream of conversion logs                 |

use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::{header, Method},
    response::{sse::Event, Html, IntoResponse, Json, Response, Sse},
    routing::{get, post},
    Router,
};
use futures::stream::Stream;
use serde_json::{json, Value};
use std::{convert::Infallible, path::PathBuf, sync::Arc, time::Duration};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;
use tower_http::cors::CorsLayer;

use super::bundle::{zip_bundle, BUNDLE_NAME};
use super::logs::{
    log_error, log_info, log_success, log_success_indent, log_warning_indent, LOG_BROADCASTER,
};
use super::upload::{UploadWorkspace, UploadedFile};
use crate::config::Config;
use crate::convert::Converter;
use crate::error::{ConvertError, ServerError, ServerResult};

/// Name of the multipart field carrying the files.
pub const FILES_FIELD: &str = "files";

const INDEX_HTML: &str = include_str!("../../static/index.html");

/// Shared handler state.
#[derive(Clone, Debug)]
pub struct AppState {
    pub converter: Arc<Converter>,
}

impl AppState {
    pub fn new(converter: Converter) -> Self {
        Self {
            converter: Arc::new(converter),
        }
    }
}

/// Build the application router.
pub fn router(state: AppState, max_upload_bytes: usize) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::CONTENT_TYPE, header::CONTENT_DISPOSITION]);

    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/convert", post(convert_upload))
        .route("/api/logs", get(sse_logs))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(cors)
        .with_state(state)
}

/// Start the HTTP server
pub async fn start_server(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let converter = Converter::new(config.decoder_chain()?);
    let app = router(AppState::new(converter), config.max_upload_bytes);

    let addr = config.addr();
    println!("🚀 xls2csv server running on http://{}", addr);
    println!("   GET  /          - Upload form");
    println!("   POST /convert   - Convert .xls/.xlsx files (field: files)");
    println!("   GET  /api/logs  - SSE log stream");
    println!("   GET  /health    - Health check");
    println!();
    println!("📝 Encodings tried for HTML exports: {}", config.encodings.join(", "));
    println!("📦 Max upload size: {} bytes", config.max_upload_bytes);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// Health check endpoint
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "xls2csv",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "convert": "POST /convert",
            "logs": "GET /api/logs (SSE)"
        }
    }))
}

/// SSE endpoint for real-time log streaming
async fn sse_logs() -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = LOG_BROADCASTER.subscribe();

    let stream = BroadcastStream::new(rx).filter_map(|result| match result {
        Ok(entry) => {
            let json = serde_json::to_string(&entry).ok()?;
            Some(Ok(Event::default().data(json)))
        }
        Err(_) => None,
    });

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

/// Upload endpoint
async fn convert_upload(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ServerResult<Response> {
    let uploads = read_uploads(multipart).await.map_err(|e| {
        log_error(format!("Upload rejected: {}", e));
        e
    })?;
    respond(state.converter.clone(), uploads).await
}

/// Collect every non-empty `files` field from the request.
async fn read_uploads(mut multipart: Multipart) -> ServerResult<Vec<UploadedFile>> {
    let mut uploads = Vec::new();

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILES_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or("").to_string();
        let bytes = field.bytes().await?;
        if file_name.is_empty() {
            continue;
        }
        uploads.push(UploadedFile::new(file_name, bytes.to_vec()));
    }

    Ok(uploads)
}

/// Convert validated uploads and build the download response.
///
/// One valid file gives a CSV attachment; several give a ZIP holding the
/// files that converted. Uploads live in a temp directory that is removed
/// when this function returns, whatever the outcome.
pub async fn respond(
    converter: Arc<Converter>,
    uploads: Vec<UploadedFile>,
) -> ServerResult<Response> {
    if uploads.is_empty() {
        return Err(ServerError::BadRequest("No files uploaded".into()));
    }

    let total = uploads.len();
    let (valid, dropped): (Vec<_>, Vec<_>) = uploads.into_iter().partition(UploadedFile::is_allowed);

    log_info(format!("📄 Upload: {} file(s), {} accepted", total, valid.len()));
    for file in &dropped {
        log_warning_indent(format!("Skipped {} (not .xls/.xlsx)", file.file_name), 1);
    }

    if valid.is_empty() {
        return Err(ServerError::Validation(
            "Please upload .xls or .xlsx files only".into(),
        ));
    }

    let workspace = UploadWorkspace::new().map_err(|e| ServerError::Internal(e.to_string()))?;
    let mut jobs: Vec<(String, String, PathBuf)> = Vec::with_capacity(valid.len());
    for (i, file) in valid.iter().enumerate() {
        let path = workspace
            .save(i, file)
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))?;
        jobs.push((file.file_name.clone(), file.csv_name(), path));
    }

    let single = jobs.len() == 1;
    let results = tokio::task::spawn_blocking(move || convert_all(&converter, jobs))
        .await
        .map_err(|e| ServerError::Internal(e.to_string()))?;

    if single {
        let (source, csv_name, result) = results
            .into_iter()
            .next()
            .ok_or_else(|| ServerError::Internal("missing conversion result".into()))?;
        let csv = result.map_err(|e| {
            log_error(format!("{}: {}", source, e));
            ServerError::Convert(e)
        })?;
        log_success(format!("Sending {}", csv_name));
        return Ok(attachment("text/csv; charset=utf-8", &csv_name, csv));
    }

    let mut entries = Vec::new();
    for (source, csv_name, result) in results {
        match result {
            Ok(csv) => entries.push((csv_name, csv)),
            Err(e) => log_warning_indent(format!("Omitted {} from ZIP: {}", source, e), 1),
        }
    }
    let converted = entries.len();
    let archive = tokio::task::spawn_blocking(move || zip_bundle(&entries))
        .await
        .map_err(|e| ServerError::Internal(e.to_string()))??;

    log_success(format!("Sending {} ({} CSV file(s))", BUNDLE_NAME, converted));
    Ok(attachment("application/zip", BUNDLE_NAME, archive))
}

/// Run conversions one after another; each result stays with its file.
fn convert_all(
    converter: &Converter,
    jobs: Vec<(String, String, PathBuf)>,
) -> Vec<(String, String, Result<Vec<u8>, ConvertError>)> {
    jobs.into_iter()
        .map(|(source, csv_name, path)| {
            let result = converter.convert_file(&path).map(|conversion| {
                log_success_indent(
                    format!(
                        "{} → {} ({}, {} rows)",
                        source, csv_name, conversion.format, conversion.rows
                    ),
                    1,
                );
                conversion.csv
            });
            (source, csv_name, result)
        })
        .collect()
}

fn attachment(content_type: &str, file_name: &str, body: Vec<u8>) -> Response {
    (
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", file_name),
            ),
        ],
        body,
    )
        .into_response()
}
