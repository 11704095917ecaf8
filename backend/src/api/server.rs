//! HTTP Server for the quizstats API.
//!
//! # API Endpoints
//!
//! | Method | Path                 | Description                                      |
//! |--------|----------------------|--------------------------------------------------|
//! | GET    | `/health`            | Health check                                     |
//! | POST   | `/process`           | Convert `file` using the supplied `test_id`      |
//! | POST   | `/process/generate`  | Convert `file` with a generated `test_id`        |
//! | GET    | `/api/logs`          | SSE stream for real-time logs                    |
//!
//! `/process` answers with a `result.json` download holding a one-element
//! array; `/process/generate` answers with the bare document.

use axum::{
    extract::{multipart::MultipartError, DefaultBodyLimit, Multipart},
    http::{header, Method, StatusCode},
    response::{sse::Event, IntoResponse, Json, Response, Sse},
    routing::{get, post},
    Router,
};
use futures::stream::Stream;
use std::{convert::Infallible, io::Write, time::Duration};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;
use tower_http::cors::CorsLayer;
use uuid::Uuid;

use super::logs::{log_error, log_info, LOG_BROADCASTER};
use super::types::{fields, HealthResponse, RESULT_FILE_NAME};
use crate::config::Config;
use crate::error::{PipelineError, ServerError, ServerResult};
use crate::models::StatsDocument;
use crate::parser::SheetFormat;
use crate::transform::document::IdPolicy;
use crate::transform::pipeline::{process_bytes, process_file, ProcessOptions};

/// Build the application router.
pub fn router(config: &Config) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::CONTENT_TYPE, header::CONTENT_DISPOSITION]);

    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/process", post(process_with_test_id))
        .route("/process/generate", post(process_with_generated_id))
        .route("/api/logs", get(sse_logs))
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(cors)
}

/// Start the HTTP server
pub async fn start_server(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let app = router(&config);
    let addr = config.addr();

    println!("🚀 Quizstats server running on http://{}", addr);
    println!("   POST /process          - Convert spreadsheet (file + test_id)");
    println!("   POST /process/generate - Convert spreadsheet (generated test_id)");
    println!("   GET  /api/logs         - SSE log stream");
    println!("   GET  /health           - Health check");
    println!();

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Health check endpoint
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}

/// SSE endpoint for real-time log streaming
async fn sse_logs() -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = LOG_BROADCASTER.subscribe();

    let stream = BroadcastStream::new(rx).filter_map(|result| {
        let entry = result.ok()?;
        let json = serde_json::to_string(&entry).ok()?;
        Some(Ok(Event::default().data(json)))
    });

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

// =============================================================================
// Conversion endpoints
// =============================================================================

/// An uploaded spreadsheet.
struct UploadedFile {
    name: Option<String>,
    bytes: Vec<u8>,
}

impl UploadedFile {
    fn format(&self) -> SheetFormat {
        SheetFormat::detect(self.name.as_deref(), &self.bytes)
    }
}

/// Form fields of a conversion request.
#[derive(Default)]
struct UploadForm {
    file: Option<UploadedFile>,
    test_id: Option<String>,
}

impl UploadForm {
    async fn read(mut multipart: Multipart) -> ServerResult<Self> {
        let mut form = Self::default();

        while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
            let name = field.name().unwrap_or("").to_string();
            match name.as_str() {
                fields::FILE => {
                    let name = field.file_name().map(|s| s.to_string());
                    let bytes = field.bytes().await.map_err(multipart_error)?.to_vec();
                    form.file = Some(UploadedFile { name, bytes });
                }
                fields::TEST_ID => {
                    form.test_id = Some(field.text().await.map_err(multipart_error)?);
                }
                _ => {}
            }
        }

        Ok(form)
    }

    fn take_file(&mut self) -> ServerResult<UploadedFile> {
        self.file
            .take()
            .ok_or_else(|| ServerError::MissingFormField(fields::FILE.to_string()))
    }
}

fn multipart_error(e: MultipartError) -> ServerError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ServerError::PayloadTooLarge(e.body_text())
    } else {
        ServerError::BadRequest(format!("Multipart error: {}", e.body_text()))
    }
}

/// `POST /process`: caller supplies `test_id`, result comes back as a file.
async fn process_with_test_id(multipart: Multipart) -> ServerResult<Response> {
    let mut form = UploadForm::read(multipart).await?;

    let test_id = form
        .test_id
        .as_deref()
        .ok_or_else(|| ServerError::MissingFormField(fields::TEST_ID.to_string()))?;
    let policy = IdPolicy::supplied(test_id).map_err(|e| {
        log_error(format!("Rejected test_id '{}'", e.value));
        e
    })?;
    let file = form.take_file()?;

    announce(&file);
    let body = run_blocking(move || export_via_scratch_files(file, policy)).await?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/json".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", RESULT_FILE_NAME),
            ),
        ],
        body,
    )
        .into_response())
}

/// `POST /process/generate`: both identifiers generated, any `test_id` ignored.
async fn process_with_generated_id(multipart: Multipart) -> ServerResult<Json<StatsDocument>> {
    let mut form = UploadForm::read(multipart).await?;
    let file = form.take_file()?;

    announce(&file);
    let document = run_blocking(move || {
        let result = process_bytes(
            &file.bytes,
            file.name.as_deref(),
            IdPolicy::Generate,
            ProcessOptions::default(),
        )?;
        Ok(result.document)
    })
    .await?;

    Ok(Json(document))
}

fn announce(file: &UploadedFile) {
    log_info(format!(
        "📄 NEW UPLOAD [{}]: {} ({} bytes)",
        Uuid::new_v4(),
        file.name.as_deref().unwrap_or("unknown"),
        file.bytes.len()
    ));
}

/// Run a conversion off the async workers, logging failures.
async fn run_blocking<T, F>(job: F) -> ServerResult<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, PipelineError> + Send + 'static,
{
    let outcome = tokio::task::spawn_blocking(job)
        .await
        .map_err(|e| ServerError::Internal(e.to_string()))?;

    outcome.map_err(|e| {
        log_error(format!("Processing error: {}", e));
        ServerError::from(e)
    })
}

/// Write the upload to a scratch file, convert it, render the export into a
/// second scratch file and read it back. Both files are removed when their
/// handles drop, whichever way this function returns.
fn export_via_scratch_files(file: UploadedFile, policy: IdPolicy) -> Result<Vec<u8>, PipelineError> {
    let mut input = tempfile::Builder::new()
        .prefix("quizstats-upload-")
        .suffix(&format!(".{}", file.format()))
        .tempfile()?;
    input.write_all(&file.bytes)?;
    input.flush()?;

    let result = process_file(input.path(), policy, ProcessOptions::default())?;
    drop(input);

    let mut output = tempfile::Builder::new()
        .prefix("quizstats-output-")
        .suffix(".json")
        .tempfile()?;
    output.write_all(&result.document.to_import_json()?)?;
    output.flush()?;

    Ok(std::fs::read(output.path())?)
}
