//! HTTP server for the sheetsum API.
//!
//! Upload a spreadsheet, pick a transformation, get the converted
//! workbook back as a download.
//!
//! # API Endpoints
//!
//! | Method | Path           | Description                              |
//! |--------|----------------|------------------------------------------|
//! | GET    | `/health`      | Health check                             |
//! | POST   | `/api/convert` | Upload, transform, download the artifact |
//! | POST   | `/api/inspect` | Upload, return parsing metadata          |
//! | GET    | `/api/logs`    | SSE stream for real-time logs            |

use axum::{
    extract::{Multipart, State},
    http::{header, Method, StatusCode},
    response::{sse::Event, IntoResponse, Json, Response, Sse},
    routing::{get, post},
    Router,
};
use futures::stream::Stream;
use serde_json::{json, Value};
use std::{convert::Infallible, net::SocketAddr, path::PathBuf, time::Duration};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;
use tower_http::cors::CorsLayer;

use super::logs::LOG_BROADCASTER;
use super::types::{error_response, sanitize_output_name, InspectResponse};
use crate::error::{PipelineError, ServerError};
use crate::models::TransformKind;
use crate::reader;
use crate::transform::pipeline::{run_bytes, RunOptions, TableInfo};

const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

#[derive(Clone)]
struct AppState {
    output_dir: PathBuf,
}

/// Start the HTTP server.
pub async fn start_server(port: u16, output_dir: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    // Permissive CORS for development
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::CONTENT_TYPE, header::CONTENT_DISPOSITION]);

    let state = AppState {
        output_dir: output_dir.clone(),
    };

    let app = Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/api/convert", post(convert))
        .route("/api/inspect", post(inspect))
        .route("/api/logs", get(sse_logs))
        .with_state(state)
        .layer(cors);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    println!("🚀 Sheetsum server running on http://localhost:{}", port);
    println!("   POST /api/convert - Upload, transform, download");
    println!("   POST /api/inspect - Upload, show parsing metadata");
    println!("   GET  /api/logs    - SSE log stream");
    println!("   GET  /health      - Health check");
    println!();
    println!("📁 Artifacts directory: {}", output_dir.display());

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Health check endpoint.
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "sheetsum",
        "version": env!("CARGO_PKG_VERSION"),
        "transformations": TransformKind::all()
            .iter()
            .map(|k| k.selector())
            .collect::<Vec<_>>(),
    }))
}

/// SSE endpoint for real-time log streaming.
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

/// Fields collected from a multipart upload.
#[derive(Default)]
struct UploadForm {
    file_data: Option<Vec<u8>>,
    file_name: Option<String>,
    transformation: Option<String>,
    output_name: Option<String>,
}

async fn read_form(multipart: &mut Multipart) -> Result<UploadForm, ServerError> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServerError::BadRequest(format!("Multipart error: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "file" => {
                form.file_name = field.file_name().map(|s| s.to_string());
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ServerError::BadRequest(format!("Read error: {}", e)))?;
                form.file_data = Some(bytes.to_vec());
            }
            "transformation" => {
                form.transformation = Some(read_text_field(field).await?);
            }
            "output_name" => {
                form.output_name = Some(read_text_field(field).await?);
            }
            _ => {}
        }
    }

    Ok(form)
}

async fn read_text_field(field: axum::extract::multipart::Field<'_>) -> Result<String, ServerError> {
    field
        .text()
        .await
        .map_err(|e| ServerError::BadRequest(format!("Read error: {}", e)))
}

/// Upload + transform + download endpoint.
async fn convert(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Response, (StatusCode, Json<Value>)> {
    let form = read_form(&mut multipart).await.map_err(error_reply)?;

    let bytes = form
        .file_data
        .ok_or_else(|| error_reply(ServerError::BadRequest("No file provided".into())))?;
    let selector = form
        .transformation
        .ok_or_else(|| error_reply(ServerError::BadRequest("No transformation selected".into())))?;

    // Resolve the selector before touching the upload
    let kind = TransformKind::from_selector(&selector)
        .map_err(|e| error_reply(ServerError::Pipeline(PipelineError::Transform(e))))?;

    let output_name = sanitize_output_name(form.output_name.as_deref().unwrap_or("processed"));

    println!(
        "\n📄 NEW UPLOAD: {} ({} bytes, {})",
        form.file_name.as_deref().unwrap_or("unknown"),
        bytes.len(),
        kind
    );

    let options = RunOptions::new(kind, state.output_dir.clone(), output_name.clone());
    let report = run_bytes(&bytes, &options)
        .map_err(|e| error_reply(ServerError::Pipeline(e)))?;

    let artifact = tokio::fs::read(&report.artifact)
        .await
        .map_err(|e| error_reply(ServerError::Internal(e.to_string())))?;

    let headers = [
        (header::CONTENT_TYPE, XLSX_CONTENT_TYPE.to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}.xlsx\"", output_name),
        ),
    ];

    Ok((headers, artifact).into_response())
}

/// Upload + parsing metadata endpoint.
async fn inspect(
    State(_state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<InspectResponse>, (StatusCode, Json<Value>)> {
    let form = read_form(&mut multipart).await.map_err(error_reply)?;

    let bytes = form
        .file_data
        .ok_or_else(|| error_reply(ServerError::BadRequest("No file provided".into())))?;

    let table = reader::read_bytes(&bytes)
        .map_err(|e| error_reply(ServerError::Pipeline(PipelineError::Read(e))))?;

    let info = TableInfo::from(&table);
    Ok(Json(InspectResponse::new(&info, form.file_name)))
}

/// Map a server error to an HTTP status and JSON body.
fn error_reply(err: ServerError) -> (StatusCode, Json<Value>) {
    let status = match &err {
        // Write failures are the server's problem; everything else is the upload's
        ServerError::Pipeline(PipelineError::Write(_)) => StatusCode::INTERNAL_SERVER_ERROR,
        ServerError::Pipeline(_) => StatusCode::BAD_REQUEST,
        ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
        ServerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    eprintln!("❌ {}", err);
    (status, Json(error_response(&err.to_string())))
}
