use crate::{
    error::{Result, ServiceError},
    service::AudioService,
    types::{parse_stem_list, OutputFormat, SeparateParams, UploadedFile},
    workspace::JobId,
};
use axum::{
    body::Body,
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde_json::json;
use std::{collections::HashMap, net::SocketAddr, sync::Arc};
use tokio_util::io::ReaderStream;
use tracing::{error, info, warn};

#[derive(Clone)]
pub struct AppState {
    service: Arc<AudioService>,
}

pub fn router(service: Arc<AudioService>, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/api/health", get(health))
        .route("/api/models", get(models))
        .route("/api/separate", post(separate))
        .route("/api/master", post(master))
        .route("/api/download/:job_id/:filename", get(download))
        .route("/api/cleanup/:job_id", delete(cleanup))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(axum::middleware::map_response(allow_any_origin))
        .with_state(AppState { service })
}

pub async fn run_server(
    listen_addr: &str,
    service: Arc<AudioService>,
    max_upload_bytes: usize,
) -> anyhow::Result<()> {
    let addr: SocketAddr = listen_addr
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid listen_addr {listen_addr}: {e}"))?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "audio service listening");

    axum::serve(listener, router(service, max_upload_bytes)).await?;
    Ok(())
}

async fn allow_any_origin(mut res: Response) -> Response {
    res.headers_mut()
        .insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    res
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = match &self {
            ServiceError::NotFound => StatusCode::NOT_FOUND,
            ServiceError::BadRequest(_) | ServiceError::UnsupportedFormat(_) => {
                StatusCode::BAD_REQUEST
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(json!({ "detail": self.to_string() }))).into_response()
    }
}

/// Runs blocking service work off the async workers.
async fn blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ServiceError::Anyhow(anyhow::anyhow!("worker task failed: {e}")))?
}

async fn root() -> impl IntoResponse {
    Json(json!({
        "service": "Stem Splitter Audio Service",
        "status": "running",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "health": "/api/health",
            "models": "/api/models",
            "separate": "/api/separate",
            "master": "/api/master",
            "download": "/api/download/{job_id}/{filename}",
            "cleanup": "/api/cleanup/{job_id}",
        }
    }))
}

async fn health(State(st): State<AppState>) -> Response {
    let service = st.service.clone();
    match blocking(move || service.health()).await {
        Ok(report) => Json(report).into_response(),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "unhealthy", "error": e.to_string() })),
        )
            .into_response(),
    }
}

async fn models(State(st): State<AppState>) -> Result<Response> {
    let service = st.service.clone();
    let listing = blocking(move || service.models())
        .await
        .inspect_err(|e| {
            error!("Failed to list models: {e}");
        })?;
    Ok(Json(listing).into_response())
}

/// Multipart form split into files and plain text fields.
#[derive(Default)]
struct Form {
    files: HashMap<String, UploadedFile>,
    fields: HashMap<String, String>,
}

impl Form {
    async fn read(mut multipart: Multipart) -> Result<Self> {
        let mut form = Form::default();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ServiceError::BadRequest(e.body_text()))?
        {
            let name = field.name().unwrap_or_default().to_string();
            let filename = field.file_name().map(str::to_string);
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ServiceError::BadRequest(e.body_text()))?;

            match filename {
                Some(filename) => {
                    form.files.insert(
                        name,
                        UploadedFile {
                            filename,
                            bytes: bytes.to_vec(),
                        },
                    );
                }
                None => {
                    form.fields
                        .insert(name, String::from_utf8_lossy(&bytes).into_owned());
                }
            }
        }
        Ok(form)
    }

    fn file(&mut self, name: &str) -> Result<UploadedFile> {
        self.files
            .remove(name)
            .ok_or_else(|| ServiceError::BadRequest(format!("missing file field `{name}`")))
    }

    fn text(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
    }

    fn output_format(&self) -> Result<OutputFormat> {
        self.text("output_format")
            .map(str::parse::<OutputFormat>)
            .transpose()
            .map(Option::unwrap_or_default)
    }
}

async fn separate(State(st): State<AppState>, multipart: Multipart) -> Result<Response> {
    let mut form = Form::read(multipart).await?;
    let file = form.file("file")?;
    let params = SeparateParams {
        model: form
            .text("model")
            .unwrap_or(st.service.recommended_model())
            .to_string(),
        stems: parse_stem_list(form.text("stems")),
        output_format: form.output_format()?,
    };

    let service = st.service.clone();
    let result = blocking(move || service.separate(file, params)).await?;
    Ok(Json(result).into_response())
}

async fn master(State(st): State<AppState>, multipart: Multipart) -> Result<Response> {
    let mut form = Form::read(multipart).await?;
    let target = form.file("target")?;
    let reference = form.file("reference")?;
    let format = form.output_format()?;

    let service = st.service.clone();
    let result = blocking(move || service.master(target, reference, format)).await?;
    Ok(Json(result).into_response())
}

async fn download(
    State(st): State<AppState>,
    Path((job_id, filename)): Path<(String, String)>,
) -> Result<Response> {
    let job_id: JobId = job_id.parse()?;
    let service = st.service.clone();
    let name = filename.clone();
    let path = blocking(move || service.locate(job_id, &name))
        .await
        .inspect_err(|_| {
            warn!(%job_id, %filename, "download target not found");
        })?;

    let file = tokio::fs::File::open(&path).await?;
    let len = file.metadata().await?.len();
    let mime = path
        .extension()
        .and_then(|e| e.to_str())
        .and_then(OutputFormat::from_extension)
        .map(OutputFormat::mime_type)
        .unwrap_or("application/octet-stream");

    Ok((
        [
            (header::CONTENT_TYPE, mime.to_string()),
            (header::CONTENT_LENGTH, len.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        Body::from_stream(ReaderStream::new(file)),
    )
        .into_response())
}

async fn cleanup(State(st): State<AppState>, Path(job_id): Path<String>) -> Result<Response> {
    let job_id: JobId = job_id.parse()?;
    let service = st.service.clone();
    blocking(move || service.cleanup(job_id)).await?;
    Ok(Json(json!({
        "success": true,
        "message": format!("Cleaned up job {job_id}"),
    }))
    .into_response())
}
