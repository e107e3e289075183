use crate::advisor::AdvisoryRequest;
use crate::error::ApiError;
use crate::outcome::AdvisoryOutcome;
use crate::page::{self, Notice, PageView};
use crate::state::{SessionState, SharedState};
use crate::upload::{store_upload, UploadedDocument};
use crate::workspace::reset_workspace;
use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Form, Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

#[derive(Debug, Deserialize)]
pub struct GenerateForm {
    #[serde(default)]
    pub keyword: String,
}

#[derive(Debug, Deserialize)]
pub struct AdvisePayload {
    #[serde(default)]
    pub keyword: String,
}

/// Body of a JSON upload: the stored document plus any cleanup warnings.
#[derive(Debug, Serialize)]
pub struct UploadReceipt {
    pub document: UploadedDocument,
    pub warnings: Vec<String>,
}

fn html_page(status: StatusCode, view: PageView<'_>) -> Response {
    (status, Html(page::render(&view))).into_response()
}

/// Cleanup warnings become page notices; a hard failure becomes an error notice.
async fn reset_notices(state: &SharedState) -> Vec<Notice> {
    match reset_workspace(&state.config.data_dir).await {
        Ok(report) => report.warnings.into_iter().map(Notice::warning).collect(),
        Err(e) => {
            log::error!("Workspace reset failed: {:#}", e);
            vec![Notice::error(format!("{e:#}"))]
        }
    }
}

/// Starts a new session: empty scratch directory, no document.
pub async fn index(State(state): State<SharedState>) -> Response {
    let notices = reset_notices(&state).await;
    *state.session.write().await = SessionState::Idle;

    html_page(StatusCode::OK, PageView { notices, ..PageView::default() })
}

async fn read_file_field(multipart: &mut Multipart) -> Result<Option<(String, Vec<u8>)>, String> {
    while let Some(field) = multipart.next_field().await.map_err(|e| e.body_text())? {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let bytes = field.bytes().await.map_err(|e| e.body_text())?;
        return Ok(Some((filename, bytes.to_vec())));
    }
    Ok(None)
}

/// Replaces whatever the session held with the uploaded file.
pub async fn upload(State(state): State<SharedState>, mut multipart: Multipart) -> Response {
    let (filename, bytes) = match read_file_field(&mut multipart).await {
        Ok(Some(file)) => file,
        Ok(None) => {
            return html_page(
                StatusCode::BAD_REQUEST,
                PageView { notices: vec![Notice::error("No file provided.")], ..PageView::default() },
            )
        }
        Err(e) => {
            log::warn!("Failed to read upload: {}", e);
            return html_page(
                StatusCode::BAD_REQUEST,
                PageView { notices: vec![Notice::error(format!("Failed to read file data: {e}"))], ..PageView::default() },
            );
        }
    };

    let mut session = state.session.write().await;
    let mut notices = reset_notices(&state).await;
    *session = SessionState::Idle;

    match store_upload(&state.config.data_dir, &filename, &bytes).await {
        Ok(doc) => {
            notices.push(Notice::success("File successfully saved"));
            *session = SessionState::Ready(doc);
            html_page(StatusCode::OK, PageView { document: session.document(), notices, ..PageView::default() })
        }
        Err(e) => {
            log::error!("Upload failed: {:#}", e);
            notices.push(Notice::error(format!("{e:#}")));
            html_page(StatusCode::BAD_REQUEST, PageView { notices, ..PageView::default() })
        }
    }
}

/// JSON counterpart of `upload`.
pub async fn api_upload(
    State(state): State<SharedState>,
    mut multipart: Multipart,
) -> Result<Json<UploadReceipt>, ApiError> {
    let (filename, bytes) = read_file_field(&mut multipart)
        .await
        .map_err(ApiError::BadRequest)?
        .ok_or_else(|| ApiError::BadRequest("No file provided".to_string()))?;

    let mut session = state.session.write().await;
    *session = SessionState::Idle;
    let report = reset_workspace(&state.config.data_dir)
        .await
        .map_err(|e| ApiError::internal(format!("{e:#}")))?;

    let doc = store_upload(&state.config.data_dir, &filename, &bytes)
        .await
        .map_err(|e| ApiError::BadRequest(format!("{e:#}")))?;
    *session = SessionState::Ready(doc.clone());

    Ok(Json(UploadReceipt {
        document: doc,
        warnings: report.warnings,
    }))
}

async fn run_advisory(state: &SharedState, document: &UploadedDocument, keyword: &str) -> AdvisoryOutcome {
    let request = AdvisoryRequest::new(&document.path, keyword);
    let outcome = AdvisoryOutcome::from(state.pipeline.advise(&request).await);

    match &outcome {
        AdvisoryOutcome::Success { text } => log::info!("Generated {} characters of suggestions", text.len()),
        AdvisoryOutcome::UnsupportedType { message } => log::error!("{}: {}", document.filename, message),
        AdvisoryOutcome::UpstreamError { detail } => log::error!("Advisory request failed: {}", detail),
    }
    outcome
}

pub async fn generate(State(state): State<SharedState>, Form(form): Form<GenerateForm>) -> Response {
    let Some(document) = state.current_document().await else {
        return html_page(
            StatusCode::CONFLICT,
            PageView {
                notices: vec![Notice::error("Upload your company documentation first.")],
                ..PageView::default()
            },
        );
    };

    let outcome = run_advisory(&state, &document, &form.keyword).await;
    let status = outcome.status_code();

    let view = PageView {
        document: Some(&document),
        keyword: &form.keyword,
        notices: match &outcome {
            AdvisoryOutcome::Success { .. } => Vec::new(),
            AdvisoryOutcome::UnsupportedType { message } => vec![Notice::error(message.clone())],
            AdvisoryOutcome::UpstreamError { detail } => vec![Notice::error(detail.clone())],
        },
        output: match &outcome {
            AdvisoryOutcome::Success { text } => Some(text.as_str()),
            _ => None,
        },
    };
    html_page(status, view)
}

pub async fn api_advise(
    State(state): State<SharedState>,
    Json(payload): Json<AdvisePayload>,
) -> Result<AdvisoryOutcome, ApiError> {
    let document = state
        .current_document()
        .await
        .ok_or_else(|| ApiError::Conflict("No document has been uploaded".to_string()))?;

    Ok(run_advisory(&state, &document, &payload.keyword).await)
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
