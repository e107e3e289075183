use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use domain_namer::{
    advisor::AdvisoryPipeline,
    app,
    config::AppConfig,
    outcome::AdvisoryOutcome,
    state::{AppState, SharedState},
};
use http_body_util::BodyExt;
use rag_system::{ChatMessage, CompletionBackend, LlmParams};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tower::ServiceExt;
use zip::write::SimpleFileOptions;

const BOUNDARY: &str = "domain-namer-test-boundary";
const CANNED_TABLE: &str = "| Domain | Extension | Description |\n|---|---|---|\n| orbitly | .com | Short & <catchy> |";

struct FakeModel {
    reply: String,
    requests: Mutex<Vec<Vec<ChatMessage>>>,
}

impl FakeModel {
    fn replying(reply: &str) -> Self {
        Self { reply: reply.to_string(), requests: Mutex::new(Vec::new()) }
    }

    fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    fn last_user_message(&self) -> String {
        let requests = self.requests.lock().unwrap();
        requests.last().and_then(|m| m.last()).map(|m| m.content.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl CompletionBackend for FakeModel {
    async fn complete(&self, messages: Vec<ChatMessage>, params: &LlmParams) -> anyhow::Result<String> {
        assert_eq!(params.model, "gpt-4");
        self.requests.lock().unwrap().push(messages);
        Ok(self.reply.clone())
    }
}

struct Harness {
    _root: TempDir,
    data_dir: PathBuf,
    model: Arc<FakeModel>,
    state: SharedState,
}

impl Harness {
    fn new() -> Self {
        Self::with_reply(CANNED_TABLE)
    }

    fn with_reply(reply: &str) -> Self {
        let root = tempfile::tempdir().unwrap();
        let data_dir = root.path().join("data");
        let mut config = AppConfig::new("sk-test", &data_dir).unwrap();
        config.assets_dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("../logo");

        let model = Arc::new(FakeModel::replying(reply));
        let pipeline = AdvisoryPipeline::with_backend(model.clone(), &config.model);
        let state = AppState::with_pipeline(config, pipeline);

        Self { _root: root, data_dir, model, state }
    }

    fn app(&self) -> Router {
        app(self.state.clone())
    }

    async fn upload_brief(&self) {
        let response = self
            .app()
            .oneshot(multipart_request("/upload", "brief.docx", &docx_bytes("Acme builds satellites.")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    fn data_entries(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(&self.data_dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        names
    }
}

/// Holds `chattr +i` on a path and clears it on drop.
#[cfg(target_os = "linux")]
struct ImmutableGuard(PathBuf);

#[cfg(target_os = "linux")]
impl ImmutableGuard {
    /// `None` when chattr is missing or the filesystem refuses the flag.
    fn lock(path: &Path) -> Option<Self> {
        let status = std::process::Command::new("chattr").arg("+i").arg(path).status().ok()?;
        status.success().then(|| Self(path.to_path_buf()))
    }
}

#[cfg(target_os = "linux")]
impl Drop for ImmutableGuard {
    fn drop(&mut self) {
        let _ = std::process::Command::new("chattr").arg("-i").arg(&self.0).status();
    }
}

fn docx_bytes(paragraph: &str) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
    writer.start_file("word/document.xml", SimpleFileOptions::default()).unwrap();
    write!(
        writer,
        "<w:document><w:body><w:p><w:r><w:t>{paragraph}</w:t></w:r></w:p></w:body></w:document>"
    )
    .unwrap();
    writer.finish().unwrap().into_inner()
}

fn multipart_request(uri: &str, filename: &str, bytes: &[u8]) -> Request<Body> {
    let mut body = Vec::new();
    write!(
        body,
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
    )
    .unwrap();
    body.extend_from_slice(bytes);
    write!(body, "\r\n--{BOUNDARY}--\r\n").unwrap();

    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
        .body(Body::from(body))
        .unwrap()
}

fn form_request(keyword: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/generate")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(format!("keyword={keyword}")))
        .unwrap()
}

fn advise_request(keyword: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/advise")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::json!({ "keyword": keyword }).to_string()))
        .unwrap()
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn index_clears_stale_files_and_renders_page() {
    let harness = Harness::new();
    std::fs::create_dir_all(harness.data_dir.join("old/nested")).unwrap();
    std::fs::write(harness.data_dir.join("crashed.pdf"), b"stale").unwrap();

    let response = harness
        .app()
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(harness.data_entries().is_empty());

    let html = body_text(response).await;
    assert!(html.contains("Domain Name Generator"));
    assert!(html.contains("https://www.lyzr.ai/book-demo/"));
    assert!(html.contains("https://discord.gg/nm7zSyEFA2"));
}

#[tokio::test]
async fn upload_keeps_only_the_latest_document() {
    let harness = Harness::new();

    let first = harness
        .app()
        .oneshot(multipart_request("/upload", "brief.docx", &docx_bytes("Acme builds satellites.")))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);
    let html = body_text(first).await;
    assert!(html.contains("File successfully saved"));
    assert!(html.contains(r#"action="/generate""#));
    assert_eq!(harness.data_entries(), vec!["brief.docx"]);

    let second = harness
        .app()
        .oneshot(multipart_request("/upload", "profile.PDF", b"%PDF-1.4 fake"))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::OK);
    assert_eq!(harness.data_entries(), vec!["profile.PDF"]);
    assert_eq!(
        std::fs::read(harness.data_dir.join("profile.PDF")).unwrap(),
        b"%PDF-1.4 fake"
    );
}

#[tokio::test]
async fn upload_without_file_part_is_rejected() {
    let harness = Harness::new();
    let request = Request::builder()
        .method("POST")
        .uri("/upload")
        .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
        .body(Body::from(format!("--{BOUNDARY}--\r\n")))
        .unwrap();

    let response = harness.app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn generate_before_upload_is_a_conflict() {
    let harness = Harness::new();

    let html_response = harness.app().oneshot(form_request("orbit")).await.unwrap();
    assert_eq!(html_response.status(), StatusCode::CONFLICT);

    let json_response = harness.app().oneshot(advise_request("orbit")).await.unwrap();
    assert_eq!(json_response.status(), StatusCode::CONFLICT);
    assert_eq!(harness.model.request_count(), 0);
}

#[tokio::test]
async fn docx_with_keyword_returns_model_text_unmodified() {
    let harness = Harness::new();
    harness
        .app()
        .oneshot(multipart_request("/upload", "brief.docx", &docx_bytes("Acme builds satellites.")))
        .await
        .unwrap();

    let response = harness.app().oneshot(advise_request("orbit")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let outcome: AdvisoryOutcome = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(outcome, AdvisoryOutcome::Success { text: CANNED_TABLE.to_string() });

    assert_eq!(harness.model.request_count(), 1);
    let sent = harness.model.last_user_message();
    assert_eq!(sent.matches("orbit").count(), 1);
    assert!(sent.contains("Acme builds satellites."));
}

#[tokio::test]
async fn generate_form_renders_markdown_table() {
    let harness = Harness::new();
    harness
        .app()
        .oneshot(multipart_request("/upload", "brief.docx", &docx_bytes("Acme builds satellites.")))
        .await
        .unwrap();

    let response = harness.app().oneshot(form_request("orbit")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let html = body_text(response).await;
    assert!(html.contains("<table>"));
    assert!(html.contains("<th>Domain</th>"));
    assert!(html.contains("<td>orbitly</td>"));
    assert!(html.contains("<td>Short &amp; &lt;catchy&gt;</td>"));
    assert!(html.contains(r#"value="orbit""#));
}

#[tokio::test]
async fn script_in_model_output_is_shown_as_text() {
    let reply = format!("{CANNED_TABLE}\n\n<script>alert('pwned')</script>\n\nAlso try <img src=x onerror=alert(1)>");
    let harness = Harness::with_reply(&reply);
    harness.upload_brief().await;

    let response = harness.app().oneshot(form_request("orbit")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let html = body_text(response).await;
    assert!(html.contains("<table>"));
    assert!(!html.contains("<script>"));
    assert!(!html.contains("<img src=x"));
    assert!(html.contains("&lt;script&gt;"));

    // The JSON endpoint hands back the raw text.
    let json = harness.app().oneshot(advise_request("orbit")).await.unwrap();
    let outcome: AdvisoryOutcome = serde_json::from_str(&body_text(json).await).unwrap();
    assert_eq!(outcome, AdvisoryOutcome::Success { text: reply });
}

#[cfg(target_os = "linux")]
#[tokio::test]
async fn index_shows_cleanup_failures_as_warnings() {
    let harness = Harness::new();
    std::fs::create_dir_all(harness.data_dir.join("locked")).unwrap();
    std::fs::write(harness.data_dir.join("locked/f"), b"pinned").unwrap();
    std::fs::write(harness.data_dir.join("b.pdf"), b"%PDF").unwrap();
    std::fs::write(harness.data_dir.join("c.docx"), b"PK").unwrap();

    let Some(_guard) = ImmutableGuard::lock(&harness.data_dir.join("locked/f")) else {
        eprintln!("chattr +i unavailable here, skipping");
        return;
    };

    let response = harness
        .app()
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let html = body_text(response).await;
    assert!(html.contains(r#"class="notice warning""#));
    assert!(html.contains("Error while removing existing files:"));
    assert_eq!(harness.data_entries(), vec!["locked"]);

    let upload = harness
        .app()
        .oneshot(multipart_request("/api/upload", "brief.docx", &docx_bytes("Acme builds satellites.")))
        .await
        .unwrap();
    assert_eq!(upload.status(), StatusCode::OK);
    let receipt: serde_json::Value = serde_json::from_str(&body_text(upload).await).unwrap();
    assert_eq!(receipt["document"]["filename"], "brief.docx");
    assert_eq!(receipt["warnings"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn every_generate_reinvokes_the_model() {
    let harness = Harness::new();
    harness
        .app()
        .oneshot(multipart_request("/upload", "brief.docx", &docx_bytes("Acme builds satellites.")))
        .await
        .unwrap();

    harness.app().oneshot(advise_request("orbit")).await.unwrap();
    harness.app().oneshot(advise_request("orbit")).await.unwrap();

    assert_eq!(harness.model.request_count(), 2);
}

#[tokio::test]
async fn text_file_is_unsupported_and_never_reaches_the_model() {
    let harness = Harness::new();
    let upload = harness
        .app()
        .oneshot(multipart_request("/api/upload", "notes.txt", b"meeting notes"))
        .await
        .unwrap();
    assert_eq!(upload.status(), StatusCode::OK);
    let receipt: serde_json::Value = serde_json::from_str(&body_text(upload).await).unwrap();
    assert_eq!(receipt["document"]["filename"], "notes.txt");
    assert_eq!(receipt["document"]["extension"], "txt");
    assert_eq!(receipt["warnings"], serde_json::json!([]));

    let response = harness.app().oneshot(advise_request("orbit")).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);

    let outcome: AdvisoryOutcome = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(
        outcome,
        AdvisoryOutcome::UnsupportedType {
            message: "Unsupported file type. Only PDF and DOCX files are supported.".to_string()
        }
    );
    assert_eq!(harness.model.request_count(), 0);
}

#[tokio::test]
async fn unreadable_pdf_is_an_upstream_error() {
    let harness = Harness::new();
    harness
        .app()
        .oneshot(multipart_request("/api/upload", "profile.PDF", b"not a pdf at all"))
        .await
        .unwrap();

    let response = harness.app().oneshot(advise_request("orbit")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

    let outcome: AdvisoryOutcome = serde_json::from_str(&body_text(response).await).unwrap();
    assert!(matches!(outcome, AdvisoryOutcome::UpstreamError { .. }));
    assert_eq!(harness.model.request_count(), 0);
}

#[tokio::test]
async fn health_and_logo_are_served() {
    let harness = Harness::new();

    let health = harness
        .app()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(health.status(), StatusCode::OK);
    assert_eq!(body_text(health).await, r#"{"status":"ok"}"#);

    let logo = harness
        .app()
        .oneshot(Request::builder().uri("/logo/logo.svg").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(logo.status(), StatusCode::OK);
}
