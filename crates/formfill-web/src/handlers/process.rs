use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use tracing::{info, warn};

use formfill_extract::ExtractError;

use crate::models::{ProcessFileRequest, ProcessFileResponse, status_for};
use crate::state::AppState;

/// Extract text from the uploaded documents and map it onto the caller's
/// form fields. One round trip, no server-side state.
pub async fn process_file(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ProcessFileRequest>,
) -> (StatusCode, Json<ProcessFileResponse>) {
    let docs = match req.documents() {
        Ok(docs) => docs,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ProcessFileResponse::failure(format!(
                    "invalid base64 payload: {e}"
                ))),
            );
        }
    };
    if docs.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ProcessFileResponse::failure("no document provided")),
        );
    }

    let mode = req.ocr_mode.unwrap_or(state.default_mode);
    info!(documents = docs.len(), mode = mode.as_str(), fields = req.form_fields.len(), "processing upload");

    // Extraction is CPU-bound (rendering, OCR subprocesses); keep it off
    // the async workers.
    let engine = Arc::clone(&state.engine);
    let extracted = match tokio::task::spawn_blocking(move || engine.extract_all(&docs, mode)).await
    {
        Ok(Ok(text)) => text,
        Ok(Err(ExtractError::Decode(e))) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ProcessFileResponse::failure(format!(
                    "could not decode document: {e}"
                ))),
            );
        }
        Ok(Err(e)) => {
            warn!(error = %e, "extraction failed");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ProcessFileResponse::failure(e.to_string())),
            );
        }
        Err(e) => {
            warn!(error = %e, "extraction task panicked");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ProcessFileResponse::failure("extraction task failed")),
            );
        }
    };

    if extracted.trim().is_empty() {
        // Not an HTTP failure: the upload was well-formed, it just has no
        // recognizable text. The extension shows this verbatim.
        return (
            StatusCode::OK,
            Json(ProcessFileResponse::failure(
                "Could not extract any text from the document",
            )),
        );
    }

    match state
        .matcher
        .match_fields(&extracted, &req.form_fields, req.openai_api_key.as_deref())
        .await
    {
        Ok(mappings) => (
            StatusCode::OK,
            Json(ProcessFileResponse::ok(mappings, &extracted)),
        ),
        Err(e) => {
            warn!(error = %e, "field matching failed");
            (status_for(&e), Json(ProcessFileResponse::failure(e.to_string())))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use base64::Engine as _;
    use base64::engine::general_purpose::STANDARD as BASE64;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use formfill_core::{BackendError, ExtractionMode, PdfBackend};
    use formfill_extract::ExtractionEngine;
    use formfill_match::FieldMatcher;
    use formfill_match::mock::{MockModel, MockResponse};

    use crate::state::AppState;

    /// Scripted text layer standing in for MuPDF.
    enum StubPdf {
        Text(&'static str),
        OpenError,
    }

    impl PdfBackend for StubPdf {
        fn extract_text(&self, _bytes: &[u8]) -> Result<String, BackendError> {
            match self {
                StubPdf::Text(t) => Ok(t.to_string()),
                StubPdf::OpenError => Err(BackendError::Open("broken xref table".into())),
            }
        }

        fn render_pages(&self, _bytes: &[u8], _scale: f32) -> Result<Vec<image::RgbImage>, BackendError> {
            Ok(Vec::new())
        }
    }

    fn app_with(pdf: StubPdf, model: MockResponse, default_key: Option<&str>) -> axum::Router {
        let engine = Arc::new(ExtractionEngine::with_backends(Arc::new(pdf), None, None));
        let matcher = FieldMatcher::new(
            Arc::new(MockModel::new(model)),
            default_key.map(str::to_string),
        );
        crate::app(Arc::new(AppState {
            engine,
            matcher,
            default_mode: ExtractionMode::Fast,
        }))
    }

    fn request(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn upload_body() -> Value {
        json!({
            "file_base64": BASE64.encode(b"%PDF-1.4 stub"),
            "form_fields": [{"id": "f1", "name": "name"}],
        })
    }

    async fn send(app: axum::Router, req: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(req).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn happy_path_returns_mappings_and_preview() {
        let app = app_with(
            StubPdf::Text("Name: Jane Doe"),
            MockResponse::Content(
                r#"[{"fieldId":"f1","fieldName":"name","fieldType":"text","value":"Jane Doe"}]"#
                    .into(),
            ),
            Some("sk-test"),
        );

        let (status, body) = send(app, request("/process-file", upload_body())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], json!(true));
        assert_eq!(body["mappings"][0]["fieldId"], json!("f1"));
        assert_eq!(body["mappings"][0]["value"], json!("Jane Doe"));
        assert_eq!(body["extracted_text"], json!("Name: Jane Doe"));
    }

    #[tokio::test]
    async fn legacy_alias_still_processes() {
        let app = app_with(
            StubPdf::Text("Name: Jane Doe"),
            MockResponse::Content(r#"[{"fieldId":"f1","value":"Jane Doe"}]"#.into()),
            Some("sk-test"),
        );
        let (status, body) = send(app, request("/process-pdf", upload_body())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], json!(true));
    }

    #[tokio::test]
    async fn invalid_base64_is_rejected() {
        let app = app_with(
            StubPdf::Text("irrelevant"),
            MockResponse::Content("[]".into()),
            Some("sk-test"),
        );
        let body = json!({"file_base64": "!!! not base64 !!!", "form_fields": []});
        let (status, _) = send(app, request("/process-file", body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn missing_upload_is_rejected() {
        let app = app_with(
            StubPdf::Text("irrelevant"),
            MockResponse::Content("[]".into()),
            Some("sk-test"),
        );
        let (status, body) = send(app, request("/process-file", json!({"form_fields": []}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], json!(false));
    }

    #[tokio::test]
    async fn unopenable_document_is_a_caller_error() {
        let app = app_with(
            StubPdf::OpenError,
            MockResponse::Content("[]".into()),
            Some("sk-test"),
        );
        let (status, body) = send(app, request("/process-file", upload_body())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("broken xref"));
    }

    #[tokio::test]
    async fn textless_document_is_success_false_not_an_error_status() {
        // Empty text layer and no OCR backend: extraction ends empty.
        let app = app_with(
            StubPdf::Text(""),
            MockResponse::Content("[]".into()),
            Some("sk-test"),
        );
        let (status, body) = send(app, request("/process-file", upload_body())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], json!(false));
        assert!(body["error"].as_str().unwrap().contains("extract any text"));
    }

    #[tokio::test]
    async fn provider_failures_map_to_distinct_statuses() {
        for (response, expected) in [
            (MockResponse::Auth, StatusCode::UNAUTHORIZED),
            (MockResponse::RateLimited, StatusCode::TOO_MANY_REQUESTS),
            (
                MockResponse::Connectivity("dns failure".into()),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
        ] {
            let app = app_with(StubPdf::Text("Name: Jane"), response, Some("sk-test"));
            let (status, body) = send(app, request("/process-file", upload_body())).await;
            assert_eq!(status, expected);
            assert_eq!(body["success"], json!(false));
        }
    }

    #[tokio::test]
    async fn missing_api_key_is_unauthorized() {
        let app = app_with(
            StubPdf::Text("Name: Jane"),
            MockResponse::Content("[]".into()),
            None,
        );
        let (status, _) = send(app, request("/process-file", upload_body())).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn capabilities_reports_backends_and_formats() {
        let app = app_with(
            StubPdf::Text(""),
            MockResponse::Content("[]".into()),
            None,
        );
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/capabilities")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["raster_available"], json!(false));
        assert_eq!(body["structured_available"], json!(false));
        assert_eq!(body["default_mode"], json!("fast"));
        assert!(body["supported_formats"].as_array().unwrap().iter().any(|f| f == ".pdf"));
    }

    #[tokio::test]
    async fn health_answers() {
        let app = app_with(
            StubPdf::Text(""),
            MockResponse::Content("[]".into()),
            None,
        );
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
