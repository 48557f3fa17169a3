use axum::{
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use lopdf::{Document, Object, dictionary};
use pdf_merge_service::config::AppConfig;
use pdf_merge_service::services::merge::PdfMerger;
use pdf_merge_service::{AppState, create_app};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

const BOUNDARY: &str = "---------------------------123456789012345678901234567";

fn test_app() -> axum::Router {
    let state = AppState {
        merger: Arc::new(PdfMerger::new()),
        config: AppConfig::default(),
    };
    create_app(state)
}

/// Minimal valid PDF with `pages` empty pages, each sharing a distinctive
/// MediaBox width so page order is observable in the merged output.
fn pdf_bytes(pages: usize, width: i64) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let mut kids: Vec<Object> = Vec::with_capacity(pages);
    for _ in 0..pages {
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), width.into(), 792.into()],
        });
        kids.push(page_id.into());
    }

    let pages_dict = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => pages as i64,
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut out = Vec::new();
    doc.save_to(&mut out).unwrap();
    out
}

fn multipart_body(parts: &[(&str, &str, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();
    for (field, filename, content) in parts {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\n\
                 Content-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\n\
                 Content-Type: application/pdf\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(content);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn merge_request(body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/merge_pdfs")
        .header(
            "Content-Type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

fn page_widths(bytes: &[u8]) -> Vec<i64> {
    let doc = Document::load_mem(bytes).unwrap();
    doc.get_pages()
        .into_values()
        .map(|id| {
            let page = doc.get_object(id).unwrap().as_dict().unwrap();
            let media_box = page.get(b"MediaBox").unwrap().as_array().unwrap();
            media_box[2].as_i64().unwrap()
        })
        .collect()
}

#[tokio::test]
async fn test_merge_two_pdfs_in_submission_order() {
    let app = test_app();
    let a = pdf_bytes(2, 200);
    let b = pdf_bytes(3, 300);
    let body = multipart_body(&[("files", "a.pdf", &a), ("files", "b.pdf", &b)]);

    let response = app.oneshot(merge_request(body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/pdf"
    );
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"merged.pdf\""
    );

    let merged = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(page_widths(&merged), vec![200, 200, 300, 300, 300]);
}

#[tokio::test]
async fn test_merge_single_pdf_keeps_pages() {
    let app = test_app();
    let a = pdf_bytes(3, 400);
    let body = multipart_body(&[("files", "only.pdf", &a)]);

    let response = app.oneshot(merge_request(body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let merged = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(page_widths(&merged), vec![400, 400, 400]);
}

#[tokio::test]
async fn test_missing_files_field_returns_400() {
    let app = test_app();
    // a form with only an unrelated field carries zero `files` parts
    let body = multipart_body(&[("note", "note.txt", b"not a file upload")]);

    let response = app.oneshot(merge_request(body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(json["error"], "No files uploaded");
}

#[tokio::test]
async fn test_invalid_pdf_fails_whole_request() {
    let app = test_app();
    let a = pdf_bytes(2, 200);
    let body = multipart_body(&[
        ("files", "a.pdf", &a),
        ("files", "broken.pdf", b"this is not a pdf"),
    ]);

    let response = app.oneshot(merge_request(body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    // no merged bytes may reach the client, only an opaque error body
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert!(!bytes.starts_with(b"%PDF"));
    let json: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(json["error"], "Internal Server Error");
}

#[tokio::test]
async fn test_repeated_requests_are_deterministic() {
    let a = pdf_bytes(2, 200);
    let b = pdf_bytes(1, 300);
    let body = multipart_body(&[("files", "a.pdf", &a), ("files", "b.pdf", &b)]);

    let first = test_app()
        .oneshot(merge_request(body.clone()))
        .await
        .unwrap();
    let second = test_app().oneshot(merge_request(body)).await.unwrap();

    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(second.status(), StatusCode::OK);

    let first_bytes = first.into_body().collect().await.unwrap().to_bytes();
    let second_bytes = second.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(first_bytes, second_bytes);
}
