//! End-to-end workflow tests for allergen-extract.
//!
//! Each test drives the full select → upload → settle → render path against a
//! local mock of the extraction service (mockito) or a raw TCP listener that
//! never answers.
//!
//! Run with:
//!   cargo test --test workflow -- --nocapture

use allergen_extract::model::PDF_MEDIA_TYPE;
use allergen_extract::selector::{Candidate, DragEvent, SelectionSource};
use allergen_extract::view::{AllergenStatus, NOT_FOUND};
use allergen_extract::{
    export_json, render, Allergen, ClientConfig, ExtractionResult, FileSelector,
    HttpExtractionClient, Nutrient, UploadSession, WorkflowState,
};
use mockito::Server;
use std::sync::Arc;
use std::time::{Duration, Instant};

// ── Test helpers ─────────────────────────────────────────────────────────────

fn session_for(base_url: String, timeout_secs: u64) -> UploadSession {
    let config = ClientConfig::builder()
        .base_url(base_url)
        .timeout_secs(timeout_secs)
        .build()
        .expect("valid config");
    let client = HttpExtractionClient::new(config).expect("client");
    UploadSession::new(Arc::new(client))
}

fn staged_sample(selector: &mut FileSelector) -> allergen_extract::StagedFile {
    selector
        .select(
            SelectionSource::Picker,
            Candidate::new("sample.pdf", PDF_MEDIA_TYPE, b"%PDF-1.4\n%sample".to_vec()),
        )
        .expect("PDF accepted");
    selector.take().expect("file staged")
}

// ── Scenarios ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn sample_pdf_renders_gluten_and_energy() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/extract")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"processing_method":"text","allergens":{"gluten":true},"nutritional_values":{"energy":"250kcal"}}"#,
        )
        .create_async()
        .await;

    let mut selector = FileSelector::new();
    let file = staged_sample(&mut selector);
    assert!(selector.staged().is_none(), "submission clears staged state");

    let mut session = session_for(server.url(), 5);
    let state = session.upload(file).await.expect("upload accepted");
    mock.assert_async().await;

    let result = state.result().expect("Success state");
    let view = render(result);

    assert_eq!(
        view.allergen(Allergen::Gluten).unwrap().status,
        AllergenStatus::Present
    );
    for allergen in Allergen::ALL.iter().filter(|a| **a != Allergen::Gluten) {
        assert_eq!(
            view.allergen(*allergen).unwrap().status,
            AllergenStatus::NotDetected,
            "{allergen:?}"
        );
    }

    assert_eq!(view.nutrient(Nutrient::Energy).unwrap().value, "250kcal");
    for nutrient in Nutrient::ALL.iter().filter(|n| **n != Nutrient::Energy) {
        assert_eq!(view.nutrient(*nutrient).unwrap().value, NOT_FOUND);
    }
}

#[tokio::test]
async fn service_detail_becomes_failure_message() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/extract")
        .with_status(422)
        .with_header("content-type", "application/json")
        .with_body(r#"{"detail":"unsupported language"}"#)
        .create_async()
        .await;

    let mut selector = FileSelector::new();
    let mut session = session_for(server.url(), 5);
    let state = session
        .upload(staged_sample(&mut selector))
        .await
        .expect("upload accepted");

    assert_eq!(
        state.error().map(|m| m.as_str()),
        Some("unsupported language")
    );
    assert!(state.result().is_none());

    session.reset();
    assert!(session.state().is_idle());
}

#[tokio::test]
async fn silent_service_times_out_then_resets() {
    // Accept connections but never answer.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let hold = tokio::spawn(async move {
        let mut held = Vec::new();
        loop {
            if let Ok((sock, _)) = listener.accept().await {
                held.push(sock);
            }
        }
    });

    let mut selector = FileSelector::new();
    let mut session = session_for(format!("http://{addr}"), 1);

    let started = Instant::now();
    let state = session
        .upload(staged_sample(&mut selector))
        .await
        .cloned()
        .expect("upload accepted");
    let elapsed = started.elapsed();

    match state {
        WorkflowState::Failure(ref message) => {
            assert_eq!(message.as_str(), "timeout of 1000ms exceeded")
        }
        other => panic!("expected timeout failure, got {other:?}"),
    }
    assert!(elapsed >= Duration::from_secs(1));
    assert!(elapsed < Duration::from_secs(10));

    session.reset();
    assert_eq!(session.state(), &WorkflowState::Idle);
    hold.abort();
}

#[tokio::test]
async fn retry_is_user_initiated() {
    let mut server = Server::new_async().await;
    let failing = server
        .mock("POST", "/extract")
        .with_status(500)
        .with_body(r#"{"detail":"Could not extract any text from the PDF"}"#)
        .expect(1)
        .create_async()
        .await;

    let mut selector = FileSelector::new();
    let mut session = session_for(server.url(), 5);
    let state = session
        .upload(staged_sample(&mut selector))
        .await
        .expect("upload accepted");
    assert!(state.error().is_some());

    // A second upload from Failure is refused without a request.
    assert!(!session.start_upload(staged_sample(&mut selector)));
    failing.assert_async().await;

    failing.remove_async().await;
    let ok = server
        .mock("POST", "/extract")
        .with_status(200)
        .with_body(r#"{"processing_method":"ocr","allergens":{},"nutritional_values":{}}"#)
        .expect(1)
        .create_async()
        .await;

    session.reset();
    let state = session
        .upload(staged_sample(&mut selector))
        .await
        .expect("upload accepted");
    assert!(state.result().is_some());
    ok.assert_async().await;
}

#[test]
fn non_pdf_drop_is_rejected_locally() {
    let mut selector = FileSelector::new();
    selector.on_drag(DragEvent::Enter);
    let err = selector
        .on_drop(Some(Candidate::new("label.png", "image/png", vec![1, 2, 3])))
        .unwrap_err();
    assert_eq!(err.warning(), "Please upload a PDF file");
    assert!(!selector.drag_active());
    assert!(selector.staged().is_none());
}

#[test]
fn export_round_trips_service_payload() {
    let payload = r#"{
        "allergens": {"gluten": true, "milk": false, "lupin": true},
        "nutritional_values": {"energy": "1046 kJ", "fat": null},
        "raw_text_preview": "Ingredients: wheat flour, water...",
        "processing_method": "text_extraction"
    }"#;
    let result: ExtractionResult = serde_json::from_str(payload).unwrap();

    let once = export_json(&result).unwrap();
    let twice = export_json(&serde_json::from_str(&once).unwrap()).unwrap();
    assert_eq!(once, twice);
    assert!(once.contains("\"lupin\": true"));
    assert!(once.contains("\"fat\": null"));
    assert!(once.contains("\"processing_method\": \"text_extraction\""));

    let sent: serde_json::Value = serde_json::from_str(payload).unwrap();
    let exported: serde_json::Value = serde_json::from_str(&once).unwrap();
    assert_eq!(exported, sent);
}
