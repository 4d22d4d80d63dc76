mod common;

use ai_studio_backend::create_app;
use axum::http::StatusCode;
use common::*;
use serde_json::json;
use std::sync::Arc;

#[tokio::test]
async fn test_feature_endpoints_require_auth() {
    let state = setup_state(Arc::new(MockInference), Arc::new(CaptureMailer::default())).await;
    let app = create_app(state);

    let response = post_json(
        &app,
        "/tone-changer",
        None,
        json!({"text": "hi", "tone": "formal"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(response).await;
    assert!(json["error"].is_string());

    let response = get(&app, "/history/pdf", None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = get(&app, "/analytics", Some("garbage-token")).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_tone_changer_records_history() {
    let state = setup_state(Arc::new(MockInference), Arc::new(CaptureMailer::default())).await;
    let app = create_app(state.clone());
    let token = register_and_login(&app, &state.db, "alice", "alice@example.com", "pw").await;

    let response = post_json(&app, "/tone-changer", Some(&token), json!({"text": "hi"})).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = post_json(
        &app,
        "/tone-changer",
        Some(&token),
        json!({"text": "hello there", "tone": "formal"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["rewritten"], "[formal] hello there");

    let response = get(&app, "/history/tone", Some(&token)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let history = json["history"].as_array().unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0]["feature_type"], "tone");
    assert_eq!(history[0]["original_input"], "hello there");
    assert_eq!(history[0]["ai_response"], "[formal] hello there");
}

#[tokio::test]
async fn test_history_ordering_and_unknown_feature() {
    let state = setup_state(Arc::new(MockInference), Arc::new(CaptureMailer::default())).await;
    let app = create_app(state.clone());
    let token = register_and_login(&app, &state.db, "bob", "bob@example.com", "pw").await;

    for text in ["first", "second", "third"] {
        let response = post_json(
            &app,
            "/tone-changer",
            Some(&token),
            json!({"text": text, "tone": "casual"}),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        // created_at is the sort key; keep the rows distinguishable
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }

    let response = get(&app, "/history/tone", Some(&token)).await;
    let json = body_json(response).await;
    let history = json["history"].as_array().unwrap();
    assert_eq!(history.len(), 3);
    // Most recent first
    assert_eq!(history[0]["original_input"], "third");
    assert_eq!(history[2]["original_input"], "first");

    // Unknown feature name is a validation error, not a 404
    let response = get(&app, "/history/video", Some(&token)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // A feature with no records is an empty list
    let response = get(&app, "/history/image", Some(&token)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["history"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_pdf_summary_pipeline_and_reduction_analytics() {
    let state = setup_state(Arc::new(MockInference), Arc::new(CaptureMailer::default())).await;
    let app = create_app(state.clone());
    let token = register_and_login(&app, &state.db, "carol", "carol@example.com", "pw").await;

    // 1000 words in, mock summarizer returns 100
    let pdf = build_pdf(1000);
    let response = post_multipart(&app, "/pdf-summary", &token, "report.pdf", &pdf, &[]).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let summary = json["summary"].as_str().unwrap();
    assert_eq!(summary.split_whitespace().count(), 100);

    // The ledger holds the full extracted text, not a truncation
    let response = get(&app, "/history/pdf", Some(&token)).await;
    let json = body_json(response).await;
    let history = json["history"].as_array().unwrap();
    assert_eq!(history.len(), 1);
    let original = history[0]["original_input"].as_str().unwrap();
    assert_eq!(original.split_whitespace().count(), 1000);

    let response = get(&app, "/analytics", Some(&token)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let series = json["reductionData"].as_array().unwrap();
    assert_eq!(series.len(), 1);
    assert_eq!(series[0]["name"], "Doc 1");
    assert_eq!(series[0]["reduction"], 90);
}

#[tokio::test]
async fn test_pdf_summary_rejects_non_pdf() {
    let state = setup_state(Arc::new(MockInference), Arc::new(CaptureMailer::default())).await;
    let app = create_app(state.clone());
    let token = register_and_login(&app, &state.db, "dave", "dave@example.com", "pw").await;

    let response =
        post_multipart(&app, "/pdf-summary", &token, "notes.txt", b"plain text", &[]).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Nothing gets recorded for a failed request
    let response = get(&app, "/history/pdf", Some(&token)).await;
    let json = body_json(response).await;
    assert_eq!(json["history"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_pdf_followups() {
    let state = setup_state(Arc::new(MockInference), Arc::new(CaptureMailer::default())).await;
    let app = create_app(state.clone());
    let token = register_and_login(&app, &state.db, "erin", "erin@example.com", "pw").await;

    let response = post_json(&app, "/pdf-followups", Some(&token), json!({})).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = post_json(
        &app,
        "/pdf-followups",
        Some(&token),
        json!({"summary": "The paper argues water is wet."}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let questions = json["questions"].as_array().unwrap();
    assert!(!questions.is_empty());
    assert!(questions.len() <= 5);
}

#[tokio::test]
async fn test_image_caption_uses_style_and_filename() {
    let state = setup_state(Arc::new(MockInference), Arc::new(CaptureMailer::default())).await;
    let app = create_app(state.clone());
    let token = register_and_login(&app, &state.db, "frank", "frank@example.com", "pw").await;

    let response = post_multipart(
        &app,
        "/image-caption",
        &token,
        "lake.jpg",
        &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10],
        &[("caption_type", "poetic")],
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["caption"], "A poetic photo of a mountain lake.");

    let response = get(&app, "/history/image", Some(&token)).await;
    let json = body_json(response).await;
    let history = json["history"].as_array().unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0]["original_input"], "lake.jpg");
}

#[tokio::test]
async fn test_audio_analysis_and_mood_histogram() {
    let state = setup_state(Arc::new(MockInference), Arc::new(CaptureMailer::default())).await;
    let app = create_app(state.clone());
    let token = register_and_login(&app, &state.db, "grace", "grace@example.com", "pw").await;

    let response = post_multipart(
        &app,
        "/audio-analysis",
        &token,
        "memo.wav",
        b"RIFF\x00\x00\x00\x00WAVE",
        &[],
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["transcript"], "I had a wonderful day at the beach today.");
    assert_eq!(json["mood"], "The speaker sounds very happy and energetic.");

    // Transcript is what the ledger keeps as the input
    let response = get(&app, "/history/audio", Some(&token)).await;
    let json = body_json(response).await;
    let history = json["history"].as_array().unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(
        history[0]["original_input"],
        "I had a wonderful day at the beach today."
    );

    // "happy" outranks "energetic", so the single record is 100% Happy
    let response = get(&app, "/analytics", Some(&token)).await;
    let json = body_json(response).await;
    let moods = json["moodDetection"].as_array().unwrap();
    assert_eq!(moods.len(), 1);
    assert_eq!(moods[0]["mood"], "Happy");
    assert_eq!(moods[0]["value"], 100);
}

#[tokio::test]
async fn test_upstream_failure_is_502_and_unrecorded() {
    let state = setup_state(Arc::new(FailingInference), Arc::new(CaptureMailer::default())).await;
    let app = create_app(state.clone());
    let token = register_and_login(&app, &state.db, "heidi", "heidi@example.com", "pw").await;

    let response = post_json(
        &app,
        "/tone-changer",
        Some(&token),
        json!({"text": "hello", "tone": "formal"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let json = body_json(response).await;
    assert!(json["error"].as_str().unwrap().contains("model overloaded"));

    let response = get(&app, "/history/tone", Some(&token)).await;
    let json = body_json(response).await;
    assert_eq!(json["history"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_missing_file_field_is_400() {
    let state = setup_state(Arc::new(MockInference), Arc::new(CaptureMailer::default())).await;
    let app = create_app(state.clone());
    let token = register_and_login(&app, &state.db, "ivan", "ivan@example.com", "pw").await;

    // Multipart body with only a text field, no file part
    let boundary = "x-test-boundary";
    let body = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"caption_type\"\r\n\r\nplain\r\n--{b}--\r\n",
        b = boundary
    );
    let request = axum::http::Request::builder()
        .method("POST")
        .uri("/image-caption")
        .header(
            "Content-Type",
            format!("multipart/form-data; boundary={}", boundary),
        )
        .header("Authorization", format!("Bearer {}", token))
        .body(axum::body::Body::from(body))
        .unwrap();
    let response = tower::ServiceExt::oneshot(app.clone(), request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"], "No file uploaded");
}

#[tokio::test]
async fn test_analytics_empty_for_fresh_account() {
    let state = setup_state(Arc::new(MockInference), Arc::new(CaptureMailer::default())).await;
    let app = create_app(state.clone());
    let token = register_and_login(&app, &state.db, "judy", "judy@example.com", "pw").await;

    let response = get(&app, "/analytics", Some(&token)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["reductionData"].as_array().unwrap().len(), 0);
    assert_eq!(json["moodDetection"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_health_endpoint() {
    let state = setup_state(Arc::new(MockInference), Arc::new(CaptureMailer::default())).await;
    let app = create_app(state);

    let response = get(&app, "/health", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["database"], "connected");
}
