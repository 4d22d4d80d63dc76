use ai_studio_backend::config::AppConfig;
use ai_studio_backend::entities::{prelude::*, users};
use ai_studio_backend::infrastructure::database;
use ai_studio_backend::services::analytics::AnalyticsService;
use ai_studio_backend::services::history::HistoryService;
use ai_studio_backend::services::inference::InferenceClient;
use ai_studio_backend::services::mailer::Mailer;
use ai_studio_backend::{AppState, create_app};
use anyhow::bail;
use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, Response, StatusCode},
};
use http_body_util::BodyExt;
use sea_orm::{ColumnTrait, Database, EntityTrait, QueryFilter};
use serde_json::Value;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

pub async fn setup_test_db() -> sea_orm::DatabaseConnection {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    database::run_migrations(&db).await.unwrap();
    db
}

/// Records outbound mail instead of delivering it.
#[derive(Default)]
pub struct CaptureMailer {
    pub sent: Mutex<Vec<(String, String, String)>>,
}

#[async_trait]
impl Mailer for CaptureMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> anyhow::Result<()> {
        self.sent
            .lock()
            .unwrap()
            .push((to.to_string(), subject.to_string(), body.to_string()));
        Ok(())
    }
}

/// Always fails; register must still succeed with this mailer installed.
pub struct BrokenMailer;

#[async_trait]
impl Mailer for BrokenMailer {
    async fn send(&self, _to: &str, _subject: &str, _body: &str) -> anyhow::Result<()> {
        bail!("smtp relay unreachable")
    }
}

/// Deterministic canned collaborator: summaries come back a tenth the
/// length of the input, everything else is a fixed template.
pub struct MockInference;

#[async_trait]
impl InferenceClient for MockInference {
    async fn summarize(&self, text: &str) -> anyhow::Result<String> {
        let words = text.split_whitespace().count() / 10;
        Ok(vec!["summary"; words.max(1)].join(" "))
    }

    async fn caption_image(
        &self,
        _image: &[u8],
        _mime_type: &str,
        style: &str,
    ) -> anyhow::Result<String> {
        Ok(format!("A {} photo of a mountain lake.", style))
    }

    async fn transcribe_audio(&self, _audio: &[u8], _mime_type: &str) -> anyhow::Result<String> {
        Ok("I had a wonderful day at the beach today.".to_string())
    }

    async fn analyze_mood(&self, _transcript: &str) -> anyhow::Result<String> {
        Ok("The speaker sounds very happy and energetic.".to_string())
    }

    async fn rewrite_tone(&self, text: &str, tone: &str) -> anyhow::Result<String> {
        Ok(format!("[{}] {}", tone, text))
    }

    async fn generate_followups(&self, _summary: &str) -> anyhow::Result<Vec<String>> {
        Ok(vec![
            "What happens next?".to_string(),
            "Who is affected most?".to_string(),
        ])
    }
}

/// Simulates an unavailable collaborator.
pub struct FailingInference;

#[async_trait]
impl InferenceClient for FailingInference {
    async fn summarize(&self, _text: &str) -> anyhow::Result<String> {
        bail!("model overloaded")
    }

    async fn caption_image(
        &self,
        _image: &[u8],
        _mime_type: &str,
        _style: &str,
    ) -> anyhow::Result<String> {
        bail!("model overloaded")
    }

    async fn transcribe_audio(&self, _audio: &[u8], _mime_type: &str) -> anyhow::Result<String> {
        bail!("model overloaded")
    }

    async fn analyze_mood(&self, _transcript: &str) -> anyhow::Result<String> {
        bail!("model overloaded")
    }

    async fn rewrite_tone(&self, _text: &str, _tone: &str) -> anyhow::Result<String> {
        bail!("model overloaded")
    }

    async fn generate_followups(&self, _summary: &str) -> anyhow::Result<Vec<String>> {
        bail!("model overloaded")
    }
}

pub async fn setup_state(
    inference: Arc<dyn InferenceClient>,
    mailer: Arc<dyn Mailer>,
) -> AppState {
    let db = setup_test_db().await;
    AppState {
        db: db.clone(),
        inference,
        mailer,
        history: HistoryService::new(db.clone()),
        analytics: AnalyticsService::new(db),
        config: AppConfig::default(),
    }
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn post_json(app: &Router, uri: &str, token: Option<&str>, body: Value) -> Response<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("Content-Type", "application/json");
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {}", token));
    }
    app.clone()
        .oneshot(builder.body(Body::from(body.to_string())).unwrap())
        .await
        .unwrap()
}

pub async fn get(app: &Router, uri: &str, token: Option<&str>) -> Response<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {}", token));
    }
    app.clone()
        .oneshot(builder.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

/// Multipart upload with one `file` part plus optional extra text fields.
pub async fn post_multipart(
    app: &Router,
    uri: &str,
    token: &str,
    filename: &str,
    file_bytes: &[u8],
    fields: &[(&str, &str)],
) -> Response<Body> {
    let boundary = "x-test-boundary";
    let mut body: Vec<u8> = Vec::new();

    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                boundary, name, value
            )
            .as_bytes(),
        );
    }

    body.extend_from_slice(
        format!(
            "--{}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\n\
             Content-Type: application/octet-stream\r\n\r\n",
            boundary, filename
        )
        .as_bytes(),
    );
    body.extend_from_slice(file_bytes);
    body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());

    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            "Content-Type",
            format!("multipart/form-data; boundary={}", boundary),
        )
        .header("Authorization", format!("Bearer {}", token))
        .body(Body::from(body))
        .unwrap();

    app.clone().oneshot(request).await.unwrap()
}

/// The OTP lands in the user row before any mail goes out; read it there.
pub async fn stored_otp(db: &sea_orm::DatabaseConnection, email: &str) -> Option<String> {
    Users::find()
        .filter(users::Column::Email.eq(email))
        .one(db)
        .await
        .unwrap()
        .and_then(|u| u.otp)
}

/// Registers and verifies a user, then logs in and returns the bearer token.
pub async fn register_and_login(
    app: &Router,
    db: &sea_orm::DatabaseConnection,
    username: &str,
    email: &str,
    password: &str,
) -> String {
    let response = post_json(
        app,
        "/register",
        None,
        serde_json::json!({"username": username, "email": email, "password": password}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let otp = stored_otp(db, email).await.unwrap();
    let response = post_json(
        app,
        "/verify-otp",
        None,
        serde_json::json!({"email": email, "otp": otp}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = post_json(
        app,
        "/login",
        None,
        serde_json::json!({"username": username, "password": password}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    json["access_token"].as_str().unwrap().to_string()
}

/// Builds a small one-page PDF whose text is `word_count` repetitions of
/// "word", for exercising extraction and the reduction analytics.
pub fn build_pdf(word_count: usize) -> Vec<u8> {
    use lopdf::content::{Content, Operation};
    use lopdf::{Document, Object, Stream, dictionary};

    let text = vec!["word"; word_count].join(" ");

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });
    let content = Content {
        operations: vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 12.into()]),
            Operation::new("Td", vec![50.into(), 700.into()]),
            Operation::new("Tj", vec![Object::string_literal(text)]),
            Operation::new("ET", vec![]),
        ],
    };
    let content_id = doc.add_object(Stream::new(
        dictionary! {},
        content.encode().unwrap(),
    ));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}
