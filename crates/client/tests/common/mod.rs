//! In-process stand-in for the content service.
//!
//! [`spawn_stub`] binds an axum router to an ephemeral port and returns its
//! base URL together with the shared [`StubState`] so tests can seed data
//! and inspect what the client sent.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::extract::{Multipart, Path, Query, Request, State};
use axum::http::header::AUTHORIZATION;
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use h2space_core::content::{
    Content, ContentAnalytics, ContentFormData, ContentListItem, ContentPatch, ContentStatus,
    Referrer,
};
use h2space_core::versions::{AuthorRef, ContentVersion, ContentVersionDetail};
use serde_json::json;

/// A file received by the upload endpoint.
#[derive(Debug, Clone)]
pub struct ReceivedUpload {
    pub field: String,
    pub file_name: String,
    pub content_type: String,
    pub size: usize,
}

#[derive(Debug, Default)]
pub struct StubState {
    pub contents: HashMap<String, Content>,
    pub versions: HashMap<String, Vec<ContentVersionDetail>>,
    pub categories: Vec<String>,
    pub tags: Vec<String>,
    pub views: HashMap<String, u64>,
    pub uploads: Vec<ReceivedUpload>,
    pub last_query: HashMap<String, String>,
    pub last_authorization: Option<String>,
    pub last_patch: Option<serde_json::Value>,
    /// When set, every request is answered with 401.
    pub reject_credentials: bool,
}

pub type SharedStub = Arc<Mutex<StubState>>;

/// Start the stub on `127.0.0.1:0`. Returns the API base URL.
pub async fn spawn_stub() -> (String, SharedStub) {
    let state: SharedStub = Arc::new(Mutex::new(StubState::default()));

    let app = Router::new()
        .route("/api/contents", get(list_contents).post(create_content))
        .route(
            "/api/contents/{id}",
            get(get_content).put(update_content).delete(delete_content),
        )
        .route("/api/contents/{id}/versions", get(list_versions))
        .route("/api/contents/{id}/versions/{version_id}", get(get_version))
        .route("/api/contents/{id}/view", post(track_view))
        .route("/api/contents/{id}/analytics", get(analytics))
        .route("/api/media/upload", post(upload))
        .route("/api/categories", get(categories))
        .route("/api/tags", get(tags))
        .layer(middleware::from_fn_with_state(state.clone(), check_auth))
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("stub server");
    });

    (format!("http://{addr}/api"), state)
}

/// A persisted content item with sensible defaults.
pub fn sample_content(id: &str, title: &str) -> Content {
    let now = Utc::now();
    Content {
        id: id.to_string(),
        title: title.to_string(),
        body: "<p>Body</p>".into(),
        excerpt: "Excerpt".into(),
        featured_image: None,
        status: ContentStatus::Draft,
        published_at: None,
        created_at: now,
        updated_at: now,
        author_id: "u1".into(),
        tags: vec!["rust".into()],
        category: "Technology".into(),
        views: Some(3),
        seo: None,
    }
}

/// A version record whose snapshot is `data`.
pub fn sample_version(id: &str, number: u32, data: ContentFormData) -> ContentVersionDetail {
    ContentVersionDetail {
        version: ContentVersion {
            id: id.to_string(),
            version_number: number,
            created_at: Utc::now(),
            created_by: AuthorRef {
                id: "u1".into(),
                name: "Jane".into(),
            },
            changes: Vec::new(),
        },
        data,
    }
}

// ---- handlers ----

async fn check_auth(State(state): State<SharedStub>, request: Request, next: Next) -> Response {
    let reject = {
        let mut stub = state.lock().unwrap();
        stub.last_authorization = request
            .headers()
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        stub.reject_credentials
    };
    if reject {
        return (StatusCode::UNAUTHORIZED, Json(json!({"error": "Token expired"}))).into_response();
    }
    next.run(request).await
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(json!({"error": "Content not found"}))).into_response()
}

async fn list_contents(
    State(state): State<SharedStub>,
    Query(query): Query<HashMap<String, String>>,
) -> Json<serde_json::Value> {
    let mut stub = state.lock().unwrap();
    stub.last_query = query.clone();

    let mut items: Vec<ContentListItem> = stub
        .contents
        .values()
        .filter(|c| query.get("status").is_none_or(|s| c.status.as_str() == s))
        .map(|c| ContentListItem {
            id: c.id.clone(),
            title: c.title.clone(),
            excerpt: c.excerpt.clone(),
            featured_image: c.featured_image.clone(),
            status: c.status,
            published_at: c.published_at,
            updated_at: c.updated_at,
            author_name: "Jane".into(),
            category: c.category.clone(),
            views: c.views,
        })
        .collect();
    items.sort_by(|a, b| a.id.cmp(&b.id));

    let page: u32 = query.get("page").and_then(|p| p.parse().ok()).unwrap_or(1);
    Json(json!({
        "data": items,
        "total": items.len(),
        "page": page,
        "totalPages": 1,
    }))
}

async fn create_content(
    State(state): State<SharedStub>,
    Json(form): Json<ContentFormData>,
) -> Json<Content> {
    let id = uuid::Uuid::new_v4().to_string();
    let mut content = sample_content(&id, &form.title);
    content.body = form.body;
    content.excerpt = form.excerpt;
    content.featured_image = form.featured_image;
    content.status = form.status;
    content.tags = form.tags;
    content.category = form.category;
    content.seo = form.seo;
    content.views = None;
    state.lock().unwrap().contents.insert(id, content.clone());
    Json(content)
}

async fn get_content(State(state): State<SharedStub>, Path(id): Path<String>) -> Response {
    match state.lock().unwrap().contents.get(&id) {
        Some(content) => Json(content.clone()).into_response(),
        None => not_found(),
    }
}

async fn update_content(
    State(state): State<SharedStub>,
    Path(id): Path<String>,
    Json(raw): Json<serde_json::Value>,
) -> Response {
    let mut stub = state.lock().unwrap();
    stub.last_patch = Some(raw.clone());
    let Ok(patch) = serde_json::from_value::<ContentPatch>(raw) else {
        return StatusCode::UNPROCESSABLE_ENTITY.into_response();
    };
    let Some(content) = stub.contents.get_mut(&id) else {
        return not_found();
    };
    let mut form = content.form_data();
    patch.apply_to(&mut form);
    content.title = form.title;
    content.body = form.body;
    content.excerpt = form.excerpt;
    content.featured_image = form.featured_image;
    content.status = form.status;
    content.tags = form.tags;
    content.category = form.category;
    content.seo = form.seo;
    content.updated_at = Utc::now();
    Json(content.clone()).into_response()
}

async fn delete_content(State(state): State<SharedStub>, Path(id): Path<String>) -> Response {
    match state.lock().unwrap().contents.remove(&id) {
        Some(_) => StatusCode::NO_CONTENT.into_response(),
        None => not_found(),
    }
}

async fn list_versions(State(state): State<SharedStub>, Path(id): Path<String>) -> Response {
    let stub = state.lock().unwrap();
    if !stub.contents.contains_key(&id) {
        return not_found();
    }
    let versions: Vec<ContentVersion> = stub
        .versions
        .get(&id)
        .map(|list| list.iter().map(|v| v.version.clone()).collect())
        .unwrap_or_default();
    Json(versions).into_response()
}

async fn get_version(
    State(state): State<SharedStub>,
    Path((id, version_id)): Path<(String, String)>,
) -> Response {
    let stub = state.lock().unwrap();
    let found = stub
        .versions
        .get(&id)
        .and_then(|list| list.iter().find(|v| v.version.id == version_id));
    match found {
        Some(detail) => Json(detail.clone()).into_response(),
        None => not_found(),
    }
}

async fn track_view(State(state): State<SharedStub>, Path(id): Path<String>) -> StatusCode {
    *state.lock().unwrap().views.entry(id).or_default() += 1;
    StatusCode::NO_CONTENT
}

async fn analytics(
    State(state): State<SharedStub>,
    Path(id): Path<String>,
) -> Json<ContentAnalytics> {
    let views = state.lock().unwrap().views.get(&id).copied().unwrap_or(0);
    Json(ContentAnalytics {
        views,
        unique_visitors: views,
        avg_time_on_page: 42.5,
        referrers: vec![Referrer {
            source: "direct".into(),
            count: views,
        }],
    })
}

async fn upload(State(state): State<SharedStub>, mut multipart: Multipart) -> Response {
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().unwrap_or_default().to_string();
        let Ok(bytes) = field.bytes().await else {
            return StatusCode::BAD_REQUEST.into_response();
        };
        let url = format!("https://cdn.example.com/{file_name}");
        state.lock().unwrap().uploads.push(ReceivedUpload {
            field: name,
            file_name,
            content_type,
            size: bytes.len(),
        });
        return Json(json!({ "url": url })).into_response();
    }
    StatusCode::BAD_REQUEST.into_response()
}

async fn categories(State(state): State<SharedStub>) -> Json<Vec<String>> {
    Json(state.lock().unwrap().categories.clone())
}

async fn tags(State(state): State<SharedStub>) -> Json<Vec<String>> {
    Json(state.lock().unwrap().tags.clone())
}
