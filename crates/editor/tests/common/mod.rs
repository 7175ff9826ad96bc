//! In-memory `ContentRepository` for editor tests.
//!
//! Records call counts, tracks how many updates run at once, and appends a
//! version on every create and update the way the content service does.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use h2space_core::content::{
    Content, ContentAnalytics, ContentFormData, ContentListItem, ContentPage, ContentPatch,
    ContentStatus, MediaFile, MediaUpload,
};
use h2space_core::error::{CoreError, CoreResult};
use h2space_core::listing::{ContentQuery, StatusFilter};
use h2space_core::repository::ContentRepository;
use h2space_core::versions::{
    diff_form_data, AuthorRef, ContentVersion, ContentVersionDetail,
};
use h2space_editor::EditorConfig;
use h2space_events::EventBus;

#[derive(Default)]
struct FakeState {
    contents: HashMap<String, Content>,
    versions: HashMap<String, Vec<ContentVersionDetail>>,
    categories: Vec<String>,
    patches: Vec<ContentPatch>,
    next_id: u64,
}

#[derive(Default)]
pub struct FakeRepository {
    state: Mutex<FakeState>,
    update_delay: Mutex<Option<Duration>>,
    fail_updates: AtomicBool,
    fail_deletes: AtomicBool,
    fail_uploads: AtomicBool,
    pub creates: AtomicUsize,
    pub updates: AtomicUsize,
    pub deletes: AtomicUsize,
    pub uploads: AtomicUsize,
    pub list_calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

/// Decrements the in-flight counter even if the update future is dropped.
struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl FakeRepository {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Store `content` with a first version recording its fields.
    pub fn seed(&self, content: Content) {
        let mut state = self.state.lock().unwrap();
        let data = content.form_data();
        let changes = diff_form_data(&ContentFormData::default(), &data);
        push_version(&mut state, &content.id, data, changes);
        state.contents.insert(content.id.clone(), content);
    }

    pub fn set_categories(&self, categories: &[&str]) {
        self.state.lock().unwrap().categories = categories.iter().map(|c| c.to_string()).collect();
    }

    pub fn set_update_delay(&self, delay: Duration) {
        *self.update_delay.lock().unwrap() = Some(delay);
    }

    pub fn fail_updates(&self, fail: bool) {
        self.fail_updates.store(fail, Ordering::SeqCst);
    }

    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    pub fn fail_uploads(&self, fail: bool) {
        self.fail_uploads.store(fail, Ordering::SeqCst);
    }

    pub fn content(&self, id: &str) -> Option<Content> {
        self.state.lock().unwrap().contents.get(id).cloned()
    }

    pub fn versions_of(&self, id: &str) -> Vec<ContentVersionDetail> {
        self.state.lock().unwrap().versions.get(id).cloned().unwrap_or_default()
    }

    pub fn patches(&self) -> Vec<ContentPatch> {
        self.state.lock().unwrap().patches.clone()
    }

    pub fn network_calls(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
            + self.updates.load(Ordering::SeqCst)
            + self.deletes.load(Ordering::SeqCst)
            + self.uploads.load(Ordering::SeqCst)
    }

    pub fn max_concurrent_updates(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

fn push_version(
    state: &mut FakeState,
    content_id: &str,
    data: ContentFormData,
    changes: Vec<h2space_core::versions::FieldChange>,
) {
    let versions = state.versions.entry(content_id.to_string()).or_default();
    let number = versions.len() as u32 + 1;
    versions.push(ContentVersionDetail {
        version: ContentVersion {
            id: format!("{content_id}-v{number}"),
            version_number: number,
            created_at: Utc::now(),
            created_by: AuthorRef {
                id: "u1".into(),
                name: "Jane".into(),
            },
            changes,
        },
        data,
    });
}

fn not_found(entity: &'static str, id: &str) -> CoreError {
    CoreError::NotFound {
        entity,
        id: id.to_string(),
    }
}

#[async_trait]
impl ContentRepository for FakeRepository {
    async fn get_content(&self, id: &str) -> CoreResult<Content> {
        self.content(id).ok_or_else(|| not_found("content", id))
    }

    async fn create_content(&self, data: &ContentFormData) -> CoreResult<Content> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        let id = {
            let mut state = self.state.lock().unwrap();
            state.next_id += 1;
            format!("new-{}", state.next_id)
        };
        let mut content = sample_content(&id, &data.title);
        apply_form(&mut content, data.clone());
        self.seed(content.clone());
        Ok(content)
    }

    async fn update_content(&self, id: &str, patch: &ContentPatch) -> CoreResult<Content> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        let _in_flight = InFlight(&self.in_flight);
        self.max_in_flight.fetch_max(running, Ordering::SeqCst);

        let delay = *self.update_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(CoreError::Network("connection reset".into()));
        }

        let mut state = self.state.lock().unwrap();
        state.patches.push(patch.clone());
        let content = state
            .contents
            .get_mut(id)
            .ok_or_else(|| not_found("content", id))?;
        let old = content.form_data();
        let mut new = old.clone();
        patch.apply_to(&mut new);
        apply_form(content, new.clone());
        let updated = content.clone();
        push_version(&mut state, id, new.clone(), diff_form_data(&old, &new));
        Ok(updated)
    }

    async fn delete_content(&self, id: &str) -> CoreResult<()> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(CoreError::Api {
                status: 500,
                message: "Internal server error".into(),
            });
        }
        let mut state = self.state.lock().unwrap();
        state
            .contents
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| not_found("content", id))
    }

    async fn upload_media(&self, file: MediaFile) -> CoreResult<MediaUpload> {
        self.uploads.fetch_add(1, Ordering::SeqCst);
        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(CoreError::Network("upload interrupted".into()));
        }
        Ok(MediaUpload {
            url: format!("https://cdn.example.com/{}", file.file_name),
        })
    }

    async fn get_categories(&self) -> CoreResult<Vec<String>> {
        Ok(self.state.lock().unwrap().categories.clone())
    }

    async fn get_tags(&self) -> CoreResult<Vec<String>> {
        let state = self.state.lock().unwrap();
        let mut tags: Vec<String> = state.contents.values().flat_map(|c| c.tags.clone()).collect();
        tags.sort();
        tags.dedup();
        Ok(tags)
    }

    async fn get_contents(&self, query: &ContentQuery) -> CoreResult<ContentPage> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let state = self.state.lock().unwrap();
        let mut items: Vec<ContentListItem> = state
            .contents
            .values()
            .filter(|c| match query.status {
                StatusFilter::All => true,
                StatusFilter::Only(status) => c.status == status,
            })
            .map(list_item)
            .collect();
        items.sort_by(|a, b| a.id.cmp(&b.id));

        let limit = query.limit.max(1) as usize;
        let total = items.len();
        let total_pages = total.div_ceil(limit).max(1);
        let page = (query.page.max(1) as usize).min(total_pages);
        let items = items.into_iter().skip((page - 1) * limit).take(limit).collect();

        Ok(ContentPage {
            items,
            total: total as u64,
            page: page as u32,
            total_pages: total_pages as u32,
        })
    }

    async fn get_versions(&self, content_id: &str) -> CoreResult<Vec<ContentVersion>> {
        let state = self.state.lock().unwrap();
        if !state.contents.contains_key(content_id) {
            return Err(not_found("content", content_id));
        }
        // Oldest first, so callers must order them.
        Ok(state
            .versions
            .get(content_id)
            .map(|list| list.iter().map(|v| v.version.clone()).collect())
            .unwrap_or_default())
    }

    async fn get_version(
        &self,
        content_id: &str,
        version_id: &str,
    ) -> CoreResult<ContentVersionDetail> {
        self.state
            .lock()
            .unwrap()
            .versions
            .get(content_id)
            .and_then(|list| list.iter().find(|v| v.version.id == version_id).cloned())
            .ok_or_else(|| not_found("version", version_id))
    }

    async fn track_view(&self, id: &str) -> CoreResult<()> {
        let mut state = self.state.lock().unwrap();
        let content = state
            .contents
            .get_mut(id)
            .ok_or_else(|| not_found("content", id))?;
        content.views = Some(content.views.unwrap_or(0) + 1);
        Ok(())
    }

    async fn get_analytics(&self, id: &str) -> CoreResult<ContentAnalytics> {
        let content = self.content(id).ok_or_else(|| not_found("content", id))?;
        let views = content.views.unwrap_or(0);
        Ok(ContentAnalytics {
            views,
            unique_visitors: views,
            avg_time_on_page: 0.0,
            referrers: Vec::new(),
        })
    }
}

fn apply_form(content: &mut Content, form: ContentFormData) {
    content.title = form.title;
    content.body = form.body;
    content.excerpt = form.excerpt;
    content.featured_image = form.featured_image;
    content.status = form.status;
    content.tags = form.tags;
    content.category = form.category;
    content.seo = form.seo;
    content.updated_at = Utc::now();
}

fn list_item(content: &Content) -> ContentListItem {
    ContentListItem {
        id: content.id.clone(),
        title: content.title.clone(),
        excerpt: content.excerpt.clone(),
        featured_image: content.featured_image.clone(),
        status: content.status,
        published_at: content.published_at,
        updated_at: content.updated_at,
        author_name: "Jane".into(),
        category: content.category.clone(),
        views: content.views,
    }
}

/// A valid persisted content item.
pub fn sample_content(id: &str, title: &str) -> Content {
    let now = Utc::now();
    Content {
        id: id.to_string(),
        title: title.to_string(),
        body: "<p>Body</p>".into(),
        excerpt: "An excerpt".into(),
        featured_image: None,
        status: ContentStatus::Draft,
        published_at: None,
        created_at: now,
        updated_at: now,
        author_id: "u1".into(),
        tags: vec!["rust".into()],
        category: "Technology".into(),
        views: Some(0),
        seo: None,
    }
}

pub fn bus() -> Arc<EventBus> {
    Arc::new(EventBus::default())
}

/// Editor config with a short autosave interval.
pub fn fast_config(interval_secs: u64) -> EditorConfig {
    let mut config = EditorConfig::default();
    config.autosave.interval = Duration::from_secs(interval_secs);
    config
}
