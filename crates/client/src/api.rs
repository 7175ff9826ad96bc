//! REST client for the content service.
//!
//! Wraps the content endpoints (CRUD, media upload, taxonomy, version
//! history, analytics) using [`reqwest`]. Every request carries the bearer
//! token from the shared [`SessionContext`]; a 401 answer clears it.

use std::time::Duration;

use async_trait::async_trait;
use h2space_core::content::{
    Content, ContentAnalytics, ContentFormData, ContentPage, ContentPatch, MediaFile, MediaUpload,
};
use h2space_core::error::CoreResult;
use h2space_core::listing::ContentQuery;
use h2space_core::repository::ContentRepository;
use h2space_core::versions::{ContentVersion, ContentVersionDetail};
use reqwest::{Method, RequestBuilder, Url};
use serde::de::DeserializeOwned;

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::session::SessionContext;

/// Multipart field name the upload endpoint expects.
const UPLOAD_FIELD: &str = "file";

/// HTTP client for one content service.
#[derive(Debug, Clone)]
pub struct ContentApi {
    client: reqwest::Client,
    base_url: Url,
    session: SessionContext,
}

impl ContentApi {
    /// Build a client from configuration.
    ///
    /// Loads `config.auth_token` into `session` when one is configured.
    pub fn new(config: &ClientConfig, session: SessionContext) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        if let Some(token) = &config.auth_token {
            session.load(token.clone());
        }
        Self::with_client(client, &config.base_url, session)
    }

    /// Create a client reusing an existing [`reqwest::Client`].
    pub fn with_client(
        client: reqwest::Client,
        base_url: &str,
        session: SessionContext,
    ) -> Result<Self, ApiError> {
        let base_url = Url::parse(base_url).map_err(|e| ApiError::InvalidUrl(e.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl(base_url.to_string()));
        }
        Ok(Self {
            client,
            base_url,
            session,
        })
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    // ---- endpoints ----

    /// `GET /contents/{id}`
    pub async fn fetch_content(&self, id: &str) -> Result<Content, ApiError> {
        let request = self.request(Method::GET, &["contents", id])?;
        self.parse_response(request).await
    }

    /// `POST /contents`
    pub async fn post_content(&self, data: &ContentFormData) -> Result<Content, ApiError> {
        let request = self.request(Method::POST, &["contents"])?.json(data);
        self.parse_response(request).await
    }

    /// `PUT /contents/{id}` with only the changed fields.
    pub async fn put_content(&self, id: &str, patch: &ContentPatch) -> Result<Content, ApiError> {
        let request = self.request(Method::PUT, &["contents", id])?.json(patch);
        self.parse_response(request).await
    }

    /// `DELETE /contents/{id}`
    pub async fn remove_content(&self, id: &str) -> Result<(), ApiError> {
        let request = self.request(Method::DELETE, &["contents", id])?;
        self.check_status(request).await
    }

    /// `GET /contents?page=..&limit=..&search=..`
    pub async fn list_contents(&self, query: &ContentQuery) -> Result<ContentPage, ApiError> {
        let request = self
            .request(Method::GET, &["contents"])?
            .query(&query.to_query_pairs());
        self.parse_response(request).await
    }

    /// `POST /media/upload` as a single-part multipart form.
    pub async fn post_media(&self, file: MediaFile) -> Result<MediaUpload, ApiError> {
        let part = reqwest::multipart::Part::bytes(file.bytes)
            .file_name(file.file_name)
            .mime_str(&file.mime_type)?;
        let form = reqwest::multipart::Form::new().part(UPLOAD_FIELD, part);
        let request = self.request(Method::POST, &["media", "upload"])?.multipart(form);
        self.parse_response(request).await
    }

    /// `GET /categories`
    pub async fn list_categories(&self) -> Result<Vec<String>, ApiError> {
        let request = self.request(Method::GET, &["categories"])?;
        self.parse_response(request).await
    }

    /// `GET /tags`
    pub async fn list_tags(&self) -> Result<Vec<String>, ApiError> {
        let request = self.request(Method::GET, &["tags"])?;
        self.parse_response(request).await
    }

    /// `GET /contents/{id}/versions`
    pub async fn list_versions(&self, content_id: &str) -> Result<Vec<ContentVersion>, ApiError> {
        let request = self.request(Method::GET, &["contents", content_id, "versions"])?;
        self.parse_response(request).await
    }

    /// `GET /contents/{id}/versions/{version_id}`
    pub async fn fetch_version(
        &self,
        content_id: &str,
        version_id: &str,
    ) -> Result<ContentVersionDetail, ApiError> {
        let request =
            self.request(Method::GET, &["contents", content_id, "versions", version_id])?;
        self.parse_response(request).await
    }

    /// `POST /contents/{id}/view`
    pub async fn post_view(&self, id: &str) -> Result<(), ApiError> {
        let request = self.request(Method::POST, &["contents", id, "view"])?;
        self.check_status(request).await
    }

    /// `GET /contents/{id}/analytics`
    pub async fn fetch_analytics(&self, id: &str) -> Result<ContentAnalytics, ApiError> {
        let request = self.request(Method::GET, &["contents", id, "analytics"])?;
        self.parse_response(request).await
    }

    // ---- private helpers ----

    /// Append path segments to the base URL, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder, ApiError> {
        let url = self.endpoint(segments)?;
        tracing::debug!(%method, %url, "Content service request");
        let request = self.client.request(method, url);
        Ok(match self.session.bearer_token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        })
    }

    /// Send the request and ensure a success status. A 401 clears the
    /// session before the error is returned.
    async fn ensure_success(&self, request: RequestBuilder) -> Result<reqwest::Response, ApiError> {
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            if status == reqwest::StatusCode::UNAUTHORIZED {
                tracing::warn!("Content service rejected credentials, clearing session");
                self.session.clear();
            }
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Send the request and parse a successful JSON response body.
    async fn parse_response<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, ApiError> {
        let response = self.ensure_success(request).await?;
        Ok(response.json::<T>().await?)
    }

    /// Send the request and discard the body of a successful response.
    async fn check_status(&self, request: RequestBuilder) -> Result<(), ApiError> {
        self.ensure_success(request).await?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// ContentRepository
// ---------------------------------------------------------------------------

#[async_trait]
impl ContentRepository for ContentApi {
    async fn get_content(&self, id: &str) -> CoreResult<Content> {
        self.fetch_content(id)
            .await
            .map_err(|e| e.into_core("content", id))
    }

    async fn create_content(&self, data: &ContentFormData) -> CoreResult<Content> {
        self.post_content(data)
            .await
            .map_err(|e| e.into_core("content", ""))
    }

    async fn update_content(&self, id: &str, patch: &ContentPatch) -> CoreResult<Content> {
        self.put_content(id, patch)
            .await
            .map_err(|e| e.into_core("content", id))
    }

    async fn delete_content(&self, id: &str) -> CoreResult<()> {
        self.remove_content(id)
            .await
            .map_err(|e| e.into_core("content", id))
    }

    async fn upload_media(&self, file: MediaFile) -> CoreResult<MediaUpload> {
        let name = file.file_name.clone();
        self.post_media(file)
            .await
            .map_err(|e| e.into_core("media", &name))
    }

    async fn get_categories(&self) -> CoreResult<Vec<String>> {
        self.list_categories()
            .await
            .map_err(|e| e.into_core("categories", ""))
    }

    async fn get_tags(&self) -> CoreResult<Vec<String>> {
        self.list_tags().await.map_err(|e| e.into_core("tags", ""))
    }

    async fn get_contents(&self, query: &ContentQuery) -> CoreResult<ContentPage> {
        self.list_contents(query)
            .await
            .map_err(|e| e.into_core("contents", ""))
    }

    async fn get_versions(&self, content_id: &str) -> CoreResult<Vec<ContentVersion>> {
        self.list_versions(content_id)
            .await
            .map_err(|e| e.into_core("content", content_id))
    }

    async fn get_version(
        &self,
        content_id: &str,
        version_id: &str,
    ) -> CoreResult<ContentVersionDetail> {
        self.fetch_version(content_id, version_id)
            .await
            .map_err(|e| e.into_core("version", version_id))
    }

    async fn track_view(&self, id: &str) -> CoreResult<()> {
        self.post_view(id)
            .await
            .map_err(|e| e.into_core("content", id))
    }

    async fn get_analytics(&self, id: &str) -> CoreResult<ContentAnalytics> {
        self.fetch_analytics(id)
            .await
            .map_err(|e| e.into_core("content", id))
    }
}
