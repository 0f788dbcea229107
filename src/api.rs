//! The CMS REST API: collaborator contract and HTTP client.
//!
//! [`CmsApi`] is the seam between the editing core and the network. The save
//! pipeline only ever talks to this trait, which lets tests substitute a
//! recording mock and assert that no request was made.
//!
//! [`HttpCms`] implements it against a Payload-style REST API:
//!
//! | Operation | Request | Success body |
//! |-----------|---------|--------------|
//! | upload media | `POST /api/media` multipart `file`, `alt` | `{doc: {id, alt, url, updatedAt}}` |
//! | patch page | `PATCH /api/pages/<id>` JSON [`PagePatch`] | `{doc: {updatedAt}}` |
//! | fetch page | `GET /api/pages?where[slug][equals]=<slug>&limit=1&depth=1` | `{docs: [page]}` |
//! | current role | `GET /api/users/me` | `{user: {role} \| null}` |
//!
//! Requests are credentialed with `Authorization: JWT <token>` when a token
//! is configured; the CMS enforces access on both write endpoints.
//!
//! ## Error messages
//!
//! Failures carry one human-readable message chosen by
//! [`extract_error_message`] from the response body, most specific first:
//!
//! ```text
//! {"errors": [{"message": "...", "data": {"errors": [{"field": "alt", "message": "..."}]}}]}
//!                                                      ^^^^^^^^^^^^ 1. field-level
//!              ^^^^^^^^^^^^^^ 2. top-level (errors[].message, then message)
//! 3. "Request failed with status <code>"
//! ```

use crate::config::ApiConfig;
use crate::normalize::{self, NormalizeError};
use crate::staging::LocalFile;
use crate::types::{CallToAction, MediaRef, PageSnapshot, RichText};
use reqwest::{RequestBuilder, Response, multipart};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;
use url::Url;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("alt text is required")]
    MissingCaption,
    #[error("{message}")]
    Rejected { status: u16, message: String },
    #[error("page '{0}' not found")]
    NotFound(String),
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("unexpected response: {0}")]
    Decode(String),
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),
    #[error("unexpected document shape: {0}")]
    Normalize(#[from] NormalizeError),
}

/// Partial update of the page document written by a save.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PagePatch {
    pub hero_headline: String,
    pub hero_subheadline: String,
    pub hero_cta: CallToAction,
    /// Media id of the hero image.
    pub hero_image: String,
    pub about_heading: String,
    pub about_body: RichText,
    /// Media id of the about image.
    pub about_image: String,
}

impl PagePatch {
    /// Text fields from `draft`, images by id.
    pub fn new(draft: &PageSnapshot, hero_image: &MediaRef, about_image: &MediaRef) -> Self {
        Self {
            hero_headline: draft.hero_headline.clone(),
            hero_subheadline: draft.hero_subheadline.clone(),
            hero_cta: draft.hero_cta.clone(),
            hero_image: hero_image.id.clone(),
            about_heading: draft.about_heading.clone(),
            about_body: draft.about_body.clone(),
            about_image: about_image.id.clone(),
        }
    }
}

/// What a successful patch reports back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchOutcome {
    pub updated_at: String,
}

/// Operations the editor consumes from the CMS.
#[allow(async_fn_in_trait)]
pub trait CmsApi {
    /// Upload `file` as a new media document captioned `alt`.
    async fn upload_media(&self, file: &LocalFile, alt: &str) -> Result<MediaRef, ApiError>;

    /// Partially update page `id`.
    async fn patch_page(&self, id: &str, patch: &PagePatch) -> Result<PatchOutcome, ApiError>;

    /// Load the page with `slug`, relations expanded one level.
    async fn fetch_page(&self, slug: &str) -> Result<PageSnapshot, ApiError>;

    /// Role of the authenticated user, `None` when anonymous.
    async fn current_role(&self) -> Result<Option<String>, ApiError>;
}

/// Pick the most specific human-readable message out of an error body.
pub fn extract_error_message(status: u16, body: &str) -> String {
    let generic = || format!("Request failed with status {status}");
    let Ok(json) = serde_json::from_str::<Value>(body) else {
        return generic();
    };
    let errors = json
        .get("errors")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[]);

    let field_messages: Vec<String> = errors
        .iter()
        .filter_map(|e| e.pointer("/data/errors").and_then(Value::as_array))
        .flatten()
        .filter_map(|fe| {
            let message = fe.get("message").and_then(Value::as_str)?;
            Some(match fe.get("field").and_then(Value::as_str) {
                Some(field) if !field.is_empty() => format!("{field}: {message}"),
                _ => message.to_string(),
            })
        })
        .collect();
    if !field_messages.is_empty() {
        return field_messages.join("; ");
    }

    errors
        .iter()
        .find_map(|e| e.get("message").and_then(Value::as_str))
        .or_else(|| json.get("message").and_then(Value::as_str))
        .filter(|m| !m.trim().is_empty())
        .map(String::from)
        .unwrap_or_else(generic)
}

/// Turn a non-success response into [`ApiError::Rejected`].
async fn ensure_success(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = extract_error_message(status.as_u16(), &body);
    debug!(status = status.as_u16(), %message, "CMS rejected request");
    Err(ApiError::Rejected {
        status: status.as_u16(),
        message,
    })
}

/// Pull `doc` out of a `{doc: ...}` envelope.
fn take_doc(mut body: Value) -> Result<Value, ApiError> {
    match body.get_mut("doc") {
        Some(doc) if doc.is_object() => Ok(doc.take()),
        _ => Err(ApiError::Decode("response has no `doc` object".into())),
    }
}

/// Reqwest-backed [`CmsApi`].
#[derive(Debug, Clone)]
pub struct HttpCms {
    client: reqwest::Client,
    root: Url,
    token: Option<String>,
}

impl HttpCms {
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("inpage/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            root: site_root(&config.base_url, &config.base_path)?,
            token: config.token.clone().filter(|t| !t.is_empty()),
        })
    }

    /// Site root all API paths are resolved against.
    pub fn root(&self) -> &Url {
        &self.root
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.root.join("api/")?.join(path)?)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.header(reqwest::header::AUTHORIZATION, format!("JWT {token}")),
            None => request,
        }
    }
}

/// `base_url` + `base_path`, with a trailing slash so relative joins nest.
pub fn site_root(base_url: &str, base_path: &str) -> Result<Url, url::ParseError> {
    let path = base_path.trim_matches('/');
    let relative = if path.is_empty() {
        "/".to_string()
    } else {
        format!("/{path}/")
    };
    Url::parse(base_url)?.join(&relative)
}

impl CmsApi for HttpCms {
    async fn upload_media(&self, file: &LocalFile, alt: &str) -> Result<MediaRef, ApiError> {
        let alt = alt.trim();
        if alt.is_empty() {
            return Err(ApiError::MissingCaption);
        }
        let part = multipart::Part::bytes(file.bytes.clone())
            .file_name(file.name.clone())
            .mime_str(file.mime_type())?;
        let form = multipart::Form::new()
            .part("file", part)
            .text("alt", alt.to_string());

        let url = self.endpoint("media")?;
        debug!(%url, file = %file.name, bytes = file.bytes.len(), "uploading media");
        let response = self
            .authorize(self.client.post(url))
            .multipart(form)
            .send()
            .await?;
        let body: Value = ensure_success(response).await?.json().await?;
        Ok(normalize::media(&take_doc(body)?, "doc")?)
    }

    async fn patch_page(&self, id: &str, patch: &PagePatch) -> Result<PatchOutcome, ApiError> {
        let url = self.endpoint(&format!("pages/{id}"))?;
        debug!(%url, "patching page");
        let response = self
            .authorize(self.client.patch(url))
            .json(patch)
            .send()
            .await?;
        let body: Value = ensure_success(response).await?.json().await?;
        let doc = take_doc(body)?;
        let updated_at = doc
            .get("updatedAt")
            .and_then(Value::as_str)
            .ok_or_else(|| ApiError::Decode("patched document has no `updatedAt`".into()))?;
        Ok(PatchOutcome {
            updated_at: updated_at.to_string(),
        })
    }

    async fn fetch_page(&self, slug: &str) -> Result<PageSnapshot, ApiError> {
        let mut url = self.endpoint("pages")?;
        url.query_pairs_mut()
            .append_pair("where[slug][equals]", slug)
            .append_pair("limit", "1")
            .append_pair("depth", "1");
        debug!(%url, "fetching page");
        let response = self.authorize(self.client.get(url)).send().await?;
        let body: Value = ensure_success(response).await?.json().await?;
        let doc = body
            .get("docs")
            .and_then(Value::as_array)
            .and_then(|docs| docs.first())
            .ok_or_else(|| ApiError::NotFound(slug.to_string()))?;
        Ok(normalize::page(doc)?)
    }

    async fn current_role(&self) -> Result<Option<String>, ApiError> {
        let url = self.endpoint("users/me")?;
        let response = self.authorize(self.client.get(url)).send().await?;
        let body: Value = ensure_success(response).await?.json().await?;
        Ok(body
            .pointer("/user/role")
            .and_then(Value::as_str)
            .map(String::from))
    }
}
