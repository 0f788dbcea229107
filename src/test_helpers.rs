//! Shared test utilities for the inpage test suite.
//!
//! Provides a sample page, tiny image files, and recording doubles for the
//! three seams the editor talks through: [`MockCms`] for the CMS API,
//! [`CountingPreviews`] for preview references and [`CountingHook`] for the
//! unload hook.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let api = MockCms::new();
//! api.push_patch(Err(ApiError::Rejected { status: 500, message: "boom".into() }));
//! // ... run a save ...
//! assert_eq!(api.calls().len(), 1);
//! ```

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::api::{ApiError, CmsApi, PagePatch, PatchOutcome};
use crate::guard::UnloadHook;
use crate::richtext;
use crate::staging::{LocalFile, PreviewRef, PreviewStore};
use crate::types::{CallToAction, LinkType, MediaRef, PageSnapshot};

// =========================================================================
// Fixtures
// =========================================================================

/// A fully populated, saveable home page.
pub fn sample_page() -> PageSnapshot {
    PageSnapshot {
        id: "1".into(),
        slug: "home".into(),
        title: "Home".into(),
        hero_headline: "Websites that work".into(),
        hero_subheadline: "Design, build and care for your site".into(),
        hero_cta: CallToAction {
            text: "Learn more".into(),
            link_type: LinkType::Anchor,
            internal_page: None,
            external_url: None,
            anchor_id: Some("about".into()),
            new_tab: None,
        },
        hero_image: MediaRef {
            id: "2".into(),
            alt: "Laptop on a desk".into(),
            url: "/media/hero.png".into(),
            updated_at: Some("2024-05-01T10:00:00.000Z".into()),
        },
        about_heading: "About us".into(),
        about_body: richtext::from_plain_text("We are a small studio."),
        about_image: MediaRef {
            id: "3".into(),
            alt: "The team".into(),
            url: "/media/team.png".into(),
            updated_at: Some("2024-05-01T11:00:00.000Z".into()),
        },
        updated_at: "2024-05-02T09:30:00.000Z".into(),
    }
}

/// A file whose bytes start with the PNG signature.
pub fn png_file(name: &str) -> LocalFile {
    let mut bytes = b"\x89PNG\r\n\x1a\n".to_vec();
    bytes.extend_from_slice(name.as_bytes());
    LocalFile::new(name, bytes)
}

// =========================================================================
// Preview store and unload hook doubles
// =========================================================================

#[derive(Debug, Default)]
pub struct PreviewCounts {
    pub created: usize,
    pub released: Vec<PreviewRef>,
}

/// Preview store that records every create and release.
///
/// Counts live behind an `Arc` so they stay readable after the store has
/// been moved into (and dropped with) a `MediaStaging`.
#[derive(Debug, Default)]
pub struct CountingPreviews {
    counts: Arc<Mutex<PreviewCounts>>,
}

impl CountingPreviews {
    pub fn counts(&self) -> Arc<Mutex<PreviewCounts>> {
        Arc::clone(&self.counts)
    }
}

impl PreviewStore for CountingPreviews {
    fn create(&mut self, file: &LocalFile) -> PreviewRef {
        let mut c = self.counts.lock().unwrap();
        c.created += 1;
        PreviewRef::new(format!("test:{}#{}", file.name, c.created))
    }

    fn release(&mut self, preview: PreviewRef) {
        let mut c = self.counts.lock().unwrap();
        assert!(
            !c.released.contains(&preview),
            "preview {preview} released twice"
        );
        c.released.push(preview);
    }
}

/// Unload hook recording `(registrations, deregistrations)`.
#[derive(Debug, Default)]
pub struct CountingHook {
    counts: Arc<Mutex<(usize, usize)>>,
}

impl CountingHook {
    pub fn counts(&self) -> Arc<Mutex<(usize, usize)>> {
        Arc::clone(&self.counts)
    }
}

impl UnloadHook for CountingHook {
    fn register(&mut self) {
        self.counts.lock().unwrap().0 += 1;
    }

    fn deregister(&mut self) {
        self.counts.lock().unwrap().1 += 1;
    }
}

// =========================================================================
// Mock CMS
// =========================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCall {
    Upload { file: String, alt: String },
    Patch { id: String, patch: PagePatch },
    FetchPage(String),
    CurrentRole,
}

/// CMS double that records calls and replays scripted results.
///
/// When no result is queued, uploads succeed with `m<n>` ids and patches
/// succeed with timestamp `patched-<n>`.
#[derive(Default)]
pub struct MockCms {
    calls: Mutex<Vec<RecordedCall>>,
    uploads: Mutex<VecDeque<Result<MediaRef, ApiError>>>,
    patches: Mutex<VecDeque<Result<PatchOutcome, ApiError>>>,
    pub page: Option<PageSnapshot>,
    pub role: Option<String>,
}

impl MockCms {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(page: PageSnapshot, role: Option<&str>) -> Self {
        Self {
            page: Some(page),
            role: role.map(String::from),
            ..Self::default()
        }
    }

    pub fn push_upload(&self, result: Result<MediaRef, ApiError>) {
        self.uploads.lock().unwrap().push_back(result);
    }

    pub fn push_patch(&self, result: Result<PatchOutcome, ApiError>) {
        self.patches.lock().unwrap().push_back(result);
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: RecordedCall) -> usize {
        let mut calls = self.calls.lock().unwrap();
        calls.push(call);
        calls.len()
    }
}

impl CmsApi for MockCms {
    async fn upload_media(&self, file: &LocalFile, alt: &str) -> Result<MediaRef, ApiError> {
        let n = self.record(RecordedCall::Upload {
            file: file.name.clone(),
            alt: alt.to_string(),
        });
        self.uploads.lock().unwrap().pop_front().unwrap_or_else(|| {
            Ok(MediaRef {
                id: format!("m{n}"),
                alt: alt.to_string(),
                url: format!("/media/{}", file.name),
                updated_at: Some(format!("uploaded-{n}")),
            })
        })
    }

    async fn patch_page(&self, id: &str, patch: &PagePatch) -> Result<PatchOutcome, ApiError> {
        let n = self.record(RecordedCall::Patch {
            id: id.to_string(),
            patch: patch.clone(),
        });
        self.patches.lock().unwrap().pop_front().unwrap_or_else(|| {
            Ok(PatchOutcome {
                updated_at: format!("patched-{n}"),
            })
        })
    }

    async fn fetch_page(&self, slug: &str) -> Result<PageSnapshot, ApiError> {
        self.record(RecordedCall::FetchPage(slug.to_string()));
        self.page
            .clone()
            .filter(|p| p.slug == slug)
            .ok_or_else(|| ApiError::NotFound(slug.to_string()))
    }

    async fn current_role(&self) -> Result<Option<String>, ApiError> {
        self.record(RecordedCall::CurrentRole);
        Ok(self.role.clone())
    }
}
