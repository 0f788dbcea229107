//! Media staging: locally selected replacement images waiting to be saved.
//!
//! Each image slot ([`Slot::Hero`], [`Slot::About`]) holds at most one
//! [`StagedMedia`]: the selected file, a preview reference the renderer can
//! show immediately, and the caption the user has typed so far.
//!
//! # Preview ownership
//!
//! Preview references are resources (object URLs in a browser, temp files or
//! handles elsewhere) that are not reclaimed automatically. [`MediaStaging`]
//! owns every reference it creates and hands it back to its [`PreviewStore`]
//! exactly once, on whichever path retires the staged item:
//!
//! ```text
//! select (supersede)  → old preview released, new one created
//! clear / discard     → preview released
//! successful save     → preview released for each uploaded slot
//! drop                → any remaining previews released
//! ```
//!
//! A newly selected image always starts with an empty caption, so a caption
//! written for a previous selection never silently carries over.

use crate::types::{MediaRef, PageSnapshot};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, warn};

/// One of the two image-bearing positions on the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    Hero,
    About,
}

impl Slot {
    pub const ALL: [Slot; 2] = [Slot::Hero, Slot::About];

    pub fn as_str(self) -> &'static str {
        match self {
            Slot::Hero => "hero",
            Slot::About => "about",
        }
    }

    /// The committed media reference occupying this slot on `page`.
    pub fn media(self, page: &PageSnapshot) -> &MediaRef {
        match self {
            Slot::Hero => &page.hero_image,
            Slot::About => &page.about_image,
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Slot {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hero" => Ok(Slot::Hero),
            "about" => Ok(Slot::About),
            other => Err(format!("unknown image slot '{other}' (expected hero or about)")),
        }
    }
}

/// A file held in memory until it is uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFile {
    /// File name sent with the upload.
    pub name: String,
    pub bytes: Vec<u8>,
    /// Where the file was read from, if it came from disk.
    pub path: Option<PathBuf>,
}

impl LocalFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
            path: None,
        }
    }

    /// Read a file from disk.
    pub fn read(path: &Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        Ok(Self {
            name,
            bytes,
            path: Some(path.to_path_buf()),
        })
    }

    /// MIME type sniffed from the file's magic bytes.
    ///
    /// Falls back to the extension, then to `application/octet-stream`.
    pub fn mime_type(&self) -> &'static str {
        image::guess_format(&self.bytes)
            .ok()
            .or_else(|| image::ImageFormat::from_path(&self.name).ok())
            .map(|f| f.to_mime_type())
            .unwrap_or("application/octet-stream")
    }

    /// SHA-256 of the contents as lowercase hex.
    pub fn content_hash(&self) -> String {
        format!("{:x}", Sha256::digest(&self.bytes))
    }
}

/// A revocable reference used to display a staged file before upload.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PreviewRef(String);

impl PreviewRef {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PreviewRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Creates and releases preview references.
pub trait PreviewStore {
    fn create(&mut self, file: &LocalFile) -> PreviewRef;

    /// Release a reference previously returned by [`create`](Self::create).
    fn release(&mut self, preview: PreviewRef);
}

/// Default preview store: URL-shaped references tracked in a live set.
///
/// Files read from disk preview as `file://` URLs (so a rendered preview page
/// shows them); in-memory files get `blob:inpage/<hash>-<n>` references.
/// Every reference carries a sequence number so re-selecting the same file
/// yields a distinct reference.
#[derive(Debug, Default)]
pub struct ObjectUrls {
    next: u64,
    live: HashSet<PreviewRef>,
}

impl ObjectUrls {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of references created and not yet released.
    pub fn live_count(&self) -> usize {
        self.live.len()
    }
}

impl PreviewStore for ObjectUrls {
    fn create(&mut self, file: &LocalFile) -> PreviewRef {
        self.next += 1;
        let file_url = file
            .path
            .as_deref()
            .and_then(|p| std::path::absolute(p).ok())
            .and_then(|p| url::Url::from_file_path(p).ok());
        let preview = match file_url {
            Some(mut url) => {
                url.set_fragment(Some(&self.next.to_string()));
                PreviewRef::new(url.to_string())
            }
            None => {
                let hash = file.content_hash();
                PreviewRef::new(format!("blob:inpage/{}-{}", &hash[..12], self.next))
            }
        };
        self.live.insert(preview.clone());
        preview
    }

    fn release(&mut self, preview: PreviewRef) {
        if !self.live.remove(&preview) {
            warn!(preview = %preview, "released a preview reference that was not live");
        }
    }
}

/// A replacement image selected for a slot but not yet uploaded.
#[derive(Debug)]
pub struct StagedMedia {
    file: LocalFile,
    preview: PreviewRef,
    caption: String,
}

impl StagedMedia {
    pub fn file(&self) -> &LocalFile {
        &self.file
    }

    pub fn preview(&self) -> &PreviewRef {
        &self.preview
    }

    pub fn caption(&self) -> &str {
        &self.caption
    }

    /// Caption with surrounding whitespace removed, as it will be uploaded.
    pub fn trimmed_caption(&self) -> &str {
        self.caption.trim()
    }
}

/// Staged media for both slots plus the store that owns their previews.
#[derive(Debug)]
pub struct MediaStaging<P: PreviewStore> {
    previews: P,
    hero: Option<StagedMedia>,
    about: Option<StagedMedia>,
}

impl<P: PreviewStore> MediaStaging<P> {
    pub fn new(previews: P) -> Self {
        Self {
            previews,
            hero: None,
            about: None,
        }
    }

    fn slot_mut(&mut self, slot: Slot) -> &mut Option<StagedMedia> {
        match slot {
            Slot::Hero => &mut self.hero,
            Slot::About => &mut self.about,
        }
    }

    pub fn get(&self, slot: Slot) -> Option<&StagedMedia> {
        match slot {
            Slot::Hero => self.hero.as_ref(),
            Slot::About => self.about.as_ref(),
        }
    }

    pub fn is_staged(&self, slot: Slot) -> bool {
        self.get(slot).is_some()
    }

    pub fn any_staged(&self) -> bool {
        Slot::ALL.iter().any(|s| self.is_staged(*s))
    }

    pub fn previews(&self) -> &P {
        &self.previews
    }

    /// Stage `file` for `slot`, superseding (and releasing) whatever was
    /// staged there. The caption starts empty.
    pub fn select(&mut self, slot: Slot, file: LocalFile) -> &StagedMedia {
        let preview = self.previews.create(&file);
        debug!(slot = %slot, file = %file.name, preview = %preview, "staged image");
        if let Some(old) = self.slot_mut(slot).take() {
            self.previews.release(old.preview);
        }
        self.slot_mut(slot).insert(StagedMedia {
            file,
            preview,
            caption: String::new(),
        })
    }

    /// Update the caption of the staged item in `slot`.
    ///
    /// Returns `false` (and changes nothing) when the slot is empty.
    pub fn set_caption(&mut self, slot: Slot, text: impl Into<String>) -> bool {
        match self.slot_mut(slot) {
            Some(staged) => {
                staged.caption = text.into();
                true
            }
            None => false,
        }
    }

    /// Remove the staged item in `slot`, releasing its preview.
    ///
    /// Returns whether anything was staged.
    pub fn clear(&mut self, slot: Slot) -> bool {
        match self.slot_mut(slot).take() {
            Some(staged) => {
                debug!(slot = %slot, preview = %staged.preview, "released staged image");
                self.previews.release(staged.preview);
                true
            }
            None => false,
        }
    }

    pub fn clear_all(&mut self) {
        for slot in Slot::ALL {
            self.clear(slot);
        }
    }

    /// Image source to display for `slot`.
    ///
    /// The staged preview when there is one; otherwise the committed image
    /// URL with a cache-busting `v` parameter taken from the image's
    /// timestamp, or the page's when the image has none.
    pub fn display_src(&self, slot: Slot, page: &PageSnapshot) -> String {
        match self.get(slot) {
            Some(staged) => staged.preview.as_str().to_string(),
            None => cache_busted_url(slot.media(page), &page.updated_at),
        }
    }

    /// Caption to display for `slot`: the staged caption when non-empty,
    /// else the committed one.
    pub fn display_alt<'a>(&'a self, slot: Slot, page: &'a PageSnapshot) -> &'a str {
        match self.get(slot) {
            Some(staged) if !staged.caption.is_empty() => &staged.caption,
            _ => &slot.media(page).alt,
        }
    }
}

impl<P: PreviewStore> Drop for MediaStaging<P> {
    fn drop(&mut self) {
        self.clear_all();
    }
}

/// Bytes escaped in a URI component: all but `A-Z a-z 0-9 - _ . ! ~ * ' ( )`.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// `<url>?v=<timestamp>` with the timestamp encoded as a URI component.
pub fn cache_busted_url(media: &MediaRef, fallback_timestamp: &str) -> String {
    let stamp = media.updated_at.as_deref().unwrap_or(fallback_timestamp);
    format!("{}?v={}", media.url, utf8_percent_encode(stamp, URI_COMPONENT))
}
