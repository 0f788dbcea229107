//! Save pipeline: the only code path that writes to the CMS.
//!
//! ```text
//! validate ──► upload staged images ──► build patch ──► patch page ──► reconcile
//!    │               │ (hero, then about)                 │
//!    ▼               ▼                                    ▼
//!  Validation      Upload{slot}                         Patch
//! ```
//!
//! Each step returns a `Result` and the first failure ends the save. Nothing
//! becomes visible until the patch has succeeded: the committed snapshot,
//! the draft and the staged images are only touched in the final
//! reconcile step. A failed save therefore leaves the session exactly as it
//! was, ready for another attempt.
//!
//! Media uploaded before a failed patch is not rolled back, and the staged
//! images stay staged, so a retry uploads them again.

use crate::api::{ApiError, CmsApi, PagePatch, PatchOutcome};
use crate::draft::DraftStore;
use crate::staging::{MediaStaging, PreviewStore, Slot, StagedMedia};
use crate::types::{MediaRef, PageSnapshot};
use crate::validate::{self, ValidationError};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum SaveError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("{slot} image upload failed: {source}")]
    Upload { slot: Slot, source: ApiError },
    #[error("save failed: {0}")]
    Patch(#[source] ApiError),
}

/// Result of a successful save.
#[derive(Debug, Clone, PartialEq)]
pub struct SaveReport {
    /// The new committed snapshot (also the new draft).
    pub committed: PageSnapshot,
    /// Images uploaded during this save, in upload order.
    pub uploaded: Vec<(Slot, MediaRef)>,
}

/// Upload one staged image.
///
/// Refuses locally, without calling `api`, when the caption is blank.
pub async fn upload_staged<A: CmsApi>(
    api: &A,
    slot: Slot,
    staged: &StagedMedia,
) -> Result<MediaRef, SaveError> {
    let caption = staged.trimmed_caption();
    if caption.is_empty() {
        return Err(SaveError::Upload {
            slot,
            source: ApiError::MissingCaption,
        });
    }
    debug!(slot = %slot, file = %staged.file().name, "uploading staged image");
    api.upload_media(staged.file(), caption)
        .await
        .map_err(|source| SaveError::Upload { slot, source })
}

/// The media a slot should reference after this save.
fn media_for<'a>(
    uploads: &'a [(Slot, MediaRef)],
    slot: Slot,
    draft: &'a PageSnapshot,
) -> &'a MediaRef {
    uploads
        .iter()
        .find(|(s, _)| *s == slot)
        .map(|(_, m)| m)
        .unwrap_or_else(|| slot.media(draft))
}

/// Build the patch for `draft`, preferring freshly uploaded media.
pub fn build_patch(draft: &PageSnapshot, uploads: &[(Slot, MediaRef)]) -> PagePatch {
    PagePatch::new(
        draft,
        media_for(uploads, Slot::Hero, draft),
        media_for(uploads, Slot::About, draft),
    )
}

/// The snapshot the CMS now holds: the draft, with new media and timestamp.
pub fn reconcile(
    draft: &PageSnapshot,
    uploads: &[(Slot, MediaRef)],
    outcome: &PatchOutcome,
) -> PageSnapshot {
    let mut committed = draft.clone();
    committed.hero_image = media_for(uploads, Slot::Hero, draft).clone();
    committed.about_image = media_for(uploads, Slot::About, draft).clone();
    committed.updated_at = outcome.updated_at.clone();
    committed
}

/// Validate, upload, patch and commit.
pub async fn save<A: CmsApi, P: PreviewStore>(
    api: &A,
    store: &mut DraftStore,
    staging: &mut MediaStaging<P>,
) -> Result<SaveReport, SaveError> {
    validate::can_save(store.draft(), staging)?;

    let mut uploads = Vec::new();
    for slot in Slot::ALL {
        if let Some(staged) = staging.get(slot) {
            let media = match upload_staged(api, slot, staged).await {
                Ok(media) => media,
                Err(e) => {
                    if !uploads.is_empty() {
                        warn!(
                            %slot,
                            uploaded = uploads.len(),
                            "upload failed after an earlier upload; uploaded media is left unreferenced"
                        );
                    }
                    return Err(e);
                }
            };
            info!(slot = %slot, media_id = %media.id, "uploaded image");
            uploads.push((slot, media));
        }
    }

    let draft = store.draft();
    let patch = build_patch(draft, &uploads);
    let outcome = match api.patch_page(&draft.id, &patch).await {
        Ok(outcome) => outcome,
        Err(e) => {
            if !uploads.is_empty() {
                warn!(
                    uploaded = uploads.len(),
                    "page patch failed after media upload; uploaded media is left unreferenced"
                );
            }
            return Err(SaveError::Patch(e));
        }
    };

    let committed = reconcile(draft, &uploads, &outcome);
    store.commit(committed.clone());
    for (slot, _) in &uploads {
        staging.clear(*slot);
    }
    info!(page = %committed.slug, updated_at = %committed.updated_at, "page saved");

    Ok(SaveReport {
        committed,
        uploaded: uploads,
    })
}
