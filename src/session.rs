//! Editing session: edit mode, the discard flow and the save entry point.
//!
//! # State machine
//!
//! ```text
//!                 enter                 edit (dirty)
//!  NotEditing ───────────► EditingClean ─────────────► EditingDirty
//!      ▲  ▲                 │  ▲    ▲   edit (clean)      │  │  ▲
//!      │  └──── exit ───────┘  │    └────────────────────┘  │  │
//!      │                       └───────── saved ────────────┘  │ cancel
//!      │                                                 exit  ▼  │
//!      └─────────────── confirm (revert + release) ──── ConfirmDiscard
//! ```
//!
//! Transitions are computed by the pure [`transition`] function; the
//! session applies the side effects that go with them (reverting the draft,
//! releasing staged previews, syncing the navigation guard). Whether the
//! session is clean or dirty is always recomputed from content, so editing a
//! field back to its committed value returns to `EditingClean`.

use crate::api::{ApiError, CmsApi};
use crate::draft::{self, DraftStore, Edit};
use crate::guard::{NavigationGuard, UnloadHook};
use crate::save::{self, SaveError, SaveReport};
use crate::staging::{LocalFile, MediaStaging, PreviewStore, Slot};
use crate::types::PageSnapshot;
use std::fmt;
use thiserror::Error;
use tracing::{debug, info};

/// Roles allowed to enter edit mode.
pub const EDITOR_ROLES: &[&str] = &["admin", "owner"];

/// Whether a viewer with `role` may edit pages.
pub fn can_user_edit(role: Option<&str>) -> bool {
    role.is_some_and(|r| EDITOR_ROLES.contains(&r))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    NotEditing,
    EditingClean,
    EditingDirty,
    ConfirmDiscard,
}

impl Mode {
    /// Editing with the editor accepting input (no dialog open).
    pub fn accepts_edits(self) -> bool {
        matches!(self, Mode::EditingClean | Mode::EditingDirty)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Mode::NotEditing => "not editing",
            Mode::EditingClean => "editing (no changes)",
            Mode::EditingDirty => "editing (unsaved changes)",
            Mode::ConfirmDiscard => "confirming discard",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Enter,
    /// Any change to the draft or staged media; carries the resulting dirty flag.
    Mutated { dirty: bool },
    Exit,
    ConfirmDiscard,
    CancelDiscard,
    Saved,
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Event::Enter => "enter edit mode",
            Event::Mutated { .. } => "edit",
            Event::Exit => "exit edit mode",
            Event::ConfirmDiscard => "confirm discard",
            Event::CancelDiscard => "cancel discard",
            Event::Saved => "save",
        })
    }
}

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("you do not have permission to edit this page")]
    NotPermitted,
    #[error("cannot {event} while {mode}")]
    InvalidTransition { mode: Mode, event: Event },
    #[error(transparent)]
    Save(#[from] SaveError),
}

/// Next mode for `event`, or an error when the event is not allowed.
pub fn transition(mode: Mode, event: Event) -> Result<Mode, SessionError> {
    use Mode::*;
    let next = match (mode, event) {
        (NotEditing, Event::Enter) => EditingClean,
        (EditingClean | EditingDirty, Event::Enter) => mode,
        (EditingClean | EditingDirty, Event::Mutated { dirty: true }) => EditingDirty,
        (EditingClean | EditingDirty, Event::Mutated { dirty: false }) => EditingClean,
        (EditingClean, Event::Exit) => NotEditing,
        (EditingDirty, Event::Exit) => ConfirmDiscard,
        (ConfirmDiscard, Event::ConfirmDiscard) => NotEditing,
        (ConfirmDiscard, Event::CancelDiscard) => EditingDirty,
        (EditingClean | EditingDirty, Event::Saved) => EditingClean,
        _ => return Err(SessionError::InvalidTransition { mode, event }),
    };
    Ok(next)
}

/// One editor working on one page.
#[derive(Debug)]
pub struct EditingSession<P: PreviewStore, H: UnloadHook> {
    can_edit: bool,
    mode: Mode,
    store: DraftStore,
    staging: MediaStaging<P>,
    guard: NavigationGuard<H>,
}

impl<P: PreviewStore, H: UnloadHook> EditingSession<P, H> {
    /// `can_edit` comes from the role lookup done when the page is loaded.
    pub fn new(page: PageSnapshot, can_edit: bool, previews: P, hook: H) -> Self {
        Self {
            can_edit,
            mode: Mode::NotEditing,
            store: DraftStore::new(page),
            staging: MediaStaging::new(previews),
            guard: NavigationGuard::new(hook),
        }
    }

    /// Fetch the page at `slug` and the viewer's role, and start a session on it.
    pub async fn open<A: CmsApi>(
        api: &A,
        slug: &str,
        previews: P,
        hook: H,
    ) -> Result<Self, ApiError> {
        let page = api.fetch_page(slug).await?;
        let role = api.current_role().await?;
        let can_edit = can_user_edit(role.as_deref());
        info!(
            page = %page.slug,
            role = role.as_deref().unwrap_or("anonymous"),
            can_edit,
            "page loaded"
        );
        Ok(Self::new(page, can_edit, previews, hook))
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn can_edit(&self) -> bool {
        self.can_edit
    }

    pub fn draft(&self) -> &PageSnapshot {
        self.store.draft()
    }

    pub fn committed(&self) -> &PageSnapshot {
        self.store.committed()
    }

    pub fn staging(&self) -> &MediaStaging<P> {
        &self.staging
    }

    pub fn is_dirty(&self) -> bool {
        draft::is_dirty(
            self.store.draft(),
            self.store.committed(),
            self.staging.is_staged(Slot::Hero),
            self.staging.is_staged(Slot::About),
        )
    }

    /// Whether leaving the editor right now should be confirmed first.
    pub fn needs_leave_confirmation(&self) -> bool {
        self.guard.is_armed()
    }

    fn step(&mut self, event: Event) -> Result<Mode, SessionError> {
        let next = transition(self.mode, event)?;
        if next != self.mode {
            debug!(from = %self.mode, to = %next, %event, "session transition");
        }
        self.mode = next;
        self.guard.sync(self.is_dirty());
        Ok(next)
    }

    fn ensure_editing(&self) -> Result<(), SessionError> {
        if self.mode.accepts_edits() {
            Ok(())
        } else {
            Err(SessionError::InvalidTransition {
                mode: self.mode,
                event: Event::Mutated { dirty: true },
            })
        }
    }

    fn mutated(&mut self) -> Result<Mode, SessionError> {
        let dirty = self.is_dirty();
        self.step(Event::Mutated { dirty })
    }

    pub fn enter(&mut self) -> Result<Mode, SessionError> {
        if !self.can_edit {
            return Err(SessionError::NotPermitted);
        }
        self.step(Event::Enter)
    }

    pub fn edit(&mut self, edit: Edit) -> Result<Mode, SessionError> {
        self.ensure_editing()?;
        self.store.apply(edit);
        self.mutated()
    }

    /// Stage a replacement image for `slot`; its caption starts empty.
    pub fn select_image(&mut self, slot: Slot, file: LocalFile) -> Result<Mode, SessionError> {
        self.ensure_editing()?;
        self.staging.select(slot, file);
        self.mutated()
    }

    /// Set the caption of the image staged in `slot`.
    ///
    /// Returns `Ok(false)` when nothing is staged there.
    pub fn set_caption(
        &mut self,
        slot: Slot,
        text: impl Into<String>,
    ) -> Result<bool, SessionError> {
        self.ensure_editing()?;
        Ok(self.staging.set_caption(slot, text))
    }

    pub fn clear_image(&mut self, slot: Slot) -> Result<Mode, SessionError> {
        self.ensure_editing()?;
        self.staging.clear(slot);
        self.mutated()
    }

    /// Leave edit mode: directly when clean, via confirmation when dirty.
    pub fn request_exit(&mut self) -> Result<Mode, SessionError> {
        self.step(Event::Exit)
    }

    /// Answer "yes" to the discard prompt: revert the draft and drop staged media.
    pub fn confirm_discard(&mut self) -> Result<Mode, SessionError> {
        transition(self.mode, Event::ConfirmDiscard)?;
        self.store.revert();
        self.staging.clear_all();
        self.step(Event::ConfirmDiscard)
    }

    pub fn cancel_discard(&mut self) -> Result<Mode, SessionError> {
        self.step(Event::CancelDiscard)
    }

    /// Save through `api`. On failure the draft and staged media are kept
    /// and the mode does not change.
    pub async fn save<A: CmsApi>(&mut self, api: &A) -> Result<SaveReport, SessionError> {
        if !self.mode.accepts_edits() {
            return Err(SessionError::InvalidTransition {
                mode: self.mode,
                event: Event::Saved,
            });
        }
        let report = save::save(api, &mut self.store, &mut self.staging).await?;
        self.step(Event::Saved)?;
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::PatchOutcome;
    use crate::guard::UnloadFlag;
    use crate::staging::ObjectUrls;
    use crate::test_helpers::{CountingPreviews, MockCms, RecordedCall, png_file, sample_page};

    fn session() -> EditingSession<ObjectUrls, UnloadFlag> {
        EditingSession::new(sample_page(), true, ObjectUrls::new(), UnloadFlag::new())
    }

    #[test]
    fn editor_roles() {
        assert!(can_user_edit(Some("admin")));
        assert!(can_user_edit(Some("owner")));
        assert!(!can_user_edit(Some("viewer")));
        assert!(!can_user_edit(None));
    }

    #[test]
    fn transition_table() {
        use Mode::*;
        let ok = |m, e| transition(m, e).unwrap();
        assert_eq!(ok(NotEditing, Event::Enter), EditingClean);
        assert_eq!(ok(EditingClean, Event::Mutated { dirty: true }), EditingDirty);
        assert_eq!(ok(EditingDirty, Event::Mutated { dirty: false }), EditingClean);
        assert_eq!(ok(EditingClean, Event::Exit), NotEditing);
        assert_eq!(ok(EditingDirty, Event::Exit), ConfirmDiscard);
        assert_eq!(ok(ConfirmDiscard, Event::ConfirmDiscard), NotEditing);
        assert_eq!(ok(ConfirmDiscard, Event::CancelDiscard), EditingDirty);
        assert_eq!(ok(EditingDirty, Event::Saved), EditingClean);

        assert!(transition(NotEditing, Event::Exit).is_err());
        assert!(transition(NotEditing, Event::Mutated { dirty: true }).is_err());
        assert!(transition(ConfirmDiscard, Event::Mutated { dirty: true }).is_err());
        assert!(transition(EditingDirty, Event::ConfirmDiscard).is_err());
        assert!(transition(ConfirmDiscard, Event::Saved).is_err());
    }

    #[test]
    fn viewer_cannot_enter() {
        let mut s = EditingSession::new(sample_page(), false, ObjectUrls::new(), UnloadFlag::new());
        assert!(matches!(s.enter(), Err(SessionError::NotPermitted)));
        assert_eq!(s.mode(), Mode::NotEditing);
    }

    #[test]
    fn edits_require_edit_mode() {
        let mut s = session();
        let err = s.edit(Edit::HeroHeadline("x".into())).unwrap_err();
        assert_eq!(err.to_string(), "cannot edit while not editing");
        assert_eq!(s.draft(), &sample_page());
    }

    #[test]
    fn exit_while_clean_needs_no_confirmation() {
        let mut s = session();
        s.enter().unwrap();
        assert_eq!(s.request_exit().unwrap(), Mode::NotEditing);
    }

    #[test]
    fn edit_exit_confirm_restores_heading() {
        let mut s = session();
        s.enter().unwrap();
        s.edit(Edit::AboutHeading("Something else".into())).unwrap();
        assert_eq!(s.mode(), Mode::EditingDirty);

        assert_eq!(s.request_exit().unwrap(), Mode::ConfirmDiscard);
        assert_eq!(s.draft().about_heading, "Something else");

        assert_eq!(s.confirm_discard().unwrap(), Mode::NotEditing);
        assert_eq!(s.draft().about_heading, sample_page().about_heading);
        assert!(!s.is_dirty());
        assert!(!s.needs_leave_confirmation());
    }

    #[test]
    fn cancel_keeps_edits() {
        let mut s = session();
        s.enter().unwrap();
        s.edit(Edit::CtaText("Buy".into())).unwrap();
        s.request_exit().unwrap();
        assert_eq!(s.cancel_discard().unwrap(), Mode::EditingDirty);
        assert_eq!(s.draft().hero_cta.text, "Buy");
        assert!(s.needs_leave_confirmation());
    }

    #[test]
    fn no_edits_while_confirming() {
        let mut s = session();
        s.enter().unwrap();
        s.edit(Edit::CtaText("Buy".into())).unwrap();
        s.request_exit().unwrap();
        assert!(s.edit(Edit::CtaText("Sell".into())).is_err());
        assert!(s.select_image(Slot::Hero, png_file("a.png")).is_err());
        assert_eq!(s.draft().hero_cta.text, "Buy");
    }

    #[test]
    fn discard_reverts_all_fields_and_releases_all_media() {
        let previews = CountingPreviews::default();
        let counts = previews.counts();
        let mut s = EditingSession::new(sample_page(), true, previews, UnloadFlag::new());
        s.enter().unwrap();
        s.edit(Edit::HeroHeadline("a".into())).unwrap();
        s.edit(Edit::HeroSubheadline("b".into())).unwrap();
        s.edit(Edit::CtaText("c".into())).unwrap();
        s.edit(Edit::AboutHeading("d".into())).unwrap();
        s.select_image(Slot::Hero, png_file("1.png")).unwrap();
        s.select_image(Slot::Hero, png_file("2.png")).unwrap();
        s.select_image(Slot::About, png_file("3.png")).unwrap();

        s.request_exit().unwrap();
        s.confirm_discard().unwrap();

        assert_eq!(s.draft(), &sample_page());
        assert!(!s.staging().any_staged());
        let c = counts.lock().unwrap();
        assert_eq!(c.created, 3);
        assert_eq!(c.released.len(), 3);
    }

    #[test]
    fn editing_back_returns_to_clean() {
        let mut s = session();
        s.enter().unwrap();
        let original = sample_page().hero_headline;
        s.edit(Edit::HeroHeadline("tmp".into())).unwrap();
        assert!(s.needs_leave_confirmation());
        assert_eq!(s.edit(Edit::HeroHeadline(original)).unwrap(), Mode::EditingClean);
        assert!(!s.needs_leave_confirmation());
    }

    #[test]
    fn staging_and_clearing_an_image_toggles_dirty() {
        let mut s = session();
        s.enter().unwrap();
        assert_eq!(
            s.select_image(Slot::About, png_file("a.png")).unwrap(),
            Mode::EditingDirty
        );
        assert!(s.set_caption(Slot::About, "Team").unwrap());
        assert!(!s.set_caption(Slot::Hero, "nothing staged").unwrap());
        assert_eq!(s.clear_image(Slot::About).unwrap(), Mode::EditingClean);
    }

    #[tokio::test]
    async fn successful_save_returns_to_clean() {
        let api = MockCms::new();
        let mut s = session();
        s.enter().unwrap();
        s.edit(Edit::HeroHeadline("Fresh".into())).unwrap();
        s.select_image(Slot::Hero, png_file("f.png")).unwrap();
        s.set_caption(Slot::Hero, "Sunset").unwrap();

        let report = s.save(&api).await.unwrap();
        assert_eq!(s.mode(), Mode::EditingClean);
        assert!(!s.is_dirty());
        assert!(!s.needs_leave_confirmation());
        assert_eq!(s.committed().hero_headline, "Fresh");
        assert_eq!(report.uploaded.len(), 1);
        assert_eq!(s.staging().previews().live_count(), 0);
    }

    #[tokio::test]
    async fn failed_save_stays_dirty() {
        let api = MockCms::new();
        api.push_patch(Err(ApiError::Rejected {
            status: 500,
            message: "boom".into(),
        }));
        let mut s = session();
        s.enter().unwrap();
        s.edit(Edit::AboutHeading("Kept".into())).unwrap();

        let err = s.save(&api).await.unwrap_err();
        assert_eq!(err.to_string(), "save failed: boom");
        assert_eq!(s.mode(), Mode::EditingDirty);
        assert_eq!(s.draft().about_heading, "Kept");
        assert!(s.needs_leave_confirmation());

        api.push_patch(Ok(PatchOutcome {
            updated_at: "later".into(),
        }));
        s.save(&api).await.unwrap();
        assert_eq!(s.committed().updated_at, "later");
    }

    #[tokio::test]
    async fn save_outside_edit_mode_is_refused() {
        let api = MockCms::new();
        let mut s = session();
        assert!(s.save(&api).await.is_err());
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn open_checks_role() {
        let api = MockCms::with_page(sample_page(), Some("owner"));
        let mut s = EditingSession::open(&api, "home", ObjectUrls::new(), UnloadFlag::new())
            .await
            .unwrap();
        assert_eq!(s.draft(), &sample_page());
        assert_eq!(
            api.calls(),
            vec![RecordedCall::FetchPage("home".into()), RecordedCall::CurrentRole]
        );
        assert_eq!(s.enter().unwrap(), Mode::EditingClean);

        let api = MockCms::with_page(sample_page(), Some("viewer"));
        let s = EditingSession::open(&api, "home", ObjectUrls::new(), UnloadFlag::new())
            .await
            .unwrap();
        assert!(!s.can_edit());

        let api = MockCms::with_page(sample_page(), None);
        let s = EditingSession::open(&api, "home", ObjectUrls::new(), UnloadFlag::new())
            .await
            .unwrap();
        assert!(!s.can_edit());
    }

    #[tokio::test]
    async fn open_unknown_slug_fails() {
        let api = MockCms::with_page(sample_page(), Some("admin"));
        let result =
            EditingSession::open(&api, "pricing", ObjectUrls::new(), UnloadFlag::new()).await;
        assert!(matches!(result, Err(ApiError::NotFound(slug)) if slug == "pricing"));
        assert_eq!(api.calls(), vec![RecordedCall::FetchPage("pricing".into())]);
    }
}
