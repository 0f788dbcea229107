//! Draft store: the committed page snapshot and the editable working copy.
//!
//! Edits are expressed as [`Edit`] values and applied by the pure
//! [`apply_edit`] reducer, which returns a new draft with exactly one field
//! replaced. The committed snapshot only changes through [`DraftStore::commit`]
//! (after a successful save) and is restored into the draft by
//! [`DraftStore::revert`] (discard).
//!
//! Nothing here performs I/O or fails.

use crate::types::{PageSnapshot, RichText};

/// A single-field mutation of the draft.
#[derive(Debug, Clone, PartialEq)]
pub enum Edit {
    HeroHeadline(String),
    HeroSubheadline(String),
    CtaText(String),
    AboutHeading(String),
    AboutBody(RichText),
}

impl Edit {
    /// Field name as shown to the user.
    pub fn field(&self) -> &'static str {
        match self {
            Edit::HeroHeadline(_) => "hero headline",
            Edit::HeroSubheadline(_) => "hero subheadline",
            Edit::CtaText(_) => "call-to-action text",
            Edit::AboutHeading(_) => "about heading",
            Edit::AboutBody(_) => "about body",
        }
    }
}

/// Return a copy of `draft` with the edited field replaced.
pub fn apply_edit(draft: &PageSnapshot, edit: Edit) -> PageSnapshot {
    let mut next = draft.clone();
    match edit {
        Edit::HeroHeadline(v) => next.hero_headline = v,
        Edit::HeroSubheadline(v) => next.hero_subheadline = v,
        Edit::CtaText(v) => next.hero_cta.text = v,
        Edit::AboutHeading(v) => next.about_heading = v,
        Edit::AboutBody(v) => next.about_body = v,
    }
    next
}

/// Whether there is anything unsaved.
///
/// Field-wise structural comparison of draft and committed snapshot, plus
/// any image slot with staged media.
pub fn is_dirty(
    draft: &PageSnapshot,
    committed: &PageSnapshot,
    hero_staged: bool,
    about_staged: bool,
) -> bool {
    draft != committed || hero_staged || about_staged
}

#[derive(Debug, Clone)]
pub struct DraftStore {
    committed: PageSnapshot,
    draft: PageSnapshot,
}

impl DraftStore {
    /// Start with draft and committed snapshot both equal to `page`.
    pub fn new(page: PageSnapshot) -> Self {
        Self {
            draft: page.clone(),
            committed: page,
        }
    }

    pub fn committed(&self) -> &PageSnapshot {
        &self.committed
    }

    pub fn draft(&self) -> &PageSnapshot {
        &self.draft
    }

    pub fn apply(&mut self, edit: Edit) {
        self.draft = apply_edit(&self.draft, edit);
    }

    /// Replace both committed snapshot and draft with a server-confirmed page.
    pub fn commit(&mut self, page: PageSnapshot) {
        self.draft = page.clone();
        self.committed = page;
    }

    /// Throw away the draft, restoring the committed snapshot.
    pub fn revert(&mut self) {
        self.draft = self.committed.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::richtext;
    use crate::test_helpers::sample_page;

    #[test]
    fn fresh_store_is_clean() {
        let store = DraftStore::new(sample_page());
        assert!(!is_dirty(store.draft(), store.committed(), false, false));
    }

    #[test]
    fn every_single_field_edit_is_dirty() {
        let edits = vec![
            Edit::HeroHeadline("New headline".into()),
            Edit::HeroSubheadline("New sub".into()),
            Edit::CtaText("Buy now".into()),
            Edit::AboutHeading("Our story".into()),
            Edit::AboutBody(richtext::from_plain_text("Different body")),
        ];
        for edit in edits {
            let field = edit.field();
            let mut store = DraftStore::new(sample_page());
            store.apply(edit);
            assert!(
                is_dirty(store.draft(), store.committed(), false, false),
                "editing {field} should make the draft dirty"
            );
        }
    }

    #[test]
    fn edit_touches_only_its_field() {
        let page = sample_page();
        let next = apply_edit(&page, Edit::CtaText("Call us".into()));
        assert_eq!(next.hero_cta.text, "Call us");
        assert_eq!(next.hero_cta.link_type, page.hero_cta.link_type);
        assert_eq!(next.hero_headline, page.hero_headline);
        assert_eq!(next.about_body, page.about_body);
        assert_eq!(next.hero_image, page.hero_image);
    }

    #[test]
    fn apply_leaves_committed_untouched() {
        let mut store = DraftStore::new(sample_page());
        store.apply(Edit::HeroHeadline("Changed".into()));
        assert_eq!(store.committed().hero_headline, sample_page().hero_headline);
        assert_eq!(store.draft().hero_headline, "Changed");
    }

    #[test]
    fn editing_back_to_original_content_is_clean() {
        let original = sample_page().hero_headline;
        let mut store = DraftStore::new(sample_page());
        store.apply(Edit::HeroHeadline("Temporary".into()));
        store.apply(Edit::HeroHeadline(original));
        assert!(!is_dirty(store.draft(), store.committed(), false, false));
    }

    #[test]
    fn independently_built_equal_drafts_compare_equal() {
        let a = apply_edit(&sample_page(), Edit::AboutHeading("X".into()));
        let b = apply_edit(
            &apply_edit(&sample_page(), Edit::AboutHeading("Y".into())),
            Edit::AboutHeading("X".into()),
        );
        assert_eq!(a, b);
    }

    #[test]
    fn staged_media_alone_is_dirty() {
        let page = sample_page();
        assert!(is_dirty(&page, &page, true, false));
        assert!(is_dirty(&page, &page, false, true));
    }

    #[test]
    fn revert_restores_every_field() {
        let mut store = DraftStore::new(sample_page());
        store.apply(Edit::HeroHeadline("a".into()));
        store.apply(Edit::HeroSubheadline("b".into()));
        store.apply(Edit::CtaText("c".into()));
        store.apply(Edit::AboutHeading("d".into()));
        store.apply(Edit::AboutBody(richtext::from_plain_text("e")));
        store.revert();
        assert_eq!(store.draft(), &sample_page());
    }

    #[test]
    fn commit_replaces_both_sides() {
        let mut store = DraftStore::new(sample_page());
        let mut next = sample_page();
        next.updated_at = "2030-01-01T00:00:00.000Z".into();
        store.commit(next.clone());
        assert_eq!(store.committed(), &next);
        assert_eq!(store.draft(), &next);
    }
}
