//! Pre-flight validation of a draft before anything is sent to the CMS.
//!
//! Collects every unmet [`Requirement`] rather than stopping at the first,
//! so the user can fix them all in one pass.

use crate::richtext;
use crate::staging::{MediaStaging, PreviewStore, Slot};
use crate::types::PageSnapshot;
use std::fmt;
use thiserror::Error;

/// A condition that must hold before a save is attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    HeroHeadline,
    HeroSubheadline,
    CtaText,
    AboutHeading,
    AboutBody,
    /// A staged image in this slot has no caption.
    Caption(Slot),
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Requirement::HeroHeadline => f.write_str("hero headline is required"),
            Requirement::HeroSubheadline => f.write_str("hero subheadline is required"),
            Requirement::CtaText => f.write_str("call-to-action text is required"),
            Requirement::AboutHeading => f.write_str("about heading is required"),
            Requirement::AboutBody => f.write_str("about body is required"),
            Requirement::Caption(slot) => {
                write!(f, "alt text is required for the new {slot} image")
            }
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("cannot save: {}", join(.unmet))]
pub struct ValidationError {
    pub unmet: Vec<Requirement>,
}

fn join(unmet: &[Requirement]) -> String {
    unmet
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Unmet text-field requirements for `draft`.
pub fn missing_fields(draft: &PageSnapshot) -> Vec<Requirement> {
    let mut unmet = Vec::new();
    if draft.hero_headline.is_empty() {
        unmet.push(Requirement::HeroHeadline);
    }
    if draft.hero_subheadline.is_empty() {
        unmet.push(Requirement::HeroSubheadline);
    }
    if draft.hero_cta.text.is_empty() {
        unmet.push(Requirement::CtaText);
    }
    if draft.about_heading.is_empty() {
        unmet.push(Requirement::AboutHeading);
    }
    if richtext::plain_text(&draft.about_body).trim().is_empty() {
        unmet.push(Requirement::AboutBody);
    }
    unmet
}

/// Check that `draft` and the staged images may be saved.
pub fn can_save<P: PreviewStore>(
    draft: &PageSnapshot,
    staging: &MediaStaging<P>,
) -> Result<(), ValidationError> {
    let mut unmet = missing_fields(draft);
    for slot in Slot::ALL {
        if let Some(staged) = staging.get(slot)
            && staged.trimmed_caption().is_empty()
        {
            unmet.push(Requirement::Caption(slot));
        }
    }
    if unmet.is_empty() {
        Ok(())
    } else {
        Err(ValidationError { unmet })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draft::{Edit, apply_edit};
    use crate::staging::ObjectUrls;
    use crate::test_helpers::{png_file, sample_page};
    use crate::types::RichText;

    #[test]
    fn sample_page_is_saveable() {
        let staging = MediaStaging::new(ObjectUrls::new());
        assert_eq!(can_save(&sample_page(), &staging), Ok(()));
    }

    #[test]
    fn empty_headline_is_reported() {
        let draft = apply_edit(&sample_page(), Edit::HeroHeadline(String::new()));
        let staging = MediaStaging::new(ObjectUrls::new());
        let err = can_save(&draft, &staging).unwrap_err();
        assert_eq!(err.unmet, vec![Requirement::HeroHeadline]);
    }

    #[test]
    fn all_missing_fields_are_listed_in_order() {
        let mut draft = sample_page();
        draft.hero_headline.clear();
        draft.hero_subheadline.clear();
        draft.hero_cta.text.clear();
        draft.about_heading.clear();
        draft.about_body = RichText(serde_json::Value::Null);
        let staging = MediaStaging::new(ObjectUrls::new());
        let err = can_save(&draft, &staging).unwrap_err();
        assert_eq!(
            err.unmet,
            vec![
                Requirement::HeroHeadline,
                Requirement::HeroSubheadline,
                Requirement::CtaText,
                Requirement::AboutHeading,
                Requirement::AboutBody,
            ]
        );
    }

    #[test]
    fn whitespace_only_body_is_empty() {
        let draft = apply_edit(
            &sample_page(),
            Edit::AboutBody(crate::richtext::from_plain_text("   ")),
        );
        let staging = MediaStaging::new(ObjectUrls::new());
        let err = can_save(&draft, &staging).unwrap_err();
        assert_eq!(err.unmet, vec![Requirement::AboutBody]);
    }

    #[test]
    fn staged_image_needs_trimmed_caption() {
        let mut staging = MediaStaging::new(ObjectUrls::new());
        staging.select(Slot::Hero, png_file("a.png"));
        staging.set_caption(Slot::Hero, "   ");
        let err = can_save(&sample_page(), &staging).unwrap_err();
        assert_eq!(err.unmet, vec![Requirement::Caption(Slot::Hero)]);

        staging.set_caption(Slot::Hero, " Sunset ");
        assert_eq!(can_save(&sample_page(), &staging), Ok(()));
    }

    #[test]
    fn unstaged_slots_need_no_caption() {
        let mut staging = MediaStaging::new(ObjectUrls::new());
        staging.select(Slot::About, png_file("b.png"));
        let err = can_save(&sample_page(), &staging).unwrap_err();
        assert_eq!(err.unmet, vec![Requirement::Caption(Slot::About)]);
    }

    #[test]
    fn message_lists_every_requirement() {
        let err = ValidationError {
            unmet: vec![Requirement::CtaText, Requirement::Caption(Slot::About)],
        };
        assert_eq!(
            err.to_string(),
            "cannot save: call-to-action text is required; alt text is required for the new about image"
        );
    }
}
