//! Page content types shared by the draft store, the validator, the save
//! pipeline and the renderer.
//!
//! These mirror the CMS wire format (camelCase JSON) so a snapshot can be
//! serialized straight into a patch body or a debug dump. Equality is
//! structural: two snapshots with the same content compare equal no matter
//! how they were produced.

use serde::{Deserialize, Serialize};

/// An uploaded image as the CMS knows it.
///
/// Referenced by id from the page document, never embedded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaRef {
    pub id: String,
    /// Accessibility caption (the CMS `alt` field).
    pub alt: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

/// Which kind of target a call-to-action points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkType {
    Internal,
    External,
    Anchor,
}

/// Internal page relation: either a bare id or an expanded page exposing its slug.
///
/// The expanded form keeps the page id so a patch can send the relation
/// back as an object the CMS still resolves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InternalPage {
    Slug {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        slug: String,
    },
    Id(String),
}

/// Hero call-to-action button.
///
/// Only the target field matching `link_type` is consulted when resolving
/// [`href`](CallToAction::href); the others ride along untouched so a
/// round trip through the editor never drops data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallToAction {
    pub text: String,
    pub link_type: LinkType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub internal_page: Option<InternalPage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anchor_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_tab: Option<bool>,
}

/// Section the anchor link type falls back to when no anchor id is set.
pub const DEFAULT_ANCHOR: &str = "about";

impl CallToAction {
    /// Resolve the navigable target for this button.
    ///
    /// ```text
    /// anchor    → #<anchor_id>        (#about when unset)
    /// external  → <external_url>      (# when unset)
    /// internal  → /<slug> or /<id>    (/ when unset)
    /// ```
    pub fn href(&self) -> String {
        match self.link_type {
            LinkType::Anchor => {
                format!("#{}", self.anchor_id.as_deref().unwrap_or(DEFAULT_ANCHOR))
            }
            LinkType::External => self.external_url.clone().unwrap_or_else(|| "#".to_string()),
            LinkType::Internal => match &self.internal_page {
                Some(InternalPage::Slug { slug, .. }) => format!("/{slug}"),
                Some(InternalPage::Id(id)) => format!("/{id}"),
                None => "/".to_string(),
            },
        }
    }

    /// Whether the link should open in a new browsing context.
    pub fn opens_new_tab(&self) -> bool {
        self.new_tab.unwrap_or(false)
    }
}

/// Opaque structured rich-text document (Lexical editor state).
///
/// The editor never interprets it beyond [`crate::richtext::plain_text`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RichText(pub serde_json::Value);

/// The committed, server-confirmed content of one page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSnapshot {
    pub id: String,
    pub slug: String,
    pub title: String,
    pub hero_headline: String,
    pub hero_subheadline: String,
    pub hero_cta: CallToAction,
    pub hero_image: MediaRef,
    pub about_heading: String,
    pub about_body: RichText,
    pub about_image: MediaRef,
    pub updated_at: String,
}
