//! Normalization of raw CMS documents into [`crate::types`].
//!
//! The CMS is loose about shapes: ids come back as numbers or strings,
//! relations are either bare ids or expanded objects depending on query
//! depth, and optional CTA fields may be `null`, absent, or of the wrong
//! type after a schema change. Everything downstream works on the strict
//! types, so this module is the single place that tolerates the mess.
//!
//! ## Rules
//!
//! | Field | Accepted | Result |
//! |-------|----------|--------|
//! | any `id` | number or string | string |
//! | media relation | expanded object | [`MediaRef`]; a bare id is an error |
//! | `heroCta.linkType` | `internal`/`external`/`anchor` | anything else → `anchor` |
//! | `heroCta.text` | string | anything else → `""` |
//! | `heroCta.internalPage` | `null` / `{slug}` / `{id}` / scalar | none / slug / id / id |
//! | `externalUrl`, `anchorId`, `newTab` | matching JSON type | dropped otherwise |

use crate::types::{CallToAction, InternalPage, LinkType, MediaRef, PageSnapshot, RichText};
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("missing field `{0}`")]
    Missing(String),
    #[error("field `{field}` has unexpected type (expected {expected})")]
    WrongType {
        field: String,
        expected: &'static str,
    },
}

/// Stringify an id that may be a JSON number or string.
pub fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn required_str(doc: &Value, field: &str) -> Result<String, NormalizeError> {
    match doc.get(field) {
        None | Some(Value::Null) => Err(NormalizeError::Missing(field.to_string())),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(NormalizeError::WrongType {
            field: field.to_string(),
            expected: "string",
        }),
    }
}

fn required_id(doc: &Value, field: &str) -> Result<String, NormalizeError> {
    let value = doc
        .get(field)
        .ok_or_else(|| NormalizeError::Missing(field.to_string()))?;
    id_string(value).ok_or_else(|| NormalizeError::WrongType {
        field: field.to_string(),
        expected: "string or number",
    })
}

fn optional_str(doc: &Value, field: &str) -> Option<String> {
    doc.get(field).and_then(Value::as_str).map(String::from)
}

/// Normalize an expanded media document.
///
/// `field` names the relation for error messages.
pub fn media(value: &Value, field: &str) -> Result<MediaRef, NormalizeError> {
    if !value.is_object() {
        return Err(NormalizeError::WrongType {
            field: field.to_string(),
            expected: "expanded media object",
        });
    }
    Ok(MediaRef {
        id: required_id(value, "id")?,
        alt: optional_str(value, "alt").unwrap_or_default(),
        url: required_str(value, "url")?,
        updated_at: optional_str(value, "updatedAt"),
    })
}

fn internal_page(value: Option<&Value>) -> Option<InternalPage> {
    match value? {
        Value::Null => None,
        Value::Object(obj) => {
            if let Some(slug) = obj.get("slug").and_then(Value::as_str) {
                Some(InternalPage::Slug {
                    id: obj.get("id").and_then(id_string),
                    slug: slug.to_string(),
                })
            } else {
                obj.get("id").and_then(id_string).map(InternalPage::Id)
            }
        }
        Value::String(s) => Some(InternalPage::Id(s.clone())),
        Value::Number(n) => Some(InternalPage::Id(n.to_string())),
        _ => None,
    }
}

/// Normalize the hero call-to-action group. Never fails.
pub fn call_to_action(value: &Value) -> CallToAction {
    let link_type = match value.get("linkType").and_then(Value::as_str) {
        Some("internal") => LinkType::Internal,
        Some("external") => LinkType::External,
        _ => LinkType::Anchor,
    };
    CallToAction {
        text: optional_str(value, "text").unwrap_or_default(),
        link_type,
        internal_page: internal_page(value.get("internalPage")),
        external_url: optional_str(value, "externalUrl"),
        anchor_id: optional_str(value, "anchorId"),
        new_tab: value.get("newTab").and_then(Value::as_bool),
    }
}

/// Normalize a full page document fetched at depth 1.
pub fn page(doc: &Value) -> Result<PageSnapshot, NormalizeError> {
    let hero_image = doc
        .get("heroImage")
        .ok_or_else(|| NormalizeError::Missing("heroImage".into()))?;
    let about_image = doc
        .get("aboutImage")
        .ok_or_else(|| NormalizeError::Missing("aboutImage".into()))?;

    Ok(PageSnapshot {
        id: required_id(doc, "id")?,
        slug: required_str(doc, "slug")?,
        title: optional_str(doc, "title").unwrap_or_default(),
        hero_headline: optional_str(doc, "heroHeadline").unwrap_or_default(),
        hero_subheadline: optional_str(doc, "heroSubheadline").unwrap_or_default(),
        hero_cta: call_to_action(doc.get("heroCta").unwrap_or(&Value::Null)),
        hero_image: media(hero_image, "heroImage")?,
        about_heading: optional_str(doc, "aboutHeading").unwrap_or_default(),
        about_body: RichText(doc.get("aboutBody").cloned().unwrap_or(Value::Null)),
        about_image: media(about_image, "aboutImage")?,
        updated_at: required_str(doc, "updatedAt")?,
    })
}
