//! Plain-text rendering of rich-text documents.
//!
//! The about body is stored as Lexical editor state:
//!
//! ```json
//! {"root": {"type": "root", "children": [
//!     {"type": "paragraph", "children": [{"type": "text", "text": "Hello"}]}
//! ]}}
//! ```
//!
//! The editor only needs the text content (for the "body must not be empty"
//! check and for the preview page), so block nodes become lines and inline
//! nodes are concatenated. Unknown node types contribute their children.

use crate::types::RichText;
use serde_json::{Value, json};

/// Render a rich-text document to plain text, one line per top-level block.
///
/// A bare JSON string is treated as already-plain text; `null` renders empty.
pub fn plain_text(doc: &RichText) -> String {
    match &doc.0 {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => {
            let root = other.get("root").unwrap_or(other);
            children(root)
                .iter()
                .map(inline_text)
                .collect::<Vec<_>>()
                .join("\n")
        }
    }
}

/// Split a document into its top-level block texts, skipping empty blocks.
pub fn paragraphs(doc: &RichText) -> Vec<String> {
    plain_text(doc)
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(String::from)
        .collect()
}

fn children(node: &Value) -> &[Value] {
    node.get("children")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

fn inline_text(node: &Value) -> String {
    match node.get("type").and_then(Value::as_str) {
        Some("text") => node
            .get("text")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        Some("linebreak") => "\n".to_string(),
        Some("tab") => "\t".to_string(),
        _ => children(node).iter().map(inline_text).collect(),
    }
}

/// Build a Lexical document holding one paragraph per input line.
pub fn from_plain_text(text: &str) -> RichText {
    let blocks: Vec<Value> = text
        .lines()
        .map(|line| {
            json!({
                "type": "paragraph",
                "version": 1,
                "direction": "ltr",
                "format": "",
                "indent": 0,
                "children": [{
                    "type": "text",
                    "version": 1,
                    "text": line,
                    "format": 0,
                    "detail": 0,
                    "mode": "normal",
                    "style": ""
                }]
            })
        })
        .collect();
    RichText(json!({
        "root": {
            "type": "root",
            "version": 1,
            "direction": "ltr",
            "format": "",
            "indent": 0,
            "children": blocks
        }
    }))
}
