//! CLI output formatting for pages, edit status and saves.
//!
//! # Information-First Display
//!
//! Output is **content-centric, not wire-centric**. The primary display for
//! a page is its title and slug; every editable field then gets an indented
//! `Label: value` line under the section it belongs to, so the output reads
//! like the page itself. Media shows the URL the site would load, with alt
//! text as secondary context.
//!
//! # Output Format
//!
//! ## Page
//!
//! ```text
//! Home (/home)
//!     Updated: 2024-05-02T09:30:00.000Z
//! Hero
//!     Headline: Websites that work
//!     Subheadline: Design, build and care for your site
//!     CTA: Learn more → #about
//!     Image: /media/hero.png?v=2024-05-01T10%3A00%3A00.000Z
//!         Alt: Laptop on a desk
//! About
//!     Heading: About us
//!     Body: We are a small studio.
//!     Image: /media/team.png?v=2024-05-01T11%3A00%3A00.000Z
//!         Alt: The team
//! ```
//!
//! ## Status
//!
//! ```text
//! Mode: editing (unsaved changes)
//!     Changed: hero headline, about heading
//!     Staged hero: sunset.png (image/png)
//!         Alt: (missing)
//!     Leaving will ask for confirmation
//! ```
//!
//! # Architecture
//!
//! Each view has a `format_*` function (returns `Vec<String>`) for testability
//! and a `print_*` wrapper that writes to stdout. Format functions are pure:
//! no I/O, no side effects.

use crate::guard::UnloadHook;
use crate::richtext;
use crate::save::SaveReport;
use crate::session::EditingSession;
use crate::staging::{MediaStaging, PreviewStore, Slot};
use crate::types::PageSnapshot;

/// Maximum characters of the about body shown in the page view.
const BODY_PREVIEW_CHARS: usize = 72;

// ============================================================================
// Shared helpers
// ============================================================================

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// `Label: value` at `depth`, with `(empty)` standing in for blank values.
fn field_line(depth: usize, label: &str, value: &str) -> String {
    if value.is_empty() {
        format!("{}{}: (empty)", indent(depth), label)
    } else {
        format!("{}{}: {}", indent(depth), label, value)
    }
}

/// Truncate text to `max` characters, appending `...` if truncated.
fn truncate_desc(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

fn body_summary(page: &PageSnapshot) -> String {
    truncate_desc(
        &richtext::paragraphs(&page.about_body).join(" "),
        BODY_PREVIEW_CHARS,
    )
}

fn image_lines<P: PreviewStore>(
    slot: Slot,
    page: &PageSnapshot,
    staging: &MediaStaging<P>,
) -> Vec<String> {
    let mut lines = Vec::new();
    match staging.get(slot) {
        Some(staged) => lines.push(format!(
            "{}Image: {} (staged, not saved)",
            indent(1),
            staged.file().name
        )),
        None => lines.push(field_line(1, "Image", &staging.display_src(slot, page))),
    }
    lines.push(field_line(2, "Alt", staging.display_alt(slot, page)));
    lines
}

// ============================================================================
// Page
// ============================================================================

/// Format a page as the site shows it, with staged media taking precedence.
pub fn format_page<P: PreviewStore>(
    page: &PageSnapshot,
    staging: &MediaStaging<P>,
) -> Vec<String> {
    let cta = &page.hero_cta;
    let mut lines = vec![
        format!("{} (/{})", page.title, page.slug),
        field_line(1, "Updated", &page.updated_at),
        "Hero".to_string(),
        field_line(1, "Headline", &page.hero_headline),
        field_line(1, "Subheadline", &page.hero_subheadline),
        format!(
            "{}CTA: {} → {}{}",
            indent(1),
            if cta.text.is_empty() { "(empty)" } else { cta.text.as_str() },
            cta.href(),
            if cta.opens_new_tab() { " (new tab)" } else { "" }
        ),
    ];
    lines.extend(image_lines(Slot::Hero, page, staging));
    lines.push("About".to_string());
    lines.push(field_line(1, "Heading", &page.about_heading));
    lines.push(field_line(1, "Body", &body_summary(page)));
    lines.extend(image_lines(Slot::About, page, staging));
    lines
}

pub fn print_page<P: PreviewStore>(page: &PageSnapshot, staging: &MediaStaging<P>) {
    for line in format_page(page, staging) {
        println!("{}", line);
    }
}

// ============================================================================
// Status
// ============================================================================

/// Names of the text fields where `draft` differs from `committed`.
fn changed_fields(draft: &PageSnapshot, committed: &PageSnapshot) -> Vec<&'static str> {
    let mut changed = Vec::new();
    if draft.hero_headline != committed.hero_headline {
        changed.push("hero headline");
    }
    if draft.hero_subheadline != committed.hero_subheadline {
        changed.push("hero subheadline");
    }
    if draft.hero_cta.text != committed.hero_cta.text {
        changed.push("cta");
    }
    if draft.about_heading != committed.about_heading {
        changed.push("about heading");
    }
    if draft.about_body != committed.about_body {
        changed.push("about body");
    }
    changed
}

/// Format the editing status: mode, changed fields, staged media, guard.
pub fn format_status<P: PreviewStore, H: UnloadHook>(
    session: &EditingSession<P, H>,
) -> Vec<String> {
    let mut lines = vec![format!("Mode: {}", session.mode())];
    if !session.can_edit() {
        lines.push(format!("{}Read-only: your role cannot edit pages", indent(1)));
        return lines;
    }

    let changed = changed_fields(session.draft(), session.committed());
    if !changed.is_empty() {
        lines.push(format!("{}Changed: {}", indent(1), changed.join(", ")));
    }
    for slot in Slot::ALL {
        if let Some(staged) = session.staging().get(slot) {
            lines.push(format!(
                "{}Staged {}: {} ({})",
                indent(1),
                slot,
                staged.file().name,
                staged.file().mime_type()
            ));
            let caption = staged.trimmed_caption();
            lines.push(format!(
                "{}Alt: {}",
                indent(2),
                if caption.is_empty() { "(missing)" } else { caption }
            ));
        }
    }
    if session.needs_leave_confirmation() {
        lines.push(format!("{}Leaving will ask for confirmation", indent(1)));
    }
    lines
}

// ============================================================================
// Save
// ============================================================================

/// Format the outcome of a successful save.
pub fn format_save_report(report: &SaveReport) -> Vec<String> {
    let mut lines = vec![format!("Saved /{}", report.committed.slug)];
    for (slot, media) in &report.uploaded {
        lines.push(format!("{}Uploaded {} image → {}", indent(1), slot, media.url));
        lines.push(field_line(2, "Alt", &media.alt));
    }
    lines.push(field_line(1, "Updated", &report.committed.updated_at));
    lines
}

pub fn print_save_report(report: &SaveReport) {
    for line in format_save_report(report) {
        println!("{}", line);
    }
}

// ============================================================================
// Role
// ============================================================================

/// Format the current user's role and whether it may edit.
pub fn format_role(role: Option<&str>, can_edit: bool) -> Vec<String> {
    let who = match role {
        Some(r) => format!("Signed in as {}", r),
        None => "Not signed in".to_string(),
    };
    let access = if can_edit { "can edit pages" } else { "read-only" };
    vec![who, format!("{}Access: {}", indent(1), access)]
}

pub fn print_role(role: Option<&str>, can_edit: bool) {
    for line in format_role(role, can_edit) {
        println!("{}", line);
    }
}
