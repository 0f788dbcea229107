//! # inpage
//!
//! Edit a CMS-backed landing page in place: change the hero and about copy,
//! swap the two images, and save everything back in one go. The library is
//! the editing core; the `inpage` binary drives it from the terminal against
//! a Payload-style REST API.
//!
//! # Architecture: Draft, Stage, Validate, Save
//!
//! Editing never touches the server until the user saves. Every change lands
//! in local state first:
//!
//! ```text
//! fetch ──► committed snapshot ──clone──► draft ◄── edits (set …)
//!                  ▲                         │
//!                  │                 staged media ◄── image / caption
//!                  │                         │
//!                  └── commit ◄── patch ◄── upload ◄── validate ◄── save
//! ```
//!
//! 1. **Draft**: the committed snapshot is cloned into a working copy that
//!    every edit replaces field by field.
//! 2. **Stage**: replacement images are held locally with a preview reference
//!    and a caption until saved.
//! 3. **Validate**: required text fields and captions are checked before any
//!    request goes out, so an invalid save costs no network traffic.
//! 4. **Save**: staged images are uploaded (hero first), the page is patched
//!    with the new media ids, and the server's response becomes the new
//!    committed snapshot.
//!
//! Any failure leaves the draft and staged media exactly as they were, so
//! the user can fix the problem and retry.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`types`] | Page snapshot, call-to-action, media reference, rich text |
//! | [`normalize`] | Raw CMS documents → [`types`] (numeric ids, expanded relations) |
//! | [`richtext`] | Plain-text view of Lexical rich text and back |
//! | [`draft`] | Committed snapshot + working copy, the [`draft::Edit`] reducer |
//! | [`staging`] | Staged replacement images and their preview references |
//! | [`validate`] | Pre-save checks returning every unmet requirement |
//! | [`api`] | [`api::CmsApi`] contract and the reqwest-backed [`api::HttpCms`] |
//! | [`save`] | Validate → upload → patch → reconcile |
//! | [`guard`] | Unload confirmation while there are unsaved changes |
//! | [`session`] | Edit-mode state machine and the discard flow |
//! | [`console`] | Command language of the interactive editor |
//! | [`render`] | HTML preview of a draft using Maud |
//! | [`config`] | `inpage.toml` loading, merging and validation |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Dirty Is Derived, Not Tracked
//!
//! There is no "modified" flag that edits set and saves clear. Whether the
//! session has unsaved changes is recomputed from content after every step:
//! draft text differs from the committed snapshot, or an image is staged.
//! Typing a field back to its original value makes the session clean again,
//! and the navigation guard follows along.
//!
//! ## Seams Are Traits
//!
//! The three things the core talks to are traits: [`api::CmsApi`] for the
//! network, [`staging::PreviewStore`] for preview references, and
//! [`guard::UnloadHook`] for "are you sure you want to leave?". Tests plug in
//! recording doubles and assert on exactly which calls happened (or that
//! none did).
//!
//! ## Preview References Are Owned
//!
//! A staged image owns its preview reference. Replacing, clearing,
//! discarding or saving releases it exactly once, and dropping the staging
//! area releases whatever is left.

pub mod api;
pub mod config;
pub mod console;
pub mod draft;
pub mod guard;
pub mod normalize;
pub mod output;
pub mod render;
pub mod richtext;
pub mod save;
pub mod session;
pub mod staging;
pub mod types;
pub mod validate;

#[cfg(test)]
pub(crate) mod test_helpers;
