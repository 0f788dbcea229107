//! HTML preview of a page as the site would show it.
//!
//! Renders the hero and about sections of a draft with [maud], using the
//! same display rules as the live editor: staged images show their preview
//! reference, committed ones a cache-busted URL, and the CTA links to its
//! resolved target. Used by `inpage preview` and the console's `preview`
//! command to eyeball a draft before saving it.

use crate::richtext;
use crate::staging::{MediaStaging, PreviewStore, Slot};
use crate::types::PageSnapshot;
use maud::{DOCTYPE, Markup, html};

const CSS: &str = r#"
body { margin: 0; font-family: system-ui, sans-serif; color: #111; }
.edit-banner { position: sticky; top: 0; padding: .5rem 1rem; background: #fff4ce; border-bottom: 1px solid #e0c36b; }
.edit-banner.clean { background: #e7f6e7; border-color: #9fd19f; }
main { max-width: 72rem; margin: 0 auto; padding: 2rem; }
section { display: grid; grid-template-columns: 1fr 1fr; gap: 2rem; align-items: center; padding: 3rem 0; }
section img { width: 100%; height: auto; border-radius: .5rem; }
.cta { display: inline-block; padding: .75rem 1.5rem; background: #111; color: #fff; text-decoration: none; border-radius: .25rem; }
"#;

/// How the preview should present the editing state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderOptions {
    /// Show the edit-mode banner.
    pub editing: bool,
    /// Whether there are unsaved changes (banner wording).
    pub dirty: bool,
}

fn base_document(title: &str, content: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) }
                style { (CSS) }
            }
            body {
                (content)
            }
        }
    }
}

fn edit_banner(dirty: bool) -> Markup {
    html! {
        div.edit-banner.clean[!dirty] role="status" {
            @if dirty { "Editing · Unsaved changes" } @else { "Editing · All changes saved" }
        }
    }
}

/// Render `page` with images resolved through `staging`.
pub fn render_page<P: PreviewStore>(
    page: &PageSnapshot,
    staging: &MediaStaging<P>,
    options: RenderOptions,
) -> Markup {
    let cta = &page.hero_cta;
    let content = html! {
        @if options.editing {
            (edit_banner(options.dirty))
        }
        main {
            section.hero {
                div.copy {
                    h1 { (page.hero_headline) }
                    p { (page.hero_subheadline) }
                    a.cta href=(cta.href()) target=[cta.opens_new_tab().then_some("_blank")] {
                        (cta.text)
                    }
                }
                div.image-frame {
                    img src=(staging.display_src(Slot::Hero, page))
                        alt=(staging.display_alt(Slot::Hero, page));
                }
            }
            section id="about" {
                div {
                    h2 { (page.about_heading) }
                    @for paragraph in richtext::paragraphs(&page.about_body) {
                        p { (paragraph) }
                    }
                }
                div.image-frame {
                    img src=(staging.display_src(Slot::About, page))
                        alt=(staging.display_alt(Slot::About, page));
                }
            }
        }
    };
    base_document(&page.title, content)
}
