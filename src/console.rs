//! Line-oriented command language for the interactive editor.
//!
//! [`parse_command`] turns one input line into a [`Command`];
//! [`Console::handle`] runs it against an [`EditingSession`] and returns the
//! lines to print plus whether the editor should keep reading input.
//!
//! ```text
//! > edit
//! > set headline Websites that work harder
//! > image hero ./sunset.png
//! > caption hero Sunset over the bay
//! > save
//! > quit
//! ```
//!
//! `quit` is leaving the page. While the navigation guard is armed it asks
//! for `yes`/`cancel` first, the same way the discard prompt after `exit`
//! does. Leaving from outside the command language (Ctrl-C) goes through
//! [`Console::interrupt`], gated on the host's unload hook.

use crate::api::CmsApi;
use crate::draft::Edit;
use crate::guard::UnloadHook;
use crate::output;
use crate::render::{self, RenderOptions};
use crate::richtext;
use crate::session::{EditingSession, Mode, SessionError};
use crate::staging::{LocalFile, PreviewStore, Slot};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const HELP: &[&str] = &[
    "edit                          enter edit mode",
    "set <field> <text>            headline, subheadline, cta, about-heading, about-body",
    "image hero|about <path>       stage a replacement image",
    "caption hero|about <text>     alt text for the staged image",
    "clear hero|about              drop the staged image",
    "show                          print the draft",
    "status                        print mode, changes and staged images",
    "preview                       write the draft as HTML",
    "save                          upload staged images and save the page",
    "exit                          leave edit mode",
    "yes / cancel                  answer a confirmation prompt",
    "quit                          leave the editor",
    "help                          this list",
];

#[derive(Error, Debug)]
pub enum CommandError {
    #[error("unknown command '{0}' (type `help` for a list)")]
    Unknown(String),
    #[error("usage: {0}")]
    Usage(&'static str),
    #[error(
        "unknown field '{0}' (expected headline, subheadline, cta, about-heading or about-body)"
    )]
    UnknownField(String),
    #[error("{0}")]
    Slot(String),
    #[error("cannot read {}: {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },
    #[error("cannot write preview: {0}")]
    Write(#[source] io::Error),
    #[error(transparent)]
    Session(#[from] SessionError),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Edit,
    Set(Edit),
    Image { slot: Slot, path: PathBuf },
    Caption { slot: Slot, text: String },
    Clear(Slot),
    Show,
    Status,
    Preview,
    Save,
    Exit,
    Yes,
    Cancel,
    Quit,
    Help,
}

/// Split off the first whitespace-delimited word.
fn split_word(s: &str) -> (&str, &str) {
    let s = s.trim_start();
    match s.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim_start()),
        None => (s, ""),
    }
}

fn parse_slot(word: &str, usage: &'static str) -> Result<Slot, CommandError> {
    if word.is_empty() {
        return Err(CommandError::Usage(usage));
    }
    word.parse().map_err(CommandError::Slot)
}

fn parse_edit(field: &str, text: &str) -> Result<Edit, CommandError> {
    let text = text.to_string();
    match field {
        "headline" => Ok(Edit::HeroHeadline(text)),
        "subheadline" => Ok(Edit::HeroSubheadline(text)),
        "cta" => Ok(Edit::CtaText(text)),
        "about-heading" => Ok(Edit::AboutHeading(text)),
        "about-body" => Ok(Edit::AboutBody(richtext::from_plain_text(&text))),
        "" => Err(CommandError::Usage("set <field> <text>")),
        other => Err(CommandError::UnknownField(other.to_string())),
    }
}

/// Parse one input line. Blank lines parse to `None`.
pub fn parse_command(line: &str) -> Result<Option<Command>, CommandError> {
    let (word, rest) = split_word(line);
    let command = match word {
        "" => return Ok(None),
        "edit" => Command::Edit,
        "set" => {
            let (field, text) = split_word(rest);
            Command::Set(parse_edit(field, text)?)
        }
        "image" => {
            let (slot, path) = split_word(rest);
            let slot = parse_slot(slot, "image hero|about <path>")?;
            if path.is_empty() {
                return Err(CommandError::Usage("image hero|about <path>"));
            }
            Command::Image {
                slot,
                path: PathBuf::from(path.trim_end()),
            }
        }
        "caption" => {
            let (slot, text) = split_word(rest);
            Command::Caption {
                slot: parse_slot(slot, "caption hero|about <text>")?,
                text: text.to_string(),
            }
        }
        "clear" => Command::Clear(parse_slot(rest.trim(), "clear hero|about")?),
        "show" => Command::Show,
        "status" => Command::Status,
        "preview" => Command::Preview,
        "save" => Command::Save,
        "exit" => Command::Exit,
        "yes" | "y" => Command::Yes,
        "cancel" | "no" | "n" => Command::Cancel,
        "quit" | "q" => Command::Quit,
        "help" | "?" => Command::Help,
        other => return Err(CommandError::Unknown(other.to_string())),
    };
    Ok(Some(command))
}

/// Whether the editor keeps reading input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Output of one handled line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub lines: Vec<String>,
    pub flow: Flow,
}

impl Reply {
    fn lines(lines: Vec<String>) -> Self {
        Self {
            lines,
            flow: Flow::Continue,
        }
    }

    fn line(line: impl Into<String>) -> Self {
        Self::lines(vec![line.into()])
    }

    fn quit(line: impl Into<String>) -> Self {
        Self {
            lines: vec![line.into()],
            flow: Flow::Quit,
        }
    }
}

/// Interactive editor bound to one session and one CMS.
pub struct Console<'a, A: CmsApi, P: PreviewStore, H: UnloadHook> {
    api: &'a A,
    session: EditingSession<P, H>,
    preview_path: PathBuf,
    quit_pending: bool,
}

impl<'a, A: CmsApi, P: PreviewStore, H: UnloadHook> Console<'a, A, P, H> {
    pub fn new(
        api: &'a A,
        session: EditingSession<P, H>,
        preview_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            api,
            session,
            preview_path: preview_path.into(),
            quit_pending: false,
        }
    }

    pub fn session(&self) -> &EditingSession<P, H> {
        &self.session
    }

    /// Prompt shown before each line of input.
    pub fn prompt(&self) -> &'static str {
        if self.quit_pending {
            return "leave? (yes/cancel)> ";
        }
        match self.session.mode() {
            Mode::NotEditing => "> ",
            Mode::EditingClean => "edit> ",
            Mode::EditingDirty => "edit*> ",
            Mode::ConfirmDiscard => "discard? (yes/cancel)> ",
        }
    }

    /// Parse and run one line of input. Errors become `error: ...` lines.
    pub async fn handle(&mut self, line: &str) -> Reply {
        let result = match parse_command(line) {
            Ok(None) => return Reply::lines(Vec::new()),
            Ok(Some(command)) => self.execute(command).await,
            Err(e) => Err(e),
        };
        result.unwrap_or_else(|e| Reply::line(format!("error: {e}")))
    }

    /// The user asked to leave from outside the editor (Ctrl-C).
    ///
    /// `confirm` is the host's reading of its unload hook. While it is set
    /// the leave prompt opens; an interrupt at that prompt leaves.
    pub fn interrupt(&mut self, confirm: bool) -> Reply {
        if !confirm {
            return Reply::quit("Bye.");
        }
        if std::mem::take(&mut self.quit_pending) {
            return Reply::quit("Leaving without saving.");
        }
        self.quit_pending = true;
        Reply::line("You have unsaved changes. Leave anyway? (yes/cancel)")
    }

    /// The editor is going away without a chance to confirm (`reason` is
    /// e.g. "Input ended"). Unsaved changes are reported as discarded.
    pub fn abandon(&self, reason: &str) -> Vec<String> {
        if self.session.needs_leave_confirmation() {
            vec![format!("{reason}; unsaved changes were discarded.")]
        } else {
            Vec::new()
        }
    }

    pub async fn execute(&mut self, command: Command) -> Result<Reply, CommandError> {
        let quit_pending = std::mem::take(&mut self.quit_pending);
        let reply = match command {
            Command::Yes if quit_pending => Reply::quit("Leaving without saving."),
            Command::Cancel if quit_pending => Reply::line("Staying on the page."),
            Command::Edit => {
                self.session.enter()?;
                Reply::line(format!(
                    "Editing /{}. Type `help` for commands.",
                    self.session.draft().slug
                ))
            }
            Command::Set(edit) => {
                let field = edit.field();
                let mode = self.session.edit(edit)?;
                Reply::line(format!("Updated {field} ({mode})."))
            }
            Command::Image { slot, path } => {
                let file = read_file(&path)?;
                let name = file.name.clone();
                self.session.select_image(slot, file)?;
                Reply::line(format!(
                    "Staged {name} for the {slot} image. Add alt text with `caption {slot} <text>`."
                ))
            }
            Command::Caption { slot, text } => {
                if self.session.set_caption(slot, text)? {
                    Reply::line(format!("Alt text set for the {slot} image."))
                } else {
                    Reply::line(format!("No {slot} image is staged."))
                }
            }
            Command::Clear(slot) => {
                let staged = self.session.staging().is_staged(slot);
                let mode = self.session.clear_image(slot)?;
                if staged {
                    Reply::line(format!("Cleared the staged {slot} image ({mode})."))
                } else {
                    Reply::line(format!("No {slot} image is staged."))
                }
            }
            Command::Show => Reply::lines(output::format_page(
                self.session.draft(),
                self.session.staging(),
            )),
            Command::Status => Reply::lines(output::format_status(&self.session)),
            Command::Preview => {
                let path = self.write_preview()?;
                Reply::line(format!("Wrote preview to {}", path.display()))
            }
            Command::Save => {
                let report = self.session.save(self.api).await?;
                Reply::lines(output::format_save_report(&report))
            }
            Command::Exit => match self.session.request_exit()? {
                Mode::ConfirmDiscard => {
                    Reply::line("You have unsaved changes. Discard them? (yes/cancel)")
                }
                _ => Reply::line("Left edit mode."),
            },
            Command::Yes => {
                self.session.confirm_discard()?;
                Reply::line("Changes discarded.")
            }
            Command::Cancel => {
                self.session.cancel_discard()?;
                Reply::line("Still editing.")
            }
            Command::Quit => {
                if self.session.needs_leave_confirmation() {
                    self.quit_pending = true;
                    Reply::line("You have unsaved changes. Leave anyway? (yes/cancel)")
                } else {
                    Reply::quit("Bye.")
                }
            }
            Command::Help => Reply::lines(HELP.iter().map(|l| l.to_string()).collect()),
        };
        Ok(reply)
    }

    fn write_preview(&self) -> Result<&Path, CommandError> {
        let options = RenderOptions {
            editing: self.session.mode() != Mode::NotEditing,
            dirty: self.session.is_dirty(),
        };
        let html = render::render_page(self.session.draft(), self.session.staging(), options);
        std::fs::write(&self.preview_path, html.into_string()).map_err(CommandError::Write)?;
        Ok(&self.preview_path)
    }
}

fn read_file(path: &Path) -> Result<LocalFile, CommandError> {
    LocalFile::read(path).map_err(|source| CommandError::Read {
        path: path.to_path_buf(),
        source,
    })
}
