use clap::{Parser, Subcommand};
use inpage::api::{CmsApi, HttpCms};
use inpage::config::{self, EditorConfig};
use inpage::console::{Console, Flow};
use inpage::draft::Edit;
use inpage::guard::UnloadFlag;
use inpage::render::{self, RenderOptions};
use inpage::session::{self, EditingSession};
use inpage::staging::{LocalFile, MediaStaging, ObjectUrls, Slot};
use inpage::{output, richtext};
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};

#[derive(Parser)]
#[command(name = "inpage")]
#[command(about = "Edit a CMS-backed landing page in place")]
#[command(long_about = "\
Edit a CMS-backed landing page in place

Fetches a page from a Payload-style REST API, lets you change its hero and
about copy and replace its two images, and saves everything back in one go.
Nothing is sent until you save; images are uploaded first, then the page is
patched to point at them.

Editable fields:

  Hero   headline, subheadline, call-to-action text, image (+ alt text)
  About  heading, body, image (+ alt text)

Saving requires every text field to be filled in and alt text for every new
image. Only admin and owner accounts may edit.

Run 'inpage gen-config' to generate a documented inpage.toml.")]
#[command(version)]
struct Cli {
    /// Directory containing inpage.toml
    #[arg(long, default_value = ".", global = true)]
    config: PathBuf,

    /// CMS API token (overrides api.token)
    #[arg(long, env = "INPAGE_TOKEN", global = true, hide_env_values = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Command,
}

/// New values for `apply`. Only the flags given are changed.
#[derive(clap::Args, Clone)]
struct ApplyArgs {
    /// Hero headline
    #[arg(long)]
    headline: Option<String>,
    /// Hero subheadline
    #[arg(long)]
    subheadline: Option<String>,
    /// Call-to-action button text
    #[arg(long)]
    cta: Option<String>,
    /// About section heading
    #[arg(long)]
    about_heading: Option<String>,
    /// About section body (one paragraph per line)
    #[arg(long)]
    about_body: Option<String>,
    /// Replacement hero image
    #[arg(long, value_name = "PATH")]
    hero_image: Option<PathBuf>,
    /// Alt text for the replacement hero image
    #[arg(long, value_name = "TEXT", requires = "hero_image")]
    hero_alt: Option<String>,
    /// Replacement about image
    #[arg(long, value_name = "PATH")]
    about_image: Option<PathBuf>,
    /// Alt text for the replacement about image
    #[arg(long, value_name = "TEXT", requires = "about_image")]
    about_alt: Option<String>,
}

impl ApplyArgs {
    fn edits(&self) -> Vec<Edit> {
        let mut edits = Vec::new();
        if let Some(v) = &self.headline {
            edits.push(Edit::HeroHeadline(v.clone()));
        }
        if let Some(v) = &self.subheadline {
            edits.push(Edit::HeroSubheadline(v.clone()));
        }
        if let Some(v) = &self.cta {
            edits.push(Edit::CtaText(v.clone()));
        }
        if let Some(v) = &self.about_heading {
            edits.push(Edit::AboutHeading(v.clone()));
        }
        if let Some(v) = &self.about_body {
            edits.push(Edit::AboutBody(richtext::from_plain_text(v)));
        }
        edits
    }

    fn images(&self) -> Vec<(Slot, &Path, Option<&str>)> {
        let mut images = Vec::new();
        if let Some(path) = &self.hero_image {
            images.push((Slot::Hero, path.as_path(), self.hero_alt.as_deref()));
        }
        if let Some(path) = &self.about_image {
            images.push((Slot::About, path.as_path(), self.about_alt.as_deref()));
        }
        images
    }
}

#[derive(Subcommand)]
enum Command {
    /// Print a page's editable content
    Show { slug: String },
    /// Edit a page interactively
    Edit { slug: String },
    /// Change fields and images of a page and save in one step
    Apply {
        slug: String,
        #[command(flatten)]
        args: ApplyArgs,
    },
    /// Render a page to an HTML file
    Preview {
        slug: String,
        /// Output file (defaults to preview.output from inpage.toml)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Show the role of the configured token
    Whoami,
    /// Print a stock inpage.toml with all options documented
    GenConfig,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if let Command::GenConfig = cli.command {
        print!("{}", config::stock_config_toml());
        return Ok(());
    }

    let mut config = config::load_config(&cli.config)?;
    if let Some(token) = cli.token {
        config.api.token = Some(token);
    }
    init_tracing(&config);
    let api = HttpCms::new(&config.api)?;
    debug!(root = %api.root(), "using CMS");

    match cli.command {
        Command::Show { slug } => {
            let page = api.fetch_page(&slug).await?;
            output::print_page(&page, &MediaStaging::new(ObjectUrls::new()));
        }
        Command::Edit { slug } => {
            let unload = UnloadFlag::new();
            let session =
                EditingSession::open(&api, &slug, ObjectUrls::new(), unload.clone()).await?;
            run_console(Console::new(&api, session, &config.preview.output), unload).await?;
        }
        Command::Apply { slug, args } => {
            let mut session =
                EditingSession::open(&api, &slug, ObjectUrls::new(), UnloadFlag::new()).await?;
            session.enter()?;
            for edit in args.edits() {
                session.edit(edit)?;
            }
            for (slot, path, alt) in args.images() {
                session.select_image(slot, LocalFile::read(path)?)?;
                if let Some(alt) = alt {
                    session.set_caption(slot, alt)?;
                }
            }
            if !session.is_dirty() {
                println!("Nothing to change on /{}", slug);
                return Ok(());
            }
            let report = session.save(&api).await?;
            output::print_save_report(&report);
        }
        Command::Preview { slug, output } => {
            let page = api.fetch_page(&slug).await?;
            let path = output.unwrap_or_else(|| PathBuf::from(&config.preview.output));
            let staging = MediaStaging::new(ObjectUrls::new());
            let html = render::render_page(&page, &staging, RenderOptions::default());
            std::fs::write(&path, html.into_string())?;
            println!("Wrote preview of /{} to {}", slug, path.display());
        }
        Command::Whoami => {
            let role = api.current_role().await?;
            output::print_role(role.as_deref(), session::can_user_edit(role.as_deref()));
        }
        // Printed before the config is loaded.
        Command::GenConfig => {}
    }

    Ok(())
}

/// Log to stderr. `RUST_LOG` wins over `[log] level`.
fn init_tracing(config: &EditorConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log.level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Resolves when the process is asked to terminate.
async fn terminate_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                terminate.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "cannot install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    }
    #[cfg(not(unix))]
    std::future::pending::<()>().await;
}

/// Read commands until `quit`, end of input or a signal.
///
/// `unload` is the hook the session's navigation guard registers while
/// there are unsaved changes; Ctrl-C consults it before leaving.
async fn run_console(
    mut console: Console<'_, HttpCms, ObjectUrls, UnloadFlag>,
    unload: UnloadFlag,
) -> Result<(), Box<dyn std::error::Error>> {
    if !console.session().can_edit() {
        println!("Read-only: your role cannot edit pages. `show` and `preview` still work.");
    }
    println!("Type `help` for commands.");

    let terminate = terminate_signal();
    tokio::pin!(terminate);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("{}", console.prompt());
        std::io::stdout().flush()?;
        let reply = tokio::select! {
            line = lines.next_line() => match line? {
                Some(line) => console.handle(&line).await,
                None => {
                    println!();
                    for line in console.abandon("Input ended") {
                        println!("{}", line);
                    }
                    break;
                }
            },
            signal = tokio::signal::ctrl_c() => {
                signal?;
                println!();
                debug!(confirm = unload.should_confirm(), "interrupted");
                console.interrupt(unload.should_confirm())
            }
            () = &mut terminate => {
                info!("received terminate signal");
                for line in console.abandon("Terminated") {
                    println!("{}", line);
                }
                break;
            }
        };
        for line in &reply.lines {
            println!("{}", line);
        }
        if reply.flow == Flow::Quit {
            break;
        }
    }
    Ok(())
}
