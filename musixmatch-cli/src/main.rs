use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use musixmatch_api::auth::Session;
use musixmatch_api::types::{SearchQuery, SubtitleFormat, SyncBody};
use musixmatch_api::{ApiContext, MusixmatchClient, Params, TrackHandle};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "mxm", version, about = "Musixmatch lyrics API CLI")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug). `RUST_LOG` takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Issue a new user token and save it
    Login {
        /// API context to issue the token for
        #[arg(short, long, default_value = "desktop")]
        context: ContextArg,
        /// Check the current token instead
        #[arg(long)]
        check: bool,
    },
    /// Clear saved session
    Logout,
    /// Search for tracks
    Search {
        /// Free-text query
        query: Option<String>,
        /// Artist name
        #[arg(short, long)]
        artist: Option<String>,
        /// Track title
        #[arg(short, long)]
        title: Option<String>,
        /// Album name
        #[arg(long)]
        album: Option<String>,
        /// Lyrics excerpt
        #[arg(short, long)]
        lyrics: Option<String>,
        /// Lyrics language (ISO 639-1)
        #[arg(long)]
        lang: Option<String>,
        /// Only tracks with lyrics
        #[arg(long)]
        has_lyrics: bool,
        /// Only tracks with synced subtitles
        #[arg(long)]
        has_subtitle: bool,
        /// Max results
        #[arg(short = 'n', long, default_value = "10")]
        limit: u32,
    },
    /// Get track lyrics
    Lyrics {
        /// Track ID
        track_id: u64,
    },
    /// Get line-synced lyrics
    Subtitles {
        /// Track ID
        track_id: u64,
        /// Body format
        #[arg(short, long, default_value = "mxm")]
        format: FormatArg,
    },
    /// Get word-synced lyrics
    Richsync {
        /// Track ID
        track_id: u64,
    },
    /// Get the lyrics snippet
    Snippet {
        /// Track ID
        track_id: u64,
    },
    /// Get crowd translations
    Translations {
        /// Track ID
        track_id: u64,
        /// Target language (e.g. `en`, `rja`)
        language: String,
    },
    /// Submit lyrics for a track
    Submit {
        /// Track ID
        track_id: u64,
        /// File with the lyrics text
        #[arg(short, long)]
        file: PathBuf,
    },
    /// Call any API method and print the raw envelope
    Call {
        /// Method name, e.g. `chart.tracks.get`
        method: String,
        /// Parameters as `key=value`
        params: Vec<String>,
    },
}

#[derive(Clone, ValueEnum)]
enum ContextArg {
    Desktop,
    Ios,
}

#[derive(Clone, ValueEnum)]
enum FormatArg {
    Lrc,
    Dfxp,
    Stledu,
    Mxm,
}

impl From<ContextArg> for ApiContext {
    fn from(c: ContextArg) -> Self {
        match c {
            ContextArg::Desktop => Self::Desktop,
            ContextArg::Ios => Self::Ios,
        }
    }
}

impl From<FormatArg> for SubtitleFormat {
    fn from(f: FormatArg) -> Self {
        match f {
            FormatArg::Lrc => Self::Lrc,
            FormatArg::Dfxp => Self::Dfxp,
            FormatArg::Stledu => Self::Stledu,
            FormatArg::Mxm => Self::Mxm,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    match cli.command {
        Command::Login { context, check } => cmd_login(context.into(), check),
        Command::Logout => cmd_logout(),
        Command::Search {
            query,
            artist,
            title,
            album,
            lyrics,
            lang,
            has_lyrics,
            has_subtitle,
            limit,
        } => cmd_search(&SearchQuery {
            query,
            lyrics,
            artist,
            title,
            album,
            has_lyrics: has_lyrics.then_some(true),
            has_subtitle: has_subtitle.then_some(true),
            language: lang,
            page_size: Some(limit),
            ..SearchQuery::default()
        }),
        Command::Lyrics { track_id } => cmd_lyrics(track_id),
        Command::Subtitles { track_id, format } => cmd_subtitles(track_id, format.into()),
        Command::Richsync { track_id } => cmd_richsync(track_id),
        Command::Snippet { track_id } => cmd_snippet(track_id),
        Command::Translations { track_id, language } => cmd_translations(track_id, &language),
        Command::Submit { track_id, file } => cmd_submit(track_id, &file),
        Command::Call { method, params } => cmd_call(&method, &params),
    }
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn client() -> Result<MusixmatchClient> {
    let session = Session::load_with_env()?;
    tracing::debug!(context = %session.context, "using saved session");
    MusixmatchClient::from_session(&session).context("no user token; run `mxm login` first")
}

fn track(track_id: u64) -> Result<TrackHandle> {
    Ok(client()?.track_by_id(track_id))
}

// ── login / logout ──

fn cmd_login(context: ApiContext, check: bool) -> Result<()> {
    if check {
        let session = Session::load_with_env()?;
        if !session.is_logged_in() {
            println!("Not logged in.");
            return Ok(());
        }
        let client = MusixmatchClient::from_session(&session)?;
        let probe = Params::new().set("q", "test").set("page_size", 1);
        match client.call("track.search", &probe) {
            Ok(Some(env)) if env.is_ok() => println!("Token valid ({}).", session.context),
            Ok(Some(env)) => println!(
                "Token rejected (status {}{}).",
                env.status_code(),
                env.header
                    .hint()
                    .map(|h| format!(", hint: {h}"))
                    .unwrap_or_default()
            ),
            Ok(None) => println!("Token present but the API gave no usable answer."),
            Err(e) => println!("Session exists but validation failed: {e}"),
        }
        return Ok(());
    }

    let issued = MusixmatchClient::issue_token(context)?
        .context("token.get returned no usable token (throttled?); try again later")?;
    issued.to_session().save()?;
    println!("Session saved ({context}).");
    Ok(())
}

fn cmd_logout() -> Result<()> {
    Session::clear()?;
    println!("Session cleared.");
    Ok(())
}

// ── search ──

fn cmd_search(query: &SearchQuery) -> Result<()> {
    let tracks = client()?.search(query)?;
    if tracks.is_empty() {
        println!("No tracks found.");
        return Ok(());
    }
    for t in &tracks {
        let mut flags = Vec::new();
        if t.has_lyrics == Some(true) {
            flags.push("lyrics");
        }
        if t.has_subtitles == Some(true) {
            flags.push("synced");
        }
        if t.has_richsync == Some(true) {
            flags.push("richsync");
        }
        println!(
            "  [{}] {} ({}) {}",
            t.track_id.unwrap_or_default(),
            t.display_name(),
            t.album_name.as_deref().unwrap_or("-"),
            flags.join(","),
        );
    }
    Ok(())
}

// ── lyrics / subtitles / richsync / snippet / translations ──

fn cmd_lyrics(track_id: u64) -> Result<()> {
    let Some(lyrics) = track(track_id)?.fetch_lyrics()? else {
        println!("No lyrics available.");
        return Ok(());
    };
    if lyrics.instrumental == Some(true) {
        println!("(instrumental)");
    }
    println!("{}", lyrics.lyrics_body.as_deref().unwrap_or_default());
    if let Some(copyright) = &lyrics.lyrics_copyright {
        println!("\n{copyright}");
    }
    Ok(())
}

fn cmd_subtitles(track_id: u64, format: SubtitleFormat) -> Result<()> {
    let sub = track(track_id)?.fetch_subtitles(format)?;
    let Some(body) = sub.and_then(|s| s.subtitle_body) else {
        println!("No subtitles available.");
        return Ok(());
    };
    match (&body, body.subtitle_lines()) {
        (_, Some(lines)) => {
            for line in lines {
                println!(
                    "[{:02}:{:02}.{:02}] {}",
                    line.time.minutes, line.time.seconds, line.time.hundredths, line.text
                );
            }
        }
        (SyncBody::Text(text), None) => println!("{text}"),
        (SyncBody::Structured(value), None) => println!("{}", serde_json_pretty(value)),
    }
    Ok(())
}

fn cmd_richsync(track_id: u64) -> Result<()> {
    let rich = track(track_id)?.fetch_richsync()?;
    let Some(body) = rich.and_then(|r| r.richsync_body) else {
        println!("No richsync available.");
        return Ok(());
    };
    let Some(lines) = body.richsync_lines() else {
        println!("{}", body.as_text().unwrap_or_default());
        return Ok(());
    };
    for line in lines {
        println!("[{:7.2} - {:7.2}] {}", line.start, line.end, line.text);
    }
    Ok(())
}

fn cmd_snippet(track_id: u64) -> Result<()> {
    match track(track_id)?.fetch_snippet()?.and_then(|s| s.snippet_body) {
        Some(body) => println!("{body}"),
        None => println!("No snippet available."),
    }
    Ok(())
}

fn cmd_translations(track_id: u64, language: &str) -> Result<()> {
    let list = track(track_id)?
        .fetch_translations(language)?
        .unwrap_or_default();
    if list.is_empty() {
        println!("No translations into `{language}`.");
        return Ok(());
    }
    for t in &list {
        println!(
            "{}\n  -> {}",
            t.snippet.as_deref().unwrap_or_default(),
            t.description.as_deref().unwrap_or_default()
        );
    }
    Ok(())
}

// ── submit ──

fn cmd_submit(track_id: u64, file: &Path) -> Result<()> {
    let body = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    if body.trim().is_empty() {
        bail!("{} is empty", file.display());
    }
    if track(track_id)?.submit_lyrics(&body, None, None)? {
        println!("Lyrics submitted.");
    } else {
        println!("Submission rejected.");
    }
    Ok(())
}

// ── call ──

fn cmd_call(method: &str, raw_params: &[String]) -> Result<()> {
    let params = raw_params
        .iter()
        .map(|p| {
            p.split_once('=')
                .with_context(|| format!("parameter `{p}` is not key=value"))
        })
        .collect::<Result<Vec<_>>>()?
        .into_iter()
        .collect::<Params>();
    match client()?.call(method, &params)? {
        Some(env) => println!("{}", serde_json_pretty(&env)),
        None => println!("No usable response."),
    }
    Ok(())
}

fn serde_json_pretty<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|e| format!("<unprintable: {e}>"))
}
