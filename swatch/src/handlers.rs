use anyhow::{Context, Result, bail};
use clap::ArgMatches;
use colored::Colorize;
use std::io::Write;
use std::path::PathBuf;
use swatch_core::export::{ExportTarget, export_report, save_report};
use swatch_core::extract::{ExtractOptions, PageSource, execute_extraction, load_snapshot};
use swatch_scanner::Viewport;
use tracing::Level;
use url::Url;

/// Install the stderr log subscriber. Safe to call more than once.
pub fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Parse a single line as a URL, trying to add http:// if needed
pub fn parse_url_line(line: &str) -> Option<String> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    // Try to parse as-is
    if let Ok(url) = Url::parse(line)
        && matches!(url.scheme(), "http" | "https")
    {
        return Some(line.to_string());
    }

    // Try adding http://
    let with_scheme = format!("http://{}", line);
    match Url::parse(&with_scheme) {
        Ok(url) if url.host_str().is_some() => Some(with_scheme),
        _ => None,
    }
}

/// Expand `~` in a user-supplied path
pub fn expand_path(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).as_ref())
}

/// Work out which page source the user picked
pub fn resolve_source(args: &ArgMatches) -> Result<PageSource> {
    if let Some(url) = args.get_one::<String>("url") {
        return match parse_url_line(url) {
            Some(url) => Ok(PageSource::Url(url)),
            None => bail!("Invalid URL '{}'", url),
        };
    }

    if let Some(file) = args.get_one::<String>("file") {
        return Ok(PageSource::File(expand_path(file)));
    }

    // `snapshot` is only defined on `extract`
    if let Ok(Some(snapshot)) = args.try_get_one::<String>("snapshot") {
        return Ok(PageSource::Snapshot(expand_path(snapshot)));
    }

    bail!("One of --url, --file or --snapshot must be provided")
}

/// Collect the loading options shared by `extract` and `snapshot`
pub fn build_options(args: &ArgMatches, quiet: bool) -> Result<ExtractOptions> {
    let mut options = ExtractOptions::new(resolve_source(args)?);

    if let Some(timeout) = args.get_one::<u64>("timeout") {
        options.timeout_secs = *timeout;
    }
    if let Some(viewport) = args.get_one::<Viewport>("viewport") {
        options.viewport = *viewport;
    }
    options.external_stylesheets = !args.get_flag("no-external-css");
    options.show_progress = !quiet;

    Ok(options)
}

/// Where `extract` should deliver the JSON
pub fn resolve_target(args: &ArgMatches) -> ExportTarget {
    if let Some(path) = args.get_one::<String>("output") {
        ExportTarget::File(expand_path(path))
    } else if args.try_get_one::<bool>("stdout").ok().flatten() == Some(&true) {
        ExportTarget::Stdout
    } else {
        ExportTarget::Clipboard
    }
}

async fn run_extract(sub_matches: &ArgMatches, quiet: bool) -> Result<String> {
    let options = build_options(sub_matches, quiet)?;
    let target = resolve_target(sub_matches);
    let source = options.source.to_string();

    let report = execute_extraction(options, None)
        .await
        .with_context(|| format!("Extraction from {} failed", source))?;

    let outcome = export_report(&report, &target)?;
    Ok(outcome.message)
}

pub async fn handle_extract(sub_matches: &ArgMatches, quiet: bool) {
    init_logging(sub_matches.get_flag("verbose"));

    match run_extract(sub_matches, quiet).await {
        // Confirmation goes to stderr so stdout carries only JSON
        Ok(message) => eprintln!("{} {}", "✓".green().bold(), message),
        Err(e) => {
            eprintln!("{} {:#}", "✗".red().bold(), e);
            std::process::exit(1);
        }
    }
}

async fn run_snapshot(sub_matches: &ArgMatches, quiet: bool) -> Result<String> {
    let options = build_options(sub_matches, quiet)?;

    let snapshot = load_snapshot(&options)
        .await
        .with_context(|| format!("Loading {} failed", options.source))?;
    let json = snapshot.to_json()?;

    match sub_matches.get_one::<String>("output") {
        Some(path) => {
            let path = expand_path(path);
            save_report(&json, &path)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            Ok(format!(
                "Saved {} element styles to {}",
                snapshot.len(),
                path.display()
            ))
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{}", json)?;
            Ok(format!("Wrote {} element styles to stdout", snapshot.len()))
        }
    }
}

pub async fn handle_snapshot(sub_matches: &ArgMatches, quiet: bool) {
    init_logging(sub_matches.get_flag("verbose"));

    match run_snapshot(sub_matches, quiet).await {
        Ok(message) => eprintln!("{} {}", "✓".green().bold(), message),
        Err(e) => {
            eprintln!("{} {:#}", "✗".red().bold(), e);
            std::process::exit(1);
        }
    }
}
