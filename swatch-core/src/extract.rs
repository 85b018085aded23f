use crate::theme::{ThemeExtractor, ThemeLimits, ThemeReport};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::Arc;
use swatch_scanner::{PageLoader, PageSnapshot, ScanError, Viewport};
use tracing::info;

/// Options for configuring an extraction
pub struct ExtractOptions {
    pub source: PageSource,
    pub timeout_secs: u64,
    pub viewport: Viewport,
    pub external_stylesheets: bool,
    pub show_progress: bool,
    pub limits: ThemeLimits,
}

impl ExtractOptions {
    pub fn new(source: PageSource) -> Self {
        Self {
            source,
            timeout_secs: 10,
            viewport: Viewport::default(),
            external_stylesheets: true,
            show_progress: false,
            limits: ThemeLimits::default(),
        }
    }
}

/// Where element styles come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageSource {
    /// Fetch a live page over HTTP(S)
    Url(String),
    /// Read an HTML file from disk
    File(PathBuf),
    /// Read pre-resolved styles from a JSON snapshot
    Snapshot(PathBuf),
}

impl std::fmt::Display for PageSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PageSource::Url(url) => write!(f, "{}", url),
            PageSource::File(path) | PageSource::Snapshot(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Callback for reporting extraction progress
pub type ExtractProgressCallback = Arc<dyn Fn(String) + Send + Sync>;

fn spinner(show: bool) -> Option<ProgressBar> {
    if !show {
        return None;
    }

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb.set_message("Loading page...");
    Some(pb)
}

/// Load the page described by `options` and resolve every element's style,
/// stopping short of aggregation
pub async fn load_snapshot(options: &ExtractOptions) -> Result<PageSnapshot, ScanError> {
    load_with_progress(options, None, None).await
}

async fn load_with_progress(
    options: &ExtractOptions,
    progress_bar: Option<&ProgressBar>,
    progress_callback: Option<ExtractProgressCallback>,
) -> Result<PageSnapshot, ScanError> {
    let mut loader = PageLoader::with_timeout(options.timeout_secs)
        .with_viewport(options.viewport)
        .with_external_stylesheets(options.external_stylesheets);

    if progress_bar.is_some() || progress_callback.is_some() {
        let pb = progress_bar.cloned();
        let cb = progress_callback.clone();
        loader = loader.with_progress_callback(Arc::new(move |msg: String| {
            if let Some(ref pb) = pb {
                pb.set_message(msg.clone());
            }
            if let Some(ref cb) = cb {
                cb(msg);
            }
        }));
    }

    let snapshot = match &options.source {
        PageSource::Snapshot(path) => loader.load_snapshot(path).await?,
        PageSource::Url(url) => loader.load_url(url).await?.sample(),
        PageSource::File(path) => loader.load_file(path).await?.sample(),
    };

    info!("Sampled {} elements from {}", snapshot.len(), options.source);
    Ok(snapshot)
}

/// Execute an extraction with the given options
/// Returns the finished theme report
pub async fn execute_extraction(
    options: ExtractOptions,
    progress_callback: Option<ExtractProgressCallback>,
) -> Result<ThemeReport, ScanError> {
    let progress_bar = spinner(options.show_progress);

    let snapshot = match load_with_progress(&options, progress_bar.as_ref(), progress_callback.clone()).await {
        Ok(snapshot) => snapshot,
        Err(e) => {
            if let Some(ref pb) = progress_bar {
                pb.abandon_with_message(format!("Failed to load {}", options.source));
            }
            return Err(e);
        }
    };

    if let Some(ref pb) = progress_bar {
        pb.set_message(format!("Aggregating {} elements...", snapshot.len()));
    }
    if let Some(ref callback) = progress_callback {
        callback(format!("Aggregating {} elements", snapshot.len()));
    }

    let mut extractor = ThemeExtractor::with_limits(options.limits);
    for element in &snapshot.elements {
        extractor.observe_sample(element);
    }
    let report = extractor.finish();

    if let Some(ref pb) = progress_bar {
        pb.finish_with_message(format!(
            "Extraction complete! {} elements, {} colors",
            snapshot.len(),
            report.colors.len()
        ));
    }

    Ok(report)
}
