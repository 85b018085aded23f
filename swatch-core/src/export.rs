// Delivery of a finished theme report

use crate::theme::ThemeReport;
use arboard::Clipboard;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
#[cfg(any(target_os = "linux", test))]
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Clipboard unavailable: {0}")]
    Clipboard(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ExportError>;

/// Where the JSON payload goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportTarget {
    Clipboard,
    File(PathBuf),
    Stdout,
}

#[derive(Debug, Clone)]
pub struct ExportOutcome {
    pub target: ExportTarget,
    pub bytes: usize,
    pub message: String,
}

/// How long a Linux process keeps serving its selection after a copy, so a
/// clipboard manager can take it over before the process exits.
pub const CLIPBOARD_HANDOFF: Duration = Duration::from_secs(2);

/// System clipboard handle, held only for the duration of one export.
pub struct ClipboardSink {
    clipboard: Clipboard,
}

impl ClipboardSink {
    pub fn new() -> Result<Self> {
        let clipboard = Clipboard::new().map_err(|e| ExportError::Clipboard(e.to_string()))?;
        Ok(Self { clipboard })
    }

    /// On X11 and Wayland the selection dies with its owner, so this blocks
    /// until another client takes it or [`CLIPBOARD_HANDOFF`] elapses.
    #[cfg(target_os = "linux")]
    pub fn set_text(&mut self, text: &str) -> Result<()> {
        use arboard::SetExtLinux;

        self.clipboard
            .set()
            .wait_until(handoff_deadline(Instant::now()))
            .text(text)
            .map_err(|e| ExportError::Clipboard(e.to_string()))
    }

    #[cfg(not(target_os = "linux"))]
    pub fn set_text(&mut self, text: &str) -> Result<()> {
        self.clipboard
            .set_text(text)
            .map_err(|e| ExportError::Clipboard(e.to_string()))
    }
}

#[cfg(any(target_os = "linux", test))]
fn handoff_deadline(now: Instant) -> Instant {
    now + CLIPBOARD_HANDOFF
}

/// Pretty-printed JSON with two-space indentation.
pub fn to_json(report: &ThemeReport) -> std::result::Result<String, serde_json::Error> {
    serde_json::to_string_pretty(report)
}

pub fn save_report(content: &str, path: &Path) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(content.as_bytes())?;
    Ok(())
}

/// Serializes `report` and writes it to `target`. Nothing is written if
/// serialization fails.
pub fn export_report(report: &ThemeReport, target: &ExportTarget) -> Result<ExportOutcome> {
    let payload = to_json(report)?;
    debug!("Serialized theme report ({} bytes)", payload.len());

    let message = match target {
        ExportTarget::Clipboard => {
            let mut sink = ClipboardSink::new()?;
            sink.set_text(&payload)?;
            "Copied full theme extraction to clipboard".to_string()
        }
        ExportTarget::File(path) => {
            save_report(&payload, path)?;
            format!("Saved full theme extraction to {}", path.display())
        }
        ExportTarget::Stdout => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{}", payload)?;
            stdout.flush()?;
            "Wrote full theme extraction to stdout".to_string()
        }
    };

    info!("{}", message);

    Ok(ExportOutcome {
        target: target.clone(),
        bytes: payload.len(),
        message,
    })
}
