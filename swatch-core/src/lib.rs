pub mod export;
pub mod extract;
pub mod tally;
pub mod theme;

use colored::Colorize;

pub use export::{ExportError, ExportOutcome, ExportTarget, export_report, to_json};
pub use extract::{ExtractOptions, ExtractProgressCallback, PageSource, execute_extraction, load_snapshot};
pub use theme::{ThemeExtractor, ThemeLimits, ThemeReport, extract_theme};

pub fn print_banner() {
    eprintln!(
        "{} {}",
        "swatch".bright_magenta().bold(),
        env!("CARGO_PKG_VERSION").dimmed()
    );
    eprintln!("{}\n", "computed-style theme extraction".dimmed());
}
