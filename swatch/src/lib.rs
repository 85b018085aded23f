// Include handlers module directly from handlers.rs
#[path = "handlers.rs"]
pub mod handlers;

// Re-export commonly used handler functions for convenience
pub use handlers::{build_options, expand_path, parse_url_line, resolve_source, resolve_target};

// Re-export extraction functionality from swatch-core
pub use swatch_core::extract::{ExtractOptions, ExtractProgressCallback, PageSource, execute_extraction};
