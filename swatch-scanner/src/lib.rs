pub mod css;
pub mod error;
pub mod page;
pub mod resolve;
pub mod snapshot;
pub mod style;
pub mod values;

pub use error::ScanError;
pub use page::{Page, PageLoader, ProgressCallback};
pub use resolve::StyleResolver;
pub use snapshot::{ElementSample, PageSnapshot};
pub use style::{ComputedStyle, StyleProperty};
pub use values::Viewport;
