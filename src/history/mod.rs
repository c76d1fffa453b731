pub mod document;
pub mod exec;
pub mod extract;
pub mod fetch;

pub use exec::{collect_categories, exec};
pub use extract::{extract_item, is_misrouted};
pub use fetch::{Collected, HistoryFetcher};
