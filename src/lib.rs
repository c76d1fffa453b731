pub mod cache;
pub mod cli;
pub mod commits;
pub mod config;
pub mod error;
pub mod git;
pub mod heat;
pub mod history;
pub mod logging;
pub mod model;
pub mod releases;
pub mod sample;
pub mod source;
pub mod util;

pub use cache::{Cache, CacheStore};
pub use config::Config;
pub use error::{MetricsError, Result};
pub use history::HistoryFetcher;
pub use sample::sample_releases;
pub use source::{DumpSource, ItemSource};
