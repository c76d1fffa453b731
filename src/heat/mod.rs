pub mod aggregate;
pub mod exec;
pub mod output;

pub use aggregate::{compute_heat, PullRequestAction};
pub use exec::exec;
pub use output::{output_heatmap, output_json, output_ndjson};
