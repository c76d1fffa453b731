use crate::config::{DEFAULT_LOOKBACK_WEEKS, DEFAULT_MAX_SAMPLE_COUNT};
use crate::model::ItemCategory;
use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "repometrics")]
#[command(about = "Repository metrics: sampled releases, issue and pull-request history, activity heat map")]
#[command(version)]
pub struct Cli {
    #[clap(flatten)]
    pub common: CommonArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Clone)]
pub struct CommonArgs {
    #[arg(long, global = true, help = "Path to git repository")]
    pub repo: Option<PathBuf>,

    #[arg(long, global = true, help = "Path to cache directory")]
    pub cache: Option<PathBuf>,

    #[arg(long, global = true, help = "Weeks of issue and pull-request history to consider", default_value_t = DEFAULT_LOOKBACK_WEEKS)]
    pub lookback_weeks: u32,

    #[arg(short, long, global = true, help = "Enable debug logging")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Append logs to this file instead of stderr")]
    pub log_file: Option<PathBuf>,
}

#[derive(Args, Clone)]
pub struct FeedArgs {
    #[arg(long, help = "GitHub repository as owner/name")]
    pub slug: String,

    #[arg(long, help = "Perceval JSON-lines capture of the repository's issues and pull requests")]
    pub dump: PathBuf,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum CategoryArg {
    Issue,
    PullRequest,
    All,
}

impl CategoryArg {
    pub fn categories(self) -> Vec<ItemCategory> {
        match self {
            CategoryArg::Issue => vec![ItemCategory::Issue],
            CategoryArg::PullRequest => vec![ItemCategory::PullRequest],
            CategoryArg::All => ItemCategory::ALL.to_vec(),
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// List the repository's tags and the sampled subset to analyze
    Releases {
        #[arg(long, help = "Target number of releases to keep", default_value_t = DEFAULT_MAX_SAMPLE_COUNT)]
        max_releases: usize,

        #[arg(long, help = "Output as JSON")]
        json: bool,
    },
    /// Incrementally fetch issue and pull-request history through the cache
    History {
        #[clap(flatten)]
        feed: FeedArgs,

        #[arg(long, value_enum, default_value_t = CategoryArg::All)]
        category: CategoryArg,

        #[arg(long, help = "Output as JSON")]
        json: bool,

        #[arg(long, help = "Output as NDJSON")]
        ndjson: bool,
    },
    /// Weekly issue, pull-request and commit activity
    Heat {
        #[clap(flatten)]
        feed: FeedArgs,

        #[arg(long, help = "Output as JSON")]
        json: bool,

        #[arg(long, help = "Output as NDJSON")]
        ndjson: bool,
    },
    /// Commit tallies per author and per month
    Commits {
        #[arg(long, help = "Output as JSON")]
        json: bool,
    },
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    pub fn execute(self) -> Result<()> {
        match self.command {
            Commands::Releases { max_releases, json } => {
                crate::releases::exec(self.common, max_releases, json)
            }
            Commands::History { feed, category, json, ndjson } => {
                crate::history::exec(self.common, feed, category, json, ndjson)
            }
            Commands::Heat { feed, json, ndjson } => crate::heat::exec(self.common, feed, json, ndjson),
            Commands::Commits { json } => crate::commits::exec(self.common, json),
        }
    }
}
