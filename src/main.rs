use anyhow::Result;
use repometrics::cli::Cli;

fn main() -> Result<()> {
    let cli = Cli::parse();
    repometrics::logging::init(cli.common.verbose, cli.common.log_file.as_deref());
    cli.execute()
}
