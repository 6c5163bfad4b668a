//! tarn CLI

use anyhow::Result;
use clap::Parser;

use tarn_cli::cmd::{self, Session};
use tarn_cli::{Cli, Commands, logging};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_path = tarn_core::log_path();
    let _log_guard = logging::init_logging(cli.verbose, &log_path);

    let mut session = Session::open(&cli)?;

    let result = match cli.command {
        Commands::Install { package, all } => cmd::install::install(&mut session, package.as_deref(), all),
        Commands::Deps { package } => cmd::deps::deps(&mut session, package.as_deref()),
        Commands::Update { package, all } => cmd::update::update(&mut session, package.as_deref(), all),
        Commands::Remove {
            package,
            force,
            all,
            yes,
        } => cmd::remove::remove(&mut session, package.as_deref(), force, all, yes),
        Commands::Query { package, all } => cmd::query::query(&mut session, package.as_deref(), all),
        Commands::List => cmd::list::list(&mut session),
    };
    if result.is_err() {
        session.report_failure(&log_path);
    }
    result
}
