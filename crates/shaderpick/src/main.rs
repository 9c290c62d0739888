mod cli;
mod paths;
mod run;
mod settings;
mod store;

use anyhow::Result;

fn main() -> Result<()> {
    let cli = cli::parse();
    run::initialise_tracing();

    let session = run::Session::open(cli.global)?;
    run::run(cli.command, session)
}
