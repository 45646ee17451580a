mod cli;
mod paths;
mod run;

use anyhow::Result;
use cli::Command;

fn main() -> Result<()> {
    let cli = cli::parse();
    run::initialise_tracing(cli.verbose);

    match cli.command {
        Some(Command::List) => run::list(&cli.config),
        None => run::run(cli.config, cli.run),
    }
}
