mod commands;
mod output;
mod terminal;

use commands::{CommandLine, Commands, locations, ranges, run};
use terminal::{logging, print};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CommandLine::parse_args();

    logging::init(cli.run.verbose);

    match cli.command {
        Some(Commands::Locations(args)) => locations::locations(args),
        Some(Commands::Ranges(args)) => ranges::ranges(args),
        None => {
            print::banner(cli.run.quiet);
            run::run(cli.run).await
        }
    }
}
