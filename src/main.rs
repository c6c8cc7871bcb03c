mod cli;

use clap::Parser;

use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();
    penny::logger::init_cli_logger(cli.verbose);

    let result = match cli.command {
        Commands::Analyze {
            file,
            currency,
            income,
            focus,
            json,
        } => cli::analyze::run(&file, currency.as_deref(), income, focus, json),
        Commands::Info { file } => cli::info::run(&file),
        Commands::Classify {
            description,
            amount,
        } => cli::classify::run(&description, amount),
        Commands::Categories => cli::classify::list(),
        Commands::Config { init } => cli::config::run(init),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
