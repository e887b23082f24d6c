mod kmers;

use anyhow::Result;
use clap::{Arg, ArgAction, Command};
use env_logger::Env;

pub mod consts {
    pub const VERSION: &str = env!("CARGO_PKG_VERSION");
    pub const PKG_NAME: &str = "xlmotif";
    pub const BIN_NAME: &str = "xlmotif";
}

fn build_parser() -> Command {
    Command::new(consts::BIN_NAME)
        .bin_name(consts::BIN_NAME)
        .version(consts::VERSION)
        .about("Positional enrichment of kmers around CLIP crosslink sites.")
        .subcommand_required(true)
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Log debug messages"),
        )
        .subcommand(kmers::cli::create_kmers_cli())
}

fn main() -> Result<()> {
    let app = build_parser();
    let matches = app.get_matches();

    let level = if matches.get_flag("verbose") {
        "debug"
    } else {
        "info"
    };
    env_logger::Builder::from_env(Env::default().default_filter_or(level)).init();

    match matches.subcommand() {
        //
        // KMERS
        //
        Some((kmers::cli::KMERS_CMD, matches)) => {
            kmers::handlers::run_kmers(matches)?;
        }

        _ => unreachable!("Subcommand not found"),
    };

    Ok(())
}
