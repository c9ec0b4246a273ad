mod annotate;
mod head;
mod populations;

use anyhow::Result;
use clap::{Arg, ArgAction, Command};
use tracing_subscriber::EnvFilter;

pub mod consts {
    pub const VERSION: &str = env!("CARGO_PKG_VERSION");
    pub const PKG_NAME: &str = "vannot";
    pub const BIN_NAME: &str = "vannot";
}

fn build_parser() -> Command {
    Command::new(consts::BIN_NAME)
        .bin_name(consts::BIN_NAME)
        .version(consts::VERSION)
        .author("Databio")
        .about("Filter, annotate and lift over gnomAD-style variant catalogs between GRCh37 and GRCh38.")
        .subcommand_required(true)
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .global(true)
                .help("Log debug output (overrides RUST_LOG)")
                .action(ArgAction::SetTrue),
        )
        .subcommand(annotate::cli::create_annotate_cli())
        .subcommand(populations::cli::create_populations_cli())
        .subcommand(head::cli::create_head_cli())
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let app = build_parser();
    let matches = app.get_matches();

    init_logging(matches.get_flag("verbose"));

    match matches.subcommand() {
        //
        // ANNOTATE
        //
        Some((annotate::cli::ANNOTATE_CMD, matches)) => {
            annotate::handlers::run_annotate(matches)?;
        }

        //
        // POPULATIONS
        //
        Some((populations::cli::POPULATIONS_CMD, matches)) => {
            populations::handlers::run_populations(matches)?;
        }

        //
        // HEAD
        //
        Some((head::cli::HEAD_CMD, matches)) => {
            head::handlers::run_head(matches)?;
        }

        _ => unreachable!("Subcommand not found"),
    };

    Ok(())
}
